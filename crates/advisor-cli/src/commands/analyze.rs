//! 종목 기술적 분석 명령.

use advisor_analytics::{AnalysisService, IndicatorKind, StockAnalysis};
use advisor_core::{DecimalExt, PriceSeries};
use anyhow::Result;

use super::output::{cell, to_json, OutputFormat};

/// 최근 몇 개 시점의 시그널을 표에 보여줄지.
const RECENT_ROWS: usize = 5;

/// 분석을 실행하고 출력 문자열을 만듭니다.
pub fn run_analyze(
    service: &AnalysisService,
    series: &PriceSeries,
    format: OutputFormat,
) -> Result<String> {
    let analysis = service.analyze(series)?;
    match format {
        OutputFormat::Json => to_json(&analysis),
        OutputFormat::Table => Ok(format_table(&analysis)),
    }
}

fn format_table(analysis: &StockAnalysis) -> String {
    let mut output = String::new();
    let indicators = &analysis.indicators;

    output.push_str(&format!(
        "{} ({} 캔들, 종가 {})\n\n",
        analysis.symbol,
        indicators.len(),
        analysis.last_close.round_half_up(2)
    ));

    // 최신 지표
    output.push_str(&format!("{:<16} {:>14}\n", "INDICATOR", "LATEST"));
    output.push_str(&"-".repeat(31));
    output.push('\n');
    for kind in IndicatorKind::ALL {
        output.push_str(&format!(
            "{:<16} {:>14}\n",
            kind.as_str(),
            cell(indicators.latest(kind).map(|v| v.round_half_up(2)))
        ));
    }

    // 최근 시그널
    output.push_str(&format!(
        "\n{:<12} {:>5} {:>5} {:>5} {:>5} {:>8}\n",
        "DATE", "RSI", "MACD", "MA", "BB", "OVERALL"
    ));
    output.push_str(&"-".repeat(45));
    output.push('\n');
    let start = analysis.signals.len().saturating_sub(RECENT_ROWS);
    for vector in &analysis.signals[start..] {
        let [rsi, macd, ma, bb] = vector.components().map(|s| cell(s.map(|s| s.value())));
        output.push_str(&format!(
            "{:<12} {:>5} {:>5} {:>5} {:>5} {:>8}\n",
            cell(vector.timestamp.map(|t| t.format("%Y-%m-%d"))),
            rsi,
            macd,
            ma,
            bb,
            vector.overall.round_half_up(2)
        ));
    }

    match &analysis.recommendation {
        Some(rec) => output.push_str(&format!(
            "\n추천: {} (신뢰도 {}%)",
            rec.action, rec.confidence
        )),
        None => output.push_str("\n추천: 없음"),
    }

    output
}
