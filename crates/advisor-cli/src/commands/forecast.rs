//! 가격 예측 명령.

use advisor_analytics::ml::{ForecastReport, ForecastSeeds, ModelForecast, ModelOutlook};
use advisor_analytics::AnalysisService;
use advisor_core::PriceSeries;
use anyhow::Result;

use super::output::{cell, to_json, OutputFormat};

/// 예측을 실행하고 출력 문자열을 만듭니다.
pub fn run_forecast(
    service: &AnalysisService,
    series: &PriceSeries,
    seeds: Option<ForecastSeeds>,
    format: OutputFormat,
) -> Result<String> {
    let report = service.forecast(series, seeds)?;
    match format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Table => Ok(format_table(&report)),
    }
}

fn model_row(name: &str, forecast: &ModelForecast, outlook: Option<&ModelOutlook>) -> String {
    match (forecast, outlook) {
        (ModelForecast::Available(prediction), Some(outlook)) => format!(
            "{:<12} {:>12.2} {:>+9.2}% {:>10.1} {:>9} {:>8.4} {:>6}\n",
            name,
            outlook.predicted_price,
            outlook.change_pct,
            outlook.confidence_score,
            format!("{:?}", prediction.confidence_level()),
            prediction.metrics.r2,
            prediction.horizon
        ),
        (ModelForecast::Unavailable { reason }, _) => format!("{:<12} 사용 불가: {}\n", name, reason),
        (ModelForecast::Available(_), None) => format!("{:<12} 예측값 없음\n", name),
    }
}

fn format_table(report: &ForecastReport) -> String {
    let summary = &report.summary;
    let mut output = String::new();

    output.push_str(&format!(
        "{} 현재가 {:.2}\n\n",
        report.symbol, summary.current_price
    ));
    output.push_str(&format!(
        "{:<12} {:>12} {:>10} {:>10} {:>9} {:>8} {:>6}\n",
        "MODEL", "PREDICTED", "CHANGE", "CONFIDENCE", "LEVEL", "R2", "N"
    ));
    output.push_str(&"-".repeat(73));
    output.push('\n');
    output.push_str(&model_row("sequence", &report.sequence, summary.sequence.as_ref()));
    output.push_str(&model_row("stochastic", &report.stochastic, summary.stochastic.as_ref()));

    if let Some(history) = &report.history {
        output.push_str(&format!(
            "\n학습: {} 에포크, 최적 {} (검증 손실 {}){}\n",
            history.epochs(),
            history.best_epoch + 1,
            cell(history.best_val_loss().map(|l| format!("{:.6}", l))),
            if history.stopped_early { ", 조기 종료" } else { "" }
        ));
    }

    output.push_str(&format!(
        "\n합의: {}\n90% 구간: ±{}",
        cell(summary.consensus),
        cell(summary.band_pct.map(|b| format!("{:.2}%", b)))
    ));

    output
}
