//! 포트폴리오 최적화 명령.

use advisor_analytics::{AllocationLine, AnalysisService, Objective, OptimizationResult, PortfolioCandidate};
use advisor_core::PriceSeries;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use super::output::{cell, to_json, OutputFormat};

/// 최적화 출력.
#[derive(Debug, Serialize)]
pub struct OptimizeReport<'a> {
    pub symbols: &'a [String],
    pub objective: Objective,
    pub seed: Option<u64>,
    pub samples: usize,
    pub optimal: &'a PortfolioCandidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<Vec<AllocationLine>>,
    pub frontier: Vec<&'a PortfolioCandidate>,
}

impl<'a> OptimizeReport<'a> {
    /// 최적화 결과와 선택적 투자금으로 보고서를 만듭니다.
    pub fn new(result: &'a OptimizationResult, amount: Option<Decimal>) -> Result<Self> {
        let allocation = amount.map(|a| result.allocate(a)).transpose()?;
        Ok(Self {
            symbols: &result.symbols,
            objective: result.objective,
            seed: result.seed,
            samples: result.candidates.len(),
            optimal: result.optimal().context("최적 후보 인덱스가 범위를 벗어났습니다")?,
            allocation,
            frontier: result.efficient_frontier(),
        })
    }
}

/// 최적화를 실행하고 출력 문자열을 만듭니다.
pub fn run_optimize(
    service: &AnalysisService,
    series: &[PriceSeries],
    objective: Objective,
    seed: Option<u64>,
    amount: Option<Decimal>,
    format: OutputFormat,
) -> Result<String> {
    let result = service.optimize(series, objective, seed)?;
    let report = OptimizeReport::new(&result, amount)?;
    match format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Table => Ok(format_table(&report)),
    }
}

fn format_table(report: &OptimizeReport<'_>) -> String {
    let mut output = String::new();
    let optimal = report.optimal;

    output.push_str(&format!(
        "목표: {} (샘플 {}개, 시드 {})\n\n",
        report.objective,
        report.samples,
        cell(report.seed)
    ));

    output.push_str(&format!("{:<10} {:>10} {:>14}\n", "SYMBOL", "WEIGHT", "AMOUNT"));
    output.push_str(&"-".repeat(36));
    output.push('\n');
    for (i, (symbol, weight)) in report.symbols.iter().zip(&optimal.weights).enumerate() {
        let amount = report
            .allocation
            .as_ref()
            .and_then(|lines| lines.get(i))
            .map(|line| line.amount);
        output.push_str(&format!(
            "{:<10} {:>9.2}% {:>14}\n",
            symbol,
            weight * 100.0,
            cell(amount)
        ));
    }

    output.push_str(&format!(
        "\n기대 수익률: {:.2}%\n변동성: {:.2}%\n샤프 비율: {}\n효율적 투자선 후보: {}개",
        optimal.expected_return * 100.0,
        optimal.volatility * 100.0,
        cell(optimal.sharpe.map(|s| format!("{:.3}", s))),
        report.frontier.len()
    ));

    output
}
