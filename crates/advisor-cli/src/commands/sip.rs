//! 적립식 투자 계산 명령.

use advisor_analytics::{project_sip, required_monthly_sip, SipProjection};
use advisor_core::DecimalExt;
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

use super::output::{to_json, OutputFormat};

/// 적립식 계산 입력.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SipInput {
    pub initial: Decimal,
    pub monthly: Decimal,
    pub years: u32,
    pub annual_rate_pct: Decimal,
    /// 목표 금액 (있으면 필요한 월 납입금도 계산)
    pub target: Option<Decimal>,
}

/// 적립식 계산 출력.
#[derive(Debug, Serialize)]
pub struct SipReport {
    pub input: SipInput,
    pub projection: SipProjection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_monthly: Option<Decimal>,
}

/// 적립식 계산을 실행하고 출력 문자열을 만듭니다.
pub fn run_sip(input: SipInput, format: OutputFormat) -> Result<String> {
    let projection = project_sip(input.initial, input.monthly, input.years, input.annual_rate_pct)?;
    let required_monthly = input
        .target
        .map(|target| required_monthly_sip(target, input.years, input.annual_rate_pct))
        .transpose()?
        .map(|pmt| pmt.round_half_up(2));

    let report = SipReport {
        input,
        projection,
        required_monthly,
    };
    match format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Table => Ok(format_table(&report)),
    }
}

fn format_table(report: &SipReport) -> String {
    let projection = &report.projection;
    let mut output = String::new();

    output.push_str(&format!("{:<6} {:>18}\n", "YEAR", "VALUE"));
    output.push_str(&"-".repeat(25));
    output.push('\n');
    for (year, value) in projection.yearly_values.iter().enumerate() {
        output.push_str(&format!("{:<6} {:>18.2}\n", year, value));
    }

    output.push_str(&format!(
        "\n총 납입액: {:.2}\n평가액: {:.2}\n평가 이익: {:.2}\n수익률: {}",
        projection.total_invested,
        projection.future_value,
        projection.wealth_gained,
        projection
            .absolute_return_pct
            .map_or_else(|| "-".to_string(), |p| (p / Decimal::ONE_HUNDRED).to_percentage_string())
    ));

    if let (Some(target), Some(pmt)) = (report.input.target, report.required_monthly) {
        output.push_str(&format!("\n목표 {:.2} 달성 필요 월 납입금: {:.2}", target, pmt));
    }

    output
}
