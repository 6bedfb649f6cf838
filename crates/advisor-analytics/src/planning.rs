//! 적립식 투자(SIP) 계산기.
//!
//! 매년 이월 금액을 연 수익률로 키우고, 그 해 12회 월 납입금은 남은 개월 수만큼
//! 월 환산 수익률 `(1 + r)^(1/12) − 1`로 복리 계산합니다.

use rust_decimal::prelude::*;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const MONTHS_PER_YEAR: u32 = 12;

/// 적립식 계산 오류.
#[derive(Debug, Error)]
pub enum PlanningError {
    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 계산 범위 초과
    #[error("계산 범위를 벗어났습니다: {0}")]
    Overflow(String),
}

/// 적립식 계산 결과 타입.
pub type PlanningResult<T> = Result<T, PlanningError>;

/// 적립식 투자 전망.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipProjection {
    /// 만기 평가액
    pub future_value: Decimal,
    /// 총 납입액 (초기 금액 포함)
    pub total_invested: Decimal,
    /// 평가 이익
    pub wealth_gained: Decimal,
    /// 총 납입액 대비 수익률 (%). 납입액이 0이면 None.
    pub absolute_return_pct: Option<Decimal>,
    /// 연말 평가액 (0년차 = 초기 금액)
    pub yearly_values: Vec<Decimal>,
}

/// 연 수익률(%)의 월 환산 수익률.
pub fn monthly_rate(annual_rate_pct: Decimal) -> PlanningResult<Decimal> {
    let growth = annual_growth(annual_rate_pct)?;
    if annual_rate_pct.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let monthly = growth
        .checked_powd(Decimal::ONE / Decimal::from(MONTHS_PER_YEAR))
        .ok_or_else(|| PlanningError::Overflow(format!("월 환산 수익률: {}%", annual_rate_pct)))?;
    Ok(monthly - Decimal::ONE)
}

fn annual_growth(annual_rate_pct: Decimal) -> PlanningResult<Decimal> {
    let growth = Decimal::ONE + annual_rate_pct / Decimal::ONE_HUNDRED;
    if growth <= Decimal::ZERO {
        return Err(PlanningError::InvalidParameter(format!(
            "연 수익률은 -100%보다 커야 합니다: {}%",
            annual_rate_pct
        )));
    }
    Ok(growth)
}

fn compound(base: Decimal, exponent: u32) -> PlanningResult<Decimal> {
    base.checked_powi(i64::from(exponent))
        .ok_or_else(|| PlanningError::Overflow(format!("{}^{}", base, exponent)))
}

/// 적립식 투자 평가액을 연도별로 계산합니다.
pub fn project_sip(
    initial: Decimal,
    monthly: Decimal,
    years: u32,
    annual_rate_pct: Decimal,
) -> PlanningResult<SipProjection> {
    if initial < Decimal::ZERO || monthly < Decimal::ZERO {
        return Err(PlanningError::InvalidParameter(format!(
            "금액은 0 이상이어야 합니다: 초기 {}, 월 {}",
            initial, monthly
        )));
    }

    let growth = annual_growth(annual_rate_pct)?;
    let monthly_growth = Decimal::ONE + monthly_rate(annual_rate_pct)?;

    // 한 해 납입금의 연말 가치 (m번째 달 납입금은 11 - m개월 복리)
    let mut contribution_factor = Decimal::ZERO;
    for month in 0..MONTHS_PER_YEAR {
        contribution_factor += compound(monthly_growth, MONTHS_PER_YEAR - 1 - month)?;
    }
    let yearly_contribution = monthly
        .checked_mul(contribution_factor)
        .ok_or_else(|| PlanningError::Overflow("연 납입금".to_string()))?;

    let mut yearly_values = Vec::with_capacity(years as usize + 1);
    let mut value = initial;
    yearly_values.push(value);
    for _ in 0..years {
        value = value
            .checked_mul(growth)
            .and_then(|v| v.checked_add(yearly_contribution))
            .ok_or_else(|| PlanningError::Overflow("평가액".to_string()))?;
        yearly_values.push(value);
    }

    let total_invested = initial + monthly * Decimal::from(MONTHS_PER_YEAR) * Decimal::from(years);
    let wealth_gained = value - total_invested;
    let absolute_return_pct = if total_invested.is_zero() {
        None
    } else {
        Some(wealth_gained / total_invested * Decimal::ONE_HUNDRED)
    };

    debug!(%initial, %monthly, years, %annual_rate_pct, future_value = %value, "SIP projected");

    Ok(SipProjection {
        future_value: value,
        total_invested,
        wealth_gained,
        absolute_return_pct,
        yearly_values,
    })
}

/// 목표 금액 달성에 필요한 월 납입금 (연금 PMT 공식).
///
/// `PMT = FV · r / ((1 + r)^n − 1)`, 수익률이 0이면 `FV / n`.
pub fn required_monthly_sip(target: Decimal, years: u32, annual_rate_pct: Decimal) -> PlanningResult<Decimal> {
    if years == 0 {
        return Err(PlanningError::InvalidParameter("투자 기간은 1년 이상이어야 합니다".to_string()));
    }
    if target < Decimal::ZERO {
        return Err(PlanningError::InvalidParameter(format!(
            "목표 금액은 0 이상이어야 합니다: {}",
            target
        )));
    }

    let months = years * MONTHS_PER_YEAR;
    let rate = monthly_rate(annual_rate_pct)?;
    if rate.is_zero() {
        return Ok(target / Decimal::from(months));
    }

    let denominator = compound(Decimal::ONE + rate, months)? - Decimal::ONE;
    if denominator.is_zero() {
        return Ok(target / Decimal::from(months));
    }
    Ok(target * rate / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_rate_projection() {
        let projection = project_sip(dec!(1000), dec!(100), 2, Decimal::ZERO).unwrap();

        assert_eq!(projection.total_invested, dec!(3400));
        assert_eq!(projection.future_value, dec!(3400));
        assert_eq!(projection.wealth_gained, Decimal::ZERO);
        assert_eq!(projection.absolute_return_pct, Some(Decimal::ZERO));
        assert_eq!(projection.yearly_values, vec![dec!(1000), dec!(2200), dec!(3400)]);
    }

    #[test]
    fn test_lump_sum_grows_annually() {
        let projection = project_sip(dec!(10000), Decimal::ZERO, 2, dec!(10)).unwrap();
        assert_eq!(projection.future_value.round_dp(6), dec!(12100));
        assert_eq!(projection.total_invested, dec!(10000));
    }

    #[test]
    fn test_monthly_contributions_compound() {
        let projection = project_sip(Decimal::ZERO, dec!(1000), 1, dec!(12)).unwrap();
        // 12회 납입 12000 + 복리 이익
        assert!(projection.future_value > dec!(12000));
        assert!(projection.future_value < dec!(12700));
        assert_eq!(projection.yearly_values.len(), 2);
    }

    #[test]
    fn test_required_sip_zero_rate() {
        let pmt = required_monthly_sip(dec!(120000), 10, Decimal::ZERO).unwrap();
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_required_sip_reaches_target() {
        let target = dec!(1000000);
        let pmt = required_monthly_sip(target, 10, dec!(12)).unwrap();
        let projection = project_sip(Decimal::ZERO, pmt, 10, dec!(12)).unwrap();

        assert!((projection.future_value - target).abs() < dec!(1));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(project_sip(dec!(-1), dec!(100), 1, dec!(5)).is_err());
        assert!(project_sip(dec!(0), dec!(100), 1, dec!(-100)).is_err());
        assert!(required_monthly_sip(dec!(1000), 0, dec!(5)).is_err());
    }

    #[test]
    fn test_no_contribution_has_no_return_pct() {
        let projection = project_sip(Decimal::ZERO, Decimal::ZERO, 3, dec!(8)).unwrap();
        assert_eq!(projection.absolute_return_pct, None);
    }
}
