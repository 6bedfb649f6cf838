//! 변동성 지표 (Volatility Indicators).
//!
//! - Bollinger Bands (볼린저 밴드)

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{IndicatorError, IndicatorResult};

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20).
    pub period: usize,
    /// 표준편차 배수 (기본: 2.0).
    pub std_dev_multiplier: Decimal,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: dec!(2.0),
        }
    }
}

/// 볼린저 밴드 결과.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BollingerBandsResult {
    /// 상단 밴드 (MA + k × σ).
    pub upper: Option<Decimal>,
    /// 중간 밴드 (이동평균).
    pub middle: Option<Decimal>,
    /// 하단 밴드 (MA - k × σ).
    pub lower: Option<Decimal>,
    /// %B 지표 ((현재가 - 하단) / (상단 - 하단)). 밴드 폭이 0이면 None.
    pub percent_b: Option<Decimal>,
    /// 밴드 폭 ((상단 - 하단) / 중간).
    pub bandwidth: Option<Decimal>,
}

/// 변동성 지표 계산기.
#[derive(Debug, Default)]
pub struct VolatilityIndicators;

impl VolatilityIndicators {
    /// 새로운 변동성 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 볼린저 밴드 계산.
    ///
    /// 중간 밴드 = SMA(period), σ = 구간 표본 표준편차 (n - 1로 나눔)
    /// 상단/하단 밴드 = 중간 ± k × σ
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Vec<BollingerBandsResult>> {
        let period = params.period;

        if period < 2 {
            return Err(IndicatorError::InvalidParameter(
                "볼린저 밴드 기간은 2 이상이어야 합니다".to_string(),
            ));
        }

        if params.std_dev_multiplier < Decimal::ZERO {
            return Err(IndicatorError::InvalidParameter(
                "표준편차 배수는 음수일 수 없습니다".to_string(),
            ));
        }

        if prices.len() < period {
            return Err(IndicatorError::InsufficientData {
                required: period,
                provided: prices.len(),
            });
        }

        let mut result = vec![BollingerBandsResult::default(); period - 1];
        let period_decimal = Decimal::from(period);
        let dof = Decimal::from(period - 1);

        for (offset, window) in prices.windows(period).enumerate() {
            let price = prices[offset + period - 1];

            // 이동평균 (중간 밴드)
            let middle = window.iter().sum::<Decimal>() / period_decimal;

            // 표본 표준편차
            let variance = window
                .iter()
                .map(|&p| {
                    let diff = p - middle;
                    diff * diff
                })
                .sum::<Decimal>()
                / dof;
            let std_dev = variance.sqrt().ok_or_else(|| {
                IndicatorError::CalculationError(format!("분산의 제곱근 계산 실패: {}", variance))
            })?;

            let band = params.std_dev_multiplier * std_dev;
            let upper = middle + band;
            let lower = middle - band;
            let width = upper - lower;

            let percent_b = if width > Decimal::ZERO {
                Some((price - lower) / width)
            } else {
                None
            };
            let bandwidth = if middle != Decimal::ZERO {
                Some(width / middle)
            } else {
                None
            };

            result.push(BollingerBandsResult {
                upper: Some(upper),
                middle: Some(middle),
                lower: Some(lower),
                percent_b,
                bandwidth,
            });
        }

        Ok(result)
    }
}
