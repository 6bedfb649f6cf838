//! 모멘텀 지표 (Momentum Indicators).
//!
//! 과매수/과매도 상태를 측정하는 RSI를 제공합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{IndicatorError, IndicatorResult};

/// RSI 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RsiParams {
    /// RSI 기간 (기본: 14).
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 모멘텀 지표 계산기.
#[derive(Debug, Default)]
pub struct MomentumCalculator;

impl MomentumCalculator {
    /// 새로운 모멘텀 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// RSI (Relative Strength Index) 계산.
    ///
    /// RSI = 100 - (100 / (1 + RS))
    /// RS = 평균 상승폭 / 평균 하락폭
    ///
    /// 평균은 `period` 구간의 단순 이동평균입니다. 첫 시점의 가격 변화는
    /// 0으로 간주하므로 처음 `period - 1`개만 정의되지 않습니다.
    ///
    /// - 평균 하락폭 0, 평균 상승폭 > 0 → 100
    /// - 평균 상승폭 = 평균 하락폭 = 0 (가격 변화 없음) → 중립값 50
    ///
    /// # 인자
    /// * `prices` - 가격 데이터 (종가)
    /// * `params` - RSI 파라미터
    ///
    /// # 반환
    /// 0-100 사이의 RSI 값들
    pub fn rsi(&self, prices: &[Decimal], params: RsiParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;

        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "기간은 0보다 커야 합니다".to_string(),
            ));
        }

        if prices.len() < period {
            return Err(IndicatorError::InsufficientData {
                required: period,
                provided: prices.len(),
            });
        }

        // 가격 변화 (첫 번째는 변화 없음)
        let mut gains = Vec::with_capacity(prices.len());
        let mut losses = Vec::with_capacity(prices.len());
        gains.push(Decimal::ZERO);
        losses.push(Decimal::ZERO);
        for pair in prices.windows(2) {
            let delta = pair[1] - pair[0];
            gains.push(delta.max(Decimal::ZERO));
            losses.push((-delta).max(Decimal::ZERO));
        }

        let period_decimal = Decimal::from(period);
        let mut result = Vec::with_capacity(prices.len());

        // 구간 합을 누적 갱신
        let mut gain_sum: Decimal = gains[..period].iter().sum();
        let mut loss_sum: Decimal = losses[..period].iter().sum();

        for _ in 0..period - 1 {
            result.push(None);
        }

        for i in (period - 1)..prices.len() {
            if i >= period {
                gain_sum += gains[i] - gains[i - period];
                loss_sum += losses[i] - losses[i - period];
            }

            let avg_gain = gain_sum / period_decimal;
            let avg_loss = loss_sum / period_decimal;
            result.push(Some(Self::rsi_value(avg_gain, avg_loss)));
        }

        Ok(result)
    }

    /// 평균 상승/하락폭으로 RSI 값을 계산합니다.
    fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
        if avg_loss == Decimal::ZERO {
            if avg_gain == Decimal::ZERO {
                return dec!(50);
            }
            return dec!(100);
        }

        let rs = avg_gain / avg_loss;
        dec!(100) - (dec!(100) / (Decimal::ONE + rs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < dec!(0.01)
    }

    #[test]
    fn test_rsi_reference_values() {
        let momentum = MomentumCalculator::new();
        let prices = vec![dec!(10), dec!(12), dec!(11), dec!(14), dec!(13)];

        let rsi = momentum.rsi(&prices, RsiParams { period: 2 }).unwrap();

        assert_eq!(rsi[0], None);
        assert_eq!(rsi[1], Some(dec!(100)));
        assert!(approx(rsi[2].unwrap(), dec!(66.67)));
        assert!(approx(rsi[3].unwrap(), dec!(75)));
        assert!(approx(rsi[4].unwrap(), dec!(75)));
    }

    #[test]
    fn test_rsi_bullish_market() {
        let momentum = MomentumCalculator::new();

        // 계속 상승하는 시장
        let prices: Vec<Decimal> = (0..20).map(|i| Decimal::from(100 + i)).collect();

        let rsi = momentum.rsi(&prices, RsiParams { period: 14 }).unwrap();

        assert_eq!(rsi.iter().filter(|v| v.is_none()).count(), 13);
        assert_eq!(*rsi.last().unwrap(), Some(dec!(100)));
    }

    #[test]
    fn test_rsi_flat_market_is_neutral() {
        let momentum = MomentumCalculator::new();
        let prices = vec![dec!(100); 20];

        let rsi = momentum.rsi(&prices, RsiParams::default()).unwrap();

        for value in rsi.iter().flatten() {
            assert_eq!(*value, dec!(50));
        }
    }

    #[test]
    fn test_rsi_bearish_market() {
        let momentum = MomentumCalculator::new();
        let prices: Vec<Decimal> = (0..20).map(|i| Decimal::from(200 - i)).collect();

        let rsi = momentum.rsi(&prices, RsiParams { period: 5 }).unwrap();

        assert_eq!(*rsi.last().unwrap(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_rsi_errors() {
        let momentum = MomentumCalculator::new();
        let prices = vec![dec!(1), dec!(2)];

        assert!(matches!(
            momentum.rsi(&prices, RsiParams { period: 14 }),
            Err(IndicatorError::InsufficientData { required: 14, provided: 2 })
        ));
        assert!(matches!(
            momentum.rsi(&prices, RsiParams { period: 0 }),
            Err(IndicatorError::InvalidParameter(_))
        ));
    }
}
