//! 지표 기반 매매 시그널.
//!
//! 지표 값을 {-1, 0, +1}의 개별 시그널로 이산화하고, 네 개 시그널의
//! 평균(Overall)으로 BUY / SELL / HOLD 추천과 신뢰도를 산출합니다.
//!
//! | 지표 | +1 | -1 |
//! |---|---|---|
//! | RSI | RSI < 과매도 | RSI > 과매수 |
//! | MACD | MACD > 시그널 | MACD < 시그널 |
//! | 이동평균 | 단기 SMA > 장기 SMA | 단기 SMA < 장기 SMA |
//! | 볼린저 | 종가 < 하단 | 종가 > 상단 |
//!
//! 시그널은 매 호출마다 새로 계산되며 저장되지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

use advisor_core::DecimalExt;

use crate::indicators::{IndicatorRow, IndicatorSet};

/// 개별 지표 시그널.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// 매수 (+1)
    Bullish,
    /// 중립 (0)
    Neutral,
    /// 매도 (-1)
    Bearish,
}

impl Signal {
    /// 수치 값 (+1, 0, -1).
    pub fn value(&self) -> i8 {
        match self {
            Signal::Bullish => 1,
            Signal::Neutral => 0,
            Signal::Bearish => -1,
        }
    }

    /// 비교 결과를 시그널로 변환합니다. `Greater`가 매수입니다.
    fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Greater => Signal::Bullish,
            Ordering::Less => Signal::Bearish,
            Ordering::Equal => Signal::Neutral,
        }
    }
}

/// 최종 추천.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Buy => write!(f, "BUY"),
            Recommendation::Sell => write!(f, "SELL"),
            Recommendation::Hold => write!(f, "HOLD"),
        }
    }
}

/// 시그널 임계값.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    /// RSI 과매도 기준 (기본: 30)
    pub rsi_oversold: Decimal,
    /// RSI 과매수 기준 (기본: 70)
    pub rsi_overbought: Decimal,
    /// Overall이 이 값을 초과하면 BUY (기본: 0.2)
    pub buy_threshold: Decimal,
    /// Overall이 이 값 미만이면 SELL (기본: -0.2)
    pub sell_threshold: Decimal,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: dec!(30),
            rsi_overbought: dec!(70),
            buy_threshold: dec!(0.2),
            sell_threshold: dec!(-0.2),
        }
    }
}

/// 한 시점의 시그널 벡터.
///
/// 지표가 정의되지 않은 시점의 개별 시그널은 `None`이고, Overall 계산에서는 0으로 취급합니다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalVector {
    pub timestamp: Option<DateTime<Utc>>,
    pub rsi: Option<Signal>,
    pub macd: Option<Signal>,
    pub moving_average: Option<Signal>,
    pub bollinger: Option<Signal>,
    /// 네 시그널의 평균, [-1, 1]
    pub overall: Decimal,
}

impl SignalVector {
    /// 개별 시그널 목록.
    pub fn components(&self) -> [Option<Signal>; 4] {
        [self.rsi, self.macd, self.moving_average, self.bollinger]
    }
}

/// 추천 결과.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalRecommendation {
    pub action: Recommendation,
    /// round(|Overall| × 100), 0-100
    pub confidence: u8,
    pub overall: Decimal,
    pub timestamp: Option<DateTime<Utc>>,
}

/// 시그널 생성기.
#[derive(Debug, Default, Clone)]
pub struct SignalGenerator {
    thresholds: SignalThresholds,
}

impl SignalGenerator {
    /// 새 시그널 생성기.
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }

    /// 전 시점의 시그널 벡터를 생성합니다.
    pub fn generate(&self, indicators: &IndicatorSet) -> Vec<SignalVector> {
        indicators.rows().map(|row| self.evaluate(&row)).collect()
    }

    /// 한 시점의 지표로 시그널 벡터를 계산합니다.
    pub fn evaluate(&self, row: &IndicatorRow) -> SignalVector {
        let rsi = row.rsi.map(|rsi| {
            if rsi < self.thresholds.rsi_oversold {
                Signal::Bullish
            } else if rsi > self.thresholds.rsi_overbought {
                Signal::Bearish
            } else {
                Signal::Neutral
            }
        });

        let macd = match (row.macd, row.macd_signal) {
            (Some(macd), Some(signal)) => Some(Signal::from_ordering(macd.cmp(&signal))),
            _ => None,
        };

        let moving_average = match (row.sma_short, row.sma_long) {
            (Some(short), Some(long)) => Some(Signal::from_ordering(short.cmp(&long))),
            _ => None,
        };

        let bollinger = match (row.bb_lower, row.bb_upper) {
            (Some(lower), Some(upper)) => Some(if row.close < lower {
                Signal::Bullish
            } else if row.close > upper {
                Signal::Bearish
            } else {
                Signal::Neutral
            }),
            _ => None,
        };

        let sum: i32 = [rsi, macd, moving_average, bollinger]
            .iter()
            .map(|s| s.map_or(0, |s| i32::from(s.value())))
            .sum();

        SignalVector {
            timestamp: row.timestamp,
            rsi,
            macd,
            moving_average,
            bollinger,
            overall: Decimal::from(sum) / dec!(4),
        }
    }

    /// Overall 값으로 추천을 결정합니다.
    ///
    /// 임계값과 정확히 같은 값은 HOLD입니다.
    pub fn classify(&self, overall: Decimal) -> Recommendation {
        if overall > self.thresholds.buy_threshold {
            Recommendation::Buy
        } else if overall < self.thresholds.sell_threshold {
            Recommendation::Sell
        } else {
            Recommendation::Hold
        }
    }

    /// Overall 값의 신뢰도, round(|Overall| × 100).
    pub fn confidence(overall: Decimal) -> u8 {
        (overall.abs() * dec!(100))
            .round_half_up(0)
            .min(dec!(100))
            .to_u8()
            .unwrap_or(0)
    }

    /// 가장 최근 시그널 벡터로 추천을 만듭니다. 비어 있으면 `None`.
    pub fn recommend(&self, signals: &[SignalVector]) -> Option<SignalRecommendation> {
        let latest = signals.last()?;
        let action = self.classify(latest.overall);
        let confidence = Self::confidence(latest.overall);

        debug!(
            overall = %latest.overall,
            action = %action,
            confidence,
            "Recommendation derived"
        );

        Some(SignalRecommendation {
            action,
            confidence,
            overall: latest.overall,
            timestamp: latest.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> IndicatorRow {
        IndicatorRow {
            close: dec!(100),
            ..Default::default()
        }
    }

    #[test]
    fn test_all_undefined_is_hold() {
        let generator = SignalGenerator::default();
        let vector = generator.evaluate(&row());

        assert!(vector.components().iter().all(|s| s.is_none()));
        assert_eq!(vector.overall, Decimal::ZERO);
        assert_eq!(generator.classify(vector.overall), Recommendation::Hold);
    }

    #[test]
    fn test_strong_buy() {
        let generator = SignalGenerator::default();
        let vector = generator.evaluate(&IndicatorRow {
            rsi: Some(dec!(25)),
            macd: Some(dec!(1.5)),
            macd_signal: Some(dec!(1.0)),
            sma_short: Some(dec!(110)),
            sma_long: Some(dec!(105)),
            bb_upper: Some(dec!(120)),
            bb_lower: Some(dec!(101)),
            ..row()
        });

        assert_eq!(vector.overall, dec!(1));
        let rec = generator.recommend(&[vector]).unwrap();
        assert_eq!(rec.action, Recommendation::Buy);
        assert_eq!(rec.confidence, 100);
    }

    #[test]
    fn test_mixed_signals() {
        let generator = SignalGenerator::default();
        // RSI 과매수(-1), MACD 상향(+1), 이동평균 하향(-1), 밴드 내부(0)
        let vector = generator.evaluate(&IndicatorRow {
            rsi: Some(dec!(75)),
            macd: Some(dec!(2)),
            macd_signal: Some(dec!(1)),
            sma_short: Some(dec!(90)),
            sma_long: Some(dec!(95)),
            bb_upper: Some(dec!(110)),
            bb_lower: Some(dec!(90)),
            ..row()
        });

        assert_eq!(vector.overall, dec!(-0.25));
        assert_eq!(generator.classify(vector.overall), Recommendation::Sell);
        assert_eq!(SignalGenerator::confidence(vector.overall), 25);
    }

    #[test]
    fn test_threshold_boundaries() {
        let generator = SignalGenerator::default();
        assert_eq!(generator.classify(dec!(0.2)), Recommendation::Hold);
        assert_eq!(generator.classify(dec!(0.2000001)), Recommendation::Buy);
        assert_eq!(generator.classify(dec!(-0.2)), Recommendation::Hold);
        assert_eq!(generator.classify(dec!(-0.2000001)), Recommendation::Sell);
    }

    #[test]
    fn test_rsi_boundaries_neutral() {
        let generator = SignalGenerator::default();
        for value in [dec!(30), dec!(50), dec!(70)] {
            let vector = generator.evaluate(&IndicatorRow {
                rsi: Some(value),
                ..row()
            });
            assert_eq!(vector.rsi, Some(Signal::Neutral));
        }
    }

    #[test]
    fn test_recommend_empty() {
        assert!(SignalGenerator::default().recommend(&[]).is_none());
    }
}
