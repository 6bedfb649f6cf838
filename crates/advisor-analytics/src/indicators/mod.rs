//! 기술적 지표 모듈.
//!
//! 가격 시계열로부터 시그널 생성에 필요한 기술적 지표를 계산합니다.
//! 모든 계산은 상태 없이 매 호출마다 전체 구간을 다시 계산합니다.
//!
//! # 지원 지표
//!
//! ## 추세 지표 (Trend Indicators)
//! - **SMA**: 단순 이동평균 (단기 50 / 장기 200)
//! - **EMA**: 지수 이동평균
//! - **MACD**: 이동평균 수렴/확산 (12/26/9)
//!
//! ## 모멘텀 지표 (Momentum Indicators)
//! - **RSI**: 상대강도지수 (14)
//!
//! ## 변동성 지표 (Volatility Indicators)
//! - **Bollinger Bands**: 볼린저 밴드 (20, 2σ)
//!
//! # 사용 예시
//!
//! ```ignore
//! use advisor_analytics::indicators::{IndicatorEngine, IndicatorParams};
//!
//! let engine = IndicatorEngine::new();
//! let set = engine.compute(&series, &IndicatorParams::default())?;
//! let latest_rsi = set.latest(IndicatorKind::Rsi);
//! ```

pub mod momentum;
pub mod trend;
pub mod volatility;

use std::fmt;

use advisor_core::PriceSeries;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use momentum::{MomentumCalculator, RsiParams};
pub use trend::{EmaParams, MacdParams, MacdResult, SmaParams, TrendIndicators};
pub use volatility::{BollingerBandsParams, BollingerBandsResult, VolatilityIndicators};

/// 지표 계산 오류.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 빈 시계열
    #[error("데이터 없음: {symbol}")]
    NoData { symbol: String },

    /// 데이터 부족 오류
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 계산 오류
    #[error("계산 오류: {0}")]
    CalculationError(String),
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// 지표 이름.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Rsi,
    Macd,
    MacdSignal,
    MacdHistogram,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
    SmaShort,
    SmaLong,
}

impl IndicatorKind {
    /// 전체 지표 목록.
    pub const ALL: [IndicatorKind; 9] = [
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::MacdSignal,
        IndicatorKind::MacdHistogram,
        IndicatorKind::BollingerUpper,
        IndicatorKind::BollingerMiddle,
        IndicatorKind::BollingerLower,
        IndicatorKind::SmaShort,
        IndicatorKind::SmaLong,
    ];

    /// 표시용 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::MacdSignal => "MACD_Signal",
            IndicatorKind::MacdHistogram => "MACD_Histogram",
            IndicatorKind::BollingerUpper => "BB_Upper",
            IndicatorKind::BollingerMiddle => "BB_Middle",
            IndicatorKind::BollingerLower => "BB_Lower",
            IndicatorKind::SmaShort => "SMA_Short",
            IndicatorKind::SmaLong => "SMA_Long",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 지표 파라미터 묶음.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    /// RSI 파라미터 (기본: 14)
    pub rsi: RsiParams,
    /// MACD 파라미터 (기본: 12/26/9)
    pub macd: MacdParams,
    /// 볼린저 밴드 파라미터 (기본: 20, 2σ)
    pub bollinger: BollingerBandsParams,
    /// 단기 이동평균 (기본: 50)
    pub sma_short: SmaParams,
    /// 장기 이동평균 (기본: 200)
    pub sma_long: SmaParams,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi: RsiParams::default(),
            macd: MacdParams::default(),
            bollinger: BollingerBandsParams::default(),
            sma_short: SmaParams { period: 50 },
            sma_long: SmaParams { period: 200 },
        }
    }
}

/// 한 시점의 지표 값.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub timestamp: Option<DateTime<Utc>>,
    pub close: Decimal,
    pub rsi: Option<Decimal>,
    pub macd: Option<Decimal>,
    pub macd_signal: Option<Decimal>,
    pub macd_histogram: Option<Decimal>,
    pub bb_upper: Option<Decimal>,
    pub bb_middle: Option<Decimal>,
    pub bb_lower: Option<Decimal>,
    pub sma_short: Option<Decimal>,
    pub sma_long: Option<Decimal>,
}

/// 시계열과 같은 인덱스에 정렬된 지표 묶음.
///
/// 윈도우가 채워지지 않은 시점의 값은 `None`이며 0으로 채우지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub timestamps: Vec<DateTime<Utc>>,
    pub closes: Vec<Decimal>,
    pub rsi: Vec<Option<Decimal>>,
    pub macd: Vec<Option<Decimal>>,
    pub macd_signal: Vec<Option<Decimal>>,
    pub macd_histogram: Vec<Option<Decimal>>,
    pub bb_upper: Vec<Option<Decimal>>,
    pub bb_middle: Vec<Option<Decimal>>,
    pub bb_lower: Vec<Option<Decimal>>,
    pub sma_short: Vec<Option<Decimal>>,
    pub sma_long: Vec<Option<Decimal>>,
}

impl IndicatorSet {
    /// 시점 수.
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    /// 빈 지표 묶음 여부.
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// 지표 열 전체.
    pub fn values(&self, kind: IndicatorKind) -> &[Option<Decimal>] {
        match kind {
            IndicatorKind::Rsi => &self.rsi,
            IndicatorKind::Macd => &self.macd,
            IndicatorKind::MacdSignal => &self.macd_signal,
            IndicatorKind::MacdHistogram => &self.macd_histogram,
            IndicatorKind::BollingerUpper => &self.bb_upper,
            IndicatorKind::BollingerMiddle => &self.bb_middle,
            IndicatorKind::BollingerLower => &self.bb_lower,
            IndicatorKind::SmaShort => &self.sma_short,
            IndicatorKind::SmaLong => &self.sma_long,
        }
    }

    /// 특정 시점의 지표 값.
    pub fn get(&self, kind: IndicatorKind, index: usize) -> Option<Decimal> {
        self.values(kind).get(index).copied().flatten()
    }

    /// 마지막 시점의 지표 값.
    pub fn latest(&self, kind: IndicatorKind) -> Option<Decimal> {
        self.values(kind).last().copied().flatten()
    }

    /// 지표가 정의된 시점 수.
    pub fn defined_count(&self, kind: IndicatorKind) -> usize {
        self.values(kind).iter().filter(|v| v.is_some()).count()
    }

    /// 특정 시점의 모든 지표 값. 범위를 벗어나면 `None`.
    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        let close = *self.closes.get(index)?;
        Some(IndicatorRow {
            timestamp: self.timestamps.get(index).copied(),
            close,
            rsi: self.get(IndicatorKind::Rsi, index),
            macd: self.get(IndicatorKind::Macd, index),
            macd_signal: self.get(IndicatorKind::MacdSignal, index),
            macd_histogram: self.get(IndicatorKind::MacdHistogram, index),
            bb_upper: self.get(IndicatorKind::BollingerUpper, index),
            bb_middle: self.get(IndicatorKind::BollingerMiddle, index),
            bb_lower: self.get(IndicatorKind::BollingerLower, index),
            sma_short: self.get(IndicatorKind::SmaShort, index),
            sma_long: self.get(IndicatorKind::SmaLong, index),
        })
    }

    /// 전체 시점의 행 반복자.
    pub fn rows(&self) -> impl Iterator<Item = IndicatorRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }
}

/// 통합 지표 엔진.
///
/// 모든 기술적 지표 계산을 위한 통합 인터페이스를 제공합니다.
#[derive(Debug, Default)]
pub struct IndicatorEngine {
    trend: TrendIndicators,
    momentum: MomentumCalculator,
    volatility: VolatilityIndicators,
}

impl IndicatorEngine {
    /// 새로운 지표 엔진 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 가격 시계열에 대해 전체 지표를 계산합니다.
    ///
    /// 빈 시계열은 `NoData`로 거부합니다. 이력이 윈도우보다 짧은 지표는
    /// 에러 대신 전 구간 `None`이 됩니다.
    pub fn compute(&self, series: &PriceSeries, params: &IndicatorParams) -> IndicatorResult<IndicatorSet> {
        if series.is_empty() {
            return Err(IndicatorError::NoData {
                symbol: series.symbol().to_string(),
            });
        }

        let closes = series.closes();
        let n = closes.len();

        let rsi = undefined_if_short(self.rsi(&closes, params.rsi), n, IndicatorKind::Rsi)?;

        let macd_rows = self.macd(&closes, params.macd).map(Some).or_else(|e| match e {
            IndicatorError::InsufficientData { .. } => Ok(None),
            other => Err(other),
        })?;
        let (macd, macd_signal, macd_histogram) = match macd_rows {
            Some(rows) => (
                rows.iter().map(|r| r.macd).collect(),
                rows.iter().map(|r| r.signal).collect(),
                rows.iter().map(|r| r.histogram).collect(),
            ),
            None => (vec![None; n], vec![None; n], vec![None; n]),
        };

        let bands = match self.bollinger_bands(&closes, params.bollinger) {
            Ok(bands) => bands,
            Err(IndicatorError::InsufficientData { required, provided }) => {
                warn!(
                    indicator = "bollinger",
                    required, provided, "Insufficient history, indicator undefined"
                );
                vec![BollingerBandsResult::default(); n]
            }
            Err(e) => return Err(e),
        };

        let sma_short = undefined_if_short(self.sma(&closes, params.sma_short), n, IndicatorKind::SmaShort)?;
        let sma_long = undefined_if_short(self.sma(&closes, params.sma_long), n, IndicatorKind::SmaLong)?;

        let set = IndicatorSet {
            timestamps: series.timestamps(),
            closes,
            rsi,
            macd,
            macd_signal,
            macd_histogram,
            bb_upper: bands.iter().map(|b| b.upper).collect(),
            bb_middle: bands.iter().map(|b| b.middle).collect(),
            bb_lower: bands.iter().map(|b| b.lower).collect(),
            sma_short,
            sma_long,
        };

        debug!(
            symbol = series.symbol(),
            points = n,
            rsi_defined = set.defined_count(IndicatorKind::Rsi),
            sma_long_defined = set.defined_count(IndicatorKind::SmaLong),
            "Indicators computed"
        );

        Ok(set)
    }

    // ==================== 추세 지표 ====================

    /// 단순 이동평균 (SMA) 계산.
    ///
    /// # 반환
    /// 계산된 SMA 값들의 벡터 (처음 period-1개는 None)
    pub fn sma(&self, prices: &[Decimal], params: SmaParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.trend.sma(prices, params)
    }

    /// 지수 이동평균 (EMA) 계산.
    pub fn ema(&self, prices: &[Decimal], params: EmaParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.trend.ema(prices, params)
    }

    /// MACD 계산.
    ///
    /// # 반환
    /// MACD 라인, 시그널 라인, 히스토그램
    pub fn macd(&self, prices: &[Decimal], params: MacdParams) -> IndicatorResult<Vec<MacdResult>> {
        self.trend.macd(prices, params)
    }

    // ==================== 모멘텀 지표 ====================

    /// RSI (Relative Strength Index) 계산.
    ///
    /// # 반환
    /// 0-100 사이의 RSI 값들
    pub fn rsi(&self, prices: &[Decimal], params: RsiParams) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.momentum.rsi(prices, params)
    }

    // ==================== 변동성 지표 ====================

    /// 볼린저 밴드 계산.
    ///
    /// # 반환
    /// 상단, 중간, 하단 밴드 값들
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Vec<BollingerBandsResult>> {
        self.volatility.bollinger_bands(prices, params)
    }
}

/// 데이터 부족 에러를 전 구간 `None`으로 바꿉니다.
fn undefined_if_short(
    result: IndicatorResult<Vec<Option<Decimal>>>,
    len: usize,
    kind: IndicatorKind,
) -> IndicatorResult<Vec<Option<Decimal>>> {
    match result {
        Ok(values) => Ok(values),
        Err(IndicatorError::InsufficientData { required, provided }) => {
            warn!(
                indicator = %kind,
                required, provided, "Insufficient history, indicator undefined"
            );
            Ok(vec![None; len])
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn series(closes: &[Decimal]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        PriceSeries::from_closes(
            "TEST",
            closes
                .iter()
                .enumerate()
                .map(|(i, c)| (start + Duration::days(i as i64), *c)),
        )
        .unwrap()
    }

    #[test]
    fn test_compute_aligned_columns() {
        let engine = IndicatorEngine::new();
        let closes: Vec<Decimal> = (0..250).map(|i| Decimal::from(100 + i % 10)).collect();

        let set = engine.compute(&series(&closes), &IndicatorParams::default()).unwrap();

        assert_eq!(set.len(), 250);
        for kind in IndicatorKind::ALL {
            assert_eq!(set.values(kind).len(), 250, "{kind}");
        }
        assert_eq!(set.defined_count(IndicatorKind::SmaLong), 51);
        assert_eq!(set.defined_count(IndicatorKind::SmaShort), 201);
        assert_eq!(set.defined_count(IndicatorKind::BollingerMiddle), 231);
        assert_eq!(set.defined_count(IndicatorKind::Rsi), 237);
        assert!(set.latest(IndicatorKind::Macd).is_some());
    }

    #[test]
    fn test_compute_short_history_leaves_undefined() {
        let engine = IndicatorEngine::new();
        let closes: Vec<Decimal> = (0..30).map(Decimal::from).collect();

        let set = engine.compute(&series(&closes), &IndicatorParams::default()).unwrap();

        assert_eq!(set.defined_count(IndicatorKind::SmaShort), 0);
        assert_eq!(set.defined_count(IndicatorKind::SmaLong), 0);
        assert_eq!(set.defined_count(IndicatorKind::BollingerUpper), 11);
        assert!(set.row(29).unwrap().sma_long.is_none());
    }

    #[test]
    fn test_compute_empty_is_no_data() {
        let engine = IndicatorEngine::new();
        let empty = PriceSeries::new("EMPTY", Vec::new()).unwrap();

        let result = engine.compute(&empty, &IndicatorParams::default());
        assert!(matches!(result, Err(IndicatorError::NoData { .. })));
    }

    #[test]
    fn test_row_access() {
        let engine = IndicatorEngine::new();
        let closes = vec![dec!(10), dec!(12), dec!(11), dec!(14), dec!(13)];
        let params = IndicatorParams {
            rsi: RsiParams { period: 2 },
            ..Default::default()
        };

        let set = engine.compute(&series(&closes), &params).unwrap();

        let row = set.row(1).unwrap();
        assert_eq!(row.close, dec!(12));
        assert_eq!(row.rsi, Some(dec!(100)));
        assert!(set.row(5).is_none());
        assert_eq!(set.rows().count(), 5);
    }
}
