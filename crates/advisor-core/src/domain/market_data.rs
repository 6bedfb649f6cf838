//! 시세 데이터 타입.
//!
//! - `Candle` - 일별 OHLCV 캔들
//! - `PriceSeries` - 한 심볼/기간의 시간순 캔들 시계열
//!
//! `PriceSeries`는 생성 후 변경되지 않습니다. 지표나 피처 등 파생 데이터는
//! 같은 인덱스에 정렬된 별도 구조체로 만들어집니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, AdvisorResult};
use crate::types::{DataPeriod, DecimalExt, Price, Volume};

/// OHLCV 캔들 데이터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 캔들 시각
    pub timestamp: DateTime<Utc>,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Volume,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Volume,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 시가/고가/저가를 종가로 채운 캔들을 생성합니다.
    ///
    /// 종가만 제공되는 데이터 소스나 테스트 픽스처에 사용합니다.
    pub fn from_close(timestamp: DateTime<Utc>, close: Price) -> Self {
        Self::new(timestamp, close, close, close, close, Decimal::ZERO)
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 양봉 여부.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// 한 심볼의 시간순 캔들 시계열.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    #[serde(default)]
    period: Option<DataPeriod>,
    candles: Vec<Candle>,
}

impl PriceSeries {
    /// 캔들 목록으로 시계열을 생성합니다.
    ///
    /// 타임스탬프는 엄격히 증가해야 하고 가격은 음수일 수 없습니다.
    /// 빈 목록은 허용되며, 분석 단계에서 `NoData`로 거부됩니다.
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> AdvisorResult<Self> {
        let symbol = symbol.into();

        for (i, candle) in candles.iter().enumerate() {
            if candle.close < Decimal::ZERO || candle.low < Decimal::ZERO {
                return Err(AdvisorError::InvalidInput(format!(
                    "{}: {}번째 캔들의 가격이 음수입니다",
                    symbol, i
                )));
            }
            if i > 0 && candles[i - 1].timestamp >= candle.timestamp {
                return Err(AdvisorError::InvalidInput(format!(
                    "{}: 타임스탬프가 시간순이 아닙니다 ({})",
                    symbol, candle.timestamp
                )));
            }
        }

        Ok(Self {
            symbol,
            period: None,
            candles,
        })
    }

    /// (타임스탬프, 종가) 쌍으로 시계열을 생성합니다.
    pub fn from_closes(
        symbol: impl Into<String>,
        points: impl IntoIterator<Item = (DateTime<Utc>, Price)>,
    ) -> AdvisorResult<Self> {
        let candles = points
            .into_iter()
            .map(|(ts, close)| Candle::from_close(ts, close))
            .collect();
        Self::new(symbol, candles)
    }

    /// 조회 기간을 기록합니다.
    pub fn with_period(mut self, period: DataPeriod) -> Self {
        self.period = Some(period);
        self
    }

    /// 심볼.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// 조회 기간.
    pub fn period(&self) -> Option<DataPeriod> {
        self.period
    }

    /// 캔들 슬라이스.
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// 캔들 수.
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// 빈 시계열 여부.
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// 빈 시계열이면 `NoData` 에러를 반환합니다.
    pub fn ensure_not_empty(&self) -> AdvisorResult<()> {
        if self.is_empty() {
            return Err(AdvisorError::NoData {
                symbol: self.symbol.clone(),
            });
        }
        Ok(())
    }

    /// 종가 목록.
    pub fn closes(&self) -> Vec<Price> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// `f64`로 변환한 종가 목록.
    pub fn closes_f64(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close.to_f64_lossy()).collect()
    }

    /// 타임스탬프 목록.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.candles.iter().map(|c| c.timestamp).collect()
    }

    /// 마지막 캔들.
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// 마지막 종가.
    pub fn last_close(&self) -> Option<Price> {
        self.candles.last().map(|c| c.close)
    }

    /// 종가 조회 (타임스탬프 기준 이진 탐색).
    pub fn close_at(&self, timestamp: DateTime<Utc>) -> Option<Price> {
        self.candles
            .binary_search_by(|c| c.timestamp.cmp(&timestamp))
            .ok()
            .map(|i| self.candles[i].close)
    }

    /// 기간에 해당하는 최근 캔들만 담은 새 시계열을 만듭니다.
    ///
    /// 이력이 기간보다 짧거나 `Max`이면 전체를 유지합니다.
    pub fn last_period(&self, period: DataPeriod) -> Self {
        let start = period
            .approx_trading_days()
            .map_or(0, |days| self.candles.len().saturating_sub(days));
        Self {
            symbol: self.symbol.clone(),
            period: Some(period),
            candles: self.candles[start..].to_vec(),
        }
    }
}
