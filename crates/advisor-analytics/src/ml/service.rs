//! 예측 서비스 - 시퀀스 모델과 확률적 시뮬레이터를 함께 실행하고 요약합니다.
//!
//! 한 모델이 학습에 실패해도 다른 모델 결과는 유지되며, 실패한 모델은
//! [`ModelForecast::Unavailable`]로 보고됩니다.

use advisor_core::analysis_span;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use super::features::FeatureConfig;
use super::predictor::{SequenceConfig, SequencePredictor};
use super::simulator::{SimulatorConfig, StochasticSimulator};
use super::types::{ModelKind, PredictionDirection, PredictionResult, TrainingHistory};
use super::{MlError, MlResult};

/// 모델별 시드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSeeds {
    pub sequence: u64,
    pub stochastic: u64,
}

impl ForecastSeeds {
    /// 두 모델에 같은 시드.
    pub fn uniform(seed: u64) -> Self {
        Self {
            sequence: seed,
            stochastic: seed,
        }
    }
}

impl Default for ForecastSeeds {
    fn default() -> Self {
        Self::uniform(42)
    }
}

/// 한 모델의 예측 결과 또는 사용 불가 사유.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelForecast {
    Available(PredictionResult),
    Unavailable { reason: String },
}

impl ModelForecast {
    /// 예측 결과 (사용 가능한 경우).
    pub fn prediction(&self) -> Option<&PredictionResult> {
        match self {
            ModelForecast::Available(prediction) => Some(prediction),
            ModelForecast::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ModelForecast::Available(_))
    }
}

/// 두 모델의 방향 합의.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Consensus {
    /// 두 모델 모두 상승 예상
    StrongBullish,
    /// 두 모델 모두 하락 예상
    StrongBearish,
    /// 방향 불일치 또는 변화 없음
    Mixed,
}

impl Consensus {
    /// 두 모델의 변화율로 합의를 정합니다.
    pub fn from_changes(sequence_change: f64, stochastic_change: f64) -> Self {
        match (
            PredictionDirection::from_change(sequence_change),
            PredictionDirection::from_change(stochastic_change),
        ) {
            (PredictionDirection::Up, PredictionDirection::Up) => Consensus::StrongBullish,
            (PredictionDirection::Down, PredictionDirection::Down) => Consensus::StrongBearish,
            _ => Consensus::Mixed,
        }
    }
}

impl fmt::Display for Consensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consensus::StrongBullish => write!(f, "Strong Bullish"),
            Consensus::StrongBearish => write!(f, "Strong Bearish"),
            Consensus::Mixed => write!(f, "Mixed"),
        }
    }
}

/// 한 모델의 요약 전망.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOutlook {
    pub predicted_price: f64,
    /// 현재가 대비 변화율 (%)
    pub change_pct: f64,
    pub confidence_score: f64,
}

impl ModelOutlook {
    fn from_prediction(prediction: &PredictionResult, current_price: f64) -> Option<Self> {
        let predicted_price = prediction.final_prediction()?;
        Some(Self {
            predicted_price,
            change_pct: (predicted_price - current_price) / current_price * 100.0,
            confidence_score: prediction.metrics.confidence_score,
        })
    }
}

/// 예측 요약.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub current_price: f64,
    pub sequence: Option<ModelOutlook>,
    pub stochastic: Option<ModelOutlook>,
    /// 두 모델이 모두 사용 가능할 때만 존재
    pub consensus: Option<Consensus>,
    /// 확률 모델 90% 구간 반폭 (현재가 대비 ± %)
    pub band_pct: Option<f64>,
}

impl ForecastSummary {
    /// 두 모델 결과로 요약을 만듭니다.
    pub fn build(current_price: f64, sequence: &ModelForecast, stochastic: &ModelForecast) -> Self {
        let sequence_outlook = sequence
            .prediction()
            .and_then(|p| ModelOutlook::from_prediction(p, current_price));
        let stochastic_outlook = stochastic
            .prediction()
            .and_then(|p| ModelOutlook::from_prediction(p, current_price));

        let consensus = match (&sequence_outlook, &stochastic_outlook) {
            (Some(a), Some(b)) => Some(Consensus::from_changes(a.change_pct, b.change_pct)),
            _ => None,
        };

        let band_pct = stochastic.prediction().and_then(|p| {
            let upper = p.upper.as_ref()?.last()?;
            let lower = p.lower.as_ref()?.last()?;
            Some((upper - lower) / current_price / 2.0 * 100.0)
        });

        Self {
            current_price,
            sequence: sequence_outlook,
            stochastic: stochastic_outlook,
            consensus,
            band_pct,
        }
    }
}

/// 한 종목의 예측 보고서.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub symbol: String,
    pub seeds: ForecastSeeds,
    pub sequence: ModelForecast,
    /// 시퀀스 모델 학습 기록 (학습에 성공한 경우)
    pub history: Option<TrainingHistory>,
    pub stochastic: ModelForecast,
    pub summary: ForecastSummary,
}

/// 예측 서비스.
#[derive(Debug, Clone, Default)]
pub struct ForecastService {
    predictor: SequencePredictor,
    simulator: StochasticSimulator,
}

impl ForecastService {
    /// 새 서비스.
    pub fn new(features: FeatureConfig, sequence: SequenceConfig, simulator: SimulatorConfig) -> Self {
        Self {
            predictor: SequencePredictor::new(sequence, features),
            simulator: StochasticSimulator::new(simulator),
        }
    }

    /// 두 모델로 예측합니다.
    ///
    /// 빈 시계열은 `NoData`로 거부합니다. 복구 가능한 모델 에러는
    /// 해당 모델만 사용 불가로 표시하고, 그 외 에러는 그대로 반환합니다.
    pub fn forecast(&self, symbol: &str, closes: &[f64], seeds: ForecastSeeds) -> MlResult<ForecastReport> {
        let Some(&current_price) = closes.last() else {
            return Err(MlError::NoData(symbol.to_string()));
        };

        let (sequence, history) = {
            let _span = analysis_span!("model_forecast", symbol, ModelKind::Sequence).entered();
            match self.predictor.forecast(closes, seeds.sequence) {
                Ok(forecast) => (ModelForecast::Available(forecast.prediction), Some(forecast.history)),
                Err(e) => (unavailable(ModelKind::Sequence, symbol, e)?, None),
            }
        };
        let stochastic = {
            let _span = analysis_span!("model_forecast", symbol, ModelKind::Stochastic).entered();
            match self.simulator.forecast(closes, seeds.stochastic) {
                Ok(prediction) => ModelForecast::Available(prediction),
                Err(e) => unavailable(ModelKind::Stochastic, symbol, e)?,
            }
        };

        let summary = ForecastSummary::build(current_price, &sequence, &stochastic);
        info!(
            symbol,
            sequence = sequence.is_available(),
            stochastic = stochastic.is_available(),
            consensus = ?summary.consensus,
            "Forecast report ready"
        );

        Ok(ForecastReport {
            symbol: symbol.to_string(),
            seeds,
            sequence,
            history,
            stochastic,
            summary,
        })
    }
}

fn unavailable(model: ModelKind, symbol: &str, err: MlError) -> MlResult<ModelForecast> {
    if !err.is_recoverable() {
        return Err(err);
    }
    warn!(symbol, %model, error = %err, "Forecast unavailable");
    Ok(ModelForecast::Unavailable {
        reason: err.to_string(),
    })
}
