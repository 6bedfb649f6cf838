//! LSTM 기반 다음 스텝 가격 예측.
//!
//! [`FeatureEngineer`]가 만든 윈도우 데이터셋으로 [`SequenceNetwork`]를 학습하고
//! 테스트 구간을 추론해 가격 단위로 되돌린 뒤 정확도를 평가합니다.

use ndarray::{Array1, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::accuracy::AccuracyScorer;
use super::features::{DatasetSplit, FeatureConfig, FeatureEngineer, SequenceDataset, PRICE_COLUMN};
use super::loss::HuberLoss;
use super::network::SequenceNetwork;
use super::optimizer::Adam;
use super::types::{ModelKind, PredictionResult, TrainingHistory};
use super::{MlError, MlResult};

/// 시퀀스 모델 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// 적층 LSTM 층별 유닛 수
    pub lstm_units: Vec<usize>,
    /// 은닉 Dense 층 유닛 수
    pub dense_units: usize,
    /// 각 LSTM 층 뒤 드롭아웃 비율
    pub dropout: f64,
    pub batch_size: usize,
    pub max_epochs: usize,
    /// 검증 손실이 개선되지 않아도 기다리는 에포크 수
    pub patience: usize,
    /// 개선으로 인정하는 최소 손실 감소량
    pub min_delta: f64,
    pub learning_rate: f64,
    pub huber_delta: f64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            lstm_units: vec![100, 50, 50],
            dense_units: 25,
            dropout: 0.3,
            batch_size: 32,
            max_epochs: 100,
            patience: 10,
            min_delta: 0.0,
            learning_rate: 0.001,
            huber_delta: 1.0,
        }
    }
}

/// 시퀀스 모델 예측과 학습 기록.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceForecast {
    pub prediction: PredictionResult,
    pub history: TrainingHistory,
}

/// LSTM 가격 예측기.
#[derive(Debug, Clone, Default)]
pub struct SequencePredictor {
    config: SequenceConfig,
    features: FeatureEngineer,
}

impl SequencePredictor {
    /// 새 예측기.
    pub fn new(config: SequenceConfig, feature_config: FeatureConfig) -> Self {
        Self {
            config,
            features: FeatureEngineer::new(feature_config),
        }
    }

    /// 설정 반환.
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// 종가 시퀀스로 학습 후 테스트 구간을 예측합니다.
    ///
    /// 가중치 초기화, 드롭아웃, 배치 셔플은 모두 `seed`에서 파생됩니다.
    pub fn forecast(&self, closes: &[f64], seed: u64) -> MlResult<SequenceForecast> {
        let dataset = self.features.prepare(closes)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let (network, history) = self.train(&dataset, &mut rng)?;

        let scaled = network.predict(&to_steps(&dataset.test.x));
        let predictions: Vec<f64> = scaled
            .iter()
            .map(|v| dataset.scaler.inverse(PRICE_COLUMN, *v))
            .collect();
        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(MlError::NumericalInstability(
                "non-finite prediction".to_string(),
            ));
        }

        let actual: Vec<f64> = dataset
            .test
            .target_indices
            .iter()
            .map(|&i| closes[i])
            .collect();
        let metrics = AccuracyScorer::new().score(&actual, &predictions)?;

        info!(
            epochs = history.epochs(),
            best_epoch = history.best_epoch,
            stopped_early = history.stopped_early,
            confidence = metrics.confidence_score,
            "Sequence forecast complete"
        );

        Ok(SequenceForecast {
            prediction: PredictionResult {
                model: ModelKind::Sequence,
                horizon: predictions.len(),
                predictions,
                lower: None,
                upper: None,
                actual,
                metrics,
            },
            history,
        })
    }

    /// 검증 손실 기준 조기 종료로 학습합니다. 최저 검증 손실 가중치를 복원해 반환합니다.
    pub fn train(
        &self,
        dataset: &SequenceDataset,
        rng: &mut StdRng,
    ) -> MlResult<(SequenceNetwork, TrainingHistory)> {
        let config = &self.config;
        if config.batch_size == 0 || config.max_epochs == 0 {
            return Err(MlError::InvalidInput(format!(
                "batch size and epochs must be positive, got {} and {}",
                config.batch_size, config.max_epochs
            )));
        }
        if dataset.train.is_empty() || dataset.validation.is_empty() {
            return Err(MlError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let input_size = dataset.train.x.len_of(Axis(2));
        let mut network = SequenceNetwork::new(
            input_size,
            &config.lstm_units,
            config.dense_units,
            config.dropout,
            rng,
        )?;
        let mut adam = Adam::new(config.learning_rate);
        let loss = HuberLoss::new(config.huber_delta);

        let validation_steps = to_steps(&dataset.validation.x);
        let mut order: Vec<usize> = (0..dataset.train.len()).collect();
        let mut history = TrainingHistory::default();
        let mut best_network = network.clone();
        let mut best_val_loss = f64::INFINITY;
        let mut patience_counter = 0;

        for epoch in 0..config.max_epochs {
            order.shuffle(rng);

            let mut epoch_loss = 0.0;
            for batch in order.chunks(config.batch_size) {
                let (x, y) = select_batch(&dataset.train, batch);
                let (predicted, cache) = network.forward_train(&x, rng);
                epoch_loss += loss.loss(&predicted, &y) * batch.len() as f64;

                let grad = loss.gradient(&predicted, &y);
                network.backward(&cache, &grad);
                adam.step(network.params_mut());
            }

            let train_loss = epoch_loss / dataset.train.len() as f64;
            let val_loss = loss.loss(&network.predict(&validation_steps), &dataset.validation.y);
            if !train_loss.is_finite() || !val_loss.is_finite() || !network.is_finite() {
                return Err(MlError::NumericalInstability(format!(
                    "loss diverged at epoch {} (train {}, validation {})",
                    epoch, train_loss, val_loss
                )));
            }

            history.train_loss.push(train_loss);
            history.val_loss.push(val_loss);
            debug!(epoch, train_loss, val_loss, "Epoch complete");

            if val_loss < best_val_loss - config.min_delta {
                best_val_loss = val_loss;
                best_network = network.clone();
                history.best_epoch = epoch;
                patience_counter = 0;
            } else {
                patience_counter += 1;
                if patience_counter >= config.patience {
                    info!(epoch, best_epoch = history.best_epoch, "Early stopping");
                    history.stopped_early = true;
                    break;
                }
            }
        }

        Ok((best_network, history))
    }
}

/// `[샘플, 시점, feature]` 텐서를 시점별 `[샘플, feature]` 행렬로 분해합니다.
fn to_steps(x: &Array3<f64>) -> Vec<Array2<f64>> {
    x.axis_iter(Axis(1)).map(|step| step.to_owned()).collect()
}

fn select_batch(split: &DatasetSplit, indices: &[usize]) -> (Vec<Array2<f64>>, Array1<f64>) {
    (
        to_steps(&split.x.select(Axis(0), indices)),
        split.y.select(Axis(0), indices),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 / 8.0).sin() + 0.05 * i as f64)
            .collect()
    }

    fn small_predictor() -> SequencePredictor {
        SequencePredictor::new(
            SequenceConfig {
                lstm_units: vec![6, 4],
                dense_units: 4,
                batch_size: 16,
                max_epochs: 15,
                patience: 5,
                learning_rate: 0.01,
                ..Default::default()
            },
            FeatureConfig {
                lookback: 10,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_forecast_covers_test_split() {
        let closes = synthetic_closes(120);
        let forecast = small_predictor().forecast(&closes, 7).unwrap();
        let prediction = &forecast.prediction;

        // 119개 feature 행 → 109개 윈도우 → 76 / 16 / 17
        assert_eq!(prediction.model, ModelKind::Sequence);
        assert_eq!(prediction.horizon, 17);
        assert_eq!(prediction.predictions.len(), 17);
        assert_eq!(prediction.actual, closes[103..].to_vec());
        assert!(prediction.predictions.iter().all(|p| p.is_finite()));
        assert!((0.0..=100.0).contains(&prediction.metrics.confidence_score));
    }

    #[test]
    fn test_history_tracks_best_epoch() {
        let closes = synthetic_closes(120);
        let history = small_predictor().forecast(&closes, 3).unwrap().history;

        assert!(history.epochs() >= 1 && history.epochs() <= 15);
        assert_eq!(history.train_loss.len(), history.val_loss.len());
        assert!(history.best_epoch < history.epochs());

        let min = history.val_loss.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(history.best_val_loss(), Some(min));
        if history.stopped_early {
            assert_eq!(history.epochs() - history.best_epoch - 1, 5);
        }
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let closes = synthetic_closes(120);
        let predictor = small_predictor();

        let a = predictor.forecast(&closes, 42).unwrap();
        let b = predictor.forecast(&closes, 42).unwrap();
        assert_eq!(a.prediction.predictions, b.prediction.predictions);
        assert_eq!(a.history.val_loss, b.history.val_loss);
    }

    #[test]
    fn test_insufficient_history() {
        let closes = synthetic_closes(12);
        let err = small_predictor().forecast(&closes, 1).unwrap_err();
        assert!(matches!(err, MlError::InsufficientData { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_invalid_training_config() {
        let mut predictor = small_predictor();
        predictor.config.batch_size = 0;
        let err = predictor.forecast(&synthetic_closes(120), 1).unwrap_err();
        assert!(matches!(err, MlError::InvalidInput(_)));
    }
}
