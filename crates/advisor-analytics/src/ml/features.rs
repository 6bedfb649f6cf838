//! 시퀀스 모델을 위한 feature engineering.
//!
//! 종가 시계열을 `[가격, 수익률, 변동성, 모멘텀]` 4열 행렬로 만들고,
//! 열별 min-max 스케일링 후 `lookback` 길이의 윈도우와 한 스텝 뒤 가격 레이블로 자릅니다.
//!
//! 스케일러는 전체 표본으로 학습하므로 검증/테스트 구간 정보가 학습 입력에 섞입니다
//! (미래 정보 누출). 기존 동작과의 일관성을 위해 유지합니다.

use ndarray::{s, Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ml::{MlError, MlResult};

/// feature 열 수.
pub const FEATURE_COUNT: usize = 4;

/// 가격 열 인덱스.
pub const PRICE_COLUMN: usize = 0;

/// feature 추출 설정.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// 윈도우 길이 (기본: 60)
    pub lookback: usize,
    /// 학습 구간 비율 (기본: 0.7)
    pub train_ratio: f64,
    /// 검증 구간 비율 (기본: 0.15)
    pub validation_ratio: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lookback: 60,
            train_ratio: 0.7,
            validation_ratio: 0.15,
        }
    }
}

impl FeatureConfig {
    /// 분할 비율 검증. 두 비율은 양수이고 합이 1 미만이어야 합니다.
    pub fn validate(&self) -> MlResult<()> {
        let (train, validation) = (self.train_ratio, self.validation_ratio);
        let positive = |r: f64| r.is_finite() && r > 0.0;
        if !positive(train) || !positive(validation) || train + validation >= 1.0 {
            return Err(MlError::InvalidInput(format!(
                "split ratios must be positive and sum below 1, got {} and {}",
                train, validation
            )));
        }
        Ok(())
    }

    /// 세 구간이 모두 비지 않는 최소 종가 수.
    ///
    /// 비율이 유효하면 `floor(W·t) + floor(W·v) <= W·(t + v) < W`이므로 테스트 구간은
    /// 항상 남습니다. 학습과 검증 구간이 각각 1개 이상인 최소 W는 `max(ceil(1/t), ceil(1/v))`.
    pub fn min_prices_required(&self) -> usize {
        let windows = [self.train_ratio, self.validation_ratio]
            .into_iter()
            .map(|ratio| (1.0 / ratio).ceil() as usize)
            .max()
            .unwrap_or(1)
            .max(1);
        // ceil(1/r)·r가 부동소수점 오차로 1 아래로 떨어지는 경계
        let windows = match split_sizes(windows, self.train_ratio, self.validation_ratio) {
            Some(_) => windows,
            None => windows.saturating_add(1),
        };
        // 수익률 계산으로 1개, 윈도우로 lookback개가 소모됨
        windows.saturating_add(self.lookback).saturating_add(1)
    }
}

/// 열별 min-max 스케일러.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl MinMaxScaler {
    /// 행렬의 열별 최소/최대값을 학습합니다.
    pub fn fit(data: &Array2<f64>) -> Self {
        let (min, max) = data
            .axis_iter(Axis(1))
            .map(|col| {
                col.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
            })
            .unzip();
        Self { min, max }
    }

    /// [0, 1]로 변환합니다. 상수 열은 0이 됩니다.
    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        let mut out = data.clone();
        for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
            let range = self.max[j] - self.min[j];
            col.mapv_inplace(|v| if range > 0.0 { (v - self.min[j]) / range } else { 0.0 });
        }
        out
    }

    /// 한 열의 스케일된 값을 원래 단위로 되돌립니다.
    pub fn inverse(&self, column: usize, value: f64) -> f64 {
        value * (self.max[column] - self.min[column]) + self.min[column]
    }

    /// 한 열의 원래 값을 [0, 1]로 변환합니다.
    pub fn scale(&self, column: usize, value: f64) -> f64 {
        let range = self.max[column] - self.min[column];
        if range > 0.0 {
            (value - self.min[column]) / range
        } else {
            0.0
        }
    }
}

/// 학습/검증/테스트 구간 하나.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    /// 입력 윈도우 `[샘플, lookback, feature]`
    pub x: Array3<f64>,
    /// 스케일된 다음 스텝 가격
    pub y: Array1<f64>,
    /// 레이블이 가리키는 원래 종가 인덱스
    pub target_indices: Vec<usize>,
}

impl DatasetSplit {
    /// 샘플 수.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// 빈 구간 여부.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// 시퀀스 모델 입력 데이터셋.
#[derive(Debug, Clone)]
pub struct SequenceDataset {
    pub train: DatasetSplit,
    pub validation: DatasetSplit,
    pub test: DatasetSplit,
    pub scaler: MinMaxScaler,
    /// 마지막 `lookback` 행 (스케일됨), 미래 예측의 시작 윈도우
    pub last_window: Array2<f64>,
}

/// feature 엔지니어.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    /// 주어진 설정으로 생성.
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// 설정 반환.
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// 스케일 전 feature 행렬 `[종가 수 - 1, 4]`.
    ///
    /// 첫 종가는 수익률 계산에 쓰이고 제외됩니다. 변동성과 모멘텀의
    /// 처음 `lookback - 1`개는 첫 정의값으로 채웁니다.
    pub fn feature_matrix(&self, closes: &[f64]) -> MlResult<Array2<f64>> {
        let lookback = self.config.lookback;
        if lookback < 2 {
            return Err(MlError::InvalidInput(format!(
                "lookback must be at least 2, got {}",
                lookback
            )));
        }
        if closes.len() < lookback + 1 {
            return Err(MlError::InsufficientData {
                required: lookback + 1,
                actual: closes.len(),
            });
        }
        if let Some(bad) = closes.iter().position(|p| !p.is_finite() || *p <= 0.0) {
            return Err(MlError::FeatureExtraction(format!(
                "non-positive or non-finite price at index {}",
                bad
            )));
        }

        let returns: Vec<f64> = closes.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
        let volatility = backfill(rolling(&returns, lookback, sample_std), lookback);
        let momentum = backfill(rolling(&returns, lookback, mean), lookback);

        let rows = returns.len();
        let mut matrix = Array2::zeros((rows, FEATURE_COUNT));
        for i in 0..rows {
            matrix[[i, 0]] = closes[i + 1];
            matrix[[i, 1]] = returns[i];
            matrix[[i, 2]] = volatility[i];
            matrix[[i, 3]] = momentum[i];
        }

        Ok(matrix)
    }

    /// 윈도우 데이터셋을 만들고 시간순으로 70/15/15 분할합니다.
    pub fn prepare(&self, closes: &[f64]) -> MlResult<SequenceDataset> {
        self.config.validate()?;
        let lookback = self.config.lookback;
        let raw = self.feature_matrix(closes)?;
        let scaler = MinMaxScaler::fit(&raw);
        let scaled = scaler.transform(&raw);

        let rows = scaled.nrows();
        let windows = rows.saturating_sub(lookback);
        let (train_len, val_len) = split_sizes(windows, self.config.train_ratio, self.config.validation_ratio)
            .ok_or_else(|| MlError::InsufficientData {
                required: self.config.min_prices_required(),
                actual: closes.len(),
            })?;

        let mut x = Array3::zeros((windows, lookback, FEATURE_COUNT));
        let mut y = Array1::zeros(windows);
        let mut targets = Vec::with_capacity(windows);
        for (w, i) in (lookback..rows).enumerate() {
            x.slice_mut(s![w, .., ..]).assign(&scaled.slice(s![i - lookback..i, ..]));
            y[w] = scaled[[i, PRICE_COLUMN]];
            // feature 행 i는 종가 i + 1에 대응
            targets.push(i + 1);
        }

        let split = |start: usize, end: usize| DatasetSplit {
            x: x.slice(s![start..end, .., ..]).to_owned(),
            y: y.slice(s![start..end]).to_owned(),
            target_indices: targets[start..end].to_vec(),
        };

        let train_end = train_len;
        let val_end = train_len + val_len;
        let dataset = SequenceDataset {
            train: split(0, train_end),
            validation: split(train_end, val_end),
            test: split(val_end, windows),
            last_window: scaled.slice(s![rows - lookback..rows, ..]).to_owned(),
            scaler,
        };

        debug!(
            windows,
            train = dataset.train.len(),
            validation = dataset.validation.len(),
            test = dataset.test.len(),
            "Sequence dataset prepared"
        );

        Ok(dataset)
    }
}

/// (학습, 검증) 크기. 테스트는 나머지. 한 구간이라도 비면 None.
fn split_sizes(windows: usize, train_ratio: f64, validation_ratio: f64) -> Option<(usize, usize)> {
    let train = (windows as f64 * train_ratio).floor() as usize;
    let validation = (windows as f64 * validation_ratio).floor() as usize;
    let used = train.checked_add(validation)?;
    if train == 0 || validation == 0 || used >= windows {
        return None;
    }
    Some((train, validation))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    var.sqrt()
}

/// 윈도우 통계. 처음 `window - 1`개는 None.
fn rolling(values: &[f64], window: usize, stat: fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                Some(stat(&values[i + 1 - window..=i]))
            }
        })
        .collect()
}

/// 앞쪽 미정의 구간을 첫 정의값으로 채웁니다.
fn backfill(values: Vec<Option<f64>>, window: usize) -> Vec<f64> {
    let first = values.get(window - 1).copied().flatten().unwrap_or(0.0);
    values.into_iter().map(|v| v.unwrap_or(first)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1).collect()
    }

    #[test]
    fn test_feature_matrix_shape_and_backfill() {
        let engineer = FeatureEngineer::new(FeatureConfig {
            lookback: 5,
            ..Default::default()
        });
        let prices = closes(30);

        let matrix = engineer.feature_matrix(&prices).unwrap();

        assert_eq!(matrix.dim(), (29, FEATURE_COUNT));
        assert_eq!(matrix[[0, 0]], prices[1]);
        assert!((matrix[[0, 1]] - (prices[1] - prices[0]) / prices[0]).abs() < 1e-12);
        // 처음 4개는 5번째 값으로 채워짐
        for i in 0..4 {
            assert_eq!(matrix[[i, 2]], matrix[[4, 2]]);
            assert_eq!(matrix[[i, 3]], matrix[[4, 3]]);
        }
    }

    #[test]
    fn test_scaler_range_and_inverse() {
        let data = ndarray::array![[1.0, 5.0], [3.0, 5.0], [2.0, 5.0]];
        let scaler = MinMaxScaler::fit(&data);
        let scaled = scaler.transform(&data);

        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 1.0, 0.5]);
        // 상수 열은 0
        assert!(scaled.column(1).iter().all(|v| *v == 0.0));
        assert!((scaler.inverse(0, 0.5) - 2.0).abs() < 1e-12);
        assert!((scaler.scale(0, 2.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_prepare_chronological_split() {
        let engineer = FeatureEngineer::new(FeatureConfig {
            lookback: 10,
            ..Default::default()
        });
        let prices = closes(111);

        let dataset = engineer.prepare(&prices).unwrap();

        // 110개 행, 100개 윈도우 → 70 / 15 / 15
        assert_eq!(dataset.train.len(), 70);
        assert_eq!(dataset.validation.len(), 15);
        assert_eq!(dataset.test.len(), 15);
        assert_eq!(dataset.train.x.dim(), (70, 10, FEATURE_COUNT));
        assert_eq!(dataset.train.target_indices[0], 11);
        assert_eq!(*dataset.test.target_indices.last().unwrap(), 110);
        assert!(dataset.train.target_indices.last() < dataset.validation.target_indices.first());

        // 레이블은 스케일된 목표 종가
        let idx = dataset.test.target_indices[3];
        let restored = dataset.scaler.inverse(PRICE_COLUMN, dataset.test.y[3]);
        assert!((restored - prices[idx]).abs() < 1e-9);
        assert_eq!(dataset.last_window.dim(), (10, FEATURE_COUNT));
    }

    #[test]
    fn test_prepare_insufficient_data() {
        let engineer = FeatureEngineer::default();
        let result = engineer.prepare(&closes(64));
        assert!(matches!(result, Err(MlError::InsufficientData { .. })));

        let required = engineer.config().min_prices_required();
        assert!(engineer.prepare(&closes(required)).is_ok());
        assert!(engineer.prepare(&closes(required - 1)).is_err());
    }

    #[test]
    fn test_min_prices_required_is_tight() {
        for (train_ratio, validation_ratio) in [(0.7, 0.15), (0.6, 0.2), (0.5, 0.1), (0.8, 0.1), (0.34, 0.33)] {
            let config = FeatureConfig {
                lookback: 5,
                train_ratio,
                validation_ratio,
            };
            let windows = config.min_prices_required() - config.lookback - 1;
            assert!(split_sizes(windows, train_ratio, validation_ratio).is_some());
            assert!(split_sizes(windows - 1, train_ratio, validation_ratio).is_none());
        }
        assert_eq!(FeatureConfig::default().min_prices_required(), 68);
    }

    #[test]
    fn test_invalid_split_ratios() {
        for (train_ratio, validation_ratio) in [(0.0, 0.15), (0.7, 0.35), (0.9, 0.2), (0.7, f64::NAN)] {
            let engineer = FeatureEngineer::new(FeatureConfig {
                lookback: 5,
                train_ratio,
                validation_ratio,
            });
            assert!(matches!(engineer.prepare(&closes(200)), Err(MlError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_rejects_non_positive_prices() {
        let engineer = FeatureEngineer::new(FeatureConfig {
            lookback: 2,
            ..Default::default()
        });
        let result = engineer.feature_matrix(&[1.0, 0.0, 2.0, 3.0]);
        assert!(matches!(result, Err(MlError::FeatureExtraction(_))));
    }
}
