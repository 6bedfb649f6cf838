//! 예측 정확도 지표와 종합 신뢰도 점수.
//!
//! 신뢰도 = 100 × (0.3·max(0, R²) + 0.3·방향 정확도
//!               + 0.2·max(0, 100 − MAPE)/100 + 0.2·max(0, 1 − MSE/Var(실제값)))
//!
//! 결과는 [0, 100]으로 제한되며, 유한하지 않은 항은 0으로 처리합니다.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MlError, MlResult};

const R2_WEIGHT: f64 = 0.3;
const DIRECTION_WEIGHT: f64 = 0.3;
const MAPE_WEIGHT: f64 = 0.2;
const MSE_WEIGHT: f64 = 0.2;

/// 정확도 지표.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    /// 평균 절대 백분율 오차 (%). 실제값이 0인 샘플은 제외하며, 모두 제외되면 None.
    pub mape: Option<f64>,
    /// 결정계수. 실제값 분산이 0이면 완전 일치 시 1, 아니면 0.
    pub r2: f64,
    /// 전일 대비 방향이 일치한 비율 (0 ~ 1). 두 점 미만이면 None.
    pub directional_accuracy: Option<f64>,
    /// 종합 신뢰도 (0 ~ 100)
    pub confidence_score: f64,
}

/// 정확도 평가기.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccuracyScorer;

impl AccuracyScorer {
    /// 새 평가기.
    pub fn new() -> Self {
        Self
    }

    /// 실제값과 예측값으로 정확도 지표를 계산합니다.
    ///
    /// 두 시퀀스는 길이가 같고 비어 있지 않으며 유한해야 합니다.
    pub fn score(&self, actual: &[f64], predicted: &[f64]) -> MlResult<AccuracyMetrics> {
        if actual.len() != predicted.len() {
            return Err(MlError::InvalidInput(format!(
                "length mismatch: actual {} vs predicted {}",
                actual.len(),
                predicted.len()
            )));
        }
        if actual.is_empty() {
            return Err(MlError::InvalidInput("empty sequences".to_string()));
        }
        if actual.iter().chain(predicted.iter()).any(|v| !v.is_finite()) {
            return Err(MlError::InvalidInput("non-finite value".to_string()));
        }

        let n = actual.len() as f64;
        let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();

        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let rmse = mse.sqrt();
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let mape = mean_absolute_percentage_error(actual, predicted);

        let mean_actual = actual.iter().sum::<f64>() / n;
        let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        let directional_accuracy = directional_accuracy(actual, predicted);
        let variance = ss_tot / n;

        let confidence_score = confidence_score(r2, directional_accuracy, mape, mse, variance);

        debug!(mse, mae, r2, ?mape, ?directional_accuracy, confidence_score, "Accuracy scored");

        Ok(AccuracyMetrics {
            mse,
            rmse,
            mae,
            mape,
            r2,
            directional_accuracy,
            confidence_score,
        })
    }
}

/// MAPE (%). 실제값이 0인 샘플은 평균에서 제외합니다.
fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let terms: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, p)| ((a - p) / a).abs())
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.iter().sum::<f64>() / terms.len() as f64 * 100.0)
    }
}

/// 전일 대비 변화 부호가 일치한 비율. 변화 없음(0)끼리도 일치로 봅니다.
fn directional_accuracy(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() < 2 {
        return None;
    }

    let hits = actual
        .windows(2)
        .zip(predicted.windows(2))
        .filter(|(a, p)| sign(a[1] - a[0]) == sign(p[1] - p[0]))
        .count();

    Some(hits as f64 / (actual.len() - 1) as f64)
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// 가중 합산 신뢰도 점수 (0 ~ 100).
pub fn confidence_score(
    r2: f64,
    directional_accuracy: Option<f64>,
    mape: Option<f64>,
    mse: f64,
    variance: f64,
) -> f64 {
    let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };

    let r2_term = finite_or_zero(r2.max(0.0));
    let direction_term = finite_or_zero(directional_accuracy.unwrap_or(0.0).clamp(0.0, 1.0));
    let mape_term = mape.map_or(0.0, |m| finite_or_zero((100.0 - m).max(0.0) / 100.0));
    let mse_term = if variance > 0.0 {
        finite_or_zero((1.0 - mse / variance).max(0.0))
    } else if mse == 0.0 {
        1.0
    } else {
        0.0
    };

    let score = 100.0
        * (R2_WEIGHT * r2_term
            + DIRECTION_WEIGHT * direction_term
            + MAPE_WEIGHT * mape_term
            + MSE_WEIGHT * mse_term);

    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
