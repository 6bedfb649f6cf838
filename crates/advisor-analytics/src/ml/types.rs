//! ML 모듈의 공통 타입.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::accuracy::AccuracyMetrics;

/// 예측 모델 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// 순환 신경망(LSTM) 회귀 모델
    Sequence,
    /// 확률적 가격 경로 시뮬레이터
    Stochastic,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Sequence => write!(f, "sequence"),
            ModelKind::Stochastic => write!(f, "stochastic"),
        }
    }
}

/// 예측된 가격 이동 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionDirection {
    /// 가격 상승 예상
    Up,
    /// 가격 하락 예상
    Down,
    /// 변화 없음
    Flat,
}

impl PredictionDirection {
    /// 변화율의 부호로 방향을 정합니다.
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            PredictionDirection::Up
        } else if change < 0.0 {
            PredictionDirection::Down
        } else {
            PredictionDirection::Flat
        }
    }
}

/// 예측 신뢰도 수준.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    /// 낮은 신뢰도 (< 50)
    Low,
    /// 중간 신뢰도 (50 - 75)
    Medium,
    /// 높은 신뢰도 (75 - 90)
    High,
    /// 매우 높은 신뢰도 (>= 90)
    VeryHigh,
}

impl ConfidenceLevel {
    /// 신뢰도 점수(0 ~ 100)에서 변환.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => ConfidenceLevel::VeryHigh,
            s if s >= 75.0 => ConfidenceLevel::High,
            s if s >= 50.0 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }
}

/// 한 모델의 예측 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 모델 종류
    pub model: ModelKind,
    /// 예측 구간 길이
    pub horizon: usize,
    /// 점 예측 (가격 단위)
    pub predictions: Vec<f64>,
    /// 하단 신뢰 구간
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<Vec<f64>>,
    /// 상단 신뢰 구간
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Vec<f64>>,
    /// 정확도 평가에 사용한 실제 값
    pub actual: Vec<f64>,
    /// 정확도 지표
    pub metrics: AccuracyMetrics,
}

impl PredictionResult {
    /// 마지막 예측 가격.
    pub fn final_prediction(&self) -> Option<f64> {
        self.predictions.last().copied()
    }

    /// 신뢰도 수준.
    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.metrics.confidence_score)
    }
}

/// 에포크별 학습 기록.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// 에포크별 학습 손실
    pub train_loss: Vec<f64>,
    /// 에포크별 검증 손실
    pub val_loss: Vec<f64>,
    /// 최저 검증 손실 에포크 (0부터)
    pub best_epoch: usize,
    /// 조기 종료 여부
    pub stopped_early: bool,
}

impl TrainingHistory {
    /// 수행한 에포크 수.
    pub fn epochs(&self) -> usize {
        self.train_loss.len()
    }

    /// 최저 검증 손실.
    pub fn best_val_loss(&self) -> Option<f64> {
        self.val_loss.get(self.best_epoch).copied()
    }
}
