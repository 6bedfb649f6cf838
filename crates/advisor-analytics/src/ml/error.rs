//! ML 모듈 에러 타입.

use thiserror::Error;

/// ML 작업에서 발생할 수 있는 에러.
#[derive(Debug, Error)]
pub enum MlError {
    /// 빈 시계열
    #[error("No data: {0}")]
    NoData(String),

    /// 분석을 위한 데이터 부족
    #[error("Insufficient data: need {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// 유효하지 않은 입력 데이터
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 가격 시계열에서 feature 추출 에러
    #[error("Feature extraction error: {0}")]
    FeatureExtraction(String),

    /// 학습 에러
    #[error("Training error: {0}")]
    Training(String),

    /// 손실 또는 가중치가 유한하지 않음
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// 모델 추론 중 에러
    #[error("Inference error: {0}")]
    Inference(String),
}

/// ML 작업을 위한 Result 타입.
pub type MlResult<T> = Result<T, MlError>;

impl MlError {
    /// 예측 경계에서 "예측 불가"로 처리할 수 있는 에러인지 확인.
    ///
    /// 이 경우 다른 분석 결과는 그대로 유지됩니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MlError::InsufficientData { .. }
                | MlError::NumericalInstability(_)
                | MlError::Training(_)
                | MlError::FeatureExtraction(_)
        )
    }
}

impl From<ndarray::ShapeError> for MlError {
    fn from(err: ndarray::ShapeError) -> Self {
        MlError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MlError::InsufficientData {
            required: 67,
            actual: 50,
        };
        assert_eq!(err.to_string(), "Insufficient data: need 67 samples, got 50");

        let err = MlError::NumericalInstability("loss is NaN".to_string());
        assert_eq!(err.to_string(), "Numerical instability: loss is NaN");
    }

    #[test]
    fn test_error_recoverable() {
        assert!(MlError::InsufficientData { required: 100, actual: 50 }.is_recoverable());
        assert!(MlError::NumericalInstability("inf".to_string()).is_recoverable());
        assert!(!MlError::InvalidInput("mismatched lengths".to_string()).is_recoverable());
        assert!(!MlError::NoData("AAPL".to_string()).is_recoverable());
    }
}
