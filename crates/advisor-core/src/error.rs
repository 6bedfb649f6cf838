//! 자문 시스템의 공통 에러 타입.
//!
//! 시세 수집 결과 검증, 설정 로딩, 직렬화 등 분석 엔진 바깥 경계에서
//! 발생하는 에러를 정의합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 데이터 에러
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 빈 시계열 (수집 결과가 비어 있음)
    #[error("데이터 없음: {symbol}")]
    NoData { symbol: String },

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type AdvisorResult<T> = Result<T, AdvisorError>;

impl AdvisorError {
    /// 빈 데이터로 인한 에러인지 확인합니다.
    pub fn is_no_data(&self) -> bool {
        matches!(self, AdvisorError::NoData { .. })
    }

    /// 재시도 가능한 에러인지 확인합니다.
    ///
    /// 빈 수집 결과는 상위 수집기가 재시도할 수 있습니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdvisorError::NoData { .. })
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(err: serde_json::Error) -> Self {
        AdvisorError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for AdvisorError {
    fn from(err: config::ConfigError) -> Self {
        AdvisorError::Config(err.to_string())
    }
}
