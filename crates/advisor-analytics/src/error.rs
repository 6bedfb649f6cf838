//! 분석 크레이트 통합 에러.

use advisor_core::AdvisorError;
use thiserror::Error;

use crate::indicators::IndicatorError;
use crate::ml::MlError;
use crate::planning::PlanningError;
use crate::portfolio::PortfolioError;

/// 분석 서비스에서 발생하는 에러.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Core(#[from] AdvisorError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    #[error(transparent)]
    Forecast(#[from] MlError),

    #[error(transparent)]
    Planning(#[from] PlanningError),
}

/// 분석 작업을 위한 Result 타입.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

impl AnalyticsError {
    /// 빈 시계열로 인한 에러인지 확인.
    pub fn is_no_data(&self) -> bool {
        match self {
            AnalyticsError::Core(e) => e.is_no_data(),
            AnalyticsError::Indicator(e) => matches!(e, IndicatorError::NoData { .. }),
            AnalyticsError::Portfolio(e) => matches!(e, PortfolioError::NoData { .. }),
            AnalyticsError::Forecast(e) => matches!(e, MlError::NoData(_)),
            AnalyticsError::Planning(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_no_data() {
        let err: AnalyticsError = IndicatorError::NoData {
            symbol: "AAPL".to_string(),
        }
        .into();
        assert!(err.is_no_data());

        let err: AnalyticsError = MlError::NoData("AAPL".to_string()).into();
        assert!(err.is_no_data());

        let err: AnalyticsError = PortfolioError::TooFewAssets { provided: 1 }.into();
        assert!(!err.is_no_data());
    }

    #[test]
    fn test_transparent_message() {
        let err: AnalyticsError = MlError::InvalidInput("bad".to_string()).into();
        assert_eq!(err.to_string(), "Invalid input: bad");
    }
}
