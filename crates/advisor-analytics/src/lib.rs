//! 개인 자산관리 대시보드용 정량 분석 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 기술적 지표 (RSI, MACD, 볼린저 밴드, SMA)
//! - 지표 기반 매매 시그널과 추천
//! - 몬테카를로 포트폴리오 최적화
//! - LSTM 시퀀스 모델과 확률 시뮬레이터 가격 예측
//! - 적립식 투자 계산기
//!
//! # Re-exports
//!
//! - [`indicators`]: 지표 계산 (IndicatorEngine, IndicatorSet 등)
//! - [`portfolio`]: 포트폴리오 최적화 (PortfolioOptimizer, OptimizationResult 등)
//! - [`ml`]: 가격 예측 (ForecastService, AccuracyScorer 등)

pub mod analysis;
pub mod config;
pub mod error;
pub mod indicators;
pub mod ml;
pub mod planning;
pub mod portfolio;
pub mod signals;

pub use analysis::{AnalysisService, StockAnalysis};
pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, AnalyticsResult};

// Indicators 모듈 re-exports
pub use indicators::{
    BollingerBandsParams, BollingerBandsResult, EmaParams, IndicatorEngine, IndicatorError,
    IndicatorKind, IndicatorParams, IndicatorResult, IndicatorRow, IndicatorSet, MacdParams,
    MacdResult, RsiParams, SmaParams,
};

// Signals 모듈 re-exports
pub use signals::{
    Recommendation, Signal, SignalGenerator, SignalRecommendation, SignalThresholds, SignalVector,
};

// Portfolio 모듈 re-exports
pub use portfolio::{
    AllocationLine, Objective, OptimizationResult, OptimizerConfig, PortfolioCandidate,
    PortfolioError, PortfolioOptimizer, PortfolioResult,
};

// ML 모듈 re-exports
pub use ml::{
    AccuracyMetrics, AccuracyScorer, Consensus, ForecastReport, ForecastSeeds, ForecastService,
    ForecastSummary, MlError, MlResult, ModelForecast, PredictionResult, SequenceConfig,
    SequencePredictor, SimulatorConfig, StochasticSimulator,
};

// Planning 모듈 re-exports
pub use planning::{project_sip, required_monthly_sip, PlanningError, SipProjection};
