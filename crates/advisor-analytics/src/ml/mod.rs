//! 가격 예측 모델.
//!
//! - **Feature Engineering**: 종가에서 [가격, 수익률, 변동성, 모멘텀] 윈도우 생성
//! - **시퀀스 모델**: 적층 LSTM 회귀 (Huber 손실, Adam, 조기 종료)
//! - **확률 시뮬레이터**: 감쇠 포락선을 적용한 로그 정규 몬테카를로
//! - **정확도 평가**: MSE, RMSE, MAE, MAPE, R², 방향 정확도, 종합 신뢰도
//! - **예측 서비스**: 두 모델 실행과 합의 요약
//!
//! # 아키텍처
//!
//! ```text
//!            종가 시퀀스
//!         ┌──────┴──────────────┐
//!         ▼                     ▼
//! ┌─────────────────┐   ┌───────────────────┐
//! │ FeatureEngineer │   │StochasticSimulator│
//! └────────┬────────┘   └─────────┬─────────┘
//!          ▼                      │
//! ┌─────────────────┐             │
//! │SequencePredictor│             │
//! └────────┬────────┘             │
//!          └──────────┬───────────┘
//!                     ▼
//!             ┌───────────────┐
//!             │AccuracyScorer │
//!             └───────┬───────┘
//!                     ▼
//!             ┌───────────────┐
//!             │ForecastService│ ← 합의 요약
//!             └───────────────┘
//! ```
//!
//! # 예제
//!
//! ```ignore
//! use advisor_analytics::ml::{ForecastSeeds, ForecastService};
//!
//! let service = ForecastService::default();
//! let report = service.forecast("AAPL", &closes, ForecastSeeds::uniform(7))?;
//! if let Some(consensus) = report.summary.consensus {
//!     println!("합의: {}", consensus);
//! }
//! ```

pub mod accuracy;
pub mod error;
pub mod features;
pub mod loss;
pub mod network;
pub mod optimizer;
pub mod predictor;
pub mod service;
pub mod simulator;
pub mod types;

pub use accuracy::{AccuracyMetrics, AccuracyScorer};
pub use error::{MlError, MlResult};
pub use features::{FeatureConfig, FeatureEngineer, MinMaxScaler, SequenceDataset};
pub use predictor::{SequenceConfig, SequenceForecast, SequencePredictor};
pub use service::{
    Consensus, ForecastReport, ForecastSeeds, ForecastService, ForecastSummary, ModelForecast,
    ModelOutlook,
};
pub use simulator::{ReturnModel, SimulationPaths, SimulatorConfig, StochasticSimulator};
pub use types::{ConfidenceLevel, ModelKind, PredictionDirection, PredictionResult, TrainingHistory};
