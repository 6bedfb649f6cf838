//! # Advisor Core
//!
//! 개인 자산관리 대시보드 분석 엔진의 공통 기반을 제공합니다:
//! - 시세 도메인 모델 (`Candle`, `PriceSeries`)
//! - 에러 타입
//! - 계층형 설정 로더
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
