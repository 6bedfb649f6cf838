//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - OHLCV CSV 로더
//! - 종목 분석, 포트폴리오 최적화, 가격 예측, 적립식 계산 명령
//! - 표/JSON 출력

pub mod commands;

pub use commands::*;
