//! 포트폴리오 최적화 모듈
//!
//! 여러 종목의 종가 시계열로 몬테카를로 가중치 샘플링을 수행해
//! 목표(샤프 비율 최대, 수익률 최대, 변동성 최소)에 맞는 배분을 찾습니다.
//! N개 샘플 중 최선이며 진짜 최적해는 아닙니다.
//!
//! # 모듈 구성
//!
//! - [`statistics`]: 시계열 정렬, 수익률, 공분산, 포트폴리오 수익률/분산
//! - [`optimizer`]: 몬테카를로 샘플링과 목표별 선택
//! - [`allocation`]: 투자금 배분과 효율적 투자선
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use advisor_analytics::portfolio::{Objective, PortfolioOptimizer};
//!
//! let optimizer = PortfolioOptimizer::default();
//! let result = optimizer.optimize(&series_list, Objective::MaxSharpe, 42)?;
//!
//! for line in result.allocate(dec!(10_000))? {
//!     println!("{}: {}", line.symbol, line.amount);
//! }
//! ```

pub mod allocation;
pub mod optimizer;
pub mod statistics;

use thiserror::Error;

pub use allocation::*;
pub use optimizer::*;
pub use statistics::*;

/// 포트폴리오 최적화 오류.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// 빈 시계열
    #[error("데이터 없음: {symbol}")]
    NoData { symbol: String },

    /// 종목 수 부족
    #[error("최소 2개 종목이 필요합니다: 제공 {provided}개")]
    TooFewAssets { provided: usize },

    /// 공통 구간 데이터 부족
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 순위를 매길 수 있는 후보 없음 (모든 후보의 지표가 정의되지 않음)
    #[error("순위를 매길 수 있는 후보가 없습니다: {0}")]
    NoRankableCandidate(String),
}

/// 포트폴리오 결과 타입.
pub type PortfolioResult<T> = Result<T, PortfolioError>;
