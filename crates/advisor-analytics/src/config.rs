//! 분석 파라미터 설정.
//!
//! 모든 섹션은 기본값을 가지며, 설정 파일과 `ADVISOR__<섹션>__<키>` 환경 변수로 덮어씁니다.
//!
//! ```toml
//! [portfolio]
//! samples = 5000
//!
//! [simulator]
//! horizon = 30
//! paths = 1000
//! ```

use advisor_core::{load_layered, AdvisorResult, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::indicators::IndicatorParams;
use crate::ml::{FeatureConfig, ForecastSeeds, SequenceConfig, SimulatorConfig};
use crate::portfolio::OptimizerConfig;
use crate::signals::SignalThresholds;

/// 분석 엔진 전체 설정.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub logging: LoggingConfig,
    pub indicators: IndicatorParams,
    pub signals: SignalThresholds,
    pub portfolio: OptimizerConfig,
    pub features: FeatureConfig,
    pub sequence: SequenceConfig,
    pub simulator: SimulatorConfig,
    pub seeds: ForecastSeeds,
}

impl AnalyticsConfig {
    /// 파일과 환경 변수에서 설정을 읽습니다. 파일이 없으면 기본값을 사용합니다.
    pub fn load(path: impl AsRef<Path>) -> AdvisorResult<Self> {
        Ok(load_layered(path)?)
    }
}
