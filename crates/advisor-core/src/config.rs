//! 설정 관리.
//!
//! 기본값 → TOML 파일 → 환경 변수 순서로 겹쳐 읽는 설정 로더를 제공합니다.
//! 환경 변수는 `ADVISOR__SECTION__KEY` 형태입니다.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::logging::{LogConfig, LogFormat};

/// 환경 변수 접두사.
pub const ENV_PREFIX: &str = "ADVISOR";

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// 로깅 초기화용 `LogConfig`로 변환합니다.
    ///
    /// 알 수 없는 형식은 pretty로 처리합니다.
    pub fn to_log_config(&self) -> LogConfig {
        let format = self.format.parse().unwrap_or(LogFormat::Pretty);
        LogConfig::new(self.level.clone()).with_format(format)
    }
}

/// 설정 파일과 환경 변수를 겹쳐 읽어 `T`로 역직렬화합니다.
///
/// 파일이 없으면 건너뛰고, `T`의 `#[serde(default)]`가 기본값을 채웁니다.
pub fn load_layered<T, P>(path: P) -> Result<T, config::ConfigError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let builder = config::Config::builder()
        // 파일에서 로드
        .add_source(config::File::from(path.as_ref()).required(false))
        // 환경 변수로 오버라이드
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    config.try_deserialize()
}

/// 기본 경로에서 설정을 로드합니다.
pub fn load_default<T: DeserializeOwned>() -> Result<T, config::ConfigError> {
    load_layered(DEFAULT_CONFIG_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        logging: LoggingConfig,
    }

    #[test]
    fn test_logging_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.to_log_config().format, LogFormat::Pretty);
    }

    #[test]
    fn test_unknown_format_falls_back() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "xml".to_string(),
        };
        let log = config.to_log_config();
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let sample: Sample = load_layered("does/not/exist.toml").unwrap();
        assert_eq!(sample.logging.format, "pretty");
    }
}
