//! 가격 이력 조회 기간 정의.
//!
//! 시세 수집기에 요청하는 (심볼, 기간) 쌍의 기간 부분을 나타냅니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 가격 이력 조회 기간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataPeriod {
    /// 1개월
    M1,
    /// 3개월
    M3,
    /// 6개월
    M6,
    /// 1년
    Y1,
    /// 2년
    Y2,
    /// 3년
    Y3,
    /// 5년
    Y5,
    /// 전체 이력
    Max,
}

impl DataPeriod {
    /// 대략적인 거래일 수를 반환합니다 (연 252일 기준).
    ///
    /// `Max`는 상한이 없으므로 `None`.
    pub fn approx_trading_days(&self) -> Option<usize> {
        match self {
            DataPeriod::M1 => Some(21),
            DataPeriod::M3 => Some(63),
            DataPeriod::M6 => Some(126),
            DataPeriod::Y1 => Some(252),
            DataPeriod::Y2 => Some(504),
            DataPeriod::Y3 => Some(756),
            DataPeriod::Y5 => Some(1260),
            DataPeriod::Max => None,
        }
    }

    /// 기간 문자열로 변환합니다 (예: "6mo", "1y").
    pub fn as_str(&self) -> &'static str {
        match self {
            DataPeriod::M1 => "1mo",
            DataPeriod::M3 => "3mo",
            DataPeriod::M6 => "6mo",
            DataPeriod::Y1 => "1y",
            DataPeriod::Y2 => "2y",
            DataPeriod::Y3 => "3y",
            DataPeriod::Y5 => "5y",
            DataPeriod::Max => "max",
        }
    }
}

impl Default for DataPeriod {
    fn default() -> Self {
        Self::M6
    }
}

impl fmt::Display for DataPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1mo" => Ok(DataPeriod::M1),
            "3mo" => Ok(DataPeriod::M3),
            "6mo" => Ok(DataPeriod::M6),
            "1y" => Ok(DataPeriod::Y1),
            "2y" => Ok(DataPeriod::Y2),
            "3y" => Ok(DataPeriod::Y3),
            "5y" => Ok(DataPeriod::Y5),
            "max" => Ok(DataPeriod::Max),
            _ => Err(format!("Invalid period: {}", s)),
        }
    }
}
