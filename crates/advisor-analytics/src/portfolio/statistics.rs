//! 수익률 통계.
//!
//! 시계열 정렬, 일간 단순 수익률, 연율화 공분산, 포트폴리오 수익률/분산을 계산합니다.

use std::collections::BTreeSet;

use advisor_core::{DecimalExt, PriceSeries};
use chrono::{DateTime, Utc};

use super::{PortfolioError, PortfolioResult};

/// 타임스탬프 교집합으로 정렬된 종가 행렬.
#[derive(Debug, Clone)]
pub struct AlignedCloses {
    /// 종목 순서
    pub symbols: Vec<String>,
    /// 공통 타임스탬프 (시간순)
    pub timestamps: Vec<DateTime<Utc>>,
    /// 종목별 종가 (`closes[asset][t]`)
    pub closes: Vec<Vec<f64>>,
}

/// 여러 시계열을 공통 타임스탬프로 정렬합니다.
///
/// 한 종목이라도 빠진 날짜는 제외합니다. 빈 시계열은 `NoData`.
pub fn align_closes(series: &[PriceSeries]) -> PortfolioResult<AlignedCloses> {
    if let Some(empty) = series.iter().find(|s| s.is_empty()) {
        return Err(PortfolioError::NoData {
            symbol: empty.symbol().to_string(),
        });
    }

    let mut common: Option<BTreeSet<DateTime<Utc>>> = None;
    for s in series {
        let stamps: BTreeSet<_> = s.timestamps().into_iter().collect();
        common = Some(match common {
            Some(acc) => acc.intersection(&stamps).copied().collect(),
            None => stamps,
        });
    }
    let timestamps: Vec<DateTime<Utc>> = common.unwrap_or_default().into_iter().collect();

    let closes = series
        .iter()
        .map(|s| {
            timestamps
                .iter()
                .filter_map(|ts| s.close_at(*ts).map(|c| c.to_f64_lossy()))
                .collect()
        })
        .collect();

    Ok(AlignedCloses {
        symbols: series.iter().map(|s| s.symbol().to_string()).collect(),
        timestamps,
        closes,
    })
}

/// 가격 시계열을 일간 단순 수익률로 변환합니다.
///
/// 길이는 `prices.len() - 1`. 0 가격이 있으면 수익률을 정의할 수 없으므로 에러입니다.
pub fn simple_returns(prices: &[f64]) -> PortfolioResult<Vec<f64>> {
    prices
        .windows(2)
        .map(|w| {
            if w[0] == 0.0 || !w[0].is_finite() || !w[1].is_finite() {
                Err(PortfolioError::InvalidParameter(format!(
                    "수익률을 계산할 수 없는 가격: {} → {}",
                    w[0], w[1]
                )))
            } else {
                Ok((w[1] - w[0]) / w[0])
            }
        })
        .collect()
}

/// 종목별 평균 일간 수익률.
pub fn mean_returns(returns: &[Vec<f64>]) -> Vec<f64> {
    returns
        .iter()
        .map(|r| {
            if r.is_empty() {
                0.0
            } else {
                r.iter().sum::<f64>() / r.len() as f64
            }
        })
        .collect()
}

/// 표본 공분산 행렬 (n - 1로 나눔) × `annualization`.
///
/// 모든 종목의 수익률 길이가 같고 2 이상이어야 합니다.
pub fn covariance_matrix(returns: &[Vec<f64>], annualization: f64) -> PortfolioResult<Vec<Vec<f64>>> {
    let len = returns.first().map_or(0, |r| r.len());
    if returns.iter().any(|r| r.len() != len) {
        return Err(PortfolioError::InvalidParameter(
            "종목별 수익률 길이가 다릅니다".to_string(),
        ));
    }
    if len < 2 {
        return Err(PortfolioError::InsufficientData {
            required: 2,
            provided: len,
        });
    }

    let means = mean_returns(returns);
    let n = returns.len();
    let mut cov = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in i..n {
            let sum: f64 = returns[i]
                .iter()
                .zip(returns[j].iter())
                .map(|(a, b)| (a - means[i]) * (b - means[j]))
                .sum();
            let value = sum / (len as f64 - 1.0) * annualization;
            cov[i][j] = value;
            cov[j][i] = value; // 대칭
        }
    }

    Ok(cov)
}

/// 포트폴리오 기대 수익률 (wᵀμ).
pub fn portfolio_return(weights: &[f64], means: &[f64]) -> f64 {
    weights.iter().zip(means.iter()).map(|(w, m)| w * m).sum()
}

/// 포트폴리오 분산 (wᵀΣw).
pub fn portfolio_variance(weights: &[f64], cov: &[Vec<f64>]) -> f64 {
    let mut var = 0.0;
    for (i, wi) in weights.iter().enumerate() {
        for (j, wj) in weights.iter().enumerate() {
            var += wi * wj * cov[i][j];
        }
    }
    var
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn series(symbol: &str, days: &[i64], closes: &[i64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        PriceSeries::from_closes(
            symbol,
            days.iter()
                .zip(closes.iter())
                .map(|(d, c)| (start + Duration::days(*d), Decimal::from(*c))),
        )
        .unwrap()
    }

    #[test]
    fn test_align_drops_missing_dates() {
        let a = series("A", &[0, 1, 2, 3], &[10, 11, 12, 13]);
        let b = series("B", &[0, 2, 3, 4], &[20, 22, 23, 24]);

        let aligned = align_closes(&[a, b]).unwrap();

        assert_eq!(aligned.symbols, vec!["A", "B"]);
        assert_eq!(aligned.timestamps.len(), 3);
        assert_eq!(aligned.closes[0], vec![10.0, 12.0, 13.0]);
        assert_eq!(aligned.closes[1], vec![20.0, 22.0, 23.0]);
    }

    #[test]
    fn test_align_empty_series() {
        let a = series("A", &[0, 1], &[10, 11]);
        let empty = PriceSeries::new("EMPTY", Vec::new()).unwrap();

        let result = align_closes(&[a, empty]);
        assert!(matches!(result, Err(PortfolioError::NoData { symbol }) if symbol == "EMPTY"));
    }

    #[test]
    fn test_simple_returns() {
        let returns = simple_returns(&[100.0, 110.0, 99.0]).unwrap();
        assert!((returns[0] - 0.1).abs() < 1e-12);
        assert!((returns[1] + 0.1).abs() < 1e-12);
        assert!(simple_returns(&[0.0, 1.0]).is_err());
        assert!(simple_returns(&[5.0]).unwrap().is_empty());
    }

    #[test]
    fn test_covariance_symmetry_and_scale() {
        let returns = vec![vec![0.01, -0.02, 0.03], vec![0.02, 0.01, -0.01]];
        let cov = covariance_matrix(&returns, 252.0).unwrap();

        assert!((cov[0][1] - cov[1][0]).abs() < 1e-15);
        // 표본분산: 평균 0.00667, 편차제곱합 0.00126667 / 2
        let expected = 0.001_266_666_666_666_666_7 / 2.0 * 252.0;
        assert!((cov[0][0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_portfolio_variance_calculation() {
        let cov = vec![vec![0.04, 0.01], vec![0.01, 0.09]];
        let var = portfolio_variance(&[0.5, 0.5], &cov);
        // 0.25×0.04 + 2×0.25×0.01 + 0.25×0.09
        assert!((var - 0.0375).abs() < 1e-12);
        assert!((portfolio_return(&[0.5, 0.5], &[0.1, 0.2]) - 0.15).abs() < 1e-12);
    }
}
