//! 몬테카를로 포트폴리오 최적화.
//!
//! 1. 정렬된 종가로 일간 수익률과 연율화 공분산을 계산
//! 2. N번 반복: 종목 수만큼 (0, 1) 균등분포 값을 뽑아 합이 1이 되도록 정규화
//! 3. 목표에 따라 N개 후보 중 최선을 선택
//!
//! 난수는 호출마다 명시적인 시드(또는 호출자가 넘긴 RNG)로 생성합니다.

use std::fmt;

use advisor_core::PriceSeries;
use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::statistics::{
    align_closes, covariance_matrix, mean_returns, portfolio_return, portfolio_variance, simple_returns,
};
use super::{PortfolioError, PortfolioResult};

/// 기본 시드.
pub const DEFAULT_SEED: u64 = 42;

/// 최적화 목표.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// 샤프 비율 최대
    #[default]
    MaxSharpe,
    /// 기대 수익률 최대
    MaxReturn,
    /// 변동성 최소
    MinVolatility,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::MaxSharpe => write!(f, "max_sharpe"),
            Objective::MaxReturn => write!(f, "max_return"),
            Objective::MinVolatility => write!(f, "min_volatility"),
        }
    }
}

impl std::str::FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "max_sharpe" | "sharpe" => Ok(Objective::MaxSharpe),
            "max_return" | "return" => Ok(Objective::MaxReturn),
            "min_volatility" | "min_vol" | "volatility" => Ok(Objective::MinVolatility),
            _ => Err(format!("Unknown objective: {}", s)),
        }
    }
}

/// 최적화 설정.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// 샘플 수 (기본: 5000)
    pub samples: usize,
    /// 연율화 거래일 수 (기본: 252)
    pub trading_days: f64,
    /// 무위험 수익률 (연율, 기본: 0)
    pub risk_free_rate: f64,
    /// 기본 시드
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            samples: 5000,
            trading_days: 252.0,
            risk_free_rate: 0.0,
            seed: DEFAULT_SEED,
        }
    }
}

/// 샘플링된 포트폴리오 후보.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioCandidate {
    /// 종목별 가중치 (0 이상, 합 1)
    pub weights: Vec<f64>,
    /// 연율화 기대 수익률
    pub expected_return: f64,
    /// 연율화 변동성
    pub volatility: f64,
    /// 샤프 비율. 변동성이 0이거나 유한하지 않으면 정의되지 않음.
    pub sharpe: Option<f64>,
}

impl PortfolioCandidate {
    /// 수익률과 변동성이 모두 유한한지 여부.
    pub fn is_finite(&self) -> bool {
        self.expected_return.is_finite() && self.volatility.is_finite()
    }
}

/// 최적화 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// 종목 순서
    pub symbols: Vec<String>,
    /// 최적화 목표
    pub objective: Objective,
    /// 사용한 시드 (`optimize_with_rng` 호출 시 None)
    pub seed: Option<u64>,
    /// 선택된 후보의 인덱스
    pub optimal_index: usize,
    /// 전체 샘플 후보
    pub candidates: Vec<PortfolioCandidate>,
}

impl OptimizationResult {
    /// 선택된 후보. 역직렬화된 결과의 인덱스가 범위를 벗어나면 None.
    pub fn optimal(&self) -> Option<&PortfolioCandidate> {
        self.candidates.get(self.optimal_index)
    }
}

/// 몬테카를로 포트폴리오 최적화기.
#[derive(Debug, Clone, Default)]
pub struct PortfolioOptimizer {
    config: OptimizerConfig,
}

impl PortfolioOptimizer {
    /// 새 최적화기.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// 설정.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// 시드를 지정해 최적화합니다. 같은 입력과 시드는 같은 결과를 냅니다.
    pub fn optimize(
        &self,
        series: &[PriceSeries],
        objective: Objective,
        seed: u64,
    ) -> PortfolioResult<OptimizationResult> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut result = self.optimize_with_rng(series, objective, &mut rng)?;
        result.seed = Some(seed);
        Ok(result)
    }

    /// 호출자가 넘긴 RNG로 최적화합니다.
    pub fn optimize_with_rng<R: Rng + ?Sized>(
        &self,
        series: &[PriceSeries],
        objective: Objective,
        rng: &mut R,
    ) -> PortfolioResult<OptimizationResult> {
        if series.len() < 2 {
            return Err(PortfolioError::TooFewAssets {
                provided: series.len(),
            });
        }

        let aligned = align_closes(series)?;
        if aligned.timestamps.len() < 3 {
            return Err(PortfolioError::InsufficientData {
                required: 3,
                provided: aligned.timestamps.len(),
            });
        }

        let returns = aligned
            .closes
            .iter()
            .map(|closes| simple_returns(closes))
            .collect::<PortfolioResult<Vec<_>>>()?;

        debug!(
            assets = aligned.symbols.len(),
            observations = aligned.timestamps.len(),
            "Aligned close series"
        );

        self.optimize_returns(aligned.symbols, &returns, objective, rng)
    }

    /// 일간 수익률 행렬(`returns[asset][t]`)에서 직접 최적화합니다.
    pub fn optimize_returns<R: Rng + ?Sized>(
        &self,
        symbols: Vec<String>,
        returns: &[Vec<f64>],
        objective: Objective,
        rng: &mut R,
    ) -> PortfolioResult<OptimizationResult> {
        if self.config.samples == 0 {
            return Err(PortfolioError::InvalidParameter(
                "샘플 수는 0보다 커야 합니다".to_string(),
            ));
        }
        if symbols.len() != returns.len() {
            return Err(PortfolioError::InvalidParameter(format!(
                "종목 수({})와 수익률 열 수({})가 다릅니다",
                symbols.len(),
                returns.len()
            )));
        }
        if returns.len() < 2 {
            return Err(PortfolioError::TooFewAssets {
                provided: returns.len(),
            });
        }

        let annualization = self.config.trading_days;
        let means = mean_returns(returns);
        let cov = covariance_matrix(returns, annualization)?;

        let candidates: Vec<PortfolioCandidate> = (0..self.config.samples)
            .map(|_| {
                let weights = generate_random_weights(returns.len(), rng);
                self.evaluate(weights, &means, &cov)
            })
            .collect();

        let optimal_index = select_optimal(&candidates, objective)?;
        let optimal = &candidates[optimal_index];

        info!(
            objective = %objective,
            samples = candidates.len(),
            expected_return = optimal.expected_return,
            volatility = optimal.volatility,
            sharpe = ?optimal.sharpe,
            "Portfolio optimization complete"
        );

        Ok(OptimizationResult {
            symbols,
            objective,
            seed: None,
            optimal_index,
            candidates,
        })
    }

    /// 가중치에 대한 연율화 수익률/변동성/샤프 비율을 계산합니다.
    fn evaluate(&self, weights: Vec<f64>, means: &[f64], cov: &[Vec<f64>]) -> PortfolioCandidate {
        let expected_return = self.config.trading_days * portfolio_return(&weights, means);
        // 부동소수점 오차로 인한 미세한 음수 분산 방지
        let volatility = portfolio_variance(&weights, cov).max(0.0).sqrt();
        let sharpe = if volatility > 0.0 && volatility.is_finite() && expected_return.is_finite() {
            Some((expected_return - self.config.risk_free_rate) / volatility)
        } else {
            None
        };

        PortfolioCandidate {
            weights,
            expected_return,
            volatility,
            sharpe,
        }
    }
}

/// (0, 1) 균등분포 값을 정규화해 합이 1인 가중치를 만듭니다.
pub fn generate_random_weights<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<f64> {
    let raw: Vec<f64> = (0..n).map(|_| rng.sample::<f64, _>(Open01)).collect();
    let sum: f64 = raw.iter().sum();
    raw.iter().map(|v| v / sum).collect()
}

/// 목표에 맞는 후보 인덱스를 선택합니다.
///
/// 지표가 정의되지 않은 후보는 순위에서 제외하며, 동률이면 먼저 샘플된 후보를 택합니다.
pub fn select_optimal(candidates: &[PortfolioCandidate], objective: Objective) -> PortfolioResult<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (i, candidate) in candidates.iter().enumerate() {
        if !candidate.is_finite() {
            continue;
        }
        let score = match objective {
            Objective::MaxSharpe => match candidate.sharpe {
                Some(sharpe) => sharpe,
                None => continue,
            },
            Objective::MaxReturn => candidate.expected_return,
            Objective::MinVolatility => -candidate.volatility,
        };

        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((i, score));
        }
    }

    best.map(|(i, _)| i)
        .ok_or_else(|| PortfolioError::NoRankableCandidate(objective.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn returns() -> Vec<Vec<f64>> {
        vec![
            vec![0.010, -0.004, 0.012, 0.003, -0.006, 0.009, 0.002],
            vec![0.002, 0.001, 0.003, 0.002, 0.001, 0.002, 0.003],
            vec![-0.015, 0.020, -0.010, 0.025, -0.020, 0.018, -0.005],
        ]
    }

    fn symbols() -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }

    #[test]
    fn test_weights_sum_to_one() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let w = generate_random_weights(5, &mut rng);
            let sum: f64 = w.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(w.iter().all(|x| *x > 0.0 && *x <= 1.0));
        }
    }

    #[test]
    fn test_seed_reproducible() {
        let optimizer = PortfolioOptimizer::new(OptimizerConfig {
            samples: 500,
            ..Default::default()
        });

        let first = optimizer
            .optimize_returns(symbols(), &returns(), Objective::MaxSharpe, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let second = optimizer
            .optimize_returns(symbols(), &returns(), Objective::MaxSharpe, &mut StdRng::seed_from_u64(42))
            .unwrap();

        assert_eq!(first.optimal_index, second.optimal_index);
        assert_eq!(first.optimal().unwrap().weights, second.optimal().unwrap().weights);
    }

    #[test]
    fn test_objectives_select_extremes() {
        let optimizer = PortfolioOptimizer::new(OptimizerConfig {
            samples: 1000,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(1);

        let result = optimizer
            .optimize_returns(symbols(), &returns(), Objective::MinVolatility, &mut rng)
            .unwrap();
        let min_vol = result
            .candidates
            .iter()
            .map(|c| c.volatility)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(result.optimal().unwrap().volatility, min_vol);
        // 가장 안정적인 B의 비중이 가장 커야 함
        let w = &result.optimal().unwrap().weights;
        assert!(w[1] > w[0] && w[1] > w[2]);

        let best_sharpe = select_optimal(&result.candidates, Objective::MaxSharpe).unwrap();
        let max_sharpe = result
            .candidates
            .iter()
            .filter_map(|c| c.sharpe)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.candidates[best_sharpe].sharpe, Some(max_sharpe));
    }

    #[test]
    fn test_zero_volatility_excluded_from_sharpe() {
        let candidates = vec![
            PortfolioCandidate {
                weights: vec![0.5, 0.5],
                expected_return: 0.1,
                volatility: 0.0,
                sharpe: None,
            },
            PortfolioCandidate {
                weights: vec![0.4, 0.6],
                expected_return: 0.05,
                volatility: 0.1,
                sharpe: Some(0.5),
            },
        ];

        assert_eq!(select_optimal(&candidates, Objective::MaxSharpe).unwrap(), 1);
        assert_eq!(select_optimal(&candidates, Objective::MinVolatility).unwrap(), 0);
        assert!(matches!(
            select_optimal(&candidates[..1], Objective::MaxSharpe),
            Err(PortfolioError::NoRankableCandidate(_))
        ));
    }

    #[test]
    fn test_constant_returns_have_undefined_sharpe() {
        let optimizer = PortfolioOptimizer::new(OptimizerConfig {
            samples: 10,
            ..Default::default()
        });
        let flat = vec![vec![0.0; 5], vec![0.0; 5]];

        let result = optimizer.optimize_returns(
            vec!["X".to_string(), "Y".to_string()],
            &flat,
            Objective::MaxSharpe,
            &mut StdRng::seed_from_u64(3),
        );
        assert!(matches!(result, Err(PortfolioError::NoRankableCandidate(_))));
    }

    #[test]
    fn test_too_few_assets() {
        let optimizer = PortfolioOptimizer::default();
        let result = optimizer.optimize(&[], Objective::MaxSharpe, DEFAULT_SEED);
        assert!(matches!(result, Err(PortfolioError::TooFewAssets { provided: 0 })));
    }

    #[test]
    fn test_objective_from_str() {
        assert_eq!("max-sharpe".parse::<Objective>().unwrap(), Objective::MaxSharpe);
        assert_eq!("min_volatility".parse::<Objective>().unwrap(), Objective::MinVolatility);
        assert!("yolo".parse::<Objective>().is_err());
    }
}
