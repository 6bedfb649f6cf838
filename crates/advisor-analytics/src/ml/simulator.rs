//! 감쇠 포락선을 적용한 로그 정규 몬테카를로 가격 시뮬레이터.
//!
//! 일간 로그 수익률을 i.i.d. Normal(μ, σ)로 보고 `S × H`개를 추출한 뒤
//! 시점별로 `cos(linspace(0, π/2, H))`를 곱하고 누적합의 지수에 마지막 가격을 곱해
//! 경로를 만듭니다. 평균 경로와 5/95 백분위 구간(90% 신뢰 구간)을 보고합니다.

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use tracing::{debug, info};

use super::accuracy::AccuracyScorer;
use super::types::{ModelKind, PredictionResult};
use super::{MlError, MlResult};

const LOWER_PERCENTILE: f64 = 5.0;
const UPPER_PERCENTILE: f64 = 95.0;

/// 시뮬레이터 설정.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// 예측 일수 (H)
    pub horizon: usize,
    /// 시뮬레이션 경로 수 (S)
    pub paths: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            horizon: 30,
            paths: 1000,
        }
    }
}

/// 로그 수익률 분포 추정치.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnModel {
    /// 평균 로그 수익률 (μ)
    pub drift: f64,
    /// 로그 수익률 모표준편차 (σ)
    pub volatility: f64,
}

impl ReturnModel {
    /// 종가에서 추정합니다. 종가는 2개 이상이고 모두 양수여야 합니다.
    pub fn fit(closes: &[f64]) -> MlResult<Self> {
        if closes.len() < 2 {
            return Err(MlError::InsufficientData {
                required: 2,
                actual: closes.len(),
            });
        }
        if closes.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(MlError::FeatureExtraction(
                "prices must be positive and finite".to_string(),
            ));
        }

        let returns: Vec<f64> = closes.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
        let n = returns.len() as f64;
        let drift = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - drift).powi(2)).sum::<f64>() / n;

        Ok(Self {
            drift,
            volatility: variance.sqrt(),
        })
    }
}

/// 시뮬레이션 경로 요약.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationPaths {
    pub model: ReturnModel,
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// 확률적 가격 시뮬레이터.
#[derive(Debug, Clone, Default)]
pub struct StochasticSimulator {
    config: SimulatorConfig,
}

impl StochasticSimulator {
    /// 새 시뮬레이터.
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// 설정 반환.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// 감쇠 포락선 `cos(linspace(0, π/2, H))`. H = 1이면 `[1]`.
    pub fn damping_envelope(horizon: usize) -> Vec<f64> {
        match horizon {
            0 => Vec::new(),
            1 => vec![1.0],
            h => (0..h)
                .map(|k| (FRAC_PI_2 * k as f64 / (h - 1) as f64).cos())
                .collect(),
        }
    }

    fn validate(&self) -> MlResult<()> {
        if self.config.horizon == 0 || self.config.paths == 0 {
            return Err(MlError::InvalidInput(format!(
                "horizon and paths must be positive, got {} and {}",
                self.config.horizon, self.config.paths
            )));
        }
        Ok(())
    }

    /// 주어진 난수 생성기로 경로를 시뮬레이션합니다.
    pub fn simulate<R: Rng + ?Sized>(&self, closes: &[f64], rng: &mut R) -> MlResult<SimulationPaths> {
        self.validate()?;
        let model = ReturnModel::fit(closes)?;
        let normal = Normal::new(model.drift, model.volatility)
            .map_err(|e| MlError::NumericalInstability(e.to_string()))?;

        let SimulatorConfig { horizon, paths } = self.config;
        let envelope = Self::damping_envelope(horizon);
        let last_price = closes[closes.len() - 1];

        let mut prices = Array2::<f64>::zeros((paths, horizon));
        for mut path in prices.axis_iter_mut(Axis(0)) {
            let mut cumulative = 0.0;
            for (price, damping) in path.iter_mut().zip(&envelope) {
                cumulative += normal.sample(rng) * damping;
                *price = last_price * cumulative.exp();
            }
        }

        let mut mean = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for column in prices.axis_iter(Axis(1)) {
            let mut values = column.to_vec();
            values.sort_by(f64::total_cmp);
            mean.push(values.iter().sum::<f64>() / values.len() as f64);
            lower.push(percentile(&values, LOWER_PERCENTILE));
            upper.push(percentile(&values, UPPER_PERCENTILE));
        }

        if mean.iter().chain(&lower).chain(&upper).any(|v| !v.is_finite()) {
            return Err(MlError::NumericalInstability(
                "simulated prices overflowed".to_string(),
            ));
        }

        debug!(
            drift = model.drift,
            volatility = model.volatility,
            horizon,
            paths,
            "Paths simulated"
        );

        Ok(SimulationPaths {
            model,
            mean,
            lower,
            upper,
        })
    }

    /// 감쇠 로그 정규 모델의 해석적 기대 경로.
    ///
    /// `E[P_k] = P_0 · exp(Σ_{j≤k} (d_j μ + ½ d_j² σ²))`
    pub fn expected_path(&self, closes: &[f64]) -> MlResult<Vec<f64>> {
        self.validate()?;
        let model = ReturnModel::fit(closes)?;
        let last_price = closes[closes.len() - 1];
        let half_var = 0.5 * model.volatility * model.volatility;

        let mut exponent = 0.0;
        Ok(Self::damping_envelope(self.config.horizon)
            .into_iter()
            .map(|d| {
                exponent += d * model.drift + d * d * half_var;
                last_price * exponent.exp()
            })
            .collect())
    }

    /// 시드로 시뮬레이션하고 마지막 H개 실제 종가와 평균 경로를 비교해 평가합니다.
    pub fn forecast(&self, closes: &[f64], seed: u64) -> MlResult<PredictionResult> {
        let horizon = self.config.horizon;
        if closes.len() < horizon.max(2) {
            return Err(MlError::InsufficientData {
                required: horizon.max(2),
                actual: closes.len(),
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let paths = self.simulate(closes, &mut rng)?;
        let actual = closes[closes.len() - horizon..].to_vec();
        let metrics = AccuracyScorer::new().score(&actual, &paths.mean)?;

        info!(
            horizon,
            paths = self.config.paths,
            confidence = metrics.confidence_score,
            "Stochastic forecast complete"
        );

        Ok(PredictionResult {
            model: ModelKind::Stochastic,
            horizon,
            predictions: paths.mean,
            lower: Some(paths.lower),
            upper: Some(paths.upper),
            actual,
            metrics,
        })
    }
}

/// 정렬된 값의 선형 보간 백분위수.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
