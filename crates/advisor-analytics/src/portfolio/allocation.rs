//! 투자금 배분과 효율적 투자선.

use advisor_core::{decimal_from_f64, DecimalExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::optimizer::{OptimizationResult, PortfolioCandidate};
use super::{PortfolioError, PortfolioResult};

/// 종목별 배분 금액.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationLine {
    pub symbol: String,
    pub weight: f64,
    /// 투자금 × 가중치 (소수점 둘째 자리 반올림)
    pub amount: Decimal,
}

impl OptimizationResult {
    /// 선택된 가중치로 투자금을 나눕니다.
    pub fn allocate(&self, amount: Decimal) -> PortfolioResult<Vec<AllocationLine>> {
        if amount < Decimal::ZERO {
            return Err(PortfolioError::InvalidParameter(format!(
                "투자금은 음수일 수 없습니다: {}",
                amount
            )));
        }

        let optimal = self.optimal().ok_or_else(|| {
            PortfolioError::InvalidParameter(format!(
                "최적 후보 인덱스 {}가 후보 {}개 범위를 벗어났습니다",
                self.optimal_index,
                self.candidates.len()
            ))
        })?;
        if optimal.weights.len() != self.symbols.len() {
            return Err(PortfolioError::InvalidParameter(format!(
                "가중치 {}개와 종목 {}개가 일치하지 않습니다",
                optimal.weights.len(),
                self.symbols.len()
            )));
        }

        self.symbols
            .iter()
            .zip(optimal.weights.iter())
            .map(|(symbol, &weight)| {
                let weight_dec = decimal_from_f64(weight).ok_or_else(|| {
                    PortfolioError::InvalidParameter(format!("{}: 가중치가 유한하지 않습니다", symbol))
                })?;
                Ok(AllocationLine {
                    symbol: symbol.clone(),
                    weight,
                    amount: (amount * weight_dec).round_half_up(2),
                })
            })
            .collect()
    }

    /// 샘플 후보 중 파레토 효율적인 후보를 변동성 오름차순으로 반환합니다.
    ///
    /// 다른 어떤 후보도 수익률이 같거나 높으면서 변동성이 같거나 낮지 않은(둘 중 하나는
    /// 엄격히 더 좋은) 후보만 남깁니다.
    pub fn efficient_frontier(&self) -> Vec<&PortfolioCandidate> {
        let mut finite: Vec<&PortfolioCandidate> = self.candidates.iter().filter(|c| c.is_finite()).collect();
        finite.sort_by(|a, b| {
            a.volatility
                .total_cmp(&b.volatility)
                .then(b.expected_return.total_cmp(&a.expected_return))
        });

        let mut frontier = Vec::new();
        let mut best_return = f64::NEG_INFINITY;
        for candidate in finite {
            if candidate.expected_return > best_return {
                best_return = candidate.expected_return;
                frontier.push(candidate);
            }
        }
        frontier
    }
}
