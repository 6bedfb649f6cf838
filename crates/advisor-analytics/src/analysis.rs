//! 분석 서비스 - 지표, 시그널, 포트폴리오 최적화, 가격 예측을 한 번의 호출로 연결합니다.
//!
//! # 설계 원칙
//!
//! - 호출 사이에 상태를 보관하지 않습니다 (설정만 보유)
//! - 모든 난수는 호출자가 넘긴 시드에서 파생됩니다
//! - 빈 시계열은 `NoData`로 구분되는 에러를 반환합니다

use advisor_core::{analysis_span, DataPeriod, PriceSeries};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AnalyticsConfig;
use crate::error::AnalyticsResult;
use crate::indicators::{IndicatorEngine, IndicatorSet};
use crate::ml::{ForecastReport, ForecastSeeds, ForecastService};
use crate::portfolio::{Objective, OptimizationResult, PortfolioError, PortfolioOptimizer};
use crate::signals::{SignalGenerator, SignalRecommendation, SignalVector};

/// 단일 종목 기술적 분석 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAnalysis {
    pub symbol: String,
    pub period: Option<DataPeriod>,
    pub last_close: Decimal,
    pub indicators: IndicatorSet,
    pub signals: Vec<SignalVector>,
    /// 최신 시점 추천 (시그널이 없으면 None)
    pub recommendation: Option<SignalRecommendation>,
}

/// 분석 서비스.
#[derive(Debug, Clone, Default)]
pub struct AnalysisService {
    config: AnalyticsConfig,
    signals: SignalGenerator,
    optimizer: PortfolioOptimizer,
    forecaster: ForecastService,
}

impl AnalysisService {
    /// 설정으로 서비스를 구성합니다.
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            signals: SignalGenerator::new(config.signals),
            optimizer: PortfolioOptimizer::new(config.portfolio),
            forecaster: ForecastService::new(config.features, config.sequence.clone(), config.simulator),
            config,
        }
    }

    /// 설정 반환.
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// 지표를 계산하고 시그널과 추천을 생성합니다.
    pub fn analyze(&self, series: &PriceSeries) -> AnalyticsResult<StockAnalysis> {
        let _span = analysis_span!("analyze", series.symbol()).entered();
        series.ensure_not_empty()?;

        let indicators = IndicatorEngine::new().compute(series, &self.config.indicators)?;
        let signals = self.signals.generate(&indicators);
        let recommendation = self.signals.recommend(&signals);
        let last_close = series.last_close().unwrap_or_default();

        if let Some(rec) = &recommendation {
            info!(
                action = %rec.action,
                confidence = rec.confidence,
                overall = %rec.overall,
                "Analysis complete"
            );
        }

        Ok(StockAnalysis {
            symbol: series.symbol().to_string(),
            period: series.period(),
            last_close,
            indicators,
            signals,
            recommendation,
        })
    }

    /// 포트폴리오를 최적화합니다. 시드가 없으면 설정의 기본 시드를 사용합니다.
    pub fn optimize(
        &self,
        series: &[PriceSeries],
        objective: Objective,
        seed: Option<u64>,
    ) -> AnalyticsResult<OptimizationResult> {
        if let Some(empty) = series.iter().find(|s| s.is_empty()) {
            return Err(PortfolioError::NoData {
                symbol: empty.symbol().to_string(),
            }
            .into());
        }

        let seed = seed.unwrap_or(self.optimizer.config().seed);
        let result = self.optimizer.optimize(series, objective, seed)?;
        Ok(result)
    }

    /// 두 모델로 가격을 예측합니다. 시드가 없으면 설정의 시드를 사용합니다.
    pub fn forecast(&self, series: &PriceSeries, seeds: Option<ForecastSeeds>) -> AnalyticsResult<ForecastReport> {
        let _span = analysis_span!("forecast", series.symbol()).entered();
        series.ensure_not_empty()?;

        let seeds = seeds.unwrap_or(self.config.seeds);
        let report = self
            .forecaster
            .forecast(series.symbol(), &series.closes_f64(), seeds)?;
        Ok(report)
    }
}
