//! 분석 서비스 전 구간 통합 테스트.

use advisor_analytics::ml::{FeatureConfig, ForecastSeeds, SequenceConfig, SimulatorConfig};
use advisor_analytics::{
    project_sip, required_monthly_sip, AnalysisService, AnalyticsConfig, IndicatorEngine,
    ModelForecast, Objective, OptimizerConfig, Recommendation, RsiParams, SignalGenerator,
};
use advisor_core::PriceSeries;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn series(symbol: &str, closes: impl IntoIterator<Item = Decimal>) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    PriceSeries::from_closes(
        symbol,
        closes
            .into_iter()
            .enumerate()
            .map(|(i, c)| (start + Duration::days(i as i64), c)),
    )
    .unwrap()
}

fn wave(n: usize, phase: f64) -> Vec<Decimal> {
    (0..n)
        .map(|i| {
            let x = 100.0 + 8.0 * ((i as f64 + phase) / 7.0).sin() + 0.1 * i as f64;
            Decimal::from_f64_retain(x).unwrap().round_dp(4)
        })
        .collect()
}

fn small_config() -> AnalyticsConfig {
    AnalyticsConfig {
        portfolio: OptimizerConfig {
            samples: 300,
            ..Default::default()
        },
        features: FeatureConfig {
            lookback: 10,
            ..Default::default()
        },
        sequence: SequenceConfig {
            lstm_units: vec![6, 4],
            dense_units: 4,
            batch_size: 16,
            max_epochs: 8,
            patience: 3,
            learning_rate: 0.01,
            ..Default::default()
        },
        simulator: SimulatorConfig {
            horizon: 10,
            paths: 200,
        },
        ..Default::default()
    }
}

#[test]
fn rsi_reference_values() {
    let closes = [dec!(10), dec!(12), dec!(11), dec!(14), dec!(13)];
    let rsi = IndicatorEngine::new().rsi(&closes, RsiParams { period: 2 }).unwrap();

    assert_eq!(rsi[0], None);
    assert_eq!(rsi[1], Some(dec!(100)));
    assert_eq!(rsi[2].unwrap().round_dp(2), dec!(66.67));
    assert_eq!(rsi[3].unwrap().round_dp(2), dec!(75.00));
    assert_eq!(rsi[4].unwrap().round_dp(2), dec!(75.00));
}

#[test]
fn flat_series_collapses_bands() {
    let analysis = AnalysisService::default()
        .analyze(&series("FLAT", vec![dec!(100); 25]))
        .unwrap();
    let last = analysis.indicators.len() - 1;

    assert_eq!(analysis.indicators.bb_upper[last], Some(dec!(100)));
    assert_eq!(analysis.indicators.bb_middle[last], Some(dec!(100)));
    assert_eq!(analysis.indicators.bb_lower[last], Some(dec!(100)));
}

#[test]
fn recommendation_thresholds_are_strict() {
    let generator = SignalGenerator::default();
    assert_eq!(generator.classify(dec!(0.2)), Recommendation::Hold);
    assert_eq!(generator.classify(dec!(0.2000001)), Recommendation::Buy);
    assert_eq!(generator.classify(dec!(-0.2)), Recommendation::Hold);
    assert_eq!(generator.classify(dec!(-0.2000001)), Recommendation::Sell);
}

#[test]
fn optimization_is_reproducible_with_seed() {
    let service = AnalysisService::new(small_config());
    let assets = [series("A", wave(80, 0.0)), series("B", wave(80, 3.0)), series("C", wave(80, 5.0))];

    let first = service.optimize(&assets, Objective::MaxSharpe, Some(17)).unwrap();
    let second = service.optimize(&assets, Objective::MaxSharpe, Some(17)).unwrap();

    assert_eq!(first.optimal().unwrap().weights, second.optimal().unwrap().weights);
    assert_eq!(first.seed, Some(17));

    let allocation = first.allocate(dec!(10000)).unwrap();
    assert_eq!(allocation.len(), 3);
    let total: Decimal = allocation.iter().map(|line| line.amount).sum();
    assert!((total - dec!(10000)).abs() <= dec!(0.03));

    let frontier = first.efficient_frontier();
    assert!(!frontier.is_empty());
    assert!(frontier.windows(2).all(|w| w[0].volatility <= w[1].volatility));
}

#[test]
fn identical_assets_are_label_symmetric() {
    let service = AnalysisService::new(small_config());
    let ab = service
        .optimize(&[series("A", wave(60, 0.0)), series("B", wave(60, 0.0))], Objective::MaxSharpe, Some(3))
        .unwrap();
    let ba = service
        .optimize(&[series("B", wave(60, 0.0)), series("A", wave(60, 0.0))], Objective::MaxSharpe, Some(3))
        .unwrap();

    let (ab, ba) = (ab.optimal().unwrap(), ba.optimal().unwrap());
    assert_eq!(ab.weights, ba.weights);
    assert_eq!(ab.expected_return, ba.expected_return);
}

#[test]
fn forecast_report_contains_both_models() {
    let service = AnalysisService::new(small_config());
    let report = service
        .forecast(&series("WAVE", wave(150, 0.0)), Some(ForecastSeeds::uniform(11)))
        .unwrap();

    assert!(matches!(report.sequence, ModelForecast::Available(_)));
    assert!(matches!(report.stochastic, ModelForecast::Available(_)));
    assert!(report.history.as_ref().is_some_and(|h| h.epochs() >= 1));

    let summary = &report.summary;
    assert!(summary.consensus.is_some());
    assert!(summary.band_pct.is_some_and(|b| b >= 0.0));
    assert_eq!(summary.stochastic.map(|s| s.confidence_score >= 0.0), Some(true));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["sequence"]["status"], "available");
}

#[test]
fn short_history_keeps_stochastic_forecast() {
    let service = AnalysisService::new(small_config());
    // 시뮬레이터 구간(10)은 채우지만 lookback 10 윈도우는 1개뿐
    let report = service
        .forecast(&series("SHORT", wave(12, 0.0)), Some(ForecastSeeds::uniform(5)))
        .unwrap();

    assert!(matches!(
        report.sequence,
        ModelForecast::Unavailable { ref reason } if reason.contains("Insufficient")
    ));
    assert!(report.history.is_none());
    assert!(matches!(report.stochastic, ModelForecast::Available(ref p) if p.horizon == 10));

    let summary = &report.summary;
    assert!(summary.sequence.is_none());
    assert!(summary.stochastic.is_some());
    assert!(summary.band_pct.is_some());
    assert_eq!(summary.consensus, None);
}

#[test]
fn sip_round_trip() {
    let pmt = required_monthly_sip(dec!(500000), 5, dec!(10)).unwrap();
    let projection = project_sip(Decimal::ZERO, pmt, 5, dec!(10)).unwrap();

    assert_eq!(projection.yearly_values.len(), 6);
    assert!((projection.future_value - dec!(500000)).abs() < dec!(1));
    assert!(projection.wealth_gained > Decimal::ZERO);
}
