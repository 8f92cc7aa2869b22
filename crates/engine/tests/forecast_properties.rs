//! Forecast property tests
//!
//! Behavior every forecast must satisfy regardless of the data:
//! - baseline anchoring and monotone extrapolation
//! - exact immediate effects and gradual ramp endpoints
//! - scenario ordering and saturation ceilings
//! - determinism and calibration fallbacks

use approx::assert_abs_diff_eq;
use inclusion_core::{
    Confidence, Dataset, Date, Diagnostic, EffectShape, Event, EventCategory,
    HistoricalObservation, ImpactLink, Indicator, IndicatorUnit, ScenarioKind,
};
use inclusion_engine::{
    EngineConfig, Error, ForecastEngine, IndicatorForecast, ScenarioOffsets, TrendEstimator,
    realized_fraction, yearly_horizon,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> Date {
    Date::from_ymd_opt(y, m, d).unwrap()
}

fn observation(date: Date, value: Decimal) -> HistoricalObservation {
    HistoricalObservation::new(date, value, Confidence::High)
}

fn indicator(name: &str, unit: IndicatorUnit, points: &[(Date, Decimal)]) -> Indicator {
    Indicator::new(
        name,
        unit,
        points.iter().map(|&(d, v)| observation(d, v)).collect(),
    )
    .unwrap()
}

/// account_ownership 46.0 -> 49.0 with one gradual +1.0pp policy change
fn account_ownership_dataset() -> Dataset {
    Dataset::new()
        .with_indicator(indicator(
            "account_ownership",
            IndicatorUnit::Percentage,
            &[(date(2021, 1, 1), dec!(46.0)), (date(2024, 1, 1), dec!(49.0))],
        ))
        .with_event(Event::new(
            "EVT_0001",
            EventCategory::PolicyChange,
            date(2024, 6, 1),
        ))
        .with_link(ImpactLink::new(
            "EVT_0001",
            "account_ownership",
            dec!(1.0),
            EffectShape::Gradual,
        ))
}

fn engine(config: EngineConfig) -> ForecastEngine {
    ForecastEngine::new(config).unwrap()
}

fn assert_scenarios_ordered(forecast: &IndicatorForecast) {
    let pessimistic = forecast.scenario(ScenarioKind::Pessimistic).unwrap();
    let base = forecast.scenario(ScenarioKind::Base).unwrap();
    let optimistic = forecast.scenario(ScenarioKind::Optimistic).unwrap();

    for ((low, mid), high) in pessimistic
        .points
        .iter()
        .zip(&base.points)
        .zip(&optimistic.points)
    {
        assert!(
            low.total_value <= mid.total_value && mid.total_value <= high.total_value,
            "{} at {}: {} <= {} <= {} violated",
            forecast.indicator,
            mid.date,
            low.total_value,
            mid.total_value,
            high.total_value
        );
    }
}

#[test]
fn test_baseline_passes_through_first_observation() {
    let _ = env_logger::try_init();
    let histories = [
        vec![(date(2011, 1, 1), dec!(14)), (date(2014, 1, 1), dec!(22)), (date(2017, 1, 1), dec!(35)), (date(2021, 1, 1), dec!(46))],
        vec![(date(2015, 6, 30), dec!(120)), (date(2018, 6, 30), dec!(90)), (date(2022, 6, 30), dec!(75))],
        vec![(date(2019, 1, 1), dec!(3.2)), (date(2020, 1, 1), dec!(6.9)), (date(2021, 1, 1), dec!(15.1))],
    ];
    let estimator = TrendEstimator::from_config(&EngineConfig::default());

    for history in histories {
        let indicator = indicator("x", IndicatorUnit::Level, &history);
        let fit = estimator.fit(&indicator).unwrap();

        let (first_date, first_value) = history[0];
        assert_abs_diff_eq!(
            fit.value_at(first_date),
            first_value.to_f64().unwrap(),
            epsilon = 1e-9
        );

        let growth = fit.annualized_growth_rate();
        let horizon = yearly_horizon(history[history.len() - 1].0, 5);
        for pair in horizon.windows(2) {
            let step = fit.value_at(pair[1]) - fit.value_at(pair[0]);
            assert!(
                step * growth > 0.0,
                "extrapolation moved against growth {} at {}",
                growth,
                pair[1]
            );
        }
    }
}

#[test]
fn test_immediate_event_adds_exact_magnitude() {
    let event_date = date(2025, 3, 15);
    let dataset = Dataset::new()
        .with_indicator(indicator(
            "digital_payment_usage",
            IndicatorUnit::Percentage,
            &[(date(2017, 1, 1), dec!(20)), (date(2021, 1, 1), dec!(35)), (date(2024, 1, 1), dec!(41))],
        ))
        .with_event(Event::new("EVT_0001", EventCategory::ProductLaunch, event_date))
        .with_link(ImpactLink::new(
            "EVT_0001",
            "digital_payment_usage",
            dec!(2.75),
            EffectShape::Immediate,
        ));

    let forecast = engine(EngineConfig::default())
        .forecast(&dataset, "digital_payment_usage", &[event_date])
        .unwrap();
    let point = &forecast.base().unwrap().points[0];

    assert_eq!(point.total_value - point.baseline_value, dec!(2.75));
    assert_eq!(point.event_contribution, dec!(2.75));
}

#[test]
fn test_immediate_event_inside_history_adds_exact_magnitude() {
    let event_date = date(2022, 6, 1);
    let dataset = Dataset::new()
        .with_indicator(indicator(
            "account_ownership",
            IndicatorUnit::Percentage,
            &[(date(2020, 1, 1), dec!(40)), (date(2024, 1, 1), dec!(48))],
        ))
        .with_event(Event::new("EVT_0001", EventCategory::ProductLaunch, event_date))
        .with_link(ImpactLink::new(
            "EVT_0001",
            "account_ownership",
            dec!(2),
            EffectShape::Immediate,
        ));
    let horizon = [event_date, date(2026, 1, 1)];

    let forecast = engine(EngineConfig::default())
        .forecast(&dataset, "account_ownership", &horizon)
        .unwrap();
    for point in &forecast.base().unwrap().points {
        assert_eq!(point.total_value - point.baseline_value, dec!(2), "at {}", point.date);
    }

    // Netting is opt-in: the fitted trend then already carries the step
    let netted = engine(EngineConfig::default().with_net_of_realized_effects(true))
        .forecast(&dataset, "account_ownership", &horizon)
        .unwrap();
    for point in &netted.base().unwrap().points {
        assert_eq!(point.event_contribution, Decimal::ZERO, "at {}", point.date);
    }
}

#[test]
fn test_exploding_compound_trend_saturates_instead_of_panicking() {
    let dataset = Dataset::new()
        .with_indicator(indicator(
            "p2p_count",
            IndicatorUnit::Count,
            &[
                (date(2020, 1, 1), dec!(1)),
                (date(2021, 1, 1), dec!(100)),
                (date(2022, 1, 1), dec!(10000)),
            ],
        ))
        .with_event(Event::new("EVT_0001", EventCategory::ProductLaunch, date(2022, 6, 1)))
        .with_link(ImpactLink::new(
            "EVT_0001",
            "p2p_count",
            dec!(5),
            EffectShape::Immediate,
        ));

    let forecast = engine(EngineConfig::default())
        .forecast(&dataset, "p2p_count", &yearly_horizon(date(2022, 1, 1), 18))
        .unwrap();

    for scenario in forecast.scenarios.values() {
        for pair in scenario.points.windows(2) {
            assert!(pair[1].total_value >= pair[0].total_value);
        }
        assert_eq!(scenario.points.last().unwrap().total_value, Decimal::MAX);
    }
    assert!(
        forecast
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::ValueOverflow { .. }))
    );
    assert_scenarios_ordered(&forecast);
}

#[test]
fn test_gradual_ramp_endpoints() {
    let ramp = EngineConfig::default().ramp_days();
    let event = date(2024, 6, 1);
    let one_year_later = date(2025, 6, 1);
    let elapsed = (one_year_later - event).num_days() as f64;

    assert_eq!(realized_fraction(EffectShape::Gradual, 0.0, ramp), 0.0);
    assert_abs_diff_eq!(
        realized_fraction(EffectShape::Gradual, elapsed, ramp),
        1.0,
        epsilon = 1e-2
    );

    let forecast = engine(EngineConfig::default())
        .forecast(&account_ownership_dataset(), "account_ownership", &[event])
        .unwrap();
    assert_eq!(forecast.effects[0].points[0].effect, Decimal::ZERO);
}

#[test]
fn test_concrete_account_ownership_forecast() {
    let _ = env_logger::try_init();
    let target = date(2025, 6, 1);

    let forecast = engine(EngineConfig::default())
        .forecast(&account_ownership_dataset(), "account_ownership", &[target])
        .unwrap();
    let point = &forecast.base().unwrap().points[0];

    // 46 + 3 * 1612 / 1095
    assert!((point.baseline_value - dec!(50.4164383562)).abs() < dec!(0.000001));
    assert!(point.total_value > point.baseline_value);
    assert!(point.total_value < point.baseline_value + dec!(1.0));
    assert!((point.total_value - dec!(51.4157539)).abs() < dec!(0.0001));

    let baseline_only = engine(EngineConfig::default())
        .forecast(
            &Dataset::new().with_indicator(
                account_ownership_dataset()
                    .indicator("account_ownership")
                    .unwrap()
                    .clone(),
            ),
            "account_ownership",
            &[target],
        )
        .unwrap();
    assert_eq!(
        baseline_only.base().unwrap().points[0].total_value,
        point.baseline_value
    );
}

#[test]
fn test_scenario_ordering_for_any_perturbation() {
    let offsets = [
        (dec!(0), dec!(0)),
        (dec!(5), dec!(10)),
        (dec!(50), dec!(90)),
        (dec!(100), dec!(100)),
    ];
    let datasets = [
        // growing, positive event
        account_ownership_dataset(),
        // declining, negative event
        Dataset::new()
            .with_indicator(indicator(
                "cash_only_share",
                IndicatorUnit::Percentage,
                &[(date(2014, 1, 1), dec!(70)), (date(2017, 1, 1), dec!(61)), (date(2021, 1, 1), dec!(52))],
            ))
            .with_event(Event::new("EVT_0002", EventCategory::PolicyChange, date(2022, 3, 1)))
            .with_link(ImpactLink::new("EVT_0002", "cash_only_share", dec!(-4), EffectShape::SCurve)),
    ];

    for (trend_pct, magnitude_pct) in offsets {
        let config = EngineConfig::default().with_perturbation(
            ScenarioOffsets::new(trend_pct, magnitude_pct),
            ScenarioOffsets::new(-trend_pct, -magnitude_pct),
        );
        let engine = engine(config);

        for dataset in &datasets {
            for name in dataset.indicator_names() {
                let horizon = yearly_horizon(date(2021, 1, 1), 8);
                let forecast = engine.forecast(dataset, &name, &horizon).unwrap();
                assert_scenarios_ordered(&forecast);
            }
        }
    }
}

#[test]
fn test_total_never_exceeds_ceiling() {
    let dataset = account_ownership_dataset()
        .with_event(Event::new("EVT_0003", EventCategory::MarketEntry, date(2024, 3, 1)))
        .with_link(ImpactLink::new(
            "EVT_0003",
            "account_ownership",
            dec!(8),
            EffectShape::SCurve,
        ));
    let config = EngineConfig::default().with_ceiling("account_ownership", dec!(52));

    let forecast = engine(config)
        .forecast(&dataset, "account_ownership", &yearly_horizon(date(2024, 1, 1), 10))
        .unwrap();

    for scenario in forecast.scenarios.values() {
        for point in &scenario.points {
            assert!(point.total_value <= dec!(52), "{} exceeds ceiling", point.total_value);
        }
    }
    assert!(
        forecast
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::SaturationApplied { .. }))
    );
    assert_scenarios_ordered(&forecast);
}

#[test]
fn test_forecast_is_bit_identical_across_runs() {
    let engine = engine(EngineConfig::default());
    let horizon = yearly_horizon(date(2024, 1, 1), 6);

    let first = engine
        .forecast(&account_ownership_dataset(), "account_ownership", &horizon)
        .unwrap();
    let second = engine
        .forecast(&account_ownership_dataset(), "account_ownership", &horizon)
        .unwrap();

    assert_eq!(first.scenarios, second.scenarios);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_missing_validation_data_keeps_unit_factor() {
    let horizon = [date(2025, 6, 1), date(2026, 6, 1)];

    let short = engine(EngineConfig::default())
        .forecast(&account_ownership_dataset(), "account_ownership", &horizon)
        .unwrap();
    let long = engine(EngineConfig::default().with_validation_horizon_days(5000))
        .forecast(&account_ownership_dataset(), "account_ownership", &horizon)
        .unwrap();

    assert!(short.calibration.is_empty());
    assert_eq!(short.effects[0].correction_factor, Decimal::ONE);
    assert_eq!(short.scenarios, long.scenarios);
    assert!(
        short
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::CalibrationSkipped { .. }))
    );
}

/// Flat at 40, a Gradual +2 launch at 2020-01-01 and one validation point
fn calibration_dataset(observed: Decimal) -> Dataset {
    Dataset::new()
        .with_indicator(indicator(
            "account_ownership",
            IndicatorUnit::Percentage,
            &[
                (date(2018, 1, 1), dec!(40)),
                (date(2019, 1, 1), dec!(40)),
                (date(2021, 1, 1), observed),
            ],
        ))
        .with_event(Event::new("EVT_0001", EventCategory::ProductLaunch, date(2020, 1, 1)))
        .with_link(ImpactLink::new(
            "EVT_0001",
            "account_ownership",
            dec!(2),
            EffectShape::Gradual,
        ))
}

#[test]
fn test_calibration_scales_future_effects() {
    // +1 observed where +2 was predicted
    let forecast = engine(EngineConfig::default())
        .forecast(&calibration_dataset(dec!(41)), "account_ownership", &[date(2022, 1, 1)])
        .unwrap();

    assert_eq!(forecast.calibration.len(), 1);
    assert_eq!(forecast.calibration[0].correction_factor, dec!(0.5));
    assert_eq!(forecast.effects[0].effective_magnitude, dec!(1.0));
    assert_eq!(forecast.effects[0].points[0].effect, dec!(1.0));
    assert_eq!(forecast.base().unwrap().points[0].event_contribution, dec!(1.0));
}

#[test]
fn test_correction_bounds_change_the_forecast() {
    let target = [date(2022, 1, 1)];
    let engine = engine(EngineConfig::default());

    // +0.5 and +8 observed against +2 predicted: factors at both bounds
    let low = engine
        .forecast(&calibration_dataset(dec!(40.5)), "account_ownership", &target)
        .unwrap();
    let high = engine
        .forecast(&calibration_dataset(dec!(48)), "account_ownership", &target)
        .unwrap();

    assert_eq!(low.calibration[0].correction_factor, dec!(0.25));
    assert_eq!(high.calibration[0].correction_factor, dec!(4));

    let low_point = &low.base().unwrap().points[0];
    let high_point = &high.base().unwrap().points[0];
    assert_eq!(low_point.event_contribution, dec!(0.5));
    assert_eq!(high_point.event_contribution, dec!(8));
}

#[test]
fn test_per_indicator_failures() {
    let dataset = account_ownership_dataset().with_indicator(indicator(
        "credit_access",
        IndicatorUnit::Percentage,
        &[(date(2024, 1, 1), dec!(7))],
    ));
    let engine = engine(EngineConfig::default());

    assert_eq!(
        engine
            .forecast(&dataset, "mobile_money", &[date(2025, 1, 1)])
            .unwrap_err(),
        Error::UnknownIndicator("mobile_money".to_string())
    );

    let batch = engine.forecast_all(&dataset, &[date(2025, 1, 1)]);
    assert_eq!(batch.forecasts.len(), 1);
    assert_eq!(
        batch.failures.get("credit_access"),
        Some(&Error::InsufficientHistory {
            indicator: "credit_access".to_string(),
            observations: 1,
            required: 2,
        })
    );
}

#[test]
fn test_invalid_configuration_aborts_before_computation() {
    let invalid = [
        EngineConfig::default().with_ramp_duration_months(0.0),
        EngineConfig::default().with_correction_bounds(dec!(2), dec!(4)),
        EngineConfig::default().with_perturbation(
            ScenarioOffsets::new(dec!(-1), dec!(0)),
            ScenarioOffsets::new(dec!(0), dec!(0)),
        ),
    ];

    for config in invalid {
        assert!(matches!(
            ForecastEngine::new(config),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
