//! Normalizer Integration Test
//!
//! Feeds a JSON export of the three raw tables through the normalizer and
//! checks the canonical dataset and its diagnostics.

use inclusion_core::{
    Confidence, Diagnostic, EffectShape, EventCategory, ImpactUnit, IndicatorUnit, RecordTable,
};
use inclusion_normalizer::{DatasetSummary, Normalizer, RawRecords};
use rust_decimal_macros::dec;

const RECORDS: &str = r#"{
    "observations": [
        {"indicator_name": "account_ownership", "date": "2011-12-31", "value": 14.0, "confidence": "high", "unit": "percentage"},
        {"indicator_name": "account_ownership", "date": "2014-12-31", "value": 22.0, "confidence": "high"},
        {"indicator_name": "account_ownership", "date": "2017-12-31", "value": 35.0, "confidence": "high"},
        {"indicator_name": "account_ownership", "date": "2021-12-31", "value": 46.0, "confidence": "high"},
        {"indicator_name": "account_ownership", "date": "2021-12-31", "value": 45.0, "confidence": "medium"},
        {"indicator_name": "account_ownership", "date": "2024-11-29", "value": 49.0, "confidence": "high"},
        {"indicator_name": "p2p_count", "date": "2023-06-30", "value": "49,700,000", "confidence": "medium", "unit": "count"},
        {"indicator_name": "p2p_count", "date": "2024-06-30", "value": 128300000, "confidence": "medium"},
        {"indicator_name": "p2p_count", "date": "2024-06-30T00:00:00Z", "value": 127000000, "confidence": "medium"},
        {"indicator_name": "p2p_count", "value": 1, "confidence": "low"}
    ],
    "events": [
        {"event_id": "EVT_0001", "category": "ProductLaunch", "effective_date": "2021-05-11"},
        {"event_id": "EVT_0002", "category": "MarketEntry", "effective_date": "2023-08-01"},
        {"category": "Infrastructure", "effective_date": "2024-01-01", "end_date": "2026-01-01"},
        {"event_id": "EVT_0004", "category": "PolicyChange", "effective_date": "2024-06-01"}
    ],
    "impact_links": [
        {"event_id": "EVT_0001", "indicator_name": "account_ownership", "magnitude": 4.0, "shape": "gradual", "lag_days": 180, "confidence": "medium"},
        {"event_id": "EVT_0002", "indicator_name": "account_ownership", "magnitude": 2.0, "confidence": "low"},
        {"event_id": "EVT_0002", "indicator_name": "p2p_count", "magnitude": 25, "shape": "s_curve", "unit": "pct"},
        {"event_id": "INF_0003", "indicator_name": "account_ownership", "magnitude": 1.5, "ramp_months": 24},
        {"event_id": "EVT_0004", "indicator_name": "account_ownership", "magnitude": 1.0, "shape": "gradual"},
        {"event_id": "EVT_0005", "indicator_name": "account_ownership", "magnitude": 1.0, "shape": "gradual"}
    ]
}"#;

#[test]
fn test_normalize_json_export() {
    let _ = env_logger::try_init();

    let raw = RawRecords::from_json(RECORDS).unwrap();
    let normalized = Normalizer::default().normalize(&raw);
    let ds = &normalized.dataset;

    // === Indicators ===
    let acc = ds.indicator("account_ownership").unwrap();
    assert_eq!(acc.unit, IndicatorUnit::Percentage);
    assert_eq!(acc.len(), 5);
    assert_eq!(acc.observations()[3].value, dec!(46));
    assert_eq!(acc.observations()[3].confidence, Confidence::High);

    let p2p = ds.indicator("p2p_count").unwrap();
    assert_eq!(p2p.unit, IndicatorUnit::Count);
    assert_eq!(p2p.len(), 2);
    assert_eq!(p2p.first().unwrap().value, dec!(49700000));
    // Same calendar date, equal confidence: first-seen kept
    assert_eq!(p2p.last().unwrap().value, dec!(128300000));

    // === Events ===
    assert_eq!(ds.events().count(), 4);
    let infra = ds.event("INF_0003").unwrap();
    assert_eq!(infra.category, EventCategory::Infrastructure);
    assert!(infra.end_date.is_some());

    // === Links ===
    let links = ds.links();
    assert_eq!(links.len(), 5);
    assert_eq!(links[0].lag_days, 180);
    assert_eq!(links[1].shape, EffectShape::SCurve);
    assert_eq!(links[2].unit, ImpactUnit::Percent);
    assert_eq!(links[3].ramp_months, Some(24));
    assert_eq!(links[3].shape, EffectShape::SCurve);

    // === Diagnostics ===
    let malformed: Vec<_> = normalized
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::MalformedRecord { table, row, .. } => Some((*table, *row)),
            _ => None,
        })
        .collect();
    assert_eq!(
        malformed,
        vec![(RecordTable::Observation, 10), (RecordTable::ImpactLink, 6)]
    );
    assert_eq!(normalized.conflict_count(), 2);

    let summary = DatasetSummary::from_normalized(&normalized);
    assert_eq!(summary.total_observations(), 7);
    assert_eq!(summary.malformed_records, 2);
    assert_eq!(summary.conflicts, 2);
}

#[test]
fn test_normalization_is_deterministic() {
    let raw = RawRecords::from_json(RECORDS).unwrap();
    let first = Normalizer::default().normalize(&raw);
    let second = Normalizer::default().normalize(&raw);

    assert_eq!(first.dataset, second.dataset);
    assert_eq!(first.diagnostics, second.diagnostics);
}
