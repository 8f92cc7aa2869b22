//! Dataset summary statistics
//!
//! Record counts by indicator, confidence, category and shape, plus how many
//! rows normalization dropped or had to reconcile.

use inclusion_core::{Confidence, Date, Diagnostic, EffectShape, EventCategory, IndicatorUnit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::normalizer::{Normalized, orphan_link_indicators};

/// Coverage of one indicator's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorCoverage {
    pub unit: IndicatorUnit,
    pub observations: usize,
    pub first_date: Option<Date>,
    pub last_date: Option<Date>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub indicators: BTreeMap<String, IndicatorCoverage>,
    pub observations_by_confidence: BTreeMap<Confidence, usize>,
    pub events_by_category: BTreeMap<EventCategory, usize>,
    pub links_by_shape: BTreeMap<EffectShape, usize>,
    /// Indicators targeted by links but without any observation
    pub unobserved_link_targets: Vec<String>,
    pub malformed_records: usize,
    pub conflicts: usize,
}

impl DatasetSummary {
    pub fn from_normalized(normalized: &Normalized) -> Self {
        let dataset = &normalized.dataset;
        let mut summary = DatasetSummary::default();

        for indicator in dataset.indicators() {
            for obs in indicator.observations() {
                *summary
                    .observations_by_confidence
                    .entry(obs.confidence)
                    .or_insert(0) += 1;
            }
            summary.indicators.insert(
                indicator.name.clone(),
                IndicatorCoverage {
                    unit: indicator.unit,
                    observations: indicator.len(),
                    first_date: indicator.first().map(|o| o.date),
                    last_date: indicator.last().map(|o| o.date),
                },
            );
        }

        for event in dataset.events() {
            *summary.events_by_category.entry(event.category).or_insert(0) += 1;
        }

        for link in dataset.links() {
            *summary.links_by_shape.entry(link.shape).or_insert(0) += 1;
        }

        summary.unobserved_link_targets = orphan_link_indicators(dataset).into_iter().collect();

        for diagnostic in &normalized.diagnostics {
            match diagnostic {
                Diagnostic::MalformedRecord { .. } => summary.malformed_records += 1,
                Diagnostic::ConflictWarning { .. } => summary.conflicts += 1,
                _ => {}
            }
        }

        summary
    }

    pub fn total_observations(&self) -> usize {
        self.indicators.values().map(|c| c.observations).sum()
    }

    /// Share of observations per confidence level, in percent
    pub fn confidence_shares(&self) -> BTreeMap<Confidence, f64> {
        let total = self.total_observations();
        if total == 0 {
            return BTreeMap::new();
        }
        self.observations_by_confidence
            .iter()
            .map(|(c, n)| (*c, (*n as f64 / total as f64 * 1000.0).round() / 10.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;
    use crate::records::{EventRecord, ImpactLinkRecord, ObservationRecord, RawRecords};

    #[test]
    fn test_summary_counts() {
        let raw = RawRecords {
            observations: vec![
                ObservationRecord::new("account_ownership", "2014-01-01", "22", "high"),
                ObservationRecord::new("account_ownership", "2017-01-01", "35", "high"),
                ObservationRecord::new("account_ownership", "2021-01-01", "46", "medium"),
                ObservationRecord::new("p2p_count", "2023-01-01", "49000000", "low"),
                ObservationRecord::new("p2p_count", "bad-date", "1", "low"),
            ],
            events: vec![
                EventRecord::new("EVT_0001", "ProductLaunch", "2021-05-11"),
                EventRecord::new("EVT_0002", "PolicyChange", "2024-06-01"),
            ],
            impact_links: vec![
                ImpactLinkRecord::new("EVT_0001", "account_ownership", "3", "gradual"),
                ImpactLinkRecord::new("EVT_0002", "mobile_money_accounts", "2", "immediate"),
            ],
        };

        let normalized = Normalizer::default().normalize(&raw);
        let summary = DatasetSummary::from_normalized(&normalized);

        assert_eq!(summary.total_observations(), 4);
        assert_eq!(summary.indicators["account_ownership"].observations, 3);
        assert_eq!(summary.observations_by_confidence[&Confidence::High], 2);
        assert_eq!(summary.events_by_category[&EventCategory::PolicyChange], 1);
        assert_eq!(summary.links_by_shape[&EffectShape::Immediate], 1);
        assert_eq!(
            summary.unobserved_link_targets,
            vec!["mobile_money_accounts".to_string()]
        );
        assert_eq!(summary.malformed_records, 1);
        assert_eq!(summary.confidence_shares()[&Confidence::High], 50.0);
    }
}
