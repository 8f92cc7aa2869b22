//! Record Normalization
//!
//! Turns the three raw tables into a canonical [`Dataset`].
//!
//! ## Rules
//!
//! 1. **Validation**: a row missing a required field, or carrying an
//!    unparsable one, is dropped with a `MalformedRecord` diagnostic.
//! 2. **Observations**: deduplicated by (indicator, date). The higher
//!    confidence tag wins; equal tags keep the first-seen row.
//! 3. **Events**: deduplicated by id, first-seen wins. Rows without an id get
//!    one derived from the category prefix and row number.
//! 4. **Impact links**: must reference a normalized event and respect the
//!    event category's shape/sign defaults unless flagged as an override.
//!    Deduplicated by (event, indicator) like observations.
//!
//! Every duplicate resolution emits a `ConflictWarning`.

use inclusion_core::{
    ConflictResolution, Confidence, Dataset, Date, Diagnostic, Event, EventCategory, EventId,
    HistoricalObservation, ImpactLink, ImpactUnit, Indicator, IndicatorUnit, RecordTable,
};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::RecordError;
use crate::parse;
use crate::records::{EventRecord, ImpactLinkRecord, ObservationRecord, RawRecords};

/// Normalization output: the dataset plus everything dropped or overridden
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub dataset: Dataset,
    pub diagnostics: Vec<Diagnostic>,
}

impl Normalized {
    pub fn malformed_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::MalformedRecord { .. }))
            .count()
    }

    pub fn conflict_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::ConflictWarning { .. }))
            .count()
    }
}

/// Configuration for normalization
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Confidence assumed when a row leaves the confidence cell blank
    pub default_confidence: Confidence,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            default_confidence: Confidence::Medium,
        }
    }
}

/// Observation draft kept while deduplicating
struct Candidate<T> {
    item: T,
    confidence: Confidence,
    row: usize,
}

/// Indicator under construction
#[derive(Default)]
struct IndicatorDraft {
    unit: Option<IndicatorUnit>,
    observations: BTreeMap<Date, Candidate<HistoricalObservation>>,
}

impl IndicatorDraft {
    /// Finished indicator; a rejected one is reported against its first row
    fn build(self, name: String, diagnostics: &mut Vec<Diagnostic>) -> Option<Indicator> {
        let first_row = self.observations.values().map(|c| c.row).min().unwrap_or(0);
        let observations = self.observations.into_values().map(|c| c.item).collect();
        match Indicator::new(name, self.unit.unwrap_or_default(), observations) {
            Ok(indicator) => {
                debug!(
                    "Indicator {} with {} observations",
                    indicator.name,
                    indicator.len()
                );
                Some(indicator)
            }
            Err(e) => {
                malformed(diagnostics, RecordTable::Observation, first_row, e.into());
                None
            }
        }
    }
}

/// Validates and deduplicates raw tables
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn normalize(&self, raw: &RawRecords) -> Normalized {
        let mut diagnostics = Vec::new();

        let indicators = self.normalize_observations(&raw.observations, &mut diagnostics);
        let events = self.normalize_events(&raw.events, &mut diagnostics);
        let links = self.normalize_links(&raw.impact_links, &events, &mut diagnostics);

        let dataset = Dataset::from_parts(indicators, events.into_values(), links);

        info!(
            "Normalized {} records: {} indicators, {} events, {} links ({} diagnostics)",
            raw.len(),
            dataset.indicators().count(),
            dataset.events().count(),
            dataset.links().len(),
            diagnostics.len()
        );

        Normalized {
            dataset,
            diagnostics,
        }
    }

    fn normalize_observations(
        &self,
        records: &[ObservationRecord],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Indicator> {
        let mut drafts: BTreeMap<String, IndicatorDraft> = BTreeMap::new();

        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;
            let (name, unit, observation) = match self.parse_observation(record) {
                Ok(parsed) => parsed,
                Err(e) => {
                    malformed(diagnostics, RecordTable::Observation, row, e);
                    continue;
                }
            };

            let draft = drafts.entry(name.clone()).or_default();

            if let Some(unit) = unit {
                match draft.unit {
                    None => draft.unit = Some(unit),
                    Some(existing) if existing != unit => {
                        conflict(
                            diagnostics,
                            RecordTable::Observation,
                            name.clone(),
                            ConflictResolution::FirstSeen,
                            format!("row {} unit {} ignored, keeping {}", row, unit, existing),
                        );
                    }
                    Some(_) => {}
                }
            }

            let key = format!("{}@{}", name, observation.date);
            let candidate = Candidate {
                confidence: observation.confidence,
                item: observation,
                row,
            };
            resolve(
                &mut draft.observations,
                observation.date,
                candidate,
                RecordTable::Observation,
                key,
                diagnostics,
            );
        }

        drafts
            .into_iter()
            .filter_map(|(name, draft)| draft.build(name, diagnostics))
            .collect()
    }

    fn parse_observation(
        &self,
        record: &ObservationRecord,
    ) -> Result<(String, Option<IndicatorUnit>, HistoricalObservation), RecordError> {
        let name = parse::required("indicator_name", &record.indicator_name)?;
        let date = parse::date("date", parse::required("date", &record.date)?)?;
        let value = parse::decimal("value", parse::required("value", &record.value)?)?;
        let confidence = match parse::optional(&record.confidence) {
            Some(c) => parse::enumerated::<Confidence>("confidence", c)?,
            None => self.config.default_confidence,
        };
        let unit = parse::optional(&record.unit)
            .map(|u| parse::enumerated::<IndicatorUnit>("unit", u))
            .transpose()?;

        Ok((
            name.to_string(),
            unit,
            HistoricalObservation::new(date, value, confidence),
        ))
    }

    fn normalize_events(
        &self,
        records: &[EventRecord],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> BTreeMap<EventId, Event> {
        // Explicit ids are reserved up front so derived ids never shadow them
        let mut taken: HashSet<String> = records
            .iter()
            .filter_map(|r| parse::optional(&r.event_id).map(str::to_string))
            .collect();

        let mut events: BTreeMap<EventId, Event> = BTreeMap::new();
        let mut rows: BTreeMap<EventId, usize> = BTreeMap::new();

        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;
            let event = match self.parse_event(record, row, &mut taken) {
                Ok(event) => event,
                Err(e) => {
                    malformed(diagnostics, RecordTable::Event, row, e);
                    continue;
                }
            };

            if let Some(first_row) = rows.get(&event.id) {
                conflict(
                    diagnostics,
                    RecordTable::Event,
                    event.id.clone(),
                    ConflictResolution::FirstSeen,
                    format!("row {} dropped, keeping row {}", row, first_row),
                );
                continue;
            }

            rows.insert(event.id.clone(), row);
            events.insert(event.id.clone(), event);
        }

        events
    }

    fn parse_event(
        &self,
        record: &EventRecord,
        row: usize,
        taken: &mut HashSet<String>,
    ) -> Result<Event, RecordError> {
        let category = parse::enumerated::<EventCategory>(
            "category",
            parse::required("category", &record.category)?,
        )?;
        let effective_date = parse::date(
            "effective_date",
            parse::required("effective_date", &record.effective_date)?,
        )?;
        let end_date = parse::optional(&record.end_date)
            .map(|d| parse::date("end_date", d))
            .transpose()?;

        if let Some(end) = end_date {
            if end < effective_date {
                return Err(RecordError::InvalidField {
                    field: "end_date",
                    value: end.to_string(),
                    reason: format!("precedes effective date {}", effective_date),
                });
            }
        }

        let id = match parse::optional(&record.event_id) {
            Some(id) => id.to_string(),
            None => {
                let id = derive_record_id(&format!("{}_{:04}", category.id_prefix(), row), taken);
                debug!("Derived id {} for event row {}", id, row);
                taken.insert(id.clone());
                id
            }
        };

        let mut event = Event::new(id, category, effective_date);
        event.end_date = end_date;
        Ok(event)
    }

    fn normalize_links(
        &self,
        records: &[ImpactLinkRecord],
        events: &BTreeMap<EventId, Event>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ImpactLink> {
        let mut accepted: BTreeMap<(EventId, String), Candidate<ImpactLink>> = BTreeMap::new();

        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;
            let link = match self.parse_link(record, events) {
                Ok(link) => link,
                Err(e) => {
                    malformed(diagnostics, RecordTable::ImpactLink, row, e);
                    continue;
                }
            };

            let key = (link.event_id.clone(), link.indicator.clone());
            let label = format!("{}->{}", link.event_id, link.indicator);
            let candidate = Candidate {
                confidence: link.confidence,
                item: link,
                row,
            };
            resolve(
                &mut accepted,
                key,
                candidate,
                RecordTable::ImpactLink,
                label,
                diagnostics,
            );
        }

        // Restore input order so series are modeled in the order they were curated
        let mut links: Vec<Candidate<ImpactLink>> = accepted.into_values().collect();
        links.sort_by_key(|c| c.row);
        links.into_iter().map(|c| c.item).collect()
    }

    fn parse_link(
        &self,
        record: &ImpactLinkRecord,
        events: &BTreeMap<EventId, Event>,
    ) -> Result<ImpactLink, RecordError> {
        let event_id = parse::required("event_id", &record.event_id)?;
        let indicator = parse::required("indicator_name", &record.indicator_name)?;
        let magnitude =
            parse::decimal("magnitude", parse::required("magnitude", &record.magnitude)?)?;

        let event = events
            .get(event_id)
            .ok_or_else(|| RecordError::UnknownEvent(event_id.to_string()))?;

        let shape = match parse::optional(&record.shape) {
            Some(s) => parse::enumerated("shape", s)?,
            None => event.category.profile().default_shape,
        };
        let lag_days = parse::optional(&record.lag_days)
            .map(|v| parse::whole("lag_days", v))
            .transpose()?
            .unwrap_or(0);
        let confidence = match parse::optional(&record.confidence) {
            Some(c) => parse::enumerated::<Confidence>("confidence", c)?,
            None => self.config.default_confidence,
        };
        let unit = parse::optional(&record.unit)
            .map(|u| parse::enumerated::<ImpactUnit>("unit", u))
            .transpose()?
            .unwrap_or_default();
        let ramp_months = parse::optional(&record.ramp_months)
            .map(|v| parse::whole("ramp_months", v))
            .transpose()?;
        let overrides_defaults = parse::optional(&record.override_defaults)
            .map(|v| parse::flag("override", v))
            .transpose()?
            .unwrap_or(false);

        let link = ImpactLink {
            event_id: event_id.to_string(),
            indicator: indicator.to_string(),
            magnitude,
            unit,
            shape,
            lag_days,
            confidence,
            ramp_months,
            overrides_defaults,
        };

        link.check_category(event.category)
            .map_err(RecordError::CategoryMismatch)?;

        Ok(link)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

/// Derive a unique record id from `base`
///
/// `PREFIX_0012` style ids are bumped numerically (`PREFIX_0013`); anything
/// else gets a `_1`, `_2`... suffix.
pub fn derive_record_id(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }

    if let Some((prefix, digits)) = base.rsplit_once('_') {
        let alpha_prefix = !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_uppercase());
        if alpha_prefix && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(mut num) = digits.parse::<u64>() {
                loop {
                    num += 1;
                    let candidate = format!("{}_{:04}", prefix, num);
                    if !existing.contains(&candidate) {
                        return candidate;
                    }
                }
            }
        }
    }

    let mut i = 1;
    loop {
        let candidate = format!("{}_{}", base, i);
        if !existing.contains(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

/// Insert `candidate` under `key`, resolving duplicates by confidence rank
fn resolve<K: Ord, T>(
    accepted: &mut BTreeMap<K, Candidate<T>>,
    key: K,
    candidate: Candidate<T>,
    table: RecordTable,
    label: String,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(existing) = accepted.get(&key) else {
        accepted.insert(key, candidate);
        return;
    };

    if candidate.confidence > existing.confidence {
        let detail = format!(
            "row {} ({}) replaces row {} ({})",
            candidate.row, candidate.confidence, existing.row, existing.confidence
        );
        conflict(
            diagnostics,
            table,
            label,
            ConflictResolution::HigherConfidence,
            detail,
        );
        accepted.insert(key, candidate);
    } else if candidate.confidence < existing.confidence {
        let detail = format!(
            "row {} ({}) dropped, row {} ({}) ranks higher",
            candidate.row, candidate.confidence, existing.row, existing.confidence
        );
        conflict(
            diagnostics,
            table,
            label,
            ConflictResolution::HigherConfidence,
            detail,
        );
    } else {
        let detail = format!(
            "row {} dropped, keeping first-seen row {} (both {})",
            candidate.row, existing.row, existing.confidence
        );
        conflict(diagnostics, table, label, ConflictResolution::FirstSeen, detail);
    }
}

fn malformed(diagnostics: &mut Vec<Diagnostic>, table: RecordTable, row: usize, e: RecordError) {
    warn!("Dropping {} row {}: {}", table, row, e);
    diagnostics.push(Diagnostic::MalformedRecord {
        table,
        row,
        reason: e.to_string(),
    });
}

fn conflict(
    diagnostics: &mut Vec<Diagnostic>,
    table: RecordTable,
    key: String,
    resolution: ConflictResolution,
    detail: String,
) {
    warn!("Conflicting {} records for {}: {}", table, key, detail);
    diagnostics.push(Diagnostic::ConflictWarning {
        table,
        key,
        resolution,
        detail,
    });
}

/// Distinct indicator names referenced by links but absent from observations
pub fn orphan_link_indicators(dataset: &Dataset) -> BTreeSet<String> {
    dataset
        .links()
        .iter()
        .filter(|l| dataset.indicator(&l.indicator).is_none())
        .map(|l| l.indicator.clone())
        .collect()
}
