use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{Event, ImpactLink, Indicator};
use crate::values::{EventId, IndicatorId};

/// Canonical, read-only inputs of a forecasting run
///
/// Ordered maps keep every iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    indicators: BTreeMap<IndicatorId, Indicator>,
    events: BTreeMap<EventId, Event>,
    links: Vec<ImpactLink>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        indicators: impl IntoIterator<Item = Indicator>,
        events: impl IntoIterator<Item = Event>,
        links: Vec<ImpactLink>,
    ) -> Self {
        Self {
            indicators: indicators
                .into_iter()
                .map(|i| (i.name.clone(), i))
                .collect(),
            events: events.into_iter().map(|e| (e.id.clone(), e)).collect(),
            links,
        }
    }

    /// Builder: add or replace an indicator
    pub fn with_indicator(mut self, indicator: Indicator) -> Self {
        self.indicators.insert(indicator.name.clone(), indicator);
        self
    }

    /// Builder: add or replace an event
    pub fn with_event(mut self, event: Event) -> Self {
        self.events.insert(event.id.clone(), event);
        self
    }

    /// Builder: append an impact link
    pub fn with_link(mut self, link: ImpactLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn indicator(&self, name: &str) -> Option<&Indicator> {
        self.indicators.get(name)
    }

    pub fn indicators(&self) -> impl Iterator<Item = &Indicator> {
        self.indicators.values()
    }

    pub fn indicator_names(&self) -> Vec<IndicatorId> {
        self.indicators.keys().cloned().collect()
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.get(id)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    pub fn links(&self) -> &[ImpactLink] {
        &self.links
    }

    /// Links targeting `indicator` whose event is known, paired with the event
    pub fn links_for<'a>(
        &'a self,
        indicator: &'a str,
    ) -> impl Iterator<Item = (&'a Event, &'a ImpactLink)> + 'a {
        self.links
            .iter()
            .filter(move |l| l.indicator == indicator)
            .filter_map(move |l| self.events.get(&l.event_id).map(|e| (e, l)))
    }
}
