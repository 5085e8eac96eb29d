//! Append-only event log. Every cost figure is a fold over it.

use std::collections::BTreeMap;

use contracts::{Event, EventType, RunSummary, Scenario};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, event: Event) {
        debug_assert!(
            self.events
                .last()
                .map_or(true, |last| (last.day, last.slot) <= (event.day, event.slot)),
            "events must be appended in (day, slot) order"
        );
        debug_assert_eq!(event.sequence, self.events.len() as u64);
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events from `sequence` onwards.
    pub fn since(&self, sequence: u64) -> &[Event] {
        let start = usize::try_from(sequence)
            .unwrap_or(usize::MAX)
            .min(self.events.len());
        &self.events[start..]
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn total_cost(&self) -> f64 {
        total_cost(&self.events)
    }
}

pub fn total_cost(events: &[Event]) -> f64 {
    events.iter().fold(0.0, |total, event| total + event.cost)
}

pub fn cost_by_type(events: &[Event]) -> BTreeMap<EventType, f64> {
    events.iter().fold(BTreeMap::new(), |mut totals, event| {
        *totals.entry(event.event_type).or_insert(0.0) += event.cost;
        totals
    })
}

pub fn cost_by_slot(events: &[Event]) -> BTreeMap<u32, f64> {
    events.iter().fold(BTreeMap::new(), |mut totals, event| {
        *totals.entry(event.slot).or_insert(0.0) += event.cost;
        totals
    })
}

pub fn count_by_type(events: &[Event]) -> BTreeMap<EventType, u64> {
    events.iter().fold(BTreeMap::new(), |mut counts, event| {
        *counts.entry(event.event_type).or_insert(0) += 1;
        counts
    })
}

/// Running cost after each event, in log order.
pub fn cumulative_cost(events: &[Event]) -> Vec<f64> {
    events
        .iter()
        .scan(0.0, |total, event| {
            *total += event.cost;
            Some(*total)
        })
        .collect()
}

/// Scenario tallies. Asset-days with no event count as normal aging.
pub fn scenario_counts(events: &[Event], quiet_asset_days: u64) -> BTreeMap<Scenario, u64> {
    let mut counts = BTreeMap::new();
    if quiet_asset_days > 0 {
        counts.insert(Scenario::NormalAging, quiet_asset_days);
    }
    for scenario in events.iter().flat_map(Event::scenarios) {
        *counts.entry(scenario).or_insert(0) += 1;
    }
    counts
}

/// Folds an event log into a run summary. Identity fields are filled by
/// the caller.
pub fn summarize(events: &[Event], quiet_asset_days: u64) -> RunSummary {
    let event_counts = count_by_type(events);
    let count_of = |event_type: EventType| event_counts.get(&event_type).copied().unwrap_or(0);
    let failures = count_of(EventType::Failure);
    let repairs = count_of(EventType::InspectionAlarmRepair);
    let replacements = events
        .iter()
        .filter(|event| event.event_type.is_replacement())
        .count() as u64;
    let inspections = events
        .iter()
        .filter(|event| event.event_type.is_inspection())
        .count() as u64;

    RunSummary {
        total_cost: total_cost(events),
        cost_by_type: cost_by_type(events),
        scenario_counts: scenario_counts(events, quiet_asset_days),
        failures,
        replacements,
        repairs,
        inspections,
        quiet_asset_days,
        event_counts,
        ..RunSummary::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AssetId, DetectionOutcome};

    fn event(sequence: u64, day: u64, slot: u32, event_type: EventType, cost: f64) -> Event {
        Event {
            day,
            sequence,
            slot,
            asset_id: AssetId::first(slot),
            event_type,
            wear_at_event: 1.0,
            cost,
            detection: event_type
                .is_inspection()
                .then_some(DetectionOutcome::TruePositive),
            measurement: event_type.is_inspection().then_some(1.0),
        }
    }

    fn sample_log() -> EventLog {
        let mut log = EventLog::new();
        log.append(event(0, 1, 0, EventType::InspectionAlarmRepair, 450.0));
        log.append(event(1, 1, 2, EventType::Failure, 6500.0));
        log.append(event(2, 3, 1, EventType::SystematicReplacement, 1500.0));
        log.append(event(3, 3, 2, EventType::InspectionAlarmRepair, 450.0));
        log
    }

    #[test]
    fn totals_are_folds_over_the_log() {
        let log = sample_log();
        assert_eq!(log.total_cost(), 8900.0);
        let by_type = cost_by_type(log.events());
        assert_eq!(by_type.get(&EventType::InspectionAlarmRepair), Some(&900.0));
        let by_slot = cost_by_slot(log.events());
        assert_eq!(by_slot.get(&2), Some(&6950.0));
        assert_eq!(by_slot.values().sum::<f64>(), log.total_cost());
        assert_eq!(
            cumulative_cost(log.events()),
            vec![450.0, 6950.0, 8450.0, 8900.0]
        );
    }

    #[test]
    fn empty_log_costs_nothing() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.total_cost(), 0.0);
        assert!(summarize(log.events(), 0).event_counts.is_empty());
    }

    #[test]
    fn since_is_clamped() {
        let log = sample_log();
        assert_eq!(log.since(2).len(), 2);
        assert!(log.since(99).is_empty());
    }

    #[test]
    fn summary_counts_work_kinds() {
        let log = sample_log();
        let summary = summarize(log.events(), 10);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.repairs, 2);
        assert_eq!(summary.replacements, 2);
        assert_eq!(summary.inspections, 2);
        assert_eq!(summary.total_cost, 8900.0);
        assert_eq!(
            summary.scenario_counts.get(&Scenario::NormalAging),
            Some(&10)
        );
        assert_eq!(
            summary.scenario_counts.get(&Scenario::ImperfectRepair),
            Some(&2)
        );
        assert_eq!(
            summary.scenario_counts.get(&Scenario::BreakdownBetweenInspections),
            Some(&1)
        );
    }
}
