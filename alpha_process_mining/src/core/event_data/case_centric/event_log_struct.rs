use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Identifier of a case (i.e., one recorded process execution)
pub type CaseID = String;

///
/// An event: the occurrence of an activity at a point in time
///
/// Optionally carries the executing resource and a cost value.
///
/// ```rust
/// use alpha_process_mining::core::event_data::case_centric::Event;
/// use alpha_process_mining::core::chrono::DateTime;
///
/// let ts = DateTime::parse_from_rfc3339("2024-01-01T09:00:00+01:00").unwrap();
/// let e = Event::new("register request", ts).with_resource("Pete").with_cost(50.0);
/// assert_eq!(e.activity, "register request");
/// assert_eq!(e.resource.as_deref(), Some("Pete"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Activity label
    pub activity: String,
    /// Timestamp of the occurrence
    pub timestamp: DateTime<FixedOffset>,
    /// Resource that executed the event (if recorded)
    pub resource: Option<String>,
    /// Cost of the event (if recorded)
    pub cost: Option<f64>,
}

impl Event {
    /// Create a new event with the provided activity and timestamp
    pub fn new<S, T>(activity: S, timestamp: DateTime<T>) -> Self
    where
        S: Into<String>,
        T: chrono::TimeZone,
    {
        Event {
            activity: activity.into(),
            timestamp: timestamp.fixed_offset(),
            resource: None,
            cost: None,
        }
    }

    /// Set the resource of this event
    pub fn with_resource<S: Into<String>>(mut self, resource: S) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Set the cost of this event
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }
}

///
/// A trace: the sequence of [`Event`]s recorded for one case
///
/// Events are expected in non-decreasing timestamp order.
/// Consumers that depend on the order should use [`Trace::chronological_events`],
/// which does not rely on the insertion order.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Trace {
    /// Events contained in trace
    pub events: Vec<Event>,
}

impl Trace {
    /// Initializes a new trace with no events
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the end of the trace
    pub fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Checks if event timestamps are non-decreasing
    pub fn is_chronologically_ordered(&self) -> bool {
        self.events
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    }

    ///
    /// Sort events by timestamp
    ///
    /// The sort is stable: events with equal timestamps keep their relative order.
    ///
    pub fn sort_chronologically(&mut self) {
        if !self.is_chronologically_ordered() {
            self.events.sort_by_key(|e| e.timestamp);
        }
    }

    ///
    /// Get references to the events ordered by timestamp
    ///
    /// Does not modify the trace. Equal timestamps keep their recorded order.
    ///
    pub fn chronological_events(&self) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.iter().collect();
        if !self.is_chronologically_ordered() {
            events.sort_by_key(|e| e.timestamp);
        }
        events
    }

    /// Activity labels of the trace in chronological order
    pub fn activities(&self) -> Vec<&str> {
        self.chronological_events()
            .into_iter()
            .map(|e| e.activity.as_str())
            .collect()
    }
}

impl FromIterator<Event> for Trace {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Trace {
            events: iter.into_iter().collect(),
        }
    }
}

///
/// Event log: mapping from case identifier to the [`Trace`] of that case
///
/// Cases are kept sorted by their identifier, so iteration order does not depend on insertion order.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EventLog {
    /// Traces per case identifier
    pub cases: BTreeMap<CaseID, Trace>,
}

impl EventLog {
    /// Initializes a new event log without any cases
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Add an event to the case with the given identifier
    ///
    /// Creates the case if it does not exist yet. The event is appended to the trace.
    ///
    pub fn add_event<S: Into<CaseID>>(&mut self, case_id: S, event: Event) {
        self.cases.entry(case_id.into()).or_default().push_event(event);
    }

    ///
    /// Insert a complete trace for a case
    ///
    /// Returns the previously stored trace of that case (if any).
    ///
    pub fn add_trace<S: Into<CaseID>>(&mut self, case_id: S, trace: Trace) -> Option<Trace> {
        self.cases.insert(case_id.into(), trace)
    }

    /// Get the trace of a case
    pub fn get_trace(&self, case_id: &str) -> Option<&Trace> {
        self.cases.get(case_id)
    }

    /// Number of cases
    pub fn num_cases(&self) -> usize {
        self.cases.len()
    }

    /// Total number of events over all cases
    pub fn num_events(&self) -> usize {
        self.cases.values().map(|t| t.events.len()).sum()
    }

    /// Checks if the log contains no cases
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Set of all activity labels occurring in the log
    pub fn activities(&self) -> BTreeSet<&str> {
        self.cases
            .values()
            .flat_map(|t| t.events.iter().map(|e| e.activity.as_str()))
            .collect()
    }

    /// Checks if all cases have non-decreasing event timestamps
    pub fn is_chronologically_ordered(&self) -> bool {
        self.cases.values().all(Trace::is_chronologically_ordered)
    }

    /// Sort the events of every case by timestamp (see [`Trace::sort_chronologically`])
    pub fn sort_chronologically(&mut self) {
        self.cases.values_mut().for_each(Trace::sort_chronologically);
    }
}

impl<S: Into<CaseID>> FromIterator<(S, Trace)> for EventLog {
    fn from_iter<I: IntoIterator<Item = (S, Trace)>>(iter: I) -> Self {
        EventLog {
            cases: iter.into_iter().map(|(c, t)| (c.into(), t)).collect(),
        }
    }
}
