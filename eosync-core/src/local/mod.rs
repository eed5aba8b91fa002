//! Local (content-management) side of a sync.

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::event::Occurrence;
use crate::ids::{LocalEventId, VenueId};
use crate::recurrence::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Publish,
    Draft,
}

fn default_true() -> bool {
    true
}

/// A local event and its occurrences, stored as `<site>/events/<id>.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEvent {
    pub id: LocalEventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Short summary; may contain markup.
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<VenueId>,
    /// CRM event type value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<u64>,
    /// CRM participant role id for registrants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<u64>,
    #[serde(default)]
    pub registration: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_profile: Option<u64>,
    /// Set to false to keep this event out of every sync.
    #[serde(default = "default_true")]
    pub sync: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

impl LocalEvent {
    /// Occurrences in chronological order.
    pub fn chronological(&self) -> Vec<Occurrence> {
        let mut occurrences = self.occurrences.clone();
        occurrences.sort_by_key(|o| (o.start, o.id));
        occurrences
    }
}

/// Supplies the current occurrences of a local event.
pub trait OccurrenceSource {
    /// Occurrences in chronological order.
    fn occurrences(&self, event: LocalEventId) -> CoreResult<Vec<Occurrence>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = r#"
id = 12
title = "Quiz night"
excerpt = "<p>Monthly <b>quiz</b></p>"
status = "draft"
venue = 3

[[occurrences]]
id = 2
start = "2024-02-01T19:00:00"
end = "2024-02-01T21:00:00"

[[occurrences]]
id = 1
start = "2024-01-04T19:00:00"
end = "2024-01-04T21:00:00"
"#;

    #[test]
    fn event_file_parses_with_defaults() {
        let event: LocalEvent = toml::from_str(EVENT).unwrap();

        assert_eq!(event.id, LocalEventId(12));
        assert_eq!(event.status, EventStatus::Draft);
        assert_eq!(event.venue, Some(VenueId(3)));
        assert!(event.sync);
        assert!(!event.registration);
        assert!(event.schedule.is_none());
    }

    #[test]
    fn chronological_sorts_by_start() {
        let event: LocalEvent = toml::from_str(EVENT).unwrap();

        let ids: Vec<_> = event.chronological().iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
