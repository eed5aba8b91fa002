//! Event types shared by both sides of a sync.
//!
//! Times are site-local wall-clock values (`NaiveDateTime`): the CRM stores
//! event dates without a zone, and occurrences are compared against them
//! verbatim.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ids::{OccurrenceId, RemoteId};

/// One scheduled instance of a recurring local event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: OccurrenceId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Occurrence {
    pub fn new(id: impl Into<OccurrenceId>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Occurrence {
            id: id.into(),
            start,
            end,
        }
    }
}

/// A CRM event record as returned by the remote side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: RemoteId,
    pub start_date: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_online_registration: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_start_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_end_date: Option<NaiveDateTime>,
}

fn default_true() -> bool {
    true
}

impl RemoteRecord {
    /// Whether online registration is closed at `now`.
    ///
    /// Without explicit registration dates the CRM opens registration when the
    /// event starts and closes it when the event ends. A record with no end
    /// date never closes on the end side.
    pub fn is_registration_closed(&self, now: NaiveDateTime) -> bool {
        let opens = self.registration_start_date.unwrap_or(self.start_date);
        if now < opens {
            return true;
        }

        match self.registration_end_date.or(self.end_date) {
            Some(closes) => closes < now,
            None => false,
        }
    }
}

/// Fields shared by every CRM record generated from one local event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTemplate {
    pub title: String,
    pub description: String,
    pub summary: String,
    pub is_public: bool,
    pub is_active: bool,
    pub event_type_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_role_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc_block_id: Option<RemoteId>,
    pub is_map: bool,
    pub is_online_registration: bool,
    /// Registration form profile attached after create/update. Not part of the
    /// record payload itself.
    #[serde(skip)]
    pub registration_profile: Option<u64>,
}

impl EventTemplate {
    /// Build the payload for one occurrence.
    pub fn for_occurrence(&self, occurrence: &Occurrence) -> EventRecord {
        EventRecord {
            template: self.clone(),
            start_date: occurrence.start,
            end_date: occurrence.end,
        }
    }
}

/// Payload sent to the remote side to create or update one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub template: EventTemplate,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

/// A CRM event type option (the CRM requires one on every event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    pub value: u64,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn record() -> RemoteRecord {
        RemoteRecord {
            id: RemoteId(1),
            start_date: at(10, 9),
            end_date: Some(at(10, 17)),
            title: None,
            is_active: true,
            is_online_registration: true,
            registration_start_date: None,
            registration_end_date: None,
        }
    }

    #[test]
    fn registration_follows_event_dates_by_default() {
        let record = record();
        assert!(record.is_registration_closed(at(10, 8)));
        assert!(!record.is_registration_closed(at(10, 12)));
        assert!(record.is_registration_closed(at(10, 18)));
    }

    #[test]
    fn explicit_registration_window_wins() {
        let mut record = record();
        record.registration_start_date = Some(at(1, 0));
        record.registration_end_date = Some(at(9, 0));

        assert!(!record.is_registration_closed(at(5, 12)));
        assert!(record.is_registration_closed(at(10, 12)));
    }

    #[test]
    fn record_payload_flattens_template() {
        let template = EventTemplate {
            title: "Choir practice".into(),
            description: String::new(),
            summary: String::new(),
            is_public: true,
            is_active: true,
            event_type_id: 3,
            default_role_id: None,
            loc_block_id: Some(RemoteId(8)),
            is_map: true,
            is_online_registration: false,
            registration_profile: Some(12),
        };
        let occurrence = Occurrence::new(5, at(4, 19), at(4, 21));

        let value = serde_json::to_value(template.for_occurrence(&occurrence)).unwrap();

        assert_eq!(value["title"], "Choir practice");
        assert_eq!(value["loc_block_id"], 8);
        assert_eq!(value["start_date"], "2024-03-04T19:00:00");
        assert!(value.get("registration_profile").is_none());
        assert!(value.get("default_role_id").is_none());
    }
}
