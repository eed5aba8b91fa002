//! Building the CRM payload shared by all of an event's records.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::event::{EventTemplate, EventType};
use crate::local::{EventStatus, LocalEvent};
use crate::location::Venue;

/// Site-wide fallbacks for values an event does not set itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordDefaults {
    pub event_type: Option<u64>,
    pub role: Option<u64>,
    pub registration_profile: Option<u64>,
}

impl RecordDefaults {
    /// Whether the CRM's event types are needed to settle the event type.
    pub fn needs_event_types(&self, event: &LocalEvent) -> bool {
        event.event_type.is_none() && self.event_type.is_none()
    }
}

/// Prepare the template every occurrence's record is built from.
///
/// The event type is taken from the event, then the defaults, then the first
/// type the CRM offers. The CRM refuses events without one, so having none
/// at all is an error.
pub fn prepare_template(
    event: &LocalEvent,
    venue: Option<&Venue>,
    defaults: &RecordDefaults,
    available_types: &[EventType],
) -> CoreResult<EventTemplate> {
    let event_type_id = event
        .event_type
        .or(defaults.event_type)
        .or_else(|| available_types.first().map(|t| t.value))
        .ok_or(CoreError::NoEventType(event.id))?;

    let loc_block_id = venue.and_then(|v| v.civi_id);

    Ok(EventTemplate {
        title: event.title.clone(),
        description: event.description.clone(),
        summary: strip_tags(&event.excerpt),
        is_public: true,
        is_active: event.status != EventStatus::Draft,
        event_type_id,
        default_role_id: event.role.or(defaults.role).filter(|id| *id != 0),
        loc_block_id,
        is_map: loc_block_id.is_some(),
        is_online_registration: event.registration,
        registration_profile: event
            .registration_profile
            .or(defaults.registration_profile),
    })
}

/// Remove markup tags, keeping the text between them.
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{LocalEventId, RemoteId, VenueId};

    fn event() -> LocalEvent {
        LocalEvent {
            id: LocalEventId(1),
            title: "Open mic".into(),
            description: "Bring an instrument".into(),
            excerpt: "<p>Every <em>Friday</em></p>".into(),
            status: EventStatus::Publish,
            venue: None,
            event_type: None,
            role: None,
            registration: false,
            registration_profile: None,
            sync: true,
            schedule: None,
            occurrences: Vec::new(),
        }
    }

    fn types() -> Vec<EventType> {
        vec![
            EventType {
                value: 4,
                label: "Meeting".into(),
            },
            EventType {
                value: 7,
                label: "Concert".into(),
            },
        ]
    }

    #[test]
    fn summary_has_tags_removed() {
        assert_eq!(strip_tags("<p>Every <em>Friday</em></p>"), "Every Friday");
        assert_eq!(strip_tags("3 > 2"), "3 > 2");
    }

    #[test]
    fn event_type_precedence() {
        let mut event = event();
        let mut defaults = RecordDefaults::default();

        let template = prepare_template(&event, None, &defaults, &types()).unwrap();
        assert_eq!(template.event_type_id, 4);

        defaults.event_type = Some(9);
        let template = prepare_template(&event, None, &defaults, &types()).unwrap();
        assert_eq!(template.event_type_id, 9);

        event.event_type = Some(2);
        let template = prepare_template(&event, None, &defaults, &types()).unwrap();
        assert_eq!(template.event_type_id, 2);
    }

    #[test]
    fn no_event_type_anywhere_is_an_error() {
        let err = prepare_template(&event(), None, &RecordDefaults::default(), &[]).unwrap_err();
        assert!(matches!(err, CoreError::NoEventType(LocalEventId(1))));
    }

    #[test]
    fn drafts_are_inactive() {
        let mut event = event();
        event.status = EventStatus::Draft;

        let template = prepare_template(&event, None, &RecordDefaults::default(), &types()).unwrap();
        assert!(!template.is_active);
        assert!(template.is_public);
    }

    #[test]
    fn synced_venue_adds_location_and_map() {
        let venue = Venue {
            id: VenueId(2),
            civi_id: Some(RemoteId(31)),
            ..Default::default()
        };

        let template =
            prepare_template(&event(), Some(&venue), &RecordDefaults::default(), &types()).unwrap();
        assert_eq!(template.loc_block_id, Some(RemoteId(31)));
        assert!(template.is_map);

        let template =
            prepare_template(&event(), None, &RecordDefaults::default(), &types()).unwrap();
        assert!(!template.is_map);
    }

    #[test]
    fn event_role_and_profile_beat_defaults() {
        let mut event = event();
        event.role = Some(3);
        let defaults = RecordDefaults {
            event_type: None,
            role: Some(1),
            registration_profile: Some(12),
        };

        let template = prepare_template(&event, None, &defaults, &types()).unwrap();
        assert_eq!(template.default_role_id, Some(3));
        assert_eq!(template.registration_profile, Some(12));
    }

    #[test]
    fn defaults_only_need_types_without_any_type_set() {
        let mut defaults = RecordDefaults::default();
        assert!(defaults.needs_event_types(&event()));

        defaults.event_type = Some(1);
        assert!(!defaults.needs_event_types(&event()));
    }
}
