//! RRULE expansion for recurring local events.
//!
//! Regenerates an event's occurrence list from its schedule while keeping
//! the ids of occurrences whose start did not move.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::event::Occurrence;
use crate::ids::{LocalEventId, OccurrenceId};

/// Upper bound on generated dates for rules without COUNT or UNTIL.
const MAX_OCCURRENCES: u16 = 730;

/// A recurrence rule anchored at the first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// RRULE value, e.g. `FREQ=WEEKLY;BYDAY=TU;COUNT=10`.
    pub rrule: String,
    pub start: NaiveDateTime,
    /// Length of each occurrence, e.g. `2h 30m`.
    pub duration: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exdates: Vec<NaiveDateTime>,
}

impl Schedule {
    fn duration(&self, event: LocalEventId) -> CoreResult<Duration> {
        let std = humantime::parse_duration(&self.duration).map_err(|e| CoreError::Schedule {
            event,
            message: format!("invalid duration '{}': {}", self.duration, e),
        })?;
        Duration::from_std(std).map_err(|e| CoreError::Schedule {
            event,
            message: e.to_string(),
        })
    }

    /// Times are floating, so they are passed to the rrule parser as UTC and
    /// read back the same way.
    fn rrule_string(&self) -> String {
        let mut lines = vec![
            format!("DTSTART:{}Z", self.start.format("%Y%m%dT%H%M%S")),
            format!("RRULE:{}", self.rrule),
        ];
        for exdate in &self.exdates {
            lines.push(format!("EXDATE:{}Z", exdate.format("%Y%m%dT%H%M%S")));
        }
        lines.join("\n")
    }
}

/// Expand a schedule into occurrences, optionally stopping after `until`.
///
/// A generated start that equals an existing occurrence's start keeps that
/// occurrence's id. Every other start gets the next id above the highest one
/// seen, so ids of appended dates keep increasing with time.
pub fn expand_schedule(
    event: LocalEventId,
    schedule: &Schedule,
    existing: &[Occurrence],
    until: Option<NaiveDateTime>,
) -> CoreResult<Vec<Occurrence>> {
    let duration = schedule.duration(event)?;

    let mut rrule_set: RRuleSet =
        schedule
            .rrule_string()
            .parse()
            .map_err(|e| CoreError::Schedule {
                event,
                message: format!("{e}"),
            })?;

    if let Some(until) = until {
        // before() is exclusive
        let tz: rrule::Tz = Utc.into();
        rrule_set = rrule_set.before((until + Duration::seconds(1)).and_utc().with_timezone(&tz));
    }

    let result = rrule_set.all(MAX_OCCURRENCES);
    if result.limited {
        tracing::warn!(event = %event, limit = MAX_OCCURRENCES, "schedule truncated");
    }

    let mut by_start: HashMap<NaiveDateTime, Vec<OccurrenceId>> = HashMap::new();
    for occurrence in existing {
        by_start.entry(occurrence.start).or_default().push(occurrence.id);
    }
    for ids in by_start.values_mut() {
        ids.reverse();
    }

    let mut next_id = existing.iter().map(|o| o.id.0).max().unwrap_or(0) + 1;

    let occurrences = result
        .dates
        .iter()
        .map(|date| {
            let start = date.naive_utc();
            let id = match by_start.get_mut(&start).and_then(Vec::pop) {
                Some(id) => id,
                None => {
                    let id = OccurrenceId(next_id);
                    next_id += 1;
                    id
                }
            };
            Occurrence::new(id, start, start + duration)
        })
        .collect();

    Ok(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, m, d)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap()
    }

    fn weekly(count: u32) -> Schedule {
        Schedule {
            rrule: format!("FREQ=WEEKLY;COUNT={count}"),
            start: at(1, 2),
            duration: "2h".into(),
            exdates: Vec::new(),
        }
    }

    #[test]
    fn fresh_schedule_numbers_from_one() {
        let occurrences = expand_schedule(LocalEventId(1), &weekly(3), &[], None).unwrap();

        let ids: Vec<_> = occurrences.iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(occurrences[1].start, at(1, 9));
        assert_eq!(occurrences[1].end, at(1, 9) + Duration::hours(2));
    }

    #[test]
    fn unchanged_starts_keep_their_ids() {
        let existing = vec![
            Occurrence::new(4, at(1, 2), at(1, 2)),
            Occurrence::new(9, at(1, 9), at(1, 9)),
        ];

        let occurrences = expand_schedule(LocalEventId(1), &weekly(3), &existing, None).unwrap();

        let ids: Vec<_> = occurrences.iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![4, 9, 10]);
    }

    #[test]
    fn exdates_are_skipped() {
        let mut schedule = weekly(3);
        schedule.exdates.push(at(1, 9));

        let occurrences = expand_schedule(LocalEventId(1), &schedule, &[], None).unwrap();

        let starts: Vec<_> = occurrences.iter().map(|o| o.start).collect();
        assert_eq!(starts, vec![at(1, 2), at(1, 16)]);
    }

    #[test]
    fn until_is_inclusive() {
        let schedule = Schedule {
            rrule: "FREQ=WEEKLY".into(),
            ..weekly(0)
        };

        let occurrences =
            expand_schedule(LocalEventId(1), &schedule, &[], Some(at(1, 16))).unwrap();

        assert_eq!(occurrences.len(), 3);
    }

    #[test]
    fn bad_rule_is_a_schedule_error() {
        let schedule = Schedule {
            rrule: "FREQ=SOMETIMES".into(),
            ..weekly(1)
        };

        let err = expand_schedule(LocalEventId(8), &schedule, &[], None).unwrap_err();
        assert!(matches!(err, CoreError::Schedule { event: LocalEventId(8), .. }));
    }

    #[test]
    fn bad_duration_is_a_schedule_error() {
        let schedule = Schedule {
            duration: "a while".into(),
            ..weekly(1)
        };

        assert!(expand_schedule(LocalEventId(1), &schedule, &[], None).is_err());
    }
}
