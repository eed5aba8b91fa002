//! Matching occurrences to CRM records by start time.

use std::collections::{BTreeMap, HashSet};

use crate::event::{Occurrence, RemoteRecord};
use crate::ids::{OccurrenceId, RemoteId};

/// Outcome of matching one event's occurrences against its CRM records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    /// Occurrence -> record pairs, iterated in ascending occurrence id.
    pub matched: BTreeMap<OccurrenceId, RemoteId>,
    /// Occurrences with no record, in input order.
    pub unmatched_local: Vec<Occurrence>,
    /// Linked records no occurrence claimed, in input order.
    pub unmatched_remote: Vec<RemoteId>,
    /// Orphaned records reclaimed by an occurrence.
    pub unorphaned: Vec<RemoteId>,
}

/// Match occurrences to linked records, then to orphaned records.
///
/// Greedy and first-match-wins: each occurrence, in input order, takes the
/// first not-yet-claimed record whose start is exactly equal to its own.
/// Records sharing a start time are therefore claimed in input order, which
/// is why callers pass records in chronological order.
///
/// Orphaned records are only consulted for occurrences that found nothing
/// among the linked ones, and are never reported as unmatched.
pub fn match_occurrences(
    occurrences: &[Occurrence],
    linked: &[RemoteRecord],
    orphaned: &[RemoteRecord],
) -> MatchResult {
    let mut matched = BTreeMap::new();
    let mut claimed = HashSet::new();

    for occurrence in occurrences {
        if let Some(record) = first_available(occurrence, linked, &claimed) {
            claimed.insert(record.id);
            matched.insert(occurrence.id, record.id);
        }
    }

    let mut unorphaned = Vec::new();

    for occurrence in occurrences {
        if matched.contains_key(&occurrence.id) {
            continue;
        }
        if let Some(record) = first_available(occurrence, orphaned, &claimed) {
            claimed.insert(record.id);
            matched.insert(occurrence.id, record.id);
            unorphaned.push(record.id);
        }
    }

    let unmatched_local = occurrences
        .iter()
        .filter(|o| !matched.contains_key(&o.id))
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let unmatched_remote = linked
        .iter()
        .map(|r| r.id)
        .filter(|id| !claimed.contains(id) && seen.insert(*id))
        .collect();

    MatchResult {
        matched,
        unmatched_local,
        unmatched_remote,
        unorphaned,
    }
}

fn first_available<'a>(
    occurrence: &Occurrence,
    records: &'a [RemoteRecord],
    claimed: &HashSet<RemoteId>,
) -> Option<&'a RemoteRecord> {
    records
        .iter()
        .find(|r| r.start_date == occurrence.start && !claimed.contains(&r.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn occ(id: u64, start: NaiveDateTime) -> Occurrence {
        Occurrence::new(id, start, start + chrono::Duration::hours(2))
    }

    fn rec(id: u64, start: NaiveDateTime) -> RemoteRecord {
        RemoteRecord {
            id: RemoteId(id),
            start_date: start,
            end_date: None,
            title: None,
            is_active: true,
            is_online_registration: false,
            registration_start_date: None,
            registration_end_date: None,
        }
    }

    #[test]
    fn bijection_matches_everything() {
        let occurrences = vec![
            occ(1, day(2024, 1, 1)),
            occ(2, day(2024, 1, 8)),
            occ(3, day(2024, 1, 15)),
        ];
        // Deliberately out of order: exact matching does not depend on it
        let linked = vec![
            rec(103, day(2024, 1, 15)),
            rec(101, day(2024, 1, 1)),
            rec(102, day(2024, 1, 8)),
        ];

        let result = match_occurrences(&occurrences, &linked, &[]);

        let expected: BTreeMap<_, _> = [
            (OccurrenceId(1), RemoteId(101)),
            (OccurrenceId(2), RemoteId(102)),
            (OccurrenceId(3), RemoteId(103)),
        ]
        .into_iter()
        .collect();
        assert_eq!(result.matched, expected);
        assert!(result.unmatched_local.is_empty());
        assert!(result.unmatched_remote.is_empty());
        assert!(result.unorphaned.is_empty());
    }

    #[test]
    fn nothing_to_match_against_leaves_all_local_unmatched() {
        let occurrences = vec![occ(1, day(2024, 1, 1)), occ(2, day(2024, 1, 8))];

        let result = match_occurrences(&occurrences, &[], &[]);

        assert!(result.matched.is_empty());
        assert_eq!(result.unmatched_local, occurrences);
        assert!(result.unmatched_remote.is_empty());
    }

    #[test]
    fn no_occurrences_leaves_all_linked_unmatched() {
        let linked = vec![rec(100, day(2024, 1, 1)), rec(101, day(2024, 1, 8))];

        let result = match_occurrences(&[], &linked, &[]);

        assert!(result.matched.is_empty());
        assert_eq!(result.unmatched_remote, vec![RemoteId(100), RemoteId(101)]);
    }

    #[test]
    fn orphans_are_reclaimed_but_never_unmatched() {
        let occurrences = vec![occ(1, day(2024, 1, 1)), occ(2, day(2024, 2, 1))];
        let linked = vec![rec(100, day(2024, 1, 1))];
        let orphaned = vec![rec(90, day(2024, 2, 1)), rec(91, day(2023, 6, 1))];

        let result = match_occurrences(&occurrences, &linked, &orphaned);

        assert_eq!(result.matched.get(&OccurrenceId(2)), Some(&RemoteId(90)));
        assert_eq!(result.unorphaned, vec![RemoteId(90)]);
        assert!(result.unmatched_remote.is_empty());
        assert!(result.unmatched_local.is_empty());
    }

    #[test]
    fn unorphaned_ids_are_always_matched_values() {
        let occurrences = vec![
            occ(1, day(2024, 1, 1)),
            occ(2, day(2024, 1, 1)),
            occ(3, day(2024, 3, 1)),
        ];
        let linked = vec![rec(100, day(2024, 1, 1))];
        let orphaned = vec![rec(80, day(2024, 1, 1)), rec(81, day(2024, 3, 1))];

        let result = match_occurrences(&occurrences, &linked, &orphaned);

        for id in &result.unorphaned {
            assert!(result.matched.values().any(|v| v == id));
        }
        assert_eq!(result.unorphaned, vec![RemoteId(80), RemoteId(81)]);
    }

    #[test]
    fn linked_match_beats_orphan_with_same_start() {
        let occurrences = vec![occ(1, day(2024, 1, 1))];
        let linked = vec![rec(100, day(2024, 1, 1))];
        let orphaned = vec![rec(50, day(2024, 1, 1))];

        let result = match_occurrences(&occurrences, &linked, &orphaned);

        assert_eq!(result.matched.get(&OccurrenceId(1)), Some(&RemoteId(100)));
        assert!(result.unorphaned.is_empty());
    }

    #[test]
    fn duplicate_starts_claim_records_in_input_order() {
        let occurrences = vec![
            occ(1, day(2024, 1, 1)),
            occ(2, day(2024, 1, 1)),
            occ(3, day(2024, 1, 1)),
        ];
        let linked = vec![rec(200, day(2024, 1, 1)), rec(201, day(2024, 1, 1))];

        let result = match_occurrences(&occurrences, &linked, &[]);

        assert_eq!(result.matched.get(&OccurrenceId(1)), Some(&RemoteId(200)));
        assert_eq!(result.matched.get(&OccurrenceId(2)), Some(&RemoteId(201)));
        assert_eq!(result.unmatched_local, vec![occurrences[2].clone()]);
        assert!(result.unmatched_remote.is_empty());
    }

    #[test]
    fn start_equality_is_exact() {
        let occurrences = vec![occ(1, day(2024, 1, 1))];
        let linked = vec![rec(
            100,
            day(2024, 1, 1) + chrono::Duration::minutes(1),
        )];

        let result = match_occurrences(&occurrences, &linked, &[]);

        assert!(result.matched.is_empty());
        assert_eq!(result.unmatched_remote, vec![RemoteId(100)]);
    }

    #[test]
    fn matched_iterates_by_occurrence_id() {
        let occurrences = vec![occ(9, day(2024, 1, 1)), occ(4, day(2024, 1, 8))];
        let linked = vec![rec(1, day(2024, 1, 1)), rec(2, day(2024, 1, 8))];

        let result = match_occurrences(&occurrences, &linked, &[]);

        let keys: Vec<_> = result.matched.keys().copied().collect();
        assert_eq!(keys, vec![OccurrenceId(4), OccurrenceId(9)]);
    }

    #[test]
    fn matching_is_pure() {
        let occurrences = vec![occ(1, day(2024, 1, 1)), occ(2, day(2024, 5, 1))];
        let linked = vec![rec(100, day(2024, 1, 1)), rec(101, day(2023, 1, 1))];
        let orphaned = vec![rec(50, day(2024, 5, 1))];

        let first = match_occurrences(&occurrences, &linked, &orphaned);
        let second = match_occurrences(&occurrences, &linked, &orphaned);

        assert_eq!(first, second);
    }
}
