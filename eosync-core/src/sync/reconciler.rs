//! Applying occurrence changes to CRM records.

use serde::{Deserialize, Serialize};

use crate::correspondence::{CorrespondenceMap, OrphanSet};
use crate::error::{CoreError, CoreResult, Operation, RemoteError, RemoteFailure};
use crate::event::{EventTemplate, Occurrence, RemoteRecord};
use crate::ids::{OccurrenceId, RemoteId};
use crate::local::{LocalEvent, OccurrenceSource};
use crate::location::Venue;
use crate::prepare::{RecordDefaults, prepare_template};
use crate::remote::EventRecords;
use crate::store::CorrespondenceStore;
use crate::sync::matcher::{MatchResult, match_occurrences};
use crate::sync::report::{ActionKind, ReconcileReport, Strategy};

/// What to do with a linked record no occurrence claims any more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Disable the record and keep it as an orphan (it may hold registrations).
    #[default]
    Disable,
    Delete,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub policy: UnmatchedPolicy,
    /// Leave the event alone entirely.
    pub skip: bool,
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub correspondences: CorrespondenceMap,
    pub orphans: OrphanSet,
    pub report: ReconcileReport,
}

/// A dry run: how the stored records would match the current occurrences.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub strategy: Strategy,
    pub matches: MatchResult,
    pub failures: Vec<RemoteFailure>,
}

/// Records read back for a rematch.
struct Fetched {
    linked: Vec<RemoteRecord>,
    orphaned: Vec<RemoteRecord>,
    unreadable: CorrespondenceMap,
    failures: Vec<RemoteFailure>,
}

/// Occurrences whose link wasn't held back by a failed read.
fn pending_occurrences(occurrences: &[Occurrence], unreadable: &CorrespondenceMap) -> Vec<Occurrence> {
    occurrences
        .iter()
        .filter(|o| !unreadable.iter().any(|(held, _)| held == o.id))
        .cloned()
        .collect()
}

/// Link a written record, reporting a record the CRM handed out twice.
fn link(
    correspondences: &mut CorrespondenceMap,
    occurrence: OccurrenceId,
    id: RemoteId,
    report: &mut ReconcileReport,
) {
    if correspondences.link(occurrence, id) {
        return;
    }
    let owner = correspondences
        .occurrence_for(id)
        .map(|o| o.to_string())
        .unwrap_or_default();
    report.fail(
        RemoteFailure::new(
            Operation::Link,
            RemoteError::Rejected(format!("already linked to occurrence {owner}")),
        )
        .remote(id)
        .occurrence(occurrence),
    );
}

pub struct Reconciler<'a, R: EventRecords + ?Sized> {
    remote: &'a R,
}

impl<'a, R: EventRecords + ?Sized> Reconciler<'a, R> {
    /// Check the remote once; nothing is touched when it isn't ready.
    pub async fn connect(remote: &'a R) -> CoreResult<Self> {
        remote
            .check_ready()
            .await
            .map_err(|e| CoreError::RemoteUnavailable(e.to_string()))?;
        Ok(Reconciler { remote })
    }

    /// Prepare an event's template, asking the CRM for its event types only
    /// when neither the event nor the defaults name one.
    pub async fn template_for(
        &self,
        event: &LocalEvent,
        venue: Option<&Venue>,
        defaults: &RecordDefaults,
    ) -> CoreResult<EventTemplate> {
        let types = if defaults.needs_event_types(event) {
            self.remote
                .event_types()
                .await
                .map_err(|e| RemoteFailure::new(Operation::Fetch, e))?
        } else {
            Vec::new()
        };

        prepare_template(event, venue, defaults, &types)
    }

    /// Bring one event's CRM records in line with its occurrences.
    ///
    /// When the counts agree the existing records are rewritten pairwise, in
    /// ascending occurrence id order. Otherwise every stored record is
    /// fetched and matched by start time: matches are updated, unmatched
    /// occurrences get new records and unmatched records are disabled or
    /// deleted according to `policy`.
    ///
    /// Failed remote calls are collected in the report and only affect their
    /// own item.
    pub async fn reconcile(
        &self,
        template: &EventTemplate,
        occurrences: &[Occurrence],
        existing: &CorrespondenceMap,
        orphans: &OrphanSet,
        policy: UnmatchedPolicy,
    ) -> Reconciliation {
        if occurrences.len() == existing.len() && !occurrences.is_empty() {
            self.update_in_place(template, occurrences, existing, orphans)
                .await
        } else {
            self.rematch(template, occurrences, existing, orphans, policy)
                .await
        }
    }

    async fn update_in_place(
        &self,
        template: &EventTemplate,
        occurrences: &[Occurrence],
        existing: &CorrespondenceMap,
        orphans: &OrphanSet,
    ) -> Reconciliation {
        let mut report = ReconcileReport::new(Strategy::InPlace);
        let mut correspondences = CorrespondenceMap::new();

        let mut ordered: Vec<&Occurrence> = occurrences.iter().collect();
        ordered.sort_by_key(|o| o.id);

        for (occurrence, remote_id) in ordered.into_iter().zip(existing.remote_ids()) {
            if let Some(id) = self
                .write(template, occurrence, Some(remote_id), &mut report)
                .await
            {
                link(&mut correspondences, occurrence.id, id, &mut report);
            }
        }

        Reconciliation {
            correspondences,
            orphans: orphans.clone(),
            report,
        }
    }

    async fn rematch(
        &self,
        template: &EventTemplate,
        occurrences: &[Occurrence],
        existing: &CorrespondenceMap,
        orphans: &OrphanSet,
        policy: UnmatchedPolicy,
    ) -> Reconciliation {
        let mut report = ReconcileReport::new(Strategy::Rematch);

        let fetched = self.fetch_records(existing, orphans).await;
        for failure in fetched.failures {
            report.fail(failure);
        }

        let mut correspondences = CorrespondenceMap::new();
        let mut new_orphans = orphans.clone();

        // Links whose record couldn't be read stay as they are: the occurrence
        // keeps its record, and a record whose occurrence is gone is kept as
        // an orphan rather than touched blind.
        for (occurrence_id, remote_id) in fetched.unreadable.iter() {
            if occurrences.iter().any(|o| o.id == occurrence_id) {
                link(&mut correspondences, occurrence_id, remote_id, &mut report);
            } else {
                new_orphans.insert(remote_id);
            }
        }

        let pending = pending_occurrences(occurrences, &fetched.unreadable);
        let matches = match_occurrences(&pending, &fetched.linked, &fetched.orphaned);

        for id in &matches.unorphaned {
            new_orphans.remove(*id);
        }

        for (occurrence_id, remote_id) in &matches.matched {
            let Some(occurrence) = occurrences.iter().find(|o| o.id == *occurrence_id) else {
                continue;
            };
            if let Some(id) = self
                .write(template, occurrence, Some(*remote_id), &mut report)
                .await
            {
                link(&mut correspondences, occurrence.id, id, &mut report);
            }
        }

        for occurrence in &matches.unmatched_local {
            if let Some(id) = self.write(template, occurrence, None, &mut report).await {
                link(&mut correspondences, occurrence.id, id, &mut report);
            }
        }

        for remote_id in &matches.unmatched_remote {
            match policy {
                UnmatchedPolicy::Delete => match self.remote.delete_event(*remote_id).await {
                    Ok(()) => report.record(ActionKind::Delete, *remote_id, None),
                    Err(e) => {
                        report.fail(RemoteFailure::new(Operation::Delete, e).remote(*remote_id))
                    }
                },
                UnmatchedPolicy::Disable => {
                    match self.remote.disable_event(*remote_id).await {
                        Ok(()) => report.record(ActionKind::Disable, *remote_id, None),
                        Err(e) => report
                            .fail(RemoteFailure::new(Operation::Disable, e).remote(*remote_id)),
                    }
                    new_orphans.insert(*remote_id);
                }
            }
        }

        Reconciliation {
            correspondences,
            orphans: new_orphans,
            report,
        }
    }

    /// Create or update the record for one occurrence and refresh its
    /// registration form. Returns the record id on success.
    ///
    /// A failed registration refresh is reported but the record is still
    /// returned, since it exists and holds the occurrence's dates.
    async fn write(
        &self,
        template: &EventTemplate,
        occurrence: &Occurrence,
        target: Option<RemoteId>,
        report: &mut ReconcileReport,
    ) -> Option<RemoteId> {
        let record = template.for_occurrence(occurrence);

        let written = match target {
            Some(id) => self
                .remote
                .update_event(id, &record)
                .await
                .map(|_| (ActionKind::Update, id))
                .map_err(|e| RemoteFailure::new(Operation::Update, e).remote(id)),
            None => self
                .remote
                .create_event(&record)
                .await
                .map(|created| (ActionKind::Create, created.id))
                .map_err(|e| RemoteFailure::new(Operation::Create, e)),
        };

        let (kind, id) = match written {
            Ok(written) => written,
            Err(failure) => {
                report.fail(failure.occurrence(occurrence.id).payload(&record));
                return None;
            }
        };
        report.record(kind, id, Some(occurrence.id));

        if template.is_online_registration {
            if let Err(e) = self
                .remote
                .enable_registration(id, template.registration_profile)
                .await
            {
                report.fail(
                    RemoteFailure::new(Operation::EnableRegistration, e)
                        .remote(id)
                        .occurrence(occurrence.id),
                );
            }
        }

        Some(id)
    }

    /// Fetch linked records in correspondence order, then orphans.
    ///
    /// A linked record the CRM reports as missing is dropped; one that fails
    /// for any other reason is kept aside in `unreadable`.
    async fn fetch_records(&self, existing: &CorrespondenceMap, orphans: &OrphanSet) -> Fetched {
        let mut failures = Vec::new();
        let mut unreadable = CorrespondenceMap::new();

        let mut linked = Vec::with_capacity(existing.len());
        for (occurrence_id, remote_id) in existing.iter() {
            match self.remote.get_event(remote_id).await {
                Ok(record) => linked.push(record),
                Err(e) => {
                    if !matches!(e, RemoteError::NotFound(_)) {
                        unreadable.link(occurrence_id, remote_id);
                    }
                    failures.push(
                        RemoteFailure::new(Operation::Fetch, e)
                            .remote(remote_id)
                            .occurrence(occurrence_id),
                    );
                }
            }
        }

        let mut orphaned = Vec::with_capacity(orphans.len());
        for remote_id in orphans.iter() {
            match self.remote.get_event(remote_id).await {
                Ok(record) => orphaned.push(record),
                Err(e) => failures.push(RemoteFailure::new(Operation::Fetch, e).remote(remote_id)),
            }
        }

        Fetched {
            linked,
            orphaned,
            unreadable,
            failures,
        }
    }

    /// Match without writing anything.
    pub async fn preview(
        &self,
        occurrences: &[Occurrence],
        existing: &CorrespondenceMap,
        orphans: &OrphanSet,
    ) -> Preview {
        let strategy = if occurrences.len() == existing.len() && !occurrences.is_empty() {
            Strategy::InPlace
        } else {
            Strategy::Rematch
        };
        let fetched = self.fetch_records(existing, orphans).await;
        let pending = pending_occurrences(occurrences, &fetched.unreadable);

        Preview {
            strategy,
            matches: match_occurrences(&pending, &fetched.linked, &fetched.orphaned),
            failures: fetched.failures,
        }
    }

    /// Load an event's occurrences and stored state, reconcile, and store the
    /// result.
    ///
    /// Returns None when the event is skipped. A missing event type fails
    /// before any record is written.
    pub async fn sync_event<S, O>(
        &self,
        store: &S,
        source: &O,
        event: &LocalEvent,
        venue: Option<&Venue>,
        defaults: &RecordDefaults,
        options: SyncOptions,
    ) -> CoreResult<Option<Reconciliation>>
    where
        S: CorrespondenceStore + ?Sized,
        O: OccurrenceSource + ?Sized,
    {
        if options.skip {
            tracing::debug!(event = %event.id, "sync skipped");
            return Ok(None);
        }

        let template = self.template_for(event, venue, defaults).await?;
        let occurrences = source.occurrences(event.id)?;
        let existing = store.correspondences(event.id)?;
        let orphans = store.orphans(event.id)?;

        let reconciliation = self
            .reconcile(&template, &occurrences, &existing, &orphans, options.policy)
            .await;

        let orphans_changed = reconciliation.orphans != orphans;
        store.store(
            event.id,
            &reconciliation.correspondences,
            orphans_changed.then_some(&reconciliation.orphans),
        )?;

        let report = &reconciliation.report;
        tracing::info!(
            event = %event.id,
            strategy = %report.strategy,
            created = report.count(ActionKind::Create),
            updated = report.count(ActionKind::Update),
            disabled = report.count(ActionKind::Disable),
            deleted = report.count(ActionKind::Delete),
            failed = report.failures.len(),
            "event reconciled"
        );

        Ok(Some(reconciliation))
    }
}
