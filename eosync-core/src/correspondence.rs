//! Correspondence bookkeeping between occurrences and CRM records.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{OccurrenceId, RemoteId};

/// Ordered `occurrence id -> remote id` links for one local event.
///
/// No two occurrences may point at the same remote record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrespondenceMap(BTreeMap<OccurrenceId, RemoteId>);

impl CorrespondenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link an occurrence to a remote record.
    ///
    /// Returns false (and leaves the map untouched) when the remote record is
    /// already linked to a different occurrence.
    pub fn link(&mut self, occurrence: OccurrenceId, remote: RemoteId) -> bool {
        if let Some(owner) = self.occurrence_for(remote) {
            if owner != occurrence {
                return false;
            }
        }
        self.0.insert(occurrence, remote);
        true
    }

    pub fn occurrence_for(&self, remote: RemoteId) -> Option<OccurrenceId> {
        self.0
            .iter()
            .find(|(_, r)| **r == remote)
            .map(|(o, _)| *o)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Links in ascending occurrence id order.
    pub fn iter(&self) -> impl Iterator<Item = (OccurrenceId, RemoteId)> + '_ {
        self.0.iter().map(|(o, r)| (*o, *r))
    }

    /// Remote ids in ascending occurrence id order.
    pub fn remote_ids(&self) -> impl Iterator<Item = RemoteId> + '_ {
        self.0.values().copied()
    }
}

impl FromIterator<(OccurrenceId, RemoteId)> for CorrespondenceMap {
    fn from_iter<I: IntoIterator<Item = (OccurrenceId, RemoteId)>>(iter: I) -> Self {
        let mut map = CorrespondenceMap::new();
        for (occurrence, remote) in iter {
            map.link(occurrence, remote);
        }
        map
    }
}

/// Remote records decoupled from their occurrence but kept (disabled) because
/// they may hold registrations or other collected data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrphanSet(BTreeSet<RemoteId>);

impl OrphanSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: RemoteId) -> bool {
        self.0.insert(id)
    }

    pub fn remove(&mut self, id: RemoteId) -> bool {
        self.0.remove(&id)
    }

    pub fn contains(&self, id: RemoteId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RemoteId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<RemoteId> for OrphanSet {
    fn from_iter<I: IntoIterator<Item = RemoteId>>(iter: I) -> Self {
        OrphanSet(iter.into_iter().collect())
    }
}
