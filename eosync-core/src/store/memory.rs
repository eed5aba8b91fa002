use std::collections::HashMap;
use std::sync::Mutex;

use crate::correspondence::{CorrespondenceMap, OrphanSet};
use crate::error::{CoreError, CoreResult};
use crate::ids::LocalEventId;
use crate::store::CorrespondenceStore;

/// In-process store, used for previews and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: Mutex<HashMap<LocalEventId, (CorrespondenceMap, OrphanSet)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(
        &self,
        f: impl FnOnce(&mut HashMap<LocalEventId, (CorrespondenceMap, OrphanSet)>) -> T,
    ) -> CoreResult<T> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| CoreError::State("memory store poisoned".into()))?;
        Ok(f(&mut events))
    }
}

impl CorrespondenceStore for MemoryStore {
    fn correspondences(&self, event: LocalEventId) -> CoreResult<CorrespondenceMap> {
        self.with(|events| {
            events
                .get(&event)
                .map(|(map, _)| map.clone())
                .unwrap_or_default()
        })
    }

    fn orphans(&self, event: LocalEventId) -> CoreResult<OrphanSet> {
        self.with(|events| {
            events
                .get(&event)
                .map(|(_, orphans)| orphans.clone())
                .unwrap_or_default()
        })
    }

    fn store(
        &self,
        event: LocalEventId,
        correspondences: &CorrespondenceMap,
        orphans: Option<&OrphanSet>,
    ) -> CoreResult<()> {
        self.with(|events| {
            let entry = events.entry(event).or_default();
            entry.0 = correspondences.clone();
            if let Some(orphans) = orphans {
                entry.1 = orphans.clone();
            }
        })
    }

    fn remove(&self, event: LocalEventId) -> CoreResult<()> {
        self.with(|events| {
            events.remove(&event);
        })
    }
}
