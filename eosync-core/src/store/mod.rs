//! Persistence of correspondences and orphans, keyed by local event.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::correspondence::{CorrespondenceMap, OrphanSet};
use crate::error::CoreResult;
use crate::ids::LocalEventId;

pub trait CorrespondenceStore {
    /// Stored links for an event; empty when nothing was ever synced.
    fn correspondences(&self, event: LocalEventId) -> CoreResult<CorrespondenceMap>;

    fn orphans(&self, event: LocalEventId) -> CoreResult<OrphanSet>;

    /// Replace the stored links. Orphans are only replaced when given.
    fn store(
        &self,
        event: LocalEventId,
        correspondences: &CorrespondenceMap,
        orphans: Option<&OrphanSet>,
    ) -> CoreResult<()>;

    /// Forget everything stored for an event (the local event was deleted).
    fn remove(&self, event: LocalEventId) -> CoreResult<()>;
}
