//! In-memory membership store.
//!
//! One partition per owner, with three indexes kept in sync: the primary
//! id map, a subject index for duplicate checks, and a `BTreeMap`
//! position index. The position index both yields ranking order for reads
//! and makes slot occupancy an O(log n) check — two entries can never
//! share a position, the way a unique index on `(owner, position)` would
//! behave in a relational backend.
//!
//! `apply` runs the batch against a scratch clone of the partition,
//! checking uniqueness after every op, then verifies no entry is left at
//! a negative position and swaps the clone in. A failed batch leaves the
//! partition exactly as it was.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{MembershipStore, PositionRange, ShiftDirection, StoreError, WriteOp};
use crate::model::{RankedEntry, WatchList};

/// One owner's rows. Cloning is the transaction mechanism: cheap enough
/// for the partition sizes a single user produces.
#[derive(Debug, Clone, Default)]
struct Partition {
    /// Primary map, keyed by entry id.
    entries: HashMap<String, RankedEntry>,
    /// Subject id -> entry id.
    by_subject: HashMap<String, String>,
    /// Position -> entry id. Key collisions are position conflicts.
    by_position: BTreeMap<i64, String>,
    /// Watch lists in creation order.
    lists: Vec<WatchList>,
}

impl Partition {
    fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.lists.is_empty()
    }

    /// Claims a position slot for an entry id. The map key is the
    /// uniqueness check: an occupied slot is a conflict.
    fn place(&mut self, position: i64, entry_id: &str) -> Result<(), StoreError> {
        if self.by_position.contains_key(&position) {
            return Err(StoreError::PositionConflict { position });
        }
        self.by_position.insert(position, entry_id.to_owned());
        Ok(())
    }

    fn apply_op(&mut self, op: WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::Insert(entry) => {
                if self.by_subject.contains_key(&entry.subject_id) {
                    return Err(StoreError::SubjectConflict);
                }
                self.place(entry.position, &entry.id)?;
                self.by_subject
                    .insert(entry.subject_id.clone(), entry.id.clone());
                self.entries.insert(entry.id.clone(), entry);
                Ok(())
            }
            WriteOp::SetPosition { entry_id, position } => {
                let Some(entry) = self.entries.get(&entry_id) else {
                    return Err(StoreError::MissingRow);
                };
                let old = entry.position;
                self.by_position.remove(&old);
                self.place(position, &entry_id)?;
                if let Some(entry) = self.entries.get_mut(&entry_id) {
                    entry.position = position;
                }
                Ok(())
            }
            WriteOp::Shift { range, direction } => self.apply_shift(range, direction),
            WriteOp::Delete { entry_id } => {
                let Some(entry) = self.entries.remove(&entry_id) else {
                    return Err(StoreError::MissingRow);
                };
                self.by_subject.remove(&entry.subject_id);
                self.by_position.remove(&entry.position);
                Ok(())
            }
            WriteOp::PutList(list) => {
                match self.lists.iter_mut().find(|l| l.id == list.id) {
                    Some(slot) => *slot = list,
                    None => self.lists.push(list),
                }
                Ok(())
            }
            WriteOp::DeleteList { list_id } => {
                let before = self.lists.len();
                self.lists.retain(|l| l.id != list_id);
                if self.lists.len() == before {
                    return Err(StoreError::MissingRow);
                }
                Ok(())
            }
        }
    }

    /// Shifts the whole band in one step: every band key is vacated
    /// before any is re-placed, so entries within the band never collide
    /// with each other no matter the direction. A collision can only
    /// come from a slot outside the band that is still occupied.
    fn apply_shift(
        &mut self,
        range: PositionRange,
        direction: ShiftDirection,
    ) -> Result<(), StoreError> {
        let delta = direction.delta();
        let band: Vec<(i64, String)> = self
            .by_position
            .range(range.low..)
            .take_while(|(pos, _)| range.contains(**pos))
            .map(|(pos, id)| (*pos, id.clone()))
            .collect();

        for (pos, _) in &band {
            self.by_position.remove(pos);
        }
        for (pos, id) in band {
            let shifted = pos + delta;
            self.place(shifted, &id)?;
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.position = shifted;
            }
        }
        Ok(())
    }
}

/// The default, process-local store backend.
///
/// Shared-nothing in practice: each shard task owns its own instance, so
/// the mutex is uncontended and exists only to satisfy `&self` trait
/// methods. It is never held across an await point.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: Mutex<HashMap<String, Partition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Partition>>, StoreError> {
        self.partitions
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn count(&self, owner_id: &str) -> Result<usize, StoreError> {
        let partitions = self.lock()?;
        Ok(partitions.get(owner_id).map_or(0, |p| p.entries.len()))
    }

    async fn find_by_subject(
        &self,
        owner_id: &str,
        subject_id: &str,
    ) -> Result<Option<RankedEntry>, StoreError> {
        let partitions = self.lock()?;
        Ok(partitions.get(owner_id).and_then(|p| {
            p.by_subject
                .get(subject_id)
                .and_then(|id| p.entries.get(id))
                .cloned()
        }))
    }

    async fn find_by_id(
        &self,
        owner_id: &str,
        entry_id: &str,
    ) -> Result<Option<RankedEntry>, StoreError> {
        let partitions = self.lock()?;
        Ok(partitions
            .get(owner_id)
            .and_then(|p| p.entries.get(entry_id))
            .cloned())
    }

    async fn entries(&self, owner_id: &str) -> Result<Vec<RankedEntry>, StoreError> {
        let partitions = self.lock()?;
        Ok(partitions.get(owner_id).map_or_else(Vec::new, |p| {
            p.by_position
                .values()
                .filter_map(|id| p.entries.get(id))
                .cloned()
                .collect()
        }))
    }

    async fn find_list(
        &self,
        owner_id: &str,
        list_id: &str,
    ) -> Result<Option<WatchList>, StoreError> {
        let partitions = self.lock()?;
        Ok(partitions
            .get(owner_id)
            .and_then(|p| p.lists.iter().find(|l| l.id == list_id))
            .cloned())
    }

    async fn lists(&self, owner_id: &str) -> Result<Vec<WatchList>, StoreError> {
        let partitions = self.lock()?;
        Ok(partitions.get(owner_id).map_or_else(Vec::new, |p| p.lists.clone()))
    }

    async fn apply(&self, owner_id: &str, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut partitions = self.lock()?;
        let mut scratch = partitions.get(owner_id).cloned().unwrap_or_default();

        for op in ops {
            scratch.apply_op(op)?;
        }

        // committed positions must be non-negative; a leftover sentinel
        // means the batch was malformed (evict without land)
        if let Some((&min, _)) = scratch.by_position.iter().next() {
            if min < 0 {
                return Err(StoreError::SentinelVisible);
            }
        }

        if scratch.is_empty() {
            partitions.remove(owner_id);
        } else {
            partitions.insert(owner_id.to_owned(), scratch);
        }
        Ok(())
    }
}
