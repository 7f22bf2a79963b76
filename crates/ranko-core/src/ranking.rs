//! Ranking operations: the dense per-owner ordering and its list sibling.
//!
//! Every owner's positional top list is kept dense — positions are exactly
//! `{0..n-1}` after every committed operation. The store enforces position
//! uniqueness eagerly, so relocating an entry runs in three phases inside
//! one transactional batch:
//!
//! 1. **evict**: park the moving entry at the sentinel, freeing its slot;
//! 2. **shift**: move the band between the old and new slots by one;
//! 3. **land**: set the entry's position to the target.
//!
//! All validation happens before any write is issued: a rejected operation
//! never creates partial state, and a store failure rolls the whole batch
//! back.

use tracing::debug;

use crate::model::{RankedEntry, WatchList};
use crate::store::{MembershipStore, PositionRange, ShiftDirection, StoreError, WriteOp, EVICTED};

/// Errors returned by ranking and list operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankError {
    /// The referenced row does not exist within the caller's owner scope.
    NotFound { what: &'static str },
    /// The subject already appears in the owner's ranking.
    DuplicateMembership,
    /// The requested position is outside the valid range.
    InvalidPosition { requested: i64, count: usize },
    /// The store rejected or could not complete the transaction. Nothing
    /// was written; the whole operation is safe to retry.
    Store(StoreError),
}

impl std::fmt::Display for RankError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankError::NotFound { what } => write!(f, "{what} not found"),
            RankError::DuplicateMembership => {
                write!(f, "subject is already ranked for this owner")
            }
            RankError::InvalidPosition { requested, count } => {
                write!(f, "position {requested} out of range for {count} entries")
            }
            RankError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for RankError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RankError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for RankError {
    fn from(e: StoreError) -> Self {
        RankError::Store(e)
    }
}

/// Executes ranking and list operations against one store.
///
/// Holds no state of its own — the store partition is the state. Each
/// shard task owns one `Ranking` and drives it strictly serially, which
/// is what makes the read-validate-write sequence of each operation safe
/// without locks.
pub struct Ranking {
    store: Box<dyn MembershipStore>,
}

impl Ranking {
    pub fn new(store: Box<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// The owner's ranking in position order.
    pub async fn get(&self, owner_id: &str) -> Result<Vec<RankedEntry>, RankError> {
        Ok(self.store.entries(owner_id).await?)
    }

    /// Adds a subject to the owner's ranking.
    ///
    /// The new entry is appended at the tail (position = current count).
    /// When `requested` names an earlier slot, the entry is relocated via
    /// the standard evict/shift/land phases inside the same batch, so a
    /// placed add is exactly an append followed by a move — with one
    /// commit. A requested position must lie in `[0, count]`; `count`
    /// means "stay at the tail".
    pub async fn add(
        &self,
        owner_id: &str,
        subject_id: &str,
        requested: Option<i64>,
    ) -> Result<RankedEntry, RankError> {
        if self
            .store
            .find_by_subject(owner_id, subject_id)
            .await?
            .is_some()
        {
            debug!(owner_id, subject_id, "add rejected: duplicate subject");
            return Err(RankError::DuplicateMembership);
        }

        let count = self.store.count(owner_id).await? as i64;
        if let Some(position) = requested {
            if !(0..=count).contains(&position) {
                debug!(owner_id, position, count, "add rejected: position out of range");
                return Err(RankError::InvalidPosition {
                    requested: position,
                    count: count as usize,
                });
            }
        }

        let entry = RankedEntry::new(owner_id, subject_id, count);
        let mut ops = vec![WriteOp::Insert(entry.clone())];
        let landed = match requested {
            Some(position) if position < count => {
                ops.extend(relocation_ops(&entry.id, count, position));
                position
            }
            _ => count,
        };
        self.store.apply(owner_id, ops).await?;

        Ok(RankedEntry {
            position: landed,
            ..entry
        })
    }

    /// Moves an entry to `new_position`, shifting the band between its
    /// old and new slots by one step.
    ///
    /// Moving an entry onto its current position is a no-op: the entry is
    /// returned unchanged and no write is issued.
    pub async fn move_entry(
        &self,
        owner_id: &str,
        entry_id: &str,
        new_position: i64,
    ) -> Result<RankedEntry, RankError> {
        let entry = self.require_entry(owner_id, entry_id).await?;
        let count = self.store.count(owner_id).await?;
        if !(0..count as i64).contains(&new_position) {
            debug!(owner_id, entry_id, new_position, "move rejected: position out of range");
            return Err(RankError::InvalidPosition {
                requested: new_position,
                count,
            });
        }
        if entry.position == new_position {
            return Ok(entry);
        }

        let ops = relocation_ops(&entry.id, entry.position, new_position);
        self.store.apply(owner_id, ops).await?;

        Ok(RankedEntry {
            position: new_position,
            ..entry
        })
    }

    /// Removes an entry and closes the gap it leaves: every entry ranked
    /// below it moves up one slot.
    pub async fn remove(&self, owner_id: &str, entry_id: &str) -> Result<(), RankError> {
        let entry = self.require_entry(owner_id, entry_id).await?;
        self.store.apply(owner_id, removal_ops(&entry)).await?;
        Ok(())
    }

    /// The owner's watch lists in creation order.
    pub async fn lists(&self, owner_id: &str) -> Result<Vec<WatchList>, RankError> {
        Ok(self.store.lists(owner_id).await?)
    }

    /// One watch list, scoped to the owner.
    pub async fn list(&self, owner_id: &str, list_id: &str) -> Result<WatchList, RankError> {
        self.require_list(owner_id, list_id).await
    }

    pub async fn create_list(
        &self,
        owner_id: &str,
        title: &str,
        description: Option<String>,
    ) -> Result<WatchList, RankError> {
        let list = WatchList::new(owner_id, title, description);
        self.store
            .apply(owner_id, vec![WriteOp::PutList(list.clone())])
            .await?;
        Ok(list)
    }

    /// Updates a list's title and/or description. Fields passed as `None`
    /// are left unchanged.
    pub async fn update_list(
        &self,
        owner_id: &str,
        list_id: &str,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<WatchList, RankError> {
        let mut list = self.require_list(owner_id, list_id).await?;
        if let Some(title) = title {
            list.title = title;
        }
        if let Some(description) = description {
            list.description = Some(description);
        }
        self.store
            .apply(owner_id, vec![WriteOp::PutList(list.clone())])
            .await?;
        Ok(list)
    }

    /// Deletes a list. The owner's positional ranking is untouched.
    pub async fn delete_list(&self, owner_id: &str, list_id: &str) -> Result<(), RankError> {
        let list = self.require_list(owner_id, list_id).await?;
        self.store
            .apply(owner_id, vec![WriteOp::DeleteList { list_id: list.id }])
            .await?;
        Ok(())
    }

    /// Adds a subject to a list's membership. Adding a subject that is
    /// already a member returns the list unchanged.
    pub async fn add_to_list(
        &self,
        owner_id: &str,
        list_id: &str,
        subject_id: &str,
    ) -> Result<WatchList, RankError> {
        let mut list = self.require_list(owner_id, list_id).await?;
        if !list.anime_ids.iter().any(|id| id == subject_id) {
            list.anime_ids.push(subject_id.to_owned());
            self.store
                .apply(owner_id, vec![WriteOp::PutList(list.clone())])
                .await?;
        }
        Ok(list)
    }

    /// Removes a subject from a list's membership. If the subject also
    /// sits in the owner's positional ranking, the ranked entry is
    /// deleted and its gap closed in the same batch — the ranking stays
    /// dense through the cascade. Removing a subject that is in neither
    /// place is a no-op.
    pub async fn remove_from_list(
        &self,
        owner_id: &str,
        list_id: &str,
        subject_id: &str,
    ) -> Result<WatchList, RankError> {
        let mut list = self.require_list(owner_id, list_id).await?;

        let mut ops = Vec::new();
        if let Some(idx) = list.anime_ids.iter().position(|id| id == subject_id) {
            list.anime_ids.remove(idx);
            ops.push(WriteOp::PutList(list.clone()));
        }
        if let Some(entry) = self.store.find_by_subject(owner_id, subject_id).await? {
            ops.extend(removal_ops(&entry));
        }
        if !ops.is_empty() {
            self.store.apply(owner_id, ops).await?;
        }
        Ok(list)
    }

    /// Flags a list as a "top" list. One-way: the flag is never cleared.
    pub async fn mark_top(&self, owner_id: &str, list_id: &str) -> Result<WatchList, RankError> {
        let mut list = self.require_list(owner_id, list_id).await?;
        if !list.is_top {
            list.is_top = true;
            self.store
                .apply(owner_id, vec![WriteOp::PutList(list.clone())])
                .await?;
        }
        Ok(list)
    }

    /// Replaces a list's ordered id sequence wholesale. The sequence is
    /// taken as given: no deduplication, no membership cross-check.
    pub async fn replace_order(
        &self,
        owner_id: &str,
        list_id: &str,
        ids: Vec<String>,
    ) -> Result<WatchList, RankError> {
        let mut list = self.require_list(owner_id, list_id).await?;
        list.top_anime_ids = ids;
        self.store
            .apply(owner_id, vec![WriteOp::PutList(list.clone())])
            .await?;
        Ok(list)
    }

    async fn require_entry(
        &self,
        owner_id: &str,
        entry_id: &str,
    ) -> Result<RankedEntry, RankError> {
        self.store
            .find_by_id(owner_id, entry_id)
            .await?
            .ok_or(RankError::NotFound { what: "entry" })
    }

    async fn require_list(&self, owner_id: &str, list_id: &str) -> Result<WatchList, RankError> {
        self.store
            .find_list(owner_id, list_id)
            .await?
            .ok_or(RankError::NotFound { what: "list" })
    }
}

/// The evict/shift/land batch relocating `entry_id` from `old` to `new`.
///
/// Moving toward the tail (`old < new`) pulls the band `(old, new]` down
/// one slot; moving toward the head (`old > new`) pushes `[new, old)` up
/// one. Callers guarantee `old != new`.
fn relocation_ops(entry_id: &str, old: i64, new: i64) -> Vec<WriteOp> {
    let (range, direction) = if old < new {
        (
            PositionRange::between(old + 1, new),
            ShiftDirection::Decrement,
        )
    } else {
        (
            PositionRange::between(new, old - 1),
            ShiftDirection::Increment,
        )
    };
    vec![
        WriteOp::SetPosition {
            entry_id: entry_id.to_owned(),
            position: EVICTED,
        },
        WriteOp::Shift { range, direction },
        WriteOp::SetPosition {
            entry_id: entry_id.to_owned(),
            position: new,
        },
    ]
}

/// The delete-and-close-gap batch for removing `entry`. Everything ranked
/// below the removed slot decrements; no sentinel phase is needed since
/// nothing is re-landed.
fn removal_ops(entry: &RankedEntry) -> Vec<WriteOp> {
    vec![
        WriteOp::Delete {
            entry_id: entry.id.clone(),
        },
        WriteOp::Shift {
            range: PositionRange::above(entry.position + 1),
            direction: ShiftDirection::Decrement,
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::store::memory::MemoryStore;

    fn ranking() -> Ranking {
        Ranking::new(Box::new(MemoryStore::new()))
    }

    /// Adds each subject at the tail, returning the created entries.
    async fn seed(r: &Ranking, owner: &str, subjects: &[&str]) -> Vec<RankedEntry> {
        let mut entries = Vec::new();
        for subject in subjects {
            entries.push(r.add(owner, subject, None).await.unwrap());
        }
        entries
    }

    /// Subjects in position order.
    async fn order(r: &Ranking, owner: &str) -> Vec<String> {
        r.get(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.subject_id)
            .collect()
    }

    /// Asserts positions are exactly {0..n-1} in returned order.
    async fn assert_dense(r: &Ranking, owner: &str) {
        let entries = r.get(owner).await.unwrap();
        let positions: Vec<i64> = entries.iter().map(|e| e.position).collect();
        let expected: Vec<i64> = (0..entries.len() as i64).collect();
        assert_eq!(positions, expected, "positions must be dense from 0");
    }

    /// Store wrapper that counts `apply` calls, for asserting that no-op
    /// operations issue no writes.
    struct CountingStore {
        inner: MemoryStore,
        applies: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MembershipStore for CountingStore {
        async fn count(&self, owner_id: &str) -> Result<usize, StoreError> {
            self.inner.count(owner_id).await
        }
        async fn find_by_subject(
            &self,
            owner_id: &str,
            subject_id: &str,
        ) -> Result<Option<RankedEntry>, StoreError> {
            self.inner.find_by_subject(owner_id, subject_id).await
        }
        async fn find_by_id(
            &self,
            owner_id: &str,
            entry_id: &str,
        ) -> Result<Option<RankedEntry>, StoreError> {
            self.inner.find_by_id(owner_id, entry_id).await
        }
        async fn entries(&self, owner_id: &str) -> Result<Vec<RankedEntry>, StoreError> {
            self.inner.entries(owner_id).await
        }
        async fn find_list(
            &self,
            owner_id: &str,
            list_id: &str,
        ) -> Result<Option<WatchList>, StoreError> {
            self.inner.find_list(owner_id, list_id).await
        }
        async fn lists(&self, owner_id: &str) -> Result<Vec<WatchList>, StoreError> {
            self.inner.lists(owner_id).await
        }
        async fn apply(&self, owner_id: &str, ops: Vec<WriteOp>) -> Result<(), StoreError> {
            self.applies.fetch_add(1, Ordering::SeqCst);
            self.inner.apply(owner_id, ops).await
        }
    }

    // --- add ---

    #[tokio::test]
    async fn add_appends_at_tail() {
        let r = ranking();
        let first = r.add("u1", "a1", None).await.unwrap();
        let second = r.add("u1", "a2", None).await.unwrap();

        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);
        assert_eq!(order(&r, "u1").await, vec!["a1", "a2"]);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn add_rejects_duplicate_subject() {
        let r = ranking();
        seed(&r, "u1", &["a1", "a2"]).await;

        let err = r.add("u1", "a1", None).await.unwrap_err();
        assert_eq!(err, RankError::DuplicateMembership);
        // store unchanged
        assert_eq!(order(&r, "u1").await, vec!["a1", "a2"]);
    }

    #[tokio::test]
    async fn add_at_requested_position_relocates_in_one_commit() {
        let r = ranking();
        seed(&r, "u1", &["a", "b", "c"]).await;

        let placed = r.add("u1", "d", Some(1)).await.unwrap();
        assert_eq!(placed.position, 1);
        assert_eq!(order(&r, "u1").await, vec!["a", "d", "b", "c"]);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn add_at_head_position() {
        let r = ranking();
        seed(&r, "u1", &["a", "b"]).await;

        let placed = r.add("u1", "c", Some(0)).await.unwrap();
        assert_eq!(placed.position, 0);
        assert_eq!(order(&r, "u1").await, vec!["c", "a", "b"]);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn add_with_tail_position_is_plain_append() {
        let r = ranking();
        seed(&r, "u1", &["a", "b"]).await;

        // requesting position == count keeps the entry at the tail
        let placed = r.add("u1", "c", Some(2)).await.unwrap();
        assert_eq!(placed.position, 2);
        assert_eq!(order(&r, "u1").await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn add_into_empty_ranking_at_zero() {
        let r = ranking();
        let placed = r.add("u1", "a", Some(0)).await.unwrap();
        assert_eq!(placed.position, 0);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn add_rejects_out_of_range_request() {
        let r = ranking();
        seed(&r, "u1", &["a", "b"]).await;

        let err = r.add("u1", "c", Some(3)).await.unwrap_err();
        assert_eq!(
            err,
            RankError::InvalidPosition {
                requested: 3,
                count: 2
            }
        );
        let err = r.add("u1", "c", Some(-1)).await.unwrap_err();
        assert!(matches!(err, RankError::InvalidPosition { .. }));
        // nothing was written
        assert_eq!(order(&r, "u1").await, vec!["a", "b"]);
    }

    // --- move ---

    #[tokio::test]
    async fn move_toward_head() {
        let r = ranking();
        let entries = seed(&r, "u1", &["A", "B", "C", "D"]).await;

        // C from 2 to 0: A and B shift down one
        let moved = r.move_entry("u1", &entries[2].id, 0).await.unwrap();
        assert_eq!(moved.position, 0);
        assert_eq!(order(&r, "u1").await, vec!["C", "A", "B", "D"]);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn move_toward_tail() {
        let r = ranking();
        let entries = seed(&r, "u1", &["A", "B", "C", "D"]).await;

        // A from 0 to 3: B, C, D shift up one
        let moved = r.move_entry("u1", &entries[0].id, 3).await.unwrap();
        assert_eq!(moved.position, 3);
        assert_eq!(order(&r, "u1").await, vec!["B", "C", "D", "A"]);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn move_adjacent_swap() {
        let r = ranking();
        let entries = seed(&r, "u1", &["A", "B", "C"]).await;

        r.move_entry("u1", &entries[1].id, 2).await.unwrap();
        assert_eq!(order(&r, "u1").await, vec!["A", "C", "B"]);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn move_to_current_position_writes_nothing() {
        let applies = Arc::new(AtomicUsize::new(0));
        let r = Ranking::new(Box::new(CountingStore {
            inner: MemoryStore::new(),
            applies: applies.clone(),
        }));
        let entries = seed(&r, "u1", &["A", "B"]).await;
        let writes_after_seed = applies.load(Ordering::SeqCst);

        let moved = r.move_entry("u1", &entries[1].id, 1).await.unwrap();
        assert_eq!(moved, entries[1]);
        assert_eq!(
            applies.load(Ordering::SeqCst),
            writes_after_seed,
            "no-op move must not write"
        );
    }

    #[tokio::test]
    async fn move_rejects_position_at_count() {
        let r = ranking();
        let entries = seed(&r, "u1", &["A", "B", "C"]).await;

        let err = r.move_entry("u1", &entries[0].id, 3).await.unwrap_err();
        assert_eq!(
            err,
            RankError::InvalidPosition {
                requested: 3,
                count: 3
            }
        );
        assert_eq!(order(&r, "u1").await, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn move_rejects_negative_position() {
        let r = ranking();
        let entries = seed(&r, "u1", &["A", "B"]).await;

        let err = r.move_entry("u1", &entries[0].id, -1).await.unwrap_err();
        assert!(matches!(err, RankError::InvalidPosition { .. }));
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn move_unknown_entry_not_found() {
        let r = ranking();
        seed(&r, "u1", &["A"]).await;

        let err = r.move_entry("u1", "missing", 0).await.unwrap_err();
        assert_eq!(err, RankError::NotFound { what: "entry" });
    }

    #[tokio::test]
    async fn move_cannot_reach_another_owners_entry() {
        let r = ranking();
        let entries = seed(&r, "u1", &["A", "B"]).await;
        seed(&r, "u2", &["A"]).await;

        // u2 holds a valid id belonging to u1; the ownership scope hides it
        let err = r.move_entry("u2", &entries[0].id, 0).await.unwrap_err();
        assert_eq!(err, RankError::NotFound { what: "entry" });
        assert_eq!(order(&r, "u1").await, vec!["A", "B"]);
    }

    // --- remove ---

    #[tokio::test]
    async fn remove_closes_gap() {
        let r = ranking();
        let entries = seed(&r, "u1", &["A", "B", "C"]).await;

        r.remove("u1", &entries[1].id).await.unwrap();
        assert_eq!(order(&r, "u1").await, vec!["A", "C"]);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn remove_head_shifts_everything_up() {
        let r = ranking();
        let entries = seed(&r, "u1", &["A", "B", "C"]).await;

        r.remove("u1", &entries[0].id).await.unwrap();
        assert_eq!(order(&r, "u1").await, vec!["B", "C"]);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn remove_tail_shifts_nothing() {
        let r = ranking();
        let entries = seed(&r, "u1", &["A", "B", "C"]).await;

        r.remove("u1", &entries[2].id).await.unwrap();
        assert_eq!(order(&r, "u1").await, vec!["A", "B"]);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn remove_unknown_entry_not_found() {
        let r = ranking();
        let err = r.remove("u1", "missing").await.unwrap_err();
        assert_eq!(err, RankError::NotFound { what: "entry" });
    }

    // --- invariants across sequences ---

    #[tokio::test]
    async fn density_holds_through_mixed_operations() {
        let r = ranking();
        let entries = seed(&r, "u1", &["a", "b", "c", "d", "e"]).await;
        assert_dense(&r, "u1").await;

        r.move_entry("u1", &entries[4].id, 0).await.unwrap();
        assert_dense(&r, "u1").await;

        r.remove("u1", &entries[2].id).await.unwrap();
        assert_dense(&r, "u1").await;

        r.add("u1", "f", Some(2)).await.unwrap();
        assert_dense(&r, "u1").await;

        r.move_entry("u1", &entries[0].id, 4).await.unwrap();
        assert_dense(&r, "u1").await;

        r.remove("u1", &entries[4].id).await.unwrap();
        assert_dense(&r, "u1").await;

        assert_eq!(r.get("u1").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn owners_do_not_interfere() {
        let r = ranking();
        let ours = seed(&r, "u1", &["a", "b", "c"]).await;
        let theirs = seed(&r, "u2", &["x", "y", "z"]).await;

        r.move_entry("u1", &ours[2].id, 0).await.unwrap();
        r.remove("u2", &theirs[0].id).await.unwrap();
        r.add("u1", "d", Some(1)).await.unwrap();

        assert_eq!(order(&r, "u1").await, vec!["c", "d", "a", "b"]);
        assert_eq!(order(&r, "u2").await, vec!["y", "z"]);
        assert_dense(&r, "u1").await;
        assert_dense(&r, "u2").await;
    }

    // --- lists ---

    #[tokio::test]
    async fn create_list_and_fetch() {
        let r = ranking();
        let list = r
            .create_list("u1", "favorites", Some("the good ones".into()))
            .await
            .unwrap();

        let fetched = r.list("u1", &list.id).await.unwrap();
        assert_eq!(fetched, list);
        assert_eq!(fetched.title, "favorites");
        assert!(!fetched.is_top);
    }

    #[tokio::test]
    async fn lists_come_back_in_creation_order() {
        let r = ranking();
        r.create_list("u1", "first", None).await.unwrap();
        r.create_list("u1", "second", None).await.unwrap();

        let titles: Vec<String> = r
            .lists("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.title)
            .collect();
        assert_eq!(titles, vec!["first".to_owned(), "second".to_owned()]);
    }

    #[tokio::test]
    async fn list_of_another_owner_not_found() {
        let r = ranking();
        let list = r.create_list("u1", "mine", None).await.unwrap();

        let err = r.list("u2", &list.id).await.unwrap_err();
        assert_eq!(err, RankError::NotFound { what: "list" });
    }

    #[tokio::test]
    async fn update_list_changes_only_given_fields() {
        let r = ranking();
        let list = r
            .create_list("u1", "old title", Some("keep me".into()))
            .await
            .unwrap();

        let updated = r
            .update_list("u1", &list.id, Some("new title".into()), None)
            .await
            .unwrap();
        assert_eq!(updated.title, "new title");
        assert_eq!(updated.description.as_deref(), Some("keep me"));
    }

    #[tokio::test]
    async fn update_unknown_list_not_found() {
        let r = ranking();
        let err = r
            .update_list("u1", "missing", Some("t".into()), None)
            .await
            .unwrap_err();
        assert_eq!(err, RankError::NotFound { what: "list" });
    }

    #[tokio::test]
    async fn delete_list_removes_only_the_list() {
        let r = ranking();
        seed(&r, "u1", &["a"]).await;
        let list = r.create_list("u1", "doomed", None).await.unwrap();

        r.delete_list("u1", &list.id).await.unwrap();
        assert!(r.lists("u1").await.unwrap().is_empty());
        // the positional ranking is untouched
        assert_eq!(order(&r, "u1").await, vec!["a"]);
    }

    #[tokio::test]
    async fn add_to_list_appends_member_once() {
        let r = ranking();
        let list = r.create_list("u1", "watching", None).await.unwrap();

        let after = r.add_to_list("u1", &list.id, "a1").await.unwrap();
        assert_eq!(after.anime_ids, vec!["a1"]);

        // adding again is a no-op, not an error
        let again = r.add_to_list("u1", &list.id, "a1").await.unwrap();
        assert_eq!(again.anime_ids, vec!["a1"]);
    }

    #[tokio::test]
    async fn remove_from_list_drops_member() {
        let r = ranking();
        let list = r.create_list("u1", "watching", None).await.unwrap();
        r.add_to_list("u1", &list.id, "a1").await.unwrap();
        r.add_to_list("u1", &list.id, "a2").await.unwrap();

        let after = r.remove_from_list("u1", &list.id, "a1").await.unwrap();
        assert_eq!(after.anime_ids, vec!["a2"]);
    }

    #[tokio::test]
    async fn remove_from_list_absent_member_is_noop() {
        let r = ranking();
        let list = r.create_list("u1", "watching", None).await.unwrap();

        let after = r.remove_from_list("u1", &list.id, "ghost").await.unwrap();
        assert!(after.anime_ids.is_empty());
    }

    #[tokio::test]
    async fn remove_from_list_cascades_into_ranking() {
        let r = ranking();
        seed(&r, "u1", &["a1", "a2", "a3"]).await;
        let list = r.create_list("u1", "watching", None).await.unwrap();
        r.add_to_list("u1", &list.id, "a2").await.unwrap();

        // a2 sits mid-ranking; removing it from the list must close the gap
        r.remove_from_list("u1", &list.id, "a2").await.unwrap();

        assert_eq!(order(&r, "u1").await, vec!["a1", "a3"]);
        assert_dense(&r, "u1").await;
        let after = r.list("u1", &list.id).await.unwrap();
        assert!(after.anime_ids.is_empty());
    }

    #[tokio::test]
    async fn remove_from_list_clears_ranking_even_without_membership() {
        let r = ranking();
        seed(&r, "u1", &["a1", "a2"]).await;
        let list = r.create_list("u1", "watching", None).await.unwrap();

        // a1 is ranked but was never added to this list's membership
        r.remove_from_list("u1", &list.id, "a1").await.unwrap();

        assert_eq!(order(&r, "u1").await, vec!["a2"]);
        assert_dense(&r, "u1").await;
    }

    #[tokio::test]
    async fn mark_top_is_one_way() {
        let r = ranking();
        let list = r.create_list("u1", "best", None).await.unwrap();

        let flagged = r.mark_top("u1", &list.id).await.unwrap();
        assert!(flagged.is_top);

        // a second call keeps it set
        let again = r.mark_top("u1", &list.id).await.unwrap();
        assert!(again.is_top);
    }

    #[tokio::test]
    async fn replace_order_overwrites_wholesale() {
        let r = ranking();
        let list = r.create_list("u1", "ordered", None).await.unwrap();
        r.replace_order("u1", &list.id, vec!["a".into(), "b".into()])
            .await
            .unwrap();

        let after = r
            .replace_order("u1", &list.id, vec!["c".into()])
            .await
            .unwrap();
        assert_eq!(after.top_anime_ids, vec!["c"]);
    }

    #[tokio::test]
    async fn replace_order_takes_the_sequence_as_given() {
        let r = ranking();
        let list = r.create_list("u1", "ordered", None).await.unwrap();

        // duplicates and unknown ids pass through untouched
        let after = r
            .replace_order("u1", &list.id, vec!["a".into(), "a".into(), "ghost".into()])
            .await
            .unwrap();
        assert_eq!(after.top_anime_ids, vec!["a", "a", "ghost"]);
    }

    #[tokio::test]
    async fn replace_order_unknown_list_not_found() {
        let r = ranking();
        let err = r
            .replace_order("u1", "missing", vec!["a".into()])
            .await
            .unwrap_err();
        assert_eq!(err, RankError::NotFound { what: "list" });
    }
}
