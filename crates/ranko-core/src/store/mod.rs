//! The membership store: the storage seam for ranked entries and lists.
//!
//! Reads are plain async methods. Writes are data: a [`WriteOp`] sequence
//! submitted through [`MembershipStore::apply`], which executes the whole
//! batch atomically — either every op lands or none do. Keeping the write
//! side as data lets a multi-step reposition (evict, shift, land) travel
//! as one transaction regardless of backend.

pub mod memory;

use async_trait::async_trait;

use crate::model::{RankedEntry, WatchList};

/// Sentinel position an entry holds between evict and land.
///
/// Out of the valid range by construction, so the shifted band never
/// collides with the moving entry. Never visible in committed state.
pub const EVICTED: i64 = -1;

/// Inclusive position range selecting the band of a batch shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRange {
    pub low: i64,
    /// Inclusive upper bound; `None` means unbounded above.
    pub high: Option<i64>,
}

impl PositionRange {
    /// The band `[low, high]`, both ends inclusive.
    pub fn between(low: i64, high: i64) -> Self {
        Self {
            low,
            high: Some(high),
        }
    }

    /// The band `[low, ..)`, unbounded above.
    pub fn above(low: i64) -> Self {
        Self { low, high: None }
    }

    pub fn contains(&self, position: i64) -> bool {
        position >= self.low && self.high.map_or(true, |h| position <= h)
    }
}

/// Direction of a batch shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Increment,
    Decrement,
}

impl ShiftDirection {
    pub fn delta(self) -> i64 {
        match self {
            ShiftDirection::Increment => 1,
            ShiftDirection::Decrement => -1,
        }
    }
}

/// One write in a transactional batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert a new ranked entry.
    Insert(RankedEntry),
    /// Set one entry's position (the evict and land phases of a move).
    SetPosition { entry_id: String, position: i64 },
    /// Add the direction's delta to every entry whose position falls in
    /// `range`. Applied as a single step: the whole band moves together
    /// and uniqueness is checked against the resulting state, not per row.
    Shift {
        range: PositionRange,
        direction: ShiftDirection,
    },
    /// Delete a ranked entry.
    Delete { entry_id: String },
    /// Insert or wholesale-replace a watch list.
    PutList(WatchList),
    /// Delete a watch list.
    DeleteList { list_id: String },
}

/// Errors surfaced by store implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A batch op would leave two entries sharing a position.
    PositionConflict { position: i64 },
    /// A batch op would give an owner two entries for one subject.
    SubjectConflict,
    /// A batch op referenced an entry or list the partition doesn't hold.
    MissingRow,
    /// A batch would commit an entry still parked at the sentinel.
    SentinelVisible,
    /// The backend is unreachable or refused the transaction.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::PositionConflict { position } => {
                write!(f, "position {position} already occupied")
            }
            StoreError::SubjectConflict => write!(f, "subject already present for owner"),
            StoreError::MissingRow => write!(f, "referenced row does not exist"),
            StoreError::SentinelVisible => {
                write!(f, "batch would commit an entry at the sentinel position")
            }
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Storage for ranked entries and watch lists, partitioned by owner.
///
/// Every method is scoped to one owner; an implementation must never let
/// one owner's operation observe or touch another owner's rows. `apply`
/// must be all-or-nothing: a failed batch leaves the partition exactly as
/// it was, with no entry parked at the sentinel and no partial shift.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Number of ranked entries for an owner.
    async fn count(&self, owner_id: &str) -> Result<usize, StoreError>;

    /// Looks up an entry by the subject it ranks.
    async fn find_by_subject(
        &self,
        owner_id: &str,
        subject_id: &str,
    ) -> Result<Option<RankedEntry>, StoreError>;

    /// Looks up an entry by id. Returns `None` for ids that exist under a
    /// different owner — ownership is part of the key.
    async fn find_by_id(
        &self,
        owner_id: &str,
        entry_id: &str,
    ) -> Result<Option<RankedEntry>, StoreError>;

    /// All entries for an owner in ascending position order.
    async fn entries(&self, owner_id: &str) -> Result<Vec<RankedEntry>, StoreError>;

    /// Looks up a watch list by id, scoped to the owner.
    async fn find_list(
        &self,
        owner_id: &str,
        list_id: &str,
    ) -> Result<Option<WatchList>, StoreError>;

    /// All of an owner's watch lists in creation order.
    async fn lists(&self, owner_id: &str) -> Result<Vec<WatchList>, StoreError>;

    /// Executes a write batch atomically against one owner's partition.
    async fn apply(&self, owner_id: &str, ops: Vec<WriteOp>) -> Result<(), StoreError>;
}
