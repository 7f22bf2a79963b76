//! ranko-core: the ranking engine.
//!
//! Owns the per-owner dense rankings, watch lists, and the storage
//! seam beneath them. Designed around a shared-nothing architecture
//! where each shard independently manages a partition of owners, so
//! every owner's operations are serialized without locks.

pub mod engine;
pub mod error;
pub mod model;
pub mod ranking;
pub mod shard;
pub mod store;

pub use engine::Engine;
pub use error::ShardError;
pub use model::{RankedEntry, WatchList};
pub use ranking::{RankError, Ranking};
pub use shard::{ShardHandle, ShardRequest, ShardResponse};
pub use store::memory::MemoryStore;
pub use store::{MembershipStore, PositionRange, ShiftDirection, StoreError, WriteOp, EVICTED};
