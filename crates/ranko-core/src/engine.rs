//! The engine: coordinator for the sharded owner space.
//!
//! Routes every operation to the shard that owns its owner id, based on
//! a hash of that id. Each shard is an independent tokio task — no locks
//! on the hot path, and no two shards ever see the same owner.

use std::hash::{Hash, Hasher};

use crate::error::ShardError;
use crate::shard::{self, ShardHandle, ShardRequest, ShardResponse};
use crate::store::memory::MemoryStore;
use crate::store::MembershipStore;

/// Per-shard request buffer. 256 absorbs bursts without letting a
/// slow shard stall request handlers for long.
const SHARD_BUFFER: usize = 256;

/// The sharded engine. Owns handles to all shard tasks and routes
/// requests by owner id hash.
///
/// Cloning shares the underlying shard tasks: a handle is an mpsc
/// sender, so every clone routes to the same state.
#[derive(Debug, Clone)]
pub struct Engine {
    shards: Vec<ShardHandle>,
}

impl Engine {
    /// Creates an engine with `shard_count` shards, each backed by its
    /// own in-memory store. Shard tasks start running immediately.
    ///
    /// Panics if `shard_count` is zero.
    pub fn new(shard_count: usize) -> Self {
        let stores = (0..shard_count)
            .map(|_| Box::new(MemoryStore::new()) as Box<dyn MembershipStore>)
            .collect();
        Self::with_stores(stores)
    }

    /// Creates an engine with one shard per store given.
    ///
    /// Panics if `stores` is empty.
    pub fn with_stores(stores: Vec<Box<dyn MembershipStore>>) -> Self {
        assert!(!stores.is_empty(), "shard count must be at least 1");

        let shards = stores
            .into_iter()
            .enumerate()
            .map(|(i, store)| shard::spawn_shard(i as u16, SHARD_BUFFER, store))
            .collect();

        Self { shards }
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Routes a request to the shard that owns its owner id.
    pub async fn route(&self, request: ShardRequest) -> Result<ShardResponse, ShardError> {
        let idx = shard_index(request.owner_id(), self.shards.len());
        self.shards[idx].send(request).await
    }
}

/// Maps an owner id to a shard index.
///
/// ahash is the right tool here: routing is trusted internal logic, so
/// what matters is speed on short ids and a stable mapping within one
/// process, not DoS resistance.
fn shard_index(owner_id: &str, shard_count: usize) -> usize {
    let mut hasher = ahash::AHasher::default();
    owner_id.hash(&mut hasher);
    (hasher.finish() as usize) % shard_count
}
