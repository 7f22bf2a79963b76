//! Shard: an independent partition of the owner space.
//!
//! Each shard runs as its own tokio task, owning a `Ranking` (and its
//! store) with no internal locking. Requests arrive over an mpsc channel
//! and responses go back on a per-request oneshot. Because the loop
//! drives each request to completion before taking the next, every
//! owner's operations are serialized — two concurrent moves on the same
//! ranking can never interleave their read-validate-write steps.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::ShardError;
use crate::model::{RankedEntry, WatchList};
use crate::ranking::{RankError, Ranking};
use crate::store::MembershipStore;

/// An operation sent to a shard. Every variant carries the owner id the
/// engine routed on.
#[derive(Debug)]
pub enum ShardRequest {
    /// The owner's ranking in position order.
    GetRanking {
        owner_id: String,
    },
    AddToRanking {
        owner_id: String,
        subject_id: String,
        /// Where to land the new entry; `None` appends at the tail.
        requested_position: Option<i64>,
    },
    MoveInRanking {
        owner_id: String,
        entry_id: String,
        new_position: i64,
    },
    RemoveFromRanking {
        owner_id: String,
        entry_id: String,
    },
    GetLists {
        owner_id: String,
    },
    GetList {
        owner_id: String,
        list_id: String,
    },
    CreateList {
        owner_id: String,
        title: String,
        description: Option<String>,
    },
    UpdateList {
        owner_id: String,
        list_id: String,
        title: Option<String>,
        description: Option<String>,
    },
    DeleteList {
        owner_id: String,
        list_id: String,
    },
    AddToList {
        owner_id: String,
        list_id: String,
        subject_id: String,
    },
    RemoveFromList {
        owner_id: String,
        list_id: String,
        subject_id: String,
    },
    MarkTop {
        owner_id: String,
        list_id: String,
    },
    /// Replaces the list's ordered id sequence wholesale.
    ReplaceOrder {
        owner_id: String,
        list_id: String,
        ids: Vec<String>,
    },
}

impl ShardRequest {
    /// The owner id this request operates on. The engine hashes it to
    /// pick a shard, which is what keeps all of one owner's operations
    /// on the same task.
    pub fn owner_id(&self) -> &str {
        match self {
            ShardRequest::GetRanking { owner_id }
            | ShardRequest::AddToRanking { owner_id, .. }
            | ShardRequest::MoveInRanking { owner_id, .. }
            | ShardRequest::RemoveFromRanking { owner_id, .. }
            | ShardRequest::GetLists { owner_id }
            | ShardRequest::GetList { owner_id, .. }
            | ShardRequest::CreateList { owner_id, .. }
            | ShardRequest::UpdateList { owner_id, .. }
            | ShardRequest::DeleteList { owner_id, .. }
            | ShardRequest::AddToList { owner_id, .. }
            | ShardRequest::RemoveFromList { owner_id, .. }
            | ShardRequest::MarkTop { owner_id, .. }
            | ShardRequest::ReplaceOrder { owner_id, .. } => owner_id,
        }
    }
}

/// The shard's response to a request.
#[derive(Debug)]
pub enum ShardResponse {
    /// A single ranked entry (add, move).
    Entry(RankedEntry),
    /// The full ranking in position order.
    Ranking(Vec<RankedEntry>),
    /// A single watch list.
    List(WatchList),
    /// All of the owner's watch lists.
    Lists(Vec<WatchList>),
    /// Simple acknowledgement (remove, delete).
    Ok,
    /// The operation was rejected or failed.
    Err(RankError),
}

/// A request paired with the oneshot its response goes back on.
#[derive(Debug)]
pub struct ShardMessage {
    pub request: ShardRequest,
    pub reply: oneshot::Sender<ShardResponse>,
}

/// Cloneable sender side of a shard's request channel.
///
/// Wraps the mpsc sender so callers don't need to manage oneshot
/// channels directly.
#[derive(Debug, Clone)]
pub struct ShardHandle {
    tx: mpsc::Sender<ShardMessage>,
}

impl ShardHandle {
    /// Sends a request and waits for the response.
    ///
    /// Returns `ShardError::Unavailable` if the shard task has stopped.
    pub async fn send(&self, request: ShardRequest) -> Result<ShardResponse, ShardError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let msg = ShardMessage {
            request,
            reply: reply_tx,
        };
        self.tx
            .send(msg)
            .await
            .map_err(|_| ShardError::Unavailable)?;
        reply_rx.await.map_err(|_| ShardError::Unavailable)
    }
}

/// Starts a shard task that owns `store`, returning the handle for
/// talking to it.
///
/// `buffer` caps how many requests may queue before senders wait.
pub fn spawn_shard(shard_id: u16, buffer: usize, store: Box<dyn MembershipStore>) -> ShardHandle {
    let (tx, rx) = mpsc::channel(buffer);
    tokio::spawn(run_shard(shard_id, rx, store));
    ShardHandle { tx }
}

/// Shard main loop: take one request, answer it, repeat until the
/// channel closes.
async fn run_shard(shard_id: u16, mut rx: mpsc::Receiver<ShardMessage>, store: Box<dyn MembershipStore>) {
    debug!(shard_id, "shard started");
    let ranking = Ranking::new(store);

    while let Some(ShardMessage { request, reply }) = rx.recv().await {
        let response = dispatch(&ranking, request).await;
        // a dropped receiver just means the caller gave up waiting
        let _ = reply.send(response);
    }

    debug!(shard_id, "shard stopped");
}

fn entry_result(result: Result<RankedEntry, RankError>) -> ShardResponse {
    match result {
        Ok(entry) => ShardResponse::Entry(entry),
        Err(e) => ShardResponse::Err(e),
    }
}

fn list_result(result: Result<WatchList, RankError>) -> ShardResponse {
    match result {
        Ok(list) => ShardResponse::List(list),
        Err(e) => ShardResponse::Err(e),
    }
}

fn ok_result(result: Result<(), RankError>) -> ShardResponse {
    match result {
        Ok(()) => ShardResponse::Ok,
        Err(e) => ShardResponse::Err(e),
    }
}

/// Routes a request to the matching ranking operation. Every read and
/// write on the shard funnels through this dispatch.
async fn dispatch(ranking: &Ranking, request: ShardRequest) -> ShardResponse {
    match request {
        ShardRequest::GetRanking { owner_id } => match ranking.get(&owner_id).await {
            Ok(entries) => ShardResponse::Ranking(entries),
            Err(e) => ShardResponse::Err(e),
        },
        ShardRequest::AddToRanking {
            owner_id,
            subject_id,
            requested_position,
        } => entry_result(ranking.add(&owner_id, &subject_id, requested_position).await),
        ShardRequest::MoveInRanking {
            owner_id,
            entry_id,
            new_position,
        } => entry_result(ranking.move_entry(&owner_id, &entry_id, new_position).await),
        ShardRequest::RemoveFromRanking { owner_id, entry_id } => {
            ok_result(ranking.remove(&owner_id, &entry_id).await)
        }
        ShardRequest::GetLists { owner_id } => match ranking.lists(&owner_id).await {
            Ok(lists) => ShardResponse::Lists(lists),
            Err(e) => ShardResponse::Err(e),
        },
        ShardRequest::GetList { owner_id, list_id } => {
            list_result(ranking.list(&owner_id, &list_id).await)
        }
        ShardRequest::CreateList {
            owner_id,
            title,
            description,
        } => list_result(ranking.create_list(&owner_id, &title, description).await),
        ShardRequest::UpdateList {
            owner_id,
            list_id,
            title,
            description,
        } => list_result(
            ranking
                .update_list(&owner_id, &list_id, title, description)
                .await,
        ),
        ShardRequest::DeleteList { owner_id, list_id } => {
            ok_result(ranking.delete_list(&owner_id, &list_id).await)
        }
        ShardRequest::AddToList {
            owner_id,
            list_id,
            subject_id,
        } => list_result(ranking.add_to_list(&owner_id, &list_id, &subject_id).await),
        ShardRequest::RemoveFromList {
            owner_id,
            list_id,
            subject_id,
        } => list_result(
            ranking
                .remove_from_list(&owner_id, &list_id, &subject_id)
                .await,
        ),
        ShardRequest::MarkTop { owner_id, list_id } => {
            list_result(ranking.mark_top(&owner_id, &list_id).await)
        }
        ShardRequest::ReplaceOrder {
            owner_id,
            list_id,
            ids,
        } => list_result(ranking.replace_order(&owner_id, &list_id, ids).await),
    }
}
