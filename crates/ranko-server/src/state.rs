//! Shared application state and typed engine access.

use ranko_core::{Engine, RankedEntry, ShardRequest, ShardResponse, WatchList};
use tracing::error;

use crate::error::ApiError;

/// State shared across all request handlers.
///
/// Cloning is cheap: the engine is a bundle of channel senders.
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    async fn send(&self, request: ShardRequest) -> Result<ShardResponse, ApiError> {
        match self.engine.route(request).await? {
            ShardResponse::Err(e) => Err(e.into()),
            response => Ok(response),
        }
    }

    /// Routes a request expected to yield a single ranked entry.
    pub async fn entry(&self, request: ShardRequest) -> Result<RankedEntry, ApiError> {
        match self.send(request).await? {
            ShardResponse::Entry(entry) => Ok(entry),
            other => Err(unexpected(&other)),
        }
    }

    /// Routes a request expected to yield the full ranking.
    pub async fn ranking(&self, request: ShardRequest) -> Result<Vec<RankedEntry>, ApiError> {
        match self.send(request).await? {
            ShardResponse::Ranking(entries) => Ok(entries),
            other => Err(unexpected(&other)),
        }
    }

    /// Routes a request expected to yield a single list.
    pub async fn list(&self, request: ShardRequest) -> Result<WatchList, ApiError> {
        match self.send(request).await? {
            ShardResponse::List(list) => Ok(list),
            other => Err(unexpected(&other)),
        }
    }

    /// Routes a request expected to yield all of the owner's lists.
    pub async fn lists(&self, request: ShardRequest) -> Result<Vec<WatchList>, ApiError> {
        match self.send(request).await? {
            ShardResponse::Lists(lists) => Ok(lists),
            other => Err(unexpected(&other)),
        }
    }

    /// Routes a request expected to yield a bare acknowledgement.
    pub async fn ack(&self, request: ShardRequest) -> Result<(), ApiError> {
        match self.send(request).await? {
            ShardResponse::Ok => Ok(()),
            other => Err(unexpected(&other)),
        }
    }
}

// A mismatched response shape is a bug in the request/response pairing,
// not a client error. Log it and hide the details behind a 500.
fn unexpected(response: &ShardResponse) -> ApiError {
    error!(?response, "unexpected shard response shape");
    ApiError::internal("internal error")
}
