//! HTTP route handlers and router configuration.
//!
//! Request and response bodies are camelCase JSON. Handlers translate
//! bodies into engine requests and let `ApiError` map domain failures
//! onto status codes; the only validation done here is what the engine
//! cannot see (blank titles).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use axum::{middleware, Extension, Json, Router};
use ranko_core::{RankedEntry, ShardRequest, WatchList};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::identity::{require_identity, Identity};
use crate::state::AppState;

/// Builds the full application router. `/health` is open; everything
/// under `/api` requires an identity.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/top-animes", get(get_ranking).post(add_top_anime))
        .route("/top-animes/:entry_id/position", put(move_top_anime))
        .route("/top-animes/:entry_id", delete(remove_top_anime))
        .route("/lists", get(get_lists).post(create_list))
        .route(
            "/lists/:list_id",
            get(get_list).put(update_list).delete(delete_list),
        )
        .route("/lists/:list_id/anime", post(add_list_anime))
        .route("/lists/:list_id/anime/:anime_id", delete(remove_list_anime))
        .route("/lists/:list_id/top", patch(mark_top))
        .route("/lists/:list_id/top-animes", put(replace_order))
        .layer(middleware::from_fn(require_identity));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// --- positional top list ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTopAnimeBody {
    pub anime_id: String,
    /// Where to land the new entry; omitted means the tail.
    pub position: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MovePositionBody {
    pub position: i64,
}

async fn get_ranking(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Result<Json<Vec<RankedEntry>>, ApiError> {
    let entries = state
        .ranking(ShardRequest::GetRanking { owner_id: owner })
        .await?;
    Ok(Json(entries))
}

async fn add_top_anime(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Json(body): Json<AddTopAnimeBody>,
) -> Result<(StatusCode, Json<RankedEntry>), ApiError> {
    let entry = state
        .entry(ShardRequest::AddToRanking {
            owner_id: owner,
            subject_id: body.anime_id,
            requested_position: body.position,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn move_top_anime(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(entry_id): Path<String>,
    Json(body): Json<MovePositionBody>,
) -> Result<Json<RankedEntry>, ApiError> {
    let entry = state
        .entry(ShardRequest::MoveInRanking {
            owner_id: owner,
            entry_id,
            new_position: body.position,
        })
        .await?;
    Ok(Json(entry))
}

async fn remove_top_anime(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .ack(ShardRequest::RemoveFromRanking {
            owner_id: owner,
            entry_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- watch lists ---

#[derive(Debug, Deserialize)]
pub struct CreateListBody {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListBody {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddListAnimeBody {
    pub anime_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOrderBody {
    pub anime_ids: Vec<String>,
}

fn require_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }
    Ok(())
}

async fn get_lists(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Result<Json<Vec<WatchList>>, ApiError> {
    let lists = state
        .lists(ShardRequest::GetLists { owner_id: owner })
        .await?;
    Ok(Json(lists))
}

async fn get_list(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(list_id): Path<String>,
) -> Result<Json<WatchList>, ApiError> {
    let list = state
        .list(ShardRequest::GetList {
            owner_id: owner,
            list_id,
        })
        .await?;
    Ok(Json(list))
}

async fn create_list(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Json(body): Json<CreateListBody>,
) -> Result<(StatusCode, Json<WatchList>), ApiError> {
    require_title(&body.title)?;
    let list = state
        .list(ShardRequest::CreateList {
            owner_id: owner,
            title: body.title,
            description: body.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(list)))
}

async fn update_list(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(list_id): Path<String>,
    Json(body): Json<UpdateListBody>,
) -> Result<Json<WatchList>, ApiError> {
    if let Some(ref title) = body.title {
        require_title(title)?;
    }
    let list = state
        .list(ShardRequest::UpdateList {
            owner_id: owner,
            list_id,
            title: body.title,
            description: body.description,
        })
        .await?;
    Ok(Json(list))
}

async fn delete_list(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(list_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .ack(ShardRequest::DeleteList {
            owner_id: owner,
            list_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_list_anime(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(list_id): Path<String>,
    Json(body): Json<AddListAnimeBody>,
) -> Result<Json<WatchList>, ApiError> {
    let list = state
        .list(ShardRequest::AddToList {
            owner_id: owner,
            list_id,
            subject_id: body.anime_id,
        })
        .await?;
    Ok(Json(list))
}

async fn remove_list_anime(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path((list_id, anime_id)): Path<(String, String)>,
) -> Result<Json<WatchList>, ApiError> {
    let list = state
        .list(ShardRequest::RemoveFromList {
            owner_id: owner,
            list_id,
            subject_id: anime_id,
        })
        .await?;
    Ok(Json(list))
}

async fn mark_top(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(list_id): Path<String>,
) -> Result<Json<WatchList>, ApiError> {
    let list = state
        .list(ShardRequest::MarkTop {
            owner_id: owner,
            list_id,
        })
        .await?;
    Ok(Json(list))
}

async fn replace_order(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(list_id): Path<String>,
    Json(body): Json<ReplaceOrderBody>,
) -> Result<Json<WatchList>, ApiError> {
    let list = state
        .list(ShardRequest::ReplaceOrder {
            owner_id: owner,
            list_id,
            ids: body.anime_ids,
        })
        .await?;
    Ok(Json(list))
}
