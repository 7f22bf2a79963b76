//! Record types for the ranked membership core.
//!
//! Two shapes cover both ranking mechanisms: [`RankedEntry`] rows carry an
//! explicit per-owner position (the positional top list), while a
//! [`WatchList`] carries an id array whose order is the array order (the
//! ordered-id sibling). Identifiers are opaque strings assigned at creation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of a user's positional top list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    /// Opaque identifier, unique, assigned at creation.
    pub id: String,
    /// The user who owns this ranking. All position arithmetic is scoped
    /// per owner.
    pub owner_id: String,
    /// The ranked item (an anime id).
    pub subject_id: String,
    /// 0-based rank, unique and dense within an owner. `-1` appears only
    /// transiently inside a store transaction, never in committed state.
    pub position: i64,
}

impl RankedEntry {
    /// Creates an entry with a fresh id at the given position.
    pub fn new(
        owner_id: impl Into<String>,
        subject_id: impl Into<String>,
        position: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            subject_id: subject_id.into(),
            position,
        }
    }
}

/// A user's watch list.
///
/// `anime_ids` is plain membership; `top_anime_ids` is an ordered id
/// sequence replaced wholesale on update, with no per-element invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchList {
    /// Opaque identifier, unique, assigned at creation.
    pub id: String,
    /// The owning user.
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Marks the list as a "top" list. Set once, never cleared.
    pub is_top: bool,
    /// Unordered membership.
    pub anime_ids: Vec<String>,
    /// Ordered id sequence; order is the array order.
    pub top_anime_ids: Vec<String>,
}

impl WatchList {
    /// Creates an empty list with a fresh id.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title: title.into(),
            description,
            is_top: false,
            anime_ids: Vec::new(),
            top_anime_ids: Vec::new(),
        }
    }
}
