//! Request identity.
//!
//! JWT verification happens in the upstream authentication proxy; by
//! the time a request reaches this service the proxy has replaced the
//! token with an `x-user-id` header, which is taken on trust. Every
//! `/api` route runs behind this middleware.

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Name of the header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user for the current request.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

/// Rejects requests without a usable `x-user-id` header before they
/// reach any handler, and exposes the id to handlers as an extension.
pub async fn require_identity(mut request: Request<Body>, next: Next) -> Response {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned);

    match user_id {
        Some(id) => {
            request.extensions_mut().insert(Identity(id));
            next.run(request).await
        }
        None => ApiError::Unauthorized.into_response(),
    }
}
