//! API route handlers - maps HTTP endpoints to dispatched operations.
//!
//! - `webhook`: the single command endpoint (POST /api/webhook)

pub mod webhook;

use axum::Router;

use crate::dispatch::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new().merge(webhook::routes(state))
}
