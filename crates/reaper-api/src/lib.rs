//! reaper-api — HTTP trigger for idlereaper.
//!
//! Each request to the trigger route runs one full sweep and answers
//! with the per-instance results. The request body is ignored.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET, POST | `/` | Run a sweep, return `{instance_name: outcome}` |
//! | GET | `/healthz` | Liveness, never sweeps |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use reaper_sweep::Reaper;

/// Shared state for trigger handlers.
#[derive(Clone)]
pub struct ApiState {
    pub reaper: Arc<Reaper>,
}

/// Build the trigger router.
pub fn build_router(reaper: Arc<Reaper>) -> Router {
    let state = ApiState { reaper };

    Router::new()
        .route("/", get(handlers::sweep).post(handlers::sweep))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
