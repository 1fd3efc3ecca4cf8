//! Trigger handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::error;

use crate::ApiState;

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

/// GET|POST /
pub async fn sweep(State(state): State<ApiState>) -> impl IntoResponse {
    match state.reaper.sweep().await {
        Ok(results) => Json(results).into_response(),
        Err(e) => {
            error!(error = %e, "sweep failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    "ok"
}
