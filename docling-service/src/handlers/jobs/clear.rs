use std::sync::Arc;

use axum::extract::Extension;
use axum::Json;
use serde_json::{json, Value};

use crate::{error::ApiError, state::AppState};

/// DELETE /jobs
/// Clear all job run history.
pub async fn clear_runs(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    state.job_queue.clear_runs().await;

    Ok(Json(json!({ "cleared": true })))
}
