use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::Json;
use serde_json::{json, Value};

use crate::handlers::utils::parse_positive_usize;
use crate::{error::ApiError, state::AppState};

/// GET /jobs
/// List job runs, most recent first, with optional `documentId` filter and pagination.
pub async fn list_runs(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let page = parse_positive_usize(params.get("page"), 1, "page")?;
    let per_page = parse_positive_usize(params.get("perPage"), 20, "perPage")?;
    let offset = (page - 1) * per_page;
    let document_filter = params.get("documentId").map(|s| s.as_str());

    let total = state.job_queue.count_runs(document_filter).await;
    let runs = state
        .job_queue
        .list_runs(document_filter, per_page, offset)
        .await;

    let items: Vec<Value> = runs
        .into_iter()
        .map(|run| {
            json!({
                "id": run.id,
                "jobName": run.job_name,
                "documentId": run.key,
                "status": run.status.to_string(),
                "queuedAt": run.queued_at.to_rfc3339(),
                "startedAt": run.started_at.map(|dt| dt.to_rfc3339()),
                "finishedAt": run.finished_at.map(|dt| dt.to_rfc3339()),
                "errorMessage": run.error_message,
            })
        })
        .collect();

    Ok(Json(json!({
        "items": items,
        "pagination": {
            "page": page,
            "perPage": per_page,
            "total": total,
        }
    })))
}
