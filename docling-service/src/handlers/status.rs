use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::Json;
use docling_store::StoreError;
use serde_json::{json, Value};

use crate::{error::ApiError, state::AppState};

/// GET /status/{document_id}
/// `completed` with the Markdown once an artifact exists, `processing`
/// otherwise. Unknown, failed and malformed ids also report `processing`,
/// since none of them can have an artifact.
pub async fn status(
    Extension(state): Extension<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.artifacts.read(&document_id).await {
        Ok(markdown) => Ok(Json(json!({
            "document_id": document_id,
            "status": "completed",
            "markdown_content": markdown,
        }))),
        Err(e) if e.is_not_found() || matches!(e, StoreError::InvalidKey(_)) => {
            Ok(Json(json!({
                "document_id": document_id,
                "status": "processing",
            })))
        }
        Err(e) => Err(e.into()),
    }
}
