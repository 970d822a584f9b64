use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use axum::Json;
use docling_jobs::ConvertPayload;
use docling_store::{sanitize_filename, validate_document_id};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::handlers::utils::is_pdf_filename;
use crate::{error::ApiError, state::AppState};

const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    pub document_id: Option<String>,
}

/// POST /convert?document_id=<id>
/// Store the uploaded PDF and queue its conversion. Answers before the
/// conversion starts.
pub async fn convert(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ConvertParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let document_id = params
        .document_id
        .ok_or_else(|| ApiError::bad_request("missing document_id"))?;
    validate_document_id(&document_id)?;

    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (filename, bytes) = read_file_field(&mut multipart).await?;

    let filename = sanitize_filename(&filename)?;
    if !is_pdf_filename(&filename) {
        return Err(ApiError::bad_request("only PDF files are supported"));
    }

    let path = state
        .inputs
        .save_input(&document_id, &filename, &bytes)
        .await?;

    let request = ConvertPayload::new(document_id.as_str(), path.clone()).to_request()?;
    match state.job_queue.enqueue(request).await {
        Ok(queued) => {
            info!(
                document_id = %document_id,
                job_id = %queued.job_id,
                filename = %filename,
                size = bytes.len(),
                "conversion queued"
            );
        }
        Err(e) => {
            if let Err(remove_err) = state.inputs.remove_input(&path).await {
                warn!(
                    document_id = %document_id,
                    error = %remove_err,
                    "failed to remove orphaned input"
                );
            }
            return Err(e.into());
        }
    }

    Ok(Json(json!({
        "document_id": document_id,
        "status": "processing",
    })))
}

/// Read the first `file` part, skipping any other fields.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ApiError::bad_request("file part has no filename"))?;
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(ApiError::bad_request("missing file part"))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::bad_request(e.body_text())
    }
}
