use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
struct BatchStatus {
    status: &'static str,
    count: usize,
    filenames: Vec<String>,
}

pub async fn batch_status(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<String>,
) -> impl IntoResponse {
    match state.batches.filenames(&batch_id) {
        Some(filenames) => axum::Json(BatchStatus {
            status: "complete",
            count: filenames.len(),
            filenames,
        })
        .into_response(),
        None => axum::Json(serde_json::json!({
            "status": "not_found",
            "message": "Batch not found or expired."
        }))
        .into_response(),
    }
}

pub async fn download_certificate(
    State(state): State<Arc<AppState>>,
    Path((batch_id, filename)): Path<(String, String)>,
) -> impl IntoResponse {
    if filename.contains("..") || filename.is_empty() {
        return axum::response::Redirect::to("/").into_response();
    }

    let content = match state.batches.artifact(&batch_id, &filename) {
        Some(c) => c,
        None => return axum::response::Redirect::to("/").into_response(),
    };

    let mime = mime_guess::from_path(&filename)
        .first_raw()
        .unwrap_or("application/octet-stream");

    axum::response::Response::builder()
        .header("Content-Type", mime)
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(axum::body::Body::from(content))
        .unwrap()
        .into_response()
}

pub async fn download_all(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<String>,
) -> impl IntoResponse {
    let zip_data = match state.batches.bundle(&batch_id) {
        Some(z) => z,
        None => return axum::response::Redirect::to("/").into_response(),
    };

    axum::response::Response::builder()
        .header("Content-Type", "application/zip")
        .header(
            "Content-Disposition",
            "attachment; filename=\"certificates.zip\"",
        )
        .body(axum::body::Body::from(zip_data))
        .unwrap()
        .into_response()
}
