//! Lab endpoints
//!
//! Every endpoint accepts a JSON body and runs the computation on the blocking
//! pool. The JSON endpoints answer HTTP 200 with an envelope, including for
//! invalid input. Export answers 400 with the failure envelope instead, so a
//! download link never saves an error as `result_lr1.txt`. `/lab1/...` paths
//! are the ones the lab UI posts to; `/api/v1/...` are aliases.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use prng_core::service::{parse_json, ExportReport};
use prng_core::{Envelope, PrngError, PrngService};
use serde::Serialize;
use serde_json::Value;

use super::AppState;

/// Build the lab routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/lab1/generate/", post(generate_handler))
        .route("/api/v1/generate", post(generate_handler))
        .route("/lab1/period/", post(period_handler))
        .route("/api/v1/period", post(period_handler))
        .route("/lab1/cesaro/", post(cesaro_handler))
        .route("/api/v1/cesaro", post(cesaro_handler))
        .route("/lab1/randomness/", post(randomness_handler))
        .route("/api/v1/randomness", post(randomness_handler))
        .route("/lab1/export/", post(export_handler))
        .route("/api/v1/export", post(export_handler))
}

/// Decodes `body` and runs `operation` on the blocking pool.
async fn run_blocking<T, F>(
    service: Arc<PrngService>,
    name: &'static str,
    body: Bytes,
    operation: F,
) -> Result<T, PrngError>
where
    T: Send + 'static,
    F: FnOnce(&PrngService, &Value) -> Result<T, PrngError> + Send + 'static,
{
    let value = parse_json(&body)?;
    tokio::task::spawn_blocking(move || operation(&service, &value))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(operation = name, error = %e, "computation task failed");
            Err(PrngError::Internal(format!("computation task failed: {e}")))
        })
}

/// Runs an envelope-returning façade method and logs the outcome.
async fn dispatch<T, F>(
    state: AppState,
    name: &'static str,
    body: Bytes,
    operation: F,
) -> Json<Envelope<T>>
where
    T: Serialize + Send + 'static,
    F: FnOnce(&PrngService, &Value) -> Envelope<T> + Send + 'static,
{
    let envelope = run_blocking(state.service, name, body, move |service, value| {
        Ok(operation(service, value))
    })
    .await
    .unwrap_or_else(|e| Envelope::failure(e.to_string()));

    tracing::debug!(
        operation = name,
        success = envelope.is_success(),
        "lab request handled"
    );
    Json(envelope)
}

/// POST /lab1/generate/ - Sequence and statistics
async fn generate_handler(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    dispatch(state, "generate", body, |service, value| service.generate(value)).await
}

/// POST /lab1/period/ - Period search
async fn period_handler(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    dispatch(state, "period", body, |service, value| service.period(value)).await
}

/// POST /lab1/cesaro/ - π estimation, LCG against the reference source
async fn cesaro_handler(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    dispatch(state, "cesaro", body, |service, value| service.cesaro(value)).await
}

/// POST /lab1/randomness/ - Frequency and runs tests
async fn randomness_handler(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    dispatch(state, "randomness", body, |service, value| {
        service.randomness(value)
    })
    .await
}

/// POST /lab1/export/ - Sequence as a text attachment
///
/// Invalid input is answered with 400 and the JSON failure envelope.
async fn export_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let result = run_blocking(state.service, "export", body, |service, value| {
        service.export(value)
    })
    .await;

    match result {
        Ok(report) => attachment(report),
        Err(e) => {
            tracing::debug!(operation = "export", error = %e, "lab request rejected");
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(Envelope::<()>::failure(e.to_string()))).into_response()
        }
    }
}

fn attachment(report: ExportReport) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", report.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.content,
    )
        .into_response()
}
