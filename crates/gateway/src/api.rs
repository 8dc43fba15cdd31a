//! Assistance API handlers.
//!
//! Bodies are taken as raw bytes and run through the request validator, so
//! malformed JSON and bound violations share one 400 response shape.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use surveyassist_assist::{
    AssistError, FieldIssue, ValidationFailure, validate_evaluation, validate_introduction,
};

use crate::SharedState;

/// Request correlation header, echoed back or generated.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Names the evaluation path that produced the verdict.
pub const OUTCOME_HEADER: &str = "x-evaluation-outcome";

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/evaluate", post(evaluate_handler))
        .route("/api/introduce", post(introduce_handler))
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    issues: Option<Vec<FieldIssue>>,
}

/// Caller-supplied request id when it is short and printable, otherwise a
/// fresh one.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 64 && v.chars().all(|c| c.is_ascii_graphic()))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn validation_error(state: &SharedState, request_id: &str, failure: ValidationFailure) -> Response {
    warn!(
        request_id,
        issues = failure.issues.len(),
        first_path = failure.issues.first().map(|i| i.path.as_str()).unwrap_or(""),
        "Rejected invalid request"
    );
    let body = ErrorResponse {
        error: "Invalid request".into(),
        issues: state.expose_error_details.then_some(failure.issues),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// `POST /api/evaluate`: returns a verdict for every valid request.
async fn evaluate_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = request_id(&headers);

    let request = match validate_evaluation(&body) {
        Ok(request) => request,
        Err(failure) => {
            return with_request_id(validation_error(&state, &request_id, failure), &request_id);
        }
    };

    info!(
        request_id = %request_id,
        question_id = %request.question.id,
        question_type = %request.question.question_type,
        retry_count = request.retry_count,
        "Evaluate request"
    );
    let evaluation = state.evaluator.evaluate(&request).await;

    let response = (
        [(OUTCOME_HEADER, evaluation.outcome.as_str())],
        Json(evaluation.verdict),
    )
        .into_response();
    with_request_id(response, &request_id)
}

/// `POST /api/introduce`: streams the introduction as plain text.
///
/// Errors before the first token become a JSON error response. After that
/// an upstream failure aborts the body, and clients fall back to showing
/// the raw question.
async fn introduce_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = request_id(&headers);

    let request = match validate_introduction(&body, state.introducer.allowed_models()) {
        Ok(request) => request,
        Err(failure) => {
            return with_request_id(validation_error(&state, &request_id, failure), &request_id);
        }
    };

    info!(
        request_id = %request_id,
        history_len = request.messages.len(),
        is_first = request.current_question.is_first,
        is_last = request.current_question.is_last,
        "Introduce request"
    );

    let response = match state.introducer.stream_introduction(&request).await {
        Ok(tokens) => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(tokens),
        )
            .into_response(),
        Err(AssistError::Validation(failure)) => validation_error(&state, &request_id, failure),
        Err(AssistError::Provider(e)) => {
            error!(request_id = %request_id, error = %e, "Failed to start introduction stream");
            let message = if state.expose_error_details {
                format!("Failed to start introduction: {e}")
            } else {
                "Failed to start introduction".to_string()
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: message,
                    issues: None,
                }),
            )
                .into_response()
        }
    };
    with_request_id(response, &request_id)
}
