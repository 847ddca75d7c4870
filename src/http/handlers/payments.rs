use crate::domain::payment::ProcessPaymentRequest;
use crate::service::payment_service::invalid_argument;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use tokio_util::sync::CancellationToken;

// Cancelled only when the caller goes away and the handler future is dropped.
fn request_context() -> (CancellationToken, tokio_util::sync::DropGuard) {
    let ctx = CancellationToken::new();
    let guard = ctx.clone().drop_guard();
    (ctx, guard)
}

pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<ProcessPaymentRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "undecodable payment request");
            let (status, body) = invalid_argument("invalid request body", None);
            return (status, Json(body)).into_response();
        }
    };

    let (ctx, _cancel_on_drop) = request_context();
    match state.payment_service.process(&ctx, req).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> impl IntoResponse {
    lookup(&state, &reference).await
}

pub async fn get_payment_without_reference(State(state): State<AppState>) -> impl IntoResponse {
    lookup(&state, "").await
}

async fn lookup(state: &AppState, reference: &str) -> axum::response::Response {
    let (ctx, _cancel_on_drop) = request_context();
    match state.payment_service.get(&ctx, reference).await {
        Ok(record) => (axum::http::StatusCode::OK, Json(record)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}
