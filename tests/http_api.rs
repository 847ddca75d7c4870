use axum::body::Body;
use axum::http::{Request, StatusCode};
use payments_gateway::domain::payment::{PaymentRecord, ProcessPaymentRequest};
use payments_gateway::domain::status::Status;
use payments_gateway::gateways::mock::MockBank;
use payments_gateway::http::router::{router, serve};
use payments_gateway::repo::memory_store::InMemoryPaymentStore;
use payments_gateway::repo::payments_repo::{PaymentStore, StoreError};
use payments_gateway::service::payment_service::PaymentService;
use payments_gateway::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn app(bank: MockBank) -> axum::Router {
    router(AppState {
        payment_service: PaymentService::new(Arc::new(bank), Arc::new(InMemoryPaymentStore::new())),
    })
}

/// Delays every write so a shutdown can land while persistence is running.
struct SlowStore {
    inner: InMemoryPaymentStore,
    delay: Duration,
}

#[async_trait::async_trait]
impl PaymentStore for SlowStore {
    async fn add_payment_info(
        &self,
        ctx: &CancellationToken,
        ref_id: &str,
        request: &ProcessPaymentRequest,
        status: Status,
        reason: &str,
    ) -> Result<(), StoreError> {
        tokio::select! {
            _ = ctx.cancelled() => return Err(StoreError::Cancelled),
            _ = tokio::time::sleep(self.delay) => {}
        }
        self.inner
            .add_payment_info(ctx, ref_id, request, status, reason)
            .await
    }

    async fn get_payment_info(
        &self,
        ctx: &CancellationToken,
        ref_id: &str,
    ) -> Result<PaymentRecord, StoreError> {
        self.inner.get_payment_info(ctx, ref_id).await
    }
}

fn payment_body() -> Value {
    json!({
        "billing_details": {
            "name": "Bruce",
            "surname": "Wayne",
            "email": "iam@batman.com",
            "postcode": "G15 2DN"
        },
        "card_number": "378282246310005",
        "expiry": "23/4",
        "cvv": 342,
        "amount": 20.5,
        "currency": "GBP",
        "payment_type": "CARD",
        "card_type": "VISA"
    })
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn post_payment(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/payments")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_payment(reference: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/payments/{reference}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn process_then_get_round_trip() {
    let app = app(MockBank::approving());

    let (status, created) = send(&app, post_payment(&payment_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "APPROVED");
    assert_eq!(created["status_reason"], "approved and completed successfully");
    let reference = created["reference"].as_str().unwrap().to_string();

    let (status, record) = send(&app, get_payment(&reference)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["reference"], reference);
    assert_eq!(record["card_number"], "3782XXXXXXX0005");
    assert_eq!(record["amount"], json!(20.5));
    assert_eq!(record["payment_type"], "CARD");
    assert_eq!(record["billing_details"]["surname"], "Wayne");
}

#[tokio::test]
async fn rejected_card_returns_bad_request_with_reason() {
    let app = app(MockBank::rejecting_card("failed validation: invalid card number"));

    let (status, body) = send(&app, post_payment(&payment_body())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
    assert_eq!(body["error"]["details"], "failed validation: invalid card number");
}

#[tokio::test]
async fn missing_cvv_returns_bad_request() {
    let app = app(MockBank::approving());
    let mut body = payment_body();
    body.as_object_mut().unwrap().remove("cvv");

    let (status, body) = send(&app, post_payment(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "missing parameter");
}

#[tokio::test]
async fn wrong_typed_field_returns_error_envelope() {
    let app = app(MockBank::approving());
    let mut body = payment_body();
    body["cvv"] = json!("abc");

    let (status, body) = send(&app, post_payment(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
    assert_eq!(body["error"]["message"], "invalid request body");
    assert!(!body.to_string().contains("expected i32"));
}

#[tokio::test]
async fn malformed_json_returns_error_envelope() {
    let app = app(MockBank::approving());
    let req = Request::builder()
        .method("POST")
        .uri("/payments")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn empty_reference_returns_bad_request() {
    let app = app(MockBank::approving());

    let (status, body) = send(&app, get_payment("")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn shutdown_lets_in_flight_payment_finish() {
    let bank = Arc::new(MockBank::approving());
    let store = InMemoryPaymentStore::new();
    let state = AppState {
        payment_service: PaymentService::new(
            bank.clone(),
            Arc::new(SlowStore {
                inner: store.clone(),
                delay: Duration::from_millis(200),
            }),
        ),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let stop = shutdown.clone();
    let server = tokio::spawn(serve(listener, state, async move { stop.cancelled().await }));

    let request = tokio::spawn(async move {
        reqwest::Client::new()
            .post(format!("http://{addr}/payments"))
            .json(&payment_body())
            .send()
            .await
            .unwrap()
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();

    let resp = request.await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["status"], "APPROVED");

    assert_eq!(bank.authorize_calls(), 1);
    assert_eq!(store.len().await, 1);

    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn unknown_reference_reports_unknown_status() {
    let app = app(MockBank::approving());

    let (status, body) = send(&app, get_payment("825ca1787c9d4672991848a5bfbc1057")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UNKNOWN");
    assert_eq!(body["status_reason"], "transaction does not exist");
}

#[tokio::test]
async fn health_is_ok() {
    let app = app(MockBank::approving());
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
