use crate::domain::card::{Card, Transaction};
use crate::domain::payment::{
    ErrorEnvelope, ErrorPayload, PaymentRecord, ProcessPaymentRequest, ProcessPaymentResponse,
};
use crate::domain::reference::new_reference;
use crate::domain::status::resolve_status;
use crate::gateways::BankClient;
use crate::repo::payments_repo::PaymentStore;
use axum::http::StatusCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub type ServiceError = (StatusCode, ErrorEnvelope);

const DEFAULT_VALIDATION_REASON: &str = "card failed validation";

#[derive(Clone)]
pub struct PaymentService {
    pub bank: Arc<dyn BankClient>,
    pub store: Arc<dyn PaymentStore>,
}

impl PaymentService {
    pub fn new(bank: Arc<dyn BankClient>, store: Arc<dyn PaymentStore>) -> Self {
        Self { bank, store }
    }

    /// Runs validate, authorize, resolve and persist in that order. Nothing is
    /// stored unless the bank returned an authorization answer.
    pub async fn process(
        &self,
        ctx: &CancellationToken,
        req: ProcessPaymentRequest,
    ) -> Result<ProcessPaymentResponse, ServiceError> {
        if !req.has_required_fields() {
            tracing::warn!(request = ?req, "request contains invalid parameters");
            return Err(invalid_argument("missing parameter", None));
        }

        let reference = new_reference();

        let validation = self
            .bank
            .validate(ctx, &Card::from_request(&req))
            .await
            .map_err(|e| {
                tracing::error!(reference = %reference, error = %e, "card validation request failed");
                internal("validating payment")
            })?;

        if !validation.is_valid {
            let reason = validation
                .reason
                .unwrap_or_else(|| DEFAULT_VALIDATION_REASON.to_string());
            tracing::error!(reference = %reference, reason = %reason, "invalid card details");
            return Err(invalid_argument("validating payment", Some(reason)));
        }

        let authorization = self
            .bank
            .authorize(ctx, &Transaction::new(&reference, &req))
            .await
            .map_err(|e| {
                tracing::error!(reference = %reference, error = %e, "authorize transaction");
                internal("authorize transaction")
            })?;

        let status = resolve_status(&authorization.code);

        // A failure here leaves the bank-side authorization in place.
        self.store
            .add_payment_info(ctx, &reference, &req, status, &authorization.reason)
            .await
            .map_err(|e| {
                tracing::error!(
                    reference = %reference,
                    status = status.as_str(),
                    error = %e,
                    "error adding payment info"
                );
                internal("error adding payment info")
            })?;

        tracing::info!(
            reference = %reference,
            code = %authorization.code,
            status = status.as_str(),
            "payment recorded"
        );

        Ok(ProcessPaymentResponse {
            reference,
            status,
            status_reason: authorization.reason,
        })
    }

    pub async fn get(
        &self,
        ctx: &CancellationToken,
        reference: &str,
    ) -> Result<PaymentRecord, ServiceError> {
        if reference.is_empty() {
            tracing::warn!("payment lookup without reference");
            return Err(invalid_argument("missing parameter", None));
        }

        self.store.get_payment_info(ctx, reference).await.map_err(|e| {
            tracing::error!(reference = %reference, error = %e, "error getting payment info");
            internal("error getting payment info")
        })
    }
}

fn err(code: &str, message: &str, details: Option<String>) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details,
        },
    }
}

pub fn invalid_argument(message: &str, details: Option<String>) -> ServiceError {
    (StatusCode::BAD_REQUEST, err("INVALID_ARGUMENT", message, details))
}

fn internal(message: &str) -> ServiceError {
    (StatusCode::INTERNAL_SERVER_ERROR, err("INTERNAL", message, None))
}
