use crate::domain::card::{Card, Transaction};
use crate::gateways::{Authorization, BankClient, BankError, CardValidation, Endpoint};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Scripted acquirer. `Err` outcomes surface as exhausted retries, the way a
/// bank that never answers would.
pub struct MockBank {
    pub validation: Result<CardValidation, String>,
    pub authorization: Result<Authorization, String>,
    pub settlement_failures: HashMap<String, String>,
    validate_calls: AtomicUsize,
    authorize_calls: AtomicUsize,
    submitted: Mutex<Vec<Transaction>>,
    last_transaction: Mutex<Option<Transaction>>,
}

impl MockBank {
    pub fn new(
        validation: Result<CardValidation, String>,
        authorization: Result<Authorization, String>,
    ) -> Self {
        Self {
            validation,
            authorization,
            settlement_failures: HashMap::new(),
            validate_calls: AtomicUsize::new(0),
            authorize_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            last_transaction: Mutex::new(None),
        }
    }

    pub fn authorizing(code: &str, reason: &str) -> Self {
        Self::new(
            Ok(CardValidation::valid()),
            Ok(Authorization {
                code: code.to_string(),
                reason: reason.to_string(),
            }),
        )
    }

    pub fn approving() -> Self {
        Self::authorizing("00", "approved and completed successfully")
    }

    pub fn rejecting_card(reason: &str) -> Self {
        Self::new(
            Ok(CardValidation::invalid(reason)),
            Err("authorize must not be reached".to_string()),
        )
    }

    pub fn with_settlement_failures(mut self, failures: HashMap<String, String>) -> Self {
        self.settlement_failures = failures;
        self
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub fn last_transaction(&self) -> Option<Transaction> {
        self.last_transaction.lock().ok().and_then(|t| t.clone())
    }

    pub fn submitted(&self) -> Vec<Transaction> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

fn unavailable(endpoint: Endpoint, message: &str) -> BankError {
    BankError::RetriesExhausted {
        endpoint: endpoint.name(),
        url: format!("mock://bank{}", endpoint.path()),
        attempts: 1,
        last: message.to_string(),
    }
}

#[async_trait::async_trait]
impl BankClient for MockBank {
    async fn validate(&self, ctx: &CancellationToken, _card: &Card) -> Result<CardValidation, BankError> {
        if ctx.is_cancelled() {
            return Err(BankError::Cancelled {
                endpoint: Endpoint::Validate.name(),
            });
        }
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.validation
            .clone()
            .map_err(|e| unavailable(Endpoint::Validate, &e))
    }

    async fn authorize(
        &self,
        ctx: &CancellationToken,
        transaction: &Transaction,
    ) -> Result<Authorization, BankError> {
        if ctx.is_cancelled() {
            return Err(BankError::Cancelled {
                endpoint: Endpoint::Authorize.name(),
            });
        }
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_transaction.lock() {
            *last = Some(transaction.clone());
        }
        self.authorization
            .clone()
            .map_err(|e| unavailable(Endpoint::Authorize, &e))
    }

    async fn submit(
        &self,
        ctx: &CancellationToken,
        transactions: &[Transaction],
    ) -> Result<HashMap<String, String>, BankError> {
        if ctx.is_cancelled() {
            return Err(BankError::Cancelled {
                endpoint: Endpoint::Submit.name(),
            });
        }
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.extend(transactions.iter().cloned());
        }
        Ok(transactions
            .iter()
            .filter_map(|t| {
                self.settlement_failures
                    .get(&t.ref_id)
                    .map(|reason| (t.ref_id.clone(), reason.clone()))
            })
            .collect())
    }
}
