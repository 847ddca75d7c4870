use crate::domain::card::{Card, Transaction};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

pub mod http_bank;
pub mod mock;
pub mod retry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Validate,
    Authorize,
    Submit,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Validate => "/api/v1/validate",
            Endpoint::Authorize => "/api/v1/authorize",
            Endpoint::Submit => "/api/v1/submit",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Validate => "validation",
            Endpoint::Authorize => "authorization",
            Endpoint::Submit => "submit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardValidation {
    pub is_valid: bool,
    /// The acquirer's `error` text, when it sent one.
    pub reason: Option<String>,
}

impl CardValidation {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Raw authorization answer. An empty `code` means the acquirer did not say.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authorization {
    pub code: String,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("error encoding {endpoint} request: {source}")]
    Encode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{endpoint} request cancelled")]
    Cancelled { endpoint: &'static str },
    #[error("error performing {endpoint} request: POST {url} giving up after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        endpoint: &'static str,
        url: String,
        attempts: u32,
        last: String,
    },
    #[error("unexpected {endpoint} response status code: {status}")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },
    #[error("error decoding {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Acquiring bank operations. Every call observes `ctx`; once it is cancelled
/// the call returns `BankError::Cancelled` without further attempts.
#[async_trait::async_trait]
pub trait BankClient: Send + Sync {
    async fn validate(&self, ctx: &CancellationToken, card: &Card) -> Result<CardValidation, BankError>;

    async fn authorize(
        &self,
        ctx: &CancellationToken,
        transaction: &Transaction,
    ) -> Result<Authorization, BankError>;

    /// Submits a batch for settlement and returns the reasons for every
    /// transaction that did not settle, keyed by reference.
    async fn submit(
        &self,
        ctx: &CancellationToken,
        transactions: &[Transaction],
    ) -> Result<HashMap<String, String>, BankError>;
}
