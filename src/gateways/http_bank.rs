use crate::domain::card::{Card, Transaction};
use crate::gateways::retry::{AttemptOutcome, RetryDirective, RetryPolicy};
use crate::gateways::{Authorization, BankClient, BankError, CardValidation, Endpoint};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

pub struct HttpBankClient {
    pub base_url: String,
    pub retry: RetryPolicy,
    pub client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ValidateBody {
    status: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorizeBody {
    code: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SettlementResult {
    ref_id: Option<String>,
    success: Option<String>,
    reason: Option<String>,
}

impl HttpBankClient {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.into(),
            retry,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint.path())
    }

    async fn post_json<T, R>(
        &self,
        ctx: &CancellationToken,
        endpoint: Endpoint,
        payload: &T,
    ) -> Result<R, BankError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let name = endpoint.name();
        let url = self.url(endpoint);
        let body = serde_json::to_vec(payload).map_err(|source| BankError::Encode {
            endpoint: name,
            source,
        })?;

        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            if ctx.is_cancelled() {
                return Err(BankError::Cancelled { endpoint: name });
            }

            let result = tokio::select! {
                _ = ctx.cancelled() => return Err(BankError::Cancelled { endpoint: name }),
                r = self.send_once(&url, body.clone()) => r,
            };

            let (outcome, response) = match result {
                Ok((status, bytes)) => {
                    last_error = format!("unexpected response status code: {status}");
                    (AttemptOutcome::Status(status), Some(bytes))
                }
                Err(e) => {
                    last_error = e.to_string();
                    (AttemptOutcome::TransportError, None)
                }
            };

            match self.retry.classify(attempt, outcome) {
                RetryDirective::Done => return decode(name, response.unwrap_or_default()),
                RetryDirective::FailNow => {
                    return match outcome {
                        // a rate limited answer on the last attempt still carries a body
                        AttemptOutcome::Status(429) => decode(name, response.unwrap_or_default()),
                        AttemptOutcome::Status(status) if !RetryPolicy::is_retryable(outcome) => {
                            Err(BankError::UnexpectedStatus { endpoint: name, status })
                        }
                        _ => Err(BankError::RetriesExhausted {
                            endpoint: name,
                            url,
                            attempts: attempt + 1,
                            last: last_error,
                        }),
                    };
                }
                RetryDirective::Continue(wait) => {
                    tracing::warn!(
                        endpoint = name,
                        attempt = attempt + 1,
                        wait = ?wait,
                        error = %last_error,
                        "bank request failed, retrying"
                    );
                    tokio::select! {
                        _ = ctx.cancelled() => return Err(BankError::Cancelled { endpoint: name }),
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }

        Err(BankError::RetriesExhausted {
            endpoint: name,
            url,
            attempts,
            last: last_error,
        })
    }

    async fn send_once(&self, url: &str, body: Vec<u8>) -> Result<(u16, Vec<u8>), reqwest::Error> {
        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(self.retry.attempt_timeout)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?;
        Ok((status, bytes.to_vec()))
    }
}

fn decode<R: DeserializeOwned>(endpoint: &'static str, body: Vec<u8>) -> Result<R, BankError> {
    serde_json::from_slice(&body).map_err(|source| BankError::Decode { endpoint, source })
}

fn settlement_failures(results: Vec<SettlementResult>) -> HashMap<String, String> {
    results
        .into_iter()
        .filter(|r| r.success.as_deref() != Some("true"))
        .filter_map(|r| match (r.ref_id, r.reason) {
            (Some(ref_id), Some(reason)) if !ref_id.is_empty() && !reason.is_empty() => {
                Some((ref_id, reason))
            }
            _ => None,
        })
        .collect()
}

#[async_trait::async_trait]
impl BankClient for HttpBankClient {
    async fn validate(&self, ctx: &CancellationToken, card: &Card) -> Result<CardValidation, BankError> {
        let body: ValidateBody = self.post_json(ctx, Endpoint::Validate, card).await?;

        let is_valid = body
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("valid"));
        if is_valid {
            return Ok(CardValidation::valid());
        }

        Ok(CardValidation {
            is_valid: false,
            reason: body.error,
        })
    }

    async fn authorize(
        &self,
        ctx: &CancellationToken,
        transaction: &Transaction,
    ) -> Result<Authorization, BankError> {
        let body: AuthorizeBody = self.post_json(ctx, Endpoint::Authorize, transaction).await?;

        Ok(match body.code {
            Some(code) => Authorization {
                code,
                reason: body.reason.unwrap_or_default(),
            },
            None => Authorization::default(),
        })
    }

    async fn submit(
        &self,
        ctx: &CancellationToken,
        transactions: &[Transaction],
    ) -> Result<HashMap<String, String>, BankError> {
        let results: Vec<SettlementResult> =
            self.post_json(ctx, Endpoint::Submit, transactions).await?;
        Ok(settlement_failures(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(ref_id: Option<&str>, success: Option<&str>, reason: Option<&str>) -> SettlementResult {
        SettlementResult {
            ref_id: ref_id.map(str::to_string),
            success: success.map(str::to_string),
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn settled_entries_are_dropped() {
        let out = settlement_failures(vec![
            result(Some("a"), Some("true"), Some("ignored")),
            result(Some("b"), Some("false"), Some("insufficient funds")),
            result(Some("c"), None, Some("no success flag")),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.get("b").map(String::as_str), Some("insufficient funds"));
        assert_eq!(out.get("c").map(String::as_str), Some("no success flag"));
        assert!(!out.contains_key("a"));
    }

    #[test]
    fn entries_without_ref_or_reason_are_ignored() {
        let out = settlement_failures(vec![
            result(None, Some("false"), Some("lost")),
            result(Some(""), Some("false"), Some("lost")),
            result(Some("d"), Some("false"), None),
        ]);
        assert!(out.is_empty());
    }

    #[test]
    fn success_flag_must_be_the_literal_true() {
        let out = settlement_failures(vec![result(Some("e"), Some("TRUE"), Some("case matters"))]);
        assert_eq!(out.get("e").map(String::as_str), Some("case matters"));
    }

    #[test]
    fn url_joins_base_and_path() {
        let c = HttpBankClient::new("http://0.0.0.0:1080/", RetryPolicy::default());
        assert_eq!(c.url(Endpoint::Authorize), "http://0.0.0.0:1080/api/v1/authorize");
    }
}
