use crate::domain::card::Transaction;
use crate::gateways::{BankClient, BankError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementReport {
    pub submitted: usize,
    /// Reference to the bank's reason, for every transaction left unsettled.
    pub failures: HashMap<String, String>,
}

impl SettlementReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone)]
pub struct SettlementService {
    pub bank: Arc<dyn BankClient>,
}

impl SettlementService {
    pub async fn run(
        &self,
        ctx: &CancellationToken,
        transactions: &[Transaction],
    ) -> Result<SettlementReport, BankError> {
        if transactions.is_empty() {
            tracing::info!("settlement batch is empty, nothing to submit");
            return Ok(SettlementReport::default());
        }

        let failures = self.bank.submit(ctx, transactions).await?;
        for (ref_id, reason) in &failures {
            tracing::warn!(reference = %ref_id, reason = %reason, "transaction not settled");
        }
        tracing::info!(
            submitted = transactions.len(),
            failed = failures.len(),
            "settlement batch submitted"
        );

        Ok(SettlementReport {
            submitted: transactions.len(),
            failures,
        })
    }
}
