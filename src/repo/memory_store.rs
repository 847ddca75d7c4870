use crate::domain::masking::mask_card_number;
use crate::domain::payment::{PaymentRecord, ProcessPaymentRequest};
use crate::domain::status::Status;
use crate::repo::payments_repo::{PaymentStore, StoreError, CARD_MASK};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Map-backed store with the same insert-once and not-found behaviour as
/// [`crate::repo::payments_repo::PaymentsRepo`].
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    inner: Arc<RwLock<HashMap<String, PaymentRecord>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn add_payment_info(
        &self,
        ctx: &CancellationToken,
        ref_id: &str,
        request: &ProcessPaymentRequest,
        status: Status,
        reason: &str,
    ) -> Result<(), StoreError> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let mut map = self.inner.write().await;
        if map.contains_key(ref_id) {
            return Err(StoreError::NotInserted);
        }

        let now = chrono::Utc::now();
        map.insert(
            ref_id.to_string(),
            PaymentRecord {
                reference: ref_id.to_string(),
                billing_details: request.billing_details.clone(),
                card_number: mask_card_number(&request.card_number, CARD_MASK),
                amount: request.amount,
                currency: request.currency.clone(),
                payment_type: request.payment_type,
                status,
                status_reason: reason.to_string(),
                insert_timestamp: Some(now),
                updated_timestamp: Some(now),
            },
        );
        Ok(())
    }

    async fn get_payment_info(
        &self,
        ctx: &CancellationToken,
        ref_id: &str,
    ) -> Result<PaymentRecord, StoreError> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        Ok(self
            .inner
            .read()
            .await
            .get(ref_id)
            .cloned()
            .unwrap_or_else(PaymentRecord::not_found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn request() -> ProcessPaymentRequest {
        ProcessPaymentRequest {
            card_number: "378282246310005".to_string(),
            expiry: "23/4".to_string(),
            cvv: 342,
            amount: Decimal::new(2050, 2),
            currency: "GBP".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn stores_masked_card_once() {
        let store = InMemoryPaymentStore::new();
        let ctx = CancellationToken::new();

        store
            .add_payment_info(&ctx, "r1", &request(), Status::Approved, "ok")
            .await
            .unwrap();
        let second = store
            .add_payment_info(&ctx, "r1", &request(), Status::Rejected, "again")
            .await;
        assert!(matches!(second, Err(StoreError::NotInserted)));

        let rec = store.get_payment_info(&ctx, "r1").await.unwrap();
        assert_eq!(rec.card_number, "3782XXXXXXX0005");
        assert_eq!(rec.status, Status::Approved);
        assert_eq!(rec.status_reason, "ok");
    }

    #[tokio::test]
    async fn missing_reference_is_not_an_error() {
        let store = InMemoryPaymentStore::new();
        let rec = store
            .get_payment_info(&CancellationToken::new(), "nope")
            .await
            .unwrap();
        assert_eq!(rec.status, Status::Unknown);
        assert_eq!(rec.status_reason, "transaction does not exist");
    }
}
