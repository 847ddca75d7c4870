use crate::domain::masking::mask_card_number;
use crate::domain::payment::{BillingDetails, PaymentRecord, PaymentType, ProcessPaymentRequest};
use crate::domain::status::Status;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::future::Future;
use tokio_util::sync::CancellationToken;

pub const CARD_MASK: char = 'X';

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Zero rows affected: either the reference already exists or the insert
    /// was otherwise a no-op. The two cases are indistinguishable here.
    #[error("error inserting payment info")]
    NotInserted,
    #[error("storage call cancelled")]
    Cancelled,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Insert-once, read-many payment storage. There is no update path.
#[async_trait::async_trait]
pub trait PaymentStore: Send + Sync {
    async fn add_payment_info(
        &self,
        ctx: &CancellationToken,
        ref_id: &str,
        request: &ProcessPaymentRequest,
        status: Status,
        reason: &str,
    ) -> Result<(), StoreError>;

    /// Missing references come back as [`PaymentRecord::not_found`], not as
    /// an error.
    async fn get_payment_info(
        &self,
        ctx: &CancellationToken,
        ref_id: &str,
    ) -> Result<PaymentRecord, StoreError>;
}

#[derive(Clone)]
pub struct PaymentsRepo {
    pub pool: PgPool,
}

const INSERT_PAYMENT_INFO: &str = r#"
    INSERT INTO payment_details (
        ref_id, name, surname, email, phone, address_line_1, address_line_2, postcode,
        card_number, currency, amount, payment_type, status, status_reason
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
    ON CONFLICT DO NOTHING
"#;

const GET_PAYMENT_INFO: &str = r#"
    SELECT ref_id, name, surname, email, phone, address_line_1, address_line_2, postcode,
           card_number, currency, amount, payment_type, status, status_reason,
           insert_timestamp, updated_timestamp
    FROM payment_details
    WHERE ref_id = $1
    LIMIT 1
"#;

async fn cancellable<T, F>(ctx: &CancellationToken, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    tokio::select! {
        _ = ctx.cancelled() => Err(StoreError::Cancelled),
        r = fut => r.map_err(StoreError::from),
    }
}

pub(crate) fn nullable_str(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub(crate) fn nullable_amount(value: Decimal) -> Option<Decimal> {
    if value.is_zero() {
        None
    } else {
        Some(value)
    }
}

fn text(row: &PgRow, column: &str) -> Result<String, sqlx::Error> {
    Ok(row.try_get::<Option<String>, _>(column)?.unwrap_or_default())
}

fn record_from_row(row: &PgRow) -> Result<PaymentRecord, sqlx::Error> {
    Ok(PaymentRecord {
        reference: text(row, "ref_id")?,
        billing_details: BillingDetails {
            name: text(row, "name")?,
            surname: text(row, "surname")?,
            email: text(row, "email")?,
            phone: text(row, "phone")?,
            address_line_1: text(row, "address_line_1")?,
            address_line_2: text(row, "address_line_2")?,
            postcode: text(row, "postcode")?,
        },
        card_number: text(row, "card_number")?,
        amount: row.try_get::<Option<Decimal>, _>("amount")?.unwrap_or_default(),
        currency: text(row, "currency")?,
        payment_type: PaymentType::parse(&text(row, "payment_type")?),
        status: Status::parse(&text(row, "status")?),
        status_reason: text(row, "status_reason")?,
        insert_timestamp: row.try_get("insert_timestamp")?,
        updated_timestamp: row.try_get("updated_timestamp")?,
    })
}

#[async_trait::async_trait]
impl PaymentStore for PaymentsRepo {
    async fn add_payment_info(
        &self,
        ctx: &CancellationToken,
        ref_id: &str,
        request: &ProcessPaymentRequest,
        status: Status,
        reason: &str,
    ) -> Result<(), StoreError> {
        let masked_card = mask_card_number(&request.card_number, CARD_MASK);
        let billing = &request.billing_details;

        let query = sqlx::query(INSERT_PAYMENT_INFO)
            .bind(nullable_str(ref_id))
            .bind(nullable_str(&billing.name))
            .bind(nullable_str(&billing.surname))
            .bind(nullable_str(&billing.email))
            .bind(nullable_str(&billing.phone))
            .bind(nullable_str(&billing.address_line_1))
            .bind(nullable_str(&billing.address_line_2))
            .bind(nullable_str(&billing.postcode))
            .bind(nullable_str(&masked_card))
            .bind(nullable_str(&request.currency))
            .bind(nullable_amount(request.amount))
            .bind(request.payment_type.as_str())
            .bind(status.as_str())
            .bind(nullable_str(reason));

        let result = cancellable(ctx, query.execute(&self.pool)).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotInserted);
        }

        Ok(())
    }

    async fn get_payment_info(
        &self,
        ctx: &CancellationToken,
        ref_id: &str,
    ) -> Result<PaymentRecord, StoreError> {
        let row = cancellable(
            ctx,
            sqlx::query(GET_PAYMENT_INFO).bind(ref_id).fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => Ok(record_from_row(&row)?),
            None => Ok(PaymentRecord::not_found()),
        }
    }
}
