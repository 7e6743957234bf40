use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, Money, OrderId};
use messaging::PaymentResponse;
use outbox::{OutboxMessage, OutboxStatus, SagaStatus};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::error::Result;
use crate::store::{PaymentStore, StepOutcome};

/// Owns `credit_history` and `payment_response_outbox`. Mirrors the Order
/// service's combined-write pattern: the domain mutation and the
/// response-outbox insert commit together, in one local transaction, and a
/// unique-constraint violation on the insert is the dedupe signal.
pub struct PostgresPaymentStore {
    pool: PgPool,
}

impl PostgresPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn load_available_tx(
        tx: &mut Transaction<'_, Postgres>,
        customer_id: CustomerId,
    ) -> Result<Money> {
        let row = sqlx::query(
            "SELECT total_credits, total_debits FROM credit_history WHERE customer_id = $1",
        )
        .bind(customer_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;
        let Some(row) = row else {
            return Ok(Money::ZERO);
        };
        let credits: Money = row.try_get::<rust_decimal::Decimal, _>("total_credits").map(Money::new)?;
        let debits: Money = row.try_get::<rust_decimal::Decimal, _>("total_debits").map(Money::new)?;
        Ok(credits - debits)
    }

    async fn apply_debit_tx(
        tx: &mut Transaction<'_, Postgres>,
        customer_id: CustomerId,
        amount: Money,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO credit_history (customer_id, total_credits, total_debits)
            VALUES ($1, 0, $2)
            ON CONFLICT (customer_id) DO UPDATE SET
                total_debits = credit_history.total_debits + EXCLUDED.total_debits
            "#,
        )
        .bind(customer_id.as_uuid())
        .bind(amount.amount())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn apply_credit_tx(
        tx: &mut Transaction<'_, Postgres>,
        customer_id: CustomerId,
        amount: Money,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO credit_history (customer_id, total_credits, total_debits)
            VALUES ($1, $2, 0)
            ON CONFLICT (customer_id) DO UPDATE SET
                total_credits = credit_history.total_credits + EXCLUDED.total_credits
            "#,
        )
        .bind(customer_id.as_uuid())
        .bind(amount.amount())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_response_row_tx(
        tx: &mut Transaction<'_, Postgres>,
        row: &OutboxMessage,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO payment_response_outbox
                (id, saga_id, created_at, processed_at, message_type, payload,
                 order_status, saga_status, outbox_status, retry_count, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(row.id)
        .bind(row.saga_id.as_uuid())
        .bind(row.created_at)
        .bind(row.processed_at)
        .bind(&row.message_type)
        .bind(&row.payload)
        .bind(&row.order_status)
        .bind(row.saga_status.as_str())
        .bind(row.outbox_status.as_str())
        .bind(row.retry_count)
        .bind(row.version.value())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    async fn apply_debit(
        &self,
        saga_id: OrderId,
        customer_id: CustomerId,
        amount: Money,
        response_on_success: PaymentResponse,
        response_on_failure: PaymentResponse,
    ) -> Result<StepOutcome> {
        let mut tx = self.pool.begin().await?;

        let available = Self::load_available_tx(&mut tx, customer_id).await?;
        let response = if available >= amount {
            Self::apply_debit_tx(&mut tx, customer_id, amount).await?;
            &response_on_success
        } else {
            &response_on_failure
        };

        let row = OutboxMessage::new_started(
            saga_id,
            "PAY",
            serde_json::to_value(response)?,
            String::new(),
            SagaStatus::Processing,
            Utc::now(),
        );
        if let Err(err) = Self::insert_response_row_tx(&mut tx, &row).await {
            if is_unique_violation(&err) {
                return Ok(StepOutcome::Stale);
            }
            return Err(err.into());
        }

        tx.commit().await?;
        Ok(StepOutcome::Applied)
    }

    async fn apply_credit(
        &self,
        saga_id: OrderId,
        customer_id: CustomerId,
        amount: Money,
        response: PaymentResponse,
    ) -> Result<StepOutcome> {
        let mut tx = self.pool.begin().await?;

        Self::apply_credit_tx(&mut tx, customer_id, amount).await?;

        let row = OutboxMessage::new_started(
            saga_id,
            "CANCEL",
            serde_json::to_value(&response)?,
            String::new(),
            SagaStatus::Compensated,
            Utc::now(),
        );
        if let Err(err) = Self::insert_response_row_tx(&mut tx, &row).await {
            if is_unique_violation(&err) {
                return Ok(StepOutcome::Stale);
            }
            return Err(err.into());
        }

        tx.commit().await?;
        Ok(StepOutcome::Applied)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.constraint().is_some_and(|c| c.contains("saga")))
}
