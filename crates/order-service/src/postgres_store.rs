use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, Money, OrderId, RestaurantId, Version};
use order_domain::{DeliveryAddress, Order, OrderItem, OrderStatus, TrackingId};
use outbox::{OutboxMessage, OutboxStatus, SagaStatus};
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::error::Result;
use crate::store::{SagaStore, StepOutcome};

fn parse_saga_status(s: &str) -> SagaStatus {
    match s {
        "STARTED" => SagaStatus::Started,
        "PROCESSING" => SagaStatus::Processing,
        "SUCCEEDED" => SagaStatus::Succeeded,
        "COMPENSATING" => SagaStatus::Compensating,
        "COMPENSATED" => SagaStatus::Compensated,
        _ => SagaStatus::Failed,
    }
}

fn parse_order_status(s: &str) -> OrderStatus {
    match s {
        "PENDING" => OrderStatus::Pending,
        "PAID" => OrderStatus::Paid,
        "APPROVED" => OrderStatus::Approved,
        "CANCELLING" => OrderStatus::Cancelling,
        _ => OrderStatus::Cancelled,
    }
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let items_json: Value = row.try_get("items")?;
    let items: Vec<OrderItem> = serde_json::from_value(items_json)?;
    let delivery_address = DeliveryAddress {
        street: row.try_get("delivery_street")?,
        postal_code: row.try_get("delivery_postal_code")?,
        city: row.try_get("delivery_city")?,
    };
    let failure_messages_json: Value = row.try_get("failure_messages")?;
    Ok(Order {
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
        restaurant_id: RestaurantId::from_uuid(row.try_get::<Uuid, _>("restaurant_id")?),
        delivery_address,
        items,
        price: row.try_get::<rust_decimal::Decimal, _>("price").map(Money::new)?,
        status: parse_order_status(row.try_get::<&str, _>("status")?),
        failure_messages: serde_json::from_value(failure_messages_json)?,
        tracking_id: TrackingId::from_uuid(row.try_get::<Uuid, _>("tracking_id")?),
        version: Version::new(row.try_get("version")?),
    })
}

fn row_to_outbox(row: PgRow) -> Result<OutboxMessage> {
    Ok(OutboxMessage {
        id: row.try_get("id")?,
        saga_id: OrderId::from_uuid(row.try_get::<Uuid, _>("saga_id")?),
        created_at: row.try_get("created_at")?,
        processed_at: row.try_get("processed_at")?,
        message_type: row.try_get("message_type")?,
        payload: row.try_get("payload")?,
        order_status: row.try_get("order_status")?,
        saga_status: parse_saga_status(row.try_get::<&str, _>("saga_status")?),
        outbox_status: match row.try_get::<&str, _>("outbox_status")? {
            "STARTED" => OutboxStatus::Started,
            "COMPLETED" => OutboxStatus::Completed,
            _ => OutboxStatus::Failed,
        },
        retry_count: row.try_get("retry_count")?,
        version: Version::new(row.try_get("version")?),
    })
}

/// Owns the three tables unique to the Order service (`orders`,
/// `payment_outbox`, `approval_outbox`) and performs the combined writes
/// §4.2 requires atomically, in a single local transaction per inbound
/// event. The per-table sweeper/cleanup operations run separately, through
/// `outbox::PostgresOutboxRepository` against the same two outbox tables,
/// since those only run after this transaction has already committed.
pub struct PostgresSagaStore {
    pool: PgPool,
}

impl PostgresSagaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn find_order_tx(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
    ) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?;
        row.map(row_to_order).transpose()
    }

    async fn update_order_tx(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, failure_messages = $2, version = version + 1
            WHERE order_id = $3 AND version = $4
            "#,
        )
        .bind(order.status.as_str())
        .bind(serde_json::to_value(&order.failure_messages)?)
        .bind(order.order_id.as_uuid())
        .bind(order.version.value() - 1) // caller already advanced the in-memory copy
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_outbox_row_tx(
        tx: &mut Transaction<'_, Postgres>,
        table: &str,
        saga_id: OrderId,
        status: SagaStatus,
    ) -> Result<Option<OutboxMessage>> {
        let sql = format!("SELECT * FROM {table} WHERE saga_id = $1 AND saga_status = $2");
        let row = sqlx::query(&sql)
            .bind(saga_id.as_uuid())
            .bind(status.as_str())
            .fetch_optional(&mut **tx)
            .await?;
        row.map(row_to_outbox).transpose()
    }

    async fn transition_outbox_row_tx(
        tx: &mut Transaction<'_, Postgres>,
        table: &str,
        row: &OutboxMessage,
        saga_status: SagaStatus,
        outbox_status: OutboxStatus,
    ) -> Result<bool> {
        let sql = format!(
            "UPDATE {table} SET saga_status = $1, outbox_status = $2, processed_at = $3, version = version + 1 WHERE id = $4 AND version = $5"
        );
        let result = sqlx::query(&sql)
            .bind(saga_status.as_str())
            .bind(outbox_status.as_str())
            .bind(Utc::now())
            .bind(row.id)
            .bind(row.version.value())
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_outbox_row_tx(
        tx: &mut Transaction<'_, Postgres>,
        table: &str,
        row: &OutboxMessage,
    ) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {table}
                (id, saga_id, created_at, processed_at, message_type, payload,
                 order_status, saga_status, outbox_status, retry_count, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#
        );
        sqlx::query(&sql)
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
impl SagaStore for PostgresSagaStore {
    #[tracing::instrument(skip(self, payment_request_payload))]
    async fn create_order(&self, order: &Order, payment_request_payload: Value) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders
                (order_id, customer_id, restaurant_id, delivery_street, delivery_postal_code,
                 delivery_city, items, price, status, failure_messages, tracking_id, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.order_id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.restaurant_id.as_uuid())
        .bind(&order.delivery_address.street)
        .bind(&order.delivery_address.postal_code)
        .bind(&order.delivery_address.city)
        .bind(serde_json::to_value(&order.items)?)
        .bind(order.price.amount())
        .bind(order.status.as_str())
        .bind(serde_json::to_value(&order.failure_messages)?)
        .bind(order.tracking_id.as_uuid())
        .bind(order.version.value())
        .execute(&mut *tx)
        .await?;

        let payment_row = OutboxMessage::new_started(
            order.order_id,
            "PAY",
            payment_request_payload,
            order.status.to_string(),
            SagaStatus::Started,
            Utc::now(),
        );
        Self::insert_outbox_row_tx(&mut tx, "payment_outbox", &payment_row).await?;

        tx.commit().await?;
        metrics::counter!("orders_saga_step_total", "step" => "create", "outcome" => "ok")
            .increment(1);
        Ok(())
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_order).transpose()
    }

    #[tracing::instrument(skip(self, approval_request_payload))]
    async fn apply_payment_completed(
        &self,
        order_id: OrderId,
        approval_request_payload: Value,
    ) -> Result<StepOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(payment_row) =
            Self::find_outbox_row_tx(&mut tx, "payment_outbox", order_id, SagaStatus::Started)
                .await?
        else {
            return Ok(StepOutcome::Stale);
        };
        let Some(mut order) = Self::find_order_tx(&mut tx, order_id).await? else {
            return Ok(StepOutcome::Stale);
        };
        if order.pay().is_err() {
            return Ok(StepOutcome::Stale);
        }
        if !Self::update_order_tx(&mut tx, &order).await? {
            return Ok(StepOutcome::Stale);
        }
        if !Self::transition_outbox_row_tx(
            &mut tx,
            "payment_outbox",
            &payment_row,
            SagaStatus::Processing,
            OutboxStatus::Completed,
        )
        .await?
        {
            return Ok(StepOutcome::Stale);
        }

        let approval_row = OutboxMessage::new_started(
            order_id,
            "APPROVE",
            approval_request_payload,
            order.status.to_string(),
            SagaStatus::Processing,
            Utc::now(),
        );
        Self::insert_outbox_row_tx(&mut tx, "approval_outbox", &approval_row).await?;

        tx.commit().await?;
        Ok(StepOutcome::Applied)
    }

    #[tracing::instrument(skip(self))]
    async fn apply_payment_failed(
        &self,
        order_id: OrderId,
        failure_messages: Vec<String>,
    ) -> Result<StepOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(payment_row) =
            Self::find_outbox_row_tx(&mut tx, "payment_outbox", order_id, SagaStatus::Started)
                .await?
        else {
            return Ok(StepOutcome::Stale);
        };
        let Some(mut order) = Self::find_order_tx(&mut tx, order_id).await? else {
            return Ok(StepOutcome::Stale);
        };
        if order.init_cancel(failure_messages).is_err() {
            return Ok(StepOutcome::Stale);
        }
        if !Self::update_order_tx(&mut tx, &order).await? {
            return Ok(StepOutcome::Stale);
        }
        if !Self::transition_outbox_row_tx(
            &mut tx,
            "payment_outbox",
            &payment_row,
            SagaStatus::Failed,
            OutboxStatus::Completed,
        )
        .await?
        {
            return Ok(StepOutcome::Stale);
        }

        tx.commit().await?;
        Ok(StepOutcome::Applied)
    }

    #[tracing::instrument(skip(self))]
    async fn apply_payment_cancelled(&self, order_id: OrderId) -> Result<StepOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(payment_row) = Self::find_outbox_row_tx(
            &mut tx,
            "payment_outbox",
            order_id,
            SagaStatus::Compensating,
        )
        .await?
        else {
            return Ok(StepOutcome::Stale);
        };
        let Some(mut order) = Self::find_order_tx(&mut tx, order_id).await? else {
            return Ok(StepOutcome::Stale);
        };
        if order.cancel(Vec::<String>::new()).is_err() {
            return Ok(StepOutcome::Stale);
        }
        if !Self::update_order_tx(&mut tx, &order).await? {
            return Ok(StepOutcome::Stale);
        }
        if !Self::transition_outbox_row_tx(
            &mut tx,
            "payment_outbox",
            &payment_row,
            SagaStatus::Compensated,
            OutboxStatus::Completed,
        )
        .await?
        {
            return Ok(StepOutcome::Stale);
        }

        tx.commit().await?;
        Ok(StepOutcome::Applied)
    }

    #[tracing::instrument(skip(self))]
    async fn apply_approved(&self, order_id: OrderId) -> Result<StepOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(approval_row) = Self::find_outbox_row_tx(
            &mut tx,
            "approval_outbox",
            order_id,
            SagaStatus::Processing,
        )
        .await?
        else {
            return Ok(StepOutcome::Stale);
        };
        let Some(mut order) = Self::find_order_tx(&mut tx, order_id).await? else {
            return Ok(StepOutcome::Stale);
        };
        if order.approve().is_err() {
            return Ok(StepOutcome::Stale);
        }
        if !Self::update_order_tx(&mut tx, &order).await? {
            return Ok(StepOutcome::Stale);
        }
        if !Self::transition_outbox_row_tx(
            &mut tx,
            "approval_outbox",
            &approval_row,
            SagaStatus::Succeeded,
            OutboxStatus::Completed,
        )
        .await?
        {
            return Ok(StepOutcome::Stale);
        }

        tx.commit().await?;
        Ok(StepOutcome::Applied)
    }

    #[tracing::instrument(skip(self, cancel_payment_request_payload))]
    async fn apply_rejected(
        &self,
        order_id: OrderId,
        failure_messages: Vec<String>,
        cancel_payment_request_payload: Value,
    ) -> Result<StepOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(approval_row) = Self::find_outbox_row_tx(
            &mut tx,
            "approval_outbox",
            order_id,
            SagaStatus::Processing,
        )
        .await?
        else {
            return Ok(StepOutcome::Stale);
        };
        let Some(mut order) = Self::find_order_tx(&mut tx, order_id).await? else {
            return Ok(StepOutcome::Stale);
        };
        if order.init_cancel(failure_messages).is_err() {
            return Ok(StepOutcome::Stale);
        }
        if !Self::update_order_tx(&mut tx, &order).await? {
            return Ok(StepOutcome::Stale);
        }
        if !Self::transition_outbox_row_tx(
            &mut tx,
            "approval_outbox",
            &approval_row,
            SagaStatus::Compensating,
            OutboxStatus::Completed,
        )
        .await?
        {
            return Ok(StepOutcome::Stale);
        }

        let cancel_row = OutboxMessage::new_started(
            order_id,
            "CANCEL",
            cancel_payment_request_payload,
            order.status.to_string(),
            SagaStatus::Compensating,
            Utc::now(),
        );
        Self::insert_outbox_row_tx(&mut tx, "payment_outbox", &cancel_row).await?;

        tx.commit().await?;
        Ok(StepOutcome::Applied)
    }
}
