use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, RestaurantId};
use messaging::{ApprovalResponse, OrderApprovalStatus};
use outbox::{OutboxMessage, SagaStatus};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::{Product, Restaurant};
use crate::error::Result;
use crate::store::{RequestedProduct, RestaurantStore, StepOutcome};

pub struct PostgresRestaurantStore {
    pool: PgPool,
}

impl PostgresRestaurantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn load_restaurant_tx(
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: RestaurantId,
    ) -> Result<Option<Restaurant>> {
        let restaurant_row = sqlx::query("SELECT active FROM restaurants WHERE restaurant_id = $1")
            .bind(restaurant_id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?;
        let Some(restaurant_row) = restaurant_row else {
            return Ok(None);
        };
        let active: bool = restaurant_row.try_get("active")?;

        let product_rows = sqlx::query(
            "SELECT product_id, price, available FROM restaurant_products WHERE restaurant_id = $1",
        )
        .bind(restaurant_id.as_uuid())
        .fetch_all(&mut **tx)
        .await?;

        let mut products = Vec::with_capacity(product_rows.len());
        for row in product_rows {
            products.push(Product {
                id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                price: common::Money::new(row.try_get("price")?),
                available: row.try_get("available")?,
            });
        }

        Ok(Some(Restaurant {
            id: restaurant_id,
            active,
            products,
        }))
    }

    async fn insert_response_row_tx(
        tx: &mut Transaction<'_, Postgres>,
        row: &OutboxMessage,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO approval_response_outbox
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
impl RestaurantStore for PostgresRestaurantStore {
    async fn apply_approval_request(
        &self,
        saga_id: OrderId,
        order_id: OrderId,
        restaurant_id: RestaurantId,
        requested: Vec<RequestedProduct>,
    ) -> Result<StepOutcome> {
        let mut tx = self.pool.begin().await?;

        let restaurant = Self::load_restaurant_tx(&mut tx, restaurant_id).await?;
        let failures = match restaurant {
            Some(restaurant) => restaurant.validate(
                &requested
                    .iter()
                    .map(|p| (p.id, p.quantity, p.price))
                    .collect::<Vec<_>>(),
            ),
            None => vec![format!("Restaurant {restaurant_id} not found")],
        };

        let response = ApprovalResponse {
            saga_id,
            order_id,
            created_at: Utc::now(),
            order_approval_status: if failures.is_empty() {
                OrderApprovalStatus::Approved
            } else {
                OrderApprovalStatus::Rejected
            },
            failure_messages: failures,
        };

        let row = OutboxMessage::new_started(
            saga_id,
            "APPROVAL_RESPONSE",
            serde_json::to_value(&response)?,
            String::new(),
            SagaStatus::Succeeded,
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
