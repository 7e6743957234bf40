use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use common::{CustomerId, RestaurantId};
use order_domain::{CustomerReplicaEntry, RestaurantProduct, RestaurantSnapshot};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::Result;

/// The Order service's read-only local replicas of restaurant and customer
/// identity (§4.6). Populated out of band (a restaurant listing topic for
/// restaurants, the `customer` topic for customers); only read here during
/// order validation.
#[async_trait]
pub trait RestaurantReplicaRepository: Send + Sync {
    async fn find(&self, restaurant_id: RestaurantId) -> Result<Option<RestaurantSnapshot>>;
}

#[async_trait]
pub trait CustomerReplicaRepository: Send + Sync {
    async fn find(&self, customer_id: CustomerId) -> Result<Option<CustomerReplicaEntry>>;
    async fn upsert(&self, entry: &CustomerReplicaEntry) -> Result<()>;
}

pub struct PostgresRestaurantReplica {
    pool: PgPool,
}

impl PostgresRestaurantReplica {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RestaurantReplicaRepository for PostgresRestaurantReplica {
    async fn find(&self, restaurant_id: RestaurantId) -> Result<Option<RestaurantSnapshot>> {
        let restaurant_row = sqlx::query("SELECT active FROM restaurant_replica WHERE restaurant_id = $1")
            .bind(restaurant_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        let Some(restaurant_row) = restaurant_row else {
            return Ok(None);
        };
        let active: bool = restaurant_row.try_get("active")?;

        let product_rows = sqlx::query(
            "SELECT product_id, price, available FROM restaurant_replica_product WHERE restaurant_id = $1",
        )
        .bind(restaurant_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut products = Vec::with_capacity(product_rows.len());
        for row in product_rows {
            products.push(RestaurantProduct {
                id: common::ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                price: common::Money::new(row.try_get("price")?),
                available: row.try_get("available")?,
            });
        }

        Ok(Some(RestaurantSnapshot {
            id: restaurant_id,
            active,
            products,
        }))
    }
}

pub struct PostgresCustomerReplica {
    pool: PgPool,
}

impl PostgresCustomerReplica {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerReplicaRepository for PostgresCustomerReplica {
    async fn find(&self, customer_id: CustomerId) -> Result<Option<CustomerReplicaEntry>> {
        let row = sqlx::query(
            "SELECT customer_id, username, first_name, last_name FROM customer_replica WHERE customer_id = $1",
        )
        .bind(customer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(CustomerReplicaEntry {
                id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
                username: row.try_get("username")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
            })),
            None => Ok(None),
        }
    }

    async fn upsert(&self, entry: &CustomerReplicaEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO customer_replica (customer_id, username, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (customer_id) DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(&entry.username)
        .bind(&entry.first_name)
        .bind(&entry.last_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// In-memory doubles for unit tests.
#[derive(Default)]
pub struct InMemoryRestaurantReplica {
    restaurants: Mutex<HashMap<RestaurantId, RestaurantSnapshot>>,
}

impl InMemoryRestaurantReplica {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, snapshot: RestaurantSnapshot) {
        self.restaurants.lock().unwrap().insert(snapshot.id, snapshot);
    }
}

#[async_trait]
impl RestaurantReplicaRepository for InMemoryRestaurantReplica {
    async fn find(&self, restaurant_id: RestaurantId) -> Result<Option<RestaurantSnapshot>> {
        Ok(self.restaurants.lock().unwrap().get(&restaurant_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCustomerReplica {
    customers: Mutex<HashMap<CustomerId, CustomerReplicaEntry>>,
}

impl InMemoryCustomerReplica {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerReplicaRepository for InMemoryCustomerReplica {
    async fn find(&self, customer_id: CustomerId) -> Result<Option<CustomerReplicaEntry>> {
        Ok(self.customers.lock().unwrap().get(&customer_id).cloned())
    }

    async fn upsert(&self, entry: &CustomerReplicaEntry) -> Result<()> {
        self.customers.lock().unwrap().insert(entry.id, entry.clone());
        Ok(())
    }
}
