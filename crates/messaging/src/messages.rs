use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId, RestaurantId, SagaId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `paymentOrderStatus` carried on a `PaymentRequest` — distinguishes a
/// forward debit from a compensating credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOrderStatus {
    Pending,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub saga_id: SagaId,
    pub customer_id: CustomerId,
    pub order_id: OrderId,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub payment_order_status: PaymentOrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub saga_id: SagaId,
    pub customer_id: CustomerId,
    pub order_id: OrderId,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub failure_messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestaurantOrderStatus {
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApprovalProduct {
    pub id: ProductId,
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub saga_id: SagaId,
    pub order_id: OrderId,
    pub restaurant_id: RestaurantId,
    pub created_at: DateTime<Utc>,
    pub restaurant_order_status: RestaurantOrderStatus,
    pub products: Vec<ApprovalProduct>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderApprovalStatus {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub saga_id: SagaId,
    pub order_id: OrderId,
    pub created_at: DateTime<Utc>,
    pub order_approval_status: OrderApprovalStatus,
    pub failure_messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerModel {
    pub id: CustomerId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}
