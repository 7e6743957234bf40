use std::str::FromStr;

use chrono::Utc;
use common::{Money, OrderId, ProductId, RestaurantId};
use messaging::{ApprovalProduct, ApprovalRequest, ApprovalResponse, OrderApprovalStatus, RestaurantOrderStatus};
use restaurant_service::{InMemoryRestaurantStore, Product, Restaurant, handle_approval_request};

fn request(saga_id: OrderId, restaurant_id: RestaurantId, products: Vec<ApprovalProduct>) -> ApprovalRequest {
    ApprovalRequest {
        saga_id,
        order_id: saga_id,
        restaurant_id,
        created_at: Utc::now(),
        restaurant_order_status: RestaurantOrderStatus::Paid,
        products,
    }
}

/// An inactive restaurant rejects every request against it, even one whose
/// products and prices would otherwise match exactly.
#[tokio::test]
async fn inactive_restaurant_rejects_matching_request() {
    let store = InMemoryRestaurantStore::new();
    let restaurant_id = RestaurantId::new();
    let product_id = ProductId::new();
    store.seed(Restaurant {
        id: restaurant_id,
        active: false,
        products: vec![Product {
            id: product_id,
            price: Money::from_str("50").unwrap(),
            available: true,
        }],
    });

    let saga_id = OrderId::new();
    handle_approval_request(
        &store,
        request(
            saga_id,
            restaurant_id,
            vec![ApprovalProduct {
                id: product_id,
                quantity: 1,
                price: rust_decimal::Decimal::from_str("50").unwrap(),
            }],
        ),
    )
    .await
    .unwrap();

    let rows = store.response_outbox_snapshot();
    let payload: ApprovalResponse = serde_json::from_value(rows[0].payload.clone()).unwrap();
    assert_eq!(payload.order_approval_status, OrderApprovalStatus::Rejected);
    assert!(!payload.failure_messages.is_empty());
}

/// A requested price that no longer matches the restaurant's current
/// listing is rejected, even though the product still exists and is
/// available.
#[tokio::test]
async fn stale_price_is_rejected() {
    let store = InMemoryRestaurantStore::new();
    let restaurant_id = RestaurantId::new();
    let product_id = ProductId::new();
    store.seed(Restaurant {
        id: restaurant_id,
        active: true,
        products: vec![Product {
            id: product_id,
            price: Money::from_str("75").unwrap(),
            available: true,
        }],
    });

    let saga_id = OrderId::new();
    handle_approval_request(
        &store,
        request(
            saga_id,
            restaurant_id,
            vec![ApprovalProduct {
                id: product_id,
                quantity: 1,
                price: rust_decimal::Decimal::from_str("50").unwrap(),
            }],
        ),
    )
    .await
    .unwrap();

    let rows = store.response_outbox_snapshot();
    let payload: ApprovalResponse = serde_json::from_value(rows[0].payload.clone()).unwrap();
    assert_eq!(payload.order_approval_status, OrderApprovalStatus::Rejected);
}

/// A multi-item request where every item matches is approved as a whole.
#[tokio::test]
async fn multi_item_matching_request_is_approved() {
    let store = InMemoryRestaurantStore::new();
    let restaurant_id = RestaurantId::new();
    let product_a = ProductId::new();
    let product_b = ProductId::new();
    store.seed(Restaurant {
        id: restaurant_id,
        active: true,
        products: vec![
            Product {
                id: product_a,
                price: Money::from_str("50").unwrap(),
                available: true,
            },
            Product {
                id: product_b,
                price: Money::from_str("25").unwrap(),
                available: true,
            },
        ],
    });

    let saga_id = OrderId::new();
    handle_approval_request(
        &store,
        request(
            saga_id,
            restaurant_id,
            vec![
                ApprovalProduct {
                    id: product_a,
                    quantity: 2,
                    price: rust_decimal::Decimal::from_str("50").unwrap(),
                },
                ApprovalProduct {
                    id: product_b,
                    quantity: 1,
                    price: rust_decimal::Decimal::from_str("25").unwrap(),
                },
            ],
        ),
    )
    .await
    .unwrap();

    let rows = store.response_outbox_snapshot();
    let payload: ApprovalResponse = serde_json::from_value(rows[0].payload.clone()).unwrap();
    assert_eq!(payload.order_approval_status, OrderApprovalStatus::Approved);
}
