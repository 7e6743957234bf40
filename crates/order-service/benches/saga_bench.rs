use std::str::FromStr;
use std::sync::Arc;

use common::{CustomerId, Money, OrderId, ProductId, RestaurantId};
use criterion::{Criterion, criterion_group, criterion_main};
use messaging::{ApprovalResponse, OrderApprovalStatus, PaymentResponse, PaymentStatus};
use order_domain::{CustomerReplicaEntry, DeliveryAddress, RestaurantProduct, RestaurantSnapshot};
use order_service::{
    CreateOrderCommand, CustomerReplicaRepository, InMemoryCustomerReplica, InMemoryRestaurantReplica,
    InMemorySagaStore, SagaEngine,
};

fn address() -> DeliveryAddress {
    DeliveryAddress {
        street: "1 Main St".into(),
        postal_code: "00000".into(),
        city: "Springfield".into(),
    }
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let restaurant_id = RestaurantId::new();
    let customer_id = CustomerId::new();
    let product_id = ProductId::new();
    let price = Money::from_str("50").unwrap();

    let store = Arc::new(InMemorySagaStore::new());
    let restaurants = Arc::new(InMemoryRestaurantReplica::new());
    restaurants.seed(RestaurantSnapshot {
        id: restaurant_id,
        active: true,
        products: vec![RestaurantProduct {
            id: product_id,
            price,
            available: true,
        }],
    });
    let customers = Arc::new(InMemoryCustomerReplica::new());
    rt.block_on(async {
        customers
            .upsert(&CustomerReplicaEntry {
                id: customer_id,
                username: "alice".into(),
                first_name: "Alice".into(),
                last_name: "Anderson".into(),
            })
            .await
            .unwrap();
    });
    let engine = SagaEngine::new(store, restaurants, customers);

    c.bench_function("order-service/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                engine
                    .create_order(CreateOrderCommand {
                        order_id: OrderId::new(),
                        customer_id,
                        restaurant_id,
                        delivery_address: address(),
                        items: vec![(product_id, 1, price)],
                        price,
                    })
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_full_saga_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let restaurant_id = RestaurantId::new();
    let customer_id = CustomerId::new();
    let product_id = ProductId::new();
    let price = Money::from_str("50").unwrap();

    let restaurants = Arc::new(InMemoryRestaurantReplica::new());
    restaurants.seed(RestaurantSnapshot {
        id: restaurant_id,
        active: true,
        products: vec![RestaurantProduct {
            id: product_id,
            price,
            available: true,
        }],
    });
    let customers = Arc::new(InMemoryCustomerReplica::new());
    rt.block_on(async {
        customers
            .upsert(&CustomerReplicaEntry {
                id: customer_id,
                username: "alice".into(),
                first_name: "Alice".into(),
                last_name: "Anderson".into(),
            })
            .await
            .unwrap();
    });

    c.bench_function("order-service/full_saga_approves", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = Arc::new(InMemorySagaStore::new());
                let engine = SagaEngine::new(store, restaurants.clone(), customers.clone());
                let order_id = OrderId::new();
                engine
                    .create_order(CreateOrderCommand {
                        order_id,
                        customer_id,
                        restaurant_id,
                        delivery_address: address(),
                        items: vec![(product_id, 1, price)],
                        price,
                    })
                    .await
                    .unwrap();

                engine
                    .handle_payment_response(PaymentResponse {
                        saga_id: order_id,
                        customer_id,
                        order_id,
                        price: price.amount(),
                        created_at: chrono::Utc::now(),
                        payment_status: PaymentStatus::Completed,
                        failure_messages: vec![],
                    })
                    .await
                    .unwrap();

                engine
                    .handle_approval_response(ApprovalResponse {
                        saga_id: order_id,
                        order_id,
                        created_at: chrono::Utc::now(),
                        order_approval_status: OrderApprovalStatus::Approved,
                        failure_messages: vec![],
                    })
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_create_order, bench_full_saga_cycle);
criterion_main!(benches);
