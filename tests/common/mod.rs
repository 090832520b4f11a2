#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use shopflow::{
    config::AppConfig,
    db,
    entities::{customer, inventory_item},
    services::{
        billing::{BillDetail, BillLineInput, NewBill},
        customers::CreateCustomerInput,
        inventory::CreateInventoryItemInput,
    },
    AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "shopflow-integration-signing-key-9f3c7e1b";

/// Helper harness for spinning up the full application over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub owner_a: Uuid,
    pub owner_b: Uuid,
    token_a: String,
    token_b: String,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let owner_a = Uuid::new_v4();
        let owner_b = Uuid::new_v4();
        let token_a = state
            .auth
            .issue_token(owner_a, Some("Owner A Hardware".into()))
            .expect("issue token for owner a");
        let token_b = state
            .auth
            .issue_token(owner_b, Some("Owner B Timber".into()))
            .expect("issue token for owner b");

        let router = shopflow::app_router(state.clone());

        Self {
            router,
            state,
            owner_a,
            owner_b,
            token_a,
            token_b,
        }
    }

    pub fn token_a(&self) -> &str {
        &self.token_a
    }

    pub fn token_b(&self) -> &str {
        &self.token_b
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and decodes the JSON body (`Value::Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, token).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is json")
        };
        (status, json)
    }

    pub async fn seed_customer(&self, owner_id: Uuid, name: &str) -> customer::Model {
        self.state
            .services
            .customers
            .create_customer(
                owner_id,
                CreateCustomerInput {
                    name: name.to_string(),
                    email: None,
                    phone: None,
                    company: None,
                    address: None,
                    city: None,
                    state: None,
                    postal_code: None,
                    notes: None,
                },
            )
            .await
            .expect("seed customer")
    }

    pub async fn seed_item(
        &self,
        owner_id: Uuid,
        name: &str,
        quantity: i32,
        unit_price: Decimal,
    ) -> inventory_item::Model {
        self.state
            .services
            .inventory
            .create_item(
                owner_id,
                CreateInventoryItemInput {
                    name: name.to_string(),
                    sku: None,
                    category: None,
                    description: None,
                    unit: None,
                    quantity,
                    unit_price,
                    min_stock_level: Some(5),
                },
            )
            .await
            .expect("seed inventory item")
    }

    pub async fn item_quantity(&self, owner_id: Uuid, item_id: Uuid) -> i32 {
        self.state
            .services
            .inventory
            .get_item(owner_id, item_id)
            .await
            .expect("load inventory item")
            .quantity
    }

    /// Creates a bill through the service with the given `(item, quantity)` lines.
    pub async fn seed_bill(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
        lines: &[(Uuid, i32)],
        tax_rate: Decimal,
    ) -> BillDetail {
        let bill = NewBill {
            line_items: lines
                .iter()
                .map(|(item, quantity)| BillLineInput {
                    inventory_item_id: *item,
                    quantity: *quantity,
                    unit_price: None,
                })
                .collect(),
            tax_rate: Some(tax_rate),
            ..Default::default()
        };
        self.state
            .services
            .billing
            .create_bill(owner_id, customer_id, bill)
            .await
            .expect("seed bill")
    }
}
