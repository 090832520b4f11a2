mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

struct Seeded {
    customer: String,
    cement: String,
    sand: String,
}

async fn seed(app: &TestApp) -> Seeded {
    let customer = app.seed_customer(app.owner_a, "Ravi Builders").await;
    let cement = app
        .seed_item(app.owner_a, "Cement 50kg", 50, dec!(10.00))
        .await;
    let sand = app.seed_item(app.owner_a, "River sand", 20, dec!(5.50)).await;
    Seeded {
        customer: customer.id.to_string(),
        cement: cement.id.to_string(),
        sand: sand.id.to_string(),
    }
}

fn worked_example_body(seeded: &Seeded) -> Value {
    json!({
        "customerId": seeded.customer,
        "taxRate": "8.00",
        "lineItems": [
            { "inventoryItemId": seeded.cement, "quantity": 2 },
            { "inventoryItemId": seeded.sand, "quantity": 1, "unitPrice": "5.50" }
        ]
    })
}

#[tokio::test]
async fn create_bill_returns_created_with_string_money() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/bills",
            Some(worked_example_body(&seeded)),
            Some(app.token_a()),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let bill = &body["data"];
    assert_eq!(bill["billNumber"], "INV-000001");
    assert_eq!(bill["subtotal"], "25.50");
    assert_eq!(bill["taxRate"], "8.00");
    assert_eq!(bill["taxAmount"], "2.04");
    assert_eq!(bill["total"], "27.54");
    assert_eq!(bill["paidAmount"], "0.00");
    assert_eq!(bill["outstandingAmount"], "27.54");
    assert_eq!(bill["status"], "pending");
    assert_eq!(bill["customer"]["name"], "Ravi Builders");
    assert_eq!(bill["lineItems"].as_array().map(Vec::len), Some(2));
    assert_eq!(bill["lineItems"][0]["itemName"], "Cement 50kg");
    assert_eq!(bill["lineItems"][0]["total"], "20.00");
    assert!(body["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn bill_lifecycle_over_http() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;
    let token = Some(app.token_a());

    let (_, created) = app
        .send(
            Method::POST,
            "/api/v1/bills",
            Some(worked_example_body(&seeded)),
            token,
        )
        .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, fetched) = app
        .send(Method::GET, &format!("/api/v1/bills/{}", id), None, token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["total"], "27.54");

    let (status, receipt) = app
        .send(
            Method::POST,
            &format!("/api/v1/bills/{}/payments", id),
            Some(json!({ "amount": "20.00", "paymentMethod": "upi" })),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["data"]["payment"]["amount"], "20.00");
    assert_eq!(receipt["data"]["payment"]["paymentMethod"], "upi");
    assert_eq!(receipt["data"]["outstandingAmount"], "7.54");

    let (status, overpay) = app
        .send(
            Method::POST,
            &format!("/api/v1/bills/{}/payments", id),
            Some(json!({ "amount": "10.00" })),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(overpay["message"].as_str().unwrap().contains("exceeds"));

    let (status, balance) = app
        .send(
            Method::GET,
            &format!("/api/v1/bills/{}/balance", id),
            None,
            token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance["data"]["paidAmount"], "20.00");
    assert_eq!(balance["data"]["outstandingAmount"], "7.54");
    assert_eq!(balance["data"]["settled"], false);

    let (_, payments) = app
        .send(
            Method::GET,
            &format!("/api/v1/bills/{}/payments", id),
            None,
            token,
        )
        .await;
    assert_eq!(payments["data"].as_array().map(Vec::len), Some(1));

    let (status, updated) = app
        .send(
            Method::PATCH,
            &format!("/api/v1/bills/{}/status", id),
            Some(json!({ "status": "paid" })),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["status"], "paid");
    assert!(updated["data"]["paidDate"].is_string());
    assert_eq!(updated["data"]["outstandingAmount"], "7.54");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/v1/bills/{}", id), None, token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, missing) = app
        .send(Method::GET, &format!("/api/v1/bills/{}", id), None, token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"], "Not Found");

    assert_eq!(
        app.item_quantity(app.owner_a, seeded.cement.parse().unwrap())
            .await,
        50
    );
}

#[tokio::test]
async fn create_bill_for_customer_and_history() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;
    let token = Some(app.token_a());

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/v1/customers/{}/bills", seeded.customer),
            Some(json!({
                "issuedOn": "2024-03-15",
                "lineItems": [{ "inventoryItemId": seeded.cement, "quantity": 1 }]
            })),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, history) = app
        .send(
            Method::GET,
            &format!(
                "/api/v1/customers/{}/bills?from=2024-03-01&to=2024-03-31",
                seeded.customer
            ),
            None,
            token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["data"]["customer"]["name"], "Ravi Builders");
    assert_eq!(history["data"]["totals"]["billCount"], 1);
    assert_eq!(history["data"]["totals"]["totalBilled"], "10.80");
    assert_eq!(history["data"]["bills"][0]["issuedOn"], "2024-03-15");

    let (_, by_date) = app
        .send(Method::GET, "/api/v1/bills/by-date/2024-03-15", None, token)
        .await;
    assert_eq!(by_date["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn validation_errors_are_bad_requests() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/bills",
            Some(json!({
                "customerId": seeded.customer,
                "lineItems": [{ "inventoryItemId": seeded.cement, "quantity": 0 }]
            })),
            Some(app.token_a()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("lineItems[0].quantity"));

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/bills",
            Some(json!({ "customerId": seeded.customer, "lineItems": [] })),
            Some(app.token_a()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_amounts_are_bad_requests() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/bills",
            Some(json!({
                "customerId": seeded.customer,
                "lineItems": [{
                    "inventoryItemId": seeded.cement,
                    "quantity": 2,
                    "unitPrice": "79228162514264337593543950335"
                }]
            })),
            Some(app.token_a()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("unitPrice"));

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/bills",
            Some(json!({
                "customerId": seeded.customer,
                "taxRate": "8.125",
                "lineItems": [{ "inventoryItemId": seeded.cement, "quantity": 1 }]
            })),
            Some(app.token_a()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({ "name": "Gold tap", "unitPrice": "10000000000.00" })),
            Some(app.token_a()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(
        app.item_quantity(app.owner_a, seeded.cement.parse().unwrap())
            .await,
        50
    );
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;
    let token = Some(app.token_a());

    let (_, created) = app
        .send(
            Method::POST,
            "/api/v1/bills",
            Some(worked_example_body(&seeded)),
            token,
        )
        .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let cases = [
        (
            Method::PATCH,
            format!("/api/v1/bills/{}/status", id),
            json!({ "status": "settled" }),
        ),
        (
            Method::POST,
            format!("/api/v1/bills/{}/payments", id),
            json!({ "amount": "5.00", "paymentMethod": "barter" }),
        ),
        (
            Method::POST,
            format!("/api/v1/bills/{}/payments", id),
            json!({ "amount": "five" }),
        ),
    ];
    for (method, uri, body) in cases {
        let (status, error) = app.send(method.clone(), &uri, Some(body), token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
        assert_eq!(error["error"], "Bad Request");
        assert!(error["message"].is_string());
        assert!(error["timestamp"].is_string());
    }
}

#[tokio::test]
async fn list_bills_is_paginated() {
    let app = TestApp::new().await;
    let seeded = seed(&app).await;

    for _ in 0..3 {
        app.send(
            Method::POST,
            "/api/v1/bills",
            Some(worked_example_body(&seeded)),
            Some(app.token_a()),
        )
        .await;
    }

    let (status, body) = app
        .send(
            Method::GET,
            "/api/v1/bills?page=1&perPage=2",
            None,
            Some(app.token_a()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["pagination"]["total"], 3);
    assert_eq!(body["data"]["pagination"]["totalPages"], 2);
}

#[tokio::test]
async fn api_requires_a_valid_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/v1/bills", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = app
        .send(Method::GET, "/api/v1/bills", None, Some("not-a-jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn probes_are_public_and_echo_request_ids() {
    let app = TestApp::new().await;

    let (status, health) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["data"]["checks"]["database"], "healthy");

    let (status, api_status) = app.send(Method::GET, "/api/v1/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(api_status["data"]["service"], "shopflow");

    let response = app
        .request(Method::GET, "/api/v1/bills", None, Some(app.token_a()))
        .await;
    assert!(response.headers().contains_key("x-request-id"));
}
