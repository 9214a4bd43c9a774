//! Integration tests for inventory, categories, vendors, and reports.

mod common;

use common::{TestApp, spawn_app};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use uuid::Uuid;

async fn create_product(app: &TestApp, name: &str, quantity: &str, min_quantity: &str) -> Value {
    let response = app
        .client
        .post(app.url("/api/products"))
        .json(&json!({
            "name": name,
            "unit": "each",
            "quantity": quantity,
            "min_quantity": min_quantity,
            "price": "4.00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

fn decimal(value: &Value) -> Decimal {
    serde_json::from_value(value.clone()).unwrap()
}

#[tokio::test]
async fn transactions_apply_their_stock_effects() {
    let Some(app) = spawn_app().await else { return };
    let product = create_product(
        &app,
        &format!("Beans {}", Uuid::new_v4()),
        "10",
        "2",
    )
    .await;
    let product_id = product["product_id"].as_str().unwrap();

    // Usage subtracts.
    let response = app
        .client
        .post(app.url("/api/inventory/transactions"))
        .json(&json!({
            "product_id": product_id,
            "transaction_type": "usage",
            "quantity": "4"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let fetched: Value = app
        .client
        .get(app.url(&format!("/api/products/{}", product_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(decimal(&fetched["quantity"]), "6".parse().unwrap());

    // Overdrawing usage is rejected without changing stock.
    let response = app
        .client
        .post(app.url("/api/inventory/transactions"))
        .json(&json!({
            "product_id": product_id,
            "transaction_type": "usage",
            "quantity": "100"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    // Purchase adds; adjustment sets the absolute quantity.
    for (kind, quantity, expected) in
        [("purchase", "2", "8"), ("adjustment", "5", "5")]
    {
        let response = app
            .client
            .post(app.url("/api/inventory/transactions"))
            .json(&json!({
                "product_id": product_id,
                "transaction_type": kind,
                "quantity": quantity
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);

        let fetched: Value = app
            .client
            .get(app.url(&format!("/api/products/{}", product_id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(decimal(&fetched["quantity"]), expected.parse().unwrap());
    }
}

#[tokio::test]
async fn low_stock_alerts_track_the_threshold() {
    let Some(app) = spawn_app().await else { return };
    let name = format!("Filters {}", Uuid::new_v4());
    let product = create_product(&app, &name, "1", "5").await;

    let alerts: Value = app
        .client
        .get(app.url("/api/alerts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        alerts
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p["product_id"] == product["product_id"]),
        "product below threshold should be in the alerts list"
    );
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let Some(app) = spawn_app().await else { return };

    let category: Value = app
        .client
        .post(app.url("/api/categories"))
        .json(&json!({ "name": format!("Syrups {}", Uuid::new_v4()) }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = app
        .client
        .post(app.url("/api/products"))
        .json(&json!({
            "name": format!("Vanilla Syrup {}", Uuid::new_v4()),
            "unit": "bottle",
            "quantity": "3",
            "min_quantity": "1",
            "price": "6.50",
            "category_id": category["category_id"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let delete = app
        .client
        .delete(app.url(&format!(
            "/api/categories/{}",
            category["category_id"].as_str().unwrap()
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status(), 409);
}

#[tokio::test]
async fn product_edit_with_quantity_change_records_an_adjustment() {
    let Some(app) = spawn_app().await else { return };
    let product = create_product(
        &app,
        &format!("Cups {}", Uuid::new_v4()),
        "20",
        "5",
    )
    .await;
    let product_id = product["product_id"].as_str().unwrap();

    let response = app
        .client
        .put(app.url(&format!("/api/products/{}", product_id)))
        .json(&json!({ "quantity": "12" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let transactions: Value = app
        .client
        .get(app.url("/api/inventory/transactions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let adjustment = transactions
        .as_array()
        .unwrap()
        .iter()
        .find(|t| {
            t["product_id"].as_str() == Some(product_id)
                && t["transaction_type"] == "adjustment"
                && t["notes"]
                    .as_str()
                    .map(|n| n.starts_with("Manual adjustment"))
                    .unwrap_or(false)
        })
        .expect("quantity edit should record an adjustment");
    assert_eq!(decimal(&adjustment["quantity"]), "-8".parse().unwrap());
}

#[tokio::test]
async fn low_stock_export_is_a_csv_attachment() {
    let Some(app) = spawn_app().await else { return };
    create_product(&app, &format!("Lids {}", Uuid::new_v4()), "0", "5").await;

    let response = app
        .client
        .get(app.url("/api/reports/low-stock/export"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(
        response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert!(
        response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("low_stock_report")
    );

    let body = response.text().await.unwrap();
    assert!(body.starts_with("Name,SKU,Current Quantity"));
}
