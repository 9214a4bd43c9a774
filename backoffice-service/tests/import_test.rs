//! Integration tests for the sales import pipeline.

mod common;

use common::{spawn_app, upload_csv};
use serde_json::Value;
use uuid::Uuid;

fn two_item_csv(order_id: &str) -> String {
    format!(
        "Order ID,Time,Item Name,Price,Quantity\n\
         {order_id},2024-03-01 09:15:00,Latte,4.50,1\n\
         {order_id},2024-03-01 09:15:00,Muffin,3.00,1\n"
    )
}

#[tokio::test]
async fn upload_creates_orders_and_items() {
    let Some(app) = spawn_app().await else { return };
    let order_id = format!("order-{}", Uuid::new_v4());

    let response = upload_csv(&app, "sales.csv", &two_item_csv(&order_id)).await;
    assert_eq!(response.status(), 201, "upload should succeed");

    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["orders_created"], 1);
    assert_eq!(summary["items_created"], 2);
    assert_eq!(summary["orders_skipped"], 0);
    assert!(summary["batch_id"].is_string());

    // The order shows up in the sales listing with its verbatim total.
    let listing: Value = app
        .client
        .get(app.url("/api/sales?per_page=100"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sale = listing["sales"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["order_id"] == order_id.as_str())
        .expect("imported sale should be listed");
    let total: rust_decimal::Decimal =
        serde_json::from_value(sale["total_amount"].clone()).unwrap();
    assert_eq!(total, "7.50".parse().unwrap());
}

#[tokio::test]
async fn reimporting_the_same_file_is_idempotent() {
    let Some(app) = spawn_app().await else { return };
    let order_id = format!("order-{}", Uuid::new_v4());
    let csv = two_item_csv(&order_id);

    let first: Value = upload_csv(&app, "sales.csv", &csv).await.json().await.unwrap();
    assert_eq!(first["orders_created"], 1);

    let second: Value = upload_csv(&app, "sales.csv", &csv).await.json().await.unwrap();
    assert_eq!(second["orders_created"], 0);
    assert_eq!(second["orders_skipped"], 1);
    assert_eq!(second["items_skipped"], 2);
}

#[tokio::test]
async fn upload_rejects_missing_required_columns() {
    let Some(app) = spawn_app().await else { return };

    let response = upload_csv(
        &app,
        "sales.csv",
        "Order ID,Time,Item Name,Price\n1,2024-03-01 09:15:00,Latte,4.50\n",
    )
    .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Quantity"));
}

#[tokio::test]
async fn upload_rejects_non_csv_files() {
    let Some(app) = spawn_app().await else { return };

    let response = upload_csv(&app, "sales.xlsx", "not,a,csv\n").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn unparseable_date_aborts_the_whole_batch() {
    let Some(app) = spawn_app().await else { return };
    let good = format!("order-{}", Uuid::new_v4());
    let bad = format!("order-{}", Uuid::new_v4());

    let csv = format!(
        "Order ID,Time,Item Name,Price,Quantity\n\
         {good},2024-03-01 09:15:00,Latte,4.50,1\n\
         {bad},not a timestamp,Muffin,3.00,1\n"
    );

    let response = upload_csv(&app, "sales.csv", &csv).await;
    assert_eq!(response.status(), 422);

    // Nothing from the failed batch may have committed: re-importing the
    // good order alone still creates it.
    let retry: Value = upload_csv(&app, "sales.csv", &two_item_csv(&good))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(retry["orders_created"], 1);
}

#[tokio::test]
async fn sku_match_links_items_to_catalog_products() {
    let Some(app) = spawn_app().await else { return };
    let sku = format!("SKU-{}", Uuid::new_v4());
    let order_id = format!("order-{}", Uuid::new_v4());

    // Catalog product whose name shares nothing with the export row.
    let product: Value = app
        .client
        .post(app.url("/api/products"))
        .json(&serde_json::json!({
            "name": format!("House Blend {}", Uuid::new_v4()),
            "sku": sku,
            "unit": "bag",
            "quantity": "10",
            "min_quantity": "2",
            "price": "11.00"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let csv = format!(
        "Order ID,Time,Item Name,Price,Quantity,SKU\n\
         {order_id},2024-03-01 09:15:00,Totally Different Name,11.00,1,{sku}\n"
    );
    let summary: Value = upload_csv(&app, "sales.csv", &csv).await.json().await.unwrap();
    assert_eq!(summary["orders_created"], 1);
    assert_eq!(summary["unmatched_items"], 0);

    // Resolve the sale and check the item's product link.
    let listing: Value = app
        .client
        .get(app.url("/api/sales?per_page=100"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sale_id = listing["sales"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["order_id"] == order_id.as_str())
        .expect("sale listed")["sale_id"]
        .as_str()
        .unwrap()
        .to_string();

    let detail: Value = app
        .client
        .get(app.url(&format!("/api/sales/{}", sale_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["items"][0]["product_id"], product["product_id"]);
}

#[tokio::test]
async fn unmatched_items_are_counted_not_failed() {
    let Some(app) = spawn_app().await else { return };
    let order_id = format!("order-{}", Uuid::new_v4());

    let csv = format!(
        "Order ID,Time,Item Name,Price,Quantity\n\
         {order_id},2024-03-01 09:15:00,Item Nobody Stocks {order_id},5.00,1\n"
    );
    let response = upload_csv(&app, "sales.csv", &csv).await;
    assert_eq!(response.status(), 201);

    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["orders_created"], 1);
    assert_eq!(summary["unmatched_items"], 1);
}
