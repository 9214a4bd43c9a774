use crate::models::TransactionType;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 50, message = "SKU must be at most 50 characters"))]
    pub sku: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_unit")]
    #[validate(length(min = 1, max = 20, message = "Unit must be 1-20 characters"))]
    pub unit: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default = "default_min_quantity")]
    pub min_quantity: Decimal,
    #[serde(default)]
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
}

fn default_unit() -> String {
    "each".to_string()
}

fn default_min_quantity() -> Decimal {
    Decimal::ONE
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 50, message = "SKU must be at most 50 characters"))]
    pub sku: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Unit must be 1-20 characters"))]
    pub unit: Option<String>,
    pub quantity: Option<Decimal>,
    pub min_quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VendorRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVendorRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub notes: Option<String>,
    /// Defaults to now when absent.
    pub transaction_date: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub low_stock: Vec<crate::models::Product>,
    pub recent_transactions: Vec<crate::models::InventoryTransaction>,
    pub total_inventory_value: Decimal,
    pub product_count: i64,
    pub vendor_count: i64,
    pub category_distribution: Vec<crate::services::database::CategoryProductCount>,
}
