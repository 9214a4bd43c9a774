//! Catalog models: categories, vendors, products, inventory transactions.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vendor {
    pub vendor_id: Uuid,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Catalog entry with current stock levels.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub unit: String,
    pub quantity: Decimal,
    pub min_quantity: Decimal,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_quantity
    }
}

/// Stock movement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Usage,
    Adjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Usage => "usage",
            TransactionType::Adjustment => "adjustment",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "purchase" => TransactionType::Purchase,
            "usage" => TransactionType::Usage,
            _ => TransactionType::Adjustment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryTransaction {
    pub transaction_id: Uuid,
    pub product_id: Uuid,
    pub transaction_type: String,
    pub quantity: Decimal,
    pub notes: Option<String>,
    pub transaction_date: NaiveDateTime,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub unit: String,
    pub quantity: Decimal,
    pub min_quantity: Decimal,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
}

/// Input for updating a product.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<Decimal>,
    pub min_quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
}

/// Input for recording a stock movement.
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub notes: Option<String>,
    pub transaction_date: NaiveDateTime,
}
