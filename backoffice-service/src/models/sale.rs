//! Sale models: imported point-of-sale orders and their line items.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How an order was paid, inferred from the POS export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Credit,
    Cash,
    Mobile,
    Other,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Credit => "credit",
            PaymentType::Cash => "cash",
            PaymentType::Mobile => "mobile",
            PaymentType::Other => "other",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "credit" => PaymentType::Credit,
            "cash" => PaymentType::Cash,
            "mobile" => PaymentType::Mobile,
            _ => PaymentType::Other,
        }
    }

    /// Infer the payment type from free-form POS payment text.
    ///
    /// Case-insensitive substring match; anything unrecognized is `Other`.
    pub fn infer(payment_text: &str) -> Self {
        let lower = payment_text.to_lowercase();
        if lower.contains("credit") || lower.contains("card") {
            PaymentType::Credit
        } else if lower.contains("cash") {
            PaymentType::Cash
        } else if lower.contains("mobile") || lower.contains("app") {
            PaymentType::Mobile
        } else {
            PaymentType::Other
        }
    }
}

/// One checkout transaction imported from a POS export, identified by the
/// external order id. Duplicate imports of the same order id are no-ops.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sale {
    pub sale_id: Uuid,
    pub order_id: String,
    pub sale_date: NaiveDateTime,
    pub payment_type: String,
    pub total_amount: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub uploaded_by: Option<Uuid>,
    pub import_batch: Uuid,
    pub created_utc: DateTime<Utc>,
}

/// One product entry within a sale. Owned by the sale; deleted with it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SaleItem {
    pub sale_item_id: Uuid,
    pub sale_id: Uuid,
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub product_id: Option<Uuid>,
    pub sort_order: i32,
}
