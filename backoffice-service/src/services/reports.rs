//! CSV report rendering.
//!
//! Pure formatting of already-fetched report rows into delimited-text
//! downloads. Blank optional fields render as "-" to match the on-screen
//! reports.

use crate::models::Sale;
use crate::services::database::{InventoryValueRow, LowStockRow, TransactionReportRow};
use ops_core::error::AppError;

fn dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, AppError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render CSV: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Report is not UTF-8: {}", e)))
}

pub fn low_stock_csv(rows: &[LowStockRow]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Name",
            "SKU",
            "Current Quantity",
            "Minimum Quantity",
            "Unit",
            "Vendor",
            "Category",
            "Price",
        ])
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render CSV: {}", e)))?;

    for row in rows {
        writer
            .write_record([
                row.name.clone(),
                dash(row.sku.as_deref()).to_string(),
                row.quantity.to_string(),
                row.min_quantity.to_string(),
                row.unit.clone(),
                dash(row.vendor_name.as_deref()).to_string(),
                dash(row.category_name.as_deref()).to_string(),
                row.price.to_string(),
            ])
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render CSV: {}", e)))?;
    }

    finish(writer)
}

pub fn inventory_value_csv(rows: &[InventoryValueRow]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Name",
            "SKU",
            "Quantity",
            "Unit",
            "Unit Price",
            "Total Value",
            "Category",
            "Vendor",
        ])
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render CSV: {}", e)))?;

    for row in rows {
        writer
            .write_record([
                row.name.clone(),
                dash(row.sku.as_deref()).to_string(),
                row.quantity.to_string(),
                row.unit.clone(),
                row.price.to_string(),
                row.total_value.to_string(),
                dash(row.category_name.as_deref()).to_string(),
                dash(row.vendor_name.as_deref()).to_string(),
            ])
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render CSV: {}", e)))?;
    }

    finish(writer)
}

pub fn transactions_csv(rows: &[TransactionReportRow]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Date",
            "Product",
            "SKU",
            "Transaction Type",
            "Quantity",
            "Unit",
            "Notes",
        ])
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render CSV: {}", e)))?;

    for row in rows {
        writer
            .write_record([
                row.transaction_date.format("%Y-%m-%d").to_string(),
                row.product_name.clone(),
                dash(row.sku.as_deref()).to_string(),
                row.transaction_type.clone(),
                row.quantity.to_string(),
                row.unit.clone(),
                dash(row.notes.as_deref()).to_string(),
            ])
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render CSV: {}", e)))?;
    }

    finish(writer)
}

pub fn sales_csv(sales: &[Sale]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Order ID",
            "Date",
            "Payment Type",
            "Total",
            "Tax",
            "Discount",
        ])
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render CSV: {}", e)))?;

    for sale in sales {
        writer
            .write_record([
                sale.order_id.clone(),
                sale.sale_date.format("%Y-%m-%d %H:%M:%S").to_string(),
                sale.payment_type.clone(),
                sale.total_amount.to_string(),
                sale.tax_amount.to_string(),
                sale.discount_amount.to_string(),
            ])
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render CSV: {}", e)))?;
    }

    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn low_stock_csv_renders_header_and_dashes() {
        let rows = vec![LowStockRow {
            name: "Espresso Beans".to_string(),
            sku: None,
            quantity: Decimal::from_str("2.5").unwrap(),
            min_quantity: Decimal::from_str("5").unwrap(),
            unit: "lb".to_string(),
            price: Decimal::from_str("12.00").unwrap(),
            vendor_name: Some("Roastery Co".to_string()),
            category_name: None,
        }];

        let csv = low_stock_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Name,SKU,Current Quantity,Minimum Quantity,Unit,Vendor,Category,Price"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Espresso Beans,-,2.5,5,lb,Roastery Co,-,12.00"
        );
    }

    #[test]
    fn sales_csv_renders_order_rows() {
        let sales = vec![Sale {
            sale_id: uuid::Uuid::new_v4(),
            order_id: "1001".to_string(),
            sale_date: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 15, 0)
                .unwrap(),
            payment_type: "credit".to_string(),
            total_amount: Decimal::from_str("7.50").unwrap(),
            tax_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            uploaded_by: None,
            import_batch: uuid::Uuid::new_v4(),
            created_utc: chrono::Utc::now(),
        }];

        let csv = sales_csv(&sales).unwrap();
        assert!(csv.starts_with("Order ID,Date,Payment Type,Total,Tax,Discount\n"));
        assert!(csv.contains("1001,2024-03-01 09:15:00,credit,7.50,0,0"));
    }

    #[test]
    fn transactions_csv_formats_dates() {
        let rows = vec![TransactionReportRow {
            transaction_date: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
            product_name: "Oat Milk".to_string(),
            sku: Some("OAT-1".to_string()),
            transaction_type: "usage".to_string(),
            quantity: Decimal::from_str("3").unwrap(),
            unit: "each".to_string(),
            notes: None,
        }];

        let csv = transactions_csv(&rows).unwrap();
        assert!(csv.contains("2024-06-01,Oat Milk,OAT-1,usage,3,each,-"));
    }
}
