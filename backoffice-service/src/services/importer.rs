//! Point-of-sale export parsing.
//!
//! Turns a raw CSV export (one row per line item) into grouped order drafts
//! with inferred dates, payment types, and catalog matches. Parsing is pure;
//! persistence of the drafts lives in [`crate::services::Database`].

use crate::models::{PaymentType, Product};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Columns every POS export must carry. Anything else is optional.
pub const REQUIRED_COLUMNS: [&str; 5] = ["Order ID", "Time", "Item Name", "Price", "Quantity"];

/// Known timestamp formats, tried in priority order. The first that parses
/// wins, so ambiguous day/month values resolve as US-style dates.
const DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("missing required column: {0}")]
    MalformedInput(String),

    /// A single unparseable timestamp aborts the whole batch. Documented
    /// contract; do not downgrade to skip-and-continue.
    #[error("could not parse date format for order {order_id}")]
    UnparseableDate { order_id: String },

    #[error("failed to read sales export: {0}")]
    Read(String),
}

/// One line item of an order draft.
#[derive(Debug, Clone)]
pub struct LineDraft {
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub product_id: Option<Uuid>,
}

/// One order grouped out of the export, ready to persist.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order_id: String,
    pub sale_date: NaiveDateTime,
    pub payment_type: PaymentType,
    pub total_amount: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub items: Vec<LineDraft>,
}

/// Summary of one completed file import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub orders_created: i64,
    pub items_created: i64,
    pub items_skipped: i64,
    pub orders_skipped: i64,
    pub unmatched_items: i64,
    pub batch_id: Uuid,
}

/// Parse a POS export into order drafts.
///
/// Rows are grouped by `Order ID` (group order by first appearance, row
/// order within a group preserved). Catalog matching never fails: an
/// unmatched item simply carries no product id.
pub fn parse_sales_export(
    content: &str,
    catalog: &[Product],
) -> Result<Vec<OrderDraft>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ImportError::Read(e.to_string()))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    for required in REQUIRED_COLUMNS {
        if column(required).is_none() {
            return Err(ImportError::MalformedInput(required.to_string()));
        }
    }

    let order_col = column("Order ID").unwrap_or(0);
    let time_col = column("Time").unwrap_or(0);
    let name_col = column("Item Name").unwrap_or(0);
    let price_col = column("Price").unwrap_or(0);
    let quantity_col = column("Quantity").unwrap_or(0);
    let tax_col = column("Tax");
    let discount_col = column("Discount");
    let payment_col = column("Payment Type");
    let sku_col = column("SKU");

    // Stable grouping by order id: first appearance fixes the group order.
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<csv::StringRecord>)> = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Read(e.to_string()))?;
        let order_id = cell(&record, order_col).trim().to_string();
        if order_id.is_empty() {
            tracing::warn!("skipping export row without an order id");
            continue;
        }
        match group_index.get(&order_id) {
            Some(&idx) => groups[idx].1.push(record),
            None => {
                group_index.insert(order_id.clone(), groups.len());
                groups.push((order_id, vec![record]));
            }
        }
    }

    let mut orders = Vec::with_capacity(groups.len());
    for (order_id, rows) in groups {
        let time_text = cell(&rows[0], time_col).trim().to_string();
        let sale_date = parse_sale_date(&time_text).ok_or(ImportError::UnparseableDate {
            order_id: order_id.clone(),
        })?;

        let total_amount = column_sum(&rows, Some(price_col));
        let tax_amount = column_sum(&rows, tax_col);
        let discount_amount = column_sum(&rows, discount_col);

        let payment_type = match payment_col {
            Some(col) => PaymentType::infer(cell(&rows[0], col)),
            None => PaymentType::Other,
        };

        let items = rows
            .iter()
            .map(|row| {
                let product_name = cell(row, name_col).to_string();
                let sku = Some(cell(row, sku_col.unwrap_or(usize::MAX)).trim())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                let price = parse_decimal(cell(row, price_col)).unwrap_or(Decimal::ZERO);
                let quantity = parse_decimal(cell(row, quantity_col))
                    .filter(|q| *q > Decimal::ZERO)
                    .unwrap_or(Decimal::ONE);
                let unit_price = price / quantity.max(Decimal::ONE);
                let product_id = match_catalog(catalog, sku.as_deref(), &product_name);
                LineDraft {
                    product_name,
                    sku,
                    quantity,
                    unit_price,
                    product_id,
                }
            })
            .collect();

        orders.push(OrderDraft {
            order_id,
            sale_date,
            payment_type,
            total_amount,
            tax_amount,
            discount_amount,
            items,
        });
    }

    Ok(orders)
}

fn cell<'a>(record: &'a csv::StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or("")
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text.trim()).ok()
}

/// Sum a numeric column across the group's rows. An unparseable cell counts
/// as zero; an absent column yields zero for the whole group.
fn column_sum(rows: &[csv::StringRecord], col: Option<usize>) -> Decimal {
    let Some(col) = col else {
        return Decimal::ZERO;
    };
    rows.iter()
        .map(|row| parse_decimal(cell(row, col)).unwrap_or(Decimal::ZERO))
        .sum()
}

fn parse_sale_date(text: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Match a line item against the catalog.
///
/// A non-empty SKU matches only by exact SKU equality; otherwise the item
/// name matches the first catalog product whose name contains it,
/// case-insensitively. A blank name matches nothing.
fn match_catalog(catalog: &[Product], sku: Option<&str>, product_name: &str) -> Option<Uuid> {
    if let Some(sku) = sku {
        return catalog
            .iter()
            .find(|p| p.sku.as_deref() == Some(sku))
            .map(|p| p.product_id);
    }

    let needle = product_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    catalog
        .iter()
        .find(|p| p.name.to_lowercase().contains(&needle))
        .map(|p| p.product_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike, Utc};

    fn product(name: &str, sku: Option<&str>) -> Product {
        Product {
            product_id: Uuid::new_v4(),
            name: name.to_string(),
            sku: sku.map(str::to_string),
            description: None,
            unit: "each".to_string(),
            quantity: Decimal::ZERO,
            min_quantity: Decimal::ONE,
            price: Decimal::ZERO,
            category_id: None,
            vendor_id: None,
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let content = "Order ID,Time,Item Name,Price\n1,2024-03-01 09:15:00,Latte,4.50\n";
        let err = parse_sales_export(content, &[]).unwrap_err();
        match err {
            ImportError::MalformedInput(col) => assert_eq!(col, "Quantity"),
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn groups_rows_into_one_order_with_summed_total() {
        let content = "\
Order ID,Time,Item Name,Price,Quantity
1001,2024-03-01 09:15:00,Latte,4.50,1
1001,2024-03-01 09:15:00,Muffin,3.00,1
";
        let orders = parse_sales_export(content, &[]).unwrap();
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.order_id, "1001");
        assert_eq!(order.total_amount, dec("7.50"));
        assert_eq!(order.tax_amount, Decimal::ZERO);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].product_name, "Latte");
        assert_eq!(order.items[0].unit_price, dec("4.50"));
        assert_eq!(order.items[1].unit_price, dec("3.00"));
        assert_eq!(order.sale_date.hour(), 9);
        assert_eq!(order.sale_date.minute(), 15);
    }

    #[test]
    fn group_order_follows_first_appearance_with_interleaved_rows() {
        let content = "\
Order ID,Time,Item Name,Price,Quantity
B,2024-03-01 09:00:00,Scone,2.00,1
A,2024-03-01 10:00:00,Latte,4.00,1
B,2024-03-01 09:00:00,Drip Coffee,2.50,1
";
        let orders = parse_sales_export(content, &[]).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id, "B");
        assert_eq!(orders[1].order_id, "A");
        assert_eq!(orders[0].items[0].product_name, "Scone");
        assert_eq!(orders[0].items[1].product_name, "Drip Coffee");
    }

    #[test]
    fn date_formats_are_tried_in_priority_order() {
        for (text, expected_month, expected_day) in [
            ("2024-03-01T09:15:00", 3, 1),
            ("2024-03-01 09:15:00", 3, 1),
            // Ambiguous day/month resolves as US-style because that format
            // is tried first.
            ("03/04/2024 09:15:00", 3, 4),
            ("25/12/2024 09:15:00", 12, 25),
        ] {
            let parsed = parse_sale_date(text).unwrap_or_else(|| panic!("failed on {text}"));
            assert_eq!(parsed.month(), expected_month, "month of {text}");
            assert_eq!(parsed.day(), expected_day, "day of {text}");
        }
    }

    #[test]
    fn unparseable_date_aborts_the_batch_naming_the_order() {
        let content = "\
Order ID,Time,Item Name,Price,Quantity
1001,2024-03-01 09:15:00,Latte,4.50,1
1002,yesterday at nine,Muffin,3.00,1
";
        let err = parse_sales_export(content, &[]).unwrap_err();
        match err {
            ImportError::UnparseableDate { order_id } => assert_eq!(order_id, "1002"),
            other => panic!("expected UnparseableDate, got {other:?}"),
        }
    }

    #[test]
    fn payment_type_inferred_from_first_row() {
        let content = "\
Order ID,Time,Item Name,Price,Quantity,Payment Type
1,2024-03-01 09:00:00,Latte,4.50,1,Credit Card
2,2024-03-01 09:05:00,Muffin,3.00,1,CASH
3,2024-03-01 09:10:00,Mocha,5.00,1,Mobile App
4,2024-03-01 09:15:00,Tea,2.50,1,gift voucher
";
        let orders = parse_sales_export(content, &[]).unwrap();
        let types: Vec<PaymentType> = orders.iter().map(|o| o.payment_type).collect();
        assert_eq!(
            types,
            [
                PaymentType::Credit,
                PaymentType::Cash,
                PaymentType::Mobile,
                PaymentType::Other
            ]
        );
    }

    #[test]
    fn absent_payment_column_defaults_to_other() {
        let content = "Order ID,Time,Item Name,Price,Quantity\n1,2024-03-01 09:00:00,Latte,4.50,1\n";
        let orders = parse_sales_export(content, &[]).unwrap();
        assert_eq!(orders[0].payment_type, PaymentType::Other);
    }

    #[test]
    fn unparseable_numeric_cells_count_as_zero() {
        let content = "\
Order ID,Time,Item Name,Price,Quantity,Tax
1,2024-03-01 09:00:00,Latte,4.50,1,0.40
1,2024-03-01 09:00:00,Muffin,n/a,1,oops
";
        let orders = parse_sales_export(content, &[]).unwrap();
        assert_eq!(orders[0].total_amount, dec("4.50"));
        assert_eq!(orders[0].tax_amount, dec("0.40"));
        assert_eq!(orders[0].items[1].unit_price, Decimal::ZERO);
    }

    #[test]
    fn sku_match_wins_even_when_names_differ() {
        let catalog = vec![product("House Blend Beans", Some("SKU-42"))];
        let content = "\
Order ID,Time,Item Name,Price,Quantity,SKU
1,2024-03-01 09:00:00,Completely Different,10.00,1,SKU-42
";
        let orders = parse_sales_export(content, &catalog).unwrap();
        assert_eq!(orders[0].items[0].product_id, Some(catalog[0].product_id));
    }

    #[test]
    fn sku_mismatch_does_not_fall_back_to_name_matching() {
        let catalog = vec![product("Latte", None)];
        let content = "\
Order ID,Time,Item Name,Price,Quantity,SKU
1,2024-03-01 09:00:00,Latte,4.50,1,UNKNOWN-SKU
";
        let orders = parse_sales_export(content, &catalog).unwrap();
        assert_eq!(orders[0].items[0].product_id, None);
    }

    #[test]
    fn name_matches_case_insensitive_substring() {
        let catalog = vec![
            product("Blueberry Muffin", None),
            product("Iced Latte", None),
        ];
        let content = "\
Order ID,Time,Item Name,Price,Quantity
1,2024-03-01 09:00:00,latte,4.50,1
1,2024-03-01 09:00:00,Croissant,3.25,1
";
        let orders = parse_sales_export(content, &catalog).unwrap();
        assert_eq!(orders[0].items[0].product_id, Some(catalog[1].product_id));
        assert_eq!(orders[0].items[1].product_id, None);
    }

    #[test]
    fn unit_price_divides_by_quantity_floored_at_one() {
        let content = "\
Order ID,Time,Item Name,Price,Quantity
1,2024-03-01 09:00:00,Latte,9.00,2
1,2024-03-01 09:00:00,Muffin,3.00,0
";
        let orders = parse_sales_export(content, &[]).unwrap();
        assert_eq!(orders[0].items[0].unit_price, dec("4.50"));
        assert_eq!(orders[0].items[0].quantity, dec("2"));
        // Zero quantity falls back to one, both for the stored quantity and
        // the unit-price divisor.
        assert_eq!(orders[0].items[1].unit_price, dec("3.00"));
        assert_eq!(orders[0].items[1].quantity, Decimal::ONE);
    }

    #[test]
    fn totals_come_from_the_price_column_not_line_math() {
        // Price column holds line totals; unit prices are derived with the
        // divisor floored at one. With a fractional quantity the recomputed
        // sum(unit_price * quantity) diverges from the column sum, and the
        // order total must stay the verbatim column sum.
        let content = "\
Order ID,Time,Item Name,Price,Quantity
1,2024-03-01 09:00:00,Beans by weight,5.00,0.5
";
        let orders = parse_sales_export(content, &[]).unwrap();
        let item = &orders[0].items[0];
        assert_eq!(orders[0].total_amount, dec("5.00"));
        assert_eq!(item.unit_price, dec("5.00"));
        assert_eq!(item.quantity, dec("0.5"));
        assert_ne!(item.unit_price * item.quantity, orders[0].total_amount);
    }

    #[test]
    fn rows_without_an_order_id_are_dropped() {
        let content = "\
Order ID,Time,Item Name,Price,Quantity
,2024-03-01 09:00:00,Latte,4.50,1
1,2024-03-01 09:00:00,Muffin,3.00,1
";
        let orders = parse_sales_export(content, &[]).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "1");
    }

    #[test]
    fn iso_t_timestamp_parses() {
        let content = "Order ID,Time,Item Name,Price,Quantity\n1,2024-06-10T08:30:00,Latte,4.50,1\n";
        let orders = parse_sales_export(content, &[]).unwrap();
        assert_eq!(
            orders[0].sale_date.date(),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
        );
    }
}
