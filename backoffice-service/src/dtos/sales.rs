use crate::models::{Sale, SaleItem};
use crate::services::database::{DailyRevenue, PaymentBreakdown, TopProduct};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SalesListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SalesListResponse {
    pub sales: Vec<Sale>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct SaleDetailResponse {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

#[derive(Debug, Deserialize)]
pub struct RevenueSummaryParams {
    /// Window length in days, counted back from now. Defaults to 30.
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RevenueSummaryResponse {
    pub total_revenue: Decimal,
    pub transaction_count: i64,
    pub average_sale: Decimal,
    pub daily_revenue: Vec<DailyRevenue>,
    pub top_products: Vec<TopProduct>,
    pub payment_breakdown: Vec<PaymentBreakdown>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRangeParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
