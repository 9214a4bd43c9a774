use crate::dtos::sales::ReportRangeParams;
use crate::services::reports;
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use ops_core::error::AppError;
use serde_json::json;

fn csv_response(filename: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "text/csv; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Resolve a date-range query to a half-open datetime window. The end date
/// is inclusive: the window runs to the start of the following day.
fn resolve_range(
    params: &ReportRangeParams,
    default_days: i64,
) -> (NaiveDateTime, NaiveDateTime) {
    let today = Utc::now().date_naive();
    let start_date = params
        .start_date
        .unwrap_or_else(|| today - Duration::days(default_days));
    let end_date = params.end_date.unwrap_or(today);
    (
        start_date.and_time(chrono::NaiveTime::MIN),
        (end_date + Duration::days(1)).and_time(chrono::NaiveTime::MIN),
    )
}

fn stamped(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%Y%m%d"))
}

pub async fn low_stock_report(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = state.db.low_stock_report().await?;
    Ok(Json(rows))
}

pub async fn export_low_stock_report(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.db.low_stock_report().await?;
    let body = reports::low_stock_csv(&rows)?;
    Ok(csv_response(
        &stamped("low_stock_report", Utc::now().date_naive()),
        body,
    ))
}

pub async fn inventory_value_report(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.db.inventory_value_report().await?;
    let total_value = state.db.inventory_value().await?;
    Ok(Json(json!({
        "rows": rows,
        "total_value": total_value,
    })))
}

pub async fn export_inventory_value_report(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.db.inventory_value_report().await?;
    let body = reports::inventory_value_csv(&rows)?;
    Ok(csv_response(
        &stamped("inventory_value_report", Utc::now().date_naive()),
        body,
    ))
}

pub async fn transaction_report(
    State(state): State<AppState>,
    Query(params): Query<ReportRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = resolve_range(&params, 7);
    let rows = state.db.transaction_report(start, end).await?;
    Ok(Json(rows))
}

pub async fn export_transaction_report(
    State(state): State<AppState>,
    Query(params): Query<ReportRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = resolve_range(&params, 7);
    let rows = state.db.transaction_report(start, end).await?;
    let body = reports::transactions_csv(&rows)?;
    Ok(csv_response(
        &stamped("transaction_report", Utc::now().date_naive()),
        body,
    ))
}

pub async fn sales_report(
    State(state): State<AppState>,
    Query(params): Query<ReportRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = resolve_range(&params, 30);
    let sales = state.db.sales_between(start, end).await?;
    Ok(Json(sales))
}

pub async fn export_sales_report(
    State(state): State<AppState>,
    Query(params): Query<ReportRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = resolve_range(&params, 30);
    let sales = state.db.sales_between(start, end).await?;
    let body = reports::sales_csv(&sales)?;
    Ok(csv_response(
        &stamped("sales_report", Utc::now().date_naive()),
        body,
    ))
}
