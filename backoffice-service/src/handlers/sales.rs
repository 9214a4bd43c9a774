use crate::dtos::sales::{
    RevenueSummaryParams, RevenueSummaryResponse, SaleDetailResponse, SalesListParams,
    SalesListResponse,
};
use crate::middleware::UploaderId;
use crate::services::importer::{self, ImportError};
use crate::services::metrics::{IMPORTED_ORDERS_TOTAL, SALES_IMPORTS_TOTAL};
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use ops_core::error::AppError;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Upload a point-of-sale CSV export.
///
/// The whole file imports as one transaction: orders whose ids were already
/// imported are skipped, everything else commits together or not at all.
pub async fn upload_sales(
    State(state): State<AppState>,
    uploader: UploaderId,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e)))?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file uploaded")))?;

    let file_name = field.file_name().unwrap_or("unnamed").to_string();
    if !file_name.to_lowercase().ends_with(".csv") {
        SALES_IMPORTS_TOTAL.with_label_values(&["malformed"]).inc();
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Only .csv uploads are accepted"
        )));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e)))?;

    if data.len() > state.config.import.max_upload_bytes {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "File too large (max {} bytes)",
            state.config.import.max_upload_bytes
        )));
    }

    let content = String::from_utf8(data.to_vec()).map_err(|_| {
        SALES_IMPORTS_TOTAL.with_label_values(&["malformed"]).inc();
        AppError::BadRequest(anyhow::anyhow!("File is not valid UTF-8 text"))
    })?;

    tracing::info!(file_name = %file_name, bytes = data.len(), "Sales upload started");

    let catalog = state.db.catalog().await?;
    let orders = importer::parse_sales_export(&content, &catalog).map_err(|e| match e {
        ImportError::MalformedInput(_) => {
            SALES_IMPORTS_TOTAL.with_label_values(&["malformed"]).inc();
            AppError::BadRequest(anyhow::Error::new(e))
        }
        ImportError::UnparseableDate { .. } => {
            SALES_IMPORTS_TOTAL
                .with_label_values(&["unparseable_date"])
                .inc();
            AppError::Unprocessable(anyhow::Error::new(e))
        }
        ImportError::Read(_) => {
            SALES_IMPORTS_TOTAL.with_label_values(&["failed"]).inc();
            AppError::BadRequest(anyhow::Error::new(e))
        }
    })?;

    let summary = match state.db.import_sales(&orders, uploader.0).await {
        Ok(summary) => summary,
        Err(e) => {
            SALES_IMPORTS_TOTAL.with_label_values(&["failed"]).inc();
            return Err(e);
        }
    };

    SALES_IMPORTS_TOTAL.with_label_values(&["success"]).inc();
    IMPORTED_ORDERS_TOTAL
        .with_label_values(&["created"])
        .inc_by(summary.orders_created as f64);
    IMPORTED_ORDERS_TOTAL
        .with_label_values(&["skipped"])
        .inc_by(summary.orders_skipped as f64);

    tracing::info!(
        batch_id = %summary.batch_id,
        orders_created = summary.orders_created,
        items_created = summary.items_created,
        orders_skipped = summary.orders_skipped,
        unmatched_items = summary.unmatched_items,
        "Sales upload completed"
    );

    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<SalesListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);

    let (sales, total) = state.db.list_sales(page, per_page).await?;
    let total_pages = (total + per_page - 1) / per_page;

    Ok(Json(SalesListResponse {
        sales,
        total,
        page,
        per_page,
        total_pages,
    }))
}

pub async fn sale_detail(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (sale, items) = state
        .db
        .get_sale(sale_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sale not found")))?;

    Ok(Json(SaleDetailResponse { sale, items }))
}

pub async fn delete_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_sale(sale_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Sale not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Revenue dashboard data over a trailing window (default 30 days).
pub async fn revenue_summary(
    State(state): State<AppState>,
    Query(params): Query<RevenueSummaryParams>,
) -> Result<impl IntoResponse, AppError> {
    let days = params.days.unwrap_or(30).clamp(1, 365);
    let end = Utc::now().naive_utc();
    let start = end - Duration::days(days);

    let (total_revenue, transaction_count) = state.db.revenue_totals(start, end).await?;
    let average_sale = if transaction_count > 0 {
        total_revenue / Decimal::from(transaction_count)
    } else {
        Decimal::ZERO
    };

    let daily_revenue = state.db.daily_revenue(start, end).await?;
    let top_products = state.db.top_products(start, end, 10).await?;
    let payment_breakdown = state.db.payment_breakdown(start, end).await?;

    Ok(Json(RevenueSummaryResponse {
        total_revenue,
        transaction_count,
        average_sale,
        daily_revenue,
        top_products,
        payment_breakdown,
    }))
}
