use crate::dtos::inventory::{
    CreateProductRequest, CreateTransactionRequest, DashboardResponse, ProductListParams,
    UpdateProductRequest,
};
use crate::models::{CreateProduct, CreateTransaction, UpdateProduct};
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use ops_core::error::AppError;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse, AppError> {
    let products = state
        .db
        .list_products(
            params.search.as_deref(),
            params.sort_by.as_deref().unwrap_or("name"),
            params.sort_order.as_deref().unwrap_or("asc"),
        )
        .await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    if request.quantity < Decimal::ZERO || request.price < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Quantity and price must not be negative"
        )));
    }

    let product = state
        .db
        .create_product(&CreateProduct {
            name: request.name,
            sku: request.sku.filter(|s| !s.trim().is_empty()),
            description: request.description,
            unit: request.unit,
            quantity: request.quantity,
            min_quantity: request.min_quantity,
            price: request.price,
            category_id: request.category_id,
            vendor_id: request.vendor_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let product = state
        .db
        .update_product(
            product_id,
            &UpdateProduct {
                name: request.name,
                sku: request.sku,
                description: request.description,
                unit: request.unit,
                quantity: request.quantity,
                min_quantity: request.min_quantity,
                price: request.price,
                category_id: request.category_id,
                vendor_id: request.vendor_id,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_product(product_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Product not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Products at or below their low-stock threshold.
pub async fn low_stock_alerts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let products = state.db.low_stock_products().await?;
    Ok(Json(products))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    if request.quantity <= Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Quantity must be positive"
        )));
    }

    let transaction = state
        .db
        .create_transaction(&CreateTransaction {
            product_id: request.product_id,
            transaction_type: request.transaction_type,
            quantity: request.quantity,
            notes: request.notes,
            transaction_date: request
                .transaction_date
                .unwrap_or_else(|| chrono::Utc::now().naive_utc()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn recent_transactions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state.db.recent_transactions(50).await?;
    Ok(Json(transactions))
}

/// Back-office landing data: stock alerts, activity, and counts.
pub async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let low_stock = state.db.low_stock_products().await?;
    let recent_transactions = state.db.recent_transactions(5).await?;
    let total_inventory_value = state.db.inventory_value().await?;
    let product_count = state.db.product_count().await?;
    let vendor_count = state.db.vendor_count().await?;
    let category_distribution = state.db.category_product_counts().await?;

    Ok(Json(DashboardResponse {
        low_stock,
        recent_transactions,
        total_inventory_value,
        product_count,
        vendor_count,
        category_distribution,
    }))
}
