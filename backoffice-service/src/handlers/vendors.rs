use crate::dtos::inventory::{UpdateVendorRequest, VendorRequest};
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use ops_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

pub async fn list_vendors(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let vendors = state.db.list_vendors().await?;
    Ok(Json(vendors))
}

pub async fn create_vendor(
    State(state): State<AppState>,
    Json(request): Json<VendorRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let vendor = state
        .db
        .create_vendor(
            &request.name,
            request.contact_name.as_deref(),
            request.email.as_deref(),
            request.phone.as_deref(),
            request.address.as_deref(),
            request.notes.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(vendor)))
}

pub async fn update_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    Json(request): Json<UpdateVendorRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let vendor = state
        .db
        .update_vendor(
            vendor_id,
            request.name.as_deref(),
            request.contact_name.as_deref(),
            request.email.as_deref(),
            request.phone.as_deref(),
            request.address.as_deref(),
            request.notes.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Vendor not found")))?;

    Ok(Json(vendor))
}

pub async fn delete_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_vendor(vendor_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Vendor not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
