use crate::dtos::staff::{
    CreateStaffRequest, StaffListParams, StaffShiftsResponse, UpdateStaffRequest,
};
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use ops_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

pub async fn list_staff(
    State(state): State<AppState>,
    Query(params): Query<StaffListParams>,
) -> Result<impl IntoResponse, AppError> {
    let staff = state.db.list_staff(params.active_only).await?;
    Ok(Json(staff))
}

pub async fn get_staff(
    State(state): State<AppState>,
    Path(staff_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let staff = state
        .db
        .get_staff(staff_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Staff member not found")))?;
    Ok(Json(staff))
}

pub async fn create_staff(
    State(state): State<AppState>,
    Json(request): Json<CreateStaffRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let staff = state
        .db
        .create_staff(
            &request.name,
            request.email.as_deref(),
            request.phone.as_deref(),
            request.position.as_deref(),
            request.is_active,
            request.color_tag.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(staff)))
}

pub async fn update_staff(
    State(state): State<AppState>,
    Path(staff_id): Path<Uuid>,
    Json(request): Json<UpdateStaffRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let staff = state
        .db
        .update_staff(
            staff_id,
            request.name.as_deref(),
            request.email.as_deref(),
            request.phone.as_deref(),
            request.position.as_deref(),
            request.is_active,
            request.color_tag.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Staff member not found")))?;

    Ok(Json(staff))
}

pub async fn delete_staff(
    State(state): State<AppState>,
    Path(staff_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_staff(staff_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Staff member not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// A staff member's upcoming shifts plus the past 30 days.
pub async fn staff_shifts(
    State(state): State<AppState>,
    Path(staff_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let staff = state
        .db
        .get_staff(staff_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Staff member not found")))?;

    let now = Utc::now().naive_utc();
    let upcoming = state.db.upcoming_shifts(staff_id, now).await?;
    let past = state
        .db
        .past_shifts(staff_id, now - Duration::days(30), now)
        .await?;

    Ok(Json(StaffShiftsResponse {
        staff,
        upcoming,
        past,
    }))
}
