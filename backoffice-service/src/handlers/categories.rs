use crate::dtos::inventory::{CategoryRequest, UpdateCategoryRequest};
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

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = state.db.list_categories().await?;
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let category = state
        .db
        .create_category(&request.name, request.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let category = state
        .db
        .update_category(
            category_id,
            request.name.as_deref(),
            request.description.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_category(category_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Category not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
