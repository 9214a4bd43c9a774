use crate::dtos::staff::{
    OnDutyParams, OnDutyResponse, ShiftEvent, ShiftRequest, ShiftResponse, ShiftWindowParams,
};
use crate::models::{Shift, ShiftType, Staff, WEEKDAY_TOKENS};
use crate::services::calendar::{EventDetails, EventWindow};
use crate::services::metrics::CALENDAR_SYNC_TOTAL;
use crate::services::scheduler;
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, NaiveDate, Utc};
use ops_core::error::AppError;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn event_details(staff: &Staff, shift: &Shift) -> EventDetails {
    EventDetails {
        summary: format!(
            "{} - {} Shift",
            staff.name,
            capitalized(&shift.shift_type)
        ),
        location: shift.location.clone(),
        description: shift.notes.clone(),
        attendees: staff.email.iter().cloned().collect(),
    }
}

fn shift_window(shift: &Shift) -> EventWindow {
    EventWindow {
        start: shift.start_time,
        end: shift.end_time,
    }
}

/// Validate and join the recurring-day tokens for storage.
fn recurring_days_column(request: &ShiftRequest) -> Result<Option<String>, AppError> {
    if !request.is_recurring {
        return Ok(None);
    }
    for day in &request.recurring_days {
        if !WEEKDAY_TOKENS.contains(&day.as_str()) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unknown weekday token: {}",
                day
            )));
        }
    }
    Ok(Some(request.recurring_days.join(",")))
}

fn validate_window(request: &ShiftRequest) -> Result<(), AppError> {
    if !request.is_recurring && request.end_time <= request.start_time {
        return Err(AppError::Unprocessable(anyhow::anyhow!(
            "Shift end time must be after its start time"
        )));
    }
    Ok(())
}

/// Create a shift. The database write commits first; calendar sync is a
/// soft follow-up whose failure only adds a warning to the response.
pub async fn create_shift(
    State(state): State<AppState>,
    Json(request): Json<ShiftRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    validate_window(&request)?;
    let recurring_days = recurring_days_column(&request)?;

    let staff = state
        .db
        .get_staff(request.staff_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Staff member not found")))?;

    let mut shift = state
        .db
        .create_shift(
            request.staff_id,
            request.start_time,
            request.end_time,
            request.shift_type.as_str(),
            request.location.as_deref(),
            request.notes.as_deref(),
            request.is_recurring,
            recurring_days.as_deref(),
        )
        .await?;

    // Recurring templates have no single calendar date to map to an event.
    let mut calendar_warning = None;
    if !shift.is_recurring {
        match state
            .calendar
            .create_event(shift_window(&shift), &event_details(&staff, &shift))
            .await
        {
            Ok(event_id) => {
                state.db.set_shift_event_id(shift.shift_id, &event_id).await?;
                shift.google_event_id = Some(event_id);
                CALENDAR_SYNC_TOTAL
                    .with_label_values(&["create", "ok"])
                    .inc();
            }
            Err(e) => {
                tracing::warn!(shift_id = %shift.shift_id, error = %e, "Calendar sync failed");
                CALENDAR_SYNC_TOTAL
                    .with_label_values(&["create", "warning"])
                    .inc();
                calendar_warning = Some(format!(
                    "Shift saved, but calendar sync failed: {}",
                    e
                ));
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ShiftResponse {
            shift,
            calendar_warning,
        }),
    ))
}

pub async fn get_shift(
    State(state): State<AppState>,
    Path(shift_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let shift = state
        .db
        .get_shift(shift_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Shift not found")))?;
    Ok(Json(shift))
}

pub async fn update_shift(
    State(state): State<AppState>,
    Path(shift_id): Path<Uuid>,
    Json(request): Json<ShiftRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    validate_window(&request)?;
    let recurring_days = recurring_days_column(&request)?;

    let staff = state
        .db
        .get_staff(request.staff_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Staff member not found")))?;

    let shift = state
        .db
        .update_shift(
            shift_id,
            request.staff_id,
            request.start_time,
            request.end_time,
            request.shift_type.as_str(),
            request.location.as_deref(),
            request.notes.as_deref(),
            request.is_recurring,
            recurring_days.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Shift not found")))?;

    let mut calendar_warning = None;
    if let Some(event_id) = shift.google_event_id.clone() {
        match state
            .calendar
            .update_event(&event_id, shift_window(&shift), &event_details(&staff, &shift))
            .await
        {
            Ok(_) => {
                CALENDAR_SYNC_TOTAL
                    .with_label_values(&["update", "ok"])
                    .inc();
            }
            Err(e) => {
                tracing::warn!(shift_id = %shift.shift_id, error = %e, "Calendar sync failed");
                CALENDAR_SYNC_TOTAL
                    .with_label_values(&["update", "warning"])
                    .inc();
                calendar_warning = Some(format!(
                    "Shift updated, but calendar sync failed: {}",
                    e
                ));
            }
        }
    }

    Ok(Json(ShiftResponse {
        shift,
        calendar_warning,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteShiftResponse {
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_warning: Option<String>,
}

pub async fn delete_shift(
    State(state): State<AppState>,
    Path(shift_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let shift = state
        .db
        .get_shift(shift_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Shift not found")))?;

    let mut calendar_warning = None;
    if let Some(event_id) = &shift.google_event_id {
        match state.calendar.delete_event(event_id).await {
            Ok(_) => {
                CALENDAR_SYNC_TOTAL
                    .with_label_values(&["delete", "ok"])
                    .inc();
            }
            Err(e) => {
                tracing::warn!(shift_id = %shift_id, error = %e, "Could not delete calendar event");
                CALENDAR_SYNC_TOTAL
                    .with_label_values(&["delete", "warning"])
                    .inc();
                calendar_warning = Some(format!("Could not delete calendar event: {}", e));
            }
        }
    }

    state.db.delete_shift(shift_id).await?;

    Ok(Json(DeleteShiftResponse {
        deleted: true,
        calendar_warning,
    }))
}

/// Shifts inside a window, shaped as calendar events for the schedule UI.
pub async fn list_shift_events(
    State(state): State<AppState>,
    Query(params): Query<ShiftWindowParams>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    let start = params.start.unwrap_or(today);
    let end = params.end.unwrap_or(today + Duration::days(30));

    let shifts = state
        .db
        .shifts_between(
            start.and_time(chrono::NaiveTime::MIN),
            end.and_hms_opt(23, 59, 59)
                .expect("23:59:59 is a valid time of day"),
        )
        .await?;

    let staff = state.db.list_staff(false).await?;
    let names: HashMap<Uuid, &str> = staff
        .iter()
        .map(|s| (s.staff_id, s.name.as_str()))
        .collect();

    let events: Vec<ShiftEvent> = shifts
        .iter()
        .map(|shift| {
            let shift_type = ShiftType::from_string(&shift.shift_type);
            ShiftEvent {
                id: shift.shift_id,
                title: format!(
                    "{} - {}",
                    names.get(&shift.staff_id).copied().unwrap_or("Unknown"),
                    capitalized(&shift.shift_type)
                ),
                start: shift.start_time,
                end: shift.end_time,
                color: shift_type.color(),
                staff_id: shift.staff_id,
                location: shift.location.clone(),
                is_recurring: shift.is_recurring,
            }
        })
        .collect();

    Ok(Json(events))
}

/// Who is on duty for a given date, merging one-off and recurring shifts.
pub async fn on_duty(
    State(state): State<AppState>,
    Query(params): Query<OnDutyParams>,
) -> Result<impl IntoResponse, AppError> {
    let shifts = state.db.list_shifts().await?;
    let staff = state.db.list_staff(false).await?;

    let staff_ids: Vec<Uuid> = scheduler::staff_on_duty(params.date, &shifts)
        .into_iter()
        .collect();
    let roster = scheduler::on_duty_roster(params.date, &shifts, &staff);

    Ok(Json(OnDutyResponse {
        date: params.date,
        staff_ids,
        staff: roster,
    }))
}

#[derive(Debug, Serialize)]
pub struct CalendarEventsResponse {
    pub events: Vec<crate::services::calendar::CalendarEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Events from the external calendar for a window. Calendar failures
/// degrade to an empty list with a warning rather than an error.
pub async fn calendar_events(
    State(state): State<AppState>,
    Query(params): Query<ShiftWindowParams>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    let start: NaiveDate = params.start.unwrap_or(today);
    let end: NaiveDate = params.end.unwrap_or(today + Duration::days(30));

    let window = EventWindow {
        start: start.and_time(chrono::NaiveTime::MIN),
        end: end
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 is a valid time of day"),
    };

    match state.calendar.list_events(window).await {
        Ok(events) => Ok(Json(CalendarEventsResponse {
            events,
            warning: None,
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Could not list calendar events");
            Ok(Json(CalendarEventsResponse {
                events: Vec::new(),
                warning: Some(e.to_string()),
            }))
        }
    }
}
