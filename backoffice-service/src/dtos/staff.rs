use crate::models::{Shift, ShiftType, Staff};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct StaffListParams {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[validate(length(max = 20))]
    pub color_tag: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateStaffRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub position: Option<String>,
    pub is_active: Option<bool>,
    #[validate(length(max = 20))]
    pub color_tag: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShiftRequest {
    pub staff_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default = "default_shift_type")]
    pub shift_type: ShiftType,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    /// Weekday tokens (Sun..Sat); meaningful only for recurring shifts.
    #[serde(default)]
    pub recurring_days: Vec<String>,
}

fn default_shift_type() -> ShiftType {
    ShiftType::Opening
}

/// Shift response carrying the calendar sync outcome. A warning means the
/// database write succeeded but the calendar call did not.
#[derive(Debug, Serialize)]
pub struct ShiftResponse {
    pub shift: Shift,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_warning: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShiftWindowParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Calendar-shaped shift entry for the schedule UI.
#[derive(Debug, Serialize)]
pub struct ShiftEvent {
    pub id: Uuid,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: &'static str,
    pub staff_id: Uuid,
    pub location: Option<String>,
    pub is_recurring: bool,
}

#[derive(Debug, Deserialize)]
pub struct OnDutyParams {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct OnDutyResponse {
    pub date: NaiveDate,
    pub staff_ids: Vec<Uuid>,
    pub staff: Vec<Staff>,
}

#[derive(Debug, Serialize)]
pub struct StaffShiftsResponse {
    pub staff: Staff,
    pub upcoming: Vec<Shift>,
    pub past: Vec<Shift>,
}
