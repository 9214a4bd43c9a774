//! Staff roster and shift models.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Three-letter weekday tokens used in recurring shift patterns.
pub const WEEKDAY_TOKENS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Weekday token for a calendar date, in the fixed {Sun..Sat} set.
pub fn weekday_token(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Staff {
    pub staff_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub is_active: bool,
    pub color_tag: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Shift kind, used for display color-coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Opening,
    Midday,
    Closing,
    Special,
}

impl ShiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Opening => "opening",
            ShiftType::Midday => "midday",
            ShiftType::Closing => "closing",
            ShiftType::Special => "special",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "midday" => ShiftType::Midday,
            "closing" => ShiftType::Closing,
            "special" => ShiftType::Special,
            _ => ShiftType::Opening,
        }
    }

    /// Calendar display color for this shift type.
    pub fn color(&self) -> &'static str {
        match self {
            ShiftType::Opening => "#28a745",
            ShiftType::Midday => "#17a2b8",
            ShiftType::Closing => "#6f42c1",
            ShiftType::Special => "#fd7e14",
        }
    }
}

/// A scheduled shift. Non-recurring shifts occupy a concrete calendar
/// window; recurring shifts store a template window plus the weekdays it
/// repeats on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shift {
    pub shift_id: Uuid,
    pub staff_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub shift_type: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurring_days: Option<String>,
    pub google_event_id: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl Shift {
    /// Parsed weekday tokens of a recurring shift. Unknown tokens are
    /// dropped; non-recurring shifts yield an empty set.
    pub fn recurring_day_set(&self) -> BTreeSet<&str> {
        if !self.is_recurring {
            return BTreeSet::new();
        }
        self.recurring_days
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|day| WEEKDAY_TOKENS.contains(day))
            .collect()
    }
}
