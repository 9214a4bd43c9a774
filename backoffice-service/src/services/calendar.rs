//! Google Calendar collaborator.
//!
//! Every caller treats calendar failures as soft: the database write has
//! already committed by the time sync runs, so errors surface as warnings on
//! the response, never as a failure of the primary operation.

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;

const GOOGLE_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar authorization required: {0}")]
    AuthorizationRequired(String),

    #[error("calendar service error: {0}")]
    Service(String),
}

/// OAuth credential material for the calendar account.
///
/// Owned by the provider instance; there is no process-wide token state.
#[derive(Debug, Clone)]
pub struct CalendarCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Time window of a calendar event, in naive local time.
#[derive(Debug, Clone, Copy)]
pub struct EventWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Descriptive fields of an event.
#[derive(Debug, Clone, Default)]
pub struct EventDetails {
    pub summary: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    pub event_id: String,
    pub summary: String,
    pub start: String,
    pub end: String,
    pub location: Option<String>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn create_event(
        &self,
        window: EventWindow,
        details: &EventDetails,
    ) -> Result<String, CalendarError>;

    async fn update_event(
        &self,
        event_id: &str,
        window: EventWindow,
        details: &EventDetails,
    ) -> Result<CalendarEvent, CalendarError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError>;

    async fn list_events(&self, window: EventWindow) -> Result<Vec<CalendarEvent>, CalendarError>;
}

struct CachedToken {
    access_token: String,
    expires_at: chrono::DateTime<Utc>,
}

/// Calendar provider backed by the Google Calendar v3 API.
pub struct GoogleCalendarProvider {
    client: reqwest::Client,
    credentials: Option<CalendarCredentials>,
    api_base: String,
    token_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleCalendarProvider {
    pub fn new(credentials: Option<CalendarCredentials>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            api_base: GOOGLE_API_BASE.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            token: Mutex::new(None),
        }
    }

    /// Get a valid access token, refreshing through the OAuth token endpoint
    /// when the cached one is missing or about to expire.
    async fn access_token(&self) -> Result<String, CalendarError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            CalendarError::AuthorizationRequired("calendar credentials not configured".to_string())
        })?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(30) {
                return Ok(token.access_token.clone());
            }
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| CalendarError::Service(format!("token request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST
            || response.status() == reqwest::StatusCode::UNAUTHORIZED
        {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::AuthorizationRequired(format!(
                "token refresh rejected: {body}"
            )));
        }
        if !response.status().is_success() {
            return Err(CalendarError::Service(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Service(format!("bad token response: {e}")))?;

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });

        Ok(access_token)
    }

    fn event_body(window: EventWindow, details: &EventDetails) -> serde_json::Value {
        let mut event = json!({
            "summary": details.summary,
            "start": { "dateTime": window.start.format("%Y-%m-%dT%H:%M:%S").to_string(), "timeZone": "UTC" },
            "end": { "dateTime": window.end.format("%Y-%m-%dT%H:%M:%S").to_string(), "timeZone": "UTC" },
        });
        if let Some(location) = &details.location {
            event["location"] = json!(location);
        }
        if let Some(description) = &details.description {
            event["description"] = json!(description);
        }
        if !details.attendees.is_empty() {
            event["attendees"] = details
                .attendees
                .iter()
                .map(|email| json!({ "email": email }))
                .collect::<serde_json::Value>();
        }
        event
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CalendarError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CalendarError::AuthorizationRequired(format!(
                "calendar API returned {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Service(format!(
                "calendar API returned {status}: {body}"
            )));
        }
        Ok(response)
    }
}

#[derive(Debug, Deserialize)]
struct GoogleEventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

impl GoogleEventTime {
    fn into_text(self) -> String {
        self.date_time.or(self.date).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    start: Option<GoogleEventTime>,
    end: Option<GoogleEventTime>,
    location: Option<String>,
}

impl From<GoogleEvent> for CalendarEvent {
    fn from(event: GoogleEvent) -> Self {
        Self {
            event_id: event.id,
            summary: event.summary.unwrap_or_default(),
            start: event.start.map(GoogleEventTime::into_text).unwrap_or_default(),
            end: event.end.map(GoogleEventTime::into_text).unwrap_or_default(),
            location: event.location,
        }
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    async fn create_event(
        &self,
        window: EventWindow,
        details: &EventDetails,
    ) -> Result<String, CalendarError> {
        let token = self.access_token().await?;
        let url = format!("{}/calendars/primary/events", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&Self::event_body(window, details))
            .send()
            .await
            .map_err(|e| CalendarError::Service(format!("create event failed: {e}")))?;

        let response = Self::check_status(response).await?;
        let event: GoogleEvent = response
            .json()
            .await
            .map_err(|e| CalendarError::Service(format!("bad create response: {e}")))?;

        tracing::info!(event_id = %event.id, "Calendar event created");
        Ok(event.id)
    }

    async fn update_event(
        &self,
        event_id: &str,
        window: EventWindow,
        details: &EventDetails,
    ) -> Result<CalendarEvent, CalendarError> {
        let token = self.access_token().await?;
        let url = format!("{}/calendars/primary/events/{}", self.api_base, event_id);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .json(&Self::event_body(window, details))
            .send()
            .await
            .map_err(|e| CalendarError::Service(format!("update event failed: {e}")))?;

        let response = Self::check_status(response).await?;
        let event: GoogleEvent = response
            .json()
            .await
            .map_err(|e| CalendarError::Service(format!("bad update response: {e}")))?;

        tracing::info!(event_id = %event.id, "Calendar event updated");
        Ok(event.into())
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        let token = self.access_token().await?;
        let url = format!("{}/calendars/primary/events/{}", self.api_base, event_id);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CalendarError::Service(format!("delete event failed: {e}")))?;

        // Deleting an already-deleted event is a success on retry.
        if response.status() == reqwest::StatusCode::NOT_FOUND
            || response.status() == reqwest::StatusCode::GONE
        {
            return Ok(());
        }

        Self::check_status(response).await?;
        tracing::info!(event_id = %event_id, "Calendar event deleted");
        Ok(())
    }

    async fn list_events(&self, window: EventWindow) -> Result<Vec<CalendarEvent>, CalendarError> {
        let token = self.access_token().await?;
        let url = format!("{}/calendars/primary/events", self.api_base);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                (
                    "timeMin",
                    format!("{}Z", window.start.format("%Y-%m-%dT%H:%M:%S")),
                ),
                (
                    "timeMax",
                    format!("{}Z", window.end.format("%Y-%m-%dT%H:%M:%S")),
                ),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", "100".to_string()),
            ])
            .send()
            .await
            .map_err(|e| CalendarError::Service(format!("list events failed: {e}")))?;

        #[derive(Deserialize)]
        struct EventList {
            #[serde(default)]
            items: Vec<GoogleEvent>,
        }

        let response = Self::check_status(response).await?;
        let list: EventList = response
            .json()
            .await
            .map_err(|e| CalendarError::Service(format!("bad list response: {e}")))?;

        Ok(list.items.into_iter().map(CalendarEvent::from).collect())
    }
}

/// In-memory provider for tests and credential-less dev runs.
#[derive(Default)]
pub struct MockCalendarProvider {
    counter: AtomicU64,
    events: StdMutex<HashMap<String, CalendarEvent>>,
}

impl MockCalendarProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().expect("mock events lock").len()
    }
}

#[async_trait]
impl CalendarProvider for MockCalendarProvider {
    async fn create_event(
        &self,
        window: EventWindow,
        details: &EventDetails,
    ) -> Result<String, CalendarError> {
        let event_id = format!("mock-event-{}", self.counter.fetch_add(1, Ordering::SeqCst));
        let event = CalendarEvent {
            event_id: event_id.clone(),
            summary: details.summary.clone(),
            start: window.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            end: window.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
            location: details.location.clone(),
        };
        self.events
            .lock()
            .expect("mock events lock")
            .insert(event_id.clone(), event);
        Ok(event_id)
    }

    async fn update_event(
        &self,
        event_id: &str,
        window: EventWindow,
        details: &EventDetails,
    ) -> Result<CalendarEvent, CalendarError> {
        let mut events = self.events.lock().expect("mock events lock");
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| CalendarError::Service(format!("no such event: {event_id}")))?;
        event.summary = details.summary.clone();
        event.start = window.start.format("%Y-%m-%dT%H:%M:%S").to_string();
        event.end = window.end.format("%Y-%m-%dT%H:%M:%S").to_string();
        event.location = details.location.clone();
        Ok(event.clone())
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        self.events
            .lock()
            .expect("mock events lock")
            .remove(event_id);
        Ok(())
    }

    async fn list_events(&self, window: EventWindow) -> Result<Vec<CalendarEvent>, CalendarError> {
        let start = window.start.format("%Y-%m-%dT%H:%M:%S").to_string();
        let end = window.end.format("%Y-%m-%dT%H:%M:%S").to_string();
        let events = self.events.lock().expect("mock events lock");
        Ok(events
            .values()
            .filter(|e| e.start.as_str() >= start.as_str() && e.start.as_str() <= end.as_str())
            .cloned()
            .collect())
    }
}
