//! Integration tests for staff management and calendar sync behavior.

mod common;

use common::{TestApp, spawn_app};
use serde_json::{Value, json};

async fn create_staff(app: &TestApp, name: &str, email: Option<&str>) -> Value {
    app.client
        .post(app.url("/api/staff"))
        .json(&json!({ "name": name, "email": email }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn shift_create_syncs_to_the_calendar_and_stores_the_event_id() {
    let Some(app) = spawn_app().await else { return };
    let staff = create_staff(&app, "Eve Calendar", Some("eve@example.com")).await;

    let response: Value = app
        .client
        .post(app.url("/api/shifts"))
        .json(&json!({
            "staff_id": staff["staff_id"],
            "start_time": "2030-07-01T08:00:00",
            "end_time": "2030-07-01T16:00:00",
            "shift_type": "opening",
            "location": "Front counter"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let event_id = response["shift"]["google_event_id"]
        .as_str()
        .expect("event id stored on the shift");
    assert!(event_id.starts_with("mock-event-"));
    assert!(response.get("calendar_warning").is_none());
    assert_eq!(app.calendar.event_count(), 1);

    // Deleting the shift removes the calendar event too.
    let shift_id = response["shift"]["shift_id"].as_str().unwrap();
    let delete: Value = app
        .client
        .delete(app.url(&format!("/api/shifts/{}", shift_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(delete["deleted"], true);
    assert_eq!(app.calendar.event_count(), 0);
}

#[tokio::test]
async fn recurring_shift_skips_calendar_sync() {
    let Some(app) = spawn_app().await else { return };
    let staff = create_staff(&app, "Finn Recurring", None).await;

    let response: Value = app
        .client
        .post(app.url("/api/shifts"))
        .json(&json!({
            "staff_id": staff["staff_id"],
            "start_time": "2021-01-04T08:00:00",
            "end_time": "2021-01-04T16:00:00",
            "is_recurring": true,
            "recurring_days": ["Tue"]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(response["shift"]["google_event_id"].is_null());
    assert_eq!(app.calendar.event_count(), 0);
}

#[tokio::test]
async fn shift_window_must_be_ordered() {
    let Some(app) = spawn_app().await else { return };
    let staff = create_staff(&app, "Gil Window", None).await;

    let response = app
        .client
        .post(app.url("/api/shifts"))
        .json(&json!({
            "staff_id": staff["staff_id"],
            "start_time": "2030-07-01T16:00:00",
            "end_time": "2030-07-01T08:00:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn staff_with_shifts_cannot_be_deleted() {
    let Some(app) = spawn_app().await else { return };
    let staff = create_staff(&app, "Hana Guarded", None).await;
    let staff_id = staff["staff_id"].as_str().unwrap();

    let created = app
        .client
        .post(app.url("/api/shifts"))
        .json(&json!({
            "staff_id": staff_id,
            "start_time": "2030-07-02T08:00:00",
            "end_time": "2030-07-02T16:00:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);

    let response = app
        .client
        .delete(app.url(&format!("/api/staff/{}", staff_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn staff_shift_history_splits_upcoming_and_past() {
    let Some(app) = spawn_app().await else { return };
    let staff = create_staff(&app, "Iris History", None).await;
    let staff_id = staff["staff_id"].as_str().unwrap();

    let created = app
        .client
        .post(app.url("/api/shifts"))
        .json(&json!({
            "staff_id": staff_id,
            "start_time": "2030-07-03T08:00:00",
            "end_time": "2030-07-03T16:00:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);

    let history: Value = app
        .client
        .get(app.url(&format!("/api/staff/{}/shifts", staff_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(history["upcoming"].as_array().unwrap().len(), 1);
    assert!(history["past"].as_array().unwrap().is_empty());
}
