//! Integration tests for the duty scheduler endpoint.

mod common;

use common::{TestApp, spawn_app};
use serde_json::{Value, json};

async fn create_staff(app: &TestApp, name: &str) -> String {
    let staff: Value = app
        .client
        .post(app.url("/api/staff"))
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    staff["staff_id"].as_str().unwrap().to_string()
}

async fn on_duty_ids(app: &TestApp, date: &str) -> Vec<String> {
    let response: Value = app
        .client
        .get(app.url(&format!("/api/schedule/on-duty?date={}", date)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    response["staff_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn one_off_shift_puts_staff_on_duty_for_that_date_only() {
    let Some(app) = spawn_app().await else { return };
    let alice = create_staff(&app, "Alice OneOff").await;

    let response = app
        .client
        .post(app.url("/api/shifts"))
        .json(&json!({
            "staff_id": alice,
            "start_time": "2030-06-10T08:00:00",
            "end_time": "2030-06-10T16:00:00",
            "shift_type": "opening"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    assert!(on_duty_ids(&app, "2030-06-10").await.contains(&alice));
    assert!(!on_duty_ids(&app, "2030-06-11").await.contains(&alice));
}

#[tokio::test]
async fn recurring_shift_matches_its_weekdays_indefinitely() {
    let Some(app) = spawn_app().await else { return };
    let bella = create_staff(&app, "Bella Recurring").await;

    // Template window in 2021; the pattern alone drives scheduling.
    let response = app
        .client
        .post(app.url("/api/shifts"))
        .json(&json!({
            "staff_id": bella,
            "start_time": "2021-01-04T08:00:00",
            "end_time": "2021-01-04T16:00:00",
            "shift_type": "midday",
            "is_recurring": true,
            "recurring_days": ["Mon", "Wed"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // 2030-06-10 is a Monday, 2030-06-12 a Wednesday, 2030-06-11 a Tuesday.
    assert!(on_duty_ids(&app, "2030-06-10").await.contains(&bella));
    assert!(on_duty_ids(&app, "2030-06-12").await.contains(&bella));
    assert!(!on_duty_ids(&app, "2030-06-11").await.contains(&bella));
}

#[tokio::test]
async fn staff_with_both_shift_kinds_appears_once() {
    let Some(app) = spawn_app().await else { return };
    let cam = create_staff(&app, "Cam Both").await;

    for body in [
        json!({
            "staff_id": cam,
            "start_time": "2030-06-10T08:00:00",
            "end_time": "2030-06-10T16:00:00"
        }),
        json!({
            "staff_id": cam,
            "start_time": "2021-01-04T08:00:00",
            "end_time": "2021-01-04T16:00:00",
            "is_recurring": true,
            "recurring_days": ["Mon"]
        }),
    ] {
        let response = app
            .client
            .post(app.url("/api/shifts"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let ids = on_duty_ids(&app, "2030-06-10").await;
    assert_eq!(ids.iter().filter(|id| **id == cam).count(), 1);
}

#[tokio::test]
async fn unknown_weekday_token_is_rejected() {
    let Some(app) = spawn_app().await else { return };
    let dana = create_staff(&app, "Dana Tokens").await;

    let response = app
        .client
        .post(app.url("/api/shifts"))
        .json(&json!({
            "staff_id": dana,
            "start_time": "2021-01-04T08:00:00",
            "end_time": "2021-01-04T16:00:00",
            "is_recurring": true,
            "recurring_days": ["Funday"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
