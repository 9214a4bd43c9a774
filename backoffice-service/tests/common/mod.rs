//! Common test utilities for backoffice-service integration tests.

use backoffice_service::config::{
    BackofficeConfig, CalendarConfig, DatabaseConfig, ImportConfig,
};
use backoffice_service::services::MockCalendarProvider;
use backoffice_service::startup::Application;
use ops_core::config::Config as CommonConfig;
use std::sync::Arc;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,backoffice_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn test_config(database_url: String) -> BackofficeConfig {
    BackofficeConfig {
        common: CommonConfig { port: 0 },
        service_name: "backoffice-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: database_url,
            max_connections: 2,
            min_connections: 1,
        },
        calendar: CalendarConfig::default(),
        import: ImportConfig {
            max_upload_bytes: 1024 * 1024,
        },
    }
}

/// Test application wrapper.
#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub calendar: Arc<MockCalendarProvider>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Spawn a test application against TEST_DATABASE_URL.
///
/// Returns None (and the test should bail out) when no test database is
/// configured, so the suite stays runnable without infrastructure.
pub async fn spawn_app() -> Option<TestApp> {
    init_tracing();

    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set - skipping integration test");
        return None;
    };

    let config = test_config(database_url);
    let calendar = Arc::new(MockCalendarProvider::new());

    let app = Application::build_with_provider(config, calendar.clone())
        .await
        .expect("Failed to build application");
    let port = app.port();

    // Start the application in the background
    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let address = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();

    // Wait for the server to answer health checks
    let mut attempts = 0;
    loop {
        match client.get(format!("{}/health", address)).send().await {
            Ok(_) => break,
            Err(_) if attempts < 20 => {
                attempts += 1;
                tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            }
            Err(e) => panic!("Server did not come up after 20 attempts: {}", e),
        }
    }

    Some(TestApp {
        address,
        port,
        client,
        calendar,
    })
}

/// Upload CSV content as a multipart sales file.
#[allow(dead_code)]
pub async fn upload_csv(app: &TestApp, file_name: &str, content: &str) -> reqwest::Response {
    let part = reqwest::multipart::Part::text(content.to_string())
        .file_name(file_name.to_string())
        .mime_str("text/csv")
        .expect("valid mime type");
    let form = reqwest::multipart::Form::new().part("file", part);

    app.client
        .post(app.url("/api/sales/upload"))
        .multipart(form)
        .send()
        .await
        .expect("upload request failed")
}
