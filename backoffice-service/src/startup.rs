//! Application startup and lifecycle management.

use crate::config::BackofficeConfig;
use crate::handlers::{categories, health, inventory, reports, sales, shifts, staff, vendors};
use crate::services::calendar::{CalendarProvider, GoogleCalendarProvider};
use crate::services::{Database, init_metrics};
use axum::extract::DefaultBodyLimit;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use ops_core::error::AppError;
use ops_core::middleware::metrics::metrics_middleware;
use ops_core::middleware::tracing::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: BackofficeConfig,
    pub db: Arc<Database>,
    pub calendar: Arc<dyn CalendarProvider>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: BackofficeConfig) -> Result<Self, AppError> {
        let calendar: Arc<dyn CalendarProvider> = Arc::new(GoogleCalendarProvider::new(
            config.calendar.credentials(),
        ));
        Self::build_internal(config, calendar, true).await
    }

    /// Build the application without running migrations.
    /// Use this when migrations are already applied by the environment.
    pub async fn build_without_migrations(config: BackofficeConfig) -> Result<Self, AppError> {
        let calendar: Arc<dyn CalendarProvider> = Arc::new(GoogleCalendarProvider::new(
            config.calendar.credentials(),
        ));
        Self::build_internal(config, calendar, false).await
    }

    /// Build with an explicit calendar provider (tests use a mock).
    pub async fn build_with_provider(
        config: BackofficeConfig,
        calendar: Arc<dyn CalendarProvider>,
    ) -> Result<Self, AppError> {
        Self::build_internal(config, calendar, true).await
    }

    async fn build_internal(
        config: BackofficeConfig,
        calendar: Arc<dyn CalendarProvider>,
        run_migrations: bool,
    ) -> Result<Self, AppError> {
        // Initialize metrics
        init_metrics();

        // Connect to database
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let state = AppState {
            config: config.clone(),
            db: Arc::new(db),
            calendar,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Backoffice service listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state.clone());

        tracing::info!(
            service = "backoffice-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}

/// Build the HTTP router with all application routes.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.import.max_upload_bytes + 4096;

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_handler))
        .route("/api/dashboard", get(inventory::dashboard))
        .route("/api/alerts", get(inventory::low_stock_alerts))
        .route(
            "/api/products",
            get(inventory::list_products).post(inventory::create_product),
        )
        .route(
            "/api/products/:id",
            get(inventory::get_product)
                .put(inventory::update_product)
                .delete(inventory::delete_product),
        )
        .route(
            "/api/inventory/transactions",
            get(inventory::recent_transactions).post(inventory::create_transaction),
        )
        .route(
            "/api/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/categories/:id",
            axum::routing::put(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/api/vendors",
            get(vendors::list_vendors).post(vendors::create_vendor),
        )
        .route(
            "/api/vendors/:id",
            axum::routing::put(vendors::update_vendor).delete(vendors::delete_vendor),
        )
        .route("/api/sales/upload", post(sales::upload_sales))
        .route("/api/sales", get(sales::list_sales))
        .route(
            "/api/sales/:id",
            get(sales::sale_detail).delete(sales::delete_sale),
        )
        .route("/api/revenue/summary", get(sales::revenue_summary))
        .route("/api/reports/low-stock", get(reports::low_stock_report))
        .route(
            "/api/reports/low-stock/export",
            get(reports::export_low_stock_report),
        )
        .route(
            "/api/reports/inventory-value",
            get(reports::inventory_value_report),
        )
        .route(
            "/api/reports/inventory-value/export",
            get(reports::export_inventory_value_report),
        )
        .route(
            "/api/reports/transactions",
            get(reports::transaction_report),
        )
        .route(
            "/api/reports/transactions/export",
            get(reports::export_transaction_report),
        )
        .route("/api/reports/sales", get(reports::sales_report))
        .route(
            "/api/reports/sales/export",
            get(reports::export_sales_report),
        )
        .route(
            "/api/staff",
            get(staff::list_staff).post(staff::create_staff),
        )
        .route(
            "/api/staff/:id",
            get(staff::get_staff)
                .put(staff::update_staff)
                .delete(staff::delete_staff),
        )
        .route("/api/staff/:id/shifts", get(staff::staff_shifts))
        .route(
            "/api/shifts",
            get(shifts::list_shift_events).post(shifts::create_shift),
        )
        .route("/api/shifts/calendar", get(shifts::calendar_events))
        .route(
            "/api/shifts/:id",
            get(shifts::get_shift)
                .put(shifts::update_shift)
                .delete(shifts::delete_shift),
        )
        .route("/api/schedule/on-duty", get(shifts::on_duty))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
