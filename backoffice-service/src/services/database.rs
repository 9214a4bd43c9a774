//! Database service for backoffice-service.

#![allow(clippy::too_many_arguments)]

use crate::models::{
    Category, InventoryTransaction, Product, Sale, SaleItem, Shift, Staff, TransactionType, Vendor,
};
use crate::services::importer::{ImportSummary, OrderDraft};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{NaiveDate, NaiveDateTime};
use ops_core::error::AppError;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Revenue for one calendar day.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyRevenue {
    pub day: NaiveDate,
    pub revenue: Decimal,
}

/// Item-level sales ranking entry, grouped by the raw product name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_name: String,
    pub total_quantity: Decimal,
    pub total_revenue: Decimal,
}

/// Revenue per payment type.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PaymentBreakdown {
    pub payment_type: String,
    pub amount: Decimal,
}

/// Products per category, for the dashboard distribution.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryProductCount {
    pub name: String,
    pub product_count: i64,
}

/// Low-stock report row with vendor/category names resolved.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockRow {
    pub name: String,
    pub sku: Option<String>,
    pub quantity: Decimal,
    pub min_quantity: Decimal,
    pub unit: String,
    pub price: Decimal,
    pub vendor_name: Option<String>,
    pub category_name: Option<String>,
}

/// Inventory value report row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryValueRow {
    pub name: String,
    pub sku: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub price: Decimal,
    pub total_value: Decimal,
    pub vendor_name: Option<String>,
    pub category_name: Option<String>,
}

/// Transaction report row with the product resolved.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TransactionReportRow {
    pub transaction_date: NaiveDateTime,
    pub product_name: String,
    pub sku: Option<String>,
    pub transaction_type: String,
    pub quantity: Decimal,
    pub unit: String,
    pub notes: Option<String>,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "backoffice-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Category Operations
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_categories"])
            .start_timer();

        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT category_id, name, description, created_utc
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list categories: {}", e)))?;

        timer.observe_duration();
        Ok(categories)
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_category"])
            .start_timer();

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (category_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING category_id, name, description, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Category '{}' already exists", name))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create category: {}", e)),
        })?;

        timer.observe_duration();
        info!(category_id = %category.category_id, "Category created");

        Ok(category)
    }

    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_category"])
            .start_timer();

        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE category_id = $1
            RETURNING category_id, name, description, created_utc
            "#,
        )
        .bind(category_id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update category: {}", e)))?;

        timer.observe_duration();
        Ok(category)
    }

    /// Delete a category. Fails with a conflict while products reference it.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_category"])
            .start_timer();

        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check category: {}", e)))?;

        if in_use > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Cannot delete category: {} product(s) reference it",
                in_use
            )));
        }

        let result = sqlx::query("DELETE FROM categories WHERE category_id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete category: {}", e)))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Vendor Operations
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_vendors(&self) -> Result<Vec<Vendor>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_vendors"])
            .start_timer();

        let vendors = sqlx::query_as::<_, Vendor>(
            r#"
            SELECT vendor_id, name, contact_name, email, phone, address, notes, created_utc
            FROM vendors
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list vendors: {}", e)))?;

        timer.observe_duration();
        Ok(vendors)
    }

    #[instrument(skip(self))]
    pub async fn create_vendor(
        &self,
        name: &str,
        contact_name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Vendor, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_vendor"])
            .start_timer();

        let vendor = sqlx::query_as::<_, Vendor>(
            r#"
            INSERT INTO vendors (vendor_id, name, contact_name, email, phone, address, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING vendor_id, name, contact_name, email, phone, address, notes, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(contact_name)
        .bind(email)
        .bind(phone)
        .bind(address)
        .bind(notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create vendor: {}", e)))?;

        timer.observe_duration();
        info!(vendor_id = %vendor.vendor_id, "Vendor created");

        Ok(vendor)
    }

    #[instrument(skip(self), fields(vendor_id = %vendor_id))]
    pub async fn update_vendor(
        &self,
        vendor_id: Uuid,
        name: Option<&str>,
        contact_name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Option<Vendor>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_vendor"])
            .start_timer();

        let vendor = sqlx::query_as::<_, Vendor>(
            r#"
            UPDATE vendors
            SET name = COALESCE($2, name),
                contact_name = COALESCE($3, contact_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                notes = COALESCE($7, notes)
            WHERE vendor_id = $1
            RETURNING vendor_id, name, contact_name, email, phone, address, notes, created_utc
            "#,
        )
        .bind(vendor_id)
        .bind(name)
        .bind(contact_name)
        .bind(email)
        .bind(phone)
        .bind(address)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update vendor: {}", e)))?;

        timer.observe_duration();
        Ok(vendor)
    }

    /// Delete a vendor. Fails with a conflict while products reference it.
    #[instrument(skip(self), fields(vendor_id = %vendor_id))]
    pub async fn delete_vendor(&self, vendor_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_vendor"])
            .start_timer();

        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE vendor_id = $1")
            .bind(vendor_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check vendor: {}", e)))?;

        if in_use > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Cannot delete vendor: {} product(s) reference it",
                in_use
            )));
        }

        let result = sqlx::query("DELETE FROM vendors WHERE vendor_id = $1")
            .bind(vendor_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete vendor: {}", e)))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Product Operations
    // =========================================================================

    const PRODUCT_COLUMNS: &'static str = "product_id, name, sku, description, unit, quantity, \
         min_quantity, price, category_id, vendor_id, created_utc, updated_utc";

    /// List products with optional name/SKU search and whitelisted sorting.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        search: Option<&str>,
        sort_by: &str,
        sort_order: &str,
    ) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let column = match sort_by {
            "quantity" => "quantity",
            "price" => "price",
            "created_utc" => "created_utc",
            _ => "name",
        };
        let direction = if sort_order == "desc" { "DESC" } else { "ASC" };

        let products = if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            sqlx::query_as::<_, Product>(&format!(
                "SELECT {} FROM products WHERE name ILIKE $1 OR sku ILIKE $1 ORDER BY {} {}",
                Self::PRODUCT_COLUMNS,
                column,
                direction
            ))
            .bind(pattern)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Product>(&format!(
                "SELECT {} FROM products ORDER BY {} {}",
                Self::PRODUCT_COLUMNS,
                column,
                direction
            ))
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();
        Ok(products)
    }

    /// The full catalog ordered by name, as handed to the importer.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Vec<Product>, AppError> {
        self.list_products(None, "name", "asc").await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE product_id = $1",
            Self::PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();
        Ok(product)
    }

    /// Create a product; a positive initial quantity records an adjustment
    /// transaction alongside it.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: &crate::models::CreateProduct,
    ) -> Result<Product, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_product"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (product_id, name, sku, description, unit, quantity, min_quantity, price, category_id, vendor_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            Self::PRODUCT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.description)
        .bind(&input.unit)
        .bind(input.quantity)
        .bind(input.min_quantity)
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.vendor_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("A product with this SKU already exists"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create product: {}", e)),
        })?;

        if input.quantity > Decimal::ZERO {
            sqlx::query(
                r#"
                INSERT INTO inventory_transactions (transaction_id, product_id, transaction_type, quantity, notes, transaction_date)
                VALUES ($1, $2, $3, $4, $5, NOW())
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(product.product_id)
            .bind(TransactionType::Adjustment.as_str())
            .bind(input.quantity)
            .bind(format!("Initial inventory for {}", product.name))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to record initial stock: {}", e))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        timer.observe_duration();
        info!(product_id = %product.product_id, "Product created");

        Ok(product)
    }

    /// Update a product. A quantity change records an adjustment transaction
    /// with the delta in the same transaction.
    #[instrument(skip(self, input), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: &crate::models::UpdateProduct,
    ) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_product"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        let old_quantity: Option<Decimal> =
            sqlx::query_scalar("SELECT quantity FROM products WHERE product_id = $1 FOR UPDATE")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to read product: {}", e))
                })?;

        let Some(old_quantity) = old_quantity else {
            return Ok(None);
        };

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                sku = COALESCE($3, sku),
                description = COALESCE($4, description),
                unit = COALESCE($5, unit),
                quantity = COALESCE($6, quantity),
                min_quantity = COALESCE($7, min_quantity),
                price = COALESCE($8, price),
                category_id = COALESCE($9, category_id),
                vendor_id = COALESCE($10, vendor_id),
                updated_utc = NOW()
            WHERE product_id = $1
            RETURNING {}
            "#,
            Self::PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.description)
        .bind(&input.unit)
        .bind(input.quantity)
        .bind(input.min_quantity)
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.vendor_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update product: {}", e)))?;

        if let Some(new_quantity) = input.quantity {
            if new_quantity != old_quantity {
                sqlx::query(
                    r#"
                    INSERT INTO inventory_transactions (transaction_id, product_id, transaction_type, quantity, notes, transaction_date)
                    VALUES ($1, $2, $3, $4, $5, NOW())
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(product_id)
                .bind(TransactionType::Adjustment.as_str())
                .bind(new_quantity - old_quantity)
                .bind(format!("Manual adjustment: {} -> {}", old_quantity, new_quantity))
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to record adjustment: {}", e))
                })?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        timer.observe_duration();
        Ok(Some(product))
    }

    /// Delete a product and its transaction history.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_product"])
            .start_timer();

        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete product: {}", e)))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }

    /// Products at or below their low-stock threshold.
    #[instrument(skip(self))]
    pub async fn low_stock_products(&self) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["low_stock_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE quantity <= min_quantity ORDER BY name",
            Self::PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list low-stock products: {}", e))
        })?;

        timer.observe_duration();
        Ok(products)
    }

    // =========================================================================
    // Inventory Transaction Operations
    // =========================================================================

    /// Record a stock movement and apply its effect to the product:
    /// purchases add, usage subtracts (never below zero), adjustments set the
    /// absolute quantity.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create_transaction(
        &self,
        input: &crate::models::CreateTransaction,
    ) -> Result<InventoryTransaction, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_transaction"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        let current: Option<(Decimal, String, String)> = sqlx::query_as(
            "SELECT quantity, name, unit FROM products WHERE product_id = $1 FOR UPDATE",
        )
        .bind(input.product_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to read product: {}", e)))?;

        let Some((current_quantity, name, unit)) = current else {
            return Err(AppError::NotFound(anyhow::anyhow!("Product not found")));
        };

        let new_quantity = match input.transaction_type {
            TransactionType::Purchase => current_quantity + input.quantity,
            TransactionType::Usage => {
                if current_quantity < input.quantity {
                    return Err(AppError::Unprocessable(anyhow::anyhow!(
                        "Not enough stock available for {}. Current: {} {}",
                        name,
                        current_quantity,
                        unit
                    )));
                }
                current_quantity - input.quantity
            }
            TransactionType::Adjustment => input.quantity,
        };

        sqlx::query("UPDATE products SET quantity = $2, updated_utc = NOW() WHERE product_id = $1")
            .bind(input.product_id)
            .bind(new_quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update stock: {}", e)))?;

        let transaction = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            INSERT INTO inventory_transactions (transaction_id, product_id, transaction_type, quantity, notes, transaction_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING transaction_id, product_id, transaction_type, quantity, notes, transaction_date, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.product_id)
        .bind(input.transaction_type.as_str())
        .bind(input.quantity)
        .bind(&input.notes)
        .bind(input.transaction_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create transaction: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        timer.observe_duration();
        info!(transaction_id = %transaction.transaction_id, "Inventory transaction recorded");

        Ok(transaction)
    }

    #[instrument(skip(self))]
    pub async fn recent_transactions(&self, limit: i64) -> Result<Vec<InventoryTransaction>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["recent_transactions"])
            .start_timer();

        let transactions = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            SELECT transaction_id, product_id, transaction_type, quantity, notes, transaction_date, created_utc
            FROM inventory_transactions
            ORDER BY transaction_date DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list transactions: {}", e)))?;

        timer.observe_duration();
        Ok(transactions)
    }

    /// Transactions in `[start, end)`, newest first.
    #[instrument(skip(self))]
    pub async fn transactions_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<InventoryTransaction>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transactions_between"])
            .start_timer();

        let transactions = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            SELECT transaction_id, product_id, transaction_type, quantity, notes, transaction_date, created_utc
            FROM inventory_transactions
            WHERE transaction_date >= $1 AND transaction_date < $2
            ORDER BY transaction_date DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list transactions: {}", e)))?;

        timer.observe_duration();
        Ok(transactions)
    }

    // =========================================================================
    // Dashboard Aggregates
    // =========================================================================

    /// Total inventory value (Σ quantity × price).
    #[instrument(skip(self))]
    pub async fn inventory_value(&self) -> Result<Decimal, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["inventory_value"])
            .start_timer();

        let value: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(quantity * price), 0) FROM products")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to compute value: {}", e))
                })?;

        timer.observe_duration();
        Ok(value)
    }

    #[instrument(skip(self))]
    pub async fn product_count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count products: {}", e)))?;
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn vendor_count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendors")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count vendors: {}", e)))?;
        Ok(count)
    }

    /// Product counts per category, omitting empty categories.
    #[instrument(skip(self))]
    pub async fn category_product_counts(&self) -> Result<Vec<CategoryProductCount>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["category_product_counts"])
            .start_timer();

        let counts = sqlx::query_as::<_, CategoryProductCount>(
            r#"
            SELECT c.name, COUNT(p.product_id) AS product_count
            FROM categories c
            JOIN products p ON p.category_id = c.category_id
            GROUP BY c.name
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count by category: {}", e)))?;

        timer.observe_duration();
        Ok(counts)
    }

    // =========================================================================
    // Sales Import Operations
    // =========================================================================

    /// Persist parsed order drafts in a single transaction spanning the
    /// whole file. Orders whose `order_id` already exists are skipped
    /// silently (idempotent re-import); any failure rolls back everything.
    #[instrument(skip(self, orders), fields(order_count = %orders.len()))]
    pub async fn import_sales(
        &self,
        orders: &[OrderDraft],
        uploaded_by: Option<Uuid>,
    ) -> Result<ImportSummary, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["import_sales"])
            .start_timer();

        let batch_id = Uuid::new_v4();
        let mut summary = ImportSummary {
            orders_created: 0,
            items_created: 0,
            items_skipped: 0,
            orders_skipped: 0,
            unmatched_items: 0,
            batch_id,
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        for draft in orders {
            let existing: Option<Uuid> =
                sqlx::query_scalar("SELECT sale_id FROM sales WHERE order_id = $1")
                    .bind(&draft.order_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!("Failed to check order: {}", e))
                    })?;

            if existing.is_some() {
                summary.orders_skipped += 1;
                summary.items_skipped += draft.items.len() as i64;
                continue;
            }

            let sale_id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO sales (sale_id, order_id, sale_date, payment_type, total_amount, tax_amount, discount_amount, uploaded_by, import_batch)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(sale_id)
            .bind(&draft.order_id)
            .bind(draft.sale_date)
            .bind(draft.payment_type.as_str())
            .bind(draft.total_amount)
            .bind(draft.tax_amount)
            .bind(draft.discount_amount)
            .bind(uploaded_by)
            .bind(batch_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert sale: {}", e)))?;

            for (sort_order, item) in draft.items.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO sale_items (sale_item_id, sale_id, product_name, sku, quantity, unit_price, product_id, sort_order)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(sale_id)
                .bind(&item.product_name)
                .bind(&item.sku)
                .bind(item.quantity)
                .bind(item.unit_price)
                .bind(item.product_id)
                .bind(sort_order as i32)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to insert sale item: {}", e))
                })?;

                summary.items_created += 1;
                if item.product_id.is_none() {
                    summary.unmatched_items += 1;
                }
            }

            summary.orders_created += 1;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit import: {}", e)))?;

        timer.observe_duration();
        info!(
            batch_id = %batch_id,
            orders_created = summary.orders_created,
            orders_skipped = summary.orders_skipped,
            "Sales import committed"
        );

        Ok(summary)
    }

    // =========================================================================
    // Sales Query Operations
    // =========================================================================

    const SALE_COLUMNS: &'static str = "sale_id, order_id, sale_date, payment_type, total_amount, \
         tax_amount, discount_amount, uploaded_by, import_batch, created_utc";

    /// Paginated sales listing, newest first. Returns the page and the total
    /// row count.
    #[instrument(skip(self))]
    pub async fn list_sales(&self, page: i64, per_page: i64) -> Result<(Vec<Sale>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_sales"])
            .start_timer();

        let per_page = per_page.clamp(1, 100);
        let offset = (page.max(1) - 1) * per_page;

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales ORDER BY sale_date DESC LIMIT $1 OFFSET $2",
            Self::SALE_COLUMNS
        ))
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list sales: {}", e)))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count sales: {}", e)))?;

        timer.observe_duration();
        Ok((sales, total))
    }

    #[instrument(skip(self), fields(sale_id = %sale_id))]
    pub async fn get_sale(&self, sale_id: Uuid) -> Result<Option<(Sale, Vec<SaleItem>)>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_sale"])
            .start_timer();

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE sale_id = $1",
            Self::SALE_COLUMNS
        ))
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get sale: {}", e)))?;

        let Some(sale) = sale else {
            timer.observe_duration();
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT sale_item_id, sale_id, product_name, sku, quantity, unit_price, product_id, sort_order
            FROM sale_items
            WHERE sale_id = $1
            ORDER BY sort_order
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get sale items: {}", e)))?;

        timer.observe_duration();
        Ok(Some((sale, items)))
    }

    /// Delete a sale; its items go with it.
    #[instrument(skip(self), fields(sale_id = %sale_id))]
    pub async fn delete_sale(&self, sale_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sales WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete sale: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Sales in `[start, end]`, newest first.
    #[instrument(skip(self))]
    pub async fn sales_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Sale>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["sales_between"])
            .start_timer();

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE sale_date BETWEEN $1 AND $2 ORDER BY sale_date DESC",
            Self::SALE_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list sales: {}", e)))?;

        timer.observe_duration();
        Ok(sales)
    }

    /// Total revenue and transaction count for a window.
    #[instrument(skip(self))]
    pub async fn revenue_totals(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<(Decimal, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["revenue_totals"])
            .start_timer();

        let totals: (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_amount), 0), COUNT(*)
            FROM sales
            WHERE sale_date BETWEEN $1 AND $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to total revenue: {}", e)))?;

        timer.observe_duration();
        Ok(totals)
    }

    /// Revenue per day over a window, for charting.
    #[instrument(skip(self))]
    pub async fn daily_revenue(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<DailyRevenue>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["daily_revenue"])
            .start_timer();

        let rows = sqlx::query_as::<_, DailyRevenue>(
            r#"
            SELECT CAST(sale_date AS DATE) AS day, SUM(total_amount) AS revenue
            FROM sales
            WHERE sale_date BETWEEN $1 AND $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to chart revenue: {}", e)))?;

        timer.observe_duration();
        Ok(rows)
    }

    /// Top products by item revenue (Σ quantity × unit price), grouped by
    /// the raw product name from the export.
    #[instrument(skip(self))]
    pub async fn top_products(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<TopProduct>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["top_products"])
            .start_timer();

        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT si.product_name,
                   SUM(si.quantity) AS total_quantity,
                   SUM(si.quantity * si.unit_price) AS total_revenue
            FROM sale_items si
            JOIN sales s ON s.sale_id = si.sale_id
            WHERE s.sale_date BETWEEN $1 AND $2
            GROUP BY si.product_name
            ORDER BY total_revenue DESC
            LIMIT $3
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to rank products: {}", e)))?;

        timer.observe_duration();
        Ok(rows)
    }

    /// Revenue per payment type over a window.
    #[instrument(skip(self))]
    pub async fn payment_breakdown(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<PaymentBreakdown>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["payment_breakdown"])
            .start_timer();

        let rows = sqlx::query_as::<_, PaymentBreakdown>(
            r#"
            SELECT payment_type, SUM(total_amount) AS amount
            FROM sales
            WHERE sale_date BETWEEN $1 AND $2
            GROUP BY payment_type
            ORDER BY amount DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to break down payments: {}", e)))?;

        timer.observe_duration();
        Ok(rows)
    }

    // =========================================================================
    // Report Operations
    // =========================================================================

    /// Low-stock report rows with vendor and category names resolved.
    #[instrument(skip(self))]
    pub async fn low_stock_report(&self) -> Result<Vec<LowStockRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["low_stock_report"])
            .start_timer();

        let rows = sqlx::query_as::<_, LowStockRow>(
            r#"
            SELECT p.name, p.sku, p.quantity, p.min_quantity, p.unit, p.price,
                   v.name AS vendor_name, c.name AS category_name
            FROM products p
            LEFT JOIN vendors v ON v.vendor_id = p.vendor_id
            LEFT JOIN categories c ON c.category_id = p.category_id
            WHERE p.quantity <= p.min_quantity
            ORDER BY p.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to build report: {}", e)))?;

        timer.observe_duration();
        Ok(rows)
    }

    /// Inventory value report rows (quantity × price per product).
    #[instrument(skip(self))]
    pub async fn inventory_value_report(&self) -> Result<Vec<InventoryValueRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["inventory_value_report"])
            .start_timer();

        let rows = sqlx::query_as::<_, InventoryValueRow>(
            r#"
            SELECT p.name, p.sku, p.quantity, p.unit, p.price,
                   p.quantity * p.price AS total_value,
                   v.name AS vendor_name, c.name AS category_name
            FROM products p
            LEFT JOIN vendors v ON v.vendor_id = p.vendor_id
            LEFT JOIN categories c ON c.category_id = p.category_id
            ORDER BY p.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to build report: {}", e)))?;

        timer.observe_duration();
        Ok(rows)
    }

    /// Transaction report rows in `[start, end)`, newest first.
    #[instrument(skip(self))]
    pub async fn transaction_report(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TransactionReportRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transaction_report"])
            .start_timer();

        let rows = sqlx::query_as::<_, TransactionReportRow>(
            r#"
            SELECT t.transaction_date, p.name AS product_name, p.sku,
                   t.transaction_type, t.quantity, p.unit, t.notes
            FROM inventory_transactions t
            JOIN products p ON p.product_id = t.product_id
            WHERE t.transaction_date >= $1 AND t.transaction_date < $2
            ORDER BY t.transaction_date DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to build report: {}", e)))?;

        timer.observe_duration();
        Ok(rows)
    }

    // =========================================================================
    // Staff Operations
    // =========================================================================

    const STAFF_COLUMNS: &'static str =
        "staff_id, name, email, phone, position, is_active, color_tag, created_utc";

    #[instrument(skip(self))]
    pub async fn list_staff(&self, active_only: bool) -> Result<Vec<Staff>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_staff"])
            .start_timer();

        let staff = sqlx::query_as::<_, Staff>(&format!(
            "SELECT {} FROM staff WHERE ($1 = FALSE OR is_active = TRUE) ORDER BY name",
            Self::STAFF_COLUMNS
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list staff: {}", e)))?;

        timer.observe_duration();
        Ok(staff)
    }

    #[instrument(skip(self), fields(staff_id = %staff_id))]
    pub async fn get_staff(&self, staff_id: Uuid) -> Result<Option<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "SELECT {} FROM staff WHERE staff_id = $1",
            Self::STAFF_COLUMNS
        ))
        .bind(staff_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get staff: {}", e)))?;

        Ok(staff)
    }

    #[instrument(skip(self))]
    pub async fn create_staff(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        position: Option<&str>,
        is_active: bool,
        color_tag: Option<&str>,
    ) -> Result<Staff, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_staff"])
            .start_timer();

        let staff = sqlx::query_as::<_, Staff>(&format!(
            r#"
            INSERT INTO staff (staff_id, name, email, phone, position, is_active, color_tag)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            Self::STAFF_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(position)
        .bind(is_active)
        .bind(color_tag)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create staff: {}", e)))?;

        timer.observe_duration();
        info!(staff_id = %staff.staff_id, "Staff member created");

        Ok(staff)
    }

    #[instrument(skip(self), fields(staff_id = %staff_id))]
    pub async fn update_staff(
        &self,
        staff_id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        position: Option<&str>,
        is_active: Option<bool>,
        color_tag: Option<&str>,
    ) -> Result<Option<Staff>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_staff"])
            .start_timer();

        let staff = sqlx::query_as::<_, Staff>(&format!(
            r#"
            UPDATE staff
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                position = COALESCE($5, position),
                is_active = COALESCE($6, is_active),
                color_tag = COALESCE($7, color_tag)
            WHERE staff_id = $1
            RETURNING {}
            "#,
            Self::STAFF_COLUMNS
        ))
        .bind(staff_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(position)
        .bind(is_active)
        .bind(color_tag)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update staff: {}", e)))?;

        timer.observe_duration();
        Ok(staff)
    }

    /// Delete a staff member. Fails with a conflict while shifts reference
    /// them.
    #[instrument(skip(self), fields(staff_id = %staff_id))]
    pub async fn delete_staff(&self, staff_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_staff"])
            .start_timer();

        let shift_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shifts WHERE staff_id = $1")
            .bind(staff_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check shifts: {}", e)))?;

        if shift_count > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Cannot delete staff member: delete or reassign their {} shift(s) first",
                shift_count
            )));
        }

        let result = sqlx::query("DELETE FROM staff WHERE staff_id = $1")
            .bind(staff_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete staff: {}", e)))?;

        timer.observe_duration();
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Shift Operations
    // =========================================================================

    const SHIFT_COLUMNS: &'static str = "shift_id, staff_id, start_time, end_time, shift_type, \
         location, notes, is_recurring, recurring_days, google_event_id, created_utc";

    #[instrument(skip(self), fields(staff_id = %staff_id))]
    pub async fn create_shift(
        &self,
        staff_id: Uuid,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        shift_type: &str,
        location: Option<&str>,
        notes: Option<&str>,
        is_recurring: bool,
        recurring_days: Option<&str>,
    ) -> Result<Shift, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_shift"])
            .start_timer();

        let shift = sqlx::query_as::<_, Shift>(&format!(
            r#"
            INSERT INTO shifts (shift_id, staff_id, start_time, end_time, shift_type, location, notes, is_recurring, recurring_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            Self::SHIFT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(staff_id)
        .bind(start_time)
        .bind(end_time)
        .bind(shift_type)
        .bind(location)
        .bind(notes)
        .bind(is_recurring)
        .bind(recurring_days)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Staff member not found"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create shift: {}", e)),
        })?;

        timer.observe_duration();
        info!(shift_id = %shift.shift_id, "Shift created");

        Ok(shift)
    }

    #[instrument(skip(self), fields(shift_id = %shift_id))]
    pub async fn get_shift(&self, shift_id: Uuid) -> Result<Option<Shift>, AppError> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {} FROM shifts WHERE shift_id = $1",
            Self::SHIFT_COLUMNS
        ))
        .bind(shift_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get shift: {}", e)))?;

        Ok(shift)
    }

    #[instrument(skip(self), fields(shift_id = %shift_id))]
    pub async fn update_shift(
        &self,
        shift_id: Uuid,
        staff_id: Uuid,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        shift_type: &str,
        location: Option<&str>,
        notes: Option<&str>,
        is_recurring: bool,
        recurring_days: Option<&str>,
    ) -> Result<Option<Shift>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_shift"])
            .start_timer();

        let shift = sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET staff_id = $2,
                start_time = $3,
                end_time = $4,
                shift_type = $5,
                location = $6,
                notes = $7,
                is_recurring = $8,
                recurring_days = $9
            WHERE shift_id = $1
            RETURNING {}
            "#,
            Self::SHIFT_COLUMNS
        ))
        .bind(shift_id)
        .bind(staff_id)
        .bind(start_time)
        .bind(end_time)
        .bind(shift_type)
        .bind(location)
        .bind(notes)
        .bind(is_recurring)
        .bind(recurring_days)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update shift: {}", e)))?;

        timer.observe_duration();
        Ok(shift)
    }

    /// Store the Google Calendar event id after a successful sync.
    #[instrument(skip(self), fields(shift_id = %shift_id))]
    pub async fn set_shift_event_id(
        &self,
        shift_id: Uuid,
        google_event_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE shifts SET google_event_id = $2 WHERE shift_id = $1")
            .bind(shift_id)
            .bind(google_event_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to store event id: {}", e)))?;
        Ok(())
    }

    #[instrument(skip(self), fields(shift_id = %shift_id))]
    pub async fn delete_shift(&self, shift_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM shifts WHERE shift_id = $1")
            .bind(shift_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete shift: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// All shifts, recurring templates included. The duty scheduler filters
    /// these in memory.
    #[instrument(skip(self))]
    pub async fn list_shifts(&self) -> Result<Vec<Shift>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_shifts"])
            .start_timer();

        let shifts = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {} FROM shifts ORDER BY start_time",
            Self::SHIFT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list shifts: {}", e)))?;

        timer.observe_duration();
        Ok(shifts)
    }

    /// Non-recurring shifts starting inside a window, for calendar display.
    #[instrument(skip(self))]
    pub async fn shifts_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Shift>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["shifts_between"])
            .start_timer();

        let shifts = sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT {}
            FROM shifts
            WHERE start_time >= $1 AND start_time <= $2
            ORDER BY start_time
            "#,
            Self::SHIFT_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list shifts: {}", e)))?;

        timer.observe_duration();
        Ok(shifts)
    }

    /// A staff member's shifts starting at or after `from`, soonest first.
    #[instrument(skip(self), fields(staff_id = %staff_id))]
    pub async fn upcoming_shifts(
        &self,
        staff_id: Uuid,
        from: NaiveDateTime,
    ) -> Result<Vec<Shift>, AppError> {
        let shifts = sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT {}
            FROM shifts
            WHERE staff_id = $1 AND start_time >= $2
            ORDER BY start_time
            "#,
            Self::SHIFT_COLUMNS
        ))
        .bind(staff_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list shifts: {}", e)))?;

        Ok(shifts)
    }

    /// A staff member's shifts between `cutoff` and `until`, newest first.
    #[instrument(skip(self), fields(staff_id = %staff_id))]
    pub async fn past_shifts(
        &self,
        staff_id: Uuid,
        cutoff: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<Shift>, AppError> {
        let shifts = sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT {}
            FROM shifts
            WHERE staff_id = $1 AND start_time < $2 AND start_time >= $3
            ORDER BY start_time DESC
            "#,
            Self::SHIFT_COLUMNS
        ))
        .bind(staff_id)
        .bind(until)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list shifts: {}", e)))?;

        Ok(shifts)
    }
}
