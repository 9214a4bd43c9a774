//! HTTP handlers for backoffice-service.

pub mod categories;
pub mod health;
pub mod inventory;
pub mod reports;
pub mod sales;
pub mod shifts;
pub mod staff;
pub mod vendors;
