//! Domain models for backoffice-service.

pub mod catalog;
pub mod sale;
pub mod staff;

pub use catalog::{
    Category, CreateProduct, CreateTransaction, InventoryTransaction, Product, TransactionType,
    UpdateProduct, Vendor,
};
pub use sale::{PaymentType, Sale, SaleItem};
pub use staff::{Shift, ShiftType, Staff, WEEKDAY_TOKENS, weekday_token};
