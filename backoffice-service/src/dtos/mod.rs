//! Request and response types for the HTTP API.

pub mod inventory;
pub mod sales;
pub mod staff;
