//! Service layer: persistence, reconciliation logic, calendar collaborator,
//! metrics, and report rendering.

pub mod calendar;
pub mod database;
pub mod importer;
pub mod metrics;
pub mod reports;
pub mod scheduler;

pub use calendar::{
    CalendarCredentials, CalendarError, CalendarEvent, CalendarProvider, EventDetails, EventWindow,
    GoogleCalendarProvider, MockCalendarProvider,
};
pub use database::Database;
pub use importer::{ImportError, ImportSummary, parse_sales_export};
pub use metrics::{get_metrics, init_metrics};
pub use scheduler::{on_duty_roster, staff_on_duty};
