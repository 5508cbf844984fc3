//! Sales Intake Utility Library
//!
//! This library automates the intranet sales workflow: log in, download
//! the sales spreadsheet, submit every row through the sales form,
//! capture a screenshot of the results and export them as a PDF.

pub mod helpers;
pub mod models;
pub mod runner;

pub use runner::{RunnerConfig, SalesRunner};

// Re-export key types for convenience
pub use helpers::browser::BrowserSession;
pub use models::sales::{SalesRecord, SheetRow};
