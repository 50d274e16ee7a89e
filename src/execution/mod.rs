//! Execution of configured validations.
//!
//! A [`Configuration`] runs its validations in order against one pipeline
//! and collects every result into a [`Report`].

pub mod configuration;
pub mod report;

pub use configuration::{Configuration, RunOptions};
pub use report::{Report, ReportSummary, Table, COLUMNS};
