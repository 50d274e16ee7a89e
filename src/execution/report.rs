//! Run reports and their tabular rendering.

use crate::validation::result::ValidationResult;
use serde::Serialize;
use std::fmt;

/// Column headers of [`Table`].
pub const COLUMNS: [&str; 4] = ["validation_name", "subject", "success", "message"];

/// Results of one configuration run, in validation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    results: Vec<ValidationResult>,
    /// Validations that matched no subject.
    unmatched: Vec<String>,
    stopped_early: bool,
}

/// Aggregate counts over a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Validations that produced no results.
    pub unmatched: usize,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result.
    pub fn add(&mut self, result: ValidationResult) {
        self.results.push(result);
    }

    /// Record a validation that produced no results.
    pub fn add_unmatched(&mut self, validation_name: impl Into<String>) {
        self.unmatched.push(validation_name.into());
    }

    pub(crate) fn mark_stopped_early(&mut self) {
        self.stopped_early = true;
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Failed results, in order.
    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    /// Whether no result failed.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(ValidationResult::is_success)
    }

    /// Whether a fail-fast run skipped the remaining validations.
    pub fn stopped_early(&self) -> bool {
        self.stopped_early
    }

    /// Count passed and failed results.
    pub fn summary(&self) -> ReportSummary {
        let passed = self.results.iter().filter(|r| r.is_success()).count();
        ReportSummary {
            total: self.results.len(),
            passed,
            failed: self.results.len() - passed,
            unmatched: self.unmatched.len(),
        }
    }

    /// Render all results as rows.
    pub fn to_table(&self) -> Table {
        Table {
            rows: self
                .results
                .iter()
                .map(|r| {
                    [
                        r.validation_name().to_string(),
                        r.subject().to_string(),
                        r.is_success().to_string(),
                        r.message().to_string(),
                    ]
                })
                .collect(),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Document<'a> {
            summary: ReportSummary,
            #[serde(flatten)]
            report: &'a Report,
        }

        serde_json::to_string_pretty(&Document {
            summary: self.summary(),
            report: self,
        })
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a ValidationResult;
    type IntoIter = std::slice::Iter<'a, ValidationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} results: {} passed, {} failed",
            self.total, self.passed, self.failed
        )?;
        if self.unmatched > 0 {
            write!(f, ", {} validation(s) matched nothing", self.unmatched)?;
        }
        Ok(())
    }
}

/// Report rows under the fixed [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    rows: Vec<[String; 4]>,
}

impl Table {
    pub fn columns(&self) -> &'static [&'static str; 4] {
        &COLUMNS
    }

    pub fn rows(&self) -> &[[String; 4]] {
        &self.rows
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths = COLUMNS.map(str::len);
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let line = |f: &mut fmt::Formatter<'_>, cells: [&str; 4]| -> fmt::Result {
            let padded: Vec<String> = cells
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect();
            writeln!(f, "{}", padded.join(" | ").trim_end())
        };

        line(f, COLUMNS)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;
        for row in &self.rows {
            line(f, [&row[0], &row[1], &row[2], &row[3]].map(String::as_str))?;
        }
        Ok(())
    }
}
