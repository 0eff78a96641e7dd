//! Report period handling

use chrono::NaiveDate;

use crate::errors::{MiradorError, Result};

/// Inclusive date range of a report period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Parses a pair of `YYYY-MM-DD` strings as received on the query string.
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        Ok(Self { from: parse_iso_date(from)?, to: parse_iso_date(to)? })
    }

    /// Human label used in report payloads, e.g. `2025-01-01 a 2025-01-31`.
    pub fn label(&self) -> String {
        format!("{} a {}", self.from, self.to)
    }

    /// Number of calendar days covered, both endpoints included.
    pub fn day_count(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| MiradorError::InvalidInput(format!("Fecha inválida: \"{value}\"")))
}
