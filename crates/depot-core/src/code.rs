//! # Document Codes
//!
//! Human-readable document identifiers: `PREFIX-YYYYMMDD-NNN`.
//!
//! ```text
//!   IN-20260105-001      first inbound receipt of 5 Jan 2026
//!   MUT-20260105-012     twelfth mutation that day
//!   OUT-20260105-1000    sequence widens past 999, never wraps
//! ```
//!
//! The sequence number is allocated by the storage layer; this module only
//! formats and parses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// The document families that receive codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Inbound,
    Outbound,
    Mutation,
    Opname,
}

impl DocumentKind {
    /// Prefix used when no override is configured.
    pub fn default_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Inbound => "IN",
            DocumentKind::Outbound => "OUT",
            DocumentKind::Mutation => "MUT",
            DocumentKind::Opname => "OPN",
        }
    }
}

/// A parsed document code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentCode {
    pub prefix: String,
    pub date: NaiveDate,
    pub sequence: u32,
}

impl DocumentCode {
    pub fn new(prefix: impl Into<String>, date: NaiveDate, sequence: u32) -> Self {
        DocumentCode {
            prefix: prefix.into(),
            date,
            sequence,
        }
    }
}

impl fmt::Display for DocumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:03}",
            self.prefix,
            self.date.format("%Y%m%d"),
            self.sequence
        )
    }
}

impl FromStr for DocumentCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.split('-');
        let (prefix, day, seq) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(d), Some(n), None) => (p, d, n),
            _ => return Err(invalid("expected PREFIX-YYYYMMDD-NNN")),
        };

        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(invalid("prefix must be uppercase letters"));
        }
        if day.len() != 8 {
            return Err(invalid("date must be YYYYMMDD"));
        }
        let date = NaiveDate::parse_from_str(day, "%Y%m%d")
            .map_err(|_| invalid("date must be YYYYMMDD"))?;
        if seq.len() < 3 || !seq.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("sequence must be at least 3 digits"));
        }
        let sequence: u32 = seq.parse().map_err(|_| invalid("sequence too large"))?;
        if sequence == 0 {
            return Err(invalid("sequence starts at 001"));
        }

        Ok(DocumentCode::new(prefix, date, sequence))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
