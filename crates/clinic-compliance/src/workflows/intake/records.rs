use super::mapping::{ResolvedMapping, SemanticField};
use super::parser::{self, RawRow};
use crate::workflows::compliance::VisitRecord;
use serde::Serialize;
use std::fmt;

/// How many offending rows are kept verbatim for reporting.
pub const SKIPPED_SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RowErrorReason {
    EmptyCell,
    InvalidDate(String),
    InvalidTimestamp(String),
    InvalidNumber(String),
    NegativeWait(f64),
    Malformed(String),
}

impl fmt::Display for RowErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCell => write!(f, "required value is empty"),
            Self::InvalidDate(raw) => write!(f, "'{raw}' is not a recognised date"),
            Self::InvalidTimestamp(raw) => write!(f, "'{raw}' is not a recognised date/time"),
            Self::InvalidNumber(raw) => write!(f, "'{raw}' is not a number of minutes"),
            Self::NegativeWait(minutes) => write!(f, "waiting time is negative ({minutes} min)"),
            Self::Malformed(detail) => write!(f, "malformed record: {detail}"),
        }
    }
}

/// A single input row that could not be normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub field: Option<SemanticField>,
    pub reason: RowErrorReason,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "row {} ({field}): {}", self.row, self.reason),
            None => write!(f, "row {}: {}", self.row, self.reason),
        }
    }
}

impl std::error::Error for RowError {}

impl RowError {
    fn new(row: usize, field: SemanticField, reason: RowErrorReason) -> Self {
        Self {
            row,
            field: Some(field),
            reason,
        }
    }
}

/// Count of rows dropped during normalization plus a bounded sample of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkippedRows {
    pub count: usize,
    pub sample: Vec<RowError>,
}

impl SkippedRows {
    pub fn record(&mut self, error: RowError) {
        self.count += 1;
        if self.sample.len() < SKIPPED_SAMPLE_LIMIT {
            self.sample.push(error);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Normalized visits ready for the compliance engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedBatch {
    pub records: Vec<VisitRecord>,
    pub skipped: SkippedRows,
}

impl NormalizedBatch {
    /// True when no usable rows survived normalization. Callers should
    /// surface this separately from an all-compliant result.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub(crate) fn malformed(row: usize, detail: &str) -> RowError {
    RowError {
        row,
        field: None,
        reason: RowErrorReason::Malformed(detail.to_string()),
    }
}

pub(crate) fn normalize_row(
    raw: &RawRow,
    mapping: &ResolvedMapping,
) -> Result<VisitRecord, RowError> {
    let row = raw.row;
    let required = |index: usize, field: SemanticField| {
        raw.cell(index)
            .ok_or_else(|| RowError::new(row, field, RowErrorReason::EmptyCell))
    };

    let visit_raw = required(mapping.visit_date, SemanticField::VisitDate)?;
    let visit_date = parser::parse_date(visit_raw).ok_or_else(|| {
        RowError::new(
            row,
            SemanticField::VisitDate,
            RowErrorReason::InvalidDate(visit_raw.to_string()),
        )
    })?;
    let department = required(mapping.department, SemanticField::Department)?.to_string();
    let doctor = required(mapping.doctor, SemanticField::Doctor)?.to_string();

    let wait_minutes = wait_minutes(raw, mapping, visit_date)?;

    let license_expiry = match mapping.license_expiry.and_then(|index| raw.cell(index)) {
        None => None,
        Some(value) => Some(parser::parse_date(value).ok_or_else(|| {
            RowError::new(
                row,
                SemanticField::LicenseExpiry,
                RowErrorReason::InvalidDate(value.to_string()),
            )
        })?),
    };

    Ok(VisitRecord {
        visit_date,
        department,
        doctor,
        wait_minutes,
        license_expiry,
    })
}

fn wait_minutes(
    raw: &RawRow,
    mapping: &ResolvedMapping,
    visit_date: chrono::NaiveDate,
) -> Result<f64, RowError> {
    let row = raw.row;

    if let Some(value) = mapping.wait_minutes.and_then(|index| raw.cell(index)) {
        let minutes = parser::parse_minutes(value).ok_or_else(|| {
            RowError::new(
                row,
                SemanticField::WaitMinutes,
                RowErrorReason::InvalidNumber(value.to_string()),
            )
        })?;
        if minutes < 0.0 {
            return Err(RowError::new(
                row,
                SemanticField::WaitMinutes,
                RowErrorReason::NegativeWait(minutes),
            ));
        }
        return Ok(minutes);
    }

    let Some((arrival_index, seen_index)) = mapping.timestamps else {
        return Err(RowError::new(
            row,
            SemanticField::WaitMinutes,
            RowErrorReason::EmptyCell,
        ));
    };

    let timestamp = |index: usize, field: SemanticField| {
        let value = raw
            .cell(index)
            .ok_or_else(|| RowError::new(row, field, RowErrorReason::EmptyCell))?;
        parser::parse_timestamp(value, visit_date).ok_or_else(|| {
            RowError::new(
                row,
                field,
                RowErrorReason::InvalidTimestamp(value.to_string()),
            )
        })
    };

    let arrival = timestamp(arrival_index, SemanticField::ArrivalTime)?;
    let seen = timestamp(seen_index, SemanticField::SeenTime)?;
    let minutes = (seen - arrival).num_seconds() as f64 / 60.0;
    if minutes < 0.0 {
        return Err(RowError::new(
            row,
            SemanticField::SeenTime,
            RowErrorReason::NegativeWait(minutes),
        ));
    }

    Ok(minutes)
}
