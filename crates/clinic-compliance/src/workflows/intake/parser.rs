use super::normalizer::normalize_header;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use std::io::Read;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Calendar years accepted from visit exports. `%Y` alone admits years near
/// chrono's limits, where week arithmetic overflows.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2200;

/// One data row as read from the source, before any field interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based data row number; the header row is not counted.
    pub row: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub(crate) fn cell(&self, index: usize) -> Option<&str> {
        self.cells
            .get(index)
            .and_then(|value| super::normalizer::clean_cell(value))
    }
}

/// A data row the CSV reader could not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    pub row: usize,
    pub detail: String,
}

/// Header row plus every data row of a delimited input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Result<RawRow, MalformedRow>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, cells)| Ok(RawRow { row: idx + 1, cells }))
            .collect();
        Self {
            headers: headers.iter().map(|header| normalize_header(header)).collect(),
            rows,
        }
    }

    /// Builds a table from rows keyed by column name. Columns are the sorted
    /// union of every row's keys; absent cells are empty.
    pub fn from_maps(records: &[BTreeMap<String, String>]) -> Self {
        let mut headers: Vec<String> = records
            .iter()
            .flat_map(|record| record.keys().cloned())
            .collect();
        headers.sort();
        headers.dedup();

        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|header| record.get(header).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Result<RawRow, MalformedRow>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads a delimited input. I/O and header failures are fatal; a record that
/// cannot be decoded is kept as a [`MalformedRow`].
pub fn read_table<R: Read>(reader: R) -> Result<RawTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let row = idx + 1;
        match record {
            Ok(record) => rows.push(Ok(RawRow {
                row,
                cells: record.iter().map(str::to_string).collect(),
            })),
            Err(err) if err.is_io_error() => return Err(err),
            Err(err) => rows.push(Err(MalformedRow {
                row,
                detail: err.to_string(),
            })),
        }
    }

    Ok(RawTable { headers, rows })
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| parse_datetime(trimmed).map(|dt| dt.date()))
        .filter(|date| YEAR_RANGE.contains(&date.year()))
}

pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Offsets are dropped, not applied: the wall-clock date is the visit date.
    let parsed = match DateTime::parse_from_rfc3339(trimmed) {
        Ok(dt) => Some(dt.naive_local()),
        Err(_) => DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok()),
    };
    parsed.filter(|dt| YEAR_RANGE.contains(&dt.year()))
}

/// Parses an arrival/seen cell. Bare clock times are placed on `visit_date`.
pub(crate) fn parse_timestamp(value: &str, visit_date: NaiveDate) -> Option<NaiveDateTime> {
    parse_datetime(value).or_else(|| {
        TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(value.trim(), format).ok())
            .map(|time| visit_date.and_time(time))
    })
}

pub(crate) fn parse_minutes(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|minutes| minutes.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parse_date_accepts_known_formats() {
        let expected = date(2025, 9, 24);
        assert_eq!(parse_date("2025-09-24"), Some(expected));
        assert_eq!(parse_date("2025/09/24"), Some(expected));
        assert_eq!(parse_date("24/09/2025"), Some(expected));
        assert_eq!(parse_date("24-09-2025"), Some(expected));
        assert_eq!(parse_date("24.09.2025"), Some(expected));
        assert_eq!(parse_date("2025-09-24 08:15:00"), Some(expected));
        assert_eq!(parse_date("2025-09-24T08:15:00Z"), Some(expected));
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date("  "), None);
    }

    #[test]
    fn parse_date_keeps_wall_clock_date_of_offset_timestamps() {
        assert_eq!(
            parse_date("2025-09-22T00:30:00+02:00"),
            Some(date(2025, 9, 22))
        );
        assert_eq!(
            parse_datetime("2025-09-22T23:45:00-05:00"),
            date(2025, 9, 22).and_hms_opt(23, 45, 0)
        );
    }

    #[test]
    fn parse_date_rejects_years_outside_supported_range() {
        assert_eq!(parse_date("-262143-01-01"), None);
        assert_eq!(parse_date("262142-12-31"), None);
        assert_eq!(parse_date("0001-01-01"), None);
        assert_eq!(parse_datetime("99999-01-01T08:00:00"), None);
        assert_eq!(parse_date("1900-01-01"), Some(date(1900, 1, 1)));
    }

    #[test]
    fn parse_timestamp_places_bare_times_on_visit_date() {
        let visit = date(2025, 9, 24);
        assert_eq!(
            parse_timestamp("08:15", visit),
            visit.and_hms_opt(8, 15, 0)
        );
        assert_eq!(
            parse_timestamp("2025-09-23 23:50", visit),
            date(2025, 9, 23).and_hms_opt(23, 50, 0)
        );
        assert_eq!(parse_timestamp("quarter past", visit), None);
    }

    #[test]
    fn parse_minutes_rejects_non_finite_values() {
        assert_eq!(parse_minutes("12.5"), Some(12.5));
        assert_eq!(parse_minutes(" 40 "), Some(40.0));
        assert_eq!(parse_minutes("inf"), None);
        assert_eq!(parse_minutes("NaN"), None);
        assert_eq!(parse_minutes("ten"), None);
    }

    #[test]
    fn read_table_numbers_rows_and_keeps_short_records() {
        let table = read_table(Cursor::new(
            "\u{feff}Visit Date,Department\n2025-09-24,ER\n2025-09-25\n",
        ))
        .expect("table reads");
        assert_eq!(table.headers(), ["Visit Date", "Department"]);
        assert_eq!(table.len(), 2);

        let second = table.rows()[1].as_ref().expect("flexible row");
        assert_eq!(second.row, 2);
        assert_eq!(second.cell(0), Some("2025-09-25"));
        assert_eq!(second.cell(1), None);
    }

    #[test]
    fn from_maps_uses_sorted_union_of_keys() {
        let mut first = BTreeMap::new();
        first.insert("Doctor".to_string(), "Dr. A".to_string());
        let mut second = BTreeMap::new();
        second.insert("Department".to_string(), "ER".to_string());

        let table = RawTable::from_maps(&[first, second]);
        assert_eq!(table.headers(), ["Department", "Doctor"]);
        let row = table.rows()[0].as_ref().expect("row");
        assert_eq!(row.cell(0), None);
        assert_eq!(row.cell(1), Some("Dr. A"));
    }
}
