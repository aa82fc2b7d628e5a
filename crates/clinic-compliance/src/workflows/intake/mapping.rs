use super::normalizer::{header_key, normalize_header};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fields the compliance engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    VisitDate,
    Department,
    Doctor,
    WaitMinutes,
    ArrivalTime,
    SeenTime,
    LicenseExpiry,
}

impl SemanticField {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::VisitDate,
            Self::Department,
            Self::Doctor,
            Self::WaitMinutes,
            Self::ArrivalTime,
            Self::SeenTime,
            Self::LicenseExpiry,
        ]
    }

    pub const fn required() -> [Self; 3] {
        [Self::VisitDate, Self::Department, Self::Doctor]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::VisitDate => "visit_date",
            Self::Department => "department",
            Self::Doctor => "doctor",
            Self::WaitMinutes => "wait_minutes",
            Self::ArrivalTime => "arrival_time",
            Self::SeenTime => "seen_time",
            Self::LicenseExpiry => "license_expiry",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VisitDate => "Visit date",
            Self::Department => "Department",
            Self::Doctor => "Doctor",
            Self::WaitMinutes => "Waiting minutes",
            Self::ArrivalTime => "Arrival time",
            Self::SeenTime => "Seen time",
            Self::LicenseExpiry => "License expiry",
        }
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("missing column mapping for: {}", join_fields(.fields))]
    MissingMapping { fields: Vec<SemanticField> },
    #[error("column '{column}' mapped to {field} is not present in the input")]
    UnknownColumn {
        field: SemanticField,
        column: String,
    },
}

fn join_fields(fields: &[SemanticField]) -> String {
    fields
        .iter()
        .map(|field| field.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// User-declared mapping from semantic fields to source column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    columns: BTreeMap<SemanticField, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: SemanticField, column: impl Into<String>) -> Self {
        self.set(field, column);
        self
    }

    pub fn set(&mut self, field: SemanticField, column: impl Into<String>) {
        let column = column.into();
        if column.trim().is_empty() {
            self.columns.remove(&field);
        } else {
            self.columns.insert(field, column);
        }
    }

    pub fn get(&self, field: SemanticField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SemanticField, &str)> {
        self.columns
            .iter()
            .map(|(field, column)| (*field, column.as_str()))
    }

    /// Fields set on `overrides` replace the ones already present. The wait
    /// source is chosen as a unit: overriding minutes drops inherited
    /// arrival/seen columns, and overriding either timestamp drops inherited
    /// minutes.
    pub fn merged_with(mut self, overrides: &ColumnMapping) -> Self {
        let picks_minutes = overrides.get(SemanticField::WaitMinutes).is_some();
        let picks_timestamps = overrides.get(SemanticField::ArrivalTime).is_some()
            || overrides.get(SemanticField::SeenTime).is_some();
        if picks_timestamps && !picks_minutes {
            self.columns.remove(&SemanticField::WaitMinutes);
        }
        if picks_minutes && !picks_timestamps {
            self.columns.remove(&SemanticField::ArrivalTime);
            self.columns.remove(&SemanticField::SeenTime);
        }

        for (field, column) in overrides.iter() {
            self.set(field, column);
        }
        self
    }

    /// Best-guess mapping from header names, the way a dashboard pre-selects
    /// its column pickers. Unmatched fields stay unmapped.
    pub fn suggest<S: AsRef<str>>(headers: &[S]) -> Self {
        let keyed: Vec<(String, String)> = headers
            .iter()
            .map(|header| (normalize_header(header.as_ref()), header_key(header.as_ref())))
            .collect();

        let visit_date = find_header(&keyed, |key| key.contains("visit") && key.contains("date"))
            .or_else(|| {
                find_header(&keyed, |key| key.contains("date") && !is_license_header(key))
            });
        let department = find_header(&keyed, |key| {
            key.contains("dept") || key.contains("department")
        });
        let doctor = find_header(&keyed, |key| {
            (key.contains("doctor") || key.contains("physician")) && !is_license_header(key)
        });
        let wait_minutes = find_header(&keyed, |key| key.contains("wait") && key.contains("min"));
        let arrival = find_header(&keyed, |key| {
            key.contains("arrival") || key.contains("check")
        });
        let seen = find_header(&keyed, |key| {
            (key.contains("seen") || key.contains("start"))
                && !key.contains("arrival")
                && !key.contains("check")
        });
        let license_expiry = find_header(&keyed, is_license_header);

        let mut mapping = Self::new();
        for (field, column) in [
            (SemanticField::VisitDate, visit_date),
            (SemanticField::Department, department),
            (SemanticField::Doctor, doctor),
            (SemanticField::WaitMinutes, wait_minutes),
            (SemanticField::ArrivalTime, arrival),
            (SemanticField::SeenTime, seen),
            (SemanticField::LicenseExpiry, license_expiry),
        ] {
            if let Some(column) = column {
                mapping.set(field, column);
            }
        }
        mapping
    }

    /// Validates the mapping against the input's header row and resolves
    /// every mapped field to a column index.
    pub fn resolve<S: AsRef<str>>(&self, headers: &[S]) -> Result<ResolvedMapping, MappingError> {
        let mut missing: Vec<SemanticField> = SemanticField::required()
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect();

        let has_minutes = self.get(SemanticField::WaitMinutes).is_some();
        let has_arrival = self.get(SemanticField::ArrivalTime).is_some();
        let has_seen = self.get(SemanticField::SeenTime).is_some();
        if !has_minutes && !(has_arrival && has_seen) {
            match (has_arrival, has_seen) {
                (true, false) => missing.push(SemanticField::SeenTime),
                (false, true) => missing.push(SemanticField::ArrivalTime),
                _ => missing.push(SemanticField::WaitMinutes),
            }
        }

        if !missing.is_empty() {
            return Err(MappingError::MissingMapping { fields: missing });
        }

        let index = |field: SemanticField| -> Result<Option<usize>, MappingError> {
            self.get(field)
                .map(|column| {
                    find_column(headers, column).ok_or_else(|| MappingError::UnknownColumn {
                        field,
                        column: column.to_string(),
                    })
                })
                .transpose()
        };

        let visit_date = index(SemanticField::VisitDate)?;
        let department = index(SemanticField::Department)?;
        let doctor = index(SemanticField::Doctor)?;
        let wait_minutes = index(SemanticField::WaitMinutes)?;
        let arrival = index(SemanticField::ArrivalTime)?;
        let seen = index(SemanticField::SeenTime)?;
        let license_expiry = index(SemanticField::LicenseExpiry)?;

        match (visit_date, department, doctor) {
            (Some(visit_date), Some(department), Some(doctor)) => {
                tracing::debug!(
                    visit_date,
                    department,
                    doctor,
                    ?wait_minutes,
                    timestamps = arrival.is_some() && seen.is_some(),
                    "column mapping resolved"
                );
                Ok(ResolvedMapping {
                    visit_date,
                    department,
                    doctor,
                    wait_minutes,
                    timestamps: arrival.zip(seen),
                    license_expiry,
                })
            }
            // Unreachable once the required check above has passed.
            _ => Err(MappingError::MissingMapping {
                fields: SemanticField::required().to_vec(),
            }),
        }
    }
}

fn find_header(keyed: &[(String, String)], predicate: impl Fn(&str) -> bool) -> Option<String> {
    keyed
        .iter()
        .find(|(_, key)| predicate(key))
        .map(|(header, _)| header.clone())
}

fn is_license_header(key: &str) -> bool {
    key.contains("licen") || key.contains("expir")
}

fn find_column<S: AsRef<str>>(headers: &[S], column: &str) -> Option<usize> {
    let wanted = normalize_header(column);
    headers
        .iter()
        .position(|header| normalize_header(header.as_ref()) == wanted)
        .or_else(|| {
            let wanted = wanted.to_lowercase();
            headers
                .iter()
                .position(|header| header_key(header.as_ref()) == wanted)
        })
}

/// Column indices for a validated mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    pub(crate) visit_date: usize,
    pub(crate) department: usize,
    pub(crate) doctor: usize,
    pub(crate) wait_minutes: Option<usize>,
    pub(crate) timestamps: Option<(usize, usize)>,
    pub(crate) license_expiry: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<&'static str> {
        vec![
            "Visit Date",
            "Department",
            "Doctor",
            "Waiting Minutes",
            "Arrival Time",
            "Seen Time",
            "License Expiry",
        ]
    }

    #[test]
    fn resolve_reports_every_missing_required_field() {
        let mapping = ColumnMapping::new().with(SemanticField::Department, "Department");
        let err = mapping.resolve(&headers()).expect_err("missing fields");
        assert_eq!(
            err,
            MappingError::MissingMapping {
                fields: vec![
                    SemanticField::VisitDate,
                    SemanticField::Doctor,
                    SemanticField::WaitMinutes,
                ],
            }
        );
        assert_eq!(
            err.to_string(),
            "missing column mapping for: visit_date, doctor, wait_minutes"
        );
    }

    #[test]
    fn half_mapped_timestamp_pair_names_the_missing_half() {
        let mapping = ColumnMapping::new()
            .with(SemanticField::VisitDate, "Visit Date")
            .with(SemanticField::Department, "Department")
            .with(SemanticField::Doctor, "Doctor")
            .with(SemanticField::ArrivalTime, "Arrival Time");
        assert_eq!(
            mapping.resolve(&headers()),
            Err(MappingError::MissingMapping {
                fields: vec![SemanticField::SeenTime],
            })
        );
    }

    #[test]
    fn resolve_rejects_unknown_columns() {
        let mapping = ColumnMapping::new()
            .with(SemanticField::VisitDate, "Visit Date")
            .with(SemanticField::Department, "Dept")
            .with(SemanticField::Doctor, "Doctor")
            .with(SemanticField::WaitMinutes, "Waiting Minutes");
        assert_eq!(
            mapping.resolve(&headers()),
            Err(MappingError::UnknownColumn {
                field: SemanticField::Department,
                column: "Dept".to_string(),
            })
        );
    }

    #[test]
    fn resolve_matches_headers_case_insensitively() {
        let mapping = ColumnMapping::new()
            .with(SemanticField::VisitDate, "visit date")
            .with(SemanticField::Department, "DEPARTMENT")
            .with(SemanticField::Doctor, "Doctor")
            .with(SemanticField::ArrivalTime, "Arrival  Time")
            .with(SemanticField::SeenTime, "Seen Time");
        let resolved = mapping.resolve(&headers()).expect("resolves");
        assert_eq!(resolved.visit_date, 0);
        assert_eq!(resolved.department, 1);
        assert_eq!(resolved.wait_minutes, None);
        assert_eq!(resolved.timestamps, Some((4, 5)));
        assert_eq!(resolved.license_expiry, None);
    }

    #[test]
    fn suggest_picks_dashboard_style_defaults() {
        let mapping = ColumnMapping::suggest(&headers());
        assert_eq!(mapping.get(SemanticField::VisitDate), Some("Visit Date"));
        assert_eq!(mapping.get(SemanticField::Department), Some("Department"));
        assert_eq!(mapping.get(SemanticField::Doctor), Some("Doctor"));
        assert_eq!(
            mapping.get(SemanticField::WaitMinutes),
            Some("Waiting Minutes")
        );
        assert_eq!(mapping.get(SemanticField::ArrivalTime), Some("Arrival Time"));
        assert_eq!(mapping.get(SemanticField::SeenTime), Some("Seen Time"));
        assert_eq!(
            mapping.get(SemanticField::LicenseExpiry),
            Some("License Expiry")
        );
    }

    #[test]
    fn suggest_does_not_confuse_license_dates_with_visit_dates() {
        let mapping = ColumnMapping::suggest(&["License Expiry Date", "Date", "Dept", "Doctor"]);
        assert_eq!(mapping.get(SemanticField::VisitDate), Some("Date"));
        assert_eq!(mapping.get(SemanticField::Department), Some("Dept"));
        assert_eq!(
            mapping.get(SemanticField::LicenseExpiry),
            Some("License Expiry Date")
        );
        assert_eq!(mapping.get(SemanticField::WaitMinutes), None);
    }

    #[test]
    fn mapping_round_trips_through_json_keys() {
        let mapping: ColumnMapping = serde_json::from_str(
            r#"{"visit_date": "Date", "department": "Dept", "doctor": "Doc", "wait_minutes": "Wait"}"#,
        )
        .expect("mapping parses");
        assert_eq!(mapping.get(SemanticField::Doctor), Some("Doc"));
        assert_eq!(mapping.get(SemanticField::SeenTime), None);
    }

    #[test]
    fn overrides_replace_suggestions() {
        let suggested = ColumnMapping::suggest(&headers());
        let overrides = ColumnMapping::new().with(SemanticField::Doctor, "Department");
        let merged = suggested.merged_with(&overrides);
        assert_eq!(merged.get(SemanticField::Doctor), Some("Department"));
        assert_eq!(merged.get(SemanticField::VisitDate), Some("Visit Date"));
    }

    #[test]
    fn explicit_timestamps_replace_suggested_minutes() {
        let headers = ["Visit Date", "Department", "Doctor", "Waiting Minutes", "Arrival", "Seen"];
        let suggested = ColumnMapping::suggest(&headers);
        assert_eq!(suggested.get(SemanticField::WaitMinutes), Some("Waiting Minutes"));

        let merged = suggested.clone().merged_with(
            &ColumnMapping::new()
                .with(SemanticField::ArrivalTime, "Arrival")
                .with(SemanticField::SeenTime, "Seen"),
        );
        assert_eq!(merged.get(SemanticField::WaitMinutes), None);
        assert_eq!(merged.get(SemanticField::ArrivalTime), Some("Arrival"));

        let merged = suggested.merged_with(
            &ColumnMapping::new().with(SemanticField::WaitMinutes, "Waiting Minutes"),
        );
        assert_eq!(merged.get(SemanticField::ArrivalTime), None);
        assert_eq!(merged.get(SemanticField::SeenTime), None);
        assert_eq!(merged.get(SemanticField::WaitMinutes), Some("Waiting Minutes"));
    }
}
