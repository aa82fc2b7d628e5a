use super::ExportError;
use crate::workflows::compliance::ComplianceReport;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const WEEKLY_FILE: &str = "weekly_compliance.csv";
pub const DEPARTMENT_FILE: &str = "department_performance.csv";
pub const DOCTOR_FILE: &str = "doctor_compliance_licensing.csv";

#[derive(Serialize)]
struct WeeklyRow {
    week_start: NaiveDate,
    visits: usize,
    compliant_visits: usize,
    compliance_pct: f64,
}

#[derive(Serialize)]
struct DepartmentRow<'a> {
    #[serde(rename = "Department")]
    department: &'a str,
    #[serde(rename = "Visits")]
    visits: usize,
    #[serde(rename = "Compliant Visits")]
    compliant_visits: usize,
    #[serde(rename = "Compliance %")]
    compliance_pct: f64,
    #[serde(rename = "Status")]
    status: &'static str,
}

#[derive(Serialize)]
struct DoctorRow<'a> {
    #[serde(rename = "Doctor")]
    doctor: &'a str,
    #[serde(rename = "Visits")]
    visits: usize,
    #[serde(rename = "Compliance %")]
    compliance_pct: f64,
    #[serde(rename = "License Expiry")]
    license_expiry: Option<NaiveDate>,
    #[serde(rename = "Days to Expiry")]
    days_to_expiry: Option<i64>,
    #[serde(rename = "Risk")]
    risk: &'static str,
}

/// Paths of the tables written by [`write_tables`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedTables {
    pub weekly: PathBuf,
    pub departments: PathBuf,
    pub doctors: PathBuf,
}

/// Writes the three summary tables as CSV files into `dir`, creating it if
/// needed. Existing files are overwritten.
pub fn write_tables(report: &ComplianceReport, dir: &Path) -> Result<ExportedTables, ExportError> {
    fs::create_dir_all(dir)?;

    let weekly = dir.join(WEEKLY_FILE);
    write_rows(
        &weekly,
        &["week_start", "visits", "compliant_visits", "compliance_pct"],
        report.weekly.iter().map(|point| WeeklyRow {
            week_start: point.week_start,
            visits: point.total_visits,
            compliant_visits: point.compliant_visits,
            compliance_pct: point.compliance_pct,
        }),
    )?;

    let departments = dir.join(DEPARTMENT_FILE);
    write_rows(
        &departments,
        &["Department", "Visits", "Compliant Visits", "Compliance %", "Status"],
        report.departments.iter().map(|dept| DepartmentRow {
            department: &dept.department,
            visits: dept.total_visits,
            compliant_visits: dept.compliant_visits,
            compliance_pct: dept.compliance_pct,
            status: dept.status_label,
        }),
    )?;

    let doctors = dir.join(DOCTOR_FILE);
    write_rows(
        &doctors,
        &[
            "Doctor",
            "Visits",
            "Compliance %",
            "License Expiry",
            "Days to Expiry",
            "Risk",
        ],
        report.doctors.iter().map(|doctor| DoctorRow {
            doctor: &doctor.doctor,
            visits: doctor.total_visits,
            compliance_pct: doctor.compliance_pct,
            license_expiry: doctor.license_expiry,
            days_to_expiry: doctor.days_to_expiry,
            risk: doctor.license_status_label,
        }),
    )?;

    Ok(ExportedTables {
        weekly,
        departments,
        doctors,
    })
}

// An empty table still gets its header line so downstream readers see the schema.
fn write_rows<T: Serialize>(
    path: &Path,
    headers: &[&str],
    rows: impl Iterator<Item = T>,
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut written = 0usize;
    for row in rows {
        writer.serialize(row)?;
        written += 1;
    }
    if written == 0 {
        writer.write_record(headers)?;
    }
    writer.flush()?;
    Ok(())
}
