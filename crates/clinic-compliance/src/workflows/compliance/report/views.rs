use super::super::domain::{DepartmentStatus, LicenseStatus};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyCompliancePoint {
    pub week_start: NaiveDate,
    pub total_visits: usize,
    pub compliant_visits: usize,
    pub compliance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentSummary {
    pub department: String,
    pub total_visits: usize,
    pub compliant_visits: usize,
    pub compliance_pct: f64,
    pub status: DepartmentStatus,
    pub status_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorSummary {
    pub doctor: String,
    pub total_visits: usize,
    pub compliant_visits: usize,
    pub compliance_pct: f64,
    pub license_expiry: Option<NaiveDate>,
    pub days_to_expiry: Option<i64>,
    pub license_status: LicenseStatus,
    pub license_status_label: &'static str,
    pub license_risk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentHighlight {
    pub department: String,
    pub compliance_pct: f64,
}

/// Dashboard-style headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceOverview {
    pub total_visits: usize,
    pub compliant_visits: usize,
    pub compliance_pct: f64,
    pub noncompliant_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_department: Option<DepartmentHighlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_department: Option<DepartmentHighlight>,
    pub expired_licenses: usize,
    pub expiring_soon_licenses: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplianceInsights {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_findings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub departments_below_threshold: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licensing_actions: Vec<String>,
}
