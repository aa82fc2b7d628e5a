use super::super::domain::{
    compliance_pct, round_one_decimal, ComplianceThresholds, LicenseStatus,
};
use super::views::{
    ComplianceInsights, ComplianceOverview, DepartmentHighlight, DepartmentSummary,
    DoctorSummary, WeeklyCompliancePoint,
};
use chrono::NaiveDate;
use serde::Serialize;

/// Output of one engine evaluation. Every field is recomputed per run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub evaluated_on: NaiveDate,
    pub thresholds: ComplianceThresholds,
    pub weekly: Vec<WeeklyCompliancePoint>,
    pub departments: Vec<DepartmentSummary>,
    pub doctors: Vec<DoctorSummary>,
}

impl ComplianceReport {
    pub fn is_empty(&self) -> bool {
        self.weekly.is_empty() && self.departments.is_empty() && self.doctors.is_empty()
    }

    pub fn latest_week(&self) -> Option<&WeeklyCompliancePoint> {
        self.weekly.last()
    }

    pub fn overview(&self) -> ComplianceOverview {
        let total_visits: usize = self.departments.iter().map(|dept| dept.total_visits).sum();
        let compliant_visits: usize = self
            .departments
            .iter()
            .map(|dept| dept.compliant_visits)
            .sum();
        let overall_pct = compliance_pct(compliant_visits, total_visits);
        let noncompliant_pct = if total_visits == 0 {
            0.0
        } else {
            round_one_decimal(100.0 - 100.0 * compliant_visits as f64 / total_visits as f64)
        };

        let best_department = self
            .departments
            .iter()
            .min_by(|a, b| {
                b.compliance_pct
                    .total_cmp(&a.compliance_pct)
                    .then_with(|| a.department.cmp(&b.department))
            })
            .map(highlight);
        let worst_department = self
            .departments
            .iter()
            .min_by(|a, b| {
                a.compliance_pct
                    .total_cmp(&b.compliance_pct)
                    .then_with(|| a.department.cmp(&b.department))
            })
            .map(highlight);

        let expired_licenses = self
            .doctors
            .iter()
            .filter(|doctor| doctor.license_status == LicenseStatus::Expired)
            .count();
        let expiring_soon_licenses = self
            .doctors
            .iter()
            .filter(|doctor| doctor.license_status == LicenseStatus::ExpiringSoon)
            .count();

        ComplianceOverview {
            total_visits,
            compliant_visits,
            compliance_pct: overall_pct,
            noncompliant_pct,
            best_department,
            worst_department,
            expired_licenses,
            expiring_soon_licenses,
        }
    }

    pub fn insights(&self) -> ComplianceInsights {
        super::generate_insights(self, &self.overview())
    }
}

fn highlight(summary: &DepartmentSummary) -> DepartmentHighlight {
    DepartmentHighlight {
        department: summary.department.clone(),
        compliance_pct: summary.compliance_pct,
    }
}
