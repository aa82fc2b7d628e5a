use super::domain::{
    compliance_pct, ComplianceThresholds, DepartmentStatus, LicenseStatus, VisitRecord,
};
use super::report::views::{DepartmentSummary, DoctorSummary, WeeklyCompliancePoint};
use super::report::ComplianceReport;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: usize,
    compliant: usize,
}

impl Tally {
    fn record(&mut self, compliant: bool) {
        self.total += 1;
        if compliant {
            self.compliant += 1;
        }
    }

    fn pct(&self) -> f64 {
        compliance_pct(self.compliant, self.total)
    }
}

#[derive(Debug, Default)]
struct DoctorTally {
    visits: Tally,
    license_expiry: Option<NaiveDate>,
}

/// Aggregates normalized visits into weekly, department and doctor summaries.
///
/// The engine is total over its input: an empty slice yields an empty
/// report. Grouping runs through ordered maps so identical input always
/// produces identical output.
pub struct ComplianceEngine;

impl ComplianceEngine {
    pub fn evaluate(
        records: &[VisitRecord],
        thresholds: &ComplianceThresholds,
        today: NaiveDate,
    ) -> ComplianceReport {
        let mut weeks: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
        let mut departments: BTreeMap<&str, Tally> = BTreeMap::new();
        let mut doctors: BTreeMap<&str, DoctorTally> = BTreeMap::new();

        for record in records {
            let compliant = record.is_compliant(thresholds);
            weeks.entry(record.week_start()).or_default().record(compliant);
            departments
                .entry(record.department.as_str())
                .or_default()
                .record(compliant);

            let doctor = doctors.entry(record.doctor.as_str()).or_default();
            doctor.visits.record(compliant);
            // Latest expiry wins when a doctor's rows disagree.
            doctor.license_expiry = doctor.license_expiry.max(record.license_expiry);
        }

        ComplianceReport {
            evaluated_on: today,
            thresholds: *thresholds,
            weekly: weekly_series(weeks),
            departments: department_summaries(departments, thresholds),
            doctors: doctor_summaries(doctors, thresholds, today),
        }
    }
}

fn weekly_series(weeks: BTreeMap<NaiveDate, Tally>) -> Vec<WeeklyCompliancePoint> {
    weeks
        .into_iter()
        .map(|(week_start, tally)| WeeklyCompliancePoint {
            week_start,
            total_visits: tally.total,
            compliant_visits: tally.compliant,
            compliance_pct: tally.pct(),
        })
        .collect()
}

fn department_summaries(
    departments: BTreeMap<&str, Tally>,
    thresholds: &ComplianceThresholds,
) -> Vec<DepartmentSummary> {
    let mut summaries: Vec<DepartmentSummary> = departments
        .into_iter()
        .map(|(department, tally)| {
            let compliance_pct = tally.pct();
            let status =
                DepartmentStatus::from_pct(compliance_pct, thresholds.department_threshold_pct());
            DepartmentSummary {
                department: department.to_string(),
                total_visits: tally.total,
                compliant_visits: tally.compliant,
                compliance_pct,
                status,
                status_label: status.label(),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total_visits
            .cmp(&a.total_visits)
            .then_with(|| a.department.cmp(&b.department))
    });
    summaries
}

fn doctor_summaries(
    doctors: BTreeMap<&str, DoctorTally>,
    thresholds: &ComplianceThresholds,
    today: NaiveDate,
) -> Vec<DoctorSummary> {
    let mut summaries: Vec<DoctorSummary> = doctors
        .into_iter()
        .map(|(doctor, tally)| {
            let license_status = LicenseStatus::classify(
                tally.license_expiry,
                today,
                thresholds.risk_window_days(),
            );
            DoctorSummary {
                doctor: doctor.to_string(),
                total_visits: tally.visits.total,
                compliant_visits: tally.visits.compliant,
                compliance_pct: tally.visits.pct(),
                license_expiry: tally.license_expiry,
                days_to_expiry: tally
                    .license_expiry
                    .map(|expiry| (expiry - today).num_days()),
                license_status,
                license_status_label: license_status.label(),
                license_risk: license_status.is_risk(),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.license_risk
            .cmp(&a.license_risk)
            .then_with(|| a.compliance_pct.total_cmp(&b.compliance_pct))
            .then_with(|| a.doctor.cmp(&b.doctor))
    });
    summaries
}
