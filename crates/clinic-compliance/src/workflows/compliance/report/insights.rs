use super::super::domain::{DepartmentStatus, LicenseStatus};
use super::summary::ComplianceReport;
use super::views::{ComplianceInsights, ComplianceOverview};

pub(crate) fn generate_insights(
    report: &ComplianceReport,
    overview: &ComplianceOverview,
) -> ComplianceInsights {
    let mut key_findings = Vec::new();
    key_findings.push(format!(
        "Total visits analyzed: {}",
        with_thousands(overview.total_visits)
    ));

    if overview.total_visits == 0 {
        key_findings.push("No usable visit rows; check the column mapping".to_string());
        return ComplianceInsights {
            key_findings,
            ..ComplianceInsights::default()
        };
    }

    key_findings.push(format!(
        "Noncompliant visits: {:.1}%",
        overview.noncompliant_pct
    ));

    if let Some(best) = &overview.best_department {
        key_findings.push(format!(
            "Best department: {} ({:.1}%)",
            best.department, best.compliance_pct
        ));
    }
    if let Some(worst) = &overview.worst_department {
        key_findings.push(format!(
            "Worst department: {} ({:.1}%)",
            worst.department, worst.compliance_pct
        ));
    }

    let has_expiry_data = report
        .doctors
        .iter()
        .any(|doctor| doctor.license_status != LicenseStatus::Unknown);
    if has_expiry_data {
        key_findings.push(format!(
            "Licensing risks: {} expired, {} expiring soon (within {} days)",
            overview.expired_licenses,
            overview.expiring_soon_licenses,
            report.thresholds.risk_window_days()
        ));
    }

    if let Some(latest) = report.latest_week() {
        key_findings.push(format!(
            "Week of {}: {:.1}% of {} visits seen within {} minutes",
            latest.week_start,
            latest.compliance_pct,
            latest.total_visits,
            report.thresholds.target_minutes()
        ));
    }

    let departments_below_threshold = report
        .departments
        .iter()
        .filter(|dept| dept.status == DepartmentStatus::BelowThreshold)
        .map(|dept| {
            format!(
                "{} at {:.1}% (threshold {:.1}%)",
                dept.department,
                dept.compliance_pct,
                report.thresholds.department_threshold_pct()
            )
        })
        .collect();

    let licensing_actions = report
        .doctors
        .iter()
        .filter(|doctor| doctor.license_risk)
        .map(|doctor| match (doctor.license_expiry, doctor.days_to_expiry) {
            (Some(expiry), Some(days)) if days < 0 => format!(
                "{}: license expired on {} ({} days ago)",
                doctor.doctor, expiry, -days
            ),
            (Some(expiry), Some(days)) => format!(
                "{}: license expires on {} (in {} days)",
                doctor.doctor, expiry, days
            ),
            _ => format!("{}: license status {}", doctor.doctor, doctor.license_status_label),
        })
        .collect();

    ComplianceInsights {
        key_findings,
        departments_below_threshold,
        licensing_actions,
    }
}

fn with_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
