use chrono::{Duration, NaiveDate};
use clinic_compliance::workflows::compliance::{
    ComplianceEngine, ComplianceThresholds, LicenseStatus, VisitRecord,
};
use proptest::prelude::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 24).expect("valid date")
}

prop_compose! {
    fn arb_visit()(
        day_offset in -90i64..0,
        department in prop::sample::select(vec!["ER", "Cardiology", "Pediatrics", "Radiology"]),
        doctor in prop::sample::select(vec!["Dr. A", "Dr. B", "Dr. C", "Dr. D", "Dr. E"]),
        wait_minutes in 0.0f64..180.0,
        expiry_offset in prop::option::of(-60i64..120),
    ) -> VisitRecord {
        VisitRecord {
            visit_date: today() + Duration::days(day_offset),
            department: department.to_string(),
            doctor: doctor.to_string(),
            wait_minutes,
            license_expiry: expiry_offset.map(|offset| today() + Duration::days(offset)),
        }
    }
}

prop_compose! {
    fn arb_thresholds()(
        target in 1.0f64..120.0,
        department_pct in 0.0f64..=100.0,
        window in 0i64..365,
    ) -> ComplianceThresholds {
        ComplianceThresholds::new(target, department_pct, window).expect("generated thresholds are valid")
    }
}

proptest! {
    #[test]
    fn department_counts_sum_to_overall(
        records in prop::collection::vec(arb_visit(), 0..200),
        thresholds in arb_thresholds(),
    ) {
        let report = ComplianceEngine::evaluate(&records, &thresholds, today());
        let expected = records.iter().filter(|record| record.is_compliant(&thresholds)).count();

        let by_department: usize = report.departments.iter().map(|dept| dept.compliant_visits).sum();
        let by_week: usize = report.weekly.iter().map(|week| week.compliant_visits).sum();
        let by_doctor: usize = report.doctors.iter().map(|doctor| doctor.compliant_visits).sum();
        prop_assert_eq!(by_department, expected);
        prop_assert_eq!(by_week, expected);
        prop_assert_eq!(by_doctor, expected);

        let visits: usize = report.departments.iter().map(|dept| dept.total_visits).sum();
        prop_assert_eq!(visits, records.len());
    }

    #[test]
    fn percentages_stay_in_range(
        records in prop::collection::vec(arb_visit(), 0..200),
        thresholds in arb_thresholds(),
    ) {
        let report = ComplianceEngine::evaluate(&records, &thresholds, today());
        let pcts = report
            .weekly
            .iter()
            .map(|week| week.compliance_pct)
            .chain(report.departments.iter().map(|dept| dept.compliance_pct))
            .chain(report.doctors.iter().map(|doctor| doctor.compliance_pct));
        for pct in pcts {
            prop_assert!((0.0..=100.0).contains(&pct), "pct out of range: {}", pct);
        }

        let overview = report.overview();
        prop_assert!((0.0..=100.0).contains(&overview.compliance_pct));
        prop_assert!((0.0..=100.0).contains(&overview.noncompliant_pct));
    }

    #[test]
    fn doctors_without_expiry_are_never_flagged(
        records in prop::collection::vec(arb_visit(), 1..120),
        thresholds in arb_thresholds(),
    ) {
        let report = ComplianceEngine::evaluate(&records, &thresholds, today());
        for doctor in &report.doctors {
            if doctor.license_expiry.is_none() {
                prop_assert_eq!(doctor.license_status, LicenseStatus::Unknown);
                prop_assert!(!doctor.license_risk);
                prop_assert!(doctor.days_to_expiry.is_none());
            }
        }
    }

    #[test]
    fn evaluation_is_deterministic(
        records in prop::collection::vec(arb_visit(), 0..120),
        thresholds in arb_thresholds(),
    ) {
        let first = ComplianceEngine::evaluate(&records, &thresholds, today());
        let second = ComplianceEngine::evaluate(&records, &thresholds, today());
        prop_assert_eq!(first, second);
    }
}
