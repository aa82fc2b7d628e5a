mod deck;
mod tables;

pub use deck::{ChartPoint, DeckOutline, Slide, DECK_FILE, DECK_TITLE};
pub use tables::{write_tables, ExportedTables, DEPARTMENT_FILE, DOCTOR_FILE, WEEKLY_FILE};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write CSV export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to serialize summary deck: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::compliance::{ComplianceEngine, ComplianceThresholds, VisitRecord};
    use chrono::{Duration, NaiveDate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 24).expect("valid date")
    }

    fn report_with_risk() -> crate::workflows::compliance::ComplianceReport {
        let records = vec![
            VisitRecord {
                visit_date: today(),
                department: "ER".to_string(),
                doctor: "Dr. A".to_string(),
                wait_minutes: 10.0,
                license_expiry: Some(today() + Duration::days(5)),
            },
            VisitRecord {
                visit_date: today(),
                department: "ER".to_string(),
                doctor: "Dr. B".to_string(),
                wait_minutes: 40.0,
                license_expiry: None,
            },
        ];
        ComplianceEngine::evaluate(&records, &ComplianceThresholds::default(), today())
    }

    #[test]
    fn tables_are_written_with_expected_headers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exported = write_tables(&report_with_risk(), dir.path()).expect("export succeeds");

        let departments = std::fs::read_to_string(&exported.departments).expect("readable");
        let mut lines = departments.lines();
        assert_eq!(
            lines.next(),
            Some("Department,Visits,Compliant Visits,Compliance %,Status")
        );
        assert_eq!(lines.next(), Some("ER,2,1,50.0,Below threshold"));

        let doctors = std::fs::read_to_string(&exported.doctors).expect("readable");
        assert!(doctors.starts_with("Doctor,Visits,Compliance %,License Expiry,Days to Expiry,Risk"));
        assert!(doctors.contains("Dr. A,1,100.0,2025-09-29,5,Expiring Soon"));
        assert!(doctors.contains("Dr. B,1,0.0,,,Unknown"));
    }

    #[test]
    fn empty_report_still_writes_headers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = ComplianceEngine::evaluate(&[], &ComplianceThresholds::default(), today());
        let exported = write_tables(&report, dir.path()).expect("export succeeds");
        let weekly = std::fs::read_to_string(exported.weekly).expect("readable");
        assert_eq!(weekly.trim_end(), "week_start,visits,compliant_visits,compliance_pct");
    }

    #[test]
    fn deck_outline_lists_license_risks() {
        let generated_at = today().and_hms_opt(6, 0, 0).expect("valid time");
        let deck = DeckOutline::from_report(&report_with_risk(), generated_at);
        assert_eq!(deck.slides.len(), 4);

        match &deck.slides[3] {
            Slide::Bullets { title, bullets } => {
                assert_eq!(title, "Doctor Licensing Risks");
                assert_eq!(bullets.len(), 1);
                assert!(bullets[0].starts_with("Dr. A"));
            }
            other => panic!("unexpected slide {other:?}"),
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let path = deck.write_json(dir.path()).expect("deck written");
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).expect("readable")).expect("valid json");
        assert_eq!(json["slides"][0]["layout"], "title");
        assert_eq!(json["slides"][0]["title"], DECK_TITLE);
    }

    #[test]
    fn deck_uses_past_tense_for_expired_licenses() {
        let records = vec![
            VisitRecord {
                visit_date: today(),
                department: "ER".to_string(),
                doctor: "Dr. C".to_string(),
                wait_minutes: 10.0,
                license_expiry: Some(today() - Duration::days(3)),
            },
            VisitRecord {
                visit_date: today(),
                department: "ER".to_string(),
                doctor: "Dr. D".to_string(),
                wait_minutes: 10.0,
                license_expiry: Some(today() + Duration::days(2)),
            },
        ];
        let report = ComplianceEngine::evaluate(&records, &ComplianceThresholds::default(), today());
        let deck = DeckOutline::from_report(&report, today().and_hms_opt(6, 0, 0).expect("time"));

        match &deck.slides[3] {
            Slide::Bullets { bullets, .. } => {
                assert!(bullets.contains(&"Dr. C: license expired on 2025-09-21 (Expired)".to_string()));
                assert!(bullets.contains(&"Dr. D: license expires 2025-09-26 (Expiring Soon)".to_string()));
            }
            other => panic!("unexpected slide {other:?}"),
        }
    }

    #[test]
    fn deck_without_risks_says_so() {
        let report = ComplianceEngine::evaluate(&[], &ComplianceThresholds::default(), today());
        let deck = DeckOutline::from_report(&report, today().and_hms_opt(6, 0, 0).expect("time"));
        assert_eq!(
            deck.slides[3],
            Slide::Bullets {
                title: "Doctor Licensing Risks".to_string(),
                bullets: vec!["No licensing risks detected.".to_string()],
            }
        );
    }
}
