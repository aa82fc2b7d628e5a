use crate::workflows::compliance::{
    ComplianceEngine, ComplianceReport, ComplianceThresholds, VisitRecord,
};
use crate::workflows::intake::{
    ColumnMapping, IntakeError, MappingError, RawTable, SkippedRows, VisitImporter,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Reruns intake and the compliance engine over a fresh export and decides
/// whether the latest week warrants an alert.
#[derive(Debug, Clone)]
pub struct RefreshJob {
    mapping: ColumnMapping,
    thresholds: ComplianceThresholds,
    alert_threshold_pct: f64,
}

/// Raised when the most recent week falls below the alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshAlert {
    pub week_start: NaiveDate,
    pub compliance_pct: f64,
    pub threshold_pct: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    pub report: ComplianceReport,
    pub skipped: SkippedRows,
    pub should_alert: bool,
    pub alert: Option<RefreshAlert>,
}

impl RefreshOutcome {
    /// No usable visits survived intake.
    pub fn is_empty(&self) -> bool {
        self.report.is_empty()
    }
}

impl RefreshJob {
    pub fn new(
        mapping: ColumnMapping,
        thresholds: ComplianceThresholds,
        alert_threshold_pct: f64,
    ) -> Self {
        Self {
            mapping,
            thresholds,
            alert_threshold_pct,
        }
    }

    pub fn alert_threshold_pct(&self) -> f64 {
        self.alert_threshold_pct
    }

    pub fn run_path<P: AsRef<Path>>(
        &self,
        path: P,
        today: NaiveDate,
    ) -> Result<RefreshOutcome, IntakeError> {
        let path = path.as_ref();
        info!(source = %path.display(), %today, "starting compliance refresh");
        let batch = VisitImporter::from_path(path, &self.mapping)?;
        Ok(self.evaluate(batch.records, batch.skipped, today))
    }

    pub fn run_reader<R: Read>(
        &self,
        reader: R,
        today: NaiveDate,
    ) -> Result<RefreshOutcome, IntakeError> {
        let batch = VisitImporter::from_reader(reader, &self.mapping)?;
        Ok(self.evaluate(batch.records, batch.skipped, today))
    }

    /// Runs against an already-read table, e.g. when the caller needed the
    /// headers to build the mapping.
    pub fn run_table(
        &self,
        table: &RawTable,
        today: NaiveDate,
    ) -> Result<RefreshOutcome, MappingError> {
        let batch = VisitImporter::normalize_table(table, &self.mapping)?;
        Ok(self.evaluate(batch.records, batch.skipped, today))
    }

    fn evaluate(
        &self,
        records: Vec<VisitRecord>,
        skipped: SkippedRows,
        today: NaiveDate,
    ) -> RefreshOutcome {
        let report = ComplianceEngine::evaluate(&records, &self.thresholds, today);

        let alert = report.latest_week().and_then(|week| {
            if week.compliance_pct < self.alert_threshold_pct {
                Some(RefreshAlert {
                    week_start: week.week_start,
                    compliance_pct: week.compliance_pct,
                    threshold_pct: self.alert_threshold_pct,
                    message: format!(
                        "Weekly compliance for week of {} is {:.1}%, below the {:.1}% alert threshold",
                        week.week_start, week.compliance_pct, self.alert_threshold_pct
                    ),
                })
            } else {
                None
            }
        });

        if report.is_empty() {
            warn!("refresh produced no usable visits; nothing to compare against threshold");
        }
        if let Some(alert) = &alert {
            warn!(
                week = %alert.week_start,
                compliance_pct = alert.compliance_pct,
                threshold_pct = alert.threshold_pct,
                "weekly compliance below alert threshold"
            );
        }
        info!(
            visits = records.len(),
            skipped = skipped.count,
            weeks = report.weekly.len(),
            alert = alert.is_some(),
            "compliance refresh complete"
        );

        RefreshOutcome {
            report,
            skipped,
            should_alert: alert.is_some(),
            alert,
        }
    }
}
