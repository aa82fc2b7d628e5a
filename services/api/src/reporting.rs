use crate::infra::ThresholdOverrides;
use crate::notify::AlertNotifier;
use chrono::{Local, NaiveDate};
use clap::Args;
use clinic_compliance::config::AppConfig;
use clinic_compliance::error::AppError;
use clinic_compliance::telemetry;
use clinic_compliance::workflows::compliance::{
    ComplianceEngine, ComplianceInsights, ComplianceOverview, ComplianceReport,
};
use clinic_compliance::workflows::export::{write_tables, DeckOutline};
use clinic_compliance::workflows::intake::{
    read_table, ColumnMapping, IntakeError, RawTable, SemanticField, SkippedRows, VisitImporter,
};
use clinic_compliance::workflows::refresh::RefreshJob;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct MappingArgs {
    /// Column holding the visit date
    #[arg(long)]
    pub(crate) visit_date_col: Option<String>,
    /// Column holding the department name
    #[arg(long)]
    pub(crate) department_col: Option<String>,
    /// Column holding the doctor name
    #[arg(long)]
    pub(crate) doctor_col: Option<String>,
    /// Column holding waiting time in minutes
    #[arg(long)]
    pub(crate) wait_minutes_col: Option<String>,
    /// Column holding the arrival timestamp (used with --seen-col)
    #[arg(long)]
    pub(crate) arrival_col: Option<String>,
    /// Column holding the seen-by-doctor timestamp (used with --arrival-col)
    #[arg(long)]
    pub(crate) seen_col: Option<String>,
    /// Column holding the doctor's license expiry date
    #[arg(long)]
    pub(crate) license_expiry_col: Option<String>,
    /// Guess unmapped fields from the header names
    #[arg(long)]
    pub(crate) auto_map: bool,
}

impl MappingArgs {
    fn explicit(&self) -> ColumnMapping {
        let mut mapping = ColumnMapping::new();
        for (field, column) in [
            (SemanticField::VisitDate, &self.visit_date_col),
            (SemanticField::Department, &self.department_col),
            (SemanticField::Doctor, &self.doctor_col),
            (SemanticField::WaitMinutes, &self.wait_minutes_col),
            (SemanticField::ArrivalTime, &self.arrival_col),
            (SemanticField::SeenTime, &self.seen_col),
            (SemanticField::LicenseExpiry, &self.license_expiry_col),
        ] {
            if let Some(column) = column {
                mapping.set(field, column.clone());
            }
        }
        mapping
    }

    pub(crate) fn mapping_for(&self, headers: &[String]) -> ColumnMapping {
        let explicit = self.explicit();
        if self.auto_map {
            ColumnMapping::suggest(headers).merged_with(&explicit)
        } else {
            explicit
        }
    }
}

#[derive(Args, Debug, Default, Clone, Copy)]
pub(crate) struct ThresholdArgs {
    /// Maximum waiting minutes for a compliant visit
    #[arg(long)]
    pub(crate) target_minutes: Option<f64>,
    /// Department compliance percentage required to meet threshold
    #[arg(long)]
    pub(crate) department_threshold: Option<f64>,
    /// Days before expiry a license counts as expiring soon
    #[arg(long)]
    pub(crate) risk_window_days: Option<i64>,
}

impl From<ThresholdArgs> for ThresholdOverrides {
    fn from(args: ThresholdArgs) -> Self {
        ThresholdOverrides {
            target_minutes: args.target_minutes,
            department_threshold_pct: args.department_threshold,
            risk_window_days: args.risk_window_days,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Visit export (CSV) to analyze
    #[arg(long)]
    pub(crate) input: PathBuf,
    #[command(flatten)]
    pub(crate) mapping: MappingArgs,
    #[command(flatten)]
    pub(crate) thresholds: ThresholdArgs,
    /// Evaluation date for license checks (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RefreshArgs {
    /// Visit export (CSV) to refresh from
    #[arg(long)]
    pub(crate) input: PathBuf,
    #[command(flatten)]
    pub(crate) mapping: MappingArgs,
    #[command(flatten)]
    pub(crate) thresholds: ThresholdArgs,
    /// Alert when the latest week's compliance falls below this percentage
    #[arg(long)]
    pub(crate) alert_threshold: Option<f64>,
    /// Directory for derived tables and the deck outline
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
    /// Evaluation date for license checks (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct ReportOutput<'a> {
    mapping: &'a ColumnMapping,
    skipped: &'a SkippedRows,
    #[serde(flatten)]
    report: &'a ComplianceReport,
    overview: ComplianceOverview,
    insights: ComplianceInsights,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    execute_report(args, &config)
}

fn execute_report(args: ReportArgs, config: &AppConfig) -> Result<(), AppError> {
    let ReportArgs {
        input,
        mapping,
        thresholds,
        today,
        json,
    } = args;

    let thresholds = ThresholdOverrides::from(thresholds).apply(&config.compliance)?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let table = load_table(&input)?;
    let mapping = mapping.mapping_for(table.headers());
    let batch = VisitImporter::normalize_table(&table, &mapping)?;
    let report = ComplianceEngine::evaluate(&batch.records, &thresholds, today);

    if json {
        let output = ReportOutput {
            mapping: &mapping,
            skipped: &batch.skipped,
            report: &report,
            overview: report.overview(),
            insights: report.insights(),
        };
        let rendered = serde_json::to_string_pretty(&output).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        render_report(&input, &report, &batch.skipped);
    }

    Ok(())
}

pub(crate) async fn run_refresh(args: RefreshArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    execute_refresh(args, &config).await
}

async fn execute_refresh(args: RefreshArgs, config: &AppConfig) -> Result<(), AppError> {
    let RefreshArgs {
        input,
        mapping,
        thresholds,
        alert_threshold,
        output_dir,
        today,
    } = args;

    let thresholds = ThresholdOverrides::from(thresholds).apply(&config.compliance)?;
    let alert_threshold_pct = alert_threshold.unwrap_or(config.refresh.alert_threshold_pct);
    let output_dir = output_dir.unwrap_or_else(|| config.refresh.output_dir.clone());
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    info!(source = %input.display(), %today, "starting compliance refresh");
    let table = load_table(&input).inspect_err(|err| error!(%err, "refresh input unreadable"))?;
    let mapping = mapping.mapping_for(table.headers());
    let job = RefreshJob::new(mapping, thresholds, alert_threshold_pct);
    let outcome = job
        .run_table(&table, today)
        .inspect_err(|err| error!(%err, "refresh aborted: column mapping invalid"))?;

    let tables = write_tables(&outcome.report, &output_dir)?;
    let deck = DeckOutline::from_report(&outcome.report, Local::now().naive_local());
    let deck_path = deck.write_json(&output_dir)?;
    info!(
        weekly = %tables.weekly.display(),
        departments = %tables.departments.display(),
        doctors = %tables.doctors.display(),
        deck = %deck_path.display(),
        "derived outputs written"
    );

    if let Some(alert) = &outcome.alert {
        let notifier = AlertNotifier::new(config.refresh.webhook_url.clone());
        if let Err(err) = notifier.notify(alert).await {
            warn!(%err, "refresh alert could not be delivered");
        }
    }

    println!(
        "Refresh complete: {} visits, {} skipped, alert: {}. Outputs written to {}",
        outcome.report.overview().total_visits,
        outcome.skipped.count,
        if outcome.should_alert { "yes" } else { "no" },
        output_dir.display()
    );

    Ok(())
}

fn load_table(path: &Path) -> Result<RawTable, AppError> {
    let file = File::open(path).map_err(IntakeError::from)?;
    Ok(read_table(file).map_err(IntakeError::from)?)
}

fn render_report(input: &Path, report: &ComplianceReport, skipped: &SkippedRows) {
    let thresholds = &report.thresholds;
    let overview = report.overview();

    println!(
        "Waiting-time compliance report for {} (as of {})",
        input.display(),
        report.evaluated_on
    );
    println!(
        "Target: <= {} min | Department threshold: {}% | License window: {} days",
        thresholds.target_minutes(),
        thresholds.department_threshold_pct(),
        thresholds.risk_window_days()
    );
    println!(
        "Visits: {} | Compliant: {} ({:.1}%) | Noncompliant: {:.1}%",
        overview.total_visits,
        overview.compliant_visits,
        overview.compliance_pct,
        overview.noncompliant_pct
    );

    if !skipped.is_empty() {
        println!("\nSkipped rows: {}", skipped.count);
        for row in &skipped.sample {
            println!("  - {row}");
        }
        if skipped.count > skipped.sample.len() {
            println!("  ... and {} more", skipped.count - skipped.sample.len());
        }
    }

    if report.is_empty() {
        println!("\nNo usable visit rows; check the column mapping.");
        return;
    }

    println!("\nWeekly compliance:");
    for week in &report.weekly {
        println!(
            "  - week of {}: {:.1}% ({}/{})",
            week.week_start, week.compliance_pct, week.compliant_visits, week.total_visits
        );
    }

    println!("\nDepartments:");
    for dept in &report.departments {
        println!(
            "  - {}: {:.1}% ({}/{}) {}",
            dept.department,
            dept.compliance_pct,
            dept.compliant_visits,
            dept.total_visits,
            dept.status_label
        );
    }

    println!("\nDoctors:");
    for doctor in &report.doctors {
        let license = match (doctor.license_expiry, doctor.days_to_expiry) {
            (Some(expiry), Some(days)) => format!("license {expiry} ({days} days)"),
            _ => "license unknown".to_string(),
        };
        println!(
            "  - {}: {:.1}% of {} visits | {} | {}",
            doctor.doctor,
            doctor.compliance_pct,
            doctor.total_visits,
            license,
            doctor.license_status_label
        );
    }

    let insights = report.insights();
    println!("\nKey findings:");
    for line in &insights.key_findings {
        println!("  - {line}");
    }
    if !insights.licensing_actions.is_empty() {
        println!("\nLicensing actions:");
        for line in &insights.licensing_actions {
            println!("  - {line}");
        }
    }
}
