use crate::infra::{deserialize_optional_date, AppState, ThresholdOverrides};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDate};
use clinic_compliance::error::AppError;
use clinic_compliance::workflows::compliance::{
    ComplianceEngine, ComplianceInsights, ComplianceOverview, ComplianceThresholds,
    DepartmentSummary, DoctorSummary, WeeklyCompliancePoint,
};
use clinic_compliance::workflows::intake::{
    read_table, ColumnMapping, IntakeError, SkippedRows, VisitImporter,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub(crate) struct ComplianceReportRequest {
    pub(crate) csv: String,
    /// Explicit column choices. Fields left out are auto-suggested from the headers.
    #[serde(default)]
    pub(crate) mapping: Option<ColumnMapping>,
    #[serde(default)]
    pub(crate) thresholds: Option<ThresholdOverrides>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) include_insights: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ComplianceReportResponse {
    pub(crate) today: NaiveDate,
    pub(crate) thresholds: ComplianceThresholds,
    pub(crate) mapping: ColumnMapping,
    pub(crate) skipped: SkippedRows,
    pub(crate) warnings: Vec<String>,
    pub(crate) overview: ComplianceOverview,
    pub(crate) weekly: Vec<WeeklyCompliancePoint>,
    pub(crate) departments: Vec<DepartmentSummary>,
    pub(crate) doctors: Vec<DoctorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) insights: Option<ComplianceInsights>,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/compliance/report", post(compliance_report_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn compliance_report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ComplianceReportRequest>,
) -> Result<Json<ComplianceReportResponse>, AppError> {
    let ComplianceReportRequest {
        csv,
        mapping,
        thresholds,
        today,
        include_insights,
    } = payload;

    let thresholds = thresholds.unwrap_or_default().apply(&state.thresholds)?;
    let table = read_table(Cursor::new(csv.into_bytes())).map_err(IntakeError::from)?;

    let suggested = ColumnMapping::suggest(table.headers());
    let mapping = match mapping {
        Some(explicit) => suggested.merged_with(&explicit),
        None => suggested,
    };
    let batch = VisitImporter::normalize_table(&table, &mapping)?;

    let mut warnings = Vec::new();
    if batch.is_empty() {
        warnings.push("No usable visit rows after normalization.".to_string());
    }
    if !batch.skipped.is_empty() {
        warnings.push(format!(
            "{} row(s) skipped during normalization.",
            batch.skipped.count
        ));
    }
    if !warnings.is_empty() {
        warn!(?warnings, "compliance report built with warnings");
    }

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let report = ComplianceEngine::evaluate(&batch.records, &thresholds, today);
    let overview = report.overview();
    let insights = include_insights.then(|| report.insights());

    Ok(Json(ComplianceReportResponse {
        today,
        thresholds,
        mapping,
        skipped: batch.skipped,
        warnings,
        overview,
        weekly: report.weekly,
        departments: report.departments,
        doctors: report.doctors,
        insights,
    }))
}
