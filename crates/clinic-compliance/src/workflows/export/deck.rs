use super::ExportError;
use crate::workflows::compliance::{ComplianceReport, LicenseStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DECK_TITLE: &str = "Healthcare Waiting-Time Compliance Dashboard";
pub const DECK_FILE: &str = "summary_deck.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum Slide {
    Title {
        title: String,
        subtitle: String,
    },
    Bullets {
        title: String,
        bullets: Vec<String>,
    },
    Charts {
        title: String,
        weekly: Vec<ChartPoint<NaiveDate>>,
        departments: Vec<ChartPoint<String>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint<L> {
    pub label: L,
    pub value: f64,
}

/// Slide-by-slide content for the summary presentation. Rendering it into a
/// presentation file is left to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckOutline {
    pub slides: Vec<Slide>,
}

impl DeckOutline {
    pub fn from_report(report: &ComplianceReport, generated_at: NaiveDateTime) -> Self {
        let insights = report.insights();

        let title = Slide::Title {
            title: DECK_TITLE.to_string(),
            subtitle: format!(
                "Generated on {}\nDashboard Summary",
                generated_at.format("%Y-%m-%d %H:%M")
            ),
        };

        let findings = Slide::Bullets {
            title: "Key Findings".to_string(),
            bullets: insights.key_findings,
        };

        let charts = Slide::Charts {
            title: "Weekly & Department Compliance".to_string(),
            weekly: report
                .weekly
                .iter()
                .map(|point| ChartPoint {
                    label: point.week_start,
                    value: point.compliance_pct,
                })
                .collect(),
            departments: report
                .departments
                .iter()
                .map(|dept| ChartPoint {
                    label: dept.department.clone(),
                    value: dept.compliance_pct,
                })
                .collect(),
        };

        let mut risk_lines: Vec<String> = report
            .doctors
            .iter()
            .filter(|doctor| doctor.license_risk)
            .map(|doctor| {
                let expiry = doctor
                    .license_expiry
                    .map(|date| date.to_string())
                    .unwrap_or_default();
                let verb = match doctor.license_status {
                    LicenseStatus::Expired => "expired on",
                    _ => "expires",
                };
                format!(
                    "{}: license {} {} ({})",
                    doctor.doctor, verb, expiry, doctor.license_status_label
                )
            })
            .collect();
        if risk_lines.is_empty() {
            risk_lines.push("No licensing risks detected.".to_string());
        }
        let risks = Slide::Bullets {
            title: "Doctor Licensing Risks".to_string(),
            bullets: risk_lines,
        };

        Self {
            slides: vec![title, findings, charts, risks],
        }
    }

    pub fn write_json(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(DECK_FILE);
        let payload = serde_json::to_vec_pretty(self)?;
        fs::write(&path, payload)?;
        Ok(path)
    }
}
