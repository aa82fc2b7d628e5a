use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single outpatient visit after column mapping and normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub visit_date: NaiveDate,
    pub department: String,
    pub doctor: String,
    pub wait_minutes: f64,
    #[serde(default)]
    pub license_expiry: Option<NaiveDate>,
}

impl VisitRecord {
    pub fn is_compliant(&self, thresholds: &ComplianceThresholds) -> bool {
        self.wait_minutes <= thresholds.target_minutes
    }

    /// Monday of the week containing the visit.
    pub fn week_start(&self) -> NaiveDate {
        week_start(self.visit_date)
    }
}

/// Monday on or before `date`. Dates in chrono's first partial week have no
/// representable Monday and map to `NaiveDate::MIN`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_signed(Duration::days(i64::from(
        date.weekday().num_days_from_monday(),
    )))
    .unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("target minutes must be a positive number (found {0})")]
    TargetMinutes(f64),
    #[error("department threshold must be between 0 and 100 percent (found {0})")]
    DepartmentThreshold(f64),
    #[error("license risk window must not be negative (found {0} days)")]
    RiskWindow(i64),
}

/// Caller-supplied knobs for a compliance evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplianceThresholds {
    target_minutes: f64,
    department_threshold_pct: f64,
    risk_window_days: i64,
}

impl ComplianceThresholds {
    pub fn new(
        target_minutes: f64,
        department_threshold_pct: f64,
        risk_window_days: i64,
    ) -> Result<Self, ThresholdError> {
        if !target_minutes.is_finite() || target_minutes <= 0.0 {
            return Err(ThresholdError::TargetMinutes(target_minutes));
        }
        if !(0.0..=100.0).contains(&department_threshold_pct) {
            return Err(ThresholdError::DepartmentThreshold(
                department_threshold_pct,
            ));
        }
        if risk_window_days < 0 {
            return Err(ThresholdError::RiskWindow(risk_window_days));
        }

        Ok(Self {
            target_minutes,
            department_threshold_pct,
            risk_window_days,
        })
    }

    pub fn target_minutes(&self) -> f64 {
        self.target_minutes
    }

    pub fn department_threshold_pct(&self) -> f64 {
        self.department_threshold_pct
    }

    pub fn risk_window_days(&self) -> i64 {
        self.risk_window_days
    }

    pub fn with_risk_window_days(self, risk_window_days: i64) -> Result<Self, ThresholdError> {
        Self::new(
            self.target_minutes,
            self.department_threshold_pct,
            risk_window_days,
        )
    }
}

impl Default for ComplianceThresholds {
    fn default() -> Self {
        Self {
            target_minutes: crate::config::DEFAULT_TARGET_MINUTES,
            department_threshold_pct: crate::config::DEFAULT_DEPARTMENT_THRESHOLD_PCT,
            risk_window_days: crate::config::DEFAULT_RISK_WINDOW_DAYS,
        }
    }
}

#[derive(Deserialize)]
struct ThresholdsInput {
    #[serde(default = "default_target_minutes")]
    target_minutes: f64,
    #[serde(default = "default_department_threshold_pct")]
    department_threshold_pct: f64,
    #[serde(default = "default_risk_window_days")]
    risk_window_days: i64,
}

fn default_target_minutes() -> f64 {
    crate::config::DEFAULT_TARGET_MINUTES
}

fn default_department_threshold_pct() -> f64 {
    crate::config::DEFAULT_DEPARTMENT_THRESHOLD_PCT
}

fn default_risk_window_days() -> i64 {
    crate::config::DEFAULT_RISK_WINDOW_DAYS
}

impl<'de> Deserialize<'de> for ComplianceThresholds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let input = ThresholdsInput::deserialize(deserializer)?;
        Self::new(
            input.target_minutes,
            input.department_threshold_pct,
            input.risk_window_days,
        )
        .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentStatus {
    MeetsThreshold,
    BelowThreshold,
}

impl DepartmentStatus {
    pub fn from_pct(compliance_pct: f64, threshold_pct: f64) -> Self {
        if compliance_pct >= threshold_pct {
            Self::MeetsThreshold
        } else {
            Self::BelowThreshold
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::MeetsThreshold => "Meets threshold",
            Self::BelowThreshold => "Below threshold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    Expired,
    ExpiringSoon,
    Ok,
    Unknown,
}

impl LicenseStatus {
    /// Classifies a license against `today`; the warning window is inclusive.
    pub fn classify(
        license_expiry: Option<NaiveDate>,
        today: NaiveDate,
        risk_window_days: i64,
    ) -> Self {
        match license_expiry.map(|expiry| (expiry - today).num_days()) {
            None => Self::Unknown,
            Some(days) if days < 0 => Self::Expired,
            Some(days) if days <= risk_window_days => Self::ExpiringSoon,
            Some(_) => Self::Ok,
        }
    }

    pub const fn is_risk(self) -> bool {
        matches!(self, Self::Expired | Self::ExpiringSoon)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Expired => "Expired",
            Self::ExpiringSoon => "Expiring Soon",
            Self::Ok => "OK",
            Self::Unknown => "Unknown",
        }
    }
}

/// `100 * part / whole`, rounded half away from zero to one decimal place.
pub fn compliance_pct(compliant: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_one_decimal(100.0 * compliant as f64 / total as f64)
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
