use chrono::NaiveDate;
use clinic_compliance::workflows::compliance::{ComplianceThresholds, ThresholdError};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) thresholds: ComplianceThresholds,
}

/// Partial threshold input layered over the configured defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct ThresholdOverrides {
    #[serde(default)]
    pub(crate) target_minutes: Option<f64>,
    #[serde(default)]
    pub(crate) department_threshold_pct: Option<f64>,
    #[serde(default)]
    pub(crate) risk_window_days: Option<i64>,
}

impl ThresholdOverrides {
    pub(crate) fn apply(
        &self,
        base: &ComplianceThresholds,
    ) -> Result<ComplianceThresholds, ThresholdError> {
        ComplianceThresholds::new(
            self.target_minutes.unwrap_or(base.target_minutes()),
            self.department_threshold_pct
                .unwrap_or(base.department_threshold_pct()),
            self.risk_window_days.unwrap_or(base.risk_window_days()),
        )
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_values() {
        let base = ComplianceThresholds::default();
        let overrides = ThresholdOverrides {
            target_minutes: Some(15.0),
            ..ThresholdOverrides::default()
        };
        let applied = overrides.apply(&base).expect("valid thresholds");
        assert_eq!(applied.target_minutes(), 15.0);
        assert_eq!(
            applied.department_threshold_pct(),
            base.department_threshold_pct()
        );
        assert_eq!(applied.risk_window_days(), base.risk_window_days());
    }

    #[test]
    fn invalid_override_is_rejected() {
        let overrides = ThresholdOverrides {
            department_threshold_pct: Some(140.0),
            ..ThresholdOverrides::default()
        };
        assert_eq!(
            overrides.apply(&ComplianceThresholds::default()),
            Err(ThresholdError::DepartmentThreshold(140.0))
        );
    }

    #[test]
    fn parse_date_reports_bad_input() {
        assert!(parse_date("2025-09-24").is_ok());
        assert!(parse_date("24/09/2025").is_err());
    }
}
