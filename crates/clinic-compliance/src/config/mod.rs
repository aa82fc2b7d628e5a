use crate::workflows::compliance::{ComplianceThresholds, ThresholdError};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_TARGET_MINUTES: f64 = 30.0;
pub const DEFAULT_DEPARTMENT_THRESHOLD_PCT: f64 = 90.0;
pub const DEFAULT_RISK_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_OUTPUT_DIR: &str = "data/derived";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub compliance: ComplianceThresholds,
    pub refresh: RefreshConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let target_minutes = number_var("COMPLIANCE_TARGET_MINUTES", DEFAULT_TARGET_MINUTES)?;
        let department_threshold_pct = number_var(
            "COMPLIANCE_DEPARTMENT_THRESHOLD_PCT",
            DEFAULT_DEPARTMENT_THRESHOLD_PCT,
        )?;
        let risk_window_days = number_var("COMPLIANCE_RISK_WINDOW_DAYS", DEFAULT_RISK_WINDOW_DAYS)?;
        let compliance =
            ComplianceThresholds::new(target_minutes, department_threshold_pct, risk_window_days)
                .map_err(ConfigError::Thresholds)?;

        let alert_threshold_pct =
            number_var("REFRESH_ALERT_THRESHOLD_PCT", department_threshold_pct)?;
        if !(0.0..=100.0).contains(&alert_threshold_pct) {
            return Err(ConfigError::InvalidNumber {
                key: "REFRESH_ALERT_THRESHOLD_PCT",
                value: alert_threshold_pct.to_string(),
            });
        }

        let output_dir = env::var("REFRESH_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let webhook_url = env::var("REFRESH_WEBHOOK_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            compliance,
            refresh: RefreshConfig {
                alert_threshold_pct,
                output_dir,
                webhook_url,
            },
        })
    }
}

fn number_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        _ => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Scheduled refresh settings: when to alert and where derived tables land.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub alert_threshold_pct: f64,
    pub output_dir: PathBuf,
    pub webhook_url: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    Thresholds(ThresholdError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a valid number (found '{value}')")
            }
            ConfigError::Thresholds(err) => write!(f, "invalid compliance defaults: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Thresholds(err) => Some(err),
        }
    }
}
