use serde::{Deserialize, Serialize};

/// Logging configuration supplied by the host service at startup.
///
/// Unknown or missing values never fail: an unrecognized `log_level` falls
/// back to the default level, and a `None` error-reporting group simply
/// leaves the reporting hook unregistered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum severity name: one of `ERROR`, `WARNING`, `INFO`, `DEBUG`
    /// (case-sensitive). Anything else means `INFO`.
    pub log_level: String,
    /// Deployment environment, forwarded to the reporter as its release
    /// stage.
    pub environment: String,
    pub app_version: String,
    /// Present when the error-reporting integration is enabled.
    pub error_reporting: Option<ErrorReportingConfig>,
}

/// Settings group for the external error-reporting client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorReportingConfig {
    pub api_key: String,
    /// Release stages that are allowed to submit reports.
    pub notify_release_stages: Vec<String>,
    /// Package filters identifying in-project stack frames.
    pub project_packages: Vec<String>,
    /// Path filters identifying in-project source files.
    pub project_paths: Vec<String>,
    pub package_root: Option<String>,
}

/// Everything the error-reporting client needs to identify this process and
/// filter its reports. Assembled from [`LoggingConfig`] when the hook is
/// registered.
#[derive(Debug, Clone, Default)]
pub struct ReporterSettings {
    pub api_key: String,
    pub release_stage: String,
    pub app_version: String,
    pub notify_release_stages: Vec<String>,
    pub project_packages: Vec<String>,
    pub project_paths: Vec<String>,
    pub package_root: Option<String>,
}

impl ReporterSettings {
    pub fn from_config(config: &LoggingConfig) -> Self {
        let reporting = config.error_reporting.clone().unwrap_or_default();
        Self {
            api_key: reporting.api_key,
            release_stage: config.environment.clone(),
            app_version: config.app_version.clone(),
            notify_release_stages: reporting.notify_release_stages,
            project_packages: reporting.project_packages,
            project_paths: reporting.project_paths,
            package_root: reporting.package_root,
        }
    }
}
