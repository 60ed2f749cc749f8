use crate::config::ReporterSettings;
use crate::entry::{ERROR_KEY, FieldValue};
use crate::level::Severity;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The only error an emit call surfaces: a hook failed to deliver its side
/// effect. The record itself is still written.
#[derive(Error, Debug)]
pub enum HookError {
    #[error("error report submission failed: {0}")]
    Submission(String),
}

/// Borrowed view of a record, handed to hooks during the emit it qualified
/// for.
pub struct Record<'a> {
    pub severity: Severity,
    pub message: &'a str,
    pub fields: &'a BTreeMap<String, FieldValue>,
}

/// Side-effect handler fired synchronously for qualifying records.
///
/// Hooks live in a list on the logger; every hook whose levels contain an
/// emitted record's severity fires before the record is written.
pub trait Hook: Send + Sync {
    /// Severities this hook wants to see.
    fn levels(&self) -> &[Severity];
    fn fire(&self, record: &Record<'_>) -> Result<(), HookError>;
}

/// Metadata tabs submitted alongside a report.
pub type Metadata = BTreeMap<String, serde_json::Map<String, serde_json::Value>>;

/// One report for the error-tracking service.
pub struct ErrorReport {
    pub error: Arc<dyn StdError + Send + Sync>,
    /// Classification label resolved from the error chain.
    pub class: String,
    /// Internal frames between the original emit call and the submission,
    /// for the client to drop from its captured stack trace.
    pub skip_frames: usize,
    pub metadata: Metadata,
}

/// Client of the external error-tracking service.
pub trait ErrorReporter: Send + Sync {
    /// Applies project-level settings. Called once while the owning logger
    /// is built, before any record can reach [`notify`](Self::notify).
    fn configure(&self, settings: &ReporterSettings);
    /// Submits one report. Synchronous and best-effort: no retries here; a
    /// failure propagates to the caller of the emit that fired the hook.
    fn notify(&self, report: &ErrorReport) -> Result<(), HookError>;
}

const REPORTED_LEVELS: &[Severity] = &[Severity::Error, Severity::Fatal, Severity::Panic];
const SKIP_STACK_FRAMES: usize = 4;
const MAX_UNWRAP_DEPTH: usize = 10;
const METADATA_TAB: &str = "metadata";

/// Forwards error-and-above records to the error-tracking service.
pub struct ErrorReportingHook {
    reporter: Arc<dyn ErrorReporter>,
}

impl ErrorReportingHook {
    pub fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { reporter }
    }
}

impl Hook for ErrorReportingHook {
    fn levels(&self) -> &[Severity] {
        REPORTED_LEVELS
    }

    fn fire(&self, record: &Record<'_>) -> Result<(), HookError> {
        let error = reportable_error(record);
        let class = resolve_error_class(error.as_ref());
        let report = ErrorReport {
            error,
            class,
            skip_frames: SKIP_STACK_FRAMES,
            metadata: metadata_from(record),
        };
        self.reporter.notify(&report)
    }
}

/// An error prefixed with the log message that accompanied it.
#[derive(Debug)]
pub struct WrappedError {
    message: String,
    source: Arc<dyn StdError + Send + Sync>,
}

impl WrappedError {
    fn new(message: &str, source: Arc<dyn StdError + Send + Sync>) -> Self {
        Self { message: message.to_string(), source }
    }
}

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.message, self.source)
    }
}

impl StdError for WrappedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.source)
    }
}

/// Record that carried no error value: the message text itself becomes the
/// error.
#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for MessageError {}

fn reportable_error(record: &Record<'_>) -> Arc<dyn StdError + Send + Sync> {
    match record.fields.get(ERROR_KEY) {
        Some(FieldValue::Error(err)) if record.message.is_empty() => err.clone(),
        Some(FieldValue::Error(err)) => Arc::new(WrappedError::new(record.message, err.clone())),
        _ => Arc::new(MessageError(record.message.to_string())),
    }
}

/// Resolves the classification label by unwrapping message-wrapper layers to
/// the first underlying error, at most [`MAX_UNWRAP_DEPTH`] levels deep.
fn resolve_error_class(error: &(dyn StdError + 'static)) -> String {
    let mut current = error;
    let mut depth = 0;
    while current.is::<WrappedError>() {
        let Some(inner) = current.source() else { break };
        depth += 1;
        if depth > MAX_UNWRAP_DEPTH {
            eprintln!("failed to resolve error class within {MAX_UNWRAP_DEPTH} unwraps: {error}");
            break;
        }
        current = inner;
    }
    current.to_string()
}

fn metadata_from(record: &Record<'_>) -> Metadata {
    let mut tab = serde_json::Map::new();
    for (key, value) in record.fields {
        if key != ERROR_KEY {
            tab.insert(key.clone(), value.as_json());
        }
    }
    let mut metadata = Metadata::new();
    metadata.insert(METADATA_TAB.to_string(), tab);
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ErrorReportingConfig, LoggingConfig};
    use crate::logger::Logger;
    use crate::test_support::captured_logger;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CapturingReporter {
        settings: Mutex<Option<ReporterSettings>>,
        reports: Mutex<Vec<(String, String, usize, Metadata)>>,
        fail_submission: bool,
    }

    impl ErrorReporter for CapturingReporter {
        fn configure(&self, settings: &ReporterSettings) {
            *self.settings.lock() = Some(settings.clone());
        }

        fn notify(&self, report: &ErrorReport) -> Result<(), HookError> {
            self.reports.lock().push((
                report.error.to_string(),
                report.class.clone(),
                report.skip_frames,
                report.metadata.clone(),
            ));
            if self.fail_submission {
                return Err(HookError::Submission("service unreachable".to_string()));
            }
            Ok(())
        }
    }

    fn hooked_logger(reporter: Arc<CapturingReporter>) -> (Logger, crate::test_support::CaptureSink) {
        let (logger, sink) = captured_logger("DEBUG");
        logger.add_hook(Box::new(ErrorReportingHook::new(reporter)));
        (logger, sink)
    }

    #[test]
    fn error_field_is_wrapped_with_message_prefix() {
        let reporter = Arc::new(CapturingReporter::default());
        let (logger, _sink) = hooked_logger(reporter.clone());

        logger.with_error(std::io::Error::other("oops")).error("saving user").unwrap();

        let reports = reporter.reports.lock();
        let (error, class, skip_frames, _) = &reports[0];
        assert_eq!(error, "saving user: oops");
        assert_eq!(class, "oops");
        assert_eq!(*skip_frames, 4);
    }

    #[test]
    fn error_field_with_empty_message_passes_through() {
        let reporter = Arc::new(CapturingReporter::default());
        let (logger, _sink) = hooked_logger(reporter.clone());

        logger.with_error(std::io::Error::other("oops")).error("").unwrap();

        let reports = reporter.reports.lock();
        assert_eq!(reports[0].0, "oops");
    }

    #[test]
    fn message_alone_becomes_the_error() {
        let reporter = Arc::new(CapturingReporter::default());
        let (logger, _sink) = hooked_logger(reporter.clone());

        logger.error("nothing attached").unwrap();

        let reports = reporter.reports.lock();
        assert_eq!(reports[0].0, "nothing attached");
        assert_eq!(reports[0].1, "nothing attached");
    }

    #[test]
    fn metadata_excludes_the_error_field() {
        let reporter = Arc::new(CapturingReporter::default());
        let (logger, _sink) = hooked_logger(reporter.clone());

        logger
            .with_error(std::io::Error::other("oops"))
            .with_user(9)
            .with_channel("fcm")
            .error("boom")
            .unwrap();

        let reports = reporter.reports.lock();
        let tab = &reports[0].3[METADATA_TAB];
        assert_eq!(tab["user_id"], 9);
        assert_eq!(tab["channel"], "fcm");
        assert!(!tab.contains_key(ERROR_KEY));
    }

    #[test]
    fn records_below_error_do_not_fire() {
        let reporter = Arc::new(CapturingReporter::default());
        let (logger, _sink) = hooked_logger(reporter.clone());

        logger.with_error(std::io::Error::other("oops")).warning("survivable").unwrap();

        assert!(reporter.reports.lock().is_empty());
    }

    #[test]
    fn submission_failure_propagates_but_record_is_written() {
        let reporter = Arc::new(CapturingReporter { fail_submission: true, ..Default::default() });
        let (logger, sink) = hooked_logger(reporter);

        let result = logger.error("still logged");
        assert!(matches!(result, Err(HookError::Submission(_))));
        assert!(sink.contents().contains("still logged"));
    }

    #[test]
    fn with_reporter_configures_the_client() {
        let reporter = Arc::new(CapturingReporter::default());
        let config = LoggingConfig {
            log_level: "INFO".to_string(),
            environment: "production".to_string(),
            app_version: "2.0.0".to_string(),
            error_reporting: Some(ErrorReportingConfig {
                api_key: "key".to_string(),
                ..ErrorReportingConfig::default()
            }),
        };

        let _logger = Logger::with_reporter(&config, reporter.clone());

        let settings = reporter.settings.lock();
        let settings = settings.as_ref().unwrap();
        assert_eq!(settings.api_key, "key");
        assert_eq!(settings.release_stage, "production");
        assert_eq!(settings.app_version, "2.0.0");
    }

    #[test]
    fn class_resolves_through_nested_wrappers() {
        let root: Arc<dyn StdError + Send + Sync> = Arc::new(std::io::Error::other("root cause"));
        let inner = Arc::new(WrappedError::new("inner", root));
        let outer = WrappedError::new("outer", inner);

        assert_eq!(resolve_error_class(&outer), "root cause");
    }

    #[test]
    fn class_resolution_stops_at_depth_bound() {
        let mut error: Arc<dyn StdError + Send + Sync> = Arc::new(std::io::Error::other("root"));
        for layer in 0..15 {
            error = Arc::new(WrappedError::new(&format!("layer{layer}"), error));
        }

        let class = resolve_error_class(error.as_ref());
        assert_ne!(class, "root");
        assert!(class.ends_with("root"));
    }
}
