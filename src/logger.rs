use crate::config::{LoggingConfig, ReporterSettings};
use crate::entry::{Entry, FieldValue};
use crate::hook::{ErrorReporter, ErrorReportingHook, Hook, HookError, Record};
use crate::level::{Severity, parse_level};
use crate::nsq::{NsqLogLevel, NsqLogger};
use chrono::{SecondsFormat, Utc};
use opentelemetry::Context;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::io::Write;
use std::sync::{Arc, OnceLock};

// Key names fixed by the record contract.
const MESSAGE_KEY: &str = "message";
const LEVEL_KEY: &str = "level";
const TIMESTAMP_KEY: &str = "time";

struct LoggerCore {
    level: RwLock<Severity>,
    sink: Mutex<Box<dyn Write + Send>>,
    hooks: RwLock<Vec<Box<dyn Hook>>>,
}

/// Process-facing logging handle.
///
/// Cloning is cheap; every clone shares the same minimum level, sink, and
/// hook list. Records at or above the minimum level are serialized as one
/// JSON object per line and written to the sink under a lock, so concurrent
/// emits never interleave within a line.
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
}

impl Logger {
    /// Caller-owned logger: minimum severity from `config.log_level`,
    /// stderr sink, no hooks.
    pub fn new(config: &LoggingConfig) -> Logger {
        Logger {
            core: Arc::new(LoggerCore {
                level: RwLock::new(parse_level(&config.log_level)),
                sink: Mutex::new(Box::new(std::io::stderr())),
                hooks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// As [`new`](Self::new), additionally configuring `reporter` from the
    /// config and registering the error-reporting hook backed by it.
    pub fn with_reporter(config: &LoggingConfig, reporter: Arc<dyn ErrorReporter>) -> Logger {
        reporter.configure(&ReporterSettings::from_config(config));
        let logger = Logger::new(config);
        logger.add_hook(Box::new(ErrorReportingHook::new(reporter)));
        logger
    }

    pub fn level(&self) -> Severity {
        *self.core.level.read()
    }

    /// Swaps the minimum level. The field itself is locked, but swapping
    /// while other threads emit is the caller's race to serialize.
    pub fn set_level(&self, level: Severity) {
        *self.core.level.write() = level;
    }

    /// Swaps the output sink, same caveat as [`set_level`](Self::set_level).
    /// Tests use this to capture output.
    pub fn set_sink(&self, sink: Box<dyn Write + Send>) {
        *self.core.sink.lock() = sink;
    }

    /// Registers a hook; every hook whose levels contain an emitted record's
    /// severity fires synchronously during that emit.
    pub fn add_hook(&self, hook: Box<dyn Hook>) {
        self.core.hooks.write().push(hook);
    }

    pub fn new_entry(&self) -> Entry {
        Entry::new(self.clone())
    }

    pub fn with_field(&self, key: &str, value: impl Into<FieldValue>) -> Entry {
        self.new_entry().with_field(key, value)
    }

    pub fn with_error(&self, err: impl Into<Box<dyn StdError + Send + Sync>>) -> Entry {
        self.new_entry().with_error(err)
    }

    pub fn with_trace_context(&self, cx: &Context) -> Entry {
        self.new_entry().with_trace_context(cx)
    }

    pub fn debug(&self, message: &str) -> Result<(), HookError> {
        self.new_entry().debug(message)
    }

    pub fn info(&self, message: &str) -> Result<(), HookError> {
        self.new_entry().info(message)
    }

    pub fn warning(&self, message: &str) -> Result<(), HookError> {
        self.new_entry().warning(message)
    }

    pub fn warn(&self, message: &str) -> Result<(), HookError> {
        self.warning(message)
    }

    pub fn error(&self, message: &str) -> Result<(), HookError> {
        self.new_entry().error(message)
    }

    pub fn fatal(&self, message: &str) -> ! {
        self.new_entry().fatal(message)
    }

    pub fn panic(&self, message: &str) -> ! {
        self.new_entry().panic(message)
    }

    /// Ready-made adapter for the queue client, pre-tagged `component="nsq"`,
    /// paired with the queue-level translation of the current minimum level
    /// for registration alongside it.
    pub fn nsq_logger(&self) -> (NsqLogger, NsqLogLevel) {
        let entry = self.new_entry().with_field("component", "nsq");
        (NsqLogger::new(entry), NsqLogLevel::from(self.level()))
    }

    pub(crate) fn emit(
        &self,
        severity: Severity,
        fields: &BTreeMap<String, FieldValue>,
        message: &str,
    ) -> Result<(), HookError> {
        if severity < self.level() {
            return Ok(());
        }

        let record = Record { severity, message, fields };
        let mut first_failure = Ok(());
        {
            let hooks = self.core.hooks.read();
            for hook in &*hooks {
                if !hook.levels().contains(&severity) {
                    continue;
                }
                if let Err(err) = hook.fire(&record) {
                    if first_failure.is_ok() {
                        first_failure = Err(err);
                    }
                }
            }
        }

        // The record is written even when a hook failed; a lost report never
        // suppresses the log line itself.
        match format_record(severity, fields, message) {
            Ok(line) => {
                let mut sink = self.core.sink.lock();
                if let Err(err) = sink.write_all(&line) {
                    eprintln!("failed to write log record: {err}");
                }
            }
            Err(err) => eprintln!("failed to serialize log record: {err}"),
        }

        first_failure
    }
}

fn format_record(
    severity: Severity,
    fields: &BTreeMap<String, FieldValue>,
    message: &str,
) -> Result<Vec<u8>, serde_json::Error> {
    let mut object = serde_json::Map::new();
    for (key, value) in fields {
        object.insert(key.clone(), value.as_json());
    }
    object.insert(LEVEL_KEY.to_string(), severity.as_str().into());
    object.insert(MESSAGE_KEY.to_string(), message.into());
    object.insert(
        TIMESTAMP_KEY.to_string(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true).into(),
    );

    let mut line = serde_json::to_vec(&object)?;
    line.push(b'\n');
    Ok(line)
}

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// One-time process-wide initialization.
///
/// The first call installs a logger built from `config` and returns it;
/// every later call returns the already-installed logger and silently
/// discards its configuration.
pub fn init(config: LoggingConfig) -> Logger {
    GLOBAL.get_or_init(|| Logger::new(&config)).clone()
}

/// As [`init`], additionally registering the error-reporting hook backed by
/// `reporter`. No-op like [`init`] when a logger is already installed.
pub fn init_with_reporter(config: LoggingConfig, reporter: Arc<dyn ErrorReporter>) -> Logger {
    GLOBAL.get_or_init(|| Logger::with_reporter(&config, reporter)).clone()
}

/// The process-wide logger, lazily installing a default-configured one if
/// [`init`] was never called.
pub fn global() -> &'static Logger {
    GLOBAL.get_or_init(|| Logger::new(&LoggingConfig::default()))
}
