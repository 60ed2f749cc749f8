use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a log record.
///
/// The derived ordering is total (`Debug < Info < Warning < Error < Fatal <
/// Panic`) and drives both output filtering and hook threshold checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
    Panic,
}

/// Level assumed when configuration names no recognizable level.
pub const DEFAULT_LEVEL: Severity = Severity::Info;

impl Severity {
    /// Lowercase name used for the `level` key of emitted records.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
            Severity::Panic => "panic",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a configured level name.
///
/// Total function: unrecognized input (empty string, lowercase variants,
/// garbage) yields [`DEFAULT_LEVEL`] instead of an error. Matching is
/// case-sensitive.
pub fn parse_level(level: &str) -> Severity {
    match level {
        "ERROR" => Severity::Error,
        "WARNING" => Severity::Warning,
        "INFO" => Severity::Info,
        "DEBUG" => Severity::Debug,
        _ => DEFAULT_LEVEL,
    }
}
