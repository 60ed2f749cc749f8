//! Structured-logging facade shared by our services.
//!
//! One field vocabulary, one JSON-lines output format, and two integrations:
//! an error-reporting hook fired on qualifying records, and an adapter for
//! the NSQ client's legacy logger interface.

#![deny(warnings, rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Safe within realistic value bounds (durations, ids)
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::must_use_candidate        // Annotated selectively on critical APIs
)]

pub mod config;
pub mod entry;
pub mod hook;
pub mod level;
pub mod logger;
pub mod nsq;

#[cfg(test)]
mod test_support;

// Re-export main types for easy access
pub use config::{ErrorReportingConfig, LoggingConfig, ReporterSettings};
pub use entry::{Entry, FieldValue};
pub use hook::{
    ErrorReport, ErrorReporter, ErrorReportingHook, Hook, HookError, Metadata, Record, WrappedError,
};
pub use level::{DEFAULT_LEVEL, Severity, parse_level};
pub use logger::{Logger, global, init, init_with_reporter};
pub use nsq::{MessageId, NsqLogLevel, NsqLogger};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
