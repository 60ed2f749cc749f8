use crate::entry::Entry;
use crate::level::Severity;
use std::fmt;
use std::io;

/// Severity vocabulary of the queue client's logger.
///
/// The client prefixes every message it emits with the three-character form
/// of its level, which is what [`NsqLogger::output`] decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NsqLogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl NsqLogLevel {
    /// Wire tag used by the queue client.
    pub fn as_str(self) -> &'static str {
        match self {
            NsqLogLevel::Debug => "DBG",
            NsqLogLevel::Info => "INF",
            NsqLogLevel::Warning => "WRN",
            NsqLogLevel::Error => "ERR",
        }
    }
}

impl fmt::Display for NsqLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for NsqLogLevel {
    /// The queue vocabulary has no fatal/panic distinction; everything at
    /// error and above collapses to `Error`.
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Debug => NsqLogLevel::Debug,
            Severity::Info => NsqLogLevel::Info,
            Severity::Warning => NsqLogLevel::Warning,
            Severity::Error | Severity::Fatal | Severity::Panic => NsqLogLevel::Error,
        }
    }
}

/// Identifier the queue server assigns to a message. Printable ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub [u8; 16]);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

const TAG_LEN: usize = 3;

/// Adapter between the queue client's legacy logger interface and [`Entry`].
///
/// Obtained pre-tagged from the logger; see `Logger::nsq_logger`.
pub struct NsqLogger {
    entry: Entry,
}

impl NsqLogger {
    pub(crate) fn new(entry: Entry) -> Self {
        Self { entry }
    }

    /// Legacy three-argument logging call.
    ///
    /// The first three characters carry the client's severity tag; the
    /// remainder is whitespace-trimmed and redispatched at the matching
    /// level, at info when the tag is unknown. Messages of three bytes or
    /// fewer (or with a tag splitting mid-character) are dropped. Never
    /// fails; report-submission failures raised by the redispatched emit are
    /// swallowed because the queue client cannot act on them.
    pub fn output(&self, _call_depth: usize, message: &str) -> io::Result<()> {
        let Some((tag, rest)) = message.split_at_checked(TAG_LEN) else {
            return Ok(());
        };
        if rest.is_empty() {
            return Ok(());
        }

        let text = rest.trim();
        let _ = match tag {
            t if t == NsqLogLevel::Debug.as_str() => self.entry.debug(text),
            t if t == NsqLogLevel::Info.as_str() => self.entry.info(text),
            t if t == NsqLogLevel::Warning.as_str() => self.entry.warning(text),
            t if t == NsqLogLevel::Error.as_str() => self.entry.error(text),
            _ => self.entry.info(text),
        };
        Ok(())
    }
}
