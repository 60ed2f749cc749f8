use crate::hook::HookError;
use crate::level::Severity;
use crate::logger::Logger;
use crate::nsq::MessageId;
use opentelemetry::Context;
use opentelemetry::trace::TraceContextExt as _;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

/// Field key carrying a live error value for the reporting hook.
pub(crate) const ERROR_KEY: &str = "error";

/// Value stored in a record's field set.
///
/// Errors are carried live rather than pre-stringified so the reporting hook
/// can inspect them; they render as their display string at format time.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Nested(serde_json::Map<String, serde_json::Value>),
    Error(Arc<dyn StdError + Send + Sync>),
}

impl FieldValue {
    /// JSON form used for the output record and for hook metadata.
    pub fn as_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Str(value) => serde_json::Value::String(value.clone()),
            FieldValue::Int(value) => serde_json::Value::from(*value),
            FieldValue::Uint(value) => serde_json::Value::from(*value),
            FieldValue::Nested(map) => serde_json::Value::Object(map.clone()),
            FieldValue::Error(err) => serde_json::Value::String(err.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Uint(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Uint(value.into())
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for FieldValue {
    fn from(value: serde_json::Map<String, serde_json::Value>) -> Self {
        FieldValue::Nested(value)
    }
}

/// A structured record under construction.
///
/// Every `with_*` method borrows the receiver and returns a new `Entry`, so
/// a partially built entry can be shared across threads and extended
/// independently by each of them without the chains observing one another.
#[derive(Clone)]
pub struct Entry {
    logger: Logger,
    fields: BTreeMap<String, FieldValue>,
}

impl Entry {
    pub(crate) fn new(logger: Logger) -> Self {
        Self { logger, fields: BTreeMap::new() }
    }

    /// Sets `key`, overwriting any earlier value for it.
    pub fn with_field(&self, key: &str, value: impl Into<FieldValue>) -> Entry {
        let mut fields = self.fields.clone();
        fields.insert(key.to_string(), value.into());
        Entry { logger: self.logger.clone(), fields }
    }

    /// As [`with_field`](Self::with_field), except a value that trims to the
    /// empty string leaves the entry unchanged.
    pub fn with_string_field_ignore_empty(&self, key: &str, value: &str) -> Entry {
        if value.trim().is_empty() {
            return self.clone();
        }
        self.with_field(key, value)
    }

    pub fn with_service(&self, service: &str) -> Entry {
        self.with_field("service", service)
    }

    pub fn with_user(&self, user_id: u64) -> Entry {
        self.with_field("user_id", user_id)
    }

    pub fn with_http_method(&self, method: &str) -> Entry {
        self.with_field("http_method", method)
    }

    /// Response codes are logged as their decimal string form.
    pub fn with_http_response_code(&self, code: u16) -> Entry {
        self.with_field("http_response_code", code.to_string())
    }

    /// Parses an event given as a comma-separated string.
    ///
    /// Two parts yield `event_name` and `object_id`, three parts additionally
    /// `subject_id`; ids that fail to parse become 0. Any other part count
    /// degrades to a single raw `event` field rather than failing.
    pub fn with_event(&self, event: &str) -> Entry {
        let parts: Vec<&str> = event.split(',').collect();
        match parts.as_slice() {
            [name, object_id] => self
                .with_string_field_ignore_empty("event_name", name)
                .with_field("object_id", parse_event_id(object_id)),
            [name, object_id, subject_id] => self
                .with_string_field_ignore_empty("event_name", name)
                .with_field("object_id", parse_event_id(object_id))
                .with_field("subject_id", parse_event_id(subject_id)),
            _ => self.with_string_field_ignore_empty("event", event),
        }
    }

    pub fn with_relation(&self, relation: &str) -> Entry {
        self.with_string_field_ignore_empty("relation", relation)
    }

    pub fn with_channel(&self, channel: &str) -> Entry {
        self.with_field("channel", channel)
    }

    pub fn with_fcm(&self) -> Entry {
        self.with_channel("fcm")
    }

    pub fn with_notificationlist(&self) -> Entry {
        self.with_channel("notificationlist")
    }

    pub fn with_nsq_message_id(&self, id: &MessageId) -> Entry {
        self.with_string_field_ignore_empty("nsq_message_id", &id.to_string())
    }

    /// Duration in whole milliseconds under `duration_ms`, nanoseconds
    /// rounded half-up.
    pub fn with_duration(&self, duration: Duration) -> Entry {
        self.with_field("duration_ms", round_to_millis(duration))
    }

    /// End-to-end variant of [`with_duration`](Self::with_duration).
    pub fn with_e2e_duration(&self, duration: Duration) -> Entry {
        self.with_field("e2e_duration_ms", round_to_millis(duration))
    }

    /// Raw nanoseconds spent processing a queue message, tracked next to the
    /// rounded `duration_ms` when a consumer wants full precision.
    pub fn with_nsq_process_duration(&self, duration: Duration) -> Entry {
        self.with_field("nsq_message_process_duration", duration.as_nanos() as u64)
    }

    /// Correlates the record with the active span of `cx`, if any.
    ///
    /// A context without a valid span leaves the entry unchanged. The
    /// `dd.trace_id` key carries the low 64 bits of the 128-bit trace id,
    /// which is the width the receiving pipeline joins on.
    pub fn with_trace_context(&self, cx: &Context) -> Entry {
        let span = cx.span();
        let span_context = span.span_context();
        if !span_context.is_valid() {
            return self.clone();
        }
        let trace_bytes = span_context.trace_id().to_bytes();
        let mut low = [0u8; 8];
        low.copy_from_slice(&trace_bytes[8..]);
        self.with_field("dd.trace_id", u64::from_be_bytes(low))
            .with_field("dd.span_id", u64::from_be_bytes(span_context.span_id().to_bytes()))
    }

    /// Attaches a live error value under the `error` key.
    pub fn with_error(&self, err: impl Into<Box<dyn StdError + Send + Sync>>) -> Entry {
        self.with_field(ERROR_KEY, FieldValue::Error(Arc::from(err.into())))
    }

    pub fn debug(&self, message: &str) -> Result<(), HookError> {
        self.emit(Severity::Debug, message)
    }

    pub fn info(&self, message: &str) -> Result<(), HookError> {
        self.emit(Severity::Info, message)
    }

    pub fn warning(&self, message: &str) -> Result<(), HookError> {
        self.emit(Severity::Warning, message)
    }

    pub fn warn(&self, message: &str) -> Result<(), HookError> {
        self.warning(message)
    }

    pub fn error(&self, message: &str) -> Result<(), HookError> {
        self.emit(Severity::Error, message)
    }

    /// Writes the record, then terminates the process. Irrecoverable by
    /// contract: this record is the last action of the process.
    pub fn fatal(&self, message: &str) -> ! {
        let _ = self.emit(Severity::Fatal, message);
        std::process::exit(1);
    }

    /// Writes the record, then panics with the message.
    pub fn panic(&self, message: &str) -> ! {
        let _ = self.emit(Severity::Panic, message);
        panic!("{message}");
    }

    fn emit(&self, severity: Severity, message: &str) -> Result<(), HookError> {
        self.logger.emit(severity, &self.fields, message)
    }
}

fn parse_event_id(raw: &str) -> i64 {
    raw.parse().unwrap_or(0)
}

fn round_to_millis(duration: Duration) -> u64 {
    ((duration.as_nanos() + 500_000) / 1_000_000) as u64
}
