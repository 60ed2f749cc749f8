//! Shared helpers for the unit tests.

use crate::config::LoggingConfig;
use crate::logger::Logger;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// In-memory sink shared between a test and the logger under test.
#[derive(Clone, Default)]
pub(crate) struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl CaptureSink {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Logger writing into a captured buffer, minimum level parsed from `level`.
pub(crate) fn captured_logger(level: &str) -> (Logger, CaptureSink) {
    let logger = Logger::new(&LoggingConfig {
        log_level: level.to_string(),
        ..LoggingConfig::default()
    });
    let sink = CaptureSink::default();
    logger.set_sink(Box::new(sink.clone()));
    (logger, sink)
}
