//! Progress reporting for extraction runs.
//!
//! The orchestrator reports every step through an [`ExtractionMonitor`] in
//! exactly the same way whichever variant is installed. The variant only
//! decides whether the messages are visible.

use std::io::Write;
use std::sync::Mutex;

/// Sink for progress and diagnostic messages.
pub trait ExtractionMonitor: Send + Sync {
    /// Reports one progress message.
    fn report_message(&self, message: &str);
}

/// Monitor that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentMonitor;

impl ExtractionMonitor for SilentMonitor {
    fn report_message(&self, _message: &str) {}
}

/// Monitor that writes one line per message, to stderr by default.
pub struct VerboseMonitor {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl VerboseMonitor {
    /// Creates a monitor writing to stderr.
    pub fn new() -> Self {
        Self::with_writer(std::io::stderr())
    }

    /// Creates a monitor writing to any sink.
    pub fn with_writer<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }
}

impl Default for VerboseMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VerboseMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerboseMonitor").finish_non_exhaustive()
    }
}

impl ExtractionMonitor for VerboseMonitor {
    fn report_message(&self, message: &str) {
        // A poisoned lock or a closed stream must not abort the copy.
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", message);
            let _ = writer.flush();
        }
    }
}

/// Selects the stock monitor for the silent switch.
pub fn monitor_for(silent: bool) -> Box<dyn ExtractionMonitor> {
    if silent {
        Box::new(SilentMonitor)
    } else {
        Box::new(VerboseMonitor::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Shared in-memory sink so the test can read what the monitor wrote.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_verbose_monitor_writes_lines() {
        let buffer = SharedBuffer::default();
        let monitor = VerboseMonitor::with_writer(buffer.clone());

        monitor.report_message("Copying Account");
        monitor.report_message("Account: 20 rows");

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written, "Copying Account\nAccount: 20 rows\n");
    }

    #[test]
    fn test_silent_monitor_accepts_messages() {
        let monitor = SilentMonitor;
        monitor.report_message("ignored");
    }

    #[test]
    fn test_monitor_for_is_object_safe() {
        let monitors = [monitor_for(true), monitor_for(false)];
        assert_eq!(monitors.len(), 2);
    }
}
