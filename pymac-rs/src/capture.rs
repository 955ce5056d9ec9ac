//! Interpreter output capture and error surfacing.
//!
//! On engine startup the bundled `capture_output` script replaces
//! `sys.stdout` / `sys.stderr` with small accumulator objects; this module
//! holds handles to those proxies and drains their `value` attribute into
//! host-side buffers after every interpreter operation.  The error monitor
//! watches the stderr buffer and turns each non-empty drain into one
//! host-visible notification.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Mutex;

use pyo3::prelude::*;

use crate::embedded;
use crate::object::PythonObject;

/// Attribute on the Python proxy objects holding accumulated text.
const VALUE_ATTR: &str = "value";

// ── CaptureOutput ─────────────────────────────────────────────────────────────

/// Host-side buffers for the interpreter's captured stdout/stderr streams.
pub struct CaptureOutput {
    standard_output: Option<PythonObject>,
    standard_error: Option<PythonObject>,
    stdout_buf: Mutex<String>,
    stderr_buf: Mutex<String>,
}

impl CaptureOutput {
    /// Run the bundled capture script and resolve the two proxy objects.
    ///
    /// # Panics
    ///
    /// Panics if the `capture_output` resource is not compiled in — a broken
    /// build, not a runtime condition.
    pub(crate) fn install(main_module: &PythonObject) -> PyResult<Self> {
        let source = embedded::get_embedded("capture_output")
            .unwrap_or_else(|| panic!("missing required bundled script 'capture_output'"));

        Python::with_gil(|py| py.run_bound(source, None, None))?;

        Ok(Self {
            standard_output: main_module.attr("standard_output"),
            standard_error: main_module.attr("standard_error"),
            stdout_buf: Mutex::new(String::new()),
            stderr_buf: Mutex::new(String::new()),
        })
    }

    /// Drain both proxies into the host buffers.
    ///
    /// This is a destructive read of the proxies (their `value` resets to
    /// empty) and is safe to call at any time: missing proxies or no new
    /// output make it a no-op.
    pub fn refresh(&self) {
        refresh_channel(&self.standard_output, &self.stdout_buf);
        refresh_channel(&self.standard_error, &self.stderr_buf);
    }

    /// Reset both host buffers without touching the proxies.
    pub fn clear(&self) {
        self.stdout_buf.lock().unwrap().clear();
        self.stderr_buf.lock().unwrap().clear();
    }

    /// Snapshot of the captured stdout buffer.
    pub fn stdout(&self) -> String {
        self.stdout_buf.lock().unwrap().clone()
    }

    /// Snapshot of the captured stderr buffer.
    pub fn stderr(&self) -> String {
        self.stderr_buf.lock().unwrap().clone()
    }

    /// Take the stderr buffer's contents, leaving it empty.  `None` when
    /// there is nothing captured.
    pub(crate) fn take_stderr(&self) -> Option<String> {
        let mut buf = self.stderr_buf.lock().unwrap();
        if buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut *buf))
        }
    }

    /// A capture with no interpreter proxies, for host-side unit tests.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self {
            standard_output: None,
            standard_error: None,
            stdout_buf: Mutex::new(String::new()),
            stderr_buf: Mutex::new(String::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn push_stderr(&self, text: &str) {
        self.stderr_buf.lock().unwrap().push_str(text);
    }
}

/// Append one proxy's accumulated text to its host buffer, then reset the
/// proxy.  No-op when the proxy is absent or its attribute unreadable.
fn refresh_channel(proxy: &Option<PythonObject>, buffer: &Mutex<String>) {
    let Some(proxy) = proxy else { return };
    let Some(text) = proxy.attr_string(VALUE_ATTR) else { return };
    if !text.is_empty() {
        buffer.lock().unwrap().push_str(&text);
        proxy.set_attr_string(VALUE_ATTR, "");
    }
}

// ── ErrorMonitor ──────────────────────────────────────────────────────────────

/// Watches the captured stderr buffer and raises one notification per
/// non-empty detection.  Presentation is the subscriber's concern.
pub struct ErrorMonitor {
    subscriber: Mutex<Option<SyncSender<String>>>,
}

impl ErrorMonitor {
    pub(crate) fn new() -> Self {
        Self { subscriber: Mutex::new(None) }
    }

    /// Register the notification receiver, replacing any previous one.
    pub fn subscribe(&self) -> Receiver<String> {
        let (tx, rx) = sync_channel(64);
        *self.subscriber.lock().unwrap() = Some(tx);
        rx
    }

    /// Inspect the stderr buffer; if non-empty, consume its contents as one
    /// message, notify the subscriber, and return it.  Afterwards the buffer
    /// is empty again.
    pub fn check(&self, output: &CaptureOutput) -> Option<String> {
        let message = output.take_stderr()?;
        if let Some(tx) = self.subscriber.lock().unwrap().as_ref() {
            let _ = tx.try_send(message.clone());
        }
        Some(message)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
