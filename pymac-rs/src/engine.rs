//! Interpreter lifecycle and script execution.
//!
//! One CPython process per host process: the interpreter is initialised at
//! most once (`OnceLock`) and lives until process exit.  A [`MacroEngine`]
//! value is the host's handle on it — the application normally uses the
//! [`MacroEngine::shared`] singleton; creating another engine re-attaches to
//! the same interpreter with fresh capture proxies and a fresh function
//! registry (tests rely on this).
//!
//! All interpreter access funnels through `Python::with_gil`, so execute,
//! resolve, and bridge dispatch are serialised process-wide, including
//! reentrant Python → host-closure → Python call chains.

use std::sync::OnceLock;

use pyo3::prelude::*;

use crate::bridge::FunctionBridge;
use crate::capture::{CaptureOutput, ErrorMonitor};
use crate::object::PythonObject;

static PY_INIT: OnceLock<()> = OnceLock::new();
static SHARED: OnceLock<MacroEngine> = OnceLock::new();

/// The embedded Python interpreter with its capture, error-monitor, and
/// call-bridge collaborators installed.
pub struct MacroEngine {
    main_module: PythonObject,
    /// Captured stdout/stderr streams.
    pub output: CaptureOutput,
    /// Error-buffer watcher; subscribe for notifications.
    pub errors: ErrorMonitor,
    /// Host-function registry.
    pub bridge: FunctionBridge,
}

impl MacroEngine {
    /// Start (or re-attach to) the interpreter and install the bridge and
    /// output capture.
    ///
    /// CPython itself is initialised exactly once per process; this can be
    /// called again to get an engine with a clean registry and fresh capture
    /// proxies.
    pub fn new() -> PyResult<Self> {
        PY_INIT.get_or_init(pyo3::prepare_freethreaded_python);

        let main_module = Python::with_gil(|py| {
            let main = py.import_bound("__main__")?;
            Ok::<_, PyErr>(PythonObject::from_bound(main.into_any()))
        })?;

        let bridge = FunctionBridge::install()?;
        let output = CaptureOutput::install(&main_module)?;
        let errors = ErrorMonitor::new();

        Ok(Self { main_module, output, errors, bridge })
    }

    /// The process-wide engine instance.
    ///
    /// # Panics
    ///
    /// Panics if interpreter setup fails — a broken build or deployment,
    /// not a runtime condition.
    pub fn shared() -> &'static MacroEngine {
        SHARED.get_or_init(|| match MacroEngine::new() {
            Ok(engine) => engine,
            Err(err) => panic!("cannot initialise the Python engine: {err}"),
        })
    }

    // ── Execution ─────────────────────────────────────────────────────────

    /// Execute Python statements in the `__main__` namespace.
    ///
    /// Returns `false` when the code raised.  Either way the status check
    /// runs afterwards: failures are only observable through the captured
    /// stderr text, so the traceback is routed there and the error monitor
    /// notified before this returns.
    pub fn run(&self, code: &str) -> bool {
        let ok = Python::with_gil(|py| match py.run_bound(code, None, None) {
            Ok(()) => true,
            Err(err) => {
                err.print(py);
                false
            }
        });
        self.check_status();
        ok
    }

    /// Resolve a top-level name in `__main__`.  `None` when unresolved;
    /// never raises.
    pub fn lookup(&self, name: &str) -> Option<PythonObject> {
        Python::with_gil(|py| {
            self.main_module
                .bind(py)
                .getattr(name)
                .ok()
                .map(PythonObject::from_bound)
        })
    }

    /// Drain the capture proxies, then let the error monitor inspect the
    /// stderr buffer.
    pub fn check_status(&self) {
        self.output.refresh();
        self.errors.check(&self.output);
    }

    /// Tear the engine down.
    ///
    /// Consuming `self` makes post-shutdown execute/resolve calls
    /// unrepresentable.  Dropping the bridge detaches the trampoline
    /// registry; the interpreter process itself is reclaimed at process
    /// exit (CPython cannot be finalised and restarted).
    pub fn shutdown(self) {}
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The engine shares one CPython process and one trampoline registry per
    // test binary.  Tests MUST run sequentially to avoid clobbering each
    // other's capture proxies; acquire this mutex at the top of every test.
    static TEST_MX: Mutex<()> = Mutex::new(());

    fn make_engine() -> MacroEngine {
        MacroEngine::new().unwrap()
    }

    #[test]
    fn run_assigns_and_lookup_reads() {
        let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
        let eng = make_engine();
        assert!(eng.run("_eng_test_x = 41 + 1"));
        let v = eng.lookup("_eng_test_x").unwrap();
        assert_eq!(v.to_i64(), Some(42));
        assert_eq!(v.to_i32(), Some(42));
    }

    #[test]
    fn lookup_missing_returns_none() {
        let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
        let eng = make_engine();
        assert!(eng.lookup("_eng_no_such_name").is_none());
    }

    #[test]
    fn run_captures_stdout() {
        let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
        let eng = make_engine();
        assert!(eng.run("print('hello capture')"));
        assert_eq!(eng.output.stdout(), "hello capture\n");
    }

    #[test]
    fn refresh_twice_without_activity_changes_nothing() {
        let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
        let eng = make_engine();
        eng.run("print('once')");
        let before = eng.output.stdout();
        eng.output.refresh();
        eng.output.refresh();
        assert_eq!(eng.output.stdout(), before);
    }

    #[test]
    fn clear_resets_captured_output() {
        let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
        let eng = make_engine();
        eng.run("print('soon gone')");
        eng.output.clear();
        assert_eq!(eng.output.stdout(), "");
    }

    #[test]
    fn runtime_error_returns_false_and_notifies() {
        let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
        let eng = make_engine();
        let rx = eng.errors.subscribe();

        assert!(!eng.run("raise ValueError('boom')"));

        let message = rx.try_recv().expect("one notification expected");
        assert!(message.contains("ValueError"), "unexpected message: {message}");
        assert!(message.contains("boom"));
    }

    #[test]
    fn stderr_write_yields_exactly_one_notification() {
        let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
        let eng = make_engine();
        let rx = eng.errors.subscribe();

        assert!(eng.run("import sys\nsys.stderr.write('oops')"));
        assert_eq!(rx.try_recv().unwrap(), "oops");

        // Buffer was consumed: a second check raises nothing.
        eng.check_status();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn string_and_float_extraction() {
        let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
        let eng = make_engine();
        eng.run("_eng_s = 'text'\n_eng_f = 2.5");
        assert_eq!(eng.lookup("_eng_s").unwrap().string_value().as_deref(), Some("text"));
        assert_eq!(eng.lookup("_eng_f").unwrap().to_f64(), Some(2.5));
        assert_eq!(eng.lookup("_eng_f").unwrap().to_f32(), Some(2.5));
    }

    #[test]
    fn handle_clone_keeps_object_alive() {
        let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
        let eng = make_engine();
        eng.run("_eng_kept = 'still here'");
        let first = eng.lookup("_eng_kept").unwrap();
        let second = first.clone();
        eng.run("del _eng_kept");
        drop(first);
        // The clone holds its own reference.
        assert_eq!(second.string_value().as_deref(), Some("still here"));
    }

    #[test]
    fn shutdown_then_new_engine_works() {
        let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
        let eng = make_engine();
        eng.run("_eng_pre_shutdown = 1");
        eng.shutdown();

        let eng2 = make_engine();
        assert!(eng2.run("_eng_post_shutdown = 2"));
        assert_eq!(eng2.lookup("_eng_post_shutdown").unwrap().to_i64(), Some(2));
    }
}
