//! The host-function call bridge.
//!
//! Python never calls a Rust closure directly.  Each registration loads a
//! generated Python stub whose body forwards to the single native
//! trampoline, `host.call(name, args)`, registered in a synthetic `host`
//! module in `sys.modules`.  The trampoline looks the name up in the live
//! registry, marshals the argument tuple, runs the closure, and marshals the
//! result back.
//!
//! A registered function `add(Double, Double) -> Double` produces this stub:
//!
//! ```text
//! import host
//! def add(a: float, b: float) -> float:
//!     return host.call('add', (a, b, ))
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::{PyModule, PyTuple};

use crate::engine::MacroEngine;
use crate::function::PythonFunction;
use crate::script::PythonScript;

type Registry = Arc<Mutex<HashMap<String, Arc<PythonFunction>>>>;

/// The registry the trampoline dispatches against.
///
/// `#[pyfunction]`s cannot capture state, so the live bridge parks its
/// registry here; only the most recently installed bridge is reachable from
/// Python, and dropping that bridge turns trampoline calls into
/// dispatch-miss errors.
static ACTIVE: Mutex<Option<Registry>> = Mutex::new(None);

// ── FunctionBridge ────────────────────────────────────────────────────────────

/// Dispatch table mapping registered names to host functions.
pub struct FunctionBridge {
    registry: Registry,
}

impl FunctionBridge {
    /// Create a fresh registry, make it the trampoline's target, and ensure
    /// the `host` module exists in `sys.modules`.
    pub(crate) fn install() -> PyResult<Self> {
        let registry: Registry = Arc::new(Mutex::new(HashMap::new()));
        *ACTIVE.lock().unwrap() = Some(Arc::clone(&registry));

        Python::with_gil(register_host_module)?;

        Ok(Self { registry })
    }

    /// Register a host function and load its Python stub.
    ///
    /// Returns `false` (leaving the registry untouched) when the name is
    /// already registered.  On success the stub is executed before this
    /// returns, so Python code can resolve the name immediately.
    pub fn register(&self, engine: &MacroEngine, function: PythonFunction) -> bool {
        let name = function.name().to_owned();
        let stub = stub_source(&function);

        {
            let mut map = self.registry.lock().unwrap();
            if map.contains_key(&name) {
                return false;
            }
            map.insert(name.clone(), Arc::new(function));
        }

        PythonScript::memory(name.as_str(), stub).run(engine);
        true
    }

    /// Whether a function is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.registry.lock().unwrap().contains_key(name)
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.registry.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for FunctionBridge {
    fn drop(&mut self) {
        let mut active = ACTIVE.lock().unwrap();
        if active.as_ref().is_some_and(|r| Arc::ptr_eq(r, &self.registry)) {
            *active = None;
        }
    }
}

// ── Trampoline ────────────────────────────────────────────────────────────────

/// `host.call(name, args)` — dispatch one stub call to its host function.
///
/// Every failure mode surfaces as a Python exception (which the engine's
/// status check routes into the captured error stream), never as a host
/// panic: unknown name, argument-count mismatch after decoding, and
/// return-type mismatch inside `encode_return`.
#[pyfunction]
#[pyo3(name = "call")]
fn host_call(py: Python<'_>, name: &str, args: Bound<'_, PyTuple>) -> PyResult<PyObject> {
    let Some(function) = lookup_active(name) else {
        return Err(PyTypeError::new_err(format!("no matching host function '{name}'")));
    };

    let (values, decode_error) = function.parse_args(&args);
    if values.len() != function.params().len() {
        let message = decode_error.unwrap_or_else(|| {
            format!(
                "{name}() expects {} arguments, got {}",
                function.params().len(),
                args.len()
            )
        });
        return Err(PyTypeError::new_err(message));
    }

    let result = function.invoke(&values);
    function.encode_return(py, result)
}

/// Fetch the named function from the live registry.
///
/// Both Arcs are cloned out before their locks are released, so a host
/// closure may re-enter the engine (and even the trampoline) without
/// deadlocking.
fn lookup_active(name: &str) -> Option<Arc<PythonFunction>> {
    let registry = ACTIVE.lock().unwrap().clone()?;
    let function = registry.lock().unwrap().get(name).cloned();
    function
}

fn register_host_module(py: Python<'_>) -> PyResult<()> {
    let m = PyModule::new_bound(py, "host")?;
    m.add_function(wrap_pyfunction!(host_call, &m)?)?;
    // Insert into sys.modules so the generated stubs' `import host` works.
    let sys = py.import_bound("sys")?;
    sys.getattr("modules")?.set_item("host", &m)?;
    Ok(())
}

// ── Stub generation ───────────────────────────────────────────────────────────

/// Deterministic parameter names for a stub signature: `a`..`z`, then
/// two-letter combinations `aa`, `ab`, … for parameter 27 onward.
pub fn param_names(count: usize) -> Vec<String> {
    (0..count).map(param_name).collect()
}

fn param_name(index: usize) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    if index < 26 {
        (ALPHABET[index] as char).to_string()
    } else {
        let rest = index - 26;
        let first = ALPHABET[(rest / 26) % 26] as char;
        let second = ALPHABET[rest % 26] as char;
        format!("{first}{second}")
    }
}

/// Render the Python stub that forwards a registered function's calls to
/// the trampoline.  Pure text generation; loading it is `register`'s job.
pub fn stub_source(function: &PythonFunction) -> String {
    let names = param_names(function.params().len());

    let params: Vec<String> = names
        .iter()
        .zip(function.params())
        .map(|(name, kind)| {
            let ty = kind.python_name().expect("parameter kinds always have a Python name");
            format!("{name}: {ty}")
        })
        .collect();

    let mut tuple = String::new();
    for name in &names {
        tuple.push_str(name);
        tuple.push_str(", ");
    }
    let call = format!("host.call('{}', ({tuple}))", function.name());

    match function.returns().python_name() {
        Some(ret) => format!(
            "import host\ndef {}({}) -> {ret}:\n    return {call}\n",
            function.name(),
            params.join(", ")
        ),
        None => format!(
            "import host\ndef {}({}):\n    {call}\n",
            function.name(),
            params.join(", ")
        ),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    fn func(name: &str, params: Vec<ValueKind>, returns: ValueKind) -> PythonFunction {
        PythonFunction::new(name, params, returns, Box::new(|_| None))
    }

    #[test]
    fn param_name_sequence() {
        assert_eq!(param_name(0), "a");
        assert_eq!(param_name(25), "z");
        assert_eq!(param_name(26), "aa");
        assert_eq!(param_name(27), "ab");
        assert_eq!(param_name(51), "az");
        assert_eq!(param_name(52), "ba");
    }

    #[test]
    fn stub_for_two_doubles() {
        let f = func("add", vec![ValueKind::Double, ValueKind::Double], ValueKind::Double);
        assert_eq!(
            stub_source(&f),
            "import host\n\
             def add(a: float, b: float) -> float:\n\
             \x20   return host.call('add', (a, b, ))\n"
        );
    }

    #[test]
    fn stub_for_void_return_has_no_return_statement() {
        let f = func("notify", vec![ValueKind::Str], ValueKind::Void);
        assert_eq!(
            stub_source(&f),
            "import host\n\
             def notify(a: str):\n\
             \x20   host.call('notify', (a, ))\n"
        );
    }

    #[test]
    fn stub_for_zero_params() {
        let f = func("tick", vec![], ValueKind::Long);
        assert_eq!(
            stub_source(&f),
            "import host\n\
             def tick() -> int:\n\
             \x20   return host.call('tick', ())\n"
        );
    }

    #[test]
    fn stub_beyond_alphabet_uses_two_letter_names() {
        let f = func("wide", vec![ValueKind::Int; 28], ValueKind::Void);
        let stub = stub_source(&f);
        assert!(stub.contains("z: int, aa: int, ab: int"));
    }
}
