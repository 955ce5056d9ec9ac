//! Host functions callable from Python.
//!
//! A [`PythonFunction`] pairs a name and scalar signature with the Rust
//! closure to run when Python calls that name.  The bridge owns the
//! registered functions; this module owns the marshaling of one call —
//! decoding the Python argument tuple into [`Value`]s and encoding the
//! closure's result back into a Python object.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyString, PyTuple};

use crate::value::{Value, ValueKind};

/// The host-side body of a registered function.
///
/// Receives the decoded positional arguments; returns `None` for void (or
/// when the closure has nothing to report — a mismatch with a non-void
/// declared return type becomes a Python `ValueError`).
pub type FunctionBlock = Box<dyn Fn(&[Value]) -> Option<Value> + Send + Sync>;

/// One host-implemented callable registered for Python visibility.
pub struct PythonFunction {
    name: String,
    params: Vec<ValueKind>,
    returns: ValueKind,
    block: FunctionBlock,
}

impl PythonFunction {
    /// Describe a host callable.
    ///
    /// # Panics
    ///
    /// Panics if `params` contains [`ValueKind::Void`] — a void parameter is
    /// a configuration error in the registering code, not a runtime
    /// condition, so it is rejected before the function can ever be called.
    pub fn new(
        name: impl Into<String>,
        params: Vec<ValueKind>,
        returns: ValueKind,
        block: FunctionBlock,
    ) -> Self {
        assert!(
            !params.contains(&ValueKind::Void),
            "Void is not a valid parameter type"
        );
        Self { name: name.into(), params, returns, block }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ValueKind] {
        &self.params
    }

    pub fn returns(&self) -> ValueKind {
        self.returns
    }

    /// Run the host closure.
    pub(crate) fn invoke(&self, args: &[Value]) -> Option<Value> {
        (self.block)(args)
    }

    // ── Argument decoding ─────────────────────────────────────────────────

    /// Decode the Python argument tuple against the declared signature.
    ///
    /// Each argument fails independently: a mismatched argument records an
    /// error message and is dropped rather than aborting the loop, so the
    /// caller detects failure as a count mismatch and reports the first
    /// recorded message.
    pub(crate) fn parse_args(&self, args: &Bound<'_, PyTuple>) -> (Vec<Value>, Option<String>) {
        let mut values = Vec::with_capacity(self.params.len());
        let mut first_error: Option<String> = None;

        for (index, kind) in self.params.iter().enumerate() {
            let Ok(item) = args.get_item(index) else {
                first_error
                    .get_or_insert_with(|| format!("Missing argument for param {}", index + 1));
                continue;
            };
            match decode_arg(*kind, &item, index) {
                Ok(value) => values.push(value),
                Err(message) => {
                    first_error.get_or_insert(message);
                }
            }
        }

        (values, first_error)
    }

    // ── Return encoding ───────────────────────────────────────────────────

    /// Encode the closure's result per the declared return type.
    ///
    /// A value whose variant does not match the declared kind yields a
    /// Python `ValueError` and no value reaches the interpreter.  A void
    /// declaration always encodes to `None`, whatever the closure produced.
    pub(crate) fn encode_return(
        &self,
        py: Python<'_>,
        result: Option<Value>,
    ) -> PyResult<PyObject> {
        if self.returns == ValueKind::Void {
            return Ok(py.None());
        }
        match result {
            Some(value) if value.kind() == self.returns => Ok(value.to_py(py)),
            _ => Err(PyValueError::new_err(format!(
                "Expected {} from host callback '{}'",
                self.returns, self.name
            ))),
        }
    }
}

impl std::fmt::Debug for PythonFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PythonFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// Decode one positional argument per its declared kind.
fn decode_arg(kind: ValueKind, item: &Bound<'_, PyAny>, index: usize) -> Result<Value, String> {
    let n = index + 1;
    match kind {
        ValueKind::Double => item
            .extract::<f64>()
            .map(Value::Double)
            .map_err(|_| format!("Expected float as param {n}")),
        ValueKind::Float => item
            .extract::<f64>()
            .map(|v| Value::Float(v as f32))
            .map_err(|_| format!("Expected float as param {n}")),
        ValueKind::Int => item
            .extract::<i32>()
            .map(Value::Int)
            .map_err(|_| format!("Expected int as param {n}")),
        ValueKind::Long => item
            .extract::<i64>()
            .map(Value::Long)
            .map_err(|_| format!("Expected long as param {n}")),
        ValueKind::Str => {
            let s = item
                .downcast::<PyString>()
                .map_err(|_| format!("Expected string as param {n}"))?;
            Ok(Value::Str(s.to_string_lossy().into_owned()))
        }
        // new() rejects Void parameters.
        ValueKind::Void => unreachable!("Void parameter in signature"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
