//! Host-side proxies for Python-defined callables.
//!
//! A [`PythonMacro`] owns the script that defines one Python function and a
//! resolved handle to that function.  Construction runs the script and
//! resolves the symbol; after the script's text has been edited, call
//! [`PythonMacro::register`] again to make the edit take effect — until
//! then the resolved handle is stale, by design.
//!
//! A macro whose script failed to load (or whose symbol did not resolve)
//! stays unresolved: calls return [`MacroError::Unresolved`] instead of
//! terminating the host.

use pyo3::prelude::*;
use pyo3::types::PyTuple;
use thiserror::Error;

use crate::engine::MacroEngine;
use crate::object::PythonObject;
use crate::script::PythonScript;
use crate::value::Value;

// ── MacroError ────────────────────────────────────────────────────────────────

/// Recoverable failures when invoking a macro.
#[derive(Debug, Error)]
pub enum MacroError {
    /// The defining script never loaded, or its symbol did not resolve.
    #[error("macro function '{0}' is not resolved")]
    Unresolved(String),
    /// The Python call raised; the traceback went to the captured error
    /// stream.
    #[error("calling '{0}' raised a Python error")]
    CallFailed(String),
    /// The call succeeded but the result does not convert to the requested
    /// return type.
    #[error("'{0}' did not return a {1}")]
    ReturnType(String, &'static str),
}

// ── PythonMacro ───────────────────────────────────────────────────────────────

/// A named Python callable loaded from a script and invoked like a local
/// function.
pub struct PythonMacro {
    script: Option<PythonScript>,
    function_name: String,
    object: Option<PythonObject>,
}

impl PythonMacro {
    /// Load the defining script from the bundled resources, run it, and
    /// resolve `function_name`.
    ///
    /// A missing resource or unresolved symbol leaves the macro callable
    /// but unresolved (calls fail with [`MacroError::Unresolved`]).
    pub fn new(engine: &MacroEngine, script_name: &str, function_name: &str) -> Self {
        Self::with_script(engine, PythonScript::resource(script_name), function_name)
    }

    /// Build a macro around an explicit script (memory or user-store
    /// origin); `None` produces a permanently unresolved macro.
    pub fn with_script(
        engine: &MacroEngine,
        script: Option<PythonScript>,
        function_name: &str,
    ) -> Self {
        let mut mac = Self {
            script,
            function_name: function_name.to_owned(),
            object: None,
        };
        mac.register(engine);
        mac
    }

    /// Re-run the defining script and re-resolve the symbol.
    ///
    /// Used after editing the script's text so the edit takes effect
    /// without discarding the macro's identity.
    pub fn register(&mut self, engine: &MacroEngine) {
        let Some(script) = &self.script else { return };
        if script.run(engine) {
            self.object = engine.lookup(&self.function_name);
        }
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn is_resolved(&self) -> bool {
        self.object.is_some()
    }

    pub fn script(&self) -> Option<&PythonScript> {
        self.script.as_ref()
    }

    /// Mutable access to the defining script, for editing its text.  The
    /// resolved handle goes stale until [`register`](Self::register) runs
    /// again.
    pub fn script_mut(&mut self) -> Option<&mut PythonScript> {
        self.script.as_mut()
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    /// Invoke the resolved function with positional arguments, discarding
    /// the result.
    pub fn call(&self, engine: &MacroEngine, args: &[Value]) -> Result<(), MacroError> {
        self.call_object(engine, args).map(|_| ())
    }

    /// Invoke and convert the result to `f64`.
    pub fn call_double(&self, engine: &MacroEngine, args: &[Value]) -> Result<f64, MacroError> {
        let object = self.call_object(engine, args)?;
        object
            .to_f64()
            .ok_or_else(|| MacroError::ReturnType(self.function_name.clone(), "float"))
    }

    /// Invoke and convert the result to `f32`.
    pub fn call_float(&self, engine: &MacroEngine, args: &[Value]) -> Result<f32, MacroError> {
        let object = self.call_object(engine, args)?;
        object
            .to_f32()
            .ok_or_else(|| MacroError::ReturnType(self.function_name.clone(), "float"))
    }

    /// Invoke and convert the result to `i32`.
    pub fn call_int(&self, engine: &MacroEngine, args: &[Value]) -> Result<i32, MacroError> {
        let object = self.call_object(engine, args)?;
        object
            .to_i32()
            .ok_or_else(|| MacroError::ReturnType(self.function_name.clone(), "int"))
    }

    /// Invoke and stringify the result (`str(result)`); `Ok(None)` when the
    /// result cannot be stringified.
    pub fn call_string(
        &self,
        engine: &MacroEngine,
        args: &[Value],
    ) -> Result<Option<String>, MacroError> {
        Ok(self.call_object(engine, args)?.string_value())
    }

    /// Build the positional tuple, call the resolved object, and trigger
    /// the engine status check.
    fn call_object(
        &self,
        engine: &MacroEngine,
        args: &[Value],
    ) -> Result<PythonObject, MacroError> {
        let Some(object) = &self.object else {
            return Err(MacroError::Unresolved(self.function_name.clone()));
        };

        let result = Python::with_gil(|py| {
            let encoded: Vec<PyObject> = args.iter().map(|a| a.to_py(py)).collect();
            let tuple = PyTuple::new_bound(py, encoded);
            match object.call_tuple(py, tuple) {
                Ok(value) => Ok(value),
                Err(err) => {
                    err.print(py);
                    Err(MacroError::CallFailed(self.function_name.clone()))
                }
            }
        });

        engine.check_status();
        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
