//! Owned references to Python objects.
//!
//! Every Python object pointer that crosses into host code is wrapped in a
//! [`PythonObject`] the moment it arrives.  The wrapper owns exactly one
//! strong reference: acquiring increments the CPython refcount once
//! (`unbind`/`clone_ref`), dropping decrements once.  Raw pointers never
//! escape this type.

use pyo3::prelude::*;
use pyo3::types::{PyString, PyTuple};

/// An owning handle to one reference-counted Python object.
pub struct PythonObject {
    obj: Py<PyAny>,
}

impl PythonObject {
    /// Take ownership of a borrowed reference, incrementing its refcount.
    pub fn from_bound(obj: Bound<'_, PyAny>) -> Self {
        Self { obj: obj.unbind() }
    }

    /// Borrow the object for direct pyo3 calls under the GIL.
    pub(crate) fn bind<'py>(&self, py: Python<'py>) -> &Bound<'py, PyAny> {
        self.obj.bind(py)
    }

    // ── Typed extraction ──────────────────────────────────────────────────

    /// Numeric value as `f64`, or `None` if the object is not a number.
    pub fn to_f64(&self) -> Option<f64> {
        Python::with_gil(|py| self.obj.bind(py).extract().ok())
    }

    /// Numeric value as `f32`, or `None` if the object is not a number.
    pub fn to_f32(&self) -> Option<f32> {
        self.to_f64().map(|v| v as f32)
    }

    /// Integer value as `i32`, or `None` if not an int (or out of range).
    pub fn to_i32(&self) -> Option<i32> {
        Python::with_gil(|py| self.obj.bind(py).extract().ok())
    }

    /// Integer value as `i64`, or `None` if not an int (or out of range).
    pub fn to_i64(&self) -> Option<i64> {
        Python::with_gil(|py| self.obj.bind(py).extract().ok())
    }

    /// `str(object)`, or `None` if stringification raised.
    pub fn string_value(&self) -> Option<String> {
        Python::with_gil(|py| {
            self.obj
                .bind(py)
                .str()
                .ok()
                .map(|s| s.to_string_lossy().into_owned())
        })
    }

    // ── Attribute access ──────────────────────────────────────────────────

    /// Read a string-valued attribute.  `None` if the attribute is missing
    /// or is not a `str`.
    pub fn attr_string(&self, attribute: &str) -> Option<String> {
        Python::with_gil(|py| {
            let value = self.obj.bind(py).getattr(attribute).ok()?;
            let s = value.downcast::<PyString>().ok()?;
            Some(s.to_string_lossy().into_owned())
        })
    }

    /// Set a string-valued attribute.  Returns `false` if the assignment
    /// raised (e.g. a read-only attribute).
    pub fn set_attr_string(&self, attribute: &str, value: &str) -> bool {
        Python::with_gil(|py| self.obj.bind(py).setattr(attribute, value).is_ok())
    }

    /// Read an attribute as a new owned handle.
    pub fn attr(&self, attribute: &str) -> Option<PythonObject> {
        Python::with_gil(|py| {
            self.obj
                .bind(py)
                .getattr(attribute)
                .ok()
                .map(PythonObject::from_bound)
        })
    }

    // ── Calling ───────────────────────────────────────────────────────────

    /// Call the object with positional arguments, returning the result
    /// handle or the raised error.
    pub(crate) fn call_tuple<'py>(
        &self,
        py: Python<'py>,
        args: Bound<'py, PyTuple>,
    ) -> PyResult<PythonObject> {
        self.obj.bind(py).call1(args).map(PythonObject::from_bound)
    }
}

impl Clone for PythonObject {
    /// Each copy owns its own reference (refcount +1).
    fn clone(&self) -> Self {
        Python::with_gil(|py| Self { obj: self.obj.clone_ref(py) })
    }
}

impl std::fmt::Debug for PythonObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.string_value() {
            Some(s) => write!(f, "PythonObject({s})"),
            None => f.write_str("PythonObject(<unprintable>)"),
        }
    }
}
