//! Scalar values crossing the host/interpreter boundary.
//!
//! The bridge marshals a fixed set of scalar kinds; anything richer stays on
//! the Python side behind a [`crate::object::PythonObject`] handle.

use pyo3::prelude::*;

// ── ValueKind ─────────────────────────────────────────────────────────────────

/// The marshalable type tags.
///
/// `Void` is only meaningful as a return type; [`crate::function::PythonFunction::new`]
/// rejects it in a parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Double,
    Float,
    Int,
    Long,
    Str,
    Void,
}

impl ValueKind {
    /// The Python type name used in generated stub annotations.
    ///
    /// `None` for `Void` (a stub for a void function carries no annotation).
    /// `Long` maps to `int`: Python 3 has no `long` builtin, and annotations
    /// are evaluated at `def` time.
    pub fn python_name(self) -> Option<&'static str> {
        match self {
            ValueKind::Double | ValueKind::Float => Some("float"),
            ValueKind::Int | ValueKind::Long => Some("int"),
            ValueKind::Str => Some("str"),
            ValueKind::Void => None,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueKind::Double => "Double",
            ValueKind::Float => "Float",
            ValueKind::Int => "Int",
            ValueKind::Long => "Long",
            ValueKind::Str => "Str",
            ValueKind::Void => "Void",
        };
        f.write_str(name)
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// A tagged scalar travelling through the bridge in either direction.
///
/// The variant fixes the marshaled Python type at the call site, so an
/// argument that could be read as several kinds (an integer that is also a
/// valid double, say) is disambiguated by the caller's choice of variant,
/// never re-guessed at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Str(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Double(_) => ValueKind::Double,
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Str(_) => ValueKind::Str,
        }
    }

    /// Encode into a Python object.
    pub(crate) fn to_py(&self, py: Python<'_>) -> PyObject {
        match self {
            Value::Double(v) => v.to_object(py),
            Value::Float(v) => v.to_object(py),
            Value::Int(v) => v.to_object(py),
            Value::Long(v) => v.to_object(py),
            Value::Str(v) => v.to_object(py),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
