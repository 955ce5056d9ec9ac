//! Units of Python source and where they come from.

use crate::embedded;
use crate::engine::MacroEngine;

// ── ScriptOrigin ──────────────────────────────────────────────────────────────

/// Where a script's source text lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOrigin {
    /// Held in memory only; never reloadable from storage.
    Memory,
    /// Bundled read-only resource compiled into the binary.
    Resource,
    /// Mutable user storage (a `.py` file in the script directory).
    User,
}

// ── PythonScript ──────────────────────────────────────────────────────────────

/// One unit of Python source: a name, its origin, and (lazily) its text.
///
/// `source` is `None` for scripts that have been listed but not yet loaded
/// (see [`crate::store::ScriptDirectory::scan`]).
#[derive(Debug, Clone)]
pub struct PythonScript {
    pub name: String,
    pub origin: ScriptOrigin,
    pub source: Option<String>,
}

/// Two scripts are the same script iff name and origin match; the text is
/// a mutable payload, not part of identity.
impl PartialEq for PythonScript {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.origin == other.origin
    }
}

impl Eq for PythonScript {}

impl PythonScript {
    /// A script held only in memory.
    pub fn memory(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self { name: name.into(), origin: ScriptOrigin::Memory, source: Some(source.into()) }
    }

    /// Load a bundled resource script.  `None` if no such resource is
    /// compiled in.
    pub fn resource(name: &str) -> Option<Self> {
        embedded::get_embedded(name).map(|source| Self {
            name: name.to_owned(),
            origin: ScriptOrigin::Resource,
            source: Some(source.to_owned()),
        })
    }

    /// Execute the script's text in the engine.
    ///
    /// Returns whether execution was *attempted*: `false` only when there is
    /// no text to run.  A script that runs and raises still returns `true` —
    /// the failure surfaces through the engine's error monitor, not here.
    pub fn run(&self, engine: &MacroEngine) -> bool {
        match &self.source {
            Some(source) => {
                engine.run(source);
                true
            }
            None => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_name_and_origin() {
        let a = PythonScript::memory("greet", "x = 1");
        let b = PythonScript::memory("greet", "y = 2");
        let c = PythonScript::memory("other", "x = 1");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let r = PythonScript::resource("more").unwrap();
        let m = PythonScript { source: None, ..r.clone() };
        assert_eq!(r, m);
        assert_ne!(a, PythonScript { origin: ScriptOrigin::Resource, ..a.clone() });
    }

    #[test]
    fn resource_load_missing_is_none() {
        assert!(PythonScript::resource("does_not_exist").is_none());
    }

    #[test]
    fn resource_load_carries_text() {
        let s = PythonScript::resource("capture_output").unwrap();
        assert_eq!(s.origin, ScriptOrigin::Resource);
        assert!(s.source.as_deref().unwrap().contains("CaptureOutput"));
    }
}
