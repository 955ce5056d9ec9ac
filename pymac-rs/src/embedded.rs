//! Embedded copies of the bundled Python resource scripts.
//!
//! All `.py` files from the crate's `py/` directory are baked into the
//! binary at compile time via `include_str!()`, so the engine works without
//! any installed resource directory.  Script names are bare, without the
//! `.py` extension.

/// A single embedded resource script.
pub struct EmbeddedScript {
    pub name: &'static str,
    pub source: &'static str,
}

/// All embedded `.py` resource scripts.
pub static EMBEDDED_SCRIPTS: &[EmbeddedScript] = &[
    EmbeddedScript { name: "capture_output", source: include_str!("../py/capture_output.py") },
    EmbeddedScript { name: "more",           source: include_str!("../py/more.py") },
    EmbeddedScript { name: "less",           source: include_str!("../py/less.py") },
    EmbeddedScript { name: "even_more",      source: include_str!("../py/even_more.py") },
    EmbeddedScript { name: "even_less",      source: include_str!("../py/even_less.py") },
];

/// Look up an embedded script's source by name.
pub fn get_embedded(name: &str) -> Option<&'static str> {
    EMBEDDED_SCRIPTS.iter().find(|s| s.name == name).map(|s| s.source)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_script_present() {
        let src = get_embedded("capture_output").expect("capture_output must be bundled");
        assert!(src.contains("standard_output"));
        assert!(src.contains("standard_error"));
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(get_embedded("no_such_script").is_none());
    }

    #[test]
    fn demo_macros_present() {
        for name in ["more", "less", "even_more", "even_less"] {
            assert!(get_embedded(name).is_some(), "missing bundled script '{name}'");
        }
    }
}
