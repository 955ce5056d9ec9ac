//! User script storage.
//!
//! Manages the `.py` files in the user's script directory (the OS data dir
//! by default, any root when testing) and hands out bundled resource
//! scripts.  Only [`ScriptOrigin::User`] scripts can be saved, renamed, or
//! deleted; resource scripts are load-only; memory scripts are never
//! persisted directly — saving one converts it to `User`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::embedded;
use crate::script::{PythonScript, ScriptOrigin};

/// Directory of stored user scripts plus access to bundled resources.
#[derive(Debug)]
pub struct ScriptDirectory {
    root: PathBuf,
    scripts: Vec<PythonScript>,
}

impl ScriptDirectory {
    /// Open the default per-user script directory, creating it if needed.
    pub fn new() -> Self {
        let root = default_root();
        Self::with_root(root)
    }

    /// Open a specific directory as the script store (used by tests and the
    /// `-d` CLI flag).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let _ = std::fs::create_dir_all(&root);
        let mut dir = Self { root, scripts: Vec::new() };
        dir.scan();
        dir
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Re-list the `.py` files in the store.  Listed scripts carry no text
    /// until loaded.
    pub fn scan(&mut self) {
        let mut scripts = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&self.root) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "py") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        scripts.push(PythonScript {
                            name: stem.to_owned(),
                            origin: ScriptOrigin::User,
                            source: None,
                        });
                    }
                }
            }
        }
        scripts.sort_by(|a, b| a.name.cmp(&b.name));
        self.scripts = scripts;
    }

    /// The scripts found by the last [`scan`](Self::scan), name-sorted.
    pub fn scripts(&self) -> &[PythonScript] {
        &self.scripts
    }

    // ── Load ──────────────────────────────────────────────────────────────

    /// Load a script's text from the given origin.
    ///
    /// Memory scripts cannot be loaded from storage; resource scripts come
    /// from the embedded bundle; user scripts from the store directory.
    pub fn load(&self, name: &str, origin: ScriptOrigin) -> Option<PythonScript> {
        match origin {
            ScriptOrigin::Memory => None,
            ScriptOrigin::Resource => PythonScript::resource(name),
            ScriptOrigin::User => {
                let source = std::fs::read_to_string(self.path_for(name)).ok()?;
                Some(PythonScript { name: name.to_owned(), origin, source: Some(source) })
            }
        }
    }

    /// Reload a script's text from its origin in place.  No-op for memory
    /// scripts.
    pub fn refresh(&self, script: &mut PythonScript) {
        match script.origin {
            ScriptOrigin::Memory => {}
            ScriptOrigin::Resource => {
                script.source = embedded::get_embedded(&script.name).map(str::to_owned);
            }
            ScriptOrigin::User => {
                script.source = std::fs::read_to_string(self.path_for(&script.name)).ok();
            }
        }
    }

    // ── Save / delete / rename ────────────────────────────────────────────

    /// Write a script into the store.
    ///
    /// Saving a memory script converts it to `User` origin on success.
    /// Resource scripts are read-only and never saved.
    pub fn save(&mut self, script: &mut PythonScript) -> bool {
        let saved = match script.origin {
            ScriptOrigin::Memory | ScriptOrigin::User => self.write_script(script),
            ScriptOrigin::Resource => false,
        };
        if saved {
            script.origin = ScriptOrigin::User;
            self.scan();
        }
        saved
    }

    /// Remove a user script's file from the store.  Returns `false` for
    /// memory and resource scripts.
    pub fn delete(&mut self, script: &PythonScript) -> bool {
        if script.origin != ScriptOrigin::User {
            return false;
        }
        let removed = std::fs::remove_file(self.path_for(&script.name)).is_ok();
        if removed {
            self.scan();
        }
        removed
    }

    /// Rename a stored user script.  `script.name` must already hold the new
    /// name; `old_name` is the name on disk.
    pub fn rename(&mut self, old_name: &str, script: &PythonScript) -> bool {
        if script.origin != ScriptOrigin::User {
            return false;
        }
        let renamed =
            std::fs::rename(self.path_for(old_name), self.path_for(&script.name)).is_ok();
        if renamed {
            self.scan();
        }
        renamed
    }

    /// Find a name not colliding with any stored script by appending a
    /// numeric suffix: `foo`, `foo 1`, `foo 2`, …
    pub fn generate_unique_name(&self, name: &str) -> String {
        let mut unique = name.to_owned();
        let mut index = 1;
        while self.scripts.iter().any(|s| s.name == unique) {
            unique = format!("{name} {index}");
            index += 1;
        }
        unique
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.py"))
    }

    fn write_script(&self, script: &PythonScript) -> bool {
        let Some(source) = &script.source else { return false };
        std::fs::write(self.path_for(&script.name), source).is_ok()
    }
}

impl Default for ScriptDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-user script directory (`~/.local/share/pymac/scripts` on Linux).
fn default_root() -> PathBuf {
    match ProjectDirs::from("", "", "pymac") {
        Some(dirs) => dirs.data_dir().join("scripts"),
        None => PathBuf::from(".pymac-scripts"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
