//! Embedded CPython macro engine with a two-way host call bridge.
//!
//! The host owns a single embedded Python interpreter and talks to it in
//! both directions:
//!
//! * **Macros** — named Python functions loaded from scripts — are invoked
//!   from host code like local functions ([`macros::PythonMacro`]).
//! * **Host functions** — Rust closures — are registered so Python code can
//!   call them by name ([`bridge::FunctionBridge`]); each registration
//!   synthesises a Python stub that forwards to the native trampoline.
//!
//! Python's stdout/stderr are captured into host buffers
//! ([`capture::CaptureOutput`]); script failures surface as deferred text
//! notifications ([`capture::ErrorMonitor`]), not as host errors.
//!
//! | Module     | Responsibility                                        |
//! |------------|-------------------------------------------------------|
//! | `engine`   | interpreter lifecycle, execution, symbol resolution   |
//! | `bridge`   | host-function registry, trampoline, stub generation   |
//! | `function` | host-callable descriptors and argument marshaling     |
//! | `object`   | owned refcounted handles to Python objects            |
//! | `value`    | the marshalable scalar kinds                          |
//! | `capture`  | stdout/stderr capture and error notifications         |
//! | `script`   | script units and their origins                        |
//! | `store`    | user script storage (save/load/rename/delete)         |
//! | `embedded` | bundled resource scripts baked into the binary        |
//! | `macros`   | host-side proxies for Python-defined callables        |
//! | `cli`      | demo binary argument parsing                          |

pub mod bridge;
pub mod capture;
pub mod cli;
pub mod embedded;
pub mod engine;
pub mod function;
pub mod macros;
pub mod object;
pub mod script;
pub mod store;
pub mod value;
