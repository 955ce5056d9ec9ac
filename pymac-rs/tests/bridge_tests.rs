//! End-to-end bridge behaviour through a live interpreter: registration,
//! stub dispatch, marshaling in both directions, and error surfacing.

use std::sync::{Arc, Mutex};

use pymac::engine::MacroEngine;
use pymac::function::PythonFunction;
use pymac::value::{Value, ValueKind};

// All tests share one CPython process and one trampoline registry slot.
// They MUST run sequentially; acquire this mutex at the top of every test.
static TEST_MX: Mutex<()> = Mutex::new(());

fn engine() -> MacroEngine {
    MacroEngine::new().unwrap()
}

/// Register an echo function `name(kind) -> kind` returning its argument.
fn register_echo(eng: &MacroEngine, name: &str, kind: ValueKind) {
    let f = PythonFunction::new(
        name,
        vec![kind],
        kind,
        Box::new(|args| args.first().cloned()),
    );
    assert!(eng.bridge.register(eng, f), "echo registration failed for {name}");
}

// ── Registration ──────────────────────────────────────────────────────────────

#[test]
fn duplicate_registration_fails_and_leaves_registry_unchanged() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
    let eng = engine();

    let make = || {
        PythonFunction::new("dup", vec![], ValueKind::Void, Box::new(|_| None))
    };
    assert!(eng.bridge.register(&eng, make()));
    assert_eq!(eng.bridge.len(), 1);

    assert!(!eng.bridge.register(&eng, make()));
    assert_eq!(eng.bridge.len(), 1);
    assert!(eng.bridge.contains("dup"));
}

#[test]
fn registered_stub_is_immediately_resolvable() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
    let eng = engine();

    let f = PythonFunction::new("visible", vec![], ValueKind::Void, Box::new(|_| None));
    eng.bridge.register(&eng, f);
    assert!(eng.lookup("visible").is_some());
}

// ── End-to-end dispatch ───────────────────────────────────────────────────────

#[test]
fn add_two_doubles_end_to_end() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
    let eng = engine();

    let add = PythonFunction::new(
        "add",
        vec![ValueKind::Double, ValueKind::Double],
        ValueKind::Double,
        Box::new(|args| match args {
            [Value::Double(a), Value::Double(b)] => Some(Value::Double(a + b)),
            _ => None,
        }),
    );
    assert!(eng.bridge.register(&eng, add));

    assert!(eng.run("result = add(2.0, 3.0)"));
    assert_eq!(eng.lookup("result").unwrap().to_f64(), Some(5.0));
}

#[test]
fn scalar_round_trips_through_the_bridge() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
    let eng = engine();

    register_echo(&eng, "echo_d", ValueKind::Double);
    register_echo(&eng, "echo_f", ValueKind::Float);
    register_echo(&eng, "echo_i", ValueKind::Int);
    register_echo(&eng, "echo_l", ValueKind::Long);
    register_echo(&eng, "echo_s", ValueKind::Str);

    assert!(eng.run(
        "rt_d = echo_d(3.5)\n\
         rt_f = echo_f(2.5)\n\
         rt_i = echo_i(7)\n\
         rt_l = echo_l(1 << 40)\n\
         rt_s = echo_s('hi')",
    ));

    assert_eq!(eng.lookup("rt_d").unwrap().to_f64(), Some(3.5));
    assert_eq!(eng.lookup("rt_f").unwrap().to_f32(), Some(2.5));
    assert_eq!(eng.lookup("rt_i").unwrap().to_i32(), Some(7));
    assert_eq!(eng.lookup("rt_l").unwrap().to_i64(), Some(1 << 40));
    assert_eq!(eng.lookup("rt_s").unwrap().string_value().as_deref(), Some("hi"));
}

#[test]
fn void_function_runs_for_side_effects_and_returns_none() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
    let eng = engine();

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let record = PythonFunction::new(
        "record",
        vec![ValueKind::Str],
        ValueKind::Void,
        Box::new(move |args| {
            if let [Value::Str(s)] = args {
                sink.lock().unwrap().push(s.clone());
            }
            None
        }),
    );
    eng.bridge.register(&eng, record);

    assert!(eng.run("void_result = record('hello')"));
    assert_eq!(seen.lock().unwrap().as_slice(), ["hello".to_owned()]);
    // Void encodes to Python None.
    assert_eq!(
        eng.lookup("void_result").unwrap().string_value().as_deref(),
        Some("None")
    );
}

// ── Error surfacing ───────────────────────────────────────────────────────────

#[test]
fn wrong_return_type_yields_value_error_and_no_value() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
    let eng = engine();
    let rx = eng.errors.subscribe();

    let bad = PythonFunction::new(
        "bad_ret",
        vec![],
        ValueKind::Double,
        Box::new(|_| Some(Value::Str("not a number".into()))),
    );
    eng.bridge.register(&eng, bad);

    assert!(!eng.run("bad_ret_result = bad_ret()"));
    // No value reached the interpreter.
    assert!(eng.lookup("bad_ret_result").is_none());

    let message = rx.try_recv().expect("value error notification expected");
    assert!(message.contains("ValueError"), "unexpected message: {message}");
    assert!(message.contains("Expected Double"));
}

#[test]
fn dispatch_miss_reports_no_matching_function() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
    let eng = engine();
    let rx = eng.errors.subscribe();

    assert!(!eng.run("import host\nhost.call('unregistered_fn', ())"));
    let message = rx.try_recv().unwrap();
    assert!(
        message.contains("no matching host function 'unregistered_fn'"),
        "unexpected message: {message}"
    );
}

#[test]
fn argument_count_mismatch_aborts_the_call() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
    let eng = engine();
    let rx = eng.errors.subscribe();

    let two = PythonFunction::new(
        "takes_two",
        vec![ValueKind::Double, ValueKind::Double],
        ValueKind::Void,
        Box::new(|_| None),
    );
    eng.bridge.register(&eng, two);

    // Call the trampoline directly to bypass the stub's own arity check.
    assert!(!eng.run("import host\nhost.call('takes_two', (1.0, ))"));
    let message = rx.try_recv().unwrap();
    assert!(message.contains("param 2"), "unexpected message: {message}");
}

#[test]
fn argument_type_mismatch_names_the_parameter() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
    let eng = engine();
    let rx = eng.errors.subscribe();

    let typed = PythonFunction::new(
        "typed",
        vec![ValueKind::Double, ValueKind::Double],
        ValueKind::Void,
        Box::new(|_| None),
    );
    eng.bridge.register(&eng, typed);

    assert!(!eng.run("import host\nhost.call('typed', ('x', 2.0))"));
    let message = rx.try_recv().unwrap();
    assert!(
        message.contains("Expected float as param 1"),
        "unexpected message: {message}"
    );
}

#[test]
fn string_argument_rejects_numbers() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());
    let eng = engine();
    let rx = eng.errors.subscribe();

    register_echo(&eng, "echo_s2", ValueKind::Str);

    assert!(!eng.run("import host\nhost.call('echo_s2', (3,))"));
    let message = rx.try_recv().unwrap();
    assert!(
        message.contains("Expected string as param 1"),
        "unexpected message: {message}"
    );
}

// ── Bridge teardown ───────────────────────────────────────────────────────────

#[test]
fn dropped_engine_detaches_its_registry() {
    let _g = TEST_MX.lock().unwrap_or_else(|p| p.into_inner());

    let eng = engine();
    register_echo(&eng, "short_lived", ValueKind::Int);
    eng.shutdown();

    // A fresh engine has an empty registry; the old stub now misses.
    let eng2 = engine();
    let rx = eng2.errors.subscribe();
    assert!(eng2.bridge.is_empty());
    assert!(!eng2.run("short_lived(1)"));
    let message = rx.try_recv().unwrap();
    assert!(
        message.contains("no matching host function"),
        "unexpected message: {message}"
    );
}
