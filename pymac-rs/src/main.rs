use std::io::{BufRead, Write};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use pymac::cli;
use pymac::engine::MacroEngine;
use pymac::function::PythonFunction;
use pymac::macros::PythonMacro;
use pymac::script::ScriptOrigin;
use pymac::store::ScriptDirectory;
use pymac::value::{Value, ValueKind};

/// Demo host state: three daily-progress gauges driven from Python macros.
#[derive(Default)]
struct DailyProgress {
    active_calories: f64,
    activity: f64,
    standup: f64,
}

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("pymac: {e}");
            eprintln!("Usage: pymac [-d<dir>] [-c<code>] [-q] [<script>]");
            std::process::exit(1);
        }
    };

    let engine = MacroEngine::shared();
    let notices = engine.errors.subscribe();

    // ── Host state + callbacks visible from Python ────────────────────────
    let progress = Arc::new(Mutex::new(DailyProgress::default()));
    register_gauge(engine, &progress, "getActiveCalories", "setActiveCalories", |p| {
        &mut p.active_calories
    });
    register_gauge(engine, &progress, "getActivity", "setActivity", |p| &mut p.activity);
    register_gauge(engine, &progress, "getStandup", "setStandup", |p| &mut p.standup);

    // ── Script store and bundled macros ───────────────────────────────────
    let store = match args.script_dir {
        Some(dir) => ScriptDirectory::with_root(dir),
        None => ScriptDirectory::new(),
    };

    let mut macros = vec![
        PythonMacro::new(engine, "even_more", "even_more"),
        PythonMacro::new(engine, "more", "more"),
        PythonMacro::new(engine, "less", "less"),
        PythonMacro::new(engine, "even_less", "even_less"),
    ];

    if !args.quiet {
        let ver = env!("CARGO_PKG_VERSION");
        println!("pymac {ver} — embedded Python macro engine");
        println!("Commands: more | less | even_more | even_less | py <code> | run <script> |");
        println!("          scripts | status | reload | quit");
        println!("User scripts: {}", store.root().display());
        println!();
    }

    // ── -c<code>: run and exit ────────────────────────────────────────────
    if let Some(code) = args.command {
        engine.run(&code);
        flush_streams(engine, &notices);
        return;
    }

    // ── Optional startup script from the user store ───────────────────────
    if let Some(name) = &args.startup_script {
        match store.load(name, ScriptOrigin::User) {
            Some(script) => {
                script.run(engine);
            }
            None => eprintln!("pymac: no stored script named '{name}'"),
        }
        flush_streams(engine, &notices);
    }

    // ── Prompt loop ───────────────────────────────────────────────────────
    let stdin = std::io::stdin();
    loop {
        print!("pymac> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break, // EOF
            Ok(_) => {}
        }
        let line = line.trim();

        match line.split_once(' ').unwrap_or((line, "")) {
            ("", _) => {}
            ("quit", _) | ("exit", _) => break,

            (name @ ("more" | "less" | "even_more" | "even_less"), _) => {
                let mac = macros
                    .iter()
                    .find(|m| m.function_name() == name)
                    .expect("demo macros cover these names");
                match mac.call_string(engine, &[]) {
                    Ok(Some(text)) => println!("{text}"),
                    Ok(None) => {}
                    Err(e) => eprintln!("pymac: {e}"),
                }
            }

            ("py", code) => {
                engine.run(code);
            }

            ("run", name) => match store.load(name, ScriptOrigin::User) {
                Some(script) => {
                    script.run(engine);
                }
                None => eprintln!("pymac: no stored script named '{name}'"),
            },

            ("scripts", _) => {
                for script in store.scripts() {
                    println!("{}", script.name);
                }
            }

            ("status", _) => {
                let p = progress.lock().unwrap();
                println!(
                    "calories {:5.2}  activity {:5.2}  standup {:5.2}",
                    p.active_calories, p.activity, p.standup
                );
            }

            ("reload", _) => {
                for mac in &mut macros {
                    mac.register(engine);
                }
                println!("macros re-registered");
            }

            (other, _) => eprintln!("pymac: unknown command '{other}'"),
        }

        flush_streams(engine, &notices);
    }
}

/// Register a get/set host-function pair over one progress gauge.
fn register_gauge(
    engine: &'static MacroEngine,
    progress: &Arc<Mutex<DailyProgress>>,
    get_name: &str,
    set_name: &str,
    field: fn(&mut DailyProgress) -> &mut f64,
) {
    let p = Arc::clone(progress);
    let getter = PythonFunction::new(
        get_name,
        vec![],
        ValueKind::Double,
        Box::new(move |_| {
            let mut guard = p.lock().unwrap();
            Some(Value::Double(*field(&mut guard)))
        }),
    );
    engine.bridge.register(engine, getter);

    let p = Arc::clone(progress);
    let setter = PythonFunction::new(
        set_name,
        vec![ValueKind::Double],
        ValueKind::Void,
        Box::new(move |args| {
            if let [Value::Double(v)] = args {
                *field(&mut p.lock().unwrap()) = *v;
            }
            None
        }),
    );
    engine.bridge.register(engine, setter);
}

/// Echo newly captured stdout, then print any error notifications.
fn flush_streams(engine: &MacroEngine, notices: &Receiver<String>) {
    let out = engine.output.stdout();
    if !out.is_empty() {
        print!("{out}");
        engine.output.clear();
    }
    while let Ok(message) = notices.try_recv() {
        eprintln!("Python script error: {}", message.trim_end());
    }
}
