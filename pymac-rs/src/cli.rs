//! Command-line argument parsing for the demo binary.
//!
//! Usage:
//!   pymac [-d<dir>] [-c<code>] [-q] [<script>]

use std::path::PathBuf;

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// User script directory override (`-d<dir>`).
    pub script_dir: Option<PathBuf>,
    /// Python code to execute before entering the prompt (`-c<code>`).
    pub command: Option<String>,
    /// Suppress the startup banner (`-q`).
    pub quiet: bool,
    /// Optional user script to run on startup.
    pub startup_script: Option<String>,
}

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'q' => args.quiet = true,

                // -d<dir>
                'd' => {
                    let dir = take_value(&chars, &mut j, argv, &mut i)
                        .ok_or("-d requires a directory argument")?;
                    args.script_dir = Some(PathBuf::from(dir));
                }

                // -c<code>
                'c' => {
                    let code = take_value(&chars, &mut j, argv, &mut i)
                        .ok_or("-c requires a code argument")?;
                    args.command = Some(code);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 => args.startup_script = Some(positional.remove(0)),
        n => return Err(format!("too many arguments ({n})")),
    }

    Ok(args)
}

/// Consume a flag's value: either the remainder of the current argument
/// (`-dfoo`) or the following argument (`-d foo`).
fn take_value(chars: &[char], j: &mut usize, argv: &[String], i: &mut usize) -> Option<String> {
    if *j + 1 < chars.len() {
        let value: String = chars[*j + 1..].iter().collect();
        *j = chars.len();
        Some(value)
    } else if *i + 1 < argv.len() {
        *i += 1;
        Some(argv[*i].clone())
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let args = parse_argv(&[]).unwrap();
        assert!(args.script_dir.is_none());
        assert!(args.command.is_none());
        assert!(!args.quiet);
        assert!(args.startup_script.is_none());
    }

    #[test]
    fn embedded_and_separate_values() {
        let args = parse_argv(&argv(&["-d/tmp/scripts", "-c", "print(1)"])).unwrap();
        assert_eq!(args.script_dir.as_deref(), Some(std::path::Path::new("/tmp/scripts")));
        assert_eq!(args.command.as_deref(), Some("print(1)"));
    }

    #[test]
    fn grouped_flags_and_positional() {
        let args = parse_argv(&argv(&["-q", "startup"])).unwrap();
        assert!(args.quiet);
        assert_eq!(args.startup_script.as_deref(), Some("startup"));
    }

    #[test]
    fn missing_value_is_an_error() {
        assert!(parse_argv(&argv(&["-c"])).is_err());
        assert!(parse_argv(&argv(&["-d"])).is_err());
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(parse_argv(&argv(&["-z"])).is_err());
    }

    #[test]
    fn too_many_positionals() {
        assert!(parse_argv(&argv(&["one", "two"])).is_err());
    }
}
