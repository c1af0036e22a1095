//! Stand-in for the search tool, used by the integration tests.
//!
//! Stub flags are consumed; other flags are ignored and the last free
//! argument is the pattern.
//!
//! - `--stub-output <file>`: candidate lines; those containing the pattern are printed
//! - `--stub-delay-ms <n>`: pause before each printed line (`GREPNAV_STUB_DELAY_MS`)
//! - `--stub-stderr <text>`: written to stderr before exiting
//! - `--stub-exit <code>`: exit code, default 0 when something matched and 1 otherwise

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Default)]
struct StubArgs {
    output: Option<PathBuf>,
    delay: Option<Duration>,
    stderr: Option<String>,
    exit: Option<i32>,
    pattern: Option<String>,
}

impl StubArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--stub-output" => parsed.output = args.next().map(PathBuf::from),
                "--stub-delay-ms" => {
                    parsed.delay = args
                        .next()
                        .and_then(|v| v.parse().ok())
                        .map(Duration::from_millis)
                }
                "--stub-stderr" => parsed.stderr = args.next(),
                "--stub-exit" => parsed.exit = args.next().and_then(|v| v.parse().ok()),
                "-e" => parsed.pattern = args.next(),
                _ if arg.starts_with('-') => {}
                _ => parsed.pattern = Some(arg),
            }
        }
        if parsed.delay.is_none() {
            parsed.delay = std::env::var("GREPNAV_STUB_DELAY_MS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis);
        }
        parsed
    }
}

fn main() {
    let args = StubArgs::parse(std::env::args().skip(1));
    let pattern = args.pattern.unwrap_or_default();
    let candidates = args
        .output
        .and_then(|path| std::fs::read_to_string(path).ok())
        .unwrap_or_default();

    let mut stdout = std::io::stdout();
    let mut matched = false;
    for line in candidates.lines().filter(|l| l.contains(pattern.as_str())) {
        if let Some(delay) = args.delay {
            std::thread::sleep(delay);
        }
        if writeln!(stdout, "{line}").and_then(|_| stdout.flush()).is_err() {
            std::process::exit(2);
        }
        matched = true;
    }

    if let Some(text) = args.stderr {
        eprintln!("{text}");
    }
    std::process::exit(args.exit.unwrap_or(if matched { 0 } else { 1 }));
}
