//! grepnav: line-mode front-end.
//!
//! `grepnav [dir] [pattern] [extra args...]`

mod logging;

use grepnav::app::{build_runtime, NavigationAction, NavigationOutcome, Workbench};
use grepnav::kernel::services::adapters::{
    ensure_settings_file, get_history_path, load_history, load_settings, PreviewTarget,
};
use grepnav::kernel::services::ports::{SessionStatus, Settings};
use grepnav::kernel::{HistoryKind, Lookup, SearchDirection};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(20);
const PREVIEW_HEIGHT: usize = 11;
const EOF_DRAIN_TIMEOUT: Duration = Duration::from_secs(600);

const HELP: &str = "\
commands:
  s <pattern>   search (empty pattern allowed with e.g. --files)
  d <dir>       set search directory
  a <args>      set extra arguments (a <n> picks preset n)
  x             abort running search
  l <n>         locate line n
  v <n>         preview line n
  e <n>         open line n in the editor
  p <n>         open the containing project of line n
  /text ?text   find forward / backward in the results
  h             history and presets
  q             quit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Search(String),
    Dir(String),
    Args(String),
    Abort,
    Locate(usize),
    Navigate(NavigationAction, usize),
    Find(SearchDirection, String),
    History,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

fn parse_command(input: &str) -> Command {
    let input = input.trim_end_matches(['\n', '\r']);
    if let Some(text) = input.strip_prefix('/') {
        return Command::Find(SearchDirection::Forward, text.to_string());
    }
    if let Some(text) = input.strip_prefix('?') {
        return Command::Find(SearchDirection::Backward, text.to_string());
    }

    let trimmed = input.trim_start();
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed.trim_end(), ""),
    };

    match head {
        "" => Command::Empty,
        "s" => Command::Search(rest.to_string()),
        "d" => Command::Dir(rest.to_string()),
        "a" => Command::Args(rest.to_string()),
        "x" => Command::Abort,
        "h" => Command::History,
        "help" => Command::Help,
        "q" => Command::Quit,
        "l" | "v" | "e" | "p" => match parse_line_number(rest) {
            Some(line) => match head {
                "l" => Command::Locate(line),
                "v" => Command::Navigate(NavigationAction::Preview, line),
                "e" => Command::Navigate(NavigationAction::Edit, line),
                _ => Command::Navigate(NavigationAction::OpenProject, line),
            },
            None => Command::Invalid(format!("expected a line number: {input}")),
        },
        _ => Command::Invalid(format!("unknown command: {input}")),
    }
}

/// Lines are shown 1-based; the index is 0-based.
fn parse_line_number(text: &str) -> Option<usize> {
    text.parse::<usize>().ok()?.checked_sub(1)
}

/// Prints buffer lines as they arrive and the final status once.
#[derive(Default)]
struct OutputView {
    search_id: Option<u64>,
    printed: usize,
    reported: Option<SessionStatus>,
}

impl OutputView {
    fn flush(&mut self, wb: &Workbench, out: &mut impl Write) -> io::Result<()> {
        let state = wb.state();
        let search_id = state.index().search_id();
        if search_id != self.search_id {
            self.search_id = search_id;
            self.printed = 0;
            self.reported = None;
        }

        while self.printed < state.line_count() {
            let text = state.line_text(self.printed).unwrap_or_default();
            writeln!(out, "{:>6}  {}", self.printed + 1, text)?;
            self.printed += 1;
        }

        if state.status != self.reported {
            self.reported = state.status;
            if state.status.is_some_and(SessionStatus::is_terminal) {
                writeln!(out, "-- {}", state.status_text())?;
            }
        }
        out.flush()
    }
}

fn spawn_stdin_reader() -> io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("grepnav-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

fn load_startup_settings() -> Settings {
    if let Err(e) = ensure_settings_file() {
        tracing::warn!(error = %e, "create settings file failed");
    }
    load_settings().unwrap_or_default().with_env_overrides()
}

fn print_preview(preview: &PreviewTarget, out: &mut impl Write) -> io::Result<()> {
    let start = preview.window_start(PREVIEW_HEIGHT);
    let end = (start + PREVIEW_HEIGHT).min(preview.text.len_lines());
    writeln!(out, "== {}", preview.path.display())?;
    for idx in start..end {
        let line = preview.text.line(idx).to_string();
        let marker = if idx + 1 == preview.line { '>' } else { ' ' };
        writeln!(
            out,
            "{marker}{:>6}  {}",
            idx + 1,
            line.trim_end_matches(['\n', '\r'])
        )?;
    }
    if let Some(hit) = preview.highlight {
        writeln!(out, "   match at line {}", hit.line + 1)?;
    }
    Ok(())
}

fn describe_lookup(lookup: &Lookup) -> &'static str {
    match lookup {
        Lookup::Bound(_) => "bound",
        Lookup::Unbound => "line has no location",
        Lookup::NotYetAvailable => "line not available yet",
    }
}

/// Returns false when the driver should exit.
fn handle(
    wb: &mut Workbench,
    command: Command,
    log_dir: Option<&Path>,
    out: &mut impl Write,
) -> io::Result<bool> {
    match command {
        Command::Empty => {}
        Command::Quit => return Ok(false),
        Command::Help => {
            writeln!(out, "{HELP}")?;
            if let Some(dir) = log_dir {
                writeln!(out, "logs: {}", dir.display())?;
            }
        }
        Command::Invalid(message) => writeln!(out, "{message}")?,
        Command::Search(pattern) => {
            wb.set_pattern(pattern);
            // 失败原因由 OutputView 作为状态行打印
            if let Err(e) = wb.submit() {
                tracing::debug!(error = %e, "submit failed");
            }
        }
        Command::Dir(dir) => {
            wb.set_work_dir(PathBuf::from(dir));
            writeln!(out, "dir: {}", wb.work_dir().display())?;
        }
        Command::Args(args) => {
            let preset = args
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|n| wb.presets().get(n).cloned());
            wb.set_extra_args(preset.unwrap_or(args));
            writeln!(out, "args: {}", wb.extra_args())?;
        }
        Command::Abort => {
            if !wb.abort() {
                writeln!(out, "no running search")?;
            }
        }
        Command::Locate(line) => {
            let status = wb.set_cursor_line(line);
            writeln!(out, "{status}")?;
        }
        Command::Navigate(action, line) => match wb.navigate(action, line) {
            Ok(NavigationOutcome::Previewed(preview)) => print_preview(&preview, out)?,
            Ok(NavigationOutcome::Edited(location)) => {
                writeln!(out, "editing {}", location.locator())?
            }
            Ok(NavigationOutcome::OpenedProject { root, location }) => writeln!(
                out,
                "opened {} at {}",
                root.display(),
                location.locator()
            )?,
            Ok(NavigationOutcome::Skipped(lookup)) => {
                writeln!(out, "{}", describe_lookup(&lookup))?
            }
            Err(e) => writeln!(out, "error: {e}")?,
        },
        Command::Find(direction, text) => match wb.find_in_buffer(&text, direction) {
            Some(hit) => {
                let wrapped = if hit.wrapped { " (wrapped)" } else { "" };
                writeln!(out, "line {}{wrapped}: {}", hit.found.line + 1, wb.status_line())?;
            }
            None => writeln!(out, "not found: {text}")?,
        },
        Command::History => {
            for (label, kind) in [
                ("directories", HistoryKind::Directory),
                ("patterns", HistoryKind::Pattern),
            ] {
                writeln!(out, "{label}:")?;
                for entry in wb.history().all(kind) {
                    writeln!(out, "  {entry}")?;
                }
            }
            writeln!(out, "presets:")?;
            for (i, preset) in wb.presets().iter().enumerate() {
                writeln!(out, "  {}: {preset}", i + 1)?;
            }
        }
    }
    Ok(true)
}

fn main() -> io::Result<()> {
    let logging = logging::init();
    let log_dir = logging.as_ref().map(logging::LoggingGuard::log_dir);

    let mut args = std::env::args().skip(1);
    let work_dir = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let pattern = args.next();
    let extra_args: Vec<String> = args.collect();

    let settings = load_startup_settings();
    let history = load_history(settings.history_limit);
    let runtime = build_runtime()?;

    let mut wb = Workbench::new(runtime.handle().clone(), settings, history, work_dir);
    if let Some(path) = get_history_path() {
        wb = wb.with_history_path(path);
    }
    if !extra_args.is_empty() {
        wb.set_extra_args(extra_args.join(" "));
    }

    let mut out = io::stdout();
    let mut view = OutputView::default();
    view.flush(&wb, &mut out)?;

    if let Some(pattern) = pattern {
        handle(&mut wb, Command::Search(pattern), log_dir, &mut out)?;
    }

    let input = spawn_stdin_reader()?;
    loop {
        wb.tick();
        view.flush(&wb, &mut out)?;

        match input.recv_timeout(TICK) {
            Ok(line) => {
                if !handle(&mut wb, parse_command(&line), log_dir, &mut out)? {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                wb.wait_for_search(EOF_DRAIN_TIMEOUT);
                view.flush(&wb, &mut out)?;
                break;
            }
        }
    }

    wb.abort();
    tracing::info!("grepnav exiting");
    Ok(())
}
