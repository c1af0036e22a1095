//! 搜索进程启动器
//!
//! - 在工作目录中启动外部搜索工具（默认 rg），stdout/stderr 逐行回传
//! - 每个会话带递增序号，消费端据此丢弃过期输出
//! - abort 只发出终止信号，不等待进程退出

use crate::kernel::services::ports::search::{
    LaunchFailure, OutputStream, Result as SearchResult, SearchError, SearchMessage,
    SearchRequest, SessionStatus,
};
use crate::kernel::services::ports::Settings;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::Sender;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

static SEARCH_SESSION_ID: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> u64 {
    SEARCH_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle to one search invocation.
#[derive(Clone)]
pub struct SearchSession {
    id: u64,
    request: Arc<SearchRequest>,
    cancelled: Arc<AtomicBool>,
    status: Arc<Mutex<SessionStatus>>,
    kill: Arc<Notify>,
}

impl SearchSession {
    fn new(request: SearchRequest) -> Self {
        Self {
            id: next_session_id(),
            request: Arc::new(request),
            cancelled: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(SessionStatus::Running)),
            kill: Arc::new(Notify::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    pub fn status(&self) -> SessionStatus {
        self.status
            .lock()
            .map(|s| *s)
            .unwrap_or(SessionStatus::Failed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Requests termination. Returns false when the session had already
    /// finished; calling it again is a no-op.
    pub fn abort(&self) -> bool {
        self.cancelled.store(true, Ordering::Relaxed);
        if !transition(&self.status, SessionStatus::Cancelled) {
            return false;
        }
        self.kill.notify_one();
        tracing::info!(search_id = self.id, "search aborted");
        true
    }
}

fn transition(status: &Mutex<SessionStatus>, next: SessionStatus) -> bool {
    let Ok(mut status) = status.lock() else {
        return false;
    };
    if status.is_terminal() {
        return false;
    }
    *status = next;
    true
}

pub struct SearchLauncher {
    runtime: tokio::runtime::Handle,
    program: String,
    base_args: Vec<String>,
}

impl SearchLauncher {
    pub fn new(
        runtime: tokio::runtime::Handle,
        program: impl Into<String>,
        base_args: Vec<String>,
    ) -> Self {
        Self {
            runtime,
            program: program.into(),
            base_args,
        }
    }

    pub fn from_settings(runtime: tokio::runtime::Handle, settings: &Settings) -> Self {
        Self::new(runtime, settings.tool.clone(), settings.base_args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// base flags + extra args + pattern. An empty pattern is omitted so
    /// presets such as `--files` work on their own.
    pub fn build_args(&self, request: &SearchRequest) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend(request.extra_arg_tokens().map(str::to_string));
        if request.pattern.starts_with('-') {
            args.push("-e".to_string());
            args.push(request.pattern.clone());
        } else if !request.pattern.is_empty() {
            args.push(request.pattern.clone());
        }
        args
    }

    pub fn launch(
        &self,
        request: SearchRequest,
        tx: Sender<SearchMessage>,
    ) -> SearchResult<SearchSession> {
        if !request.work_dir.is_dir() {
            return Err(LaunchFailure::InvalidWorkDir(request.work_dir.clone()).into());
        }

        let args = self.build_args(&request);
        // tokio::process 需要在 runtime 上下文中 spawn
        let _enter = self.runtime.enter();
        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(&request.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_failure(e))?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.start_kill();
            return Err(LaunchFailure::MissingPipe("stdout").into());
        };
        let Some(stderr) = child.stderr.take() else {
            let _ = child.start_kill();
            return Err(LaunchFailure::MissingPipe("stderr").into());
        };

        let session = SearchSession::new(request);
        let search_id = session.id();
        tracing::info!(
            search_id,
            program = %self.program,
            args = ?args,
            work_dir = %session.request().work_dir.display(),
            "search started"
        );

        let stdout_task = self.runtime.spawn(forward_lines(
            stdout,
            OutputStream::Stdout,
            search_id,
            session.cancelled.clone(),
            tx.clone(),
        ));
        let stderr_task = self.runtime.spawn(forward_lines(
            stderr,
            OutputStream::Stderr,
            search_id,
            session.cancelled.clone(),
            tx.clone(),
        ));

        self.runtime.spawn(watch_child(WatchArgs {
            child,
            program: self.program.clone(),
            search_id,
            cancelled: session.cancelled.clone(),
            status: session.status.clone(),
            kill: session.kill.clone(),
            stdout_task,
            stderr_task,
            tx,
        }));

        Ok(session)
    }

    fn spawn_failure(&self, e: io::Error) -> SearchError {
        tracing::error!(program = %self.program, error = %e, "spawn search tool failed");
        let failure = if e.kind() == io::ErrorKind::NotFound {
            LaunchFailure::ToolNotFound {
                program: self.program.clone(),
            }
        } else {
            LaunchFailure::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            }
        };
        failure.into()
    }
}

/// Reads `reader` line by line until EOF or cancellation. Returns the last
/// line read, used as the failure detail for stderr.
async fn forward_lines<R>(
    reader: R,
    stream: OutputStream,
    search_id: u64,
    cancelled: Arc<AtomicBool>,
    tx: Sender<SearchMessage>,
) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);
    let mut last = None;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(search_id, ?stream, error = %e, "read search output failed");
                break;
            }
        }
        if cancelled.load(Ordering::Relaxed) {
            break;
        }

        let text = String::from_utf8_lossy(&buf)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        last = Some(text.clone());
        if tx
            .send(SearchMessage::Line {
                search_id,
                stream,
                text,
            })
            .await
            .is_err()
        {
            tracing::debug!(search_id, "search output receiver dropped");
            break;
        }
    }

    last
}

struct WatchArgs {
    child: Child,
    program: String,
    search_id: u64,
    cancelled: Arc<AtomicBool>,
    status: Arc<Mutex<SessionStatus>>,
    kill: Arc<Notify>,
    stdout_task: JoinHandle<Option<String>>,
    stderr_task: JoinHandle<Option<String>>,
    tx: Sender<SearchMessage>,
}

enum Ending {
    Exited(io::Result<ExitStatus>),
    Killed,
}

async fn watch_child(args: WatchArgs) {
    let WatchArgs {
        mut child,
        program,
        search_id,
        cancelled,
        status,
        kill,
        stdout_task,
        stderr_task,
        tx,
    } = args;

    let ending = tokio::select! {
        res = child.wait() => Ending::Exited(res),
        _ = kill.notified() => Ending::Killed,
    };

    if let Ending::Killed = ending {
        if let Err(e) = child.start_kill() {
            tracing::debug!(search_id, error = %e, "kill search process failed");
        }
        let _ = child.wait().await;
    }

    // 等读取任务结束，保证终止消息排在所有输出行之后
    let _ = stdout_task.await;
    let stderr_tail = stderr_task.await.ok().flatten();

    let msg = match ending {
        _ if cancelled.load(Ordering::Relaxed) => SearchMessage::Cancelled { search_id },
        Ending::Killed => SearchMessage::Cancelled { search_id },
        Ending::Exited(Ok(exit)) => classify_exit(search_id, &program, exit, stderr_tail),
        Ending::Exited(Err(e)) => SearchMessage::Failed {
            search_id,
            message: format!("waiting for {} failed: {}", program, e),
        },
    };

    let final_status = match &msg {
        SearchMessage::Complete { .. } => SessionStatus::Completed,
        SearchMessage::Cancelled { .. } => SessionStatus::Cancelled,
        _ => SessionStatus::Failed,
    };
    transition(&status, final_status);
    tracing::info!(search_id, status = ?final_status, "search finished");

    let _ = tx.send(msg).await;
}

/// Exit 0 (matches) and 1 (no matches) are both successful for rg/grep.
fn classify_exit(
    search_id: u64,
    program: &str,
    exit: ExitStatus,
    stderr_tail: Option<String>,
) -> SearchMessage {
    match exit.code() {
        Some(code @ (0 | 1)) => SearchMessage::Complete {
            search_id,
            exit_code: Some(code),
        },
        Some(code) => {
            let message = match stderr_tail {
                Some(detail) if !detail.is_empty() => {
                    format!("{} exited with code {}: {}", program, code, detail)
                }
                _ => format!("{} exited with code {}", program, code),
            };
            SearchMessage::Failed { search_id, message }
        }
        None => SearchMessage::Failed {
            search_id,
            message: format!("{} terminated by signal", program),
        },
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/launcher.rs"]
mod tests;
