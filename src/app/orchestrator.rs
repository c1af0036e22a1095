//! 搜索编排：同一时刻至多一个活跃会话
//!
//! 新的搜索会先中止旧会话并冻结它的索引；旧会话迟到的输出按 search_id 丢弃。

use crate::kernel::services::adapters::{SearchLauncher, SearchSession};
use crate::kernel::services::ports::{SearchError, SearchMessage, SearchRequest};
use crate::kernel::SearchState;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TryRecvError};

pub const MAX_SEARCH_DRAIN_PER_TICK: usize = 4096;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

pub struct SearchOrchestrator {
    launcher: SearchLauncher,
    tx: mpsc::Sender<SearchMessage>,
    rx: mpsc::Receiver<SearchMessage>,
    active: Option<SearchSession>,
    state: SearchState,
}

impl SearchOrchestrator {
    pub fn new(launcher: SearchLauncher, channel_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(channel_capacity.max(1));
        Self {
            launcher,
            tx,
            rx,
            active: None,
            state: SearchState::default(),
        }
    }

    pub fn launcher(&self) -> &SearchLauncher {
        &self.launcher
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn active_session(&self) -> Option<&SearchSession> {
        self.active.as_ref()
    }

    /// Sender feeding the same queue the launcher writes to.
    pub fn message_sender(&self) -> mpsc::Sender<SearchMessage> {
        self.tx.clone()
    }

    /// Supersedes any running session and starts `request`.
    pub fn launch(&mut self, request: SearchRequest) -> Result<u64, SearchError> {
        self.supersede_active();

        match self.launcher.launch(request.clone(), self.tx.clone()) {
            Ok(session) => {
                let id = session.id();
                self.state.begin(id, request);
                self.active = Some(session);
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "search launch failed");
                self.state.fail_launch(request, e.to_string());
                Err(e)
            }
        }
    }

    /// Aborts the running session, if any. The buffer keeps what it has.
    ///
    /// A session whose process already exited is left attached so `pump`
    /// still delivers its queued output and completion.
    pub fn abort_active(&mut self) -> bool {
        let Some(session) = self.active.as_ref() else {
            return false;
        };
        if !session.abort() {
            return false;
        }
        let search_id = session.id();
        self.active = None;
        self.state.mark_cancelled(search_id);
        true
    }

    fn supersede_active(&mut self) {
        let Some(session) = self.active.take() else {
            return;
        };
        session.abort();
        self.state.mark_cancelled(session.id());
    }

    /// Applies queued messages. Returns true if the display changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        let mut drained = 0usize;

        while drained < MAX_SEARCH_DRAIN_PER_TICK {
            let msg = match self.rx.try_recv() {
                Ok(msg) => msg,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };
            drained += 1;

            let finished = msg.is_terminal()
                && self.active.as_ref().map(SearchSession::id) == Some(msg.search_id());
            changed |= self.state.apply_message(msg);
            if finished {
                self.active = None;
            }
        }

        changed
    }

    /// Pumps until the active session finishes. Returns false on timeout.
    pub fn pump_until_finished(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.active.is_none() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(IDLE_POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/app/orchestrator.rs"]
mod tests;
