//! Host process watcher
//!
//! Point-in-time queries of the OS process table for the host process, and
//! the decisions the session takes on their results. The watcher keeps no
//! state of its own; the session records the resulting [`WatchState`].

use async_trait::async_trait;
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt;
use std::sync::{Arc, Mutex};
use sysinfo::{ProcessesToUpdate, System};
use tracing::trace;

use crate::error::{PresenceError, Result};

/// Counts running processes by name
#[async_trait]
pub trait ProcessProbe: Send + Sync {
    async fn count(&self, name: &str) -> Result<usize>;
}

/// Process table probe backed by `sysinfo`
#[derive(Clone)]
pub struct SysinfoProbe {
    system: Arc<Mutex<System>>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessProbe for SysinfoProbe {
    async fn count(&self, name: &str) -> Result<usize> {
        let system = self.system.clone();
        let target = name.to_string();

        // Refreshing the whole table is blocking work
        tokio::task::spawn_blocking(move || {
            let mut system = system
                .lock()
                .map_err(|_| PresenceError::ProcessQuery("process table lock poisoned".to_string()))?;
            system.refresh_processes(ProcessesToUpdate::All, true);

            let count = system
                .processes()
                .values()
                .filter(|process| matches_process_name(process.name(), &target))
                .count();
            trace!("{} process(es) named {}", count, target);
            Ok(count)
        })
        .await
        .map_err(|e| PresenceError::ProcessQuery(e.to_string()))?
    }
}

/// Case-insensitive match that tolerates a missing or extra `.exe` suffix
pub fn matches_process_name(process_name: &OsStr, target: &str) -> bool {
    let process_name = process_name.to_string_lossy();
    let strip = |name: &str| -> String {
        let lower = name.to_ascii_lowercase();
        match lower.strip_suffix(".exe") {
            Some(stem) => stem.to_string(),
            None => lower,
        }
    };
    strip(&process_name) == strip(target)
}

/// Where the watcher stands with respect to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchState {
    /// Host not running (or not yet queried)
    Searching,
    /// Host running, session start pending
    Found,
    /// Session started against a running host
    SessionActive,
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchState::Searching => write!(f, "SEARCHING"),
            WatchState::Found => write!(f, "FOUND"),
            WatchState::SessionActive => write!(f, "SESSION_ACTIVE"),
        }
    }
}

/// Which query a probe result answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    /// Discovery pass (start, re-query, post-disconnect retry)
    Initial,
    /// Periodic re-check while the host is believed running
    Liveness,
}

/// What the session does with a probe result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    /// Initial query failed: report DISCONNECTED and stop retrying
    Halt,
    /// Host absent: report SEARCHING and re-query after the short delay
    Retry,
    /// Host present: schedule session start and the liveness check
    StartSession,
    /// Liveness check passed: report CONNECTING and carry on
    StillAlive,
    /// Liveness check found the host gone: back to discovery
    Lost,
    /// Liveness query failed: keep the prior status
    Inconclusive,
}

/// Decide on a probe result for the given phase
pub fn decide(phase: ProbePhase, result: &Result<usize>) -> WatchAction {
    match (phase, result) {
        (ProbePhase::Initial, Err(_)) => WatchAction::Halt,
        (ProbePhase::Initial, Ok(0)) => WatchAction::Retry,
        (ProbePhase::Initial, Ok(_)) => WatchAction::StartSession,
        (ProbePhase::Liveness, Err(_)) => WatchAction::Inconclusive,
        // The count may include a self-match of the querying process
        (ProbePhase::Liveness, Ok(count)) if *count <= 1 => WatchAction::Lost,
        (ProbePhase::Liveness, Ok(_)) => WatchAction::StillAlive,
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;

    #[derive(Debug, Default)]
    struct MockProbeState {
        count: usize,
        fail: bool,
        queries: usize,
    }

    /// Scriptable probe; clones share state
    #[derive(Debug, Clone, Default)]
    pub struct MockProbe {
        state: Arc<Mutex<MockProbeState>>,
    }

    impl MockProbe {
        pub fn with_count(count: usize) -> Self {
            let probe = Self::default();
            probe.set_count(count);
            probe
        }

        pub fn set_count(&self, count: usize) {
            self.state.lock().unwrap().count = count;
        }

        pub fn set_failing(&self, fail: bool) {
            self.state.lock().unwrap().fail = fail;
        }

        pub fn queries(&self) -> usize {
            self.state.lock().unwrap().queries
        }
    }

    #[async_trait]
    impl ProcessProbe for MockProbe {
        async fn count(&self, _name: &str) -> Result<usize> {
            let mut state = self.state.lock().unwrap();
            state.queries += 1;
            if state.fail {
                return Err(PresenceError::ProcessQuery("process list unavailable".to_string()));
            }
            Ok(state.count)
        }
    }
}
