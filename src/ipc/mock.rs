//! In-memory presence host for tests

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use super::{Connection, LinkEvent, PresenceConnector, PresenceLink};
use crate::error::{PresenceError, Result};
use crate::presence::Activity;

#[derive(Debug, Default)]
struct MockState {
    connects: usize,
    open_links: usize,
    activities: Vec<Activity>,
    clears: usize,
    reject_login: bool,
    unavailable: bool,
    fail_updates: bool,
    client_ids: Vec<String>,
    event_senders: Vec<mpsc::UnboundedSender<LinkEvent>>,
}

/// Records everything the session sends; clones share state
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every handshake with a close frame
    pub fn reject_login(&self, reject: bool) {
        self.state.lock().unwrap().reject_login = reject;
    }

    /// Behave as if no socket is listening
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    /// Fail every activity write as a broken pipe would
    pub fn fail_updates(&self, fail: bool) {
        self.state.lock().unwrap().fail_updates = fail;
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn open_links(&self) -> usize {
        self.state.lock().unwrap().open_links
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.state.lock().unwrap().activities.clone()
    }

    pub fn clears(&self) -> usize {
        self.state.lock().unwrap().clears
    }

    pub fn client_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().client_ids.clone()
    }

    /// Simulate the host closing the most recent link
    pub fn drop_latest(&self, reason: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .event_senders
            .last()
            .map(|tx| tx.send(LinkEvent::Closed(reason.to_string())).is_ok())
            .unwrap_or(false)
    }
}

#[async_trait]
impl PresenceConnector for MockConnector {
    async fn connect(&self, client_id: &str) -> Result<Connection> {
        let mut state = self.state.lock().unwrap();
        state.connects += 1;
        state.client_ids.push(client_id.to_string());

        if state.unavailable {
            return Err(PresenceError::HostUnavailable);
        }
        if state.reject_login {
            return Err(PresenceError::Login("Invalid Client ID".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.event_senders.push(tx);
        state.open_links += 1;

        Ok(Connection {
            link: Box::new(MockLink {
                state: self.state.clone(),
                open: true,
            }),
            events: rx,
        })
    }
}

struct MockLink {
    state: Arc<Mutex<MockState>>,
    open: bool,
}

impl MockLink {
    fn release(&mut self) {
        if self.open {
            self.open = false;
            self.state.lock().unwrap().open_links -= 1;
        }
    }
}

#[async_trait]
impl PresenceLink for MockLink {
    async fn set_activity(&mut self, activity: &Activity) -> Result<()> {
        if !self.open {
            return Err(PresenceError::NotConnected);
        }
        let mut state = self.state.lock().unwrap();
        if state.fail_updates {
            return Err(PresenceError::Ipc("broken pipe".to_string()));
        }
        state.activities.push(activity.clone());
        Ok(())
    }

    async fn clear_activity(&mut self) -> Result<()> {
        if !self.open {
            return Err(PresenceError::NotConnected);
        }
        self.state.lock().unwrap().clears += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.release();
        Ok(())
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.release();
    }
}
