//! Presence channel abstraction
//!
//! The session talks to the host through these traits:
//! - `DiscordConnector`: local socket / named pipe client for the real host
//! - `MockConnector`: in-memory implementation for testing (in tests module)

pub mod discord;
pub mod frame;

#[cfg(test)]
pub mod mock;

pub use discord::DiscordConnector;

#[cfg(test)]
pub use mock::MockConnector;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::presence::Activity;

/// Unsolicited events from an open link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The host closed the channel
    Closed(String),
    /// The channel failed (I/O or protocol)
    Error(String),
}

/// An open, logged-in link: the writer side plus its event stream
pub struct Connection {
    pub link: Box<dyn PresenceLink>,
    pub events: mpsc::UnboundedReceiver<LinkEvent>,
}

/// Opens links to the host. `connect` resolving `Ok` means the host answered READY.
#[async_trait]
pub trait PresenceConnector: Send + Sync {
    async fn connect(&self, client_id: &str) -> Result<Connection>;
}

/// Writer side of an open link
#[async_trait]
pub trait PresenceLink: Send {
    async fn set_activity(&mut self, activity: &Activity) -> Result<()>;

    async fn clear_activity(&mut self) -> Result<()>;

    /// Close the link; the event stream ends afterwards
    async fn close(&mut self) -> Result<()>;
}
