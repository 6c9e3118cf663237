/*!
 * Cosmos Presence - astronomy rich presence for Discord
 *
 * A self-healing daemon that:
 * - watches the process table for the Discord client
 * - attaches to its local RPC socket
 * - rotates through a catalog of astronomical objects without repeats
 * - recovers from disconnects and host restarts
 */

pub mod autolaunch;
pub mod catalog;
pub mod cli_style;
pub mod config;
pub mod discovery;
pub mod error;
pub mod format;
pub mod ipc;
pub mod logging;
pub mod presence;
pub mod session;
pub mod settings;
pub mod timers;
pub mod watcher;

// Re-export commonly used types
pub use catalog::{AstronomicalObject, CATALOG};
pub use config::PresenceConfig;
pub use discovery::DiscoveryTracker;
pub use error::{PresenceError, Result};
pub use presence::{PresencePayload, SessionEvent, Status};
pub use session::{spawn, SessionDeps, SessionHandle, SessionSnapshot, SessionState};
pub use settings::{SessionCredentials, SettingsStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
