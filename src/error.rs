/*!
 * Error types for cosmos-presence
 */

use std::fmt;
use std::io;

use crate::ipc::frame::FrameError;

pub type Result<T> = std::result::Result<T, PresenceError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_RUNTIME: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug)]
pub enum PresenceError {
    /// I/O error
    Io(io::Error),

    /// Configuration error (config file, settings documents)
    Config(String),

    /// Malformed frame or unexpected reply on the presence channel
    Ipc(String),

    /// The host rejected the handshake or closed the channel during login
    Login(String),

    /// No presence socket could be opened
    HostUnavailable,

    /// An activity update was attempted without an open link
    NotConnected,

    /// Process table query failed
    ProcessQuery(String),

    /// The session task has already shut down
    SessionClosed,

    /// Operation not available on this platform
    Unsupported(&'static str),
}

impl PresenceError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PresenceError::Config(_) | PresenceError::Unsupported(_) => EXIT_FATAL,
            _ => EXIT_RUNTIME,
        }
    }

    /// Check if this error is transient (a later attempt may succeed)
    pub fn is_transient(&self) -> bool {
        match self {
            PresenceError::Io(io_err) => Self::is_io_transient(io_err),
            PresenceError::HostUnavailable
            | PresenceError::NotConnected
            | PresenceError::Ipc(_)
            | PresenceError::Login(_) => true,
            _ => false,
        }
    }

    fn is_io_transient(io_err: &io::Error) -> bool {
        use io::ErrorKind::*;
        matches!(
            io_err.kind(),
            ConnectionRefused
                | ConnectionReset
                | ConnectionAborted
                | NotConnected
                | BrokenPipe
                | TimedOut
                | Interrupted
                | WouldBlock
                | UnexpectedEof
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            PresenceError::Io(_) => ErrorCategory::IoError,
            PresenceError::Config(_) => ErrorCategory::Configuration,
            PresenceError::Ipc(_)
            | PresenceError::HostUnavailable
            | PresenceError::NotConnected => ErrorCategory::Channel,
            PresenceError::Login(_) => ErrorCategory::Security,
            PresenceError::ProcessQuery(_) => ErrorCategory::Process,
            PresenceError::SessionClosed => ErrorCategory::Session,
            PresenceError::Unsupported(_) => ErrorCategory::Platform,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// I/O operation errors
    IoError,
    /// Configuration errors
    Configuration,
    /// Presence channel errors
    Channel,
    /// Login / authorization errors
    Security,
    /// Process table errors
    Process,
    /// Session lifecycle errors
    Session,
    /// Platform support errors
    Platform,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Channel => write!(f, "channel"),
            ErrorCategory::Security => write!(f, "security"),
            ErrorCategory::Process => write!(f, "process"),
            ErrorCategory::Session => write!(f, "session"),
            ErrorCategory::Platform => write!(f, "platform"),
        }
    }
}

impl fmt::Display for PresenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceError::Io(err) => write!(f, "I/O error: {}", err),
            PresenceError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PresenceError::Ipc(msg) => write!(f, "Presence channel error: {}", msg),
            PresenceError::Login(msg) => write!(f, "Login rejected: {}", msg),
            PresenceError::HostUnavailable => write!(f, "No presence socket available"),
            PresenceError::NotConnected => write!(f, "Presence link is not open"),
            PresenceError::ProcessQuery(msg) => write!(f, "Process query failed: {}", msg),
            PresenceError::SessionClosed => write!(f, "Presence session has shut down"),
            PresenceError::Unsupported(what) => {
                write!(f, "{} is not supported on this platform", what)
            }
        }
    }
}

impl std::error::Error for PresenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PresenceError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PresenceError {
    fn from(err: io::Error) -> Self {
        PresenceError::Io(err)
    }
}

impl From<serde_json::Error> for PresenceError {
    fn from(err: serde_json::Error) -> Self {
        PresenceError::Config(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for PresenceError {
    fn from(err: toml::de::Error) -> Self {
        PresenceError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for PresenceError {
    fn from(err: toml::ser::Error) -> Self {
        PresenceError::Config(format!("TOML write error: {}", err))
    }
}

impl From<FrameError> for PresenceError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(io_err) => PresenceError::Io(io_err),
            other => PresenceError::Ipc(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(PresenceError::Config("bad".to_string()).exit_code(), EXIT_FATAL);
        assert_eq!(PresenceError::Unsupported("auto-launch").exit_code(), EXIT_FATAL);
        assert_eq!(PresenceError::HostUnavailable.exit_code(), EXIT_RUNTIME);
        assert_eq!(PresenceError::SessionClosed.exit_code(), EXIT_RUNTIME);
    }

    #[test]
    fn test_transient_errors() {
        assert!(PresenceError::HostUnavailable.is_transient());
        assert!(PresenceError::Login("closed".to_string()).is_transient());
        assert!(PresenceError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe")).is_transient());

        assert!(!PresenceError::Config("x".to_string()).is_transient());
        assert!(!PresenceError::ProcessQuery("x".to_string()).is_transient());
        assert!(
            !PresenceError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "no")).is_transient()
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(PresenceError::NotConnected.category(), ErrorCategory::Channel);
        assert_eq!(
            PresenceError::Login("x".to_string()).category(),
            ErrorCategory::Security
        );
        assert_eq!(
            PresenceError::ProcessQuery("x".to_string()).category(),
            ErrorCategory::Process
        );
        assert_eq!(ErrorCategory::Channel.to_string(), "channel");
    }

    #[test]
    fn test_display() {
        let err = PresenceError::Login("Invalid Client ID".to_string());
        assert_eq!(err.to_string(), "Login rejected: Invalid Client ID");

        let err = PresenceError::Unsupported("auto-launch");
        assert_eq!(err.to_string(), "auto-launch is not supported on this platform");
    }

    #[test]
    fn test_from_frame_error() {
        let err: PresenceError = FrameError::Oversized(1 << 20).into();
        assert!(matches!(err, PresenceError::Ipc(_)));

        let err: PresenceError =
            FrameError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")).into();
        assert!(matches!(err, PresenceError::Io(_)));
    }

    #[test]
    fn test_error_source() {
        use std::error::Error;

        let err = PresenceError::Io(io::Error::other("disk"));
        assert!(err.source().is_some());
        assert!(PresenceError::NotConnected.source().is_none());
    }
}
