//! Discord local RPC client
//!
//! Opens the first reachable `discord-ipc-N` socket (Unix domain socket or
//! Windows named pipe), performs the handshake and hands back a link. A
//! background reader answers pings and reports closure on the event channel.

use async_trait::async_trait;
use serde_json::json;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::frame::{read_frame, write_frame, Frame, Opcode};
use super::{Connection, LinkEvent, PresenceConnector, PresenceLink};
use crate::error::{PresenceError, Result};
use crate::presence::Activity;

/// Socket slots the host may listen on
const SOCKET_SLOTS: u8 = 10;

/// How long opening the socket and waiting for READY may take
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

trait IpcStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> IpcStream for T {}

type SharedWriter = Arc<Mutex<WriteHalf<Box<dyn IpcStream>>>>;

/// Connects to the Discord client running on this machine
#[derive(Debug, Clone)]
pub struct DiscordConnector {
    candidates: Vec<PathBuf>,
    timeout: Duration,
}

impl DiscordConnector {
    pub fn new() -> Self {
        Self::with_candidates(socket_candidates())
    }

    /// Use an explicit list of socket paths, tried in order
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Give up on a login that has not seen READY after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    async fn open(&self) -> Result<Box<dyn IpcStream>> {
        for path in &self.candidates {
            match open_socket(path).await {
                Ok(stream) => {
                    debug!("Opened presence socket {}", path.display());
                    return Ok(stream);
                }
                Err(e) => trace!("Presence socket {} unavailable: {}", path.display(), e),
            }
        }
        Err(PresenceError::HostUnavailable)
    }
}

impl Default for DiscordConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceConnector for DiscordConnector {
    async fn connect(&self, client_id: &str) -> Result<Connection> {
        match tokio::time::timeout(self.timeout, self.login(client_id)).await {
            Ok(result) => result,
            Err(_) => Err(PresenceError::Login(format!(
                "no READY from host within {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }
}

impl DiscordConnector {
    async fn login(&self, client_id: &str) -> Result<Connection> {
        let stream = self.open().await?;
        let (mut reader, mut writer) = tokio::io::split(stream);

        let handshake = Frame::new(Opcode::Handshake, json!({ "v": 1, "client_id": client_id }));
        write_frame(&mut writer, &handshake).await?;

        let reply = read_frame(&mut reader).await?;
        match reply.opcode {
            Opcode::Frame if reply.event() == Some("READY") => {}
            Opcode::Close => {
                let reason = reply.message().unwrap_or("closed during handshake");
                return Err(PresenceError::Login(reason.to_string()));
            }
            other => {
                return Err(PresenceError::Ipc(format!(
                    "unexpected handshake reply {:?} ({:?})",
                    other,
                    reply.event()
                )));
            }
        }

        let writer: SharedWriter = Arc::new(Mutex::new(writer));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let reader_task = tokio::spawn(read_loop(reader, writer.clone(), events_tx));

        Ok(Connection {
            link: Box::new(DiscordLink {
                writer,
                reader_task,
                pid: std::process::id(),
            }),
            events: events_rx,
        })
    }
}

async fn read_loop(
    mut reader: ReadHalf<Box<dyn IpcStream>>,
    writer: SharedWriter,
    events: mpsc::UnboundedSender<LinkEvent>,
) {
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(e) => {
                let _ = events.send(LinkEvent::Error(e.to_string()));
                return;
            }
        };

        match frame.opcode {
            Opcode::Ping => {
                let pong = Frame::new(Opcode::Pong, frame.body);
                let mut writer = writer.lock().await;
                if let Err(e) = write_frame(&mut *writer, &pong).await {
                    let _ = events.send(LinkEvent::Error(e.to_string()));
                    return;
                }
            }
            Opcode::Close => {
                let reason = frame.message().unwrap_or("closed by host").to_string();
                let _ = events.send(LinkEvent::Closed(reason));
                return;
            }
            Opcode::Frame if frame.event() == Some("ERROR") => {
                warn!(
                    "Host rejected request: {}",
                    frame.message().unwrap_or("no message")
                );
            }
            _ => trace!("Presence frame {:?}: {}", frame.opcode, frame.body),
        }
    }
}

/// Open link to the Discord client
pub struct DiscordLink {
    writer: SharedWriter,
    reader_task: JoinHandle<()>,
    pid: u32,
}

impl DiscordLink {
    async fn send_activity(&mut self, activity: serde_json::Value) -> Result<()> {
        let request = Frame::new(
            Opcode::Frame,
            json!({
                "cmd": "SET_ACTIVITY",
                "args": { "pid": self.pid, "activity": activity },
                "nonce": Uuid::new_v4().to_string(),
            }),
        );
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &request).await?;
        Ok(())
    }
}

#[async_trait]
impl PresenceLink for DiscordLink {
    async fn set_activity(&mut self, activity: &Activity) -> Result<()> {
        self.send_activity(serde_json::to_value(activity)?).await
    }

    async fn clear_activity(&mut self) -> Result<()> {
        self.send_activity(serde_json::Value::Null).await
    }

    async fn close(&mut self) -> Result<()> {
        self.reader_task.abort();
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &Frame::new(Opcode::Close, json!({}))).await?;
        writer.shutdown().await?;
        Ok(())
    }
}

impl Drop for DiscordLink {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

#[cfg(unix)]
async fn open_socket(path: &Path) -> io::Result<Box<dyn IpcStream>> {
    let stream = tokio::net::UnixStream::connect(path).await?;
    Ok(Box::new(stream))
}

#[cfg(windows)]
async fn open_socket(path: &Path) -> io::Result<Box<dyn IpcStream>> {
    let pipe = tokio::net::windows::named_pipe::ClientOptions::new().open(path)?;
    Ok(Box::new(pipe))
}

#[cfg(unix)]
fn socket_candidates() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = ["XDG_RUNTIME_DIR", "TMPDIR", "TMP", "TEMP"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(PathBuf::from)
        .collect();
    dirs.push(PathBuf::from("/tmp"));

    // Flatpak and Snap installs put the socket one level deeper
    let sandboxed: Vec<PathBuf> = dirs
        .iter()
        .flat_map(|dir| [dir.join("app/com.discordapp.Discord"), dir.join("snap.discord")])
        .collect();
    dirs.extend(sandboxed);
    dirs.dedup();

    dirs.iter()
        .flat_map(|dir| (0..SOCKET_SLOTS).map(move |slot| dir.join(format!("discord-ipc-{}", slot))))
        .collect()
}

#[cfg(windows)]
fn socket_candidates() -> Vec<PathBuf> {
    (0..SOCKET_SLOTS)
        .map(|slot| PathBuf::from(format!(r"\\?\pipe\discord-ipc-{}", slot)))
        .collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::presence::{ActivityAssets, ActivityTimestamps, Button};
    use tempfile::tempdir;
    use tokio::net::UnixListener;

    fn sample_activity() -> Activity {
        Activity {
            details: "Observing: M60".to_string(),
            state: "Coordinates: +12° 43′ 40″ +11° 33′ 8″".to_string(),
            assets: ActivityAssets {
                large_image: "https://img.example/a.gif".to_string(),
                large_text: "Galaxy".to_string(),
            },
            timestamps: ActivityTimestamps { start: 1 },
            buttons: vec![Button::new("Site", "https://site.example")],
        }
    }

    #[test]
    fn test_candidates_cover_ten_slots() {
        let candidates = socket_candidates();
        assert!(candidates.iter().any(|p| p == Path::new("/tmp/discord-ipc-0")));
        assert!(candidates.iter().any(|p| p == Path::new("/tmp/discord-ipc-9")));
    }

    #[tokio::test]
    async fn test_no_socket_is_host_unavailable() {
        let dir = tempdir().unwrap();
        let connector = DiscordConnector::with_candidates(vec![dir.path().join("discord-ipc-0")]);

        let err = connector.connect("123").await.err().unwrap();
        assert!(matches!(err, PresenceError::HostUnavailable));
    }

    #[tokio::test]
    async fn test_handshake_activity_and_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("discord-ipc-0");
        let listener = UnixListener::bind(&path).unwrap();

        let host = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let handshake = read_frame(&mut stream).await.unwrap();
            assert_eq!(handshake.opcode, Opcode::Handshake);
            assert_eq!(handshake.body["client_id"], "123");
            let ready = Frame::new(Opcode::Frame, json!({"cmd": "DISPATCH", "evt": "READY"}));
            write_frame(&mut stream, &ready).await.unwrap();

            let request = read_frame(&mut stream).await.unwrap();
            assert_eq!(request.body["cmd"], "SET_ACTIVITY");
            assert_eq!(request.body["args"]["activity"]["details"], "Observing: M60");
            assert!(request.body["nonce"].is_string());

            let ping = Frame::new(Opcode::Ping, json!({"n": 1}));
            write_frame(&mut stream, &ping).await.unwrap();
            let pong = read_frame(&mut stream).await.unwrap();
            assert_eq!(pong.opcode, Opcode::Pong);
            assert_eq!(pong.body["n"], 1);

            let close = Frame::new(Opcode::Close, json!({"code": 1000, "message": "bye"}));
            write_frame(&mut stream, &close).await.unwrap();
        });

        let connector = DiscordConnector::with_candidates(vec![path]);
        let mut connection = connector.connect("123").await.unwrap();
        connection.link.set_activity(&sample_activity()).await.unwrap();

        let event = connection.events.recv().await.unwrap();
        assert_eq!(event, LinkEvent::Closed("bye".to_string()));
        host.await.unwrap();
    }

    #[tokio::test]
    async fn test_silent_host_times_out_as_login_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("discord-ipc-0");
        let listener = UnixListener::bind(&path).unwrap();

        // Accepts and reads the handshake, then never answers
        let host = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_frame(&mut stream).await.unwrap();
            std::future::pending::<()>().await;
            drop(stream);
        });

        let connector = DiscordConnector::with_candidates(vec![path])
            .with_timeout(Duration::from_millis(200));
        let result = tokio::time::timeout(Duration::from_secs(5), connector.connect("1")).await;

        let err = result.expect("connect must resolve").err().unwrap();
        assert!(matches!(err, PresenceError::Login(ref msg) if msg.contains("READY")));
        assert!(err.is_transient());
        host.abort();
    }

    #[tokio::test]
    async fn test_rejected_handshake_is_login_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("discord-ipc-0");
        let listener = UnixListener::bind(&path).unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_frame(&mut stream).await.unwrap();
            let close = Frame::new(Opcode::Close, json!({"code": 4000, "message": "Invalid Client ID"}));
            write_frame(&mut stream, &close).await.unwrap();
        });

        let connector = DiscordConnector::with_candidates(vec![path]);
        let err = connector.connect("bad").await.err().unwrap();
        assert!(matches!(err, PresenceError::Login(ref msg) if msg == "Invalid Client ID"));
    }
}
