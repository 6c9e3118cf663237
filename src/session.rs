//! Presence session
//!
//! A single task owns the whole presence lifecycle: host discovery through the
//! process watcher, opening the channel, the timed activity rotation and
//! recovery after disconnects. Collaborators drive it through a
//! [`SessionHandle`] and observe it through the [`SessionEvent`] stream.
//!
//! Slow work (process queries, connecting) runs in spawned tasks whose results
//! come back tagged with the epoch they were started in; anything from before
//! the last stop is discarded.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::catalog::{AstronomicalObject, CATALOG};
use crate::config::PresenceConfig;
use crate::discovery::{DiscoveryTracker, DISCOVERY_FILE};
use crate::error::{PresenceError, Result};
use crate::format::{explored_state, format_coordinates};
use crate::ipc::{Connection, DiscordConnector, LinkEvent, PresenceConnector, PresenceLink};
use crate::presence::{
    sky_map_url, Activity, ActivityAssets, ActivityTimestamps, Button, PresencePayload,
    SessionEvent, Status, SPACE_OBJECT_LABEL,
};
use crate::settings::{ResolvedCredentials, SettingsStore};
use crate::timers::{TimerKind, Timers};
use crate::watcher::{decide, ProbePhase, ProcessProbe, SysinfoProbe, WatchAction, WatchState};

/// Lifecycle state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingCredentials,
    Connecting,
    Active,
    Disconnected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "IDLE"),
            SessionState::AwaitingCredentials => write!(f, "AWAITING_CREDENTIALS"),
            SessionState::Connecting => write!(f, "CONNECTING"),
            SessionState::Active => write!(f, "ACTIVE"),
            SessionState::Disconnected => write!(f, "DISCONNECTED"),
        }
    }
}

/// Point-in-time view of the session
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub watch: WatchState,
    pub timers: Vec<TimerKind>,
    pub connected: bool,
    pub in_flight: Option<&'static str>,
    pub discoveries: usize,
}

/// Everything the session talks to
pub struct SessionDeps {
    pub connector: Arc<dyn PresenceConnector>,
    pub probe: Arc<dyn ProcessProbe>,
    pub settings: SettingsStore,
    pub catalog: &'static [AstronomicalObject],
    pub rng: StdRng,
}

impl SessionDeps {
    /// Real Discord connector, sysinfo probe and the built-in catalog
    pub fn new(config: &PresenceConfig) -> Self {
        Self {
            connector: Arc::new(
                DiscordConnector::new().with_timeout(config.connect_timeout()),
            ),
            probe: Arc::new(SysinfoProbe::new()),
            settings: SettingsStore::new(&config.data_dir),
            catalog: &CATALOG,
            rng: StdRng::from_os_rng(),
        }
    }
}

enum Command {
    Restart,
    SetClientId(String, oneshot::Sender<Result<()>>),
    SetLinks([String; 4], oneshot::Sender<Result<()>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

enum Internal {
    Probe {
        epoch: u64,
        phase: ProbePhase,
        result: Result<usize>,
    },
    Connected {
        attempt: u64,
        result: Result<Connection>,
    },
}

/// Cloneable control handle
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    /// Stop everything, report RESTARTING and start over
    pub fn restart(&self) -> Result<()> {
        self.commands
            .send(Command::Restart)
            .map_err(|_| PresenceError::SessionClosed)
    }

    pub async fn set_client_id(&self, client_id: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::SetClientId(client_id.to_string(), tx))?;
        rx.await.map_err(|_| PresenceError::SessionClosed)?
    }

    pub async fn set_links(
        &self,
        steam_label: &str,
        steam_url: &str,
        site_label: &str,
        site_url: &str,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let links = [steam_label, steam_url, site_label, site_url].map(str::to_string);
        self.send(Command::SetLinks(links, tx))?;
        rx.await.map_err(|_| PresenceError::SessionClosed)?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| PresenceError::SessionClosed)
    }

    /// Stop the session and wait for its task to wind down
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx))?;
        rx.await.map_err(|_| PresenceError::SessionClosed)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PresenceError::SessionClosed)
    }
}

/// Object of the running activity cycle, held until its explored announce
struct InFlight {
    object: &'static AstronomicalObject,
    coordinates: String,
    buttons: Vec<Button>,
}

/// Spawn the session task. It reports DISABLED, then starts discovery.
pub fn spawn(
    config: PresenceConfig,
    deps: SessionDeps,
) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (internal_tx, internal_rx) = mpsc::unbounded_channel();

    let session = PresenceSession {
        tracker_path: config.data_dir.join(DISCOVERY_FILE),
        config,
        deps,
        events: event_tx,
        commands: command_rx,
        internal_tx,
        internal_rx,
        state: SessionState::Idle,
        watch: WatchState::Searching,
        timers: Timers::new(),
        epoch: 0,
        attempt: 0,
        credentials: None,
        link: None,
        link_events: None,
        tracker: None,
        in_flight: None,
        toggle: false,
        started_at: 0,
    };

    let span = info_span!("session", process = %session.config.process_name);
    let task = tokio::spawn(session.run().instrument(span));
    (
        SessionHandle {
            commands: command_tx,
        },
        event_rx,
        task,
    )
}

struct PresenceSession {
    config: PresenceConfig,
    deps: SessionDeps,
    tracker_path: std::path::PathBuf,

    events: mpsc::UnboundedSender<SessionEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,

    state: SessionState,
    watch: WatchState,
    timers: Timers,
    /// Bumped on stop; tags probe results
    epoch: u64,
    /// Bumped on every connect attempt and on stop; tags connect results
    attempt: u64,

    credentials: Option<ResolvedCredentials>,
    link: Option<Box<dyn PresenceLink>>,
    link_events: Option<mpsc::UnboundedReceiver<LinkEvent>>,
    tracker: Option<DiscoveryTracker>,
    in_flight: Option<InFlight>,
    /// Alternates the external link button; survives restarts
    toggle: bool,
    /// Elapsed-time anchor of the current selection, Unix millis
    started_at: i64,
}

impl PresenceSession {
    async fn run(mut self) {
        self.emit_status(Status::Disabled);
        self.start();

        loop {
            let deadline = self.timers.next_deadline();

            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        self.stop();
                        break;
                    };
                    if !self.handle_command(command).await {
                        break;
                    }
                }
                Some(message) = self.internal_rx.recv() => {
                    self.handle_internal(message).await;
                }
                event = next_link_event(&mut self.link_events) => {
                    self.handle_link_event(event);
                }
                _ = sleep_until(deadline) => {
                    let now = Instant::now();
                    while let Some(kind) = self.timers.pop_due(now) {
                        self.fire(kind).await;
                    }
                }
            }
        }

        debug!("Presence session task finished");
    }

    /// Returns false when the loop should exit
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Restart => {
                info!("🔄 Restarting presence session");
                self.emit_status(Status::Restarting);
                self.stop();
                self.start();
            }
            Command::SetClientId(client_id, reply) => {
                let _ = reply.send(self.deps.settings.write_client_id(&client_id).await);
            }
            Command::SetLinks([steam_label, steam_url, site_label, site_url], reply) => {
                let result = self
                    .deps
                    .settings
                    .write_links(&steam_label, &steam_url, &site_label, &site_url)
                    .await;
                let _ = reply.send(result);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown(reply) => {
                self.stop();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            watch: self.watch,
            timers: self.timers.scheduled(),
            connected: self.link.is_some(),
            in_flight: self.in_flight.as_ref().map(|flight| flight.object.name),
            discoveries: self.tracker.as_ref().map_or(0, DiscoveryTracker::len),
        }
    }

    fn start(&mut self) {
        self.discover();
    }

    /// Idempotent: cancels every timer and releases the link
    fn stop(&mut self) {
        self.timers.cancel_all();
        self.epoch += 1;
        self.attempt += 1;
        self.teardown_link();
        self.in_flight = None;
        self.credentials = None;
        self.state = SessionState::Idle;
        self.watch = WatchState::Searching;
    }

    async fn fire(&mut self, kind: TimerKind) {
        debug!("Timer fired: {}", kind);
        match kind {
            TimerKind::Rediscover => self.discover(),
            TimerKind::SessionStart => self.start_session().await,
            TimerKind::LivenessCheck => self.spawn_probe(ProbePhase::Liveness),
            TimerKind::ActivityRepeat => self.activity_cycle().await,
            TimerKind::Explored => self.explored().await,
        }
    }

    fn discover(&mut self) {
        self.spawn_probe(ProbePhase::Initial);
    }

    fn spawn_probe(&self, phase: ProbePhase) {
        let probe = self.deps.probe.clone();
        let name = self.config.process_name.clone();
        let tx = self.internal_tx.clone();
        let epoch = self.epoch;

        tokio::spawn(async move {
            let result = probe.count(&name).await;
            let _ = tx.send(Internal::Probe {
                epoch,
                phase,
                result,
            });
        });
    }

    async fn handle_internal(&mut self, message: Internal) {
        match message {
            Internal::Probe {
                epoch,
                phase,
                result,
            } => {
                if epoch != self.epoch {
                    debug!("Discarding stale {:?} probe result", phase);
                    return;
                }
                self.handle_probe(phase, result);
            }
            Internal::Connected { attempt, result } => {
                if attempt != self.attempt {
                    if let Ok(connection) = result {
                        debug!("Closing connection from a superseded attempt");
                        release(connection.link);
                    }
                    return;
                }
                match result {
                    Ok(connection) => self.on_ready(connection).await,
                    Err(e) if e.is_transient() => {
                        warn!("Presence login failed ({}): {}", e.category(), e);
                        self.on_disconnect();
                    }
                    Err(e) => {
                        error!("Presence login failed ({}): {}", e.category(), e);
                        self.on_disconnect();
                    }
                }
            }
        }
    }

    fn handle_probe(&mut self, phase: ProbePhase, result: Result<usize>) {
        match decide(phase, &result) {
            WatchAction::Halt => {
                if let Err(e) = &result {
                    error!("❌ Process lookup failed: {}", e);
                }
                self.emit_status(Status::Disconnected);
            }
            WatchAction::Retry => {
                debug!("{} not running", self.config.process_name);
                self.watch = WatchState::Searching;
                self.emit_status(Status::SearchingDiscord);
                self.timers
                    .schedule_once(TimerKind::Rediscover, self.config.search_retry());
            }
            WatchAction::StartSession => {
                info!(
                    "🔭 Found {}, opening the presence channel in {}s",
                    self.config.process_name, self.config.startup_grace_secs
                );
                self.watch = WatchState::Found;
                self.timers.cancel(TimerKind::Rediscover);
                self.timers
                    .schedule_once(TimerKind::SessionStart, self.config.startup_grace());
                self.timers
                    .schedule_every(TimerKind::LivenessCheck, self.config.liveness_interval());
            }
            WatchAction::StillAlive => {
                self.emit_status(Status::ConnectingRpc);
            }
            WatchAction::Lost => {
                info!("{} is gone, searching again", self.config.process_name);
                self.watch = WatchState::Searching;
                self.emit_status(Status::SearchingDiscord);
                self.timers.cancel(TimerKind::LivenessCheck);
                self.discover();
            }
            WatchAction::Inconclusive => {
                if let Err(e) = &result {
                    warn!("Liveness check failed, keeping current status: {}", e);
                }
            }
        }
    }

    async fn start_session(&mut self) {
        self.watch = WatchState::SessionActive;

        let credentials = self.deps.settings.read_credentials().await;
        let Some(resolved) = credentials.resolve() else {
            warn!(
                "Presence settings incomplete, missing: {}",
                credentials.missing_fields().join(", ")
            );
            self.state = SessionState::AwaitingCredentials;
            self.timers.cancel(TimerKind::LivenessCheck);
            self.emit_status(Status::NoClientId);
            return;
        };

        self.tracker = Some(DiscoveryTracker::load(&self.tracker_path).await);
        self.teardown_link();
        self.timers.cancel(TimerKind::ActivityRepeat);
        self.timers.cancel(TimerKind::Explored);

        self.state = SessionState::Connecting;
        self.emit_status(Status::ConnectingRpc);

        self.attempt += 1;
        let attempt = self.attempt;
        let connector = self.deps.connector.clone();
        let tx = self.internal_tx.clone();
        let client_id = resolved.client_id.clone();
        self.credentials = Some(resolved);

        tokio::spawn(async move {
            let result = connector.connect(&client_id).await;
            let _ = tx.send(Internal::Connected { attempt, result });
        });
    }

    async fn on_ready(&mut self, connection: Connection) {
        info!("🛰️  Presence channel ready");
        self.link = Some(connection.link);
        self.link_events = Some(connection.events);
        self.state = SessionState::Active;

        self.activity_cycle().await;
        // A failed first write already tore the link down
        if self.link.is_some() {
            self.timers
                .schedule_every(TimerKind::ActivityRepeat, self.config.activity_interval());
        }
    }

    fn handle_link_event(&mut self, event: Option<LinkEvent>) {
        match event {
            Some(LinkEvent::Closed(reason)) => warn!("Presence channel closed: {}", reason),
            Some(LinkEvent::Error(message)) => warn!("Presence channel error: {}", message),
            None => warn!("Presence channel event stream ended"),
        }
        self.on_disconnect();
    }

    fn on_disconnect(&mut self) {
        self.state = SessionState::Disconnected;
        self.emit_status(Status::Disconnected);
        self.timers.cancel(TimerKind::ActivityRepeat);
        self.timers.cancel(TimerKind::Explored);
        self.teardown_link();
        self.timers
            .schedule_once(TimerKind::Rediscover, self.config.reconnect_delay());
    }

    /// Fire-and-forget clear and close of the current link
    fn teardown_link(&mut self) {
        self.link_events = None;
        if let Some(link) = self.link.take() {
            release(link);
        }
    }

    async fn activity_cycle(&mut self) {
        if self.link.is_none() {
            debug!("Activity cycle skipped, no open link");
            return;
        }
        let Some(credentials) = self.credentials.clone() else {
            return;
        };

        let object = match self.in_flight.as_ref().map(|flight| flight.object) {
            Some(object) => object,
            None => match self.select_object().await {
                Some(object) => object,
                None => {
                    warn!("Catalog is empty, nothing to announce");
                    return;
                }
            },
        };

        let coordinates = format!("Coordinates: {}", format_coordinates(object.coordinates));

        let mut buttons = Vec::with_capacity(2);
        if let Some(url) = sky_map_url(object) {
            buttons.push(Button::new(SPACE_OBJECT_LABEL, url));
        }
        self.toggle = !self.toggle;
        if self.toggle {
            buttons.push(Button::new(credentials.steam_label, credentials.steam_url));
        } else {
            buttons.push(Button::new(credentials.site_label, credentials.site_url));
        }

        // Held before publishing so a failed write keeps the selection
        self.in_flight = Some(InFlight {
            object,
            coordinates: coordinates.clone(),
            buttons: buttons.clone(),
        });

        info!("🔭 Observing {}", object.name);
        let activity = self.activity(object, coordinates.clone(), buttons.clone());
        if !self.publish(&activity).await {
            return;
        }

        self.emit_status(Status::Active);
        self.emit(SessionEvent::Payload(PresencePayload {
            details: activity.details,
            state: coordinates.clone(),
            coordinates,
            buttons,
            object: object.name.to_string(),
            extra: object.description.to_string(),
        }));

        self.timers
            .schedule_once(TimerKind::Explored, self.config.explored_delay());
    }

    /// Uniform pick among unseen objects; resets the tracker when every object was shown
    async fn select_object(&mut self) -> Option<&'static AstronomicalObject> {
        let catalog = self.deps.catalog;
        if self.tracker.is_none() {
            self.tracker = Some(DiscoveryTracker::load(&self.tracker_path).await);
        }
        let tracker = self.tracker.as_mut()?;

        if let Err(e) = tracker.reset_if_full(catalog.len()).await {
            warn!("Failed to persist discovery reset: {}", e);
        }

        let unseen = tracker.unseen(catalog);
        let object = match unseen.choose(&mut self.deps.rng) {
            Some(object) => *object,
            // Only reachable when the stored set names objects outside the catalog
            None => {
                if let Err(e) = tracker.clear().await {
                    warn!("Failed to persist discovery reset: {}", e);
                }
                catalog.choose(&mut self.deps.rng)?
            }
        };

        self.started_at = chrono::Utc::now().timestamp_millis();
        Some(object)
    }

    async fn explored(&mut self) {
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        let object = flight.object;

        if let Some(tracker) = self.tracker.as_mut() {
            if let Err(e) = tracker.record_shown(object.name).await {
                error!("Failed to persist discovery of {}: {}", object.name, e);
            }
        }

        let state = format!(
            "Explored: {}",
            explored_state(
                object,
                self.config.description_probability,
                &mut self.deps.rng
            )
        );

        let activity = self.activity(object, state.clone(), flight.buttons.clone());
        if !self.publish(&activity).await {
            return;
        }

        self.emit(SessionEvent::Payload(PresencePayload {
            details: activity.details,
            state,
            coordinates: flight.coordinates,
            buttons: flight.buttons,
            object: object.name.to_string(),
            extra: object.description.to_string(),
        }));
    }

    fn activity(&self, object: &AstronomicalObject, state: String, buttons: Vec<Button>) -> Activity {
        Activity {
            details: format!("Observing: {}", object.name),
            state,
            assets: ActivityAssets {
                large_image: self.config.large_image_url.clone(),
                large_text: object.description.to_string(),
            },
            timestamps: ActivityTimestamps {
                start: self.started_at,
            },
            buttons,
        }
    }

    /// Send to the host; a failed write counts as a lost channel
    async fn publish(&mut self, activity: &Activity) -> bool {
        let Some(link) = self.link.as_mut() else {
            return false;
        };
        match link.set_activity(activity).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Activity update failed: {}", e);
                self.on_disconnect();
                false
            }
        }
    }

    fn emit_status(&self, status: Status) {
        debug!("Status: {}", status);
        self.emit(SessionEvent::Status(status));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// Clear and close a link in the background; failures are only logged
fn release(mut link: Box<dyn PresenceLink>) {
    tokio::spawn(async move {
        if let Err(e) = link.clear_activity().await {
            debug!("Clearing activity on teardown failed: {}", e);
        }
        if let Err(e) = link.close().await {
            debug!("Closing link on teardown failed: {}", e);
        }
    });
}

async fn next_link_event(
    events: &mut Option<mpsc::UnboundedReceiver<LinkEvent>>,
) -> Option<LinkEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
