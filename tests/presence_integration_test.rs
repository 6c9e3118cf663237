/*!
 * Integration tests for cosmos-presence
 */

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc;

use cosmos_presence::discovery::DISCOVERY_FILE;
use cosmos_presence::format::{explored_state, fact_labels, format_coordinates, MAX_STATE_LEN};
use cosmos_presence::ipc::{Connection, LinkEvent, PresenceConnector, PresenceLink};
use cosmos_presence::presence::Activity;
use cosmos_presence::watcher::ProcessProbe;
use cosmos_presence::{
    session, DiscoveryTracker, PresenceConfig, Result, SessionDeps, SessionEvent, SettingsStore,
    Status, CATALOG,
};

/// Host that accepts every login and records activities
#[derive(Clone, Default)]
struct RecordingHost {
    activities: Arc<Mutex<Vec<Activity>>>,
    senders: Arc<Mutex<Vec<mpsc::UnboundedSender<LinkEvent>>>>,
}

struct RecordingLink {
    activities: Arc<Mutex<Vec<Activity>>>,
}

#[async_trait]
impl PresenceConnector for RecordingHost {
    async fn connect(&self, _client_id: &str) -> Result<Connection> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);
        Ok(Connection {
            link: Box::new(RecordingLink {
                activities: self.activities.clone(),
            }),
            events: rx,
        })
    }
}

#[async_trait]
impl PresenceLink for RecordingLink {
    async fn set_activity(&mut self, activity: &Activity) -> Result<()> {
        self.activities.lock().unwrap().push(activity.clone());
        Ok(())
    }

    async fn clear_activity(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

struct AlwaysRunning;

#[async_trait]
impl ProcessProbe for AlwaysRunning {
    async fn count(&self, _name: &str) -> Result<usize> {
        Ok(5)
    }
}

#[test]
fn test_catalog_coordinates_render() {
    for object in CATALOG.iter() {
        let formatted = format_coordinates(object.coordinates);
        assert_eq!(formatted.matches('°').count(), 2, "{}", object.name);
        assert!(formatted.starts_with('+'));
    }
}

#[test]
fn test_explored_state_length_guard_over_catalog() {
    let mut rng = StdRng::seed_from_u64(11);
    for object in CATALOG.iter() {
        for _ in 0..20 {
            let state = explored_state(object, 0.0, &mut rng);
            assert!(!state.is_empty());
            if state.chars().count() >= MAX_STATE_LEN && !fact_labels(object).is_empty() {
                // only the two-fact attempt may still be long
                assert!(state.starts_with(object.kind), "{}", state);
            }
        }
    }
}

#[tokio::test]
async fn test_discovery_survives_reload_and_resets_when_full() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(DISCOVERY_FILE);

    let mut tracker = DiscoveryTracker::load(&path).await;
    for object in CATALOG.iter() {
        tracker.record_shown(object.name).await.unwrap();
    }

    let mut reloaded = DiscoveryTracker::load(&path).await;
    assert_eq!(reloaded.len(), CATALOG.len());
    assert!(reloaded.unseen(&CATALOG).is_empty());

    assert!(reloaded.reset_if_full(CATALOG.len()).await.unwrap());
    assert_eq!(DiscoveryTracker::load(&path).await.len(), 0);
}

#[tokio::test]
async fn test_discovery_keeps_current_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(DISCOVERY_FILE);
    std::fs::write(&path, r#"{"currentIndex": 4, "discoveries": ["M60"]}"#).unwrap();

    let mut tracker = DiscoveryTracker::load(&path).await;
    tracker.record_shown("NGC 1300").await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["currentIndex"], 4);
    assert_eq!(raw["discoveries"].as_array().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_session_end_to_end_with_custom_host() {
    let dir = tempdir().unwrap();
    let settings = SettingsStore::new(dir.path());
    settings.write_client_id("987654321").await.unwrap();
    settings
        .write_links("Store", "https://store.example", "Home", "https://home.example")
        .await
        .unwrap();

    let host = RecordingHost::default();
    let config = PresenceConfig {
        data_dir: dir.path().to_path_buf(),
        ..PresenceConfig::default()
    };
    let deps = SessionDeps {
        connector: Arc::new(host.clone()),
        probe: Arc::new(AlwaysRunning),
        settings,
        catalog: &CATALOG,
        rng: StdRng::seed_from_u64(3),
    };

    let (handle, mut events, _task) = session::spawn(config, deps);
    tokio::time::sleep(Duration::from_secs(36)).await;

    let mut observed = Vec::new();
    while let Ok(event) = events.try_recv() {
        observed.push(event);
    }
    assert!(observed.contains(&SessionEvent::Status(Status::Active)));

    let objects: Vec<String> = observed
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Payload(payload) => Some(payload.object.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0], objects[1]);

    let activities = host.activities.lock().unwrap().clone();
    assert_eq!(activities.len(), 2);
    assert!(activities[1].state.starts_with("Explored: "));
    assert_eq!(activities[0].timestamps, activities[1].timestamps);

    handle.shutdown().await.unwrap();
}
