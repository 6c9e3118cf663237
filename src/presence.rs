/*!
 * Values the session publishes: status codes, UI payloads and host activities
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::catalog::AstronomicalObject;

const SKY_MAP_BASE: &str = "https://www.sky-map.org/";

/// Label of the sky viewer button
pub const SPACE_OBJECT_LABEL: &str = "Space Object";

/// Status codes reported to the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "DISABLED")]
    Disabled,
    #[serde(rename = "SEARCHING DISCORD")]
    SearchingDiscord,
    #[serde(rename = "CONNECTING RPC")]
    ConnectingRpc,
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "RESTARTING")]
    Restarting,
    #[serde(rename = "DISCONNECTED")]
    Disconnected,
    #[serde(rename = "NO_CLIENT_ID")]
    NoClientId,
}

impl Status {
    pub fn code(&self) -> &'static str {
        match self {
            Status::Disabled => "DISABLED",
            Status::SearchingDiscord => "SEARCHING DISCORD",
            Status::ConnectingRpc => "CONNECTING RPC",
            Status::Active => "ACTIVE",
            Status::Restarting => "RESTARTING",
            Status::Disconnected => "DISCONNECTED",
            Status::NoClientId => "NO_CLIENT_ID",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Link button shown under the activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub url: String,
}

impl Button {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Sky viewer link centred on the object, `None` for unnamed objects
pub fn sky_map_url(object: &AstronomicalObject) -> Option<String> {
    if object.name.trim().is_empty() {
        return None;
    }
    let zoom = object.zoom.to_string();
    let url = Url::parse_with_params(
        SKY_MAP_BASE,
        &[
            ("img_source", object.type_photo),
            ("object", object.name),
            ("zoom", zoom.as_str()),
        ],
    )
    .ok()?;
    Some(url.into())
}

/// Projection of the current activity for the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub details: String,
    pub state: String,
    pub coordinates: String,
    pub buttons: Vec<Button>,
    /// Name of the catalog object
    pub object: String,
    /// Object description
    pub extra: String,
}

/// Image assets of an activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityAssets {
    pub large_image: String,
    pub large_text: String,
}

/// Elapsed-time anchor, Unix milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTimestamps {
    pub start: i64,
}

/// Activity body of a host `SET_ACTIVITY` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub details: String,
    pub state: String,
    pub assets: ActivityAssets,
    pub timestamps: ActivityTimestamps,
    pub buttons: Vec<Button>,
}

/// Everything the session emits to its observer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Status(Status),
    Payload(PresencePayload),
}
