//! Realtime database streaming events
//!
//! A streaming GET delivers server-sent events named `put`, `patch`,
//! `keep-alive`, `cancel` and `auth_revoked`. `put` and `patch` carry
//! `{"path": "/rel/path", "data": ...}` relative to the subscribed location.
//! SSE framing is handled by `eventsource-stream`; this module interprets the
//! events and keeps a local mirror of the subscribed path.

use serde::Deserialize;
use serde_json::{Map, Value};
use shared::Snapshot;
use shared::snapshot::snapshot_from_value;

use super::{segments, tree};
use crate::{ClientError, ClientResult};

/// One interpreted stream event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    /// Replace the node at `path`
    Put { path: String, data: Value },
    /// Replace each listed child of `path`
    Patch {
        path: String,
        data: Map<String, Value>,
    },
    KeepAlive,
    /// The server dropped the listener (access rules changed)
    Cancel,
    /// The id token expired or was revoked
    AuthRevoked,
}

impl StreamUpdate {
    /// Ends the stream with a permission error
    pub fn is_revocation(&self) -> bool {
        matches!(self, Self::Cancel | Self::AuthRevoked)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    path: String,
    #[serde(default)]
    data: Value,
}

/// Interpret one SSE event by name and data payload
pub fn parse_event(event: &str, data: &str) -> ClientResult<StreamUpdate> {
    match event {
        "put" => {
            let envelope: Envelope = serde_json::from_str(data)?;
            Ok(StreamUpdate::Put {
                path: envelope.path,
                data: envelope.data,
            })
        }
        "patch" => {
            let envelope: Envelope = serde_json::from_str(data)?;
            match envelope.data {
                Value::Object(children) => Ok(StreamUpdate::Patch {
                    path: envelope.path,
                    data: children,
                }),
                other => Err(ClientError::InvalidResponse(format!(
                    "patch data must be an object, got {other}"
                ))),
            }
        }
        "keep-alive" => Ok(StreamUpdate::KeepAlive),
        "cancel" => Ok(StreamUpdate::Cancel),
        "auth_revoked" => Ok(StreamUpdate::AuthRevoked),
        other => Err(ClientError::InvalidResponse(format!(
            "unknown stream event: {other}"
        ))),
    }
}

/// Local copy of one subscribed path, fed by stream updates
#[derive(Debug, Default)]
pub struct StreamMirror {
    root: Value,
    primed: bool,
}

impl StreamMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `put` or `patch`; returns `true` when the mirror changed in a
    /// way subscribers should see
    pub fn apply(&mut self, update: StreamUpdate) -> bool {
        match update {
            StreamUpdate::Put { path, data } => {
                tree::set(&mut self.root, &segments(&path), data);
                self.primed = true;
                true
            }
            StreamUpdate::Patch { path, data } => {
                tree::merge(&mut self.root, &segments(&path), data);
                self.primed
            }
            StreamUpdate::KeepAlive | StreamUpdate::Cancel | StreamUpdate::AuthRevoked => false,
        }
    }

    /// Has the initial `put` arrived
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Forget everything (before a reconnect, which re-sends the full value)
    pub fn reset(&mut self) {
        self.root = Value::Null;
        self.primed = false;
    }

    pub fn snapshot(&self) -> Snapshot {
        snapshot_from_value(self.root.clone())
    }
}
