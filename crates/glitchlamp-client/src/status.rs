//! Generation, progress, worker, and log payloads.
//!
//! These endpoints are polled, and their shape has drifted between backend
//! versions, so every field is optional and unknown fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use glitchlamp_core::NodeId;

/// Coarse state of the clip generator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GenerationState {
    /// Nothing queued.
    #[default]
    Idle,
    /// Fetching source media.
    Downloading,
    /// Running the effect chain.
    Processing,
    /// Paused by the user.
    Paused,
    /// Last clip finished.
    Ready,
    /// Last clip failed.
    Error,
    /// A state this client does not know.
    Other(String),
}

impl From<String> for GenerationState {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "" | "idle" => GenerationState::Idle,
            "downloading" | "download" => GenerationState::Downloading,
            "processing" | "generating" | "running" => GenerationState::Processing,
            "paused" => GenerationState::Paused,
            "ready" | "done" | "complete" => GenerationState::Ready,
            "error" | "failed" => GenerationState::Error,
            _ => GenerationState::Other(s),
        }
    }
}

impl From<GenerationState> for String {
    fn from(state: GenerationState) -> Self {
        match state {
            GenerationState::Idle => "idle".into(),
            GenerationState::Downloading => "downloading".into(),
            GenerationState::Processing => "processing".into(),
            GenerationState::Paused => "paused".into(),
            GenerationState::Ready => "ready".into(),
            GenerationState::Error => "error".into(),
            GenerationState::Other(s) => s,
        }
    }
}

impl GenerationState {
    /// Whether a clip is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, GenerationState::Downloading | GenerationState::Processing)
    }
}

/// `GET /generation/status`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationStatus {
    /// Generator state.
    #[serde(alias = "status")]
    pub state: GenerationState,
    /// Whether generation is paused.
    pub paused: bool,
    /// Human-readable stage name.
    pub stage: Option<String>,
    /// Node currently being processed.
    pub current_node: Option<NodeId>,
    /// Nodes already processed for the current clip.
    #[serde(alias = "completed_nodes")]
    pub processed_nodes: Vec<NodeId>,
    /// Clips waiting in the queue.
    pub queue_length: u32,
    /// Last message from the generator.
    pub message: Option<String>,
}

/// `GET /progress` and `GET /preview/progress`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// Stage name (`download`, `processing`, ...).
    pub stage: String,
    /// Completion in percent, 0–100.
    #[serde(alias = "progress")]
    pub percent: f32,
    /// Detail line.
    pub message: Option<String>,
    /// Node currently being processed.
    pub current_node: Option<NodeId>,
}

impl Progress {
    /// Completion as a 0–1 fraction.
    pub fn fraction(&self) -> f32 {
        if self.percent.is_finite() {
            (self.percent / 100.0).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// One entry of `GET /workers`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerInfo {
    /// Worker id.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Worker state.
    #[serde(alias = "state")]
    pub status: String,
    /// Task description.
    pub task: Option<String>,
    /// Task completion in percent.
    pub progress: Option<f32>,
}

/// One backend log line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    /// Timestamp as sent by the backend.
    #[serde(alias = "time")]
    pub timestamp: Option<String>,
    /// Log level.
    pub level: Option<String>,
    /// Message text.
    #[serde(alias = "msg")]
    pub message: String,
}

impl LogEntry {
    /// Log line with only a message.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            ..Self::default()
        }
    }
}

/// Parses `GET /logs`: either an array of strings or of objects, optionally
/// wrapped as `{"logs": [...]}`.
pub fn parse_logs(value: Value) -> Vec<LogEntry> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("logs").or_else(|| map.remove("lines")) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(LogEntry::message(s)),
            other => serde_json::from_value(other).ok(),
        })
        .collect()
}

/// Parses `GET /workers`: a bare array or `{"workers": [...]}`.
pub fn parse_workers(value: Value) -> Vec<WorkerInfo> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("workers") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
