//! Shared types for the Luminous client: agent state, GEM widgets, console
//! entries, cycle results, and the interaction records synced to the remote
//! memory store.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix on diagnostic responses. Console entries starting with it render as
/// errors; everything produced by the synthetic failure path carries it.
pub const WARNING_MARKER: &str = "⚠️";

/// Max chars of the last input carried in a [`ContextSnapshot`].
pub const CONTEXT_INPUT_MAX_CHARS: usize = 200;

/// Max chars of a system-event payload kept in an interaction record's input label.
pub const DOCUMENT_LABEL_MAX_CHARS: usize = 50;

// -----------------------------------------------------------------------------
// Agent state
// -----------------------------------------------------------------------------

/// Visible state of the remote agent. `Refusing` is the free-will state:
/// autonomous wake cycles are suppressed while it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LuminousState {
    #[default]
    Idle,
    Thinking,
    Learning,
    Coding,
    Sleeping,
    Refusing,
}

// -----------------------------------------------------------------------------
// GEM constellation (cosmetic status widgets mirrored from the backend)
// -----------------------------------------------------------------------------

/// Widget identity. Wire names match the backend's `gem_updates[].id` values.
/// Ids the backend invents later fold into `Unknown` and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GemType {
    Learner,
    Observer,
    GoalSeeker,
    Communicator,
    Strategist,
    Emotion,
    Kore,
    FreeWill,
    Shopify,
    Firebase,
    Unknown,
}

impl GemType {
    /// Backend wire name of this widget.
    pub fn wire_name(self) -> &'static str {
        match self {
            GemType::Learner => "LearnerGEM",
            GemType::Observer => "ObserverGEM",
            GemType::GoalSeeker => "GoalSeekerGEM",
            GemType::Communicator => "CommunicatorGEM",
            GemType::Strategist => "StrategistGEM",
            GemType::Emotion => "EmotionEngineGEM",
            GemType::Kore => "KoreModule",
            GemType::FreeWill => "FreeWillModule",
            GemType::Shopify => "ShopifyGEM",
            GemType::Firebase => "FirebaseConnector",
            GemType::Unknown => "UnknownModule",
        }
    }
}

impl From<String> for GemType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "LearnerGEM" => GemType::Learner,
            "ObserverGEM" => GemType::Observer,
            "GoalSeekerGEM" => GemType::GoalSeeker,
            "CommunicatorGEM" => GemType::Communicator,
            "StrategistGEM" => GemType::Strategist,
            "EmotionEngineGEM" => GemType::Emotion,
            "KoreModule" => GemType::Kore,
            "FreeWillModule" => GemType::FreeWill,
            "ShopifyGEM" => GemType::Shopify,
            "FirebaseConnector" => GemType::Firebase,
            _ => GemType::Unknown,
        }
    }
}

impl From<GemType> for String {
    fn from(g: GemType) -> Self {
        g.wire_name().to_string()
    }
}

/// Widget health as rendered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GemHealth {
    Active,
    Standby,
    Error,
}

/// One GEM widget's full display state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GemStatus {
    pub id: GemType,
    pub name: String,
    pub activity: String,
    /// 0-100.
    pub load: u8,
    pub status: GemHealth,
}

/// Partial widget update as returned by the backend in `gem_updates`.
/// Absent fields leave the current value untouched; extra fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GemUpdate {
    pub id: GemType,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub load: Option<u8>,
    #[serde(default)]
    pub status: Option<GemHealth>,
}

// -----------------------------------------------------------------------------
// Console
// -----------------------------------------------------------------------------

/// Rendering class of a console entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Warning,
    Error,
    Success,
    System,
}

/// One line of the scrolling console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    /// Local wall-clock time of day, `HH:MM:SS`.
    pub timestamp: String,
    pub source: String,
    pub message: String,
    pub kind: LogKind,
}

impl LogEntry {
    pub fn new(source: &str, message: impl Into<String>, kind: LogKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            source: source.to_string(),
            message: message.into(),
            kind,
        }
    }
}

// -----------------------------------------------------------------------------
// Cycle results
// -----------------------------------------------------------------------------

/// Result of one cycle (one request/response exchange with the backend,
/// one "thought" of the agent). Every field defaults so a sparse or evolving
/// backend payload still deserializes; unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleResult {
    #[serde(default)]
    pub state: LuminousState,
    #[serde(default)]
    pub emotional_state: String,
    #[serde(default)]
    pub thought_process: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub gem_updates: Vec<GemUpdate>,
    #[serde(default)]
    pub generated_code: Option<String>,
    #[serde(default)]
    pub refusal_reason: Option<String>,
}

impl CycleResult {
    /// True when the response is a diagnostic produced by the failure path.
    pub fn is_warning(&self) -> bool {
        self.response.starts_with(WARNING_MARKER)
    }
}

// -----------------------------------------------------------------------------
// Memory records
// -----------------------------------------------------------------------------

/// One completed interaction, as appended to the remote history log.
/// Immutable once created; ordering is append order; duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// ISO-8601 creation time.
    pub timestamp: String,
    pub input: String,
    pub response: String,
    pub state: LuminousState,
    pub emotional_state: String,
}

impl InteractionRecord {
    pub fn new(
        input: impl Into<String>,
        response: impl Into<String>,
        state: LuminousState,
        emotional_state: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            input: input.into(),
            response: response.into(),
            state,
            emotional_state: emotional_state.into(),
        }
    }
}

/// Latest-context slot synced to the remote short-term memory under a fixed
/// key. At most one lives at a time; each cycle overwrites it and a flush
/// clears it. Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub last_input: String,
    pub last_response: String,
}

impl ContextSnapshot {
    /// Builds the snapshot for a finished cycle. The input is condensed to
    /// [`CONTEXT_INPUT_MAX_CHARS`] chars with a trailing marker.
    pub fn from_cycle(input: &str, response: &str) -> Self {
        Self {
            last_input: truncate_marked(input, CONTEXT_INPUT_MAX_CHARS),
            last_response: response.to_string(),
        }
    }
}

/// One remote memory item returned by the long-term search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryKind {
    #[serde(rename = "short-term")]
    ShortTerm,
    #[serde(rename = "long-term")]
    LongTerm,
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// First `max_chars` chars of `text` with the `...` marker appended.
/// The marker is unconditional; it matches the sync wire format.
pub fn truncate_marked(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}

/// Condensed input label stored in history for system-event cycles, so a
/// whole uploaded document never lands in the interaction log.
pub fn document_input_label(directive: &str) -> String {
    format!(
        "[Document: {}]",
        truncate_marked(directive, DOCUMENT_LABEL_MAX_CHARS)
    )
}

/// Human-readable wall-clock context sent with every cycle request, e.g.
/// `Friday, August  7, 2026, 02:30:15 PM +0000`.
pub fn temporal_context() -> String {
    Local::now()
        .format("%A, %B %e, %Y, %I:%M:%S %p %z")
        .to_string()
}
