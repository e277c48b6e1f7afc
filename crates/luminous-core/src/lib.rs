//! luminous-core: client core for the Luminous Synergy Skipper shell
//! (shared types, brain client, interaction buffer, and sync scheduler).
//!
//! All intelligence lives in the remote backend; this crate relays cycle
//! requests, tracks the visible agent state, and batches interaction records
//! to the remote memory store.

mod buffer;
mod client;
mod config;
mod console;
mod endpoint;
mod engine;
mod firebase;
mod gems;
mod ingest;
mod scheduler;
mod shared;

// Shared types (agent state, gems, console, memory records)
pub use shared::{
    document_input_label, temporal_context, truncate_marked, ContextSnapshot, CycleResult,
    GemHealth, GemStatus, GemType, GemUpdate, InteractionRecord, LogEntry, LogKind,
    LuminousState, MemoryItem, MemoryKind, CONTEXT_INPUT_MAX_CHARS, DOCUMENT_LABEL_MAX_CHARS,
    WARNING_MARKER,
};

// Configuration (settings panel + gateway runtime)
pub use config::{
    ConfigError, FirebaseConfig, GatewayConfig, LuminousConfig, ShopifyConfig,
};

// Backend endpoint resolution
pub use endpoint::{
    resolve_backend_url, DEFAULT_PLAIN_BACKEND, INSECURE_BACKEND_HOST, SECURE_PROXY_PATH,
};

// Brain client (cycle + memory endpoints)
pub use client::{BrainClient, BrainError, MemorySink, CONTEXT_MEMORY_KEY};

// Interaction buffer & periodic sync (CORE)
pub use buffer::{InteractionBuffer, SyncEngine};

// Interaction engine (cycle application, in-flight guard, wake policy)
pub use engine::{
    EngineError, InteractionEngine, HEART_RATE_ACTIVE, HEART_RATE_BASELINE,
    HEART_RATE_REFUSING, HEART_RATE_SLEEPING, WAKE_DIRECTIVE,
};

// GEM constellation
pub use gems::{GemRegistry, DISPLAY_ORDER};

// Console + Firebase mirror
pub use console::{Console, CONSOLE_CAPACITY};
pub use firebase::FirebaseLogSink;

// Document ingestion
pub use ingest::{build_document_directive, validate_document, IngestError, TEXT_EXTENSIONS};

// Background loops
pub use scheduler::{start_background_loops, ClockState, ScheduleConfig, Scheduler};
