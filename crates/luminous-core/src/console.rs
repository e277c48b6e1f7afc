//! Scrolling console: ring buffer of the most recent entries, broadcast to
//! live subscribers (SSE), and optionally mirrored to Firebase.

use crate::firebase::FirebaseLogSink;
use crate::shared::{LogEntry, LogKind};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// Entries kept for late joiners; older lines scroll off.
pub const CONSOLE_CAPACITY: usize = 100;

const BROADCAST_CAPACITY: usize = 256;

struct ConsoleInner {
    entries: Mutex<VecDeque<LogEntry>>,
    tx: broadcast::Sender<LogEntry>,
    firebase: Option<FirebaseLogSink>,
}

/// Shared handle to the console. Clones point at the same ring.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self::with_firebase(None)
    }

    /// Console with an optional Firebase mirror. Every pushed entry is also
    /// POSTed to the Realtime Database, fire-and-forget.
    pub fn with_firebase(firebase: Option<FirebaseLogSink>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(ConsoleInner {
                entries: Mutex::new(VecDeque::with_capacity(CONSOLE_CAPACITY)),
                tx,
                firebase,
            }),
        }
    }

    /// Appends a line, broadcasts it, and mirrors it when Firebase is
    /// configured. Returns the entry for callers that want the id.
    pub fn push(&self, source: &str, message: impl Into<String>, kind: LogKind) -> LogEntry {
        let entry = LogEntry::new(source, message, kind);
        {
            let mut entries = self
                .inner
                .entries
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if entries.len() == CONSOLE_CAPACITY {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }
        let _ = self.inner.tx.send(entry.clone());

        if let Some(sink) = &self.inner.firebase {
            let sink = sink.clone();
            let mirrored = entry.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.push(&mirrored).await {
                    debug!(target: "luminous::console", "firebase mirror failed: {}", e);
                }
            });
        }
        entry
    }

    /// Current ring contents, oldest first.
    pub fn recent(&self) -> Vec<LogEntry> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Live feed of entries pushed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.inner.tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
