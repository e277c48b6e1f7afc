//! Interaction buffer and periodic sync.
//!
//! Decouples the interactive request path from the remote memory store: cycle
//! results are appended in memory and drained to the backend on a fixed
//! timer. A failed flush drops the captured batch and the next tick starts
//! clean: no retry, no backoff, each tick independent.

use crate::client::MemorySink;
use crate::console::Console;
use crate::shared::{ContextSnapshot, InteractionRecord, LogKind};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Default)]
struct BufferInner {
    pending: Vec<InteractionRecord>,
    context: Option<ContextSnapshot>,
}

/// In-memory store of not-yet-synced interaction records plus the single
/// latest-context slot. Producers append; only the flush drains.
#[derive(Default)]
pub struct InteractionBuffer {
    inner: Mutex<BufferInner>,
}

impl InteractionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the tail. No I/O; always succeeds.
    pub fn record(&self, interaction: InteractionRecord) {
        self.lock().pending.push(interaction);
    }

    /// Overwrites the single latest-context slot.
    pub fn set_context(&self, snapshot: ContextSnapshot) {
        self.lock().context = Some(snapshot);
    }

    /// Captures the current contents and resets the live buffer, in one lock
    /// scope with no await point. Records appended while a flush is out on
    /// the network land in the fresh buffer and survive to the next tick.
    pub fn swap_and_clear(&self) -> (Vec<InteractionRecord>, Option<ContextSnapshot>) {
        let mut inner = self.lock();
        (std::mem::take(&mut inner.pending), inner.context.take())
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.lock();
        inner.pending.is_empty() && inner.context.is_none()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BufferInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Drains the buffer to a [`MemorySink`] on each tick.
pub struct SyncEngine {
    buffer: Arc<InteractionBuffer>,
    sink: Arc<dyn MemorySink>,
    console: Console,
}

impl SyncEngine {
    pub fn new(buffer: Arc<InteractionBuffer>, sink: Arc<dyn MemorySink>, console: Console) -> Self {
        Self {
            buffer,
            sink,
            console,
        }
    }

    pub fn buffer(&self) -> &Arc<InteractionBuffer> {
        &self.buffer
    }

    /// One flush tick. Returns the number of history records dispatched.
    ///
    /// The captured batch goes out as one bulk history write; the captured
    /// snapshot goes to the short-term slot. Both are already cleared from
    /// the live buffer, so a network failure loses them, an accepted
    /// tradeoff, logged and never retried.
    pub async fn flush(&self) -> usize {
        let (batch, context) = self.buffer.swap_and_clear();
        if batch.is_empty() && context.is_none() {
            debug!(target: "luminous::sync", "nothing to sync");
            return 0;
        }

        let dispatched = batch.len();
        if !batch.is_empty() {
            self.console.push(
                "System",
                format!("Auto-saving {} interactions...", dispatched),
                LogKind::System,
            );
            if let Err(e) = self.sink.append_history(&batch).await {
                warn!(
                    target: "luminous::sync",
                    "history append failed, dropping {} record(s): {}", dispatched, e
                );
            }
        }

        if let Some(snapshot) = context {
            if let Err(e) = self.sink.save_context(&snapshot).await {
                warn!(target: "luminous::sync", "context save failed: {}", e);
            }
        }

        self.console
            .push("System", "Memory sync complete.", LogKind::Success);
        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::LuminousState;

    fn rec(input: &str) -> InteractionRecord {
        InteractionRecord::new(input, "ok", LuminousState::Idle, "Neutral")
    }

    #[test]
    fn swap_captures_everything_once() {
        let buffer = InteractionBuffer::new();
        buffer.record(rec("a"));
        buffer.record(rec("b"));
        buffer.set_context(ContextSnapshot::from_cycle("a", "ok"));

        let (batch, context) = buffer.swap_and_clear();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].input, "a");
        assert_eq!(batch[1].input, "b");
        assert!(context.is_some());
        assert!(buffer.is_empty());

        let (again, context_again) = buffer.swap_and_clear();
        assert!(again.is_empty());
        assert!(context_again.is_none());
    }

    #[test]
    fn records_after_swap_wait_for_next_tick() {
        let buffer = InteractionBuffer::new();
        buffer.record(rec("a"));
        let (batch, _) = buffer.swap_and_clear();
        assert_eq!(batch.len(), 1);

        buffer.record(rec("late"));
        assert_eq!(buffer.pending_len(), 1);
        let (next, _) = buffer.swap_and_clear();
        assert_eq!(next[0].input, "late");
    }

    #[test]
    fn context_slot_holds_only_the_latest() {
        let buffer = InteractionBuffer::new();
        buffer.set_context(ContextSnapshot::from_cycle("first", "r1"));
        buffer.set_context(ContextSnapshot::from_cycle("second", "r2"));
        let (_, context) = buffer.swap_and_clear();
        assert_eq!(context.unwrap().last_response, "r2");
    }
}
