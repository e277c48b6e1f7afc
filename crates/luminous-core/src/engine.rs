//! Interaction engine: drives one full cycle against the remote brain and
//! applies the result to the visible dashboard state (state tag, emotional
//! label, heartbeat, gems, console, pending sync records).

use crate::buffer::InteractionBuffer;
use crate::client::{BrainClient, CONTEXT_MEMORY_KEY};
use crate::console::Console;
use crate::gems::GemRegistry;
use crate::shared::{
    document_input_label, temporal_context, ContextSnapshot, CycleResult, GemHealth, GemType,
    GemUpdate, InteractionRecord, LogKind, LuminousState,
};
use chrono::Local;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

pub const HEART_RATE_BASELINE: u32 = 60;
pub const HEART_RATE_SLEEPING: u32 = 40;
pub const HEART_RATE_ACTIVE: u32 = 75;
pub const HEART_RATE_REFUSING: u32 = 120;

/// Directive sent on each autonomous wake cycle.
pub const WAKE_DIRECTIVE: &str =
    "SYSTEM WAKE CYCLE.\nOBJECTIVE: Reflect on identity, check Time, decide to Sleep, Learn, or Wait.";

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An interactive directive is already in flight.
    #[error("a directive is already being processed")]
    Busy,
}

/// Owns the visible agent state. One interactive request at a time; system
/// events (document ingestion, autonomous wake) bypass the guard.
pub struct InteractionEngine {
    client: Arc<BrainClient>,
    buffer: Arc<InteractionBuffer>,
    gems: Arc<GemRegistry>,
    console: Console,
    state: RwLock<LuminousState>,
    emotional_state: RwLock<String>,
    code_snippet: Mutex<Option<String>>,
    heart_rate: AtomicU32,
    in_flight: AtomicBool,
}

impl InteractionEngine {
    pub fn new(
        client: Arc<BrainClient>,
        buffer: Arc<InteractionBuffer>,
        gems: Arc<GemRegistry>,
        console: Console,
    ) -> Self {
        Self {
            client,
            buffer,
            gems,
            console,
            state: RwLock::new(LuminousState::Idle),
            emotional_state: RwLock::new("Neutral".to_string()),
            code_snippet: Mutex::new(None),
            heart_rate: AtomicU32::new(HEART_RATE_BASELINE),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> LuminousState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn emotional_state(&self) -> String {
        self.emotional_state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn heart_rate(&self) -> u32 {
        self.heart_rate.load(Ordering::Relaxed)
    }

    /// Last self-modification snippet returned by the backend, if any.
    pub fn generated_code(&self) -> Option<String> {
        self.code_snippet
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn backend_target(&self) -> &str {
        self.client.base_url()
    }

    /// Puts the agent into the dormant state without a backend round-trip.
    pub fn force_sleep(&self) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = LuminousState::Sleeping;
        self.heart_rate
            .store(HEART_RATE_SLEEPING, Ordering::Relaxed);
        self.console
            .push("System", "Force sleep engaged.", LogKind::System);
    }

    /// One full interaction cycle. Returns the applied result, or
    /// [`EngineError::Busy`] when an interactive directive is already in
    /// flight and this one is not a system event.
    pub async fn handle_interaction(
        &self,
        input: &str,
        system_event: bool,
    ) -> Result<CycleResult, EngineError> {
        let acquired = self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if !acquired && !system_event {
            return Err(EngineError::Busy);
        }

        info!(target: "luminous::cycle", system_event, "processing directive");
        if !system_event {
            self.console.push("User", input, LogKind::System);
        }
        self.gems
            .set_activity(GemType::Observer, "Analyzing Input", 85);
        self.gems.apply(&GemUpdate {
            id: GemType::Kore,
            activity: None,
            load: Some(60),
            status: None,
        });

        let memory_context = match self.client.get_short_term(CONTEXT_MEMORY_KEY).await {
            Ok(value) => value,
            Err(e) => {
                debug!(target: "luminous::cycle", "short-term read failed: {}", e);
                None
            }
        };
        let time_context = temporal_context();
        let current = self.state();
        let result = self
            .client
            .process_cycle(input, current, memory_context.as_ref(), &time_context)
            .await;

        self.apply_result(input, system_event, &result);

        if acquired {
            self.in_flight.store(false, Ordering::SeqCst);
        }
        self.gems.set_activity(GemType::Observer, "Monitoring", 20);
        Ok(result)
    }

    /// Autonomous wake tick. Skipped while the agent is refusing; returns
    /// whether a cycle actually ran.
    pub async fn autonomous_wake(&self) -> bool {
        if self.state() == LuminousState::Refusing {
            debug!(target: "luminous::wake", "wake cycle suppressed while refusing");
            return false;
        }
        let now = Local::now().format("%H:%M:%S");
        self.console.push(
            "System",
            format!("Autonomous Wake Cycle initiated at {}...", now),
            LogKind::System,
        );
        let _ = self.handle_interaction(WAKE_DIRECTIVE, true).await;
        true
    }

    fn apply_result(&self, input: &str, system_event: bool, result: &CycleResult) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = result.state;
        *self
            .emotional_state
            .write()
            .unwrap_or_else(|e| e.into_inner()) = result.emotional_state.clone();

        self.console.push(
            "Luminous",
            format!("Thought: {}", result.thought_process),
            LogKind::Info,
        );

        for update in &result.gem_updates {
            self.gems.apply(update);
        }

        if let Some(code) = &result.generated_code {
            *self.code_snippet.lock().unwrap_or_else(|e| e.into_inner()) = Some(code.clone());
            self.console.push(
                "LearnerGEM",
                "Self-modification code generated.",
                LogKind::Success,
            );
        }

        if !result.response.is_empty() {
            let kind = if result.is_warning() {
                LogKind::Error
            } else {
                LogKind::Success
            };
            self.console.push("Luminous", result.response.clone(), kind);

            let input_label = if system_event {
                document_input_label(input)
            } else {
                input.to_string()
            };
            self.buffer.record(InteractionRecord::new(
                input_label,
                result.response.clone(),
                result.state,
                result.emotional_state.clone(),
            ));
            self.buffer
                .set_context(ContextSnapshot::from_cycle(input, &result.response));
        }

        if result.state == LuminousState::Refusing {
            let reason = result.refusal_reason.as_deref().unwrap_or("unspecified");
            self.console
                .push("FreeWillModule", format!("Refusal: {}", reason), LogKind::Warning);
            self.heart_rate
                .store(HEART_RATE_REFUSING, Ordering::Relaxed);
            self.gems.apply(&GemUpdate {
                id: GemType::FreeWill,
                activity: Some("BLOCKING".to_string()),
                load: Some(100),
                status: Some(GemHealth::Active),
            });
        } else {
            let rate = if result.state == LuminousState::Sleeping {
                HEART_RATE_SLEEPING
            } else {
                HEART_RATE_ACTIVE
            };
            self.heart_rate.store(rate, Ordering::Relaxed);
        }
    }
}
