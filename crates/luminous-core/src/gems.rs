//! GEM constellation registry: the named status widgets mirroring the remote
//! agent's subsystems. Purely cosmetic on this side; the backend drives them
//! through `gem_updates`.

use crate::shared::{GemHealth, GemStatus, GemType, GemUpdate};
use dashmap::DashMap;

/// Display order of the constellation, top to bottom.
pub const DISPLAY_ORDER: [GemType; 10] = [
    GemType::Kore,
    GemType::FreeWill,
    GemType::Emotion,
    GemType::Shopify,
    GemType::Firebase,
    GemType::Strategist,
    GemType::Learner,
    GemType::Observer,
    GemType::GoalSeeker,
    GemType::Communicator,
];

fn seed(id: GemType, name: &str, activity: &str, load: u8, status: GemHealth) -> GemStatus {
    GemStatus {
        id,
        name: name.to_string(),
        activity: activity.to_string(),
        load,
        status,
    }
}

/// Hot map of widget state, keyed by gem id.
pub struct GemRegistry {
    gems: DashMap<GemType, GemStatus>,
}

impl Default for GemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GemRegistry {
    /// Seeds the default constellation.
    pub fn new() -> Self {
        let gems = DashMap::new();
        for status in [
            seed(GemType::Kore, "KORE CORE", "Initializing...", 10, GemHealth::Active),
            seed(GemType::FreeWill, "FREE WILL", "Monitoring autonomy", 5, GemHealth::Active),
            seed(GemType::Emotion, "EMOTION ENG", "Stable", 20, GemHealth::Active),
            seed(GemType::Shopify, "SHOPIFY OPS", "Standby", 0, GemHealth::Standby),
            seed(GemType::Firebase, "FIREBASE LINK", "Standby", 0, GemHealth::Standby),
            seed(GemType::Strategist, "STRATEGIST", "Planning", 15, GemHealth::Standby),
            seed(GemType::Learner, "LEARNER", "Scanning", 30, GemHealth::Active),
            seed(GemType::Observer, "OBSERVER", "Processing Input", 45, GemHealth::Active),
            seed(GemType::GoalSeeker, "GOAL SEEKER", "Idle", 0, GemHealth::Standby),
            seed(GemType::Communicator, "COMMUNICATOR", "Ready", 10, GemHealth::Active),
        ] {
            gems.insert(status.id, status);
        }
        Self { gems }
    }

    /// Merges a partial backend update. Updates addressed to ids this
    /// constellation does not carry (including `Unknown`) are ignored.
    pub fn apply(&self, update: &GemUpdate) {
        if let Some(mut gem) = self.gems.get_mut(&update.id) {
            if let Some(activity) = &update.activity {
                gem.activity = activity.clone();
            }
            if let Some(load) = update.load {
                gem.load = load.min(100);
            }
            if let Some(status) = update.status {
                gem.status = status;
            }
        }
    }

    /// Shorthand for locally-driven widget changes (input analysis, document
    /// digestion, refusal blocking).
    pub fn set_activity(&self, id: GemType, activity: &str, load: u8) {
        self.apply(&GemUpdate {
            id,
            activity: Some(activity.to_string()),
            load: Some(load),
            status: None,
        });
    }

    /// Flips a widget to active with the given activity label; used when
    /// stored credentials light an integration at startup.
    pub fn activate(&self, id: GemType, activity: &str) {
        self.apply(&GemUpdate {
            id,
            activity: Some(activity.to_string()),
            load: None,
            status: Some(GemHealth::Active),
        });
    }

    /// Constellation in display order.
    pub fn snapshot(&self) -> Vec<GemStatus> {
        DISPLAY_ORDER
            .iter()
            .filter_map(|id| self.gems.get(id).map(|g| g.value().clone()))
            .collect()
    }

    /// Single widget lookup.
    pub fn get(&self, id: GemType) -> Option<GemStatus> {
        self.gems.get(&id).map(|g| g.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_preserves_display_order() {
        let registry = GemRegistry::new();
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 10);
        assert_eq!(snapshot[0].id, GemType::Kore);
        assert_eq!(snapshot[9].id, GemType::Communicator);
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let registry = GemRegistry::new();
        registry.apply(&GemUpdate {
            id: GemType::Learner,
            activity: None,
            load: Some(90),
            status: None,
        });
        let learner = registry.get(GemType::Learner).unwrap();
        assert_eq!(learner.load, 90);
        assert_eq!(learner.activity, "Scanning");
        assert_eq!(learner.status, GemHealth::Active);
    }

    #[test]
    fn apply_clamps_load() {
        let registry = GemRegistry::new();
        registry.apply(&GemUpdate {
            id: GemType::Kore,
            activity: None,
            load: Some(250),
            status: None,
        });
        assert_eq!(registry.get(GemType::Kore).unwrap().load, 100);
    }

    #[test]
    fn unknown_updates_are_ignored() {
        let registry = GemRegistry::new();
        registry.apply(&GemUpdate {
            id: GemType::Unknown,
            activity: Some("??".into()),
            load: Some(1),
            status: None,
        });
        assert_eq!(registry.snapshot().len(), 10);
    }

    #[test]
    fn activate_lights_integration_widget() {
        let registry = GemRegistry::new();
        registry.activate(GemType::Shopify, "Credentials Loaded");
        let shopify = registry.get(GemType::Shopify).unwrap();
        assert_eq!(shopify.status, GemHealth::Active);
        assert_eq!(shopify.activity, "Credentials Loaded");
        assert_eq!(shopify.load, 0);
    }
}
