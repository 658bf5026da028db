use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use settings_sync_sdk::{Category, CategoryPatch, UserSettings};

/// Immutable copy of the whole settings record taken right before an
/// optimistic apply. Only ever read back for rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(UserSettings);

impl Snapshot {
    #[must_use]
    pub fn capture(settings: &UserSettings) -> Self {
        Self(settings.clone())
    }

    #[must_use]
    pub fn settings(&self) -> &UserSettings {
        &self.0
    }

    /// Restores `category` of `target` to its captured value.
    pub fn restore_into(&self, target: &mut UserSettings, category: Category) {
        target.restore_from(&self.0, category);
    }
}

/// Bookkeeping for one outstanding remote confirmation.
#[derive(Debug, Clone)]
pub struct PendingUpdate {
    pub category: Category,
    pub proposed: CategoryPatch,
    pub snapshot: Snapshot,
    pub started_at: DateTime<Utc>,
}

/// At most one [`PendingUpdate`] per category.
#[derive(Debug, Default, Clone)]
pub struct PendingUpdates {
    slots: BTreeMap<Category, PendingUpdate>,
}

impl PendingUpdates {
    /// Registers an update. Returns the update it displaced, which only
    /// happens if a caller bypassed the category lock.
    pub fn insert(&mut self, update: PendingUpdate) -> Option<PendingUpdate> {
        self.slots.insert(update.category, update)
    }

    pub fn take(&mut self, category: Category) -> Option<PendingUpdate> {
        self.slots.remove(&category)
    }

    #[must_use]
    pub fn contains(&self, category: Category) -> bool {
        self.slots.contains_key(&category)
    }

    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.slots.keys().copied().collect()
    }
}
