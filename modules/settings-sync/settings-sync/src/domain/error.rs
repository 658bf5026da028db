use settings_sync_sdk::{Category, SettingsError};

use super::validator::ValidationReport;

/// Errors surfaced by the settings store to the consumer layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Rejected locally before any state change or network call.
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    /// Updates are only accepted once a load has completed.
    #[error("Settings are not loaded yet")]
    NotLoaded,

    /// The remote write failed after retries and the optimistic change was undone.
    #[error("Your {category} changes could not be saved and have been reverted. {source}")]
    Reverted {
        category: Category,
        #[source]
        source: SettingsError,
    },

    /// The session lost its authorization; any optimistic change was undone.
    #[error("Your session is no longer authorized: {0}")]
    Unauthorized(#[source] SettingsError),

    /// A non-optimistic remote operation failed after retries.
    #[error("Settings service request failed: {0}")]
    Remote(#[source] SettingsError),

    /// The store was torn down (sign-out or user switch) while the operation was in flight.
    #[error("Settings session ended before the operation completed")]
    SessionEnded,
}

impl StoreError {
    #[must_use]
    pub fn validation(report: ValidationReport) -> Self {
        Self::Validation(report)
    }

    /// Wraps a remote failure of an optimistic category update.
    #[must_use]
    pub fn reverted(category: Category, source: SettingsError) -> Self {
        match source {
            SettingsError::Unauthorized { .. } => Self::Unauthorized(source),
            source => Self::Reverted { category, source },
        }
    }

    /// Wraps a remote failure of a non-optimistic operation.
    #[must_use]
    pub fn remote(source: SettingsError) -> Self {
        match source {
            SettingsError::Unauthorized { .. } => Self::Unauthorized(source),
            source => Self::Remote(source),
        }
    }

    /// `true` when an external re-authentication flow should take over.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}
