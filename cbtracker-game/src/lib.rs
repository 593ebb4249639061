//! Conqueror's Blade Challenge Tracker
//!
//! Platform-agnostic core for tracking seasonal challenge progress: the
//! catalog index, completion state, section gating and the grid filter.
//! This crate has no UI or platform-specific dependencies.

pub mod catalog;
pub mod completion;
pub mod constants;
pub mod filter;
pub mod gating;
pub mod id;
pub mod index;
pub mod progress;
pub mod undo;

pub use catalog::{
    Catalog, Challenge, ChallengeTag, Condition, ManualSeasonConfig, ManualSectionConfig, Reward,
    Season, Section, Stage, UnlockConfig, UnlockOperator, UnlockRule,
};
pub use completion::{CompletedChallenges, PersistedProgress, ProgressError};
pub use filter::{
    ChallengeFilter, ChallengeVisibility, Comparison, Field, FilterExpr, FilterOptions,
    FilterValue, Predicate, StageVisibility, build_filter,
};
pub use gating::{SectionStatus, is_section_unlocked, next_stage, section_status};
pub use id::{ChallengeId, Id, IdError, IdKind, SeasonId, SectionId, StageId};
pub use index::{CatalogIndex, GridChallenge, PickItem};
pub use progress::{ProgressStore, Subscriber, UndoOutcome};
pub use undo::UndoStack;

use constants::COMPLETED_STORAGE_KEY;

/// Trait for abstracting catalog loading.
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the season/section/stage/challenge hierarchy
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or parsed.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;

    /// Load hand-maintained unlock rules
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or parsed.
    fn load_unlock_config(&self) -> Result<UnlockConfig, Self::Error>;
}

/// Key-value persistence for progress.
/// Platform-specific implementations should provide this
pub trait ProgressStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn put(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Delete `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be modified.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Wires a catalog source and progress storage together
pub struct TrackerEngine<L, S>
where
    L: CatalogLoader,
    S: ProgressStorage,
{
    loader: L,
    storage: S,
}

impl<L, S> TrackerEngine<L, S>
where
    L: CatalogLoader,
    S: ProgressStorage,
{
    pub const fn new(loader: L, storage: S) -> Self {
        Self { loader, storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the catalog and unlock rules and build the lookup index
    ///
    /// # Errors
    ///
    /// Returns an error if either source cannot be loaded.
    pub fn build_index(&self) -> Result<CatalogIndex, L::Error> {
        let catalog = self.loader.load_catalog()?;
        let unlocks = self.loader.load_unlock_config()?;
        let index = CatalogIndex::build(catalog, &unlocks);
        log::info!(
            "catalog loaded: {} seasons, {} challenges",
            index.seasons().len(),
            index.rows().len()
        );
        Ok(index)
    }

    /// Load persisted progress; an empty set when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the saved data is unreadable,
    /// including [`ProgressError::UnsupportedVersion`].
    pub fn load_progress(&self) -> Result<CompletedChallenges, anyhow::Error> {
        match self.storage.get(COMPLETED_STORAGE_KEY)? {
            Some(json) => {
                let completed = CompletedChallenges::from_json(&json)?;
                log::info!("restored {} completed ids", completed.len());
                Ok(completed)
            }
            None => Ok(CompletedChallenges::new()),
        }
    }

    /// Persist progress under the standard key
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_progress(&self, completed: &CompletedChallenges) -> Result<(), anyhow::Error> {
        let json = completed.to_json()?;
        self.storage.put(COMPLETED_STORAGE_KEY, &json)?;
        Ok(())
    }

    /// Forget all persisted progress
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value cannot be removed.
    pub fn clear_progress(&self) -> Result<(), S::Error> {
        self.storage.remove(COMPLETED_STORAGE_KEY)
    }

    /// Restore saved progress into a store that writes back on every change
    ///
    /// # Errors
    ///
    /// Returns an error if saved progress cannot be loaded.
    pub fn open_store(&self) -> Result<ProgressStore, anyhow::Error>
    where
        S: Clone + 'static,
    {
        let mut store = ProgressStore::new(self.load_progress()?);
        store.persist_to(self.storage.clone());
        Ok(store)
    }
}
