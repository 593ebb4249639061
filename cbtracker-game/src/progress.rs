//! Owner of the player's completion state for a session.
//!
//! Mutations go through [`ProgressStore`], which keeps the undo history and
//! tells subscribers about every change. Persistence is one such subscriber.
use std::fmt;

use crate::ProgressStorage;
use crate::completion::{CompletedChallenges, ProgressError};
use crate::constants::COMPLETED_STORAGE_KEY;
use crate::filter::{ChallengeFilter, FilterOptions, build_filter};
use crate::id::Id;
use crate::index::CatalogIndex;
use crate::undo::UndoStack;

/// Callback invoked with the new state after every change.
pub type Subscriber = Box<dyn FnMut(&CompletedChallenges)>;

/// What [`ProgressStore::undo`] did with the latest history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    Removed(Id),
    /// The id had already been cleared, so nothing changed.
    AlreadyClear(Id),
}

#[derive(Default)]
pub struct ProgressStore {
    completed: CompletedChallenges,
    history: UndoStack<Id>,
    options: FilterOptions,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("completed", &self.completed)
            .field("history", &self.history)
            .field("options", &self.options)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ProgressStore {
    #[must_use]
    pub fn new(completed: CompletedChallenges) -> Self {
        Self {
            completed,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn completed(&self) -> &CompletedChallenges {
        &self.completed
    }

    #[must_use]
    pub const fn options(&self) -> FilterOptions {
        self.options
    }

    pub fn set_options(&mut self, options: FilterOptions) {
        self.options = options;
    }

    /// Number of completions that can still be undone.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&CompletedChallenges) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Write the state to `storage` after every change.
    ///
    /// Writes are fire-and-forget: a failed write is logged and the in-memory
    /// change stands.
    pub fn persist_to<S>(&mut self, storage: S)
    where
        S: ProgressStorage + 'static,
    {
        self.subscribe(move |completed| {
            let result = completed
                .to_json()
                .map_err(|err| err.to_string())
                .and_then(|json| {
                    storage
                        .put(COMPLETED_STORAGE_KEY, &json)
                        .map_err(|err| err.to_string())
                });
            if let Err(err) = result {
                log::error!("failed to persist completion progress: {err}");
            }
        });
    }

    /// Mark a raw id complete and remember it for [`ProgressStore::undo`].
    /// Unclassifiable ids change nothing.
    pub fn complete(&mut self, raw: &str) -> Option<Id> {
        let id = self.completed.complete(raw)?;
        self.history.push(id);
        self.notify();
        Some(id)
    }

    /// Remove a raw id. Returns the id only when something was removed.
    pub fn uncomplete(&mut self, raw: &str) -> Option<Id> {
        let id = Id::classify(raw).ok()?;
        self.uncomplete_id(id).then_some(id)
    }

    /// Remove an already classified id. Returns `true` if it was recorded.
    pub fn uncomplete_id(&mut self, id: Id) -> bool {
        if !self.completed.uncomplete_id(id) {
            return false;
        }
        self.notify();
        true
    }

    /// Reverse the most recent completion of this session.
    pub fn undo(&mut self) -> Option<UndoOutcome> {
        let id = self.history.pop()?;
        if self.uncomplete_id(id) {
            Some(UndoOutcome::Removed(id))
        } else {
            Some(UndoOutcome::AlreadyClear(id))
        }
    }

    /// Swap in a whole new state. The undo history is dropped.
    pub fn replace(&mut self, completed: CompletedChallenges) {
        self.completed = completed;
        self.history.clear();
        self.notify();
    }

    pub fn reset(&mut self) {
        self.replace(CompletedChallenges::new());
    }

    /// Serialize the current state for copying elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export(&self) -> Result<String, ProgressError> {
        self.completed.to_json()
    }

    /// Replace the current state with previously exported text.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::UnsupportedVersion`] for unversioned data and
    /// [`ProgressError::Malformed`] for anything unparsable. The current state
    /// is untouched on error.
    pub fn import(&mut self, text: &str) -> Result<(), ProgressError> {
        let completed = CompletedChallenges::from_json(text.trim())?;
        log::info!("imported {} completed ids", completed.len());
        self.replace(completed);
        Ok(())
    }

    /// Grid filter for the current state and display options.
    #[must_use]
    pub fn filter(&self, index: &CatalogIndex) -> ChallengeFilter {
        build_filter(&self.completed, self.options, index)
    }

    fn notify(&mut self) {
        for subscriber in &mut self.subscribers {
            subscriber(&self.completed);
        }
    }
}
