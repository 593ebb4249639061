//! Centralized constants for the completion engine.
//!
//! Wire formats and storage keys live here so that changes to persisted data
//! are reviewed in one place.

// Persistence ---------------------------------------------------------------
/// Key under which completion progress is stored.
pub const COMPLETED_STORAGE_KEY: &str = "CbTracker-CompletedChallenges";
/// Version written into every persisted completion document.
pub const PROGRESS_FORMAT_VERSION: u32 = 2;

// Catalog bounds ------------------------------------------------------------
/// No stage in the catalog carries more challenges than this.
pub const MAX_CHALLENGES_PER_STAGE: u32 = 20;

// Grid field names ----------------------------------------------------------
pub(crate) const FIELD_ID: &str = "id";
pub(crate) const FIELD_SEASON_ID: &str = "seasonId";
pub(crate) const FIELD_SECTION_ID: &str = "sectionId";
pub(crate) const FIELD_STAGE_ID: &str = "stageId";
pub(crate) const FIELD_TAGS: &str = "tags";
