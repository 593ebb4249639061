//! Completed-id bookkeeping at season, section, stage and challenge granularity.
//!
//! Recording a coarse id (say a whole season) is a standalone fact: nothing is
//! cascaded into the finer sets. Queries walk ancestors instead.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::catalog::Stage;
use crate::constants::{MAX_CHALLENGES_PER_STAGE, PROGRESS_FORMAT_VERSION};
use crate::id::{ChallengeId, Id, SeasonId, SectionId, StageId};

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("completion data has no version tag; pre-versioning progress cannot be migrated")]
    UnsupportedVersion,
    #[error("malformed completion data: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Wire shape of persisted and exported progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<u32>,
    #[serde(default)]
    pub season_ids: Vec<SeasonId>,
    #[serde(default)]
    pub section_ids: Vec<SectionId>,
    #[serde(default)]
    pub stage_ids: Vec<StageId>,
    #[serde(default)]
    pub challenge_ids: Vec<ChallengeId>,
}

/// Ids the player has marked done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedChallenges {
    season_ids: BTreeSet<SeasonId>,
    section_ids: BTreeSet<SectionId>,
    stage_ids: BTreeSet<StageId>,
    challenge_ids: BTreeSet<ChallengeId>,
}

impl CompletedChallenges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw id from the UI. Unclassifiable ids are ignored.
    ///
    /// Returns the classified id, or `None` when the input was rejected.
    pub fn complete(&mut self, raw: &str) -> Option<Id> {
        let id = classify_or_skip(raw)?;
        self.complete_id(id);
        Some(id)
    }

    /// Returns `true` if the id was not already recorded.
    pub fn complete_id(&mut self, id: Id) -> bool {
        match id {
            Id::Season(id) => self.season_ids.insert(id),
            Id::Section(id) => self.section_ids.insert(id),
            Id::Stage(id) => self.stage_ids.insert(id),
            Id::Challenge(id) => self.challenge_ids.insert(id),
        }
    }

    /// Remove a raw id. Unclassifiable or absent ids are ignored.
    pub fn uncomplete(&mut self, raw: &str) -> Option<Id> {
        let id = classify_or_skip(raw)?;
        self.uncomplete_id(id);
        Some(id)
    }

    /// Returns `true` if the id was recorded.
    pub fn uncomplete_id(&mut self, id: Id) -> bool {
        match id {
            Id::Season(id) => self.season_ids.remove(&id),
            Id::Section(id) => self.section_ids.remove(&id),
            Id::Stage(id) => self.stage_ids.remove(&id),
            Id::Challenge(id) => self.challenge_ids.remove(&id),
        }
    }

    pub fn clear(&mut self) {
        self.season_ids.clear();
        self.section_ids.clear();
        self.stage_ids.clear();
        self.challenge_ids.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.season_ids.is_empty()
            && self.section_ids.is_empty()
            && self.stage_ids.is_empty()
            && self.challenge_ids.is_empty()
    }

    /// Total number of recorded ids across all granularities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.season_ids.len()
            + self.section_ids.len()
            + self.stage_ids.len()
            + self.challenge_ids.len()
    }

    /// Direct membership at the id's own granularity.
    #[must_use]
    pub fn contains(&self, id: Id) -> bool {
        match id {
            Id::Season(id) => self.season_ids.contains(&id),
            Id::Section(id) => self.section_ids.contains(&id),
            Id::Stage(id) => self.stage_ids.contains(&id),
            Id::Challenge(id) => self.challenge_ids.contains(&id),
        }
    }

    /// True when the id itself or any of its ancestors is recorded.
    #[must_use]
    pub fn is_covered(&self, id: Id) -> bool {
        match id {
            Id::Season(season) => self.season_ids.contains(&season),
            Id::Section(section) => {
                self.section_ids.contains(&section) || self.is_covered(section.season().into())
            }
            Id::Stage(stage) => {
                self.stage_ids.contains(&stage) || self.is_covered(stage.section().into())
            }
            Id::Challenge(challenge) => {
                self.challenge_ids.contains(&challenge) || self.is_covered(challenge.stage().into())
            }
        }
    }

    /// A stage is done when an ancestor or the stage itself is recorded, or
    /// when at least `stage.required` of its challenges are.
    #[must_use]
    pub fn is_stage_complete(&self, stage: &Stage) -> bool {
        if self.is_covered(stage.id.into()) {
            return true;
        }
        let done = stage
            .challenge_ids()
            .filter(|id| self.challenge_ids.contains(id))
            .count();
        u32::try_from(done).unwrap_or(u32::MAX) >= stage.required
    }

    /// Recorded challenges of one stage, in challenge order.
    ///
    /// Probes `stage.1 ..= stage.20` instead of scanning the catalog.
    #[must_use]
    pub fn completed_challenge_ids_under(&self, stage: StageId) -> Vec<ChallengeId> {
        (1..=MAX_CHALLENGES_PER_STAGE)
            .map(|n| stage.challenge(n))
            .filter(|id| self.challenge_ids.contains(id))
            .collect()
    }

    pub fn season_ids(&self) -> impl Iterator<Item = SeasonId> + '_ {
        self.season_ids.iter().copied()
    }

    pub fn section_ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.section_ids.iter().copied()
    }

    pub fn stage_ids(&self) -> impl Iterator<Item = StageId> + '_ {
        self.stage_ids.iter().copied()
    }

    pub fn challenge_ids(&self) -> impl Iterator<Item = ChallengeId> + '_ {
        self.challenge_ids.iter().copied()
    }

    #[must_use]
    pub fn to_persisted(&self) -> PersistedProgress {
        PersistedProgress {
            v: Some(PROGRESS_FORMAT_VERSION),
            season_ids: self.season_ids().collect(),
            section_ids: self.section_ids().collect(),
            stage_ids: self.stage_ids().collect(),
            challenge_ids: self.challenge_ids().collect(),
        }
    }

    /// Rebuild from persisted data.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::UnsupportedVersion`] when the data carries no
    /// version tag.
    pub fn from_persisted(data: PersistedProgress) -> Result<Self, ProgressError> {
        if data.v.is_none() {
            return Err(ProgressError::UnsupportedVersion);
        }
        Ok(Self {
            season_ids: data.season_ids.into_iter().collect(),
            section_ids: data.section_ids.into_iter().collect(),
            stage_ids: data.stage_ids.into_iter().collect(),
            challenge_ids: data.challenge_ids.into_iter().collect(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProgressError> {
        Ok(serde_json::to_string(&self.to_persisted())?)
    }

    /// # Errors
    ///
    /// Returns [`ProgressError::Malformed`] for text that is not a progress
    /// document, and [`ProgressError::UnsupportedVersion`] for unversioned data.
    pub fn from_json(json: &str) -> Result<Self, ProgressError> {
        let data: PersistedProgress = serde_json::from_str(json)?;
        Self::from_persisted(data)
    }
}

fn classify_or_skip(raw: &str) -> Option<Id> {
    match Id::classify(raw) {
        Ok(id) => Some(id),
        Err(err) => {
            log::debug!("ignoring completion update: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Challenge;

    fn stage(id: &str, required: u32, challenges: u32) -> Stage {
        let id: StageId = id.parse().unwrap();
        Stage {
            id,
            name: format!("Stage {}", id.index()),
            required,
            total: challenges,
            challenges: (1..=challenges)
                .map(|n| Challenge {
                    id: id.challenge(n),
                    text: format!("Challenge {n}"),
                    tags: Vec::new(),
                    conditions: Vec::new(),
                })
                .collect(),
            rewards: Vec::new(),
        }
    }

    #[test]
    fn complete_routes_ids_by_granularity() {
        let mut done = CompletedChallenges::new();
        assert!(done.is_empty());
        done.complete("3");
        done.complete("3.1");
        done.complete("3.1.2");
        done.complete("3.1.2.5");
        assert_eq!(done.season_ids().collect::<Vec<_>>(), vec![SeasonId(3)]);
        assert_eq!(
            done.section_ids().collect::<Vec<_>>(),
            vec![SectionId::new(3, 1)]
        );
        assert_eq!(
            done.stage_ids().collect::<Vec<_>>(),
            vec![StageId::new(3, 1, 2)]
        );
        assert_eq!(
            done.challenge_ids().collect::<Vec<_>>(),
            vec![ChallengeId::new(3, 1, 2, 5)]
        );
        assert_eq!(done.len(), 4);
    }

    #[test]
    fn garbled_ids_are_ignored() {
        let mut done = CompletedChallenges::new();
        assert!(done.complete("1.2.3.4.5").is_none());
        assert!(done.complete("abc").is_none());
        assert!(done.uncomplete("").is_none());
        assert!(done.is_empty());
    }

    #[test]
    fn complete_then_uncomplete_restores_state() {
        let mut done = CompletedChallenges::new();
        done.complete("1.1.1.1");
        done.complete("2");
        for raw in ["4", "4.2", "4.2.1", "4.2.1.7", "1.1.1.2"] {
            let before = done.clone();
            done.complete(raw);
            assert_ne!(done, before);
            done.uncomplete(raw);
            assert_eq!(done, before, "{raw} did not round-trip");
        }
        assert!(!done.uncomplete_id(Id::Season(SeasonId(42))));
    }

    #[test]
    fn stage_completes_at_required_threshold() {
        let first = stage("1.1.1", 2, 3);
        let mut done = CompletedChallenges::new();
        done.complete("1.1.1.1");
        assert!(!done.is_stage_complete(&first));
        done.complete("1.1.1.2");
        assert!(done.is_stage_complete(&first));
        assert!(!done.contains(ChallengeId::new(1, 1, 1, 3).into()));
    }

    #[test]
    fn stage_completes_through_ancestors() {
        let target = stage("5.2.3", 4, 4);
        for raw in ["5", "5.2", "5.2.3"] {
            let mut done = CompletedChallenges::new();
            done.complete(raw);
            assert!(done.is_stage_complete(&target), "{raw} should cover stage");
        }
        let mut unrelated = CompletedChallenges::new();
        unrelated.complete("5.20");
        unrelated.complete("55");
        assert!(!unrelated.is_stage_complete(&target));
    }

    #[test]
    fn stage_completion_is_monotonic() {
        let target = stage("2.1.1", 2, 3);
        let additions = ["2.1.1.1", "9", "2.1.1.2", "2.1.1.3", "2.1", "1.1.1.1", "2"];
        let mut done = CompletedChallenges::new();
        let mut was_complete = false;
        for raw in additions {
            done.complete(raw);
            let now = done.is_stage_complete(&target);
            assert!(!was_complete || now, "adding {raw} regressed completion");
            was_complete = now;
        }
        assert!(was_complete);
    }

    #[test]
    fn finds_up_to_twenty_challenges() {
        let mut done = CompletedChallenges::new();
        for raw in ["1.1.1.20", "1.1.1.3", "1.1.1.21", "1.1.2.1", "1.1.1"] {
            done.complete(raw);
        }
        assert_eq!(
            done.completed_challenge_ids_under(StageId::new(1, 1, 1)),
            vec![ChallengeId::new(1, 1, 1, 3), ChallengeId::new(1, 1, 1, 20)]
        );
    }

    #[test]
    fn coverage_respects_component_boundaries() {
        let mut done = CompletedChallenges::new();
        done.complete("1");
        assert!(done.is_covered(Id::classify("1.4.2.1").unwrap()));
        assert!(!done.is_covered(Id::classify("10.1.1.1").unwrap()));
    }

    #[test]
    fn persisted_roundtrip_is_identity() {
        let mut done = CompletedChallenges::new();
        for raw in ["3", "1.2", "1.1.4", "2.1.1.1", "2.1.1.9"] {
            done.complete(raw);
        }
        let json = done.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["v"], 2);
        assert_eq!(value["seasonIds"], serde_json::json!([3]));
        assert_eq!(value["stageIds"], serde_json::json!(["1.1.4"]));
        assert_eq!(CompletedChallenges::from_json(&json).unwrap(), done);

        let empty = CompletedChallenges::new();
        assert_eq!(
            CompletedChallenges::from_persisted(empty.to_persisted()).unwrap(),
            empty
        );
    }

    #[test]
    fn accepts_unordered_persisted_ids() {
        let restored = CompletedChallenges::from_json(
            r#"{"v":2,"seasonIds":[],"sectionIds":["2.1","1.3"],"stageIds":[],"challengeIds":[]}"#,
        )
        .unwrap();
        assert!(restored.contains(SectionId::new(1, 3).into()));
        assert!(restored.contains(SectionId::new(2, 1).into()));
    }

    #[test]
    fn unversioned_data_is_rejected() {
        let legacy = r#"{"seasonIds":[1],"sectionIds":[],"stageIds":[],"challengeIds":[]}"#;
        assert!(matches!(
            CompletedChallenges::from_json(legacy),
            Err(ProgressError::UnsupportedVersion)
        ));
        assert!(matches!(
            CompletedChallenges::from_json("{}"),
            Err(ProgressError::UnsupportedVersion)
        ));
        assert!(matches!(
            CompletedChallenges::from_json("not json"),
            Err(ProgressError::Malformed(_))
        ));
    }
}
