//! Section unlock evaluation.
use serde::Serialize;
use smallvec::SmallVec;

use crate::catalog::{Section, Stage, UnlockOperator};
use crate::completion::CompletedChallenges;
use crate::id::{SectionId, StageId};
use crate::index::CatalogIndex;

/// Whether the section's unlock rule is satisfied.
///
/// Stage ids the index cannot resolve are dropped; a rule left with no stages
/// does not gate anything. Unknown operators fail open.
#[must_use]
pub fn is_section_unlocked(
    section: &Section,
    completed: &CompletedChallenges,
    index: &CatalogIndex,
) -> bool {
    let Some(rule) = section.required_stage.as_ref() else {
        return true;
    };

    let stages: SmallVec<[&Stage; 2]> = rule
        .stages
        .iter()
        .filter_map(|&stage_id| {
            let stage = index.stage(stage_id);
            if stage.is_none() {
                log::warn!(
                    "section {} requires unknown stage {stage_id}; requirement ignored",
                    section.id
                );
            }
            stage
        })
        .collect();

    let Some(first) = stages.first() else {
        return true;
    };

    match rule.operator {
        UnlockOperator::Single => {
            if stages.len() > 1 {
                log::warn!(
                    "section {} has a single-stage rule naming {} stages; using {}",
                    section.id,
                    stages.len(),
                    first.id
                );
            }
            completed.is_stage_complete(first)
        }
        UnlockOperator::And => stages.iter().all(|stage| completed.is_stage_complete(stage)),
        UnlockOperator::Or => stages.iter().any(|stage| completed.is_stage_complete(stage)),
        UnlockOperator::Unknown => {
            log::warn!(
                "section {} has an unrecognized unlock operator; treating as unlocked",
                section.id
            );
            true
        }
    }
}

/// First stage of the section, in catalog order, that is not complete.
#[must_use]
pub fn next_stage<'a>(section: &'a Section, completed: &CompletedChallenges) -> Option<&'a Stage> {
    section
        .stages
        .iter()
        .find(|stage| !completed.is_stage_complete(stage))
}

/// Progress summary of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStatus {
    pub section_id: SectionId,
    pub name: String,
    pub unlocked: bool,
    pub stages_done: usize,
    pub stages_total: usize,
    pub next_stage: Option<StageId>,
}

impl SectionStatus {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.next_stage.is_none()
    }
}

#[must_use]
pub fn section_status(
    section: &Section,
    completed: &CompletedChallenges,
    index: &CatalogIndex,
) -> SectionStatus {
    let stages_done = section
        .stages
        .iter()
        .filter(|stage| completed.is_stage_complete(stage))
        .count();
    SectionStatus {
        section_id: section.id,
        name: section.name.clone(),
        unlocked: is_section_unlocked(section, completed, index),
        stages_done,
        stages_total: section.stages.len(),
        next_stage: next_stage(section, completed).map(|stage| stage.id),
    }
}
