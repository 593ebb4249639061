//! Flattened, read-only lookup tables over the challenge catalog.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::{Catalog, Challenge, ChallengeTag, Season, Section, Stage, UnlockConfig};
use crate::id::{ChallengeId, SeasonId, SectionId, StageId};

/// A challenge row as shown in the grid, carrying its ancestor ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridChallenge {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub season_id: SeasonId,
    pub section_id: SectionId,
    pub stage_id: StageId,
}

impl GridChallenge {
    fn new(challenge: &Challenge, season: SeasonId, section: SectionId, stage: StageId) -> Self {
        Self {
            challenge: challenge.clone(),
            season_id: season,
            section_id: section,
            stage_id: stage,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ChallengeId {
        self.challenge.id
    }

    #[must_use]
    pub fn has_tag(&self, tag: ChallengeTag) -> bool {
        self.challenge.tags.contains(&tag)
    }
}

/// Label/value pair for a drop-down selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickItem<T> {
    pub text: String,
    pub value: T,
}

/// Lookup tables built once from a [`Catalog`].
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    seasons: Vec<Season>,
    season_map: HashMap<SeasonId, usize>,
    section_map: HashMap<SectionId, (usize, usize)>,
    stage_map: HashMap<StageId, (usize, usize, usize)>,
    rows: Vec<GridChallenge>,
    challenge_map: HashMap<ChallengeId, usize>,
}

impl CatalogIndex {
    /// Flatten the catalog and attach unlock rules from the manual configuration.
    ///
    /// A section keeps a rule embedded in the catalog only when the manual
    /// configuration has no entry for it.
    #[must_use]
    pub fn build(mut catalog: Catalog, unlocks: &UnlockConfig) -> Self {
        let mut rules = unlocks.rules_by_section();
        let mut index = Self::default();

        for (season_pos, season) in catalog.seasons.iter_mut().enumerate() {
            index.season_map.insert(season.id, season_pos);

            for (section_pos, section) in season.sections.iter_mut().enumerate() {
                if let Some(rule) = rules.remove(&section.id) {
                    section.required_stage = Some(rule);
                }
                index
                    .section_map
                    .insert(section.id, (season_pos, section_pos));

                for (stage_pos, stage) in section.stages.iter().enumerate() {
                    index
                        .stage_map
                        .insert(stage.id, (season_pos, section_pos, stage_pos));

                    for challenge in &stage.challenges {
                        let row = GridChallenge::new(challenge, season.id, section.id, stage.id);
                        index.challenge_map.insert(challenge.id, index.rows.len());
                        index.rows.push(row);
                    }
                }
            }
        }

        for section_id in rules.keys() {
            log::warn!("unlock rule for unknown section {section_id} ignored");
        }

        index.seasons = catalog.seasons;
        log::debug!(
            "catalog indexed: {} seasons, {} sections, {} stages, {} challenges",
            index.season_map.len(),
            index.section_map.len(),
            index.stage_map.len(),
            index.rows.len()
        );
        index
    }

    #[must_use]
    pub fn season(&self, id: SeasonId) -> Option<&Season> {
        self.season_map.get(&id).map(|&pos| &self.seasons[pos])
    }

    #[must_use]
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.section_map
            .get(&id)
            .map(|&(season, section)| &self.seasons[season].sections[section])
    }

    #[must_use]
    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stage_map
            .get(&id)
            .map(|&(season, section, stage)| &self.seasons[season].sections[section].stages[stage])
    }

    #[must_use]
    pub fn challenge(&self, id: ChallengeId) -> Option<&GridChallenge> {
        self.challenge_map.get(&id).map(|&pos| &self.rows[pos])
    }

    /// Seasons in catalog order.
    #[must_use]
    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.seasons.iter().flat_map(|season| &season.sections)
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.sections().flat_map(|section| &section.stages)
    }

    /// Every challenge row in catalog order.
    #[must_use]
    pub fn rows(&self) -> &[GridChallenge] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    #[must_use]
    pub fn season_choices(&self) -> Vec<PickItem<SeasonId>> {
        self.seasons
            .iter()
            .map(|season| PickItem {
                text: season.name.clone(),
                value: season.id,
            })
            .collect()
    }

    #[must_use]
    pub fn section_choices(&self) -> Vec<PickItem<SectionId>> {
        self.sections()
            .map(|section| PickItem {
                text: section.name.clone(),
                value: section.id,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{UnlockOperator, UnlockRule};

    fn fixture() -> Catalog {
        Catalog::from_json(
            r#"[
                { "id": 1, "name": "Season I", "sections": [
                    { "id": "1.1", "name": "Recruit", "stages": [
                        { "id": "1.1.1", "name": "Stage 1", "required": 1, "total": 2, "challenges": [
                            { "id": "1.1.1.1", "text": "Capture a point", "tags": ["Siege"] },
                            { "id": "1.1.1.2", "text": "Defeat raiders", "tags": ["Bandit Raid"] }
                        ] },
                        { "id": "1.1.2", "name": "Stage 2", "required": 1, "total": 1, "challenges": [
                            { "id": "1.1.2.1", "text": "Win a field battle", "tags": ["Field"] }
                        ] }
                    ] }
                ] },
                { "id": 2, "name": "Season II", "sections": [
                    { "id": "2.1", "name": "Veteran", "requiredStage": "1.1.1", "stages": [] },
                    { "id": "2.2", "name": "Elite", "stages": [] }
                ] }
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn lookups_resolve_every_granularity() {
        let index = CatalogIndex::build(fixture(), &UnlockConfig::empty());
        assert_eq!(index.season(SeasonId(2)).unwrap().name, "Season II");
        assert_eq!(index.section(SectionId::new(1, 1)).unwrap().name, "Recruit");
        assert_eq!(index.stage(StageId::new(1, 1, 2)).unwrap().total, 1);
        assert!(index.season(SeasonId(9)).is_none());
        assert!(index.stage(StageId::new(1, 1, 3)).is_none());
        assert_eq!(index.rows().len(), 3);
        assert_eq!(index.stages().count(), 2);
    }

    #[test]
    fn rows_carry_denormalized_ancestors() {
        let index = CatalogIndex::build(fixture(), &UnlockConfig::empty());
        let row = index.challenge(ChallengeId::new(1, 1, 2, 1)).unwrap();
        assert_eq!(row.season_id, SeasonId(1));
        assert_eq!(row.section_id, SectionId::new(1, 1));
        assert_eq!(row.stage_id, StageId::new(1, 1, 2));
        assert!(row.has_tag(ChallengeTag::Field));

        let value = serde_json::to_value(row).unwrap();
        assert_eq!(value["id"], "1.1.2.1");
        assert_eq!(value["seasonId"], 1);
        assert_eq!(value["stageId"], "1.1.2");
    }

    #[test]
    fn manual_config_overrides_embedded_rules() {
        let unlocks = UnlockConfig::from_json(
            r#"[{ "id": 2, "sections": [
                { "id": "2.1", "requiredStage": { "operator": "or", "stages": ["1.1.1", "1.1.2"] } },
                { "id": "2.2", "requiredStage": "1.1.2" },
                { "id": "7.1", "requiredStage": "1.1.2" }
            ] }]"#,
        )
        .unwrap();
        let index = CatalogIndex::build(fixture(), &unlocks);

        let gated = index.section(SectionId::new(2, 1)).unwrap();
        let rule = gated.required_stage.as_ref().unwrap();
        assert_eq!(rule.operator, UnlockOperator::Or);
        assert_eq!(rule.stages.len(), 2);

        let single = index.section(SectionId::new(2, 2)).unwrap();
        assert_eq!(
            single.required_stage,
            Some(UnlockRule::single(StageId::new(1, 1, 2)))
        );
        assert!(
            index
                .section(SectionId::new(1, 1))
                .unwrap()
                .required_stage
                .is_none()
        );
    }

    #[test]
    fn embedded_rule_survives_without_manual_entry() {
        let index = CatalogIndex::build(fixture(), &UnlockConfig::empty());
        assert_eq!(
            index.section(SectionId::new(2, 1)).unwrap().required_stage,
            Some(UnlockRule::single(StageId::new(1, 1, 1)))
        );
    }

    #[test]
    fn pick_lists_follow_catalog_order() {
        let index = CatalogIndex::build(fixture(), &UnlockConfig::empty());
        let seasons = index.season_choices();
        assert_eq!(seasons[0].value, SeasonId(1));
        assert_eq!(seasons[1].text, "Season II");
        let sections: Vec<_> = index
            .section_choices()
            .into_iter()
            .map(|item| item.value)
            .collect();
        assert_eq!(
            sections,
            vec![
                SectionId::new(1, 1),
                SectionId::new(2, 1),
                SectionId::new(2, 2)
            ]
        );
    }
}
