//! Challenge catalog data shapes and the manual unlock configuration.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::id::{ChallengeId, SeasonId, SectionId, StageId};

/// Stage ids named by an unlock rule; rules rarely reference more than two.
pub type StageList = SmallVec<[StageId; 2]>;

/// Game mode tag attached to a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChallengeTag {
    Siege,
    Field,
    #[serde(rename = "Bandit Raid")]
    BanditRaid,
    #[serde(rename = "Open World")]
    OpenWorld,
    Expedition,
    #[serde(rename = "Territory Wars")]
    TerritoryWars,
    Ranked,
    #[serde(rename = "Free Battles")]
    FreeBattles,
    Deathmatch,
    General,
}

impl ChallengeTag {
    pub const ALL: [Self; 10] = [
        Self::Siege,
        Self::Field,
        Self::BanditRaid,
        Self::OpenWorld,
        Self::Expedition,
        Self::TerritoryWars,
        Self::Ranked,
        Self::FreeBattles,
        Self::Deathmatch,
        Self::General,
    ];

    /// Display label, identical to the JSON spelling.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Siege => "Siege",
            Self::Field => "Field",
            Self::BanditRaid => "Bandit Raid",
            Self::OpenWorld => "Open World",
            Self::Expedition => "Expedition",
            Self::TerritoryWars => "Territory Wars",
            Self::Ranked => "Ranked",
            Self::FreeBattles => "Free Battles",
            Self::Deathmatch => "Deathmatch",
            Self::General => "General",
        }
    }
}

impl fmt::Display for ChallengeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChallengeTag {
    type Err = String;

    /// Case-insensitive; spaces, dashes and underscores are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_tag(s);
        Self::ALL
            .into_iter()
            .find(|tag| normalize_tag(tag.label()) == wanted)
            .ok_or_else(|| format!("unknown challenge tag: {s}"))
    }
}

fn normalize_tag(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Condition text of a challenge, e.g. "Win 5 battles".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    pub action: String,
}

/// Reward granted when a stage is finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<ChallengeTag>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    /// Challenges needed before the stage counts as complete
    pub required: u32,
    pub total: u32,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

impl Stage {
    pub fn challenge_ids(&self) -> impl Iterator<Item = ChallengeId> + '_ {
        self.challenges.iter().map(|challenge| challenge.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_stage: Option<UnlockRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// The full challenge tree, seasons in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Catalog {
    pub seasons: Vec<Season>,
}

impl Catalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            seasons: Vec::new(),
        }
    }

    /// Load the catalog from a JSON array of seasons.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the catalog shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// How the stages of an unlock rule combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockOperator {
    /// Exactly one stage gates the section
    Single,
    /// Every listed stage must be complete
    And,
    /// At least one listed stage must be complete
    Or,
    /// Anything else found in configuration; treated as unlocked
    #[serde(other)]
    Unknown,
}

/// Stages that must be complete before a section opens.
///
/// Deserializes from either a bare stage id (`"1.2.3"`) or an explicit
/// `{ "operator": "and", "stages": [...] }` object; the bare form becomes a
/// `single` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RequiredStage")]
pub struct UnlockRule {
    pub operator: UnlockOperator,
    pub stages: StageList,
}

impl UnlockRule {
    #[must_use]
    pub fn single(stage: StageId) -> Self {
        Self {
            operator: UnlockOperator::Single,
            stages: smallvec::smallvec![stage],
        }
    }

    #[must_use]
    pub fn all_of(stages: impl IntoIterator<Item = StageId>) -> Self {
        Self {
            operator: UnlockOperator::And,
            stages: stages.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn any_of(stages: impl IntoIterator<Item = StageId>) -> Self {
        Self {
            operator: UnlockOperator::Or,
            stages: stages.into_iter().collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequiredStage {
    Bare(StageId),
    Explicit {
        operator: UnlockOperator,
        #[serde(default)]
        stages: StageList,
    },
}

impl From<RequiredStage> for UnlockRule {
    fn from(raw: RequiredStage) -> Self {
        match raw {
            RequiredStage::Bare(stage) => Self::single(stage),
            RequiredStage::Explicit { operator, stages } => Self { operator, stages },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSectionConfig {
    pub id: SectionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_stage: Option<UnlockRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualSeasonConfig {
    pub id: SeasonId,
    #[serde(default)]
    pub sections: Vec<ManualSectionConfig>,
}

/// Hand-maintained unlock rules, kept apart from the generated catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct UnlockConfig {
    pub seasons: Vec<ManualSeasonConfig>,
}

impl UnlockConfig {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            seasons: Vec::new(),
        }
    }

    /// Load unlock rules from a JSON array of season entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the configuration shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Rules keyed by the section they gate. Sections without a rule are omitted.
    #[must_use]
    pub fn rules_by_section(&self) -> HashMap<SectionId, UnlockRule> {
        self.seasons
            .iter()
            .flat_map(|season| &season.sections)
            .filter_map(|section| {
                section
                    .required_stage
                    .clone()
                    .map(|rule| (section.id, rule))
            })
            .collect()
    }
}
