//! Hierarchical challenge-tree identifiers.
//! Format: dotted integers `<SEASON>[.<SECTION>[.<STAGE>[.<CHALLENGE>]]]`, e.g. `3`, `3.1`, `3.1.2`, `3.1.2.5`

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One to four canonical decimal components separated by dots.
static ID_SHAPE: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^(?:0|[1-9][0-9]*)(?:\.(?:0|[1-9][0-9]*)){0,3}$")
        .expect("identifier pattern is a valid regex")
});

/// Numeric components of an identifier, coarsest first.
pub type Components = SmallVec<[u32; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
    #[error("identifier `{id}` is a {found} id, expected a {expected} id")]
    UnexpectedKind {
        id: String,
        expected: IdKind,
        found: IdKind,
    },
}

/// Granularity of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdKind {
    Season,
    Section,
    Stage,
    Challenge,
}

impl IdKind {
    /// Number of dotted components an id of this kind carries.
    #[must_use]
    pub const fn depth(self) -> usize {
        match self {
            Self::Season => 1,
            Self::Section => 2,
            Self::Stage => 3,
            Self::Challenge => 4,
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Season => write!(f, "season"),
            Self::Section => write!(f, "section"),
            Self::Stage => write!(f, "stage"),
            Self::Challenge => write!(f, "challenge"),
        }
    }
}

/// Season id. Serialized as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonId(pub u32);

/// Section id, `season.section`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionId {
    season: SeasonId,
    section: u32,
}

/// Stage id, `season.section.stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StageId {
    section: SectionId,
    stage: u32,
}

/// Challenge id, `season.section.stage.challenge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChallengeId {
    stage: StageId,
    challenge: u32,
}

impl SeasonId {
    #[must_use]
    pub const fn section(self, section: u32) -> SectionId {
        SectionId {
            season: self,
            section,
        }
    }
}

impl SectionId {
    #[must_use]
    pub const fn new(season: u32, section: u32) -> Self {
        SeasonId(season).section(section)
    }

    #[must_use]
    pub const fn season(self) -> SeasonId {
        self.season
    }

    /// Position of the section within its season.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.section
    }

    #[must_use]
    pub const fn stage(self, stage: u32) -> StageId {
        StageId {
            section: self,
            stage,
        }
    }
}

impl StageId {
    #[must_use]
    pub const fn new(season: u32, section: u32, stage: u32) -> Self {
        SectionId::new(season, section).stage(stage)
    }

    #[must_use]
    pub const fn season(self) -> SeasonId {
        self.section.season
    }

    #[must_use]
    pub const fn section(self) -> SectionId {
        self.section
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.stage
    }

    #[must_use]
    pub const fn challenge(self, challenge: u32) -> ChallengeId {
        ChallengeId {
            stage: self,
            challenge,
        }
    }
}

impl ChallengeId {
    #[must_use]
    pub const fn new(season: u32, section: u32, stage: u32, challenge: u32) -> Self {
        StageId::new(season, section, stage).challenge(challenge)
    }

    #[must_use]
    pub const fn season(self) -> SeasonId {
        self.stage.section.season
    }

    #[must_use]
    pub const fn section(self) -> SectionId {
        self.stage.section
    }

    #[must_use]
    pub const fn stage(self) -> StageId {
        self.stage
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.challenge
    }
}

/// A classified identifier of any granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Id {
    Season(SeasonId),
    Section(SectionId),
    Stage(StageId),
    Challenge(ChallengeId),
}

impl Id {
    /// Classify a raw identifier by its component count.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidIdentifier`] when the string is not one to four
    /// dot-separated canonical integers, or a component overflows `u32`.
    pub fn classify(raw: &str) -> Result<Self, IdError> {
        let invalid = || IdError::InvalidIdentifier(raw.to_string());
        if !ID_SHAPE.is_match(raw) {
            return Err(invalid());
        }
        let parts = raw
            .split('.')
            .map(str::parse::<u32>)
            .collect::<Result<Components, _>>()
            .map_err(|_| invalid())?;
        Self::from_components(&parts).ok_or_else(invalid)
    }

    /// Build an id from its components. `None` for an empty slice or more than four parts.
    #[must_use]
    pub fn from_components(parts: &[u32]) -> Option<Self> {
        match *parts {
            [season] => Some(Self::Season(SeasonId(season))),
            [season, section] => Some(Self::Section(SectionId::new(season, section))),
            [season, section, stage] => Some(Self::Stage(StageId::new(season, section, stage))),
            [season, section, stage, challenge] => Some(Self::Challenge(ChallengeId::new(
                season, section, stage, challenge,
            ))),
            _ => None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> IdKind {
        match self {
            Self::Season(_) => IdKind::Season,
            Self::Section(_) => IdKind::Section,
            Self::Stage(_) => IdKind::Stage,
            Self::Challenge(_) => IdKind::Challenge,
        }
    }

    #[must_use]
    pub fn components(&self) -> Components {
        match *self {
            Self::Season(season) => smallvec::smallvec![season.0],
            Self::Section(section) => smallvec::smallvec![section.season.0, section.section],
            Self::Stage(stage) => {
                let mut parts = Self::Section(stage.section).components();
                parts.push(stage.stage);
                parts
            }
            Self::Challenge(challenge) => {
                let mut parts = Self::Stage(challenge.stage).components();
                parts.push(challenge.challenge);
                parts
            }
        }
    }

    /// Every id carries its season.
    #[must_use]
    pub const fn ancestor_season(&self) -> SeasonId {
        match self {
            Self::Season(season) => *season,
            Self::Section(section) => section.season(),
            Self::Stage(stage) => stage.season(),
            Self::Challenge(challenge) => challenge.season(),
        }
    }

    /// # Errors
    ///
    /// Returns [`IdError::InvalidIdentifier`] for a season id.
    pub fn ancestor_section(&self) -> Result<SectionId, IdError> {
        match self {
            Self::Season(_) => Err(IdError::InvalidIdentifier(self.to_string())),
            Self::Section(section) => Ok(*section),
            Self::Stage(stage) => Ok(stage.section()),
            Self::Challenge(challenge) => Ok(challenge.section()),
        }
    }

    /// # Errors
    ///
    /// Returns [`IdError::InvalidIdentifier`] for a season or section id.
    pub fn ancestor_stage(&self) -> Result<StageId, IdError> {
        match self {
            Self::Season(_) | Self::Section(_) => Err(IdError::InvalidIdentifier(self.to_string())),
            Self::Stage(stage) => Ok(*stage),
            Self::Challenge(challenge) => Ok(challenge.stage()),
        }
    }

    /// True when `self` lies strictly beneath `ancestor` in the tree.
    ///
    /// Matching is per component, so season `1` is not an ancestor of `10.1`.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &Self) -> bool {
        let own = self.components();
        let parent = ancestor.components();
        own.len() > parent.len() && own.starts_with(&parent)
    }
}

/// Season component of a raw id.
///
/// # Errors
///
/// Returns [`IdError::InvalidIdentifier`] when `raw` does not classify.
pub fn season_id_from(raw: &str) -> Result<SeasonId, IdError> {
    Id::classify(raw).map(|id| id.ancestor_season())
}

/// Section prefix of a raw id.
///
/// # Errors
///
/// Returns [`IdError::InvalidIdentifier`] when `raw` does not classify or is a season id.
pub fn section_id_from(raw: &str) -> Result<SectionId, IdError> {
    Id::classify(raw)?.ancestor_section()
}

/// Stage prefix of a raw id.
///
/// # Errors
///
/// Returns [`IdError::InvalidIdentifier`] when `raw` does not classify or has fewer than three components.
pub fn stage_id_from(raw: &str) -> Result<StageId, IdError> {
    Id::classify(raw)?.ancestor_stage()
}

impl fmt::Display for SeasonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.season, self.section)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.stage)
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stage, self.challenge)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Season(id) => fmt::Display::fmt(id, f),
            Self::Section(id) => fmt::Display::fmt(id, f),
            Self::Stage(id) => fmt::Display::fmt(id, f),
            Self::Challenge(id) => fmt::Display::fmt(id, f),
        }
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::classify(s)
    }
}

impl From<u32> for Id {
    fn from(season: u32) -> Self {
        Self::Season(SeasonId(season))
    }
}

impl From<SeasonId> for Id {
    fn from(id: SeasonId) -> Self {
        Self::Season(id)
    }
}

impl From<SectionId> for Id {
    fn from(id: SectionId) -> Self {
        Self::Section(id)
    }
}

impl From<StageId> for Id {
    fn from(id: StageId) -> Self {
        Self::Stage(id)
    }
}

impl From<ChallengeId> for Id {
    fn from(id: ChallengeId) -> Self {
        Self::Challenge(id)
    }
}

/// String parsing and serde glue for the dotted id types.
macro_rules! dotted_id {
    ($ty:ident, $kind:ident) => {
        impl FromStr for $ty {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match Id::classify(s)? {
                    Id::$kind(id) => Ok(id),
                    other => Err(IdError::UnexpectedKind {
                        id: s.to_string(),
                        expected: IdKind::$kind,
                        found: other.kind(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $ty {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> Self {
                id.to_string()
            }
        }
    };
}

dotted_id!(SectionId, Section);
dotted_id!(StageId, Stage);
dotted_id!(ChallengeId, Challenge);

impl FromStr for SeasonId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Id::classify(s)? {
            Id::Season(id) => Ok(id),
            other => Err(IdError::UnexpectedKind {
                id: s.to_string(),
                expected: IdKind::Season,
                found: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_component_count() {
        assert_eq!(Id::classify("3").unwrap(), Id::Season(SeasonId(3)));
        assert_eq!(
            Id::classify("3.1").unwrap(),
            Id::Section(SectionId::new(3, 1))
        );
        assert_eq!(
            Id::classify("3.1.2").unwrap(),
            Id::Stage(StageId::new(3, 1, 2))
        );
        assert_eq!(
            Id::classify("3.1.2.5").unwrap(),
            Id::Challenge(ChallengeId::new(3, 1, 2, 5))
        );
        assert_eq!(Id::from(7), Id::Season(SeasonId(7)));
    }

    #[test]
    fn classify_roundtrips_canonical_ids() {
        for raw in ["0", "12", "1.0", "10.4", "2.3.11", "1.2.3.20", "4294967295.1"] {
            let id = Id::classify(raw).unwrap();
            assert_eq!(id.to_string(), raw);
            assert_eq!(Id::from_components(&id.components()), Some(id));
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in [
            "",
            ".",
            "1.",
            ".1",
            "1..2",
            "1.2.3.4.5",
            "a",
            "1.b",
            "-1",
            "+1",
            "01",
            "1.02",
            " 1",
            "1.2 ",
            "4294967296",
        ] {
            assert!(
                matches!(Id::classify(raw), Err(IdError::InvalidIdentifier(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn ancestors_require_enough_components() {
        let challenge = Id::classify("3.1.2.5").unwrap();
        assert_eq!(challenge.ancestor_season(), SeasonId(3));
        assert_eq!(challenge.ancestor_section().unwrap(), SectionId::new(3, 1));
        assert_eq!(challenge.ancestor_stage().unwrap(), StageId::new(3, 1, 2));

        let season = Id::classify("3").unwrap();
        assert!(season.ancestor_section().is_err());
        assert!(season.ancestor_stage().is_err());
        assert!(Id::classify("3.1").unwrap().ancestor_stage().is_err());

        assert_eq!(season_id_from("4.2.1").unwrap(), SeasonId(4));
        assert_eq!(section_id_from("4.2.1").unwrap(), SectionId::new(4, 2));
        assert_eq!(stage_id_from("4.2.1.9").unwrap(), StageId::new(4, 2, 1));
        assert!(stage_id_from("4.2").is_err());
        assert!(section_id_from("x").is_err());
    }

    #[test]
    fn descendant_check_respects_component_boundaries() {
        let one = Id::classify("1").unwrap();
        let ten_one = Id::classify("10.1").unwrap();
        // A plain string prefix test would wrongly report `10.1` as under season `1`.
        assert!("10.1".starts_with("1"));
        assert!(!ten_one.is_descendant_of(&one));

        let one_one = Id::classify("1.1").unwrap();
        assert!(one_one.is_descendant_of(&one));
        assert!(Id::classify("1.1.2.3").unwrap().is_descendant_of(&one_one));
        assert!(!Id::classify("1.11.2").unwrap().is_descendant_of(&one_one));
        assert!(!one.is_descendant_of(&one));
        assert!(!one.is_descendant_of(&one_one));
    }

    #[test]
    fn typed_parsing_reports_wrong_kind() {
        assert_eq!("2.1".parse::<SectionId>().unwrap(), SectionId::new(2, 1));
        let err = "2.1.1".parse::<SectionId>().unwrap_err();
        assert_eq!(
            err,
            IdError::UnexpectedKind {
                id: "2.1.1".to_string(),
                expected: IdKind::Section,
                found: IdKind::Stage,
            }
        );
        assert!("2".parse::<ChallengeId>().is_err());
        assert_eq!("9".parse::<SeasonId>().unwrap(), SeasonId(9));
    }

    #[test]
    fn serde_uses_numbers_for_seasons_and_strings_otherwise() {
        assert_eq!(serde_json::to_string(&SeasonId(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&StageId::new(3, 1, 2)).unwrap(),
            "\"3.1.2\""
        );
        let parsed: ChallengeId = serde_json::from_str("\"3.1.2.5\"").unwrap();
        assert_eq!(parsed, ChallengeId::new(3, 1, 2, 5));
        assert!(serde_json::from_str::<StageId>("\"3.1\"").is_err());
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        let mut ids = vec![
            StageId::new(1, 1, 10),
            StageId::new(1, 1, 2),
            StageId::new(1, 2, 1),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                StageId::new(1, 1, 2),
                StageId::new(1, 1, 10),
                StageId::new(1, 2, 1)
            ]
        );
    }
}
