//! Grid filter construction from completion state.
//!
//! The filter is a boolean expression tree; rows that satisfy it stay visible
//! and every other row is hidden. No expression at all means "show everything".
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::catalog::ChallengeTag;
use crate::completion::CompletedChallenges;
use crate::constants::{FIELD_ID, FIELD_SEASON_ID, FIELD_SECTION_ID, FIELD_STAGE_ID, FIELD_TAGS};
use crate::gating::{is_section_unlocked, next_stage};
use crate::id::Id;
use crate::index::{CatalogIndex, GridChallenge};

/// Which challenges the grid lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeVisibility {
    /// Everything, completed or not
    All,
    /// Hide completed work
    #[default]
    Incomplete,
}

/// How many stages per section the grid lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageVisibility {
    /// Only the current stage of each unlocked section
    #[default]
    Next,
    /// Every stage that is not complete
    Incomplete,
}

/// Display preferences driving the completion filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub challenges: ChallengeVisibility,
    #[serde(default)]
    pub stages: StageVisibility,
}

/// Row attribute a predicate inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    SeasonId,
    SectionId,
    StageId,
    Tags,
}

impl Field {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => FIELD_ID,
            Self::SeasonId => FIELD_SEASON_ID,
            Self::SectionId => FIELD_SECTION_ID,
            Self::StageId => FIELD_STAGE_ID,
            Self::Tags => FIELD_TAGS,
        }
    }

    /// The id column that holds values of the given granularity.
    const fn for_id(id: &Id) -> Self {
        match id {
            Id::Season(_) => Self::SeasonId,
            Id::Section(_) => Self::SectionId,
            Id::Stage(_) => Self::StageId,
            Id::Challenge(_) => Self::Id,
        }
    }

    fn read(self, row: &GridChallenge) -> Option<Id> {
        match self {
            Self::Id => Some(row.id().into()),
            Self::SeasonId => Some(row.season_id.into()),
            Self::SectionId => Some(row.section_id.into()),
            Self::StageId => Some(row.stage_id.into()),
            Self::Tags => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    NotEqual,
    Contains,
}

impl Comparison {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Contains => "contains",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterValue {
    Id(Id),
    Tag(ChallengeTag),
}

/// A single `field op value` test against a grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Predicate {
    field: Field,
    op: Comparison,
    value: FilterValue,
}

impl Predicate {
    /// Row's id column at this granularity equals `id`.
    #[must_use]
    pub fn equal(id: impl Into<Id>) -> Self {
        let id = id.into();
        Self {
            field: Field::for_id(&id),
            op: Comparison::Equal,
            value: FilterValue::Id(id),
        }
    }

    /// Row's id column at this granularity differs from `id`.
    #[must_use]
    pub fn not_equal(id: impl Into<Id>) -> Self {
        let id = id.into();
        Self {
            field: Field::for_id(&id),
            op: Comparison::NotEqual,
            value: FilterValue::Id(id),
        }
    }

    #[must_use]
    pub const fn has_tag(tag: ChallengeTag) -> Self {
        Self {
            field: Field::Tags,
            op: Comparison::Contains,
            value: FilterValue::Tag(tag),
        }
    }

    #[must_use]
    pub const fn field(&self) -> Field {
        self.field
    }

    #[must_use]
    pub const fn op(&self) -> Comparison {
        self.op
    }

    #[must_use]
    pub const fn value(&self) -> FilterValue {
        self.value
    }

    #[must_use]
    pub fn matches(&self, row: &GridChallenge) -> bool {
        match (self.op, self.value) {
            (Comparison::Contains, FilterValue::Tag(tag)) => row.has_tag(tag),
            (Comparison::Equal, FilterValue::Id(id)) => self.field.read(row) == Some(id),
            (Comparison::NotEqual, FilterValue::Id(id)) => self.field.read(row) != Some(id),
            _ => false,
        }
    }

    fn to_wire(self) -> Value {
        let value = match self.value {
            FilterValue::Id(Id::Season(season)) => json!(season.0),
            FilterValue::Id(id) => json!(id.to_string()),
            FilterValue::Tag(tag) => json!(tag.label()),
        };
        json!([self.field.name(), self.op.symbol(), value])
    }
}

/// Boolean expression over [`Predicate`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterExpr {
    Predicate(Predicate),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    #[must_use]
    pub fn equal(id: impl Into<Id>) -> Self {
        Self::Predicate(Predicate::equal(id))
    }

    #[must_use]
    pub fn not_equal(id: impl Into<Id>) -> Self {
        Self::Predicate(Predicate::not_equal(id))
    }

    #[must_use]
    pub const fn has_tag(tag: ChallengeTag) -> Self {
        Self::Predicate(Predicate::has_tag(tag))
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Conjunction of the clauses; `None` when there are none, the clause
    /// itself when there is exactly one.
    #[must_use]
    pub fn all_of(mut clauses: Vec<Self>) -> Option<Self> {
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Self::And(clauses)),
        }
    }

    /// Disjunction of the clauses, collapsing like [`FilterExpr::all_of`].
    #[must_use]
    pub fn any_of(mut clauses: Vec<Self>) -> Option<Self> {
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Self::Or(clauses)),
        }
    }

    #[must_use]
    pub fn matches(&self, row: &GridChallenge) -> bool {
        match self {
            Self::Predicate(predicate) => predicate.matches(row),
            Self::And(clauses) => clauses.iter().all(|clause| clause.matches(row)),
            Self::Or(clauses) => clauses.iter().any(|clause| clause.matches(row)),
            Self::Not(inner) => !inner.matches(row),
        }
    }

    /// Nested-array form understood by the grid: `[a, "and", b, "and", c]`,
    /// `["!", a]`, and `[field, op, value]` leaves.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Predicate(predicate) => predicate.to_wire(),
            Self::And(clauses) => join_wire(clauses, "and"),
            Self::Or(clauses) => join_wire(clauses, "or"),
            Self::Not(inner) => json!(["!", inner.to_wire()]),
        }
    }
}

fn join_wire(clauses: &[FilterExpr], connective: &str) -> Value {
    let mut items = Vec::with_capacity(clauses.len() * 2);
    for (pos, clause) in clauses.iter().enumerate() {
        if pos > 0 {
            items.push(json!(connective));
        }
        items.push(clause.to_wire());
    }
    Value::Array(items)
}

/// Visibility filter for the challenge grid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChallengeFilter {
    expr: Option<FilterExpr>,
}

impl ChallengeFilter {
    /// The filter that shows every row.
    #[must_use]
    pub const fn empty() -> Self {
        Self { expr: None }
    }

    #[must_use]
    pub const fn from_expr(expr: FilterExpr) -> Self {
        Self { expr: Some(expr) }
    }

    #[must_use]
    pub fn from_clauses(clauses: Vec<FilterExpr>) -> Self {
        Self {
            expr: FilterExpr::all_of(clauses),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    #[must_use]
    pub const fn expr(&self) -> Option<&FilterExpr> {
        self.expr.as_ref()
    }

    /// Conjoin with another filter, e.g. the grid's own column filter.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self.expr, other.expr) {
            (None, None) => Self::empty(),
            (Some(expr), None) | (None, Some(expr)) => Self::from_expr(expr),
            (Some(left), Some(right)) => Self::from_expr(FilterExpr::And(vec![left, right])),
        }
    }

    /// Restrict to challenges carrying `tag`.
    #[must_use]
    pub fn with_tag(self, tag: ChallengeTag) -> Self {
        self.and(Self::from_expr(FilterExpr::has_tag(tag)))
    }

    #[must_use]
    pub fn is_visible(&self, row: &GridChallenge) -> bool {
        self.expr.as_ref().is_none_or(|expr| expr.matches(row))
    }

    pub fn visible_rows<'a>(
        &'a self,
        index: &'a CatalogIndex,
    ) -> impl Iterator<Item = &'a GridChallenge> + 'a {
        index.rows().iter().filter(|row| self.is_visible(row))
    }

    /// Wire form; the empty filter renders as `[]`.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        self.expr
            .as_ref()
            .map_or_else(|| Value::Array(Vec::new()), FilterExpr::to_wire)
    }
}

/// Build the completion filter for the grid.
///
/// Clauses already implied by a completed ancestor are left out, and in
/// [`StageVisibility::Next`] mode only the first incomplete stage of every
/// unlocked, unfinished section stays visible.
#[must_use]
pub fn build_filter(
    completed: &CompletedChallenges,
    options: FilterOptions,
    index: &CatalogIndex,
) -> ChallengeFilter {
    if options.challenges == ChallengeVisibility::All {
        return ChallengeFilter::empty();
    }

    let mut clauses = Vec::new();

    clauses.extend(completed.season_ids().map(FilterExpr::not_equal));
    clauses.extend(
        completed
            .section_ids()
            .filter(|section| !completed.contains(section.season().into()))
            .map(FilterExpr::not_equal),
    );

    match options.stages {
        StageVisibility::Next => {
            let shown: Vec<FilterExpr> = index
                .seasons()
                .iter()
                .filter(|season| !completed.contains(season.id.into()))
                .flat_map(|season| &season.sections)
                .filter(|section| !completed.contains(section.id.into()))
                .filter(|section| is_section_unlocked(section, completed, index))
                .filter_map(|section| next_stage(section, completed))
                .map(|stage| FilterExpr::equal(stage.id))
                .collect();
            if let Some(stages) = FilterExpr::any_of(shown) {
                clauses.push(stages);
            }
        }
        StageVisibility::Incomplete => {
            clauses.extend(
                completed
                    .stage_ids()
                    .filter(|stage| !completed.is_covered(stage.section().into()))
                    .map(FilterExpr::not_equal),
            );
        }
    }

    clauses.extend(
        completed
            .challenge_ids()
            .filter(|challenge| !completed.is_covered(challenge.stage().into()))
            .map(FilterExpr::not_equal),
    );

    ChallengeFilter::from_clauses(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, UnlockConfig};
    use crate::id::{ChallengeId, SeasonId, SectionId, StageId};

    fn index() -> CatalogIndex {
        let catalog = Catalog::from_json(
            r#"[
                { "id": 1, "name": "Season I", "sections": [
                    { "id": "1.1", "name": "Opening", "stages": [
                        { "id": "1.1.1", "name": "Stage 1", "required": 2, "total": 3, "challenges": [
                            { "id": "1.1.1.1", "text": "a", "tags": ["Siege"] },
                            { "id": "1.1.1.2", "text": "b", "tags": ["Field"] },
                            { "id": "1.1.1.3", "text": "c", "tags": ["Siege", "Field"] }
                        ] },
                        { "id": "1.1.2", "name": "Stage 2", "required": 1, "total": 1, "challenges": [
                            { "id": "1.1.2.1", "text": "d", "tags": ["General"] }
                        ] }
                    ] }
                ] }
            ]"#,
        )
        .unwrap();
        CatalogIndex::build(catalog, &UnlockConfig::empty())
    }

    fn visible_ids(filter: &ChallengeFilter, index: &CatalogIndex) -> Vec<String> {
        filter
            .visible_rows(index)
            .map(|row| row.id().to_string())
            .collect()
    }

    #[test]
    fn all_mode_is_empty_regardless_of_progress() {
        let index = index();
        let mut done = CompletedChallenges::new();
        done.complete("1");
        done.complete("1.1.1.1");
        let options = FilterOptions {
            challenges: ChallengeVisibility::All,
            stages: StageVisibility::Incomplete,
        };
        let filter = build_filter(&done, options, &index);
        assert!(filter.is_empty());
        assert_eq!(filter.to_wire(), json!([]));
        assert_eq!(visible_ids(&filter, &index).len(), 4);
    }

    #[test]
    fn next_mode_shows_first_incomplete_stage() {
        let index = index();
        let filter = build_filter(
            &CompletedChallenges::new(),
            FilterOptions::default(),
            &index,
        );
        assert_eq!(filter.expr(), Some(&FilterExpr::equal(StageId::new(1, 1, 1))));
        assert_eq!(
            visible_ids(&filter, &index),
            vec!["1.1.1.1", "1.1.1.2", "1.1.1.3"]
        );
    }

    #[test]
    fn next_mode_advances_after_threshold() {
        let index = index();
        let mut done = CompletedChallenges::new();
        done.complete("1.1.1.1");
        done.complete("1.1.1.3");
        let filter = build_filter(&done, FilterOptions::default(), &index);
        assert_eq!(visible_ids(&filter, &index), vec!["1.1.2.1"]);
    }

    #[test]
    fn incomplete_mode_hides_completed_stages_and_challenges() {
        let index = index();
        let mut done = CompletedChallenges::new();
        done.complete("1.1.2");
        done.complete("1.1.1.2");
        let options = FilterOptions {
            challenges: ChallengeVisibility::Incomplete,
            stages: StageVisibility::Incomplete,
        };
        let filter = build_filter(&done, options, &index);
        assert_eq!(
            filter.expr(),
            Some(&FilterExpr::And(vec![
                FilterExpr::not_equal(StageId::new(1, 1, 2)),
                FilterExpr::not_equal(ChallengeId::new(1, 1, 1, 2)),
            ]))
        );
        assert_eq!(visible_ids(&filter, &index), vec!["1.1.1.1", "1.1.1.3"]);
    }

    #[test]
    fn wire_form_interleaves_connectives() {
        let expr = FilterExpr::And(vec![
            FilterExpr::not_equal(SeasonId(3)),
            FilterExpr::Or(vec![
                FilterExpr::equal(StageId::new(1, 1, 1)),
                FilterExpr::equal(StageId::new(2, 1, 1)),
            ]),
            FilterExpr::has_tag(ChallengeTag::OpenWorld).negate(),
        ]);
        assert_eq!(
            expr.to_wire(),
            json!([
                ["seasonId", "<>", 3],
                "and",
                [["stageId", "=", "1.1.1"], "or", ["stageId", "=", "2.1.1"]],
                "and",
                ["!", ["tags", "contains", "Open World"]]
            ])
        );
    }

    #[test]
    fn external_filter_is_conjoined() {
        let index = index();
        let mut done = CompletedChallenges::new();
        done.complete("1.1.1.1");
        let options = FilterOptions {
            challenges: ChallengeVisibility::Incomplete,
            stages: StageVisibility::Incomplete,
        };
        let filter = build_filter(&done, options, &index).with_tag(ChallengeTag::Siege);
        assert_eq!(visible_ids(&filter, &index), vec!["1.1.1.3"]);

        let only_tag = ChallengeFilter::empty().with_tag(ChallengeTag::General);
        assert_eq!(visible_ids(&only_tag, &index), vec!["1.1.2.1"]);
    }

    #[test]
    fn predicates_target_the_matching_column() {
        let index = index();
        let row = index.challenge(ChallengeId::new(1, 1, 2, 1)).unwrap();
        assert!(Predicate::equal(SectionId::new(1, 1)).matches(row));
        assert!(!Predicate::not_equal(SeasonId(1)).matches(row));
        assert_eq!(Predicate::equal(SeasonId(1)).field(), Field::SeasonId);
        assert_eq!(
            Predicate::not_equal(ChallengeId::new(1, 1, 2, 1)).field(),
            Field::Id
        );
        assert!(FilterExpr::has_tag(ChallengeTag::Siege).negate().matches(row));
    }
}
