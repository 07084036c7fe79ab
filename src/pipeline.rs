//! Drives one pass of the view: search, filters, grouping, then sorting.

use crate::error::Result;
use crate::field::FieldRegistry;
use crate::filter::{EvalContext, FilterWarning, search_records};
use crate::grouping::{GroupedRecords, group_by, sort_groups};
use crate::record::Record;
use crate::view::ViewState;
use log::debug;

/// What the grid should show for a projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionStatus {
    Rows,
    /// The filters legitimately matched nothing.
    NoMatches,
    /// At least one condition was skipped; rows may include records the
    /// user meant to filter out.
    Degraded,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub groups: GroupedRecords,
    pub warnings: Vec<FilterWarning>,
    /// Records handed in, before search and filters.
    pub total: usize,
}

impl Projection {
    pub fn status(&self) -> ProjectionStatus {
        if !self.warnings.is_empty() {
            ProjectionStatus::Degraded
        } else if self.groups.record_count() == 0 {
            ProjectionStatus::NoMatches
        } else {
            ProjectionStatus::Rows
        }
    }

    pub fn matched(&self) -> usize {
        self.groups.record_count()
    }
}

/// Runs the pipeline for `state` over `records`.
///
/// Unknown fields anywhere in the state abort the pass; comparison problems
/// in single conditions are carried in [`Projection::warnings`].
pub fn project(
    state: &ViewState,
    records: &[Record],
    registry: &FieldRegistry,
    ctx: &EvalContext,
) -> Result<Projection> {
    state.validate(registry)?;

    let searched = search_records(records, state.search_query());
    let filtered = state.filters().apply(&searched, registry, ctx)?;
    debug!(
        "view pass: {} records, {} after search, {} after {} filters",
        records.len(),
        searched.len(),
        filtered.records.len(),
        state.filters().len()
    );

    let grouped = group_by(&filtered.records, state.group_by(), registry)?;
    let groups = sort_groups(grouped, state.sort_by(), registry)?;

    Ok(Projection {
        groups,
        warnings: filtered.warnings,
        total: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring::{ColorRule, RuleCondition};
    use crate::filter::{FilterCondition, Operator};
    use crate::grouping::SortSpec;

    fn records() -> Vec<Record> {
        vec![
            Record::new("1").with("name", "Site redesign").with("status", "Pending").with("progress", 50.0),
            Record::new("2").with("name", "Site audit").with("status", "Approved").with("progress", 20.0),
            Record::new("3").with("name", "Hiring").with("status", "Pending").with("progress", 90.0),
        ]
    }

    #[test]
    fn full_pass_searches_filters_groups_and_sorts() {
        let registry = FieldRegistry::standard();
        let mut state = ViewState::new();
        state.set_search_query("site");
        state.add_filter(FilterCondition::new("progress", Operator::GreaterEqual, 10.0));
        state.set_group_by(Some("status".to_string()));
        state.set_sort_by(Some(SortSpec::desc("progress")));

        let projection = project(&state, &records(), &registry, &EvalContext::default()).unwrap();
        assert_eq!(projection.status(), ProjectionStatus::Rows);
        assert_eq!(projection.groups.keys(), vec!["Pending", "Approved"]);
        assert_eq!(projection.matched(), 2);
        assert_eq!(projection.total, 3);
    }

    #[test]
    fn status_distinguishes_empty_from_degraded() {
        let registry = FieldRegistry::standard();
        let mut state = ViewState::new();
        state.add_quick_filter("status", "Rejected");
        let projection = project(&state, &records(), &registry, &EvalContext::default()).unwrap();
        assert_eq!(projection.status(), ProjectionStatus::NoMatches);

        let mut state = ViewState::new();
        state.add_filter(FilterCondition::new("progress", Operator::LessThan, "some"));
        let projection = project(&state, &records(), &registry, &EvalContext::default()).unwrap();
        assert_eq!(projection.status(), ProjectionStatus::Degraded);
        assert_eq!(projection.matched(), 3);
    }

    #[test]
    fn colour_rule_on_unregistered_field_does_not_fail_the_pass() {
        let registry = FieldRegistry::standard();
        let mut state = ViewState::new();
        state.add_quick_filter("status", "Approved");
        state.add_color_rule(ColorRule::new("tag", RuleCondition::Equals, "x", "#111827", "#FEE2E2"));
        state.set_color_by_condition(true);
        let projection = project(&state, &records(), &registry, &EvalContext::default()).unwrap();
        assert_eq!(projection.matched(), 1);
    }
}
