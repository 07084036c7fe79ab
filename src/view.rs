use crate::coloring::{ColorConfig, ColorMode, ColorRule, Palette, RowColor, color_for};
use crate::error::Result;
use crate::field::FieldRegistry;
use crate::filter::{FilterCondition, FilterSet, FilterValue, Operator};
use crate::grouping::SortSpec;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration of one view: what is filtered, how rows are grouped and
/// sorted, which fields are hidden and how rows are coloured.
///
/// The state only holds configuration. Deriving rows from it is done by
/// [`crate::pipeline::project`] or by calling the stages directly. Every
/// mutator is a plain in-memory update; to share a state between threads,
/// put it behind a single lock.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    filters: FilterSet,
    search_query: String,
    group_by: Option<String>,
    sort_by: Option<SortSpec>,
    hidden_fields: BTreeSet<String>,
    color_mode: ColorMode,
    color_rules: Vec<ColorRule>,
    color_by_condition: bool,
    status_palette: Palette,
    priority_palette: Palette,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            filters: FilterSet::new(),
            search_query: String::new(),
            group_by: None,
            sort_by: None,
            hidden_fields: BTreeSet::new(),
            color_mode: ColorMode::None,
            color_rules: Vec::new(),
            color_by_condition: false,
            status_palette: Palette::default_status(),
            priority_palette: Palette::default_priority(),
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn group_by(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    pub fn sort_by(&self) -> Option<&SortSpec> {
        self.sort_by.as_ref()
    }

    pub fn hidden_fields(&self) -> &BTreeSet<String> {
        &self.hidden_fields
    }

    pub fn is_hidden(&self, field: &str) -> bool {
        self.hidden_fields.contains(field)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn color_rules(&self) -> &[ColorRule] {
        &self.color_rules
    }

    pub fn color_by_condition(&self) -> bool {
        self.color_by_condition
    }

    pub fn status_palette(&self) -> &Palette {
        &self.status_palette
    }

    pub fn priority_palette(&self) -> &Palette {
        &self.priority_palette
    }

    pub fn add_filter(&mut self, condition: FilterCondition) {
        self.filters.add(condition);
    }

    pub fn remove_filter(&mut self, id: &str) -> Option<FilterCondition> {
        self.filters.remove(id)
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Adds an `equals` condition on `field` and returns its id.
    pub fn add_quick_filter(&mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> String {
        let condition = FilterCondition::new(field, Operator::Equals, value);
        let id = condition.id.clone();
        self.filters.add(condition);
        id
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_group_by(&mut self, field: Option<String>) {
        self.group_by = field;
    }

    /// Replaces any previous sort.
    pub fn set_sort_by(&mut self, sort: Option<SortSpec>) {
        self.sort_by = sort;
    }

    /// Flips visibility of `field`; returns true when it is now hidden.
    pub fn toggle_field_visibility(&mut self, field: &str) -> bool {
        if self.hidden_fields.remove(field) {
            false
        } else {
            self.hidden_fields.insert(field.to_string());
            true
        }
    }

    pub fn add_color_rule(&mut self, rule: ColorRule) {
        self.color_rules.push(rule);
    }

    pub fn remove_color_rule(&mut self, id: &str) -> Option<ColorRule> {
        let pos = self.color_rules.iter().position(|r| r.id == id)?;
        Some(self.color_rules.remove(pos))
    }

    pub fn clear_color_rules(&mut self) {
        self.color_rules.clear();
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mode = mode;
    }

    pub fn set_color_by_condition(&mut self, enabled: bool) {
        self.color_by_condition = enabled;
    }

    pub fn set_status_color(&mut self, status: impl Into<String>, color: RowColor) {
        self.status_palette.set(status, color);
    }

    pub fn set_priority_color(&mut self, priority: impl Into<String>, color: RowColor) {
        self.priority_palette.set(priority, color);
    }

    pub fn reset_palettes(&mut self) {
        self.status_palette = Palette::default_status();
        self.priority_palette = Palette::default_priority();
    }

    pub fn color_config(&self) -> ColorConfig<'_> {
        ColorConfig {
            mode: self.color_mode,
            by_condition: self.color_by_condition,
            rules: &self.color_rules,
            status_palette: &self.status_palette,
            priority_palette: &self.priority_palette,
        }
    }

    pub fn color_for(&self, record: &Record) -> Option<RowColor> {
        color_for(record, &self.color_config())
    }

    /// Checks that the fields filters, grouping and sorting refer to are
    /// registered. Colour rules are left to [`ViewState::validate_colors`].
    pub fn validate(&self, registry: &FieldRegistry) -> Result<()> {
        for condition in self.filters.conditions() {
            registry.resolve(&condition.field)?;
        }
        if let Some(field) = &self.group_by {
            registry.resolve(field)?;
        }
        if let Some(sort) = &self.sort_by {
            registry.resolve(&sort.field)?;
        }
        Ok(())
    }

    /// Checks colour rule fields. `id` is always accepted.
    pub fn validate_colors(&self, registry: &FieldRegistry) -> Result<()> {
        for rule in &self.color_rules {
            if rule.field != "id" {
                registry.resolve(&rule.field)?;
            }
        }
        Ok(())
    }

    /// Fields of `registry` not hidden in this view, in catalog order.
    pub fn visible_fields<'a>(&self, registry: &'a FieldRegistry) -> Vec<&'a str> {
        registry
            .fields()
            .iter()
            .filter(|f| !self.is_hidden(&f.id))
            .map(|f| f.id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring::RuleCondition;
    use crate::error::ViewError;

    #[test]
    fn quick_filter_synthesizes_equals() {
        let mut state = ViewState::new();
        let id = state.add_quick_filter("status", "Approved");
        let condition = &state.filters().conditions()[0];
        assert_eq!(condition.id, id);
        assert_eq!(condition.operator, Operator::Equals);
        assert_eq!(condition.value, FilterValue::from("Approved"));
        assert!(state.remove_filter(&id).is_some());
        assert!(state.filters().is_empty());
    }

    #[test]
    fn toggling_visibility_twice_restores_field() {
        let mut state = ViewState::new();
        assert!(state.toggle_field_visibility("assignee"));
        assert!(state.is_hidden("assignee"));
        assert!(!state.toggle_field_visibility("assignee"));
        assert!(state.hidden_fields().is_empty());
    }

    #[test]
    fn sort_spec_is_replaced() {
        let mut state = ViewState::new();
        state.set_sort_by(Some(SortSpec::asc("progress")));
        state.set_sort_by(Some(SortSpec::desc("dueDate")));
        assert_eq!(state.sort_by(), Some(&SortSpec::desc("dueDate")));
        state.set_sort_by(None);
        assert!(state.sort_by().is_none());
    }

    #[test]
    fn palette_overrides_apply_to_color_for() {
        let mut state = ViewState::new();
        state.set_color_mode(ColorMode::Status);
        state.set_status_color("Rejected", RowColor::new("#000000", "#FFFFFF"));
        let r = Record::new("1").with("status", "Rejected");
        assert_eq!(state.color_for(&r).unwrap().background_color, "#000000");
        state.reset_palettes();
        assert_eq!(state.color_for(&r).unwrap().background_color, "#FEE2E2");
    }

    #[test]
    fn color_rule_mutators() {
        let mut state = ViewState::new();
        let rule = ColorRule::new("name", RuleCondition::Equals, "x", "#000", "#fff");
        let id = rule.id.clone();
        state.add_color_rule(rule);
        state.add_color_rule(ColorRule::new("name", RuleCondition::Equals, "y", "#000", "#eee"));
        assert_eq!(state.remove_color_rule(&id).map(|r| r.value), Some("x".to_string()));
        state.clear_color_rules();
        assert!(state.color_rules().is_empty());
    }

    #[test]
    fn validate_reports_unknown_fields() {
        let registry = FieldRegistry::standard();
        let mut state = ViewState::new();
        state.set_group_by(Some("status".to_string()));
        assert!(state.validate(&registry).is_ok());
        state.set_sort_by(Some(SortSpec::asc("mood")));
        assert!(matches!(
            state.validate(&registry),
            Err(ViewError::UnknownField { field }) if field == "mood"
        ));
    }

    #[test]
    fn colour_rules_are_validated_separately() {
        let registry = FieldRegistry::standard();
        let mut state = ViewState::new();
        state.add_color_rule(ColorRule::new("tag", RuleCondition::Equals, "x", "#111827", "#FEE2E2"));
        assert!(state.validate(&registry).is_ok());
        assert!(matches!(
            state.validate_colors(&registry),
            Err(ViewError::UnknownField { field }) if field == "tag"
        ));
    }

    #[test]
    fn state_round_trips_through_json_with_camel_case_keys() {
        let mut state = ViewState::new();
        state.set_search_query("site");
        state.set_color_by_condition(true);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["searchQuery"], "site");
        assert_eq!(json["colorByCondition"], true);
        let back: ViewState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
