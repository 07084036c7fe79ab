//! Worked scenarios for the filter, group, sort and colour stages.

use chrono::NaiveDate;
use gridview::{
    ColorMode, EvalContext, FieldRegistry, FilterCondition, FilterSet, Operator, Record,
    SortSpec, UNGROUPED, ViewState, group_by, sort_groups,
};

fn two_tasks() -> Vec<Record> {
    vec![
        Record::new("1").with("status", "Pending").with("priority", "High"),
        Record::new("2").with("status", "Approved").with("priority", "Low"),
    ]
}

fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn equals_filter_keeps_only_matching_record() {
    let registry = FieldRegistry::standard();
    let filters: FilterSet = vec![FilterCondition::new("status", Operator::Equals, "Approved")]
        .into_iter()
        .collect();
    let outcome = filters
        .apply(&two_tasks(), &registry, &EvalContext::default())
        .expect("filter");
    assert_eq!(ids(&outcome.records), vec!["2"]);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn grouping_by_status_keeps_first_seen_order() {
    let grouped = group_by(&two_tasks(), Some("status"), &FieldRegistry::standard()).expect("group");
    assert_eq!(grouped.keys(), vec!["Pending", "Approved"]);
    assert_eq!(ids(grouped.get("Pending").unwrap()), vec!["1"]);
    assert_eq!(ids(grouped.get("Approved").unwrap()), vec!["2"]);
}

#[test]
fn progress_sorts_both_directions() {
    let registry = FieldRegistry::standard();
    let records = vec![
        Record::new("a").with("progress", 50.0),
        Record::new("b").with("progress", 20.0),
        Record::new("c").with("progress", 90.0),
    ];
    let progress = |spec: SortSpec| -> Vec<String> {
        let grouped = group_by(&records, None, &registry).unwrap();
        let sorted = sort_groups(grouped, Some(&spec), &registry).unwrap();
        sorted
            .get(UNGROUPED)
            .unwrap()
            .iter()
            .map(|r| r.text_of("progress"))
            .collect()
    };
    assert_eq!(progress(SortSpec::asc("progress")), vec!["20", "50", "90"]);
    assert_eq!(progress(SortSpec::desc("progress")), vec!["90", "50", "20"]);
}

#[test]
fn rejected_status_uses_configured_color() {
    let mut view = ViewState::new();
    view.set_color_mode(ColorMode::Status);
    let record = Record::new("1").with("status", "Rejected");
    let color = view.color_for(&record).expect("status colour");
    assert_eq!(color.background_color, "#FEE2E2");
}

#[test]
fn before_filter_compares_calendar_days() {
    let registry = FieldRegistry::standard();
    let ctx = EvalContext::at(NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());
    let filters: FilterSet = vec![FilterCondition::new("dueDate", Operator::Before, "2024-11-01")]
        .into_iter()
        .collect();

    let early = Record::new("early").with("dueDate", "2024-10-25");
    let late = Record::new("late").with("dueDate", "2024-11-08");
    let outcome = filters.apply(&[early, late], &registry, &ctx).expect("filter");
    assert_eq!(ids(&outcome.records), vec!["early"]);
}
