use chrono::NaiveDate;
use gridview::loader::{from_csv, from_json, load_records};
use gridview::{EvalContext, FieldRegistry, FilterSet, Value, ViewError};
use gridview::{FilterCondition, Operator};
use std::fs;

#[test]
fn json_records_are_typed_by_registry() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("tasks.json");
    fs::write(
        &path,
        r#"[
            {"id": 1, "name": "Launch", "status": "Pending", "progress": "40", "dueDate": "2024-10-25", "notes": null},
            {"id": "b", "name": "Audit", "progress": 75, "dueDate": "someday", "flagged": true}
        ]"#,
    )
    .unwrap();

    let records = from_json(&path, &FieldRegistry::standard()).expect("load");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "1");
    assert_eq!(records[0].get("progress"), Some(&Value::Number(40.0)));
    assert_eq!(
        records[0].get("dueDate"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 10, 25).unwrap()))
    );
    assert!(records[0].get("notes").is_none());
    assert_eq!(records[1].get("dueDate"), Some(&Value::text("someday")));
    assert_eq!(records[1].text_of("flagged"), "true");
}

#[test]
fn json_without_ids_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"[{"name": "no id"}]"#).unwrap();
    assert!(matches!(
        from_json(&path, &FieldRegistry::standard()),
        Err(ViewError::Load { .. })
    ));
}

#[test]
fn csv_records_use_header_names() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("tasks.csv");
    fs::write(
        &path,
        "id,name,status,progress\n1,\"Launch, phase 2\",Pending,50\n2,Audit,,20\n",
    )
    .unwrap();

    let records = load_records(&path, &FieldRegistry::standard()).expect("load");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text_of("name"), "Launch, phase 2");
    assert_eq!(records[0].get("progress"), Some(&Value::Number(50.0)));
    assert!(records[1].get("status").is_none());

    fs::write(&path, "name,status\nx,y\n").unwrap();
    assert!(from_csv(&path, &FieldRegistry::standard()).is_err());
}

#[test]
fn unsupported_extension_is_rejected() {
    let err = load_records("tasks.xlsx", &FieldRegistry::standard()).unwrap_err();
    assert!(err.to_string().contains("unsupported file extension"));
}

#[test]
fn blank_json_and_csv_cells_filter_the_same_way() {
    let dir = tempfile::tempdir().expect("temp dir");
    let json = dir.path().join("tasks.json");
    let csv = dir.path().join("tasks.csv");
    fs::write(
        &json,
        r#"[{"id": "1", "progress": 10}, {"id": "2", "progress": 90}, {"id": "3", "progress": ""}]"#,
    )
    .unwrap();
    fs::write(&csv, "id,progress\n1,10\n2,90\n3,\n").unwrap();

    let registry = FieldRegistry::standard();
    let filters: FilterSet =
        std::iter::once(FilterCondition::new("progress", Operator::GreaterThan, 50.0)).collect();
    let ctx = EvalContext::default();

    for path in [&json, &csv] {
        let records = load_records(path, &registry).expect("load");
        let outcome = filters.apply(&records, &registry, &ctx).expect("filter");
        let ids: Vec<_> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2"], "{}", path.display());
        assert!(outcome.warnings.is_empty());
    }
}
