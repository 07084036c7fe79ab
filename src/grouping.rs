use crate::error::Result;
use crate::field::{FieldRegistry, FieldType};
use crate::record::Record;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Key of the single group produced when no grouping field is set.
pub const UNGROUPED: &str = "ungrouped";

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub key: String,
    pub records: Vec<Record>,
}

/// Groups in first-seen key order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupedRecords {
    groups: Vec<Group>,
}

impl GroupedRecords {
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn get(&self, key: &str) -> Option<&[Record]> {
        self.groups
            .iter()
            .find(|g| g.key == key)
            .map(|g| g.records.as_slice())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    /// Concatenation of every group's members, in group order.
    pub fn into_records(self) -> Vec<Record> {
        self.groups.into_iter().flat_map(|g| g.records).collect()
    }
}

impl IntoIterator for GroupedRecords {
    type Item = Group;
    type IntoIter = std::vec::IntoIter<Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Partitions `records` by the text of `field`, keeping the order in which
/// distinct keys are first met. With no field every record lands in one
/// [`UNGROUPED`] group. An empty input yields no groups at all.
pub fn group_by(
    records: &[Record],
    field: Option<&str>,
    registry: &FieldRegistry,
) -> Result<GroupedRecords> {
    if records.is_empty() {
        if let Some(field) = field {
            registry.resolve(field)?;
        }
        return Ok(GroupedRecords::default());
    }

    let Some(field) = field else {
        return Ok(GroupedRecords {
            groups: vec![Group {
                key: UNGROUPED.to_string(),
                records: records.to_vec(),
            }],
        });
    };
    registry.resolve(field)?;

    let mut groups: Vec<Group> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for record in records {
        let key = record.text_of(field);
        match slots.get(&key) {
            Some(&slot) => groups[slot].records.push(record.clone()),
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    records: vec![record.clone()],
                });
            }
        }
    }

    Ok(GroupedRecords { groups })
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        SortSpec {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        SortSpec {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

// Values that do not coerce to the field type order before all others.
#[derive(Debug)]
enum SortKey {
    Missing,
    Text { folded: String, raw: String },
    Number(f64),
    Date(NaiveDate),
}

impl SortKey {
    fn of(record: &Record, field: &str, semantic_type: FieldType) -> SortKey {
        let Some(value) = record.get(field) else {
            return SortKey::Missing;
        };
        let key = match semantic_type {
            FieldType::Text | FieldType::Select => {
                let raw = value.display();
                Some(SortKey::Text {
                    folded: raw.to_lowercase(),
                    raw,
                })
            }
            FieldType::Number => value.as_number().map(SortKey::Number),
            FieldType::Date => value.as_date().map(SortKey::Date),
        };
        key.unwrap_or_else(|| {
            warn!(
                "record {} has {} value '{}' in '{}', sorting it first",
                record.id,
                semantic_type,
                value.display(),
                field
            );
            SortKey::Missing
        })
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
            (SortKey::Missing, _) => Ordering::Less,
            (_, SortKey::Missing) => Ordering::Greater,
            (
                SortKey::Text { folded: a, raw: ra },
                SortKey::Text { folded: b, raw: rb },
            ) => a.cmp(b).then_with(|| ra.cmp(rb)),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Sorts the members of each group independently. Group order is untouched.
///
/// `slice::sort_by` is a stable merge sort, so records with equal keys keep
/// their relative order in both directions; `Desc` flips the comparison
/// rather than the output.
pub fn sort_groups(
    grouped: GroupedRecords,
    sort: Option<&SortSpec>,
    registry: &FieldRegistry,
) -> Result<GroupedRecords> {
    let Some(spec) = sort else {
        return Ok(grouped);
    };
    let semantic_type = registry.resolve(&spec.field)?.semantic_type;

    let groups = grouped
        .groups
        .into_iter()
        .map(|group| {
            let mut keyed: Vec<(SortKey, Record)> = group
                .records
                .into_iter()
                .map(|r| (SortKey::of(&r, &spec.field, semantic_type), r))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| match spec.direction {
                SortDirection::Asc => a.compare(b),
                SortDirection::Desc => b.compare(a),
            });
            Group {
                key: group.key,
                records: keyed.into_iter().map(|(_, r)| r).collect(),
            }
        })
        .collect();

    Ok(GroupedRecords { groups })
}

/// Cross-group ordering. Never applied by the pipeline unless asked for.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GroupOrder {
    #[default]
    FirstSeen,
    KeyAscending,
    KeyDescending,
    LargestFirst,
}

pub fn order_groups(mut grouped: GroupedRecords, order: GroupOrder) -> GroupedRecords {
    match order {
        GroupOrder::FirstSeen => {}
        GroupOrder::KeyAscending => grouped.groups.sort_by(|a, b| a.key.cmp(&b.key)),
        GroupOrder::KeyDescending => grouped.groups.sort_by(|a, b| b.key.cmp(&a.key)),
        GroupOrder::LargestFirst => grouped
            .groups
            .sort_by(|a, b| b.records.len().cmp(&a.records.len())),
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewError;

    fn tasks() -> Vec<Record> {
        vec![
            Record::new("1").with("status", "Pending").with("progress", 50.0),
            Record::new("2").with("status", "Approved").with("progress", 20.0),
            Record::new("3").with("status", "Pending").with("progress", 90.0),
            Record::new("4").with("progress", 20.0),
        ]
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let grouped = group_by(&tasks(), Some("status"), &FieldRegistry::standard()).unwrap();
        assert_eq!(grouped.keys(), vec!["Pending", "Approved", ""]);
        assert_eq!(ids(grouped.get("Pending").unwrap()), vec!["1", "3"]);
        assert_eq!(grouped.record_count(), 4);
    }

    #[test]
    fn no_field_means_one_group() {
        let grouped = group_by(&tasks(), None, &FieldRegistry::standard()).unwrap();
        assert_eq!(grouped.keys(), vec![UNGROUPED]);
        assert_eq!(ids(grouped.get(UNGROUPED).unwrap()), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        let registry = FieldRegistry::standard();
        assert!(group_by(&[], None, &registry).unwrap().is_empty());
        assert!(group_by(&[], Some("status"), &registry).unwrap().is_empty());
        assert!(matches!(
            group_by(&[], Some("mood"), &registry),
            Err(ViewError::UnknownField { .. })
        ));
    }

    #[test]
    fn sort_is_per_group_and_stable() {
        let registry = FieldRegistry::standard();
        let grouped = group_by(&tasks(), None, &registry).unwrap();
        let sorted = sort_groups(grouped.clone(), Some(&SortSpec::asc("progress")), &registry).unwrap();
        assert_eq!(ids(sorted.get(UNGROUPED).unwrap()), vec!["2", "4", "1", "3"]);
        let sorted = sort_groups(grouped, Some(&SortSpec::desc("progress")), &registry).unwrap();
        assert_eq!(ids(sorted.get(UNGROUPED).unwrap()), vec!["3", "1", "2", "4"]);
    }

    #[test]
    fn missing_values_lead_ascending() {
        let registry = FieldRegistry::standard();
        let records = vec![
            Record::new("a").with("name", "beta"),
            Record::new("b"),
            Record::new("c").with("name", "Alpha"),
        ];
        let grouped = group_by(&records, None, &registry).unwrap();
        let sorted = sort_groups(grouped, Some(&SortSpec::asc("name")), &registry).unwrap();
        assert_eq!(ids(sorted.get(UNGROUPED).unwrap()), vec!["b", "c", "a"]);
    }

    #[test]
    fn group_order_is_opt_in() {
        let registry = FieldRegistry::standard();
        let grouped = group_by(&tasks(), Some("status"), &registry).unwrap();
        let by_key = order_groups(grouped.clone(), GroupOrder::KeyAscending);
        assert_eq!(by_key.keys(), vec!["", "Approved", "Pending"]);
        let by_size = order_groups(grouped, GroupOrder::LargestFirst);
        assert_eq!(by_size.keys()[0], "Pending");
    }
}
