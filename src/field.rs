use crate::error::{Result, ViewError};
use crate::filter::Operator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Semantic type of a field. Decides which operators apply and how
/// comparison values are coerced.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Select,
    Date,
    Number,
}

const TEXT_OPERATORS: &[Operator] = &[
    Operator::Contains,
    Operator::NotContains,
    Operator::Equals,
    Operator::NotEquals,
    Operator::Empty,
    Operator::NotEmpty,
];

const SELECT_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::In,
    Operator::NotIn,
];

const DATE_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::Before,
    Operator::After,
    Operator::OnOrBefore,
    Operator::OnOrAfter,
    Operator::WithinDays,
];

const NUMBER_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::GreaterThan,
    Operator::LessThan,
    Operator::GreaterEqual,
    Operator::LessEqual,
];

impl FieldType {
    /// Operators offered for this type, in display order.
    pub fn operators(self) -> &'static [Operator] {
        match self {
            FieldType::Text => TEXT_OPERATORS,
            FieldType::Select => SELECT_OPERATORS,
            FieldType::Date => DATE_OPERATORS,
            FieldType::Number => NUMBER_OPERATORS,
        }
    }

    pub fn supports(self, operator: &Operator) -> bool {
        self.operators().contains(operator)
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Select => "select",
            FieldType::Date => "date",
            FieldType::Number => "number",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    pub label: String,
    pub semantic_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, semantic_type: FieldType) -> Self {
        FieldDescriptor {
            id: id.into(),
            label: label.into(),
            semantic_type,
        }
    }
}

/// Static lookup table of the fields a view can filter, sort and group on.
///
/// Built once from the field catalog and never mutated afterwards. Lookups
/// for ids that were not registered fail with [`ViewError::UnknownField`].
#[derive(Clone, Debug)]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl FieldRegistry {
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        for (pos, field) in fields.iter().enumerate() {
            if index.insert(field.id.clone(), pos).is_some() {
                return Err(ViewError::DuplicateField {
                    field: field.id.clone(),
                });
            }
        }
        Ok(FieldRegistry { fields, index })
    }

    /// The project-tracker catalog used by the bundled grid.
    pub fn standard() -> Self {
        let fields = vec![
            FieldDescriptor::new("name", "Name", FieldType::Text),
            FieldDescriptor::new("status", "Status", FieldType::Select),
            FieldDescriptor::new("priority", "Priority", FieldType::Select),
            FieldDescriptor::new("assignee", "Assignee", FieldType::Text),
            FieldDescriptor::new("dueDate", "Due Date", FieldType::Date),
            FieldDescriptor::new("progress", "Progress", FieldType::Number),
            FieldDescriptor::new("createdAt", "Created", FieldType::Date),
        ];
        let index = fields
            .iter()
            .enumerate()
            .map(|(pos, f)| (f.id.clone(), pos))
            .collect();
        FieldRegistry { fields, index }
    }

    pub fn resolve(&self, field_id: &str) -> Result<&FieldDescriptor> {
        self.index
            .get(field_id)
            .map(|&pos| &self.fields[pos])
            .ok_or_else(|| ViewError::unknown_field(field_id))
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.index.contains_key(field_id)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_and_unknown_fields() {
        let registry = FieldRegistry::standard();
        assert_eq!(
            registry.resolve("dueDate").unwrap().semantic_type,
            FieldType::Date
        );
        match registry.resolve("nope") {
            Err(ViewError::UnknownField { field }) => assert_eq!(field, "nope"),
            other => panic!("expected unknown field, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = FieldRegistry::new(vec![
            FieldDescriptor::new("a", "A", FieldType::Text),
            FieldDescriptor::new("a", "Again", FieldType::Number),
        ]);
        assert!(matches!(result, Err(ViewError::DuplicateField { .. })));
    }

    #[test]
    fn operator_tables_follow_semantic_type() {
        assert!(FieldType::Text.supports(&Operator::Contains));
        assert!(!FieldType::Number.supports(&Operator::Contains));
        assert!(FieldType::Date.supports(&Operator::WithinDays));
        assert!(FieldType::Select.supports(&Operator::NotIn));
        assert_eq!(FieldType::Number.operators().len(), 6);
    }
}
