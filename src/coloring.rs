//! Row colouring. Purely presentational: nothing here changes which records
//! are shown or in what order.

use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    None,
    Status,
    Priority,
    Custom,
}

/// Colours applied to one row.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RowColor {
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

impl RowColor {
    pub fn new(background: impl Into<String>, text: impl Into<String>) -> Self {
        RowColor {
            background_color: background.into(),
            text_color: Some(text.into()),
        }
    }
}

/// Value to colour lookup with a fallback for values not in the table.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub entries: BTreeMap<String, RowColor>,
    pub fallback: RowColor,
}

impl Palette {
    pub fn lookup(&self, value: &str) -> &RowColor {
        self.entries.get(value).unwrap_or(&self.fallback)
    }

    pub fn set(&mut self, value: impl Into<String>, color: RowColor) {
        self.entries.insert(value.into(), color);
    }

    pub fn default_status() -> Self {
        let entries = [
            ("In Progress", RowColor::new("#DBEAFE", "#1E40AF")),
            ("Approved", RowColor::new("#D1FAE5", "#065F46")),
            ("Pending", RowColor::new("#FEF3C7", "#92400E")),
            ("Rejected", RowColor::new("#FEE2E2", "#991B1B")),
        ];
        Palette {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            fallback: neutral(),
        }
    }

    pub fn default_priority() -> Self {
        let entries = [
            ("High", RowColor::new("#FEE2E2", "#991B1B")),
            ("Medium", RowColor::new("#FEF3C7", "#92400E")),
            ("Low", RowColor::new("#D1FAE5", "#065F46")),
        ];
        Palette {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            fallback: neutral(),
        }
    }
}

fn neutral() -> RowColor {
    RowColor::new("#F3F4F6", "#374151")
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleCondition {
    Equals,
    Contains,
    NotEquals,
}

/// User-defined colouring rule. Rules are tried in list order.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColorRule {
    pub id: String,
    pub field: String,
    pub condition: RuleCondition,
    pub value: String,
    pub color: String,
    pub background_color: String,
}

impl ColorRule {
    pub fn new(
        field: impl Into<String>,
        condition: RuleCondition,
        value: impl Into<String>,
        color: impl Into<String>,
        background_color: impl Into<String>,
    ) -> Self {
        ColorRule {
            id: uuid::Uuid::new_v4().to_string(),
            field: field.into(),
            condition,
            value: value.into(),
            color: color.into(),
            background_color: background_color.into(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.text_of(&self.field);
        match self.condition {
            RuleCondition::Equals => actual == self.value,
            RuleCondition::NotEquals => actual != self.value,
            RuleCondition::Contains => actual.to_lowercase().contains(&self.value.to_lowercase()),
        }
    }
}

/// Everything colouring reads. [`crate::view::ViewState::color_config`]
/// hands one out.
#[derive(Clone, Copy, Debug)]
pub struct ColorConfig<'a> {
    pub mode: ColorMode,
    pub by_condition: bool,
    pub rules: &'a [ColorRule],
    pub status_palette: &'a Palette,
    pub priority_palette: &'a Palette,
}

/// Colour for one record, or `None` when the caller should use its default.
pub fn color_for(record: &Record, config: &ColorConfig<'_>) -> Option<RowColor> {
    match config.mode {
        ColorMode::None => None,
        ColorMode::Status => Some(config.status_palette.lookup(&record.text_of("status")).clone()),
        ColorMode::Priority => Some(
            config
                .priority_palette
                .lookup(&record.text_of("priority"))
                .clone(),
        ),
        ColorMode::Custom if config.by_condition => config
            .rules
            .iter()
            .find(|rule| rule.matches(record))
            .map(|rule| RowColor::new(rule.background_color.clone(), rule.color.clone())),
        ColorMode::Custom => None,
    }
}
