//! Domain models for the conversion pipeline.
//!
//! - [`CanonicalField`] - Fixed set of semantic column names
//! - [`InputAnalysis`] - Classifier verdict (markdown vs table)
//! - [`ColumnMapping`] - Header cell to canonical field assignment
//! - [`SpecRow`] - One row of canonical fields
//! - [`SpecDoc`] - Either a table of rows or a prose document

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Canonical Fields
// =============================================================================

/// Semantic column names that header cells are mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Id,
    Feature,
    Scenario,
    Priority,
    Type,
    Status,
    Precondition,
    Instructions,
    Inputs,
    Expected,
    Endpoint,
    Notes,
    No,
    ItemName,
    ItemType,
    RequiredOptional,
    DisplayConditions,
    InputRestrictions,
    Action,
    NavigationDestination,
}

/// Which kind of sheet a field usually appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFamily {
    /// Test case sheets (steps, expected results).
    TestCase,
    /// Screen item definition sheets.
    UiSpec,
    /// Appears in both.
    Common,
}

impl CanonicalField {
    /// All fields, in declaration order. Tie-breaking everywhere follows this order.
    pub const ALL: [CanonicalField; 20] = [
        Self::Id,
        Self::Feature,
        Self::Scenario,
        Self::Priority,
        Self::Type,
        Self::Status,
        Self::Precondition,
        Self::Instructions,
        Self::Inputs,
        Self::Expected,
        Self::Endpoint,
        Self::Notes,
        Self::No,
        Self::ItemName,
        Self::ItemType,
        Self::RequiredOptional,
        Self::DisplayConditions,
        Self::InputRestrictions,
        Self::Action,
        Self::NavigationDestination,
    ];

    /// Snake-case name used in rule files and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Feature => "feature",
            Self::Scenario => "scenario",
            Self::Priority => "priority",
            Self::Type => "type",
            Self::Status => "status",
            Self::Precondition => "precondition",
            Self::Instructions => "instructions",
            Self::Inputs => "inputs",
            Self::Expected => "expected",
            Self::Endpoint => "endpoint",
            Self::Notes => "notes",
            Self::No => "no",
            Self::ItemName => "item_name",
            Self::ItemType => "item_type",
            Self::RequiredOptional => "required_optional",
            Self::DisplayConditions => "display_conditions",
            Self::InputRestrictions => "input_restrictions",
            Self::Action => "action",
            Self::NavigationDestination => "navigation_destination",
        }
    }

    /// Human-readable label for rendered output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Feature => "Feature",
            Self::Scenario => "Scenario",
            Self::Priority => "Priority",
            Self::Type => "Type",
            Self::Status => "Status",
            Self::Precondition => "Precondition",
            Self::Instructions => "Steps",
            Self::Inputs => "Inputs",
            Self::Expected => "Expected",
            Self::Endpoint => "Endpoint",
            Self::Notes => "Notes",
            Self::No => "No",
            Self::ItemName => "Item Name",
            Self::ItemType => "Item Type",
            Self::RequiredOptional => "Required/Optional",
            Self::DisplayConditions => "Display Conditions",
            Self::InputRestrictions => "Input Restrictions",
            Self::Action => "Action",
            Self::NavigationDestination => "Navigation Destination",
        }
    }

    pub fn family(&self) -> FieldFamily {
        match self {
            Self::No | Self::Notes => FieldFamily::Common,
            Self::ItemName
            | Self::ItemType
            | Self::RequiredOptional
            | Self::DisplayConditions
            | Self::InputRestrictions
            | Self::Action
            | Self::NavigationDestination => FieldFamily::UiSpec,
            _ => FieldFamily::TestCase,
        }
    }

    /// Position in [`CanonicalField::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| format!("unknown field '{}'", s))
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Shape of the raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Markdown,
    Table,
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputType::Markdown => f.write_str("markdown"),
            InputType::Table => f.write_str("table"),
        }
    }
}

/// Classifier verdict. Carries no parsed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAnalysis {
    pub input_type: InputType,
    /// 0..=100
    pub confidence: u8,
    /// Dominant signal, for diagnostics only.
    pub reason: String,
}

// =============================================================================
// Header Mapping
// =============================================================================

/// Assignment of one source column to a canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source_index: usize,
    pub source_header: String,
    pub canonical_field: CanonicalField,
    /// 100 exact, 70..=90 substring, 40..=69 fuzzy, 0 positional fallback.
    pub confidence: u8,
}

/// A column no canonical field claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraColumn {
    pub source_index: usize,
    pub header: String,
}

// =============================================================================
// Rows
// =============================================================================

/// One row of canonical fields, all free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRow {
    pub id: String,
    pub feature: String,
    pub scenario: String,
    pub priority: String,
    #[serde(rename = "type")]
    pub test_type: String,
    pub status: String,
    pub precondition: String,
    pub instructions: String,
    pub inputs: String,
    pub expected: String,
    pub endpoint: String,
    pub notes: String,
    pub no: String,
    pub item_name: String,
    pub item_type: String,
    pub required_optional: String,
    pub display_conditions: String,
    pub input_restrictions: String,
    pub action: String,
    pub navigation_destination: String,
    /// Values of unmapped columns, aligned with [`TableDoc::extra_columns`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
}

impl SpecRow {
    pub fn get(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Id => &self.id,
            CanonicalField::Feature => &self.feature,
            CanonicalField::Scenario => &self.scenario,
            CanonicalField::Priority => &self.priority,
            CanonicalField::Type => &self.test_type,
            CanonicalField::Status => &self.status,
            CanonicalField::Precondition => &self.precondition,
            CanonicalField::Instructions => &self.instructions,
            CanonicalField::Inputs => &self.inputs,
            CanonicalField::Expected => &self.expected,
            CanonicalField::Endpoint => &self.endpoint,
            CanonicalField::Notes => &self.notes,
            CanonicalField::No => &self.no,
            CanonicalField::ItemName => &self.item_name,
            CanonicalField::ItemType => &self.item_type,
            CanonicalField::RequiredOptional => &self.required_optional,
            CanonicalField::DisplayConditions => &self.display_conditions,
            CanonicalField::InputRestrictions => &self.input_restrictions,
            CanonicalField::Action => &self.action,
            CanonicalField::NavigationDestination => &self.navigation_destination,
        }
    }

    fn slot(&mut self, field: CanonicalField) -> &mut String {
        match field {
            CanonicalField::Id => &mut self.id,
            CanonicalField::Feature => &mut self.feature,
            CanonicalField::Scenario => &mut self.scenario,
            CanonicalField::Priority => &mut self.priority,
            CanonicalField::Type => &mut self.test_type,
            CanonicalField::Status => &mut self.status,
            CanonicalField::Precondition => &mut self.precondition,
            CanonicalField::Instructions => &mut self.instructions,
            CanonicalField::Inputs => &mut self.inputs,
            CanonicalField::Expected => &mut self.expected,
            CanonicalField::Endpoint => &mut self.endpoint,
            CanonicalField::Notes => &mut self.notes,
            CanonicalField::No => &mut self.no,
            CanonicalField::ItemName => &mut self.item_name,
            CanonicalField::ItemType => &mut self.item_type,
            CanonicalField::RequiredOptional => &mut self.required_optional,
            CanonicalField::DisplayConditions => &mut self.display_conditions,
            CanonicalField::InputRestrictions => &mut self.input_restrictions,
            CanonicalField::Action => &mut self.action,
            CanonicalField::NavigationDestination => &mut self.navigation_destination,
        }
    }

    pub fn set(&mut self, field: CanonicalField, value: impl Into<String>) {
        *self.slot(field) = value.into();
    }

    /// Builder-style setter, handy in tests and fixtures.
    pub fn with(mut self, field: CanonicalField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// True when every canonical field is blank. Extras are not considered.
    pub fn is_blank(&self) -> bool {
        CanonicalField::ALL
            .iter()
            .all(|f| self.get(*f).trim().is_empty())
    }

    /// Non-empty canonical fields in declaration order.
    pub fn filled_fields(&self) -> impl Iterator<Item = (CanonicalField, &str)> + '_ {
        CanonicalField::ALL
            .iter()
            .map(move |f| (*f, self.get(*f)))
            .filter(|(_, v)| !v.trim().is_empty())
    }
}

// =============================================================================
// Documents
// =============================================================================

/// Rows built from tabular input, plus the header context they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDoc {
    pub rows: Vec<SpecRow>,
    /// Mapped columns ordered by source index.
    pub columns: Vec<ColumnMapping>,
    pub extra_columns: Vec<ExtraColumn>,
    /// Delimiter the matrix was split on (`None` for single-column input).
    pub delimiter: Option<char>,
    /// No header matched, columns were assigned by position.
    #[serde(default)]
    pub positional_fallback: bool,
}

impl TableDoc {
    /// Source header text for a canonical field, if that field is mapped.
    pub fn header_for(&self, field: CanonicalField) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.canonical_field == field)
            .map(|c| c.source_header.as_str())
    }

    pub fn is_mapped(&self, field: CanonicalField) -> bool {
        self.columns.iter().any(|c| c.canonical_field == field)
    }

    /// True when the rows look like a screen item definition sheet.
    pub fn is_ui_spec(&self) -> bool {
        self.rows.iter().any(|r| !r.item_name.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProseSection {
    pub heading: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProseDocument {
    pub sections: Vec<ProseSection>,
    /// Text outside any recognized heading.
    pub raw_message: String,
}

/// Canonical container for converted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SpecDoc {
    Table(TableDoc),
    Prose(ProseDocument),
}

impl SpecDoc {
    pub fn rows(&self) -> &[SpecRow] {
        match self {
            SpecDoc::Table(table) => &table.rows,
            SpecDoc::Prose(_) => &[],
        }
    }

    pub fn as_table(&self) -> Option<&TableDoc> {
        match self {
            SpecDoc::Table(table) => Some(table),
            SpecDoc::Prose(_) => None,
        }
    }

    pub fn as_prose(&self) -> Option<&ProseDocument> {
        match self {
            SpecDoc::Prose(prose) => Some(prose),
            SpecDoc::Table(_) => None,
        }
    }
}
