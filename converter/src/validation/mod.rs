//! Row validation against configurable rules.
//!
//! Three kinds of checks, run per row in this order:
//!
//! - **Required**: listed fields must be non-empty (`"-"` counts as empty)
//! - **Format**: a non-empty `id` (`"-"` included) must match the ID pattern
//! - **Cross-field**: if `if_field` is non-empty, `then_field` must be
//!   filled (`"-"` counts as empty only on the `then` side)
//!
//! Required and cross-field warnings make the result invalid. Format
//! warnings are advisory and leave `valid` untouched.
//!
//! Validation never fails: a missing document or rule set, or a prose
//! document, yields a valid result with no warnings.
//!
//! # Rule files
//!
//! ```json
//! {
//!   "required_fields": ["expected"],
//!   "format_rules": { "id_pattern": "^TC-\\d+$" },
//!   "cross_field": [
//!     { "if_field": "action", "then_field": "navigation_destination", "message": "" }
//!   ]
//! }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::error::RulesError;
use crate::models::{CanonicalField, SpecDoc, SpecRow};

/// Placeholder some sheets use for "nothing here".
pub const PLACEHOLDER: &str = "-";

const PRESETS: [&str; 2] = ["test-case", "ui-spec"];

// =============================================================================
// Rules
// =============================================================================

/// Pattern rules for individual fields
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormatRules {
    #[serde(serialize_with = "serialize_pattern")]
    pub id_pattern: Option<Regex>,
}

fn serialize_pattern<S: Serializer>(pattern: &Option<Regex>, s: S) -> Result<S::Ok, S::Error> {
    match pattern {
        Some(re) => s.serialize_some(re.as_str()),
        None => s.serialize_none(),
    }
}

/// "If `if_field` is filled, `then_field` must be filled too."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossFieldRule {
    pub if_field: CanonicalField,
    pub then_field: CanonicalField,
    /// Empty means a generated message naming both fields.
    #[serde(default)]
    pub message: String,
}

impl CrossFieldRule {
    pub fn new(if_field: CanonicalField, then_field: CanonicalField) -> Self {
        Self { if_field, then_field, message: String::new() }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn message(&self) -> String {
        if self.message.trim().is_empty() {
            format!("{} is required when {} is set", self.then_field, self.if_field)
        } else {
            self.message.clone()
        }
    }
}

/// A rule set. Never mutated by validation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationRules {
    pub required_fields: Vec<CanonicalField>,
    pub format_rules: FormatRules,
    pub cross_field: Vec<CrossFieldRule>,
}

/// On-disk shape, before the ID pattern is compiled.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawRules {
    required_fields: Vec<CanonicalField>,
    format_rules: RawFormatRules,
    cross_field: Vec<CrossFieldRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawFormatRules {
    id_pattern: Option<String>,
}

impl ValidationRules {
    /// Load a rule set from JSON. The ID pattern is compiled here.
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let raw: RawRules = serde_json::from_str(json)?;
        let id_pattern = raw
            .format_rules
            .id_pattern
            .filter(|p| !p.trim().is_empty())
            .map(|p| Regex::new(&p))
            .transpose()?;

        Ok(Self {
            required_fields: raw.required_fields,
            format_rules: FormatRules { id_pattern },
            cross_field: raw.cross_field,
        })
    }

    /// Built-in rule set by name (see [`ValidationRules::preset_names`]).
    pub fn preset(name: &str) -> Result<Self, RulesError> {
        match name {
            "test-case" => Ok(Self {
                required_fields: vec![CanonicalField::Expected],
                format_rules: FormatRules {
                    id_pattern: Some(Regex::new(r"^[A-Za-z][A-Za-z0-9]*[-_]?\d+$")?),
                },
                cross_field: vec![CrossFieldRule::new(
                    CanonicalField::Instructions,
                    CanonicalField::Expected,
                )
                .with_message("Steps are given but no expected result")],
            }),
            "ui-spec" => Ok(Self {
                required_fields: vec![CanonicalField::ItemName],
                format_rules: FormatRules::default(),
                cross_field: vec![CrossFieldRule::new(
                    CanonicalField::Action,
                    CanonicalField::NavigationDestination,
                )],
            }),
            other => Err(RulesError::UnknownPreset(other.to_string())),
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &PRESETS
    }

    /// Check rows. Row indexes in warnings are positions in `rows`.
    pub fn check_rows(&self, rows: &[SpecRow]) -> ValidationResult {
        let mut warnings = Vec::new();

        for (row_index, row) in rows.iter().enumerate() {
            for &field in &self.required_fields {
                if is_missing(row.get(field)) {
                    warnings.push(ValidationWarning {
                        code: WarningCode::Required,
                        row_index,
                        field,
                        message: format!("{} is required", field.label()),
                    });
                }
            }

            if let Some(pattern) = &self.format_rules.id_pattern {
                let id = row.id.trim();
                if !id.is_empty() && !pattern.is_match(id) {
                    warnings.push(ValidationWarning {
                        code: WarningCode::Format,
                        row_index,
                        field: CanonicalField::Id,
                        message: format!("ID '{}' does not match {}", id, pattern.as_str()),
                    });
                }
            }

            for rule in &self.cross_field {
                // Only the `then` side treats the placeholder as empty.
                let triggered = !row.get(rule.if_field).trim().is_empty();
                if triggered && is_missing(row.get(rule.then_field)) {
                    warnings.push(ValidationWarning {
                        code: WarningCode::CrossField,
                        row_index,
                        field: rule.then_field,
                        message: rule.message(),
                    });
                }
            }
        }

        ValidationResult::from_warnings(warnings)
    }
}

fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == PLACEHOLDER
}

// =============================================================================
// Results
// =============================================================================

/// Kind of rule a warning came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningCode {
    #[serde(rename = "VALIDATION_REQUIRED")]
    Required,
    #[serde(rename = "VALIDATION_FORMAT")]
    Format,
    #[serde(rename = "VALIDATION_CROSS_FIELD")]
    CrossField,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::Required => "VALIDATION_REQUIRED",
            WarningCode::Format => "VALIDATION_FORMAT",
            WarningCode::CrossField => "VALIDATION_CROSS_FIELD",
        }
    }

    /// Whether a warning of this kind makes the document invalid.
    pub fn invalidates(&self) -> bool {
        !matches!(self, WarningCode::Format)
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub code: WarningCode,
    pub row_index: usize,
    pub field: CanonicalField,
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] row {}, field {}: {}",
            self.code, self.row_index, self.field, self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub warnings: Vec<ValidationWarning>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self { valid: true, warnings: Vec::new() }
    }
}

impl ValidationResult {
    fn from_warnings(warnings: Vec<ValidationWarning>) -> Self {
        let valid = !warnings.iter().any(|w| w.code.invalidates());
        Self { valid, warnings }
    }

    pub fn count(&self, code: WarningCode) -> usize {
        self.warnings.iter().filter(|w| w.code == code).count()
    }
}

// =============================================================================
// Entry point
// =============================================================================

/// Validate a document against a rule set.
///
/// Either operand missing, or a prose document, gives a valid result with
/// no warnings.
///
/// # Example
/// ```ignore
/// use mdflow::{build_spec_doc_from_paste, validate, ValidationRules};
///
/// let doc = build_spec_doc_from_paste("ID\tExpected\nTC-01\tOK\nTC-02\t").unwrap();
/// let rules = ValidationRules::preset("test-case").unwrap();
/// let result = validate(Some(&doc), Some(&rules));
/// assert!(!result.valid);
/// ```
pub fn validate(doc: Option<&SpecDoc>, rules: Option<&ValidationRules>) -> ValidationResult {
    match (doc, rules) {
        (Some(SpecDoc::Table(table)), Some(rules)) => rules.check_rows(&table.rows),
        _ => ValidationResult::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProseDocument, TableDoc};

    fn table(rows: Vec<SpecRow>) -> SpecDoc {
        SpecDoc::Table(TableDoc { rows, ..Default::default() })
    }

    fn required(fields: &[CanonicalField]) -> ValidationRules {
        ValidationRules { required_fields: fields.to_vec(), ..Default::default() }
    }

    #[test]
    fn test_required_field_detection() {
        let doc = table(vec![
            SpecRow::default()
                .with(CanonicalField::Id, "TC-01")
                .with(CanonicalField::Expected, "OK"),
            SpecRow::default().with(CanonicalField::Id, "TC-02"),
        ]);
        let result = validate(Some(&doc), Some(&required(&[CanonicalField::Expected])));

        assert!(!result.valid);
        assert_eq!(result.warnings.len(), 1);
        let warning = &result.warnings[0];
        assert_eq!(warning.code, WarningCode::Required);
        assert_eq!(warning.row_index, 1);
        assert_eq!(warning.field, CanonicalField::Expected);
    }

    #[test]
    fn test_placeholder_counts_as_missing() {
        let doc = table(vec![SpecRow::default().with(CanonicalField::Expected, " - ")]);
        let result = validate(Some(&doc), Some(&required(&[CanonicalField::Expected])));
        assert_eq!(result.count(WarningCode::Required), 1);
    }

    #[test]
    fn test_cross_field_detection() {
        let rules = ValidationRules {
            cross_field: vec![CrossFieldRule::new(
                CanonicalField::Action,
                CanonicalField::NavigationDestination,
            )],
            ..Default::default()
        };
        let doc = table(vec![
            SpecRow::default().with(CanonicalField::Action, "Navigate"),
            SpecRow::default()
                .with(CanonicalField::Action, "Navigate")
                .with(CanonicalField::NavigationDestination, "Home"),
        ]);
        let result = validate(Some(&doc), Some(&rules));

        assert!(!result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::CrossField);
        assert_eq!(result.warnings[0].row_index, 0);
        assert_eq!(
            result.warnings[0].message,
            "navigation_destination is required when action is set"
        );
    }

    #[test]
    fn test_placeholder_triggers_cross_field_rule() {
        let rules = ValidationRules::preset("ui-spec").unwrap();
        let doc = table(vec![SpecRow::default()
            .with(CanonicalField::ItemName, "Submit")
            .with(CanonicalField::Action, "-")]);
        let result = validate(Some(&doc), Some(&rules));

        assert!(!result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::CrossField);
        assert_eq!(result.warnings[0].field, CanonicalField::NavigationDestination);
    }

    #[test]
    fn test_placeholder_id_is_format_checked() {
        let rules = ValidationRules::preset("test-case").unwrap();
        let doc = table(vec![
            SpecRow::default()
                .with(CanonicalField::Id, "-")
                .with(CanonicalField::Expected, "OK"),
            SpecRow::default().with(CanonicalField::Expected, "OK"),
        ]);
        let result = validate(Some(&doc), Some(&rules));

        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::Format);
        assert_eq!(result.warnings[0].row_index, 0);
    }

    #[test]
    fn test_format_warnings_are_advisory() {
        let rules = ValidationRules::preset("test-case").unwrap();
        let doc = table(vec![
            SpecRow::default()
                .with(CanonicalField::Id, "case one")
                .with(CanonicalField::Expected, "OK"),
            SpecRow::default()
                .with(CanonicalField::Id, "TC-02")
                .with(CanonicalField::Expected, "OK"),
        ]);
        let result = validate(Some(&doc), Some(&rules));

        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::Format);
        assert_eq!(result.warnings[0].row_index, 0);
    }

    #[test]
    fn test_warning_order_within_row() {
        let rules = ValidationRules::preset("test-case").unwrap();
        let doc = table(vec![
            SpecRow::default().with(CanonicalField::Expected, "OK"),
            SpecRow::default()
                .with(CanonicalField::Id, "???")
                .with(CanonicalField::Instructions, "Click login"),
        ]);
        let result = validate(Some(&doc), Some(&rules));

        let codes: Vec<(usize, WarningCode)> =
            result.warnings.iter().map(|w| (w.row_index, w.code)).collect();
        assert_eq!(
            codes,
            vec![
                (1, WarningCode::Required),
                (1, WarningCode::Format),
                (1, WarningCode::CrossField),
            ]
        );
    }

    #[test]
    fn test_nil_safety() {
        let doc = table(vec![SpecRow::default().with(CanonicalField::Id, "x")]);
        let rules = required(&[CanonicalField::Expected]);

        assert_eq!(validate(None, Some(&rules)), ValidationResult::default());
        assert_eq!(validate(Some(&doc), None), ValidationResult::default());
        assert!(validate(None, None).valid);
    }

    #[test]
    fn test_prose_skipped() {
        let doc = SpecDoc::Prose(ProseDocument::default());
        let rules = required(&[CanonicalField::Expected]);
        let result = validate(Some(&doc), Some(&rules));

        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_is_idempotent() {
        let rules = ValidationRules::preset("ui-spec").unwrap();
        let doc = table(vec![
            SpecRow::default().with(CanonicalField::Action, "Tap"),
            SpecRow::default().with(CanonicalField::ItemName, "Login"),
        ]);
        assert_eq!(validate(Some(&doc), Some(&rules)), validate(Some(&doc), Some(&rules)));
    }

    #[test]
    fn test_rules_from_json() {
        let json = r#"{
            "required_fields": ["item_name", "type"],
            "format_rules": { "id_pattern": "^TC-\\d+$" },
            "cross_field": [{ "if_field": "action", "then_field": "navigation_destination" }]
        }"#;
        let rules = ValidationRules::from_json(json).unwrap();

        assert_eq!(rules.required_fields, vec![CanonicalField::ItemName, CanonicalField::Type]);
        assert!(rules.format_rules.id_pattern.as_ref().unwrap().is_match("TC-12"));
        assert_eq!(rules.cross_field[0].then_field, CanonicalField::NavigationDestination);
    }

    #[test]
    fn test_rules_from_json_errors() {
        assert!(matches!(
            ValidationRules::from_json(r#"{"format_rules": {"id_pattern": "("}}"#),
            Err(RulesError::Pattern(_))
        ));
        assert!(matches!(
            ValidationRules::from_json(r#"{"required_fields": ["nope"]}"#),
            Err(RulesError::Json(_))
        ));
        assert!(matches!(
            ValidationRules::preset("nope"),
            Err(RulesError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_warning_display() {
        let warning = ValidationWarning {
            code: WarningCode::Required,
            row_index: 3,
            field: CanonicalField::Expected,
            message: "Expected is required".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "[VALIDATION_REQUIRED] row 3, field expected: Expected is required"
        );
    }

    #[test]
    fn test_rules_serialize_pattern_as_string() {
        let rules = ValidationRules::preset("test-case").unwrap();
        let json = serde_json::to_value(&rules).unwrap();
        assert_eq!(json["format_rules"]["id_pattern"], r"^[A-Za-z][A-Za-z0-9]*[-_]?\d+$");
        assert_eq!(json["required_fields"][0], "expected");
    }
}
