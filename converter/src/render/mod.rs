//! Markdown rendering of spec documents.
//!
//! A closed set of templates, each a plain function over [`SpecDoc`]:
//!
//! | Name | Output |
//! |---|---|
//! | `spec` | One `##` section per row, fields as a bullet list |
//! | `table` | Markdown table with the source header labels |
//! | `feature` | Gherkin-style scenarios grouped by feature |
//!
//! `auto` picks `table` for screen item sheets and `spec` otherwise.
//! Prose documents render the same way under every template.

use std::fmt::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{CanonicalField, ProseDocument, SpecDoc, SpecRow, TableDoc};

/// Name that selects a template from the document shape.
pub const AUTO_TEMPLATE: &str = "auto";

/// Output template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Spec,
    Table,
    Feature,
}

impl Template {
    pub const ALL: [Template; 3] = [Template::Spec, Template::Table, Template::Feature];

    pub fn name(&self) -> &'static str {
        match self {
            Template::Spec => "spec",
            Template::Table => "table",
            Template::Feature => "feature",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Template::Spec => "One section per row with every filled field",
            Template::Table => "Markdown table keeping the original columns",
            Template::Feature => "Gherkin scenarios from precondition, steps and expected result",
        }
    }

    /// Template `auto` resolves to for this document.
    pub fn auto_for(doc: &SpecDoc) -> Template {
        match doc {
            SpecDoc::Table(table) if table.is_ui_spec() => Template::Table,
            _ => Template::Spec,
        }
    }

    /// Resolve a user-supplied name; empty and `auto` pick from the document.
    pub fn resolve(name: &str, doc: &SpecDoc) -> Option<Template> {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(AUTO_TEMPLATE) {
            return Some(Template::auto_for(doc));
        }
        name.parse().ok()
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Template::ALL
            .iter()
            .copied()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| format!("unknown template '{}'", s))
    }
}

/// Names of all registered templates.
pub fn get_template_names() -> Vec<&'static str> {
    Template::ALL.iter().map(Template::name).collect()
}

/// Render a document with a template.
pub fn render(doc: &SpecDoc, template: Template) -> String {
    match doc {
        SpecDoc::Prose(prose) => render_prose(prose),
        SpecDoc::Table(table) => match template {
            Template::Spec => render_spec(table),
            Template::Table => render_table(table),
            Template::Feature => render_feature(table),
        },
    }
}

// =============================================================================
// Prose
// =============================================================================

fn render_prose(prose: &ProseDocument) -> String {
    let mut out = String::new();
    if !prose.raw_message.is_empty() {
        out.push_str(&prose.raw_message);
        out.push_str("\n\n");
    }
    for section in &prose.sections {
        let _ = writeln!(out, "## {}\n", section.heading);
        if !section.content.is_empty() {
            out.push_str(&section.content);
            out.push_str("\n\n");
        }
    }
    finish(out)
}

// =============================================================================
// Spec
// =============================================================================

/// Fields that make up a row title, in preference order per slot.
const TITLE_KEY: [CanonicalField; 2] = [CanonicalField::Id, CanonicalField::No];
const TITLE_TEXT: [CanonicalField; 2] = [CanonicalField::Scenario, CanonicalField::ItemName];

fn first_filled(row: &SpecRow, fields: &[CanonicalField]) -> Option<CanonicalField> {
    fields.iter().copied().find(|f| !row.get(*f).trim().is_empty())
}

fn render_spec(table: &TableDoc) -> String {
    let mut out = String::from(if table.is_ui_spec() {
        "# Screen Items\n\n"
    } else {
        "# Test Specification\n\n"
    });

    for (i, row) in table.rows.iter().enumerate() {
        let key = first_filled(row, &TITLE_KEY);
        let text = first_filled(row, &TITLE_TEXT);

        let title = match (key, text) {
            (Some(k), Some(t)) => format!("{}: {}", row.get(k), single_line(row.get(t))),
            (Some(k), None) => row.get(k).to_string(),
            (None, Some(t)) => single_line(row.get(t)),
            (None, None) => format!("Row {}", i + 1),
        };
        let _ = writeln!(out, "## {}\n", title);

        for (field, value) in row.filled_fields() {
            if Some(field) == key || Some(field) == text {
                continue;
            }
            push_item(&mut out, field.label(), value);
        }
        for (extra, value) in table.extra_columns.iter().zip(&row.extras) {
            if !value.trim().is_empty() {
                push_item(&mut out, &extra.header, value);
            }
        }
        out.push('\n');
    }

    finish(out)
}

/// `- **Label**: value`, continuation lines indented under the bullet.
fn push_item(out: &mut String, label: &str, value: &str) {
    let mut lines = value.lines();
    let first = lines.next().unwrap_or("");
    let _ = writeln!(out, "- **{}**: {}", label, first);
    for line in lines {
        let _ = writeln!(out, "  {}", line);
    }
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// Table
// =============================================================================

/// A rendered column: its label and how to read a row's value.
enum Column<'a> {
    Field(&'a str, CanonicalField),
    Extra(&'a str, usize),
}

fn table_columns(table: &TableDoc) -> Vec<Column<'_>> {
    let mut indexed: Vec<(usize, Column<'_>)> = table
        .columns
        .iter()
        .map(|c| (c.source_index, Column::Field(c.source_header.as_str(), c.canonical_field)))
        .chain(
            table
                .extra_columns
                .iter()
                .enumerate()
                .map(|(k, e)| (e.source_index, Column::Extra(e.header.as_str(), k))),
        )
        .collect();

    if indexed.is_empty() {
        // Hand-built documents carry no header context; show filled fields.
        return CanonicalField::ALL
            .iter()
            .copied()
            .filter(|f| table.rows.iter().any(|r| !r.get(*f).trim().is_empty()))
            .map(|f| Column::Field(f.label(), f))
            .collect();
    }

    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, c)| c).collect()
}

/// Table cells cannot hold `|` or line breaks; they come out as `\|` and `<br>`.
fn escape_cell(value: &str) -> String {
    value.trim().replace('|', "\\|").replace('\n', "<br>")
}

fn render_table(table: &TableDoc) -> String {
    let columns = table_columns(table);
    if columns.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let labels: Vec<String> = columns
        .iter()
        .map(|c| match c {
            Column::Field(label, field) if label.is_empty() => field.label().to_string(),
            Column::Field(label, _) | Column::Extra(label, _) => escape_cell(label),
        })
        .collect();
    let _ = writeln!(out, "| {} |", labels.join(" | "));
    let _ = writeln!(out, "|{}", "---|".repeat(columns.len()));

    for row in &table.rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| match c {
                Column::Field(_, field) => escape_cell(row.get(*field)),
                Column::Extra(_, k) => escape_cell(row.extras.get(*k).map(String::as_str).unwrap_or("")),
            })
            .collect();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    }

    finish(out)
}

// =============================================================================
// Feature
// =============================================================================

fn render_feature(table: &TableDoc) -> String {
    // Features in order of first appearance.
    let mut groups: Vec<(&str, Vec<&SpecRow>)> = Vec::new();
    for row in &table.rows {
        let feature = row.feature.trim();
        match groups.iter_mut().find(|(name, _)| *name == feature) {
            Some((_, rows)) => rows.push(row),
            None => groups.push((feature, vec![row])),
        }
    }

    let mut out = String::new();
    for (feature, rows) in groups {
        let name = if feature.is_empty() { "Specification" } else { feature };
        let _ = writeln!(out, "Feature: {}\n", single_line(name));

        for row in rows {
            let key = first_filled(row, &TITLE_KEY).map(|f| row.get(f));
            let text = first_filled(row, &TITLE_TEXT).map(|f| single_line(row.get(f)));
            let title = match (key, text) {
                (Some(k), Some(t)) => format!("{} {}", k, t),
                (Some(k), None) => k.to_string(),
                (None, Some(t)) => t,
                (None, None) => "Unnamed".to_string(),
            };
            let _ = writeln!(out, "  Scenario: {}", title);

            for (field, value) in row.filled_fields() {
                if matches!(
                    field,
                    CanonicalField::Feature
                        | CanonicalField::Precondition
                        | CanonicalField::Instructions
                        | CanonicalField::Action
                        | CanonicalField::Expected
                        | CanonicalField::NavigationDestination
                ) || TITLE_KEY.contains(&field)
                    || TITLE_TEXT.contains(&field)
                {
                    continue;
                }
                let _ = writeln!(out, "    # {}: {}", field.label(), single_line(value));
            }

            push_steps(&mut out, "Given", &row.precondition);
            push_steps(&mut out, "When", &row.instructions);
            push_steps(&mut out, "When", &row.action);
            push_steps(&mut out, "Then", &row.expected);
            push_steps(&mut out, "Then", &row.navigation_destination);
            out.push('\n');
        }
    }

    finish(out)
}

/// First line gets the keyword, following lines `And`.
fn push_steps(out: &mut String, keyword: &str, value: &str) {
    let mut steps = value.lines().map(str::trim).filter(|l| !l.is_empty());
    if let Some(first) = steps.next() {
        let _ = writeln!(out, "    {} {}", keyword, first);
        for step in steps {
            let _ = writeln!(out, "    And {}", step);
        }
    }
}

fn finish(mut out: String) -> String {
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}
