//! Spec document building.
//!
//! Classifies pasted content, then takes one of two paths:
//!
//! - **Table**: parse the matrix, map row 0 onto canonical fields, turn
//!   every following row into a [`SpecRow`]. Rows blank in every canonical
//!   field are dropped. When no header maps at all, columns are assigned by
//!   position to `scenario, instructions, expected, notes`.
//! - **Markdown**: extract `> ## Heading` sections (see [`prose`]).
//!
//! # Example
//!
//! ```ignore
//! use mdflow::build_spec_doc_from_paste;
//!
//! let doc = build_spec_doc_from_paste("No\tItem Name\tType\n1\tTest Item\ttext").unwrap();
//! assert_eq!(doc.rows()[0].item_name, "Test Item");
//! ```

pub mod prose;

use crate::detect::InputDetector;
use crate::error::{BuildError, BuildResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::mapping::{extra_columns, HeaderMapper};
use crate::models::{
    CanonicalField, ColumnMapping, InputAnalysis, InputType, SpecDoc, SpecRow, TableDoc,
};
use crate::parser::{self, cell, ParsedMatrix};

pub use prose::extract_sections;

/// Generic row shape used when no header cell is recognized.
pub const POSITIONAL_FIELDS: [CanonicalField; 4] = [
    CanonicalField::Scenario,
    CanonicalField::Instructions,
    CanonicalField::Expected,
    CanonicalField::Notes,
];

/// A built document plus what the build observed on the way
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub doc: SpecDoc,
    pub analysis: InputAnalysis,
    /// Data rows dropped for being blank in every canonical field.
    pub dropped_rows: usize,
}

/// Classifier + mapper pair used to build documents
#[derive(Debug, Clone)]
pub struct SpecDocBuilder<'a> {
    detector: InputDetector,
    mapper: HeaderMapper<'a>,
}

impl Default for SpecDocBuilder<'static> {
    fn default() -> Self {
        Self::new(InputDetector::default(), HeaderMapper::default())
    }
}

impl<'a> SpecDocBuilder<'a> {
    pub fn new(detector: InputDetector, mapper: HeaderMapper<'a>) -> Self {
        Self { detector, mapper }
    }

    /// Build a document, discarding build diagnostics.
    pub fn build(&self, content: &str) -> BuildResult<SpecDoc> {
        self.build_with_details(content).map(|out| out.doc)
    }

    /// Build a document and keep the classification and drop count.
    pub fn build_with_details(&self, content: &str) -> BuildResult<BuildOutput> {
        if content.trim().is_empty() {
            return Err(BuildError::EmptyInput);
        }

        let analysis = self.detector.detect(content);
        log_info(format!(
            "Detected {} input ({}% confident): {}",
            analysis.input_type, analysis.confidence, analysis.reason
        ));

        let (doc, dropped_rows) = match analysis.input_type {
            InputType::Markdown => {
                let prose = extract_sections(&parser::normalize_newlines(content));
                log_success(format!("Extracted {} prose sections", prose.sections.len()));
                (SpecDoc::Prose(prose), 0)
            }
            InputType::Table => {
                let matrix = parser::parse_with_metadata(content)?;
                let (table, dropped) = self.build_table(&matrix);
                (SpecDoc::Table(table), dropped)
            }
        };

        Ok(BuildOutput { doc, analysis, dropped_rows })
    }

    /// Table path over an already parsed matrix. Returns the document and
    /// the number of dropped rows.
    pub fn build_table(&self, matrix: &ParsedMatrix) -> (TableDoc, usize) {
        let header_row = matrix.headers();
        log_info(format!(
            "Parsed {} rows x {} columns (delimiter {})",
            matrix.rows.len(),
            matrix.column_count(),
            matrix.delimiter.display()
        ));

        let mut columns = self.mapper.map(header_row);
        let positional_fallback = columns.is_empty() && !header_row.is_empty();
        if positional_fallback {
            log_warning("No header recognized, assigning columns by position");
            columns = positional_mappings(header_row);
        }

        for mapping in &columns {
            log_info_indent(
                format!(
                    "'{}' -> {} ({})",
                    mapping.source_header, mapping.canonical_field, mapping.confidence
                ),
                1,
            );
        }

        let extras = extra_columns(header_row, &columns);
        if !extras.is_empty() {
            log_warning(format!("{} columns not mapped", extras.len()));
        }

        let mut rows = Vec::new();
        let mut dropped = 0;
        for data in matrix.data_rows() {
            let mut row = SpecRow::default();
            for mapping in &columns {
                row.set(mapping.canonical_field, cell(data, mapping.source_index));
            }
            if row.is_blank() {
                dropped += 1;
                continue;
            }
            row.extras = extras
                .iter()
                .map(|extra| cell(data, extra.source_index).to_string())
                .collect();
            rows.push(row);
        }

        if dropped > 0 {
            log_info(format!("Dropped {} empty rows", dropped));
        }
        log_success(format!("Built {} rows", rows.len()));

        let table = TableDoc {
            rows,
            columns,
            extra_columns: extras,
            delimiter: matrix.delimiter.as_char(),
            positional_fallback,
        };
        (table, dropped)
    }
}

/// Assign the first columns to [`POSITIONAL_FIELDS`] in order.
fn positional_mappings(header_row: &[String]) -> Vec<ColumnMapping> {
    header_row
        .iter()
        .zip(POSITIONAL_FIELDS)
        .enumerate()
        .map(|(i, (header, field))| ColumnMapping {
            source_index: i,
            source_header: header.trim().to_string(),
            canonical_field: field,
            confidence: 0,
        })
        .collect()
}

/// Build a spec document from pasted content with default settings.
pub fn build_spec_doc_from_paste(content: &str) -> BuildResult<SpecDoc> {
    SpecDocBuilder::default().build(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    const SCENARIO: &str = "No\tItem Name\tType\n1\tTest Item\ttext\n2\tAnother Item\tbutton";

    #[test]
    fn test_ui_spec_scenario() {
        let doc = build_spec_doc_from_paste(SCENARIO).unwrap();
        let table = doc.as_table().unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.delimiter, Some('\t'));
        assert!(table.extra_columns.is_empty());

        let first = &table.rows[0];
        assert_eq!(first.no, "1");
        assert_eq!(first.item_name, "Test Item");
        assert_eq!(first.item_type, "text");
        assert_eq!(table.rows[1].item_type, "button");

        for row in &table.rows {
            let filled: Vec<CanonicalField> = row.filled_fields().map(|(f, _)| f).collect();
            assert_eq!(
                filled,
                vec![CanonicalField::No, CanonicalField::ItemName, CanonicalField::ItemType]
            );
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(build_spec_doc_from_paste(""), Err(BuildError::EmptyInput));
        assert_eq!(build_spec_doc_from_paste("  \n\t \n"), Err(BuildError::EmptyInput));
    }

    #[test]
    fn test_header_only_table() {
        let doc = build_spec_doc_from_paste("ID\tScenario\tExpected").unwrap();
        let table = doc.as_table().unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.columns.len(), 3);
    }

    #[test]
    fn test_blank_rows_dropped() {
        let builder = SpecDocBuilder::default();
        let out = builder
            .build_with_details("ID\tExpected\tOwner\nTC-1\tOK\t\n\t\tstray\nTC-2\tFail\t")
            .unwrap();

        let rows = out.doc.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(out.dropped_rows, 1);
        assert_eq!(rows[1].id, "TC-2");
    }

    #[test]
    fn test_pipe_table_with_title_line() {
        let out = SpecDocBuilder::default()
            .build_with_details("Test cases\n| ID | Scenario |\n|---|---|\n| TC-1 | Login |\n| TC-2 | Logout |")
            .unwrap();

        assert_eq!(out.analysis.input_type, InputType::Table);
        let table = out.doc.as_table().unwrap();
        assert_eq!(table.delimiter, Some('|'));
        let fields: Vec<CanonicalField> = table.columns.iter().map(|c| c.canonical_field).collect();
        assert_eq!(fields, vec![CanonicalField::Id, CanonicalField::Scenario]);

        let ids: Vec<&str> = table.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["TC-1", "TC-2"]);
        assert_eq!(table.rows[1].scenario, "Logout");
    }

    #[test]
    fn test_extras_preserved_per_row() {
        let doc = build_spec_doc_from_paste("ID\tOwner\tExpected\nTC-1\talice\tOK\nTC-2\n").unwrap();
        let table = doc.as_table().unwrap();

        assert_eq!(table.extra_columns.len(), 1);
        assert_eq!(table.extra_columns[0].header, "Owner");
        assert_eq!(table.rows[0].extras, vec!["alice".to_string()]);
        // Short row: missing cells read as empty.
        assert_eq!(table.rows[1].extras, vec![String::new()]);
        assert_eq!(table.rows[1].expected, "");
    }

    #[test]
    fn test_positional_fallback() {
        let doc = build_spec_doc_from_paste("Foo\tBar\tBaz\nlogin\tclick\tok\nlogout\tclick\tbye").unwrap();
        let table = doc.as_table().unwrap();

        assert!(table.positional_fallback);
        assert!(table.columns.iter().all(|c| c.confidence == 0));
        assert_eq!(table.rows[0].scenario, "login");
        assert_eq!(table.rows[0].instructions, "click");
        assert_eq!(table.rows[1].expected, "bye");
    }

    #[test]
    fn test_markdown_goes_to_prose() {
        let out = SpecDocBuilder::default()
            .build_with_details("> ## Summary\n> Users cannot log in\n> ## Steps\n> Open the page")
            .unwrap();

        assert_eq!(out.analysis.input_type, InputType::Markdown);
        let prose = out.doc.as_prose().unwrap();
        assert_eq!(prose.sections.len(), 2);
        assert!(out.doc.rows().is_empty());
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = build_spec_doc_from_paste("ID,Scenario\n1,\"never closed").unwrap_err();
        assert!(matches!(err, BuildError::Parse(ParseError::UnterminatedQuote { line: 2 })));
    }
}
