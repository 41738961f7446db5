//! Generic delimited-text parser.
//!
//! Turns pasted TSV/CSV/pipe-table text into a matrix of strings. No
//! knowledge of what the columns mean lives here.
//!
//! Delimiter precedence: tab if any line has one, then pipe tables (most
//! lines start with `|`), then comma, else a single column. The input
//! classifier uses the same decision.

pub mod encoding;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{ParseError, ParseResult};

/// Rows of cells. Row 0 is the header candidate. Rows may be ragged.
pub type RawMatrix = Vec<Vec<String>>;

/// ASCII unit separator, used to read single-column input through the CSV
/// reader without ever splitting a line.
const UNIT_SEPARATOR: u8 = 0x1f;

/// Field delimiter of a pasted table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Tab,
    Comma,
    Pipe,
    /// One cell per line.
    None,
}

impl Delimiter {
    pub fn as_char(&self) -> Option<char> {
        match self {
            Delimiter::Tab => Some('\t'),
            Delimiter::Comma => Some(','),
            Delimiter::Pipe => Some('|'),
            Delimiter::None => None,
        }
    }

    fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
            Delimiter::Pipe => b'|',
            Delimiter::None => UNIT_SEPARATOR,
        }
    }

    /// Display form for logs (`\t` is shown as `TAB`).
    pub fn display(&self) -> &'static str {
        match self {
            Delimiter::Tab => "TAB",
            Delimiter::Comma => ",",
            Delimiter::Pipe => "|",
            Delimiter::None => "none",
        }
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMatrix {
    pub rows: RawMatrix,
    pub delimiter: Delimiter,
}

impl ParsedMatrix {
    /// Widest row length.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn headers(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// Read a cell defensively; missing trailing cells are empty.
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Normalize `\r\n` line endings to `\n`.
pub fn normalize_newlines(content: &str) -> Cow<'_, str> {
    if content.contains('\r') {
        Cow::Owned(content.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(content)
    }
}

/// Pick the field delimiter for `content`.
pub fn detect_delimiter(content: &str) -> Delimiter {
    if content.lines().any(|l| l.contains('\t')) {
        return Delimiter::Tab;
    }

    let non_blank: Vec<&str> = content.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let pipe_lines = non_blank.iter().filter(|l| l.starts_with('|')).count();
    if pipe_lines * 2 > non_blank.len() {
        return Delimiter::Pipe;
    }

    if content.lines().any(|l| l.contains(',')) {
        return Delimiter::Comma;
    }

    Delimiter::None
}

/// Parse pasted content into a matrix, detecting the delimiter.
///
/// # Example
/// ```ignore
/// use mdflow::parse;
///
/// let matrix = parse("No\tItem Name\n1\tTest Item").unwrap();
/// assert_eq!(matrix[1][1], "Test Item");
/// ```
pub fn parse(content: &str) -> ParseResult<RawMatrix> {
    parse_with_metadata(content).map(|parsed| parsed.rows)
}

/// Parse and also report the delimiter that was used.
pub fn parse_with_metadata(content: &str) -> ParseResult<ParsedMatrix> {
    let content = normalize_newlines(content);
    let delimiter = detect_delimiter(&content);
    let rows = parse_normalized(&content, delimiter)?;
    Ok(ParsedMatrix { rows, delimiter })
}

/// Parse with an explicit delimiter.
pub fn parse_with_delimiter(content: &str, delimiter: Delimiter) -> ParseResult<RawMatrix> {
    let content = normalize_newlines(content);
    parse_normalized(&content, delimiter)
}

fn parse_normalized(content: &str, delimiter: Delimiter) -> ParseResult<RawMatrix> {
    // Titles and notes around a pipe table are not part of it.
    let table_lines;
    let content = if delimiter == Delimiter::Pipe {
        table_lines = content
            .lines()
            .filter(|l| l.trim_start().starts_with('|'))
            .collect::<Vec<_>>()
            .join("\n");
        table_lines.as_str()
    } else {
        content
    };

    check_quotes(content, delimiter.as_byte() as char)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();

    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ParseError::Malformed {
            line: e
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 1),
            message: e.to_string(),
        })?;

        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();

        if delimiter == Delimiter::Pipe {
            strip_outer_pipes(&mut cells);
            if is_alignment_row(&cells) {
                continue;
            }
        }

        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }

        rows.push(cells);
    }

    Ok(rows)
}

/// Reject content whose last quoted cell never closes.
///
/// Mirrors the CSV reader: a quote only opens a quoted cell at the start
/// of a field, and `""` inside a quoted cell is an escaped quote.
fn check_quotes(content: &str, delimiter: char) -> ParseResult<()> {
    let mut line = 1;
    let mut open_line = 0;
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }

        match c {
            '"' if at_field_start => {
                in_quotes = true;
                open_line = line;
                at_field_start = false;
            }
            '\n' => {
                line += 1;
                at_field_start = true;
            }
            c if c == delimiter => at_field_start = true,
            _ => at_field_start = false,
        }
    }

    if in_quotes {
        Err(ParseError::UnterminatedQuote { line: open_line })
    } else {
        Ok(())
    }
}

/// `| a | b |` splits into `["", "a", "b", ""]`; drop the outer empties.
fn strip_outer_pipes(cells: &mut Vec<String>) {
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.len() > 1 && cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
}

/// Markdown alignment row such as `|---|:--:|`.
fn is_alignment_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|c| {
            let inner = c.trim_start_matches(':').trim_end_matches(':');
            !inner.is_empty() && inner.chars().all(|ch| ch == '-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_tab_matrix() {
        let matrix = parse("No\tItem Name\tType\n1\tTest Item\ttext\n2\tAnother Item\tbutton").unwrap();

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix[0], row(&["No", "Item Name", "Type"]));
        assert_eq!(matrix[2], row(&["2", "Another Item", "button"]));
    }

    #[test]
    fn test_tab_preferred_over_comma() {
        let parsed = parse_with_metadata("Name\tNotes\nLogin\tuser, password").unwrap();

        assert_eq!(parsed.delimiter, Delimiter::Tab);
        assert_eq!(parsed.rows[1], row(&["Login", "user, password"]));
    }

    #[test]
    fn test_comma_matrix() {
        let parsed = parse_with_metadata("a,b,c\n1,2,3").unwrap();

        assert_eq!(parsed.delimiter, Delimiter::Comma);
        assert_eq!(parsed.rows[1], row(&["1", "2", "3"]));
    }

    #[test]
    fn test_single_column() {
        let parsed = parse_with_metadata("first line\nsecond line").unwrap();

        assert_eq!(parsed.delimiter, Delimiter::None);
        assert_eq!(parsed.rows, vec![row(&["first line"]), row(&["second line"])]);
    }

    #[test]
    fn test_crlf_normalized() {
        let matrix = parse("a\tb\r\n1\t2\r\n").unwrap();

        assert_eq!(matrix, vec![row(&["a", "b"]), row(&["1", "2"])]);
    }

    #[test]
    fn test_quoted_cell_with_delimiter_and_escaped_quote() {
        let matrix = parse("name,value\n\"Smith, John\",\"say \"\"hi\"\"\"").unwrap();

        assert_eq!(matrix[1], row(&["Smith, John", "say \"hi\""]));
    }

    #[test]
    fn test_multiline_quoted_cell() {
        let content = "Steps\tExpected\n\"1. open\n2. click\"\tshown\n3\tok";
        let matrix = parse(content).unwrap();

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix[1][0], "1. open\n2. click");
        assert_eq!(matrix[1][1], "shown");
        assert_eq!(matrix[2], row(&["3", "ok"]));
    }

    #[test]
    fn test_literal_backslash_n_kept() {
        let matrix = parse("a,b\n\"line\\nnext\",x").unwrap();

        assert_eq!(matrix[1][0], "line\\nnext");
    }

    #[test]
    fn test_unterminated_quote_fails() {
        let err = parse("a,b\n1,2\n\"open,3\n4,5").unwrap_err();

        assert_eq!(err, ParseError::UnterminatedQuote { line: 3 });
    }

    #[test]
    fn test_mid_field_quote_is_literal() {
        let matrix = parse("size\n12\" screen").unwrap();

        assert_eq!(matrix[1][0], "12\" screen");
    }

    #[test]
    fn test_blank_lines_dropped() {
        let matrix = parse("\na\tb\n1\t2\n\n\n").unwrap();

        assert_eq!(matrix, vec![row(&["a", "b"]), row(&["1", "2"])]);
    }

    #[test]
    fn test_ragged_rows_kept() {
        let matrix = parse("a\tb\tc\n1\n2\t3\t4\t5").unwrap();

        assert_eq!(matrix[1], row(&["1"]));
        assert_eq!(matrix[2].len(), 4);
        assert_eq!(cell(&matrix[1], 2), "");
    }

    #[test]
    fn test_pipe_table() {
        let content = "| ID | Scenario |\n|----|:--------:|\n| TC-01 | Login, ok |\n";
        let parsed = parse_with_metadata(content).unwrap();

        assert_eq!(parsed.delimiter, Delimiter::Pipe);
        assert_eq!(parsed.rows, vec![row(&["ID", "Scenario"]), row(&["TC-01", "Login, ok"])]);
    }

    #[test]
    fn test_pipe_table_with_title_line() {
        let parsed =
            parse_with_metadata("Test cases\n| ID | Scenario |\n|---|---|\n| TC-1 | Login |").unwrap();

        assert_eq!(parsed.delimiter, Delimiter::Pipe);
        assert_eq!(parsed.rows, vec![row(&["ID", "Scenario"]), row(&["TC-1", "Login"])]);
    }

    #[test]
    fn test_empty_content_yields_empty_matrix() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("  \n \n").unwrap().is_empty());
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a\tb"), Delimiter::Tab);
        assert_eq!(detect_delimiter("a,b"), Delimiter::Comma);
        assert_eq!(detect_delimiter("| a | b |\n| 1 | 2 |"), Delimiter::Pipe);
        assert_eq!(detect_delimiter("title\n| a | b |\n| 1 | 2 |"), Delimiter::Pipe);
        assert_eq!(detect_delimiter("a | b\n| 1 | 2 |"), Delimiter::None);
        assert_eq!(detect_delimiter("plain text"), Delimiter::None);
    }

    #[test]
    fn test_parsed_matrix_accessors() {
        let parsed = parse_with_metadata("a\tb\n1").unwrap();

        assert_eq!(parsed.column_count(), 2);
        assert_eq!(parsed.headers(), &row(&["a", "b"])[..]);
        assert_eq!(parsed.data_rows().len(), 1);
    }
}
