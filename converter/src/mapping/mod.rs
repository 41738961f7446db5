//! Column header recognition.
//!
//! Maps each header cell onto a [`CanonicalField`]:
//!
//! 1. exact alias match (confidence 100)
//! 2. containment in either direction (70-90, by length ratio)
//! 3. edit distance within `alias_len * fuzzy_ratio` (40-69)
//!
//! A header row is first assigned a family (test case or screen items)
//! from the unambiguous exact hits it contains. Fields outside that family
//! score 15 lower, which is how "Type" lands on `item_type` next to
//! "Item Name" but on `type` next to "Expected".
//!
//! Each field is claimed by at most one column. Candidates are assigned
//! greedily by confidence, then column index, then field order, so a
//! column that loses its best field falls back to its next candidate.

pub mod aliases;
pub mod fuzzy;

use serde::{Deserialize, Serialize};

use crate::models::{CanonicalField, ColumnMapping, ExtraColumn, FieldFamily};

pub use aliases::{AliasTable, DEFAULT_ALIASES};
pub use fuzzy::{edit_distance, normalize_header};

const EXACT_CONFIDENCE: u8 = 100;
const SUBSTRING_MIN: u8 = 70;
const SUBSTRING_MAX: u8 = 90;
const FUZZY_MIN: u8 = 40;
const FUZZY_MAX: u8 = 69;
const OUT_OF_FAMILY_PENALTY: u8 = 15;
/// Alias words shorter than this never fuzzy-match ("data" vs "date").
const FUZZY_MIN_WORD_LEN: usize = 5;

/// Tunable thresholds for header mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Candidates below this confidence leave the column unmapped.
    pub min_confidence: u8,
    /// Allowed edits per alias character for fuzzy matches.
    pub fuzzy_ratio: f64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            min_confidence: 60,
            fuzzy_ratio: 0.34,
        }
    }
}

/// One possible assignment for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    column: usize,
    field: CanonicalField,
    confidence: u8,
}

/// Header mapper over an alias table
#[derive(Debug, Clone)]
pub struct HeaderMapper<'a> {
    config: MapperConfig,
    aliases: &'a AliasTable,
}

impl Default for HeaderMapper<'static> {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl HeaderMapper<'static> {
    /// Mapper over the built-in alias table.
    pub fn new(config: MapperConfig) -> Self {
        Self { config, aliases: &DEFAULT_ALIASES }
    }
}

impl<'a> HeaderMapper<'a> {
    pub fn with_aliases(config: MapperConfig, aliases: &'a AliasTable) -> Self {
        Self { config, aliases }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Map a header row. Result is ordered by source index and only holds
    /// mapped columns.
    pub fn map(&self, header_row: &[String]) -> Vec<ColumnMapping> {
        let normalized: Vec<String> = header_row.iter().map(|h| normalize_header(h)).collect();
        let family = self.family_of(&normalized);

        let mut candidates: Vec<Candidate> = normalized
            .iter()
            .enumerate()
            .flat_map(|(column, header)| self.candidates_for(column, header, family))
            .filter(|c| c.confidence >= self.config.min_confidence)
            .collect();

        candidates.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then(a.column.cmp(&b.column))
                .then(a.field.cmp(&b.field))
        });

        let mut column_taken = vec![false; header_row.len()];
        let mut field_taken = [false; CanonicalField::ALL.len()];
        let mut mappings = Vec::new();

        for candidate in candidates {
            if column_taken[candidate.column] || field_taken[candidate.field.index()] {
                continue;
            }
            column_taken[candidate.column] = true;
            field_taken[candidate.field.index()] = true;
            mappings.push(ColumnMapping {
                source_index: candidate.column,
                source_header: header_row[candidate.column].trim().to_string(),
                canonical_field: candidate.field,
                confidence: candidate.confidence,
            });
        }

        mappings.sort_by_key(|m| m.source_index);
        mappings
    }

    /// Family implied by a header row, if one side has more unambiguous
    /// exact hits than the other.
    pub fn family(&self, header_row: &[String]) -> Option<FieldFamily> {
        let normalized: Vec<String> = header_row.iter().map(|h| normalize_header(h)).collect();
        self.family_of(&normalized)
    }

    fn family_of(&self, normalized: &[String]) -> Option<FieldFamily> {
        let mut test_case = 0;
        let mut ui_spec = 0;

        for header in normalized {
            let fields = self.aliases.exact_fields(header);
            let families: Vec<FieldFamily> = fields
                .iter()
                .map(CanonicalField::family)
                .filter(|f| *f != FieldFamily::Common)
                .collect();
            match families.as_slice() {
                [] => {}
                [first, rest @ ..] if rest.iter().all(|f| f == first) => match first {
                    FieldFamily::TestCase => test_case += 1,
                    FieldFamily::UiSpec => ui_spec += 1,
                    FieldFamily::Common => {}
                },
                _ => {}
            }
        }

        match test_case.cmp(&ui_spec) {
            std::cmp::Ordering::Greater => Some(FieldFamily::TestCase),
            std::cmp::Ordering::Less => Some(FieldFamily::UiSpec),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Best score per field for one header cell.
    fn candidates_for(
        &self,
        column: usize,
        header: &str,
        family: Option<FieldFamily>,
    ) -> Vec<Candidate> {
        if header.is_empty() {
            return Vec::new();
        }

        self.aliases
            .iter()
            .filter_map(|(field, aliases)| {
                let best = aliases.iter().filter_map(|alias| self.score(header, alias)).max()?;
                let penalty = match (family, field.family()) {
                    (Some(wanted), actual) if actual != FieldFamily::Common && actual != wanted => {
                        OUT_OF_FAMILY_PENALTY
                    }
                    _ => 0,
                };
                Some(Candidate {
                    column,
                    field,
                    confidence: best.saturating_sub(penalty),
                })
            })
            .collect()
    }

    /// Score one header against one alias, both normalized.
    fn score(&self, header: &str, alias: &str) -> Option<u8> {
        if header == alias {
            return Some(EXACT_CONFIDENCE);
        }

        if let Some((short, long)) = fuzzy::containment(header, alias) {
            let span = f64::from(SUBSTRING_MAX - SUBSTRING_MIN);
            let score = f64::from(SUBSTRING_MIN) + span * short as f64 / long as f64;
            return Some((score.round() as u8).min(SUBSTRING_MAX));
        }

        let distance =
            fuzzy::typo_distance(header, alias, self.config.fuzzy_ratio, FUZZY_MIN_WORD_LEN)?;
        let alias_len = alias.chars().count();

        let span = f64::from(FUZZY_MAX - FUZZY_MIN);
        let similarity = 1.0 - distance as f64 / alias_len as f64;
        let score = f64::from(FUZZY_MIN) + span * similarity;
        Some((score.round() as u8).clamp(FUZZY_MIN, FUZZY_MAX))
    }
}

/// Map a header row with the default configuration.
pub fn map_headers(header_row: &[String]) -> Vec<ColumnMapping> {
    HeaderMapper::default().map(header_row)
}

/// Columns of `header_row` not present in `mappings`, in source order.
pub fn extra_columns(header_row: &[String], mappings: &[ColumnMapping]) -> Vec<ExtraColumn> {
    header_row
        .iter()
        .enumerate()
        .filter(|(i, _)| !mappings.iter().any(|m| m.source_index == *i))
        .map(|(i, header)| ExtraColumn {
            source_index: i,
            header: header.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn fields(mappings: &[ColumnMapping]) -> Vec<(usize, CanonicalField)> {
        mappings.iter().map(|m| (m.source_index, m.canonical_field)).collect()
    }

    #[test]
    fn test_ui_spec_headers() {
        let mappings = map_headers(&headers(&["No", "Item Name", "Type"]));

        assert_eq!(
            fields(&mappings),
            vec![
                (0, CanonicalField::No),
                (1, CanonicalField::ItemName),
                (2, CanonicalField::ItemType),
            ]
        );
        assert_eq!(mappings[1].confidence, 100);
        assert_eq!(mappings[2].confidence, 100);
    }

    #[test]
    fn test_type_goes_to_test_type_in_test_case_sheet() {
        let mappings = map_headers(&headers(&["ID", "Scenario", "Type", "Expected Result"]));

        assert_eq!(
            fields(&mappings),
            vec![
                (0, CanonicalField::Id),
                (1, CanonicalField::Scenario),
                (2, CanonicalField::Type),
                (3, CanonicalField::Expected),
            ]
        );
    }

    #[test]
    fn test_japanese_headers() {
        let mappings = map_headers(&headers(&["項番", "項目名", "種別", "必須/任意", "遷移先", "結果"]));

        assert_eq!(
            fields(&mappings),
            vec![
                (0, CanonicalField::No),
                (1, CanonicalField::ItemName),
                (2, CanonicalField::ItemType),
                (3, CanonicalField::RequiredOptional),
                (4, CanonicalField::NavigationDestination),
                (5, CanonicalField::Status),
            ]
        );
    }

    #[test]
    fn test_substring_match_confidence() {
        let mappings = map_headers(&headers(&["Expected Result (JP)"]));

        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].canonical_field, CanonicalField::Expected);
        assert!((70..=90).contains(&mappings[0].confidence));
        assert_eq!(mappings[0].source_header, "Expected Result (JP)");
    }

    #[test]
    fn test_fuzzy_match_typo() {
        let mappings = map_headers(&headers(&["Priorty", "Precondtion"]));

        assert_eq!(
            fields(&mappings),
            vec![(0, CanonicalField::Priority), (1, CanonicalField::Precondition)]
        );
        assert!(mappings.iter().all(|m| (40..=69).contains(&m.confidence)));
    }

    #[test]
    fn test_short_words_do_not_fuzzy_match() {
        let header_row = headers(&["ID", "Date", "Expected"]);
        let mappings = map_headers(&header_row);

        assert_eq!(fields(&mappings), vec![(0, CanonicalField::Id), (2, CanonicalField::Expected)]);
        assert_eq!(
            extra_columns(&header_row, &mappings),
            vec![ExtraColumn { source_index: 1, header: "Date".to_string() }]
        );

        assert!(map_headers(&headers(&["Test Date"])).is_empty());
    }

    #[test]
    fn test_unknown_headers_unmapped() {
        let header_row = headers(&["Foo", "Bar Baz", ""]);
        let mappings = map_headers(&header_row);

        assert!(mappings.is_empty());
        assert_eq!(extra_columns(&header_row, &mappings).len(), 3);
    }

    #[test]
    fn test_field_claimed_once() {
        let header_row = headers(&["Notes", "Remarks", "Scenario"]);
        let mappings = map_headers(&header_row);

        assert_eq!(
            fields(&mappings),
            vec![(0, CanonicalField::Notes), (2, CanonicalField::Scenario)]
        );
        let extras = extra_columns(&header_row, &mappings);
        assert_eq!(extras, vec![ExtraColumn { source_index: 1, header: "Remarks".to_string() }]);
    }

    #[test]
    fn test_loser_demoted_to_next_candidate() {
        // "Expected Title" prefers `expected`, which column 0 already holds.
        let mappings = map_headers(&headers(&["Expected", "Expected Title"]));

        assert_eq!(
            fields(&mappings),
            vec![(0, CanonicalField::Expected), (1, CanonicalField::Scenario)]
        );
        assert!(mappings[1].confidence < 90);
    }

    #[test]
    fn test_equal_scores_go_to_lower_column() {
        let mappings = map_headers(&headers(&["Test Case ID", "ID"]));
        assert_eq!(mappings[0].canonical_field, CanonicalField::Id);
        assert_eq!(mappings[0].source_index, 0);
        assert!(mappings.iter().all(|m| m.source_index != 1 || m.canonical_field != CanonicalField::Id));
    }

    #[test]
    fn test_min_confidence_threshold() {
        let strict = HeaderMapper::new(MapperConfig { min_confidence: 95, ..Default::default() });
        let mappings = strict.map(&headers(&["Expected Result (JP)", "Status"]));

        assert_eq!(fields(&mappings), vec![(1, CanonicalField::Status)]);
    }

    #[test]
    fn test_custom_alias_table() {
        let table = AliasTable::new().with_alias(CanonicalField::Endpoint, "Ressource");
        let mapper = HeaderMapper::with_aliases(MapperConfig::default(), &table);
        let mappings = mapper.map(&headers(&["Ressource", "Status"]));

        assert_eq!(fields(&mappings), vec![(0, CanonicalField::Endpoint)]);
    }

    #[test]
    fn test_family_detection() {
        let mapper = HeaderMapper::default();
        assert_eq!(mapper.family(&headers(&["Item Name", "Action"])), Some(FieldFamily::UiSpec));
        assert_eq!(mapper.family(&headers(&["Scenario", "Expected"])), Some(FieldFamily::TestCase));
        assert_eq!(mapper.family(&headers(&["No", "Type"])), None);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let header_row = headers(&["No", "Item", "Type", "Type", "Memo", "Memo"]);
        assert_eq!(map_headers(&header_row), map_headers(&header_row));
    }
}
