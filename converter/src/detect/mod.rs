//! Input type detection: markdown prose vs. tabular paste.
//!
//! Each signal found in the content adds weight to one side. The side
//! with more weight wins; confidence is the winner's weight minus half
//! the loser's, clamped to 0..=100. Lines inside fenced code blocks are
//! ignored for delimiter statistics.
//!
//! Classification never fails. With no signals at all the verdict is
//! `Table` with confidence 0, since an accidental paste is usually a
//! spreadsheet selection.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{InputAnalysis, InputType};
use crate::parser::{detect_delimiter, normalize_newlines, Delimiter};

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:>\s*)*#{1,6}\s+\S").expect("valid heading regex"));

/// Tunable thresholds for the classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Share of non-blank lines that must hold the delimiter to count as a table.
    pub table_ratio_threshold: f64,
    /// Share above which the delimiter signal is considered strong.
    pub strong_ratio_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            table_ratio_threshold: 0.5,
            strong_ratio_threshold: 0.8,
        }
    }
}

/// Raw statistics gathered in one pass over the content.
#[derive(Debug, Default)]
struct Signals {
    non_blank: usize,
    delimiter: Option<Delimiter>,
    delimiter_lines: usize,
    /// Share of delimiter lines with the most common delimiter count.
    uniform_ratio: f64,
    quote_lines: usize,
    heading_lines: usize,
    quoted_heading: bool,
    has_fence: bool,
    sentence_lines: usize,
    length_variation: f64,
}

impl Signals {
    fn collect(content: &str) -> Self {
        let mut signals = Signals::default();
        let mut in_fence = false;
        let mut lines: Vec<&str> = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                signals.has_fence = true;
                in_fence = !in_fence;
                continue;
            }
            if in_fence || trimmed.is_empty() {
                continue;
            }

            lines.push(line);

            if trimmed.starts_with('>') {
                signals.quote_lines += 1;
            }
            if HEADING.is_match(trimmed) {
                signals.heading_lines += 1;
                if trimmed.starts_with('>') {
                    signals.quoted_heading = true;
                }
            }
            if trimmed.ends_with(['.', '!', '?', '。', '！', '？']) {
                signals.sentence_lines += 1;
            }
        }

        signals.non_blank = lines.len();
        if lines.is_empty() {
            return signals;
        }

        // Same decision the parser makes, so the verdict describes the
        // matrix the builder will actually read.
        let chosen = match detect_delimiter(content) {
            Delimiter::None => None,
            delimiter => Some(delimiter),
        };

        if let Some(delimiter) = chosen {
            let ch = delimiter.as_char().unwrap_or(',');
            let counts: Vec<usize> = lines
                .iter()
                .map(|l| l.matches(ch).count())
                .filter(|c| *c > 0)
                .collect();
            signals.delimiter = Some(delimiter);
            signals.delimiter_lines = counts.len();
            signals.uniform_ratio = modal_share(&counts);
        }

        signals.length_variation = coefficient_of_variation(&lines);
        signals
    }

    fn ratio(&self, count: usize) -> f64 {
        if self.non_blank == 0 {
            0.0
        } else {
            count as f64 / self.non_blank as f64
        }
    }
}

/// Share of values equal to the most frequent value. Smallest value wins ties.
fn modal_share(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mut best = 0;
    let mut run = 0;
    for (i, v) in sorted.iter().enumerate() {
        run = if i > 0 && sorted[i - 1] == *v { run + 1 } else { 1 };
        best = best.max(run);
    }
    best as f64 / values.len() as f64
}

fn coefficient_of_variation(lines: &[&str]) -> f64 {
    let lengths: Vec<f64> = lines.iter().map(|l| l.chars().count() as f64).collect();
    let n = lengths.len() as f64;
    let mean = lengths.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

/// A fired signal: weight toward one side plus its description.
struct Evidence {
    weight: u32,
    reason: String,
}

#[derive(Default)]
struct Tally {
    evidence: Vec<Evidence>,
}

impl Tally {
    fn add(&mut self, weight: u32, reason: impl Into<String>) {
        self.evidence.push(Evidence { weight, reason: reason.into() });
    }

    fn score(&self) -> u32 {
        self.evidence.iter().map(|e| e.weight).sum()
    }

    /// Heaviest signal; earliest wins ties.
    fn dominant(&self) -> Option<&str> {
        let mut best: Option<&Evidence> = None;
        for e in &self.evidence {
            if best.map_or(true, |b| e.weight > b.weight) {
                best = Some(e);
            }
        }
        best.map(|e| e.reason.as_str())
    }
}

/// Classifier over pasted content
#[derive(Debug, Clone, Default)]
pub struct InputDetector {
    config: DetectorConfig,
}

impl InputDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Classify `content` as markdown or table.
    pub fn detect(&self, content: &str) -> InputAnalysis {
        let content = normalize_newlines(content);
        let signals = Signals::collect(&content);

        let mut table = Tally::default();
        let mut markdown = Tally::default();

        let delimiter_ratio = signals.ratio(signals.delimiter_lines);
        let majority = delimiter_ratio > self.config.table_ratio_threshold;

        if let Some(delimiter) = signals.delimiter {
            let name = match delimiter {
                Delimiter::Tab => "tab",
                Delimiter::Pipe => "pipe",
                _ => "comma",
            };
            let pct = (delimiter_ratio * 100.0).round() as u32;
            if majority {
                table.add(40, format!("{} delimiter present in {}% of lines", name, pct));
            }
            if delimiter_ratio > self.config.strong_ratio_threshold {
                table.add(20, format!("{} delimiter on nearly every line", name));
            }
            if signals.delimiter_lines >= 2 && signals.uniform_ratio >= 0.8 {
                table.add(20, "uniform column count across lines");
            }
            if delimiter == Delimiter::Tab && majority {
                table.add(20, "tab-separated spreadsheet paste");
            }
        }

        let quote_ratio = signals.ratio(signals.quote_lines);
        if quote_ratio > 0.5 {
            markdown.add(40, format!("block-quote markers on {}% of lines", (quote_ratio * 100.0).round() as u32));
        } else if signals.quote_lines > 0 {
            markdown.add(20, "block-quote markers present");
        }
        if signals.quoted_heading {
            markdown.add(30, "block-quote heading detected");
        } else if signals.heading_lines > 0 {
            markdown.add(30, "markdown heading detected");
        }
        if signals.has_fence {
            markdown.add(20, "fenced code block present");
        }
        if signals.ratio(signals.sentence_lines) > 0.5 {
            markdown.add(15, "lines read as sentences");
        }
        if !majority && signals.non_blank >= 3 && signals.length_variation > 0.6 {
            markdown.add(10, "irregular line lengths");
        }

        let table_score = table.score();
        let markdown_score = markdown.score();
        let has_markdown_markers = signals.quote_lines > 0 || signals.heading_lines > 0;

        let input_type = if markdown_score > table_score {
            InputType::Markdown
        } else if table_score > markdown_score {
            InputType::Table
        } else if has_markdown_markers {
            InputType::Markdown
        } else {
            InputType::Table
        };

        let (winner, loser) = match input_type {
            InputType::Markdown => (&markdown, &table),
            InputType::Table => (&table, &markdown),
        };
        let confidence = winner.score().saturating_sub(loser.score() / 2).min(100) as u8;

        let reason = winner
            .dominant()
            .map(str::to_string)
            .unwrap_or_else(|| "no structural signals found, defaulting to table".to_string());

        InputAnalysis { input_type, confidence, reason }
    }
}

/// Classify content with default thresholds.
pub fn detect_input_type(content: &str) -> InputAnalysis {
    InputDetector::default().detect(content)
}
