//! Section extraction for block-quoted markdown.
//!
//! A `> ## Heading` line opens a section; following block-quoted lines are
//! its content until the next quoted heading. Anything else (unquoted
//! lines, quoted text before the first heading) lands in the raw message.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{ProseDocument, ProseSection};

static QUOTED_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^>\s*#{1,6}\s+(?P<title>.+?)\s*#*\s*$").expect("valid quoted heading regex")
});

/// Strip one block-quote marker and the single space after it.
fn unquote(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Join lines and trim blank lines at both ends.
fn join_block(lines: &[&str]) -> String {
    lines.join("\n").trim_matches('\n').trim_end().to_string()
}

/// Split block-quoted markdown into sections.
pub fn extract_sections(content: &str) -> ProseDocument {
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();
    let mut raw: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some(caps) = QUOTED_HEADING.captures(line.trim()) {
            sections.push((caps["title"].to_string(), Vec::new()));
            continue;
        }

        match (unquote(line), sections.last_mut()) {
            (Some(text), Some((_, body))) => body.push(text.trim_end()),
            _ => raw.push(line.trim_end()),
        }
    }

    ProseDocument {
        sections: sections
            .into_iter()
            .map(|(heading, body)| ProseSection { heading, content: join_block(&body) })
            .collect(),
        raw_message: join_block(&raw).trim().to_string(),
    }
}
