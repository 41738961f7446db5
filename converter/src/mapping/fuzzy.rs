//! Header text normalization and approximate string matching.

/// Normalize a header cell for comparison.
///
/// Trims, folds full-width ASCII (`ＩＤ` → `id`), lowercases, turns
/// punctuation into spaces and collapses runs of whitespace. `#` is kept
/// because it is a header on its own ("#" for row number).
pub fn normalize_header(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .map(fold_full_width)
        .flat_map(char::to_lowercase)
        .map(|c| if is_separator_punct(c) { ' ' } else { c })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map U+FF01..=U+FF5E onto ASCII.
fn fold_full_width(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        _ => c,
    }
}

fn is_separator_punct(c: char) -> bool {
    if c == '#' {
        return false;
    }
    c.is_ascii_punctuation()
        || matches!(
            c,
            '、' | '。' | '・' | '「' | '」' | '『' | '』' | '【' | '】' | '〔' | '〕' | '〈' | '〉' | '《' | '》' | '※' | '…'
        )
}

/// Levenshtein distance over chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Edit distance when `header` reads as a typo of `alias`.
///
/// Headers with as many words as the alias compare word by word, so
/// "test date" is charged against "data" alone and not against the whole
/// alias. Every word that differs must be at least `min_len` chars in the
/// alias and within `ratio` of its length (at least one edit).
pub fn typo_distance(header: &str, alias: &str, ratio: f64, min_len: usize) -> Option<usize> {
    let header_words: Vec<&str> = header.split(' ').collect();
    let alias_words: Vec<&str> = alias.split(' ').collect();

    if header_words.len() > 1 && header_words.len() == alias_words.len() {
        let mut total = 0;
        for (h, a) in header_words.iter().zip(&alias_words) {
            if h != a {
                total += word_typo(h, a, ratio, min_len)?;
            }
        }
        return (total > 0).then_some(total);
    }

    word_typo(header, alias, ratio, min_len)
}

fn word_typo(header: &str, alias: &str, ratio: f64, min_len: usize) -> Option<usize> {
    let alias_len = alias.chars().count();
    if alias_len < min_len {
        return None;
    }
    let allowed = ((alias_len as f64 * ratio).floor() as usize).max(1);
    let distance = edit_distance(header, alias);
    (distance > 0 && distance <= allowed).then_some(distance)
}

/// Containment between two normalized strings.
///
/// Space-separated text must match on whole words ("id" is not inside
/// "valid"); text without spaces such as Japanese compares by chars.
/// Returns `(shorter_len, longer_len)` in chars when one contains the other.
pub fn containment(header: &str, alias: &str) -> Option<(usize, usize)> {
    let (short, long) = if header.chars().count() <= alias.chars().count() {
        (header, alias)
    } else {
        (alias, header)
    };
    let short_len = short.chars().count();
    let long_len = long.chars().count();

    if short_len < 2 || short == long {
        return None;
    }

    let contained = if short.is_ascii() && long.is_ascii() {
        contains_words(long, short)
    } else {
        long.contains(short)
    };

    contained.then_some((short_len, long_len))
}

fn contains_words(haystack: &str, needle: &str) -> bool {
    let hay: Vec<&str> = haystack.split(' ').collect();
    let words: Vec<&str> = needle.split(' ').collect();
    hay.windows(words.len()).any(|w| w == words.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Item   Name "), "item name");
        assert_eq!(normalize_header("Required/Optional"), "required optional");
        assert_eq!(normalize_header("No."), "no");
        assert_eq!(normalize_header("#"), "#");
        assert_eq!(normalize_header("Item_Name"), "item name");
        assert_eq!(normalize_header("ＩＤ"), "id");
        assert_eq!(normalize_header("項目名"), "項目名");
        assert_eq!(normalize_header("必須・任意"), "必須 任意");
        assert_eq!(normalize_header("\u{3000}期待結果\u{3000}"), "期待結果");
    }

    #[test]
    fn test_typo_distance() {
        assert_eq!(typo_distance("priorty", "priority", 0.34, 5), Some(1));
        assert_eq!(typo_distance("expected reslt", "expected result", 0.34, 5), Some(1));
        // Short words never absorb a typo, alone or inside a longer alias.
        assert_eq!(typo_distance("date", "data", 0.34, 5), None);
        assert_eq!(typo_distance("test date", "test data", 0.34, 5), None);
        assert_eq!(typo_distance("priority", "priority", 0.34, 5), None);
        assert_eq!(typo_distance("kitten", "sitting", 0.34, 5), None);
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("priority", "priorty"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("項目名", "項目"), 1);
    }

    #[test]
    fn test_containment_word_boundaries() {
        assert_eq!(containment("expected result jp", "expected result"), Some((15, 18)));
        assert_eq!(containment("valid", "id"), None);
        assert_eq!(containment("notes", "no"), None);
        assert_eq!(containment("期待結果欄", "期待結果"), Some((4, 5)));
        assert_eq!(containment("id", "id"), None);
    }
}
