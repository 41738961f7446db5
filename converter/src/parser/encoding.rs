//! Byte decoding for callers that read files instead of pasted strings.
//!
//! Spreadsheet exports from Japanese Excel installs are often Shift_JIS,
//! European ones Windows-1252; everything ends up as a UTF-8 `String`
//! before it reaches the parser.

use std::path::Path;

use crate::error::{ParseError, ParseResult};

/// Decoded file content with the encoding that was used
#[derive(Debug, Clone)]
pub struct DecodedInput {
    pub content: String,
    pub encoding: String,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "shift_jis" | "sjis" | "cp932" | "windows-31j" => "shift_jis".to_string(),
        "euc-jp" => "euc-jp".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding label.
///
/// Malformed sequences are replaced rather than rejected; only an unknown
/// label is an error. A leading BOM is removed.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ParseResult<String> {
    let label = match encoding.to_lowercase().as_str() {
        "ascii" | "utf8" => "utf-8".to_string(),
        "latin1" | "latin-1" => "iso-8859-1".to_string(),
        other => other.to_string(),
    };

    let codec = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| ParseError::Encoding(format!("unsupported encoding '{}'", encoding)))?;

    let (decoded, _, _) = codec.decode(bytes);
    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Decode bytes with auto-detected encoding.
///
/// Falls back to lossy UTF-8 when chardet names something `encoding_rs`
/// does not know.
pub fn decode_auto(bytes: &[u8]) -> DecodedInput {
    let encoding = detect_encoding(bytes);
    match decode_content(bytes, &encoding) {
        Ok(content) => DecodedInput { content, encoding },
        Err(_) => DecodedInput {
            content: String::from_utf8_lossy(bytes)
                .trim_start_matches('\u{feff}')
                .to_string(),
            encoding: "utf-8".to_string(),
        },
    }
}

/// Read a file and decode it with auto-detected encoding.
pub fn read_file_auto<P: AsRef<Path>>(path: P) -> std::io::Result<DecodedInput> {
    let bytes = std::fs::read(path.as_ref())?;
    Ok(decode_auto(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_utf8_bom_stripped() {
        let bytes = b"\xEF\xBB\xBFID\tScenario";
        let decoded = decode_auto(bytes);
        assert_eq!(decoded.encoding, "utf-8");
        assert_eq!(decoded.content, "ID\tScenario");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_shift_jis_decoding() {
        // "項目名" in Shift_JIS
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("項目名");
        let decoded = decode_content(&bytes, "shift_jis").unwrap();
        assert_eq!(decoded, "項目名");
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = decode_content(b"abc", "klingon-8").unwrap_err();
        assert!(matches!(err, ParseError::Encoding(_)));
    }

    #[test]
    fn test_read_file_auto() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "No\tItem Name\n1\tTest Item").unwrap();

        let decoded = read_file_auto(file.path()).unwrap();
        assert_eq!(decoded.encoding, "utf-8");
        assert!(decoded.content.starts_with("No\tItem Name"));
    }
}
