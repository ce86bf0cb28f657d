//! Encoding detection and transcoding for files read from disk.
//!
//! Detection follows XML 1.0 Appendix F: a byte order mark wins, otherwise
//! the `encoding=` pseudo-attribute of the XML declaration, otherwise UTF-8.
//! Conversion is delegated to `encoding_rs`.

use thiserror::Error;

/// An error raised while detecting or converting the input encoding.
#[derive(Debug, Clone, Error)]
pub enum EncodingError {
    #[error("unsupported encoding: {0}")]
    Unsupported(String),
    #[error("malformed byte sequence for encoding {0}")]
    Malformed(String),
}

/// Inspects the byte order mark. Returns the encoding label and the number
/// of BOM bytes to skip.
///
/// # Examples
///
/// ```
/// use tixi::encoding::detect_encoding;
///
/// assert_eq!(detect_encoding(b"\xEF\xBB\xBF<a/>"), ("UTF-8", 3));
/// assert_eq!(detect_encoding(b"<a/>"), ("UTF-8", 0));
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => ("UTF-8", 3),
        [0xFE, 0xFF, ..] => ("UTF-16BE", 2),
        [0xFF, 0xFE, ..] => ("UTF-16LE", 2),
        _ => ("UTF-8", 0),
    }
}

/// Transcodes `bytes` from the named encoding into UTF-8.
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown or the bytes are
/// malformed for that encoding.
pub fn transcode(bytes: &[u8], label: &str) -> Result<String, EncodingError> {
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| EncodingError::Unsupported(label.to_string()))?;
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::Malformed(label.to_string()));
    }
    Ok(text.into_owned())
}

/// Decodes raw XML bytes into a UTF-8 string.
///
/// # Errors
///
/// Returns `EncodingError` if the bytes do not decode under the detected
/// or declared encoding.
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, EncodingError> {
    let (bom_encoding, skip) = detect_encoding(bytes);
    let content = &bytes[skip..];

    if bom_encoding != "UTF-8" {
        return transcode(content, bom_encoding);
    }

    match declared_encoding(content) {
        Some(label) if !is_utf8_label(&label) => transcode(content, &label),
        _ => std::str::from_utf8(content)
            .map(str::to_string)
            .map_err(|_| EncodingError::Malformed("UTF-8".to_string())),
    }
}

/// Reads the `encoding` value from an XML declaration at the start of
/// `bytes`, treating them as ASCII.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(200)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&scan[..end]).ok()?;
    let after = decl[decl.find("encoding")? + "encoding".len()..].trim_start();
    let after = after.strip_prefix('=')?.trim_start();
    let quote = after.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let value = &after[1..];
    Some(value[..value.find(quote)?].to_string())
}

fn is_utf8_label(label: &str) -> bool {
    matches!(
        label.to_ascii_uppercase().as_str(),
        "UTF-8" | "UTF8" | "US-ASCII" | "ASCII"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_utf16_boms() {
        assert_eq!(detect_encoding(&[0xFE, 0xFF, 0, b'<']), ("UTF-16BE", 2));
        assert_eq!(detect_encoding(&[0xFF, 0xFE, b'<', 0]), ("UTF-16LE", 2));
    }

    #[test]
    fn test_decode_plain_utf8() {
        let text = decode_to_utf8("<a>é</a>".as_bytes()).unwrap();
        assert_eq!(text, "<a>é</a>");
    }

    #[test]
    fn test_decode_declared_latin1() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>\xE9</a>";
        let text = decode_to_utf8(bytes).unwrap();
        assert!(text.ends_with("<a>é</a>"));
    }

    #[test]
    fn test_decode_utf16le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<a/>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_to_utf8(&bytes).unwrap(), "<a/>");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert!(decode_to_utf8(b"<a>\xFF</a>").is_err());
    }

    #[test]
    fn test_transcode_reports_malformed_input() {
        assert!(matches!(
            transcode(&[b'<', 0, b'a'], "UTF-16LE"),
            Err(EncodingError::Malformed(_))
        ));
        assert_eq!(transcode(&[b'<', 0], "UTF-16LE").unwrap(), "<");
    }

    #[test]
    fn test_unknown_label() {
        assert!(matches!(
            transcode(b"x", "no-such-charset"),
            Err(EncodingError::Unsupported(_))
        ));
    }
}
