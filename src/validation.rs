//! Shared request validation used by both HTTP routes and CLI commands.

use base64::Engine;

use crate::config::{LengthBounds, Range};
use crate::summarizer::LengthParams;

/// Resolve requested lengths against the configured ranges, filling
/// defaults. Each value is checked against its own range only; an inverted
/// pair is passed through to the model.
pub fn resolve_lengths(
    bounds: &LengthBounds,
    max_length: Option<usize>,
    min_length: Option<usize>,
) -> Result<LengthParams, String> {
    Ok(LengthParams {
        max_length: check_range("max_length", &bounds.max_length, max_length)?,
        min_length: check_range("min_length", &bounds.min_length, min_length)?,
    })
}

fn check_range(field: &str, range: &Range, value: Option<usize>) -> Result<usize, String> {
    let v = value.unwrap_or(range.default);
    if v < range.min || v > range.max {
        return Err(format!("{field} must be between {} and {} (got {v})", range.min, range.max));
    }
    Ok(v)
}

/// Decode a base64 file payload and enforce the upload cap.
pub fn decode_upload(data: &str, max_bytes: usize) -> Result<Vec<u8>, String> {
    // base64 inflates by 4/3; reject before decoding anything huge
    if data.len() / 4 * 3 > max_bytes + 3 {
        return Err(format!("File too large. Maximum is {max_bytes} bytes."));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| format!("Invalid base64 file data: {e}"))?;
    if bytes.len() > max_bytes {
        return Err(format!("File too large ({} bytes). Maximum is {max_bytes} bytes.", bytes.len()));
    }
    Ok(bytes)
}

/// Sanitize error messages to avoid leaking internal paths or implementation details.
pub fn sanitize_error(e: &impl std::fmt::Display) -> String {
    let msg = e.to_string();
    if msg.contains('/') || msg.contains('\\') {
        return "Internal error".to_string();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_lengths() {
        let p = resolve_lengths(&LengthBounds::default(), None, None).unwrap();
        assert_eq!(p, LengthParams { max_length: 200, min_length: 50 });
    }

    #[test]
    fn out_of_range_is_rejected() {
        let b = LengthBounds::default();
        assert!(resolve_lengths(&b, Some(501), None).unwrap_err().contains("max_length"));
        assert!(resolve_lengths(&b, None, Some(5)).unwrap_err().contains("min_length"));
    }

    #[test]
    fn inverted_pair_passes_through() {
        let p = resolve_lengths(&LengthBounds::default(), Some(60), Some(100)).unwrap();
        assert_eq!(p, LengthParams { max_length: 60, min_length: 100 });
    }

    #[test]
    fn decodes_and_caps_uploads() {
        assert_eq!(decode_upload("aGVsbG8=", 10).unwrap(), b"hello");
        assert!(decode_upload("aGVsbG8=", 3).is_err());
        assert!(decode_upload("%%%", 10).is_err());
    }

    #[test]
    fn sanitize_hides_paths() {
        assert_eq!(sanitize_error(&"failed at /home/me/x"), "Internal error");
        assert_eq!(sanitize_error(&r"cannot open C:\Users\me\doc.pdf"), "Internal error");
        assert_eq!(sanitize_error(&"bad input"), "bad input");
    }
}
