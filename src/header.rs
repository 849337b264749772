//! Parsing of a single part's RFC 7230-ish header block.

use http::{HeaderMap, HeaderName, HeaderValue};

/// Parses a raw header block (the bytes preceding a CRLF-CRLF match) into a
/// case-insensitive multi-map.
///
/// The block is decoded as UTF-8 with lossy replacement; lines are split on
/// CRLF or bare LF. A line lacking `:` is silently ignored, matching the
/// tolerance the wire grammar documents for per-part headers.
pub fn parse_header_block(raw: &[u8]) -> HeaderMap {
    let text = String::from_utf8_lossy(raw);
    let mut headers = HeaderMap::new();

    for line in text.split(['\n']).map(|l| l.trim_end_matches('\r')) {
        if line.is_empty() {
            continue;
        }
        let Some(colon) = line.find(':') else {
            continue;
        };
        let name = line[..colon].trim();
        let value = line[colon + 1..].trim();
        if name.is_empty() {
            continue;
        }
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            continue;
        };
        headers.append(name, value);
    }

    headers
}

/// Extracts the `name` parameter from a `Content-Disposition` header value.
pub fn extract_name(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(http::header::CONTENT_DISPOSITION)?.to_str().ok()?;
    get_param(raw, "name")
}

/// Extracts the `filename` parameter from a `Content-Disposition` header value.
pub fn extract_filename(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(http::header::CONTENT_DISPOSITION)?.to_str().ok()?;
    get_param(raw, "filename")
}

/// Extracts the base value of `Content-Type` (the portion before the first `;`).
pub fn extract_content_type(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(http::header::CONTENT_TYPE)?.to_str().ok()?;
    let base = raw.split(';').next().unwrap_or(raw).trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

/// Extracts the `boundary` parameter from a `Content-Type` header value,
/// validating it against the RFC 2046 §5.1.1 length restriction (1-70 chars).
pub fn extract_boundary(content_type: &str) -> Option<String> {
    if !content_type.trim_start().starts_with("multipart/") {
        return None;
    }
    let boundary = get_param(content_type, "boundary")?;
    if boundary.is_empty() || boundary.len() > 70 {
        return None;
    }
    Some(boundary)
}

/// Finds parameter `key` inside a `;`-separated header value such as
/// `form-data; name="avatar"; filename="pic.png"`.
///
/// Handles unquoted tokens, double-quoted strings (quotes stripped),
/// best-effort percent-decoding, and a malformed-pair recovery rule: if an
/// `=` appears to the right of the next `;`, the segment is skipped and
/// parsing resumes at that `;`.
fn get_param(value: &str, key: &str) -> Option<String> {
    let mut rest = value;
    // Skip the leading disposition-type token (e.g. "form-data").
    if let Some(idx) = rest.find(';') {
        rest = &rest[idx + 1..];
    } else {
        return None;
    }

    loop {
        let rest_trimmed = rest.trim_start();
        if rest_trimmed.is_empty() {
            return None;
        }

        let next_semi = find_unquoted_semicolon(rest_trimmed);
        let segment = match next_semi {
            Some(idx) => &rest_trimmed[..idx],
            None => rest_trimmed,
        };

        let Some(eq) = segment.find('=') else {
            // No '=' in this segment at all; move past it.
            match next_semi {
                Some(idx) => {
                    rest = &rest_trimmed[idx + 1..];
                    continue;
                }
                None => return None,
            }
        };

        let param_name = segment[..eq].trim();
        if param_name.eq_ignore_ascii_case(key) {
            let raw_value = segment[eq + 1..].trim();
            return Some(decode_param_value(raw_value));
        }

        match next_semi {
            Some(idx) => rest = &rest_trimmed[idx + 1..],
            None => return None,
        }
    }
}

/// Finds the index of the next `;` that is not inside a quoted string.
fn find_unquoted_semicolon(s: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (idx, ch) in s.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => return Some(idx),
            _ => {}
        }
    }
    None
}

fn decode_param_value(raw: &str) -> String {
    let unquoted = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    };
    percent_decode_best_effort(unquoted)
}

/// Decodes `%XX` octets; falls back to the raw substring if decoding fails
/// (e.g. a trailing `%` or non-hex digits).
fn percent_decode_best_effort(s: &str) -> String {
    if !s.contains('%') {
        return s.to_string();
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(byte) = decode_hex_pair(bytes.get(i + 1), bytes.get(i + 2)) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    match String::from_utf8(out) {
        Ok(decoded) => decoded,
        Err(_) => s.to_string(),
    }
}

fn decode_hex_pair(hi: Option<&u8>, lo: Option<&u8>) -> Option<u8> {
    let hi = hex_digit(*hi?)?;
    let lo = hex_digit(*lo?)?;
    Some((hi << 4) | lo)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_header_block() {
        let raw = b"Content-Disposition: form-data; name=\"u\"\r\nContent-Type: text/plain\r\n";
        let headers = parse_header_block(raw);
        assert_eq!(extract_name(&headers).as_deref(), Some("u"));
        assert_eq!(extract_content_type(&headers).as_deref(), Some("text/plain"));
        assert_eq!(extract_filename(&headers), None);
    }

    #[test]
    fn ignores_lines_without_colon() {
        let raw = b"not-a-header-line\r\nContent-Type: text/plain\r\n";
        let headers = parse_header_block(raw);
        assert_eq!(extract_content_type(&headers).as_deref(), Some("text/plain"));
    }

    #[test]
    fn extracts_filename_and_name_with_percent_decoding() {
        let raw = b"Content-Disposition: form-data; name=\"file\"; filename=\"na%20me.png\"\r\n";
        let headers = parse_header_block(raw);
        assert_eq!(extract_name(&headers).as_deref(), Some("file"));
        assert_eq!(extract_filename(&headers).as_deref(), Some("na me.png"));
    }

    #[test]
    fn falls_back_to_raw_on_bad_percent_sequence() {
        let raw = b"Content-Disposition: form-data; name=\"file\"; filename=\"bad%zzvalue\"\r\n";
        let headers = parse_header_block(raw);
        assert_eq!(extract_filename(&headers).as_deref(), Some("bad%zzvalue"));
    }

    #[test]
    fn recovers_from_malformed_pair() {
        // The "weird" segment has no '=' before the next ';', recovery should
        // skip to it and still find filename.
        let raw = b"Content-Disposition: form-data; weird; name=\"u\"; filename=\"f.txt\"\r\n";
        let headers = parse_header_block(raw);
        assert_eq!(extract_name(&headers).as_deref(), Some("u"));
        assert_eq!(extract_filename(&headers).as_deref(), Some("f.txt"));
    }

    #[test]
    fn tolerates_bare_lf_line_endings() {
        let raw = b"Content-Disposition: form-data; name=\"u\"\nContent-Type: text/plain\n";
        let headers = parse_header_block(raw);
        assert_eq!(extract_name(&headers).as_deref(), Some("u"));
        assert_eq!(extract_content_type(&headers).as_deref(), Some("text/plain"));
    }

    #[test]
    fn missing_content_disposition_yields_none() {
        let raw = b"Content-Type: text/plain\r\n";
        let headers = parse_header_block(raw);
        assert_eq!(extract_name(&headers), None);
        assert_eq!(extract_filename(&headers), None);
    }
}
