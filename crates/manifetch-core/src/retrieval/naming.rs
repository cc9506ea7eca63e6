//! File names for downloads whose destination is a directory.
//!
//! The name comes from the `Content-Disposition` header when the server sends
//! one, else from the last URL path segment, and is sanitized for Linux
//! filesystems.

/// Used when neither the header nor the URL yields a usable name.
pub const FALLBACK_FILE_NAME: &str = "download.bin";

/// Name to save `url` under inside a destination directory.
///
/// `target_file_name("https://example.com/a/archive.zip", None)` is
/// `"archive.zip"`; a `Content-Disposition: attachment; filename="r.pdf"`
/// header wins over the URL.
pub fn target_file_name(url: &str, content_disposition: Option<&str>) -> String {
    content_disposition
        .and_then(disposition_file_name)
        .or_else(|| last_path_segment(url))
        .map(|raw| sanitize(&raw))
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode(segment);
    (!decoded.is_empty()).then_some(decoded)
}

/// `filename*=UTF-8''...` takes precedence over `filename=...`.
fn disposition_file_name(header: &str) -> Option<String> {
    let mut plain = None;
    for param in header.split(';') {
        let Some((key, value)) = param.trim().split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "filename*" => {
                let lower = value.to_ascii_lowercase();
                if lower.starts_with("utf-8''") {
                    let decoded = percent_decode(&value["utf-8''".len()..]);
                    if !decoded.is_empty() {
                        return Some(decoded);
                    }
                }
            }
            "filename" => {
                let unquoted = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .map(|v| v.replace("\\\"", "\"").replace("\\\\", "\\"))
                    .unwrap_or_else(|| value.to_string());
                if !unquoted.is_empty() {
                    plain = Some(unquoted);
                }
            }
            _ => {}
        }
    }
    plain
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(b) = hex {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Linux NAME_MAX, in bytes.
const NAME_MAX: usize = 255;

/// Longest extension kept intact when a name has to be shortened.
const MAX_KEPT_EXTENSION: usize = 16;

/// Strip path separators, NUL and control characters, and leading or
/// trailing dots and spaces. Runs of underscores collapse to one and the
/// result fits in NAME_MAX bytes.
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c == '/' || c == '\\' { '_' } else { c };
        if c.is_control() || (c == '_' && out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }
    truncate_name(out.trim_matches(|c: char| c == '.' || c == ' '))
}

/// Cut `name` to NAME_MAX bytes on a char boundary, keeping a short
/// extension such as `.iso` on the end.
fn truncate_name(name: &str) -> String {
    if name.len() <= NAME_MAX {
        return name.to_string();
    }
    let ext = name
        .rfind('.')
        .map(|i| &name[i..])
        .filter(|ext| ext.len() <= MAX_KEPT_EXTENSION)
        .unwrap_or("");
    let mut take = NAME_MAX - ext.len();
    while !name.is_char_boundary(take) {
        take -= 1;
    }
    format!("{}{}", &name[..take], ext)
}
