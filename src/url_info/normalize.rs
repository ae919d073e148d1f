//! The URL normalization pipeline: scheme/host lowercasing, IDNA, default
//! port dropping, path segment resolution, query canonicalization, and
//! trailing-slash handling, applied as a fixed sequence of numbered steps.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::query::{self, QueryPair};
use super::{Inner, URLInfo};

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "file"];
const DANGEROUS_SCHEMES: &[&str] = &["javascript", "data", "vbscript", "blob", "about"];

static EVENT_HANDLER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bon[a-z]+\s*=").expect("static regex"));

pub(super) fn parse(raw_input: &str, base: Option<&URLInfo>) -> URLInfo {
    // Step 1-2: trim, empty, control characters.
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return invalid(raw_input, "empty");
    }
    if trimmed.chars().any(is_control_char) {
        return invalid(raw_input, "control character in input");
    }

    // Security rejections that must happen before any parsing.
    let lowered = trimmed.to_lowercase();
    if contains_xss_pattern(&lowered) {
        return invalid(raw_input, "disallowed script-like content");
    }

    let explicit_scheme = extract_scheme(trimmed).map(str::to_lowercase);
    if let Some(scheme) = &explicit_scheme {
        if DANGEROUS_SCHEMES.contains(&scheme.as_str()) {
            return invalid(raw_input, format!("disallowed scheme: {scheme}"));
        }
        if scheme == "file" && base.is_some_and(|b| matches!(b.scheme(), "http" | "https")) {
            return invalid(raw_input, "file scheme not allowed relative to an http(s) base");
        }
    }

    // Step 3: resolve against base, or require an explicit scheme.
    if explicit_scheme.is_none() && base.is_none() {
        return invalid(raw_input, "missing scheme");
    }

    // Pre-resolution traversal check: url::Url silently absorbs a ".."
    // that would escape the root, so we must catch it before parsing.
    if detect_path_traversal_escape(trimmed, explicit_scheme.is_some(), base) {
        return invalid(raw_input, "path traversal escapes root");
    }

    let parsed = if explicit_scheme.is_some() {
        url::Url::parse(trimmed)
    } else {
        // Safety: base.is_some() was just checked above.
        let base_url = match url::Url::parse(base.expect("checked above").normalized()) {
            Ok(u) => u,
            Err(e) => return invalid(raw_input, format!("invalid base: {e}")),
        };
        base_url.join(trimmed)
    };
    let parsed = match parsed {
        Ok(u) => u,
        Err(e) => return invalid(raw_input, format!("parse error: {e}")),
    };

    // Step 4-5: scheme allow-list, lowercase.
    let scheme = parsed.scheme().to_lowercase();
    if !ALLOWED_SCHEMES.contains(&scheme.as_str()) {
        return invalid(raw_input, format!("disallowed scheme: {scheme}"));
    }

    // Credentials in the authority are always invalid.
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return invalid(raw_input, "credentials in authority are not allowed");
    }

    // Step 5-6: host lowercase + IDNA, step 7: label validation.
    let host = match parsed.host_str() {
        Some(h) => match encode_and_validate_host(&h.to_lowercase()) {
            Ok(h) => Some(h),
            Err(reason) => return invalid(raw_input, reason),
        },
        None if scheme == "file" => None,
        None => return invalid(raw_input, "missing host"),
    };

    if let Some(h) = &host {
        if let Some(reason) = reject_private_host(h) {
            return invalid(raw_input, reason);
        }
    }

    // Step 7: default port dropping.
    let port = parsed.port().filter(|&p| !is_default_port(&scheme, p));

    // Step 10: reject decoded NUL in path.
    let raw_path = parsed.path();
    if raw_path.to_ascii_lowercase().contains("%00") {
        return invalid(raw_input, "decoded NUL byte in path");
    }

    // Step 8-9: percent-case normalization, slash collapsing, trailing slash.
    let path = normalize_percent_encoding(raw_path);
    let path = collapse_slashes(&path);

    // Step 11: query parsing (reorder-insensitive equality handled by Hash/Eq).
    let query_pairs = query::parse_query(parsed.query().unwrap_or(""));

    // Step 12: fragment is unconditionally dropped (parsed.fragment() ignored).

    let registered_domain = host.as_deref().and_then(registered_domain_of);
    let subdomain = match (&host, &registered_domain) {
        (Some(h), Some(rd)) if h.len() > rd.len() + 1 => {
            Some(h[..h.len() - rd.len() - 1].to_string())
        }
        _ => None,
    };

    // Step 13: reassemble.
    let normalized = reassemble(&scheme, host.as_deref(), port, &path, &query_pairs);

    URLInfo {
        inner: std::sync::Arc::new(Inner {
            raw: raw_input.to_string(),
            normalized,
            scheme,
            host,
            port,
            path,
            query: query_pairs,
            registered_domain,
            subdomain,
            is_valid: true,
            error: None,
        }),
    }
}

fn invalid(raw: &str, reason: impl Into<String>) -> URLInfo {
    URLInfo {
        inner: std::sync::Arc::new(Inner {
            raw: raw.to_string(),
            normalized: String::new(),
            scheme: String::new(),
            host: None,
            port: None,
            path: String::new(),
            query: Vec::new(),
            registered_domain: None,
            subdomain: None,
            is_valid: false,
            error: Some(reason.into()),
        }),
    }
}

fn is_control_char(c: char) -> bool {
    matches!(c as u32, 0x00..=0x1F | 0x7F)
}

fn contains_xss_pattern(lowered: &str) -> bool {
    lowered.contains("<script")
        || lowered.contains("javascript:")
        || lowered.contains("vbscript:")
        || EVENT_HANDLER_RE.is_match(lowered)
}

/// Extract a leading `scheme:` prefix per RFC 3986 (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`).
fn extract_scheme(s: &str) -> Option<&str> {
    let colon = s.find(':')?;
    let candidate = &s[..colon];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.clone().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some(candidate)
}

fn is_default_port(scheme: &str, port: u16) -> bool {
    matches!((scheme, port), ("http", 80) | ("https", 443))
}

fn encode_and_validate_host(host: &str) -> Result<String, String> {
    if host.starts_with('[') && host.ends_with(']') {
        return Ok(host.to_string());
    }
    if host.parse::<Ipv4Addr>().is_ok() {
        return Ok(host.to_string());
    }
    let ascii = idna::domain_to_ascii(host).map_err(|_| "invalid internationalized host".to_string())?;
    if ascii.len() > 253 {
        return Err("host exceeds 253 characters".to_string());
    }
    for label in ascii.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err("invalid host label length".to_string());
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("host label has a leading/trailing hyphen".to_string());
        }
    }
    Ok(ascii)
}

fn reject_private_host(host: &str) -> Option<String> {
    if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        if let Ok(ip) = inner.parse::<Ipv6Addr>() {
            if ip.is_loopback() || is_unique_local_v6(&ip) {
                return Some("disallowed private/loopback IPv6 literal".to_string());
            }
        }
        return None;
    }
    if let Ok(IpAddr::V4(ip)) = host.parse::<IpAddr>() {
        if ip.is_loopback() || ip.is_private() {
            return Some("disallowed private/loopback IPv4 literal".to_string());
        }
    }
    None
}

fn is_unique_local_v6(ip: &Ipv6Addr) -> bool {
    (ip.octets()[0] & 0xfe) == 0xfc
}

fn registered_domain_of(host: &str) -> Option<String> {
    if host.starts_with('[') || host.parse::<IpAddr>().is_ok() {
        return None;
    }
    let domain = psl::domain(host.as_bytes())?;
    Some(String::from_utf8_lossy(domain.as_bytes()).into_owned())
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn is_unreserved_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// Decode percent-encoded unreserved characters to their literal form;
/// leave everything else (including reserved characters that happen to be
/// percent-encoded) as an upper-cased `%XX` escape.
fn normalize_percent_encoding(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                let byte = (h << 4) | l;
                if is_unreserved_byte(byte) {
                    out.push(byte);
                } else {
                    out.push(b'%');
                    out.push(bytes[i + 1].to_ascii_uppercase());
                    out.push(bytes[i + 2].to_ascii_uppercase());
                }
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn collapse_slashes(path: &str) -> String {
    static MULTI_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new("/{2,}").expect("static regex"));
    MULTI_SLASH.replace_all(path, "/").into_owned()
}

fn extract_path_portion(s: &str) -> &str {
    let end = s.find(['?', '#']).unwrap_or(s.len());
    &s[..end]
}

fn extract_abs_path(trimmed: &str) -> &str {
    if let Some(scheme_end) = trimmed.find("://") {
        let after = &trimmed[scheme_end + 3..];
        match after.find('/') {
            Some(i) => extract_path_portion(&after[i..]),
            None => "",
        }
    } else {
        ""
    }
}

fn percent_decode_ascii(seg: &str) -> String {
    urlencoding::decode(seg)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| seg.to_string())
}

/// Simulate RFC 3986 dot-segment removal and report whether a `..`
/// would need to pop past the root.
fn detect_path_traversal_escape(trimmed: &str, has_explicit_scheme: bool, base: Option<&URLInfo>) -> bool {
    let combined = if has_explicit_scheme {
        extract_abs_path(trimmed).to_string()
    } else if let Some(base) = base {
        let rel_path = extract_path_portion(trimmed);
        if rel_path.starts_with('/') {
            rel_path.to_string()
        } else {
            let base_path = base.path();
            let base_dir = match base_path.rfind('/') {
                Some(i) => &base_path[..=i],
                None => "/",
            };
            format!("{base_dir}{rel_path}")
        }
    } else {
        return false;
    };

    let mut depth: i32 = 0;
    for seg in combined.split('/') {
        match percent_decode_ascii(seg).as_str() {
            "" | "." => {}
            ".." => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            _ => depth += 1,
        }
    }
    false
}

fn reassemble(scheme: &str, host: Option<&str>, port: Option<u16>, path: &str, query: &[QueryPair]) -> String {
    let mut s = String::new();
    s.push_str(scheme);
    s.push_str("://");
    if let Some(h) = host {
        s.push_str(h);
    }
    if let Some(p) = port {
        s.push(':');
        s.push_str(&p.to_string());
    }
    let omit_bare_slash = path == "/" && query.is_empty();
    if !omit_bare_slash {
        s.push_str(path);
    }
    if !query.is_empty() {
        s.push('?');
        s.push_str(&query::encode_query(query));
    }
    s
}
