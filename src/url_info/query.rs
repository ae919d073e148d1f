//! Ordered query-string key/value pairs.

/// One `key=value` pair from a query string, in original document order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QueryPair {
    pub key: String,
    pub value: String,
}

/// Parse a raw (already-decoded-from-URL) query string into ordered pairs,
/// preserving duplicates and order. Splits on `&` only — `;` is never
/// treated as a pair separator.
pub(super) fn parse_query(raw: &str) -> Vec<QueryPair> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut parts = segment.splitn(2, '=');
            let key = parts.next().unwrap_or("");
            let value = parts.next().unwrap_or("");
            QueryPair {
                key: percent_decode(key),
                value: percent_decode(value),
            }
        })
        .collect()
}

/// Re-serialize pairs per `application/x-www-form-urlencoded`, preserving
/// the original order and duplicates.
pub(super) fn encode_query(pairs: &[QueryPair]) -> String {
    pairs
        .iter()
        .map(|p| format!("{}={}", form_encode(&p.key), form_encode(&p.value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_decode(s: &str) -> String {
    urlencoding::decode(&s.replace('+', " "))
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

fn form_encode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order_and_duplicates() {
        let pairs = parse_query("a=1&b=2&a=3");
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].key, "a");
        assert_eq!(pairs[2].value, "3");
    }

    #[test]
    fn round_trips_through_encode() {
        let pairs = parse_query("q=hello world&tag=rust%20lang");
        let encoded = encode_query(&pairs);
        assert_eq!(parse_query(&encoded), pairs);
    }
}
