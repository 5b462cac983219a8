//! Query string parsing, building and normalization.

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use url::form_urlencoded;

/// RFC 3986 unreserved characters stay as they are.
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Parses `a=1&b=2` into a map. `+` decodes to a space; a repeated key keeps
/// its first position and its last value; empty keys are dropped.
pub fn parse_query(qs: &str) -> IndexMap<String, String> {
    let mut params = IndexMap::new();
    for pair in qs.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode(key);
        if key.is_empty() {
            continue;
        }
        params.insert(key, decode(value));
    }
    params
}

/// Form-encodes parameters (`+` for spaces).
pub fn build_query<'a>(params: impl IntoIterator<Item = (&'a String, &'a String)>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// A canonical query string: keys sorted, RFC 3986 percent-encoding, `&`
/// separators. Empty input gives an empty string.
pub fn normalize_query_string(qs: Option<&str>) -> String {
    let qs = qs.unwrap_or_default();
    if qs.is_empty() {
        return String::new();
    }

    let mut params = parse_query(qs);
    params.sort_keys();

    params
        .iter()
        .map(|(k, v)| format!("{}={}", utf8_percent_encode(k, RFC3986), utf8_percent_encode(v, RFC3986)))
        .collect::<Vec<_>>()
        .join("&")
}

fn decode(s: &str) -> String {
    percent_decode_str(&s.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}
