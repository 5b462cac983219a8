//! HTTP headers abstraction for [`Request`](crate::http::request::Request) and
//! [`Response`](crate::http::response::Response).
//!
//! Headers are stored in an ordered map keyed by a normalized name
//! (lowercase, `_` folded to `-`), so lookups are case-insensitive and
//! accept CGI-style names. The casing a name was first set with is kept for
//! output. Every header may carry several values.
//!
//! `Cache-Control` is held twice: as its raw header value and as a parsed
//! directive map (see [`cache_control`](crate::http::cache_control)). Every
//! mutation through either view re-derives the other one.

use indexmap::IndexMap;
use std::fmt;
use std::time::SystemTime;

use crate::error::{HttpError, Result};
use crate::http::cache_control::{self, Directive, Directives};
use crate::http::header_key;

const CACHE_CONTROL: &str = "cache-control";

/// One or many header values, as accepted at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValues {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValues {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            HeaderValues::Single(v) => vec![v],
            HeaderValues::Multiple(vs) => vs,
        }
    }
}

impl From<&str> for HeaderValues {
    fn from(v: &str) -> Self {
        HeaderValues::Single(v.to_string())
    }
}

impl From<String> for HeaderValues {
    fn from(v: String) -> Self {
        HeaderValues::Single(v)
    }
}

impl From<&String> for HeaderValues {
    fn from(v: &String) -> Self {
        HeaderValues::Single(v.clone())
    }
}

impl From<Vec<String>> for HeaderValues {
    fn from(vs: Vec<String>) -> Self {
        HeaderValues::Multiple(vs)
    }
}

impl From<Vec<&str>> for HeaderValues {
    fn from(vs: Vec<&str>) -> Self {
        HeaderValues::Multiple(vs.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HeaderValues {
    fn from(vs: [&str; N]) -> Self {
        HeaderValues::Multiple(vs.iter().map(|v| v.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBag {
    headers: IndexMap<String, HeaderEntry>,
    cache_control: Directives,
}

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<HeaderValues>,
    {
        let mut bag = Self::new();
        bag.add(headers);
        bag
    }

    /// Stores `values` under `name`, replacing or appending to what is there.
    pub fn set(&mut self, name: &str, values: impl Into<HeaderValues>, replace: bool) {
        let key = header_key(name);
        let values = values.into().into_vec();

        match self.headers.get_mut(&key) {
            Some(entry) if !replace => entry.values.extend(values),
            Some(entry) => entry.values = values,
            None => {
                self.headers.insert(
                    key.clone(),
                    HeaderEntry {
                        name: name.to_string(),
                        values,
                    },
                );
            }
        }

        if key == CACHE_CONTROL {
            self.cache_control = cache_control::parse(&self.all(CACHE_CONTROL).join(", "));
        }
    }

    /// Sets every header of `headers`, each one replacing what was stored.
    pub fn add<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<HeaderValues>,
    {
        for (name, values) in headers {
            self.set(name.as_ref(), values, true);
        }
    }

    /// Drops every header, then sets `headers`.
    pub fn replace<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<HeaderValues>,
    {
        self.headers.clear();
        self.cache_control.clear();
        self.add(headers);
    }

    /// First value stored for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&header_key(name))
            .and_then(|entry| entry.values.first())
            .map(String::as_str)
    }

    /// Every value stored for `name`; empty when absent.
    pub fn all(&self, name: &str) -> &[String] {
        self.headers
            .get(&header_key(name))
            .map(|entry| entry.values.as_slice())
            .unwrap_or(&[])
    }

    /// Iterates headers in insertion order as `(normalized key, values)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.headers
            .iter()
            .map(|(key, entry)| (key.as_str(), entry.values.as_slice()))
    }

    /// Iterates headers in insertion order with their first-seen casing.
    pub fn iter_preserve_case(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.headers
            .values()
            .map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.headers.keys().map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.headers.contains_key(&header_key(name))
    }

    /// Whether `value` is one of the values stored for `name`.
    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.all(name).iter().any(|v| v == value)
    }

    pub fn remove(&mut self, name: &str) {
        let key = header_key(name);
        self.headers.shift_remove(&key);

        if key == CACHE_CONTROL {
            self.cache_control.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Parses `name` as an HTTP date.
    pub fn date(&self, name: &str) -> Result<Option<SystemTime>> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => httpdate::parse_http_date(value).map(Some).map_err(|_| {
                HttpError::InvalidArgument(format!(
                    "the \"{}\" HTTP header is not parseable ({})",
                    name, value
                ))
            }),
        }
    }

    pub fn cache_control_directives(&self) -> &Directives {
        &self.cache_control
    }

    pub fn cache_control_directive(&self, key: &str) -> Option<&Directive> {
        self.cache_control.get(key)
    }

    pub fn has_cache_control_directive(&self, key: &str) -> bool {
        self.cache_control.contains_key(key)
    }

    pub fn add_cache_control_directive(&mut self, key: &str, value: impl Into<Directive>) {
        self.cache_control.insert(key.to_ascii_lowercase(), value.into());
        self.sync_cache_control_header();
    }

    pub fn add_cache_control_flag(&mut self, key: &str) {
        self.add_cache_control_directive(key, Directive::Flag);
    }

    pub fn remove_cache_control_directive(&mut self, key: &str) {
        self.cache_control.shift_remove(key);
        self.sync_cache_control_header();
    }

    /// The serialized directive map.
    pub fn cache_control_header(&self) -> String {
        cache_control::serialize(&self.cache_control)
    }

    fn sync_cache_control_header(&mut self) {
        if self.cache_control.is_empty() {
            self.headers.shift_remove(CACHE_CONTROL);
            return;
        }

        let value = self.cache_control_header();
        match self.headers.get_mut(CACHE_CONTROL) {
            Some(entry) => entry.values = vec![value],
            None => {
                self.headers.insert(
                    CACHE_CONTROL.to_string(),
                    HeaderEntry {
                        name: "Cache-Control".to_string(),
                        values: vec![value],
                    },
                );
            }
        }
    }
}

impl fmt::Display for HeaderBag {
    /// `Name: v1, v2\r\n` per header, in insertion order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, values) in self.iter_preserve_case() {
            write!(f, "{}: {}\r\n", name, values.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(headers: &[(&str, &str)]) -> HeaderBag {
        HeaderBag::from_headers(headers.iter().copied())
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let b = bag(&[("Content-Type", "text/html"), ("X_FOO", "bar")]);
        assert_eq!(b.get("content-type"), Some("text/html"));
        assert_eq!(b.get("CONTENT_TYPE"), Some("text/html"));
        assert_eq!(b.get("x-foo"), Some("bar"));
        assert!(b.has("X-Foo"));
        assert_eq!(b.get("missing"), None);
    }

    #[test]
    fn set_appends_or_replaces() {
        let mut b = HeaderBag::new();
        b.set("Accept", "text/html", true);
        b.set("accept", "application/json", false);
        assert_eq!(b.all("ACCEPT"), ["text/html", "application/json"]);

        b.set("Accept", vec!["a", "b"], true);
        assert_eq!(b.all("accept"), ["a", "b"]);
        assert_eq!(b.get("accept"), Some("a"));
    }

    #[test]
    fn first_seen_casing_is_kept() {
        let mut b = HeaderBag::new();
        b.set("X-Request-ID", "1", true);
        b.set("x-request-id", "2", true);
        assert_eq!(b.to_string(), "X-Request-ID: 2\r\n");
    }

    #[test]
    fn display_joins_values_in_insertion_order() {
        let mut b = bag(&[("B", "1"), ("A", "2")]);
        b.set("b", "3", false);
        assert_eq!(b.to_string(), "B: 1, 3\r\nA: 2\r\n");
        assert_eq!(HeaderBag::new().to_string(), "");
    }

    #[test]
    fn replace_and_remove() {
        let mut b = bag(&[("foo", "bar")]);
        b.replace([("NOPE", "BAR")]);
        assert!(!b.has("foo"));
        assert!(b.has("nope"));

        b.remove("Nope");
        assert!(b.is_empty());
        assert_eq!(b.keys().count(), 0);
    }

    #[test]
    fn contains_checks_every_value() {
        let b = HeaderBag::from_headers([("foo", vec!["bar", "baz"])]);
        assert!(b.contains("foo", "baz"));
        assert!(!b.contains("foo", "nope"));
        assert!(!b.contains("nope", "bar"));
    }

    #[test]
    fn date_parsing() {
        let b = bag(&[("Date", "Sun, 06 Nov 1994 08:49:37 GMT"), ("Bad", "yesterday")]);
        let parsed = b.date("date").unwrap().unwrap();
        assert_eq!(httpdate::fmt_http_date(parsed), "Sun, 06 Nov 1994 08:49:37 GMT");
        assert!(b.date("missing").unwrap().is_none());
        assert!(matches!(b.date("bad"), Err(HttpError::InvalidArgument(_))));
    }

    #[test]
    fn cache_control_header_drives_directives() {
        let mut b = bag(&[("Cache-Control", "public, max-age=10")]);
        assert!(b.has_cache_control_directive("public"));
        assert_eq!(b.cache_control_directive("max-age").and_then(Directive::as_str), Some("10"));

        b.set("cache-control", "no-store", true);
        assert!(!b.has_cache_control_directive("public"));
        assert!(b.has_cache_control_directive("no-store"));

        b.remove("Cache-Control");
        assert!(b.cache_control_directives().is_empty());
    }

    #[test]
    fn directives_drive_cache_control_header() {
        let mut b = HeaderBag::new();
        b.add_cache_control_directive("max-age", 100);
        assert_eq!(b.get("Cache-Control"), Some("max-age=100"));

        b.add_cache_control_flag("public");
        assert_eq!(b.get("Cache-Control"), Some("public, max-age=100"));

        b.remove_cache_control_directive("max-age");
        assert_eq!(b.get("Cache-Control"), Some("public"));

        b.remove_cache_control_directive("public");
        assert!(!b.has("Cache-Control"));
    }

    #[test]
    fn quoted_zero_survives_the_bag() {
        let b = bag(&[("Cache-Control", "private, max-age=\"0\"")]);
        assert_eq!(b.cache_control_directive("max-age").and_then(Directive::as_str), Some("0"));
        assert!(!b.cache_control_directive("max-age").unwrap().is_flag());
    }

    #[test]
    fn clones_are_independent() {
        let mut a = bag(&[("Cache-Control", "max-age=1")]);
        let b = a.clone();
        a.add_cache_control_directive("max-age", 2);
        assert_eq!(b.get("cache-control"), Some("max-age=1"));
        assert_eq!(a.get("cache-control"), Some("max-age=2"));
    }
}
