//! The CGI-style environment of a request and the headers derived from it.
//!
//! Web servers hand request metadata over as a flat string map: headers as
//! `HTTP_*` keys, the entity headers `CONTENT_TYPE`/`CONTENT_LENGTH`/
//! `CONTENT_MD5` without prefix, and credentials split over several
//! `PHP_AUTH_*`/`REDIRECT_*` keys depending on the SAPI and on whether an
//! internal redirect happened. [`ServerBag::headers`] folds all of that back
//! into a header map with a single `Authorization` value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;

const ENTITY_HEADERS: [&str; 3] = ["CONTENT_TYPE", "CONTENT_LENGTH", "CONTENT_MD5"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerBag {
    parameters: IndexMap<String, String>,
}

impl ServerBag {
    pub fn new<I, K, V>(parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.parameters.shift_remove(key)
    }

    pub fn all(&self) -> &IndexMap<String, String> {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// A present, non-empty entry.
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Derives the request headers from the environment.
    ///
    /// `Authorization` is synthesized from, in order: `PHP_AUTH_USER`
    /// (+ `PHP_AUTH_PW`), a `Basic`/`Digest`/`Bearer` value in
    /// `HTTP_AUTHORIZATION` or `REDIRECT_HTTP_AUTHORIZATION`, and
    /// `PHP_AUTH_DIGEST`. Failing all of those, `REDIRECT_HTTP_AUTHORIZATION`
    /// is used verbatim. An `Authorization` header already supplied by the
    /// environment is never replaced.
    pub fn headers(&self) -> IndexMap<String, String> {
        let mut headers = IndexMap::new();

        for (key, value) in &self.parameters {
            if let Some(name) = key.strip_prefix("HTTP_") {
                if !name.is_empty() {
                    headers.insert(title_case(name), value.clone());
                }
            } else if ENTITY_HEADERS.contains(&key.as_str()) && !value.is_empty() {
                headers.insert(title_case(key), value.clone());
            }
        }

        if let Some(user) = self.get("PHP_AUTH_USER") {
            headers.insert("Php-Auth-User".to_string(), user.to_string());
            headers.insert(
                "Php-Auth-Pw".to_string(),
                self.get("PHP_AUTH_PW").unwrap_or_default().to_string(),
            );
        } else {
            let authorization = self
                .get("HTTP_AUTHORIZATION")
                .or_else(|| self.get("REDIRECT_HTTP_AUTHORIZATION"));

            if let Some(authorization) = authorization {
                if let Some(credentials) = strip_scheme(authorization, "basic ") {
                    if let Some((user, pw)) = decode_basic(credentials) {
                        headers.insert("Php-Auth-User".to_string(), user);
                        headers.insert("Php-Auth-Pw".to_string(), pw);
                    }
                } else if self.non_empty("PHP_AUTH_DIGEST").is_none()
                    && strip_scheme(authorization, "digest ").is_some()
                {
                    headers.insert("Php-Auth-Digest".to_string(), authorization.to_string());
                } else if strip_scheme(authorization, "bearer ").is_some() {
                    headers.insert("Authorization".to_string(), authorization.to_string());
                }
            }
        }

        if let Some(digest) = self.non_empty("PHP_AUTH_DIGEST") {
            headers
                .entry("Php-Auth-Digest".to_string())
                .or_insert_with(|| digest.to_string());
        }

        if headers.contains_key("Authorization") {
            return headers;
        }

        if let Some(user) = headers.get("Php-Auth-User") {
            let pw = headers.get("Php-Auth-Pw").map(String::as_str).unwrap_or_default();
            let basic = format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pw)));
            headers.insert("Authorization".to_string(), basic);
        } else if let Some(digest) = headers.get("Php-Auth-Digest").cloned() {
            headers.insert("Authorization".to_string(), digest);
        } else if let Some(raw) = self.non_empty("REDIRECT_HTTP_AUTHORIZATION") {
            // Schemes we don't decode survive the redirect as sent.
            headers.insert("Authorization".to_string(), raw.to_string());
        }

        headers
    }
}

/// `X_FORWARDED_FOR` -> `X-Forwarded-For`.
fn title_case(name: &str) -> String {
    name.split('_')
        .map(|segment| {
            let lower = segment.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Case-insensitive scheme prefix match, returning what follows it.
fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let head = value.get(..scheme.len())?;
    head.eq_ignore_ascii_case(scheme)
        .then(|| &value[scheme.len()..])
}

fn decode_basic(credentials: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(credentials.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pw) = decoded.split_once(':')?;
    Some((user.to_string(), pw.to_string()))
}
