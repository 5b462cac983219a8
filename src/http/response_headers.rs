//! Response headers: a [`HeaderBag`] plus a cookie jar, a self-healing
//! `Date` header and a default `Cache-Control`.
//!
//! Cookies never live in the generic header map. Setting `Set-Cookie`
//! parses the values into the jar, and they only come back out through
//! [`ResponseHeaderBag::cookies_flat`] (or the full-read helpers, which add
//! them under `Set-Cookie`).

use indexmap::IndexMap;
use std::fmt;
use std::ops::Deref;
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::error::Result;
use crate::http::cache_control::Directive;
use crate::http::cookie::{Cookie, CookieKey, SameSite};
use crate::http::header_key;
use crate::http::headers::{HeaderBag, HeaderValues};

const SET_COOKIE: &str = "set-cookie";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaderBag {
    headers: HeaderBag,
    cookies: IndexMap<CookieKey, Cookie>,
}

impl ResponseHeaderBag {
    pub fn new() -> Self {
        Self::from_headers(Vec::<(&str, &str)>::new())
    }

    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<HeaderValues>,
    {
        let mut bag = Self::default();
        bag.replace(headers);
        bag
    }

    /// Drops every header and cookie, sets `headers`, then derives `Date`
    /// and `Cache-Control` again when they are missing.
    pub fn replace<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<HeaderValues>,
    {
        self.headers = HeaderBag::new();
        self.cookies.clear();
        for (name, values) in headers {
            self.set(name.as_ref(), values, true);
        }

        if !self.headers.has("Cache-Control") {
            let default = self.default_cache_control();
            self.headers.set("Cache-Control", default, true);
        }
        self.ensure_date();
    }

    pub fn set(&mut self, name: &str, values: impl Into<HeaderValues>, replace: bool) {
        if header_key(name) != SET_COOKIE {
            self.headers.set(name, values, replace);
            return;
        }

        if replace {
            self.cookies.clear();
        }
        for value in values.into().into_vec() {
            match Cookie::from_set_cookie_str(&value) {
                Ok(cookie) => self.set_cookie(cookie),
                Err(err) => warn!(header = %value, error = %err, "ignoring unparsable Set-Cookie"),
            }
        }
    }

    /// Removing `Date` is allowed; it comes back on the next full read.
    pub fn remove(&mut self, name: &str) {
        if header_key(name) == SET_COOKIE {
            self.cookies.clear();
        } else {
            self.headers.remove(name);
        }
    }

    pub fn add_cache_control_directive(&mut self, key: &str, value: impl Into<Directive>) {
        self.headers.add_cache_control_directive(key, value);
    }

    pub fn add_cache_control_flag(&mut self, key: &str) {
        self.headers.add_cache_control_flag(key);
    }

    pub fn remove_cache_control_directive(&mut self, key: &str) {
        self.headers.remove_cache_control_directive(key);
    }

    /// Upserts `cookie` by its `(name, path, domain)` key.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie.key(), cookie);
    }

    /// Removes a cookie.
    ///
    /// With `forget_only` the jar entry is just dropped and the client keeps
    /// its copy. Otherwise a tombstone (HttpOnly, not secure) replaces it so
    /// the client deletes the cookie.
    pub fn remove_cookie(
        &mut self,
        name: &str,
        path: Option<&str>,
        domain: Option<&str>,
        forget_only: bool,
    ) -> Result<()> {
        if forget_only {
            self.forget_cookie(name, path, domain);
            return Ok(());
        }
        self.clear_cookie(name, path, domain, false, true, None)
    }

    /// Drops the jar entry without telling the client.
    pub fn forget_cookie(&mut self, name: &str, path: Option<&str>, domain: Option<&str>) {
        let key = CookieKey {
            name: name.to_string(),
            path: path.unwrap_or("/").to_string(),
            domain: domain.map(str::to_string),
        };
        self.cookies.shift_remove(&key);
    }

    /// Upserts a tombstone carrying the given attributes.
    pub fn clear_cookie(
        &mut self,
        name: &str,
        path: Option<&str>,
        domain: Option<&str>,
        secure: bool,
        http_only: bool,
        same_site: Option<SameSite>,
    ) -> Result<()> {
        let tombstone = Cookie::tombstone(name, path, domain)?
            .with_secure(secure)
            .with_http_only(http_only)
            .with_same_site(same_site);
        self.set_cookie(tombstone);
        Ok(())
    }

    pub fn cookies(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.values()
    }

    /// One `Set-Cookie` value per jar entry, tombstones included.
    pub fn cookies_flat(&self) -> Vec<String> {
        self.cookies.values().map(Cookie::to_string).collect()
    }

    /// Every header with its first-seen casing, cookies under `Set-Cookie`.
    pub fn all_preserve_case(&mut self) -> Vec<(String, Vec<String>)> {
        let mut all = self.all_preserve_case_without_cookies();
        if !self.cookies.is_empty() {
            all.push(("Set-Cookie".to_string(), self.cookies_flat()));
        }
        all
    }

    pub fn all_preserve_case_without_cookies(&mut self) -> Vec<(String, Vec<String>)> {
        self.ensure_date();
        self.headers
            .iter_preserve_case()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect()
    }

    /// Every header by normalized key, cookies under `set-cookie`.
    pub fn all_headers(&mut self) -> Vec<(String, Vec<String>)> {
        self.ensure_date();
        let mut all: Vec<_> = self
            .headers
            .iter()
            .map(|(key, values)| (key.to_string(), values.to_vec()))
            .collect();
        if !self.cookies.is_empty() {
            all.push((SET_COOKIE.to_string(), self.cookies_flat()));
        }
        all
    }

    /// Puts `Date` back if a caller removed it.
    pub fn ensure_date(&mut self) {
        if !self.headers.has("Date") {
            debug!("regenerating Date header");
            self.headers.set("Date", now_http_date(), true);
        }
    }

    fn default_cache_control(&self) -> &'static str {
        if self.headers.has("ETag") || self.headers.has("Last-Modified") || self.headers.has("Expires") {
            "private, must-revalidate"
        } else {
            "no-cache, private"
        }
    }
}

impl Deref for ResponseHeaderBag {
    type Target = HeaderBag;

    fn deref(&self) -> &HeaderBag {
        &self.headers
    }
}

impl fmt::Display for ResponseHeaderBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.headers.has("Date") {
            write!(f, "Date: {}\r\n", now_http_date())?;
        }
        write!(f, "{}", self.headers)?;
        for cookie in self.cookies.values() {
            write!(f, "Set-Cookie: {}\r\n", cookie)?;
        }
        Ok(())
    }
}

/// IMF-fixdate for the current time.
pub(crate) fn now_http_date() -> String {
    httpdate::fmt_http_date(SystemTime::now())
}
