//! Response cookies and their `Set-Cookie` rendering.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{HttpError, Result};

/// Characters a raw cookie name may not contain.
const RESERVED_CHARS: &[char] = &['=', ',', ';', ' ', '\t', '\r', '\n', '\x0b', '\x0c'];

const NAME_ENCODE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_');
const VALUE_ENCODE: &AsciiSet = &NAME_ENCODE.remove(b'~');

/// How far back a tombstone's expiry is put: one year and a second.
const TOMBSTONE_AGE: Duration = Duration::from_secs(31_536_001);

/// `Fri, 31 Dec 9999 23:59:59 GMT`, the last instant an HTTP date can hold.
const LATEST_EXPIRES: Duration = Duration::from_secs(253_402_300_799);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    None,
    Lax,
    Strict,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::None => "None",
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
        }
    }

    pub fn parse(value: &str) -> Option<SameSite> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(SameSite::None),
            "lax" => Some(SameSite::Lax),
            "strict" => Some(SameSite::Strict),
            _ => None,
        }
    }
}

/// `(name, path, domain)`: a jar holds one cookie per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookieKey {
    pub name: String,
    pub path: String,
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    /// `None` marks a tombstone.
    value: Option<String>,
    domain: Option<String>,
    path: String,
    /// `None` for a session cookie.
    expires: Option<SystemTime>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
    raw: bool,
}

impl Cookie {
    /// A session cookie on `/`, HttpOnly, whose name and value are
    /// percent-encoded on output.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Cookie> {
        let name = name.into();
        if name.is_empty() {
            return Err(HttpError::InvalidArgument("the cookie name cannot be empty".into()));
        }

        Ok(Cookie {
            name,
            value: Some(value.into()),
            domain: None,
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: true,
            same_site: None,
            raw: false,
        })
    }

    /// A cookie rendered verbatim; its name must be a plain token.
    pub fn raw(name: impl Into<String>, value: impl Into<String>) -> Result<Cookie> {
        let mut cookie = Cookie::new(name, value)?;
        if cookie.name.contains(RESERVED_CHARS) {
            return Err(HttpError::InvalidArgument(format!(
                "the cookie name \"{}\" contains invalid characters",
                cookie.name
            )));
        }
        cookie.raw = true;
        Ok(cookie)
    }

    /// A deletion instruction for the client: no value, expired a year ago.
    pub fn tombstone(name: impl Into<String>, path: Option<&str>, domain: Option<&str>) -> Result<Cookie> {
        let mut cookie = Cookie::new(name, "")?;
        cookie.value = None;
        cookie.path = path.unwrap_or("/").to_string();
        cookie.domain = domain.map(str::to_string);
        cookie.expires = Some(SystemTime::now() - TOMBSTONE_AGE);
        Ok(cookie)
    }

    /// Parses a `Set-Cookie` header value. Parsed cookies are raw and, unless
    /// the header says so, neither secure nor HttpOnly.
    pub fn from_set_cookie_str(header: &str) -> Result<Cookie> {
        let mut parts = header.split(';');
        let pair = parts.next().unwrap_or_default().trim();
        let (name, value) = match pair.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (pair, ""),
        };

        let mut cookie = Cookie::raw(name, value)?;
        cookie.http_only = false;

        let mut max_age = None;
        for attribute in parts {
            let (key, val) = match attribute.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (attribute.trim(), None),
            };

            match (key.to_ascii_lowercase().as_str(), val) {
                ("expires", Some(v)) => cookie.expires = httpdate::parse_http_date(v).ok(),
                ("max-age", Some(v)) => max_age = v.parse::<i64>().ok(),
                ("domain", Some(v)) if !v.is_empty() => cookie.domain = Some(v.to_string()),
                ("path", Some(v)) if !v.is_empty() => cookie.path = v.to_string(),
                ("secure", _) => cookie.secure = true,
                ("httponly", _) => cookie.http_only = true,
                ("samesite", Some(v)) => cookie.same_site = SameSite::parse(v),
                _ => {}
            }
        }

        // Max-Age wins over Expires.
        if let Some(secs) = max_age {
            let now = SystemTime::now();
            cookie.expires = Some(if secs > 0 {
                let expires = now.checked_add(Duration::from_secs(secs as u64));
                clamp_expires(expires.unwrap_or(UNIX_EPOCH + LATEST_EXPIRES))
            } else {
                now - TOMBSTONE_AGE
            });
        }

        if cookie.value.as_deref() == Some("") && cookie.is_cleared() {
            cookie.value = None;
        }

        Ok(cookie)
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.is_empty() { "/".to_string() } else { path };
        self
    }

    /// Times an HTTP date can't express are clamped to 1970..=9999.
    pub fn with_expires(mut self, expires: SystemTime) -> Self {
        self.expires = Some(clamp_expires(expires));
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// `SameSite=None` forces the cookie to be secure.
    pub fn with_same_site(mut self, same_site: Option<SameSite>) -> Self {
        self.same_site = same_site;
        if same_site == Some(SameSite::None) {
            self.secure = true;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn expires(&self) -> Option<SystemTime> {
        self.expires
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Whether the client will drop this cookie on receipt.
    pub fn is_cleared(&self) -> bool {
        self.is_tombstone() || matches!(self.expires, Some(t) if t < SystemTime::now())
    }

    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            path: self.path.clone(),
            domain: self.domain.clone(),
        }
    }

    /// Seconds until expiry, clamped at zero.
    pub fn max_age(&self) -> u64 {
        self.expires
            .and_then(|t| t.duration_since(SystemTime::now()).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

fn clamp_expires(expires: SystemTime) -> SystemTime {
    expires.clamp(UNIX_EPOCH, UNIX_EPOCH + LATEST_EXPIRES)
}

impl fmt::Display for Cookie {
    /// The `Set-Cookie` header value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw {
            write!(f, "{}=", self.name)?;
        } else {
            write!(f, "{}=", utf8_percent_encode(&self.name, NAME_ENCODE))?;
        }

        match &self.value {
            Some(value) if self.raw => f.write_str(value)?,
            Some(value) => write!(f, "{}", utf8_percent_encode(value, VALUE_ENCODE))?,
            None => {}
        }

        if let Some(expires) = self.expires {
            let max_age = if self.is_tombstone() { 0 } else { self.max_age() };
            write!(f, "; Expires={}; Max-Age={}", httpdate::fmt_http_date(expires), max_age)?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain)?;
        }
        write!(f, "; Path={}", self.path)?;
        if self.secure || self.same_site == Some(SameSite::None) {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; SameSite={}", same_site.as_str())?;
        }
        Ok(())
    }
}
