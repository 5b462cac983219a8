pub mod cache_control;
pub mod cookie;
pub mod forwarded;
pub mod headers;
pub mod parameters;
pub mod query;
pub mod request;
pub mod response;
pub mod response_headers;
pub mod server_bag;
pub mod status;

use std::fmt;

/// HTTP versions a [`Response`](response::Response) can be sent with.
#[derive(PartialEq, PartialOrd, Eq, Debug, Clone, Copy)]
pub enum HttpVersion {
    V1_0,
    V1_1,
}

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::V1_0 => "1.0",
            HttpVersion::V1_1 => "1.1",
        }
    }

    /// Parse a bare version (`1.1`) or a protocol string (`HTTP/1.1`).
    pub fn parse(version: &str) -> Option<HttpVersion> {
        match version.strip_prefix("HTTP/").unwrap_or(version) {
            "1.0" => Some(HttpVersion::V1_0),
            "1.1" => Some(HttpVersion::V1_1),
            _ => None,
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The methods a POST may be overridden to without further checks.
///
/// Any other override must still be an all-uppercase ASCII token.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Patch,
    Purge,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Purge => "PURGE",
            HttpMethod::Trace => "TRACE",
        }
    }
}

pub fn http_method_from_str(method: &str) -> Option<HttpMethod> {
    match method {
        "GET" => Some(HttpMethod::Get),
        "HEAD" => Some(HttpMethod::Head),
        "POST" => Some(HttpMethod::Post),
        "PUT" => Some(HttpMethod::Put),
        "DELETE" => Some(HttpMethod::Delete),
        "CONNECT" => Some(HttpMethod::Connect),
        "OPTIONS" => Some(HttpMethod::Options),
        "PATCH" => Some(HttpMethod::Patch),
        "PURGE" => Some(HttpMethod::Purge),
        "TRACE" => Some(HttpMethod::Trace),
        _ => None,
    }
}

/// Normalized lookup key for a header name: lowercase, `_` folded to `-`.
pub(crate) fn header_key(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '_' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}
