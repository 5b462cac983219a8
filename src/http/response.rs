use std::fmt;
use std::io::Write;

use crate::error::{HttpError, Result};
use crate::http::HttpVersion;
use crate::http::request::Request;
use crate::http::response_headers::ResponseHeaderBag;
use crate::http::status::{self, HttpStatus};

const UNKNOWN_STATUS: &str = "unknown status";

#[derive(Debug, Clone)]
pub struct Response {
    pub headers: ResponseHeaderBag,
    content: String,
    version: HttpVersion,
    status_code: u16,
    status_text: String,
}

impl Response {
    /// Fails with [`HttpError::InvalidStatusCode`] for codes outside
    /// `100..600`.
    pub fn new(content: impl Into<String>, status: u16, headers: ResponseHeaderBag) -> Result<Response> {
        let mut response = Response {
            headers,
            content: content.into(),
            version: HttpVersion::V1_0,
            status_code: 0,
            status_text: String::new(),
        };
        response.set_status_code(status, None)?;
        Ok(response)
    }

    /// An empty response with a registered status.
    pub fn from_status(status: HttpStatus) -> Response {
        Response {
            headers: ResponseHeaderBag::new(),
            content: String::new(),
            version: HttpVersion::V1_0,
            status_code: status.code(),
            status_text: status.reason().to_string(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Sets the status. Without `text` the registered reason phrase is
    /// used, or `unknown status` for unregistered codes.
    pub fn set_status_code(&mut self, code: u16, text: Option<&str>) -> Result<&mut Self> {
        if !status::is_valid_code(code) {
            return Err(HttpError::InvalidStatusCode(code));
        }

        self.status_code = code;
        self.status_text = match text {
            Some(text) => text.to_string(),
            None => status::reason_phrase(code).unwrap_or(UNKNOWN_STATUS).to_string(),
        };
        Ok(self)
    }

    pub fn protocol_version(&self) -> HttpVersion {
        self.version
    }

    pub fn set_protocol_version(&mut self, version: HttpVersion) -> &mut Self {
        self.version = version;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> &mut Self {
        self.content = content.into();
        self
    }

    pub fn is_invalid(&self) -> bool {
        !status::is_valid_code(self.status_code)
    }

    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.status_code)
    }

    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }

    pub fn is_forbidden(&self) -> bool {
        self.status_code == 403
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }

    /// Whether this redirects, optionally to `location`.
    pub fn is_redirect(&self, location: Option<&str>) -> bool {
        matches!(self.status_code, 201 | 301 | 302 | 303 | 307 | 308)
            && location.is_none_or(|l| self.headers.get("Location") == Some(l))
    }

    /// 204 and 304 never carry a body.
    pub fn is_empty(&self) -> bool {
        matches!(self.status_code, 204 | 304)
    }

    /// Reconciles the headers with `request` right before sending.
    ///
    /// Calling it twice is not guaranteed to give the same result as
    /// calling it once. An invalid method override on `request` is reported
    /// only after every other step has been applied.
    pub fn prepare(&mut self, request: &mut Request) -> Result<&mut Self> {
        let mut method_check = Ok(());

        if self.is_informational() || self.is_empty() {
            self.content.clear();
            self.headers.remove("Content-Type");
            self.headers.remove("Content-Length");
        } else {
            let charset = request.config().default_charset.clone();

            if !self.headers.has("Content-Type") {
                let format = request.request_format(None);
                if let Some(mime) = format.as_deref().and_then(Request::mime_type) {
                    self.headers.set("Content-Type", mime, true);
                }
            }

            match self.headers.get("Content-Type").map(str::to_string) {
                None => {
                    let content_type = format!("text/html; charset={}", charset);
                    self.headers.set("Content-Type", content_type, true);
                }
                Some(ct) if is_text(&ct) && !ct.to_ascii_lowercase().contains("charset") => {
                    let content_type = format!("{}; charset={}", ct, charset);
                    self.headers.set("Content-Type", content_type, true);
                }
                Some(_) => {}
            }

            if self.headers.has("Transfer-Encoding") {
                self.headers.remove("Content-Length");
            }

            // Content-Length stays: it describes the GET this HEAD mirrors.
            match request.is_method("HEAD") {
                Ok(true) => self.content.clear(),
                Ok(false) => {}
                Err(err) => method_check = Err(err),
            }
        }

        if request.server.get("SERVER_PROTOCOL") != Some("HTTP/1.0") {
            self.version = HttpVersion::V1_1;
        }

        if self.version == HttpVersion::V1_0 && self.headers.has_cache_control_directive("no-cache") {
            self.headers.set("Pragma", "no-cache", true);
            self.headers.set("Expires", "-1", true);
        }

        method_check?;
        Ok(self)
    }

    /// Status line, one line per header value, `Set-Cookie` lines and the
    /// blank line.
    pub fn send_headers(&mut self, out: &mut impl Write) -> Result<()> {
        write!(out, "HTTP/{} {} {}\r\n", self.version, self.status_code, self.status_text)?;
        for (name, values) in self.headers.all_preserve_case_without_cookies() {
            for value in values {
                write!(out, "{}: {}\r\n", name, value)?;
            }
        }
        for cookie in self.headers.cookies() {
            write!(out, "Set-Cookie: {}\r\n", cookie)?;
        }
        out.write_all(b"\r\n")?;
        Ok(())
    }

    pub fn send_content(&self, out: &mut impl Write) -> Result<()> {
        out.write_all(self.content.as_bytes())?;
        Ok(())
    }

    pub fn send(&mut self, out: &mut impl Write) -> Result<()> {
        self.send_headers(out)?;
        self.send_content(out)?;
        out.flush()?;
        Ok(())
    }
}

fn is_text(content_type: &str) -> bool {
    content_type.get(..5).is_some_and(|prefix| prefix.eq_ignore_ascii_case("text/"))
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{} {} {}\r\n", self.version, self.status_code, self.status_text)?;
        write!(f, "{}\r\n", self.headers)?;
        f.write_str(&self.content)
    }
}
