//! Proxy-supplied client information: `Forwarded` and `X-Forwarded-*`.
//!
//! These headers are only believed when the direct peer is one of the
//! configured trusted proxies. When both the RFC 7239 `Forwarded` header and
//! its `X-Forwarded-*` counterpart are trusted and present they have to
//! agree; otherwise the request is rejected with
//! [`HttpError::ConflictingHeaders`].

use std::net::IpAddr;
use tracing::warn;

use crate::config::{RequestConfig, TrustedHeaders};
use crate::error::{HttpError, Result};
use crate::http::headers::HeaderBag;

/// Placeholder in the trusted proxy list for "whoever connected".
pub const REMOTE_ADDR: &str = "REMOTE_ADDR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardedParam {
    For,
    Host,
    Proto,
    Port,
}

impl ForwardedParam {
    pub fn header(self) -> &'static str {
        match self {
            ForwardedParam::For => "X-Forwarded-For",
            ForwardedParam::Host => "X-Forwarded-Host",
            ForwardedParam::Proto => "X-Forwarded-Proto",
            ForwardedParam::Port => "X-Forwarded-Port",
        }
    }

    /// The `Forwarded` pair carrying the same information. Ports travel
    /// inside `host`.
    fn forwarded_key(self) -> &'static str {
        match self {
            ForwardedParam::For => "for",
            ForwardedParam::Host | ForwardedParam::Port => "host",
            ForwardedParam::Proto => "proto",
        }
    }

    fn is_trusted(self, trusted: &TrustedHeaders) -> bool {
        match self {
            ForwardedParam::For => trusted.x_forwarded_for,
            ForwardedParam::Host => trusted.x_forwarded_host,
            ForwardedParam::Proto => trusted.x_forwarded_proto,
            ForwardedParam::Port => trusted.x_forwarded_port,
        }
    }
}

/// Whether `remote_addr` matches an entry of `trusted` (IP or CIDR).
pub fn is_trusted_proxy(remote_addr: &str, trusted: &[String]) -> bool {
    trusted
        .iter()
        .any(|entry| entry == REMOTE_ADDR || ip_matches(remote_addr, entry))
}

/// Values for `param`, from `X-Forwarded-*` and/or `Forwarded`.
///
/// The caller is responsible for checking that the peer is trusted.
pub fn trusted_values(headers: &HeaderBag, config: &RequestConfig, param: ForwardedParam) -> Result<Vec<String>> {
    let client_values = if param.is_trusted(&config.trusted_headers) {
        headers
            .get(param.header())
            .map(split_list)
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let forwarded_values = if config.trusted_headers.forwarded {
        headers
            .get("Forwarded")
            .map(|value| forwarded_pairs(value, param))
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    if forwarded_values.is_empty() {
        return Ok(client_values);
    }
    if client_values.is_empty() || client_values == forwarded_values {
        return Ok(forwarded_values);
    }

    warn!(
        header = param.header(),
        forwarded = ?forwarded_values,
        client = ?client_values,
        "conflicting proxy headers"
    );
    Err(HttpError::ConflictingHeaders(format!(
        "the request has both a trusted \"Forwarded\" header and a trusted \"{}\" header, conflicting with each other",
        param.header()
    )))
}

/// `1.2.3.4:80` / `[::1]:80` -> the bare address.
pub fn strip_port(value: &str) -> &str {
    if let Some(rest) = value.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    if value.parse::<IpAddr>().is_ok() {
        return value;
    }
    match value.rsplit_once(':') {
        Some((host, _)) if !host.contains(':') => host,
        _ => value,
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn forwarded_pairs(header: &str, param: ForwardedParam) -> Vec<String> {
    let mut values = Vec::new();

    for element in header.split(',') {
        for pair in element.split(';') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            if !key.trim().eq_ignore_ascii_case(param.forwarded_key()) {
                continue;
            }

            let value = value.trim().trim_matches('"');
            if param == ForwardedParam::Port {
                if value.ends_with(']') {
                    continue;
                }
                if let Some((_, port)) = value.rsplit_once(':') {
                    values.push(port.to_string());
                }
            } else {
                values.push(value.to_string());
            }
        }
    }

    values
}

fn ip_matches(ip: &str, entry: &str) -> bool {
    let Ok(ip) = ip.parse::<IpAddr>() else {
        return false;
    };
    let (network, bits) = match entry.split_once('/') {
        Some((network, bits)) => match bits.parse::<u32>() {
            Ok(bits) => (network, Some(bits)),
            Err(_) => return false,
        },
        None => (entry, None),
    };
    let Ok(network) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            let bits = bits.unwrap_or(32);
            if bits > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - bits).unwrap_or(0);
            u32::from(ip) & mask == u32::from(net) & mask
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            let bits = bits.unwrap_or(128);
            if bits > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - bits).unwrap_or(0);
            u128::from(ip) & mask == u128::from(net) & mask
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RequestConfig {
        RequestConfig {
            trusted_proxies: vec!["10.0.0.0/8".to_string()],
            ..RequestConfig::default()
        }
    }

    #[test]
    fn cidr_matching() {
        assert!(ip_matches("10.1.2.3", "10.0.0.0/8"));
        assert!(!ip_matches("11.1.2.3", "10.0.0.0/8"));
        assert!(ip_matches("192.168.1.1", "192.168.1.1"));
        assert!(ip_matches("1.2.3.4", "0.0.0.0/0"));
        assert!(ip_matches("2001:db8::1", "2001:db8::/32"));
        assert!(!ip_matches("2001:db9::1", "2001:db8::/32"));
        assert!(!ip_matches("10.0.0.1", "::/0"));
        assert!(!ip_matches("nonsense", "10.0.0.0/8"));
    }

    #[test]
    fn remote_addr_placeholder_trusts_anyone() {
        assert!(is_trusted_proxy("203.0.113.9", &[REMOTE_ADDR.to_string()]));
        assert!(!is_trusted_proxy("203.0.113.9", &["10.0.0.0/8".to_string()]));
    }

    #[test]
    fn reads_either_header() {
        let headers = HeaderBag::from_headers([("X-Forwarded-For", "1.1.1.1, 2.2.2.2")]);
        let values = trusted_values(&headers, &config(), ForwardedParam::For).unwrap();
        assert_eq!(values, vec!["1.1.1.1", "2.2.2.2"]);

        let headers = HeaderBag::from_headers([("Forwarded", "for=\"1.1.1.1\";proto=https, for=2.2.2.2")]);
        assert_eq!(
            trusted_values(&headers, &config(), ForwardedParam::For).unwrap(),
            vec!["1.1.1.1", "2.2.2.2"]
        );
        assert_eq!(
            trusted_values(&headers, &config(), ForwardedParam::Proto).unwrap(),
            vec!["https"]
        );
    }

    #[test]
    fn port_comes_from_forwarded_host() {
        let headers = HeaderBag::from_headers([("Forwarded", "host=example.com:8443")]);
        assert_eq!(
            trusted_values(&headers, &config(), ForwardedParam::Port).unwrap(),
            vec!["8443"]
        );
    }

    #[test]
    fn disagreeing_headers_conflict() {
        let headers = HeaderBag::from_headers([
            ("Forwarded", "for=1.1.1.1"),
            ("X-Forwarded-For", "3.3.3.3"),
        ]);
        assert!(matches!(
            trusted_values(&headers, &config(), ForwardedParam::For),
            Err(HttpError::ConflictingHeaders(_))
        ));

        let headers = HeaderBag::from_headers([
            ("Forwarded", "for=1.1.1.1"),
            ("X-Forwarded-For", "1.1.1.1"),
        ]);
        assert!(trusted_values(&headers, &config(), ForwardedParam::For).is_ok());
    }

    #[test]
    fn untrusted_header_kinds_are_ignored() {
        let mut config = config();
        config.trusted_headers.forwarded = false;
        let headers = HeaderBag::from_headers([
            ("Forwarded", "for=1.1.1.1"),
            ("X-Forwarded-For", "3.3.3.3"),
        ]);
        assert_eq!(
            trusted_values(&headers, &config, ForwardedParam::For).unwrap(),
            vec!["3.3.3.3"]
        );
    }

    #[test]
    fn strips_ports() {
        assert_eq!(strip_port("1.2.3.4:80"), "1.2.3.4");
        assert_eq!(strip_port("[::1]:80"), "::1");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("1.2.3.4"), "1.2.3.4");
    }
}
