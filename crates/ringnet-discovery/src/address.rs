//! Address parsing: scheme/host/port extraction for candidate addresses.

/// Default scheme used when a candidate address carries none.
pub const DEFAULT_SCHEME: &str = "wss";

/// A parsed candidate address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub scheme: Option<String>,
    pub host: String,
    pub port: Option<u16>,
}

/// Parse `[scheme://]host[:port]` into its parts. Does not validate the
/// host; this is address-string bookkeeping, not DNS resolution.
pub fn parse(address: &str) -> ParsedAddress {
    let (scheme, rest) = match address.split_once("://") {
        Some((s, r)) => (Some(s.to_string()), r),
        None => (None, address),
    };

    // IPv6 literal host `[::1]:port`
    if let Some(stripped) = rest.strip_prefix('[') {
        if let Some((host, after)) = stripped.split_once(']') {
            let port = after.strip_prefix(':').and_then(|p| p.parse().ok());
            return ParsedAddress {
                scheme,
                host: host.to_string(),
                port,
            };
        }
    }

    match rest.rsplit_once(':') {
        Some((host, port_str)) if port_str.chars().all(|c| c.is_ascii_digit()) && !port_str.is_empty() => {
            ParsedAddress {
                scheme,
                host: host.to_string(),
                port: port_str.parse().ok(),
            }
        }
        _ => ParsedAddress {
            scheme,
            host: rest.to_string(),
            port: None,
        },
    }
}

impl ParsedAddress {
    /// `scheme://host:port`, filling in [`DEFAULT_SCHEME`] if absent.
    pub fn to_dial_url(&self, port: u16) -> String {
        format!(
            "{}://{}:{}",
            self.scheme.as_deref().unwrap_or(DEFAULT_SCHEME),
            self.host,
            port
        )
    }
}
