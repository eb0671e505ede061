//! Bootstrap host discovery: fetches a small text file of the form
//! `"host:port"` that tells the client which login server to connect to.
//! The actual HTTP client is behind a trait so the engine's handshake can
//! be driven by a fake in tests without a live request.

use crate::error::{Error, Result};

pub trait BootstrapFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Default fetcher, backed by a blocking `reqwest` client (the handshake
/// step runs once before the async event loop starts).
pub struct HttpBootstrapFetcher {
    client: reqwest::blocking::Client,
}

impl HttpBootstrapFetcher {
    pub fn new() -> Self {
        Self { client: reqwest::blocking::Client::new() }
    }
}

impl Default for HttpBootstrapFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapFetcher for HttpBootstrapFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|e| Error::Bootstrap(e.to_string()))
    }
}

/// Parses a `"host:port"` bootstrap response, trimming whitespace.
pub fn parse_host_port(body: &str) -> Result<(String, u16)> {
    let trimmed = body.trim();
    let (host, port) = trimmed
        .rsplit_once(':')
        .ok_or_else(|| Error::Bootstrap(format!("malformed bootstrap response: {trimmed:?}")))?;
    let port: u16 =
        port.parse().map_err(|_| Error::Bootstrap(format!("invalid port in {trimmed:?}")))?;
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeFetcher(String);
    impl BootstrapFetcher for FakeFetcher {
        fn fetch(&self, _url: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn parses_host_port() {
        let (host, port) = parse_host_port("login.paltalk.com:5001\n").unwrap();
        assert_eq!(host, "login.paltalk.com");
        assert_eq!(port, 5001);
    }

    #[test]
    fn rejects_missing_port() {
        assert!(parse_host_port("login.paltalk.com").is_err());
    }

    #[test]
    fn fake_fetcher_round_trips_through_parse() {
        let fetcher = FakeFetcher("1.2.3.4:9999".to_string());
        let body = fetcher.fetch("http://example/bootstrap").unwrap();
        let (host, port) = parse_host_port(&body).unwrap();
        assert_eq!(host, "1.2.3.4");
        assert_eq!(port, 9999);
    }
}
