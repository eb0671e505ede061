//! Proxy-aware TCP connector for the control and media sockets. Used
//! directly for a plain connection, or via `Socks5Stream::connect` when
//! the account config names a SOCKS5 proxy.

use tokio::net::TcpStream;
use tokio_socks::tcp::Socks5Stream;

use crate::error::{Error, Result};

/// Connects to `host:port`, routing through `proxy` (a `host:port`
/// SOCKS5 address) when present.
pub async fn connect(host: &str, port: u16, proxy: Option<&str>) -> Result<TcpStream> {
    match proxy {
        Some(proxy_addr) => {
            let target = (host, port);
            let stream = Socks5Stream::connect(proxy_addr, target)
                .await
                .map_err(|e| Error::Transport(std::io::Error::other(e.to_string())))?;
            Ok(stream.into_inner())
        }
        None => TcpStream::connect((host, port)).await.map_err(Error::Transport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_without_proxy_fails_cleanly_on_closed_port() {
        // Port 0 never accepts; this exercises the non-proxy path without
        // depending on external network access.
        let result = connect("127.0.0.1", 0, None).await;
        assert!(result.is_err());
    }
}
