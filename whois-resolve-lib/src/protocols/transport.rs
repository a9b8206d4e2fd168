//! Connection-level WHOIS exchange.
//!
//! A transport opens a connection, writes one query line, reads until the
//! peer closes the connection and hands back the text. It knows nothing about
//! referrals or response formats.

use crate::error::WhoisError;
use crate::types::ClientSettings;
use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tracing::{debug, instrument};

/// Largest response accepted from a single server.
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024; // 1MB

/// One request to one server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub host: &'a str,
    pub port: u16,
    /// The query line, without line terminator
    pub line: &'a str,
}

/// Sends a single query line and returns the complete response.
///
/// Implementations must release the connection on every exit path. The
/// adapter calls this once per hop, strictly in sequence.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn ask(&self, request: &Request<'_>) -> Result<String, WhoisError>;
}

/// TCP transport used by default.
#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    bind_host: Option<IpAddr>,
    bind_port: Option<u16>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport honouring the bind address from `settings`.
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            bind_host: settings.bind_host,
            bind_port: settings.bind_port,
        }
    }

    async fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        if self.bind_host.is_none() && self.bind_port.is_none() {
            return TcpStream::connect((host, port)).await;
        }

        let mut last_error = None;
        for addr in lookup_host((host, port)).await? {
            let local = match self.local_address_for(&addr) {
                Some(local) => local,
                None => continue,
            };

            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            socket.set_reuseaddr(true)?;
            socket.bind(local)?;

            match socket.connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no peer address matches the bind address family",
            )
        }))
    }

    /// Local address for a peer, or `None` if the bind host cannot reach it.
    fn local_address_for(&self, peer: &SocketAddr) -> Option<SocketAddr> {
        let port = self.bind_port.unwrap_or(0);
        match (self.bind_host, peer) {
            (Some(ip), peer) if ip.is_ipv4() == peer.is_ipv4() => Some(SocketAddr::new(ip, port)),
            (Some(_), _) => None,
            (None, SocketAddr::V4(_)) => Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)),
            (None, SocketAddr::V6(_)) => Some(SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)),
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    #[instrument(skip(self, request), fields(host = %request.host, port = request.port))]
    async fn ask(&self, request: &Request<'_>) -> Result<String, WhoisError> {
        let mut stream = self
            .connect(request.host, request.port)
            .await
            .map_err(|e| {
                WhoisError::connection(request.host, format!("Failed to connect: {}", e))
            })?;

        debug!("Connected");
        // The stream is dropped, and the connection closed, when this returns.
        exchange(&mut stream, request.host, request.line).await
    }
}

/// Write `line` to `stream` and read the response until EOF.
///
/// # Arguments
///
/// * `stream` - Any connected byte stream
/// * `host` - Peer name, used in error messages
/// * `line` - Query line without terminator; `\r\n` is appended
///
/// # Errors
///
/// Returns `WhoisError::Connection` on I/O failure or when the response
/// exceeds [`MAX_RESPONSE_SIZE`].
pub async fn exchange<S>(stream: &mut S, host: &str, line: &str) -> Result<String, WhoisError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let query_bytes = format!("{}\r\n", line);
    stream
        .write_all(query_bytes.as_bytes())
        .await
        .map_err(|e| WhoisError::connection(host, format!("Failed to send query: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| WhoisError::connection(host, format!("Failed to send query: {}", e)))?;

    let mut response = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| WhoisError::connection(host, format!("Read error: {}", e)))?;
        if n == 0 {
            break;
        }
        response.extend_from_slice(&buf[..n]);
        if response.len() > MAX_RESPONSE_SIZE {
            return Err(WhoisError::connection(host, "Response too large"));
        }
    }

    debug!(host = %host, bytes = response.len(), "Response received");
    Ok(decode_response(response))
}

/// Decode as UTF-8, falling back to Latin-1 for legacy servers.
fn decode_response(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().iter().map(|&c| c as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_exchange_writes_line_and_reads_to_eof() {
        let mut mock = tokio_test::io::Builder::new()
            .write(b"=example.test\r\n")
            .read(b"Domain Name: EXAMPLE.TEST\r\n")
            .read(b"Whois Server: whois.example.bz\r\n")
            .build();

        let body = exchange(&mut mock, "whois.test", "=example.test")
            .await
            .unwrap();
        assert_eq!(
            body,
            "Domain Name: EXAMPLE.TEST\r\nWhois Server: whois.example.bz\r\n"
        );
    }

    #[tokio::test]
    async fn test_exchange_read_error_is_connection_error() {
        let mut mock = tokio_test::io::Builder::new()
            .write(b"example.test\r\n")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();

        let result = exchange(&mut mock, "whois.test", "example.test").await;
        assert!(matches!(
            result,
            Err(WhoisError::Connection { ref host, .. }) if host == "whois.test"
        ));
    }

    #[test]
    fn test_decode_latin1_fallback() {
        assert_eq!(decode_response(b"caf\xe9".to_vec()), "café");
        assert_eq!(decode_response("café".as_bytes().to_vec()), "café");
    }

    #[test]
    fn test_local_address_family() {
        let transport = TcpTransport::from_settings(
            &ClientSettings::default().with_bind_host("127.0.0.1".parse().unwrap()),
        );
        let v4: SocketAddr = "192.0.2.1:43".parse().unwrap();
        let v6: SocketAddr = "[2001:db8::1]:43".parse().unwrap();
        assert_eq!(
            transport.local_address_for(&v4),
            Some("127.0.0.1:0".parse().unwrap())
        );
        assert_eq!(transport.local_address_for(&v6), None);
    }

    #[tokio::test]
    async fn test_tcp_transport_against_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64];
            let n = socket.read(&mut buf).await.unwrap();
            let query = String::from_utf8_lossy(&buf[..n]).to_string();
            socket
                .write_all(format!("You asked: {}", query.trim_end()).as_bytes())
                .await
                .unwrap();
            // Dropping the socket closes the connection, which ends the response.
        });

        let transport = TcpTransport::new();
        let body = transport
            .ask(&Request {
                host: "127.0.0.1",
                port,
                line: "example.test",
            })
            .await
            .unwrap();
        assert_eq!(body, "You asked: example.test");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_tcp_transport_connection_refused() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpTransport::new()
            .ask(&Request {
                host: "127.0.0.1",
                port,
                line: "example.test",
            })
            .await;
        assert!(matches!(result, Err(WhoisError::Connection { .. })));
    }
}
