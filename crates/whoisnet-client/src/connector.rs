//! Connection establishment
//!
//! The transport never opens sockets itself. It asks a [`TcpConnector`]
//! for a stream, which lets callers route WHOIS traffic through a proxy,
//! a tunnel, or an in-memory pipe in tests.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// Byte stream a WHOIS exchange runs over
pub trait WhoisStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> WhoisStream for T {}

/// Owned, type-erased connection handed back by a connector
pub type BoxedStream = Box<dyn WhoisStream>;

/// Opens the connection for a single query attempt
///
/// The transport bounds the call with the configured timeout and races it
/// against cancellation, so implementations need not do either; `cancel`
/// is passed along for connectors that hold resources worth releasing
/// early.
#[async_trait]
pub trait TcpConnector: Send + Sync {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        cancel: &CancellationToken,
    ) -> io::Result<BoxedStream>;
}

/// Plain TCP connector used unless one is injected
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConnector;

#[async_trait]
impl TcpConnector for DefaultConnector {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        cancel: &CancellationToken,
    ) -> io::Result<BoxedStream> {
        if host.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "host cannot be blank",
            ));
        }
        if port == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "port must be between 1 and 65535",
            ));
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "connect cancelled",
            )),
            stream = TcpStream::connect((host, port)) => {
                let stream = stream?;
                Ok(Box::new(stream) as BoxedStream)
            }
        }
    }
}
