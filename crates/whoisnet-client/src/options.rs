//! Query options

use crate::connector::{DefaultConnector, TcpConnector};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use whoisnet_core::{TextEncoding, DEFAULT_SERVER, WHOIS_PORT};

/// Settings for one resolution
///
/// | field | default |
/// |---|---|
/// | `server` | `whois.iana.org` |
/// | `port` | 43 |
/// | `encoding` | ASCII |
/// | `timeout` | 2000 ms per connect, write and read |
/// | `retries` | 3 (so up to 4 attempts per server) |
/// | `rethrow_errors` | false |
/// | `connector` | plain TCP |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use whoisnet_client::{QueryOptions, TextEncoding};
///
/// let options = QueryOptions::default()
///     .with_server("whois.nic.ad.jp")
///     .with_encoding(TextEncoding::ISO_2022_JP)
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(options.port, 43);
/// ```
#[derive(Clone)]
pub struct QueryOptions {
    /// First server to ask
    pub server: String,
    /// TCP port of the first server
    pub port: u16,
    /// Decoding applied to every response
    pub encoding: TextEncoding,
    /// Bound on each connect, write and read
    pub timeout: Duration,
    /// Extra attempts per server after the first one comes back blank
    pub retries: u32,
    /// Surface transport failures instead of treating them as blank answers
    pub rethrow_errors: bool,
    /// How connections are opened
    pub connector: Arc<dyn TcpConnector>,
}

impl QueryOptions {
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_rethrow_errors(mut self, rethrow: bool) -> Self {
        self.rethrow_errors = rethrow;
        self
    }

    /// Route connections through a custom connector (e.g. a SOCKS proxy)
    pub fn with_connector(mut self, connector: Arc<dyn TcpConnector>) -> Self {
        self.connector = connector;
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            port: WHOIS_PORT,
            encoding: TextEncoding::Ascii,
            timeout: Duration::from_millis(2000),
            retries: 3,
            rethrow_errors: false,
            connector: Arc::new(DefaultConnector),
        }
    }
}

impl fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("encoding", &self.encoding)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("rethrow_errors", &self.rethrow_errors)
            .finish_non_exhaustive()
    }
}
