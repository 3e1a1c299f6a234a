//! WHOIS client with referral following
//!
//! Resolves a domain name or IP address against the WHOIS system (RFC 3912):
//! - Starts at a configurable server (IANA by default)
//! - Follows `ReferralServer:`, `Whois Server:`, `refer:`, `whois:` and
//!   `remarks:` hints until an authoritative answer arrives
//! - Retries blank answers, bounds every I/O step by a timeout, and honors
//!   cancellation
//! - Extracts the organization name and address range from ARIN, APNIC,
//!   RIPE, LACNIC, JPNIC and registrar response layouts
//!
//! # Examples
//!
//! ```no_run
//! use whoisnet_client::WhoisClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WhoisClient::new();
//! let response = client.query("192.41.192.40").await?;
//! println!("Servers: {:?}", response.responded_servers());
//! println!("Organization: {}", response.organization_name());
//! if let Some(range) = response.address_range() {
//!     println!("Range: {}", range);
//! }
//! # Ok(())
//! # }
//! ```

pub mod connector;
pub mod extract;
pub mod options;
pub mod referral;
pub mod response;
pub mod statement;
mod transport;

pub use connector::{BoxedStream, DefaultConnector, TcpConnector, WhoisStream};
pub use options::QueryOptions;
pub use response::WhoisResponse;
pub use tokio_util::sync::CancellationToken;
pub use whoisnet_cidr::{AddressRange, Cidr};
pub use whoisnet_core::{Endpoint, TextEncoding};

use std::future::Future;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// WHOIS errors
///
/// Only surfaced when [`QueryOptions::rethrow_errors`] is set, or when the
/// blocking API cannot start its runtime.
#[derive(Error, Debug)]
pub enum WhoisError {
    /// Connection could not be established
    #[error("Connection to {server} failed: {source}")]
    ConnectFailed {
        server: String,
        #[source]
        source: io::Error,
    },

    /// Connection attempt exceeded the timeout
    #[error("Connection to {server} timed out after {after:?}")]
    ConnectTimeout { server: String, after: Duration },

    /// Write or read exceeded the timeout
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// Caller cancelled the operation
    #[error("Query cancelled")]
    Cancelled,

    /// Write or read failed
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// Blocking API could not start its runtime
    #[error("Runtime error: {0}")]
    Runtime(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, WhoisError>;

/// WHOIS client
///
/// Holds the [`QueryOptions`] for every query it runs. Queries share no
/// mutable state, so one client may serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct WhoisClient {
    options: QueryOptions,
}

impl WhoisClient {
    /// Create a client with default options
    ///
    /// # Examples
    ///
    /// ```
    /// use whoisnet_client::WhoisClient;
    ///
    /// let client = WhoisClient::new();
    /// assert_eq!(client.options().server, "whois.iana.org");
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with custom options
    pub fn with_options(options: QueryOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Resolve `query`, following referrals to the authoritative server
    pub async fn query(&self, query: &str) -> Result<WhoisResponse> {
        self.query_with_cancel(query, &CancellationToken::new()).await
    }

    /// Resolve `query`, stopping early once `cancel` fires
    ///
    /// After cancellation the response carries whatever the current server
    /// had sent (usually nothing), unless `rethrow_errors` is set, in which
    /// case [`WhoisError::Cancelled`] is returned.
    #[instrument(skip(self, cancel), fields(server = %self.options.server))]
    pub async fn query_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<WhoisResponse> {
        let mut current = Endpoint::new(self.options.server.clone(), self.options.port);
        let mut hops = vec![current.clone()];

        let raw = loop {
            let statement = statement::query_statement(&current.host, query);
            let raw = self.query_server(&current, &statement, cancel).await?;

            let Some(next) = referral::detect(&raw, &current.host) else {
                break raw;
            };

            if hops.iter().any(|hop| hop.is_host(&next.host)) {
                warn!(from = %current, to = %next, "referral loop detected, stopping");
                break raw;
            }

            debug!(from = %current, to = %next, "following referral");
            hops.push(next.clone());
            current = next;
        };

        debug!(hops = hops.len(), bytes = raw.len(), "resolution complete");
        let servers = hops.into_iter().map(|hop| hop.host).collect();
        Ok(WhoisResponse::new(servers, raw))
    }

    /// Send `query` verbatim to the configured server, once
    ///
    /// No query statement rewriting, no referral following, no retries.
    pub async fn raw_query(&self, query: &str) -> Result<String> {
        self.raw_query_with_cancel(query, &CancellationToken::new())
            .await
    }

    pub async fn raw_query_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let server = Endpoint::new(self.options.server.clone(), self.options.port);
        transport::send(&server, query, &self.options, cancel).await
    }

    /// Blocking form of [`WhoisClient::query`]
    ///
    /// Runs on a private current-thread runtime; must not be called from
    /// inside an async context.
    pub fn query_blocking(&self, query: &str) -> Result<WhoisResponse> {
        block_on(self.query(query))?
    }

    /// Blocking form of [`WhoisClient::query_with_cancel`]
    pub fn query_blocking_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<WhoisResponse> {
        block_on(self.query_with_cancel(query, cancel))?
    }

    /// Blocking form of [`WhoisClient::raw_query`]
    pub fn raw_query_blocking(&self, query: &str) -> Result<String> {
        block_on(self.raw_query(query))?
    }

    /// Ask one server, retrying while the answer is blank
    ///
    /// Makes at most `retries + 1` attempts. Transport failures on earlier
    /// attempts are retried; only the last one can escape.
    async fn query_server(
        &self,
        server: &Endpoint,
        statement: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let attempts = self.options.retries.saturating_add(1);
        let mut raw = String::new();

        for attempt in 1..=attempts {
            debug!(server = %server, attempt, statement, "querying");

            match transport::send(server, statement, &self.options, cancel).await {
                Ok(text) => raw = text,
                Err(err) if attempt < attempts && !cancel.is_cancelled() => {
                    warn!(server = %server, attempt, error = %err, "attempt failed, retrying");
                    raw.clear();
                    continue;
                }
                Err(err) => return Err(err),
            }

            if !raw.trim().is_empty() || cancel.is_cancelled() {
                break;
            }
        }

        Ok(raw)
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(WhoisError::Runtime)?;
    Ok(runtime.block_on(future))
}
