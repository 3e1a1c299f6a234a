//! Single WHOIS exchange: connect, send one line, read to EOF, decode.

use crate::options::QueryOptions;
use crate::{Result, WhoisError};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};
use whoisnet_core::Endpoint;

const READ_BUFFER_SIZE: usize = 8192;

/// Pause after a failed exchange before the caller may try again
const FAILURE_PAUSE: Duration = Duration::from_millis(200);

/// Query one server once
///
/// Bytes are accumulated until the peer closes its side and decoded in a
/// single pass, so multi-byte characters split across reads survive.
///
/// On failure, waits [`FAILURE_PAUSE`] and then either returns the error
/// (`rethrow_errors`) or whatever was received so far, decoded.
pub(crate) async fn send(
    server: &Endpoint,
    query_line: &str,
    options: &QueryOptions,
    cancel: &CancellationToken,
) -> Result<String> {
    let mut response = Vec::with_capacity(4096);

    match exchange(server, query_line, options, cancel, &mut response).await {
        Ok(()) => {
            trace!(server = %server, bytes = response.len(), "response complete");
            Ok(options.encoding.decode(&response))
        }
        Err(err) => {
            warn!(server = %server, error = %err, bytes = response.len(), "WHOIS exchange failed");
            pause(cancel).await;

            if options.rethrow_errors {
                Err(err)
            } else {
                Ok(options.encoding.decode(&response))
            }
        }
    }
}

/// Connection lives only inside this function, so it is dropped on every
/// exit path before the caller pauses or retries.
async fn exchange(
    server: &Endpoint,
    query_line: &str,
    options: &QueryOptions,
    cancel: &CancellationToken,
    response: &mut Vec<u8>,
) -> Result<()> {
    let timeout = options.timeout;

    let mut stream = guarded(
        timeout,
        cancel,
        options.connector.connect(&server.host, server.port, cancel),
    )
    .await
    .map_err(|err| match err {
        WhoisError::Timeout(after) => WhoisError::ConnectTimeout {
            server: server.to_string(),
            after,
        },
        other => other,
    })?
    .map_err(|source| WhoisError::ConnectFailed {
        server: server.to_string(),
        source,
    })?;

    let request = encode_request(query_line);
    guarded(timeout, cancel, stream.write_all(&request))
        .await?
        .map_err(WhoisError::Io)?;
    guarded(timeout, cancel, stream.flush())
        .await?
        .map_err(WhoisError::Io)?;

    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = guarded(timeout, cancel, stream.read(&mut buf))
            .await?
            .map_err(WhoisError::Io)?;
        if n == 0 {
            break;
        }
        trace!(server = %server, n, "read");
        response.extend_from_slice(&buf[..n]);
    }

    Ok(())
}

/// Run one I/O step under both the timeout and the cancellation token
///
/// Cancellation wins a tie so a cancelled caller never sees `Timeout`.
async fn guarded<F: Future>(
    timeout: Duration,
    cancel: &CancellationToken,
    op: F,
) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WhoisError::Cancelled),
        out = tokio::time::timeout(timeout, op) => out.map_err(|_| WhoisError::Timeout(timeout)),
    }
}

async fn pause(cancel: &CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(FAILURE_PAUSE) => {}
    }
}

/// The wire format is ASCII regardless of the response encoding
fn encode_request(query_line: &str) -> Vec<u8> {
    query_line
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .chain(*b"\r\n")
        .collect()
}
