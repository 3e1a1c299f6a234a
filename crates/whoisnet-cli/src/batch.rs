//! Parallel batch lookups using Rayon
//!
//! Each worker thread runs blocking resolutions, so no async runtime is
//! shared between queries. Failures are recorded per input and never stop
//! the batch.

use anyhow::Result;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use whoisnet_client::{WhoisClient, WhoisResponse};

/// Batch processing result
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub input: String,
    pub result: Result<WhoisResponse, String>,
}

/// Batch processor with parallel execution
pub struct BatchProcessor {
    client: WhoisClient,
    thread_pool: rayon::ThreadPool,
}

impl BatchProcessor {
    /// Create a new batch processor
    ///
    /// # Arguments
    ///
    /// * `client` - Client whose options every query uses
    /// * `num_threads` - Number of threads (default: CPU cores * 2)
    pub fn new(client: WhoisClient, num_threads: Option<usize>) -> Result<Self> {
        let num_threads = num_threads
            .filter(|n| *n > 0)
            .unwrap_or_else(|| num_cpus::get() * 2);

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;

        Ok(Self {
            client,
            thread_pool,
        })
    }

    /// Resolve every query in parallel, preserving input order
    pub fn process(&self, queries: Vec<String>) -> Vec<BatchResult> {
        let total = queries.len();
        let processed = AtomicUsize::new(0);

        self.thread_pool.install(|| {
            queries
                .into_par_iter()
                .map(|query| {
                    let result = self
                        .client
                        .query_blocking(&query)
                        .map_err(|err| err.to_string());

                    let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % 100 == 0 || count == total {
                        tracing::info!(count, total, "batch progress");
                    }

                    BatchResult {
                        input: query,
                        result,
                    }
                })
                .collect()
        })
    }

    /// Get thread pool info
    pub fn thread_count(&self) -> usize {
        self.thread_pool.current_num_threads()
    }
}
