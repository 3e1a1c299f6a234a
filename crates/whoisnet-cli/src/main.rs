mod batch;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::{self, BufRead, BufReader};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use whoisnet_client::{CancellationToken, QueryOptions, WhoisClient, WhoisResponse};
use whoisnet_core::{Endpoint, TextEncoding, DEFAULT_SERVER};

use crate::batch::{BatchProcessor, BatchResult};

/// WHOIS client that follows referrals to the authoritative server
#[derive(Parser)]
#[command(name = "whoisnet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a domain name or IP address
    Lookup(LookupArgs),
    /// Batch process multiple queries from file or stdin
    Batch(BatchArgs),
}

#[derive(Args, Clone)]
struct QueryArgs {
    /// First server to ask, as host or host:port
    #[arg(short, long, default_value = DEFAULT_SERVER)]
    server: Endpoint,

    /// TCP port of the first server, overriding any port in --server
    #[arg(short, long)]
    port: Option<u16>,

    /// Response encoding label (ascii, utf-8, iso-2022-jp, ...)
    #[arg(short, long, default_value = "ascii")]
    encoding: TextEncoding,

    /// Timeout for each connect, write and read
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    timeout_ms: u64,

    /// Extra attempts per server when the answer is blank
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Fail on transport errors instead of treating them as blank answers
    #[arg(long)]
    rethrow: bool,
}

impl QueryArgs {
    fn to_options(&self) -> QueryOptions {
        QueryOptions::default()
            .with_server(self.server.host.clone())
            .with_port(self.port.unwrap_or(self.server.port))
            .with_encoding(self.encoding)
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_retries(self.retries)
            .with_rethrow_errors(self.rethrow)
    }
}

#[derive(Parser)]
struct LookupArgs {
    /// Domain name or IP address
    #[arg(value_name = "QUERY")]
    query: String,

    /// Send the query verbatim to --server once, without following referrals
    #[arg(long)]
    raw: bool,

    #[command(flatten)]
    query_args: QueryArgs,
}

#[derive(Parser)]
struct BatchArgs {
    /// Input file (use '-' for stdin)
    #[arg(short, long, value_name = "FILE")]
    file: Option<String>,

    /// Number of concurrent workers
    #[arg(short, long, default_value = "10")]
    workers: usize,

    #[command(flatten)]
    query_args: QueryArgs,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output (pretty-printed)
    Json,
    /// JSON output (compact)
    JsonCompact,
    /// CSV output
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Lookup(args) => handle_lookup(args, cli.output, cli.verbose)?,
        Commands::Batch(args) => handle_batch(args, cli.output, cli.verbose)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn handle_lookup(args: LookupArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!(
            "{} Looking up {} via {}",
            "›".blue(),
            args.query,
            args.query_args.to_options().server
        );
    }

    let client = WhoisClient::with_options(args.query_args.to_options());
    let cancel = CancellationToken::new();
    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;

    runtime.block_on(async {
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        if args.raw {
            let raw = client
                .raw_query_with_cancel(&args.query, &cancel)
                .await
                .with_context(|| format!("Query for {} failed", args.query))?;
            print!("{}", raw);
            return Ok(());
        }

        let response = client
            .query_with_cancel(&args.query, &cancel)
            .await
            .with_context(|| format!("Lookup for {} failed", args.query))?;

        if cancel.is_cancelled() {
            eprintln!("{} Interrupted", "!".yellow());
        }

        print_result(&args.query, &response, format)
    })
}

fn handle_batch(args: BatchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let queries = read_queries(args.file.as_deref())?;

    if verbose {
        eprintln!(
            "{} Batch processing {} queries with {} workers",
            "›".blue(),
            queries.len(),
            args.workers
        );
        if let Some(ref file) = args.file {
            eprintln!("{} Reading from: {}", "›".blue(), file);
        } else {
            eprintln!("{} Reading from stdin", "›".blue());
        }
    }

    let client = WhoisClient::with_options(args.query_args.to_options());
    let processor = BatchProcessor::new(client, Some(args.workers))?;
    let results = processor.process(queries);

    print_batch(&results, format)
}

/// One query per line; blank lines and `#` comments are skipped
fn read_queries(file: Option<&str>) -> Result<Vec<String>> {
    let reader: Box<dyn BufRead> = match file {
        None | Some("-") => Box::new(BufReader::new(io::stdin())),
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("Failed to open {}", path))?,
        )),
    };

    parse_queries(reader)
}

fn parse_queries(reader: impl BufRead) -> Result<Vec<String>> {
    let mut queries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        queries.push(line.to_string());
    }
    Ok(queries)
}

fn print_result(query: &str, response: &WhoisResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => print_human(query, response),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(response)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            wtr.write_record(CSV_HEADER)?;
            wtr.write_record(csv_record(query, Ok(response)))?;
            wtr.flush()?;
        }
    }
    Ok(())
}

fn print_human(query: &str, response: &WhoisResponse) {
    println!();
    println!("{}", "WHOIS Lookup Result".bold().cyan());
    println!("{}", "─".repeat(50).dimmed());
    println!("{:>15}: {}", "Query".bold(), query);
    println!(
        "{:>15}: {}",
        "Servers".bold(),
        response.responded_servers().join(" → ")
    );

    if response.is_blank() {
        println!("{:>15}: {}", "Answer".bold(), "(none)".yellow());
        println!();
        return;
    }

    if !response.organization_name().is_empty() {
        println!(
            "{:>15}: {}",
            "Organization".bold(),
            response.organization_name().green()
        );
    }

    if let Some(range) = response.address_range() {
        println!("{:>15}: {}", "Address Range".bold(), range);
    }

    println!("{}", "─".repeat(50).dimmed());
    println!("{}", response.raw().trim_end());
    println!();
}

fn print_batch(results: &[BatchResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for item in results {
                match &item.result {
                    Ok(response) if response.is_blank() => {
                        println!("{} {}: {}", "?".yellow(), item.input, "no answer".dimmed())
                    }
                    Ok(response) => println!(
                        "{} {}: {} [{}]",
                        "✓".green(),
                        item.input,
                        response.organization_name(),
                        response
                            .address_range()
                            .map(|range| range.to_string())
                            .unwrap_or_default()
                    ),
                    Err(err) => println!("{} {}: {}", "✗".red(), item.input, err.red()),
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&batch_records(results))?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(&batch_records(results))?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            wtr.write_record(CSV_HEADER)?;
            for item in results {
                let result = item.result.as_ref().map_err(String::as_str);
                wtr.write_record(csv_record(&item.input, result))?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

const CSV_HEADER: [&str; 5] = ["query", "servers", "organization", "address_range", "error"];

fn csv_record(query: &str, result: std::result::Result<&WhoisResponse, &str>) -> [String; 5] {
    match result {
        Ok(response) => [
            query.to_string(),
            response.responded_servers().join(" "),
            response.organization_name().to_string(),
            response
                .address_range()
                .map(|range| range.to_string())
                .unwrap_or_default(),
            String::new(),
        ],
        Err(err) => [
            query.to_string(),
            String::new(),
            String::new(),
            String::new(),
            err.to_string(),
        ],
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct BatchRecord<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<&'a WhoisResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn batch_records(results: &[BatchResult]) -> Vec<BatchRecord<'_>> {
    results
        .iter()
        .map(|item| BatchRecord {
            query: &item.input,
            response: item.result.as_ref().ok(),
            error: item.result.as_ref().err().map(String::as_str),
        })
        .collect()
}
