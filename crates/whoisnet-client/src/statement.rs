//! Per-server query statements
//!
//! A few servers want the query wrapped in a command; everyone else gets
//! it verbatim.

/// Command prefixes keyed by server host
const QUERY_PREFIXES: &[(&str, &str)] = &[
    ("whois.internic.net", "domain "),
    ("whois.verisign-grs.com", "domain "),
    // Avoids ARIN's "Query terms are ambiguous" answer for IP lookups
    ("whois.arin.net", "n + "),
];

/// The exact text to send `host` for `query`
///
/// # Examples
///
/// ```
/// use whoisnet_client::statement::query_statement;
///
/// assert_eq!(query_statement("whois.arin.net", "4.4.4.4"), "n + 4.4.4.4");
/// assert_eq!(query_statement("whois.apnic.net", "1.1.1.1"), "1.1.1.1");
/// ```
pub fn query_statement(host: &str, query: &str) -> String {
    QUERY_PREFIXES
        .iter()
        .find(|(server, _)| server.eq_ignore_ascii_case(host))
        .map(|(_, prefix)| format!("{}{}", prefix, query))
        .unwrap_or_else(|| query.to_string())
}
