//! Referral detection
//!
//! Registries point at a more authoritative server in several different
//! ways. Each marker gets its own pattern; they are tried in priority order
//! and the first usable match decides.

use regex::Regex;
use std::sync::LazyLock;
use whoisnet_core::{Endpoint, WHOIS_PORT};

static REFERRAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // ReferralServer: whois://whois.apnic.net
        r"(?mi)^ReferralServer:\W+whois://([^:\r\n]+)(?::(\d+))?",
        // Registrar WHOIS Server: whois.markmonitor.com
        r"(?mi)^[ \t]*(?:Registrar[ \t]+)?Whois Server:[ \t]*([^:\r\n]+)(?::(\d+))?",
        // refer:        whois.arin.net
        r"(?mi)^[ \t]*refer:[ \t]*([^:\r\n]+)(?::(\d+))?",
        // whois:        whois.arin.net
        r"(?mi)^[ \t]*whois:[ \t]*([^:\r\n]+)(?::(\d+))?",
        // remarks:        at whois.nic.ad.jp. To obtain an English output
        r"(?mi)^remarks:\W+.*(whois\.[0-9a-z\-\.]+\.[a-z]{2,})(?::(\d+))?",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("referral pattern must compile"))
    .collect()
});

/// Find the next server to ask, if the response names one
///
/// A referral back to `current_host` (compared case-insensitively) counts
/// as no referral.
///
/// # Examples
///
/// ```
/// use whoisnet_client::referral::detect;
///
/// let raw = "OrgName: Asia Pacific Network Information Centre\r\n\
///            ReferralServer: whois://whois.apnic.net\r\n";
/// let next = detect(raw, "whois.arin.net").unwrap();
/// assert_eq!(next.host, "whois.apnic.net");
/// assert_eq!(next.port, 43);
///
/// assert!(detect(raw, "WHOIS.APNIC.NET").is_none());
/// ```
pub fn detect(raw: &str, current_host: &str) -> Option<Endpoint> {
    let (host, port) = REFERRAL_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(raw))
        .find_map(|caps| {
            let host = caps.get(1)?.as_str().trim();
            if host.is_empty() {
                return None;
            }
            let port = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<u16>().ok())
                .filter(|port| *port != 0)
                .unwrap_or(WHOIS_PORT);
            Some((host, port))
        })?;

    if host.eq_ignore_ascii_case(current_host) {
        return None;
    }

    Some(Endpoint::new(host, port))
}
