//! Resolution result

use crate::extract;
use serde::{Deserialize, Serialize};
use whoisnet_cidr::AddressRange;

/// Outcome of a WHOIS resolution
///
/// Derived fields are computed once, when the response is built, from the
/// raw text of the last server consulted.
///
/// # Examples
///
/// ```
/// use whoisnet_client::WhoisResponse;
///
/// let response = WhoisResponse::new(
///     vec!["whois.iana.org".into(), "whois.arin.net".into()],
///     "NetRange: 150.126.0.0 - 150.126.255.255\nOrgName:  Santa Cruz Operation Incorporated",
/// );
/// assert_eq!(response.organization_name(), "Santa Cruz Operation Incorporated");
/// assert_eq!(
///     response.address_range().unwrap().to_string(),
///     "150.126.0.0-150.126.255.255"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WhoisResponse {
    responded_servers: Vec<String>,
    raw: String,
    organization_name: String,
    address_range: Option<AddressRange>,
}

impl WhoisResponse {
    /// Build a response from the servers consulted and the final raw text
    pub fn new(responded_servers: Vec<String>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let fields = extract::extract(&raw);

        Self {
            responded_servers,
            organization_name: fields.organization_name,
            address_range: AddressRange::parse(&fields.address_range),
            raw,
        }
    }

    /// Hosts queried, in the order they were asked
    pub fn responded_servers(&self) -> &[String] {
        &self.responded_servers
    }

    /// Decoded text of the final answer; empty if every attempt failed
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Organization name, or empty if none was found
    pub fn organization_name(&self) -> &str {
        &self.organization_name
    }

    /// Registered address block; absent for domain queries
    pub fn address_range(&self) -> Option<AddressRange> {
        self.address_range
    }

    /// Whether the final answer carried any text
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }
}
