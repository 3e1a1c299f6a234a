//! Field extraction from free-text WHOIS responses
//!
//! No dialect tag is ever present, so each field is located by an ordered
//! list of patterns covering the layouts registries actually use:
//!
//! - JPNIC: `f. [組織名]  value`, with or without the leading key letter
//! - ARIN: `OrgName:` / `NetRange:` / `CIDR:`
//! - APNIC, RIPE and friends: `inetnum:` / `inet6num:` / `descr:` / `org-name:` / `netname:`
//! - Registrars: `Registrant Organization:`
//! - LACNIC: `owner:`
//!
//! The first rule producing a non-blank value wins; within a rule, the
//! first occurrence wins.

use regex::Regex;
use std::sync::LazyLock;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("extraction pattern must compile"))
        .collect()
}

static ORGANIZATION_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?m)^[ \t]*(?:[a-z]\.[ \t]*)?\[組織名\]([^\r\n]*)",
        r"(?m)^[ \t]*(?:[a-z]\.[ \t]*)?\[Organization\]([^\r\n]*)",
        r"(?mi)^[ \t]*OrgName:([^\r\n]*)",
        r"(?mi)^[ \t]*(?:Registrant Organization|owner):([^\r\n]*)",
        r"(?mi)^[ \t]*descr:([^\r\n]*)",
        r"(?mi)^[ \t]*org-name:([^\r\n]*)",
        r"(?mi)^[ \t]*netname:([^\r\n]*)",
    ])
});

static ADDRESS_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?m)^[ \t]*(?:[a-z]\.[ \t]*)?\[IPネットワークアドレス\]([^\r\n]*)",
        r"(?mi)^[ \t]*(?:NetRange|inetnum|inet6num):([^\r\n]*)",
        r"(?mi)^[ \t]*CIDR:([^\r\n]*)",
    ])
});

/// Fields pulled out of one response, both possibly empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    /// Registrant organization name
    pub organization_name: String,
    /// Address range text, still in the registry's notation
    pub address_range: String,
}

/// Extract the organization name and address range text
///
/// # Examples
///
/// ```
/// use whoisnet_client::extract::extract;
///
/// let fields = extract(
///     "inetnum:        192.41.192.0 - 192.41.192.255\r\n\
///      netname:        JPNICNET\r\n\
///      descr:          Japan Network Information Center\r\n",
/// );
/// assert_eq!(fields.organization_name, "Japan Network Information Center");
/// assert_eq!(fields.address_range, "192.41.192.0 - 192.41.192.255");
/// ```
pub fn extract(raw: &str) -> ExtractedFields {
    ExtractedFields {
        organization_name: first_value(&ORGANIZATION_RULES, raw),
        address_range: first_value(&ADDRESS_RULES, raw),
    }
}

fn first_value(rules: &[Regex], raw: &str) -> String {
    rules
        .iter()
        .flat_map(|rule| rule.captures_iter(raw))
        .filter_map(|caps| caps.get(1))
        .map(|value| value.as_str().trim())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string()
}
