//! CIDR blocks and IP address ranges
//!
//! Normalizes the address notations found in WHOIS responses:
//! - CIDR notation, IPv4 and IPv6 (e.g. "192.41.192.0/24", "2600::/29")
//! - Explicit spans (e.g. "192.41.192.0 - 192.41.192.255")
//! - Comma-separated CIDR lists, of which only the first entry counts
//!
//! # Examples
//!
//! ```
//! use whoisnet_cidr::AddressRange;
//!
//! let range = AddressRange::parse("27.80.0.0/12").unwrap();
//! assert_eq!(range.to_string(), "27.80.0.0-27.95.255.255");
//!
//! let range = AddressRange::parse("192.41.178.0 - 192.41.197.255").unwrap();
//! assert_eq!(range.begin().to_string(), "192.41.178.0");
//! assert_eq!(range.end().to_string(), "192.41.197.255");
//!
//! assert!(AddressRange::parse("not an address").is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

/// CIDR and range errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CidrError {
    /// Invalid CIDR or range notation
    #[error("Invalid notation: {0}")]
    InvalidNotation(String),

    /// Invalid IP address
    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    /// Prefix longer than the address family allows
    #[error("Invalid prefix length: {0} (must be 0-{1})")]
    InvalidPrefixLength(u8, u8),

    /// Range endpoints belong to different address families
    #[error("Range mixes IPv4 and IPv6: {0} - {1}")]
    MixedFamilies(IpAddr, IpAddr),

    /// Range begins after it ends
    #[error("Range is inverted: {0} - {1}")]
    Inverted(IpAddr, IpAddr),
}

pub type Result<T> = std::result::Result<T, CidrError>;

fn bit_width(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn to_bits(ip: &IpAddr) -> u128 {
    match ip {
        IpAddr::V4(v4) => u32::from(*v4) as u128,
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

/// Rebuild an address of the same family as `like` from its integer form
fn from_bits(like: &IpAddr, bits: u128) -> IpAddr {
    match like {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::from(bits as u32)),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from(bits)),
    }
}

/// Network mask for `prefix_len` within an address of `width` bits
fn mask(width: u8, prefix_len: u8) -> u128 {
    let full = if width == 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    };

    if prefix_len == 0 {
        0
    } else {
        (u128::MAX << (width - prefix_len)) & full
    }
}

fn parse_ip(text: &str) -> Result<IpAddr> {
    let text = text.trim();
    text.parse::<IpAddr>()
        .map_err(|_| CidrError::InvalidIpAddress(text.to_string()))
}

/// CIDR block representation (IPv4 or IPv6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    /// Network address (host bits zeroed)
    network: IpAddr,
    /// Prefix length (0-32 or 0-128)
    prefix_len: u8,
}

impl Cidr {
    /// Parse CIDR notation string
    ///
    /// Host bits in the address part are discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use whoisnet_cidr::Cidr;
    ///
    /// let cidr = Cidr::parse("192.41.192.40/24").unwrap();
    /// assert_eq!(cidr.network().to_string(), "192.41.192.0");
    /// assert_eq!(cidr.last().to_string(), "192.41.192.255");
    /// ```
    pub fn parse(cidr: &str) -> Result<Self> {
        let (ip_str, prefix_str) = cidr.trim().split_once('/').ok_or_else(|| {
            CidrError::InvalidNotation(format!("Expected address/prefix: {}", cidr.trim()))
        })?;

        let ip = parse_ip(ip_str)?;
        let prefix_len: u8 = prefix_str.trim().parse().map_err(|_| {
            CidrError::InvalidNotation(format!("Invalid prefix: {}", prefix_str.trim()))
        })?;

        Self::new(ip, prefix_len)
    }

    /// Create new CIDR from any address inside the block and a prefix length
    pub fn new(ip: IpAddr, prefix_len: u8) -> Result<Self> {
        let width = bit_width(&ip);
        if prefix_len > width {
            return Err(CidrError::InvalidPrefixLength(prefix_len, width));
        }

        let network = from_bits(&ip, to_bits(&ip) & mask(width, prefix_len));
        Ok(Self {
            network,
            prefix_len,
        })
    }

    /// Get network address
    pub fn network(&self) -> IpAddr {
        self.network
    }

    /// Get prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Last address of the block (all host bits set)
    pub fn last(&self) -> IpAddr {
        let width = bit_width(&self.network);
        let host_bits = !mask(width, self.prefix_len) & mask(width, width);
        from_bits(&self.network, to_bits(&self.network) | host_bits)
    }

    /// Check if IP address is in this CIDR block
    pub fn contains(&self, ip: IpAddr) -> bool {
        if bit_width(&ip) != bit_width(&self.network) {
            return false;
        }
        let width = bit_width(&ip);
        to_bits(&ip) & mask(width, self.prefix_len) == to_bits(&self.network)
    }

    /// The block as an explicit begin/end range
    pub fn to_range(&self) -> AddressRange {
        AddressRange {
            begin: self.network,
            end: self.last(),
        }
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self> {
        Cidr::parse(s)
    }
}

/// A contiguous span of addresses of one family, `begin <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", try_from = "RangeFields")]
pub struct AddressRange {
    begin: IpAddr,
    end: IpAddr,
}

/// Unchecked wire form; deserialized ranges go through [`AddressRange::new`]
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RangeFields {
    begin: IpAddr,
    end: IpAddr,
}

impl TryFrom<RangeFields> for AddressRange {
    type Error = CidrError;

    fn try_from(fields: RangeFields) -> Result<Self> {
        AddressRange::new(fields.begin, fields.end)
    }
}

impl AddressRange {
    /// Create a range from its two endpoints
    pub fn new(begin: IpAddr, end: IpAddr) -> Result<Self> {
        if bit_width(&begin) != bit_width(&end) {
            return Err(CidrError::MixedFamilies(begin, end));
        }
        if to_bits(&begin) > to_bits(&end) {
            return Err(CidrError::Inverted(begin, end));
        }
        Ok(Self { begin, end })
    }

    /// Parse the address text of a WHOIS response field
    ///
    /// Accepts "begin - end", CIDR notation, or a single address. Only the
    /// first entry of a comma-separated list is considered. Returns `None`
    /// for anything unparseable.
    pub fn parse(text: &str) -> Option<Self> {
        text.parse().ok()
    }

    /// First address of the range
    pub fn begin(&self) -> IpAddr {
        self.begin
    }

    /// Last address of the range
    pub fn end(&self) -> IpAddr {
        self.end
    }

    /// Check if IP address falls within the range
    pub fn contains(&self, ip: IpAddr) -> bool {
        bit_width(&ip) == bit_width(&self.begin)
            && to_bits(&self.begin) <= to_bits(&ip)
            && to_bits(&ip) <= to_bits(&self.end)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.begin, self.end)
    }
}

impl FromStr for AddressRange {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.split(',').next().unwrap_or_default().trim();
        if text.is_empty() {
            return Err(CidrError::InvalidNotation(s.to_string()));
        }

        if let Some((begin, end)) = text.split_once('-') {
            AddressRange::new(parse_ip(begin)?, parse_ip(end)?)
        } else if text.contains('/') {
            Cidr::parse(text).map(|cidr| cidr.to_range())
        } else {
            let ip = parse_ip(text)?;
            Ok(AddressRange { begin: ip, end: ip })
        }
    }
}

impl From<Cidr> for AddressRange {
    fn from(cidr: Cidr) -> Self {
        cidr.to_range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_cidr() {
        let cidr = Cidr::parse("192.168.1.0/24").unwrap();
        assert_eq!(cidr.network(), ip("192.168.1.0"));
        assert_eq!(cidr.prefix_len(), 24);
        assert_eq!(cidr.last(), ip("192.168.1.255"));
    }

    #[test]
    fn test_parse_cidr_clears_host_bits() {
        let cidr = Cidr::parse("27.90.1.2/12").unwrap();
        assert_eq!(cidr.network(), ip("27.80.0.0"));
        assert_eq!(cidr.last(), ip("27.95.255.255"));
    }

    #[test]
    fn test_parse_cidr_v6() {
        let cidr = Cidr::parse("2600::/28").unwrap();
        assert_eq!(cidr.network(), ip("2600::"));
        assert_eq!(cidr.last(), ip("2600:f:ffff:ffff:ffff:ffff:ffff:ffff"));
    }

    #[test]
    fn test_parse_invalid_cidr() {
        assert!(Cidr::parse("192.168.1.0").is_err());
        assert_eq!(
            Cidr::parse("192.168.1.0/33"),
            Err(CidrError::InvalidPrefixLength(33, 32))
        );
        assert_eq!(
            Cidr::parse("2001:db8::/129"),
            Err(CidrError::InvalidPrefixLength(129, 128))
        );
        assert!(Cidr::parse("256.0.0.0/24").is_err());
        assert!(Cidr::parse("10.0.0.0/x").is_err());
    }

    #[test]
    fn test_cidr_extremes() {
        let all = Cidr::parse("0.0.0.0/0").unwrap();
        assert_eq!(all.last(), ip("255.255.255.255"));

        let all6 = Cidr::parse("::/0").unwrap();
        assert_eq!(all6.last(), ip("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff"));

        let host = Cidr::parse("192.168.1.1/32").unwrap();
        assert_eq!(host.network(), host.last());

        let host6 = Cidr::parse("2001:db8::1/128").unwrap();
        assert_eq!(host6.network(), host6.last());
    }

    #[test]
    fn test_cidr_bounds_for_every_prefix() {
        let v4 = ip("203.0.113.77");
        for prefix in 0..=32u8 {
            let cidr = Cidr::new(v4, prefix).unwrap();
            let host_mask = !mask(32, prefix) & mask(32, 32);
            assert_eq!(to_bits(&cidr.network()) & host_mask, 0);
            assert_eq!(to_bits(&cidr.last()) & host_mask, host_mask);
            assert!(cidr.contains(cidr.network()));
            assert!(cidr.contains(cidr.last()));
            assert!(cidr.contains(v4));
        }

        let v6 = ip("2001:db8:1234:5678:9abc:def0:1234:5678");
        for prefix in 0..=128u8 {
            let cidr = Cidr::new(v6, prefix).unwrap();
            let host_mask = !mask(128, prefix);
            assert_eq!(to_bits(&cidr.network()) & host_mask, 0);
            assert_eq!(to_bits(&cidr.last()) & host_mask, host_mask);
            assert!(cidr.contains(v6));
        }
    }

    #[test]
    fn test_cidr_contains() {
        let cidr = Cidr::parse("192.168.1.0/24").unwrap();
        assert!(cidr.contains(ip("192.168.1.0")));
        assert!(cidr.contains(ip("192.168.1.255")));
        assert!(!cidr.contains(ip("192.168.0.1")));
        assert!(!cidr.contains(ip("::ffff:192.168.1.1")));
    }

    #[test]
    fn test_cidr_display() {
        let cidr = Cidr::parse("192.168.1.7/24").unwrap();
        assert_eq!(cidr.to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_range_explicit_span() {
        let range = AddressRange::parse("192.41.192.0 - 192.41.192.255").unwrap();
        assert_eq!(range.begin(), ip("192.41.192.0"));
        assert_eq!(range.end(), ip("192.41.192.255"));

        let tight = AddressRange::parse("4.0.0.0-4.127.255.255").unwrap();
        assert_eq!(tight.end(), ip("4.127.255.255"));
    }

    #[test]
    fn test_range_explicit_span_v6() {
        let range =
            AddressRange::parse("2600:: - 2600:F:FFFF:FFFF:FFFF:FFFF:FFFF:FFFF").unwrap();
        assert_eq!(range.to_string(), "2600::-2600:f:ffff:ffff:ffff:ffff:ffff:ffff");
    }

    #[test]
    fn test_range_span_roundtrip() {
        for (begin, end) in [
            ("150.126.0.0", "150.126.255.255"),
            ("10.0.0.1", "10.0.0.1"),
            ("2001:db8::", "2001:db8::ffff"),
        ] {
            let text = format!("{} - {}", begin, end);
            let range = AddressRange::parse(&text).unwrap();
            assert_eq!((range.begin(), range.end()), (ip(begin), ip(end)));
            assert_eq!(AddressRange::parse(&range.to_string()), Some(range));
        }
    }

    #[test]
    fn test_range_first_cidr_of_list() {
        let range = AddressRange::parse(
            "192.41.192.0/22, 192.41.184.0/21, 192.41.178.0/23",
        )
        .unwrap();
        assert_eq!(range.begin(), ip("192.41.192.0"));
        assert_eq!(range.end(), ip("192.41.195.255"));
    }

    #[test]
    fn test_range_single_address() {
        let range = AddressRange::parse("198.51.100.7").unwrap();
        assert_eq!(range.begin(), range.end());
    }

    #[test]
    fn test_range_rejects_garbage() {
        assert!(AddressRange::parse("").is_none());
        assert!(AddressRange::parse("   ").is_none());
        assert!(AddressRange::parse("JPNICNET").is_none());
        assert!(AddressRange::parse("10.0.0.0 - ").is_none());
        assert!(AddressRange::parse("10.0.0.0/40").is_none());
    }

    #[test]
    fn test_range_rejects_mixed_and_inverted() {
        assert_eq!(
            "10.0.0.0 - ::1".parse::<AddressRange>(),
            Err(CidrError::MixedFamilies(ip("10.0.0.0"), ip("::1")))
        );
        assert_eq!(
            "10.0.0.9 - 10.0.0.1".parse::<AddressRange>(),
            Err(CidrError::Inverted(ip("10.0.0.9"), ip("10.0.0.1")))
        );
    }

    #[test]
    fn test_range_contains() {
        let range = AddressRange::parse("192.41.178.0 - 192.41.197.255").unwrap();
        assert!(range.contains(ip("192.41.192.40")));
        assert!(!range.contains(ip("192.41.198.0")));
        assert!(!range.contains(ip("::1")));
    }

    #[test]
    fn test_range_serialization() {
        let range = AddressRange::parse("150.126.0.0 - 150.126.255.255").unwrap();
        let json = serde_json::to_string(&range).expect("serialization failed");
        assert_eq!(json, r#"{"Begin":"150.126.0.0","End":"150.126.255.255"}"#);

        let back: AddressRange = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(back, range);
    }

    #[test]
    fn test_range_deserialization_validates() {
        let mixed = serde_json::from_str::<AddressRange>(r#"{"Begin":"10.0.0.9","End":"::1"}"#);
        assert!(mixed.is_err());

        let inverted =
            serde_json::from_str::<AddressRange>(r#"{"Begin":"10.0.0.9","End":"10.0.0.1"}"#);
        assert!(inverted.is_err());

        let single = serde_json::from_str::<AddressRange>(r#"{"Begin":"10.0.0.9","End":"10.0.0.9"}"#)
            .expect("deserialization failed");
        assert_eq!(single.begin(), single.end());
    }
}
