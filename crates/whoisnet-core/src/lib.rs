//! Core types for whoisnet
//!
//! This crate provides the foundational types shared by the whoisnet crates:
//! - [`Endpoint`] - A WHOIS server (host and TCP port)
//! - [`TextEncoding`] - How response bytes are decoded into text
//! - [`CoreError`] - Error types
//!
//! ```
//! use whoisnet_core::{Endpoint, TextEncoding};
//!
//! let server = Endpoint::new("whois.apnic.net", 43);
//! assert_eq!(server.to_string(), "whois.apnic.net:43");
//! assert_eq!(TextEncoding::default(), TextEncoding::Ascii);
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Well-known TCP port of the WHOIS protocol (RFC 3912)
pub const WHOIS_PORT: u16 = 43;

/// Server every resolution starts from unless configured otherwise
pub const DEFAULT_SERVER: &str = "whois.iana.org";

/// Error types for core operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// Encoding label not recognized
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// Malformed `host[:port]` text
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// A WHOIS server to query
///
/// Each followed referral produces a new `Endpoint`; the ordered list of
/// them is the path a resolution took.
///
/// # Examples
///
/// ```
/// use whoisnet_core::Endpoint;
///
/// let arin: Endpoint = "whois.arin.net".parse().unwrap();
/// assert_eq!(arin.port, 43);
///
/// let custom: Endpoint = "rwhois.example.net:4321".parse().unwrap();
/// assert_eq!(custom.port, 4321);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or address literal
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Case-insensitive comparison of the host part only
    pub fn is_host(&self, host: &str) -> bool {
        self.host.eq_ignore_ascii_case(host)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || CoreError::InvalidEndpoint(s.to_string());

        // "[v6]:port" or "[v6]"
        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            match tail.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None if tail.is_empty() => (host, None),
                None => return Err(invalid()),
            }
        } else if s.matches(':').count() == 1 {
            let (host, port) = s.split_once(':').ok_or_else(invalid)?;
            (host, Some(port))
        } else {
            // bare host, or an unbracketed IPv6 literal
            (s, None)
        };

        if host.trim().is_empty() {
            return Err(invalid());
        }

        let port = match port {
            Some(p) => p.parse::<u16>().map_err(|_| invalid())?,
            None => WHOIS_PORT,
        };

        Ok(Endpoint::new(host.trim(), port))
    }
}

/// Text encoding used to decode a complete WHOIS response
///
/// The query itself always goes out as ASCII; this only governs how the
/// bytes received are turned into text. Decoding is best-effort: invalid
/// sequences become replacement characters rather than errors.
///
/// # Examples
///
/// ```
/// use whoisnet_core::TextEncoding;
///
/// let jp = TextEncoding::for_label("iso-2022-jp").unwrap();
/// assert_eq!(jp, TextEncoding::ISO_2022_JP);
/// assert_eq!(TextEncoding::Ascii.decode(b"OrgName: APNIC"), "OrgName: APNIC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// 7-bit ASCII; bytes above 0x7F decode to `?`
    #[default]
    Ascii,
    /// Any encoding known to `encoding_rs`
    Encoding(&'static encoding_rs::Encoding),
}

impl TextEncoding {
    pub const UTF_8: Self = TextEncoding::Encoding(encoding_rs::UTF_8);
    pub const ISO_2022_JP: Self = TextEncoding::Encoding(encoding_rs::ISO_2022_JP);
    pub const EUC_JP: Self = TextEncoding::Encoding(encoding_rs::EUC_JP);
    pub const SHIFT_JIS: Self = TextEncoding::Encoding(encoding_rs::SHIFT_JIS);

    /// Look up an encoding by its WHATWG label (e.g. "utf-8", "iso-2022-jp")
    ///
    /// "ascii" and "us-ascii" select the strict [`TextEncoding::Ascii`]
    /// decoder; WHATWG would otherwise map them to windows-1252.
    pub fn for_label(label: &str) -> Result<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("ascii") || label.eq_ignore_ascii_case("us-ascii") {
            return Ok(TextEncoding::Ascii);
        }

        encoding_rs::Encoding::for_label(label.as_bytes())
            .map(TextEncoding::Encoding)
            .ok_or_else(|| CoreError::UnknownEncoding(label.to_string()))
    }

    /// Canonical name of the encoding
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Ascii => "us-ascii",
            TextEncoding::Encoding(encoding) => encoding.name(),
        }
    }

    /// Decode a complete byte sequence into text
    ///
    /// Callers must pass the whole response at once: decoding fragments
    /// separately corrupts characters whose bytes straddle the split.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect(),
            TextEncoding::Encoding(encoding) => {
                encoding.decode_without_bom_handling(bytes).0.into_owned()
            }
        }
    }
}

impl From<&'static encoding_rs::Encoding> for TextEncoding {
    fn from(encoding: &'static encoding_rs::Encoding) -> Self {
        TextEncoding::Encoding(encoding)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        TextEncoding::for_label(s)
    }
}
