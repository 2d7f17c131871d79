//! Sink descriptor parsing
//!
//! A descriptor is a URI-shaped string: `<type>://<address>?<query>`.
//! The type tag is everything before the first `:`, a bare tag (`log`) is
//! valid and carries no address or options.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::ContractError;

/// Scheme used to hand the remainder of a descriptor to the URL parser.
/// The real type tag is kept verbatim so its case and charset are preserved.
const PARSE_SCHEME: &str = "sink";

/// Query options of a descriptor
///
/// Keys are unique and kept in first-appearance order; values keep the order
/// in which they appeared in the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkOptions {
    entries: Vec<(String, Vec<String>)>,
}

impl SinkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `key`
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// All values for `key`, in query order
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    /// First value for `key`
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over `(key, values)` in first-appearance order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SinkOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (key, value) in iter {
            options.push(key, value);
        }
        options
    }
}

/// Parsed destination descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDescriptor {
    /// Destination type (`log`, `kafka`, `webhook`, ...)
    pub type_tag: String,
    /// Host alone, without port or path; may be empty
    pub host: String,
    /// Host (with port) followed by path; may be empty
    pub address: String,
    pub options: SinkOptions,
    raw: String,
}

impl SinkDescriptor {
    /// Parse a descriptor string
    ///
    /// # Errors
    /// `MalformedDescriptor` when the tag is empty or the remainder is not a
    /// valid URI.
    pub fn parse(raw: &str) -> Result<Self, ContractError> {
        let raw = raw.trim();
        let (type_tag, rest) = raw.split_once(':').unwrap_or((raw, ""));

        if type_tag.is_empty() {
            return Err(ContractError::malformed_descriptor(raw, "missing sink type"));
        }

        let mut descriptor = Self {
            type_tag: type_tag.to_string(),
            host: String::new(),
            address: String::new(),
            options: SinkOptions::new(),
            raw: raw.to_string(),
        };

        if rest.is_empty() {
            return Ok(descriptor);
        }

        let url = Url::parse(&format!("{PARSE_SCHEME}:{rest}"))
            .map_err(|e| ContractError::malformed_descriptor(raw, e.to_string()))?;

        let host = url.host_str().unwrap_or_default().to_string();
        let mut address = host.clone();
        if let Some(port) = url.port() {
            address.push_str(&format!(":{port}"));
        }
        address.push_str(url.path());

        descriptor.host = host;
        descriptor.address = address;
        descriptor.options = url.query_pairs().collect();
        Ok(descriptor)
    }

    /// Original descriptor text (used in log lines)
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for SinkDescriptor {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SinkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
