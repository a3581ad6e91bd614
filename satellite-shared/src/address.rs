//! Fixed-width communication addresses.
//!
//! An [`Address`] is a fixed-width ASCII string. The high-order prefix
//! identifies a satellite; the low-order suffix identifies an endpoint
//! under that satellite. The all-zero suffix denotes "the satellite
//! itself". Validity depends on process-wide configuration (total length,
//! prefix length, alphabet, reserved master prefix) captured by
//! [`AddressConfig`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated, fixed-width communication address.
///
/// `Address` is a thin newtype around a `String` rather than a fixed-size
/// array: the width is a runtime (configuration) property, not a
/// compile-time one, since different deployments may choose different
/// `L`/`P`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Wrap a string as an `Address` without validating it against any
    /// particular [`AddressConfig`]. Prefer [`AddressConfig::validate`].
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Process-wide address format configuration, read once at startup.
///
/// `total_length` (`L`) and `prefix_length` (`P`) define the fixed width
/// and the satellite/endpoint split. `alphabet` restricts the permitted
/// characters (normally `[A-Z0-9]`). `master_prefix` is the reserved
/// prefix that only the master address may carry.
#[derive(Clone, Debug)]
pub struct AddressConfig {
    pub total_length: usize,
    pub prefix_length: usize,
    pub alphabet: fn(char) -> bool,
    pub master_address: Address,
}

impl AddressConfig {
    /// Default alphabet: uppercase ASCII letters and digits.
    pub fn default_alphabet(c: char) -> bool {
        c.is_ascii_uppercase() || c.is_ascii_digit()
    }

    /// The all-zero suffix, used as the "satellite itself" endpoint.
    pub fn zero_suffix(&self) -> String {
        "0".repeat(self.total_length - self.prefix_length)
    }

    /// Validate `raw` against this configuration and return a parsed
    /// [`Address`] on success.
    ///
    /// An address is valid if it matches the fixed total width, uses only
    /// the permitted alphabet, and has non-empty prefix and suffix. The
    /// reserved master prefix is legal only for the master address
    /// constant itself.
    pub fn validate(&self, raw: &str) -> Option<Address> {
        if raw.len() != self.total_length {
            return None;
        }
        if self.prefix_length == 0 || self.prefix_length >= self.total_length {
            return None;
        }
        if !raw.chars().all(self.alphabet) {
            return None;
        }
        if raw == self.master_address.as_str() {
            return Some(Address::new_unchecked(raw));
        }
        if self.prefix_of_str(raw) == self.prefix_of_str(self.master_address.as_str()) {
            // Reserved master prefix claimed by a non-master address.
            return None;
        }
        Some(Address::new_unchecked(raw))
    }

    fn prefix_of_str<'a>(&self, raw: &'a str) -> &'a str {
        &raw[..self.prefix_length]
    }

    /// The satellite prefix of an address (first `P` characters).
    pub fn prefix_of(&self, addr: &Address) -> &str {
        self.prefix_of_str(addr.as_str())
    }

    /// The endpoint suffix of an address (last `L - P` characters).
    pub fn suffix_of<'a>(&self, addr: &'a Address) -> &'a str {
        &addr.as_str()[self.prefix_length..]
    }

    /// Build an address from a satellite prefix and endpoint suffix.
    ///
    /// Fails if the combined length doesn't match `L` or the result
    /// doesn't pass [`AddressConfig::validate`].
    pub fn make_address(&self, prefix: &str, suffix: &str) -> Option<Address> {
        if prefix.len() != self.prefix_length {
            return None;
        }
        if suffix.len() != self.total_length - self.prefix_length {
            return None;
        }
        let raw = format!("{prefix}{suffix}");
        self.validate(&raw)
    }

    /// The address denoting "the satellite itself" for the given prefix:
    /// the all-zero suffix.
    pub fn satellite_self_address(&self, prefix: &str) -> Option<Address> {
        self.make_address(prefix, &self.zero_suffix())
    }
}
