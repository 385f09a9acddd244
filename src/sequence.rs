//! Sequence rows and number formatting
use serde::{Deserialize, Serialize};
use std::fmt;

use super::timestamp::Timestamp;

/// What a sequence numbers. Each party has at most one sequence per purpose.
#[derive(
    minicbor::Encode,
    minicbor::Decode,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
pub enum Purpose {
    #[n(0)]
    Article,
    #[n(1)]
    Order,
}

impl Purpose {
    pub const ALL: [Purpose; 2] = [Purpose::Article, Purpose::Order];

    pub fn name(&self) -> &'static str {
        match self {
            Purpose::Article => "article",
            Purpose::Order => "order",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stored counter state for one (party, purpose) pair.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct SequenceEntry {
    #[n(0)]
    pub party_id: String,
    #[n(1)]
    pub purpose: Purpose,
    #[n(2)]
    pub prefix: String, // fixed once created
    #[n(3)]
    pub value: u64, // last issued number, 0 before the first
    #[n(4)]
    pub created_at: Timestamp,
}

impl SequenceEntry {
    pub fn new(party_id: &str, purpose: Purpose, prefix: &str) -> Self {
        Self {
            party_id: party_id.to_string(),
            purpose,
            prefix: prefix.to_string(),
            value: 0,
            created_at: Timestamp::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Refuse to issue numbers that no longer fit the configured width.
    #[default]
    Reject,
    /// Keep counting and render the extra digits.
    Widen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    width: u32,
    overflow: OverflowPolicy,
}

impl NumberFormat {
    pub fn new(width: u32, overflow: OverflowPolicy) -> Self {
        Self { width, overflow }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Highest value that may be issued, `None` when unbounded.
    pub fn max_value(&self) -> Option<u64> {
        match self.overflow {
            OverflowPolicy::Reject => 10u64.checked_pow(self.width).map(|limit| limit - 1),
            OverflowPolicy::Widen => None,
        }
    }

    pub fn admits(&self, value: u64) -> bool {
        self.max_value().is_none_or(|max| value <= max)
    }

    pub fn render(&self, prefix: &str, value: u64) -> SequenceNumber {
        let width = self.width as usize;
        SequenceNumber {
            formatted: format!("{prefix}{value:0width$}"),
            value,
        }
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::new(5, OverflowPolicy::Reject)
    }
}

/// A reserved, formatted number: prefix followed by the zero-padded value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceNumber {
    formatted: String,
    value: u64,
}

impl SequenceNumber {
    pub fn as_str(&self) -> &str {
        &self.formatted
    }
    pub fn value(&self) -> u64 {
        self.value
    }
    pub fn into_string(self) -> String {
        self.formatted
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted)
    }
}

impl From<SequenceNumber> for String {
    fn from(value: SequenceNumber) -> Self {
        value.formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_prefix_and_padded_value() {
        let number = NumberFormat::default().render("AEC-05-A", 9);
        assert_eq!(number.as_str(), "AEC-05-A00009");
        assert_eq!(number.value(), 9);
    }

    #[test]
    fn reject_policy_caps_at_width() {
        let format = NumberFormat::new(5, OverflowPolicy::Reject);
        assert_eq!(format.max_value(), Some(99_999));
        assert!(format.admits(99_999));
        assert!(!format.admits(100_000));
    }

    #[test]
    fn widen_policy_renders_extra_digits() {
        let format = NumberFormat::new(5, OverflowPolicy::Widen);
        assert!(format.admits(u64::MAX));
        assert_eq!(format.render("O-", 123_456).as_str(), "O-123456");
    }

    #[test]
    fn widest_reject_format_fits_u64() {
        let format = NumberFormat::new(19, OverflowPolicy::Reject);
        assert_eq!(format.max_value(), Some(9_999_999_999_999_999_999));
    }

    #[test]
    fn entry_survives_cbor_encoding() {
        let entry = SequenceEntry::new("aec-05", Purpose::Order, "AEC-05-B");
        let encoded = minicbor::to_vec(&entry).unwrap();
        let decoded: SequenceEntry = minicbor::decode(&encoded).unwrap();
        assert_eq!(entry, decoded);
    }
}
