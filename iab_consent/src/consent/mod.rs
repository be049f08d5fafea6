//! The decoded Vendor Consent String and its consent queries.
//!
//! A [`ParsedConsent`] is produced in one pass, either from raw bytes with [`decode`] or
//! from its Base64 URL representation through [`FromStr`]. Once built it is never mutated.
use crate::core::base64;
use crate::core::{IdSet, ReadError};
use chrono::{DateTime, Utc};
use num_derive::{FromPrimitive, ToPrimitive};
#[cfg(feature = "serde")]
use serde::Serialize;
use std::str::FromStr;
use strum_macros::Display;
use thiserror::Error;

mod decode;

pub use decode::decode;

#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The string is not URL safe Base64.
    #[error("unable to decode base64 string")]
    MalformedInput(#[from] base64::DecodeError),
    /// A field extends past the end of the data.
    #[error("cannot read {requested} bits at offset {offset}, only {remaining} left")]
    OutOfRange {
        offset: u64,
        requested: u64,
        remaining: u64,
    },
    /// The decoder broke one of its own invariants. This is a bug, not bad input.
    #[error("invalid decoder state: {0}")]
    InvalidState(String),
}

impl DecodeError {
    /// Returns true if the error comes from a decoder defect rather than from the input.
    pub fn is_defect(&self) -> bool {
        matches!(self, DecodeError::InvalidState(_))
    }
}

impl From<ReadError> for DecodeError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::OutOfRange {
                offset,
                requested,
                remaining,
            } => DecodeError::OutOfRange {
                offset,
                requested,
                remaining,
            },
            e @ (ReadError::InvalidWidth(_) | ReadError::InvalidTimestamp(_)) => {
                DecodeError::InvalidState(e.to_string())
            }
        }
    }
}

/// How vendor consents are stored in the string.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum EncodingMode {
    BitField = 0,
    Range = 1,
}

/// Inclusive range of vendor ids. A single id has equal bounds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RangeEntry {
    pub start_vendor_id: u16,
    pub end_vendor_id: u16,
}

impl RangeEntry {
    pub fn contains(&self, vendor_id: u16) -> bool {
        (self.start_vendor_id..=self.end_vendor_id).contains(&vendor_id)
    }

    /// Whether the entry was encoded as a start/end pair rather than a single id.
    pub fn is_range(&self) -> bool {
        self.start_vendor_id != self.end_vendor_id
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "encoding_mode"))]
pub enum VendorConsents {
    /// One bit per vendor up to the max vendor id.
    BitField { approved_vendor_ids: IdSet },
    /// Exceptions to `default_consent`, in the order they were encoded.
    Range {
        default_consent: bool,
        entries: Vec<RangeEntry>,
    },
}

// See https://github.com/InteractiveAdvertisingBureau/GDPR-Transparency-and-Consent-Framework/blob/master/Consent%20string%20and%20vendor%20list%20formats%20v1.1%20Final.md
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[non_exhaustive]
pub struct ParsedConsent {
    pub version: u8,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub cmp_id: u16,
    pub cmp_version: u16,
    pub consent_screen: u8,
    pub consent_language: String,
    pub vendor_list_version: u16,
    pub purposes_allowed: IdSet,
    pub max_vendor_id: u16,
    pub vendor_consents: VendorConsents,
}

impl FromStr for ParsedConsent {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = base64::decode(s)?;
        decode(&b)
    }
}

impl ParsedConsent {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        decode(bytes)
    }

    pub fn encoding_mode(&self) -> EncodingMode {
        match self.vendor_consents {
            VendorConsents::BitField { .. } => EncodingMode::BitField,
            VendorConsents::Range { .. } => EncodingMode::Range,
        }
    }

    /// Consent given to vendors outside every range. Only defined in range mode.
    pub fn default_consent(&self) -> Option<bool> {
        match self.vendor_consents {
            VendorConsents::BitField { .. } => None,
            VendorConsents::Range {
                default_consent, ..
            } => Some(default_consent),
        }
    }

    pub fn range_entries(&self) -> &[RangeEntry] {
        match &self.vendor_consents {
            VendorConsents::BitField { .. } => &[],
            VendorConsents::Range { entries, .. } => entries.as_slice(),
        }
    }

    pub fn num_entries(&self) -> usize {
        self.range_entries().len()
    }

    pub fn approved_vendor_ids(&self) -> Option<&IdSet> {
        match &self.vendor_consents {
            VendorConsents::BitField {
                approved_vendor_ids,
            } => Some(approved_vendor_ids),
            VendorConsents::Range { .. } => None,
        }
    }

    pub fn purpose_allowed(&self, purpose_id: u16) -> bool {
        self.purposes_allowed.contains(&purpose_id)
    }

    /// Returns true if every purpose in `ids` is allowed, which is the case for no purposes.
    pub fn every_purpose_allowed<I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = u16>,
    {
        ids.into_iter().all(|id| self.purpose_allowed(id))
    }

    /// Returns true if the user consents to vendor `vendor_id`.
    ///
    /// In range mode, the first entry containing the vendor, in encoding order, negates the
    /// default consent. Entries are neither required to be sorted nor disjoint.
    pub fn vendor_allowed(&self, vendor_id: u16) -> bool {
        match &self.vendor_consents {
            VendorConsents::BitField {
                approved_vendor_ids,
            } => approved_vendor_ids.contains(&vendor_id),
            VendorConsents::Range {
                default_consent,
                entries,
            } => entries
                .iter()
                .find(|e| e.contains(vendor_id))
                .map_or(*default_consent, |_| !*default_consent),
        }
    }

    /// Every vendor in `1..=max_vendor_id` the user consents to.
    pub fn allowed_vendor_ids(&self) -> IdSet {
        (1..=self.max_vendor_id)
            .filter(|&id| self.vendor_allowed(id))
            .collect()
    }
}
