//! This crate decodes IAB Vendor Consent Strings, as defined by version 1.1 of the
//! [Transparency and Consent Framework](https://github.com/InteractiveAdvertisingBureau/GDPR-Transparency-and-Consent-Framework/blob/master/Consent%20string%20and%20vendor%20list%20formats%20v1.1%20Final.md).
//!
//! NOTE: This is not an official IAB library.
//!
//! # Parsing consent strings
//!
//! A consent string is a URL safe, unpadded Base64 encoding of a bit-packed record.
//! [`ParsedConsent`] implements [`FromStr`](std::str::FromStr) to decode it:
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use iab_consent::{EncodingMode, ParsedConsent};
//!
//! let consent: ParsedConsent = "BONMj34ONMj34ABACDENALqAAAAAplY".parse()?;
//!
//! assert_eq!(consent.cmp_id, 1);
//! assert_eq!(consent.consent_language, "EN");
//! assert_eq!(consent.encoding_mode(), EncodingMode::BitField);
//! # Ok(())
//! # }
//! ```
//!
//! Raw bytes, once Base64 decoded by other means, are handled by [`decode`].
//!
//! # Checking consent
//!
//! Vendor consents are stored either as one bit per vendor, or as a list of ranges of vendors
//! whose consent is the opposite of a default value. Both are queried the same way:
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use iab_consent::ParsedConsent;
//!
//! let consent: ParsedConsent = "BOEFEAyOEFEAyAHABDENAI4AAAB9vABAASA".parse()?;
//!
//! // may vendor 8 store information on the device (purpose 1) and personalise ads (purpose 3)?
//! let allowed = consent.every_purpose_allowed([1, 3]) && consent.vendor_allowed(8);
//! assert!(allowed);
//!
//! // vendor 9 is the only exception to the default consent
//! assert!(!consent.vendor_allowed(9));
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! A string that cannot be fully decoded is an error, there is no partial result.
//! [`DecodeError::MalformedInput`] and [`DecodeError::OutOfRange`] come from the input,
//! [`DecodeError::InvalidState`] reports a bug in the decoder.
//!
pub(crate) mod core;
pub mod consent;
pub mod layout;

pub use crate::consent::{
    decode, DecodeError, EncodingMode, ParsedConsent, RangeEntry, VendorConsents,
};
pub use crate::core::base64::DecodeError as Base64DecodeError;
pub use crate::core::{BitReader, IdSet, ReadError};
