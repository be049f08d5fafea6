//! Bit layout of the fixed part of a TCF v1.1 Vendor Consent String.
//!
//! Every field up to and including the vendor encoding type has a fixed offset and width,
//! listed once in [`FIXED_FIELDS`]. What follows the encoding type depends on its value and is
//! described by the `*_WIDTH` constants.
//!
//! See <https://github.com/InteractiveAdvertisingBureau/GDPR-Transparency-and-Consent-Framework/blob/master/Consent%20string%20and%20vendor%20list%20formats%20v1.1%20Final.md#vendor-consent-string-format->
use strum_macros::Display;

/// Fields with a fixed position in the consent string, in stream order.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
pub enum Field {
    Version,
    Created,
    LastUpdated,
    CmpId,
    CmpVersion,
    ConsentScreen,
    ConsentLanguage,
    VendorListVersion,
    PurposesAllowed,
    MaxVendorId,
    EncodingType,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldSpec {
    pub field: Field,
    /// Offset in bits from the start of the string.
    pub offset: u64,
    /// Width in bits.
    pub width: u32,
}

impl FieldSpec {
    /// Offset of the first bit after this field.
    pub const fn end(&self) -> u64 {
        self.offset + self.width as u64
    }
}

const fn spec(field: Field, offset: u64, width: u32) -> FieldSpec {
    FieldSpec {
        field,
        offset,
        width,
    }
}

/// Fixed fields, indexed by `Field as usize`.
pub const FIXED_FIELDS: [FieldSpec; 11] = [
    spec(Field::Version, 0, 6),
    spec(Field::Created, 6, 36),
    spec(Field::LastUpdated, 42, 36),
    spec(Field::CmpId, 78, 12),
    spec(Field::CmpVersion, 90, 12),
    spec(Field::ConsentScreen, 102, 6),
    spec(Field::ConsentLanguage, 108, 12),
    spec(Field::VendorListVersion, 120, 12),
    spec(Field::PurposesAllowed, 132, 24),
    spec(Field::MaxVendorId, 156, 16),
    spec(Field::EncodingType, 172, 1),
];

/// Number of bits before the vendor section body.
pub const FIXED_FIELDS_BITS: u64 = FIXED_FIELDS[FIXED_FIELDS.len() - 1].end();

/// Width of a single consent language letter.
pub const LETTER_WIDTH: u32 = 6;
pub const DEFAULT_CONSENT_WIDTH: u32 = 1;
pub const NUM_ENTRIES_WIDTH: u32 = 12;
pub const IS_RANGE_WIDTH: u32 = 1;
pub const VENDOR_ID_WIDTH: u32 = 16;

impl Field {
    pub const fn spec(self) -> FieldSpec {
        FIXED_FIELDS[self as usize]
    }
}
