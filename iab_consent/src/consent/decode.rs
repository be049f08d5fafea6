use crate::consent::{DecodeError, EncodingMode, ParsedConsent, RangeEntry, VendorConsents};
use crate::core::{BitReader, IdSet};
use crate::layout::{
    Field, DEFAULT_CONSENT_WIDTH, IS_RANGE_WIDTH, LETTER_WIDTH, NUM_ENTRIES_WIDTH, VENDOR_ID_WIDTH,
};
use chrono::{DateTime, Utc};
use log::{debug, trace};
use num_traits::FromPrimitive;

/// Decodes a Vendor Consent String from its raw bytes.
///
/// Trailing bits after the vendor section are ignored.
pub fn decode(bytes: &[u8]) -> Result<ParsedConsent, DecodeError> {
    let mut d = Decoder {
        r: BitReader::new(bytes),
    };

    let version: u8 = d.uint(Field::Version)?;
    let created = d.timestamp(Field::Created)?;
    let last_updated = d.timestamp(Field::LastUpdated)?;
    let cmp_id: u16 = d.uint(Field::CmpId)?;
    let cmp_version: u16 = d.uint(Field::CmpVersion)?;
    let consent_screen: u8 = d.uint(Field::ConsentScreen)?;
    let consent_language = d.letters(Field::ConsentLanguage)?;
    let vendor_list_version: u16 = d.uint(Field::VendorListVersion)?;
    let purposes_allowed = d.id_set(Field::PurposesAllowed)?;
    let max_vendor_id: u16 = d.uint(Field::MaxVendorId)?;
    let encoding_mode: EncodingMode = d.uint(Field::EncodingType)?;

    let vendor_consents = match encoding_mode {
        EncodingMode::Range => d.range_section()?,
        EncodingMode::BitField => VendorConsents::BitField {
            approved_vendor_ids: d.r.read_purpose_set(max_vendor_id as usize)?,
        },
    };

    debug!(
        "decoded consent string v{version} from CMP {cmp_id}/{cmp_version}, {encoding_mode} encoding, {} bits left",
        d.r.remaining_bits()
    );

    Ok(ParsedConsent {
        version,
        created,
        last_updated,
        cmp_id,
        cmp_version,
        consent_screen,
        consent_language,
        vendor_list_version,
        purposes_allowed,
        max_vendor_id,
        vendor_consents,
    })
}

struct Decoder<'a> {
    r: BitReader<'a>,
}

impl Decoder<'_> {
    /// Width of `field`, after checking the cursor sits at its offset.
    fn width(&self, field: Field) -> Result<u32, DecodeError> {
        let spec = field.spec();
        let position = self.r.position();
        if position != spec.offset {
            return Err(DecodeError::InvalidState(format!(
                "{field} should start at bit {}, cursor is at bit {position}",
                spec.offset
            )));
        }

        Ok(spec.width)
    }

    fn uint<T: FromPrimitive>(&mut self, field: Field) -> Result<T, DecodeError> {
        let width = self.width(field)?;
        let value = self.r.read_uint(width)?;

        T::from_u64(value).ok_or_else(|| {
            DecodeError::InvalidState(format!("value {value} out of bounds for {field}"))
        })
    }

    fn timestamp(&mut self, field: Field) -> Result<DateTime<Utc>, DecodeError> {
        self.width(field)?;
        Ok(self.r.read_timestamp()?)
    }

    fn letters(&mut self, field: Field) -> Result<String, DecodeError> {
        let width = self.width(field)?;
        Ok(self.r.read_letters((width / LETTER_WIDTH) as usize)?)
    }

    fn id_set(&mut self, field: Field) -> Result<IdSet, DecodeError> {
        let width = self.width(field)?;
        Ok(self.r.read_purpose_set(width as usize)?)
    }

    fn range_section(&mut self) -> Result<VendorConsents, DecodeError> {
        let default_consent = self.r.read_uint(DEFAULT_CONSENT_WIDTH)? != 0;
        let num_entries = self.r.read_uint(NUM_ENTRIES_WIDTH)? as usize;

        // entries are 17 or 33 bits long depending on their own flag
        let mut entries = Vec::with_capacity(num_entries);
        for _ in 0..num_entries {
            let offset = self.r.position();
            let is_range = self.r.read_uint(IS_RANGE_WIDTH)? != 0;
            let start_vendor_id = self.vendor_id()?;
            let end_vendor_id = if is_range {
                self.vendor_id()?
            } else {
                start_vendor_id
            };

            trace!(
                "range entry {start_vendor_id}..={end_vendor_id}, {} bits at offset {offset}",
                self.r.position() - offset
            );
            entries.push(RangeEntry {
                start_vendor_id,
                end_vendor_id,
            });
        }

        Ok(VendorConsents::Range {
            default_consent,
            entries,
        })
    }

    fn vendor_id(&mut self) -> Result<u16, DecodeError> {
        Ok(self.r.read_uint(VENDOR_ID_WIDTH)? as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tests::b;
    use crate::core::ReadError;
    use test_case::test_case;

    /// Header shared by every test string: version 1, created and updated
    /// 1525378200.8, CMP 1 version 2, screen 3, EN, vendor list 11, purposes 1 3 5.
    const HEADER: &str = "000001 \
        001110001101001100100011110111111000 \
        001110001101001100100011110111111000 \
        000000000001 000000000010 000011 000100 001101 000000001011 \
        101010000000000000000000";

    fn bits(body: &str) -> Vec<u8> {
        b(&format!("{HEADER} {body}"))
    }

    #[test]
    fn bitfield() {
        let buf = bits("0000000000001010 0 1100101011");
        let c = decode(&buf).unwrap();

        let t = DateTime::from_timestamp(1525378200, 800_000_000).unwrap();
        assert_eq!(c.version, 1);
        assert_eq!(c.created, t);
        assert_eq!(c.last_updated, t);
        assert_eq!(c.cmp_id, 1);
        assert_eq!(c.cmp_version, 2);
        assert_eq!(c.consent_screen, 3);
        assert_eq!(c.consent_language, "EN");
        assert_eq!(c.vendor_list_version, 11);
        assert_eq!(c.purposes_allowed, IdSet::from([1, 3, 5]));
        assert_eq!(c.max_vendor_id, 10);
        assert_eq!(
            c.vendor_consents,
            VendorConsents::BitField {
                approved_vendor_ids: IdSet::from([1, 2, 5, 7, 9, 10]),
            }
        );
    }

    #[test]
    fn bitfield_consumes_exactly() {
        // 173 fixed bits + 11 vendor bits = 184 bits = 23 bytes
        let buf = bits("0000000000001011 0 11001010111");
        assert_eq!(buf.len(), 23);

        let mut d = Decoder {
            r: BitReader::new(&buf),
        };
        for field in [
            Field::Version,
            Field::Created,
            Field::LastUpdated,
            Field::CmpId,
            Field::CmpVersion,
            Field::ConsentScreen,
            Field::ConsentLanguage,
            Field::VendorListVersion,
            Field::PurposesAllowed,
            Field::MaxVendorId,
            Field::EncodingType,
        ] {
            let width = d.width(field).unwrap();
            d.r.read_uint(width).unwrap();
        }
        d.r.read_purpose_set(11).unwrap();
        assert_eq!(d.r.remaining_bits(), 0);

        assert!(decode(&buf).is_ok());
    }

    #[test_case("1 000000000001 0 0000000001111011" => vec![(123, 123)] ; "single id")]
    #[test_case("1 000000000001 1 0000000001111011 0000000011101010" => vec![(123, 234)] ; "single range")]
    #[test_case("0 000000000010 0 0000000001111011 0 0000000011101010" => vec![(123, 123), (234, 234)] ; "multiple ids")]
    #[test_case("0 000000000010 1 0000000001111011 0000000011101010 1 0000000101011001 0000000111001000" => vec![(123, 234), (345, 456)] ; "multiple ranges")]
    #[test_case("0 000000000010 0 0000000001111011 1 0000000101011001 0000000111001000" => vec![(123, 123), (345, 456)] ; "mixed")]
    #[test_case("0 000000000011 1 0000000101011001 0000000111001000 0 0000000000000001 1 0000000000000010 0000000000000011" => vec![(345, 456), (1, 1), (2, 3)] ; "mixed three entries")]
    #[test_case("0 000000000000" => Vec::<(u16, u16)>::new() ; "no entries")]
    fn range(body: &str) -> Vec<(u16, u16)> {
        let c = decode(&bits(&format!("0000000000001010 1 {body}"))).unwrap();

        c.range_entries()
            .iter()
            .map(|e| (e.start_vendor_id, e.end_vendor_id))
            .collect()
    }

    #[test]
    fn range_default_consent() {
        let c = decode(&bits("0000000000001010 1 1 000000000001 0 0000000000001001")).unwrap();

        assert_eq!(c.default_consent(), Some(true));
        assert!(!c.vendor_allowed(9));
        assert!(c.vendor_allowed(8));
        assert!(c.vendor_allowed(10));
    }

    #[test]
    fn range_header_widths() {
        // default consent flag then a 12 bit entry count, no entries
        let buf = bits("0000000000001010 1 1 000000000000");
        let mut d = Decoder {
            r: BitReader::new(&buf),
        };
        for width in [64, 64, 45] {
            d.r.read_uint(width).unwrap();
        }
        assert_eq!(d.r.position(), 173);

        let consents = d.range_section().unwrap();
        assert_eq!(d.r.position(), 173 + 13);
        assert_eq!(
            consents,
            VendorConsents::Range {
                default_consent: true,
                entries: vec![],
            }
        );
    }

    #[test]
    fn range_entries_of_both_widths() {
        // single id (17 bits), range (33 bits), single id (17 bits)
        let buf = bits(
            "0000000000001010 1 0 000000000011 \
             0 0000000000000001 \
             1 0000000000000010 0000000000000100 \
             0 0000000000000111",
        );
        let c = decode(&buf).unwrap();

        assert_eq!(
            c.range_entries(),
            [
                RangeEntry {
                    start_vendor_id: 1,
                    end_vendor_id: 1,
                },
                RangeEntry {
                    start_vendor_id: 2,
                    end_vendor_id: 4,
                },
                RangeEntry {
                    start_vendor_id: 7,
                    end_vendor_id: 7,
                },
            ]
        );
        assert!(c.vendor_allowed(3));
        assert!(!c.vendor_allowed(5));
        assert!(c.vendor_allowed(7));
    }

    #[test_case(0 ; "empty")]
    #[test_case(1 ; "in created")]
    #[test_case(10 ; "in cmp id")]
    #[test_case(20 ; "in max vendor id")]
    fn truncated_header(len: usize) {
        let buf = bits("0000000000001010 0 1100101011");
        let err = decode(&buf[..len]).unwrap_err();

        assert!(matches!(err, DecodeError::OutOfRange { .. }), "{err:?}");
        assert!(!err.is_defect());
    }

    #[test]
    fn truncated_bitfield() {
        // max vendor id 200 but only a few bits of vendor data
        let buf = bits("0000000011001000 0 1111");
        assert_eq!(
            decode(&buf).unwrap_err(),
            DecodeError::OutOfRange {
                offset: 173,
                requested: 200,
                remaining: 11,
            }
        );
    }

    #[test]
    fn truncated_range_entry() {
        // 3 entries announced, a single one present
        let buf = bits("0000000000001010 1 0 000000000011 0 0000000001111011");
        let err = decode(&buf).unwrap_err();

        assert!(matches!(err, DecodeError::OutOfRange { .. }));
    }

    #[test]
    fn width_checks_cursor() {
        let buf = [0u8; 32];
        let mut d = Decoder {
            r: BitReader::new(&buf),
        };
        d.r.read_bool().unwrap();

        let err = d.width(Field::Version).unwrap_err();
        assert!(err.is_defect());
    }

    #[test]
    fn read_errors_keep_their_kind() {
        assert_eq!(
            DecodeError::from(ReadError::InvalidWidth(65)),
            DecodeError::InvalidState("invalid read width 65 (expected 1 to 64 bits)".to_string())
        );
    }
}
