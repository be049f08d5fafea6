use assert_json_diff::assert_json_eq;
use iab_consent::{DecodeError, ParsedConsent};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs::File;
use std::io;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Deserialize)]
pub struct TestCase {
    consent_string: String,
    #[serde(default)]
    expected: Option<Value>,
    #[serde(default)]
    vendor_allowed: Vec<(u16, bool)>,
    #[serde(default)]
    error: Option<String>,
}

impl TestCase {
    pub fn load_from_file<P: AsRef<Path>>(p: P) -> io::Result<Self> {
        let f = File::open(p)?;
        let tc: Self = serde_json::from_reader(&f)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
        Ok(tc)
    }

    pub fn assert_decodes_as_expected(&self) {
        let r = self.consent_string.parse::<ParsedConsent>();

        if let Some(kind) = &self.error {
            let e = r.expect_err("decoding should fail");
            assert_eq!(error_kind(&e), kind.as_str(), "unexpected error {e}");
            return;
        }

        let consent = match r {
            Ok(c) => c,
            Err(e) => panic!("consent string decode error: {e}"),
        };

        if let Some(expected) = &self.expected {
            assert_json_eq!(to_json(&consent), expected.clone());
        }

        for &(id, allowed) in &self.vendor_allowed {
            assert_eq!(consent.vendor_allowed(id), allowed, "vendor {id}");
        }
    }
}

fn error_kind(e: &DecodeError) -> &'static str {
    match e {
        DecodeError::MalformedInput(_) => "MalformedInput",
        DecodeError::OutOfRange { .. } => "OutOfRange",
        DecodeError::InvalidState(_) => "InvalidState",
        _ => "Unknown",
    }
}

/// Flat JSON view of a record, timestamps in milliseconds.
fn to_json(c: &ParsedConsent) -> Value {
    json!({
        "version": c.version,
        "created": c.created.timestamp_millis(),
        "last_updated": c.last_updated.timestamp_millis(),
        "cmp_id": c.cmp_id,
        "cmp_version": c.cmp_version,
        "consent_screen": c.consent_screen,
        "consent_language": c.consent_language,
        "vendor_list_version": c.vendor_list_version,
        "purposes_allowed": c.purposes_allowed,
        "max_vendor_id": c.max_vendor_id,
        "encoding_mode": c.encoding_mode().to_string(),
        "default_consent": c.default_consent(),
        "approved_vendor_ids": c.approved_vendor_ids(),
        "range_entries": c
            .range_entries()
            .iter()
            .map(|e| [e.start_vendor_id, e.end_vendor_id])
            .collect::<Vec<_>>(),
    })
}
