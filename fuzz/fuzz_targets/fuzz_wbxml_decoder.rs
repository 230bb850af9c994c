//! Fuzz target: `decoder::decode_wbxml`
//!
//! Drives arbitrary byte sequences into the WBXML decoder and asserts
//! that it never panics and that anything it accepts resolved to usable
//! access points.
//!
//! cargo fuzz run fuzz_wbxml_decoder

#![no_main]

use cellprov::decoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(settings) = decoder::decode_wbxml(data) {
        if let Some(net) = &settings.internet {
            assert!(!net.apn.is_empty(), "internet APN must not be empty");
        }
        if let Some(mms) = &settings.mms {
            assert!(!mms.apn.is_empty(), "MMS APN must not be empty");
        }
    }

    // Same bytes through the content-type dispatcher must agree.
    let again = decoder::decode_payload(decoder::WBXML_CONTENT_TYPE, data);
    assert_eq!(again, decoder::decode_wbxml(data));
});
