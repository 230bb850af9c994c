//! Fuzz target: `decoder::decode_xml`
//!
//! cargo fuzz run fuzz_xml_decoder

#![no_main]

use cellprov::decoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        assert!(decoder::decode_payload(decoder::XML_CONTENT_TYPE, data).is_err());
        return;
    };
    let _ = decoder::decode_xml(text);
});
