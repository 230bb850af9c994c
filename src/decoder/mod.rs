//! OMA Client Provisioning decoder.
//!
//! ```text
//!  bytes ──▶ wbxml::parse ─┐
//!                          ├─▶ TagHandler ──▶ Collector ──▶ resolver::resolve ──▶ ProvisioningSettings
//!  text ───▶ xml::parse  ──┘   (start/end)    (records)     (cross-references)
//! ```
//!
//! Both document sources drive the same two callbacks, so the collector
//! and resolver never see the encoding.  Decoding is fail-closed: any
//! malformed input yields a [`DecodeError`] and no settings.

pub mod collector;
pub mod resolver;
pub mod tokens;
pub mod wbxml;
pub mod xml;

use log::{debug, info};

pub use crate::error::DecodeError;
use crate::settings::ProvisioningSettings;

use collector::Collector;

/// Content type of binary provisioning documents.
pub const WBXML_CONTENT_TYPE: &str = "application/vnd.wap.connectivity-wbxml";

/// Content type of textual provisioning documents.
pub const XML_CONTENT_TYPE: &str = "text/vnd.wap.connectivity-xml";

/// Deepest element nesting either document source accepts.
pub const MAX_DEPTH: usize = 64;

/// One `name="value"` pair on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Element callbacks driven by a document source.
///
/// `empty` is true for elements without content (`<parm .../>`); those
/// receive `start_tag` immediately followed by `end_tag`.  Returning an
/// error aborts the parse.
pub trait TagHandler {
    fn start_tag(
        &mut self,
        name: &str,
        attributes: &[Attribute],
        empty: bool,
    ) -> Result<(), DecodeError>;

    fn end_tag(&mut self, name: &str, empty: bool) -> Result<(), DecodeError>;
}

/// Find the value of attribute `name`.
pub fn attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}

/// Decode a binary (WBXML) provisioning document.
pub fn decode_wbxml(data: &[u8]) -> Result<ProvisioningSettings, DecodeError> {
    let mut collector = Collector::new();
    wbxml::parse(data, &mut collector)?;
    finish(collector)
}

/// Decode a textual provisioning document.
pub fn decode_xml(text: &str) -> Result<ProvisioningSettings, DecodeError> {
    let mut collector = Collector::new();
    xml::parse(text, &mut collector)?;
    finish(collector)
}

/// Decode a payload according to its declared content type.
///
/// Unknown content types are decoded as WBXML, which is what the push
/// boundary admits by default.
pub fn decode_payload(
    content_type: &str,
    payload: &[u8],
) -> Result<ProvisioningSettings, DecodeError> {
    if content_type == XML_CONTENT_TYPE {
        let text = core::str::from_utf8(payload).map_err(|_| DecodeError::InvalidString)?;
        decode_xml(text)
    } else {
        decode_wbxml(payload)
    }
}

/// Guess the content type of an undeclared document.
///
/// Textual documents start with `<` after an optional UTF-8 BOM and
/// whitespace; WBXML starts with its version byte.
pub fn sniff_content_type(payload: &[u8]) -> &'static str {
    let body = payload.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(payload);
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'<') => XML_CONTENT_TYPE,
        _ => WBXML_CONTENT_TYPE,
    }
}

fn finish(collector: Collector) -> Result<ProvisioningSettings, DecodeError> {
    let records = collector.finish()?;
    debug!(
        "Collected {} NAPDEF, {} APPLICATION, {} PXLOGICAL",
        records.napdefs.len(),
        records.applications.len(),
        records.pxlogicals.len()
    );
    let settings = resolver::resolve(&records);
    info!(
        "Decoded provisioning document: internet={} mms={}",
        settings.internet.is_some(),
        settings.mms.is_some()
    );
    Ok(settings)
}
