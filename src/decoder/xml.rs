//! Textual provisioning documents (`text/vnd.wap.connectivity-xml`).
//!
//! Drives the same [`TagHandler`] callbacks as the WBXML tokenizer, so a
//! document decodes identically in either encoding.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{Attribute, DecodeError, MAX_DEPTH, TagHandler};

/// Parse `text` and feed every element to `handler`.
pub fn parse(text: &str, handler: &mut impl TagHandler) -> Result<(), DecodeError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(DecodeError::NestingTooDeep);
                }
                let (name, attributes) = element(&e)?;
                handler.start_tag(&name, &attributes, false)?;
            }
            Event::Empty(e) => {
                if depth + 1 > MAX_DEPTH {
                    return Err(DecodeError::NestingTooDeep);
                }
                let (name, attributes) = element(&e)?;
                handler.start_tag(&name, &attributes, true)?;
                handler.end_tag(&name, true)?;
            }
            Event::End(e) => {
                depth = depth.checked_sub(1).ok_or(DecodeError::UnbalancedElement)?;
                let qname = e.name();
                let name = utf8(qname.as_ref())?;
                handler.end_tag(name, false)?;
            }
            Event::Eof => break,
            // Declarations, comments, doctype and text carry nothing we use.
            _ => {}
        }
    }

    if depth != 0 {
        return Err(DecodeError::UnbalancedElement);
    }
    Ok(())
}

fn element(e: &BytesStart<'_>) -> Result<(String, Vec<Attribute>), DecodeError> {
    let name = utf8(e.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| DecodeError::Xml(err.to_string()))?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value().map_err(xml_error)?;
        attributes.push(Attribute::new(key, value.into_owned()));
    }
    Ok((name, attributes))
}

fn utf8(bytes: &[u8]) -> Result<&str, DecodeError> {
    core::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidString)
}

fn xml_error(err: quick_xml::Error) -> DecodeError {
    DecodeError::Xml(err.to_string())
}
