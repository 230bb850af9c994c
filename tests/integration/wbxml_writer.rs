//! Test-only WBXML encoder.
//!
//! Re-encodes a textual provisioning document into PROV 1.0 WBXML using
//! the decoder's own token tables.  Attribute values are split into the
//! longest known start prefix, then a value token or a string.  With
//! `string_table` set, every string goes through the string table instead
//! of being inlined.

use cellprov::decoder::tokens::{self, ATTR_STARTS, ATTR_VALUES, TAGS};
use cellprov::decoder::{Attribute, DecodeError, TagHandler, xml};

pub struct WbxmlWriter {
    body: Vec<u8>,
    table: Vec<u8>,
    string_table: bool,
    attr_page: u8,
}

impl WbxmlWriter {
    pub fn new(string_table: bool) -> Self {
        Self {
            body: Vec::new(),
            table: Vec::new(),
            string_table,
            attr_page: 0,
        }
    }

    /// Header (v1.3, PROV 1.0, UTF-8), string table, body.
    pub fn finish(self) -> Vec<u8> {
        let mut out = vec![0x03, 0x0B, 0x6A];
        mb_u_int32(&mut out, self.table.len() as u32);
        out.extend_from_slice(&self.table);
        out.extend_from_slice(&self.body);
        out
    }

    fn string(&mut self, s: &str) {
        if self.string_table {
            let offset = self.table.len() as u32;
            self.table.extend_from_slice(s.as_bytes());
            self.table.push(0);
            self.body.push(tokens::STR_T);
            mb_u_int32(&mut self.body, offset);
        } else {
            self.body.push(tokens::STR_I);
            self.body.extend_from_slice(s.as_bytes());
            self.body.push(0);
        }
    }

    fn attribute(&mut self, attr: &Attribute) {
        let current = self.attr_page;
        let (page, token, prefix) = ATTR_STARTS
            .iter()
            .filter(|(_, _, name, _)| *name == attr.name)
            .map(|(page, token, _, prefix)| (*page, *token, prefix.unwrap_or("")))
            .filter(|(_, _, prefix)| attr.value.starts_with(prefix))
            .max_by_key(|(page, _, prefix)| (prefix.len(), *page == current))
            .unwrap_or_else(|| panic!("no attribute start for {}", attr.name));

        if page != self.attr_page {
            self.body.extend_from_slice(&[tokens::SWITCH_PAGE, page]);
            self.attr_page = page;
        }
        self.body.push(token);

        let rest = &attr.value[prefix.len()..];
        if rest.is_empty() {
            return;
        }
        match ATTR_VALUES.iter().find(|(p, _, v)| *p == page && *v == rest) {
            Some((_, value_token, _)) => self.body.push(*value_token),
            None => self.string(rest),
        }
    }
}

impl TagHandler for WbxmlWriter {
    fn start_tag(
        &mut self,
        name: &str,
        attributes: &[Attribute],
        empty: bool,
    ) -> Result<(), DecodeError> {
        let (_, id, _) = TAGS
            .iter()
            .find(|(page, _, tag)| *page == 0 && *tag == name)
            .unwrap_or_else(|| panic!("no tag token for {name}"));
        let mut token = *id;
        if !attributes.is_empty() {
            token |= tokens::TAG_HAS_ATTRIBUTES;
        }
        if !empty {
            token |= tokens::TAG_HAS_CONTENT;
        }
        self.body.push(token);

        if !attributes.is_empty() {
            for attr in attributes {
                self.attribute(attr);
            }
            self.body.push(tokens::END);
        }
        Ok(())
    }

    fn end_tag(&mut self, _name: &str, empty: bool) -> Result<(), DecodeError> {
        if !empty {
            self.body.push(tokens::END);
        }
        Ok(())
    }
}

pub fn mb_u_int32(out: &mut Vec<u8>, mut value: u32) {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    bytes.reverse();
    out.extend_from_slice(&bytes);
}

/// Encode a textual document.
pub fn encode(text: &str, string_table: bool) -> Vec<u8> {
    let mut writer = WbxmlWriter::new(string_table);
    xml::parse(text, &mut writer).expect("fixture is well-formed");
    writer.finish()
}

#[test]
fn multibyte_integers() {
    let mut out = Vec::new();
    mb_u_int32(&mut out, 0x7F);
    mb_u_int32(&mut out, 0x80);
    mb_u_int32(&mut out, 0x3FFF);
    assert_eq!(out, vec![0x7F, 0x81, 0x00, 0xFF, 0x7F]);
}

#[test]
fn encodes_empty_parm_with_prefixed_start() {
    let doc = encode(
        r#"<wap-provisioningdoc><characteristic type="NAPDEF"><parm name="NAP-ADDRTYPE" value="APN"/></characteristic></wap-provisioningdoc>"#,
        false,
    );
    assert_eq!(
        doc,
        vec![
            0x03, 0x0B, 0x6A, 0x00, //
            0x45, // wap-provisioningdoc, content
            0xC6, 0x55, 0x01, // characteristic type=NAPDEF
            0x87, 0x09, 0x06, 0x89, 0x01, // parm name=NAP-ADDRTYPE value=APN
            0x01, 0x01,
        ]
    );
}
