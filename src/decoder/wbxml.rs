//! Streaming WBXML tokenizer for the PROV 1.0 language.
//!
//! ```text
//!  ┌─────────┬───────────┬─────────┬────────┬──────────────────────┐
//!  │ version │ public id │ charset │ strtbl │ body (*pi element *pi)│
//!  │  u8     │ mb_u_int  │ mb_u_int│ len+raw│                      │
//!  └─────────┴───────────┴─────────┴────────┴──────────────────────┘
//! ```
//!
//! The PROV 1.0 tables are applied whatever public id the header
//! declares; provisioning pushes in the wild frequently carry a string
//! table reference or an unknown id.  Text content, extensions and
//! opaque data are consumed and discarded: the provisioning vocabulary
//! lives entirely in attributes.

use heapless::Vec as BoundedVec;
use log::debug;

use super::tokens::{
    self, END, ENTITY, EXT_0, EXT_1, EXT_2, EXT_I_0, EXT_I_1, EXT_I_2, EXT_T_0, EXT_T_1, EXT_T_2,
    LITERAL, OPAQUE, PI, STR_I, STR_T, SWITCH_PAGE, TAG_HAS_ATTRIBUTES, TAG_HAS_CONTENT,
    TAG_ID_MASK,
};
use super::{Attribute, DecodeError, MAX_DEPTH, TagHandler};

/// IANA MIBenum values we can decode.
const CHARSET_UNKNOWN: u32 = 0;
const CHARSET_US_ASCII: u32 = 3;
const CHARSET_ISO_8859_1: u32 = 4;
const CHARSET_UTF_8: u32 = 106;

/// Parse `data` and drive `handler` with every element.
pub fn parse(data: &[u8], handler: &mut impl TagHandler) -> Result<(), DecodeError> {
    let mut parser = Parser::new(data);
    parser.header()?;
    parser.body(handler)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charset {
    Utf8,
    Latin1,
}

struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
    charset: Charset,
    string_table: &'a [u8],
    tag_page: u8,
    attr_page: u8,
}

impl<'a> Parser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            charset: Charset::Utf8,
            string_table: &[],
            tag_page: 0,
            attr_page: 0,
        }
    }

    // ── Primitives ────────────────────────────────────────────

    fn peek(&self) -> Result<u8, DecodeError> {
        self.data.get(self.pos).copied().ok_or(DecodeError::Truncated)
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    /// `mb_u_int32`: big-endian base-128, continuation in bit 7.
    fn mb_u_int32(&mut self) -> Result<u32, DecodeError> {
        let mut value: u32 = 0;
        for _ in 0..5 {
            let b = self.byte()?;
            if value > (u32::MAX >> 7) {
                return Err(DecodeError::InvalidMultiByte);
            }
            value = (value << 7) | u32::from(b & 0x7F);
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::InvalidMultiByte)
    }

    fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        let end = self.pos.checked_add(len).ok_or(DecodeError::Truncated)?;
        if end > self.data.len() {
            return Err(DecodeError::Truncated);
        }
        self.pos = end;
        Ok(())
    }

    fn decode_str(&self, raw: &[u8]) -> Result<String, DecodeError> {
        match self.charset {
            Charset::Utf8 => core::str::from_utf8(raw)
                .map(str::to_owned)
                .map_err(|_| DecodeError::InvalidString),
            Charset::Latin1 => Ok(raw.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Null-terminated string inline in the token stream.
    fn inline_str(&mut self) -> Result<String, DecodeError> {
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::Truncated)?;
        let s = self.decode_str(&rest[..len])?;
        self.pos += len + 1;
        Ok(s)
    }

    /// Null-terminated string at an offset into the string table.
    fn table_str(&mut self) -> Result<String, DecodeError> {
        let offset = self.mb_u_int32()?;
        let start = offset as usize;
        let rest = self
            .string_table
            .get(start..)
            .filter(|r| !r.is_empty())
            .ok_or(DecodeError::InvalidStringTableOffset(offset))?;
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::InvalidStringTableOffset(offset))?;
        self.decode_str(&rest[..len])
    }

    // ── Header ────────────────────────────────────────────────

    fn header(&mut self) -> Result<(), DecodeError> {
        let version = self.byte()?;
        if version > 0x03 {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let public_id = self.mb_u_int32()?;
        if public_id == 0 {
            // Public id given as a string table reference.
            self.mb_u_int32()?;
        }
        if public_id != tokens::PROV10_PUBLIC_ID {
            debug!("WBXML public id 0x{:02x}, decoding as PROV 1.0", public_id);
        }

        // WBXML 1.0 has no charset field.
        if version >= 0x01 {
            self.charset = match self.mb_u_int32()? {
                CHARSET_UNKNOWN | CHARSET_US_ASCII | CHARSET_UTF_8 => Charset::Utf8,
                CHARSET_ISO_8859_1 => Charset::Latin1,
                other => return Err(DecodeError::UnsupportedCharset(other)),
            };
        }

        let len = self.mb_u_int32()? as usize;
        let start = self.pos;
        self.skip(len)?;
        self.string_table = &self.data[start..self.pos];
        Ok(())
    }

    // ── Body ──────────────────────────────────────────────────

    fn body(&mut self, handler: &mut impl TagHandler) -> Result<(), DecodeError> {
        self.skip_pis()?;

        let mut open: BoundedVec<String, MAX_DEPTH> = BoundedVec::new();
        self.element(handler, &mut open)?;

        while !open.is_empty() {
            match self.peek()? {
                SWITCH_PAGE => {
                    self.pos += 1;
                    self.tag_page = self.byte()?;
                }
                END => {
                    self.pos += 1;
                    if let Some(name) = open.pop() {
                        handler.end_tag(&name, false)?;
                    }
                }
                STR_I => {
                    self.pos += 1;
                    self.inline_str()?;
                }
                STR_T => {
                    self.pos += 1;
                    self.table_str()?;
                }
                ENTITY => {
                    self.pos += 1;
                    self.mb_u_int32()?;
                }
                PI => {
                    self.pos += 1;
                    self.skip_pi_body()?;
                }
                EXT_I_0 | EXT_I_1 | EXT_I_2 => {
                    self.pos += 1;
                    self.inline_str()?;
                }
                EXT_T_0 | EXT_T_1 | EXT_T_2 => {
                    self.pos += 1;
                    self.mb_u_int32()?;
                }
                EXT_0 | EXT_1 | EXT_2 => self.pos += 1,
                OPAQUE => {
                    self.pos += 1;
                    let len = self.mb_u_int32()? as usize;
                    self.skip(len)?;
                }
                _ => self.element(handler, &mut open)?,
            }
        }

        self.skip_pis()?;
        if self.pos != self.data.len() {
            return Err(DecodeError::TrailingData);
        }
        Ok(())
    }

    /// Read one element start and its attributes.  Elements with content
    /// are pushed on `open`; their END arrives later through `body`.
    fn element(
        &mut self,
        handler: &mut impl TagHandler,
        open: &mut BoundedVec<String, MAX_DEPTH>,
    ) -> Result<(), DecodeError> {
        let mut token = self.byte()?;
        while token == SWITCH_PAGE {
            self.tag_page = self.byte()?;
            token = self.byte()?;
        }

        let id = token & TAG_ID_MASK;
        let name = if tokens::is_literal_tag(token) {
            self.table_str()?
        } else {
            tokens::tag_name(self.tag_page, id)
                .ok_or(DecodeError::UnknownTag {
                    page: self.tag_page,
                    token: id,
                })?
                .to_string()
        };

        let attributes = if token & TAG_HAS_ATTRIBUTES != 0 {
            self.attributes()?
        } else {
            Vec::new()
        };

        if token & TAG_HAS_CONTENT != 0 {
            handler.start_tag(&name, &attributes, false)?;
            open.push(name).map_err(|_| DecodeError::NestingTooDeep)?;
        } else {
            handler.start_tag(&name, &attributes, true)?;
            handler.end_tag(&name, true)?;
        }
        Ok(())
    }

    fn attributes(&mut self) -> Result<Vec<Attribute>, DecodeError> {
        let mut attributes = Vec::new();
        let mut current: Option<Attribute> = None;

        loop {
            let token = self.byte()?;
            match token {
                END => break,
                SWITCH_PAGE => self.attr_page = self.byte()?,
                LITERAL => {
                    let name = self.table_str()?;
                    attributes.extend(current.replace(Attribute::new(name, "")));
                }
                STR_I => {
                    let s = self.inline_str()?;
                    append(&mut current, &s)?;
                }
                STR_T => {
                    let s = self.table_str()?;
                    append(&mut current, &s)?;
                }
                ENTITY => {
                    let code = self.mb_u_int32()?;
                    let c = char::from_u32(code).ok_or(DecodeError::InvalidString)?;
                    append(&mut current, c.encode_utf8(&mut [0; 4]))?;
                }
                EXT_I_0 | EXT_I_1 | EXT_I_2 => {
                    self.inline_str()?;
                }
                EXT_T_0 | EXT_T_1 | EXT_T_2 => {
                    self.mb_u_int32()?;
                }
                EXT_0 | EXT_1 | EXT_2 => {}
                OPAQUE => {
                    let len = self.mb_u_int32()? as usize;
                    self.skip(len)?;
                }
                t if t < 0x80 => {
                    let (name, prefix) =
                        tokens::attr_start(self.attr_page, t).ok_or(DecodeError::UnknownAttribute {
                            page: self.attr_page,
                            token: t,
                        })?;
                    attributes.extend(current.replace(Attribute::new(name, prefix)));
                }
                t => {
                    let value =
                        tokens::attr_value(self.attr_page, t).ok_or(DecodeError::UnknownAttribute {
                            page: self.attr_page,
                            token: t,
                        })?;
                    append(&mut current, value)?;
                }
            }
        }

        attributes.extend(current);
        Ok(attributes)
    }

    // ── Processing instructions ───────────────────────────────

    fn skip_pis(&mut self) -> Result<(), DecodeError> {
        while self.data.get(self.pos) == Some(&PI) {
            self.pos += 1;
            self.skip_pi_body()?;
        }
        Ok(())
    }

    /// A PI is an attribute start followed by values, closed by END.
    fn skip_pi_body(&mut self) -> Result<(), DecodeError> {
        self.attributes().map(|_| ())
    }
}

fn append(current: &mut Option<Attribute>, s: &str) -> Result<(), DecodeError> {
    match current {
        Some(attribute) => {
            attribute.value.push_str(s);
            Ok(())
        }
        None => Err(DecodeError::OrphanAttributeValue),
    }
}
