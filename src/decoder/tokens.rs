//! OMA PROV 1.0 WBXML code pages.
//!
//! Public identifier `-//WAPFORUM//DTD PROV 1.0//EN` (0x0B).  Code page 0
//! carries the NAP/proxy vocabulary, code page 1 the APPLICATION one.

/// Well-known public identifier of the PROV 1.0 language.
pub const PROV10_PUBLIC_ID: u32 = 0x0B;

// ── Global tokens (WBXML 1.3 §7.1) ────────────────────────────

pub const SWITCH_PAGE: u8 = 0x00;
pub const END: u8 = 0x01;
pub const ENTITY: u8 = 0x02;
pub const STR_I: u8 = 0x03;
pub const LITERAL: u8 = 0x04;
pub const EXT_I_0: u8 = 0x40;
pub const EXT_I_1: u8 = 0x41;
pub const EXT_I_2: u8 = 0x42;
pub const PI: u8 = 0x43;
pub const LITERAL_C: u8 = 0x44;
pub const EXT_T_0: u8 = 0x80;
pub const EXT_T_1: u8 = 0x81;
pub const EXT_T_2: u8 = 0x82;
pub const STR_T: u8 = 0x83;
pub const LITERAL_A: u8 = 0x84;
pub const EXT_0: u8 = 0xC0;
pub const EXT_1: u8 = 0xC1;
pub const EXT_2: u8 = 0xC2;
pub const OPAQUE: u8 = 0xC3;
pub const LITERAL_AC: u8 = 0xC4;

/// Tag token bit: element carries attributes.
pub const TAG_HAS_ATTRIBUTES: u8 = 0x80;
/// Tag token bit: element carries content.
pub const TAG_HAS_CONTENT: u8 = 0x40;
/// Mask selecting the tag identity from a tag token.
pub const TAG_ID_MASK: u8 = 0x3F;

/// Tag token whose name is a string table reference, in any of its
/// attribute/content forms.
pub fn is_literal_tag(token: u8) -> bool {
    matches!(token, LITERAL | LITERAL_C | LITERAL_A | LITERAL_AC)
}

// ── Tag code space ────────────────────────────────────────────

/// `(page, token, name)`
pub const TAGS: &[(u8, u8, &str)] = &[
    (0, 0x05, "wap-provisioningdoc"),
    (0, 0x06, "characteristic"),
    (0, 0x07, "parm"),
    (1, 0x06, "characteristic"),
    (1, 0x07, "parm"),
];

// ── Attribute start code space ────────────────────────────────

/// `(page, token, attribute name, value prefix)`
pub const ATTR_STARTS: &[(u8, u8, &str, Option<&str>)] = &[
    (0, 0x05, "name", None),
    (0, 0x06, "value", None),
    (0, 0x07, "name", Some("NAME")),
    (0, 0x08, "name", Some("NAP-ADDRESS")),
    (0, 0x09, "name", Some("NAP-ADDRTYPE")),
    (0, 0x0A, "name", Some("CALLTYPE")),
    (0, 0x0B, "name", Some("VALIDUNTIL")),
    (0, 0x0C, "name", Some("AUTHTYPE")),
    (0, 0x0D, "name", Some("AUTHNAME")),
    (0, 0x0E, "name", Some("AUTHSECRET")),
    (0, 0x0F, "name", Some("LINGER")),
    (0, 0x10, "name", Some("BEARER")),
    (0, 0x11, "name", Some("NAPID")),
    (0, 0x12, "name", Some("COUNTRY")),
    (0, 0x13, "name", Some("NETWORK")),
    (0, 0x14, "name", Some("INTERNET")),
    (0, 0x15, "name", Some("PROXY-ID")),
    (0, 0x16, "name", Some("PROXY-PROVIDER-ID")),
    (0, 0x17, "name", Some("DOMAIN")),
    (0, 0x18, "name", Some("PROVURL")),
    (0, 0x19, "name", Some("PXAUTH-TYPE")),
    (0, 0x1A, "name", Some("PXAUTH-ID")),
    (0, 0x1B, "name", Some("PXAUTH-PW")),
    (0, 0x1C, "name", Some("STARTPAGE")),
    (0, 0x1D, "name", Some("BASAUTH-ID")),
    (0, 0x1E, "name", Some("BASAUTH-PW")),
    (0, 0x1F, "name", Some("PUSHENABLED")),
    (0, 0x20, "name", Some("PXADDR")),
    (0, 0x21, "name", Some("PXADDRTYPE")),
    (0, 0x22, "name", Some("TO-NAPID")),
    (0, 0x23, "name", Some("PORTNBR")),
    (0, 0x24, "name", Some("SERVICE")),
    (0, 0x25, "name", Some("LINKSPEED")),
    (0, 0x26, "name", Some("DNLINKSPEED")),
    (0, 0x27, "name", Some("LOCAL-ADDR")),
    (0, 0x28, "name", Some("LOCAL-ADDRTYPE")),
    (0, 0x29, "name", Some("CONTEXT-ALLOW")),
    (0, 0x2A, "name", Some("TRUST")),
    (0, 0x2B, "name", Some("MASTER")),
    (0, 0x2C, "name", Some("SID")),
    (0, 0x2D, "name", Some("SOC")),
    (0, 0x2E, "name", Some("WSP-VERSION")),
    (0, 0x2F, "name", Some("PHYSICAL-PROXY-ID")),
    (0, 0x30, "name", Some("CLIENT-ID")),
    (0, 0x31, "name", Some("DELIVERY-ERR-SDU")),
    (0, 0x32, "name", Some("DELIVERY-ORDER")),
    (0, 0x33, "name", Some("TRAFFIC-CLASS")),
    (0, 0x34, "name", Some("MAX-SDU-SIZE")),
    (0, 0x35, "name", Some("MAX-BITRATE-UPLINK")),
    (0, 0x36, "name", Some("MAX-BITRATE-DNLINK")),
    (0, 0x37, "name", Some("RESIDUAL-BER")),
    (0, 0x38, "name", Some("SDU-ERROR-RATIO")),
    (0, 0x39, "name", Some("TRAFFIC-HANDL-PRIO")),
    (0, 0x3A, "name", Some("TRANSFER-DELAY")),
    (0, 0x3B, "name", Some("GUARANTEED-BITRATE-UPLINK")),
    (0, 0x3C, "name", Some("GUARANTEED-BITRATE-DNLINK")),
    (0, 0x3D, "name", Some("PXADDR-FQDN")),
    (0, 0x3E, "name", Some("PROXY-PW")),
    (0, 0x3F, "name", Some("PPGAUTH-TYPE")),
    (0, 0x45, "version", None),
    (0, 0x46, "version", Some("1.0")),
    (0, 0x47, "name", Some("PULLENABLED")),
    (0, 0x48, "name", Some("DNS-ADDR")),
    (0, 0x49, "name", Some("MAX-NUM-RETRY")),
    (0, 0x4A, "name", Some("FIRST-RETRY-TIMEOUT")),
    (0, 0x4B, "name", Some("REREG-THRESHOLD")),
    (0, 0x4C, "name", Some("T-BIT")),
    (0, 0x4E, "name", Some("AUTH-ENTITY")),
    (0, 0x4F, "name", Some("SPI")),
    (0, 0x50, "type", None),
    (0, 0x51, "type", Some("PXLOGICAL")),
    (0, 0x52, "type", Some("PXPHYSICAL")),
    (0, 0x53, "type", Some("PORT")),
    (0, 0x54, "type", Some("VALIDITY")),
    (0, 0x55, "type", Some("NAPDEF")),
    (0, 0x56, "type", Some("BOOTSTRAP")),
    (0, 0x57, "type", Some("VENDORCONFIG")),
    (0, 0x58, "type", Some("CLIENTIDENTITY")),
    (0, 0x59, "type", Some("PXAUTHINFO")),
    (0, 0x5A, "type", Some("NAPAUTHINFO")),
    (0, 0x5B, "type", Some("ACCESS")),
    (1, 0x05, "name", None),
    (1, 0x06, "value", None),
    (1, 0x07, "name", Some("NAME")),
    (1, 0x14, "name", Some("INTERNET")),
    (1, 0x1C, "name", Some("STARTPAGE")),
    (1, 0x22, "name", Some("TO-NAPID")),
    (1, 0x23, "name", Some("PORTNBR")),
    (1, 0x24, "name", Some("SERVICE")),
    (1, 0x2E, "name", Some("AACCEPT")),
    (1, 0x2F, "name", Some("AAUTHDATA")),
    (1, 0x30, "name", Some("AAUTHLEVEL")),
    (1, 0x31, "name", Some("AAUTHNAME")),
    (1, 0x32, "name", Some("AAUTHSECRET")),
    (1, 0x33, "name", Some("AAUTHTYPE")),
    (1, 0x34, "name", Some("ADDR")),
    (1, 0x35, "name", Some("ADDRTYPE")),
    (1, 0x36, "name", Some("APPID")),
    (1, 0x37, "name", Some("APROTOCOL")),
    (1, 0x38, "name", Some("PROVIDER-ID")),
    (1, 0x39, "name", Some("TO-PROXY")),
    (1, 0x3A, "name", Some("URI")),
    (1, 0x3B, "name", Some("RULE")),
    (1, 0x50, "type", None),
    (1, 0x53, "type", Some("PORT")),
    (1, 0x55, "type", Some("APPLICATION")),
    (1, 0x56, "type", Some("APPADDR")),
    (1, 0x57, "type", Some("APPAUTH")),
    (1, 0x58, "type", Some("CLIENTIDENTITY")),
    (1, 0x59, "type", Some("RESOURCE")),
];

// ── Attribute value code space ────────────────────────────────

/// `(page, token, value)`
pub const ATTR_VALUES: &[(u8, u8, &str)] = &[
    (0, 0x85, "IPV4"),
    (0, 0x86, "IPV6"),
    (0, 0x87, "E164"),
    (0, 0x88, "ALPHA"),
    (0, 0x89, "APN"),
    (0, 0x8A, "SCODE"),
    (0, 0x8B, "TETRA-ITSI"),
    (0, 0x8C, "MAN"),
    (0, 0x90, "ANALOG-MODEM"),
    (0, 0x91, "V.120"),
    (0, 0x92, "V.110"),
    (0, 0x93, "X.31"),
    (0, 0x94, "BIT-TRANSPARENT"),
    (0, 0x95, "DIRECT-ASYNCHRONOUS-DATA-SERVICE"),
    (0, 0x9A, "PAP"),
    (0, 0x9B, "CHAP"),
    (0, 0x9C, "HTTP-BASIC"),
    (0, 0x9D, "HTTP-DIGEST"),
    (0, 0x9E, "WTLS-SS"),
    (0, 0x9F, "MD5"),
    (0, 0xA2, "GSM-USSD"),
    (0, 0xA3, "GSM-SMS"),
    (0, 0xA4, "ANSI-136-GUTS"),
    (0, 0xA5, "IS-95-CDMA-SMS"),
    (0, 0xA6, "IS-95-CDMA-CSD"),
    (0, 0xA7, "IS-95-CDMA-PACKET"),
    (0, 0xA8, "ANSI-136-CSD"),
    (0, 0xA9, "ANSI-136-GPRS"),
    (0, 0xAA, "GSM-CSD"),
    (0, 0xAB, "GSM-GPRS"),
    (0, 0xAC, "AMPS-CDPD"),
    (0, 0xAD, "PDC-CSD"),
    (0, 0xAE, "PDC-PACKET"),
    (0, 0xAF, "IDEN-SMS"),
    (0, 0xB0, "IDEN-CSD"),
    (0, 0xB1, "IDEN-PACKET"),
    (0, 0xB2, "FLEX/REFLEX"),
    (0, 0xB3, "PHS-SMS"),
    (0, 0xB4, "PHS-CSD"),
    (0, 0xB5, "TETRA-SDS"),
    (0, 0xB6, "TETRA-PACKET"),
    (0, 0xB7, "ANSI-136-GHOST"),
    (0, 0xB8, "MOBITEX-MPAK"),
    (0, 0xB9, "CDMA2000-1X-SIMPLE-IP"),
    (0, 0xBA, "CDMA2000-1X-MOBILE-IP"),
    (0, 0xC5, "AUTOBAUDING"),
    (0, 0xCA, "CL-WSP"),
    (0, 0xCB, "CO-WSP"),
    (0, 0xCC, "CL-SEC-WSP"),
    (0, 0xCD, "CO-SEC-WSP"),
    (0, 0xCE, "CL-SEC-WTA"),
    (0, 0xCF, "CO-SEC-WTA"),
    (0, 0xD0, "OTA-HTTP-TO"),
    (0, 0xD1, "OTA-HTTP-TLS-TO"),
    (0, 0xD2, "OTA-HTTP-PO"),
    (0, 0xD3, "OTA-HTTP-TLS-PO"),
    (0, 0xE0, "AAA"),
    (0, 0xE1, "HA"),
    // 0x80-0x83 on this page shadow EXT_T_0..2 and STR_T; the global
    // meaning wins, so only the 0x90 aliases are decodable.
    (1, 0x86, "IPV6"),
    (1, 0x87, "E164"),
    (1, 0x88, "ALPHA"),
    (1, 0x8D, "APPSRV"),
    (1, 0x8E, "OBEX"),
    (1, 0x90, ","),
    (1, 0x91, "HTTP-"),
    (1, 0x92, "BASIC"),
    (1, 0x93, "DIGEST"),
];

// ── Lookups ───────────────────────────────────────────────────

pub fn tag_name(page: u8, id: u8) -> Option<&'static str> {
    TAGS.iter()
        .find(|(p, t, _)| *p == page && *t == id)
        .map(|(_, _, name)| *name)
}

/// Attribute name and value prefix for an attribute start token.
pub fn attr_start(page: u8, token: u8) -> Option<(&'static str, &'static str)> {
    ATTR_STARTS
        .iter()
        .find(|(p, t, _, _)| *p == page && *t == token)
        .map(|(_, _, name, prefix)| (*name, prefix.unwrap_or("")))
}

pub fn attr_value(page: u8, token: u8) -> Option<&'static str> {
    ATTR_VALUES
        .iter()
        .find(|(p, t, _)| *p == page && *t == token)
        .map(|(_, _, value)| *value)
}
