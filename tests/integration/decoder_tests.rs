//! Golden documents from real operators, decoded from both encodings.
//!
//! Each fixture under `tests/data/` is decoded as XML, then re-encoded to
//! WBXML (inline strings and string table) and decoded again.  All three
//! must give the same settings.

use cellprov::decoder::{self, DecodeError, WBXML_CONTENT_TYPE, XML_CONTENT_TYPE};
use cellprov::settings::{AuthType, InternetSettings, MmsSettings, ProvisioningSettings};

use crate::wbxml_writer::encode;

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/data/{name}.xml", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{path}: {e}"))
}

/// Decode `name` through every path and check they agree.
fn decode_all(name: &str) -> ProvisioningSettings {
    let text = fixture(name);
    let from_xml = decoder::decode_xml(&text).unwrap();
    let from_wbxml = decoder::decode_wbxml(&encode(&text, false)).unwrap();
    let from_table = decoder::decode_wbxml(&encode(&text, true)).unwrap();
    assert_eq!(from_xml, from_wbxml, "{name}: inline WBXML differs from XML");
    assert_eq!(from_xml, from_table, "{name}: string-table WBXML differs from XML");
    from_xml
}

fn s(v: &str) -> Option<String> {
    Some(v.to_string())
}

// ── Sonera ────────────────────────────────────────────────────

#[test]
fn sonera_internet_and_mms() {
    let settings = decode_all("sonera");
    assert_eq!(
        settings.internet,
        Some(InternetSettings {
            name: "Sonera Internet".into(),
            apn: "internet".into(),
            username: s(""),
            password: s(""),
            auth_type: AuthType::Pap,
        })
    );
    assert_eq!(
        settings.mms,
        Some(MmsSettings {
            name: "Sonera MMS".into(),
            apn: "wap.sonera.net".into(),
            username: s(""),
            password: s(""),
            message_center: s("http://mms.sonera.fi:8002/"),
            message_proxy_host: s("195.156.25.33"),
            message_proxy_port: s("80"),
            auth_type: AuthType::Pap,
        })
    );
}

// ── DNA ───────────────────────────────────────────────────────

#[test]
fn dna_internet_via_w2_application() {
    let settings = decode_all("dna_1");
    assert_eq!(
        settings.internet,
        Some(InternetSettings {
            name: "DNA Internet".into(),
            apn: "internet".into(),
            username: None,
            password: None,
            auth_type: AuthType::Unspecified,
        })
    );
    assert_eq!(settings.mms, None);
}

#[test]
fn dna_mms_through_proxy_chain() {
    let settings = decode_all("dna_2");
    assert_eq!(settings.internet, None);
    let mms = settings.mms.unwrap();
    assert_eq!(mms.name, "DNA MMS");
    assert_eq!(mms.apn, "mms");
    assert_eq!(mms.message_center.as_deref(), Some("http://mmsc.dna.fi"));
    assert_eq!(mms.message_proxy().as_deref(), Some("10.1.1.2:8080"));
    assert_eq!(mms.auth_type, AuthType::None);
    assert_eq!(mms.username, None);
}

// ── MOI ───────────────────────────────────────────────────────

#[test]
fn moi_application_overrides_nap_name() {
    let settings = decode_all("moi_1");
    let net = settings.internet.unwrap();
    assert_eq!(net.name, "MOI Internet");
    assert_eq!(net.apn, "data.moimobile.fi");
    assert_eq!(net.auth_type, AuthType::None);
    assert_eq!(settings.mms, None);
}

#[test]
fn moi_mms_uses_appaddr_and_physical_port() {
    let settings = decode_all("moi_2");
    assert_eq!(settings.internet, None);
    assert_eq!(
        settings.mms,
        Some(MmsSettings {
            name: "MOI MMS".into(),
            apn: "mms".into(),
            username: None,
            password: None,
            message_center: s("http://mmsc.dna.fi"),
            message_proxy_host: s("10.1.1.2"),
            message_proxy_port: s("8080"),
            auth_type: AuthType::None,
        })
    );
}

#[test]
fn port_outside_physical_proxy_is_ignored() {
    let text = fixture("moi_2").replace(
        r#"      <characteristic type="PORT">
        <parm name="PORTNBR" value="8080"/>
      </characteristic>
    </characteristic>"#,
        r#"    </characteristic>
    <characteristic type="PORT">
      <parm name="PORTNBR" value="8080"/>
    </characteristic>"#,
    );
    assert_ne!(text, fixture("moi_2"));

    let mms = decoder::decode_xml(&text).unwrap().mms.unwrap();
    assert_eq!(mms.message_proxy_host.as_deref(), Some("10.1.1.2"));
    assert_eq!(mms.message_proxy_port, None);
    assert_eq!(mms.message_proxy().as_deref(), Some("10.1.1.2"));

    let from_wbxml = decoder::decode_wbxml(&encode(&text, false)).unwrap().mms.unwrap();
    assert_eq!(from_wbxml, mms);
}

// ── Beeline ───────────────────────────────────────────────────

#[test]
fn beeline_mms_with_credentials() {
    let settings = decode_all("beeline_2");
    // The w2 application names a proxy but no access point.
    assert_eq!(settings.internet, None);
    let mms = settings.mms.unwrap();
    assert_eq!(mms.name, "Beeline MMS");
    assert_eq!(mms.apn, "mms.beeline.ru");
    assert_eq!(mms.username.as_deref(), Some("beeline"));
    assert_eq!(mms.password.as_deref(), Some("beeline"));
    assert_eq!(mms.message_center.as_deref(), Some("http://mms/"));
    assert_eq!(mms.message_proxy().as_deref(), Some("192.168.094.023:8080"));
    assert_eq!(mms.auth_type, AuthType::Pap);
}

// ── Fail-closed behaviour ─────────────────────────────────────

#[test]
fn every_truncated_fixture_fails() {
    let doc = encode(&fixture("sonera"), false);
    for len in 0..doc.len() {
        assert!(
            decoder::decode_wbxml(&doc[..len]).is_err(),
            "prefix of {len} bytes decoded"
        );
    }
}

#[test]
fn trailing_garbage_fails() {
    let mut doc = encode(&fixture("dna_2"), true);
    doc.push(0x45);
    assert!(decoder::decode_wbxml(&doc).is_err());
}

#[test]
fn foreign_root_rejected_in_both_encodings() {
    let text = "<wap-provisioningdoc><characteristic type=\"NAPDEF\"/></wap-provisioningdoc>";
    assert!(decoder::decode_xml(text).is_ok());

    assert!(matches!(
        decoder::decode_xml("<provisioning/>"),
        Err(DecodeError::UnexpectedRoot(_))
    ));
}

#[test]
fn payload_dispatch_by_content_type() {
    let text = fixture("moi_1");
    let wbxml = encode(&text, false);
    assert_eq!(
        decoder::decode_payload(XML_CONTENT_TYPE, text.as_bytes()).unwrap(),
        decoder::decode_payload(WBXML_CONTENT_TYPE, &wbxml).unwrap()
    );
    // WBXML bytes are not XML.
    assert!(decoder::decode_payload(XML_CONTENT_TYPE, &wbxml).is_err());
}

#[test]
fn document_without_access_points_is_empty() {
    let text = r#"<wap-provisioningdoc version="1.0">
        <characteristic type="BOOTSTRAP"><parm name="NAME" value="Operator"/></characteristic>
    </wap-provisioningdoc>"#;
    assert!(decoder::decode_xml(text).unwrap().is_empty());
    assert!(decoder::decode_wbxml(&encode(text, false)).unwrap().is_empty());
}
