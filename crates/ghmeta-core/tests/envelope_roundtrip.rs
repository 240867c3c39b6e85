use ghmeta_core::{EnvelopeError, WebhookEnvelope};

#[test]
fn arbitrary_bytes_survive_encode_decode() {
    let payloads: [&[u8]; 4] = [b"{\"action\":\"opened\"}", &[0xff, 0xfe, 0x00, 0x80], b"", b"\n\t \"quoted\" \\"];
    for payload in payloads {
        let envelope = WebhookEnvelope::new("pull_request", payload.to_vec());
        let decoded = WebhookEnvelope::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }
}

#[test]
fn wire_form_keeps_header_and_body() {
    let envelope = WebhookEnvelope::from_wire("issues", b"{}");
    assert_eq!(envelope.to_wire(), ("issues", &b"{}"[..]));
}

#[test]
fn invalid_base64_is_reported() {
    let err = WebhookEnvelope::decode(br#"{"type":"issues","payload":"***"}"#).unwrap_err();
    assert!(matches!(err, EnvelopeError::Json(_)), "{err:?}");
}

#[test]
fn missing_type_is_rejected() {
    assert!(WebhookEnvelope::decode(br#"{"payload":""}"#).is_err());
}
