use super::*;

// =============================================================================
// ok / fail
// =============================================================================

#[test]
fn ok_envelope_has_data_and_no_message() {
    let env = Envelope::ok(vec![1, 2, 3]);
    assert!(env.is_success());
    assert_eq!(env.data(), Some(&vec![1, 2, 3]));
    assert!(env.message().is_none());
}

#[test]
fn fail_envelope_has_message_and_no_data() {
    let env: Envelope<u32> = Envelope::fail("Invalid credentials");
    assert!(!env.is_success());
    assert!(env.data().is_none());
    assert_eq!(env.message(), Some("Invalid credentials"));
}

#[test]
fn fail_with_blank_message_uses_default() {
    let env: Envelope<u32> = Envelope::fail("  ");
    assert_eq!(env.message(), Some(DEFAULT_ERROR_MESSAGE));
}

#[test]
fn timestamp_is_rfc3339() {
    let env = Envelope::ok(());
    assert!(OffsetDateTime::parse(env.timestamp(), &Rfc3339).is_ok());
}

// =============================================================================
// conversions
// =============================================================================

#[test]
fn from_result_maps_error_display() {
    let env: Envelope<u8> = Envelope::from_result(Err::<u8, _>("boom"));
    assert_eq!(env.message(), Some("boom"));
    let env: Envelope<u8> = Envelope::from_result(Ok::<_, String>(7));
    assert_eq!(env.into_data(), Some(7));
}

#[test]
fn into_result_returns_message_on_failure() {
    let env: Envelope<u8> = Envelope::fail("not found");
    assert_eq!(env.into_result(), Err("not found".to_owned()));
}

#[test]
fn map_keeps_outcome_and_timestamp() {
    let env = Envelope::ok(2);
    let ts = env.timestamp().to_owned();
    let mapped = env.map(|n| n * 10);
    assert_eq!(mapped.data(), Some(&20));
    assert_eq!(mapped.timestamp(), ts);

    let failed: Envelope<u8> = Envelope::fail("x");
    assert_eq!(failed.map(|n| n + 1).message(), Some("x"));
}

#[test]
fn serializes_null_data_on_failure() {
    let env: Envelope<u8> = Envelope::fail("offline");
    let json = serde_json::to_value(&env).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["data"].is_null());
    assert_eq!(json["message"], "offline");
}

#[test]
fn serializes_without_message_on_success() {
    let json = serde_json::to_value(Envelope::ok(true)).unwrap();
    assert_eq!(json["data"], true);
    assert!(json.get("message").is_none());
}
