use omnisummary::api::signature::{compute_signature, verify_signature_at};

const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
const BODY: &str = r#"{"type":"event_callback","event":{"type":"app_mention"}}"#;

#[test]
fn test_valid_signature_passes() {
    let now: u64 = 1_700_000_000;
    let timestamp = now.to_string();
    let signature = compute_signature(&timestamp, BODY, SECRET);

    assert!(verify_signature_at(BODY, &timestamp, &signature, SECRET, now));
}

#[test]
fn test_wrong_secret_is_rejected() {
    let now: u64 = 1_700_000_000;
    let timestamp = now.to_string();
    let signature = compute_signature(&timestamp, BODY, "some-other-secret");

    assert!(!verify_signature_at(BODY, &timestamp, &signature, SECRET, now));
}

#[test]
fn test_tampered_body_is_rejected() {
    let now: u64 = 1_700_000_000;
    let timestamp = now.to_string();
    let signature = compute_signature(&timestamp, BODY, SECRET);

    let tampered = BODY.replace("app_mention", "message");
    assert!(!verify_signature_at(&tampered, &timestamp, &signature, SECRET, now));
}

#[test]
fn test_stale_timestamp_is_rejected() {
    // Replay window is 300 seconds; a signature computed 301 seconds ago is
    // cryptographically valid but must still be refused.
    let now: u64 = 1_700_000_000;
    let stale = (now - 301).to_string();
    let signature = compute_signature(&stale, BODY, SECRET);

    assert!(!verify_signature_at(BODY, &stale, &signature, SECRET, now));
}

#[test]
fn test_timestamp_at_window_edge_passes() {
    let now: u64 = 1_700_000_000;
    let edge = (now - 300).to_string();
    let signature = compute_signature(&edge, BODY, SECRET);

    assert!(verify_signature_at(BODY, &edge, &signature, SECRET, now));
}

#[test]
fn test_far_future_timestamp_is_rejected() {
    let now: u64 = 1_700_000_000;
    let future = (now + 3600).to_string();
    let signature = compute_signature(&future, BODY, SECRET);

    assert!(!verify_signature_at(BODY, &future, &signature, SECRET, now));
}

#[test]
fn test_malformed_signature_is_rejected() {
    let now: u64 = 1_700_000_000;
    let timestamp = now.to_string();

    // Missing the v0= prefix
    assert!(!verify_signature_at(BODY, &timestamp, "deadbeef", SECRET, now));
    // Not hex
    assert!(!verify_signature_at(BODY, &timestamp, "v0=zzzz", SECRET, now));
    // Non-numeric timestamp
    let signature = compute_signature("not-a-number", BODY, SECRET);
    assert!(!verify_signature_at(BODY, "not-a-number", &signature, SECRET, now));
}
