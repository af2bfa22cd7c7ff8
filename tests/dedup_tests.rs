use omnisummary::api::dedup::{Claim, DedupLedger, InMemoryDedupLedger};

#[test]
fn test_first_claim_accepted_second_rejected() {
    let ledger = InMemoryDedupLedger::new(3600);

    assert_eq!(ledger.claim_at("Ev123", 1_000), Claim::Accepted);
    assert_eq!(ledger.claim_at("Ev123", 1_001), Claim::Duplicate);
}

#[test]
fn test_distinct_event_ids_do_not_collide() {
    let ledger = InMemoryDedupLedger::new(3600);

    assert_eq!(ledger.claim_at("Ev123", 1_000), Claim::Accepted);
    assert_eq!(ledger.claim_at("Ev456", 1_000), Claim::Accepted);
}

#[test]
fn test_claim_accepted_again_after_ttl_expiry() {
    let ledger = InMemoryDedupLedger::new(600);

    assert_eq!(ledger.claim_at("Ev123", 1_000), Claim::Accepted);
    // Still inside the window at the expiry instant itself.
    assert_eq!(ledger.claim_at("Ev123", 1_600), Claim::Duplicate);
    // Past the window the record is logically absent.
    assert_eq!(ledger.claim_at("Ev123", 1_601), Claim::Accepted);
}

#[test]
fn test_expired_claim_renews_the_window() {
    let ledger = InMemoryDedupLedger::new(600);

    assert_eq!(ledger.claim_at("Ev123", 1_000), Claim::Accepted);
    assert_eq!(ledger.claim_at("Ev123", 2_000), Claim::Accepted);
    // The re-claim wrote a fresh expiry, so duplicates are blocked again.
    assert_eq!(ledger.claim_at("Ev123", 2_100), Claim::Duplicate);
}

#[tokio::test]
async fn test_trait_claim_uses_wall_clock() {
    let ledger = InMemoryDedupLedger::new(3600);

    assert_eq!(ledger.claim("EvClock").await.unwrap(), Claim::Accepted);
    assert_eq!(ledger.claim("EvClock").await.unwrap(), Claim::Duplicate);
}
