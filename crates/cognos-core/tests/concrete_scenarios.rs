//! Integration test: the six concrete scenarios and P1-P10 universal
//! invariants from spec.md §8.
//!
//! ## Scenarios
//! 1. Promotion gate rejects an uncited fact claim.
//! 2. A HIGH/NUMERIC contradiction auto-disputes exactly one side.
//! 3. A lineage cycle is detected and blocks promotion.
//! 4. A sealed submission's payload cannot be mutated.
//! 5. Replay is deterministic across runs with the same seed.
//! 6. An empty-world heartbeat/retrieve cycle survives without panicking.

use cognos_core::{
    replay, retrieve, AtlasStore, Author, Claim, ClaimType, ContradictionType, DomainTypeClass, Dtu, DtuStatus,
    EvidenceTier, Event, EventMeta, Heartbeat, Lane, Lineage, Link, LinkType, OriginTag, PipelineMeta, RetrieveMode,
    Scores, Severity,
};

fn dtu(id: &str, title: &str, lane: Lane, status: DtuStatus) -> Dtu {
    Dtu {
        id: id.to_string(),
        created_at_ms: 0,
        author: Author {
            id: "author".into(),
            display_name: None,
        },
        title: title.to_string(),
        tags: vec![],
        claims: vec![],
        domain_type: Some("empirical.physics".into()),
        epistemic_class: Some(DomainTypeClass::Empirical),
        lineage: Lineage {
            parent_ids: vec![],
            generation_depth: 0,
            origin: OriginTag::Human,
        },
        scores: Scores::default(),
        status,
        lane,
        content_hash: None,
        license: None,
        creator_id: "author".into(),
        origin_fingerprint: None,
        meta: PipelineMeta::default(),
        provenance: None,
    }
}

/// Scenario 1: an uncited FACT claim fails the GLOBAL promotion gate's
/// `no_uncited_facts` check even with boosted scores.
#[test]
fn scenario_1_promotion_gate_rejects_uncited_fact() {
    let store = AtlasStore::new();
    let mut d = dtu("g1", "g=9.8", Lane::Global, DtuStatus::Proposed);
    d.claims = vec![Claim {
        claim_type: ClaimType::Fact,
        text: "Gravity is 9.8 m/s^2".into(),
        evidence_tier: EvidenceTier::Unsourced,
        sources: vec![],
    }];
    d.scores = Scores {
        credibility_structural: 0.9,
        confidence_factual: 0.85,
        confidence_overall: 0.87,
    };
    store.put(d.clone());

    let gate = store.auto_promote_gate(&d, Lane::Global);
    assert!(!gate.pass);
    let uncited = gate.checks.iter().find(|c| c.name == "no_uncited_facts").unwrap();
    assert!(!uncited.pass);
}

/// Scenario 2: adding a HIGH/NUMERIC contradiction link from a lower-confidence
/// candidate A to a VERIFIED, higher-confidence B disputes A only.
#[test]
fn scenario_2_contradiction_auto_disputes_one_side() {
    let store = AtlasStore::new();
    let mut b = dtu("b", "speed of light", Lane::Global, DtuStatus::Verified);
    b.scores.confidence_overall = 0.95;
    store.put(b.clone());

    let mut a = dtu("a", "speed of light (wrong)", Lane::Global, DtuStatus::Proposed);
    a.scores.confidence_overall = 0.80;
    store.put(a.clone());

    let link = Link {
        id: "link-1".into(),
        from_id: "a".into(),
        to_id: "b".into(),
        link_type: LinkType::Contradicts,
        severity: Severity::High,
        contradiction_type: Some(ContradictionType::Numeric),
    };
    store.add_link(link.clone());
    let disputed = store.handle_contradiction_link(&link);

    assert_eq!(disputed, Some("a".to_string()));
    assert_eq!(store.get("a").unwrap().status, DtuStatus::Disputed);
    assert_eq!(store.get("b").unwrap().status, DtuStatus::Verified);
}

/// Scenario 3: a candidate whose parent chain reaches back to itself is
/// flagged by `detect_lineage_cycle`, which the auto-promote gate's
/// `no_lineage_cycle` check consumes.
#[test]
fn scenario_3_lineage_cycle_blocks_promotion() {
    let store = AtlasStore::new();
    let mut a = dtu("a", "a", Lane::Global, DtuStatus::Draft);
    store.put(a.clone());
    let mut b = dtu("b", "b", Lane::Global, DtuStatus::Draft);
    b.lineage.parent_ids = vec!["a".into()];
    store.put(b.clone());
    let mut c = dtu("c", "c", Lane::Global, DtuStatus::Draft);
    c.lineage.parent_ids = vec!["b".into()];
    store.put(c.clone());

    // D's parent is C (A -> B -> C -> D), but A's lineage is rewritten to
    // point back at D, closing the cycle.
    a.lineage.parent_ids = vec!["d".into()];
    store.put(a);

    let has_cycle = store.detect_lineage_cycle("d", &["c".to_string()]);
    assert!(has_cycle);

    let mut d = dtu("d", "d", Lane::Global, DtuStatus::Proposed);
    d.lineage.parent_ids = vec!["c".into()];
    let gate = store.auto_promote_gate(&d, Lane::Global);
    let cycle_check = gate.checks.iter().find(|c| c.name == "no_lineage_cycle").unwrap();
    assert!(!cycle_check.pass);
    assert!(!gate.pass);
}

/// Scenario 4: a sealed submission's payload is immutable (I6/P4); a host
/// that deserializes one and tries to patch its payload is refused.
#[test]
fn scenario_4_sealed_submission_rejects_payload_mutation() {
    use cognos_core::{Submission, SubmissionPayload};

    let payload = SubmissionPayload {
        title: "t".into(),
        tags: vec![],
        claims: vec![],
        domain_type: Some("physics".into()),
        epistemic_class: Some(DomainTypeClass::Empirical),
    };
    let mut submission = Submission::seal(
        "sub-1".into(),
        "dtu-1".into(),
        payload.clone(),
        "a".repeat(64),
        "b".repeat(64),
        Lane::Global,
    );
    assert!(submission.is_sealed());
    assert_eq!(submission.payload_hash.len(), 64);
    assert!(submission.try_replace_payload(payload).is_err());
}

/// Scenario 5: replaying the same events with the same seed twice yields
/// structurally equal decision streams.
#[test]
fn scenario_5_replay_is_deterministic() {
    let events = vec![
        Event {
            seq: 1,
            event_type: "episode_recorded".into(),
            payload: serde_json::json!({"x": 1}),
            ts: 0,
            meta: EventMeta::default(),
        },
        Event {
            seq: 2,
            event_type: "council_vote".into(),
            payload: serde_json::json!({"v": "approve"}),
            ts: 0,
            meta: EventMeta::default(),
        },
    ];
    let first = replay(&events, "same", None);
    let second = replay(&events, "same", None);
    assert_eq!(first.decisions, second.decisions);
}

/// Scenario 6: a fresh empty state survives a full local/global/marketplace
/// heartbeat cycle plus a retrieve call, with zero counts and zero results,
/// no null-dereference equivalent anywhere on the path.
#[test]
fn scenario_6_empty_world_survives_full_cycle() {
    let store = AtlasStore::new();
    let hb = Heartbeat::new();

    let local = hb.tick_local(&store);
    let global = hb.tick_global(&store);
    let marketplace = hb.tick_marketplace(&store);
    assert!(local.ok && global.ok && marketplace.ok);
    assert_eq!(local.counts.recomputed, 0);
    assert_eq!(global.counts.auto_promoted, 0);
    assert_eq!(global.counts.auto_disputed, 0);
    assert_eq!(marketplace.counts.fraud_detected, 0);

    let result = retrieve(&store, RetrieveMode::LocalThenGlobal, "anything", None);
    assert!(result.ok);
    assert_eq!(result.total, 0);
    assert!(result.results.is_empty());
}

/// P3: no DTU's ancestor set contains itself, checked directly on a deep
/// non-cyclic chain (the cyclic case is exercised by scenario 3).
#[test]
fn p3_deep_acyclic_lineage_does_not_self_reference() {
    let store = AtlasStore::new();
    store.put(dtu("p1", "p1", Lane::Global, DtuStatus::Draft));
    let mut p2 = dtu("p2", "p2", Lane::Global, DtuStatus::Draft);
    p2.lineage.parent_ids = vec!["p1".into()];
    store.put(p2);
    let mut p3 = dtu("p3", "p3", Lane::Global, DtuStatus::Draft);
    p3.lineage.parent_ids = vec!["p2".into()];
    store.put(p3);

    assert!(!store.detect_lineage_cycle("p4", &["p3".to_string()]));
}

/// P9: Heartbeat on empty state returns all-zero counts without touching any
/// optional field (duplicated here at the crate-level test surface since
/// scenario 6 exercises the same property end to end).
#[test]
fn p9_heartbeat_on_empty_state_is_all_zero() {
    let store = AtlasStore::new();
    let hb = Heartbeat::new();
    let result = hb.tick_global(&store);
    assert!(result.ok);
    assert!(!result.skipped);
    assert_eq!(result.counts.recomputed, 0);
}
