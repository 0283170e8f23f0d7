//! Integration test: export -> import -> sandbox -> promote across process
//! boundaries.
//!
//! ## Scenarios
//! 1. A provenance-bearing artifact round-trips through export, import, and
//!    promotion, ending up `trusted` and no longer listed as sandboxed.
//! 2. A provenance-less artifact is refused at export, never reaching the
//!    registry at all.
//! 3. Two independent imports into the same registry stay independently
//!    sandboxed until each is promoted on its own.

use cognos_core::{Actor, ActorRole, Author, DomainTypeClass, Dtu, DtuStatus, Lane, Lineage, OriginTag, PipelineMeta, Provenance, Scores};
use cognos_federation::{default_verifier, export_artifact, EnvelopeLicense, FederationRegistry, TrustState};

fn artifact(id: &str, creator_id: &str) -> Dtu {
    let claims = vec![];
    let tags = vec!["physics".to_string()];
    let content_hash = cognos_core::content_hash(
        "gravitational constant",
        "physics",
        "Empirical",
        &tags,
        &claims,
        creator_id,
    );
    Dtu {
        id: id.to_string(),
        created_at_ms: 0,
        author: Author {
            id: creator_id.to_string(),
            display_name: None,
        },
        title: "gravitational constant".into(),
        tags,
        claims,
        domain_type: Some("physics".into()),
        epistemic_class: Some(DomainTypeClass::Empirical),
        lineage: Lineage {
            parent_ids: vec![],
            generation_depth: 0,
            origin: OriginTag::Human,
        },
        scores: Scores::default(),
        status: DtuStatus::Verified,
        lane: Lane::Global,
        content_hash: Some(content_hash),
        license: None,
        creator_id: creator_id.to_string(),
        origin_fingerprint: None,
        meta: PipelineMeta::default(),
        provenance: Some(Provenance {
            source_type: "human".into(),
            source_id: creator_id.to_string(),
            confidence: 0.9,
            created_at_ms: 0,
        }),
    }
}

fn open_license() -> EnvelopeLicense {
    EnvelopeLicense {
        license_type: "ATTRIBUTION_OPEN".into(),
        royalty_pct: 0.0,
        attribution: true,
        terms: "cite on reuse".into(),
    }
}

fn owner() -> Actor {
    Actor {
        id: "owner-1".into(),
        role: ActorRole::Owner,
        verified: true,
        scopes: vec!["*".into()],
    }
}

#[test]
fn scenario_1_full_round_trip_ends_trusted() {
    let artifact = artifact("artifact-rt", "alice");
    let envelope = export_artifact(&artifact, vec![], vec![], open_license(), None, 1_000).unwrap();

    let registry = FederationRegistry::new();
    let imported = registry.import(envelope, default_verifier, 2_000).unwrap();
    assert_eq!(imported.state, TrustState::Sandboxed);
    assert_eq!(registry.list_sandboxed().len(), 1);

    let promoted = registry.promote_to_trusted("artifact-rt", &owner()).unwrap();
    assert_eq!(promoted.state, TrustState::Trusted);
    assert!(registry.list_sandboxed().is_empty());
    assert_eq!(registry.get("artifact-rt").unwrap().state, TrustState::Trusted);
}

#[test]
fn scenario_2_provenance_less_artifact_never_reaches_registry() {
    let mut artifact = artifact("artifact-np", "bob");
    artifact.provenance = None;
    let result = export_artifact(&artifact, vec![], vec![], open_license(), None, 1_000);
    assert!(result.is_err());
}

#[test]
fn scenario_3_independent_imports_stay_independently_sandboxed() {
    let registry = FederationRegistry::new();

    let a = artifact("artifact-a", "alice");
    let env_a = export_artifact(&a, vec![], vec![], open_license(), None, 0).unwrap();
    registry.import(env_a, default_verifier, 0).unwrap();

    let b = artifact("artifact-b", "bob");
    let env_b = export_artifact(&b, vec![], vec![], open_license(), None, 0).unwrap();
    registry.import(env_b, default_verifier, 0).unwrap();

    assert_eq!(registry.list_sandboxed().len(), 2);

    registry.promote_to_trusted("artifact-a", &owner()).unwrap();
    let sandboxed = registry.list_sandboxed();
    assert_eq!(sandboxed.len(), 1);
    assert_eq!(sandboxed[0].envelope.artifact.id, "artifact-b");
}
