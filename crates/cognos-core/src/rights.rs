//! Content hashing, licensing, derivative rights, proof of origin (C9).
//!
//! `sha2` gives a public deterministic hash here rather than an at-rest
//! encryption key.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::atlas::model::{Claim, Lane};

/// 64-lowercase-hex SHA-256, chosen uniformly for both Atlas and Rights hashes
///.
pub fn content_hash(title: &str, domain_type: &str, epistemic_class: &str, tags: &[String], claims: &[Claim], creator_id: &str) -> String {
    let mut sorted_tags = tags.to_vec();
    sorted_tags.sort();

    let mut canonical = String::new();
    canonical.push_str(title);
    canonical.push('\u{1}');
    canonical.push_str(domain_type);
    canonical.push('\u{1}');
    canonical.push_str(epistemic_class);
    canonical.push('\u{1}');
    canonical.push_str(&sorted_tags.join(","));
    canonical.push('\u{1}');
    for claim in claims {
        canonical.push_str(&format!("{:?}|{}|{:?}|{:?}", claim.claim_type, claim.text, claim.evidence_tier, claim.sources));
        canonical.push('\u{2}');
    }
    canonical.push('\u{1}');
    canonical.push_str(creator_id);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode_lower(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LicenseType {
    Personal,
    AttributionOpen,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub license_type: LicenseType,
    pub attribution_required: bool,
    pub derivative_allowed: bool,
    pub commercial_allowed: bool,
    pub redistribution_allowed: bool,
    pub royalty: bool,
}

impl License {
    pub fn personal() -> Self {
        Self {
            license_type: LicenseType::Personal,
            attribution_required: false,
            derivative_allowed: false,
            commercial_allowed: false,
            redistribution_allowed: false,
            royalty: false,
        }
    }

    pub fn attribution_open() -> Self {
        Self {
            license_type: LicenseType::AttributionOpen,
            attribution_required: true,
            derivative_allowed: true,
            commercial_allowed: true,
            redistribution_allowed: true,
            royalty: false,
        }
    }
}

/// Default license by lane: Local -> Personal,
/// Global -> AttributionOpen, Marketplace -> none (must be set explicitly).
/// Fallback for an unrecognized lane is Personal.
pub fn default_license_for(lane: Lane) -> Option<License> {
    match lane {
        Lane::Local => Some(License::personal()),
        Lane::Global => Some(License::attribution_open()),
        Lane::Marketplace => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    View,
    Cite,
    Derive,
    ListOnMarket,
}

#[derive(Debug, Clone)]
pub struct RightsArtifact {
    pub creator_id: String,
    pub lane: Lane,
    pub license: Option<License>,
    pub transfer_grants: Vec<String>,
}

/// `canUse(actor, artifact, action)`.
pub fn can_use(actor_id: &str, artifact: &RightsArtifact, action: Action) -> bool {
    if actor_id == artifact.creator_id {
        return true;
    }
    match action {
        Action::View => match artifact.lane {
            Lane::Local => artifact.transfer_grants.iter().any(|g| g == actor_id),
            Lane::Global | Lane::Marketplace => true,
        },
        Action::Cite => matches!(artifact.lane, Lane::Global | Lane::Marketplace),
        Action::Derive => artifact
            .license
            .as_ref()
            .map(|l| l.derivative_allowed)
            .unwrap_or(false),
        Action::ListOnMarket => artifact.transfer_grants.iter().any(|g| g == actor_id),
    }
}

/// Creating a DTU with lineage parents requires: for every parent not owned by
/// the creator, the parent's license allows derivatives.
pub fn derivative_rights_ok(creator_id: &str, parents: &[RightsArtifact]) -> bool {
    parents.iter().all(|parent| {
        parent.creator_id == creator_id
            || parent.license.as_ref().map(|l| l.derivative_allowed).unwrap_or(false)
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofOfOrigin {
    pub artifact_id: String,
    pub creator_id: String,
    pub content_hash: String,
    pub origin_fingerprint: String,
    pub ts_ms: i64,
}

/// Recomputes the hash and compares against the recorded proof; a mismatch
/// signals tampering.
pub fn verify_origin_integrity(proof: &ProofOfOrigin, recomputed_hash: &str) -> bool {
    proof.content_hash == recomputed_hash
}

/// Custom licenses require all five boolean fields present; represented here
/// as a constructor that forces the caller to supply every field rather than
/// allow a partially-specified license to type-check.
pub fn custom_license(
    attribution_required: bool,
    derivative_allowed: bool,
    commercial_allowed: bool,
    redistribution_allowed: bool,
    royalty: bool,
) -> License {
    License {
        license_type: LicenseType::Custom,
        attribution_required,
        derivative_allowed,
        commercial_allowed,
        redistribution_allowed,
        royalty,
    }
}

mod hex {
    pub fn encode_lower(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
