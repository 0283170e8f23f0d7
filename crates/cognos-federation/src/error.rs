//! Error taxonomy for federation export/import. Mirrors `cognos_core::error::SubstrateError`'s branch-on-kind
//! discipline and the teacher's `FederationError` (`thiserror::Error` derive,
//! `pagi-federation/src/federation.rs`).

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum FederationError {
    #[error("artifact has no provenance, cannot export")]
    MissingProvenance,

    #[error("envelope failed verification: {0}")]
    VerificationFailed(String),

    #[error("envelope version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: String, expected: &'static str },

    #[error("promotion to trusted requires a privileged actor, got role {role}")]
    PromotionDenied { role: String },

    #[error("no import recorded for artifact {artifact_id}")]
    UnknownImport { artifact_id: String },
}

pub type FederationResult<T> = Result<T, FederationError>;
