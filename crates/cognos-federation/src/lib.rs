//! cognos-federation: artifact export/import across substrate instances
//! (C15, spec §4 "Federation" / §6 "Federation envelope").
//!
//! Artifact bundle (de)serialization, provenance/license/dispute-history
//! carry-through, and sandbox-until-trusted import gating. Wire-level
//! transport (gRPC, mTLS, HTTP) is explicitly out of scope — a
//! host wires `FederationEnvelope` onto whatever transport it already has.

pub mod error;
pub mod federation;

pub use error::{FederationError, FederationResult};
pub use federation::{
    default_verifier, export_artifact, DisputeRecord, EnvelopeLicense, EvidenceRef, FederationEnvelope,
    FederationRegistry, ImportedArtifact, Reputation, TrustState, Verifier, ENVELOPE_VERSION,
};
