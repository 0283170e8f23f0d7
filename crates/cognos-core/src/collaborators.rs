//! External capability traits the host supplies: `LLMClient`, `EmbeddingService`,
//! `PersistenceStore`.
//!
//! Grounded on the teacher's `knowledge/vector_store.rs::VectorStore` trait
//! shape (`#[async_trait]`, `Send + Sync`, a typed `Result` alias per trait,
//! graceful-degradation test doubles) — generalized from one trait to three.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::atlas::Dtu;

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator call failed: {0}")]
    CallFailed(String),
}

/// Text generation/shaping capability, used by the autogen pipeline's LLM
/// shaping stage. Not implemented here (out of scope, spec §non-goals) —
/// only the seam is defined.
#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> CollaboratorResult<String>;
    fn is_available(&self) -> bool;
}

/// Embedding/similarity capability, used wherever semantic (rather than
/// lexical) similarity would improve on the bag-of-words fallback in
/// `epistemic::subject_overlap`.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> CollaboratorResult<Vec<f32>>;
    fn is_available(&self) -> bool;
}

/// Durable storage capability. The in-process `ShardedStore`/`AtlasStore`
/// types are the substrate's working memory; a `PersistenceStore` is the
/// host-supplied durability layer behind them.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn save_dtu(&self, dtu: &Dtu) -> CollaboratorResult<()>;
    async fn load_dtu(&self, id: &str) -> CollaboratorResult<Option<Dtu>>;
    fn is_available(&self) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorStatus {
    pub llm_available: bool,
    pub embedding_available: bool,
    pub persistence_available: bool,
}

/// Reports which collaborators are wired up, mirroring the teacher's
/// graceful-degradation status reporting when `OPENROUTER_API_KEY`/
/// `PAGI_SHADOW_KEY` are unset.
pub fn collaborator_status(
    llm: &dyn LLMClient,
    embedding: &dyn EmbeddingService,
    persistence: &dyn PersistenceStore,
) -> CollaboratorStatus {
    CollaboratorStatus {
        llm_available: llm.is_available(),
        embedding_available: embedding.is_available(),
        persistence_available: persistence.is_available(),
    }
}
