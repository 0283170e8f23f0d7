//! Error taxonomy for the pipeline.
//!
//! Mirrors `cognos_core::error::SubstrateError`'s branch-on-kind discipline:
//! callers match on the variant, never parse the message.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AutogenError {
    /// Stage 2 (Builder): the retrieval pack carried zero core DTUs.
    #[error("retrieval pack is empty, aborting before build")]
    EmptyPack,

    /// Stage 1/2: requested target lane has nothing to select from at all.
    #[error("lattice is empty for lane {lane:?}")]
    EmptyLattice { lane: String },

    /// Bubbled up from `cognos_core` (e.g. a gated write call during commit).
    #[error(transparent)]
    Substrate(#[from] cognos_core::SubstrateError),
}

pub type AutogenResult<T> = Result<T, AutogenError>;
