//! # diversity-rs — Diversity Measures over Weighted Category Graphs
//!
//! Computes diversity, evenness, dominance and functional-disparity indices
//! over a categorical population (word types, species, ...) and, optionally,
//! over an embedding space attached to those categories.
//!
//! ## Design Principles
//!
//! 1. **Handles, not pointers**: graphs and vector spaces live in
//!    generation-checked registries; a freed handle is `InvalidHandle`, never
//!    a dangling reference
//! 2. **Measures are pure**: every measure is a function of proportions,
//!    counts and (for disparity) one pairwise distance matrix per call
//! 3. **One precision layer**: storage and metric kernels are generic over
//!    `f32`/`f64`, results always leave as `f64`
//! 4. **Flat surface is a thin shell**: `interface` converts `Result` into
//!    status codes and does nothing else
//!
//! ## Quick Start
//!
//! ```rust
//! use diversity_rs::{Engine, MeasureId};
//!
//! # fn example() -> diversity_rs::Result<()> {
//! let mut engine = Engine::default();
//! let graph = engine.create_graph(2, 0)?;
//! engine.add_node(graph, 4, Some("cat"))?;
//! engine.add_node(graph, 4, Some("dog"))?;
//! engine.finalize_proportions(graph)?;
//!
//! let shannon = engine.measure(graph, MeasureId::EntropyShannonWeaver, 1.0, 1.0)?;
//! assert!((shannon.transformed - 2.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Measure Families
//!
//! | Family | Needs | Examples |
//! |--------|-------|----------|
//! | Entropy | proportions | Shannon-Weaver, Rényi, Patil-Taillie, Brillouin |
//! | Dominance | proportions | Simpson, Berger-Parker, McIntosh |
//! | Evenness | proportions | Heip, Bulla, Smith & Wilson, NHC |
//! | Richness | counts | richness, species count, type/token ratio |
//! | Disparity | distances | Stirling, Rao/Chao, Leinster-Cobbold, FEve |

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod distance;
pub mod engine;
pub mod export;
pub mod interface;
pub mod measure;
pub mod model;
pub mod storage;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::EngineConfig;
pub use distance::DistanceMetric;
pub use engine::Engine;
pub use measure::{MeasureFamily, MeasureId, MeasureResult};
pub use model::{CategoryNode, GraphHandle, NodeId, Precision, VectorSpaceHandle};
pub use storage::{DistanceBuffer, DistanceMatrix, GraphRecord, VectorSpace};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Vector space format error at byte {offset}: {message}")]
    FileFormat { offset: usize, message: String },

    #[error("Unresolvable: {0}")]
    Unresolvable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable integer code used by the flat surface. `0` is reserved for success.
    pub fn status_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => 1,
            Error::InvalidHandle(_) => 2,
            Error::InvalidState(_) => 3,
            Error::DimensionMismatch { .. } => 4,
            Error::FileFormat { .. } => 5,
            Error::AllocationFailure(_) => 6,
            Error::Unresolvable(_) => 7,
            Error::Io(_) => 8,
            Error::Config(_) => 9,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_distinct_and_nonzero() {
        let errors = [
            Error::InvalidArgument(String::new()),
            Error::InvalidHandle(String::new()),
            Error::InvalidState(String::new()),
            Error::DimensionMismatch { expected: 4, got: 3 },
            Error::FileFormat { offset: 0, message: String::new() },
            Error::AllocationFailure(String::new()),
            Error::Unresolvable(String::new()),
            Error::Io(std::io::Error::other("x")),
            Error::Config(String::new()),
        ];
        let codes: Vec<i32> = errors.iter().map(Error::status_code).collect();
        assert_eq!(codes, (1..=9).collect::<Vec<_>>());
    }

    #[test]
    fn dimension_mismatch_message_names_both_sides() {
        let err = Error::DimensionMismatch { expected: 9, got: 8 };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 9, got 8");
    }
}
