//! # Storage
//!
//! Everything the engine keeps between calls.
//!
//! | Component | Owned by | Addressed by |
//! |-----------|----------|--------------|
//! | [`GraphRecord`] | graph registry | `GraphHandle` |
//! | [`VectorSpace`] | vector-space registry | `VectorSpaceHandle` |
//! | [`DistanceMatrix`] | exactly one graph | the graph |
//!
//! A graph refers to a vector space by handle only. Releasing the space
//! leaves the graph with a stale handle that the resolver rejects.

pub mod distance_matrix;
pub mod graph;
pub mod registry;
pub mod vector_space;

pub use distance_matrix::{DistanceBuffer, DistanceMatrix};
pub use graph::GraphRecord;
pub use registry::Registry;
pub use vector_space::{VectorSpace, VectorStorage, write_entries};
