//! Distances between categories: vector metrics and the per-call resolver
//! that feeds disparity measures.

pub mod metric;
pub mod resolver;

pub use metric::DistanceMetric;
pub use resolver::{PairwiseDistances, bound_space, embeddings, pairwise};
