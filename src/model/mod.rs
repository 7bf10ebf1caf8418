//! # Measurement Model
//!
//! Plain data shared by the store, the resolver and the measure library:
//! handles, category nodes, precision tags and dense numeric storage.
//!
//! Design rule: no registry state, no I/O here.

pub mod handle;
pub mod node;
pub mod precision;

pub use handle::{GraphHandle, RawHandle, VectorSpaceHandle};
pub use node::{CategoryNode, NodeId};
pub use precision::{DenseMatrix, Precision, Scalar};
