//! Graph record: the counted categories of one population plus its
//! optional distance source.

use crate::model::{CategoryNode, NodeId, Precision, VectorSpaceHandle};
use crate::storage::{DistanceBuffer, DistanceMatrix};
use crate::{Error, Result};

/// One population under measurement.
///
/// Nodes keep insertion order; that order is the row/column order of an
/// attached distance matrix.
#[derive(Debug, Clone, Default)]
pub struct GraphRecord {
    nodes: Vec<CategoryNode>,
    /// Σ counts, kept in step with `nodes`.
    total: u64,
    dims: usize,
    vector_space: Option<VectorSpaceHandle>,
    matrix: Option<DistanceMatrix>,
    finalized: bool,
}

impl GraphRecord {
    pub fn new(initial_capacity: usize, dims: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(initial_capacity),
            dims,
            ..Self::default()
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Append a category. Duplicate keys are separate nodes.
    ///
    /// A count that would overflow the graph total is rejected and leaves
    /// the graph unchanged.
    pub fn add_node(&mut self, count: u64, key: Option<&str>) -> Result<NodeId> {
        if count == 0 {
            return Err(Error::InvalidArgument("node count must be positive".into()));
        }
        let total = self.total.checked_add(count).ok_or_else(|| {
            Error::InvalidArgument(format!("count {count} overflows the graph total {}", self.total))
        })?;
        let id = NodeId(self.nodes.len());
        let mut node = CategoryNode::new(id, count);
        if let Some(key) = key {
            node = node.with_key(key);
        }
        self.nodes.push(node);
        self.total = total;
        self.finalized = false;
        Ok(id)
    }

    /// Recompute `proportion = count / total` for every node. Idempotent.
    pub fn finalize_proportions(&mut self) {
        let total = self.total_count() as f64;
        for node in &mut self.nodes {
            node.proportion = node.count as f64 / total;
        }
        self.finalized = true;
    }

    /// Record a non-owning reference to a vector space. Replaces any previous one.
    pub fn bind_vector_space(&mut self, space: VectorSpaceHandle, space_dims: usize) -> Result<()> {
        if space_dims != self.dims {
            return Err(Error::DimensionMismatch { expected: self.dims, got: space_dims });
        }
        self.vector_space = Some(space);
        Ok(())
    }

    /// Replace the attached distance matrix. On error the previous one stays.
    pub fn attach_distance_matrix(&mut self, buffer: DistanceBuffer<'_>) -> Result<()> {
        self.matrix = Some(DistanceMatrix::from_buffer(buffer, self.nodes.len())?);
        Ok(())
    }

    pub fn attach_distance_matrix_bytes(&mut self, bytes: &[u8], precision: Precision) -> Result<()> {
        self.matrix = Some(DistanceMatrix::from_le_bytes(bytes, precision, self.nodes.len())?);
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn nodes(&self) -> &[CategoryNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn total_count(&self) -> u64 {
        self.total
    }

    pub fn counts(&self) -> Vec<u64> {
        self.nodes.iter().map(|n| n.count).collect()
    }

    pub fn proportions(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.proportion).collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = Option<&str>> {
        self.nodes.iter().map(CategoryNode::key)
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn vector_space(&self) -> Option<VectorSpaceHandle> {
        self.vector_space
    }

    pub fn distance_matrix(&self) -> Option<&DistanceMatrix> {
        self.matrix.as_ref()
    }

    pub fn matrix_precision(&self) -> Option<Precision> {
        self.matrix.as_ref().map(DistanceMatrix::precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawHandle;

    #[test]
    fn proportions_sum_to_one() {
        let mut g = GraphRecord::new(3, 0);
        for c in [3, 5, 2] {
            g.add_node(c, None).unwrap();
        }
        g.finalize_proportions();
        let sum: f64 = g.proportions().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(g.proportions()[2], 0.2);
    }

    #[test]
    fn zero_count_is_rejected() {
        let mut g = GraphRecord::new(0, 0);
        assert!(matches!(g.add_node(0, Some("x")), Err(Error::InvalidArgument(_))));
        assert_eq!(g.node_count(), 0);
    }

    #[test]
    fn total_overflow_is_rejected_and_graph_unchanged() {
        let mut g = GraphRecord::new(3, 0);
        g.add_node(u64::MAX - 1, Some("a")).unwrap();
        assert!(matches!(g.add_node(2, Some("b")), Err(Error::InvalidArgument(_))));
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.total_count(), u64::MAX - 1);

        g.add_node(1, None).unwrap();
        assert_eq!(g.total_count(), u64::MAX);
        g.finalize_proportions();
        let sum: f64 = g.proportions().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn adding_after_finalize_clears_flag() {
        let mut g = GraphRecord::new(0, 0);
        g.add_node(1, None).unwrap();
        g.finalize_proportions();
        assert!(g.is_finalized());
        g.add_node(1, None).unwrap();
        assert!(!g.is_finalized());
    }

    #[test]
    fn empty_graph_finalizes_to_empty_vector() {
        let mut g = GraphRecord::new(0, 0);
        g.finalize_proportions();
        assert!(g.is_finalized());
        assert!(g.proportions().is_empty());
    }

    #[test]
    fn failed_attach_keeps_previous_matrix() {
        let mut g = GraphRecord::new(2, 0);
        g.add_node(1, None).unwrap();
        g.add_node(1, None).unwrap();
        let good = [0.0f64, 1.0, 1.0, 0.0];
        g.attach_distance_matrix(DistanceBuffer::from(&good[..])).unwrap();
        let bad = [0.0f32; 3];
        assert!(g.attach_distance_matrix(DistanceBuffer::from(&bad[..])).is_err());
        assert_eq!(g.matrix_precision(), Some(Precision::Fp64));
        assert_eq!(g.distance_matrix().unwrap().get(0, 1), 1.0);
    }

    #[test]
    fn binding_checks_dimensionality() {
        let mut g = GraphRecord::new(0, 3);
        let vs = VectorSpaceHandle(RawHandle::new(0, 0));
        assert!(matches!(
            g.bind_vector_space(vs, 4),
            Err(Error::DimensionMismatch { expected: 3, got: 4 })
        ));
        g.bind_vector_space(vs, 3).unwrap();
        assert_eq!(g.vector_space(), Some(vs));
    }
}
