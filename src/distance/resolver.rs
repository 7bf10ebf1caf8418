//! Turns a graph's distance source into one pairwise matrix per measure call.
//!
//! Precedence: attached distance matrix, then bound vector space. Pairs that
//! involve a node whose key cannot be resolved get the largest distance seen
//! among resolved pairs of the same call (1.0 if none resolved).

use tracing::warn;

use crate::distance::DistanceMetric;
use crate::model::{DenseMatrix, Scalar};
use crate::storage::{DistanceMatrix, GraphRecord, Registry, VectorSpace, VectorStorage};
use crate::{Error, Result};

/// Distance used when no pair of the call could be resolved.
pub const UNRESOLVED_FALLBACK: f64 = 1.0;

/// Dense `n × n` distances for one measure evaluation. Diagonal is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseDistances {
    n: usize,
    data: Vec<f64>,
    unresolved: usize,
}

impl PairwiseDistances {
    /// Build from row-major values. Returns `None` unless `data.len() == n * n`.
    pub fn from_vec(n: usize, data: Vec<f64>) -> Option<Self> {
        (n.checked_mul(n)? == data.len()).then_some(Self { n, data, unresolved: 0 })
    }

    pub fn from_matrix(m: &DistanceMatrix) -> Self {
        let n = m.dim();
        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                data.push(m.get(i, j));
            }
        }
        Self { n, data, unresolved: 0 }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Number of nodes that had no embedding.
    pub fn unresolved(&self) -> usize {
        self.unresolved
    }
}

/// Pairwise distances for every node of `graph`.
pub fn pairwise(
    graph: &GraphRecord,
    spaces: &Registry<VectorSpace>,
    metric: &DistanceMetric,
) -> Result<PairwiseDistances> {
    if let Some(matrix) = graph.distance_matrix() {
        if matrix.dim() != graph.node_count() {
            return Err(Error::DimensionMismatch { expected: graph.node_count(), got: matrix.dim() });
        }
        return Ok(PairwiseDistances::from_matrix(matrix));
    }

    let space = bound_space(graph, spaces)?;
    let rows = resolve_rows(graph, space);
    Ok(match space.storage() {
        VectorStorage::Fp32(m) => compute(m, &rows, metric),
        VectorStorage::Fp64(m) => compute(m, &rows, metric),
    })
}

/// Embeddings of every node, `None` where the key does not resolve.
pub fn embeddings(graph: &GraphRecord, spaces: &Registry<VectorSpace>) -> Result<Vec<Option<Vec<f64>>>> {
    let space = bound_space(graph, spaces)?;
    Ok(resolve_rows(graph, space)
        .into_iter()
        .map(|row| row.map(|r| space.vector(r)))
        .collect())
}

/// The vector space bound to `graph`, checked for liveness.
pub fn bound_space<'a>(graph: &GraphRecord, spaces: &'a Registry<VectorSpace>) -> Result<&'a VectorSpace> {
    let handle = graph
        .vector_space()
        .ok_or_else(|| Error::InvalidState("no distance matrix attached and no vector space bound".into()))?;
    spaces.get(handle.raw()).inspect_err(|_| {
        warn!(vector_space = %handle, "bound vector space has been released");
    })
}

fn resolve_rows(graph: &GraphRecord, space: &VectorSpace) -> Vec<Option<usize>> {
    let rows: Vec<Option<usize>> = graph.keys().map(|key| key.and_then(|k| space.row_of(k))).collect();
    let missing = rows.iter().filter(|r| r.is_none()).count();
    if missing > 0 {
        warn!(missing, nodes = rows.len(), "nodes without a resolvable embedding");
    }
    rows
}

fn compute<T: Scalar>(m: &DenseMatrix<T>, rows: &[Option<usize>], metric: &DistanceMetric) -> PairwiseDistances {
    let n = rows.len();
    let mut data = vec![0.0; n * n];
    let mut resolved = vec![false; n * n];
    let mut max: Option<f64> = None;

    for i in 0..n {
        let Some(a) = rows[i] else { continue };
        for j in (i + 1)..n {
            let Some(b) = rows[j] else { continue };
            let d = metric.distance(m.row(a), m.row(b));
            data[i * n + j] = d;
            data[j * n + i] = d;
            resolved[i * n + j] = true;
            resolved[j * n + i] = true;
            if !d.is_nan() {
                max = Some(max.map_or(d, |m| m.max(d)));
            }
        }
    }

    let fallback = max.unwrap_or(UNRESOLVED_FALLBACK);
    for i in 0..n {
        for j in 0..n {
            if i != j && !resolved[i * n + j] {
                data[i * n + j] = fallback;
            }
        }
    }

    PairwiseDistances {
        n,
        data,
        unresolved: rows.iter().filter(|r| r.is_none()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Precision;
    use crate::storage::DistanceBuffer;

    fn space() -> VectorSpace {
        VectorSpace::from_entries(
            [("a", vec![0.0, 0.0]), ("b", vec![3.0, 4.0]), ("c", vec![0.0, 1.0])],
            Precision::Fp64,
        )
        .unwrap()
    }

    #[test]
    fn unresolved_pairs_take_max_resolved_distance() {
        let mut spaces = Registry::new("vector space", 4);
        let vs = spaces.insert(space()).unwrap();
        let mut g = GraphRecord::new(3, 2);
        g.add_node(1, Some("a")).unwrap();
        g.add_node(1, Some("b")).unwrap();
        g.add_node(1, Some("missing")).unwrap();
        g.bind_vector_space(vs.into(), 2).unwrap();

        let d = pairwise(&g, &spaces, &DistanceMetric::default()).unwrap();
        assert_eq!(d.get(0, 1), 5.0);
        assert_eq!(d.get(0, 2), 5.0);
        assert_eq!(d.get(2, 1), 5.0);
        assert_eq!(d.get(2, 2), 0.0);
        assert_eq!(d.unresolved(), 1);
    }

    #[test]
    fn nothing_resolved_falls_back_to_one() {
        let mut spaces = Registry::new("vector space", 4);
        let vs = spaces.insert(space()).unwrap();
        let mut g = GraphRecord::new(2, 2);
        g.add_node(1, None).unwrap();
        g.add_node(1, Some("nope")).unwrap();
        g.bind_vector_space(vs.into(), 2).unwrap();
        let d = pairwise(&g, &spaces, &DistanceMetric::default()).unwrap();
        assert_eq!(d.get(0, 1), UNRESOLVED_FALLBACK);
    }

    #[test]
    fn matrix_takes_precedence_over_space() {
        let mut spaces = Registry::new("vector space", 4);
        let vs = spaces.insert(space()).unwrap();
        let mut g = GraphRecord::new(2, 2);
        g.add_node(1, Some("a")).unwrap();
        g.add_node(1, Some("b")).unwrap();
        g.bind_vector_space(vs.into(), 2).unwrap();
        let m = [0.0f32, 0.25, 0.5, 0.0];
        g.attach_distance_matrix(DistanceBuffer::from(&m[..])).unwrap();
        let d = pairwise(&g, &spaces, &DistanceMetric::default()).unwrap();
        assert_eq!(d.get(0, 1), 0.25);
        assert_eq!(d.get(1, 0), 0.5);
    }

    #[test]
    fn stale_binding_and_missing_source() {
        let mut spaces = Registry::new("vector space", 4);
        let vs = spaces.insert(space()).unwrap();
        let mut g = GraphRecord::new(1, 2);
        g.add_node(1, Some("a")).unwrap();
        assert!(matches!(
            pairwise(&g, &spaces, &DistanceMetric::default()),
            Err(Error::InvalidState(_))
        ));
        g.bind_vector_space(vs.into(), 2).unwrap();
        spaces.remove(vs).unwrap();
        assert!(matches!(
            pairwise(&g, &spaces, &DistanceMetric::default()),
            Err(Error::InvalidHandle(_))
        ));
    }

    #[test]
    fn matrix_smaller_than_graph_is_dimension_mismatch() {
        let spaces = Registry::new("vector space", 1);
        let mut g = GraphRecord::new(2, 0);
        g.add_node(1, None).unwrap();
        g.attach_distance_matrix(DistanceBuffer::from(&[0.0f64][..])).unwrap();
        g.add_node(1, None).unwrap();
        assert!(matches!(
            pairwise(&g, &spaces, &DistanceMetric::default()),
            Err(Error::DimensionMismatch { expected: 2, got: 1 })
        ));
    }
}
