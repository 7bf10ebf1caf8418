//! # Engine
//!
//! Typed entry point. Owns both registries and the configuration; every
//! operation is a `&mut self` or `&self` call returning [`Result`].
//!
//! ```text
//! create_graph → add_node* → [bind_vector_space | attach_distance_matrix]
//!   → finalize_proportions → measure* → free_graph
//! ```

use std::path::Path;

use tracing::debug;

use crate::config::EngineConfig;
use crate::distance::{self, PairwiseDistances};
use crate::measure::{self, MeasureContext, MeasureId, MeasureResult, Requirement};
use crate::model::{GraphHandle, NodeId, Precision, VectorSpaceHandle};
use crate::storage::{DistanceBuffer, GraphRecord, Registry, VectorSpace};
use crate::{Error, Result};

pub struct Engine {
    config: EngineConfig,
    graphs: Registry<GraphRecord>,
    spaces: Registry<VectorSpace>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            graphs: Registry::new("graph", config.max_graphs),
            spaces: Registry::new("vector space", config.max_vector_spaces),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Graphs
    // ========================================================================

    pub fn create_graph(&mut self, initial_capacity: usize, embedding_dims: usize) -> Result<GraphHandle> {
        let handle = self.graphs.insert(GraphRecord::new(initial_capacity, embedding_dims))?;
        Ok(GraphHandle(handle))
    }

    pub fn add_node(&mut self, graph: GraphHandle, count: u64, key: Option<&str>) -> Result<NodeId> {
        self.graph_mut(graph)?.add_node(count, key)
    }

    pub fn finalize_proportions(&mut self, graph: GraphHandle) -> Result<()> {
        self.graph_mut(graph)?.finalize_proportions();
        Ok(())
    }

    pub fn attach_distance_matrix<'a>(
        &mut self,
        graph: GraphHandle,
        buffer: impl Into<DistanceBuffer<'a>>,
    ) -> Result<()> {
        self.graph_mut(graph)?.attach_distance_matrix(buffer.into())
    }

    pub fn attach_distance_matrix_bytes(
        &mut self,
        graph: GraphHandle,
        bytes: &[u8],
        precision: Precision,
    ) -> Result<()> {
        self.graph_mut(graph)?.attach_distance_matrix_bytes(bytes, precision)
    }

    /// Release a graph with its nodes and distance matrix. A bound vector
    /// space is left alone.
    pub fn free_graph(&mut self, graph: GraphHandle) -> Result<()> {
        self.graphs.remove(graph.raw()).map(drop)
    }

    pub fn graph(&self, graph: GraphHandle) -> Result<&GraphRecord> {
        self.graphs.get(graph.raw())
    }

    fn graph_mut(&mut self, graph: GraphHandle) -> Result<&mut GraphRecord> {
        self.graphs.get_mut(graph.raw())
    }

    pub fn node_count(&self, graph: GraphHandle) -> Result<usize> {
        Ok(self.graph(graph)?.node_count())
    }

    /// Current proportions; all zero until the graph is finalized.
    pub fn proportions(&self, graph: GraphHandle) -> Result<Vec<f64>> {
        Ok(self.graph(graph)?.proportions())
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    // ========================================================================
    // Vector spaces
    // ========================================================================

    /// Load at the configured default precision.
    pub fn load_vector_space(&mut self, path: impl AsRef<Path>) -> Result<VectorSpaceHandle> {
        let precision = self.config.default_precision;
        self.load_vector_space_with_precision(path, precision)
    }

    pub fn load_vector_space_with_precision(
        &mut self,
        path: impl AsRef<Path>,
        precision: Precision,
    ) -> Result<VectorSpaceHandle> {
        if self.spaces.len() >= self.spaces.capacity() {
            return Err(Error::AllocationFailure("vector space registry is full".into()));
        }
        let space = VectorSpace::load(path, precision)?;
        self.insert_vector_space(space)
    }

    /// Register an already built space.
    pub fn insert_vector_space(&mut self, space: VectorSpace) -> Result<VectorSpaceHandle> {
        Ok(VectorSpaceHandle(self.spaces.insert(space)?))
    }

    pub fn bind_vector_space(&mut self, graph: GraphHandle, space: VectorSpaceHandle) -> Result<()> {
        let dims = self.spaces.get(space.raw())?.dims();
        self.graph_mut(graph)?.bind_vector_space(space, dims)
    }

    /// Release a vector space. Graphs bound to it keep a stale handle.
    pub fn free_vector_space(&mut self, space: VectorSpaceHandle) -> Result<()> {
        self.spaces.remove(space.raw()).map(drop)
    }

    pub fn vector_space(&self, space: VectorSpaceHandle) -> Result<&VectorSpace> {
        self.spaces.get(space.raw())
    }

    /// Closest other vocabulary entry under the configured metric.
    pub fn nearest_key(&self, space: VectorSpaceHandle, key: &str) -> Result<(String, f64)> {
        self.vector_space(space)?.nearest(key, &self.config.metric)
    }

    pub fn vector_space_count(&self) -> usize {
        self.spaces.len()
    }

    // ========================================================================
    // Measures
    // ========================================================================

    /// Evaluate `id` on a finalized graph.
    pub fn measure(&self, graph: GraphHandle, id: MeasureId, alpha: f64, beta: f64) -> Result<MeasureResult> {
        let record = self.graph(graph)?;
        if !record.is_finalized() {
            return Err(Error::InvalidState(format!("{graph} proportions are not finalized")));
        }
        if record.node_count() == 0 {
            return Err(Error::InvalidState(format!("{graph} has no nodes")));
        }

        let proportions = record.proportions();
        let counts = record.counts();
        let mut ctx = MeasureContext::new(&proportions, &counts, record.total_count());
        ctx.dims = record.dims();
        ctx.metric = self.config.metric;
        ctx.similarity_sensitivity = self.config.similarity_sensitivity;

        let distances: PairwiseDistances;
        let embeddings: Vec<Option<Vec<f64>>>;
        match id.requirement() {
            Requirement::Counts => {}
            Requirement::Distances => {
                distances = distance::pairwise(record, &self.spaces, &self.config.metric)?;
                ctx = ctx.with_distances(&distances);
            }
            Requirement::Embeddings => {
                embeddings = distance::embeddings(record, &self.spaces)?;
                ctx = ctx.with_embeddings(&embeddings);
            }
        }

        let result = measure::evaluate(id, &ctx, alpha, beta)?;
        debug!(
            graph = %graph,
            measure = id.name(),
            alpha,
            beta,
            value = result.value,
            transformed = result.transformed,
            "measure evaluated"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn even_pair(engine: &mut Engine) -> GraphHandle {
        let g = engine.create_graph(2, 2).unwrap();
        engine.add_node(g, 4, Some("a")).unwrap();
        engine.add_node(g, 4, Some("b")).unwrap();
        engine.finalize_proportions(g).unwrap();
        g
    }

    #[test]
    fn measure_requires_finalization() {
        let mut engine = Engine::default();
        let g = engine.create_graph(1, 0).unwrap();
        engine.add_node(g, 3, None).unwrap();
        let err = engine.measure(g, MeasureId::EntropyShannonWeaver, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        engine.finalize_proportions(g).unwrap();
        assert!(engine.measure(g, MeasureId::EntropyShannonWeaver, 1.0, 1.0).is_ok());
    }

    #[test]
    fn empty_finalized_graph_is_invalid_state() {
        let mut engine = Engine::default();
        let g = engine.create_graph(0, 0).unwrap();
        engine.finalize_proportions(g).unwrap();
        assert!(engine.proportions(g).unwrap().is_empty());
        let err = engine.measure(g, MeasureId::IndexRichness, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn disparity_from_bound_space() {
        let mut engine = Engine::default();
        let g = even_pair(&mut engine);
        let vs = engine
            .insert_vector_space(
                VectorSpace::from_entries([("a", [0.0, 0.0]), ("b", [3.0, 4.0])], Precision::Fp64).unwrap(),
            )
            .unwrap();
        engine.bind_vector_space(g, vs).unwrap();
        let r = engine.measure(g, MeasureId::DisparityPairwise, 1.0, 1.0).unwrap();
        assert_eq!(r.value, 5.0);

        engine.free_vector_space(vs).unwrap();
        let err = engine.measure(g, MeasureId::DisparityPairwise, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidHandle(_)));
        // count-only measures do not touch the stale binding
        assert!(engine.measure(g, MeasureId::IndexSimpson, 1.0, 1.0).is_ok());
    }

    #[test]
    fn graph_capacity_is_enforced() {
        let config = EngineConfig { max_graphs: 1, ..EngineConfig::default() };
        let mut engine = Engine::new(config);
        let g = engine.create_graph(0, 0).unwrap();
        assert!(matches!(engine.create_graph(0, 0), Err(Error::AllocationFailure(_))));
        engine.free_graph(g).unwrap();
        assert!(engine.create_graph(0, 0).is_ok());
    }

    #[test]
    fn nearest_key_uses_configured_metric() {
        let config = EngineConfig { metric: crate::DistanceMetric::Cosine, ..EngineConfig::default() };
        let mut engine = Engine::new(config);
        let vs = engine
            .insert_vector_space(
                VectorSpace::from_entries(
                    [("x", [1.0, 0.0]), ("far", [1.0, 0.1]), ("parallel", [100.0, 0.0])],
                    Precision::Fp32,
                )
                .unwrap(),
            )
            .unwrap();
        let (key, _) = engine.nearest_key(vs, "x").unwrap();
        assert_eq!(key, "parallel");
    }
}
