//! Flat surface: integer handles in, status codes out.
//!
//! One process-wide [`Engine`] sits behind a `parking_lot::Mutex`, so every
//! call here is serialized. It is configured from the `DIVERSITY_*`
//! environment on first use (falling back to defaults if that fails).
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | OK |
//! | 1 | InvalidArgument |
//! | 2 | InvalidHandle |
//! | 3 | InvalidState |
//! | 4 | DimensionMismatch |
//! | 5 | FileFormat |
//! | 6 | AllocationFailure |
//! | 7 | Unresolvable |
//! | 8 | Io |
//! | 9 | Config |
//!
//! Handle-returning calls return `-1` on any failure.

use std::sync::LazyLock;

use parking_lot::Mutex;
use tracing::warn;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::measure::MeasureId;
use crate::model::{GraphHandle, Precision, VectorSpaceHandle};
use crate::{Error, Result};

pub use crate::measure::MEASURE_IDS;

pub const FP32: i32 = 0;
pub const FP64: i32 = 1;

pub const STATUS_OK: i32 = 0;
pub const INVALID_HANDLE: i64 = -1;

static ENGINE: LazyLock<Mutex<Engine>> = LazyLock::new(|| {
    let config = EngineConfig::from_env().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring invalid environment configuration");
        EngineConfig::default()
    });
    Mutex::new(Engine::new(config))
});

/// Outcome of [`individual_measure`]. Values are NaN unless `status == 0`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureReturn {
    pub status: i32,
    pub value: f64,
    pub transformed: f64,
}

/// Run `f` against the process-wide engine.
pub fn with_engine<R>(f: impl FnOnce(&mut Engine) -> R) -> R {
    f(&mut ENGINE.lock())
}

fn status(result: Result<()>) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(err) => err.status_code(),
    }
}

fn graph_handle(raw: i64) -> Result<GraphHandle> {
    GraphHandle::from_raw(raw).ok_or_else(|| Error::InvalidHandle(format!("graph id {raw}")))
}

fn space_handle(raw: i64) -> Result<VectorSpaceHandle> {
    VectorSpaceHandle::from_raw(raw).ok_or_else(|| Error::InvalidHandle(format!("vector space id {raw}")))
}

fn non_negative(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::InvalidArgument(format!("{name} must be non-negative, got {value}")))
}

fn precision(tag: i32) -> Result<Precision> {
    Precision::from_tag(tag).ok_or_else(|| Error::InvalidArgument(format!("unknown precision tag {tag}")))
}

// ============================================================================
// Graphs
// ============================================================================

pub fn create_empty_graph(initial_capacity: i64, embedding_dim: i64) -> i64 {
    let created = non_negative("initial capacity", initial_capacity)
        .and_then(|cap| Ok((cap, non_negative("embedding dimensionality", embedding_dim)?)))
        .and_then(|(cap, dims)| with_engine(|e| e.create_graph(cap, dims)));
    match created {
        Ok(handle) => handle.to_raw(),
        Err(err) => {
            warn!(error = %err, "create_empty_graph failed");
            INVALID_HANDLE
        }
    }
}

pub fn add_node(graph: i64, count: i64, key: Option<&str>) -> i32 {
    status(try_add_node(graph, count, key))
}

fn try_add_node(graph: i64, count: i64, key: Option<&str>) -> Result<()> {
    let graph = graph_handle(graph)?;
    if count <= 0 {
        return Err(Error::InvalidArgument(format!("node count must be positive, got {count}")));
    }
    with_engine(|e| e.add_node(graph, count as u64, key)).map(drop)
}

pub fn compute_relative_proportion(graph: i64) -> i32 {
    status(graph_handle(graph).and_then(|g| with_engine(|e| e.finalize_proportions(g))))
}

pub fn free_graph(graph: i64) -> i32 {
    status(graph_handle(graph).and_then(|g| with_engine(|e| e.free_graph(g))))
}

/// `buffer` holds `node_count²` little-endian values at `precision_tag`.
pub fn attach_distance_matrix(graph: i64, buffer: &[u8], precision_tag: i32) -> i32 {
    status(graph_handle(graph).and_then(|g| {
        let precision = precision(precision_tag)?;
        with_engine(|e| e.attach_distance_matrix_bytes(g, buffer, precision))
    }))
}

// ============================================================================
// Measures
// ============================================================================

pub fn individual_measure(graph: i64, measure_id: i32, alpha: f64, beta: f64) -> MeasureReturn {
    let result = graph_handle(graph).and_then(|g| {
        let id = MeasureId::from_id(measure_id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown measure id {measure_id}")))?;
        with_engine(|e| e.measure(g, id, alpha, beta))
    });
    match result {
        Ok(r) => MeasureReturn { status: STATUS_OK, value: r.value, transformed: r.transformed },
        Err(err) => MeasureReturn { status: err.status_code(), value: f64::NAN, transformed: f64::NAN },
    }
}

/// [`individual_measure`] with `alpha = beta = 1.0`.
pub fn individual_measure_default(graph: i64, measure_id: i32) -> MeasureReturn {
    individual_measure(graph, measure_id, 1.0, 1.0)
}

// ============================================================================
// Vector spaces
// ============================================================================

/// Load at the configured default precision.
pub fn load_w2v(path: &str) -> i64 {
    space_or_sentinel(with_engine(|e| e.load_vector_space(path)), path)
}

pub fn load_w2v_with_precision(path: &str, precision_tag: i32) -> i64 {
    let loaded = precision(precision_tag)
        .and_then(|p| with_engine(|e| e.load_vector_space_with_precision(path, p)));
    space_or_sentinel(loaded, path)
}

fn space_or_sentinel(result: Result<VectorSpaceHandle>, path: &str) -> i64 {
    match result {
        Ok(handle) => handle.to_raw(),
        Err(err) => {
            warn!(path, error = %err, "vector space load failed");
            INVALID_HANDLE
        }
    }
}

pub fn bind_w2v(graph: i64, vector_space: i64) -> i32 {
    status(graph_handle(graph).and_then(|g| {
        let space = space_handle(vector_space)?;
        with_engine(|e| e.bind_vector_space(g, space))
    }))
}

pub fn free_w2v(vector_space: i64) -> i32 {
    status(space_handle(vector_space).and_then(|vs| with_engine(|e| e.free_vector_space(vs))))
}
