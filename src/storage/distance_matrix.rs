//! Externally computed pairwise distances owned by one graph.
//!
//! Transfer format: flat row-major buffer of `n * n` values at the declared
//! precision, little-endian for the byte form.

use crate::model::{DenseMatrix, Precision, Scalar};
use crate::{Error, Result};

/// Length-checked view over caller memory, tagged with its precision.
#[derive(Debug, Clone, Copy)]
pub enum DistanceBuffer<'a> {
    Fp32(&'a [f32]),
    Fp64(&'a [f64]),
}

impl DistanceBuffer<'_> {
    pub fn len(&self) -> usize {
        match self {
            DistanceBuffer::Fp32(v) => v.len(),
            DistanceBuffer::Fp64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn precision(&self) -> Precision {
        match self {
            DistanceBuffer::Fp32(_) => Precision::Fp32,
            DistanceBuffer::Fp64(_) => Precision::Fp64,
        }
    }
}

impl<'a> From<&'a [f32]> for DistanceBuffer<'a> {
    fn from(v: &'a [f32]) -> Self {
        DistanceBuffer::Fp32(v)
    }
}

impl<'a> From<&'a [f64]> for DistanceBuffer<'a> {
    fn from(v: &'a [f64]) -> Self {
        DistanceBuffer::Fp64(v)
    }
}

/// Dense `n × n` distances stored at the precision they arrived in.
#[derive(Debug, Clone, PartialEq)]
pub enum DistanceMatrix {
    Fp32(DenseMatrix<f32>),
    Fp64(DenseMatrix<f64>),
}

impl DistanceMatrix {
    /// Copy `buffer` into an owned matrix for a graph of `node_count` nodes.
    pub fn from_buffer(buffer: DistanceBuffer<'_>, node_count: usize) -> Result<Self> {
        let expected = square(node_count)?;
        if buffer.len() != expected {
            return Err(Error::DimensionMismatch { expected, got: buffer.len() });
        }
        let matrix = match buffer {
            DistanceBuffer::Fp32(v) => DenseMatrix::from_vec(node_count, node_count, v.to_vec()).map(Self::Fp32),
            DistanceBuffer::Fp64(v) => DenseMatrix::from_vec(node_count, node_count, v.to_vec()).map(Self::Fp64),
        };
        matrix.ok_or(Error::DimensionMismatch { expected, got: buffer.len() })
    }

    /// Decode little-endian bytes. A length that is not a whole number of
    /// elements is `InvalidArgument`; a wrong element count is `DimensionMismatch`.
    pub fn from_le_bytes(bytes: &[u8], precision: Precision, node_count: usize) -> Result<Self> {
        let width = precision.byte_width();
        if bytes.len() % width != 0 {
            return Err(Error::InvalidArgument(format!(
                "distance buffer of {} bytes is not a multiple of {width}",
                bytes.len()
            )));
        }
        let expected = square(node_count)?;
        let got = bytes.len() / width;
        if got != expected {
            return Err(Error::DimensionMismatch { expected, got });
        }
        let matrix = match precision {
            Precision::Fp32 => decode::<f32>(bytes, node_count).map(Self::Fp32),
            Precision::Fp64 => decode::<f64>(bytes, node_count).map(Self::Fp64),
        };
        matrix.ok_or(Error::DimensionMismatch { expected, got })
    }

    /// Side length `n`.
    pub fn dim(&self) -> usize {
        match self {
            DistanceMatrix::Fp32(m) => m.rows(),
            DistanceMatrix::Fp64(m) => m.rows(),
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            DistanceMatrix::Fp32(_) => Precision::Fp32,
            DistanceMatrix::Fp64(_) => Precision::Fp64,
        }
    }

    /// Entry `m[i][j]` widened to `f64`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        match self {
            DistanceMatrix::Fp32(m) => m.get(i, j).to_f64(),
            DistanceMatrix::Fp64(m) => m.get(i, j),
        }
    }
}

fn decode<T: Scalar>(bytes: &[u8], n: usize) -> Option<DenseMatrix<T>> {
    DenseMatrix::from_le_bytes(n, n, bytes)
}

fn square(n: usize) -> Result<usize> {
    n.checked_mul(n)
        .ok_or_else(|| Error::InvalidArgument(format!("{n} nodes overflow a square matrix")))
}
