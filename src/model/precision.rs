//! # Precision Layer
//!
//! Storage and arithmetic for vector spaces, distance matrices and metric
//! kernels are written once against [`Scalar`] and instantiated for `f32`
//! and `f64`. Results always leave the layer as `f64`.
//!
//! | Mode | Rust type | Bytes | Flat constant |
//! |------|-----------|-------|---------------|
//! | `Fp32` | `f32` | 4 | `FP32 = 0` |
//! | `Fp64` | `f64` | 8 | `FP64 = 1` |

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

// ============================================================================
// Precision tag
// ============================================================================

/// Floating-point width selected for stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    #[default]
    Fp32,
    Fp64,
}

impl Precision {
    /// Width in bytes of one stored value.
    pub fn byte_width(self) -> usize {
        match self {
            Precision::Fp32 => 4,
            Precision::Fp64 => 8,
        }
    }

    /// Decode the flat-surface precision tag.
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Precision::Fp32),
            1 => Some(Precision::Fp64),
            _ => None,
        }
    }

    pub fn tag(self) -> i32 {
        match self {
            Precision::Fp32 => 0,
            Precision::Fp64 => 1,
        }
    }

    /// Parse `fp32` / `fp64` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fp32" | "f32" => Some(Precision::Fp32),
            "fp64" | "f64" => Some(Precision::Fp64),
            _ => None,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Fp32 => write!(f, "fp32"),
            Precision::Fp64 => write!(f, "fp64"),
        }
    }
}

// ============================================================================
// Scalar trait
// ============================================================================

/// A floating-point storage type. Implemented for `f32` and `f64` only.
pub trait Scalar:
    Copy
    + Default
    + PartialOrd
    + fmt::Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + sealed::Sealed
{
    const PRECISION: Precision;
    const ZERO: Self;
    const ONE: Self;

    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;
    fn abs(self) -> Self;
    fn sqrt(self) -> Self;
    fn powf(self, e: Self) -> Self;
    fn max(self, other: Self) -> Self;

    /// Decode one little-endian value. `bytes.len()` must equal the width.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

macro_rules! impl_scalar {
    ($t:ty, $precision:expr, $width:expr) => {
        impl Scalar for $t {
            const PRECISION: Precision = $precision;
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;

            #[inline(always)]
            fn from_f64(v: f64) -> Self { v as $t }
            #[inline(always)]
            fn to_f64(self) -> f64 { self as f64 }
            #[inline(always)]
            fn abs(self) -> Self { <$t>::abs(self) }
            #[inline(always)]
            fn sqrt(self) -> Self { <$t>::sqrt(self) }
            #[inline(always)]
            fn powf(self, e: Self) -> Self { <$t>::powf(self, e) }
            #[inline(always)]
            fn max(self, other: Self) -> Self { <$t>::max(self, other) }

            #[inline(always)]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; $width];
                raw.copy_from_slice(bytes);
                <$t>::from_le_bytes(raw)
            }
        }
    };
}

impl_scalar!(f32, Precision::Fp32, 4);
impl_scalar!(f64, Precision::Fp64, 8);

// ============================================================================
// Dense row-major storage
// ============================================================================

/// Row-major `rows × cols` matrix at one precision.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T: Scalar> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Scalar> DenseMatrix<T> {
    /// Wrap an existing buffer. Returns `None` when `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        if rows.checked_mul(cols)? != data.len() {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    /// Convert `f64` values into this precision.
    pub fn from_f64_slice(rows: usize, cols: usize, values: &[f64]) -> Option<Self> {
        Self::from_vec(rows, cols, values.iter().map(|&v| T::from_f64(v)).collect())
    }

    /// Decode a little-endian byte buffer. Returns `None` on a length mismatch.
    pub fn from_le_bytes(rows: usize, cols: usize, bytes: &[u8]) -> Option<Self> {
        let width = T::PRECISION.byte_width();
        if bytes.len() % width != 0 {
            return None;
        }
        let data = bytes.chunks_exact(width).map(T::from_le_slice).collect();
        Self::from_vec(rows, cols, data)
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }

    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.cols + j]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_tags_round_trip() {
        assert_eq!(Precision::from_tag(0), Some(Precision::Fp32));
        assert_eq!(Precision::from_tag(1), Some(Precision::Fp64));
        assert_eq!(Precision::from_tag(2), None);
        assert_eq!(Precision::from_tag(-1), None);
        assert_eq!(Precision::Fp64.tag(), 1);
        assert_eq!(Precision::parse("FP64"), Some(Precision::Fp64));
        assert_eq!(Precision::parse("half"), None);
    }

    #[test]
    fn f32_storage_rounds_to_single_precision() {
        let m = DenseMatrix::<f32>::from_f64_slice(1, 1, &[0.1]).unwrap();
        assert_eq!(m.get(0, 0).to_f64(), 0.1f32 as f64);
        assert_ne!(m.get(0, 0).to_f64(), 0.1);
    }

    #[test]
    fn le_bytes_decode_row_major() {
        let values = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let m = DenseMatrix::<f64>::from_le_bytes(2, 3, &bytes).unwrap();
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.get(0, 2), 3.0);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        assert!(DenseMatrix::<f32>::from_vec(2, 2, vec![0.0; 3]).is_none());
        assert!(DenseMatrix::<f32>::from_le_bytes(1, 1, &[0u8; 3]).is_none());
        assert!(DenseMatrix::<f64>::from_le_bytes(1, 1, &[0u8; 4]).is_none());
    }
}
