//! Vector distance kernels, generic over the storage precision.
//!
//! | Metric | Definition |
//! |--------|------------|
//! | `Minkowski { p }` | (Σ \|aᵢ − bᵢ\|^p)^(1/p), `p = 2` is Euclidean |
//! | `Cosine` | 1 − a·b / (\|a\| \|b\|), 1.0 when either norm is zero |
//! | `Chebyshev` | max \|aᵢ − bᵢ\| |
//! | `Canberra` | Σ \|aᵢ − bᵢ\| / (\|aᵢ\| + \|bᵢ\|), zero denominators skipped |
//! | `BrayCurtis` | Σ \|aᵢ − bᵢ\| / Σ \|aᵢ + bᵢ\|, 0.0 when the denominator is zero |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Scalar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DistanceMetric {
    Minkowski { p: f64 },
    Cosine,
    Chebyshev,
    Canberra,
    BrayCurtis,
}

impl Default for DistanceMetric {
    fn default() -> Self {
        DistanceMetric::Minkowski { p: 2.0 }
    }
}

impl DistanceMetric {
    pub const EUCLIDEAN: DistanceMetric = DistanceMetric::Minkowski { p: 2.0 };

    /// Parse `euclidean`, `minkowski:<p>`, `cosine`, `chebyshev`,
    /// `canberra` or `bray-curtis`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        let metric = match s.as_str() {
            "euclidean" => Self::EUCLIDEAN,
            "cosine" => DistanceMetric::Cosine,
            "chebyshev" => DistanceMetric::Chebyshev,
            "canberra" => DistanceMetric::Canberra,
            "bray-curtis" | "braycurtis" => DistanceMetric::BrayCurtis,
            other => {
                let p: f64 = other.strip_prefix("minkowski:")?.trim().parse().ok()?;
                DistanceMetric::Minkowski { p }
            }
        };
        metric.is_valid().then_some(metric)
    }

    /// Minkowski order must be a finite positive number.
    pub fn is_valid(&self) -> bool {
        match self {
            DistanceMetric::Minkowski { p } => p.is_finite() && *p > 0.0,
            _ => true,
        }
    }

    /// Distance between two equally long vectors, computed at `T`.
    pub fn distance<T: Scalar>(&self, a: &[T], b: &[T]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match *self {
            DistanceMetric::Minkowski { p } => minkowski(a, b, p),
            DistanceMetric::Cosine => cosine(a, b),
            DistanceMetric::Chebyshev => chebyshev(a, b),
            DistanceMetric::Canberra => canberra(a, b),
            DistanceMetric::BrayCurtis => bray_curtis(a, b),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Minkowski { p } if *p == 2.0 => write!(f, "euclidean"),
            DistanceMetric::Minkowski { p } => write!(f, "minkowski:{p}"),
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::Chebyshev => write!(f, "chebyshev"),
            DistanceMetric::Canberra => write!(f, "canberra"),
            DistanceMetric::BrayCurtis => write!(f, "bray-curtis"),
        }
    }
}

// ============================================================================
// Kernels
// ============================================================================

fn minkowski<T: Scalar>(a: &[T], b: &[T], p: f64) -> f64 {
    if p == 2.0 {
        let mut sum = T::ZERO;
        for (&x, &y) in a.iter().zip(b) {
            let d = x - y;
            sum += d * d;
        }
        return sum.sqrt().to_f64();
    }
    if p == 1.0 {
        let mut sum = T::ZERO;
        for (&x, &y) in a.iter().zip(b) {
            sum += (x - y).abs();
        }
        return sum.to_f64();
    }
    let exp = T::from_f64(p);
    let mut sum = T::ZERO;
    for (&x, &y) in a.iter().zip(b) {
        sum += (x - y).abs().powf(exp);
    }
    sum.powf(T::ONE / exp).to_f64()
}

fn cosine<T: Scalar>(a: &[T], b: &[T]) -> f64 {
    let mut dot = T::ZERO;
    let mut norm_a = T::ZERO;
    let mut norm_b = T::ZERO;
    for (&x, &y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == T::ZERO || norm_b == T::ZERO {
        return 1.0;
    }
    (T::ONE - dot / (norm_a.sqrt() * norm_b.sqrt())).to_f64()
}

fn chebyshev<T: Scalar>(a: &[T], b: &[T]) -> f64 {
    a.iter()
        .zip(b)
        .fold(T::ZERO, |acc, (&x, &y)| acc.max((x - y).abs()))
        .to_f64()
}

fn canberra<T: Scalar>(a: &[T], b: &[T]) -> f64 {
    let mut sum = T::ZERO;
    for (&x, &y) in a.iter().zip(b) {
        let denom = x.abs() + y.abs();
        if denom != T::ZERO {
            sum += (x - y).abs() / denom;
        }
    }
    sum.to_f64()
}

fn bray_curtis<T: Scalar>(a: &[T], b: &[T]) -> f64 {
    let mut num = T::ZERO;
    let mut denom = T::ZERO;
    for (&x, &y) in a.iter().zip(b) {
        num += (x - y).abs();
        denom += (x + y).abs();
    }
    if denom == T::ZERO {
        return 0.0;
    }
    (num / denom).to_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: [f64; 3] = [1.0, 0.0, 2.0];
    const B: [f64; 3] = [0.0, 3.0, 2.0];

    #[test]
    fn euclidean_is_default() {
        assert_eq!(DistanceMetric::default(), DistanceMetric::EUCLIDEAN);
        let d = DistanceMetric::default().distance(&A, &B);
        assert!((d - 10f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn general_minkowski_matches_manhattan() {
        let m1 = DistanceMetric::Minkowski { p: 1.0 }.distance(&A, &B);
        let m3 = DistanceMetric::Minkowski { p: 3.0 }.distance(&A, &B);
        assert_eq!(m1, 4.0);
        assert!((m3 - 28f64.cbrt()).abs() < 1e-12);
    }

    #[test]
    fn cosine_against_zero_vector_is_one() {
        let zero = [0.0f32; 3];
        let a = [1.0f32, 2.0, 3.0];
        assert_eq!(DistanceMetric::Cosine.distance(&a, &zero), 1.0);
        assert!(DistanceMetric::Cosine.distance(&a, &a).abs() < 1e-6);
    }

    #[test]
    fn chebyshev_canberra_bray_curtis() {
        assert_eq!(DistanceMetric::Chebyshev.distance(&A, &B), 3.0);
        // |1|/1 + |3|/3 + 0/4
        assert_eq!(DistanceMetric::Canberra.distance(&A, &B), 2.0);
        // 4 / (1 + 3 + 4)
        assert_eq!(DistanceMetric::BrayCurtis.distance(&A, &B), 0.5);
        let zero = [0.0f64; 3];
        assert_eq!(DistanceMetric::BrayCurtis.distance(&zero, &zero), 0.0);
    }

    #[test]
    fn parse_names() {
        assert_eq!(DistanceMetric::parse("Euclidean"), Some(DistanceMetric::EUCLIDEAN));
        assert_eq!(
            DistanceMetric::parse("minkowski:1.5"),
            Some(DistanceMetric::Minkowski { p: 1.5 })
        );
        assert_eq!(DistanceMetric::parse("bray-curtis"), Some(DistanceMetric::BrayCurtis));
        assert_eq!(DistanceMetric::parse("minkowski:0"), None);
        assert_eq!(DistanceMetric::parse("manhattan"), None);
        assert_eq!(DistanceMetric::Minkowski { p: 3.0 }.to_string(), "minkowski:3");
    }
}
