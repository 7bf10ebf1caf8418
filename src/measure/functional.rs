//! Functional evenness and divergence (Villéger et al. 2008) and functional
//! dispersion (Laliberté & Legendre 2010).

use super::MeasureResult;
use crate::distance::{DistanceMetric, PairwiseDistances};

/// Regularity of abundance along the minimum spanning tree of the
/// categories. NaN below three categories or when every tree edge is zero.
pub fn functional_evenness(p: &[f64], d: &PairwiseDistances) -> MeasureResult {
    let n = p.len();
    if n < 3 {
        return MeasureResult::same(f64::NAN);
    }

    let weighted: Vec<f64> = minimum_spanning_tree(d)
        .into_iter()
        .map(|(a, b, dist)| dist / (p[a] + p[b]))
        .collect();
    let total: f64 = weighted.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return MeasureResult::same(f64::NAN);
    }

    let even = 1.0 / (n as f64 - 1.0);
    let upper: f64 = weighted.iter().map(|w| (w / total).min(even)).sum();
    MeasureResult::same((upper - even) / (1.0 - even))
}

/// Prim's algorithm over the dense distance matrix. Returns `n - 1` edges.
fn minimum_spanning_tree(d: &PairwiseDistances) -> Vec<(usize, usize, f64)> {
    let n = d.len();
    let mut in_tree = vec![false; n];
    // (best distance to the tree, tree endpoint)
    let mut best: Vec<(f64, usize)> = vec![(f64::INFINITY, 0); n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    if n == 0 {
        return edges;
    }
    in_tree[0] = true;
    for j in 1..n {
        best[j] = (d.get(0, j), 0);
    }

    for _ in 1..n {
        let next = (0..n)
            .filter(|&j| !in_tree[j])
            .min_by(|&a, &b| best[a].0.total_cmp(&best[b].0));
        let Some(j) = next else { break };
        in_tree[j] = true;
        edges.push((best[j].1, j, best[j].0));
        for k in 0..n {
            if !in_tree[k] {
                let dist = d.get(j, k);
                if dist < best[k].0 {
                    best[k] = (dist, j);
                }
            }
        }
    }
    edges
}

/// Categories that have an embedding, with weights renormalized to sum to 1,
/// and their abundance-weighted centroid. `None` when nothing resolves.
fn weighted_centroid<'v>(p: &[f64], vectors: &'v [Option<Vec<f64>>]) -> Option<(Vec<(f64, &'v [f64])>, Vec<f64>)> {
    let mut resolved: Vec<(f64, &[f64])> = p
        .iter()
        .zip(vectors)
        .filter_map(|(&w, v)| v.as_deref().map(|v| (w, v)))
        .collect();
    let weight: f64 = resolved.iter().map(|(w, _)| w).sum();
    let dims = resolved.first()?.1.len();
    if weight <= 0.0 {
        return None;
    }
    for (w, _) in &mut resolved {
        *w /= weight;
    }

    let mut centroid = vec![0.0; dims];
    for (w, v) in &resolved {
        for (c, x) in centroid.iter_mut().zip(v.iter()) {
            *c += w * x;
        }
    }
    Some((resolved, centroid))
}

/// Abundance-weighted mean distance to the abundance-weighted centroid.
///
/// Only categories with an embedding take part; their weights are
/// renormalized. `None` when no category has an embedding.
pub fn functional_dispersion(
    p: &[f64],
    vectors: &[Option<Vec<f64>>],
    metric: &DistanceMetric,
) -> Option<MeasureResult> {
    let (resolved, centroid) = weighted_centroid(p, vectors)?;
    let spread: f64 = resolved.iter().map(|(w, v)| w * metric.distance::<f64>(v, &centroid)).sum();
    Some(MeasureResult::same(spread))
}

/// Functional divergence (Villéger et al. 2008), taken around the
/// abundance-weighted centroid of every resolved category rather than the
/// convex-hull vertices.
///
/// `(Δd + d̄) / (Δ|d| + d̄)` where `d̄` is the mean distance to the centroid
/// and `Δd`, `Δ|d|` are the abundance-weighted signed and absolute
/// deviations from it. Lies in `[0, 1]`; NaN when every category sits on
/// the centroid. `None` when no category has an embedding.
pub fn functional_divergence(
    p: &[f64],
    vectors: &[Option<Vec<f64>>],
    metric: &DistanceMetric,
) -> Option<MeasureResult> {
    let (resolved, centroid) = weighted_centroid(p, vectors)?;
    let dist: Vec<f64> = resolved.iter().map(|(_, v)| metric.distance::<f64>(v, &centroid)).collect();
    let mean = dist.iter().sum::<f64>() / dist.len() as f64;

    let (mut signed, mut absolute) = (0.0, 0.0);
    for ((w, _), d) in resolved.iter().zip(&dist) {
        signed += w * (d - mean);
        absolute += w * (d - mean).abs();
    }

    let denom = absolute + mean;
    let value = if denom == 0.0 { f64::NAN } else { (signed + mean) / denom };
    Some(MeasureResult::same(value))
}
