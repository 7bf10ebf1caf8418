//! Dominance, evenness and richness indices.
//!
//! Indices normalized by `S - 1`, `ln S` or `1 - 1/S` return NaN at
//! richness 1, where the normalizer is zero.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use super::MeasureResult;
use super::entropy::{hill_number, shannon};

/// Simpson's `D = Σ p²`.
pub fn simpson_d(p: &[f64]) -> f64 {
    p.iter().map(|x| x * x).sum()
}

fn richness_of(p: &[f64]) -> f64 {
    p.len() as f64
}

// ============================================================================
// Dominance
// ============================================================================

pub fn simpson_dominance(p: &[f64]) -> MeasureResult {
    let d = simpson_d(p);
    MeasureResult::new(d, 1.0 / d)
}

pub fn simpson(p: &[f64]) -> MeasureResult {
    let d = simpson_d(p);
    MeasureResult::new(1.0 - d, 1.0 / d)
}

pub fn berger_parker(p: &[f64]) -> MeasureResult {
    let max = p.iter().copied().fold(0.0, f64::max);
    MeasureResult::new(max, 1.0 / max)
}

pub fn junge1994(p: &[f64]) -> MeasureResult {
    let d = simpson_d(p);
    MeasureResult::new(1.0 - d.sqrt(), 1.0 / d)
}

/// `(N - √Σnᵢ²) / (N - √N)` over absolute counts.
pub fn mcintosh(counts: &[u64], total: u64, p: &[f64]) -> MeasureResult {
    let n = total as f64;
    let u = counts.iter().map(|&c| (c as f64) * (c as f64)).sum::<f64>().sqrt();
    let denom = n - n.sqrt();
    let value = if denom == 0.0 { f64::NAN } else { (n - u) / denom };
    MeasureResult::new(value, 1.0 / simpson_d(p))
}

// ============================================================================
// Richness
// ============================================================================

pub fn richness(p: &[f64]) -> MeasureResult {
    MeasureResult::same(richness_of(p))
}

pub fn species_count(p: &[f64]) -> MeasureResult {
    MeasureResult::same(richness_of(p) - 1.0)
}

/// Distinct categories per token.
pub fn type_token_ratio(counts: &[u64], total: u64) -> MeasureResult {
    MeasureResult::same(counts.len() as f64 / total as f64)
}

// ============================================================================
// Evenness
// ============================================================================

pub fn hill_evenness(p: &[f64], alpha: f64, beta: f64) -> MeasureResult {
    MeasureResult::same(hill_number(p, alpha) / hill_number(p, beta))
}

pub fn shannon_evenness(p: &[f64]) -> MeasureResult {
    let s = richness_of(p);
    MeasureResult::same(undefined_at_one(s, || shannon(p) / s.ln()))
}

pub fn e_heip(p: &[f64]) -> MeasureResult {
    let s = richness_of(p);
    MeasureResult::same(undefined_at_one(s, || (shannon(p).exp() - 1.0) / (s - 1.0)))
}

pub fn one_minus_d(p: &[f64]) -> MeasureResult {
    let s = richness_of(p);
    MeasureResult::same(undefined_at_one(s, || (1.0 - simpson_d(p)) / (1.0 - 1.0 / s)))
}

pub fn one_over_d_williams1964(p: &[f64]) -> MeasureResult {
    MeasureResult::same((1.0 / simpson_d(p)) / richness_of(p))
}

pub fn e_minus_ln_d_pielou1977(p: &[f64]) -> MeasureResult {
    let s = richness_of(p);
    MeasureResult::same(undefined_at_one(s, || -simpson_d(p).ln() / s.ln()))
}

fn f_2_1(p: &[f64]) -> f64 {
    let s = richness_of(p);
    undefined_at_one(s, || (1.0 / simpson_d(p) - 1.0) / (shannon(p).exp() - 1.0))
}

pub fn f_2_1_alatalo1981(p: &[f64]) -> MeasureResult {
    MeasureResult::same(f_2_1(p))
}

pub fn g_2_1_molinari1989(p: &[f64]) -> MeasureResult {
    let f = f_2_1(p);
    let g = if f > FRAC_1_SQRT_2 { f * 0.636611 * f.min(1.0).asin() } else { f * f * f };
    MeasureResult::same(g)
}

fn o_bulla(p: &[f64]) -> f64 {
    let even = 1.0 / richness_of(p);
    p.iter().map(|&x| x.min(even)).sum()
}

pub fn o_bulla1994(p: &[f64]) -> MeasureResult {
    MeasureResult::same(o_bulla(p))
}

pub fn e_bulla1994(p: &[f64]) -> MeasureResult {
    let s = richness_of(p);
    MeasureResult::same(undefined_at_one(s, || (o_bulla(p) - 1.0 / s) / (1.0 - 1.0 / s)))
}

pub fn e_mci_pielou1969(p: &[f64]) -> MeasureResult {
    let s = richness_of(p);
    MeasureResult::same(undefined_at_one(s, || (1.0 - simpson_d(p).sqrt()) / (1.0 - 1.0 / s.sqrt())))
}

pub fn e_prime_camargo1993(p: &[f64]) -> MeasureResult {
    let s = richness_of(p);
    let mut sum = 0.0;
    for (i, &a) in p.iter().enumerate() {
        for &b in &p[i + 1..] {
            sum += (a - b).abs() / s;
        }
    }
    MeasureResult::same(1.0 - sum)
}

pub fn e_var_smith_and_wilson1996(p: &[f64]) -> MeasureResult {
    let logs: Vec<f64> = p.iter().map(|x| x.ln()).collect();
    let s = richness_of(p);
    let mean = logs.iter().sum::<f64>() / s;
    let var = logs.iter().map(|l| (l - mean) * (l - mean)).sum::<f64>() / s;
    MeasureResult::same(1.0 - (2.0 / PI) * var.atan())
}

// ============================================================================
// Rank/abundance fits (NHC, E_Q)
// ============================================================================

const FIT_ROUNDS: u32 = 8;
const FIT_STEPS: u32 = 32;
const FIT_SHRINK: f64 = 10.0;
const FIT_WIDTH: f64 = 100.0;

/// Least-squares slope of `y ≈ b·x` by a refined grid search over `[lo, hi]`.
/// Each round samples the window evenly and recentres a window ten times
/// narrower on the best sample.
fn refined_slope(points: &[(f64, f64)], mut lo: f64, mut hi: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let mut width = FIT_WIDTH;
    let mut best = 0.0;
    for _ in 0..FIT_ROUNDS {
        let mut least = f64::INFINITY;
        for step in 0..FIT_STEPS {
            let b = lo + (hi - lo) * (step as f64 / (FIT_STEPS - 1) as f64);
            let mse: f64 = points.iter().map(|&(x, y)| (y - b * x).powi(2)).sum();
            if step == 0 || mse < least {
                least = mse;
                best = b;
            }
        }
        width /= FIT_SHRINK;
        lo = best - width / 2.0;
        hi = best + width / 2.0;
    }
    best
}

/// Abundances sorted descending, paired with 1-based ranks.
fn ranked_log_abundance(counts: &[u64]) -> Vec<(f64, f64)> {
    let mut sorted = counts.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, c)| ((i + 1) as f64, (c as f64).ln()))
        .collect()
}

/// Slope of `ln(nᵣ) / r ≈ b·r` over the rank/abundance curve.
pub fn nhc(counts: &[u64]) -> MeasureResult {
    let points: Vec<(f64, f64)> = ranked_log_abundance(counts)
        .into_iter()
        .map(|(rank, ln_n)| (rank, ln_n / rank))
        .collect();
    MeasureResult::same(refined_slope(&points, -FIT_WIDTH, 0.0))
}

/// `-(2/π) atan(b')` where `(r/S) / ln(nᵣ) ≈ b'·r`. Ranks with `ln(nᵣ) = 0`
/// carry no information and are left out of the fit.
pub fn e_q(counts: &[u64]) -> MeasureResult {
    let s = counts.len() as f64;
    let points: Vec<(f64, f64)> = ranked_log_abundance(counts)
        .into_iter()
        .filter(|&(_, ln_n)| ln_n != 0.0)
        .map(|(rank, ln_n)| (rank, (rank / s) / ln_n))
        .collect();
    let b = refined_slope(&points, -FIT_WIDTH, FIT_WIDTH);
    MeasureResult::same(-(2.0 / PI) * b.atan())
}

fn undefined_at_one(s: f64, f: impl FnOnce() -> f64) -> f64 {
    if s <= 1.0 { f64::NAN } else { f() }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVEN4: [f64; 4] = [0.25; 4];
    const SKEW: [f64; 3] = [0.6, 0.3, 0.1];

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn perfectly_even_population_scores_one() {
        for r in [
            shannon_evenness(&EVEN4),
            e_heip(&EVEN4),
            one_minus_d(&EVEN4),
            one_over_d_williams1964(&EVEN4),
            e_minus_ln_d_pielou1977(&EVEN4),
            f_2_1_alatalo1981(&EVEN4),
            o_bulla1994(&EVEN4),
            e_bulla1994(&EVEN4),
            e_mci_pielou1969(&EVEN4),
            e_prime_camargo1993(&EVEN4),
            e_var_smith_and_wilson1996(&EVEN4),
            hill_evenness(&EVEN4, 2.0, 1.0),
        ] {
            assert!(close(r.value, 1.0), "{r:?}");
        }
    }

    #[test]
    fn dominance_transforms() {
        let d = 0.36 + 0.09 + 0.01;
        assert!(close(simpson_dominance(&SKEW).value, d));
        assert!(close(simpson(&SKEW).value, 1.0 - d));
        assert!(close(simpson(&SKEW).transformed, 1.0 / d));
        assert!(close(junge1994(&SKEW).value, 1.0 - d.sqrt()));
        let bp = berger_parker(&SKEW);
        assert_eq!(bp.value, 0.6);
        assert!(close(bp.transformed, 1.0 / 0.6));
    }

    #[test]
    fn richness_family() {
        assert_eq!(richness(&SKEW).value, 3.0);
        assert_eq!(species_count(&SKEW).value, 2.0);
        assert_eq!(type_token_ratio(&[6, 3, 1], 10).value, 0.3);
    }

    #[test]
    fn mcintosh_standard_form() {
        // N = 4, U = √8
        let r = mcintosh(&[2, 2], 4, &[0.5, 0.5]);
        assert!(close(r.value, (4.0 - 8f64.sqrt()) / 2.0));
        assert!(close(r.transformed, 2.0));
        assert!(mcintosh(&[1], 1, &[1.0]).value.is_nan());
    }

    #[test]
    fn normalized_indices_are_nan_at_richness_one() {
        let one = [1.0];
        assert!(shannon_evenness(&one).value.is_nan());
        assert!(e_heip(&one).value.is_nan());
        assert!(one_minus_d(&one).value.is_nan());
        assert!(e_minus_ln_d_pielou1977(&one).value.is_nan());
        assert!(f_2_1_alatalo1981(&one).value.is_nan());
        assert!(e_bulla1994(&one).value.is_nan());
        assert!(e_mci_pielou1969(&one).value.is_nan());
        assert!(!one_over_d_williams1964(&one).value.is_nan());
    }

    #[test]
    fn molinari_branches() {
        let r = g_2_1_molinari1989(&EVEN4);
        assert!((r.value - 0.636611 * (1.0f64).asin()).abs() < 1e-6);
        let skewed = [0.97, 0.01, 0.01, 0.01];
        let f = f_2_1(&skewed);
        assert!(f < FRAC_1_SQRT_2);
        assert!(close(g_2_1_molinari1989(&skewed).value, f.powi(3)));
    }

    #[test]
    fn grid_search_recovers_exact_slope() {
        let points: Vec<(f64, f64)> = (1..=5).map(|x| (x as f64, -0.5 * x as f64)).collect();
        assert!((refined_slope(&points, -100.0, 0.0) + 0.5).abs() < 1e-3);
        assert_eq!(refined_slope(&[], -1.0, 1.0), 0.0);
    }

    #[test]
    fn nhc_and_e_q_are_finite_on_two_nodes() {
        assert!(nhc(&[4, 4]).value.is_finite());
        assert!(e_q(&[4, 4]).value.is_finite());
        assert_eq!(e_q(&[1, 1]).value, 0.0);
    }
}
