//! Entropy family. Every `Σ p ln p` term skips `p <= 0`.

use super::MeasureResult;

// ============================================================================
// Shared pieces
// ============================================================================

/// Shannon entropy in nats.
pub fn shannon(p: &[f64]) -> f64 {
    -p.iter().filter(|&&x| x > 0.0).map(|&x| x * x.ln()).sum::<f64>()
}

/// Hill number of order `alpha` (effective number of categories).
pub fn hill_number(p: &[f64], alpha: f64) -> f64 {
    if alpha == 1.0 {
        return shannon(p).exp();
    }
    if alpha == 0.0 {
        return p.iter().filter(|&&x| x > 0.0).count() as f64;
    }
    power_sum(p, alpha).powf(1.0 / (1.0 - alpha))
}

/// `Σ p^a` over positive proportions.
pub(crate) fn power_sum(p: &[f64], a: f64) -> f64 {
    p.iter().filter(|&&x| x > 0.0).map(|&x| x.powf(a)).sum()
}

/// `ln n!`, exact summation for small `n`, Stirling series above.
pub fn ln_factorial(n: u64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    if n <= 256 {
        return (2..=n).map(|k| (k as f64).ln()).sum();
    }
    let x = n as f64;
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    x * x.ln() - x + 0.5 * (2.0 * std::f64::consts::PI * x).ln()
        + inv * (1.0 / 12.0 - inv2 * (1.0 / 360.0 - inv2 / 1260.0))
}

// ============================================================================
// Measures
// ============================================================================

pub fn shannon_weaver(p: &[f64]) -> MeasureResult {
    let h = shannon(p);
    MeasureResult::new(h, h.exp())
}

/// Tsallis form with `ln_q(x) = (x^(1-q) - 1) / (1 - q)`.
pub fn q_logarithmic(p: &[f64], q: f64) -> MeasureResult {
    if q == 1.0 {
        return shannon_weaver(p);
    }
    let h: f64 = p
        .iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| x * ((1.0 / x).powf(1.0 - q) - 1.0) / (1.0 - q))
        .sum();
    MeasureResult::new(h, (1.0 - (q - 1.0) * h).powf(1.0 / (1.0 - q)))
}

pub fn patil_taillie(p: &[f64], alpha: f64) -> MeasureResult {
    if alpha == 0.0 {
        return shannon_weaver(p);
    }
    let h = (1.0 - power_sum(p, alpha + 1.0)) / alpha;
    MeasureResult::new(h, (1.0 - alpha * h).powf(-1.0 / alpha))
}

pub fn renyi(p: &[f64], alpha: f64) -> MeasureResult {
    if alpha == 1.0 {
        return shannon_weaver(p);
    }
    let h = power_sum(p, alpha).ln() / (1.0 - alpha);
    MeasureResult::new(h, h.exp())
}

pub fn good(p: &[f64], alpha: f64, beta: f64) -> MeasureResult {
    let value: f64 = p
        .iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| {
            let info = if beta == 0.0 { 1.0 } else { (-x.ln()).max(0.0).powf(beta) };
            x.powf(alpha) * info
        })
        .sum();
    MeasureResult::new(value, value.exp())
}

/// `(ln N! - Σ ln nᵢ!) / N` over absolute counts summing to `total`.
pub fn brillouin(counts: &[u64], total: u64) -> MeasureResult {
    let value = (ln_factorial(total) - counts.iter().map(|&n| ln_factorial(n)).sum::<f64>()) / total as f64;
    MeasureResult::new(value, value.exp())
}
