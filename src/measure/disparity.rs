//! Disparity family: measures that weigh categories by how far apart they are.
//!
//! All functions read one [`PairwiseDistances`] built for the current call.
//! Asymmetric input is read as `d(i, j)` for the ordered pair visited.

use std::cmp::Ordering;
use std::f64::consts::PI;

use hashbrown::HashMap;

use super::MeasureResult;
use crate::distance::PairwiseDistances;

/// Mean distance over unordered pairs `i < j`. NaN below two categories.
pub fn pairwise(d: &PairwiseDistances) -> MeasureResult {
    let n = d.len();
    if n < 2 {
        return MeasureResult::same(f64::NAN);
    }
    let mut sum = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += d.get(i, j);
        }
    }
    let pairs = (n * (n - 1) / 2) as f64;
    MeasureResult::same(sum / pairs)
}

/// `Σ_{i≠j} d^α (pᵢpⱼ)^β`. A zero order drops its factor instead of
/// evaluating `0^0`.
pub fn stirling(p: &[f64], d: &PairwiseDistances, alpha: f64, beta: f64) -> MeasureResult {
    let mut sum = 0.0;
    for (i, &pi) in p.iter().enumerate() {
        for (j, &pj) in p.iter().enumerate() {
            if i == j {
                continue;
            }
            let dist = if alpha == 0.0 { 1.0 } else { d.get(i, j).powf(alpha) };
            let weight = if beta == 0.0 { 1.0 } else { (pi * pj).powf(beta) };
            sum += dist * weight;
        }
    }
    MeasureResult::same(sum)
}

/// Ricotta & Szeidl (2006). Categories whose term is undefined (a negative
/// base under a fractional power) are skipped.
pub fn ricotta_szeidl(p: &[f64], d: &PairwiseDistances, alpha: f64) -> MeasureResult {
    let mut acc = 0.0;
    for (i, &pi) in p.iter().enumerate() {
        let mut remaining = 1.0;
        for (j, &pj) in p.iter().enumerate() {
            if i != j {
                remaining -= d.get(i, j) * pj;
            }
        }
        let term = if alpha == 1.0 { pi * remaining.ln() } else { pi * remaining.powf(alpha - 1.0) };
        if !term.is_nan() {
            acc += term;
        }
    }
    let value = if alpha == 1.0 { -acc } else { (1.0 - acc) / (alpha - 1.0) };
    MeasureResult::same(value)
}

/// Chao et al. (2014) functional diversity of order `alpha`, with Rao's Q
/// normalization. Returns `(FD, √(FD/Q))`; `(0, 1)` when Q is zero.
pub fn chao_functional(p: &[f64], d: &PairwiseDistances, alpha: f64) -> MeasureResult {
    let n = p.len();
    let mut rao_q = 0.0;
    for i in 0..n {
        for j in 0..n {
            rao_q += d.get(i, j) * p[i] * p[j];
        }
    }
    if rao_q == 0.0 {
        return MeasureResult::new(0.0, 1.0);
    }

    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            let ratio = p[i] * p[j] / rao_q;
            if ratio <= 0.0 {
                continue;
            }
            let dist = d.get(i, j);
            sum += if alpha == 1.0 { dist * ratio * ratio.ln() } else { dist * ratio.powf(alpha) };
        }
    }
    let fd = if alpha == 1.0 { (-sum).exp() } else { sum.powf(1.0 / (1.0 - alpha)) };
    MeasureResult::new(fd, (fd / rao_q).sqrt())
}

/// Leinster & Cobbold (2012) similarity-sensitive diversity with
/// `Z = exp(-u·d)`. Returns `(ln D, D)`.
pub fn leinster_cobbold(p: &[f64], d: &PairwiseDistances, alpha: f64, u: f64) -> MeasureResult {
    let zp: Vec<f64> = (0..p.len())
        .map(|i| p.iter().enumerate().map(|(j, &pj)| pj * (-u * d.get(i, j)).exp()).sum())
        .collect();

    let ln_d = if alpha == 1.0 {
        -p.iter().zip(&zp).filter(|&(&pi, _)| pi > 0.0).map(|(&pi, &z)| pi * z.ln()).sum::<f64>()
    } else {
        let sum: f64 = p
            .iter()
            .zip(&zp)
            .filter(|&(&pi, _)| pi > 0.0)
            .map(|(&pi, &z)| pi * z.powf(alpha - 1.0))
            .sum();
        sum.ln() / (1.0 - alpha)
    };
    MeasureResult::new(ln_d, ln_d.exp())
}

/// Scheiner (2012): Hill number of abundances weighted by the volume
/// `c_m·dmin^m` each category occupies in `m` dimensions, where `dmin` is its
/// nearest-neighbour distance. `c_m` is common to every category and cancels
/// in the normalized weights, so only `ln n + m·ln dmin` is formed.
/// Returns `(ln D, D)`.
pub fn scheiner(counts: &[u64], d: &PairwiseDistances, alpha: f64, dims: usize) -> MeasureResult {
    let nan = MeasureResult::new(f64::NAN, f64::NAN);
    let n = counts.len();
    if n < 2 {
        return nan;
    }
    let m = dims.max(1) as f64;

    let ln_w: Vec<f64> = (0..n)
        .map(|i| {
            let dmin = (0..n)
                .filter(|&j| j != i)
                .map(|j| d.get(i, j))
                .filter(|x| !x.is_nan())
                .fold(f64::INFINITY, f64::min);
            (counts[i] as f64).ln() + m * dmin.max(0.0).ln()
        })
        .collect();

    let max = ln_w.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return nan;
    }
    let lse = max + ln_w.iter().map(|&w| (w - max).exp()).sum::<f64>().ln();
    let q: Vec<f64> = ln_w.iter().map(|&w| (w - lse).exp()).filter(|&x| x > 0.0).collect();

    let ln_d = if alpha == 1.0 {
        -q.iter().map(|&x| x * x.ln()).sum::<f64>()
    } else if alpha == 0.0 {
        (q.len() as f64).ln()
    } else {
        q.iter().map(|&x| x.powf(alpha)).sum::<f64>().ln() / (1.0 - alpha)
    };
    MeasureResult::new(ln_d, ln_d.exp())
}

/// Weitzman (1992) diversity: `V(S) = d(i, j) + max(V(S∖{j}), V(S∖{i}))`
/// where `(i, j)` is the closest pair in `S`, and `V` of fewer than two
/// categories is zero. Subsets are memoized but the recursion can still visit
/// exponentially many of them, so this is meant for small graphs. NaN
/// distances are never chosen as the closest pair.
pub fn weitzman(d: &PairwiseDistances) -> MeasureResult {
    let members: Vec<usize> = (0..d.len()).collect();
    let mut memo = HashMap::new();
    MeasureResult::same(weitzman_subset(d, &members, &mut memo))
}

fn weitzman_subset(d: &PairwiseDistances, members: &[usize], memo: &mut HashMap<Vec<usize>, f64>) -> f64 {
    if members.len() < 2 {
        return 0.0;
    }
    if let Some(&v) = memo.get(members) {
        return v;
    }

    let mut closest: Option<(f64, usize, usize)> = None;
    for a in 0..members.len() {
        for b in (a + 1)..members.len() {
            let x = d.get(members[a], members[b]);
            if !x.is_nan() && closest.is_none_or(|(best, _, _)| x < best) {
                closest = Some((x, a, b));
            }
        }
    }
    let value = match closest {
        Some((dist, a, b)) => {
            let without = |skip: usize| -> Vec<usize> {
                members.iter().enumerate().filter(|&(k, _)| k != skip).map(|(_, &m)| m).collect()
            };
            let keep_first = weitzman_subset(d, &without(b), memo);
            let keep_second = weitzman_subset(d, &without(a), memo);
            dist + keep_first.max(keep_second)
        }
        None => 0.0,
    };
    memo.insert(members.to_vec(), value);
    value
}

/// Lexicographic disparity with its hybrid-Scheiner companion.
///
/// Each round ranks the remaining categories by their sorted distances to
/// the others and retires the lexicographically smallest one (the earliest on
/// ties), adding its nearest-neighbour distance `dmin` to the value and the
/// ball volume `c_m·dmin^m` to the hybrid. Rounds stop when one category is
/// left. Returns `(Σ dmin, Σ c_m·dmin^m)` with `m = max(dims, 1)`.
pub fn lexicographic(d: &PairwiseDistances, dims: usize) -> MeasureResult {
    let m = dims.max(1);
    let c_m = unit_ball_volume(m);
    let mut active: Vec<usize> = (0..d.len()).collect();
    let (mut value, mut hybrid) = (0.0, 0.0);

    while active.len() >= 2 {
        let profiles: Vec<Vec<f64>> = active
            .iter()
            .map(|&i| {
                let mut row: Vec<f64> = active.iter().filter(|&&j| j != i).map(|&j| d.get(i, j)).collect();
                row.sort_by(f64::total_cmp);
                row
            })
            .collect();

        let mut champion = 0;
        for k in 1..profiles.len() {
            if lexicographically_less(&profiles[k], &profiles[champion]) {
                champion = k;
            }
        }
        let dmin = profiles[champion][0];
        value += dmin;
        hybrid += c_m * dmin.powf(m as f64);
        active.remove(champion);
    }
    MeasureResult::new(value, hybrid)
}

fn lexicographically_less(a: &[f64], b: &[f64]) -> bool {
    a.iter().zip(b).map(|(x, y)| x.total_cmp(y)).find(|o| o.is_ne()) == Some(Ordering::Less)
}

/// Volume of the unit ball in `m` dimensions.
fn unit_ball_volume(m: usize) -> f64 {
    let (mut even, mut odd) = (1.0, 2.0);
    for k in 2..=m {
        let v = (if k % 2 == 0 { even } else { odd }) * 2.0 * PI / k as f64;
        if k % 2 == 0 {
            even = v;
        } else {
            odd = v;
        }
    }
    if m % 2 == 0 { even } else { odd }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize, dist: f64) -> PairwiseDistances {
        let data = (0..n * n).map(|k| if k / n == k % n { 0.0 } else { dist }).collect();
        PairwiseDistances::from_vec(n, data).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn pairwise_mean_and_small_graphs() {
        let d = PairwiseDistances::from_vec(3, vec![0.0, 1.0, 2.0, 1.0, 0.0, 3.0, 2.0, 3.0, 0.0]).unwrap();
        assert!(close(pairwise(&d).value, 2.0));
        assert!(pairwise(&uniform(1, 1.0)).value.is_nan());
    }

    #[test]
    fn stirling_orders_and_zero_powers() {
        let p = [0.5, 0.5];
        let d = uniform(2, 0.0);
        // alpha = 0 means the zero distance contributes 1, not 0^0
        assert!(close(stirling(&p, &d, 0.0, 1.0).value, 0.5));
        assert!(close(stirling(&p, &d, 1.0, 1.0).value, 0.0));
        assert!(close(stirling(&p, &uniform(2, 1.0), 1.0, 0.0).value, 2.0));
        // Rao's Q
        assert!(close(stirling(&p, &uniform(2, 0.8), 1.0, 1.0).value, 0.4));
    }

    #[test]
    fn ricotta_szeidl_limit_is_continuous() {
        let p = [0.5, 0.3, 0.2];
        let d = uniform(3, 0.4);
        let at_one = ricotta_szeidl(&p, &d, 1.0).value;
        let near = ricotta_szeidl(&p, &d, 1.0 + 1e-7).value;
        assert!(at_one.is_finite());
        assert!((at_one - near).abs() < 1e-5);
        // alpha = 2 reduces to Rao's Q
        let rao = stirling(&p, &d, 1.0, 1.0).value;
        assert!(close(ricotta_szeidl(&p, &d, 2.0).value, rao));
    }

    #[test]
    fn chao_zero_rao_q() {
        let r = chao_functional(&[0.5, 0.5], &uniform(2, 0.0), 2.0);
        assert_eq!((r.value, r.transformed), (0.0, 1.0));
    }

    #[test]
    fn chao_order_two_of_even_pair() {
        // Q = 0.5, ratios 0.5 off-diagonal: FD = (2 · 1 · 0.25)^-1 = 2
        let r = chao_functional(&[0.5, 0.5], &uniform(2, 1.0), 2.0);
        assert!(close(r.value, 2.0));
        assert!(close(r.transformed, 2.0));
        let limit = chao_functional(&[0.5, 0.5], &uniform(2, 1.0), 1.0);
        let near = chao_functional(&[0.5, 0.5], &uniform(2, 1.0), 1.0 + 1e-7);
        assert!((limit.value - near.value).abs() < 1e-5);
    }

    #[test]
    fn leinster_cobbold_reduces_to_hill_for_distinct_categories() {
        let p = [0.5, 0.3, 0.2];
        let d = uniform(3, 1e6);
        let lc = leinster_cobbold(&p, &d, 2.0, 1.0);
        let hill2 = 1.0 / p.iter().map(|x| x * x).sum::<f64>();
        assert!(close(lc.transformed, hill2));
        let lc1 = leinster_cobbold(&p, &d, 1.0, 1.0);
        assert!(close(lc1.value, crate::measure::entropy::shannon(&p)));
        // identical categories collapse to one effective category
        assert!(close(leinster_cobbold(&p, &uniform(3, 0.0), 2.0, 1.0).transformed, 1.0));
    }

    #[test]
    fn scheiner_edge_cases() {
        let d = uniform(3, 0.5);
        // equal volumes and counts: three effective categories at every order
        for alpha in [0.0, 1.0, 2.0] {
            assert!(close(scheiner(&[2, 2, 2], &d, alpha, 4).transformed, 3.0));
        }
        assert!(scheiner(&[2, 2], &uniform(2, 0.0), 1.0, 3).value.is_nan());
        assert!(scheiner(&[5], &uniform(1, 0.0), 1.0, 3).value.is_nan());
    }

    #[test]
    fn scheiner_survives_large_dimensionality() {
        let d = PairwiseDistances::from_vec(2, vec![0.0, 1e-3, 1e-3, 0.0]).unwrap();
        let r = scheiner(&[1, 3], &d, 2.0, 300);
        assert!(r.transformed.is_finite());
        // weights follow the counts when volumes are equal
        assert!(close(r.transformed, 1.0 / (0.25f64.powi(2) + 0.75f64.powi(2))));
    }

    fn line(points: &[f64]) -> PairwiseDistances {
        let n = points.len();
        let data = (0..n * n).map(|k| (points[k / n] - points[k % n]).abs()).collect();
        PairwiseDistances::from_vec(n, data).unwrap()
    }

    #[test]
    fn weitzman_follows_closest_pair_recursion() {
        // closest pair (0, 1) at 1, then the better survivor pair spans 3
        assert!(close(weitzman(&line(&[0.0, 1.0, 3.0])).value, 4.0));
        // equidistant categories add one link per extra category
        assert!(close(weitzman(&uniform(4, 1.0)).value, 3.0));
        assert_eq!(weitzman(&uniform(1, 1.0)), MeasureResult::same(0.0));
        assert_eq!(weitzman(&uniform(0, 1.0)), MeasureResult::same(0.0));
    }

    #[test]
    fn weitzman_skips_nan_pairs() {
        let mut data = vec![0.0; 9];
        for (i, j, x) in [(0, 1, f64::NAN), (0, 2, 2.0), (1, 2, 5.0)] {
            data[i * 3 + j] = x;
            data[j * 3 + i] = x;
        }
        let d = PairwiseDistances::from_vec(3, data).unwrap();
        // closest is (0, 2); V({0, 1}) has no usable pair, V({1, 2}) = 5
        assert!(close(weitzman(&d).value, 7.0));
    }

    #[test]
    fn lexicographic_retires_most_redundant_first() {
        let d = line(&[0.0, 1.0, 3.0]);
        // node 1 goes first with dmin 1, then the remaining pair is 3 apart
        let r = lexicographic(&d, 1);
        assert!(close(r.value, 4.0));
        assert!(close(r.transformed, 2.0 * 1.0 + 2.0 * 3.0));
        assert!(close(lexicographic(&d, 2).transformed, PI * (1.0 + 9.0)));
        // zero dimensions are read as one
        assert!(close(lexicographic(&d, 0).transformed, 8.0));
    }

    #[test]
    fn lexicographic_edge_cases() {
        let r = lexicographic(&uniform(4, 1.0), 3);
        assert!(close(r.value, 3.0));
        assert!(close(r.transformed, 3.0 * 4.0 * PI / 3.0));
        assert_eq!(lexicographic(&uniform(1, 1.0), 2), MeasureResult::new(0.0, 0.0));
    }

    #[test]
    fn unit_ball_volumes() {
        assert!(close(unit_ball_volume(0), 1.0));
        assert!(close(unit_ball_volume(1), 2.0));
        assert!(close(unit_ball_volume(2), PI));
        assert!(close(unit_ball_volume(3), 4.0 * PI / 3.0));
        assert!(close(unit_ball_volume(4), PI * PI / 2.0));
    }
}
