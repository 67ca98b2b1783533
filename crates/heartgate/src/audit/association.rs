//! Pairwise association measures, each scaled to [0, 1].
//!
//! | pair                      | measure                        |
//! |---------------------------|--------------------------------|
//! | numeric / numeric         | absolute Spearman rank rho     |
//! | categorical / categorical | bias-corrected Cramér's V      |
//! | numeric / categorical     | correlation ratio (eta)        |
//!
//! Degenerate inputs (fewer than two rows, a constant column) score 0.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which measure produced a pairwise score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationMethod {
    Spearman,
    CramersV,
    CorrelationRatio,
}

/// Average ranks (1-based), ties sharing the mean of their positions.
pub fn compute_ranks(values: &[f64]) -> Vec<f64> {
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < indexed.len() {
        let mut j = i;
        while j < indexed.len() && indexed[j].1 == indexed[i].1 {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 0.5;
        for item in &indexed[i..j] {
            ranks[item.0] = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Pearson correlation; 0 when either side has no variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }

    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        0.0
    } else {
        cov / (var_x * var_y).sqrt()
    }
}

/// Absolute Spearman rank correlation.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    clamp_unit(pearson(&compute_ranks(x), &compute_ranks(y)).abs())
}

/// Bias-corrected Cramér's V between two coded categorical columns.
pub fn cramers_v(x: &[usize], y: &[usize]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }

    let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
    let mut x_counts: HashMap<usize, usize> = HashMap::new();
    let mut y_counts: HashMap<usize, usize> = HashMap::new();
    for (&a, &b) in x[..n].iter().zip(&y[..n]) {
        *joint.entry((a, b)).or_insert(0) += 1;
        *x_counts.entry(a).or_insert(0) += 1;
        *y_counts.entry(b).or_insert(0) += 1;
    }

    let total = n as f64;
    let mut chi2 = 0.0;
    for (&a, &ca) in &x_counts {
        for (&b, &cb) in &y_counts {
            let expected = ca as f64 * cb as f64 / total;
            let observed = joint.get(&(a, b)).copied().unwrap_or(0) as f64;
            chi2 += (observed - expected).powi(2) / expected;
        }
    }

    let r = x_counts.len() as f64;
    let k = y_counts.len() as f64;
    let phi2 = chi2 / total;
    let phi2_corr = (phi2 - (k - 1.0) * (r - 1.0) / (total - 1.0)).max(0.0);
    let r_corr = r - (r - 1.0).powi(2) / (total - 1.0);
    let k_corr = k - (k - 1.0).powi(2) / (total - 1.0);
    let denom = (k_corr - 1.0).min(r_corr - 1.0);

    if denom <= 0.0 {
        0.0
    } else {
        clamp_unit((phi2_corr / denom).sqrt())
    }
}

/// Correlation ratio of a numeric column grouped by a coded categorical column.
pub fn correlation_ratio(categories: &[usize], values: &[f64]) -> f64 {
    let n = categories.len().min(values.len());
    if n < 2 {
        return 0.0;
    }

    let mean = values[..n].iter().sum::<f64>() / n as f64;
    let ss_total: f64 = values[..n].iter().map(|v| (v - mean).powi(2)).sum();
    if ss_total == 0.0 {
        return 0.0;
    }

    let mut groups: HashMap<usize, (usize, f64)> = HashMap::new();
    for (&c, &v) in categories[..n].iter().zip(&values[..n]) {
        let entry = groups.entry(c).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += v;
    }

    let ss_between: f64 = groups
        .values()
        .map(|&(count, sum)| count as f64 * (sum / count as f64 - mean).powi(2))
        .sum();

    clamp_unit((ss_between / ss_total).sqrt())
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_ranks() {
        let ranks = compute_ranks(&[3.0, 1.0, 4.0, 1.0, 5.0]);
        assert_eq!(ranks, vec![3.0, 1.5, 4.0, 1.5, 5.0]);
    }

    #[test]
    fn test_spearman_monotone() {
        let x = [29.0, 41.0, 54.0, 63.0, 77.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 100.0).collect();
        assert!((spearman(&x, &y) - 1.0).abs() < 1e-12);

        let reversed: Vec<f64> = x.iter().map(|v| -v).collect();
        assert!((spearman(&x, &reversed) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_spearman_constant_is_zero() {
        assert_eq!(spearman(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_cramers_v_identical_columns() {
        let x = [0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2];
        assert!((cramers_v(&x, &x) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cramers_v_independent_columns() {
        let x = [0, 0, 1, 1, 0, 0, 1, 1];
        let y = [0, 1, 0, 1, 0, 1, 0, 1];
        assert_eq!(cramers_v(&x, &y), 0.0);
    }

    #[test]
    fn test_cramers_v_single_level_is_zero() {
        assert_eq!(cramers_v(&[0, 0, 0, 0], &[0, 1, 0, 1]), 0.0);
    }

    #[test]
    fn test_correlation_ratio() {
        let groups = [0, 0, 1, 1];
        assert!((correlation_ratio(&groups, &[1.0, 1.0, 5.0, 5.0]) - 1.0).abs() < 1e-12);
        assert_eq!(correlation_ratio(&groups, &[1.0, 5.0, 1.0, 5.0]), 0.0);
        assert_eq!(correlation_ratio(&groups, &[2.0, 2.0, 2.0, 2.0]), 0.0);
    }

    #[test]
    fn test_short_inputs() {
        assert_eq!(pearson(&[1.0], &[2.0]), 0.0);
        assert_eq!(cramers_v(&[1], &[2]), 0.0);
        assert_eq!(correlation_ratio(&[], &[]), 0.0);
    }
}
