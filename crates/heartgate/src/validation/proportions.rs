//! Class-balance check for a binary label.

/// Default distance from 0.5 each class proportion may drift.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Check that labels 0 and 1 each make up half of the sequence, within `tolerance`.
///
/// Both proportions are taken over the full length, so values other than 0
/// and 1 only enlarge the denominator and an absent class has proportion 0.
///
/// An empty sequence returns `true`. That result follows from treating the
/// missing proportions as satisfying the check rather than from the arithmetic,
/// and callers that need a non-empty label should test for it themselves.
pub fn check_proportions(labels: &[i64], tolerance: f64) -> bool {
    if labels.is_empty() {
        return true;
    }

    let total = labels.len() as f64;
    let zeros = labels.iter().filter(|&&v| v == 0).count() as f64 / total;
    let ones = labels.iter().filter(|&&v| v == 1).count() as f64 / total;

    (zeros - 0.5).abs() <= tolerance && (ones - 0.5).abs() <= tolerance
}
