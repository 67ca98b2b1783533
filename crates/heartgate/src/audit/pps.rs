//! Predictive power score of a single feature for a class label.
//!
//! The score compares out-of-fold predictions from a one-feature model with a
//! naive model that always predicts the most common class:
//!
//! ```text
//! pps = max(0, (f1_model - f1_naive) / (1 - f1_naive))
//! ```
//!
//! where both F1 scores are support-weighted across classes. A score of 1
//! means the feature alone recovers the label; 0 means it does no better
//! than guessing the majority class.

use std::collections::HashMap;

/// A feature column as seen by the audit. `None` marks a null cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValues {
    Numeric(Vec<Option<f64>>),
    /// Category codes.
    Categorical(Vec<Option<usize>>),
}

impl FeatureValues {
    pub fn len(&self) -> usize {
        match self {
            FeatureValues::Numeric(v) => v.len(),
            FeatureValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cross-validation settings for the score.
#[derive(Debug, Clone, Copy)]
pub struct PpsSettings {
    /// Number of stratified folds (capped at the row count).
    pub folds: usize,
    /// Depth limit for the numeric decision tree.
    pub max_depth: usize,
}

impl Default for PpsSettings {
    fn default() -> Self {
        Self {
            folds: 4,
            max_depth: 8,
        }
    }
}

/// Score how well `feature` predicts `labels` (class codes). Rows where
/// either side is null are dropped.
pub fn predictive_power_score(
    feature: &FeatureValues,
    labels: &[Option<usize>],
    settings: PpsSettings,
) -> f64 {
    match feature {
        FeatureValues::Numeric(values) => {
            let pairs: Vec<(f64, usize)> = zip_present(values, labels);
            score(&pairs, settings, |train| {
                let mut sorted = train.to_vec();
                sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
                let tree = Node::grow(&sorted, 0, settings.max_depth, class_count(train));
                let predictor: Predictor<f64> = Box::new(move |x| tree.predict(x));
                predictor
            })
        }
        FeatureValues::Categorical(values) => {
            let pairs: Vec<(usize, usize)> = zip_present(values, labels);
            score(&pairs, settings, |train| {
                let lookup = CategoryLookup::fit(train);
                let predictor: Predictor<usize> = Box::new(move |x| lookup.predict(x));
                predictor
            })
        }
    }
}

fn zip_present<T: Copy>(values: &[Option<T>], labels: &[Option<usize>]) -> Vec<(T, usize)> {
    values
        .iter()
        .zip(labels)
        .filter_map(|(v, l)| Some(((*v)?, (*l)?)))
        .collect()
}

type Predictor<X> = Box<dyn Fn(X) -> usize>;

/// Out-of-fold predictions scored against the naive baseline.
fn score<X: Copy>(
    pairs: &[(X, usize)],
    settings: PpsSettings,
    fit: impl Fn(&[(X, usize)]) -> Predictor<X>,
) -> f64 {
    let n = pairs.len();
    if n < 2 {
        return 0.0;
    }

    let truth: Vec<usize> = pairs.iter().map(|(_, l)| *l).collect();
    let naive = majority(truth.iter().copied(), class_count(pairs));
    let baseline = weighted_f1(&truth, &vec![naive; n]);
    if baseline >= 1.0 {
        return 0.0;
    }

    let assignments = fold_assignments(&truth, settings.folds);
    let folds = assignments.iter().max().map_or(0, |f| f + 1);

    let mut predictions = vec![0usize; n];
    for fold in 0..folds {
        let train: Vec<(X, usize)> = pairs
            .iter()
            .zip(&assignments)
            .filter(|(_, f)| **f != fold)
            .map(|(pair, _)| *pair)
            .collect();
        let predictor = fit(&train);
        for (i, _) in assignments.iter().enumerate().filter(|(_, f)| **f == fold) {
            predictions[i] = predictor(pairs[i].0);
        }
    }

    let model = weighted_f1(&truth, &predictions);
    ((model - baseline) / (1.0 - baseline)).max(0.0)
}

/// Stratified fold index for each row.
///
/// Rows are ordered by class (stable within a class) and dealt to the folds
/// in turn, so every fold sees each class in proportion and fold sizes
/// differ by at most one. The fold count is capped at the row count.
fn fold_assignments(labels: &[usize], folds: usize) -> Vec<usize> {
    let n = labels.len();
    let k = folds.clamp(2, n.max(2)).min(n).max(1);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| labels[i]);

    let mut assignments = vec![0; n];
    for (position, &row) in order.iter().enumerate() {
        assignments[row] = position % k;
    }
    assignments
}

fn class_count<X>(pairs: &[(X, usize)]) -> usize {
    pairs.iter().map(|(_, l)| l + 1).max().unwrap_or(0)
}

/// Most common class; ties go to the lowest class code.
fn majority(labels: impl Iterator<Item = usize>, classes: usize) -> usize {
    let mut counts = vec![0usize; classes.max(1)];
    for label in labels {
        counts[label] += 1;
    }
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

/// Support-weighted F1 over the classes present in `truth`.
pub fn weighted_f1(truth: &[usize], predicted: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }

    let mut support: HashMap<usize, usize> = HashMap::new();
    for &t in truth {
        *support.entry(t).or_insert(0) += 1;
    }

    let mut total = 0.0;
    for (&class, &count) in &support {
        let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t == class, p == class) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }
        let denom = 2 * tp + fp + fn_;
        let f1 = if denom == 0 { 0.0 } else { 2.0 * tp as f64 / denom as f64 };
        total += count as f64 * f1;
    }

    total / truth.len() as f64
}

/// Majority label per category, falling back to the overall majority.
struct CategoryLookup {
    by_category: HashMap<usize, usize>,
    fallback: usize,
}

impl CategoryLookup {
    fn fit(train: &[(usize, usize)]) -> Self {
        let classes = class_count(train);
        let mut grouped: HashMap<usize, Vec<usize>> = HashMap::new();
        for &(category, label) in train {
            grouped.entry(category).or_default().push(label);
        }

        let by_category = grouped
            .into_iter()
            .map(|(category, labels)| (category, majority(labels.into_iter(), classes)))
            .collect();

        Self {
            by_category,
            fallback: majority(train.iter().map(|(_, l)| *l), classes),
        }
    }

    fn predict(&self, category: usize) -> usize {
        self.by_category.get(&category).copied().unwrap_or(self.fallback)
    }
}

/// One-dimensional classification tree split on Gini impurity.
#[derive(Debug)]
enum Node {
    Leaf(usize),
    Split {
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    /// Grow a tree from points sorted by feature value.
    fn grow(points: &[(f64, usize)], depth: usize, max_depth: usize, classes: usize) -> Node {
        let leaf = || Node::Leaf(majority(points.iter().map(|(_, l)| *l), classes));

        let pure = points.windows(2).all(|w| w[0].1 == w[1].1);
        if pure || depth >= max_depth || points.len() < 2 {
            return leaf();
        }

        let n = points.len();
        let mut total = vec![0usize; classes];
        for (_, l) in points {
            total[*l] += 1;
        }

        let mut left = vec![0usize; classes];
        let mut best: Option<(f64, f64, usize)> = None;
        for i in 1..n {
            left[points[i - 1].1] += 1;
            if points[i].0 == points[i - 1].0 {
                continue;
            }

            let right: Vec<usize> = total.iter().zip(&left).map(|(t, l)| t - l).collect();
            let impurity =
                (i as f64 * gini(&left, i) + (n - i) as f64 * gini(&right, n - i)) / n as f64;

            if best.is_none_or(|(b, _, _)| impurity < b) {
                let threshold = (points[i].0 + points[i - 1].0) / 2.0;
                best = Some((impurity, threshold, i));
            }
        }

        match best {
            None => leaf(),
            Some((_, threshold, split)) => Node::Split {
                threshold,
                left: Box::new(Node::grow(&points[..split], depth + 1, max_depth, classes)),
                right: Box::new(Node::grow(&points[split..], depth + 1, max_depth, classes)),
            },
        }
    }

    fn predict(&self, x: f64) -> usize {
        let mut node = self;
        loop {
            match node {
                Node::Leaf(class) => return *class,
                Node::Split {
                    threshold,
                    left,
                    right,
                } => node = if x <= *threshold { left } else { right },
            }
        }
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    1.0 - counts
        .iter()
        .map(|&c| (c as f64 / n as f64).powi(2))
        .sum::<f64>()
}
