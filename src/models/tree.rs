use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::N_CLASSES;
use crate::dataset::Dataset;
use crate::error::ModelError;
use crate::features::N_FEATURES;
use super::{argmax, check_training_set, Classifier};

/// Values closer than this are treated as equal when placing thresholds.
const FEATURE_EPSILON: f64 = 1e-7;

/// How many features each split considers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
	All,
	Sqrt,
}

impl MaxFeatures {
	fn count(self, n_features: usize) -> usize {
		match self {
			MaxFeatures::All => n_features,
			MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
		}
	}
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
	/// None grows until leaves are pure or too small to split
	pub max_depth: Option<usize>,
	pub min_samples_split: usize,
	pub min_samples_leaf: usize,
	pub max_features: MaxFeatures,
}

impl Default for TreeParams {
	fn default() -> Self {
		Self {
			max_depth: None,
			min_samples_split: 2,
			min_samples_leaf: 1,
			max_features: MaxFeatures::All,
		}
	}
}

#[derive(Debug, Clone)]
enum Node {
	Leaf { value: Vec<f64> },
	Split { feature: usize, threshold: f64, left: usize, right: usize },
}

/// A grown tree, stored as a node arena rooted at index 0
#[derive(Debug, Clone)]
pub struct Tree {
	nodes: Vec<Node>,
}

impl Tree {
	/// Arena index of the leaf `row` falls into.
	pub fn leaf_index(&self, row: &[f64; N_FEATURES]) -> usize {
		let mut idx = 0;
		while let Node::Split { feature, threshold, left, right } = &self.nodes[idx] {
			idx = if row[*feature] <= *threshold { *left } else { *right };
		}
		idx
	}

	/// Leaf value for `row`: class distribution or regression value.
	pub fn predict_value(&self, row: &[f64; N_FEATURES]) -> &[f64] {
		match &self.nodes[self.leaf_index(row)] {
			Node::Leaf { value } => value,
			Node::Split { .. } => &[],
		}
	}

	/// Overwrite the value of a leaf; non-leaf indices are ignored.
	pub fn set_leaf_value(&mut self, leaf: usize, new_value: Vec<f64>) {
		if let Some(Node::Leaf { value }) = self.nodes.get_mut(leaf) {
			*value = new_value;
		}
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn depth(&self) -> usize {
		fn walk(nodes: &[Node], idx: usize) -> usize {
			match &nodes[idx] {
				Node::Leaf { .. } => 0,
				Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
			}
		}
		walk(&self.nodes, 0)
	}
}

/// Impurity measure driving split selection.
///
/// `impurity` is the node total (per-sample impurity times sample count), so
/// the impurities of two children can be added directly.
pub trait Criterion {
	type Stats: Clone;

	fn empty(&self) -> Self::Stats;
	fn add(&self, stats: &mut Self::Stats, sample: usize);
	fn remove(&self, stats: &mut Self::Stats, sample: usize);
	fn impurity(&self, stats: &Self::Stats) -> f64;
	fn leaf_value(&self, stats: &Self::Stats) -> Vec<f64>;
}

/// Gini impurity over class labels
pub struct Gini<'a> {
	pub labels: &'a [usize],
}

#[derive(Clone)]
pub struct ClassCounts {
	counts: [f64; N_CLASSES],
	n: f64,
}

impl Criterion for Gini<'_> {
	type Stats = ClassCounts;

	fn empty(&self) -> ClassCounts {
		ClassCounts { counts: [0.0; N_CLASSES], n: 0.0 }
	}

	fn add(&self, stats: &mut ClassCounts, sample: usize) {
		stats.counts[self.labels[sample]] += 1.0;
		stats.n += 1.0;
	}

	fn remove(&self, stats: &mut ClassCounts, sample: usize) {
		stats.counts[self.labels[sample]] -= 1.0;
		stats.n -= 1.0;
	}

	fn impurity(&self, stats: &ClassCounts) -> f64 {
		if stats.n <= 0.0 {
			return 0.0;
		}
		let sum_sq: f64 = stats.counts.iter().map(|c| c * c).sum();
		stats.n - sum_sq / stats.n
	}

	fn leaf_value(&self, stats: &ClassCounts) -> Vec<f64> {
		stats.counts.iter().map(|c| c / stats.n.max(1.0)).collect()
	}
}

/// Squared error around the mean of real-valued targets
pub struct SquaredError<'a> {
	pub targets: &'a [f64],
}

#[derive(Clone)]
pub struct Moments {
	n: f64,
	sum: f64,
	sum_sq: f64,
}

impl Criterion for SquaredError<'_> {
	type Stats = Moments;

	fn empty(&self) -> Moments {
		Moments { n: 0.0, sum: 0.0, sum_sq: 0.0 }
	}

	fn add(&self, stats: &mut Moments, sample: usize) {
		let y = self.targets[sample];
		stats.n += 1.0;
		stats.sum += y;
		stats.sum_sq += y * y;
	}

	fn remove(&self, stats: &mut Moments, sample: usize) {
		let y = self.targets[sample];
		stats.n -= 1.0;
		stats.sum -= y;
		stats.sum_sq -= y * y;
	}

	fn impurity(&self, stats: &Moments) -> f64 {
		if stats.n <= 0.0 {
			return 0.0;
		}
		(stats.sum_sq - stats.sum * stats.sum / stats.n).max(0.0)
	}

	fn leaf_value(&self, stats: &Moments) -> Vec<f64> {
		vec![stats.sum / stats.n.max(1.0)]
	}
}

/// Grow a CART tree on the given sample indices (repeats allowed, as in a bootstrap).
///
/// Splits are binary `row[feature] <= threshold` tests with the threshold at
/// the midpoint between adjacent distinct values. `Gini` leaves hold a class
/// distribution, `SquaredError` leaves hold one value.
pub fn grow<C: Criterion>(
	criterion: &C,
	rows: &[[f64; N_FEATURES]],
	mut samples: Vec<usize>,
	params: &TreeParams,
	rng: &mut StdRng,
) -> Tree {
	let mut builder = Builder {
		criterion,
		rows,
		params,
		rng,
		nodes: Vec::new(),
	};
	builder.build(&mut samples, 0);
	Tree { nodes: builder.nodes }
}

struct Builder<'a, C: Criterion> {
	criterion: &'a C,
	rows: &'a [[f64; N_FEATURES]],
	params: &'a TreeParams,
	rng: &'a mut StdRng,
	nodes: Vec<Node>,
}

struct BestSplit {
	feature: usize,
	threshold: f64,
	score: f64,
}

impl<C: Criterion> Builder<'_, C> {
	fn build(&mut self, samples: &mut [usize], depth: usize) -> usize {
		let mut stats = self.criterion.empty();
		for &s in samples.iter() {
			self.criterion.add(&mut stats, s);
		}
		let idx = self.nodes.len();
		self.nodes.push(Node::Leaf { value: self.criterion.leaf_value(&stats) });

		let n = samples.len();
		let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
		if depth_reached
			|| n < self.params.min_samples_split
			|| n < 2 * self.params.min_samples_leaf
			|| self.criterion.impurity(&stats) <= 1e-12
		{
			return idx;
		}

		let Some(best) = self.best_split(samples, &stats) else {
			return idx;
		};

		// Partition in place: left block is row[feature] <= threshold
		let mut boundary = 0;
		for i in 0..n {
			if self.rows[samples[i]][best.feature] <= best.threshold {
				samples.swap(i, boundary);
				boundary += 1;
			}
		}
		let (left_samples, right_samples) = samples.split_at_mut(boundary);
		let left = self.build(left_samples, depth + 1);
		let right = self.build(right_samples, depth + 1);
		self.nodes[idx] = Node::Split {
			feature: best.feature,
			threshold: best.threshold,
			left,
			right,
		};
		idx
	}

	fn best_split(&mut self, samples: &[usize], parent: &C::Stats) -> Option<BestSplit> {
		let mut features: Vec<usize> = (0..N_FEATURES).collect();
		features.shuffle(&mut *self.rng);
		let quota = self.params.max_features.count(N_FEATURES);
		let min_leaf = self.params.min_samples_leaf.max(1);
		let n = samples.len();

		let mut best: Option<BestSplit> = None;
		let mut visited = 0;
		let mut sorted = samples.to_vec();

		for feature in features {
			if visited >= quota {
				break;
			}
			let rows = self.rows;
			sorted.sort_by(|&a, &b| {
				rows[a][feature].partial_cmp(&rows[b][feature])
					.unwrap_or(std::cmp::Ordering::Equal)
			});
			let lo = rows[sorted[0]][feature];
			let hi = rows[sorted[n - 1]][feature];
			// Constant features do not count toward the quota
			if hi - lo <= FEATURE_EPSILON {
				continue;
			}
			visited += 1;

			let mut left = self.criterion.empty();
			let mut right = parent.clone();
			for pos in 0..n - 1 {
				self.criterion.add(&mut left, sorted[pos]);
				self.criterion.remove(&mut right, sorted[pos]);

				let here = rows[sorted[pos]][feature];
				let next = rows[sorted[pos + 1]][feature];
				if next - here <= FEATURE_EPSILON {
					continue;
				}
				if pos + 1 < min_leaf || n - pos - 1 < min_leaf {
					continue;
				}

				let score = self.criterion.impurity(&left) + self.criterion.impurity(&right);
				if best.as_ref().map_or(true, |b| score < b.score - 1e-12) {
					let mut threshold = here + (next - here) / 2.0;
					if threshold >= next {
						threshold = here;
					}
					best = Some(BestSplit { feature, threshold, score });
				}
			}
		}
		best
	}
}

/// Single CART classification tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
	params: TreeParams,
	seed: u64,
	tree: Option<Tree>,
}

impl DecisionTree {
	/// Unlimited depth, all features per split.
	pub fn new(seed: u64) -> Self {
		Self::with_params(TreeParams::default(), seed)
	}

	pub fn with_params(params: TreeParams, seed: u64) -> Self {
		Self { params, seed, tree: None }
	}

}

/// Grow a Gini classification tree on `samples` of `data`.
pub(crate) fn grow_classifier(
	data: &Dataset,
	samples: Vec<usize>,
	params: &TreeParams,
	rng: &mut StdRng,
) -> Tree {
	let criterion = Gini { labels: data.labels() };
	grow(&criterion, data.rows(), samples, params, rng)
}

impl Classifier for DecisionTree {
	fn name(&self) -> &str {
		"DecisionTree"
	}

	fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
		check_training_set(data)?;
		let mut rng = StdRng::seed_from_u64(self.seed);
		let samples: Vec<usize> = (0..data.len()).collect();
		let tree = grow_classifier(data, samples, &self.params, &mut rng);
		log::debug!("DecisionTree: {} nodes, depth {}", tree.node_count(), tree.depth());
		self.tree = Some(tree);
		Ok(())
	}

	fn predict(&self, rows: &[[f64; N_FEATURES]]) -> Result<Vec<usize>, ModelError> {
		let tree = self.tree.as_ref().ok_or(ModelError::NotFitted)?;
		Ok(rows.iter().map(|row| argmax(tree.predict_value(row))).collect())
	}
}
