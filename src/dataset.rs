use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::N_CLASSES;
use crate::features::N_FEATURES;

/// Feature rows with their class indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
	rows: Vec<[f64; N_FEATURES]>,
	labels: Vec<usize>,
}

impl Dataset {
	pub fn new(rows: Vec<[f64; N_FEATURES]>, labels: Vec<usize>) -> Self {
		Self { rows, labels }
	}

	pub fn rows(&self) -> &[[f64; N_FEATURES]] {
		&self.rows
	}

	pub fn labels(&self) -> &[usize] {
		&self.labels
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Copy the rows at `indices`, in that order.
	pub fn subset(&self, indices: &[usize]) -> Dataset {
		Dataset {
			rows: indices.iter().map(|&i| self.rows[i]).collect(),
			labels: indices.iter().map(|&i| self.labels[i]).collect(),
		}
	}

	pub fn class_counts(&self) -> [usize; N_CLASSES] {
		let mut counts = [0usize; N_CLASSES];
		for &label in &self.labels {
			if label < N_CLASSES {
				counts[label] += 1;
			}
		}
		counts
	}

	/// Classes with at least one row, ascending.
	pub fn classes_present(&self) -> Vec<usize> {
		self.class_counts().iter()
			.enumerate()
			.filter(|(_, &n)| n > 0)
			.map(|(class, _)| class)
			.collect()
	}
}

/// Train/test row indices produced by a split
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
	pub train: Vec<usize>,
	pub test: Vec<usize>,
}

/// Row indices grouped by class, each group shuffled with `rng`.
fn shuffled_by_class(labels: &[usize], rng: &mut StdRng) -> Vec<Vec<usize>> {
	let mut groups = vec![Vec::new(); N_CLASSES];
	for (i, &label) in labels.iter().enumerate() {
		if label < N_CLASSES {
			groups[label].push(i);
		}
	}
	for group in groups.iter_mut() {
		group.shuffle(rng);
	}
	groups
}

/// Test rows per class for a split of `counts` at `test_fraction`.
///
/// The total is ceil(n * test_fraction). Each class first gets
/// floor(total * n_c / n), then leftover rows go to the classes with the
/// largest remainders (lower class index on ties). A class never gives up
/// its last row, so a class with a single row stays in training.
fn holdout_counts(counts: &[usize; N_CLASSES], test_fraction: f64) -> [usize; N_CLASSES] {
	let n: usize = counts.iter().sum();
	let mut alloc = [0usize; N_CLASSES];
	if n == 0 {
		return alloc;
	}
	let total = ((n as f64) * test_fraction).ceil() as usize;
	let total = total.min(n);

	let mut remainders = [0usize; N_CLASSES];
	for class in 0..N_CLASSES {
		let share = total * counts[class];
		let cap = counts[class].saturating_sub(1);
		alloc[class] = (share / n).min(cap);
		remainders[class] = share % n;
	}

	let mut order: Vec<usize> = (0..N_CLASSES).collect();
	order.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]));

	let mut leftover = total - alloc.iter().sum::<usize>();
	while leftover > 0 {
		let mut placed = false;
		for &class in &order {
			if leftover == 0 {
				break;
			}
			if alloc[class] < counts[class].saturating_sub(1) {
				alloc[class] += 1;
				leftover -= 1;
				placed = true;
			}
		}
		if !placed {
			break;
		}
	}
	alloc
}

/// Split row indices so each class keeps its share in the test partition.
///
/// The test partition holds ceil(n * test_fraction) rows shared across
/// classes in proportion to their size (see `holdout_counts`).
pub fn stratified_split(labels: &[usize], test_fraction: f64, seed: u64) -> Split {
	let mut rng = StdRng::seed_from_u64(seed);
	let mut split = Split { train: Vec::new(), test: Vec::new() };

	let groups = shuffled_by_class(labels, &mut rng);
	let mut counts = [0usize; N_CLASSES];
	for (class, group) in groups.iter().enumerate() {
		counts[class] = group.len();
	}
	let n_test = holdout_counts(&counts, test_fraction);

	for (group, &k) in groups.iter().zip(&n_test) {
		split.test.extend_from_slice(&group[..k]);
		split.train.extend_from_slice(&group[k..]);
	}

	split.train.sort_unstable();
	split.test.sort_unstable();
	split
}

/// Partition row indices into `k` folds with matching class proportions.
///
/// Every index lands in exactly one fold. Rows of each class are dealt
/// round-robin after a seeded shuffle.
pub fn stratified_kfold(labels: &[usize], k: usize, seed: u64) -> Vec<Vec<usize>> {
	let k = k.max(1);
	let mut rng = StdRng::seed_from_u64(seed);
	let mut folds = vec![Vec::new(); k];
	let mut next = 0usize;

	for group in shuffled_by_class(labels, &mut rng) {
		for idx in group {
			folds[next % k].push(idx);
			next += 1;
		}
	}

	for fold in folds.iter_mut() {
		fold.sort_unstable();
	}
	folds
}

/// Train/validation splits for each of the given folds.
pub fn cross_validation_splits(folds: &[Vec<usize>]) -> Vec<Split> {
	(0..folds.len())
		.map(|held_out| {
			let mut train: Vec<usize> = folds.iter()
				.enumerate()
				.filter(|(f, _)| *f != held_out)
				.flat_map(|(_, fold)| fold.iter().copied())
				.collect();
			train.sort_unstable();
			Split { train, test: folds[held_out].clone() }
		})
		.collect()
}
