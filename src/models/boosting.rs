//! Gradient-boosted regression trees for multi-class classification.
//!
//! # Algorithm
//! 1. Start every class score at the log of its training prior
//! 2. For each boosting round, turn scores into softmax probabilities and,
//!    per class, fit a small regression tree to the residual `y - p`
//! 3. Replace each leaf value with a one-step Newton estimate,
//!    `(K - 1) / K * sum(r) / sum(|r| * (1 - |r|))`
//! 4. Add `learning_rate * leaf` to the class score
//!
//! Prediction is the class with the highest accumulated score.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dataset::Dataset;
use crate::error::ModelError;
use crate::features::N_FEATURES;
use super::tree::{grow, SquaredError, Tree, TreeParams};
use super::{argmax, check_training_set, Classifier};

/// Gradient boosting hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostingParams {
	/// Boosting rounds; each round grows one tree per class
	pub n_estimators: usize,
	pub learning_rate: f64,
	pub max_depth: usize,
	pub seed: u64,
}

impl Default for BoostingParams {
	fn default() -> Self {
		Self {
			n_estimators: 100,
			learning_rate: 0.1,
			max_depth: 3,
			seed: 42,
		}
	}
}

#[derive(Debug, Clone)]
pub struct GradientBoosting {
	params: BoostingParams,
	/// Class indices seen during training, in score order
	classes: Vec<usize>,
	init_scores: Vec<f64>,
	/// One entry per round, one tree per class within it
	stages: Vec<Vec<Tree>>,
}

impl GradientBoosting {
	pub fn new(params: BoostingParams) -> Self {
		Self {
			params,
			classes: Vec::new(),
			init_scores: Vec::new(),
			stages: Vec::new(),
		}
	}

	fn raw_scores(&self, row: &[f64; N_FEATURES]) -> Vec<f64> {
		let mut scores = self.init_scores.clone();
		for stage in &self.stages {
			for (score, tree) in scores.iter_mut().zip(stage) {
				*score += self.params.learning_rate * tree.predict_value(row)[0];
			}
		}
		scores
	}
}

fn softmax(scores: &[f64]) -> Vec<f64> {
	let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
	let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
	let total: f64 = exps.iter().sum();
	exps.into_iter().map(|e| e / total).collect()
}

impl Classifier for GradientBoosting {
	fn name(&self) -> &str {
		"GradientBoosting"
	}

	fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
		check_training_set(data)?;
		let n = data.len();
		let classes = data.classes_present();
		let k = classes.len();
		let counts = data.class_counts();

		self.init_scores = classes.iter()
			.map(|&c| (counts[c] as f64 / n as f64).ln())
			.collect();
		self.classes = classes;
		self.stages.clear();

		// A single class leaves nothing to boost
		if k < 2 {
			return Ok(());
		}

		let onehot: Vec<Vec<f64>> = data.labels().iter()
			.map(|&label| self.classes.iter().map(|&c| if c == label { 1.0 } else { 0.0 }).collect())
			.collect();
		let mut scores: Vec<Vec<f64>> = vec![self.init_scores.clone(); n];

		let tree_params = TreeParams {
			max_depth: Some(self.params.max_depth),
			..TreeParams::default()
		};
		let mut rng = StdRng::seed_from_u64(self.params.seed);
		let newton_scale = (k as f64 - 1.0) / k as f64;
		let samples: Vec<usize> = (0..n).collect();

		for _ in 0..self.params.n_estimators {
			let probs: Vec<Vec<f64>> = scores.iter().map(|s| softmax(s)).collect();
			let mut stage = Vec::with_capacity(k);

			for class in 0..k {
				let residuals: Vec<f64> = (0..n)
					.map(|i| onehot[i][class] - probs[i][class])
					.collect();
				let criterion = SquaredError { targets: &residuals };
				let mut tree = grow(&criterion, data.rows(), samples.clone(), &tree_params, &mut rng);

				// Newton step per leaf
				let mut sums = vec![(0.0f64, 0.0f64); tree.node_count()];
				let leaves: Vec<usize> = data.rows().iter().map(|row| tree.leaf_index(row)).collect();
				for (i, &leaf) in leaves.iter().enumerate() {
					let r = residuals[i];
					sums[leaf].0 += r;
					sums[leaf].1 += r.abs() * (1.0 - r.abs());
				}
				let values: Vec<f64> = sums.iter()
					.map(|&(numerator, denominator)| {
						if denominator.abs() < 1e-150 {
							0.0
						} else {
							newton_scale * numerator / denominator
						}
					})
					.collect();
				for (leaf, &value) in values.iter().enumerate() {
					tree.set_leaf_value(leaf, vec![value]);
				}
				for (i, &leaf) in leaves.iter().enumerate() {
					scores[i][class] += self.params.learning_rate * values[leaf];
				}
				stage.push(tree);
			}
			self.stages.push(stage);
		}
		Ok(())
	}

	fn predict(&self, rows: &[[f64; N_FEATURES]]) -> Result<Vec<usize>, ModelError> {
		if self.classes.is_empty() {
			return Err(ModelError::NotFitted);
		}
		Ok(rows.iter()
			.map(|row| self.classes[argmax(&self.raw_scores(row))])
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::test_data;

	#[test]
	fn test_softmax_is_a_distribution() {
		let p = softmax(&[1.0, 2.0, 3.0]);
		assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
		assert!(p[2] > p[1] && p[1] > p[0]);
		// Large scores must not overflow
		let big = softmax(&[1000.0, 1000.0]);
		assert!((big[0] - 0.5).abs() < 1e-12);
	}

	#[test]
	fn test_single_class_predicts_that_class() {
		let data = Dataset::new(vec![[1.0; N_FEATURES], [2.0; N_FEATURES]], vec![2, 2]);
		let mut model = GradientBoosting::new(BoostingParams::default());
		model.fit(&data).unwrap();
		assert_eq!(model.predict(&[[9.0; N_FEATURES]]).unwrap(), vec![2]);
	}

	#[test]
	fn test_two_class_labels_map_back() {
		// Classes 0 and 2 only; class 1 never predicted
		let mut rows = Vec::new();
		let mut labels = Vec::new();
		for i in 0..20 {
			let mut row = [0.0; N_FEATURES];
			row[0] = if i % 2 == 0 { 1.0 } else { 50.0 };
			rows.push(row);
			labels.push(if i % 2 == 0 { 0 } else { 2 });
		}
		let data = Dataset::new(rows, labels);
		let mut model = GradientBoosting::new(BoostingParams { n_estimators: 20, ..BoostingParams::default() });
		model.fit(&data).unwrap();
		assert_eq!(model.predict(data.rows()).unwrap(), data.labels());
	}

	#[test]
	fn test_training_loss_goes_down() {
		let data = test_data::separable(15);
		let mut short = GradientBoosting::new(BoostingParams { n_estimators: 2, ..BoostingParams::default() });
		let mut long = GradientBoosting::new(BoostingParams { n_estimators: 30, ..BoostingParams::default() });
		short.fit(&data).unwrap();
		long.fit(&data).unwrap();

		let log_loss = |model: &GradientBoosting| -> f64 {
			data.rows().iter().zip(data.labels())
				.map(|(row, &label)| -softmax(&model.raw_scores(row))[label].ln())
				.sum::<f64>()
		};
		assert!(log_loss(&long) < log_loss(&short));
	}
}
