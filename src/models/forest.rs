use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::N_CLASSES;
use crate::dataset::Dataset;
use crate::error::ModelError;
use crate::features::N_FEATURES;
use super::tree::{grow_classifier, MaxFeatures, Tree, TreeParams};
use super::{argmax, check_training_set, Classifier};

/// Random forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
	pub n_estimators: usize,
	/// None grows every tree fully
	pub max_depth: Option<usize>,
	pub seed: u64,
}

impl Default for ForestParams {
	fn default() -> Self {
		Self {
			n_estimators: 100,
			max_depth: None,
			seed: 42,
		}
	}
}

impl fmt::Display for ForestParams {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.max_depth {
			Some(depth) => write!(f, "n_estimators={}, max_depth={}", self.n_estimators, depth),
			None => write!(f, "n_estimators={}, max_depth=None", self.n_estimators),
		}
	}
}

/// Bootstrap-aggregated CART trees with sqrt(d) features per split.
///
/// Tree `t` draws its bootstrap and feature order from `seed + t`, so the
/// fitted forest does not depend on how trees are scheduled across threads.
#[derive(Debug, Clone)]
pub struct RandomForest {
	name: String,
	params: ForestParams,
	trees: Vec<Tree>,
}

impl RandomForest {
	pub fn new(params: ForestParams) -> Self {
		Self::named("RandomForest", params)
	}

	pub fn named(name: impl Into<String>, params: ForestParams) -> Self {
		Self { name: name.into(), params, trees: Vec::new() }
	}

	/// Mean class distribution across trees.
	fn predict_proba(&self, row: &[f64; N_FEATURES]) -> [f64; N_CLASSES] {
		let mut proba = [0.0; N_CLASSES];
		for tree in &self.trees {
			for (p, v) in proba.iter_mut().zip(tree.predict_value(row)) {
				*p += v;
			}
		}
		let n = self.trees.len().max(1) as f64;
		for p in proba.iter_mut() {
			*p /= n;
		}
		proba
	}
}

impl Classifier for RandomForest {
	fn name(&self) -> &str {
		&self.name
	}

	fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
		check_training_set(data)?;
		let tree_params = TreeParams {
			max_depth: self.params.max_depth,
			max_features: MaxFeatures::Sqrt,
			..TreeParams::default()
		};
		let n = data.len();
		let seed = self.params.seed;

		self.trees = (0..self.params.n_estimators)
			.into_par_iter()
			.map(|t| {
				let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
				let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
				grow_classifier(data, bootstrap, &tree_params, &mut rng)
			})
			.collect();
		Ok(())
	}

	fn predict(&self, rows: &[[f64; N_FEATURES]]) -> Result<Vec<usize>, ModelError> {
		if self.trees.is_empty() {
			return Err(ModelError::NotFitted);
		}
		Ok(rows.iter().map(|row| argmax(&self.predict_proba(row))).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::test_data;

	#[test]
	fn test_forest_is_deterministic_for_a_seed() {
		let data = test_data::separable(15);
		let params = ForestParams { n_estimators: 10, ..ForestParams::default() };
		let mut a = RandomForest::new(params);
		let mut b = RandomForest::new(params);
		a.fit(&data).unwrap();
		b.fit(&data).unwrap();
		let probe: Vec<[f64; N_FEATURES]> = data.rows().iter()
			.map(|r| {
				let mut r = *r;
				r[0] += 0.05;
				r
			})
			.collect();
		assert_eq!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
	}

	#[test]
	fn test_probabilities_sum_to_one() {
		let data = test_data::separable(10);
		let mut forest = RandomForest::new(ForestParams { n_estimators: 5, ..ForestParams::default() });
		forest.fit(&data).unwrap();
		let proba = forest.predict_proba(&data.rows()[0]);
		assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
	}

	#[test]
	fn test_depth_limit_reaches_every_tree() {
		let data = test_data::separable(20);
		let mut forest = RandomForest::new(ForestParams {
			n_estimators: 8,
			max_depth: Some(1),
			seed: 3,
		});
		forest.fit(&data).unwrap();
		assert!(forest.trees.iter().all(|t| t.depth() <= 1));
	}

	#[test]
	fn test_params_display() {
		let p = ForestParams { n_estimators: 50, max_depth: Some(10), seed: 1 };
		assert_eq!(p.to_string(), "n_estimators=50, max_depth=10");
		assert_eq!(ForestParams::default().to_string(), "n_estimators=100, max_depth=None");
	}
}
