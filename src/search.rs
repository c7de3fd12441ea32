use rayon::prelude::*;

use crate::dataset::{cross_validation_splits, stratified_kfold, Dataset};
use crate::error::ModelError;
use crate::models::{Classifier, ForestParams};

/// Outcome of a grid search
#[derive(Debug, Clone)]
pub struct GridSearchResult<P> {
	pub best: P,
	/// Mean validation macro-F1 of `best`
	pub best_score: f64,
	/// Every candidate with its mean score, in grid order
	pub scores: Vec<(P, f64)>,
}

/// Random-forest grid: n_estimators in {50, 100, 200} by max_depth in {None, 10, 20}.
pub fn forest_param_grid(seed: u64) -> Vec<ForestParams> {
	let mut grid = Vec::new();
	for n_estimators in [50, 100, 200] {
		for max_depth in [None, Some(10), Some(20)] {
			grid.push(ForestParams { n_estimators, max_depth, seed });
		}
	}
	grid
}

/// Score each candidate by mean macro-F1 over stratified k-fold validation.
///
/// Args:
///   data: training partition to cross-validate on
///   candidates: parameter sets, scored independently in parallel
///   folds: number of folds (at least 2)
///   seed: seed for the fold assignment
///   build: constructs an unfitted model from one parameter set
///
/// Returns:
///   The highest-scoring candidate; ties go to the earlier one in the grid.
pub fn grid_search<P, C, F>(
	data: &Dataset,
	candidates: &[P],
	folds: usize,
	seed: u64,
	build: F,
) -> Result<GridSearchResult<P>, ModelError>
where
	P: Clone + Send + Sync,
	C: Classifier,
	F: Fn(&P) -> C + Send + Sync,
{
	if data.is_empty() || candidates.is_empty() {
		return Err(ModelError::EmptyTrainingSet);
	}
	let splits = cross_validation_splits(&stratified_kfold(data.labels(), folds, seed));

	let scores: Vec<(P, f64)> = candidates
		.par_iter()
		.map(|params| -> Result<(P, f64), ModelError> {
			let mut total = 0.0;
			for split in &splits {
				let mut model = build(params);
				model.fit(&data.subset(&split.train))?;
				total += model.evaluate(&data.subset(&split.test))?.macro_f1();
			}
			Ok((params.clone(), total / splits.len() as f64))
		})
		.collect::<Result<_, _>>()?;

	let mut best = 0;
	for (i, (_, score)) in scores.iter().enumerate() {
		if *score > scores[best].1 {
			best = i;
		}
	}

	Ok(GridSearchResult {
		best: scores[best].0.clone(),
		best_score: scores[best].1,
		scores,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::{test_data, RandomForest};
	use crate::models::tree::{DecisionTree, TreeParams};

	#[test]
	fn test_forest_grid_shape() {
		let grid = forest_param_grid(42);
		assert_eq!(grid.len(), 9);
		assert_eq!(grid[0], ForestParams { n_estimators: 50, max_depth: None, seed: 42 });
		assert_eq!(grid[8], ForestParams { n_estimators: 200, max_depth: Some(20), seed: 42 });
	}

	#[test]
	fn test_grid_search_prefers_deeper_tree() {
		// A stump can only split off one of three classes
		let data = test_data::separable(15);
		let candidates = vec![Some(1), None];
		let result = grid_search(&data, &candidates, 3, 42, |depth| {
			DecisionTree::with_params(TreeParams { max_depth: *depth, ..TreeParams::default() }, 42)
		})
		.unwrap();
		assert_eq!(result.best, None);
		assert!(result.best_score > result.scores[0].1);
		assert_eq!(result.scores.len(), 2);
	}

	#[test]
	fn test_grid_search_is_deterministic() {
		let data = test_data::separable(10);
		let grid = vec![
			ForestParams { n_estimators: 5, max_depth: Some(2), seed: 1 },
			ForestParams { n_estimators: 5, max_depth: None, seed: 1 },
		];
		let run = || {
			grid_search(&data, &grid, 3, 9, |p| RandomForest::new(*p))
				.unwrap()
				.scores
				.into_iter()
				.map(|(_, s)| s)
				.collect::<Vec<f64>>()
		};
		assert_eq!(run(), run());
	}

	#[test]
	fn test_ties_keep_the_first_candidate() {
		let data = test_data::separable(10);
		let grid = vec![
			ForestParams { n_estimators: 3, max_depth: None, seed: 5 },
			ForestParams { n_estimators: 3, max_depth: None, seed: 5 },
		];
		let result = grid_search(&data, &grid, 2, 1, |p| RandomForest::new(*p)).unwrap();
		assert_eq!(result.scores[0].1, result.scores[1].1);
		assert_eq!(result.best, grid[0]);
	}

	#[test]
	fn test_empty_data_is_rejected() {
		let result = grid_search(&Dataset::default(), &forest_param_grid(1), 5, 1, |p| RandomForest::new(*p));
		assert!(matches!(result, Err(ModelError::EmptyTrainingSet)));
	}
}
