use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::dataset::{stratified_split, Dataset};
use crate::error::{ModelError, PipelineError};
use crate::metrics::EvaluationReport;
use crate::models::{Classifier, ForestParams, ModelRegistry, RandomForest};
use crate::search::{forest_param_grid, grid_search, GridSearchResult};

/// Name under which the grid-search winner is reported.
pub const GRID_SEARCH_MODEL: &str = "RandomForest (grid search)";

/// Result of training and evaluating one model
#[derive(Debug, Clone)]
pub struct ModelOutcome {
	pub name: String,
	pub result: Result<EvaluationReport, ModelError>,
}

/// Everything a harness run produced
#[derive(Debug, Clone)]
pub struct HarnessReport {
	pub train_size: usize,
	pub test_size: usize,
	/// Registry order, followed by the grid-search refit when enabled
	pub outcomes: Vec<ModelOutcome>,
	pub grid_search: Option<GridSearchResult<ForestParams>>,
}

/// Split the dataset, then fit and score every configured model.
///
/// Models run in parallel and independently: one model failing is recorded
/// in its outcome and does not stop the others.
pub fn run(data: &Dataset, config: &PipelineConfig) -> Result<HarnessReport, PipelineError> {
	let mut registry = ModelRegistry::with_defaults(config.seed);
	registry.retain_named(&config.models)?;

	let split = stratified_split(data.labels(), config.test_fraction, config.seed);
	if split.train.is_empty() || split.test.is_empty() {
		return Err(PipelineError::InsufficientData(format!(
			"{} rows give {} training and {} test rows",
			data.len(), split.train.len(), split.test.len(),
		)));
	}
	let train = data.subset(&split.train);
	let test = data.subset(&split.test);
	log::info!("Split: {} train / {} test rows", train.len(), test.len());

	let mut models = registry.into_models();
	let mut outcomes: Vec<ModelOutcome> = models
		.par_iter_mut()
		.map(|model| fit_and_evaluate(model.as_mut(), &train, &test))
		.collect();

	let mut search = None;
	if config.grid_search {
		let grid = forest_param_grid(config.seed);
		log::info!(
			"Grid search: {} candidates, {}-fold cross-validation",
			grid.len(), config.cv_folds,
		);
		match grid_search(&train, &grid, config.cv_folds, config.seed, |p| RandomForest::new(*p)) {
			Ok(result) => {
				let mut best = RandomForest::named(GRID_SEARCH_MODEL, result.best);
				outcomes.push(fit_and_evaluate(&mut best, &train, &test));
				search = Some(result);
			}
			Err(e) => {
				log::warn!("Grid search failed: {}", e);
				outcomes.push(ModelOutcome { name: GRID_SEARCH_MODEL.to_string(), result: Err(e) });
			}
		}
	}

	Ok(HarnessReport {
		train_size: train.len(),
		test_size: test.len(),
		outcomes,
		grid_search: search,
	})
}

fn fit_and_evaluate(model: &mut dyn Classifier, train: &Dataset, test: &Dataset) -> ModelOutcome {
	let result = model.fit(train).and_then(|_| model.evaluate(test));
	match &result {
		Ok(report) => log::debug!("{}: accuracy {:.4}", model.name(), report.accuracy),
		Err(e) => log::warn!("{} failed: {}", model.name(), e),
	}
	ModelOutcome {
		name: model.name().to_string(),
		result,
	}
}
