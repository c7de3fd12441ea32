pub mod boosting;
pub mod forest;
pub mod linear_svm;
pub mod tree;

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use linear_svm::{LinearSvm, SvmParams};
pub use tree::DecisionTree;

use crate::dataset::Dataset;
use crate::error::{ModelError, PipelineError};
use crate::features::N_FEATURES;
use crate::metrics::EvaluationReport;

/// A supervised classifier over feature rows
pub trait Classifier: Send + Sync {
	/// Display name, also used by `--model`
	fn name(&self) -> &str;

	/// Train on the given rows and labels, replacing any previous fit.
	fn fit(&mut self, data: &Dataset) -> Result<(), ModelError>;

	/// Predict a class index per row.
	fn predict(&self, rows: &[[f64; N_FEATURES]]) -> Result<Vec<usize>, ModelError>;

	/// Predict the test rows and score them against their labels.
	fn evaluate(&self, test: &Dataset) -> Result<EvaluationReport, ModelError> {
		let predicted = self.predict(test.rows())?;
		Ok(EvaluationReport::from_predictions(test.labels(), &predicted))
	}
}

/// Reject training sets no model can learn from.
pub(crate) fn check_training_set(data: &Dataset) -> Result<(), ModelError> {
	if data.rows().len() != data.labels().len() {
		return Err(ModelError::DimensionMismatch {
			features: data.rows().len(),
			labels: data.labels().len(),
		});
	}
	if data.is_empty() {
		return Err(ModelError::EmptyTrainingSet);
	}
	Ok(())
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
	let mut best = 0;
	for (i, &v) in values.iter().enumerate() {
		if v > values[best] {
			best = i;
		}
	}
	best
}

/// Ordered set of classifiers to train and evaluate
#[derive(Default)]
pub struct ModelRegistry {
	models: Vec<Box<dyn Classifier>>,
}

impl ModelRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// The four standard variants with their fixed hyperparameters.
	pub fn with_defaults(seed: u64) -> Self {
		let mut registry = Self::new();
		registry.register(Box::new(DecisionTree::new(seed)));
		registry.register(Box::new(RandomForest::new(ForestParams {
			seed,
			..ForestParams::default()
		})));
		registry.register(Box::new(GradientBoosting::new(BoostingParams {
			seed,
			..BoostingParams::default()
		})));
		registry.register(Box::new(LinearSvm::new(SvmParams {
			seed,
			..SvmParams::default()
		})));
		registry
	}

	pub fn register(&mut self, model: Box<dyn Classifier>) {
		self.models.push(model);
	}

	pub fn names(&self) -> Vec<&str> {
		self.models.iter().map(|m| m.name()).collect()
	}

	/// Keep only the named models, in registry order. An empty list keeps all.
	///
	/// Names are matched case-insensitively; an unknown name is an error.
	pub fn retain_named(&mut self, names: &[String]) -> Result<(), PipelineError> {
		if names.is_empty() {
			return Ok(());
		}
		for name in names {
			if !self.models.iter().any(|m| m.name().eq_ignore_ascii_case(name)) {
				return Err(PipelineError::UnknownModel(name.clone(), self.names().join(", ")));
			}
		}
		self.models.retain(|m| names.iter().any(|n| m.name().eq_ignore_ascii_case(n)));
		Ok(())
	}

	pub fn into_models(self) -> Vec<Box<dyn Classifier>> {
		self.models
	}
}
