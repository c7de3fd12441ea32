use std::fmt;
use std::path::PathBuf;

use crate::error::PipelineError;
use crate::models::ModelRegistry;

/// Number of target classes.
pub const N_CLASSES: usize = 3;

/// Class label attached to every row of a corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
	Legitimate = 0,
	Suspicious = 1,
	FastFlux = 2,
}

impl Label {
	/// All labels in class-index order.
	pub const ALL: [Label; N_CLASSES] = [Label::Legitimate, Label::Suspicious, Label::FastFlux];

	pub fn index(self) -> usize {
		self as usize
	}

	/// CLI flag that supplies this label's corpus
	pub fn flag(self) -> &'static str {
		match self {
			Label::Legitimate => "legit",
			Label::Suspicious => "suspicious",
			Label::FastFlux => "fast-flux",
		}
	}
}

impl fmt::Display for Label {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Label::Legitimate => "legitimate",
			Label::Suspicious => "suspicious",
			Label::FastFlux => "fast-flux",
		};
		f.write_str(name)
	}
}

/// A corpus file paired with the label every transcript in it receives
#[derive(Debug, Clone)]
pub struct LabeledCorpus {
	pub label: Label,
	pub path: PathBuf,
}

/// Everything a pipeline run needs. Built from the CLI in `main`, or directly in tests.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
	/// Exactly one corpus per label, in label order
	pub corpora: [LabeledCorpus; N_CLASSES],
	pub test_fraction: f64,
	pub seed: u64,
	/// Restrict the run to these model names; empty means every registered model
	pub models: Vec<String>,
	pub grid_search: bool,
	pub cv_folds: usize,
	pub preview_rows: usize,
	pub features_csv: Option<PathBuf>,
	pub metrics_csv: Option<PathBuf>,
}

impl PipelineConfig {
	/// Config with the default split and seed for the three corpus paths.
	pub fn new(legit: PathBuf, suspicious: PathBuf, fast_flux: PathBuf) -> Self {
		Self {
			corpora: [
				LabeledCorpus { label: Label::Legitimate, path: legit },
				LabeledCorpus { label: Label::Suspicious, path: suspicious },
				LabeledCorpus { label: Label::FastFlux, path: fast_flux },
			],
			test_fraction: 0.3,
			seed: 42,
			models: Vec::new(),
			grid_search: false,
			cv_folds: 5,
			preview_rows: 5,
			features_csv: None,
			metrics_csv: None,
		}
	}

	/// Pre-flight checks: every corpus must exist, the split must be usable,
	/// and every `--model` name must be registered.
	///
	/// Runs before any corpus is read.
	pub fn validate(&self) -> Result<(), PipelineError> {
		for corpus in &self.corpora {
			if !corpus.path.is_file() {
				return Err(PipelineError::MissingCorpus {
					label: corpus.label,
					path: corpus.path.clone(),
				});
			}
		}
		if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
			return Err(PipelineError::InvalidTestFraction(self.test_fraction));
		}
		ModelRegistry::with_defaults(self.seed).retain_named(&self.models)?;
		if self.grid_search && self.cv_folds < 2 {
			return Err(PipelineError::InsufficientData(format!(
				"grid search needs at least 2 folds, got {}", self.cv_folds,
			)));
		}
		Ok(())
	}
}
