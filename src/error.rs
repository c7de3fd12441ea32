use std::path::PathBuf;

use thiserror::Error;

use crate::config::Label;

/// Fatal pipeline errors. Any of these stops the run before a report is printed.
#[derive(Debug, Error)]
pub enum PipelineError {
	#[error("corpus file for {label} not found: {} (check the --{flag} path)", path.display(), flag = label.flag())]
	MissingCorpus { label: Label, path: PathBuf },

	#[error("failed to read corpus file '{}': {source}", path.display())]
	ReadCorpus {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("test fraction must be strictly between 0 and 1, got {0}")]
	InvalidTestFraction(f64),

	#[error("unknown model '{0}' (available: {1})")]
	UnknownModel(String, String),

	#[error("feature table is empty; no transcripts were found in any corpus")]
	EmptyTable,

	#[error("not enough data: {0}")]
	InsufficientData(String),
}

/// Per-model errors. The harness records these and moves on to the next model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
	#[error("training set is empty")]
	EmptyTrainingSet,

	#[error("model has not been fitted")]
	NotFitted,

	#[error("feature/label length mismatch: {features} rows vs {labels} labels")]
	DimensionMismatch { features: usize, labels: usize },
}
