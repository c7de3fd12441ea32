use std::path::PathBuf;

use clap::Parser;

use crate::config::PipelineConfig;

/// Fast-flux domain classifier over dig transcripts
#[derive(Parser, Debug)]
#[command(name = "dns-flux-classifier")]
#[command(about = "Train and compare classifiers that separate legitimate, suspicious, and fast-flux domains")]
pub struct Cli {
	/// Corpus of dig transcripts for legitimate domains (label 0)
	#[arg(short = 'l', long = "legit")]
	pub legit: PathBuf,

	/// Corpus of dig transcripts for suspicious domains (label 1)
	#[arg(short = 'u', long = "suspicious")]
	pub suspicious: PathBuf,

	/// Corpus of dig transcripts for fast-flux domains (label 2)
	#[arg(short = 'x', long = "fast-flux")]
	pub fast_flux: PathBuf,

	/// Share of each class held out for testing
	#[arg(long = "test-fraction", default_value = "0.3")]
	pub test_fraction: f64,

	/// Random seed for the split and every model
	#[arg(short = 's', long = "seed", default_value = "42")]
	pub seed: u64,

	/// Only run the named model (repeatable; default is all)
	#[arg(short = 'm', long = "model")]
	pub models: Vec<String>,

	/// Cross-validated grid search over random-forest parameters
	#[arg(long = "grid-search")]
	pub grid_search: bool,

	/// Number of folds for the grid search
	#[arg(long = "cv-folds", default_value = "5")]
	pub cv_folds: usize,

	/// Feature-table rows to preview after loading
	#[arg(long = "preview", default_value = "5")]
	pub preview: usize,

	/// Write the feature table to this CSV file
	#[arg(long = "features-csv")]
	pub features_csv: Option<PathBuf>,

	/// Write per-model, per-class metrics to this CSV file
	#[arg(short = 'o', long = "output")]
	pub output: Option<PathBuf>,

	/// Worker threads (0 = one per core)
	#[arg(short = 'j', long = "jobs", default_value = "0")]
	pub jobs: usize,

	/// Enable debug logging
	#[arg(short = 'v', long = "verbose")]
	pub verbose: bool,
}

impl Cli {
	/// Pipeline configuration for these arguments.
	pub fn into_config(self) -> PipelineConfig {
		let mut config = PipelineConfig::new(self.legit, self.suspicious, self.fast_flux);
		config.test_fraction = self.test_fraction;
		config.seed = self.seed;
		config.models = self.models;
		config.grid_search = self.grid_search;
		config.cv_folds = self.cv_folds;
		config.preview_rows = self.preview;
		config.features_csv = self.features_csv;
		config.metrics_csv = self.output;
		config
	}
}
