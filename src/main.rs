mod cli;
mod config;
mod corpus;
mod dataset;
mod error;
mod features;
mod harness;
mod metrics;
mod models;
mod output;
mod records;
mod search;
mod stats;
mod transcript;

use clap::Parser;

use crate::cli::Cli;
use crate::error::PipelineError;

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let default_level = if cli.verbose { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

	// 0 keeps rayon's default of one thread per core
	if cli.jobs > 0 {
		rayon::ThreadPoolBuilder::new()
			.num_threads(cli.jobs)
			.build_global()?;
	}

	let config = cli.into_config();
	output::print_config_summary(&config);

	// Fails on a missing corpus before anything is parsed or trained
	let table = corpus::load_feature_table(&config)?;
	if table.is_empty() {
		return Err(PipelineError::EmptyTable.into());
	}

	let counts = table.class_counts();
	println!(
		"Loaded {} samples ({} legitimate, {} suspicious, {} fast-flux).",
		table.len(), counts[0], counts[1], counts[2],
	);
	output::print_table_preview(&table, config.preview_rows);

	if let Some(path) = &config.features_csv {
		output::write_features_csv(path, &table)?;
	}

	println!("\nTraining models...");
	let report = harness::run(&table.to_dataset(), &config)?;
	output::print_harness_report(&report);

	if let Some(path) = &config.metrics_csv {
		output::write_metrics_csv(path, &report.outcomes)?;
	}

	Ok(())
}
