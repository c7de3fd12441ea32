use std::path::Path;

use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL};

use anyhow::Result;

use crate::config::{Label, PipelineConfig};
use crate::corpus::FeatureTable;
use crate::features::COLUMNS;
use crate::harness::{HarnessReport, ModelOutcome};
use crate::metrics::{ClassMetrics, EvaluationReport};

/// Print a summary of the run configuration before loading.
pub fn print_config_summary(config: &PipelineConfig) {
	println!("Fast-Flux Classifier Configuration");
	println!("==================================");
	for corpus in &config.corpora {
		println!("{:<16}{}", format!("{}:", corpus.label), corpus.path.display());
	}
	println!("Test fraction:  {}", config.test_fraction);
	println!("Seed:           {}", config.seed);
	if config.models.is_empty() {
		println!("Models:         all");
	} else {
		println!("Models:         {}", config.models.join(", "));
	}
	let search_label = if config.grid_search { "yes" } else { "no" };
	println!("Grid search:    {}", search_label);
	if config.grid_search {
		println!("CV folds:       {}", config.cv_folds);
	}
	println!();
}

fn feature_cell(value: f64) -> String {
	if value.fract() == 0.0 {
		format!("{}", value)
	} else {
		format!("{:.4}", value)
	}
}

/// Print the first `limit` rows of the feature table.
pub fn print_table_preview(table: &FeatureTable, limit: usize) {
	if limit == 0 || table.is_empty() {
		return;
	}
	let mut preview = Table::new();
	preview.load_preset(UTF8_FULL);
	preview.set_content_arrangement(ContentArrangement::Dynamic);
	let mut header: Vec<&str> = COLUMNS.to_vec();
	header.push("label");
	preview.set_header(header);

	for row in table.rows().iter().take(limit) {
		let mut cells: Vec<String> = row.features.to_array().iter().map(|&v| feature_cell(v)).collect();
		cells.push(row.label.index().to_string());
		preview.add_row(cells);
	}

	println!("{preview}");
}

fn metrics_cells(name: &str, m: &ClassMetrics) -> Vec<String> {
	vec![
		name.to_string(),
		format!("{:.2}", m.precision),
		format!("{:.2}", m.recall),
		format!("{:.2}", m.f1),
		m.support.to_string(),
	]
}

/// Print one model's classification report and confusion matrix.
pub fn print_report(name: &str, report: &EvaluationReport) {
	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec!["Class", "Precision", "Recall", "F1", "Support"]);
	for label in Label::ALL {
		table.add_row(metrics_cells(&format!("{} ({})", label.index(), label), &report.per_class[label.index()]));
	}
	let total: usize = report.per_class.iter().map(|m| m.support).sum();
	table.add_row(vec![
		"accuracy".to_string(),
		String::new(),
		String::new(),
		format!("{:.2}", report.accuracy),
		total.to_string(),
	]);
	table.add_row(metrics_cells("macro avg", &report.macro_avg));
	table.add_row(metrics_cells("weighted avg", &report.weighted_avg));

	let mut confusion = Table::new();
	confusion.load_preset(UTF8_FULL);
	confusion.set_content_arrangement(ContentArrangement::Dynamic);
	let mut header = vec!["true \\ predicted".to_string()];
	header.extend(Label::ALL.iter().map(|l| l.index().to_string()));
	confusion.set_header(header);
	for label in Label::ALL {
		let mut cells = vec![format!("{} ({})", label.index(), label)];
		cells.extend(report.confusion[label.index()].iter().map(|n| n.to_string()));
		confusion.add_row(cells);
	}

	let title = format!("{} Results", name);
	println!("\n{}", title);
	println!("{}\n", "=".repeat(title.len()));
	println!("{table}");
	println!("\nConfusion Matrix");
	println!("{confusion}");
}

/// Print every model's report in order, then a summary of the run.
pub fn print_harness_report(report: &HarnessReport) {
	println!(
		"\nTrained on {} rows, evaluated on {} rows",
		report.train_size, report.test_size,
	);
	if let Some(search) = &report.grid_search {
		let mut table = Table::new();
		table.load_preset(UTF8_FULL);
		table.set_content_arrangement(ContentArrangement::Dynamic);
		table.set_header(vec!["Parameters", "Mean macro F1"]);
		for (params, score) in &search.scores {
			table.add_row(vec![params.to_string(), format!("{:.4}", score)]);
		}
		println!("\nGrid Search");
		println!("===========\n");
		println!("{table}");
		println!("Best parameters: {} (mean macro F1 {:.4})", search.best, search.best_score);
	}

	for outcome in &report.outcomes {
		match &outcome.result {
			Ok(eval) => print_report(&outcome.name, eval),
			Err(e) => println!("\n{}: FAILED ({})", outcome.name, e),
		}
	}

	print_summary_table(&report.outcomes);
}

fn print_summary_table(outcomes: &[ModelOutcome]) {
	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec!["Model", "Accuracy", "Macro F1", "Status"]);
	for outcome in outcomes {
		match &outcome.result {
			Ok(eval) => table.add_row(vec![
				outcome.name.clone(),
				format!("{:.4}", eval.accuracy),
				format!("{:.4}", eval.macro_f1()),
				"ok".to_string(),
			]),
			Err(e) => table.add_row(vec![
				outcome.name.clone(),
				"-".to_string(),
				"-".to_string(),
				format!("failed: {}", e),
			]),
		};
	}

	println!("\nSummary");
	println!("=======\n");
	println!("{table}");
}

/// Write the feature table to a CSV file.
pub fn write_features_csv(path: &Path, table: &FeatureTable) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;

	let mut header: Vec<&str> = COLUMNS.to_vec();
	header.push("label");
	writer.write_record(&header)?;

	for row in table.rows() {
		let mut record: Vec<String> = row.features.to_array().iter().map(|v| v.to_string()).collect();
		record.push(row.label.index().to_string());
		writer.write_record(&record)?;
	}

	writer.flush()?;
	println!("\nFeature table written to: {}", path.display());
	Ok(())
}

/// Write per-model, per-class metrics to a CSV file. Failed models are skipped.
pub fn write_metrics_csv(path: &Path, outcomes: &[ModelOutcome]) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;

	writer.write_record(["model", "class", "precision", "recall", "f1", "support", "accuracy"])?;

	for outcome in outcomes {
		let Ok(eval) = &outcome.result else {
			continue;
		};
		for label in Label::ALL {
			let m = &eval.per_class[label.index()];
			writer.write_record([
				outcome.name.clone(),
				label.index().to_string(),
				format!("{:.4}", m.precision),
				format!("{:.4}", m.recall),
				format!("{:.4}", m.f1),
				m.support.to_string(),
				format!("{:.4}", eval.accuracy),
			])?;
		}
	}

	writer.flush()?;
	println!("\nMetrics written to: {}", path.display());
	Ok(())
}
