use rayon::prelude::*;

use crate::config::{Label, LabeledCorpus, PipelineConfig, N_CLASSES};
use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::features::FeatureVector;
use crate::records::parse_transcript;
use crate::transcript::split_transcripts;

/// One transcript's features plus the label of the corpus it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledRow {
	pub features: FeatureVector,
	pub label: Label,
}

/// All labeled rows, in corpus order then transcript order
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
	rows: Vec<LabeledRow>,
}

impl FeatureTable {
	pub fn from_rows(rows: Vec<LabeledRow>) -> Self {
		Self { rows }
	}

	pub fn rows(&self) -> &[LabeledRow] {
		&self.rows
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Row count per label, indexed by class.
	pub fn class_counts(&self) -> [usize; N_CLASSES] {
		let mut counts = [0usize; N_CLASSES];
		for row in &self.rows {
			counts[row.label.index()] += 1;
		}
		counts
	}

	/// Numeric view used by the models.
	pub fn to_dataset(&self) -> Dataset {
		Dataset::new(
			self.rows.iter().map(|r| r.features.to_array()).collect(),
			self.rows.iter().map(|r| r.label.index()).collect(),
		)
	}
}

/// Validate the config, then load every corpus into one feature table.
///
/// A missing corpus fails here, before any file is read.
pub fn load_feature_table(config: &PipelineConfig) -> Result<FeatureTable, PipelineError> {
	config.validate()?;

	let mut rows = Vec::new();
	for corpus in &config.corpora {
		rows.extend(load_corpus(corpus)?);
	}
	Ok(FeatureTable::from_rows(rows))
}

fn load_corpus(corpus: &LabeledCorpus) -> Result<Vec<LabeledRow>, PipelineError> {
	let text = read_corpus(corpus)?;
	let rows = extract_rows(&text, corpus.label);
	log::info!(
		"{}: {} transcripts from {}",
		corpus.label, rows.len(), corpus.path.display(),
	);
	Ok(rows)
}

/// Read a corpus file, substituting U+FFFD for invalid UTF-8.
pub fn read_corpus(corpus: &LabeledCorpus) -> Result<String, PipelineError> {
	let path = &corpus.path;
	let bytes = std::fs::read(path).map_err(|source| {
		if source.kind() == std::io::ErrorKind::NotFound {
			PipelineError::MissingCorpus { label: corpus.label, path: path.clone() }
		} else {
			PipelineError::ReadCorpus { path: path.clone(), source }
		}
	})?;
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Split, parse, and featurize every transcript in a corpus.
///
/// Transcripts are processed in parallel; the output keeps transcript order.
pub fn extract_rows(text: &str, label: Label) -> Vec<LabeledRow> {
	split_transcripts(text)
		.par_iter()
		.enumerate()
		.map(|(i, transcript)| {
			let records = parse_transcript(transcript);
			if !records.ttl_aligned() {
				log::debug!(
					"{} transcript {}: {} A records but {} TTLs",
					label, i, records.a_records.len(), records.ttls.len(),
				);
			}
			LabeledRow {
				features: FeatureVector::extract(&records),
				label,
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::{Path, PathBuf};

	fn dig(domain: &str, ttl: u32, ips: &[&str]) -> String {
		let mut out = format!("; <<>> DiG 9.18.18 <<>> {}\n;; ANSWER SECTION:\n", domain);
		for ip in ips {
			out.push_str(&format!("{}.\t{}\tIN\tA\t{}\n", domain, ttl, ip));
		}
		out.push('\n');
		out
	}

	fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
		let path = dir.join(name);
		std::fs::write(&path, content).unwrap();
		path
	}

	#[test]
	fn test_rows_follow_corpus_then_transcript_order() {
		let dir = tempfile::tempdir().unwrap();
		let legit = write(dir.path(), "legit.txt", &(dig("a.com", 3600, &["1.1.1.1"]) + &dig("b.com", 3600, &["1.1.1.2", "1.1.1.3"])));
		let susp = write(dir.path(), "susp.txt", &dig("c.com", 300, &["2.2.2.2"]));
		let flux = write(dir.path(), "flux.txt", &dig("d.com", 5, &["3.3.3.3", "4.4.4.4", "5.5.5.5"]));

		let table = load_feature_table(&PipelineConfig::new(legit, susp, flux)).unwrap();
		assert_eq!(table.len(), 4);
		let labels: Vec<Label> = table.rows().iter().map(|r| r.label).collect();
		assert_eq!(labels, vec![Label::Legitimate, Label::Legitimate, Label::Suspicious, Label::FastFlux]);
		let a_counts: Vec<f64> = table.rows().iter().map(|r| r.features.num_a_records).collect();
		assert_eq!(a_counts, vec![1.0, 2.0, 1.0, 3.0]);
		assert_eq!(table.class_counts(), [2, 1, 1]);
	}

	#[test]
	fn test_missing_corpus_fails_before_reading() {
		let dir = tempfile::tempdir().unwrap();
		let present = [
			write(dir.path(), "legit.txt", &dig("a.com", 60, &["1.1.1.1"])),
			write(dir.path(), "susp.txt", &dig("c.com", 300, &["2.2.2.2"])),
			write(dir.path(), "flux.txt", &dig("d.com", 5, &["3.3.3.3"])),
		];
		for missing in Label::ALL {
			let mut paths = present.clone();
			paths[missing.index()] = dir.path().join("nope.txt");
			let [legit, susp, flux] = paths;
			let config = PipelineConfig::new(legit, susp, flux);

			match load_feature_table(&config) {
				Err(PipelineError::MissingCorpus { label, path }) => {
					assert_eq!(label, missing);
					assert!(path.ends_with("nope.txt"));
				}
				other => panic!("{}: unexpected result {:?}", missing, other.map(|t| t.len())),
			}
		}
	}

	#[test]
	fn test_unknown_model_fails_before_reading() {
		let dir = tempfile::tempdir().unwrap();
		let path = write(dir.path(), "legit.txt", &dig("a.com", 60, &["1.1.1.1"]));
		let mut config = PipelineConfig::new(path.clone(), path.clone(), path);
		config.models = vec!["KNN".to_string()];
		assert!(matches!(load_feature_table(&config), Err(PipelineError::UnknownModel(..))));
	}

	#[test]
	fn test_invalid_utf8_is_substituted() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("bad.txt");
		let mut bytes = dig("a.com", 60, &["1.1.1.1"]).into_bytes();
		bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
		bytes.extend_from_slice(dig("b.com", 60, &["1.1.1.2"]).as_bytes());
		std::fs::write(&path, bytes).unwrap();

		let corpus = LabeledCorpus { label: Label::Legitimate, path };
		let text = read_corpus(&corpus).unwrap();
		assert!(text.contains('\u{FFFD}'));
		assert_eq!(extract_rows(&text, Label::Legitimate).len(), 2);
	}

	#[test]
	fn test_malformed_transcript_becomes_zero_row() {
		let text = "; <<>> DiG 9.18 <<>> dead.example\n;; connection timed out; no servers could be reached\n";
		let rows = extract_rows(text, Label::Suspicious);
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].features, FeatureVector::default());
	}

	#[test]
	fn test_to_dataset_keeps_labels() {
		let mut rows = extract_rows(&dig("a.com", 60, &["1.1.1.1"]), Label::Legitimate);
		rows.extend(extract_rows(&dig("b.com", 5, &["2.2.2.2"]), Label::FastFlux));
		let table = FeatureTable { rows };
		let data = table.to_dataset();
		assert_eq!(data.labels(), &[0, 2]);
		assert_eq!(data.rows()[1][1], 5.0);
	}
}
