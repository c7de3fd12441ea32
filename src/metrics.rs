use crate::config::N_CLASSES;
use crate::stats::ratio_or_zero;

/// Rows are true labels, columns are predicted labels.
pub type ConfusionMatrix = [[usize; N_CLASSES]; N_CLASSES];

/// Precision, recall, and F1 for one class (or an average over classes)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClassMetrics {
	pub precision: f64,
	pub recall: f64,
	pub f1: f64,
	/// True rows of this class in the evaluated set
	pub support: usize,
}

/// Per-class metrics and the confusion matrix for one model on one test set
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
	pub per_class: [ClassMetrics; N_CLASSES],
	pub confusion: ConfusionMatrix,
	pub accuracy: f64,
	pub macro_avg: ClassMetrics,
	pub weighted_avg: ClassMetrics,
}

impl EvaluationReport {
	/// Score predictions against true labels.
	///
	/// A class with no predicted rows has precision 0, a class with no true
	/// rows has recall 0, and F1 is 0 whenever precision + recall is 0.
	/// Labels outside the class range are ignored.
	pub fn from_predictions(y_true: &[usize], y_pred: &[usize]) -> Self {
		let confusion = confusion_matrix(y_true, y_pred);

		let mut per_class = [ClassMetrics::default(); N_CLASSES];
		for (class, metrics) in per_class.iter_mut().enumerate() {
			let tp = confusion[class][class] as f64;
			let predicted: usize = (0..N_CLASSES).map(|t| confusion[t][class]).sum();
			let support: usize = confusion[class].iter().sum();

			let precision = ratio_or_zero(tp, predicted as f64);
			let recall = ratio_or_zero(tp, support as f64);
			*metrics = ClassMetrics {
				precision,
				recall,
				f1: ratio_or_zero(2.0 * precision * recall, precision + recall),
				support,
			};
		}

		let total: usize = per_class.iter().map(|m| m.support).sum();
		let correct: usize = (0..N_CLASSES).map(|c| confusion[c][c]).sum();

		Self {
			per_class,
			confusion,
			accuracy: ratio_or_zero(correct as f64, total as f64),
			macro_avg: average(&per_class, |_| 1.0, total),
			weighted_avg: average(&per_class, |m| m.support as f64, total),
		}
	}

	/// Unweighted mean F1 over all classes.
	pub fn macro_f1(&self) -> f64 {
		self.macro_avg.f1
	}
}

/// Count (true, predicted) pairs.
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize]) -> ConfusionMatrix {
	let mut matrix = [[0usize; N_CLASSES]; N_CLASSES];
	for (&t, &p) in y_true.iter().zip(y_pred) {
		if t < N_CLASSES && p < N_CLASSES {
			matrix[t][p] += 1;
		}
	}
	matrix
}

fn average(per_class: &[ClassMetrics], weight: impl Fn(&ClassMetrics) -> f64, support: usize) -> ClassMetrics {
	let total_weight: f64 = per_class.iter().map(&weight).sum();
	let weighted = |field: fn(&ClassMetrics) -> f64| {
		ratio_or_zero(
			per_class.iter().map(|m| weight(m) * field(m)).sum(),
			total_weight,
		)
	};
	ClassMetrics {
		precision: weighted(|m| m.precision),
		recall: weighted(|m| m.recall),
		f1: weighted(|m| m.f1),
		support,
	}
}
