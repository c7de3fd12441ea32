//! Linear support vector machine, one-vs-rest.
//!
//! Each binary problem minimizes `0.5 * |w|^2 + sum_i C_i * max(0, 1 - y_i w.x_i)^2`
//! with dual coordinate descent. The intercept is learned as the weight of
//! a constant 1 feature. Inputs are standardized with training-set mean and
//! deviation first.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::N_CLASSES;
use crate::dataset::Dataset;
use crate::error::ModelError;
use crate::features::N_FEATURES;
use super::{argmax, check_training_set, Classifier};

/// Features plus the constant intercept term.
const DIM: usize = N_FEATURES + 1;

/// Linear SVM hyperparameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvmParams {
	/// Regularization strength; larger values fit the training set harder
	pub c: f64,
	/// Stop once the projected-gradient spread drops below this
	pub tol: f64,
	pub max_iter: usize,
	/// Scale C per class by n / (classes * class_count)
	pub balanced: bool,
	pub seed: u64,
}

impl Default for SvmParams {
	fn default() -> Self {
		Self {
			c: 1.0,
			tol: 1e-4,
			max_iter: 5000,
			balanced: true,
			seed: 42,
		}
	}
}

/// Per-feature standardization learned from the training rows
#[derive(Debug, Clone)]
struct Standardizer {
	mean: [f64; N_FEATURES],
	scale: [f64; N_FEATURES],
}

impl Standardizer {
	fn fit(rows: &[[f64; N_FEATURES]]) -> Self {
		let n = rows.len().max(1) as f64;
		let mut mean = [0.0; N_FEATURES];
		for row in rows {
			for (m, v) in mean.iter_mut().zip(row) {
				*m += v / n;
			}
		}
		let mut scale = [0.0; N_FEATURES];
		for row in rows {
			for j in 0..N_FEATURES {
				scale[j] += (row[j] - mean[j]).powi(2) / n;
			}
		}
		for s in scale.iter_mut() {
			*s = s.sqrt();
			// Constant columns pass through centered
			if *s < 1e-12 {
				*s = 1.0;
			}
		}
		Self { mean, scale }
	}

	fn transform(&self, row: &[f64; N_FEATURES]) -> [f64; DIM] {
		let mut out = [1.0; DIM];
		for j in 0..N_FEATURES {
			out[j] = (row[j] - self.mean[j]) / self.scale[j];
		}
		out
	}
}

fn dot(a: &[f64; DIM], b: &[f64; DIM]) -> f64 {
	a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[derive(Debug, Clone)]
pub struct LinearSvm {
	params: SvmParams,
	scaler: Option<Standardizer>,
	classes: Vec<usize>,
	/// One weight vector per entry in `classes`
	weights: Vec<[f64; DIM]>,
}

impl LinearSvm {
	pub fn new(params: SvmParams) -> Self {
		Self {
			params,
			scaler: None,
			classes: Vec::new(),
			weights: Vec::new(),
		}
	}

	/// Solve one binary problem with labels in {-1, +1}.
	///
	/// Returns the weights and whether the solver converged within `max_iter`.
	fn solve_binary(&self, x: &[[f64; DIM]], y: &[f64], costs: &[f64], rng: &mut StdRng) -> ([f64; DIM], bool) {
		let n = x.len();
		let diag: Vec<f64> = costs.iter().map(|c| 0.5 / c).collect();
		let qd: Vec<f64> = x.iter().zip(&diag).map(|(xi, d)| dot(xi, xi) + d).collect();
		let mut alpha = vec![0.0; n];
		let mut w = [0.0; DIM];
		let mut order: Vec<usize> = (0..n).collect();

		for _ in 0..self.params.max_iter {
			order.shuffle(rng);
			let mut pg_max = f64::NEG_INFINITY;
			let mut pg_min = f64::INFINITY;

			for &i in &order {
				let g = y[i] * dot(&w, &x[i]) - 1.0 + diag[i] * alpha[i];
				let pg = if alpha[i] == 0.0 { g.min(0.0) } else { g };
				pg_max = pg_max.max(pg);
				pg_min = pg_min.min(pg);

				if pg.abs() > 1e-12 {
					let old = alpha[i];
					alpha[i] = (old - g / qd[i]).max(0.0);
					let delta = (alpha[i] - old) * y[i];
					for (wj, xj) in w.iter_mut().zip(&x[i]) {
						*wj += delta * xj;
					}
				}
			}

			if pg_max - pg_min <= self.params.tol {
				return (w, true);
			}
		}
		(w, false)
	}
}

impl Classifier for LinearSvm {
	fn name(&self) -> &str {
		"LinearSVM"
	}

	fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
		check_training_set(data)?;
		let scaler = Standardizer::fit(data.rows());
		let x: Vec<[f64; DIM]> = data.rows().iter().map(|r| scaler.transform(r)).collect();
		let classes = data.classes_present();
		let counts = data.class_counts();
		let n = data.len() as f64;

		let mut class_cost = [self.params.c; N_CLASSES];
		if self.params.balanced {
			for &c in &classes {
				class_cost[c] = self.params.c * n / (classes.len() as f64 * counts[c] as f64);
			}
		}
		let costs: Vec<f64> = data.labels().iter().map(|&l| class_cost[l]).collect();

		let mut weights = Vec::with_capacity(classes.len());
		if classes.len() > 1 {
			let mut rng = StdRng::seed_from_u64(self.params.seed);
			for &class in &classes {
				let y: Vec<f64> = data.labels().iter()
					.map(|&l| if l == class { 1.0 } else { -1.0 })
					.collect();
				let (w, converged) = self.solve_binary(&x, &y, &costs, &mut rng);
				if !converged {
					log::warn!(
						"LinearSVM: class {} did not converge in {} iterations",
						class, self.params.max_iter,
					);
				}
				weights.push(w);
			}
		}

		self.scaler = Some(scaler);
		self.classes = classes;
		self.weights = weights;
		Ok(())
	}

	fn predict(&self, rows: &[[f64; N_FEATURES]]) -> Result<Vec<usize>, ModelError> {
		let scaler = self.scaler.as_ref().ok_or(ModelError::NotFitted)?;
		// One class seen in training: nothing to separate
		if self.weights.is_empty() {
			return Ok(vec![self.classes[0]; rows.len()]);
		}
		Ok(rows.iter()
			.map(|row| {
				let x = scaler.transform(row);
				let scores: Vec<f64> = self.weights.iter().map(|w| dot(w, &x)).collect();
				self.classes[argmax(&scores)]
			})
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn row(values: &[f64]) -> [f64; N_FEATURES] {
		let mut r = [0.0; N_FEATURES];
		r[..values.len()].copy_from_slice(values);
		r
	}

	#[test]
	fn test_standardizer_centers_and_scales() {
		let rows = vec![row(&[1.0, 5.0]), row(&[3.0, 5.0])];
		let s = Standardizer::fit(&rows);
		let a = s.transform(&rows[0]);
		let b = s.transform(&rows[1]);
		assert!((a[0] + 1.0).abs() < 1e-12);
		assert!((b[0] - 1.0).abs() < 1e-12);
		// Constant column maps to zero, intercept stays 1
		assert_eq!(a[1], 0.0);
		assert_eq!(a[N_FEATURES], 1.0);
	}

	#[test]
	fn test_binary_margin() {
		let mut rows = Vec::new();
		let mut labels = Vec::new();
		for i in 0..10 {
			rows.push(row(&[i as f64, 3600.0]));
			labels.push(0);
			rows.push(row(&[20.0 + i as f64, 60.0]));
			labels.push(1);
		}
		let data = Dataset::new(rows, labels);
		let mut svm = LinearSvm::new(SvmParams::default());
		svm.fit(&data).unwrap();
		assert_eq!(svm.predict(data.rows()).unwrap(), data.labels());
		assert_eq!(svm.predict(&[row(&[-5.0, 4000.0]), row(&[40.0, 10.0])]).unwrap(), vec![0, 1]);
	}

	#[test]
	fn test_single_class_training() {
		let data = Dataset::new(vec![row(&[1.0]), row(&[2.0])], vec![1, 1]);
		let mut svm = LinearSvm::new(SvmParams::default());
		svm.fit(&data).unwrap();
		assert_eq!(svm.predict(&[row(&[100.0])]).unwrap(), vec![1]);
	}

	#[test]
	fn test_balanced_costs_follow_class_size() {
		// 18 vs 2 rows; the minority class still gets recalled
		let mut rows = Vec::new();
		let mut labels = Vec::new();
		for i in 0..18 {
			rows.push(row(&[i as f64 * 0.1]));
			labels.push(0);
		}
		for i in 0..2 {
			rows.push(row(&[5.0 + i as f64]));
			labels.push(2);
		}
		let data = Dataset::new(rows, labels);
		let mut svm = LinearSvm::new(SvmParams::default());
		svm.fit(&data).unwrap();
		let predicted = svm.predict(data.rows()).unwrap();
		assert_eq!(&predicted[18..], &[2, 2]);
	}
}
