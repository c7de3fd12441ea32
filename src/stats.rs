use std::collections::HashMap;
use std::hash::Hash;

/// Calculate the arithmetic mean of a slice of values.
pub fn mean(values: &[f64]) -> Option<f64> {
	if values.is_empty() {
		return None;
	}
	let sum: f64 = values.iter().sum();
	Some(sum / values.len() as f64)
}

/// Calculate the sample standard deviation (n - 1 denominator).
///
/// Returns:
///   None for fewer than two values, where the sample deviation is undefined.
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
	if values.len() < 2 {
		return None;
	}
	let avg = mean(values)?;
	let variance = values.iter()
		.map(|v| (v - avg).powi(2))
		.sum::<f64>() / (values.len() - 1) as f64;
	Some(variance.sqrt())
}

/// Minimum and maximum of a slice, or None when empty.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
	let first = *values.first()?;
	Some(values.iter().fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))))
}

/// Shannon entropy (base 2) of the symbol frequencies in `items`.
///
/// Formula: sum over distinct symbols of -(f/n) * log2(f/n)
/// Returns 0.0 for an empty slice.
pub fn shannon_entropy<T: Eq + Hash>(items: &[T]) -> f64 {
	if items.is_empty() {
		return 0.0;
	}
	let mut counts: HashMap<&T, usize> = HashMap::new();
	for item in items {
		*counts.entry(item).or_default() += 1;
	}
	let total = items.len() as f64;
	let entropy = counts.values()
		.map(|&count| {
			let p = count as f64 / total;
			-p * p.log2()
		})
		.sum::<f64>();
	// A single symbol sums to -0.0
	if entropy > 0.0 { entropy } else { 0.0 }
}

/// Divide, treating a zero denominator as a zero result.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
	if denominator == 0.0 {
		0.0
	} else {
		numerator / denominator
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_mean() {
		let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
		assert_eq!(mean(&values), Some(3.0));
		assert_eq!(mean(&[]), None);
	}

	#[test]
	fn test_sample_stddev() {
		let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
		let sd = sample_stddev(&values).unwrap();
		// Sample variance = 32 / 7
		assert!((sd - (32.0f64 / 7.0).sqrt()).abs() < 1e-9);
	}

	#[test]
	fn test_sample_stddev_needs_two_values() {
		assert_eq!(sample_stddev(&[]), None);
		assert_eq!(sample_stddev(&[42.0]), None);
	}

	#[test]
	fn test_min_max() {
		assert_eq!(min_max(&[3.0, -1.0, 7.5]), Some((-1.0, 7.5)));
		assert_eq!(min_max(&[]), None);
	}

	#[test]
	fn test_entropy_uniform() {
		let items = ["a", "b", "c", "d"];
		assert!((shannon_entropy(&items) - 2.0).abs() < 1e-12);
	}

	#[test]
	fn test_entropy_repeated_symbols() {
		// p = [0.5, 0.25, 0.25] -> 1.5 bits
		let items = [1, 1, 2, 3];
		assert!((shannon_entropy(&items) - 1.5).abs() < 1e-12);
	}

	#[test]
	fn test_entropy_single_symbol_is_zero() {
		assert_eq!(shannon_entropy(&[7, 7, 7]), 0.0);
		assert_eq!(shannon_entropy::<u8>(&[]), 0.0);
	}

	#[test]
	fn test_ratio_or_zero() {
		assert_eq!(ratio_or_zero(3.0, 0.0), 0.0);
		assert_eq!(ratio_or_zero(3.0, 4.0), 0.75);
	}
}
