use std::collections::HashSet;

use crate::records::RecordSet;
use crate::stats::{mean, min_max, sample_stddev, shannon_entropy};

/// Number of numeric features per transcript.
pub const N_FEATURES: usize = 10;

/// Column names, in `FeatureVector::to_array` order.
pub const COLUMNS: [&str; N_FEATURES] = [
	"num_A_records",
	"ttl_min",
	"ttl_max",
	"ttl_avg",
	"ttl_stddev",
	"num_CNAME_records",
	"num_NS_records",
	"num_additional_records",
	"ip_entropy",
	"num_unique_subnets",
];

/// Fixed-schema numeric summary of one transcript. Every field is finite;
/// record types that are absent fall back to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureVector {
	pub num_a_records: f64,
	pub ttl_min: f64,
	pub ttl_max: f64,
	pub ttl_avg: f64,
	pub ttl_stddev: f64,
	pub num_cname_records: f64,
	pub num_ns_records: f64,
	pub num_additional_records: f64,
	pub ip_entropy: f64,
	pub num_unique_subnets: f64,
}

impl FeatureVector {
	/// Compute the feature vector for a parsed transcript.
	pub fn extract(records: &RecordSet) -> Self {
		let ttls: Vec<f64> = records.ttls.iter().map(|&t| f64::from(t)).collect();
		let (ttl_min, ttl_max) = min_max(&ttls).unwrap_or((0.0, 0.0));

		Self {
			num_a_records: records.a_records.len() as f64,
			ttl_min,
			ttl_max,
			ttl_avg: mean(&ttls).unwrap_or(0.0),
			ttl_stddev: sample_stddev(&ttls).unwrap_or(0.0),
			num_cname_records: records.cnames.len() as f64,
			num_ns_records: records.nameservers.len() as f64,
			num_additional_records: records.additional_a_records.len() as f64,
			ip_entropy: shannon_entropy(&records.a_records),
			num_unique_subnets: unique_subnets(records) as f64,
		}
	}

	/// Values in `COLUMNS` order.
	pub fn to_array(&self) -> [f64; N_FEATURES] {
		[
			self.num_a_records,
			self.ttl_min,
			self.ttl_max,
			self.ttl_avg,
			self.ttl_stddev,
			self.num_cname_records,
			self.num_ns_records,
			self.num_additional_records,
			self.ip_entropy,
			self.num_unique_subnets,
		]
	}
}

/// Count distinct /24 prefixes ("a.b.c") among the A records.
fn unique_subnets(records: &RecordSet) -> usize {
	records.a_records.iter()
		.map(|ip| {
			let [a, b, c, _] = ip.octets();
			(a, b, c)
		})
		.collect::<HashSet<_>>()
		.len()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::records::parse_transcript;
	use std::net::Ipv4Addr;

	fn record_set(ips: &[[u8; 4]], ttls: &[u32]) -> RecordSet {
		RecordSet {
			a_records: ips.iter().map(|o| Ipv4Addr::from(*o)).collect(),
			ttls: ttls.to_vec(),
			..RecordSet::default()
		}
	}

	#[test]
	fn test_answer_fixture() {
		let transcript = "\
; <<>> DiG 9.18 <<>> flux.example
flux.example.	300	IN	A	1.2.3.4
flux.example.	300	IN	A	1.2.3.5
flux.example.	600	IN	A	9.9.9.9

;; ADDITIONAL SECTION:
";
		let fv = FeatureVector::extract(&parse_transcript(transcript));
		assert_eq!(fv.num_a_records, 3.0);
		assert_eq!(fv.ttl_min, 300.0);
		assert_eq!(fv.ttl_max, 600.0);
		assert!((fv.ttl_avg - 400.0).abs() < 1e-9);
		assert_eq!(fv.num_unique_subnets, 2.0);
		assert_eq!(fv.num_additional_records, 0.0);
		// Three distinct IPs
		assert!((fv.ip_entropy - 3f64.log2()).abs() < 1e-9);
		// Sample stddev of [300, 300, 600]
		assert!((fv.ttl_stddev - 30000f64.sqrt()).abs() < 1e-9);
	}

	#[test]
	fn test_no_records_is_all_zero() {
		let fv = FeatureVector::extract(&parse_transcript(";; connection timed out"));
		assert_eq!(fv, FeatureVector::default());
		assert!(fv.to_array().iter().all(|v| v.is_finite()));
	}

	#[test]
	fn test_single_ttl_has_zero_stddev() {
		let fv = FeatureVector::extract(&record_set(&[[10, 0, 0, 1]], &[120]));
		assert_eq!(fv.ttl_stddev, 0.0);
		assert_eq!(fv.ttl_min, 120.0);
		assert_eq!(fv.ttl_max, 120.0);
		assert_eq!(fv.ttl_avg, 120.0);
	}

	#[test]
	fn test_ip_features_ignore_order() {
		let ips = [[1, 2, 3, 4], [1, 2, 3, 4], [5, 6, 7, 8], [1, 2, 9, 9], [5, 6, 7, 1]];
		let forward = FeatureVector::extract(&record_set(&ips, &[]));

		let mut reversed = ips;
		reversed.reverse();
		let mut rotated = ips;
		rotated.rotate_left(2);

		for permuted in [reversed, rotated] {
			let fv = FeatureVector::extract(&record_set(&permuted, &[]));
			assert_eq!(fv.ip_entropy, forward.ip_entropy);
			assert_eq!(fv.num_unique_subnets, forward.num_unique_subnets);
		}
		assert_eq!(forward.num_unique_subnets, 3.0);
	}

	#[test]
	fn test_counts_cname_ns_additional() {
		let set = RecordSet {
			a_records: vec![Ipv4Addr::new(8, 8, 8, 8)],
			ttls: vec![],
			cnames: vec!["a.".into(), "b.".into()],
			nameservers: vec!["ns1.".into()],
			additional_a_records: vec![Ipv4Addr::new(8, 8, 8, 8)],
		};
		let fv = FeatureVector::extract(&set);
		assert_eq!(fv.num_cname_records, 2.0);
		assert_eq!(fv.num_ns_records, 1.0);
		assert_eq!(fv.num_additional_records, 1.0);
		assert_eq!(fv.ip_entropy, 0.0);
		// A records without TTLs leave the TTL features at zero
		assert_eq!(fv.ttl_max, 0.0);
	}

	#[test]
	fn test_column_order_matches_array() {
		let fv = FeatureVector { ttl_avg: 7.0, num_unique_subnets: 3.0, ..Default::default() };
		let values = fv.to_array();
		let idx = |name: &str| COLUMNS.iter().position(|c| *c == name).unwrap();
		assert_eq!(values[idx("ttl_avg")], 7.0);
		assert_eq!(values[idx("num_unique_subnets")], 3.0);
	}
}
