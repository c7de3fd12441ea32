/// Marker printed by dig at the start of every invocation's output.
pub const BOUNDARY: &str = "; <<>> DiG";

/// Split a corpus into individual dig transcripts.
///
/// Each transcript starts at a boundary marker, which stays attached to the
/// text it introduces. Fragments are trimmed and whitespace-only fragments are
/// dropped. Input without any marker comes back as a single transcript.
pub fn split_transcripts(corpus: &str) -> Vec<&str> {
	let mut starts: Vec<usize> = corpus.match_indices(BOUNDARY)
		.map(|(idx, _)| idx)
		.collect();
	if starts.first() != Some(&0) {
		starts.insert(0, 0);
	}

	let mut transcripts = Vec::with_capacity(starts.len());
	for (i, &start) in starts.iter().enumerate() {
		let end = starts.get(i + 1).copied().unwrap_or(corpus.len());
		let fragment = corpus[start..end].trim();
		if !fragment.is_empty() {
			transcripts.push(fragment);
		}
	}
	transcripts
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_no_marker_yields_whole_input() {
		let corpus = "\n  example.com. 300 IN A 1.2.3.4\n\n";
		let parts = split_transcripts(corpus);
		assert_eq!(parts, vec!["example.com. 300 IN A 1.2.3.4"]);
	}

	#[test]
	fn test_empty_input_yields_nothing() {
		assert!(split_transcripts("").is_empty());
		assert!(split_transcripts(" \n\t\n").is_empty());
	}

	#[test]
	fn test_marker_stays_with_its_transcript() {
		let corpus = "; <<>> DiG 9.18 <<>> a.com\nfirst\n; <<>> DiG 9.18 <<>> b.com\nsecond\n";
		let parts = split_transcripts(corpus);
		assert_eq!(parts.len(), 2);
		assert!(parts[0].starts_with(BOUNDARY));
		assert!(parts[0].ends_with("first"));
		assert!(parts[1].contains("b.com"));
		assert!(parts[1].ends_with("second"));
	}

	#[test]
	fn test_leading_text_before_first_marker_is_kept() {
		let corpus = "preamble\n; <<>> DiG x\nbody";
		let parts = split_transcripts(corpus);
		assert_eq!(parts, vec!["preamble", "; <<>> DiG x\nbody"]);
	}

	#[test]
	fn test_adjacent_markers_drop_nothing_but_empties() {
		let corpus = "; <<>> DiG\n\n; <<>> DiG\n";
		let parts = split_transcripts(corpus);
		// Both fragments still hold the marker text, so neither is empty
		assert_eq!(parts.len(), 2);
	}
}
