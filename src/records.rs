use std::net::Ipv4Addr;

/// Header dig prints before the additional section.
pub const ADDITIONAL_MARKER: &str = "ADDITIONAL SECTION:";

/// One record-level fact found while walking a transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordEvent {
	/// `IN A <ipv4>`; `ttl` is set when the token before `IN` is an integer
	A { ttl: Option<u32>, addr: Ipv4Addr },
	Cname(String),
	Ns(String),
	/// First `ADDITIONAL SECTION:` marker; every later A record is additional
	AdditionalSection,
}

/// DNS answer data extracted from one transcript
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
	/// Every A record in the transcript, additional section included
	pub a_records: Vec<Ipv4Addr>,
	/// TTLs of the A records that had one, in order of appearance
	pub ttls: Vec<u32>,
	pub cnames: Vec<String>,
	pub nameservers: Vec<String>,
	/// A records after the additional-section marker
	pub additional_a_records: Vec<Ipv4Addr>,
}

impl RecordSet {
	/// Fold a tokenized transcript into its record lists.
	pub fn from_events(events: &[RecordEvent]) -> Self {
		let mut set = RecordSet::default();
		let mut in_additional = false;
		for event in events {
			match event {
				RecordEvent::A { ttl, addr } => {
					set.a_records.push(*addr);
					if let Some(ttl) = ttl {
						set.ttls.push(*ttl);
					}
					if in_additional {
						set.additional_a_records.push(*addr);
					}
				}
				RecordEvent::Cname(target) => set.cnames.push(target.clone()),
				RecordEvent::Ns(target) => set.nameservers.push(target.clone()),
				RecordEvent::AdditionalSection => in_additional = true,
			}
		}
		set
	}

	/// True when every A record contributed exactly one TTL.
	///
	/// The TTL list is kept independent of the A-record list; a false value
	/// means index `i` of one does not necessarily describe index `i` of the other.
	pub fn ttl_aligned(&self) -> bool {
		self.ttls.len() == self.a_records.len()
	}
}

/// Parse a transcript into its record set. Never fails; unmatched record
/// types simply come back empty.
pub fn parse_transcript(transcript: &str) -> RecordSet {
	RecordSet::from_events(&tokenize(transcript))
}

/// Walk a transcript once, line by line, emitting record events in order.
///
/// Only the first additional-section marker counts. Text after it on the same
/// line belongs to the additional section, as does everything that follows.
pub fn tokenize(transcript: &str) -> Vec<RecordEvent> {
	let mut events = Vec::new();
	let mut in_additional = false;

	for line in transcript.lines() {
		if !in_additional {
			if let Some(pos) = line.find(ADDITIONAL_MARKER) {
				scan_line(&line[..pos], &mut events);
				events.push(RecordEvent::AdditionalSection);
				in_additional = true;
				scan_line(&line[pos + ADDITIONAL_MARKER.len()..], &mut events);
				continue;
			}
		}
		scan_line(line, &mut events);
	}
	events
}

/// Emit events for every `IN <type> <value>` token run on one line.
fn scan_line(line: &str, events: &mut Vec<RecordEvent>) {
	let tokens: Vec<&str> = line.split_whitespace().collect();
	for (i, token) in tokens.iter().enumerate() {
		if *token != "IN" {
			continue;
		}
		let (Some(&rtype), Some(&value)) = (tokens.get(i + 1), tokens.get(i + 2)) else {
			continue;
		};
		match rtype {
			"A" => {
				if let Some(addr) = parse_ipv4(value) {
					let ttl = i.checked_sub(1).and_then(|j| parse_ttl(tokens[j]));
					events.push(RecordEvent::A { ttl, addr });
				}
			}
			"CNAME" => events.push(RecordEvent::Cname(value.to_string())),
			"NS" => events.push(RecordEvent::Ns(value.to_string())),
			_ => {}
		}
	}
}

fn parse_ipv4(token: &str) -> Option<Ipv4Addr> {
	token.parse().ok()
}

fn parse_ttl(token: &str) -> Option<u32> {
	if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	token.parse().ok()
}
