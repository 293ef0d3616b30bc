//! Pattern extraction: turns a query body into an ordered list of triples.
//!
//! This is not a grammar. The body is scanned line by line and every line that
//! looks like a triple pattern contributes to the output; anything else is
//! skipped so that one malformed line never hides the rest of the query.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::error::{GraphError, Result};

/// Leading markers that make a token a query variable.
pub const VARIABLE_MARKERS: &[char] = &['?', '$'];

static PREFIX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(?:wd|wdt|p|ps|pq|psv|pqv|pr|prv|wdno):").expect("valid regex"));

static CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^(SERVICE|FILTER|OPTIONAL|BIND|VALUES)\b").expect("valid regex")
});

/// A raw textual identifier as written in the query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
	/// Wrap a token exactly as written.
	pub fn new(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	/// The token as written.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Whether the token is written as a variable.
	pub fn is_variable(&self) -> bool {
		self.0.starts_with(VARIABLE_MARKERS)
	}

	/// The normalized identity of this token.
	pub fn normalized(&self) -> String {
		normalize_token(&self.0)
	}
}

impl From<&str> for Token {
	fn from(raw: &str) -> Self {
		Self::new(raw)
	}
}

impl From<String> for Token {
	fn from(raw: String) -> Self {
		Self(raw)
	}
}

/// A subject-predicate-object fragment of the query body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Triple {
	/// Always the leading token of the line or of the current property list.
	pub subject: Token,
	/// Usually a prefixed property such as `wdt:P31`.
	pub predicate: Token,
	/// A variable, entity or literal.
	pub object: Token,
}

impl Triple {
	/// Assemble a triple from its three positions.
	pub fn new(subject: impl Into<Token>, predicate: impl Into<Token>, object: impl Into<Token>) -> Self {
		Self {
			subject: subject.into(),
			predicate: predicate.into(),
			object: object.into(),
		}
	}
}

/// Collapse every spelling of an identifier to its node id.
///
/// `<http://www.wikidata.org/entity/Q5>`, `wd:Q5`, `wd:Q5.` and `Q5` all map to
/// `Q5`. Prefixes and trailing punctuation are stripped until nothing changes,
/// which makes the function idempotent.
pub fn normalize_token(raw: &str) -> String {
	let mut id = raw;
	loop {
		let next = normalize_step(id);
		if next == id {
			return id.to_string();
		}
		id = next;
	}
}

fn normalize_step(id: &str) -> &str {
	let id = id.trim();
	let id = match id.strip_prefix('<') {
		Some(iri) => {
			let iri = trim_terminators(iri);
			let iri = iri.strip_suffix('>').unwrap_or(iri);
			iri.rsplit(['/', '#'])
				.find(|segment| !segment.is_empty())
				.unwrap_or(iri)
		}
		None => id,
	};
	let id = trim_terminators(id);
	match PREFIX.find(id) {
		Some(m) => &id[m.end()..],
		None => id,
	}
}

fn trim_terminators(id: &str) -> &str {
	id.trim_end_matches([';', '.', ','])
}

/// Extract all triple patterns from a query, in encounter order.
///
/// Returns an empty list when the query has no brace-delimited block.
pub fn extract_triples(query: &str) -> Vec<Triple> {
	try_extract_triples(query).unwrap_or_else(|err| {
		debug!("{err}");
		Vec::new()
	})
}

/// Like [`extract_triples`] but reports a missing pattern block.
pub fn try_extract_triples(query: &str) -> Result<Vec<Triple>> {
	let body = pattern_block(query).ok_or(GraphError::NoPatternBlock)?;
	Ok(patterns(&body))
}

fn patterns(body: &str) -> Vec<Triple> {
	let mut triples = Vec::new();
	let mut subject: Option<Token> = None;
	// Brace depth of a skipped multi-line clause still open.
	let mut skip_depth = 0usize;

	for raw_line in body.lines() {
		let line = raw_line.trim();
		if line.is_empty() {
			continue;
		}

		if skip_depth > 0 {
			skip_depth = (skip_depth + count_outside(line, '{')).saturating_sub(count_outside(line, '}'));
			continue;
		}

		if let Some(clause) = CLAUSE.captures(line) {
			debug!("skipping clause line: {line}");
			// OPTIONAL bodies are still patterns; only the opening line goes.
			if !clause[1].eq_ignore_ascii_case("OPTIONAL") {
				skip_depth = count_outside(line, '{').saturating_sub(count_outside(line, '}'));
			}
			continue;
		}

		let line = line.strip_suffix('.').unwrap_or(line);
		let segments = split_outside(line, ';');

		for (idx, segment) in segments.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).enumerate() {
			let tokens = tokenize(segment);
			if tokens.len() < 2 {
				debug!("skipping segment with too few tokens: {segment}");
				continue;
			}

			if idx == 0 && tokens.len() >= 3 {
				let current = Token::new(tokens[0]);
				triples.push(Triple::new(current.clone(), tokens[1], tokens[2]));
				subject = Some(current);
			} else if let Some(current) = &subject {
				triples.push(Triple::new(current.clone(), tokens[0], tokens[1]));
			} else {
				debug!("skipping continuation without a subject: {segment}");
			}
		}
	}

	triples
}

/// The text between the first `{` and the last `}` once comments are gone.
fn pattern_block(query: &str) -> Option<String> {
	let cleaned = strip_comments(query);
	let open = find_outside(&cleaned, '{')?;
	let close = rfind_outside(&cleaned, '}')?;
	(close > open).then(|| cleaned[open + 1..close].to_string())
}

fn strip_comments(query: &str) -> String {
	query
		.lines()
		.map(|line| match find_outside(line, '#') {
			Some(at) => &line[..at],
			None => line,
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// Byte offsets of `needle` that are not inside a string literal or an IRI.
fn positions_outside(text: &str, needle: char) -> Vec<usize> {
	let mut found = Vec::new();
	let mut quote: Option<char> = None;
	let mut in_iri = false;
	let mut escaped = false;

	for (at, c) in text.char_indices() {
		// Literals and IRIs never span lines.
		if c == '\n' {
			quote = None;
			in_iri = false;
			escaped = false;
		}
		if let Some(q) = quote {
			if escaped {
				escaped = false;
			} else if c == '\\' {
				escaped = true;
			} else if c == q {
				quote = None;
			}
			continue;
		}
		if in_iri {
			if c == '>' {
				in_iri = false;
			}
			continue;
		}
		if c == needle {
			found.push(at);
		}
		match c {
			'"' | '\'' => quote = Some(c),
			'<' => in_iri = looks_like_iri(&text[at..]),
			_ => {}
		}
	}
	found
}

// `<` is also a comparison operator; only treat it as an IRI opener when it
// closes before any whitespace.
fn looks_like_iri(rest: &str) -> bool {
	rest[1..]
		.find(|c: char| c == '>' || c.is_whitespace())
		.is_some_and(|end| rest[1..].as_bytes()[end] == b'>')
}

fn find_outside(text: &str, needle: char) -> Option<usize> {
	positions_outside(text, needle).first().copied()
}

fn rfind_outside(text: &str, needle: char) -> Option<usize> {
	positions_outside(text, needle).last().copied()
}

fn count_outside(text: &str, needle: char) -> usize {
	positions_outside(text, needle).len()
}

fn split_outside(text: &str, separator: char) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut start = 0;
	for at in positions_outside(text, separator) {
		parts.push(&text[start..at]);
		start = at + separator.len_utf8();
	}
	parts.push(&text[start..]);
	parts
}

/// Whitespace tokenization that keeps quoted literals together.
fn tokenize(segment: &str) -> Vec<&str> {
	let mut tokens = Vec::new();
	let mut start: Option<usize> = None;
	let mut quote: Option<char> = None;
	let mut escaped = false;

	for (at, c) in segment.char_indices() {
		if let Some(q) = quote {
			if escaped {
				escaped = false;
			} else if c == '\\' {
				escaped = true;
			} else if c == q {
				quote = None;
			}
			continue;
		}
		if c.is_whitespace() {
			if let Some(s) = start.take() {
				tokens.push(&segment[s..at]);
			}
			continue;
		}
		if start.is_none() {
			start = Some(at);
		}
		if c == '"' || c == '\'' {
			quote = Some(c);
		}
	}
	if let Some(s) = start {
		tokens.push(&segment[s..]);
	}
	tokens
}
