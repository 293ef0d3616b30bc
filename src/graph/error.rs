use thiserror::Error;

/// Reasons a payload yields no graph.
///
/// None of these are fatal: callers log them and render nothing.
#[derive(Debug, Error)]
pub enum GraphError {
	/// The payload text did not parse.
	#[error("payload is not valid JSON: {0}")]
	InvalidPayload(#[from] serde_json::Error),

	/// `query` is absent or blank.
	#[error("payload has no query text")]
	MissingQuery,

	/// `entity_info` is absent.
	#[error("payload has no entity info")]
	MissingEntityInfo,

	/// The query has no `{ ... }` block.
	#[error("query has no brace-delimited pattern block")]
	NoPatternBlock,
}

/// Result alias defaulting to [`GraphError`].
pub type Result<T, E = GraphError> = std::result::Result<T, E>;
