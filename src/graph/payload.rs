//! Query-result payload and the `payload -> Graph` pipeline.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::build::{EntityRecord, EntityTable, Graph, GraphBuilder};
use super::error::{GraphError, Result};
use super::extract::try_extract_triples;

/// What the query-execution service hands back after a run.
///
/// Only the members the graph needs are modelled; anything else in the JSON
/// (result rows, summaries) is ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPayload {
	/// Query text as run.
	#[serde(default)]
	pub query: Option<String>,
	/// Labels for the entities the query mentions.
	#[serde(default)]
	pub entity_info: Option<EntityInfo>,
}

/// Entity lookup result in SPARQL JSON results shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
	/// Wrapper matching the `results` member.
	#[serde(default)]
	pub results: EntityResults,
}

/// Rows of the entity lookup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityResults {
	/// One entry per entity.
	#[serde(default)]
	pub bindings: Vec<Binding>,
}

/// One row of the entity lookup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Binding {
	/// Entity IRI.
	#[serde(default)]
	pub id: Option<BindingValue>,
	/// Human name.
	#[serde(default)]
	pub label: Option<BindingValue>,
	/// Optional summary.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<BindingValue>,
}

/// A single bound value; the result format's type tags are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingValue {
	/// The value as text.
	pub value: String,
}

impl BindingValue {
	/// Wrap a plain value.
	pub fn new(value: impl Into<String>) -> Self {
		Self { value: value.into() }
	}
}

impl Binding {
	fn record(&self) -> Option<EntityRecord> {
		let id = self.id.as_ref()?;
		let label = self.label.as_ref()?;
		Some(EntityRecord {
			id: id.value.clone(),
			label: label.value.clone(),
			description: self.description.as_ref().map(|d| d.value.clone()),
		})
	}
}

impl From<&EntityRecord> for Binding {
	fn from(record: &EntityRecord) -> Self {
		Self {
			id: Some(BindingValue::new(&record.id)),
			label: Some(BindingValue::new(&record.label)),
			description: record.description.as_deref().map(BindingValue::new),
		}
	}
}

impl EntityInfo {
	/// Lookup table built from the bindings; rows missing an id or label are
	/// dropped.
	pub fn table(&self) -> EntityTable {
		self.results.bindings.iter().filter_map(Binding::record).collect()
	}
}

impl QueryPayload {
	/// A payload carrying `query` and bindings for `records`.
	pub fn new(query: impl Into<String>, records: &[EntityRecord]) -> Self {
		Self {
			query: Some(query.into()),
			entity_info: Some(EntityInfo {
				results: EntityResults {
					bindings: records.iter().map(Binding::from).collect(),
				},
			}),
		}
	}

	/// Parse the service's JSON response.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	fn query_text(&self) -> Result<&str> {
		self.query
			.as_deref()
			.filter(|q| !q.trim().is_empty())
			.ok_or(GraphError::MissingQuery)
	}
}

/// Entity lookup results that arrive after the graph for `query` was built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LateEnrichment {
	/// Query text of the run the lookup was issued for.
	pub query: String,
	/// The late lookup rows.
	#[serde(default)]
	pub entity_info: EntityInfo,
}

impl LateEnrichment {
	/// Lookup results for `records`, tagged with `query`.
	pub fn new(query: impl Into<String>, records: &[EntityRecord]) -> Self {
		Self {
			query: query.into(),
			entity_info: EntityInfo {
				results: EntityResults {
					bindings: records.iter().map(Binding::from).collect(),
				},
			},
		}
	}
}

/// Parse, build and level the graph for a payload.
pub fn build_query_graph(payload: &QueryPayload) -> Result<Graph> {
	let query = payload.query_text()?;
	let info = payload.entity_info.as_ref().ok_or(GraphError::MissingEntityInfo)?;
	let triples = try_extract_triples(query)?;
	debug!("extracted {} triples", triples.len());

	let graph = GraphBuilder::new().extend(&triples).build(&info.table());
	Ok(graph.leveled())
}

/// [`build_query_graph`] for callers that render nothing on failure.
pub fn graph_for_payload(payload: &QueryPayload) -> Option<Graph> {
	match build_query_graph(payload) {
		Ok(graph) => Some(graph),
		Err(err) => {
			warn!("no query graph: {err}");
			None
		}
	}
}
