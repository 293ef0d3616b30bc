use std::collections::{HashMap, HashSet};
use std::fmt;

use log::{debug, info};

use super::extract::{Token, Triple};

/// Syntactic kind of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// A query placeholder such as `?item`.
	Variable,
	/// A fixed entity or relation reference such as `wd:Q5`.
	Term,
}

impl NodeKind {
	/// Kind implied by how the token is written.
	pub fn of(token: &Token) -> Self {
		if token.is_variable() {
			Self::Variable
		} else {
			Self::Term
		}
	}

	/// The other kind.
	pub fn opposite(self) -> Self {
		match self {
			Self::Variable => Self::Term,
			Self::Term => Self::Variable,
		}
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Variable => f.write_str("Variable"),
			Self::Term => f.write_str("Term"),
		}
	}
}

/// A variable or term of the query.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Normalized token; unique within a graph.
	pub id: String,
	/// Variable or term, from the token spelling.
	pub kind: NodeKind,
	/// Display name, the id unless an entity record supplied one.
	pub label: String,
	/// Entity description, shown in the hover tooltip.
	pub description: Option<String>,
	/// Hop distance from the root; `None` until the graph is leveled.
	pub level: Option<u32>,
}

impl Node {
	fn new(id: String, kind: NodeKind) -> Self {
		Self {
			label: id.clone(),
			id,
			kind,
			description: None,
			level: None,
		}
	}

	/// Whether an entity record replaced the default label.
	pub fn is_enriched(&self) -> bool {
		self.label != self.id
	}
}

/// Directed predicate link between two nodes, by node id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
	/// Subject node id.
	pub source: String,
	/// Object node id.
	pub target: String,
	/// Normalized predicate; part of the edge identity.
	pub predicate: String,
	/// Display name of the predicate.
	pub label: String,
}

impl Edge {
	/// Identity used for deduplication.
	pub fn key(&self) -> (&str, &str, &str) {
		(&self.source, &self.predicate, &self.target)
	}
}

/// Human-readable information about an entity, as returned by the lookup
/// service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityRecord {
	/// Entity IRI or bare id; matched on its last path segment.
	pub id: String,
	/// Human name.
	pub label: String,
	/// Optional one-line summary.
	pub description: Option<String>,
}

impl EntityRecord {
	/// A record without a description.
	pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			description: None,
		}
	}

	/// Attach a description.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// The id with any IRI path stripped (`.../entity/Q95` -> `Q95`).
	pub fn short_id(&self) -> &str {
		self.id.rsplit('/').next().unwrap_or(&self.id)
	}
}

/// Entity records available for enrichment.
///
/// Lookups scan in order and the first matching record wins. Which of several
/// matching records is "first" is whatever order the lookup service returned,
/// no stronger tie-break is applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityTable {
	records: Vec<EntityRecord>,
}

impl EntityTable {
	/// Table over `records`, kept in the given order.
	pub fn new(records: Vec<EntityRecord>) -> Self {
		Self { records }
	}

	/// Whether there is nothing to enrich from.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Number of records.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Find a record for a node by normalized id or case-insensitive label.
	pub fn lookup(&self, id: &str, label: &str) -> Option<&EntityRecord> {
		let label = label.to_lowercase();
		self.records
			.iter()
			.find(|r| r.short_id() == id || r.label.to_lowercase() == label)
	}

	/// Find a record by normalized id only.
	pub fn lookup_id(&self, id: &str) -> Option<&EntityRecord> {
		self.records.iter().find(|r| r.short_id() == id)
	}
}

impl FromIterator<EntityRecord> for EntityTable {
	fn from_iter<I: IntoIterator<Item = EntityRecord>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect())
	}
}

/// Immutable snapshot of a query's structure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
	pub(crate) nodes: Vec<Node>,
	pub(crate) edges: Vec<Edge>,
	index: HashMap<String, usize>,
}

impl Graph {
	/// Nodes in first-seen order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Deduplicated edges in first-seen order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Node by normalized id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Position of a node in [`Graph::nodes`].
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// True when the query produced no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Overwrite labels from a table that arrived after the graph was built.
	///
	/// Returns how many nodes and edges changed.
	pub fn enrich(&mut self, table: &EntityTable) -> usize {
		let mut changed = 0;
		for node in self.nodes.iter_mut().filter(|n| n.kind == NodeKind::Term) {
			if let Some(record) = table.lookup(&node.id, &node.label) {
				if node.label != record.label || node.description != record.description {
					debug!("enriched node {} with label {}", node.id, record.label);
					node.label = record.label.clone();
					node.description = record.description.clone();
					changed += 1;
				}
			}
		}
		for edge in &mut self.edges {
			if let Some(record) = table.lookup_id(&edge.predicate) {
				if edge.label != record.label {
					edge.label = record.label.clone();
					changed += 1;
				}
			}
		}
		changed
	}
}

/// Accumulates triples into a deduplicated [`Graph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
	graph: Graph,
	edge_keys: HashSet<(String, String, String)>,
}

impl GraphBuilder {
	/// An empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register the node for a token, returning its id.
	pub fn add_node(&mut self, token: &Token) -> String {
		let id = token.normalized();
		if !self.graph.index.contains_key(&id) {
			let kind = NodeKind::of(token);
			debug!("added node {id} ({kind})");
			self.graph.index.insert(id.clone(), self.graph.nodes.len());
			self.graph.nodes.push(Node::new(id.clone(), kind));
		}
		id
	}

	/// Add an edge unless one with the same key exists.
	pub fn add_edge(&mut self, source: String, predicate: &Token, target: String) {
		let predicate = predicate.normalized();
		let key = (source.clone(), predicate.clone(), target.clone());
		if self.edge_keys.insert(key) {
			debug!("added edge {source} -[{predicate}]-> {target}");
			self.graph.edges.push(Edge {
				source,
				target,
				label: predicate.clone(),
				predicate,
			});
		}
	}

	/// Add both endpoints and the edge between them.
	pub fn add_triple(&mut self, triple: &Triple) {
		let source = self.add_node(&triple.subject);
		let target = self.add_node(&triple.object);
		self.add_edge(source, &triple.predicate, target);
	}

	/// [`GraphBuilder::add_triple`] for each triple, in order.
	pub fn extend<'a>(mut self, triples: impl IntoIterator<Item = &'a Triple>) -> Self {
		for triple in triples {
			self.add_triple(triple);
		}
		self
	}

	/// Enrich every Term node once against `table` and hand out the snapshot.
	pub fn build(mut self, table: &EntityTable) -> Graph {
		self.graph.enrich(table);
		info!(
			"built query graph: {} nodes, {} edges",
			self.graph.nodes.len(),
			self.graph.edges.len()
		);
		self.graph
	}
}

/// Build a graph from triples in one call.
pub fn build_graph(triples: &[Triple], table: &EntityTable) -> Graph {
	GraphBuilder::new().extend(triples).build(table)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn triple(s: &str, p: &str, o: &str) -> Triple {
		Triple::new(s, p, o)
	}

	#[test]
	fn spelling_variants_share_a_node() {
		let graph = build_graph(
			&[
				triple("?film", "wdt:P57", "wd:Q8006"),
				triple("?film", "wdt:P161", "Q8006."),
				triple("?film.", "wdt:P31", "<http://www.wikidata.org/entity/Q8006>"),
			],
			&EntityTable::default(),
		);
		assert_eq!(graph.nodes().len(), 2);
		assert_eq!(graph.node("Q8006").map(|n| n.kind), Some(NodeKind::Term));
		assert_eq!(graph.node("?film").map(|n| n.kind), Some(NodeKind::Variable));
	}

	#[test]
	fn duplicate_triples_collapse() {
		let t = triple("?a", "wdt:P1", "?b");
		let graph = build_graph(&[t.clone(), t.clone(), triple("?a", "P1", "?b.")], &EntityTable::default());
		assert_eq!(graph.edges().len(), 1);
	}

	#[test]
	fn parallel_predicates_are_kept() {
		let graph = build_graph(
			&[triple("?a", "wdt:P1", "?b"), triple("?a", "wdt:P2", "?b")],
			&EntityTable::default(),
		);
		assert_eq!(graph.edges().len(), 2);
	}

	#[test]
	fn enrichment_by_id_and_label() {
		let table: EntityTable = [
			EntityRecord::new("http://www.wikidata.org/entity/Q95", "X Corp").with_description("company"),
			EntityRecord::new("http://www.wikidata.org/entity/Q1", "tokyo"),
			EntityRecord::new("http://www.wikidata.org/entity/P112", "founded by"),
		]
		.into_iter()
		.collect();
		let graph = build_graph(
			&[triple("?x", "wdt:P112", "wd:Q95"), triple("?x", "wdt:P131", "Tokyo")],
			&table,
		);

		let q95 = graph.node("Q95").expect("Q95 node");
		assert_eq!(q95.label, "X Corp");
		assert_eq!(q95.description.as_deref(), Some("company"));
		assert_eq!(graph.node("Tokyo").map(|n| n.label.as_str()), Some("tokyo"));
		assert_eq!(graph.edges()[0].label, "founded by");
		assert_eq!(graph.edges()[0].predicate, "P112");
	}

	#[test]
	fn variables_are_never_enriched() {
		let table = EntityTable::new(vec![EntityRecord::new("?x", "should not apply")]);
		let graph = build_graph(&[triple("?x", "wdt:P1", "?y")], &table);
		assert_eq!(graph.node("?x").map(|n| n.label.as_str()), Some("?x"));
	}

	#[test]
	fn missing_record_keeps_id_as_label() {
		let graph = build_graph(&[triple("?x", "wdt:P1", "wd:Q7")], &EntityTable::default());
		let node = graph.node("Q7").expect("Q7 node");
		assert_eq!(node.label, "Q7");
		assert!(!node.is_enriched());
	}

	#[test]
	fn late_enrichment_reports_changes() {
		let mut graph = build_graph(&[triple("?x", "wdt:P1", "wd:Q7")], &EntityTable::default());
		let table = EntityTable::new(vec![EntityRecord::new("Q7", "seven")]);
		assert_eq!(graph.enrich(&table), 1);
		assert_eq!(graph.enrich(&table), 0);
	}
}
