//! Hop-distance leveling of a query graph.

use std::collections::VecDeque;

use super::build::{Graph, Node, NodeKind};

/// Index of the node the levels are measured from.
///
/// The first Variable in node order, else the first node. Among several
/// Variables no preference beyond collection order is applied.
pub fn choose_root(nodes: &[Node]) -> Option<usize> {
	nodes
		.iter()
		.position(|n| n.kind == NodeKind::Variable)
		.or_else(|| (!nodes.is_empty()).then_some(0))
}

/// Breadth-first hop distance from the root over undirected edges.
///
/// Nodes the root cannot reach get level 0, the same as the root itself.
pub fn compute_levels(graph: &Graph) -> Vec<u32> {
	let nodes = graph.nodes();
	let adjacency = adjacency(graph);
	let mut levels: Vec<Option<u32>> = vec![None; nodes.len()];
	let mut queue = VecDeque::new();

	if let Some(root) = choose_root(nodes) {
		levels[root] = Some(0);
		queue.push_back(root);
	}

	while let Some(current) = queue.pop_front() {
		let next = levels[current].unwrap_or(0) + 1;
		for &neighbor in &adjacency[current] {
			if levels[neighbor].is_none() {
				levels[neighbor] = Some(next);
				queue.push_back(neighbor);
			}
		}
	}

	levels.into_iter().map(|l| l.unwrap_or(0)).collect()
}

fn adjacency(graph: &Graph) -> Vec<Vec<usize>> {
	let mut adjacency = vec![Vec::new(); graph.nodes().len()];
	for edge in graph.edges() {
		if let (Some(s), Some(t)) = (graph.index_of(&edge.source), graph.index_of(&edge.target)) {
			adjacency[s].push(t);
			adjacency[t].push(s);
		}
	}
	adjacency
}

impl Graph {
	/// Assign every node its level.
	pub fn leveled(mut self) -> Self {
		let levels = compute_levels(&self);
		for (node, level) in self.nodes.iter_mut().zip(levels) {
			node.level = Some(level);
		}
		self
	}

	/// Level of a node, 0 before leveling.
	pub fn level_of(&self, index: usize) -> u32 {
		self.nodes.get(index).and_then(|n| n.level).unwrap_or(0)
	}

	/// Deepest level in the graph.
	pub fn max_level(&self) -> u32 {
		self.nodes.iter().filter_map(|n| n.level).max().unwrap_or(0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::build::{EntityTable, build_graph};
	use crate::graph::extract::Triple;

	fn graph(triples: &[(&str, &str, &str)]) -> Graph {
		let triples: Vec<Triple> = triples.iter().map(|&(s, p, o)| Triple::new(s, p, o)).collect();
		build_graph(&triples, &EntityTable::default()).leveled()
	}

	fn level(graph: &Graph, id: &str) -> Option<u32> {
		graph.node(id).and_then(|n| n.level)
	}

	#[test]
	fn root_is_first_variable() {
		let g = graph(&[("wd:Q1", "wdt:P1", "?x"), ("?x", "wdt:P2", "?y")]);
		assert_eq!(choose_root(g.nodes()), Some(1));
		assert_eq!(level(&g, "?x"), Some(0));
		assert_eq!(level(&g, "Q1"), Some(1));
		assert_eq!(level(&g, "?y"), Some(1));
	}

	#[test]
	fn root_falls_back_to_first_node() {
		let g = graph(&[("wd:Q1", "wdt:P1", "wd:Q2"), ("wd:Q2", "wdt:P1", "wd:Q3")]);
		assert_eq!(choose_root(g.nodes()), Some(0));
		assert_eq!(level(&g, "Q3"), Some(2));
	}

	#[test]
	fn shortest_hop_distance_wins() {
		let g = graph(&[
			("?a", "wdt:P1", "?b"),
			("?b", "wdt:P1", "?c"),
			("?c", "wdt:P1", "?d"),
			("?a", "wdt:P2", "?d"),
		]);
		assert_eq!(level(&g, "?d"), Some(1));
		assert_eq!(level(&g, "?c"), Some(2));
		assert_eq!(g.max_level(), 2);
	}

	#[test]
	fn unreachable_nodes_default_to_zero() {
		let g = graph(&[("?a", "wdt:P1", "?b"), ("wd:Q1", "wdt:P1", "wd:Q2")]);
		assert_eq!(level(&g, "?b"), Some(1));
		assert_eq!(level(&g, "Q1"), Some(0));
		assert_eq!(level(&g, "Q2"), Some(0));
	}

	#[test]
	fn empty_graph() {
		let g = Graph::default().leveled();
		assert!(compute_levels(&g).is_empty());
		assert_eq!(choose_root(g.nodes()), None);
		assert_eq!(g.max_level(), 0);
	}

	#[test]
	fn self_loop_is_harmless() {
		let g = graph(&[("?a", "wdt:P1", "?a")]);
		assert_eq!(level(&g, "?a"), Some(0));
	}
}
