//! Query-structure graph engine: text to triples to a leveled graph.

mod build;
mod error;
mod extract;
mod level;
mod payload;

pub use build::{Edge, EntityRecord, EntityTable, Graph, GraphBuilder, Node, NodeKind, build_graph};
pub use error::{GraphError, Result};
pub use extract::{Token, Triple, VARIABLE_MARKERS, extract_triples, normalize_token, try_extract_triples};
pub use level::{choose_root, compute_levels};
pub use payload::{
	Binding, BindingValue, EntityInfo, EntityResults, LateEnrichment, QueryPayload, build_query_graph, graph_for_payload,
};
