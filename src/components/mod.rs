pub mod query_graph;
