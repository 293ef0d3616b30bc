use query_graph_canvas::graph::*;
use query_graph_canvas::layout::{LayoutConfig, Simulation};

fn ids(graph: &Graph) -> Vec<&str> {
	let mut ids: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
	ids.sort_unstable();
	ids
}

#[test]
fn founder_scenario() {
	let query = "SELECT ?founder WHERE {\n  ?founder wdt:P112 ?company ; wdt:P569 ?birthdate .\n}";

	let triples = extract_triples(query);
	assert_eq!(triples.len(), 2);
	assert!(triples.iter().all(|t| t.subject.as_str() == "?founder"));

	let graph = build_graph(&triples, &EntityTable::default()).leveled();
	assert_eq!(ids(&graph), vec!["?birthdate", "?company", "?founder"]);
	assert!(graph.nodes().iter().all(|n| n.kind == NodeKind::Variable));

	let mut predicates: Vec<&str> = graph.edges().iter().map(|e| e.predicate.as_str()).collect();
	predicates.sort_unstable();
	assert_eq!(predicates, vec!["P112", "P569"]);

	assert_eq!(graph.node("?founder").and_then(|n| n.level), Some(0));
	assert_eq!(graph.node("?company").and_then(|n| n.level), Some(1));
}

#[test]
fn entity_label_scenario() {
	let payload = QueryPayload::new(
		"SELECT ?x WHERE { ?x wdt:P112 wd:Q95 . }",
		&[EntityRecord::new("http://www.wikidata.org/entity/Q95", "X Corp")],
	);
	let graph = graph_for_payload(&payload).expect("graph");
	assert_eq!(graph.node("Q95").map(|n| n.label.as_str()), Some("X Corp"));
}

#[test]
fn graceful_degradation() {
	assert!(extract_triples("").is_empty());
	assert!(extract_triples("SELECT * WHERE { ?s ?p ?o").is_empty());
	assert!(extract_triples("SELECT * WHERE ?s ?p ?o }").is_empty());
	assert!(
		extract_triples("SELECT * WHERE { SERVICE wikibase:label { bd:serviceParam wikibase:language \"en\" . } }")
			.is_empty()
	);

	assert!(graph_for_payload(&QueryPayload::default()).is_none());
	assert!(graph_for_payload(&QueryPayload::new("no braces here", &[])).is_none());
}

#[test]
fn empty_block_is_an_empty_graph() {
	let graph = graph_for_payload(&QueryPayload::new("SELECT * WHERE { }", &[])).expect("graph");
	assert!(graph.is_empty());
	assert!(graph.edges().is_empty());
}

#[test]
fn directors_query_end_to_end() {
	let query = r#"
		SELECT DISTINCT ?director ?directorLabel WHERE {
		  ?director wdt:P27  wd:Q17;          # Japanese citizenship
		           wdt:P106 wd:Q2526255;     # film director
		           wdt:P166 wd:Q179808.      # Palme d'Or
		  SERVICE wikibase:label { bd:serviceParam wikibase:language "[AUTO_LANGUAGE],en". }
		}
	"#;
	let records = [
		EntityRecord::new("http://www.wikidata.org/entity/Q17", "Japan").with_description("island country in East Asia"),
		EntityRecord::new("http://www.wikidata.org/entity/Q179808", "Palme d'Or"),
	];
	let graph = build_query_graph(&QueryPayload::new(query, &records)).expect("graph");

	assert_eq!(ids(&graph), vec!["?director", "Q17", "Q179808", "Q2526255"]);
	assert_eq!(graph.edges().len(), 3);
	assert_eq!(graph.node("Q17").map(|n| n.label.as_str()), Some("Japan"));
	assert_eq!(graph.node("Q2526255").map(|n| n.label.as_str()), Some("Q2526255"));
	assert_eq!(graph.max_level(), 1);
}

#[test]
fn laid_out_levels_read_left_to_right() {
	let query = "{\n ?a wdt:P1 ?b .\n ?b wdt:P2 ?c .\n ?c wdt:P3 wd:Q1 .\n}";
	let graph = graph_for_payload(&QueryPayload::new(query, &[])).expect("graph");
	let config = LayoutConfig::default();

	let links: Vec<(usize, usize)> = graph
		.edges()
		.iter()
		.filter_map(|e| Some((graph.index_of(&e.source)?, graph.index_of(&e.target)?)))
		.collect();
	let levels: Vec<u32> = (0..graph.nodes().len()).map(|i| graph.level_of(i)).collect();
	let columns = config.clone();
	let mut sim = Simulation::new(graph.nodes().len(), &links, config, 1000.0, 600.0)
		.with_targets(move |i| Some(columns.column_x(levels[i])));
	while sim.tick() {}

	let x = |id: &str| graph.index_of(id).and_then(|i| sim.body(i)).map(|b| b.x).unwrap_or(f64::NAN);
	assert!(x("?a") < x("?b"));
	assert!(x("?b") < x("?c"));
	assert!(x("?c") < x("Q1"));
}
