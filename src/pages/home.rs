use leptos::prelude::*;
use log::warn;

use crate::components::query_graph::QueryGraphCanvas;
use crate::graph::QueryPayload;

/// A query-result payload as the query service returns it.
const SAMPLE_PAYLOAD: &str = r#"{
  "query": "SELECT DISTINCT ?director ?directorLabel WHERE {\n  ?director wdt:P27 wd:Q17 ;        # Japanese citizenship\n            wdt:P106 wd:Q2526255 ;  # film director\n            wdt:P166 wd:Q179808 .   # Palme d'Or\n  ?film wdt:P57 ?director ;\n        wdt:P577 ?date .\n  SERVICE wikibase:label { bd:serviceParam wikibase:language \"[AUTO_LANGUAGE],en\". }\n}",
  "entity_info": { "results": { "bindings": [
    { "id": { "value": "http://www.wikidata.org/entity/Q17" }, "label": { "value": "Japan" }, "description": { "value": "island country in East Asia" } },
    { "id": { "value": "http://www.wikidata.org/entity/Q2526255" }, "label": { "value": "film director" }, "description": { "value": "person who directs the making of a film" } },
    { "id": { "value": "http://www.wikidata.org/entity/Q179808" }, "label": { "value": "Palme d'Or" }, "description": { "value": "highest prize awarded at the Cannes Film Festival" } },
    { "id": { "value": "http://www.wikidata.org/entity/P27" }, "label": { "value": "country of citizenship" } },
    { "id": { "value": "http://www.wikidata.org/entity/P57" }, "label": { "value": "director" } }
  ] } }
}"#;

fn parse_payload(text: &str) -> Option<QueryPayload> {
	match QueryPayload::from_json(text) {
		Ok(payload) => Some(payload),
		Err(err) => {
			warn!("ignoring payload: {err}");
			None
		}
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let text = RwSignal::new(SAMPLE_PAYLOAD.to_string());
	let payload = RwSignal::new(parse_payload(SAMPLE_PAYLOAD));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="query-graph-page" style="display: flex; height: 100vh;">
				<div class="payload-panel" style="width: 30%; display: flex; flex-direction: column; padding: 8px; gap: 8px;">
					<h1>"Query Structure Graph"</h1>
					<p class="subtitle">"Drag nodes to reposition. Scroll to zoom. Drag background to pan. Click the legend to highlight."</p>
					<textarea
						style="flex: 1; font-family: monospace;"
						prop:value=move || text.get()
						on:input=move |ev| text.set(event_target_value(&ev))
					/>
					<button on:click=move |_| payload.set(parse_payload(&text.get_untracked()))>"Render"</button>
				</div>
				<div class="graph-panel" style="flex: 1;">
					<QueryGraphCanvas data=payload />
				</div>
			</div>
		</ErrorBoundary>
	}
}
