use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::highlight::alpha_for;
use super::state::QueryGraphState;
use crate::graph::{Node, NodeKind};

const BACKGROUND: &str = "#ffffff";
const EDGE_COLOR: &str = "#666666";
const TEXT_COLOR: &str = "#333333";
const EDGE_ALPHA: f64 = 0.8;
const ARROW_SIZE: f64 = 8.0;

pub fn kind_color(kind: NodeKind) -> &'static str {
	match kind {
		NodeKind::Variable => "#4299e1",
		NodeKind::Term => "#48bb78",
	}
}

/// Text drawn under a node: the variable name, or a term's id followed by
/// its human label when one is known.
pub fn label_lines(node: &Node) -> (&str, Option<&str>) {
	match node.kind {
		NodeKind::Variable => (node.id.trim_start_matches(crate::graph::VARIABLE_MARKERS), None),
		NodeKind::Term => (node.id.as_str(), node.is_enriched().then_some(node.label.as_str())),
	}
}

pub fn render(state: &QueryGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_edge_labels(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
	draw_tooltip(state, ctx);
}

fn draw_edges(state: &QueryGraphState, ctx: &CanvasRenderingContext2d) {
	let radius = state.sim.config().node_radius;
	let bodies = state.sim.bodies();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_line_width(1.5);

	for (_, s, t) in state.edges() {
		let (a, b) = (&bodies[s], &bodies[t]);
		let (dx, dy) = (b.x - a.x, b.y - a.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < radius * 2.0 {
			continue;
		}

		ctx.set_global_alpha(EDGE_ALPHA * alpha_for(state.edge_emphasized(s, t)));
		ctx.set_stroke_style_str(EDGE_COLOR);
		ctx.set_fill_style_str(EDGE_COLOR);

		let (ux, uy) = (dx / dist, dy / dist);
		let (tip_x, tip_y) = (b.x - ux * radius, b.y - uy * radius);
		let (back_x, back_y) = (tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);
		ctx.begin_path();
		ctx.move_to(a.x + ux * radius, a.y + uy * radius);
		ctx.line_to(back_x, back_y);
		ctx.stroke();

		let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
}

// Predicate name at the midpoint, on an opaque plate so it reads over lines.
fn draw_edge_labels(state: &QueryGraphState, ctx: &CanvasRenderingContext2d) {
	let bodies = state.sim.bodies();
	ctx.set_font("10px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for (edge, s, t) in state.edges() {
		let (x, y) = ((bodies[s].x + bodies[t].x) / 2.0, (bodies[s].y + bodies[t].y) / 2.0);
		let width = ctx.measure_text(&edge.label).map(|m| m.width()).unwrap_or(0.0);

		ctx.set_global_alpha(alpha_for(state.edge_emphasized(s, t)));
		ctx.set_fill_style_str(BACKGROUND);
		ctx.fill_rect(x - width / 2.0 - 4.0, y - 7.0, width + 8.0, 14.0);
		ctx.set_fill_style_str(TEXT_COLOR);
		let _ = ctx.fill_text(&edge.label, x, y);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &QueryGraphState, ctx: &CanvasRenderingContext2d) {
	let radius = state.sim.config().node_radius;
	ctx.set_font("11px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("alphabetic");

	for (idx, node, body) in state.nodes() {
		let (x, y) = (body.x, body.y);
		ctx.set_global_alpha(alpha_for(state.node_emphasized(idx)));

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(kind_color(node.kind));
		ctx.fill();
		ctx.set_stroke_style_str("#ffffff");
		ctx.set_line_width(if state.hover == Some(idx) { 3.0 } else { 2.0 });
		ctx.stroke();

		let (first, second) = label_lines(node);
		ctx.set_fill_style_str(TEXT_COLOR);
		let _ = ctx.fill_text(first, x, y + radius + 14.0);
		if let Some(second) = second {
			let _ = ctx.fill_text(second, x, y + radius + 27.0);
		}
	}
	ctx.set_global_alpha(1.0);
}

// Drawn in screen space so it stays legible at any zoom.
fn draw_tooltip(state: &QueryGraphState, ctx: &CanvasRenderingContext2d) {
	let Some((_, node, body)) = state.hover.and_then(|idx| state.nodes().nth(idx)) else {
		return;
	};
	if state.drag.active {
		return;
	}
	let (sx, sy) = state.transform.graph_to_screen(body.x, body.y);
	let lines: Vec<&str> = std::iter::once(node.label.as_str())
		.chain(node.description.as_deref())
		.collect();

	ctx.set_font("12px sans-serif");
	ctx.set_text_align("left");
	ctx.set_text_baseline("top");
	let width = lines
		.iter()
		.filter_map(|l| ctx.measure_text(l).ok())
		.map(|m| m.width())
		.fold(0.0, f64::max);
	let (w, h) = (width + 12.0, lines.len() as f64 * 16.0 + 8.0);
	let x = (sx + 12.0).min(state.width - w).max(0.0);
	let y = (sy + 12.0).min(state.height - h).max(0.0);

	ctx.set_global_alpha(0.95);
	ctx.set_fill_style_str("#1a202c");
	ctx.fill_rect(x, y, w, h);
	ctx.set_global_alpha(1.0);
	ctx.set_fill_style_str("#ffffff");
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x + 6.0, y + 4.0 + i as f64 * 16.0);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{EntityRecord, EntityTable, Triple, build_graph};

	#[test]
	fn label_lines_by_kind() {
		let table = EntityTable::new(vec![EntityRecord::new("Q5", "human")]);
		let graph = build_graph(
			&[Triple::new("?person", "wdt:P31", "wd:Q5"), Triple::new("?person", "wdt:P27", "wd:Q17")],
			&table,
		);

		let person = graph.node("?person").expect("variable");
		assert_eq!(label_lines(person), ("person", None));
		let q5 = graph.node("Q5").expect("term");
		assert_eq!(label_lines(q5), ("Q5", Some("human")));
		let q17 = graph.node("Q17").expect("term");
		assert_eq!(label_lines(q17), ("Q17", None));
	}

	#[test]
	fn colors_differ_by_kind() {
		assert_ne!(kind_color(NodeKind::Variable), kind_color(NodeKind::Term));
	}
}
