use log::{debug, info};

use super::highlight::{edge_emphasized, node_emphasized};
use crate::graph::{Edge, Graph, LateEnrichment, Node, NodeKind};
use crate::layout::{Body, LayoutConfig, Simulation};

/// Extra pick tolerance around a node, in graph units.
pub const HIT_SLOP: f64 = 4.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}

	/// Scale by `factor` keeping the graph point under `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64, min: f64, max: f64) {
		let k = (self.k * factor).max(min).min(max);
		let ratio = k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = k;
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	/// Grab point relative to the node centre, in graph units.
	pub offset_x: f64,
	pub offset_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PinchState {
	pub active: bool,
	pub distance: f64,
}

/// Everything the canvas needs for one query run.
pub struct QueryGraphState {
	pub graph: Graph,
	pub sim: Simulation,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub pinch: PinchState,
	pub hover: Option<usize>,
	pub highlight: Option<NodeKind>,
	pub width: f64,
	pub height: f64,
	query: String,
	links: Vec<(usize, usize)>,
}

impl QueryGraphState {
	/// Seed a simulation from a leveled graph built for `query`.
	pub fn new(graph: Graph, query: impl Into<String>, config: LayoutConfig, width: f64, height: f64) -> Self {
		let links: Vec<(usize, usize)> = graph
			.edges()
			.iter()
			.filter_map(|e| Some((graph.index_of(&e.source)?, graph.index_of(&e.target)?)))
			.collect();
		let levels: Vec<u32> = (0..graph.nodes().len()).map(|i| graph.level_of(i)).collect();
		let columns = config.clone();
		let sim = Simulation::new(graph.nodes().len(), &links, config, width, height)
			.with_targets(move |i| Some(columns.column_x(levels[i])));

		Self {
			graph,
			sim,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			pinch: PinchState::default(),
			hover: None,
			highlight: None,
			width,
			height,
			query: query.into(),
			links,
		}
	}

	pub fn query(&self) -> &str {
		&self.query
	}

	/// Edges with the body indices of their endpoints.
	pub fn edges(&self) -> impl Iterator<Item = (&Edge, usize, usize)> {
		self.graph
			.edges()
			.iter()
			.zip(&self.links)
			.map(|(edge, &(s, t))| (edge, s, t))
	}

	/// Nodes with their current bodies.
	pub fn nodes(&self) -> impl Iterator<Item = (usize, &Node, &Body)> {
		self.graph
			.nodes()
			.iter()
			.zip(self.sim.bodies())
			.enumerate()
			.map(|(i, (node, body))| (i, node, body))
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.transform.screen_to_graph(sx, sy);
		let reach = self.sim.config().node_radius + HIT_SLOP;
		// Topmost (last drawn) wins.
		self.sim
			.bodies()
			.iter()
			.rposition(|b| (b.x - gx).powi(2) + (b.y - gy).powi(2) < reach * reach)
	}

	pub fn begin_drag(&mut self, idx: usize, sx: f64, sy: f64) {
		let Some(body) = self.sim.body(idx) else {
			return;
		};
		let (gx, gy) = self.transform.screen_to_graph(sx, sy);
		let (bx, by) = (body.x, body.y);
		self.drag = DragState {
			active: true,
			node_idx: Some(idx),
			offset_x: bx - gx,
			offset_y: by - gy,
		};
		self.sim.pin(idx, bx, by);
		self.sim.set_alpha_target(self.sim.config().drag_alpha_target);
		debug!("drag start on {}", self.graph.nodes()[idx].id);
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(idx) = self.drag.node_idx.filter(|_| self.drag.active) else {
			return;
		};
		let (gx, gy) = self.transform.screen_to_graph(sx, sy);
		let margin = self.sim.config().margin;
		let x = (gx + self.drag.offset_x).max(margin).min(self.width - margin);
		let y = (gy + self.drag.offset_y).max(margin).min(self.height - margin);
		self.sim.pin(idx, x, y);
	}

	pub fn end_drag(&mut self) {
		if let Some(idx) = self.drag.node_idx.take() {
			self.sim.release(idx);
			self.sim.set_alpha_target(0.0);
		}
		self.drag.active = false;
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Pointer pressed: grab a node if one is under it, otherwise pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		match self.node_at_position(sx, sy) {
			Some(idx) => self.begin_drag(idx, sx, sy),
			None => self.begin_pan(sx, sy),
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if self.drag.active {
			self.drag_to(sx, sy);
		} else if self.pan.active {
			self.pan_to(sx, sy);
		} else {
			let hovered = self.node_at_position(sx, sy);
			self.hover = hovered;
		}
	}

	pub fn pointer_up(&mut self) {
		self.end_drag();
		self.end_pan();
	}

	pub fn pointer_leave(&mut self) {
		self.pointer_up();
		self.hover = None;
	}

	/// Wheel zoom: one notch is 10%.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.zoom_by(sx, sy, factor);
	}

	pub fn zoom_by(&mut self, sx: f64, sy: f64, factor: f64) {
		let (min, max) = (self.sim.config().zoom_min, self.sim.config().zoom_max);
		self.transform.zoom_at(sx, sy, factor, min, max);
	}

	/// Two fingers down: stop any single-finger gesture and remember their spread.
	pub fn begin_pinch(&mut self, distance: f64) {
		self.pointer_up();
		self.pinch = PinchState {
			active: true,
			distance: distance.max(1.0),
		};
	}

	pub fn pinch_to(&mut self, cx: f64, cy: f64, distance: f64) {
		if !self.pinch.active {
			return;
		}
		let distance = distance.max(1.0);
		self.zoom_by(cx, cy, distance / self.pinch.distance);
		self.pinch.distance = distance;
	}

	pub fn end_pinch(&mut self) {
		self.pinch.active = false;
	}

	pub fn set_highlight(&mut self, highlight: Option<NodeKind>) {
		self.highlight = highlight;
	}

	pub fn node_emphasized(&self, idx: usize) -> bool {
		self.graph
			.nodes()
			.get(idx)
			.is_some_and(|n| node_emphasized(self.highlight, n.kind))
	}

	pub fn edge_emphasized(&self, source: usize, target: usize) -> bool {
		let nodes = self.graph.nodes();
		match (nodes.get(source), nodes.get(target)) {
			(Some(s), Some(t)) => edge_emphasized(self.highlight, s.kind, t.kind),
			_ => false,
		}
	}

	/// Relabel from a lookup that finished after the graph was built.
	///
	/// Results for any other query are stale and dropped.
	pub fn apply_enrichment(&mut self, late: &LateEnrichment) -> bool {
		if late.query != self.query {
			info!("discarding entity info for a superseded query");
			return false;
		}
		let changed = self.graph.enrich(&late.entity_info.table());
		debug!("late enrichment relabelled {changed} items");
		true
	}

	pub fn tick(&mut self) -> bool {
		self.sim.tick()
	}

	pub fn stop(&mut self) {
		self.sim.stop();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.sim.resize(width, height);
	}
}
