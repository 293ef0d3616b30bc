use serde::{Deserialize, Serialize};

/// Physics and view tunables for the query graph.
///
/// Every field has a default, so a JSON override only needs the fields it
/// changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Rest length of the link spring.
	pub link_distance: f64,
	/// Pairwise charge; negative repels.
	pub charge_strength: f64,
	/// Distances below this are treated as this, so overlaps stay finite.
	pub charge_distance_min: f64,
	/// Pairs further apart than this do not interact.
	pub charge_distance_max: f64,
	/// Per-node collision radius; two nodes keep `2 * collision_radius` apart.
	pub collision_radius: f64,
	/// Fraction of the centroid offset removed each tick.
	pub center_strength: f64,
	/// Target x of level 0.
	pub column_base: f64,
	/// Gap between consecutive level columns.
	pub column_spacing: f64,
	/// Fraction of the distance to the column target covered per tick.
	pub column_blend: f64,
	/// Minimum distance from any canvas edge.
	pub margin: f64,
	/// Drawn radius, also the hit-test radius.
	pub node_radius: f64,
	/// Spacing of the initial spiral.
	pub initial_radius: f64,
	/// Below this energy the layout is settled.
	pub alpha_min: f64,
	/// Fraction of the gap to the energy target closed per tick.
	pub alpha_decay: f64,
	/// Energy held while a node is dragged.
	pub drag_alpha_target: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Smallest view scale.
	pub zoom_min: f64,
	/// Largest view scale.
	pub zoom_max: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			link_distance: 120.0,
			charge_strength: -800.0,
			charge_distance_min: 1.0,
			charge_distance_max: 300.0,
			collision_radius: 50.0,
			center_strength: 0.1,
			column_base: 100.0,
			column_spacing: 180.0,
			column_blend: 0.1,
			margin: 20.0,
			node_radius: 18.0,
			initial_radius: 10.0,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			drag_alpha_target: 0.3,
			velocity_decay: 0.4,
			zoom_min: 0.5,
			zoom_max: 2.0,
		}
	}
}

impl LayoutConfig {
	/// Defaults overridden by whatever fields `json` sets.
	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		serde_json::from_str(json)
	}

	/// Column x for a level.
	pub fn column_x(&self, level: u32) -> f64 {
		self.column_base + f64::from(level) * self.column_spacing
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_override_keeps_defaults() {
		let config = LayoutConfig::from_json(r#"{ "column_spacing": 200.0, "zoom_max": 4.0 }"#)
			.expect("valid config");
		assert_eq!(config.column_spacing, 200.0);
		assert_eq!(config.zoom_max, 4.0);
		assert_eq!(config.link_distance, LayoutConfig::default().link_distance);
	}

	#[test]
	fn columns_step_by_spacing() {
		let config = LayoutConfig::default();
		assert_eq!(config.column_x(0), 100.0);
		assert_eq!(config.column_x(2), 460.0);
	}

	#[test]
	fn alpha_reaches_minimum_in_300_ticks() {
		let config = LayoutConfig::default();
		let alpha = (1.0 - config.alpha_decay).powi(300);
		assert!((alpha - config.alpha_min).abs() < 1e-9);
	}
}
