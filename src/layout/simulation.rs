//! Iterative force relaxation.
//!
//! Velocity-Verlet style integration over link springs, range-limited
//! many-body repulsion, collision separation and centering, followed by a
//! per-node column pull and a clamp to the canvas. The column target for each
//! body comes from a caller-supplied function so the physics knows nothing
//! about how targets are chosen.

use std::f64::consts::PI;

use log::debug;

use super::config::LayoutConfig;

/// Energy restored after a resize so bodies pushed to the new edges spread out.
const RESIZE_ALPHA: f64 = 0.3;

/// Position and velocity of one simulated node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Body {
	/// Canvas-space x.
	pub x: f64,
	/// Canvas-space y.
	pub y: f64,
	/// Horizontal velocity carried into the next tick.
	pub vx: f64,
	/// Vertical velocity.
	pub vy: f64,
	/// Pinned x; while set the body does not move on its own.
	pub fx: Option<f64>,
	/// Pinned y.
	pub fy: Option<f64>,
}

impl Body {
	/// Whether either axis is fixed.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

#[derive(Clone, Debug)]
struct Link {
	source: usize,
	target: usize,
	strength: f64,
	bias: f64,
}

/// Force layout state for a fixed set of bodies and links.
pub struct Simulation {
	bodies: Vec<Body>,
	links: Vec<Link>,
	targets: Vec<Option<f64>>,
	config: LayoutConfig,
	width: f64,
	height: f64,
	alpha: f64,
	alpha_target: f64,
	stopped: bool,
}

impl Simulation {
	/// Place `count` bodies in a phyllotaxis spiral around the canvas centre.
	///
	/// Links referencing missing bodies and self-loops are ignored.
	pub fn new(count: usize, links: &[(usize, usize)], config: LayoutConfig, width: f64, height: f64) -> Self {
		let golden = PI * (3.0 - 5f64.sqrt());
		let (cx, cy) = (width / 2.0, height / 2.0);
		let bodies = (0..count)
			.map(|i| {
				let radius = config.initial_radius * (0.5 + i as f64).sqrt();
				let angle = i as f64 * golden;
				Body {
					x: cx + radius * angle.cos(),
					y: cy + radius * angle.sin(),
					..Body::default()
				}
			})
			.collect();

		let links: Vec<(usize, usize)> = links
			.iter()
			.copied()
			.filter(|&(s, t)| s != t && s < count && t < count)
			.collect();
		let mut degree = vec![0usize; count];
		for &(s, t) in &links {
			degree[s] += 1;
			degree[t] += 1;
		}
		let links = links
			.into_iter()
			.map(|(source, target)| Link {
				source,
				target,
				strength: 1.0 / degree[source].min(degree[target]) as f64,
				bias: degree[source] as f64 / (degree[source] + degree[target]) as f64,
			})
			.collect();

		debug!("simulation started with {count} bodies");
		Self {
			bodies,
			links,
			targets: vec![None; count],
			config,
			width,
			height,
			alpha: 1.0,
			alpha_target: 0.0,
			stopped: false,
		}
	}

	/// Pull each body toward the x returned for its index.
	pub fn with_targets(mut self, target_x: impl Fn(usize) -> Option<f64>) -> Self {
		self.targets = (0..self.bodies.len()).map(target_x).collect();
		self
	}

	/// Bodies in the order they were created.
	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	/// Body by index.
	pub fn body(&self, index: usize) -> Option<&Body> {
		self.bodies.get(index)
	}

	/// Tunables in use.
	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	/// Canvas width and height.
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// Current energy.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Energy has decayed and nothing is holding it up.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
	}

	/// Whether [`Simulation::stop`] was called.
	pub fn is_stopped(&self) -> bool {
		self.stopped
	}

	/// Halt for good; later ticks are no-ops.
	pub fn stop(&mut self) {
		if !self.stopped {
			debug!("simulation stopped");
		}
		self.stopped = true;
	}

	/// Energy the simulation relaxes toward. A non-zero target keeps it warm.
	pub fn set_alpha_target(&mut self, alpha_target: f64) {
		self.alpha_target = alpha_target;
		if self.alpha < alpha_target {
			// Ticks resume from wherever alpha decayed to.
			self.alpha = self.alpha.max(self.config.alpha_min);
		}
	}

	/// Set the current energy directly.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = alpha;
	}

	/// Fix a body at `(x, y)` until [`Simulation::release`].
	pub fn pin(&mut self, index: usize, x: f64, y: f64) {
		if let Some(body) = self.bodies.get_mut(index) {
			body.fx = Some(x);
			body.fy = Some(y);
			body.x = x;
			body.y = y;
			body.vx = 0.0;
			body.vy = 0.0;
		}
	}

	/// Let a pinned body move again.
	pub fn release(&mut self, index: usize) {
		if let Some(body) = self.bodies.get_mut(index) {
			body.fx = None;
			body.fy = None;
		}
	}

	/// Adopt a new canvas size.
	///
	/// Bodies are clamped at once, since a settled layout no longer ticks.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.clamp();
		if !self.stopped {
			self.alpha = self.alpha.max(RESIZE_ALPHA);
		}
	}

	/// Advance one step. Returns false when there was nothing to do.
	pub fn tick(&mut self) -> bool {
		if self.stopped || self.is_settled() {
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

		self.apply_links();
		self.apply_charge();
		self.apply_center();
		self.apply_collision();
		self.integrate();
		self.apply_columns();
		self.clamp();
		true
	}

	fn apply_links(&mut self) {
		let distance = self.config.link_distance;
		for link in &self.links {
			let (s, t) = (&self.bodies[link.source], &self.bodies[link.target]);
			let mut dx = t.x + t.vx - s.x - s.vx;
			let mut dy = t.y + t.vy - s.y - s.vy;
			if dx == 0.0 && dy == 0.0 {
				dx = jiggle(link.source + link.target);
				dy = jiggle(link.source * 31 + link.target);
			}
			let len = (dx * dx + dy * dy).sqrt();
			let scale = (len - distance) / len * self.alpha * link.strength;
			let (dx, dy) = (dx * scale, dy * scale);

			let target = &mut self.bodies[link.target];
			target.vx -= dx * link.bias;
			target.vy -= dy * link.bias;
			let source = &mut self.bodies[link.source];
			source.vx += dx * (1.0 - link.bias);
			source.vy += dy * (1.0 - link.bias);
		}
	}

	fn apply_charge(&mut self) {
		let max2 = self.config.charge_distance_max.powi(2);
		let min2 = self.config.charge_distance_min.powi(2);
		let strength = self.config.charge_strength * self.alpha;
		let n = self.bodies.len();

		for i in 0..n {
			for j in (i + 1)..n {
				let mut dx = self.bodies[j].x - self.bodies[i].x;
				let mut dy = self.bodies[j].y - self.bodies[i].y;
				let mut d2 = dx * dx + dy * dy;
				if d2 >= max2 {
					continue;
				}
				if d2 == 0.0 {
					dx = jiggle(i * 17 + j);
					dy = jiggle(j * 13 + i);
					d2 = dx * dx + dy * dy;
				}
				let w = strength / d2.max(min2);
				self.bodies[i].vx += dx * w;
				self.bodies[i].vy += dy * w;
				self.bodies[j].vx -= dx * w;
				self.bodies[j].vy -= dy * w;
			}
		}
	}

	fn apply_center(&mut self) {
		let n = self.bodies.len();
		if n == 0 {
			return;
		}
		let (sx, sy) = self
			.bodies
			.iter()
			.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
		let shift_x = (sx / n as f64 - self.width / 2.0) * self.config.center_strength;
		let shift_y = (sy / n as f64 - self.height / 2.0) * self.config.center_strength;
		for body in &mut self.bodies {
			body.x -= shift_x;
			body.y -= shift_y;
		}
	}

	fn apply_collision(&mut self) {
		let reach = 2.0 * self.config.collision_radius;
		let n = self.bodies.len();

		for i in 0..n {
			let (xi, yi) = (
				self.bodies[i].x + self.bodies[i].vx,
				self.bodies[i].y + self.bodies[i].vy,
			);
			for j in (i + 1)..n {
				let mut dx = xi - (self.bodies[j].x + self.bodies[j].vx);
				let mut dy = yi - (self.bodies[j].y + self.bodies[j].vy);
				let mut d2 = dx * dx + dy * dy;
				if d2 >= reach * reach {
					continue;
				}
				if d2 == 0.0 {
					dx = jiggle(i * 7 + j);
					dy = jiggle(j * 11 + i);
					d2 = dx * dx + dy * dy;
				}
				let len = d2.sqrt();
				let push = (reach - len) / len * 0.5;
				self.bodies[i].vx += dx * push;
				self.bodies[i].vy += dy * push;
				self.bodies[j].vx -= dx * push;
				self.bodies[j].vy -= dy * push;
			}
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.config.velocity_decay;
		for body in &mut self.bodies {
			match body.fx {
				Some(fx) => {
					body.x = fx;
					body.vx = 0.0;
				}
				None => {
					body.vx *= keep;
					body.x += body.vx;
				}
			}
			match body.fy {
				Some(fy) => {
					body.y = fy;
					body.vy = 0.0;
				}
				None => {
					body.vy *= keep;
					body.y += body.vy;
				}
			}
		}
	}

	fn apply_columns(&mut self) {
		let blend = self.config.column_blend;
		for (body, target) in self.bodies.iter_mut().zip(&self.targets) {
			if let (None, Some(target)) = (body.fx, target) {
				body.x += (target - body.x) * blend;
			}
		}
	}

	fn clamp(&mut self) {
		let margin = self.config.margin;
		let (max_x, max_y) = (self.width - margin, self.height - margin);
		for body in self.bodies.iter_mut().filter(|b| !b.is_pinned()) {
			body.x = body.x.max(margin).min(max_x);
			body.y = body.y.max(margin).min(max_y);
		}
	}
}

/// Tiny deterministic offset that separates coincident bodies.
fn jiggle(seed: usize) -> f64 {
	((seed as f64 * 0.618_033_988_75).fract() - 0.5) * 1e-6 + 1e-9
}

#[cfg(test)]
mod tests {
	use super::*;

	fn run(sim: &mut Simulation, ticks: usize) {
		for _ in 0..ticks {
			sim.tick();
		}
	}

	fn distance(a: &Body, b: &Body) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	#[test]
	fn settles_and_then_idles() {
		let mut sim = Simulation::new(3, &[(0, 1), (1, 2)], LayoutConfig::default(), 800.0, 600.0);
		assert!(sim.tick());
		run(&mut sim, 400);
		assert!(sim.is_settled());
		assert!(!sim.tick());
	}

	#[test]
	fn stopped_simulation_does_not_move() {
		let mut sim = Simulation::new(4, &[(0, 1)], LayoutConfig::default(), 800.0, 600.0);
		sim.stop();
		let before = sim.bodies().to_vec();
		assert!(!sim.tick());
		assert_eq!(sim.bodies(), &before[..]);
	}

	#[test]
	fn bodies_stay_inside_margins() {
		let links: Vec<(usize, usize)> = (1..30).map(|i| (0, i)).collect();
		let mut sim = Simulation::new(30, &links, LayoutConfig::default(), 400.0, 300.0);
		for _ in 0..200 {
			sim.tick();
			for body in sim.bodies() {
				assert!((20.0..=380.0).contains(&body.x), "x = {}", body.x);
				assert!((20.0..=280.0).contains(&body.y), "y = {}", body.y);
			}
		}
	}

	#[test]
	fn pinned_body_holds_position() {
		let mut sim = Simulation::new(3, &[(0, 1), (1, 2)], LayoutConfig::default(), 800.0, 600.0);
		sim.pin(1, 50.0, 60.0);
		run(&mut sim, 50);
		let body = sim.body(1).expect("body");
		assert_eq!((body.x, body.y), (50.0, 60.0));

		sim.release(1);
		assert!(!sim.body(1).expect("body").is_pinned());
	}

	#[test]
	fn column_targets_order_bodies_left_to_right() {
		let config = LayoutConfig::default();
		let levels = [0u32, 1, 2, 3];
		let column = config.clone();
		let mut sim = Simulation::new(4, &[(0, 1), (1, 2), (2, 3)], config, 1000.0, 600.0)
			.with_targets(move |i| Some(column.column_x(levels[i])));
		run(&mut sim, 400);
		let xs: Vec<f64> = sim.bodies().iter().map(|b| b.x).collect();
		assert!(xs.windows(2).all(|w| w[0] < w[1]), "{xs:?}");
	}

	#[test]
	fn shrinking_a_settled_canvas_pulls_bodies_inside() {
		let config = LayoutConfig::default();
		let column = config.clone();
		let mut sim = Simulation::new(6, &[], config, 1200.0, 800.0)
			.with_targets(move |i| Some(column.column_x(i as u32)));
		run(&mut sim, 400);
		assert!(sim.is_settled());
		assert!(sim.bodies().iter().any(|b| b.x > 280.0));

		sim.resize(300.0, 300.0);
		let inside = |sim: &Simulation| {
			sim.bodies()
				.iter()
				.all(|b| (20.0..=280.0).contains(&b.x) && (20.0..=280.0).contains(&b.y))
		};
		assert!(inside(&sim));
		while sim.tick() {
			assert!(inside(&sim));
		}
	}

	#[test]
	fn linked_bodies_come_together() {
		let mut sim = Simulation::new(2, &[(0, 1)], LayoutConfig::default(), 2000.0, 2000.0);
		sim.pin(0, 200.0, 1000.0);
		sim.pin(1, 1800.0, 1000.0);
		sim.release(1);
		let before = distance(&sim.bodies()[0], &sim.bodies()[1]);
		run(&mut sim, 100);
		let after = distance(&sim.bodies()[0], &sim.bodies()[1]);
		assert!(after < before, "{before} -> {after}");
	}

	#[test]
	fn unrelated_bodies_keep_clear() {
		let mut sim = Simulation::new(6, &[], LayoutConfig::default(), 2000.0, 2000.0);
		run(&mut sim, 400);
		let bodies = sim.bodies();
		for i in 0..bodies.len() {
			for j in (i + 1)..bodies.len() {
				assert!(distance(&bodies[i], &bodies[j]) > 60.0);
			}
		}
	}

	#[test]
	fn alpha_target_keeps_simulation_warm() {
		let mut sim = Simulation::new(2, &[(0, 1)], LayoutConfig::default(), 800.0, 600.0);
		run(&mut sim, 400);
		assert!(sim.is_settled());
		sim.set_alpha_target(0.3);
		assert!(!sim.is_settled());
		run(&mut sim, 400);
		assert!(sim.alpha() > 0.25);
		sim.set_alpha_target(0.0);
		run(&mut sim, 600);
		assert!(sim.is_settled());
	}

	#[test]
	fn ignores_self_loops_and_dangling_links() {
		let mut sim = Simulation::new(2, &[(0, 0), (0, 5)], LayoutConfig::default(), 800.0, 600.0);
		run(&mut sim, 10);
		assert!(sim.bodies().iter().all(|b| b.x.is_finite() && b.y.is_finite()));
	}
}
