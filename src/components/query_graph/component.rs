use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent, Window};

use super::highlight::{node_emphasized, toggle_highlight};
use super::render;
use super::state::QueryGraphState;
use super::teardown::Teardown;
use crate::graph::{LateEnrichment, NodeKind, QueryPayload, graph_for_payload};
use crate::layout::LayoutConfig;

type SharedState = Rc<RefCell<Option<QueryGraphState>>>;

/// Live query-structure graph for the latest payload.
///
/// Each new payload replaces the graph and its simulation wholesale. A payload
/// that yields no graph leaves the canvas blank.
#[component]
pub fn QueryGraphCanvas(
	#[prop(into)] data: Signal<Option<QueryPayload>>,
	/// Entity lookups that finish after the graph was drawn.
	#[prop(optional, into)]
	enrichment: Option<Signal<Option<LateEnrichment>>>,
	#[prop(optional)] config: Option<LayoutConfig>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let highlight = RwSignal::new(None::<NodeKind>);
	let teardown = Teardown::default();
	let config = config.unwrap_or_default();

	let teardown_cleanup = teardown.clone();
	on_cleanup(move || teardown_cleanup.run());

	let (state_init, animate_init) = (state.clone(), animate.clone());

	Effect::new(move |_| {
		let payload = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			warn!("no window; query graph disabled");
			return;
		};

		let (w, h) = canvas_size(&window, &canvas, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let next = payload.as_ref().and_then(|p| {
			let graph = graph_for_payload(p)?;
			let query = p.query.clone().unwrap_or_default();
			Some(QueryGraphState::new(graph, query, config.clone(), w, h))
		});
		{
			let mut slot = state_init.borrow_mut();
			if let Some(old) = slot.as_mut() {
				old.stop();
			}
			*slot = next;
		}

		if animate_init.borrow().is_some() {
			return;
		}

		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>().ok(),
			_ => None,
		};
		let Some(ctx) = ctx else {
			warn!("2d canvas context unavailable");
			return;
		};

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			let listener = leptos::leptos_dom::helpers::window_event_listener(leptos::ev::resize, move |_| {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = canvas_size(&win, &canvas_resize, true, None, None);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			});
			teardown.defer(move || listener.remove());
		}

		let (state_anim, animate_inner, teardown_anim, canvas_anim) =
			(state_init.clone(), animate_init.clone(), teardown.clone(), canvas.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !teardown_anim.is_mounted() {
				if let Some(mut s) = state_anim.borrow_mut().take() {
					s.stop();
				}
				debug!("query graph unmounted; animation loop ended");
				return;
			}
			match *state_anim.borrow_mut() {
				Some(ref mut s) => {
					s.set_highlight(highlight.get_untracked());
					s.tick();
					render::render(s, &ctx);
				}
				None => ctx.clear_rect(
					0.0,
					0.0,
					canvas_anim.width() as f64,
					canvas_anim.height() as f64,
				),
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(win) = web_sys::window() {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	if let Some(enrichment) = enrichment {
		let state_late = state.clone();
		Effect::new(move |_| {
			let Some(late) = enrichment.get() else {
				return;
			};
			if let Some(ref mut s) = *state_late.borrow_mut() {
				s.apply_enrichment(&late);
			}
		});
	}

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, ev.client_x() as f64, ev.client_y() as f64) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, ev.client_x() as f64, ev.client_y() as f64) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, ev.client_x() as f64, ev.client_y() as f64) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(x, y, ev.delta_y());
		}
	};

	let state_ts = state.clone();
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(canvas_ref, &ev);
		if let Some(ref mut s) = *state_ts.borrow_mut() {
			match points.as_slice() {
				[(x, y)] => s.pointer_down(*x, *y),
				[a, b, ..] => s.begin_pinch(spread(*a, *b)),
				[] => {}
			}
		}
	};

	let state_tm = state.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(canvas_ref, &ev);
		if let Some(ref mut s) = *state_tm.borrow_mut() {
			match points.as_slice() {
				[(x, y)] => s.pointer_move(*x, *y),
				[a, b, ..] => {
					if !s.pinch.active {
						s.begin_pinch(spread(*a, *b));
					}
					let (cx, cy) = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
					s.pinch_to(cx, cy, spread(*a, *b));
				}
				[] => {}
			}
		}
	};

	let state_te = state.clone();
	let on_touchend = move |ev: TouchEvent| {
		if let Some(ref mut s) = *state_te.borrow_mut() {
			if ev.touches().length() < 2 {
				s.end_pinch();
			}
			if ev.touches().length() == 0 {
				s.pointer_up();
			}
		}
	};

	view! {
		<div class="query-graph" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="query-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:touchstart=on_touchstart
				on:touchmove=on_touchmove
				on:touchend=on_touchend
				style="display: block; cursor: grab; touch-action: none;"
			/>
			<Legend highlight=highlight />
		</div>
	}
}

/// Legend entries double as highlight toggles.
#[component]
fn Legend(highlight: RwSignal<Option<NodeKind>>) -> impl IntoView {
	let entry = move |kind: NodeKind| {
		let dimmed = move || !node_emphasized(highlight.get(), kind);
		view! {
			<div
				class="legend-entry"
				class:dimmed=dimmed
				style="display: flex; align-items: center; gap: 4px; cursor: pointer;"
				on:click=move |_| highlight.update(|h| *h = toggle_highlight(*h, kind))
			>
				<svg width="12" height="12">
					<circle cx="6" cy="6" r="5" fill=render::kind_color(kind) />
				</svg>
				<span>{kind.to_string()}</span>
			</div>
		}
	};

	view! {
		<div
			class="query-graph-legend"
			style="position: absolute; top: 8px; right: 8px; display: flex; gap: 16px; user-select: none;"
		>
			{entry(NodeKind::Variable)}
			{entry(NodeKind::Term)}
		</div>
	}
}

fn canvas_size(
	window: &Window,
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
		let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
		return (w, h);
	}
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0)),
		height.unwrap_or_else(|| parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0)),
	)
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: f64, client_y: f64) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((client_x - rect.left(), client_y - rect.top()))
}

fn touch_points(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &TouchEvent) -> Vec<(f64, f64)> {
	let touches = ev.touches();
	(0..touches.length())
		.filter_map(|i| touches.get(i))
		.filter_map(|t| canvas_point(canvas_ref, t.client_x() as f64, t.client_y() as f64))
		.collect()
}

fn spread(a: (f64, f64), b: (f64, f64)) -> f64 {
	((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
