use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::layout::{Layout, LayoutKind, LayoutResult};
use super::palette::ColorScheme;
use super::render::{self, Hover};
use super::scene::{Hit, Scene, SceneConfig};
use super::state::{ViewState, propagate_evidence, query_markov_blanket};
use super::types::{GraphModel, Point};
use super::viewport::Viewport;
use crate::api::HttpNetworkService;
use crate::settings::Settings;

/// Room kept for the page controls above the canvas.
const CONTROLS_HEIGHT: f64 = 190.0;

/// Everything the animation loop and pointer handlers share.
struct CanvasState {
	model: Option<GraphModel>,
	layout: LayoutResult,
	scene: Scene,
	scheme: ColorScheme,
	viewport: Viewport,
	hover: Option<Hover>,
	/// Revision of the view state the scene was last reconciled against.
	rendered: Option<u64>,
	/// Repaint on the next frame.
	dirty: bool,
}

impl CanvasState {
	fn screen_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Point {
		let rect = canvas.get_bounding_client_rect();
		Point::new(ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top())
	}
}

fn now_ms() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map_or(0.0, |p| p.now())
}

fn alert(message: &str) {
	if let Some(window) = web_sys::window() {
		let _ = window.alert_with_message(message);
	}
}

/// Canvas drawing of the network. Wedge clicks propagate evidence, node-body
/// clicks query the Markov blanket, background clicks reset.
#[component]
pub fn BayesNetCanvas(
	#[prop(into)] model: Signal<GraphModel>,
	#[prop(into)] layout: Signal<LayoutKind>,
	#[prop(into)] scheme: Signal<ColorScheme>,
	#[prop(into)] comparison: Signal<bool>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let settings = use_context::<Settings>().unwrap_or_default();
	let service = HttpNetworkService::new(&settings.api_url);
	let scene_cfg = SceneConfig {
		radius: settings.node_radius(),
		duration_ms: settings.duration_ms,
	};
	let node_size = settings.node_size;

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let view = Rc::new(RefCell::new(ViewState::new(
		Vec::new(),
		comparison.get_untracked(),
		settings.expansion_threshold,
	)));
	let state = Rc::new(RefCell::new(CanvasState {
		model: None,
		layout: LayoutResult::default(),
		scene: Scene::default(),
		scheme: scheme.get_untracked(),
		viewport: Viewport::new(800.0, 600.0),
		hover: None,
		rendered: None,
		dirty: true,
	}));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	// Layout runs again when the network or the strategy changes. A new
	// network restarts the view; a new strategy only moves nodes.
	let (state_layout, view_layout) = (state.clone(), view.clone());
	Effect::new(move |_| {
		let model = model.get();
		let kind = layout.get();
		let result = match kind.layout(&model.nodes, &model.links, node_size) {
			Ok(result) => result,
			Err(e) => {
				error!("{kind} layout failed: {e}");
				return;
			}
		};
		let mut s = state_layout.borrow_mut();
		let mut v = view_layout.borrow_mut();
		if s.model.as_ref() == Some(&model) {
			v.relayout(&result.nodes);
		} else {
			info!("network with {} nodes and {} links", model.nodes.len(), model.links.len());
			*v = ViewState::new(result.nodes.clone(), v.comparison(), settings.expansion_threshold);
			s.scene = Scene::default();
			s.model = Some(model);
		}
		s.viewport.fit(result.width, result.height);
		s.layout = result;
		s.hover = None;
		s.rendered = None;
	});

	let state_scheme = state.clone();
	Effect::new(move |_| {
		let scheme = scheme.get();
		let mut s = state_scheme.borrow_mut();
		s.scheme = scheme;
		s.rendered = None;
	});

	let view_comparison = view.clone();
	Effect::new(move |_| {
		let on = comparison.get();
		if view_comparison.borrow().comparison() != on {
			view_comparison.borrow_mut().set_comparison(on);
		}
	});

	let (state_init, view_init, animate_init, resize_cb_init) =
		(state.clone(), view.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let window: Window = web_sys::window().unwrap();

		let size = move |win: &Window, canvas: &HtmlCanvasElement| {
			let w = canvas
				.parent_element()
				.map(|p| p.client_width() as f64)
				.filter(|w| *w > 0.0)
				.unwrap_or_else(|| win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0));
			let h = height.unwrap_or_else(|| {
				win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0) - CONTROLS_HEIGHT
			});
			(w, h.max(200.0))
		};
		let (w, h) = size(&window, &canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		{
			let mut s = state_init.borrow_mut();
			s.viewport.resize(w, h);
			s.dirty = true;
		}

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let win: Window = web_sys::window().unwrap();
			let (nw, nh) = size(&win, &canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			let mut s = state_resize.borrow_mut();
			s.viewport.resize(nw, nh);
			s.dirty = true;
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, view_anim, animate_inner) =
			(state_init.clone(), view_init.clone(), animate_init.clone());
		let scene_cfg = scene_cfg.clone();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let now = now_ms();
			{
				let mut guard = state_anim.borrow_mut();
				let s = &mut *guard;
				let v = view_anim.borrow();
				if s.rendered != Some(v.revision()) {
					let frame = v.frame(&s.layout, s.scheme);
					s.scene = std::mem::take(&mut s.scene).reconcile(&frame, &scene_cfg, now);
					s.rendered = Some(v.revision());
					s.dirty = true;
				}
				let animating = s.scene.is_animating(now);
				if s.dirty || animating {
					render::render(&ctx, &s.scene, &s.viewport, s.hover.as_ref(), now);
				}
				// One more frame after a transition ends paints its final state.
				s.dirty = animating;
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let p = CanvasState::screen_point(&canvas, &ev);
		let mut s = state_md.borrow_mut();
		s.viewport.press(p);
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let p = CanvasState::screen_point(&canvas, &ev);
		let mut s = state_mm.borrow_mut();
		if s.viewport.is_pressed() {
			if s.viewport.drag(p) {
				s.hover = None;
				s.dirty = true;
			}
			return;
		}
		let world = s.viewport.to_world(p);
		let hover = match s.scene.hit_test(world, now_ms()) {
			Hit::Wedge { node_id, label } => Some(Hover {
				key: (node_id, label),
				at: p,
			}),
			_ => None,
		};
		if hover != s.hover {
			s.hover = hover;
			s.dirty = true;
		}
	};

	let (state_mu, view_mu) = (state.clone(), view.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let p = CanvasState::screen_point(&canvas, &ev);
		let hit = {
			let mut s = state_mu.borrow_mut();
			let Some(world) = s.viewport.release(p) else {
				return;
			};
			s.scene.hit_test(world, now_ms())
		};

		match hit {
			Hit::Wedge { node_id, label } => {
				let (service, view) = (service.clone(), view_mu.clone());
				spawn_local(async move {
					if let Err(e) = propagate_evidence(&service, &view, &node_id, label).await {
						if e.is_user_visible() {
							error!("evidence propagation failed: {e}");
							alert(&format!("Error propagating evidence: {e}"));
						}
					}
				});
			}
			Hit::Node { node_id } => {
				let (service, view) = (service.clone(), view_mu.clone());
				spawn_local(async move {
					if let Err(e) = query_markov_blanket(&service, &view, &node_id).await {
						error!("Markov blanket query failed: {e}");
						alert(&format!("Error fetching Markov blanket: {e}"));
					}
				});
			}
			Hit::Comparison { .. } => {}
			Hit::Background => view_mu.borrow_mut().reset(),
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let mut s = state_ml.borrow_mut();
		s.viewport.cancel();
		s.hover = None;
		s.dirty = true;
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let p = CanvasState::screen_point(&canvas, &ev);
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		let mut s = state_wh.borrow_mut();
		s.viewport.zoom_at(p, factor);
		s.dirty = true;
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="bayes-net-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; border: 1px solid black; cursor: pointer;"
		/>
	}
}
