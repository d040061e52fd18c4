use std::f64::consts::{FRAC_PI_2, PI};

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::palette::{GREY, Rgb, WHITE};
use super::scene::{ArcGeometry, Scene, WedgeKey};
use super::types::Point;
use super::viewport::Viewport;

const GLOW_BLUR: f64 = 18.0;
const BODY_STROKE: f64 = 4.0;
const COMPARISON_ALPHA: f64 = 0.5;
const TOOLTIP_FILL: Rgb = Rgb(40, 40, 40);

/// Wedge under the pointer, with the pointer position in screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct Hover {
	pub key: WedgeKey,
	pub at: Point,
}

pub fn render(ctx: &CanvasRenderingContext2d, scene: &Scene, viewport: &Viewport, hover: Option<&Hover>, now_ms: f64) {
	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);
	ctx.save();
	let t = &viewport.transform;
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_clusters(scene, ctx);
	draw_glows(scene, ctx, now_ms);
	draw_links(scene, ctx, now_ms);
	draw_nodes(scene, ctx, now_ms);
	draw_comparison(scene, ctx);
	draw_wedges(scene, ctx, hover.map(|h| &h.key), now_ms);
	ctx.restore();

	if let Some(h) = hover {
		if let Some(w) = scene.wedge(&h.key) {
			draw_tooltip(ctx, &w.annotation, h.at);
		}
	}
}

fn draw_clusters(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	if scene.clusters.is_empty() {
		return;
	}
	ctx.set_stroke_style_str("#999999");
	ctx.set_line_width(1.5);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(6.0), &JsValue::from_f64(4.0)));
	ctx.set_fill_style_str("#666666");
	ctx.set_font("italic 12px sans-serif");
	ctx.set_text_align("left");
	for c in &scene.clusters {
		ctx.stroke_rect(c.x, c.y, c.width, c.height);
		let _ = ctx.fill_text(c.group.as_str(), c.x + 6.0, c.y + 14.0);
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_glows(scene: &Scene, ctx: &CanvasRenderingContext2d, now_ms: f64) {
	for (_, g) in &scene.glows {
		let Some(fill) = g.fill else {
			continue;
		};
		ctx.save();
		ctx.set_global_alpha(g.fade.value_at(now_ms));
		ctx.set_shadow_color(&fill.css());
		ctx.set_shadow_blur(GLOW_BLUR);
		ctx.set_fill_style_str(&fill.css());
		circle(ctx, g.center, g.radius);
		ctx.fill();
		ctx.restore();
	}
}

fn draw_links(scene: &Scene, ctx: &CanvasRenderingContext2d, now_ms: f64) {
	ctx.set_stroke_style_str(&GREY.css());
	ctx.set_fill_style_str(&GREY.css());
	for (_, l) in &scene.links {
		let &[.., from, tip_end] = l.points.as_slice() else {
			continue;
		};
		let (dx, dy) = (tip_end.x - from.x, tip_end.y - from.y);
		let len = dx.hypot(dy);
		if len < 1e-3 {
			continue;
		}
		let (ux, uy) = (dx / len, dy / len);
		let arrow = 4.0 * l.width.max(1.0);
		let offset = l.arrow_offset.value_at(now_ms);
		let tip = Point::new(tip_end.x - ux * offset, tip_end.y - uy * offset);
		let back = Point::new(tip.x - ux * arrow, tip.y - uy * arrow);

		ctx.set_line_width(l.width);
		ctx.begin_path();
		ctx.move_to(l.points[0].x, l.points[0].y);
		for p in &l.points[1..l.points.len() - 1] {
			ctx.line_to(p.x, p.y);
		}
		ctx.line_to(back.x, back.y);
		ctx.stroke();

		let (px, py) = (-uy * arrow * 0.5, ux * arrow * 0.5);
		ctx.begin_path();
		ctx.move_to(tip.x, tip.y);
		ctx.line_to(back.x + px, back.y + py);
		ctx.line_to(back.x - px, back.y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_nodes(scene: &Scene, ctx: &CanvasRenderingContext2d, now_ms: f64) {
	let r = scene.radius;
	ctx.set_fill_style_str(&WHITE.css());
	for (_, n) in &scene.nodes {
		circle(ctx, n.center, n.background_radius.value_at(now_ms));
		ctx.fill();
	}

	ctx.set_text_align("center");
	ctx.set_stroke_style_str(&WHITE.css());
	ctx.set_line_width(BODY_STROKE);
	for (_, n) in &scene.nodes {
		circle(ctx, n.center, r);
		ctx.set_fill_style_str(&n.fill.css());
		ctx.fill();
		ctx.stroke();

		ctx.set_fill_style_str(&n.text.css());
		ctx.set_font("bold 12px sans-serif");
		let _ = ctx.fill_text(&n.title, n.center.x, n.center.y + 10.0);
		ctx.set_font("italic 10px sans-serif");
		let _ = ctx.fill_text(n.group.as_str(), n.center.x, n.center.y - 5.0);
	}
}

fn draw_comparison(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	if scene.comparison.is_empty() {
		return;
	}
	ctx.save();
	ctx.set_global_alpha(COMPARISON_ALPHA);
	for (_, ring) in &scene.comparison {
		ctx.set_fill_style_str(&ring.fill.css());
		if wedge(ctx, ring.center, &ring.geometry) {
			ctx.fill();
		}
	}
	ctx.restore();
}

fn draw_wedges(scene: &Scene, ctx: &CanvasRenderingContext2d, hovered: Option<&WedgeKey>, now_ms: f64) {
	for (key, w) in &scene.wedges {
		let fill = if hovered == Some(key) { w.fill.darker() } else { w.fill };
		ctx.set_fill_style_str(&fill.css());
		if wedge(ctx, w.center, &w.geometry.value_at(now_ms)) {
			ctx.fill();
		}
	}
}

fn draw_tooltip(ctx: &CanvasRenderingContext2d, text: &str, at: Point) {
	let (w, h) = (text.len() as f64 * 7.0 + 12.0, 22.0);
	let (x, y) = (at.x + 12.0, at.y - h - 4.0);
	ctx.set_fill_style_str(&TOOLTIP_FILL.css_alpha(0.85));
	ctx.fill_rect(x, y, w, h);
	ctx.set_fill_style_str(&WHITE.css());
	ctx.set_font("12px sans-serif");
	ctx.set_text_align("left");
	let _ = ctx.fill_text(text, x + 6.0, y + 15.0);
}

fn circle(ctx: &CanvasRenderingContext2d, c: Point, r: f64) {
	ctx.begin_path();
	let _ = ctx.arc(c.x, c.y, r.max(0.0), 0.0, 2.0 * PI);
}

/// Traces an annular slice. Slice angles start at 12 o'clock, canvas angles
/// at 3 o'clock. Returns false for an empty slice.
fn wedge(ctx: &CanvasRenderingContext2d, c: Point, g: &ArcGeometry) -> bool {
	if g.end_angle <= g.start_angle {
		return false;
	}
	let (start, end) = (g.start_angle - FRAC_PI_2, g.end_angle - FRAC_PI_2);
	ctx.begin_path();
	let _ = ctx.arc(c.x, c.y, g.outer_radius, start, end);
	let _ = ctx.arc_with_anticlockwise(c.x, c.y, g.inner_radius, end, start, true);
	ctx.close_path();
	true
}
