//! Retained scene of the network drawing and the reconciliation that moves it
//! from one view state to the next.
//!
//! Every visual is keyed: glows, nodes and links by node/link id, wedges and
//! comparison slices by `(node id, label)`. [`Scene::reconcile`] joins the
//! previous scene against the new frame with [`keyed_diff`]; entering visuals
//! appear at their final geometry, updating ones start a [`Tween`] from
//! whatever they currently show, exiting ones are dropped.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::hash::Hash;

use log::debug;

use super::layout::ClusterBox;
use super::palette::{BLACK, ColorScheme, Rgb, WHITE};
use super::tween::{Lerp, Tween};
use super::types::{Group, Label, Link, MarkovSelection, Node, Point, ProbValue};

/// Ring scale of a node's probability wedges.
const RING_COLLAPSED: f64 = 1.0;
const RING_EXPANDED: f64 = 1.55;
/// Ring thickness relative to the node radius.
const RING_WIDTH: f64 = 0.5;
/// Background disc radius relative to the node radius.
const BACKGROUND_COLLAPSED: f64 = 1.5;
const BACKGROUND_EXPANDED: f64 = 2.05;
/// Glow radius relative to the node radius.
const GLOW_COLLAPSED: f64 = 1.8;
const GLOW_EXPANDED: f64 = 2.3;
/// Pixels between the background disc and its drawn edge.
const BACKGROUND_PAD: f64 = 2.0;

pub type WedgeKey = (String, Label);

/// One step of a keyed join.
#[derive(Debug, PartialEq)]
pub enum Change<K, P, N> {
	Enter { key: K, next: N },
	Update { key: K, prev: P, next: N },
	Exit { key: K, prev: P },
}

/// Joins `prev` against `next` by key. Entering and updating items come out
/// in `next` order, followed by exits in `prev` order.
pub fn keyed_diff<K, P, N>(prev: Vec<(K, P)>, next: Vec<(K, N)>) -> Vec<Change<K, P, N>>
where
	K: Eq + Hash + Clone,
{
	let order: Vec<K> = prev.iter().map(|(k, _)| k.clone()).collect();
	let mut remaining: HashMap<K, P> = prev.into_iter().collect();
	let mut changes = Vec::with_capacity(next.len() + remaining.len());
	for (key, n) in next {
		match remaining.remove(&key) {
			Some(p) => changes.push(Change::Update { key, prev: p, next: n }),
			None => changes.push(Change::Enter { key, next: n }),
		}
	}
	for key in order {
		if let Some(p) = remaining.remove(&key) {
			changes.push(Change::Exit { key, prev: p });
		}
	}
	changes
}

/// Pie slice. Angles run clockwise from 12 o'clock, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcGeometry {
	pub start_angle: f64,
	pub end_angle: f64,
	pub inner_radius: f64,
	pub outer_radius: f64,
}

impl Lerp for ArcGeometry {
	fn lerp(&self, to: &Self, t: f64) -> Self {
		Self {
			start_angle: self.start_angle.lerp(&to.start_angle, t),
			end_angle: self.end_angle.lerp(&to.end_angle, t),
			inner_radius: self.inner_radius.lerp(&to.inner_radius, t),
			outer_radius: self.outer_radius.lerp(&to.outer_radius, t),
		}
	}
}

impl ArcGeometry {
	/// Whether the offset `(dx, dy)` from the pie center falls in the slice.
	pub fn contains(&self, dx: f64, dy: f64) -> bool {
		let r = dx.hypot(dy);
		if r < self.inner_radius || r > self.outer_radius || self.end_angle <= self.start_angle {
			return false;
		}
		let angle = dx.atan2(-dy).rem_euclid(TAU);
		angle >= self.start_angle && angle < self.end_angle
	}
}

/// Slice boundaries proportional to the values, in input order.
pub fn pie_angles(values: &[ProbValue]) -> Vec<(f64, f64)> {
	let total: f64 = values.iter().map(|pv| pv.value).sum();
	let mut start = 0.0;
	values
		.iter()
		.map(|pv| {
			let sweep = if total > 0.0 { pv.value / total * TAU } else { 0.0 };
			let slice = (start, start + sweep);
			start += sweep;
			slice
		})
		.collect()
}

pub fn annotation(label: Label, value: f64) -> String {
	format!("{}: {}%", label, (value * 100.0).round() as i64)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
	/// Radius of a node body.
	pub radius: f64,
	pub duration_ms: f64,
}

impl SceneConfig {
	fn ring(&self, scale: f64) -> (f64, f64) {
		(self.radius * scale, self.radius * (scale + RING_WIDTH))
	}

	pub fn background_radius(&self, expanded: bool) -> f64 {
		let k = if expanded { BACKGROUND_EXPANDED } else { BACKGROUND_COLLAPSED };
		self.radius * k + BACKGROUND_PAD
	}

	/// Distance from a target's center to the tip of an incoming arrow.
	pub fn arrow_offset(&self, target_expanded: bool) -> f64 {
		self.background_radius(target_expanded)
	}

	pub fn glow_radius(&self, expanded: bool) -> f64 {
		self.radius * if expanded { GLOW_EXPANDED } else { GLOW_COLLAPSED }
	}

	fn slices(&self, values: &[ProbValue], scale: f64) -> Vec<(ProbValue, ArcGeometry)> {
		let (inner, outer) = self.ring(scale);
		values
			.iter()
			.zip(pie_angles(values))
			.map(|(pv, (start, end))| {
				(
					*pv,
					ArcGeometry {
						start_angle: start,
						end_angle: end,
						inner_radius: inner,
						outer_radius: outer,
					},
				)
			})
			.collect()
	}
}

/// What one render call draws.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
	pub nodes: &'a [Node],
	pub links: &'a [Link],
	/// Unconditioned network, for comparison rings.
	pub baseline: &'a [Node],
	pub clusters: &'a [ClusterBox],
	pub markov: &'a MarkovSelection,
	pub scheme: ColorScheme,
	pub comparison: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GlowVisual {
	pub center: Point,
	pub radius: f64,
	/// `None` is transparent.
	pub fill: Option<Rgb>,
	pub fade: Tween<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkVisual {
	pub points: Vec<Point>,
	pub width: f64,
	pub arrow_offset: Tween<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeVisual {
	pub center: Point,
	pub title: String,
	pub group: Group,
	pub fill: Rgb,
	pub text: Rgb,
	pub background_radius: Tween<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WedgeVisual {
	pub center: Point,
	pub value: f64,
	pub fill: Rgb,
	pub geometry: Tween<ArcGeometry>,
	pub annotation: String,
}

/// Baseline slice drawn behind an expanded node.
#[derive(Clone, Debug, PartialEq)]
pub struct RingVisual {
	pub center: Point,
	pub fill: Rgb,
	pub geometry: ArcGeometry,
	pub annotation: String,
}

/// What a canvas point lands on, topmost first.
#[derive(Clone, Debug, PartialEq)]
pub enum Hit {
	Wedge { node_id: String, label: Label },
	Comparison { node_id: String },
	Node { node_id: String },
	Background,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub glows: Vec<(String, GlowVisual)>,
	pub links: Vec<(String, LinkVisual)>,
	pub nodes: Vec<(String, NodeVisual)>,
	pub comparison: Vec<(WedgeKey, RingVisual)>,
	pub wedges: Vec<(WedgeKey, WedgeVisual)>,
	pub clusters: Vec<ClusterBox>,
	pub radius: f64,
}

impl Scene {
	/// Moves the scene to `frame`, starting transitions at `now_ms`.
	pub fn reconcile(self, frame: &Frame<'_>, cfg: &SceneConfig, now_ms: f64) -> Scene {
		let duration = cfg.duration_ms;
		let expanded: HashMap<&str, bool> = frame
			.nodes
			.iter()
			.map(|n| (n.id.as_str(), n.is_expanded))
			.collect();

		let glows = keyed_diff(self.glows, keyed_nodes(frame.nodes))
			.into_iter()
			.filter_map(|change| match change {
				Change::Enter { key, next } => {
					let fill = frame.scheme.markov(frame.markov.role_of(&next.id));
					Some((
						key,
						GlowVisual {
							center: next.center(),
							radius: cfg.glow_radius(next.is_expanded),
							fill,
							fade: Tween::new(0.0, 1.0, now_ms, duration / 5.0),
						},
					))
				}
				Change::Update { key, prev, next } => {
					let fill = frame.scheme.markov(frame.markov.role_of(&next.id));
					let fade = if prev.fill == fill {
						prev.fade
					} else {
						Tween::new(0.0, 1.0, now_ms, duration / 5.0)
					};
					Some((
						key,
						GlowVisual {
							center: next.center(),
							radius: cfg.glow_radius(next.is_expanded),
							fill,
							fade,
						},
					))
				}
				Change::Exit { .. } => None,
			})
			.collect();

		let next_links = frame.links.iter().map(|l| (l.id.clone(), l)).collect();
		let links = keyed_diff(self.links, next_links)
			.into_iter()
			.filter_map(|change| {
				let (key, prev, next) = match change {
					Change::Enter { key, next } => (key, None, next),
					Change::Update { key, prev, next } => (key, Some(prev), next),
					Change::Exit { .. } => return None,
				};
				let arrow_offset = match prev {
					None => Tween::settled(cfg.arrow_offset(false)),
					Some(prev) => {
						let target_expanded = expanded.get(next.target.as_str()).copied().unwrap_or(false);
						retarget(prev.arrow_offset, cfg.arrow_offset(target_expanded), now_ms, duration)
					}
				};
				Some((
					key,
					LinkVisual {
						points: next.points.clone(),
						width: 4.0 * next.strength,
						arrow_offset,
					},
				))
			})
			.collect();

		let nodes = keyed_diff(self.nodes, keyed_nodes(frame.nodes))
			.into_iter()
			.filter_map(|change| {
				let (key, prev, next) = match change {
					Change::Enter { key, next } => (key, None, next),
					Change::Update { key, prev, next } => (key, Some(prev), next),
					Change::Exit { .. } => return None,
				};
				let background_radius = match prev {
					None => Tween::settled(cfg.background_radius(false)),
					Some(prev) => retarget(
						prev.background_radius,
						cfg.background_radius(next.is_expanded),
						now_ms,
						duration,
					),
				};
				Some((
					key,
					NodeVisual {
						center: next.center(),
						title: next.title.clone(),
						group: next.group,
						fill: frame.scheme.node_fill(next.group, next.is_evidence),
						text: if next.is_evidence { WHITE } else { BLACK },
						background_radius,
					},
				))
			})
			.collect();

		let mut entered = 0;
		let mut exited = 0;
		let next_wedges = frame
			.nodes
			.iter()
			.flat_map(|n| {
				let scale = if n.is_expanded { RING_EXPANDED } else { RING_COLLAPSED };
				cfg.slices(n.values.values(), scale)
					.into_iter()
					.map(move |(pv, geometry)| ((n.id.clone(), pv.label), (n.center(), pv, geometry)))
			})
			.collect();
		let wedges = keyed_diff(self.wedges, next_wedges)
			.into_iter()
			.filter_map(|change| {
				let (key, prev, (center, pv, geometry)) = match change {
					Change::Enter { key, next } => {
						entered += 1;
						(key, None, next)
					}
					Change::Update { key, prev, next } => (key, Some(prev), next),
					Change::Exit { .. } => {
						exited += 1;
						return None;
					}
				};
				let geometry = match prev {
					None => Tween::settled(geometry),
					Some(prev) => retarget(prev.geometry, geometry, now_ms, duration),
				};
				Some((
					key,
					WedgeVisual {
						center,
						value: pv.value,
						fill: frame.scheme.wedge(pv.label),
						geometry,
						annotation: annotation(pv.label, pv.value),
					},
				))
			})
			.collect();

		let next_comparison = if frame.comparison {
			frame
				.nodes
				.iter()
				.filter(|n| n.is_expanded)
				.filter_map(|n| frame.baseline.iter().find(|b| b.id == n.id).map(|b| (n, b)))
				.flat_map(|(n, base)| {
					cfg.slices(base.values.values(), RING_COLLAPSED)
						.into_iter()
						.map(move |(pv, geometry)| ((n.id.clone(), pv.label), (n.center(), pv, geometry)))
				})
				.collect()
		} else {
			Vec::new()
		};
		let comparison = keyed_diff(self.comparison, next_comparison)
			.into_iter()
			.filter_map(|change| match change {
				Change::Enter { key, next: (center, pv, geometry) }
				| Change::Update { key, next: (center, pv, geometry), .. } => Some((
					key,
					RingVisual {
						center,
						fill: frame.scheme.wedge(pv.label),
						geometry,
						annotation: annotation(pv.label, pv.value),
					},
				)),
				Change::Exit { .. } => None,
			})
			.collect();

		debug!("scene reconciled: {entered} wedges entered, {exited} exited");

		Scene {
			glows,
			links,
			nodes,
			comparison,
			wedges,
			clusters: frame.clusters.to_vec(),
			radius: cfg.radius,
		}
	}

	pub fn is_animating(&self, now_ms: f64) -> bool {
		self.glows.iter().any(|(_, g)| g.fill.is_some() && g.fade.is_running(now_ms))
			|| self.links.iter().any(|(_, l)| l.arrow_offset.is_running(now_ms))
			|| self.nodes.iter().any(|(_, n)| n.background_radius.is_running(now_ms))
			|| self.wedges.iter().any(|(_, w)| w.geometry.is_running(now_ms))
	}

	pub fn wedge(&self, key: &WedgeKey) -> Option<&WedgeVisual> {
		self.wedges.iter().find(|(k, _)| k == key).map(|(_, w)| w)
	}

	pub fn hit_test(&self, p: Point, now_ms: f64) -> Hit {
		for ((node_id, label), w) in self.wedges.iter().rev() {
			if w.geometry.value_at(now_ms).contains(p.x - w.center.x, p.y - w.center.y) {
				return Hit::Wedge {
					node_id: node_id.clone(),
					label: *label,
				};
			}
		}
		for ((node_id, _), ring) in self.comparison.iter().rev() {
			if ring.geometry.contains(p.x - ring.center.x, p.y - ring.center.y) {
				return Hit::Comparison {
					node_id: node_id.clone(),
				};
			}
		}
		for (node_id, n) in self.nodes.iter().rev() {
			if n.center.distance(p) <= self.radius {
				return Hit::Node {
					node_id: node_id.clone(),
				};
			}
		}
		Hit::Background
	}
}

fn keyed_nodes(nodes: &[Node]) -> Vec<(String, &Node)> {
	nodes.iter().map(|n| (n.id.clone(), n)).collect()
}

/// Keeps a transition already heading to `to`; otherwise restarts toward it
/// from the value currently shown.
fn retarget<T: Lerp + PartialEq>(mut tween: Tween<T>, to: T, now_ms: f64, duration_ms: f64) -> Tween<T> {
	if *tween.target() != to {
		tween.retarget(to, now_ms, duration_ms);
	}
	tween
}

#[cfg(test)]
mod tests {
	use std::f64::consts::PI;

	use super::*;
	use crate::components::bayes_net::types::{Distribution, MarkovRole};
	use crate::components::bayes_net::types::fixtures::{dist, four_node_network};

	const CFG: SceneConfig = SceneConfig {
		radius: 40.0,
		duration_ms: 750.0,
	};

	/// The four-node network spread along a diagonal.
	fn placed() -> (Vec<Node>, Vec<Link>) {
		let mut model = four_node_network();
		for (i, n) in model.nodes.iter_mut().enumerate() {
			n.x = 200.0 * (i + 1) as f64;
			n.y = 200.0 * (i + 1) as f64;
		}
		for l in &mut model.links {
			l.points = vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
		}
		(model.nodes, model.links)
	}

	fn frame<'a>(nodes: &'a [Node], links: &'a [Link], baseline: &'a [Node], markov: &'a MarkovSelection) -> Frame<'a> {
		Frame {
			nodes,
			links,
			baseline,
			clusters: &[],
			markov,
			scheme: ColorScheme::Probability,
			comparison: true,
		}
	}

	fn render(scene: Scene, nodes: &[Node], links: &[Link], baseline: &[Node], now: f64) -> Scene {
		let markov = MarkovSelection::default();
		scene.reconcile(&frame(nodes, links, baseline, &markov), &CFG, now)
	}

	#[test]
	fn keyed_diff_splits_enter_update_exit() {
		let prev = vec![("a", 1), ("b", 2), ("c", 3)];
		let next = vec![("c", 'x'), ("d", 'y'), ("a", 'z')];
		let changes = keyed_diff(prev, next);
		assert_eq!(
			changes,
			vec![
				Change::Update { key: "c", prev: 3, next: 'x' },
				Change::Enter { key: "d", next: 'y' },
				Change::Update { key: "a", prev: 1, next: 'z' },
				Change::Exit { key: "b", prev: 2 },
			]
		);
	}

	#[test]
	fn pie_keeps_label_order_and_proportions() {
		let d = dist(0.5, 0.25, 0.25);
		let angles = pie_angles(d.values());
		assert_eq!(angles.len(), 3);
		assert!((angles[0].1 - PI).abs() < 1e-12);
		assert!((angles[1].1 - 1.5 * PI).abs() < 1e-12);
		assert!((angles[2].1 - TAU).abs() < 1e-12);
	}

	#[test]
	fn annotation_rounds_to_whole_percent() {
		assert_eq!(annotation(Label::Excess, 0.305), "Excess: 31%");
		assert_eq!(annotation(Label::Normal, 1.0), "Normal: 100%");
	}

	#[test]
	fn markov_glow_covers_exactly_target_and_blanket() {
		let (mut nodes, links) = placed();
		nodes[0].is_evidence = true;
		let markov = MarkovSelection::new("a3", vec!["a2".into()]);
		let scene = Scene::default().reconcile(&frame(&nodes, &links, &nodes, &markov), &CFG, 0.0);
		let fill = |id: &str| scene.glows.iter().find(|(k, _)| k == id).unwrap().1.fill;
		assert_eq!(fill("a3"), ColorScheme::Probability.markov(MarkovRole::Target));
		assert!(fill("a2").is_some());
		assert_eq!(fill("a1"), None);
		assert_eq!(fill("a4"), None);
	}

	#[test]
	fn evidence_nodes_are_black_with_white_text() {
		let (mut nodes, links) = placed();
		nodes[2].is_evidence = true;
		let scene = render(Scene::default(), &nodes, &links, &nodes, 0.0);
		let (_, a3) = scene.nodes.iter().find(|(k, _)| k == "a3").unwrap();
		assert_eq!((a3.fill, a3.text), (BLACK, WHITE));
		let (_, a1) = scene.nodes.iter().find(|(k, _)| k == "a1").unwrap();
		assert_eq!((a1.fill, a1.text), (WHITE, BLACK));
	}

	#[test]
	fn entering_wedges_start_at_final_geometry() {
		let (nodes, links) = placed();
		let scene = render(Scene::default(), &nodes, &links, &nodes, 0.0);
		assert_eq!(scene.wedges.len(), 12);
		let w = scene.wedge(&("a1".into(), Label::Normal)).unwrap();
		assert!(!w.geometry.is_running(0.0));
		assert!((w.geometry.value_at(0.0).end_angle - PI).abs() < 1e-12);
		assert_eq!(w.annotation, "Normal: 50%");
	}

	#[test]
	fn updated_wedges_interpolate_to_new_values() {
		let (nodes, links) = placed();
		let scene = render(Scene::default(), &nodes, &links, &nodes, 0.0);

		let mut next = nodes.clone();
		next[0].values = Distribution::degenerate(Label::Excess, &next[0].values.labels());
		let scene = render(scene, &next, &links, &nodes, 1000.0);
		let key = ("a1".to_string(), Label::Normal);
		let w = scene.wedge(&key).unwrap();
		assert!((w.geometry.value_at(1000.0).end_angle - PI).abs() < 1e-12);
		assert!(w.geometry.is_running(1200.0));
		assert_eq!(w.geometry.value_at(1750.0).end_angle, 0.0);
		assert_eq!(w.annotation, "Normal: 0%");
	}

	#[test]
	fn interrupted_transition_restarts_from_shown_value() {
		let (nodes, links) = placed();
		let scene = render(Scene::default(), &nodes, &links, &nodes, 0.0);
		let mut excess = nodes.clone();
		excess[0].values = Distribution::degenerate(Label::Excess, &excess[0].values.labels());
		let scene = render(scene, &excess, &links, &nodes, 0.0);
		let key = ("a1".to_string(), Label::Normal);
		let shown = scene.wedge(&key).unwrap().geometry.value_at(300.0);

		let scene = render(scene, &nodes, &links, &nodes, 300.0);
		let w = scene.wedge(&key).unwrap();
		assert_eq!(w.geometry.value_at(300.0), shown);
		assert!((w.geometry.value_at(1050.0).end_angle - PI).abs() < 1e-12);
	}

	#[test]
	fn expansion_grows_ring_background_and_pushes_arrows_back() {
		let (nodes, links) = placed();
		let scene = render(Scene::default(), &nodes, &links, &nodes, 0.0);
		let mut next = nodes.clone();
		next[3].is_expanded = true;
		let scene = render(scene, &next, &links, &nodes, 0.0);
		let end = 750.0;

		let (_, a4) = scene.nodes.iter().find(|(k, _)| k == "a4").unwrap();
		assert_eq!(a4.background_radius.value_at(end), CFG.background_radius(true));
		let w = scene.wedge(&("a4".into(), Label::Normal)).unwrap();
		assert_eq!(w.geometry.value_at(end).inner_radius, 40.0 * RING_EXPANDED);

		// b2 and b3 point at a4, b1 does not.
		for (id, link) in &scene.links {
			let want = CFG.arrow_offset(id != "b1");
			assert_eq!(link.arrow_offset.value_at(end), want, "{id}");
		}
		assert!(CFG.arrow_offset(true) > CFG.arrow_offset(false));
	}

	#[test]
	fn comparison_ring_shows_baseline_for_expanded_nodes_only() {
		let (nodes, links) = placed();
		let mut next = nodes.clone();
		next[1].values = Distribution::degenerate(Label::Deficient, &next[1].values.labels());
		next[1].is_expanded = true;
		let scene = render(Scene::default(), &next, &links, &nodes, 0.0);
		assert_eq!(scene.comparison.len(), 3);
		assert!(scene.comparison.iter().all(|((id, _), _)| id == "a2"));
		let ((_, _), ring) = scene
			.comparison
			.iter()
			.find(|((_, l), _)| *l == Label::Normal)
			.unwrap();
		assert_eq!(ring.annotation, "Normal: 90%");

		let markov = MarkovSelection::default();
		let mut off = frame(&next, &links, &nodes, &markov);
		off.comparison = false;
		let scene = scene.reconcile(&off, &CFG, 10.0);
		assert!(scene.comparison.is_empty());
	}

	#[test]
	fn removed_nodes_lose_their_wedges() {
		let (nodes, links) = placed();
		let scene = render(Scene::default(), &nodes, &links, &nodes, 0.0);
		let scene = render(scene, &nodes[..2], &links, &nodes, 10.0);
		assert_eq!(scene.wedges.len(), 6);
		assert_eq!(scene.nodes.len(), 2);
		assert!(scene.wedge(&("a4".into(), Label::Excess)).is_none());
	}

	#[test]
	fn hit_test_resolves_wedges_bodies_and_background() {
		let (nodes, links) = placed();
		let scene = render(Scene::default(), &nodes, &links, &nodes, 0.0);
		let c = nodes[0].center();
		// a1 is 50% Normal, 30% Excess, 20% Deficient, clockwise from 12 o'clock.
		let ring = 40.0 * 1.25;
		assert_eq!(
			scene.hit_test(Point::new(c.x + ring, c.y), 0.0),
			Hit::Wedge {
				node_id: "a1".into(),
				label: Label::Normal
			}
		);
		assert_eq!(
			scene.hit_test(Point::new(c.x, c.y + ring), 0.0),
			Hit::Wedge {
				node_id: "a1".into(),
				label: Label::Excess
			}
		);
		assert_eq!(
			scene.hit_test(Point::new(c.x - 0.588 * ring, c.y - 0.809 * ring), 0.0),
			Hit::Wedge {
				node_id: "a1".into(),
				label: Label::Deficient
			}
		);
		assert_eq!(
			scene.hit_test(Point::new(c.x + 5.0, c.y), 0.0),
			Hit::Node { node_id: "a1".into() }
		);
		assert_eq!(scene.hit_test(Point::new(-500.0, 0.0), 0.0), Hit::Background);
	}

	#[test]
	fn scene_settles_after_duration() {
		let (nodes, links) = placed();
		let scene = render(Scene::default(), &nodes, &links, &nodes, 0.0);
		let mut next = nodes.clone();
		next[0].values = dist(0.2, 0.2, 0.6);
		let scene = render(scene, &next, &links, &nodes, 100.0);
		assert!(scene.is_animating(500.0));
		assert!(!scene.is_animating(900.0));
	}
}
