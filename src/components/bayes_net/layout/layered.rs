//! Layered drawing with stages as hard ranks.
//!
//! # Pipeline
//! 1. Ranking: a node's layer is its stage index. Links spanning several
//!    layers are split with dummy vertices; upstream links are laid out
//!    top-down and their routes reversed afterwards.
//! 2. Ordering: alternating barycenter sweeps, keeping the ordering with the
//!    fewest crossings seen (the input order included).
//! 3. Coordinates: block Gauss-Seidel over layers. Each step places one layer
//!    optimally for straight links given its neighbours, subject to node size
//!    and gap constraints (see [`project_ordered`]).
//! 4. Routing: each link becomes the polyline through its vertices.

use log::debug;

use super::solver::project_ordered;
use super::{ClusterBox, IndexedGraph, Layout, LayoutError, LayoutResult, NODE_GAP, RANK_GAP};
use crate::components::bayes_net::types::{Link, Node, Point};

/// Width of a dummy vertex relative to the node size.
const DUMMY_WIDTH: f64 = 0.15;
/// Pull of a vertex without links toward where it already is.
const ANCHOR_WEIGHT: f64 = 0.1;

#[derive(Clone, Debug)]
pub struct Layered {
	pub max_sweeps: usize,
	pub refinement_passes: usize,
}

impl Default for Layered {
	fn default() -> Self {
		Self {
			max_sweeps: 24,
			refinement_passes: 32,
		}
	}
}

impl Layout for Layered {
	fn layout(&self, nodes: &[Node], links: &[Link], node_size: f64) -> Result<LayoutResult, LayoutError> {
		let graph = IndexedGraph::new(nodes, links, node_size)?;
		Ok(run(
			&graph,
			node_size,
			&Options {
				max_sweeps: self.max_sweeps,
				refinement_passes: self.refinement_passes,
				clusters: None,
			},
		))
	}
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ClusterStyle {
	pub margin: f64,
	pub label_height: f64,
}

pub(super) struct Options {
	pub max_sweeps: usize,
	pub refinement_passes: usize,
	pub clusters: Option<ClusterStyle>,
}

/// Vertex graph: input nodes first, dummies after.
struct Sketch {
	layer: Vec<usize>,
	width: Vec<f64>,
	dummy: Vec<bool>,
	/// Neighbours one layer above.
	up: Vec<Vec<usize>>,
	/// Neighbours one layer below.
	down: Vec<Vec<usize>>,
	/// Vertex path of every link, source to target.
	routes: Vec<Vec<usize>>,
	layers: Vec<Vec<usize>>,
}

impl Sketch {
	fn build(graph: &IndexedGraph<'_>, first_rank: usize, layer_count: usize, node_size: f64) -> Self {
		let n = graph.nodes.len();
		let mut sketch = Sketch {
			layer: graph.nodes.iter().map(|nd| nd.group.rank() - first_rank).collect(),
			width: vec![node_size; n],
			dummy: vec![false; n],
			up: vec![Vec::new(); n],
			down: vec![Vec::new(); n],
			routes: Vec::with_capacity(graph.edges.len()),
			layers: vec![Vec::new(); layer_count],
		};
		for v in 0..n {
			sketch.layers[sketch.layer[v]].push(v);
		}

		for &(source, target) in &graph.edges {
			let (ls, lt) = (sketch.layer[source], sketch.layer[target]);
			if ls == lt {
				sketch.routes.push(vec![source, target]);
				continue;
			}
			let (top, bottom) = if ls < lt { (source, target) } else { (target, source) };
			let mut path = vec![top];
			for l in sketch.layer[top] + 1..sketch.layer[bottom] {
				path.push(sketch.add_dummy(l, node_size * DUMMY_WIDTH));
			}
			path.push(bottom);
			for pair in path.windows(2) {
				sketch.down[pair[0]].push(pair[1]);
				sketch.up[pair[1]].push(pair[0]);
			}
			if ls > lt {
				path.reverse();
			}
			sketch.routes.push(path);
		}
		sketch
	}

	fn add_dummy(&mut self, layer: usize, width: f64) -> usize {
		let v = self.layer.len();
		self.layer.push(layer);
		self.width.push(width);
		self.dummy.push(true);
		self.up.push(Vec::new());
		self.down.push(Vec::new());
		self.layers[layer].push(v);
		v
	}

	fn vertex_count(&self) -> usize {
		self.layer.len()
	}

	fn positions(&self, layers: &[Vec<usize>]) -> Vec<usize> {
		let mut pos = vec![0; self.vertex_count()];
		for layer in layers {
			for (p, &v) in layer.iter().enumerate() {
				pos[v] = p;
			}
		}
		pos
	}

	fn crossings(&self, layers: &[Vec<usize>]) -> usize {
		let pos = self.positions(layers);
		let mut total = 0;
		for layer in layers {
			let segments: Vec<(usize, usize)> = layer
				.iter()
				.flat_map(|&u| self.down[u].iter().map(|&v| (pos[u], pos[v])).collect::<Vec<_>>())
				.collect();
			for (i, a) in segments.iter().enumerate() {
				for b in &segments[i + 1..] {
					if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
						total += 1;
					}
				}
			}
		}
		total
	}

	/// Moves dummies out of the run of real nodes, to whichever side they
	/// were closer to.
	fn gather_members(&self, layer: &mut Vec<usize>) {
		let members: Vec<(usize, usize)> = layer
			.iter()
			.enumerate()
			.filter(|&(_, &v)| !self.dummy[v])
			.map(|(p, &v)| (p, v))
			.collect();
		if members.is_empty() {
			return;
		}
		let center = members.iter().map(|&(p, _)| p as f64).sum::<f64>() / members.len() as f64;
		let (mut left, mut right) = (Vec::new(), Vec::new());
		for (p, &v) in layer.iter().enumerate() {
			if self.dummy[v] {
				if (p as f64) < center {
					left.push(v);
				} else {
					right.push(v);
				}
			}
		}
		*layer = left
			.into_iter()
			.chain(members.into_iter().map(|(_, v)| v))
			.chain(right)
			.collect();
	}

	fn order(&self, opts: &Options) -> (Vec<Vec<usize>>, usize) {
		let mut layers = self.layers.clone();
		if opts.clusters.is_some() {
			for layer in &mut layers {
				self.gather_members(layer);
			}
		}
		let mut best = layers.clone();
		let mut best_crossings = self.crossings(&best);

		for sweep in 0..opts.max_sweeps {
			if best_crossings == 0 {
				break;
			}
			let downward = sweep % 2 == 0;
			let sequence: Vec<usize> = if downward {
				(1..layers.len()).collect()
			} else {
				(0..layers.len().saturating_sub(1)).rev().collect()
			};
			for l in sequence {
				let pos = self.positions(&layers);
				let mut keyed: Vec<(f64, usize, usize)> = layers[l]
					.iter()
					.enumerate()
					.map(|(p, &v)| {
						let neighbours = if downward { &self.up[v] } else { &self.down[v] };
						let bary = if neighbours.is_empty() {
							p as f64
						} else {
							neighbours.iter().map(|&u| pos[u] as f64).sum::<f64>() / neighbours.len() as f64
						};
						(bary, p, v)
					})
					.collect();
				keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
				layers[l] = keyed.into_iter().map(|(_, _, v)| v).collect();
				if opts.clusters.is_some() {
					self.gather_members(&mut layers[l]);
				}
			}
			let c = self.crossings(&layers);
			if c < best_crossings {
				best_crossings = c;
				best = layers.clone();
			}
		}
		(best, best_crossings)
	}

	fn edge_weight(&self, u: usize, v: usize) -> f64 {
		match (self.dummy[u], self.dummy[v]) {
			(false, false) => 1.0,
			(true, true) => 8.0,
			_ => 2.0,
		}
	}

	fn separations(&self, layer: &[usize], gap: f64, margin: f64) -> Vec<f64> {
		layer
			.windows(2)
			.map(|pair| {
				let (a, b) = (pair[0], pair[1]);
				let border = if self.dummy[a] != self.dummy[b] { margin } else { 0.0 };
				(self.width[a] + self.width[b]) / 2.0 + gap + border
			})
			.collect()
	}

	fn coordinates(&self, layers: &[Vec<usize>], gap: f64, margin: f64, passes: usize) -> Vec<f64> {
		let mut x = vec![0.0; self.vertex_count()];
		for layer in layers {
			let seps = self.separations(layer, gap, margin);
			let span: f64 = seps.iter().sum();
			let mut cursor = -span / 2.0;
			for (i, &v) in layer.iter().enumerate() {
				x[v] = cursor;
				cursor += seps.get(i).copied().unwrap_or(0.0);
			}
		}

		for pass in 0..passes {
			let sequence: Vec<usize> = if pass % 2 == 0 {
				(0..layers.len()).collect()
			} else {
				(0..layers.len()).rev().collect()
			};
			for l in sequence {
				let layer = &layers[l];
				if layer.is_empty() {
					continue;
				}
				let (desired, weights): (Vec<f64>, Vec<f64>) = layer
					.iter()
					.map(|&v| {
						let (sum, total) = self.up[v]
							.iter()
							.chain(&self.down[v])
							.fold((0.0, 0.0), |(s, t), &u| {
								let w = self.edge_weight(u, v);
								(s + w * x[u], t + w)
							});
						if total > 0.0 {
							(sum / total, total)
						} else {
							(x[v], ANCHOR_WEIGHT)
						}
					})
					.unzip();
				let placed = project_ordered(&desired, &weights, &self.separations(layer, gap, margin));
				for (&v, xv) in layer.iter().zip(placed) {
					x[v] = xv;
				}
			}
		}
		x
	}
}

pub(super) fn run(graph: &IndexedGraph<'_>, node_size: f64, opts: &Options) -> LayoutResult {
	let Some((first_rank, last_rank)) = graph.rank_span() else {
		return LayoutResult::default();
	};
	let layer_count = last_rank - first_rank + 1;
	let sketch = Sketch::build(graph, first_rank, layer_count, node_size);
	let (layers, crossings) = sketch.order(opts);

	let margin = opts.clusters.map_or(0.0, |c| c.margin);
	let header = opts.clusters.map_or(0.0, |c| c.margin + c.label_height);
	let gap = node_size * NODE_GAP;
	let mut x = sketch.coordinates(&layers, gap, margin, opts.refinement_passes);

	let left = (0..sketch.vertex_count())
		.map(|v| x[v] - sketch.width[v] / 2.0)
		.fold(f64::INFINITY, f64::min);
	for xv in &mut x {
		*xv -= left - margin;
	}
	let width = (0..sketch.vertex_count())
		.map(|v| x[v] + sketch.width[v] / 2.0)
		.fold(0.0, f64::max)
		+ margin;

	let pitch = node_size * (1.0 + RANK_GAP) + header + margin;
	let layer_y = |l: usize| header + node_size / 2.0 + l as f64 * pitch;
	let height = layer_y(layer_count - 1) + node_size / 2.0 + margin;

	let vertex = |v: usize| Point::new(x[v], layer_y(sketch.layer[v]));
	let centers: Vec<(f64, f64)> = (0..graph.nodes.len())
		.map(|v| {
			let p = vertex(v);
			(p.x, p.y)
		})
		.collect();
	let links = graph
		.links
		.iter()
		.zip(&sketch.routes)
		.map(|(l, route)| Link {
			points: route.iter().map(|&v| vertex(v)).collect(),
			..l.clone()
		})
		.collect();

	let clusters = match opts.clusters {
		Some(style) => layers
			.iter()
			.enumerate()
			.filter_map(|(l, layer)| {
				let members: Vec<usize> = layer.iter().copied().filter(|&v| !sketch.dummy[v]).collect();
				let group = graph.nodes[*members.first()?].group;
				let lo = members.iter().map(|&v| x[v] - sketch.width[v] / 2.0).fold(f64::INFINITY, f64::min);
				let hi = members.iter().map(|&v| x[v] + sketch.width[v] / 2.0).fold(f64::NEG_INFINITY, f64::max);
				Some(ClusterBox {
					group,
					x: lo - style.margin,
					y: layer_y(l) - node_size / 2.0 - style.margin - style.label_height,
					width: hi - lo + 2.0 * style.margin,
					height: node_size + 2.0 * style.margin + style.label_height,
				})
			})
			.collect(),
		None => Vec::new(),
	};

	debug!(
		"layered layout: {} nodes, {} dummies, {} layers, {} crossings",
		graph.nodes.len(),
		sketch.vertex_count() - graph.nodes.len(),
		layer_count,
		crossings
	);

	LayoutResult {
		nodes: graph.placed_nodes(&centers),
		links,
		clusters,
		width,
		height,
	}
}

#[cfg(test)]
mod tests {
	use super::super::checks;
	use super::*;
	use crate::components::bayes_net::types::Group;
	use crate::components::bayes_net::types::fixtures::{dist, four_node_network, link, node};

	fn n(id: &str, group: Group) -> Node {
		node(id, id, group, dist(0.5, 0.3, 0.2))
	}

	fn find<'a>(r: &'a LayoutResult, id: &str) -> &'a Node {
		r.nodes.iter().find(|n| n.id == id).unwrap()
	}

	#[test]
	fn deterministic() {
		let model = four_node_network();
		let a = Layered::default().layout(&model.nodes, &model.links, 138.0).unwrap();
		let b = Layered::default().layout(&model.nodes, &model.links, 138.0).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn empty_stage_keeps_neighbours_in_place() {
		let nodes = vec![n("k", Group::Kneading), n("s", Group::Shaping), n("p", Group::Priming)];
		let links = vec![link("l1", "k", "s", 0.5), link("l2", "s", "p", 0.5)];
		let with_gap = Layered::default().layout(&nodes, &links, 100.0).unwrap();
		let mut filled = nodes.clone();
		filled.push(n("pt", Group::Pointing));
		let without_gap = Layered::default().layout(&filled, &links, 100.0).unwrap();
		for id in ["k", "s", "p"] {
			assert_eq!(find(&with_gap, id).y, find(&without_gap, id).y, "{id}");
		}
		assert!(find(&with_gap, "k").y < find(&with_gap, "s").y);
	}

	#[test]
	fn stages_are_ranks() {
		let nodes = vec![
			n("b", Group::Bread),
			n("k1", Group::Kneading),
			n("s", Group::Shaping),
			n("k2", Group::Kneading),
		];
		let links = vec![link("l1", "k1", "s", 0.5), link("l2", "s", "b", 0.5)];
		let r = Layered::default().layout(&nodes, &links, 100.0).unwrap();
		assert_eq!(find(&r, "k1").y, find(&r, "k2").y);
		assert!(find(&r, "k1").y < find(&r, "s").y);
		assert!(find(&r, "s").y < find(&r, "b").y);
		checks::assert_inside_canvas(&r);
	}

	#[test]
	fn removes_an_avoidable_crossing() {
		let nodes = vec![
			n("a", Group::Kneading),
			n("b", Group::Kneading),
			n("c", Group::Pointing),
			n("d", Group::Pointing),
		];
		let links = vec![link("ad", "a", "d", 0.5), link("bc", "b", "c", 0.5)];
		let r = Layered::default().layout(&nodes, &links, 100.0).unwrap();
		let x = |id| find(&r, id).x;
		assert_eq!(x("a") < x("b"), x("d") < x("c"));
	}

	#[test]
	fn long_links_bend_through_every_stage() {
		let nodes = vec![n("k", Group::Kneading), n("b", Group::Bread)];
		let links = vec![link("kb", "k", "b", 0.5)];
		let r = Layered::default().layout(&nodes, &links, 100.0).unwrap();
		let points = &r.links[0].points;
		assert_eq!(points.len(), 8);
		assert!(points.windows(2).all(|p| p[0].y < p[1].y));
		checks::assert_links_anchored(&r);
	}

	#[test]
	fn upstream_links_still_run_source_to_target() {
		let nodes = vec![n("k", Group::Kneading), n("o", Group::Oven)];
		let links = vec![link("ok", "o", "k", 0.5)];
		let r = Layered::default().layout(&nodes, &links, 100.0).unwrap();
		checks::assert_links_anchored(&r);
		assert_eq!(r.links[0].points.len(), 5);
	}

	#[test]
	fn same_stage_links_are_straight_segments() {
		let nodes = vec![n("a", Group::Crumb), n("b", Group::Crumb)];
		let links = vec![link("ab", "a", "b", 0.5)];
		let r = Layered::default().layout(&nodes, &links, 100.0).unwrap();
		assert_eq!(r.links[0].points.len(), 2);
		checks::assert_links_anchored(&r);
	}

	#[test]
	fn siblings_keep_their_distance() {
		let mut nodes = vec![n("hub", Group::Kneading)];
		let mut links = Vec::new();
		for i in 0..4 {
			let id = format!("c{i}");
			nodes.push(n(&id, Group::Shaping));
			links.push(link(&format!("l{i}"), "hub", &id, 0.5));
		}
		let r = Layered::default().layout(&nodes, &links, 100.0).unwrap();
		let mut xs: Vec<f64> = r.nodes[1..].iter().map(|n| n.x).collect();
		xs.sort_by(f64::total_cmp);
		for pair in xs.windows(2) {
			assert!(pair[1] - pair[0] >= 100.0 * (1.0 + NODE_GAP) - 1e-6);
		}
		// The hub sits over the middle of its children.
		let mid = (xs[0] + xs[3]) / 2.0;
		assert!((find(&r, "hub").x - mid).abs() < 1.0);
	}

	#[test]
	fn chain_is_drawn_straight() {
		let nodes = vec![n("a", Group::Kneading), n("b", Group::Pointing), n("c", Group::Shaping)];
		let links = vec![link("ab", "a", "b", 0.5), link("bc", "b", "c", 0.5)];
		let r = Layered::default().layout(&nodes, &links, 100.0).unwrap();
		assert!((find(&r, "a").x - find(&r, "c").x).abs() < 1e-6);
	}
}
