use std::f64::consts::PI;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, warn};

use super::{IndexedGraph, Layout, LayoutError, LayoutResult};
use crate::components::bayes_net::types::{Link, Node};

/// Spring-and-charge simulation run for a fixed number of steps from a
/// circular seeding. Stages play no part; meant for diagrams without a
/// process order.
#[derive(Clone, Debug)]
pub struct ForceDirected {
	pub steps: usize,
	pub dt: f32,
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
}

impl Default for ForceDirected {
	fn default() -> Self {
		Self {
			steps: 400,
			dt: 0.016,
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		}
	}
}

impl Layout for ForceDirected {
	fn layout(&self, nodes: &[Node], links: &[Link], node_size: f64) -> Result<LayoutResult, LayoutError> {
		let graph = IndexedGraph::new(nodes, links, node_size)?;
		if nodes.is_empty() {
			return Ok(LayoutResult::default());
		}

		let mut sim: ForceGraph<usize, ()> = ForceGraph::new(SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		});
		let seed_radius = (node_size * nodes.len() as f64 / (2.0 * PI)).max(node_size);
		let seeds: Vec<(f64, f64)> = (0..nodes.len())
			.map(|i| {
				let angle = i as f64 * 2.0 * PI / nodes.len() as f64;
				(seed_radius * angle.cos(), seed_radius * angle.sin())
			})
			.collect();
		let handles: Vec<_> = seeds
			.iter()
			.enumerate()
			.map(|(i, &(x, y))| {
				sim.add_node(NodeData {
					x: x as f32,
					y: y as f32,
					mass: 10.0,
					is_anchor: false,
					user_data: i,
				})
			})
			.collect();
		for &(s, t) in &graph.edges {
			if s != t {
				sim.add_edge(handles[s], handles[t], EdgeData::default());
			}
		}
		for _ in 0..self.steps {
			sim.update(self.dt);
		}

		let mut settled = seeds.clone();
		sim.visit_nodes(|node| {
			settled[node.data.user_data] = (node.x() as f64, node.y() as f64);
		});
		let mut closest = closest_pair(&settled);
		if settled.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) || closest < 1e-6 {
			warn!("force simulation diverged, keeping the seed circle");
			settled = seeds;
			closest = closest_pair(&settled);
		}
		let scale = if closest < node_size { node_size / closest } else { 1.0 };

		let min_x = settled.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
		let min_y = settled.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
		let centers: Vec<(f64, f64)> = settled
			.iter()
			.map(|&(x, y)| {
				(
					(x - min_x) * scale + node_size / 2.0,
					(y - min_y) * scale + node_size / 2.0,
				)
			})
			.collect();
		let width = centers.iter().map(|p| p.0).fold(0.0, f64::max) + node_size / 2.0;
		let height = centers.iter().map(|p| p.1).fold(0.0, f64::max) + node_size / 2.0;
		debug!("force layout: {} steps, spread x{scale:.2}", self.steps);

		Ok(LayoutResult {
			nodes: graph.placed_nodes(&centers),
			links: graph.straight_links(&centers),
			clusters: Vec::new(),
			width,
			height,
		})
	}
}

/// Smallest distance between two points, infinite for fewer than two.
fn closest_pair(points: &[(f64, f64)]) -> f64 {
	let mut best = f64::INFINITY;
	for (i, a) in points.iter().enumerate() {
		for b in &points[i + 1..] {
			best = best.min((a.0 - b.0).hypot(a.1 - b.1));
		}
	}
	best
}

#[cfg(test)]
mod tests {
	use super::super::checks;
	use super::*;
	use crate::components::bayes_net::types::fixtures::four_node_network;

	#[test]
	fn same_input_same_drawing() {
		let model = four_node_network();
		let a = ForceDirected::default().layout(&model.nodes, &model.links, 138.0).unwrap();
		let b = ForceDirected::default().layout(&model.nodes, &model.links, 138.0).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn single_node_sits_in_the_corner_cell() {
		let mut model = four_node_network();
		model.nodes.truncate(1);
		model.links.clear();
		let r = ForceDirected::default().layout(&model.nodes, &model.links, 100.0).unwrap();
		assert_eq!((r.nodes[0].x, r.nodes[0].y), (50.0, 50.0));
		assert_eq!((r.width, r.height), (100.0, 100.0));
	}

	#[test]
	fn nodes_never_overlap() {
		let model = four_node_network();
		let r = ForceDirected::default().layout(&model.nodes, &model.links, 138.0).unwrap();
		checks::assert_separated(&r, 138.0 - 1e-6);
		checks::assert_inside_canvas(&r);
	}

	#[test]
	fn closest_pair_of_a_triangle() {
		assert_eq!(closest_pair(&[(0.0, 0.0), (3.0, 4.0), (10.0, 0.0)]), 5.0);
		assert_eq!(closest_pair(&[(1.0, 1.0)]), f64::INFINITY);
	}
}
