use log::debug;

use super::{IndexedGraph, Layout, LayoutError, LayoutResult, RANK_GAP};
use crate::components::bayes_net::types::{Group, Link, Node};

/// Stage rows, members spread evenly across each row. Ignores links.
#[derive(Clone, Copy, Debug, Default)]
pub struct GroupedGrid;

impl Layout for GroupedGrid {
	fn layout(&self, nodes: &[Node], links: &[Link], node_size: f64) -> Result<LayoutResult, LayoutError> {
		let graph = IndexedGraph::new(nodes, links, node_size)?;
		let Some((first_rank, last_rank)) = graph.rank_span() else {
			return Ok(LayoutResult::default());
		};

		let mut rows: Vec<Vec<usize>> = vec![Vec::new(); Group::ORDER.len()];
		for (i, n) in nodes.iter().enumerate() {
			rows[n.group.rank()].push(i);
		}
		let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
		let width = (widest + 1) as f64 * node_size;
		let pitch = node_size * (1.0 + RANK_GAP);

		let mut centers = vec![(0.0, 0.0); nodes.len()];
		for (rank, row) in rows.iter().enumerate() {
			let y = node_size / 2.0 + (rank - first_rank.min(rank)) as f64 * pitch;
			for (j, &i) in row.iter().enumerate() {
				centers[i] = (width * (j + 1) as f64 / (row.len() + 1) as f64, y);
			}
		}
		let height = node_size + (last_rank - first_rank) as f64 * pitch;
		debug!("grid layout: {} nodes over {} stages", nodes.len(), last_rank - first_rank + 1);

		Ok(LayoutResult {
			nodes: graph.placed_nodes(&centers),
			links: graph.straight_links(&centers),
			clusters: Vec::new(),
			width,
			height,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::super::checks;
	use super::*;
	use crate::components::bayes_net::types::fixtures::{dist, four_node_network, node};

	#[test]
	fn repeated_runs_are_identical() {
		let model = four_node_network();
		let a = GroupedGrid.layout(&model.nodes, &model.links, 138.0).unwrap();
		let b = GroupedGrid.layout(&model.nodes, &model.links, 138.0).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn stage_sets_the_row() {
		let model = four_node_network();
		let r = GroupedGrid.layout(&model.nodes, &model.links, 100.0).unwrap();
		let y = |id: &str| r.nodes.iter().find(|n| n.id == id).unwrap().y;
		// Kneading on top, Crumb two ranks before Bread.
		assert_eq!(y("a1"), y("a3"));
		assert!(y("a1") < y("a2"));
		assert!(y("a2") < y("a4"));
		assert_eq!(y("a4") - y("a2"), 150.0);
		checks::assert_separated(&r, 100.0);
	}

	#[test]
	fn empty_stage_keeps_neighbours_in_place() {
		let nodes = vec![
			node("k", "K", Group::Kneading, dist(0.5, 0.3, 0.2)),
			node("s", "S", Group::Shaping, dist(0.5, 0.3, 0.2)),
			node("p", "P", Group::Priming, dist(0.5, 0.3, 0.2)),
		];
		let with_gap = GroupedGrid.layout(&nodes, &[], 100.0).unwrap();
		let mut filled = nodes.clone();
		filled.push(node("pt", "Pt", Group::Pointing, dist(0.5, 0.3, 0.2)));
		let without_gap = GroupedGrid.layout(&filled, &[], 100.0).unwrap();
		for id in ["k", "s", "p"] {
			let a = with_gap.nodes.iter().find(|n| n.id == id).unwrap();
			let b = without_gap.nodes.iter().find(|n| n.id == id).unwrap();
			assert_eq!(a.y, b.y, "{id}");
		}
	}

	#[test]
	fn members_spread_evenly() {
		let nodes: Vec<_> = (0..3)
			.map(|i| node(&format!("n{i}"), "N", Group::Oven, dist(0.5, 0.3, 0.2)))
			.collect();
		let r = GroupedGrid.layout(&nodes, &[], 100.0).unwrap();
		let xs: Vec<f64> = r.nodes.iter().map(|n| n.x).collect();
		assert_eq!(xs, vec![100.0, 200.0, 300.0]);
		assert_eq!(r.width, 400.0);
	}
}
