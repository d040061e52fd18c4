use super::layered::{ClusterStyle, Options, run};
use super::{IndexedGraph, Layout, LayoutError, LayoutResult};
use crate::components::bayes_net::types::{Link, Node};

/// Layered drawing with a labeled box around each stage.
///
/// Members of a stage stay contiguous inside their box; routing vertices of
/// links passing through a stage are kept out of it by the box margin.
#[derive(Clone, Debug)]
pub struct Clustered {
	pub max_sweeps: usize,
	pub refinement_passes: usize,
	/// Box padding, relative to the node size.
	pub margin: f64,
	/// Room for the stage caption, relative to the node size.
	pub label_height: f64,
}

impl Default for Clustered {
	fn default() -> Self {
		Self {
			max_sweeps: 24,
			refinement_passes: 32,
			margin: 0.15,
			label_height: 0.2,
		}
	}
}

impl Layout for Clustered {
	fn layout(&self, nodes: &[Node], links: &[Link], node_size: f64) -> Result<LayoutResult, LayoutError> {
		let graph = IndexedGraph::new(nodes, links, node_size)?;
		Ok(run(
			&graph,
			node_size,
			&Options {
				max_sweeps: self.max_sweeps,
				refinement_passes: self.refinement_passes,
				clusters: Some(ClusterStyle {
					margin: self.margin * node_size,
					label_height: self.label_height * node_size,
				}),
			},
		))
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::super::checks;
	use super::*;
	use crate::components::bayes_net::types::Group;
	use crate::components::bayes_net::types::fixtures::{dist, link, node};

	fn sample() -> (Vec<Node>, Vec<Link>) {
		let n = |id: &str, g| node(id, id, g, dist(0.5, 0.3, 0.2));
		let nodes = vec![
			n("k1", Group::Kneading),
			n("k2", Group::Kneading),
			n("s1", Group::Shaping),
			n("s2", Group::Shaping),
			n("c1", Group::Cutting),
			n("b1", Group::Bread),
		];
		let links = vec![
			link("l1", "k1", "s1", 0.5),
			link("l2", "k2", "s2", 0.5),
			link("l3", "k1", "c1", 0.5),
			link("l4", "s2", "b1", 0.5),
			link("l5", "k2", "b1", 0.5),
		];
		(nodes, links)
	}

	#[test]
	fn empty_stage_keeps_neighbours_in_place() {
		let (nodes, links) = sample();
		let with_gap = Clustered::default().layout(&nodes, &links, 100.0).unwrap();
		let mut filled = nodes.clone();
		filled.push(node("pt", "pt", Group::Pointing, dist(0.5, 0.3, 0.2)));
		let without_gap = Clustered::default().layout(&filled, &links, 100.0).unwrap();
		for a in &with_gap.nodes {
			let b = without_gap.nodes.iter().find(|b| b.id == a.id).unwrap();
			assert_eq!(a.y, b.y, "{}", a.id);
		}
		for c in &with_gap.clusters {
			let d = without_gap.clusters.iter().find(|d| d.group == c.group).unwrap();
			assert_eq!(c.y, d.y, "{}", c.group.as_str());
		}
		assert!(!with_gap.clusters.iter().any(|c| c.group == Group::Pointing));
		assert!(without_gap.clusters.iter().any(|c| c.group == Group::Pointing));
	}

	#[test]
	fn one_box_per_occupied_stage() {
		let (nodes, links) = sample();
		let r = Clustered::default().layout(&nodes, &links, 100.0).unwrap();
		let groups: BTreeSet<Group> = r.clusters.iter().map(|c| c.group).collect();
		assert_eq!(
			groups,
			BTreeSet::from([Group::Kneading, Group::Shaping, Group::Cutting, Group::Bread])
		);
	}

	#[test]
	fn boxes_hold_their_members_with_margin() {
		let (nodes, links) = sample();
		let r = Clustered::default().layout(&nodes, &links, 100.0).unwrap();
		for n in &r.nodes {
			let b = r.clusters.iter().find(|c| c.group == n.group).unwrap();
			assert!(b.contains(n.x - 64.0, n.y - 50.0), "{}", n.id);
			assert!(b.contains(n.x + 64.0, n.y + 50.0), "{}", n.id);
		}
		checks::assert_inside_canvas(&r);
	}

	#[test]
	fn boxes_do_not_overlap() {
		let (nodes, links) = sample();
		let r = Clustered::default().layout(&nodes, &links, 100.0).unwrap();
		for (i, a) in r.clusters.iter().enumerate() {
			for b in &r.clusters[i + 1..] {
				assert!(a.y + a.height < b.y || b.y + b.height < a.y);
			}
		}
	}

	#[test]
	fn routing_points_stay_out_of_foreign_boxes() {
		let (nodes, links) = sample();
		let r = Clustered::default().layout(&nodes, &links, 100.0).unwrap();
		for l in &r.links {
			for p in &l.points[1..l.points.len() - 1] {
				for b in &r.clusters {
					assert!(!b.contains(p.x, p.y), "{} bends inside {}", l.id, b.group);
				}
			}
		}
		checks::assert_links_anchored(&r);
	}
}
