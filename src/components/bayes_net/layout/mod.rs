//! Node placement strategies sharing one contract:
//! `layout(nodes, links, node_size) -> LayoutResult`.
//!
//! Every strategy puts process stages on the vertical rank axis (Kneading at
//! the top, Bread at the bottom) except the force-directed one, which ignores
//! stages entirely.

mod clustered;
mod force;
mod grid;
mod layered;
mod solver;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::types::{Group, Link, Node};

pub use clustered::Clustered;
pub use force::ForceDirected;
pub use grid::GroupedGrid;
pub use layered::Layered;

/// Vertical distance between two adjacent stage bands, as a fraction of the
/// node size.
pub(crate) const RANK_GAP: f64 = 0.5;
/// Horizontal clearance between neighbouring nodes, as a fraction of the node
/// size.
pub(crate) const NODE_GAP: f64 = 0.1;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
	#[error("duplicate node id `{0}`")]
	DuplicateNode(String),
	#[error("link `{link}` references unknown node `{endpoint}`")]
	DanglingLink { link: String, endpoint: String },
	#[error("node size must be positive and finite, got {0}")]
	InvalidNodeSize(f64),
}

/// A labeled box drawn around the members of one stage.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterBox {
	pub group: Group,
	/// Top-left corner.
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl ClusterBox {
	pub fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
	}
}

/// Positioned copy of the input graph plus the canvas extent it needs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutResult {
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
	pub clusters: Vec<ClusterBox>,
	pub width: f64,
	pub height: f64,
}

pub trait Layout {
	fn layout(&self, nodes: &[Node], links: &[Link], node_size: f64) -> Result<LayoutResult, LayoutError>;
}

/// Strategy picker exposed in the UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutKind {
	#[default]
	Layered,
	Clustered,
	Grid,
	Force,
}

impl LayoutKind {
	pub const ALL: [LayoutKind; 4] = [
		LayoutKind::Layered,
		LayoutKind::Clustered,
		LayoutKind::Grid,
		LayoutKind::Force,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			LayoutKind::Layered => "layered",
			LayoutKind::Clustered => "clustered",
			LayoutKind::Grid => "grid",
			LayoutKind::Force => "force",
		}
	}

	pub fn caption(self) -> &'static str {
		match self {
			LayoutKind::Layered => "Sugiyama layout",
			LayoutKind::Clustered => "Clustered stages",
			LayoutKind::Grid => "Edge-ignorant grouping",
			LayoutKind::Force => "Force-directed",
		}
	}
}

impl Layout for LayoutKind {
	fn layout(&self, nodes: &[Node], links: &[Link], node_size: f64) -> Result<LayoutResult, LayoutError> {
		match self {
			LayoutKind::Layered => Layered::default().layout(nodes, links, node_size),
			LayoutKind::Clustered => Clustered::default().layout(nodes, links, node_size),
			LayoutKind::Grid => GroupedGrid.layout(nodes, links, node_size),
			LayoutKind::Force => ForceDirected::default().layout(nodes, links, node_size),
		}
	}
}

impl FromStr for LayoutKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		LayoutKind::ALL
			.into_iter()
			.find(|k| k.as_str() == s)
			.ok_or_else(|| format!("unknown layout `{s}`"))
	}
}

impl fmt::Display for LayoutKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Input graph with links resolved to node indices.
pub(crate) struct IndexedGraph<'a> {
	pub nodes: &'a [Node],
	pub links: &'a [Link],
	/// `(source, target)` per link, parallel to `links`.
	pub edges: Vec<(usize, usize)>,
}

impl<'a> IndexedGraph<'a> {
	pub fn new(nodes: &'a [Node], links: &'a [Link], node_size: f64) -> Result<Self, LayoutError> {
		if !node_size.is_finite() || node_size <= 0.0 {
			return Err(LayoutError::InvalidNodeSize(node_size));
		}
		let mut index = HashMap::with_capacity(nodes.len());
		for (i, n) in nodes.iter().enumerate() {
			if index.insert(n.id.as_str(), i).is_some() {
				return Err(LayoutError::DuplicateNode(n.id.clone()));
			}
		}
		let resolve = |link: &Link, endpoint: &str| {
			index.get(endpoint).copied().ok_or_else(|| LayoutError::DanglingLink {
				link: link.id.clone(),
				endpoint: endpoint.to_string(),
			})
		};
		let edges = links
			.iter()
			.map(|l| Ok((resolve(l, &l.source)?, resolve(l, &l.target)?)))
			.collect::<Result<Vec<_>, LayoutError>>()?;
		Ok(Self { nodes, links, edges })
	}

	/// First and last occupied stage ranks, or `None` for an empty graph.
	pub fn rank_span(&self) -> Option<(usize, usize)> {
		let ranks = self.nodes.iter().map(|n| n.group.rank());
		Some((ranks.clone().min()?, ranks.max()?))
	}

	/// Copy of the input nodes placed at `centers`.
	pub fn placed_nodes(&self, centers: &[(f64, f64)]) -> Vec<Node> {
		self.nodes
			.iter()
			.zip(centers)
			.map(|(n, &(x, y))| Node { x, y, ..n.clone() })
			.collect()
	}

	/// Copy of the input links routed as straight segments between centers.
	pub fn straight_links(&self, centers: &[(f64, f64)]) -> Vec<Link> {
		self.links
			.iter()
			.zip(&self.edges)
			.map(|(l, &(s, t))| Link {
				points: vec![centers[s].into(), centers[t].into()],
				..l.clone()
			})
			.collect()
	}
}


#[cfg(test)]
mod tests {
	use super::super::types::fixtures::{dist, four_node_network, link, node};
	use super::*;

	#[test]
	fn every_strategy_rejects_dangling_links() {
		let mut model = four_node_network();
		model.links.push(link("b9", "a1", "ghost", 0.5));
		for kind in LayoutKind::ALL {
			assert_eq!(
				kind.layout(&model.nodes, &model.links, 138.0),
				Err(LayoutError::DanglingLink {
					link: "b9".into(),
					endpoint: "ghost".into()
				}),
				"{kind}"
			);
		}
	}

	#[test]
	fn every_strategy_rejects_duplicate_ids() {
		let mut model = four_node_network();
		model
			.nodes
			.push(node("a1", "Again", Group::Oven, dist(0.2, 0.3, 0.5)));
		for kind in LayoutKind::ALL {
			assert!(matches!(
				kind.layout(&model.nodes, &model.links, 138.0),
				Err(LayoutError::DuplicateNode(_))
			));
		}
	}

	#[test]
	fn every_strategy_handles_an_empty_graph() {
		for kind in LayoutKind::ALL {
			let result = kind.layout(&[], &[], 138.0).unwrap();
			assert!(result.nodes.is_empty());
			assert_eq!((result.width, result.height), (0.0, 0.0));
		}
	}

	#[test]
	fn four_node_network_gets_distinct_positions() {
		let model = four_node_network();
		for kind in LayoutKind::ALL {
			let result = kind.layout(&model.nodes, &model.links, 138.0).unwrap();
			assert_eq!(result.nodes.len(), 4);
			checks::assert_separated(&result, 138.0);
			checks::assert_links_anchored(&result);
			checks::assert_inside_canvas(&result);
		}
	}

	#[test]
	fn rejects_degenerate_node_size() {
		let model = four_node_network();
		assert_eq!(
			LayoutKind::Grid.layout(&model.nodes, &model.links, 0.0),
			Err(LayoutError::InvalidNodeSize(0.0))
		);
	}

	#[test]
	fn kind_parses_from_select_value() {
		for kind in LayoutKind::ALL {
			assert_eq!(kind.as_str().parse::<LayoutKind>(), Ok(kind));
		}
	}
}
