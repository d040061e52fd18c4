//! Graph model: stages, labels, distributions, nodes, links, evidence and
//! Markov selections, plus the adapter from the raw service shapes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Slack accepted on an incoming distribution's total before renormalizing.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-3;
/// Strength given to links the service sends without one.
pub const DEFAULT_LINK_STRENGTH: f64 = 0.5;

/// Errors raised while turning raw service data into the graph model.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
	#[error("unknown process stage `{0}`")]
	UnknownGroup(String),
	#[error("unknown state label `{0}`")]
	UnknownLabel(String),
	#[error("invalid distribution on node `{node}`: {source}")]
	Distribution {
		node: String,
		#[source]
		source: DistributionError,
	},
	#[error("duplicate node id `{0}`")]
	DuplicateNode(String),
	#[error("link `{link}` references unknown node `{endpoint}`")]
	DanglingLink { link: String, endpoint: String },
}

/// Reasons a list of `{label, value}` pairs is not a distribution.
#[derive(Debug, Error, PartialEq)]
pub enum DistributionError {
	#[error("label {0} appears more than once")]
	DuplicateLabel(Label),
	#[error("label {0} is missing")]
	MissingLabel(Label),
	#[error("value {value} for {label} is outside [0, 1]")]
	OutOfRange { label: Label, value: f64 },
	#[error("values sum to {0}")]
	BadSum(f64),
}

/// Bread process stages, in the order the process runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
	Kneading,
	Pointing,
	Shaping,
	Priming,
	Oven,
	Cutting,
	Crumb,
	Bread,
}

impl Group {
	pub const ORDER: [Group; 8] = [
		Group::Kneading,
		Group::Pointing,
		Group::Shaping,
		Group::Priming,
		Group::Oven,
		Group::Cutting,
		Group::Crumb,
		Group::Bread,
	];

	/// Index of the stage in [`Group::ORDER`].
	pub fn rank(self) -> usize {
		self as usize
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Group::Kneading => "Kneading",
			Group::Pointing => "Pointing",
			Group::Shaping => "Shaping",
			Group::Priming => "Priming",
			Group::Oven => "Oven",
			Group::Cutting => "Cutting",
			Group::Crumb => "Crumb",
			Group::Bread => "Bread",
		}
	}
}

impl FromStr for Group {
	type Err = ModelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"PlaceInOven" => Ok(Group::Oven),
			other => Group::ORDER
				.into_iter()
				.find(|g| g.as_str() == other)
				.ok_or_else(|| ModelError::UnknownGroup(other.to_string())),
		}
	}
}

impl fmt::Display for Group {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The three states every variable in the network can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
	Normal,
	Excess,
	Deficient,
}

impl Label {
	pub const ALL: [Label; 3] = [Label::Normal, Label::Excess, Label::Deficient];

	pub fn as_str(self) -> &'static str {
		match self {
			Label::Normal => "Normal",
			Label::Excess => "Excess",
			Label::Deficient => "Deficient",
		}
	}

	/// Legend caption listing the display aliases of the label.
	pub fn legend(self) -> &'static str {
		match self {
			Label::Excess => "Excess/Elevated",
			Label::Normal => "Normal/Average",
			Label::Deficient => "Insufficient/Weak",
		}
	}
}

impl FromStr for Label {
	type Err = ModelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"normal" | "average" => Ok(Label::Normal),
			"excess" | "elevated" => Ok(Label::Excess),
			"deficient" | "insufficient" | "weak" => Ok(Label::Deficient),
			_ => Err(ModelError::UnknownLabel(s.to_string())),
		}
	}
}

impl fmt::Display for Label {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for Label {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for Label {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbValue {
	pub label: Label,
	pub value: f64,
}

/// Probability mass over [`Label::ALL`], kept in the order it was received.
///
/// Construction validates the domain and renormalizes so the values sum to 1.
#[derive(Clone, Debug, PartialEq)]
pub struct Distribution(Vec<ProbValue>);

impl Distribution {
	pub fn new(mut values: Vec<ProbValue>) -> Result<Self, DistributionError> {
		let mut seen = HashSet::new();
		for pv in &mut values {
			if !seen.insert(pv.label) {
				return Err(DistributionError::DuplicateLabel(pv.label));
			}
			let allowed = -DISTRIBUTION_TOLERANCE..=1.0 + DISTRIBUTION_TOLERANCE;
			if !pv.value.is_finite() || !allowed.contains(&pv.value) {
				return Err(DistributionError::OutOfRange {
					label: pv.label,
					value: pv.value,
				});
			}
			// Rounding noise from the inference service, e.g. 1.0000000000000002.
			pv.value = pv.value.clamp(0.0, 1.0);
		}
		if let Some(missing) = Label::ALL.into_iter().find(|l| !seen.contains(l)) {
			return Err(DistributionError::MissingLabel(missing));
		}

		let total: f64 = values.iter().map(|pv| pv.value).sum();
		if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
			return Err(DistributionError::BadSum(total));
		}
		Ok(Self(
			values
				.into_iter()
				.map(|pv| ProbValue {
					label: pv.label,
					value: pv.value / total,
				})
				.collect(),
		))
	}

	/// All mass on `label`, with labels laid out in `order`.
	pub fn degenerate(label: Label, order: &[Label]) -> Self {
		Self(
			order
				.iter()
				.map(|&l| ProbValue {
					label: l,
					value: if l == label { 1.0 } else { 0.0 },
				})
				.collect(),
		)
	}

	pub fn values(&self) -> &[ProbValue] {
		&self.0
	}

	pub fn labels(&self) -> Vec<Label> {
		self.0.iter().map(|pv| pv.label).collect()
	}

	pub fn get(&self, label: Label) -> f64 {
		self.0
			.iter()
			.find(|pv| pv.label == label)
			.map_or(0.0, |pv| pv.value)
	}

	pub fn total(&self) -> f64 {
		self.0.iter().map(|pv| pv.value).sum()
	}

	/// The label holding all the mass, if any.
	pub fn certain_label(&self) -> Option<Label> {
		self.0.iter().find(|pv| pv.value == 1.0).map(|pv| pv.label)
	}

	/// Same distribution, reordered to follow `order`'s label sequence.
	pub fn aligned_to(&self, order: &[Label]) -> Self {
		Self(
			order
				.iter()
				.map(|&label| ProbValue {
					label,
					value: self.get(label),
				})
				.collect(),
		)
	}

	/// Sum of absolute per-label differences. Ranges over [0, 2].
	pub fn l1_distance(&self, other: &Distribution) -> f64 {
		Label::ALL
			.iter()
			.map(|&l| (self.get(l) - other.get(l)).abs())
			.sum()
	}

	/// Collapses the distribution onto a label whose mass exceeds `threshold`.
	/// Returns whether anything changed.
	pub fn snap_near_certain(&mut self, threshold: f64) -> bool {
		let Some(winner) = self.0.iter().find(|pv| pv.value > threshold).map(|pv| pv.label)
		else {
			return false;
		};
		for pv in &mut self.0 {
			pv.value = if pv.label == winner { 1.0 } else { 0.0 };
		}
		true
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

impl From<(f64, f64)> for Point {
	fn from((x, y): (f64, f64)) -> Self {
		Self { x, y }
	}
}

/// A variable of the network.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	pub title: String,
	pub group: Group,
	/// Center, assigned by layout.
	pub x: f64,
	pub y: f64,
	pub values: Distribution,
	pub is_evidence: bool,
	pub diff_from_baseline: f64,
	pub is_expanded: bool,
}

impl Node {
	pub fn center(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	pub id: String,
	pub source: String,
	pub target: String,
	pub strength: f64,
	/// Route from source to target, assigned by layout.
	pub points: Vec<Point>,
}

/// Observed states asserted by the user, keyed by node id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EvidenceSet(BTreeMap<String, Label>);

impl EvidenceSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Copy of the set with `node_id` pinned to `label`, replacing any prior
	/// assignment for that node.
	pub fn merged(&self, node_id: &str, label: Label) -> Self {
		let mut next = self.clone();
		next.0.insert(node_id.to_string(), label);
		next
	}

	pub fn get(&self, node_id: &str) -> Option<Label> {
		self.0.get(node_id).copied()
	}

	pub fn contains(&self, node_id: &str) -> bool {
		self.0.contains_key(node_id)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}
}

impl<S: Into<String>> FromIterator<(S, Label)> for EvidenceSet {
	fn from_iter<I: IntoIterator<Item = (S, Label)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkovBlanket {
	pub target_id: String,
	pub blanket_ids: Vec<String>,
}

/// How a node relates to the current Markov selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkovRole {
	Target,
	Blanket,
	Outside,
}

/// The highlighted Markov blanket, or nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkovSelection(Option<MarkovBlanket>);

impl MarkovSelection {
	pub fn new(target_id: impl Into<String>, blanket_ids: Vec<String>) -> Self {
		Self(Some(MarkovBlanket {
			target_id: target_id.into(),
			blanket_ids,
		}))
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_none()
	}

	pub fn blanket(&self) -> Option<&MarkovBlanket> {
		self.0.as_ref()
	}

	pub fn role_of(&self, node_id: &str) -> MarkovRole {
		match &self.0 {
			Some(m) if m.target_id == node_id => MarkovRole::Target,
			Some(m) if m.blanket_ids.iter().any(|b| b == node_id) => MarkovRole::Blanket,
			_ => MarkovRole::Outside,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
	pub id: String,
	pub title: String,
	pub group: String,
	pub values: Vec<ProbValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawLink {
	pub id: String,
	pub source: String,
	pub target: String,
	#[serde(default)]
	pub strength: Option<f64>,
}

/// Body of `GET /network`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkResponse {
	pub nodes: Vec<RawNode>,
	pub links: Vec<RawLink>,
}

/// A validated network: unique node ids, resolvable links, well-formed
/// distributions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
}

impl GraphModel {
	pub fn from_raw(raw: NetworkResponse) -> Result<Self, ModelError> {
		let mut ids = HashSet::new();
		let mut nodes = Vec::with_capacity(raw.nodes.len());
		for rn in raw.nodes {
			if !ids.insert(rn.id.clone()) {
				return Err(ModelError::DuplicateNode(rn.id));
			}
			let group = rn.group.parse()?;
			let values = Distribution::new(rn.values).map_err(|source| ModelError::Distribution {
				node: rn.id.clone(),
				source,
			})?;
			nodes.push(Node {
				title: shorten_title(&rn.title).to_string(),
				id: rn.id,
				group,
				x: 0.0,
				y: 0.0,
				values,
				is_evidence: false,
				diff_from_baseline: 0.0,
				is_expanded: false,
			});
		}

		let links = raw
			.links
			.into_iter()
			.map(|rl| {
				if let Some(endpoint) = [&rl.source, &rl.target].into_iter().find(|e| !ids.contains(*e)) {
					return Err(ModelError::DanglingLink {
						endpoint: endpoint.clone(),
						link: rl.id,
					});
				}
				Ok(Link {
					strength: rl.strength.unwrap_or(DEFAULT_LINK_STRENGTH).clamp(0.0, 1.0),
					id: rl.id,
					source: rl.source,
					target: rl.target,
					points: Vec::new(),
				})
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self { nodes, links })
	}
}

/// Drops the leading CamelCase word so titles like `DoughStickiness` fit
/// inside a node.
fn shorten_title(title: &str) -> &str {
	let mut chars = title.char_indices();
	chars.next();
	chars
		.find(|(_, c)| c.is_ascii_uppercase())
		.map_or(title, |(i, _)| &title[i..])
}
