//! View state of the canvas and the evidence/Markov state machine driving it.
//!
//! [`ViewState`] is the single owner of the live node set, evidence set and
//! Markov selection. Every service round trip is split in two: a `begin_*`
//! call that stamps the request with a sequence number, and an `apply_*` call
//! that only lands if that request is still the latest one issued. Answers to
//! superseded requests, and answers arriving after a reset, are discarded.

use std::cell::RefCell;
use std::collections::HashSet;

use log::{info, warn};
use thiserror::Error;

use super::layout::LayoutResult;
use super::palette::ColorScheme;
use super::scene::Frame;
use super::types::{Distribution, DistributionError, EvidenceSet, Label, MarkovSelection, Node};
use crate::api::{NetworkService, Posterior, ServiceError};

/// Mass above which a label is treated as certain.
pub const SNAP_THRESHOLD: f64 = 0.999;

#[derive(Debug, Error)]
pub enum PropagationError {
	#[error(transparent)]
	Service(#[from] ServiceError),
	#[error("inference answer has no distribution for node `{0}`")]
	MissingNode(String),
	#[error("inference answer for node `{node}` is not a distribution: {source}")]
	InvalidDistribution {
		node: String,
		#[source]
		source: DistributionError,
	},
	#[error("answer to request {seq} superseded by request {latest}")]
	Stale { seq: u64, latest: u64 },
}

impl PropagationError {
	/// Whether the failure should be shown to the user.
	pub fn is_user_visible(&self) -> bool {
		!matches!(self, PropagationError::Stale { .. })
	}
}

/// An evidence set on its way to the inference service.
#[derive(Clone, Debug, PartialEq)]
pub struct EvidenceRequest {
	pub seq: u64,
	pub evidence: EvidenceSet,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
	Baseline,
	EvidencePending(EvidenceRequest),
	EvidenceApplied,
}

/// A Markov query in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkovRequest {
	pub seq: u64,
	pub node_id: String,
}

#[derive(Clone, Debug)]
pub struct ViewState {
	baseline: Vec<Node>,
	nodes: Vec<Node>,
	evidence: EvidenceSet,
	markov: MarkovSelection,
	comparison: bool,
	expansion_threshold: f64,
	phase: Phase,
	issued: u64,
	markov_issued: u64,
	revision: u64,
}

impl ViewState {
	/// Starts from the unconditioned network. `baseline` must already be
	/// positioned.
	pub fn new(baseline: Vec<Node>, comparison: bool, expansion_threshold: f64) -> Self {
		Self {
			nodes: baseline.clone(),
			baseline,
			evidence: EvidenceSet::new(),
			markov: MarkovSelection::default(),
			comparison,
			expansion_threshold,
			phase: Phase::Baseline,
			issued: 0,
			markov_issued: 0,
			revision: 0,
		}
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn baseline(&self) -> &[Node] {
		&self.baseline
	}

	pub fn evidence(&self) -> &EvidenceSet {
		&self.evidence
	}

	pub fn markov(&self) -> &MarkovSelection {
		&self.markov
	}

	pub fn comparison(&self) -> bool {
		self.comparison
	}

	pub fn phase(&self) -> &Phase {
		&self.phase
	}

	/// Bumped on every visible change.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// What the scene should draw for this state.
	pub fn frame<'a>(&'a self, layout: &'a LayoutResult, scheme: ColorScheme) -> Frame<'a> {
		Frame {
			nodes: &self.nodes,
			links: &layout.links,
			baseline: &self.baseline,
			clusters: &layout.clusters,
			markov: &self.markov,
			scheme,
			comparison: self.comparison,
		}
	}

	/// Moves nodes to the positions of a new layout, keeping their values.
	pub fn relayout(&mut self, positioned: &[Node]) {
		for n in self.baseline.iter_mut().chain(self.nodes.iter_mut()) {
			if let Some(p) = positioned.iter().find(|p| p.id == n.id) {
				n.x = p.x;
				n.y = p.y;
			}
		}
		self.revision += 1;
	}

	/// Merges `node_id = label` into the newest evidence set (the pending one
	/// if a request is in flight) and issues a request for it.
	pub fn begin_propagation(&mut self, node_id: &str, label: Label) -> EvidenceRequest {
		let base = match &self.phase {
			Phase::EvidencePending(pending) => &pending.evidence,
			_ => &self.evidence,
		};
		self.issued += 1;
		let request = EvidenceRequest {
			seq: self.issued,
			evidence: base.merged(node_id, label),
		};
		info!("propagating {} evidence entries (request {})", request.evidence.len(), request.seq);
		self.phase = Phase::EvidencePending(request.clone());
		request
	}

	fn is_latest(&self, request: &EvidenceRequest) -> bool {
		matches!(&self.phase, Phase::EvidencePending(p) if p.seq == request.seq)
	}

	/// `Stale` when a newer request or a reset has replaced `request`.
	fn superseded(&self, request: &EvidenceRequest) -> Option<PropagationError> {
		if self.is_latest(request) {
			return None;
		}
		warn!("discarding answer to request {} (latest is {})", request.seq, self.issued);
		Some(PropagationError::Stale {
			seq: request.seq,
			latest: self.issued,
		})
	}

	fn settled_phase(&self) -> Phase {
		if self.evidence.is_empty() {
			Phase::Baseline
		} else {
			Phase::EvidenceApplied
		}
	}

	/// Folds an inference answer into the state, all or nothing.
	pub fn apply_propagation(&mut self, request: &EvidenceRequest, posterior: Posterior) -> Result<(), PropagationError> {
		if let Some(stale) = self.superseded(request) {
			return Err(stale);
		}

		let nodes = match self.conditioned_nodes(&request.evidence, posterior) {
			Ok(nodes) => nodes,
			Err(e) => {
				self.fail_propagation(request);
				return Err(e);
			}
		};

		self.nodes = nodes;
		self.evidence = request.evidence.clone();
		self.phase = Phase::EvidenceApplied;
		self.revision += 1;
		info!(
			"applied request {}: {} nodes expanded",
			request.seq,
			self.nodes.iter().filter(|n| n.is_expanded).count()
		);
		Ok(())
	}

	fn conditioned_nodes(&self, evidence: &EvidenceSet, mut posterior: Posterior) -> Result<Vec<Node>, PropagationError> {
		self.nodes
			.iter()
			.zip(&self.baseline)
			.map(|(current, base)| {
				let raw = posterior
					.remove(&current.id)
					.ok_or_else(|| PropagationError::MissingNode(current.id.clone()))?;
				let order = base.values.labels();
				let values = Distribution::new(raw)
					.map_err(|source| PropagationError::InvalidDistribution {
						node: current.id.clone(),
						source,
					})?
					.aligned_to(&order);
				let diff = values.l1_distance(&base.values);
				let values = match evidence.get(&current.id) {
					Some(label) => Distribution::degenerate(label, &order),
					None => {
						let mut values = values;
						values.snap_near_certain(SNAP_THRESHOLD);
						values
					}
				};
				Ok(Node {
					values,
					is_evidence: evidence.contains(&current.id),
					diff_from_baseline: diff,
					is_expanded: self.comparison && diff > self.expansion_threshold,
					..current.clone()
				})
			})
			.collect()
	}

	/// Abandons `request` without touching anything visible.
	pub fn fail_propagation(&mut self, request: &EvidenceRequest) {
		if self.is_latest(request) {
			self.phase = self.settled_phase();
		}
	}

	/// Back to the unconditioned network. In-flight answers become stale.
	pub fn reset(&mut self) {
		self.nodes = self.baseline.clone();
		self.evidence = EvidenceSet::new();
		self.markov = MarkovSelection::default();
		self.phase = Phase::Baseline;
		self.markov_issued += 1;
		self.revision += 1;
		info!("view reset to baseline");
	}

	/// Turns comparison mode on or off, re-deriving expansion from the
	/// stored divergence.
	pub fn set_comparison(&mut self, on: bool) {
		self.comparison = on;
		let threshold = self.expansion_threshold;
		for n in &mut self.nodes {
			n.is_expanded = on && n.diff_from_baseline > threshold;
		}
		self.revision += 1;
	}

	pub fn begin_markov(&mut self, node_id: &str) -> MarkovRequest {
		self.markov_issued += 1;
		MarkovRequest {
			seq: self.markov_issued,
			node_id: node_id.to_string(),
		}
	}

	/// Replaces the Markov selection. An empty answer, or one for a
	/// superseded query, changes nothing. Returns whether the selection
	/// changed.
	pub fn apply_markov(&mut self, request: &MarkovRequest, blanket_ids: Vec<String>) -> bool {
		if request.seq != self.markov_issued {
			warn!("discarding Markov answer for `{}`", request.node_id);
			return false;
		}
		if blanket_ids.is_empty() {
			return false;
		}
		let known: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
		let (kept, unknown): (Vec<String>, Vec<String>) =
			blanket_ids.into_iter().partition(|id| known.contains(id.as_str()));
		if !unknown.is_empty() {
			warn!("ignoring unknown blanket ids {unknown:?}");
		}
		self.markov = MarkovSelection::new(request.node_id.clone(), kept);
		self.revision += 1;
		true
	}
}

/// Runs one wedge click through the service and into `view`.
pub async fn propagate_evidence<S: NetworkService>(
	service: &S,
	view: &RefCell<ViewState>,
	node_id: &str,
	label: Label,
) -> Result<(), PropagationError> {
	let request = view.borrow_mut().begin_propagation(node_id, label);
	match service.propagate(&request.evidence).await {
		Ok(posterior) => view.borrow_mut().apply_propagation(&request, posterior),
		Err(e) => {
			let mut view = view.borrow_mut();
			if let Some(stale) = view.superseded(&request) {
				return Err(stale);
			}
			view.fail_propagation(&request);
			Err(e.into())
		}
	}
}

/// Runs one node-body click through the service and into `view`.
pub async fn query_markov_blanket<S: NetworkService>(
	service: &S,
	view: &RefCell<ViewState>,
	node_id: &str,
) -> Result<bool, ServiceError> {
	let request = view.borrow_mut().begin_markov(node_id);
	let blanket_ids = service.markov_blanket(node_id).await?;
	Ok(view.borrow_mut().apply_markov(&request, blanket_ids))
}
