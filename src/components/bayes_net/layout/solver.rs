//! One-dimensional separation-constraint solver.
//!
//! Given an ordered row of items with desired positions and weights, finds the
//! positions minimizing `Σ wᵢ (xᵢ − dᵢ)²` subject to
//! `xᵢ − xᵢ₋₁ ≥ sᵢ` for every adjacent pair. Substituting
//! `yᵢ = xᵢ − Σ₍ₖ≤ᵢ₎ sₖ` turns it into weighted isotonic regression, solved
//! exactly by pool-adjacent-violators.
//!
//! Compound relationships are expressed through the separations: a parent box
//! around a run of children widens the separation on the run's borders by the
//! box margin, so outsiders can never be placed inside it.

/// Pooled run of consecutive items sharing one offset position.
struct Block {
	weight: f64,
	weighted_sum: f64,
	len: usize,
}

impl Block {
	fn mean(&self) -> f64 {
		self.weighted_sum / self.weight
	}
}

/// Optimal positions for a row. `separations[i]` is the minimum distance
/// between item `i` and item `i + 1`.
pub fn project_ordered(desired: &[f64], weights: &[f64], separations: &[f64]) -> Vec<f64> {
	debug_assert_eq!(desired.len(), weights.len());
	debug_assert_eq!(separations.len(), desired.len().saturating_sub(1));

	let mut offsets = Vec::with_capacity(desired.len());
	let mut acc = 0.0;
	for i in 0..desired.len() {
		if i > 0 {
			acc += separations[i - 1];
		}
		offsets.push(acc);
	}

	let mut blocks: Vec<Block> = Vec::with_capacity(desired.len());
	for (i, (&d, &w)) in desired.iter().zip(weights).enumerate() {
		let w = w.max(1e-9);
		blocks.push(Block {
			weight: w,
			weighted_sum: w * (d - offsets[i]),
			len: 1,
		});
		while blocks.len() > 1 && blocks[blocks.len() - 2].mean() > blocks[blocks.len() - 1].mean() {
			let Some(top) = blocks.pop() else { break };
			if let Some(below) = blocks.last_mut() {
				below.weight += top.weight;
				below.weighted_sum += top.weighted_sum;
				below.len += top.len;
			}
		}
	}

	let mut out = Vec::with_capacity(desired.len());
	for block in &blocks {
		let y = block.mean();
		for _ in 0..block.len {
			out.push(y + offsets[out.len()]);
		}
	}
	out
}
