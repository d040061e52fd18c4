//! Time-based interpolation for scene attributes.
//!
//! A [`Tween`] is a pure function of the clock: it never ticks, it is sampled
//! at a timestamp. Retargeting mid-flight restarts from whatever value the
//! tween shows at that moment.

/// Length of every enter/update transition.
pub const DURATION_MS: f64 = 750.0;

pub fn ease_cubic_in_out(t: f64) -> f64 {
	let t = t.clamp(0.0, 1.0);
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

/// Values that can be blended linearly.
pub trait Lerp: Clone {
	fn lerp(&self, to: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
	fn lerp(&self, to: &Self, t: f64) -> Self {
		self + (to - self) * t
	}
}

/// Interpolates `from` → `to` at normalized time `t ∈ [0, 1]`.
pub fn interpolate<T: Lerp>(from: &T, to: &T, t: f64) -> T {
	from.lerp(to, t.clamp(0.0, 1.0))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tween<T> {
	from: T,
	to: T,
	start_ms: f64,
	duration_ms: f64,
}

impl<T: Lerp + PartialEq> Tween<T> {
	/// A tween already resting at `value`.
	pub fn settled(value: T) -> Self {
		Self {
			from: value.clone(),
			to: value,
			start_ms: 0.0,
			duration_ms: 0.0,
		}
	}

	pub fn new(from: T, to: T, start_ms: f64, duration_ms: f64) -> Self {
		Self {
			from,
			to,
			start_ms,
			duration_ms,
		}
	}

	/// Normalized, eased progress at `now_ms`.
	pub fn progress(&self, now_ms: f64) -> f64 {
		if self.duration_ms <= 0.0 {
			return 1.0;
		}
		ease_cubic_in_out((now_ms - self.start_ms) / self.duration_ms)
	}

	pub fn value_at(&self, now_ms: f64) -> T {
		interpolate(&self.from, &self.to, self.progress(now_ms))
	}

	pub fn target(&self) -> &T {
		&self.to
	}

	pub fn is_running(&self, now_ms: f64) -> bool {
		self.duration_ms > 0.0 && now_ms < self.start_ms + self.duration_ms && self.from != self.to
	}

	/// Starts a new transition toward `to` from the value shown at `now_ms`.
	pub fn retarget(&mut self, to: T, now_ms: f64, duration_ms: f64) {
		self.from = self.value_at(now_ms);
		self.to = to;
		self.start_ms = now_ms;
		self.duration_ms = duration_ms;
	}
}
