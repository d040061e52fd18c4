//! Runtime configuration, shared with the component tree through context.

use serde::Deserialize;

use crate::components::bayes_net::DURATION_MS;

/// Base URL used when `BAYES_NET_API_URL` is unset at build time.
pub const DEFAULT_API_URL: &str = "http://localhost:8001";

/// Room left between neighbouring nodes on top of their drawn size.
pub const NODE_SPACING: f64 = 6.0;

/// Application settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Inference service base URL, without trailing slash.
	pub api_url: String,
	/// Value of the `format` query parameter when loading the network.
	pub network_format: String,
	/// Layout cell size in pixels, spacing included.
	pub node_size: f64,
	/// Length of transitions in milliseconds.
	pub duration_ms: f64,
	/// Baseline divergence above which a node is drawn expanded.
	pub expansion_threshold: f64,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			api_url: option_env!("BAYES_NET_API_URL")
				.unwrap_or(DEFAULT_API_URL)
				.trim_end_matches('/')
				.to_string(),
			network_format: "d3_tests".to_string(),
			node_size: 132.0 + NODE_SPACING,
			duration_ms: DURATION_MS,
			expansion_threshold: 0.2,
		}
	}
}

impl Settings {
	/// Radius of a node body.
	pub fn node_radius(&self) -> f64 {
		(self.node_size - NODE_SPACING) / 3.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_the_inference_service() {
		let s = Settings::default();
		assert_eq!(s.network_format, "d3_tests");
		assert_eq!(s.node_size, 138.0);
		assert_eq!(s.node_radius(), 44.0);
		assert_eq!(s.duration_ms, 750.0);
		assert!(!s.api_url.ends_with('/'));
	}

	#[test]
	fn partial_json_keeps_defaults() {
		let s: Settings = serde_json::from_str(r#"{"api_url":"http://bread:9000","node_size":99}"#).unwrap();
		assert_eq!(s.api_url, "http://bread:9000");
		assert_eq!(s.node_size, 99.0);
		assert_eq!(s.expansion_threshold, 0.2);
	}
}
