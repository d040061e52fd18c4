//! Client for the inference service.
//!
//! Uses web-sys fetch on wasm32 and reqwest natively. Bodies are read as text
//! and decoded with serde_json on both paths.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::components::bayes_net::types::{EvidenceSet, GraphModel, ModelError, NetworkResponse, ProbValue};

/// Node id → distribution, as answered by the inference endpoint.
pub type Posterior = HashMap<String, Vec<ProbValue>>;

#[derive(Debug, Error)]
pub enum ServiceError {
	#[error("request to {url} failed: {message}")]
	Transport { url: String, message: String },
	#[error("{url} answered HTTP {status}")]
	Status { url: String, status: u16 },
	#[error("unreadable response from {url}: {source}")]
	Decode {
		url: String,
		#[source]
		source: serde_json::Error,
	},
}

/// Failure to obtain a usable network at mount.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error(transparent)]
	Service(#[from] ServiceError),
	#[error("malformed network: {0}")]
	Model(#[from] ModelError),
}

/// The three calls the canvas makes against the inference backend.
#[allow(async_fn_in_trait)]
pub trait NetworkService {
	/// `GET /network?format=<format>`
	async fn fetch_network(&self, format: &str) -> Result<NetworkResponse, ServiceError>;

	/// `GET /network/markov?id=<node_id>`; an empty or falsy answer is `[]`.
	async fn markov_blanket(&self, node_id: &str) -> Result<Vec<String>, ServiceError>;

	/// `PATCH /network/inference` with the full evidence set.
	async fn propagate(&self, evidence: &EvidenceSet) -> Result<Posterior, ServiceError>;
}

/// Fetches the network and validates it into a [`GraphModel`].
pub async fn load_network<S: NetworkService>(service: &S, format: &str) -> Result<GraphModel, LoadError> {
	let raw = service.fetch_network(format).await?;
	Ok(GraphModel::from_raw(raw)?)
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
	evidence: &'a EvidenceSet,
}

#[derive(Clone, Copy, Debug)]
enum Method {
	Get,
	Patch,
}

impl Method {
	fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Patch => "PATCH",
		}
	}
}

#[derive(Clone, Debug)]
pub struct HttpNetworkService {
	base_url: String,
}

impl HttpNetworkService {
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	/// `path?key=value`, with `value` percent-encoded.
	#[cfg(target_arch = "wasm32")]
	fn query_url(&self, path: &str, key: &str, value: &str) -> Result<String, ServiceError> {
		let encoded: String = js_sys::encode_uri_component(value).into();
		Ok(format!("{}?{key}={encoded}", self.url(path)))
	}

	#[cfg(not(target_arch = "wasm32"))]
	fn query_url(&self, path: &str, key: &str, value: &str) -> Result<String, ServiceError> {
		let url = self.url(path);
		reqwest::Url::parse_with_params(&url, &[(key, value)])
			.map(String::from)
			.map_err(|e| ServiceError::Transport {
				url,
				message: e.to_string(),
			})
	}

	async fn json<T: DeserializeOwned>(&self, method: Method, url: String, body: Option<String>) -> Result<T, ServiceError> {
		let text = self.send(method, &url, body).await?;
		serde_json::from_str(&text).map_err(|source| ServiceError::Decode { url, source })
	}

	#[cfg(target_arch = "wasm32")]
	async fn send(&self, method: Method, url: &str, body: Option<String>) -> Result<String, ServiceError> {
		use wasm_bindgen::{JsCast, JsValue};
		use wasm_bindgen_futures::JsFuture;
		use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

		debug!("{} {url}", method.as_str());
		let transport = |e: JsValue| ServiceError::Transport {
			url: url.to_string(),
			message: format!("{e:?}"),
		};

		let opts = RequestInit::new();
		opts.set_method(method.as_str());
		opts.set_mode(RequestMode::Cors);
		if let Some(body) = &body {
			let headers = Headers::new().map_err(transport)?;
			headers.set("Content-Type", "application/json").map_err(transport)?;
			opts.set_headers(&headers);
			opts.set_body(&JsValue::from_str(body));
		}

		let request = Request::new_with_str_and_init(url, &opts).map_err(transport)?;
		let window = web_sys::window().ok_or_else(|| ServiceError::Transport {
			url: url.to_string(),
			message: "no window".into(),
		})?;
		let value = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(transport)?;
		let response: Response = value.dyn_into().map_err(transport)?;
		if !response.ok() {
			return Err(ServiceError::Status {
				url: url.to_string(),
				status: response.status(),
			});
		}

		let text = JsFuture::from(response.text().map_err(transport)?)
			.await
			.map_err(transport)?;
		Ok(text.as_string().unwrap_or_default())
	}

	#[cfg(not(target_arch = "wasm32"))]
	async fn send(&self, method: Method, url: &str, body: Option<String>) -> Result<String, ServiceError> {
		debug!("{} {url}", method.as_str());
		let transport = |e: reqwest::Error| ServiceError::Transport {
			url: url.to_string(),
			message: e.to_string(),
		};

		let client = reqwest::Client::new();
		let mut request = match method {
			Method::Get => client.get(url),
			Method::Patch => client.patch(url),
		};
		if let Some(body) = body {
			request = request.header("Content-Type", "application/json").body(body);
		}

		let response = request.send().await.map_err(transport)?;
		if !response.status().is_success() {
			return Err(ServiceError::Status {
				url: url.to_string(),
				status: response.status().as_u16(),
			});
		}
		response.text().await.map_err(transport)
	}
}

impl NetworkService for HttpNetworkService {
	async fn fetch_network(&self, format: &str) -> Result<NetworkResponse, ServiceError> {
		let url = self.query_url("/network", "format", format)?;
		self.json(Method::Get, url, None).await
	}

	async fn markov_blanket(&self, node_id: &str) -> Result<Vec<String>, ServiceError> {
		let url = self.query_url("/network/markov", "id", node_id)?;
		let text = self.send(Method::Get, &url, None).await?;
		parse_blanket(&text).map_err(|source| ServiceError::Decode { url, source })
	}

	async fn propagate(&self, evidence: &EvidenceSet) -> Result<Posterior, ServiceError> {
		let path = "/network/inference";
		let body = serde_json::to_string(&InferenceRequest { evidence }).map_err(|source| ServiceError::Decode {
			url: self.url(path),
			source,
		})?;
		self.json(Method::Patch, self.url(path), Some(body)).await
	}
}

/// Reads a Markov answer. Anything but an array counts as empty; non-string
/// entries are skipped.
fn parse_blanket(text: &str) -> Result<Vec<String>, serde_json::Error> {
	if text.trim().is_empty() {
		return Ok(Vec::new());
	}
	let value: serde_json::Value = serde_json::from_str(text)?;
	Ok(match value {
		serde_json::Value::Array(items) => items
			.into_iter()
			.filter_map(|v| v.as_str().map(str::to_string))
			.collect(),
		_ => Vec::new(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::bayes_net::types::Label;

	#[test]
	fn blanket_answers_decode() {
		assert_eq!(parse_blanket(r#"["a1", "a4"]"#).unwrap(), vec!["a1", "a4"]);
		assert_eq!(parse_blanket(r#"["a1", 3, null]"#).unwrap(), vec!["a1"]);
	}

	#[test]
	fn falsy_blanket_answers_are_empty() {
		for text in ["", "  ", "null", "false", "\"\"", "0", "{}"] {
			assert!(parse_blanket(text).unwrap().is_empty(), "{text:?}");
		}
		assert!(parse_blanket("[oops").is_err());
	}

	#[test]
	fn inference_request_wraps_the_evidence() {
		let evidence: EvidenceSet = [("a3", Label::Excess), ("a1", Label::Normal)].into_iter().collect();
		let body = serde_json::to_string(&InferenceRequest { evidence: &evidence }).unwrap();
		assert_eq!(body, r#"{"evidence":{"a1":"Normal","a3":"Excess"}}"#);
	}

	#[test]
	fn posterior_accepts_label_aliases() {
		let posterior: Posterior = serde_json::from_str(
			r#"{"a1":[{"label":"average","value":0.2},{"label":"elevated","value":0.7},{"label":"weak","value":0.1}]}"#,
		)
		.unwrap();
		assert_eq!(posterior["a1"][1].label, Label::Excess);
	}

	#[test]
	fn query_values_are_encoded() {
		let service = HttpNetworkService::new("http://localhost:8001");
		assert_eq!(
			service.query_url("/network/markov", "id", "a b&c#d").unwrap(),
			"http://localhost:8001/network/markov?id=a+b%26c%23d"
		);
		assert_eq!(
			service.query_url("/network", "format", "d3_tests").unwrap(),
			"http://localhost:8001/network?format=d3_tests"
		);
	}

	#[test]
	fn base_url_loses_trailing_slash() {
		let service = HttpNetworkService::new("http://localhost:8001/");
		assert_eq!(service.url("/network"), "http://localhost:8001/network");
	}
}
