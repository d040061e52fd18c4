//! Canvas drawing of the bread-process Bayesian network.
//!
//! Layout, scene reconciliation, tweening and the evidence state machine are
//! plain Rust; only `render` and `component` touch the DOM.

mod component;
pub mod layout;
pub mod palette;
mod render;
pub mod scene;
pub mod state;
pub mod tween;
pub mod types;
mod viewport;

pub use component::BayesNetCanvas;
pub use layout::LayoutKind;
pub use palette::ColorScheme;
pub use tween::DURATION_MS;
