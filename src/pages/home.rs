use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info};

use crate::api::{HttpNetworkService, load_network};
use crate::components::bayes_net::types::GraphModel;
use crate::components::bayes_net::{BayesNetCanvas, ColorScheme, LayoutKind};
use crate::settings::Settings;

/// Swatches for the three states under the current color scheme.
#[component]
fn Legend(#[prop(into)] scheme: Signal<ColorScheme>) -> impl IntoView {
	view! {
		<ul class="legend">
			{move || {
				scheme
					.get()
					.legend()
					.into_iter()
					.map(|(label, color)| {
						view! {
							<li>
								<span
									class="swatch"
									style=format!(
										"display: inline-block; width: 12px; height: 12px; margin-right: 6px; background: {};",
										color.css(),
									)
								/>
								{label.legend()}
							</li>
						}
					})
					.collect_view()
			}}
		</ul>
	}
}

/// Network page: controls, legend and the canvas. The network is fetched once
/// at mount; a failed load leaves an empty drawing.
#[component]
pub fn Home() -> impl IntoView {
	let settings = use_context::<Settings>().unwrap_or_default();
	let (model, set_model) = signal(GraphModel::default());
	let (layout, set_layout) = signal(LayoutKind::default());
	let (scheme, set_scheme) = signal(ColorScheme::default());
	let (comparison, set_comparison) = signal(false);
	let (load_error, set_load_error) = signal(Option::<String>::None);

	let service = HttpNetworkService::new(&settings.api_url);
	let format = settings.network_format.clone();
	spawn_local(async move {
		match load_network(&service, &format).await {
			Ok(network) => {
				info!("loaded {} nodes from the inference service", network.nodes.len());
				set_model.set(network);
			}
			Err(e) => {
				error!("could not load the network: {e}");
				set_load_error.set(Some(e.to_string()));
			}
		}
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="network-page">
				<div class="controls">
					<label>
						"Layout "
						<select on:change=move |ev| {
							if let Ok(kind) = event_target_value(&ev).parse() {
								set_layout.set(kind);
							}
						}>
							{LayoutKind::ALL
								.into_iter()
								.map(|kind| {
									view! {
										<option value=kind.as_str() selected=move || layout.get() == kind>
											{kind.caption()}
										</option>
									}
								})
								.collect_view()}
						</select>
					</label>
					<label>
						" Colors "
						<select on:change=move |ev| {
							if let Ok(s) = event_target_value(&ev).parse() {
								set_scheme.set(s);
							}
						}>
							{ColorScheme::ALL
								.into_iter()
								.map(|s| {
									view! {
										<option value=s.as_str() selected=move || scheme.get() == s>
											{s.caption()}
										</option>
									}
								})
								.collect_view()}
						</select>
					</label>
					<label>
						<input
							type="checkbox"
							prop:checked=move || comparison.get()
							on:change=move |ev| set_comparison.set(event_target_checked(&ev))
						/>
						" Evidence comparison"
					</label>
					<Legend scheme=scheme />
					<p class="subtitle">
						"Click a wedge to set evidence, a node to show its Markov blanket, the background to reset."
					</p>
					{move || load_error.get().map(|e| view! { <p class="load-error">{e}</p> })}
				</div>
				<BayesNetCanvas model=model layout=layout scheme=scheme comparison=comparison />
			</div>
		</ErrorBoundary>
	}
}
