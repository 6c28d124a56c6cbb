//! Request-scoped parameter handling around a handler

use futures_util::future::BoxFuture;

use crate::params::ParameterSet;
use crate::parser::parse_params;
use crate::request::ParamsRequest;
use crate::settings::ParamsSettings;

/// Parse `request` into `params`, run `handler`, then delete the request's
/// temporary upload files
///
/// `params` usually arrives from the router with [`route`](ParameterSet::route)
/// and [`fixed`](ParameterSet::fixed) already set. Cleanup is tied to a drop guard
/// that is armed before parsing starts. It runs once whether the handler returns,
/// panics, or the returned future is dropped before completion.
///
/// # Examples
///
/// ```
/// use reinhardt_params::{HttpRequest, ParameterSet, ParamsSettings, params_filter};
/// use http::Method;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut request = HttpRequest::builder()
///     .method(Method::GET)
///     .uri("/items?page=4")
///     .build()
///     .unwrap();
///
/// let page = params_filter(
///     ParameterSet::new(),
///     &mut request,
///     &ParamsSettings::default(),
///     |params| Box::pin(async move { params.bind_value::<u32>("page") }),
/// )
/// .await;
///
/// assert_eq!(page, 4);
/// # }
/// ```
pub async fn params_filter<R, F, T>(
	params: ParameterSet,
	request: &mut R,
	settings: &ParamsSettings,
	handler: F,
) -> T
where
	R: ParamsRequest + ?Sized,
	F: for<'p> FnOnce(&'p mut ParameterSet) -> BoxFuture<'p, T>,
{
	let mut params = scopeguard::guard(params, |mut params| {
		let removed = params.cleanup();
		if removed > 0 {
			tracing::debug!(count = removed, "removed upload temp files");
		}
	});

	parse_params(&mut params, request, settings).await;
	handler(&mut params).await
}
