//! Population of a [`ParameterSet`] from an inbound request

use bytes::Bytes;
use std::io;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use crate::limit::BoundedReader;
use crate::params::ParameterSet;
use crate::request::{ParamsRequest, media_type};
use crate::settings::ParamsSettings;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";
const APPLICATION_JSON: &str = "application/json";
const TEXT_JSON: &str = "text/json";

/// Parse the request's parameters into `params`
///
/// The query string is always read. The body is decoded according to its content
/// type: urlencoded and multipart bodies fill [`ParameterSet::form`] (and
/// [`ParameterSet::files`]), JSON bodies are stored raw in [`ParameterSet::json`],
/// anything else is left alone. Finally the unified view is recomputed.
///
/// Body decoding failures are logged and leave the affected source empty; they
/// never fail the request.
///
/// # Examples
///
/// ```
/// use reinhardt_params::{HttpRequest, ParameterSet, ParamsSettings, parse_params};
/// use http::Method;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut request = HttpRequest::builder()
///     .method(Method::POST)
///     .uri("/users?page=2")
///     .header("content-type", "application/x-www-form-urlencoded")
///     .body("name=alice")
///     .build()
///     .unwrap();
///
/// let mut params = ParameterSet::new();
/// parse_params(&mut params, &mut request, &ParamsSettings::default()).await;
///
/// assert_eq!(params.get("page"), Some("2"));
/// assert_eq!(params.get("name"), Some("alice"));
/// # }
/// ```
pub async fn parse_params<R>(params: &mut ParameterSet, request: &mut R, settings: &ParamsSettings)
where
	R: ParamsRequest + ?Sized,
{
	params.query = Arc::new(request.query_values());

	let content_type = request.content_type().map(media_type).unwrap_or_default();
	match content_type.as_str() {
		FORM_URLENCODED => match request.form_values(settings).await {
			Ok(form) => params.form = Arc::new(form),
			Err(e) => {
				tracing::warn!(
					method = %request.method(),
					url = %request.uri(),
					error = %e,
					"error parsing request body"
				);
			}
		},
		MULTIPART_FORM_DATA => match request.multipart_form(settings).await {
			Ok(multipart) => {
				params.form = Arc::new(multipart.values);
				params.files = multipart.files;
				for temp_file in multipart.temp_files {
					params.track_temp_file(temp_file);
				}
			}
			Err(e) => {
				tracing::warn!(
					method = %request.method(),
					url = %request.uri(),
					error = %e,
					"error parsing multipart request body"
				);
			}
		},
		APPLICATION_JSON | TEXT_JSON => populate_json(params, request, settings).await,
		_ => {}
	}

	params.resolve();
}

/// Read a JSON body into [`ParameterSet::json`]
///
/// A missing body is logged and leaves `json` empty. The body is read through a
/// [`BoundedReader`] limited to `settings.max_json_body_size`; a read failure
/// clears `json`, except an unexpected end-of-stream, which keeps whatever was
/// read before the stream ended.
pub async fn populate_json<R>(params: &mut ParameterSet, request: &mut R, settings: &ParamsSettings)
where
	R: ParamsRequest + ?Sized,
{
	let Some(body) = request.take_body() else {
		tracing::warn!(
			method = %request.method(),
			url = %request.uri(),
			"json post received with empty body"
		);
		return;
	};

	let mut reader = BoundedReader::new(body, settings.max_json_body_size);
	let mut content = Vec::new();
	if let Err(e) = reader.read_to_end(&mut content).await
		&& e.kind() != io::ErrorKind::UnexpectedEof
	{
		tracing::error!(
			method = %request.method(),
			url = %request.uri(),
			error = %e,
			"failed to read JSON body"
		);
		params.json = Bytes::new();
		return;
	}

	params.json = Bytes::from(content);
}
