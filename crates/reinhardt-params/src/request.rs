//! The inbound request as seen by the parameter parser
//!
//! [`ParamsRequest`] is the seam to the HTTP layer: the parser only needs the
//! query string, the content type, a way to decode form and multipart bodies, and
//! the raw body stream. [`HttpRequest`] implements it for a buffered request built
//! from [`http`] types.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, Uri, header::CONTENT_TYPE};
use tokio::io::AsyncRead;

use crate::error::{ParamsError, ParamsResult};
use crate::params::{ValueMap, collect_pairs};
use crate::settings::ParamsSettings;
use crate::upload::{MultipartForm, parse_multipart};

/// Raw request body stream
pub type BodyStream = Box<dyn AsyncRead + Send + Unpin>;

/// Request collaborator used by [`parse_params`](crate::parse_params)
#[async_trait]
pub trait ParamsRequest: Send {
	/// HTTP method, for log context
	fn method(&self) -> &Method;

	/// Request URI, for log context
	fn uri(&self) -> &Uri;

	/// Decoded query string parameters
	fn query_values(&self) -> ValueMap;

	/// Raw `Content-Type` header value
	fn content_type(&self) -> Option<&str>;

	/// Decode an `application/x-www-form-urlencoded` body
	async fn form_values(&mut self, settings: &ParamsSettings) -> ParamsResult<ValueMap>;

	/// Decode a `multipart/form-data` body
	async fn multipart_form(&mut self, settings: &ParamsSettings) -> ParamsResult<MultipartForm>;

	/// Take the raw body stream, `None` if the request has no body
	fn take_body(&mut self) -> Option<BodyStream>;
}

/// Media type of a `Content-Type` value, lowercased and without parameters
///
/// # Examples
///
/// ```
/// use reinhardt_params::request::media_type;
///
/// assert_eq!(media_type("Application/JSON; charset=utf-8"), "application/json");
/// assert_eq!(media_type("multipart/form-data; boundary=x"), "multipart/form-data");
/// ```
pub fn media_type(content_type: &str) -> String {
	content_type
		.split(';')
		.next()
		.unwrap_or("")
		.trim()
		.to_ascii_lowercase()
}

/// Decode a urlencoded string into a [`ValueMap`]
pub fn parse_urlencoded(input: &str) -> ParamsResult<ValueMap> {
	let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input)?;
	Ok(collect_pairs(pairs))
}

/// A buffered HTTP request
///
/// # Examples
///
/// ```
/// use reinhardt_params::HttpRequest;
/// use reinhardt_params::request::ParamsRequest;
/// use http::Method;
///
/// let request = HttpRequest::builder()
///     .method(Method::POST)
///     .uri("/items?tag=a&tag=b")
///     .header("content-type", "application/json")
///     .body(r#"{"name":"x"}"#)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.query_values()["tag"], vec!["a", "b"]);
/// assert_eq!(request.content_type(), Some("application/json"));
/// ```
#[derive(Debug)]
pub struct HttpRequest {
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Option<Bytes>,
}

impl HttpRequest {
	/// Create a request from its parts
	pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Option<Bytes>) -> Self {
		Self {
			method,
			uri,
			headers,
			body,
		}
	}

	/// Start building a request
	pub fn builder() -> HttpRequestBuilder {
		HttpRequestBuilder::default()
	}

	/// Request headers
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	fn take_bytes(&mut self, max: u64) -> ParamsResult<Bytes> {
		let body = self.body.take().ok_or(ParamsError::MissingBody)?;
		if body.len() as u64 > max {
			return Err(crate::limit::SizeLimitExceeded { limit: max }.into());
		}
		Ok(body)
	}
}

impl<B: Into<Bytes>> From<http::Request<B>> for HttpRequest {
	fn from(request: http::Request<B>) -> Self {
		let (parts, body) = request.into_parts();
		let body: Bytes = body.into();
		Self {
			method: parts.method,
			uri: parts.uri,
			headers: parts.headers,
			body: (!body.is_empty()).then_some(body),
		}
	}
}

#[async_trait]
impl ParamsRequest for HttpRequest {
	fn method(&self) -> &Method {
		&self.method
	}

	fn uri(&self) -> &Uri {
		&self.uri
	}

	fn query_values(&self) -> ValueMap {
		match self.uri.query() {
			Some(query) => parse_urlencoded(query).unwrap_or_else(|e| {
				tracing::debug!(error = %e, "ignoring malformed query string");
				ValueMap::new()
			}),
			None => ValueMap::new(),
		}
	}

	fn content_type(&self) -> Option<&str> {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
	}

	async fn form_values(&mut self, settings: &ParamsSettings) -> ParamsResult<ValueMap> {
		let body = match self.take_bytes(settings.max_form_body_size) {
			Err(ParamsError::MissingBody) => return Ok(ValueMap::new()),
			other => other?,
		};
		let text = std::str::from_utf8(&body)
			.map_err(|e| ParamsError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
		parse_urlencoded(text)
	}

	async fn multipart_form(&mut self, settings: &ParamsSettings) -> ParamsResult<MultipartForm> {
		let content_type = self
			.content_type()
			.ok_or(ParamsError::MissingContentType)?
			.to_string();
		let body = self.take_bytes(settings.max_multipart_body_size)?;
		parse_multipart(&content_type, body, settings).await
	}

	fn take_body(&mut self) -> Option<BodyStream> {
		self.body
			.take()
			.map(|body| Box::new(std::io::Cursor::new(body)) as BodyStream)
	}
}

/// Builder for [`HttpRequest`]
#[derive(Debug, Default)]
pub struct HttpRequestBuilder {
	method: Method,
	uri: Option<String>,
	headers: Vec<(String, String)>,
	body: Option<Bytes>,
}

impl HttpRequestBuilder {
	/// Set the method
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	/// Set the URI
	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	/// Add a header
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	/// Set the body
	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = Some(body.into());
		self
	}

	/// Build the request
	pub fn build(self) -> Result<HttpRequest, http::Error> {
		let mut builder = http::Request::builder()
			.method(self.method)
			.uri(self.uri.as_deref().unwrap_or("/"));
		for (name, value) in &self.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		let (parts, ()) = builder.body(())?.into_parts();
		Ok(HttpRequest::new(
			parts.method,
			parts.uri,
			parts.headers,
			self.body,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tokio::io::AsyncReadExt;

	#[rstest]
	#[case("application/x-www-form-urlencoded", "application/x-www-form-urlencoded")]
	#[case("text/json;charset=UTF-8", "text/json")]
	#[case("  Multipart/Form-Data ; boundary=abc", "multipart/form-data")]
	#[case("", "")]
	fn test_media_type(#[case] raw: &str, #[case] expected: &str) {
		assert_eq!(media_type(raw), expected);
	}

	#[rstest]
	fn test_query_values_are_decoded_and_ordered() {
		// Arrange
		let request = HttpRequest::builder()
			.uri("/search?q=hello%20world&tag=a&tag=b&empty=")
			.build()
			.unwrap();

		// Act
		let values = request.query_values();

		// Assert
		assert_eq!(values["q"], vec!["hello world"]);
		assert_eq!(values["tag"], vec!["a", "b"]);
		assert_eq!(values["empty"], vec![""]);
	}

	#[rstest]
	fn test_query_values_preserve_equals_in_value() {
		let request = HttpRequest::builder()
			.uri("/test?token=abc==")
			.build()
			.unwrap();
		assert_eq!(request.query_values()["token"], vec!["abc=="]);
	}

	#[rstest]
	fn test_no_query_string_yields_empty_map() {
		let request = HttpRequest::builder().uri("/test").build().unwrap();
		assert!(request.query_values().is_empty());
	}

	#[tokio::test]
	async fn test_form_values_decode_body() {
		// Arrange
		let mut request = HttpRequest::builder()
			.method(Method::POST)
			.header("content-type", "application/x-www-form-urlencoded")
			.body("name=Alice+Smith&role=admin&role=dev")
			.build()
			.unwrap();

		// Act
		let values = request
			.form_values(&ParamsSettings::default())
			.await
			.unwrap();

		// Assert
		assert_eq!(values["name"], vec!["Alice Smith"]);
		assert_eq!(values["role"], vec!["admin", "dev"]);
	}

	#[tokio::test]
	async fn test_form_values_over_limit_fail() {
		// Arrange
		let mut request = HttpRequest::builder()
			.method(Method::POST)
			.body("a=0123456789")
			.build()
			.unwrap();
		let settings = ParamsSettings::default().with_max_form_body_size(4);

		// Act
		let err = request.form_values(&settings).await.unwrap_err();

		// Assert
		assert!(err.is_payload_too_large());
	}

	#[tokio::test]
	async fn test_take_body_streams_once() {
		// Arrange
		let mut request = HttpRequest::builder().body("payload").build().unwrap();

		// Act
		let mut stream = request.take_body().unwrap();
		let mut out = Vec::new();
		stream.read_to_end(&mut out).await.unwrap();

		// Assert
		assert_eq!(out, b"payload");
		assert!(request.take_body().is_none());
	}

	#[rstest]
	fn test_from_http_request_drops_empty_body() {
		let request: HttpRequest = http::Request::builder()
			.uri("/x")
			.body(Bytes::new())
			.unwrap()
			.into();
		assert!(request.body.is_none());
	}
}
