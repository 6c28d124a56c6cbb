//! Error types for parameter parsing and binding

use std::io;

use crate::limit::SizeLimitExceeded;

/// Result type used throughout this crate
pub type ParamsResult<T> = Result<T, ParamsError>;

/// Errors raised while reading request bodies or binding parameters
///
/// Most of these never reach handler code: the parser logs them and leaves the
/// affected source empty. Only [`ParameterSet::bind_json`](crate::ParameterSet::bind_json)
/// and the settings loaders return them to the caller.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
	#[error("IO error: {0}")]
	Io(#[from] io::Error),
	#[error(transparent)]
	PayloadTooLarge(#[from] SizeLimitExceeded),
	#[error("Invalid form body: {0}")]
	Form(#[from] serde_urlencoded::de::Error),
	#[error("Invalid multipart body: {0}")]
	Multipart(#[from] multer::Error),
	#[error("Invalid JSON body: {0}")]
	Json(#[from] serde_json::Error),
	#[error("Missing Content-Type header")]
	MissingContentType,
	#[error("Request body is absent")]
	MissingBody,
	#[error("Invalid settings: {0}")]
	Settings(String),
}

impl ParamsError {
	/// Returns true if the error was caused by a body exceeding its size limit
	pub fn is_payload_too_large(&self) -> bool {
		match self {
			ParamsError::PayloadTooLarge(_) => true,
			ParamsError::Io(e) => crate::limit::is_size_limit_exceeded(e),
			ParamsError::Multipart(
				multer::Error::StreamSizeExceeded { .. } | multer::Error::FieldSizeExceeded { .. },
			) => true,
			_ => false,
		}
	}
}

impl From<toml::de::Error> for ParamsError {
	fn from(e: toml::de::Error) -> Self {
		ParamsError::Settings(e.to_string())
	}
}
