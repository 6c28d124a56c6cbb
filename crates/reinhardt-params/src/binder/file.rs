//! Binders for multipart uploads

use bytes::Bytes;

use super::{BindSource, Bindable};
use crate::upload::UploadedFile;

impl Bindable for UploadedFile {
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
		source.files(name).first().cloned()
	}

	fn zero() -> Self {
		UploadedFile::default()
	}
}

impl Bindable for Vec<UploadedFile> {
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
		let files = source.files(name);
		(!files.is_empty()).then(|| files.to_vec())
	}

	fn zero() -> Self {
		Vec::new()
	}
}

/// Content of the first file uploaded as `name`
impl Bindable for Bytes {
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
		let file = source.files(name).first()?;
		match file.read_bytes() {
			Ok(data) => Some(data),
			Err(e) => {
				tracing::warn!(
					param = name,
					filename = %file.filename,
					error = %e,
					"could not read uploaded file"
				);
				None
			}
		}
	}

	fn zero() -> Self {
		Bytes::new()
	}
}
