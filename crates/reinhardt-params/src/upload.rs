//! Multipart upload materialization
//!
//! Text fields of a `multipart/form-data` body become form values, as do file
//! fields submitted without a file name. File fields become [`UploadedFile`]s, kept in memory until the configured memory budget is
//! spent and written to temporary files after that. The temporary files are
//! handed to the [`ParameterSet`](crate::ParameterSet), which deletes them once the
//! request is done.

use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

use crate::error::{ParamsError, ParamsResult};
use crate::params::ValueMap;
use crate::settings::ParamsSettings;

/// Where an uploaded file's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadContent {
	/// Held in memory
	Memory(Bytes),
	/// Written to a temporary file owned by the request's parameter set
	Disk(PathBuf),
}

impl Default for UploadContent {
	fn default() -> Self {
		UploadContent::Memory(Bytes::new())
	}
}

/// An uploaded file from a multipart body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedFile {
	/// Client supplied file name
	pub filename: String,
	/// Declared content type of the part, if any
	pub content_type: Option<String>,
	/// Size in bytes
	pub size: u64,
	/// Handle to the file content
	pub content: UploadContent,
}

impl UploadedFile {
	/// Create an in-memory upload
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_params::UploadedFile;
	///
	/// let file = UploadedFile::in_memory("a.txt", Some("text/plain"), &b"hello"[..]);
	/// assert_eq!(file.size, 5);
	/// assert_eq!(file.read_bytes().unwrap(), &b"hello"[..]);
	/// ```
	pub fn in_memory(
		filename: impl Into<String>,
		content_type: Option<&str>,
		data: impl Into<Bytes>,
	) -> Self {
		let data = data.into();
		Self {
			filename: filename.into(),
			content_type: content_type.map(str::to_string),
			size: data.len() as u64,
			content: UploadContent::Memory(data),
		}
	}

	/// Returns true if the content was spilled to disk
	pub fn is_on_disk(&self) -> bool {
		matches!(self.content, UploadContent::Disk(_))
	}

	/// Path of the temporary file, for spilled uploads
	pub fn path(&self) -> Option<&Path> {
		match &self.content {
			UploadContent::Disk(path) => Some(path),
			UploadContent::Memory(_) => None,
		}
	}

	/// Read the whole file content
	pub fn read_bytes(&self) -> io::Result<Bytes> {
		match &self.content {
			UploadContent::Memory(data) => Ok(data.clone()),
			UploadContent::Disk(path) => fs::read(path).map(Bytes::from),
		}
	}
}

/// Decoded multipart body
#[derive(Debug, Default)]
pub struct MultipartForm {
	/// Text fields, values in arrival order
	pub values: ValueMap,
	/// File fields, files in arrival order
	pub files: HashMap<String, Vec<UploadedFile>>,
	/// Temporary files backing spilled uploads
	pub temp_files: Vec<TempPath>,
}

/// Decode a multipart body
///
/// `content_type` must carry the `boundary` parameter. File fields are buffered in
/// memory while the total of buffered file bytes stays within
/// `settings.max_multipart_memory`; any file that would go past it is written to a
/// temporary file instead.
pub async fn parse_multipart(
	content_type: &str,
	body: Bytes,
	settings: &ParamsSettings,
) -> ParamsResult<MultipartForm> {
	let boundary = multer::parse_boundary(content_type)?;
	let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
	let constraints = multer::Constraints::new().size_limit(
		multer::SizeLimit::new().whole_stream(settings.max_multipart_body_size),
	);
	let mut multipart = multer::Multipart::with_constraints(stream, boundary, constraints);

	let mut form = MultipartForm::default();
	let mut memory_left = settings.max_multipart_memory;

	while let Some(mut field) = multipart.next_field().await? {
		let Some(name) = field.name().map(str::to_string) else {
			tracing::debug!("skipping multipart field without a name");
			continue;
		};

		// An empty file input is submitted with `filename=""`.
		let Some(filename) = field
			.file_name()
			.filter(|f| !f.is_empty())
			.map(str::to_string)
		else {
			let text = field.text().await?;
			form.values.entry(name).or_default().push(text);
			continue;
		};
		let content_type = field.content_type().map(|m| m.to_string());

		let mut buffer = BytesMut::new();
		let mut spill: Option<NamedTempFile> = None;
		let mut size: u64 = 0;

		while let Some(chunk) = field.chunk().await? {
			size += chunk.len() as u64;
			if spill.is_none() && size > memory_left {
				let mut file = new_temp_file(settings)?;
				file.write_all(&buffer)?;
				buffer.clear();
				spill = Some(file);
			}
			match spill.as_mut() {
				Some(file) => file.write_all(&chunk)?,
				None => buffer.extend_from_slice(&chunk),
			}
		}

		let content = match spill {
			Some(mut file) => {
				file.flush()?;
				let temp_path = file.into_temp_path();
				let path = temp_path.to_path_buf();
				tracing::debug!(field = %name, path = %path.display(), size, "upload spilled to disk");
				form.temp_files.push(temp_path);
				UploadContent::Disk(path)
			}
			None => {
				memory_left -= size;
				UploadContent::Memory(buffer.freeze())
			}
		};

		form.files.entry(name).or_default().push(UploadedFile {
			filename,
			content_type,
			size,
			content,
		});
	}

	Ok(form)
}

fn new_temp_file(settings: &ParamsSettings) -> ParamsResult<NamedTempFile> {
	let builder = {
		let mut builder = tempfile::Builder::new();
		builder.prefix("reinhardt-upload-");
		builder
	};
	let file = match &settings.upload_temp_dir {
		Some(dir) => builder.tempfile_in(dir),
		None => builder.tempfile(),
	};
	file.map_err(ParamsError::from)
}
