//! Conversion of raw request parameters into typed values
//!
//! A type opts into binding by implementing [`Bindable`]. Implementations are
//! grouped by family:
//!
//! - scalars (`i32`, `f64`, `bool`, `String`, ...) read the first value of a key
//! - `Option<T>`, `Vec<T>` and `HashMap<String, T>` build on scalars, the latter two
//!   also understand `name[0]` and `name[key]` style keys
//! - [`Structured<T>`] deserializes `name.field` keys into a serde type
//! - [`UploadedFile`](crate::UploadedFile) and friends read multipart uploads
//!
//! Binding never fails: when a value is missing or cannot be converted, the
//! type's [`zero`](Bindable::zero) value is produced instead.

mod collection;
mod file;
mod scalar;
mod structured;

pub use collection::MAX_INDEXED_LEN;
pub use scalar::FromParamValue;
pub use structured::Structured;

use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::error::ParamsResult;
use crate::params::{ParameterSet, ValueMap};
use crate::upload::UploadedFile;

/// Read-only view of the parameters a [`Bindable`] converts from
#[derive(Debug, Clone, Copy)]
pub struct BindSource<'a> {
	values: &'a ValueMap,
	files: &'a HashMap<String, Vec<UploadedFile>>,
	json: Option<&'a [u8]>,
}

impl<'a> BindSource<'a> {
	/// Create a source over unified values, files and an optional JSON body
	pub fn new(
		values: &'a ValueMap,
		files: &'a HashMap<String, Vec<UploadedFile>>,
		json: Option<&'a [u8]>,
	) -> Self {
		Self {
			values,
			files,
			json: json.filter(|body| !body.is_empty()),
		}
	}

	/// The same source with the JSON body hidden
	pub fn without_json(self) -> Self {
		Self { json: None, ..self }
	}

	/// All values of `name`
	pub fn values(&self, name: &str) -> &'a [String] {
		self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
	}

	/// First value of `name`
	pub fn first(&self, name: &str) -> Option<&'a str> {
		self.values(name).first().map(String::as_str)
	}

	/// Uploaded files of `name`
	pub fn files(&self, name: &str) -> &'a [UploadedFile] {
		self.files.get(name).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Raw JSON body, if visible and non-empty
	pub fn json(&self) -> Option<&'a [u8]> {
		self.json
	}

	/// Keys of the form `name[sub]`, yielded as `(sub, values)`
	pub fn bracketed(self, name: &str) -> impl Iterator<Item = (&'a str, &'a [String])> {
		self.values.iter().filter_map(move |(key, vals)| {
			let sub = key.strip_prefix(name)?.strip_prefix('[')?.strip_suffix(']')?;
			Some((sub, vals.as_slice()))
		})
	}

	/// Keys of the form `name.field`, yielded as `(field, values)`
	pub fn dotted(self, name: &str) -> impl Iterator<Item = (&'a str, &'a [String])> {
		self.values.iter().filter_map(move |(key, vals)| {
			let field = key.strip_prefix(name)?.strip_prefix('.')?;
			(!field.is_empty()).then_some((field, vals.as_slice()))
		})
	}
}

/// A type that can be produced from request parameters
pub trait Bindable: Sized {
	/// Convert the parameter `name`, `None` if missing or unparseable
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self>;

	/// Value used when [`bind`](Self::bind) produces nothing
	fn zero() -> Self;
}

/// Bind `name` from `source`, falling back to [`Bindable::zero`]
pub fn bind<T: Bindable>(source: &BindSource<'_>, name: &str) -> T {
	T::bind(source, name).unwrap_or_else(|| {
		tracing::debug!(
			param = name,
			target_type = std::any::type_name::<T>(),
			"parameter missing or unparseable, using zero value"
		);
		T::zero()
	})
}

impl ParameterSet {
	/// Bind the parameter `name` into `dest`
	///
	/// `dest` receives the converted value, or `T`'s zero value if the parameter
	/// is missing or cannot be parsed. The JSON body is not consulted, so a named
	/// bind never picks up data from the whole request payload; use
	/// [`bind_argument`](Self::bind_argument) for that.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_params::ParameterSet;
	///
	/// let mut params = ParameterSet::new();
	/// params.set_query([("page", "3"), ("size", "big")]);
	/// params.resolve();
	///
	/// let mut page = 0u32;
	/// params.bind(&mut page, "page");
	/// assert_eq!(page, 3);
	///
	/// let mut size = 10u32;
	/// params.bind(&mut size, "size");
	/// assert_eq!(size, 0);
	/// ```
	pub fn bind<T: Bindable>(&self, dest: &mut T, name: &str) {
		*dest = self.bind_value(name);
	}

	/// Bind and return the parameter `name`, see [`bind`](Self::bind)
	pub fn bind_value<T: Bindable>(&self, name: &str) -> T {
		let source = self.bind_source().without_json();
		bind(&source, name)
	}

	/// Bind the parameter `name` with the JSON body visible
	///
	/// Used when binding handler arguments against the full request: families
	/// that understand JSON (such as [`Structured`]) fall back to the body when
	/// no form or query data is found.
	pub fn bind_argument<T: Bindable>(&self, name: &str) -> T {
		bind(&self.bind_source(), name)
	}

	/// Deserialize the whole JSON body
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_params::ParameterSet;
	/// use serde::Deserialize;
	///
	/// #[derive(Deserialize)]
	/// struct NewUser {
	///     name: String,
	/// }
	///
	/// let mut params = ParameterSet::new();
	/// params.json = r#"{"name":"alice"}"#.into();
	///
	/// let user: NewUser = params.bind_json().unwrap();
	/// assert_eq!(user.name, "alice");
	/// ```
	pub fn bind_json<T: DeserializeOwned>(&self) -> ParamsResult<T> {
		serde_json::from_slice(&self.json).map_err(|e| {
			tracing::warn!(
				target_type = std::any::type_name::<T>(),
				error = %e,
				"unable to unmarshal request body"
			);
			e.into()
		})
	}

	/// Deserialize the whole JSON body into `dest`
	///
	/// `dest` is only written when deserialization succeeds.
	pub fn bind_json_into<T: DeserializeOwned>(&self, dest: &mut T) -> ParamsResult<()> {
		*dest = self.bind_json()?;
		Ok(())
	}

	fn bind_source(&self) -> BindSource<'_> {
		BindSource::new(self.values(), &self.files, Some(self.json.as_ref()))
	}
}
