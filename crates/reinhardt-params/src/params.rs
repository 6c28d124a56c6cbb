//! Per-request parameter storage

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempPath;

use crate::resolver::calc_values;
use crate::upload::UploadedFile;

/// Mapping from parameter name to its values in arrival order
pub type ValueMap = HashMap<String, Vec<String>>;

/// All request parameters, per source and unified
///
/// The router sets [`route`](Self::route) and [`fixed`](Self::fixed); the parser
/// fills the rest and then calls [`resolve`](Self::resolve). Handler code reads the
/// unified [`values`](Self::values) view, which prefers fixed over route over
/// form-and-query parameters.
///
/// # Examples
///
/// ```
/// use reinhardt_params::ParameterSet;
///
/// let mut params = ParameterSet::new();
/// params.set_route([("id", "42")]);
/// params.set_query([("id", "1"), ("page", "2")]);
/// params.resolve();
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get("page"), Some("2"));
/// ```
#[derive(Debug, Default)]
pub struct ParameterSet {
	/// Fixed parameters from the route definition
	pub fixed: Arc<ValueMap>,
	/// Parameters extracted from the route path, e.g. `/customers/{id}`
	pub route: Arc<ValueMap>,
	/// Parameters from the query string
	pub query: Arc<ValueMap>,
	/// Parameters from a form or multipart body
	pub form: Arc<ValueMap>,
	/// Files uploaded in a multipart body
	pub files: HashMap<String, Vec<UploadedFile>>,
	/// Raw JSON body, empty when the request had none
	pub json: Bytes,
	values: Arc<ValueMap>,
	temp_files: Vec<TempPath>,
}

impl ParameterSet {
	/// Create an empty parameter set
	pub fn new() -> Self {
		Self::default()
	}

	/// The unified view, as of the last [`resolve`](Self::resolve)
	pub fn values(&self) -> &Arc<ValueMap> {
		&self.values
	}

	/// Recompute the unified view from the four source maps
	pub fn resolve(&mut self) {
		self.values = calc_values(&self.query, &self.route, &self.fixed, &self.form);
	}

	/// First value of `name` in the unified view
	pub fn get(&self, name: &str) -> Option<&str> {
		self.values
			.get(name)
			.and_then(|vals| vals.first())
			.map(String::as_str)
	}

	/// All values of `name` in the unified view
	pub fn get_all(&self, name: &str) -> &[String] {
		self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Returns true if `name` is present in the unified view or among uploaded files
	pub fn contains(&self, name: &str) -> bool {
		self.values.contains_key(name) || self.files.contains_key(name)
	}

	/// First uploaded file for `name`
	pub fn file(&self, name: &str) -> Option<&UploadedFile> {
		self.files.get(name).and_then(|files| files.first())
	}

	/// Replace the route parameters
	pub fn set_route<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.route = Arc::new(collect_pairs(pairs));
	}

	/// Replace the fixed parameters
	pub fn set_fixed<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.fixed = Arc::new(collect_pairs(pairs));
	}

	/// Replace the query parameters
	pub fn set_query<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.query = Arc::new(collect_pairs(pairs));
	}

	/// Replace the form parameters
	pub fn set_form<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.form = Arc::new(collect_pairs(pairs));
	}

	/// Take ownership of a temporary file, deleting it at [`cleanup`](Self::cleanup)
	pub fn track_temp_file(&mut self, path: TempPath) {
		self.temp_files.push(path);
	}

	/// Temporary files awaiting cleanup
	pub fn temp_files(&self) -> &[TempPath] {
		&self.temp_files
	}

	/// Delete every tracked temporary file
	///
	/// Each file is removed at most once: the list is drained, so calling this
	/// again does nothing. Failures are logged and otherwise ignored. Returns the
	/// number of deletions attempted.
	pub fn cleanup(&mut self) -> usize {
		let temp_files = std::mem::take(&mut self.temp_files);
		let attempted = temp_files.len();
		for temp_file in temp_files {
			let path = temp_file.to_path_buf();
			if let Err(e) = temp_file.close() {
				tracing::warn!(
					path = %path.display(),
					error = %e,
					"could not remove upload temp file"
				);
			}
		}
		attempted
	}
}

/// Build a [`ValueMap`] from pairs, keeping repeated keys in arrival order
pub(crate) fn collect_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> ValueMap
where
	K: Into<String>,
	V: Into<String>,
{
	let mut map = ValueMap::new();
	for (k, v) in pairs {
		map.entry(k.into()).or_default().push(v.into());
	}
	map
}
