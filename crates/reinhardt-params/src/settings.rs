//! Limits and thresholds applied while parsing request parameters

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ParamsError, ParamsResult};

/// Default maximum JSON body size: 50 MiB (inclusive)
pub const DEFAULT_MAX_JSON_BODY_SIZE: u64 = 50 << 20;
/// Default maximum urlencoded form body size: 10 MiB
pub const DEFAULT_MAX_FORM_BODY_SIZE: u64 = 10 << 20;
/// Default maximum multipart body size: 64 MiB
pub const DEFAULT_MAX_MULTIPART_BODY_SIZE: u64 = 64 << 20;
/// Default amount of uploaded file data kept in memory before spilling to disk: 32 MiB
pub const DEFAULT_MAX_MULTIPART_MEMORY: u64 = 32 << 20;

/// Settings for request parameter parsing
///
/// # Examples
///
/// ```
/// use reinhardt_params::ParamsSettings;
///
/// let settings = ParamsSettings::from_toml_str("max_json_body_size = 1024").unwrap();
/// assert_eq!(settings.max_json_body_size, 1024);
/// assert_eq!(settings.max_multipart_memory, 32 << 20);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsSettings {
	/// Largest accepted JSON body in bytes
	#[serde(default = "default_max_json_body_size")]
	pub max_json_body_size: u64,

	/// Largest accepted urlencoded form body in bytes
	#[serde(default = "default_max_form_body_size")]
	pub max_form_body_size: u64,

	/// Largest accepted multipart body in bytes
	#[serde(default = "default_max_multipart_body_size")]
	pub max_multipart_body_size: u64,

	/// Uploaded file bytes held in memory before further files go to disk
	#[serde(default = "default_max_multipart_memory")]
	pub max_multipart_memory: u64,

	/// Directory for upload temp files, system temp dir when unset
	#[serde(default)]
	pub upload_temp_dir: Option<PathBuf>,
}

fn default_max_json_body_size() -> u64 {
	DEFAULT_MAX_JSON_BODY_SIZE
}

fn default_max_form_body_size() -> u64 {
	DEFAULT_MAX_FORM_BODY_SIZE
}

fn default_max_multipart_body_size() -> u64 {
	DEFAULT_MAX_MULTIPART_BODY_SIZE
}

fn default_max_multipart_memory() -> u64 {
	DEFAULT_MAX_MULTIPART_MEMORY
}

impl Default for ParamsSettings {
	fn default() -> Self {
		Self {
			max_json_body_size: DEFAULT_MAX_JSON_BODY_SIZE,
			max_form_body_size: DEFAULT_MAX_FORM_BODY_SIZE,
			max_multipart_body_size: DEFAULT_MAX_MULTIPART_BODY_SIZE,
			max_multipart_memory: DEFAULT_MAX_MULTIPART_MEMORY,
			upload_temp_dir: None,
		}
	}
}

impl ParamsSettings {
	/// Create settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Override the JSON body limit
	pub fn with_max_json_body_size(mut self, max: u64) -> Self {
		self.max_json_body_size = max;
		self
	}

	/// Override the form body limit
	pub fn with_max_form_body_size(mut self, max: u64) -> Self {
		self.max_form_body_size = max;
		self
	}

	/// Override the multipart body limit
	pub fn with_max_multipart_body_size(mut self, max: u64) -> Self {
		self.max_multipart_body_size = max;
		self
	}

	/// Override the in-memory upload threshold
	pub fn with_max_multipart_memory(mut self, max: u64) -> Self {
		self.max_multipart_memory = max;
		self
	}

	/// Store upload temp files under `dir`
	pub fn with_upload_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.upload_temp_dir = Some(dir.into());
		self
	}

	/// Load settings from a TOML document, missing keys take their defaults
	pub fn from_toml_str(source: &str) -> ParamsResult<Self> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Load settings from `REINHARDT_PARAMS_*` environment variables
	///
	/// Recognised variables: `REINHARDT_PARAMS_MAX_JSON_BODY_SIZE`,
	/// `REINHARDT_PARAMS_MAX_FORM_BODY_SIZE`, `REINHARDT_PARAMS_MAX_MULTIPART_BODY_SIZE`,
	/// `REINHARDT_PARAMS_MAX_MULTIPART_MEMORY` and `REINHARDT_PARAMS_UPLOAD_TEMP_DIR`.
	pub fn from_env() -> ParamsResult<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ParamsResult<Self> {
		let mut settings = Self::default();

		let size = |key: &str| -> ParamsResult<Option<u64>> {
			lookup(key)
				.map(|raw| {
					raw.trim()
						.parse::<u64>()
						.map_err(|e| ParamsError::Settings(format!("{}: {}", key, e)))
				})
				.transpose()
		};

		if let Some(v) = size("REINHARDT_PARAMS_MAX_JSON_BODY_SIZE")? {
			settings.max_json_body_size = v;
		}
		if let Some(v) = size("REINHARDT_PARAMS_MAX_FORM_BODY_SIZE")? {
			settings.max_form_body_size = v;
		}
		if let Some(v) = size("REINHARDT_PARAMS_MAX_MULTIPART_BODY_SIZE")? {
			settings.max_multipart_body_size = v;
		}
		if let Some(v) = size("REINHARDT_PARAMS_MAX_MULTIPART_MEMORY")? {
			settings.max_multipart_memory = v;
		}
		if let Some(dir) = lookup("REINHARDT_PARAMS_UPLOAD_TEMP_DIR") {
			settings.upload_temp_dir = Some(PathBuf::from(dir));
		}

		settings.validate()?;
		Ok(settings)
	}

	/// Validate settings
	pub fn validate(&self) -> ParamsResult<()> {
		if self.max_multipart_memory > self.max_multipart_body_size {
			return Err(ParamsError::Settings(format!(
				"max_multipart_memory ({}) must not exceed max_multipart_body_size ({})",
				self.max_multipart_memory, self.max_multipart_body_size
			)));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashMap;

	#[rstest]
	fn test_default_json_limit_is_50_mib() {
		let settings = ParamsSettings::default();
		assert_eq!(settings.max_json_body_size, 52_428_800);
		assert!(settings.upload_temp_dir.is_none());
	}

	#[rstest]
	fn test_from_toml_overrides_and_defaults() {
		// Arrange
		let source = r#"
max_form_body_size = 2048
upload_temp_dir = "/var/tmp/uploads"
"#;

		// Act
		let settings = ParamsSettings::from_toml_str(source).unwrap();

		// Assert
		assert_eq!(settings.max_form_body_size, 2048);
		assert_eq!(settings.max_json_body_size, DEFAULT_MAX_JSON_BODY_SIZE);
		assert_eq!(
			settings.upload_temp_dir,
			Some(PathBuf::from("/var/tmp/uploads"))
		);
	}

	#[rstest]
	fn test_from_toml_rejects_bad_type() {
		let result = ParamsSettings::from_toml_str("max_json_body_size = \"big\"");
		assert!(matches!(result, Err(ParamsError::Settings(_))));
	}

	#[rstest]
	fn test_validate_rejects_memory_above_body_limit() {
		let settings = ParamsSettings::new()
			.with_max_multipart_body_size(10)
			.with_max_multipart_memory(20);
		assert!(settings.validate().is_err());
	}

	#[rstest]
	fn test_from_lookup_reads_variables() {
		// Arrange
		let vars: HashMap<&str, &str> = HashMap::from([
			("REINHARDT_PARAMS_MAX_JSON_BODY_SIZE", "4096"),
			("REINHARDT_PARAMS_UPLOAD_TEMP_DIR", "/tmp/x"),
		]);

		// Act
		let settings =
			ParamsSettings::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

		// Assert
		assert_eq!(settings.max_json_body_size, 4096);
		assert_eq!(settings.upload_temp_dir, Some(PathBuf::from("/tmp/x")));
		assert_eq!(settings.max_form_body_size, DEFAULT_MAX_FORM_BODY_SIZE);
	}

	#[rstest]
	fn test_from_lookup_rejects_non_numeric_size() {
		let result = ParamsSettings::from_lookup(|key| {
			(key == "REINHARDT_PARAMS_MAX_MULTIPART_MEMORY").then(|| "lots".to_string())
		});
		assert!(matches!(result, Err(ParamsError::Settings(_))));
	}
}
