//! Structured binders backed by serde

use serde::de::DeserializeOwned;
use std::fmt::{self, Debug};
use std::ops::{Deref, DerefMut};

use super::{BindSource, Bindable};

/// Bind a serde type from `name.field` parameters
///
/// `user.name=alice&user.age=30` binds `Structured<User>` under the name `user`.
/// Field values are decoded the way urlencoded forms are, so numbers and booleans
/// parse from their text. When no `name.field` keys exist and the JSON body is
/// visible to the bind, the whole body is deserialized instead.
///
/// # Examples
///
/// ```
/// use reinhardt_params::{ParameterSet, Structured};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize)]
/// struct Filter {
///     status: String,
///     limit: u32,
/// }
///
/// let mut params = ParameterSet::new();
/// params.set_query([("filter.status", "open"), ("filter.limit", "20")]);
/// params.resolve();
///
/// let filter: Structured<Filter> = params.bind_value("filter");
/// assert_eq!(filter.status, "open");
/// assert_eq!(filter.limit, 20);
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Structured<T>(pub T);

impl<T> Structured<T> {
	/// Unwrap the bound value
	pub fn into_inner(self) -> T {
		self.0
	}
}

impl<T> Deref for Structured<T> {
	type Target = T;
	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<T> DerefMut for Structured<T> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.0
	}
}

impl<T: Debug> Debug for Structured<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl<T: DeserializeOwned + Default> Bindable for Structured<T> {
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
		let pairs: Vec<(&str, &str)> = source
			.dotted(name)
			.flat_map(|(field, vals)| vals.iter().map(move |v| (field, v.as_str())))
			.collect();

		if !pairs.is_empty() {
			let encoded = serde_urlencoded::to_string(&pairs).ok()?;
			return match serde_urlencoded::from_str(&encoded) {
				Ok(value) => Some(Structured(value)),
				Err(e) => {
					tracing::debug!(param = name, error = %e, "could not bind structured parameter");
					None
				}
			};
		}

		let body = source.json()?;
		serde_json::from_slice(body).ok().map(Structured)
	}

	fn zero() -> Self {
		Structured(T::default())
	}
}

/// A JSON value bound from the parameter's first value, or from field `name` of a
/// visible JSON object body.
///
/// A parameter value that is not valid JSON binds as a JSON string.
impl Bindable for serde_json::Value {
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
		if let Some(raw) = source.first(name) {
			return Some(
				serde_json::from_str(raw)
					.unwrap_or_else(|_| serde_json::Value::String(raw.to_string())),
			);
		}

		let body = source.json()?;
		let mut object: serde_json::Map<String, serde_json::Value> =
			serde_json::from_slice(body).ok()?;
		object.remove(name)
	}

	fn zero() -> Self {
		serde_json::Value::Null
	}
}
