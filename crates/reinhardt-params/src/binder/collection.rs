//! Optional, sequence and map binders

use std::collections::HashMap;

use super::{BindSource, Bindable, FromParamValue};

/// Largest number of elements an indexed (`name[i]`) sequence may bind to
///
/// Keys with an index at or above this bound are ignored.
pub const MAX_INDEXED_LEN: usize = 10_000;

impl<T: Bindable> Bindable for Option<T> {
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
		Some(T::bind(source, name))
	}

	fn zero() -> Self {
		None
	}
}

/// Binds either indexed keys (`name[0]`, `name[1]`, ...) or, when there are none,
/// every value of `name` in arrival order.
///
/// Indexed keys may be sparse; gaps are filled with the element's zero value.
/// Elements that fail to parse become zero values as well. Indices of
/// [`MAX_INDEXED_LEN`] or more are dropped.
impl<T: FromParamValue> Bindable for Vec<T> {
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
		let mut indexed: Vec<(usize, &str)> = source
			.bracketed(name)
			.filter_map(|(index, vals)| {
				let index = index.parse::<usize>().ok()?;
				if index >= MAX_INDEXED_LEN {
					tracing::debug!(param = name, index, "ignoring out-of-range sequence index");
					return None;
				}
				Some((index, vals.first()?.as_str()))
			})
			.collect();

		if indexed.is_empty() {
			let raw = source.values(name);
			if raw.is_empty() {
				return None;
			}
			return Some(
				raw.iter()
					.map(|v| T::from_param_value(v).unwrap_or_default())
					.collect(),
			);
		}

		indexed.sort_unstable_by_key(|(index, _)| *index);
		let len = indexed.last().map_or(0, |(index, _)| index + 1);
		let mut out: Vec<T> = std::iter::repeat_with(T::default).take(len).collect();
		for (index, raw) in indexed {
			out[index] = T::from_param_value(raw).unwrap_or_default();
		}
		Some(out)
	}

	fn zero() -> Self {
		Vec::new()
	}
}

/// Binds `name[key]` entries into a map keyed by `key`.
impl<T: FromParamValue> Bindable for HashMap<String, T> {
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
		let map: HashMap<String, T> = source
			.bracketed(name)
			.filter(|(key, _)| !key.is_empty())
			.filter_map(|(key, vals)| {
				let value = T::from_param_value(vals.first()?).unwrap_or_default();
				Some((key.to_string(), value))
			})
			.collect();
		(!map.is_empty()).then_some(map)
	}

	fn zero() -> Self {
		HashMap::new()
	}
}
