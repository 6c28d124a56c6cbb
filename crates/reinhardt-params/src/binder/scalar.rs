//! Scalar binders: numbers, booleans, characters and strings

use super::{BindSource, Bindable};

/// Conversion of a single raw parameter value
///
/// Implemented for the scalar types; [`Vec`], [`Option`] and
/// [`HashMap`](std::collections::HashMap) binders are built on top of it.
pub trait FromParamValue: Sized + Default {
	/// Parse one raw value, `None` if it is not a valid `Self`
	fn from_param_value(raw: &str) -> Option<Self>;
}

macro_rules! impl_parsed_scalar {
	($($ty:ty),* $(,)?) => {
		$(
			impl FromParamValue for $ty {
				fn from_param_value(raw: &str) -> Option<Self> {
					raw.trim().parse().ok()
				}
			}

			impl Bindable for $ty {
				fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
					source.first(name).and_then(Self::from_param_value)
				}

				fn zero() -> Self {
					Self::default()
				}
			}
		)*
	};
}

impl_parsed_scalar!(
	i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char,
);

impl FromParamValue for String {
	fn from_param_value(raw: &str) -> Option<Self> {
		Some(raw.to_string())
	}
}

impl Bindable for String {
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
		source.first(name).map(str::to_string)
	}

	fn zero() -> Self {
		String::new()
	}
}

/// HTML checkboxes submit `on`; anything not recognised is rejected.
impl FromParamValue for bool {
	fn from_param_value(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"true" | "on" | "1" | "yes" => Some(true),
			"false" | "off" | "0" | "no" | "" => Some(false),
			_ => None,
		}
	}
}

impl Bindable for bool {
	fn bind(source: &BindSource<'_>, name: &str) -> Option<Self> {
		source.first(name).and_then(Self::from_param_value)
	}

	fn zero() -> Self {
		false
	}
}
