//! Unified view over the per-source parameter maps
//!
//! Sources are merged from least to most trusted:
//!
//! 1. `?query` string parameters
//! 2. form body parameters (appended to query values of the same key)
//! 3. `/{route}` parameters (replace earlier values of the same key)
//! 4. fixed route parameters (replace everything)

use std::sync::Arc;

use crate::params::ValueMap;

/// Compute the unified view of the four parameter sources
///
/// When only one source holds any parameters its map is returned as-is (the same
/// `Arc`), avoiding a copy for the common single-source request.
///
/// # Examples
///
/// ```
/// use reinhardt_params::{ValueMap, calc_values};
/// use std::sync::Arc;
///
/// let query = Arc::new(ValueMap::from([("id".to_string(), vec!["1".to_string()])]));
/// let route = Arc::new(ValueMap::from([("id".to_string(), vec!["2".to_string()])]));
/// let empty = Arc::new(ValueMap::new());
///
/// let values = calc_values(&query, &route, &empty, &empty);
/// assert_eq!(values["id"], vec!["2".to_string()]);
/// ```
pub fn calc_values(
	query: &Arc<ValueMap>,
	route: &Arc<ValueMap>,
	fixed: &Arc<ValueMap>,
	form: &Arc<ValueMap>,
) -> Arc<ValueMap> {
	let num_params = query.len() + route.len() + fixed.len() + form.len();

	if num_params == 0 {
		return Arc::new(ValueMap::new());
	}

	// A source whose own size equals the total is the only non-empty one.
	// Check order matters and is kept as query, route, fixed, form.
	if num_params == query.len() {
		return Arc::clone(query);
	}
	if num_params == route.len() {
		return Arc::clone(route);
	}
	if num_params == fixed.len() {
		return Arc::clone(fixed);
	}
	if num_params == form.len() {
		return Arc::clone(form);
	}

	let mut values = ValueMap::with_capacity(num_params);

	for (key, vals) in query.iter().chain(form.iter()) {
		values
			.entry(key.clone())
			.or_default()
			.extend(vals.iter().cloned());
	}

	for (key, vals) in route.iter().chain(fixed.iter()) {
		values.insert(key.clone(), vals.clone());
	}

	tracing::trace!(
		sources = num_params,
		keys = values.len(),
		"merged request parameters"
	);

	Arc::new(values)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn map(pairs: &[(&str, &[&str])]) -> Arc<ValueMap> {
		Arc::new(
			pairs
				.iter()
				.map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
				.collect(),
		)
	}

	fn empty() -> Arc<ValueMap> {
		Arc::new(ValueMap::new())
	}

	#[rstest]
	fn test_all_sources_empty_yields_empty_map() {
		// Arrange
		let (q, r, f, fm) = (empty(), empty(), empty(), empty());

		// Act
		let values = calc_values(&q, &r, &f, &fm);

		// Assert
		assert!(values.is_empty());
		assert!(!Arc::ptr_eq(&values, &q));
	}

	#[rstest]
	#[case::query(0)]
	#[case::route(1)]
	#[case::fixed(2)]
	#[case::form(3)]
	fn test_single_source_is_shared(#[case] which: usize) {
		// Arrange
		let mut sources = [empty(), empty(), empty(), empty()];
		sources[which] = map(&[("a", &["1", "2"]), ("b", &["3"])]);
		let [q, r, f, fm] = sources;

		// Act
		let values = calc_values(&q, &r, &f, &fm);

		// Assert
		let expected = [&q, &r, &f, &fm][which];
		assert!(Arc::ptr_eq(&values, expected));
		assert_eq!(values["a"], vec!["1", "2"]);
	}

	#[rstest]
	fn test_route_overrides_query() {
		// Arrange
		let query = map(&[("id", &["from-query"])]);
		let route = map(&[("id", &["from-route"])]);

		// Act
		let values = calc_values(&query, &route, &empty(), &empty());

		// Assert
		assert_eq!(values["id"], vec!["from-route"]);
	}

	#[rstest]
	fn test_fixed_overrides_route() {
		// Arrange
		let route = map(&[("id", &["from-route"])]);
		let fixed = map(&[("id", &["from-fixed"])]);

		// Act
		let values = calc_values(&empty(), &route, &fixed, &empty());

		// Assert
		assert_eq!(values["id"], vec!["from-fixed"]);
	}

	#[rstest]
	fn test_query_and_form_accumulate_in_order() {
		// Arrange
		let query = map(&[("tag", &["a", "b"])]);
		let form = map(&[("tag", &["c"])]);

		// Act
		let values = calc_values(&query, &empty(), &empty(), &form);

		// Assert
		assert_eq!(values["tag"], vec!["a", "b", "c"]);
	}

	#[rstest]
	fn test_route_replaces_accumulated_query_and_form() {
		// Arrange
		let query = map(&[("tag", &["a"]), ("page", &["1"])]);
		let form = map(&[("tag", &["b"])]);
		let route = map(&[("tag", &["z"])]);

		// Act
		let values = calc_values(&query, &route, &empty(), &form);

		// Assert
		assert_eq!(values["tag"], vec!["z"]);
		assert_eq!(values["page"], vec!["1"]);
	}

	#[rstest]
	fn test_all_sources_merge_distinct_keys() {
		// Arrange
		let query = map(&[("q", &["1"])]);
		let route = map(&[("r", &["2"])]);
		let fixed = map(&[("f", &["3"])]);
		let form = map(&[("fm", &["4"])]);

		// Act
		let values = calc_values(&query, &route, &fixed, &form);

		// Assert
		assert_eq!(values.len(), 4);
		assert_eq!(values["q"], vec!["1"]);
		assert_eq!(values["r"], vec!["2"]);
		assert_eq!(values["f"], vec!["3"]);
		assert_eq!(values["fm"], vec!["4"]);
	}

	#[rstest]
	fn test_merge_does_not_mutate_sources() {
		// Arrange
		let query = map(&[("tag", &["a"])]);
		let form = map(&[("tag", &["b"])]);

		// Act
		let _ = calc_values(&query, &empty(), &empty(), &form);

		// Assert
		assert_eq!(query["tag"], vec!["a"]);
		assert_eq!(form["tag"], vec!["b"]);
	}
}
