//! Preference header parsing
//!
//! Parses `Accept`, `Accept-Language`, `Accept-Encoding` and `Content-Type`
//! style values into ordered [`RangeEntry`] lists. Parsing is lenient and
//! never fails: stray whitespace, unknown parameters and malformed quality
//! values degrade to defaults instead of rejecting the header.

use indexmap::IndexMap;

/// Quality assigned to a range without a usable `q` parameter.
pub const DEFAULT_QUALITY: f32 = 1.0;

/// One client preference from a header, e.g. `image/*;q=0.5`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeEntry {
	/// Raw preference value with surrounding whitespace removed (case preserved)
	pub token: String,
	/// Quality factor in `[0, 1]`
	pub quality: f32,
	/// Parameters other than `q`, in header order
	pub params: IndexMap<String, String>,
}

impl RangeEntry {
	/// Creates an entry with the default quality and no parameters
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_negotiation::accept::RangeEntry;
	///
	/// let entry = RangeEntry::new("text/html");
	/// assert_eq!(entry.token, "text/html");
	/// assert_eq!(entry.quality, 1.0);
	/// ```
	pub fn new(token: impl Into<String>) -> Self {
		Self {
			token: token.into(),
			quality: DEFAULT_QUALITY,
			params: IndexMap::new(),
		}
	}

	/// Sets the quality factor
	pub fn with_quality(mut self, quality: f32) -> Self {
		self.quality = quality;
		self
	}

	/// Parses a single `token;key=value;...` segment
	///
	/// Returns `None` when the segment has no token (e.g. `;q=0.5` or an empty
	/// string between two commas).
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_negotiation::accept::RangeEntry;
	///
	/// let entry = RangeEntry::parse("text/html; level=1; q=0.7").unwrap();
	/// assert_eq!(entry.token, "text/html");
	/// assert_eq!(entry.quality, 0.7);
	/// assert_eq!(entry.params.get("level").map(String::as_str), Some("1"));
	///
	/// assert!(RangeEntry::parse("  ").is_none());
	/// ```
	pub fn parse(segment: &str) -> Option<Self> {
		let mut parts = segment.split(';');
		let token = parts.next()?.trim();
		if token.is_empty() {
			return None;
		}

		let mut entry = Self::new(token);
		for param in parts {
			let (key, value) = match param.split_once('=') {
				Some((key, value)) => (key.trim(), value.trim()),
				None => (param.trim(), ""),
			};
			if key.is_empty() {
				continue;
			}

			if key.eq_ignore_ascii_case("q") {
				entry.quality = parse_quality(value);
			} else {
				entry.params.insert(key.to_string(), unquote(value).to_string());
			}
		}

		Some(entry)
	}

	/// Whether the client explicitly refused this range (`q=0`)
	pub fn is_excluded(&self) -> bool {
		self.quality == 0.0
	}
}

/// Parses a quality value. Anything that is not a number in `[0, 1]`
/// falls back to [`DEFAULT_QUALITY`].
fn parse_quality(value: &str) -> f32 {
	match value.parse::<f32>() {
		Ok(q) if (0.0..=1.0).contains(&q) => q,
		_ => DEFAULT_QUALITY,
	}
}

fn unquote(value: &str) -> &str {
	value
		.strip_prefix('"')
		.and_then(|v| v.strip_suffix('"'))
		.unwrap_or(value)
}

/// A parsed preference header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptHeader {
	/// Entries in header order. Never re-sorted: header order carries no
	/// meaning for selection, and keeping it makes entry indices stable.
	pub entries: Vec<RangeEntry>,
}

impl AcceptHeader {
	/// Parses a header value into its ranges
	///
	/// Segments are separated by `,`. Empty segments are skipped and an empty
	/// header yields no entries.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_negotiation::accept::AcceptHeader;
	///
	/// let accept = AcceptHeader::parse("text/html, image/png;q=0.5, */*;q=0");
	/// assert_eq!(accept.len(), 3);
	/// assert_eq!(accept.entries[0].quality, 1.0);
	/// assert_eq!(accept.entries[1].quality, 0.5);
	/// assert!(accept.entries[2].is_excluded());
	///
	/// assert!(AcceptHeader::parse("").is_empty());
	/// ```
	pub fn parse(header: &str) -> Self {
		let entries = header.split(',').filter_map(RangeEntry::parse).collect();
		Self { entries }
	}

	/// Creates an AcceptHeader with no entries
	pub fn empty() -> Self {
		Self::default()
	}

	/// Number of parsed entries
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// True when the header contained no usable ranges
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates over the entries in header order
	pub fn iter(&self) -> std::slice::Iter<'_, RangeEntry> {
		self.entries.iter()
	}
}

impl<'a> IntoIterator for &'a AcceptHeader {
	type Item = &'a RangeEntry;
	type IntoIter = std::slice::Iter<'a, RangeEntry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

/// Splits a `Content-Type` style value into its bare value and parameters
///
/// The value is trimmed; parameter names are lowercased since they are
/// case-insensitive. Parameters without `=` are dropped.
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::accept::parse_value_and_params;
///
/// let (value, params) = parse_value_and_params("application/json ; charset=UTF-8");
/// assert_eq!(value, "application/json");
/// assert_eq!(params.get("charset").map(String::as_str), Some("UTF-8"));
/// ```
pub fn parse_value_and_params(header: &str) -> (String, IndexMap<String, String>) {
	let mut parts = header.split(';');
	let value = parts.next().unwrap_or_default().trim().to_string();

	let params = parts
		.filter_map(|param| {
			let (key, value) = param.split_once('=')?;
			let key = key.trim();
			if key.is_empty() {
				return None;
			}
			Some((key.to_ascii_lowercase(), unquote(value.trim()).to_string()))
		})
		.collect();

	(value, params)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parse_accept_header() {
		let accept = AcceptHeader::parse("application/json, text/html; q=0.9");
		assert_eq!(accept.len(), 2);
		assert_eq!(accept.entries[0].token, "application/json");
		assert_eq!(accept.entries[0].quality, 1.0);
		assert_eq!(accept.entries[1].token, "text/html");
		assert_eq!(accept.entries[1].quality, 0.9);
	}

	#[rstest]
	fn test_parse_keeps_header_order() {
		let accept = AcceptHeader::parse("text/html;q=0.1, application/json");
		let tokens: Vec<_> = accept.iter().map(|e| e.token.as_str()).collect();
		assert_eq!(tokens, vec!["text/html", "application/json"]);
	}

	#[rstest]
	#[case("gzip;q=abc")]
	#[case("gzip;q=")]
	#[case("gzip;q=1.5")]
	#[case("gzip;q=-0.1")]
	#[case("gzip;q=NaN")]
	fn test_unusable_quality_defaults_to_one(#[case] header: &str) {
		let accept = AcceptHeader::parse(header);
		assert_eq!(accept.len(), 1);
		assert_eq!(accept.entries[0].quality, DEFAULT_QUALITY);
	}

	#[rstest]
	fn test_uppercase_q_parameter() {
		let accept = AcceptHeader::parse("en;Q=0.3");
		assert_eq!(accept.entries[0].quality, 0.3);
	}

	#[rstest]
	fn test_duplicate_tokens_are_kept() {
		let accept = AcceptHeader::parse("text/html, text/html;q=0");
		assert_eq!(accept.len(), 2);
		assert!(!accept.entries[0].is_excluded());
		assert!(accept.entries[1].is_excluded());
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	#[case(",,")]
	#[case(" , ;q=0.5")]
	fn test_headers_without_tokens_are_empty(#[case] header: &str) {
		assert!(AcceptHeader::parse(header).is_empty());
	}

	#[rstest]
	fn test_params_are_ordered_and_unquoted() {
		let entry = RangeEntry::parse(r#"text/plain; format="flowed"; charset=utf-8"#).unwrap();
		let keys: Vec<_> = entry.params.keys().map(String::as_str).collect();
		assert_eq!(keys, vec!["format", "charset"]);
		assert_eq!(entry.params["format"], "flowed");
	}

	#[rstest]
	fn test_bare_parameter_without_value() {
		let entry = RangeEntry::parse("text/plain; flowed").unwrap();
		assert_eq!(entry.params.get("flowed").map(String::as_str), Some(""));
	}

	#[rstest]
	#[case("", "")]
	#[case("application/json", "application/json")]
	#[case("multipart/form-data; boundary=xyz", "multipart/form-data")]
	#[case("  text/xml;charset=utf-8", "text/xml")]
	fn test_parse_value_and_params(#[case] header: &str, #[case] expected: &str) {
		let (value, _) = parse_value_and_params(header);
		assert_eq!(value, expected);
	}

	#[rstest]
	fn test_parse_value_and_params_lowercases_keys() {
		let (_, params) = parse_value_and_params("text/html; Charset=\"UTF-8\"; broken");
		assert_eq!(params.len(), 1);
		assert_eq!(params["charset"], "UTF-8");
	}
}
