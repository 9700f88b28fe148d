//! Registries mapping negotiated content types to codecs
//!
//! Both registries are built once at startup and are read-only afterwards,
//! so they can be shared between request handlers behind an `Arc`.

use super::{Decoding, Encoding};
use crate::accept::parse_value_and_params;
use crate::error::RegistryError;
use crate::negotiate::select_str;
use std::fmt;
use std::sync::Arc;

/// Ordered set of encodings, at most one per produced content type
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::coding::{EncodingRegistry, JsonEncoding};
/// use reinhardt_negotiation::error::RegistryError;
///
/// let result = EncodingRegistry::builder()
///     .register(JsonEncoding::new())
///     .register(JsonEncoding::new().pretty(true))
///     .build();
///
/// assert!(matches!(result, Err(RegistryError::DuplicateProducer { .. })));
/// ```
#[derive(Clone, Default)]
pub struct EncodingRegistry {
	encodings: Vec<Arc<dyn Encoding>>,
}

impl fmt::Debug for EncodingRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EncodingRegistry")
			.field("produces", &self.produces())
			.finish()
	}
}

/// Collects encodings in preference order
#[derive(Default)]
pub struct EncodingRegistryBuilder {
	encodings: Vec<Arc<dyn Encoding>>,
}

impl EncodingRegistryBuilder {
	/// Appends an encoding; earlier registrations are preferred
	pub fn register<E: Encoding + 'static>(self, encoding: E) -> Self {
		self.register_shared(Arc::new(encoding))
	}

	/// Appends an encoding that is already shared elsewhere
	pub fn register_shared(mut self, encoding: Arc<dyn Encoding>) -> Self {
		self.encodings.push(encoding);
		self
	}

	/// Validates the registrations
	///
	/// Fails when an encoding produces an empty content type or when two
	/// encodings produce the same content type (compared case-insensitively).
	pub fn build(self) -> Result<EncodingRegistry, RegistryError> {
		for (second, encoding) in self.encodings.iter().enumerate() {
			let produces = encoding.produces().trim();
			if produces.is_empty() {
				tracing::error!(position = second, "encoding produces an empty content type");
				return Err(RegistryError::EmptyProducer(second));
			}

			if let Some(first) = self.encodings[..second]
				.iter()
				.position(|earlier| earlier.produces().trim().eq_ignore_ascii_case(produces))
			{
				tracing::error!(
					content_type = produces,
					first,
					second,
					"duplicate encoding registration"
				);
				return Err(RegistryError::DuplicateProducer {
					content_type: produces.to_string(),
					first,
					second,
				});
			}
		}

		tracing::debug!(count = self.encodings.len(), "encoding registry built");
		Ok(EncodingRegistry {
			encodings: self.encodings,
		})
	}
}

impl EncodingRegistry {
	/// Starts an empty builder
	pub fn builder() -> EncodingRegistryBuilder {
		EncodingRegistryBuilder::default()
	}

	/// Produced content types in registration order
	pub fn produces(&self) -> Vec<&str> {
		self.encodings.iter().map(|e| e.produces()).collect()
	}

	/// Number of registered encodings
	pub fn len(&self) -> usize {
		self.encodings.len()
	}

	/// Whether no encoding is registered
	pub fn is_empty(&self) -> bool {
		self.encodings.is_empty()
	}

	/// Iterates over the encodings in registration order
	pub fn iter(&self) -> impl Iterator<Item = &dyn Encoding> {
		self.encodings.iter().map(|e| e.as_ref())
	}

	/// Picks the encoding for an `Accept` header value
	///
	/// Falls back to the first registered encoding when nothing is
	/// acceptable. Returns `None` only for an empty registry.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_negotiation::coding::{EncodingRegistry, JsonEncoding};
	///
	/// let registry = EncodingRegistry::builder()
	///     .register(JsonEncoding::new())
	///     .register(JsonEncoding::new().with_produces("application/problem+json"))
	///     .build()
	///     .unwrap();
	///
	/// let chosen = registry.negotiate("application/problem+json").unwrap();
	/// assert_eq!(chosen.produces(), "application/problem+json");
	///
	/// let chosen = registry.negotiate("text/csv").unwrap();
	/// assert_eq!(chosen.produces(), "application/json");
	/// ```
	pub fn negotiate(&self, accept: &str) -> Option<&dyn Encoding> {
		let first = self.encodings.first()?;
		Some(self.negotiate_strict(accept).unwrap_or(first.as_ref()))
	}

	/// Like [`negotiate`](Self::negotiate) but without the fallback
	///
	/// An empty header still accepts the first encoding.
	pub fn negotiate_strict(&self, accept: &str) -> Option<&dyn Encoding> {
		let offers = self.produces();
		let winner = select_str(accept, &offers)?;
		tracing::trace!(accept, produces = offers[winner.offer_index], "encoding selected");
		Some(self.encodings[winner.offer_index].as_ref())
	}
}

/// Ordered set of decodings
///
/// Every accepted content type of every decoding is an offer; the first
/// accepted type of the first decoding is the default.
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::coding::{DecodingRegistry, JsonDecoding};
///
/// let registry = DecodingRegistry::builder()
///     .register(JsonDecoding::new())
///     .build();
///
/// let decoding = registry.negotiate("application/vnd.api+json; charset=utf-8").unwrap();
/// assert!(decoding.accepts().iter().any(|t| t == "application/vnd.api+json"));
/// ```
#[derive(Clone, Default)]
pub struct DecodingRegistry {
	decodings: Vec<Arc<dyn Decoding>>,
	/// Accepted content type and the index of its decoding
	offers: Vec<(String, usize)>,
}

impl fmt::Debug for DecodingRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DecodingRegistry")
			.field("accepts", &self.accepts())
			.finish()
	}
}

/// Collects decodings in preference order
#[derive(Default)]
pub struct DecodingRegistryBuilder {
	decodings: Vec<Arc<dyn Decoding>>,
}

impl DecodingRegistryBuilder {
	/// Appends a decoding; earlier registrations are preferred
	pub fn register<D: Decoding + 'static>(self, decoding: D) -> Self {
		self.register_shared(Arc::new(decoding))
	}

	/// Appends a decoding that is already shared elsewhere
	pub fn register_shared(mut self, decoding: Arc<dyn Decoding>) -> Self {
		self.decodings.push(decoding);
		self
	}

	/// Flattens the accepted content types into offers
	///
	/// A content type accepted by more than one decoding stays with the
	/// earliest one.
	pub fn build(self) -> DecodingRegistry {
		let mut offers: Vec<(String, usize)> = Vec::new();

		for (owner, decoding) in self.decodings.iter().enumerate() {
			for accepted in decoding.accepts() {
				let accepted = accepted.trim();
				if accepted.is_empty() {
					continue;
				}
				if let Some((_, earlier)) = offers
					.iter()
					.find(|(existing, _)| existing.eq_ignore_ascii_case(accepted))
				{
					tracing::warn!(
						content_type = accepted,
						kept = *earlier,
						ignored = owner,
						"content type accepted by several decodings"
					);
					continue;
				}
				offers.push((accepted.to_string(), owner));
			}
		}

		tracing::debug!(count = self.decodings.len(), offers = offers.len(), "decoding registry built");
		DecodingRegistry {
			decodings: self.decodings,
			offers,
		}
	}
}

impl DecodingRegistry {
	/// Starts an empty builder
	pub fn builder() -> DecodingRegistryBuilder {
		DecodingRegistryBuilder::default()
	}

	/// Every accepted content type in preference order
	pub fn accepts(&self) -> Vec<&str> {
		self.offers.iter().map(|(accepted, _)| accepted.as_str()).collect()
	}

	/// Number of registered decodings
	pub fn len(&self) -> usize {
		self.decodings.len()
	}

	/// Whether no decoding is registered
	pub fn is_empty(&self) -> bool {
		self.decodings.is_empty()
	}

	/// Iterates over the decodings in registration order
	pub fn iter(&self) -> impl Iterator<Item = &dyn Decoding> {
		self.decodings.iter().map(|d| d.as_ref())
	}

	/// Picks the decoding for a `Content-Type` header value
	///
	/// Parameters after `;` are ignored. Falls back to the decoding owning
	/// the default offer when nothing matches. Returns `None` only when no
	/// decoding accepts anything.
	pub fn negotiate(&self, content_type: &str) -> Option<&dyn Decoding> {
		let (_, default_owner) = self.offers.first()?;
		let owner = self.strict_owner(content_type).unwrap_or(*default_owner);
		Some(self.decodings[owner].as_ref())
	}

	/// Like [`negotiate`](Self::negotiate) but without the fallback
	///
	/// An empty content type still selects the default decoding.
	pub fn negotiate_strict(&self, content_type: &str) -> Option<&dyn Decoding> {
		self.strict_owner(content_type)
			.map(|owner| self.decodings[owner].as_ref())
	}

	fn strict_owner(&self, content_type: &str) -> Option<usize> {
		let (essence, _) = parse_value_and_params(content_type);

		let accepts = self.accepts();
		let winner = select_str(&essence, &accepts)?;
		tracing::trace!(content_type = %essence, accepted = accepts[winner.offer_index], "decoding selected");
		Some(self.offers[winner.offer_index].1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::coding::{Decoder, Encoder, JsonDecoding, JsonEncoding};
	use crate::error::CodingResult;
	use rstest::rstest;
	use serde_json::Value;
	use std::io::{Read, Write};

	/// Accepts arbitrary types and decodes nothing
	#[derive(Debug)]
	struct Named(Vec<String>);

	impl Decoding for Named {
		fn accepts(&self) -> &[String] {
			&self.0
		}

		fn decoder<'r>(&self, _source: &'r mut dyn Read) -> Box<dyn Decoder + 'r> {
			Box::new(Nothing)
		}
	}

	struct Nothing;

	impl Decoder for Nothing {
		fn decode(&mut self) -> CodingResult<Value> {
			Ok(Value::Null)
		}
	}

	/// Produces an arbitrary type and writes nothing
	struct Produces(&'static str);

	impl Encoding for Produces {
		fn produces(&self) -> &str {
			self.0
		}

		fn encoder<'w>(&self, _sink: &'w mut dyn Write) -> Box<dyn Encoder + 'w> {
			Box::new(Silent)
		}
	}

	struct Silent;

	impl Encoder for Silent {
		fn encode(&mut self, _value: &Value) -> CodingResult<()> {
			Ok(())
		}
	}

	fn named(types: &[&str]) -> Named {
		Named(types.iter().map(|t| t.to_string()).collect())
	}

	fn encodings(types: &[&'static str]) -> EncodingRegistry {
		types
			.iter()
			.fold(EncodingRegistry::builder(), |builder, &t| builder.register(Produces(t)))
			.build()
			.unwrap()
	}

	#[rstest]
	fn test_duplicate_producer_is_rejected() {
		// Arrange
		let builder = EncodingRegistry::builder()
			.register(Produces("application/json"))
			.register(Produces("text/xml"))
			.register(Produces("Application/JSON"));

		// Act
		let err = builder.build().unwrap_err();

		// Assert
		assert_eq!(
			err,
			RegistryError::DuplicateProducer {
				content_type: "Application/JSON".to_string(),
				first: 0,
				second: 2,
			}
		);
	}

	#[rstest]
	fn test_empty_producer_is_rejected() {
		let err = EncodingRegistry::builder()
			.register(JsonEncoding::new())
			.register(Produces(" "))
			.build()
			.unwrap_err();

		assert_eq!(err, RegistryError::EmptyProducer(1));
	}

	#[rstest]
	#[case("", "application/json")]
	#[case("text/xml", "text/xml")]
	#[case("text/*", "text/xml")]
	#[case("text/xml;q=0.5, application/json;q=0.9", "application/json")]
	#[case("image/png", "application/json")]
	#[case("*/*;q=0", "application/json")]
	fn test_encoding_negotiate(#[case] accept: &str, #[case] expected: &str) {
		let registry = encodings(&["application/json", "text/xml"]);

		let chosen = registry.negotiate(accept).unwrap();

		assert_eq!(chosen.produces(), expected);
	}

	#[rstest]
	#[case("image/png")]
	#[case("application/json;q=0, text/xml;q=0")]
	fn test_encoding_negotiate_strict_rejects(#[case] accept: &str) {
		let registry = encodings(&["application/json", "text/xml"]);
		assert!(registry.negotiate_strict(accept).is_none());
	}

	#[rstest]
	fn test_empty_encoding_registry() {
		let registry = EncodingRegistry::builder().build().unwrap();

		assert!(registry.is_empty());
		assert!(registry.negotiate("application/json").is_none());
	}

	#[rstest]
	#[case("application/json", 0)]
	#[case("application/vnd.api+json; charset=utf-8", 0)]
	#[case("text/xml", 1)]
	#[case("TEXT/XML ; charset=utf-8", 1)]
	#[case("application/xml", 1)]
	#[case("", 0)]
	#[case("foo/bar", 0)]
	fn test_decoding_negotiate(#[case] content_type: &str, #[case] expected: usize) {
		// Arrange
		let registry = DecodingRegistry::builder()
			.register(JsonDecoding::new())
			.register(named(&["application/xml", "text/xml"]))
			.build();
		let expected_accepts = registry.iter().nth(expected).unwrap().accepts().to_vec();

		// Act
		let chosen = registry.negotiate(content_type).unwrap();

		// Assert
		assert_eq!(chosen.accepts(), expected_accepts.as_slice());
	}

	#[rstest]
	fn test_decoding_negotiate_strict() {
		let registry = DecodingRegistry::builder().register(JsonDecoding::new()).build();

		assert!(registry.negotiate_strict("foo/bar").is_none());
		assert!(registry.negotiate_strict("application/json").is_some());
	}

	#[rstest]
	fn test_duplicate_accepted_type_stays_with_first() {
		let registry = DecodingRegistry::builder()
			.register(named(&["a/b"]))
			.register(named(&["c/d", "A/B"]))
			.build();

		assert_eq!(registry.accepts(), vec!["a/b", "c/d"]);
		assert_eq!(registry.negotiate("c/d").unwrap().accepts(), ["c/d", "A/B"]);
		assert_eq!(registry.negotiate("a/b").unwrap().accepts(), ["a/b"]);
	}

	#[rstest]
	fn test_default_skips_decodings_without_types() {
		let registry = DecodingRegistry::builder()
			.register(named(&[]))
			.register(named(&["x/y"]))
			.build();

		assert_eq!(registry.len(), 2);
		assert_eq!(registry.negotiate("foo/bar").unwrap().accepts(), ["x/y"]);
	}

	#[rstest]
	fn test_empty_decoding_registry() {
		let registry = DecodingRegistry::builder().build();
		assert!(registry.negotiate("application/json").is_none());
	}
}
