//! Request-level codec selection
//!
//! These functions decide, for one request, which decoder reads its body and
//! which encoding writes the response. Unlike the registries they are
//! strict: a body nobody can decode or an `Accept` header nothing satisfies
//! is reported as a [`NegotiationError`] carrying the matching HTTP status.
//!
//! # Examples
//!
//! ```
//! use http::{HeaderMap, Method};
//! use reinhardt_negotiation::buffer::PeekReader;
//! use reinhardt_negotiation::coding::{DecodingRegistry, JsonDecoding};
//! use reinhardt_negotiation::request::negotiate_decoder;
//! use reinhardt_negotiation::settings::NegotiationSettings;
//! use serde_json::json;
//!
//! let decodings = DecodingRegistry::builder().register(JsonDecoding::new()).build();
//! let settings = NegotiationSettings::default();
//! let mut body = PeekReader::new(&br#"{"title": "sniffed"}"#[..]);
//!
//! // No Content-Type: the body is sniffed as JSON
//! let mut decoder = negotiate_decoder(&Method::POST, &HeaderMap::new(), &mut body, &decodings, &settings)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(decoder.decode().unwrap(), json!({"title": "sniffed"}));
//! ```

use crate::buffer::PeekReader;
use crate::coding::{Decoder, DecodingRegistry, Encoding, EncodingRegistry};
use crate::error::{NegotiationError, NegotiationResult};
use crate::language::LanguageNegotiator;
use crate::negotiate::header_value;
use crate::settings::NegotiationSettings;
use crate::sniff::{SNIFF_LEN, sniff};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, Method};
use std::io::Read;

/// Selects the decoder for a request body
///
/// Returns `Ok(None)` when the body should be ignored: for `GET` and `HEAD`
/// requests and for empty bodies. Otherwise the declared `Content-Type`
/// (or, when absent and sniffing is enabled, the sniffed type) must be
/// accepted by one of the decodings.
///
/// Up to `settings.peek_size` bytes are peeked, clamped to
/// `1..=`[`SNIFF_LEN`]; the returned decoder still sees the complete body.
pub fn negotiate_decoder<'r, R: Read + 'r>(
	method: &Method,
	headers: &HeaderMap,
	body: &'r mut PeekReader<R>,
	decodings: &DecodingRegistry,
	settings: &NegotiationSettings,
) -> NegotiationResult<Option<Box<dyn Decoder + 'r>>> {
	if method == Method::GET || method == Method::HEAD {
		tracing::trace!(%method, "ignoring request body");
		return Ok(None);
	}

	let peek_size = settings.peek_size.clamp(1, SNIFF_LEN);
	if peek_size != settings.peek_size {
		tracing::debug!(configured = settings.peek_size, peek_size, "peek size clamped");
	}

	let peeked = body.peek(peek_size)?;
	if peeked.is_empty() {
		tracing::trace!(%method, "empty request body");
		return Ok(None);
	}

	if decodings.is_empty() {
		return Err(NegotiationError::Unsupported(
			"request has a body but no decodings are configured".to_string(),
		));
	}

	let declared = headers
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty());

	let content_type = match declared {
		Some(declared) => declared,
		None if settings.sniff_bodies => {
			let sniffed = sniff(peeked);
			tracing::debug!(content_type = sniffed, "sniffed request body");
			sniffed
		}
		None => "",
	};

	let Some(decoding) = decodings.negotiate_strict(content_type) else {
		tracing::warn!(content_type, accepts = ?decodings.accepts(), "no decoding accepts request body");
		return Err(NegotiationError::Unsupported(format!(
			"no configured decoding accepts `{content_type}`"
		)));
	};

	Ok(Some(decoding.decoder(body)))
}

/// Selects the encoding for a response
///
/// A missing or blank `Accept` header selects the first encoding. All
/// `Accept` lines of the request are considered together.
pub fn negotiate_encoder<'a>(
	headers: &HeaderMap,
	encodings: &'a EncodingRegistry,
) -> NegotiationResult<&'a dyn Encoding> {
	if encodings.is_empty() {
		tracing::error!("response encoding requested but no encodings are configured");
		return Err(NegotiationError::Misconfigured(
			"no encodings configured".to_string(),
		));
	}

	let accept = header_value(headers, ACCEPT);
	match encodings.negotiate_strict(&accept) {
		Some(encoding) => Ok(encoding),
		None => {
			tracing::debug!(accept, produces = ?encodings.produces(), "no acceptable encoding");
			Err(NegotiationError::Unacceptable(format!(
				"no configured encoding produces anything matching `{accept}`"
			)))
		}
	}
}

/// Codecs, languages and settings negotiated together for each request
///
/// # Examples
///
/// ```
/// use http::{HeaderMap, HeaderValue, header::{ACCEPT, ACCEPT_LANGUAGE}};
/// use reinhardt_negotiation::coding::{DecodingRegistry, EncodingRegistry, JsonEncoding};
/// use reinhardt_negotiation::request::ContentNegotiator;
/// use reinhardt_negotiation::settings::NegotiationSettings;
///
/// let negotiator = ContentNegotiator::new(
///     EncodingRegistry::builder().register(JsonEncoding::new()).build().unwrap(),
///     DecodingRegistry::default(),
///     NegotiationSettings::default().with_languages(["en", "nl"]),
/// );
///
/// let mut headers = HeaderMap::new();
/// headers.insert(ACCEPT, HeaderValue::from_static("application/*"));
/// headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("nl, en;q=0.5"));
///
/// assert_eq!(negotiator.encoding(&headers).unwrap().produces(), "application/json");
/// assert_eq!(negotiator.language(&headers), "nl");
/// ```
#[derive(Debug, Clone)]
pub struct ContentNegotiator {
	encodings: EncodingRegistry,
	decodings: DecodingRegistry,
	languages: LanguageNegotiator,
	settings: NegotiationSettings,
}

impl ContentNegotiator {
	/// Bundles the registries with their settings
	pub fn new(
		encodings: EncodingRegistry,
		decodings: DecodingRegistry,
		settings: NegotiationSettings,
	) -> Self {
		Self {
			languages: LanguageNegotiator::from_settings(&settings),
			encodings,
			decodings,
			settings,
		}
	}

	/// See [`negotiate_decoder`]
	pub fn decoder<'r, R: Read + 'r>(
		&self,
		method: &Method,
		headers: &HeaderMap,
		body: &'r mut PeekReader<R>,
	) -> NegotiationResult<Option<Box<dyn Decoder + 'r>>> {
		negotiate_decoder(method, headers, body, &self.decodings, &self.settings)
	}

	/// See [`negotiate_encoder`]
	pub fn encoding(&self, headers: &HeaderMap) -> NegotiationResult<&dyn Encoding> {
		negotiate_encoder(headers, &self.encodings)
	}

	/// Best configured language for the request's `Accept-Language` lines
	pub fn language(&self, headers: &HeaderMap) -> String {
		self.languages.negotiate_headers(headers)
	}

	/// The encoding registry
	pub fn encodings(&self) -> &EncodingRegistry {
		&self.encodings
	}

	/// The decoding registry
	pub fn decodings(&self) -> &DecodingRegistry {
		&self.decodings
	}

	/// The settings the negotiator was built with
	pub fn settings(&self) -> &NegotiationSettings {
		&self.settings
	}
}
