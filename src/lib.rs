//! # Reinhardt Negotiation
//!
//! HTTP content negotiation for the Reinhardt framework: picking the best
//! representation for a client's `Accept`, `Accept-Encoding` or
//! `Accept-Language` preferences, and picking the right decoder for a
//! request body.
//!
//! ## Layers
//!
//! - **accept**: parses preference headers into ranges with quality values
//! - **specificity**: decides whether a range matches an offer, and how precisely
//! - **negotiate**: selects the winning offer (quality, then specificity, then server order)
//! - **sniff** / **buffer**: guesses a body's content type from its first bytes without consuming it
//! - **coding**: JSON, XML and form codecs plus registries mapping content types to them
//! - **request**: per-request decoder and encoder selection with HTTP-status errors
//! - **language**: `Accept-Language` negotiation over configured languages
//!
//! ## Feature Flags
//!
//! - `xml` (default) - XML codec via `quick-xml`
//! - `form` (default) - URL-encoded form decoding via `serde_urlencoded`
//! - `full` - All of the above
//!
//! ## Quick Example
//!
//! ```
//! use reinhardt_negotiation::negotiate;
//!
//! let offers = ["application/json", "text/html"];
//! let chosen = negotiate("text/html;q=0.9, application/*;q=0.8", &offers, "");
//! assert_eq!(chosen, "text/html");
//!
//! // Nothing acceptable: the default is returned
//! assert_eq!(negotiate("image/png", &offers, "application/json"), "application/json");
//! ```

pub mod accept;
pub mod buffer;
pub mod coding;
pub mod error;
pub mod language;
pub mod negotiate;
pub mod request;
pub mod settings;
pub mod sniff;
pub mod specificity;

pub use accept::{AcceptHeader, RangeEntry};
pub use buffer::PeekReader;
pub use coding::{
	Decoder, Decoding, DecodingRegistry, Encoder, Encoding, EncodingRegistry, JsonDecoding,
	JsonEncoding,
};
pub use error::{
	CodingError, CodingResult, NegotiationError, NegotiationResult, RegistryError, SettingsError,
};
pub use language::LanguageNegotiator;
pub use negotiate::{negotiate, negotiate_header};
pub use request::{ContentNegotiator, negotiate_decoder, negotiate_encoder};
pub use settings::NegotiationSettings;
pub use sniff::{detect_content_type, sniff};
pub use specificity::Specificity;

#[cfg(feature = "form")]
pub use coding::FormDecoding;
#[cfg(feature = "xml")]
pub use coding::{XmlDecoding, XmlEncoding};
