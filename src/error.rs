//! Error types for content negotiation.
//!
//! The negotiation engine itself is infallible: malformed preference headers
//! degrade to conservative defaults and "no match" is a value, not an error.
//! The types here cover the layers around it: registry construction, codec
//! I/O, request-level selection and settings.

use http::StatusCode;
use thiserror::Error;

/// Errors detected while building a codec registry.
///
/// These are configuration errors discovered at startup, never per-request
/// conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	/// Two encodings declare the same produced content type.
	#[error(
		"multiple encodings are registered to produce the same content type: {content_type} (positions {first} and {second})"
	)]
	DuplicateProducer {
		/// The content type both encodings produce.
		content_type: String,
		/// Registration position of the first encoding.
		first: usize,
		/// Registration position of the conflicting encoding.
		second: usize,
	},

	/// An encoding declared an empty produced content type.
	#[error("encoding at position {0} produces an empty content type")]
	EmptyProducer(usize),
}

/// Errors raised by encoders and decoders.
#[derive(Debug, Error)]
pub enum CodingError {
	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// XML reading or writing failed.
	#[error("XML error: {0}")]
	Xml(String),

	/// URL-encoded form data could not be decoded.
	#[error("Form error: {0}")]
	Form(String),

	/// I/O operation on the sink or source failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// The value cannot be represented by this codec.
	#[error("Unsupported value: {0}")]
	UnsupportedValue(String),

	/// The decoder has already consumed its source.
	#[error("Decoder exhausted")]
	Exhausted,
}

/// Result type alias for codec operations.
pub type CodingResult<T> = Result<T, CodingError>;

/// Errors produced by request-level encoder/decoder selection.
#[derive(Debug, Error)]
pub enum NegotiationError {
	/// The request body is relevant but no registered decoding accepts it.
	#[error("unsupported request content: {0}")]
	Unsupported(String),

	/// No registered encoding produces anything the client accepts.
	#[error("not acceptable: {0}")]
	Unacceptable(String),

	/// The server has no codecs configured for a step that needs one.
	#[error("server misconfiguration: {0}")]
	Misconfigured(String),

	/// Peeking the request body failed.
	#[error("failed to read request body: {0}")]
	Io(#[from] std::io::Error),
}

impl NegotiationError {
	/// Returns the HTTP status a response layer would typically render.
	///
	/// # Examples
	///
	/// ```
	/// use http::StatusCode;
	/// use reinhardt_negotiation::error::NegotiationError;
	///
	/// let err = NegotiationError::Unacceptable("text/csv".to_string());
	/// assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
	/// ```
	pub fn status_code(&self) -> StatusCode {
		match self {
			NegotiationError::Unsupported(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
			NegotiationError::Unacceptable(_) => StatusCode::NOT_ACCEPTABLE,
			NegotiationError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
			NegotiationError::Io(_) => StatusCode::BAD_REQUEST,
		}
	}

	/// Whether the error is the client's fault (4xx).
	pub fn is_client_error(&self) -> bool {
		self.status_code().is_client_error()
	}
}

/// Result type alias for request-level negotiation.
pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// Errors raised while loading or validating [`crate::settings::NegotiationSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
	/// The TOML document could not be parsed.
	#[error("Parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A setting has an invalid value.
	#[error("Invalid setting {field}: {message}")]
	Invalid {
		/// Offending setting name.
		field: &'static str,
		/// What is wrong with it.
		message: String,
	},
}
