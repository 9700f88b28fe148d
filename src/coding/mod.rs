//! Body encodings and decodings
//!
//! An [`Encoding`] produces exactly one content type and hands out
//! [`Encoder`]s bound to a response sink. A [`Decoding`] accepts one or more
//! content types and hands out [`Decoder`]s bound to a request body. The
//! registries in [`registry`] pick the right one for a request's `Accept` or
//! `Content-Type` header; they never look inside a codec.
//!
//! Values cross the codec boundary as [`serde_json::Value`]. Typed values go
//! through [`encode_serialize`](trait.Encoder.html#method.encode_serialize) and
//! [`decode_into`](trait.Decoder.html#method.decode_into).
//!
//! ## Example
//!
//! ```
//! use reinhardt_negotiation::coding::{EncodingRegistry, JsonEncoding};
//! use serde_json::json;
//!
//! let registry = EncodingRegistry::builder()
//!     .register(JsonEncoding::new())
//!     .build()
//!     .unwrap();
//!
//! let encoding = registry.negotiate("application/json").unwrap();
//! let mut body = Vec::new();
//! encoding.encoder(&mut body).encode(&json!({"ok": true})).unwrap();
//! assert_eq!(body, b"{\"ok\":true}\n");
//! ```

pub mod json;
pub mod registry;

#[cfg(feature = "form")]
pub mod form;
#[cfg(feature = "xml")]
pub mod xml;

use crate::error::CodingResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::{Read, Write};

pub use json::{JsonDecoding, JsonEncoding};
pub use registry::{DecodingRegistry, DecodingRegistryBuilder, EncodingRegistry, EncodingRegistryBuilder};

#[cfg(feature = "form")]
pub use form::FormDecoding;
#[cfg(feature = "xml")]
pub use xml::{XmlDecoding, XmlEncoding};

/// Serializes values into a response body
pub trait Encoder {
	/// Writes `value` to the sink
	fn encode(&mut self, value: &Value) -> CodingResult<()>;
}

impl dyn Encoder + '_ {
	/// Serializes any `Serialize` value through this encoder
	pub fn encode_serialize<T: Serialize + ?Sized>(&mut self, value: &T) -> CodingResult<()> {
		let value = serde_json::to_value(value)?;
		self.encode(&value)
	}
}

/// Deserializes values from a request body
pub trait Decoder {
	/// Reads the next value from the source
	fn decode(&mut self) -> CodingResult<Value>;
}

impl dyn Decoder + '_ {
	/// Decodes the next value into a concrete type
	pub fn decode_into<T: DeserializeOwned>(&mut self) -> CodingResult<T> {
		let value = self.decode()?;
		Ok(serde_json::from_value(value)?)
	}
}

/// Produces one content type
pub trait Encoding: Send + Sync {
	/// The content type written by this encoding's encoders
	fn produces(&self) -> &str;

	/// Creates an encoder writing to `sink`
	fn encoder<'w>(&self, sink: &'w mut dyn Write) -> Box<dyn Encoder + 'w>;
}

/// Consumes one or more content types
pub trait Decoding: Send + Sync {
	/// Content types (without parameters) this decoding understands
	fn accepts(&self) -> &[String];

	/// Creates a decoder reading from `source`
	fn decoder<'r>(&self, source: &'r mut dyn Read) -> Box<dyn Decoder + 'r>;
}
