//! JSON codec

use super::{Decoder, Decoding, Encoder, Encoding};
use crate::error::{CodingError, CodingResult};
use serde_json::Value;
use serde_json::de::IoRead;
use std::io::{Read, Write};

/// JSON:API media type, accepted alongside plain JSON
pub const JSON_API: &str = "application/vnd.api+json";

/// Encoding producing `application/json`
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::coding::{Encoding, JsonEncoding};
///
/// let encoding = JsonEncoding::new();
/// assert_eq!(encoding.produces(), "application/json");
///
/// let encoding = JsonEncoding::new().with_produces("application/problem+json");
/// assert_eq!(encoding.produces(), "application/problem+json");
/// ```
#[derive(Debug, Clone)]
pub struct JsonEncoding {
	produces: String,
	pretty: bool,
}

impl Default for JsonEncoding {
	fn default() -> Self {
		Self {
			produces: mime::APPLICATION_JSON.essence_str().to_string(),
			pretty: false,
		}
	}
}

impl JsonEncoding {
	/// Creates a compact JSON encoding
	pub fn new() -> Self {
		Self::default()
	}

	/// Overrides the produced content type
	pub fn with_produces(mut self, content_type: impl Into<String>) -> Self {
		self.produces = content_type.into();
		self
	}

	/// Enables pretty printing
	pub fn pretty(mut self, pretty: bool) -> Self {
		self.pretty = pretty;
		self
	}
}

impl Encoding for JsonEncoding {
	fn produces(&self) -> &str {
		&self.produces
	}

	fn encoder<'w>(&self, sink: &'w mut dyn Write) -> Box<dyn Encoder + 'w> {
		Box::new(JsonEncoder {
			sink,
			pretty: self.pretty,
		})
	}
}

struct JsonEncoder<'w> {
	sink: &'w mut dyn Write,
	pretty: bool,
}

impl Encoder for JsonEncoder<'_> {
	fn encode(&mut self, value: &Value) -> CodingResult<()> {
		if self.pretty {
			serde_json::to_writer_pretty(&mut *self.sink, value)?;
		} else {
			serde_json::to_writer(&mut *self.sink, value)?;
		}
		// Newline-delimited so consecutive values stay separable
		self.sink.write_all(b"\n")?;
		Ok(())
	}
}

/// Decoding for JSON request bodies
///
/// Accepts `application/json` and `application/vnd.api+json` by default.
#[derive(Debug, Clone)]
pub struct JsonDecoding {
	accepts: Vec<String>,
}

impl Default for JsonDecoding {
	fn default() -> Self {
		Self {
			accepts: vec![
				mime::APPLICATION_JSON.essence_str().to_string(),
				JSON_API.to_string(),
			],
		}
	}
}

impl JsonDecoding {
	/// Creates the decoding with the default accepted types
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the accepted content types
	pub fn with_accepts<I, S>(mut self, accepts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.accepts = accepts.into_iter().map(Into::into).collect();
		self
	}
}

impl Decoding for JsonDecoding {
	fn accepts(&self) -> &[String] {
		&self.accepts
	}

	fn decoder<'r>(&self, source: &'r mut dyn Read) -> Box<dyn Decoder + 'r> {
		Box::new(JsonDecoder {
			stream: serde_json::Deserializer::from_reader(source).into_iter(),
		})
	}
}

/// Reads consecutive JSON values from one source
struct JsonDecoder<'r> {
	stream: serde_json::StreamDeserializer<'r, IoRead<&'r mut dyn Read>, Value>,
}

impl Decoder for JsonDecoder<'_> {
	fn decode(&mut self) -> CodingResult<Value> {
		match self.stream.next() {
			Some(result) => Ok(result?),
			None => Err(CodingError::Exhausted),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::{Deserialize, Serialize};
	use serde_json::json;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Idea {
		title: String,
		votes: u32,
	}

	#[rstest]
	fn test_encode_compact() {
		let mut sink = Vec::new();
		JsonEncoding::new()
			.encoder(&mut sink)
			.encode(&json!({"title": "a"}))
			.unwrap();

		assert_eq!(sink, b"{\"title\":\"a\"}\n");
	}

	#[rstest]
	fn test_encode_pretty() {
		let mut sink = Vec::new();
		JsonEncoding::new()
			.pretty(true)
			.encoder(&mut sink)
			.encode(&json!({"title": "a"}))
			.unwrap();

		assert_eq!(String::from_utf8(sink).unwrap(), "{\n  \"title\": \"a\"\n}\n");
	}

	#[rstest]
	fn test_encode_serialize_typed_value() {
		let idea = Idea {
			title: "negotiate".into(),
			votes: 3,
		};
		let mut sink = Vec::new();
		{
			let mut encoder = JsonEncoding::new().encoder(&mut sink);
			encoder.encode_serialize(&idea).unwrap();
		}

		let decoded: Idea = serde_json::from_slice(&sink).unwrap();
		assert_eq!(decoded, idea);
	}

	#[rstest]
	fn test_decode_stream_of_values() {
		let mut body: &[u8] = b"{\"title\":\"a\",\"votes\":1} {\"title\":\"b\",\"votes\":2}";
		let decoding = JsonDecoding::new();
		let mut decoder = decoding.decoder(&mut body);

		let first: Idea = decoder.decode_into().unwrap();
		let second: Idea = decoder.decode_into().unwrap();

		assert_eq!(first.title, "a");
		assert_eq!(second.votes, 2);
		assert!(matches!(decoder.decode(), Err(CodingError::Exhausted)));
	}

	#[rstest]
	fn test_decode_invalid_json() {
		let mut body: &[u8] = b"{\"invalid\": json}";
		let decoding = JsonDecoding::new();

		let result = decoding.decoder(&mut body).decode();

		assert!(matches!(result, Err(CodingError::Json(_))));
	}

	#[rstest]
	fn test_default_accepts() {
		let decoding = JsonDecoding::new();
		assert_eq!(decoding.accepts(), ["application/json", "application/vnd.api+json"]);
	}

	#[rstest]
	fn test_with_accepts() {
		let decoding = JsonDecoding::new().with_accepts(["application/x-ndjson"]);
		assert_eq!(decoding.accepts(), ["application/x-ndjson"]);
	}
}
