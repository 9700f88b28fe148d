//! URL-encoded form codec

use super::{Decoder, Decoding};
use crate::error::{CodingError, CodingResult};
use serde_json::{Map, Value};
use std::io::Read;

/// Decoding for `application/x-www-form-urlencoded` bodies
///
/// Each field becomes a string member of the decoded object. A field that
/// occurs more than once becomes an array of its values, in body order.
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::coding::{Decoding, FormDecoding};
/// use serde_json::json;
///
/// let mut body: &[u8] = b"title=negotiate&tag=http&tag=rust";
/// let value = FormDecoding::new().decoder(&mut body).decode().unwrap();
///
/// assert_eq!(value, json!({"title": "negotiate", "tag": ["http", "rust"]}));
/// ```
#[derive(Debug, Clone)]
pub struct FormDecoding {
	accepts: Vec<String>,
}

impl Default for FormDecoding {
	fn default() -> Self {
		Self {
			accepts: vec![mime::APPLICATION_WWW_FORM_URLENCODED.essence_str().to_string()],
		}
	}
}

impl FormDecoding {
	/// Creates the decoding for URL-encoded forms
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

impl Decoding for FormDecoding {
	fn accepts(&self) -> &[String] {
		&self.accepts
	}

	fn decoder<'r>(&self, source: &'r mut dyn Read) -> Box<dyn Decoder + 'r> {
		Box::new(FormDecoder {
			source,
			done: false,
		})
	}
}

/// A form body holds exactly one value
struct FormDecoder<'r> {
	source: &'r mut dyn Read,
	done: bool,
}

impl Decoder for FormDecoder<'_> {
	fn decode(&mut self) -> CodingResult<Value> {
		if self.done {
			return Err(CodingError::Exhausted);
		}
		self.done = true;

		let mut body = Vec::new();
		self.source.read_to_end(&mut body)?;

		let pairs: Vec<(String, String)> =
			serde_urlencoded::from_bytes(&body).map_err(|e| CodingError::Form(e.to_string()))?;

		let mut fields = Map::new();
		for (key, value) in pairs {
			let value = Value::String(value);
			match fields.get_mut(&key) {
				Some(Value::Array(values)) => values.push(value),
				Some(existing) => {
					let first = existing.take();
					*existing = Value::Array(vec![first, value]);
				}
				None => {
					fields.insert(key, value);
				}
			}
		}
		Ok(Value::Object(fields))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::Deserialize;
	use serde_json::json;

	fn decode(body: &str) -> CodingResult<Value> {
		let mut source = body.as_bytes();
		FormDecoding::new().decoder(&mut source).decode()
	}

	#[rstest]
	#[case("", json!({}))]
	#[case("a=1", json!({"a": "1"}))]
	#[case("a=1&b=two+words", json!({"a": "1", "b": "two words"}))]
	#[case("name=%E6%97%A5%E6%9C%AC", json!({"name": "日本"}))]
	#[case("k=1&k=2&k=3", json!({"k": ["1", "2", "3"]}))]
	#[case("flag", json!({"flag": ""}))]
	fn test_decode(#[case] body: &str, #[case] expected: Value) {
		assert_eq!(decode(body).unwrap(), expected);
	}

	#[rstest]
	fn test_decode_into_struct() {
		#[derive(Debug, Deserialize, PartialEq)]
		struct Login {
			username: String,
			remember: String,
		}
		let mut source: &[u8] = b"username=ada&remember=on";
		let decoding = FormDecoding::new();
		let mut decoder = decoding.decoder(&mut source);

		let login: Login = decoder.decode_into().unwrap();

		assert_eq!(login.username, "ada");
		assert_eq!(login.remember, "on");
		assert!(matches!(decoder.decode(), Err(CodingError::Exhausted)));
	}

	#[rstest]
	fn test_default_accepts() {
		assert_eq!(FormDecoding::new().accepts(), ["application/x-www-form-urlencoded"]);
	}
}
