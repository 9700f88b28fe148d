//! XML codec
//!
//! Values map onto XML the same way in both directions:
//!
//! - the document element is named by [`XmlEncoding::with_root`] and its
//!   content is the value itself,
//! - object keys become child elements, except keys prefixed with `@`
//!   (attributes) and the `#text` key (character data),
//! - arrays under a key become repeated sibling elements, top-level arrays
//!   become repeated `<item>` children,
//! - scalars become character data and `null` an empty element.
//!
//! Decoding reverses this. Character data is always decoded as a string.

use super::{Decoder, Decoding, Encoder, Encoding};
use crate::error::{CodingError, CodingResult};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};
use std::fmt::Display;
use std::io::{Read, Write};

const ATTRIBUTE_PREFIX: &str = "@";
const TEXT_KEY: &str = "#text";
const ITEM_ELEMENT: &str = "item";

fn xml_error(err: impl Display) -> CodingError {
	CodingError::Xml(err.to_string())
}

/// Encoding producing `application/xml`
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::coding::{Encoding, XmlEncoding};
/// use serde_json::json;
///
/// let encoding = XmlEncoding::new().with_root("idea");
/// let mut body = Vec::new();
/// encoding
///     .encoder(&mut body)
///     .encode(&json!({"@id": 7, "title": "negotiate"}))
///     .unwrap();
///
/// assert_eq!(
///     String::from_utf8(body).unwrap(),
///     r#"<idea id="7"><title>negotiate</title></idea>"#
/// );
/// ```
#[derive(Debug, Clone)]
pub struct XmlEncoding {
	produces: String,
	root: String,
}

impl Default for XmlEncoding {
	fn default() -> Self {
		Self {
			produces: "application/xml".to_string(),
			root: "root".to_string(),
		}
	}
}

impl XmlEncoding {
	/// Creates an encoding with a `<root>` document element
	pub fn new() -> Self {
		Self::default()
	}

	/// Overrides the produced content type
	pub fn with_produces(mut self, content_type: impl Into<String>) -> Self {
		self.produces = content_type.into();
		self
	}

	/// Names the document element
	pub fn with_root(mut self, root: impl Into<String>) -> Self {
		self.root = root.into();
		self
	}
}

impl Encoding for XmlEncoding {
	fn produces(&self) -> &str {
		&self.produces
	}

	fn encoder<'w>(&self, sink: &'w mut dyn Write) -> Box<dyn Encoder + 'w> {
		Box::new(XmlEncoder {
			writer: Writer::new(sink),
			root: self.root.clone(),
		})
	}
}

struct XmlEncoder<'w> {
	writer: Writer<&'w mut dyn Write>,
	root: String,
}

impl Encoder for XmlEncoder<'_> {
	fn encode(&mut self, value: &Value) -> CodingResult<()> {
		match value {
			Value::Array(items) => {
				write_start(&mut self.writer, &self.root, None)?;
				for item in items {
					write_element(&mut self.writer, ITEM_ELEMENT, item)?;
				}
				write_end(&mut self.writer, &self.root)
			}
			other => write_element(&mut self.writer, &self.root, other),
		}
	}
}

/// Rejects keys that cannot be used as element or attribute names
fn check_name(name: &str) -> CodingResult<()> {
	let mut chars = name.chars();
	let valid = chars
		.next()
		.is_some_and(|first| first.is_alphabetic() || first == '_')
		&& chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));

	if valid {
		Ok(())
	} else {
		Err(CodingError::UnsupportedValue(format!(
			"`{name}` is not a valid XML name"
		)))
	}
}

fn scalar_text(value: &Value) -> CodingResult<String> {
	match value {
		Value::String(s) => Ok(s.clone()),
		Value::Number(n) => Ok(n.to_string()),
		Value::Bool(b) => Ok(b.to_string()),
		Value::Null => Ok(String::new()),
		Value::Array(_) | Value::Object(_) => Err(CodingError::UnsupportedValue(
			"attributes and text must be scalar".to_string(),
		)),
	}
}

fn write_start(
	writer: &mut Writer<&mut dyn Write>,
	name: &str,
	attributes: Option<&Map<String, Value>>,
) -> CodingResult<()> {
	let start = start_tag(name, attributes)?;
	writer.write_event(Event::Start(start)).map_err(xml_error)
}

fn write_end(writer: &mut Writer<&mut dyn Write>, name: &str) -> CodingResult<()> {
	writer
		.write_event(Event::End(BytesEnd::new(name)))
		.map_err(xml_error)
}

fn start_tag<'a>(name: &'a str, attributes: Option<&Map<String, Value>>) -> CodingResult<BytesStart<'a>> {
	check_name(name)?;
	let mut start = BytesStart::new(name);

	for (key, value) in attributes.into_iter().flatten() {
		if let Some(attribute) = key.strip_prefix(ATTRIBUTE_PREFIX) {
			check_name(attribute)?;
			let text = scalar_text(value)?;
			start.push_attribute((attribute, text.as_str()));
		}
	}
	Ok(start)
}

fn write_element(writer: &mut Writer<&mut dyn Write>, name: &str, value: &Value) -> CodingResult<()> {
	match value {
		Value::Null => {
			let start = start_tag(name, None)?;
			writer.write_event(Event::Empty(start)).map_err(xml_error)
		}
		Value::Array(items) => {
			for item in items {
				write_element(writer, name, item)?;
			}
			Ok(())
		}
		Value::Object(map) => {
			let has_content = map.keys().any(|key| !key.starts_with(ATTRIBUTE_PREFIX));
			if !has_content {
				let start = start_tag(name, Some(map))?;
				return writer.write_event(Event::Empty(start)).map_err(xml_error);
			}

			write_start(writer, name, Some(map))?;
			for (key, child) in map {
				if key == TEXT_KEY {
					let text = scalar_text(child)?;
					writer
						.write_event(Event::Text(BytesText::new(&text)))
						.map_err(xml_error)?;
				} else if !key.starts_with(ATTRIBUTE_PREFIX) {
					write_element(writer, key, child)?;
				}
			}
			write_end(writer, name)
		}
		scalar => {
			let text = scalar_text(scalar)?;
			write_start(writer, name, None)?;
			writer
				.write_event(Event::Text(BytesText::new(&text)))
				.map_err(xml_error)?;
			write_end(writer, name)
		}
	}
}

/// Decoding for XML request bodies
///
/// Accepts `application/xml` and `text/xml` by default.
#[derive(Debug, Clone)]
pub struct XmlDecoding {
	accepts: Vec<String>,
}

impl Default for XmlDecoding {
	fn default() -> Self {
		Self {
			accepts: vec![
				"application/xml".to_string(),
				mime::TEXT_XML.essence_str().to_string(),
			],
		}
	}
}

impl XmlDecoding {
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

impl Decoding for XmlDecoding {
	fn accepts(&self) -> &[String] {
		&self.accepts
	}

	fn decoder<'r>(&self, source: &'r mut dyn Read) -> Box<dyn Decoder + 'r> {
		Box::new(XmlDecoder {
			source,
			done: false,
		})
	}
}

/// Reads a single document from the source
struct XmlDecoder<'r> {
	source: &'r mut dyn Read,
	done: bool,
}

impl Decoder for XmlDecoder<'_> {
	fn decode(&mut self) -> CodingResult<Value> {
		if self.done {
			return Err(CodingError::Exhausted);
		}
		self.done = true;

		let mut body = Vec::new();
		self.source.read_to_end(&mut body)?;
		parse_document(&body)
	}
}

/// Element being assembled while its children are read
struct Frame {
	name: String,
	fields: Map<String, Value>,
	text: String,
}

impl Frame {
	fn open(start: &BytesStart<'_>) -> CodingResult<Self> {
		let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
		let mut fields = Map::new();

		for attribute in start.attributes() {
			let attribute = attribute.map_err(xml_error)?;
			let key = format!(
				"{ATTRIBUTE_PREFIX}{}",
				String::from_utf8_lossy(attribute.key.as_ref())
			);
			let value = attribute.unescape_value().map_err(xml_error)?;
			fields.insert(key, Value::String(value.into_owned()));
		}

		Ok(Self {
			name,
			fields,
			text: String::new(),
		})
	}

	fn close(mut self) -> (String, Value) {
		let text = self.text.trim();
		let value = match (self.fields.is_empty(), text.is_empty()) {
			(true, true) => Value::Null,
			(true, false) => Value::String(text.to_string()),
			(false, true) => Value::Object(self.fields),
			(false, false) => {
				self.fields
					.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
				Value::Object(self.fields)
			}
		};
		(self.name, value)
	}
}

fn add_child(parent: &mut Map<String, Value>, name: String, value: Value) {
	match parent.get_mut(&name) {
		Some(Value::Array(items)) => items.push(value),
		Some(existing) => {
			let first = existing.take();
			*existing = Value::Array(vec![first, value]);
		}
		None => {
			parent.insert(name, value);
		}
	}
}

/// Converts a document into the content of its root element
fn parse_document(body: &[u8]) -> CodingResult<Value> {
	let mut reader = Reader::from_reader(body);
	let mut stack: Vec<Frame> = Vec::new();

	loop {
		match reader.read_event().map_err(xml_error)? {
			Event::Start(start) => stack.push(Frame::open(&start)?),
			Event::Empty(start) => {
				let (name, value) = Frame::open(&start)?.close();
				match stack.last_mut() {
					Some(parent) => add_child(&mut parent.fields, name, value),
					None => return Ok(value),
				}
			}
			Event::End(_) => {
				let Some(frame) = stack.pop() else {
					return Err(CodingError::Xml("unexpected closing tag".to_string()));
				};
				let (name, value) = frame.close();
				match stack.last_mut() {
					Some(parent) => add_child(&mut parent.fields, name, value),
					None => return Ok(value),
				}
			}
			Event::Text(text) => {
				if let Some(frame) = stack.last_mut() {
					frame.text.push_str(&text.xml_content().map_err(xml_error)?);
				}
			}
			Event::CData(data) => {
				if let Some(frame) = stack.last_mut() {
					frame
						.text
						.push_str(&String::from_utf8_lossy(data.into_inner().as_ref()));
				}
			}
			Event::GeneralRef(reference) => {
				if let Some(frame) = stack.last_mut() {
					let resolved = match reference.resolve_char_ref().map_err(xml_error)? {
						Some(ch) => ch.to_string(),
						None => {
							let name = reference.decode().map_err(xml_error)?;
							quick_xml::escape::resolve_predefined_entity(&name)
								.ok_or_else(|| CodingError::Xml(format!("unknown entity `{name}`")))?
								.to_string()
						}
					};
					frame.text.push_str(&resolved);
				}
			}
			Event::Eof => {
				return Err(CodingError::Xml(if stack.is_empty() {
					"document has no root element".to_string()
				} else {
					"unexpected end of document".to_string()
				}));
			}
			_ => {}
		}
	}
}
