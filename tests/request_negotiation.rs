//! Request-level decoder and encoder selection

#![cfg(all(feature = "xml", feature = "form"))]

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use reinhardt_negotiation::coding::{
	DecodingRegistry, EncodingRegistry, FormDecoding, JsonDecoding, JsonEncoding, XmlDecoding,
	XmlEncoding,
};
use reinhardt_negotiation::{
	ContentNegotiator, NegotiationError, NegotiationSettings, PeekReader, negotiate_decoder,
	negotiate_encoder,
};
use rstest::{fixture, rstest};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::Read;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Idea {
	title: String,
}

#[fixture]
fn decodings() -> DecodingRegistry {
	DecodingRegistry::builder()
		.register(JsonDecoding::new())
		.register(XmlDecoding::new())
		.register(FormDecoding::new())
		.build()
}

#[fixture]
fn encodings() -> EncodingRegistry {
	EncodingRegistry::builder()
		.register(JsonEncoding::new())
		.register(XmlEncoding::new().with_root("idea"))
		.build()
		.unwrap()
}

fn content_type(value: &'static str) -> HeaderMap {
	let mut headers = HeaderMap::new();
	headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
	headers
}

fn decode(
	headers: &HeaderMap,
	body: &[u8],
	decodings: &DecodingRegistry,
) -> Result<Option<Value>, NegotiationError> {
	let mut reader = PeekReader::new(body);
	let decoder = negotiate_decoder(
		&Method::POST,
		headers,
		&mut reader,
		decodings,
		&NegotiationSettings::default(),
	)?;
	Ok(decoder.map(|mut decoder| decoder.decode().unwrap()))
}

#[rstest]
#[case(HeaderMap::new(), br#"{"title": "json"}"#.as_slice(), json!({"title": "json"}))]
#[case(HeaderMap::new(), b"  [1, 2]".as_slice(), json!([1, 2]))]
#[case(HeaderMap::new(), b"<idea><title>xml</title></idea>".as_slice(), json!({"title": "xml"}))]
#[case(content_type("application/json; charset=utf-8"), br#"{"title": "declared"}"#.as_slice(), json!({"title": "declared"}))]
#[case(content_type("text/xml"), b"<idea><title>declared</title></idea>".as_slice(), json!({"title": "declared"}))]
#[case(content_type("application/x-www-form-urlencoded"), b"title=form".as_slice(), json!({"title": "form"}))]
fn test_decoder_selection(
	decodings: DecodingRegistry,
	#[case] headers: HeaderMap,
	#[case] body: &[u8],
	#[case] expected: Value,
) {
	// Act
	let decoded = decode(&headers, body, &decodings).unwrap();

	// Assert
	assert_eq!(decoded, Some(expected));
}

#[rstest]
fn test_declared_type_overrides_sniffing(decodings: DecodingRegistry) {
	// Looks like JSON, but the client says it is a form
	let headers = content_type("application/x-www-form-urlencoded");

	let decoded = decode(&headers, b"{\"a\":1}=x", &decodings).unwrap();

	assert_eq!(decoded, Some(json!({"{\"a\":1}": "x"})));
}

#[rstest]
#[case(content_type("text/csv"), b"a,b\n1,2".as_slice())]
#[case(HeaderMap::new(), b"just some words".as_slice())]
#[case(HeaderMap::new(), b"\x89PNG\r\n\x1A\n\x00\x00".as_slice())]
fn test_undecodable_body_is_unsupported(
	decodings: DecodingRegistry,
	#[case] headers: HeaderMap,
	#[case] body: &[u8],
) {
	let err = decode(&headers, body, &decodings).unwrap_err();

	assert!(matches!(err, NegotiationError::Unsupported(_)));
	assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[rstest]
fn test_decoder_reads_entire_body_after_peek(decodings: DecodingRegistry) {
	// Arrange: a body longer than the sniffing window
	let padding = " ".repeat(1024);
	let body = format!("{{{padding}\"title\": \"long\"}}");
	let mut reader = PeekReader::new(body.as_bytes());

	// Act
	let mut decoder = negotiate_decoder(
		&Method::PATCH,
		&HeaderMap::new(),
		&mut reader,
		&decodings,
		&NegotiationSettings::default(),
	)
	.unwrap()
	.unwrap();
	let idea: Idea = decoder.decode_into().unwrap();

	// Assert
	assert_eq!(idea.title, "long");
}

#[rstest]
fn test_body_left_intact_when_ignored(decodings: DecodingRegistry) {
	let mut reader = PeekReader::new(&b"ignored body"[..]);

	let decoder = negotiate_decoder(
		&Method::GET,
		&HeaderMap::new(),
		&mut reader,
		&decodings,
		&NegotiationSettings::default(),
	)
	.unwrap();
	assert!(decoder.is_none());
	drop(decoder);

	let mut rest = String::new();
	reader.read_to_string(&mut rest).unwrap();
	assert_eq!(rest, "ignored body");
}

#[rstest]
#[case("", "application/json")]
#[case("application/xml", "application/xml")]
#[case("text/html, application/xml;q=0.9, */*;q=0.1", "application/xml")]
#[case("*/*", "application/json")]
fn test_encoder_selection(encodings: EncodingRegistry, #[case] accept: &'static str, #[case] expected: &str) {
	let mut headers = HeaderMap::new();
	headers.insert(ACCEPT, HeaderValue::from_static(accept));

	let encoding = negotiate_encoder(&headers, &encodings).unwrap();

	assert_eq!(encoding.produces(), expected);
}

#[rstest]
fn test_response_round_trip(encodings: EncodingRegistry, decodings: DecodingRegistry) {
	// Arrange
	let mut headers = HeaderMap::new();
	headers.insert(ACCEPT, HeaderValue::from_static("application/xml"));
	let idea = Idea {
		title: "round trip".to_string(),
	};

	// Act: encode with the negotiated encoding, decode with the matching decoding
	let encoding = negotiate_encoder(&headers, &encodings).unwrap();
	let mut body = Vec::new();
	encoding.encoder(&mut body).encode_serialize(&idea).unwrap();

	let mut request_headers = HeaderMap::new();
	request_headers.insert(CONTENT_TYPE, HeaderValue::from_str(encoding.produces()).unwrap());
	let mut reader = PeekReader::new(body.as_slice());
	let mut decoder = negotiate_decoder(
		&Method::POST,
		&request_headers,
		&mut reader,
		&decodings,
		&NegotiationSettings::default(),
	)
	.unwrap()
	.unwrap();

	// Assert
	assert_eq!(decoder.decode_into::<Idea>().unwrap(), idea);
}

#[rstest]
fn test_unacceptable_response(encodings: EncodingRegistry) {
	let mut headers = HeaderMap::new();
	headers.insert(ACCEPT, HeaderValue::from_static("text/html, */*;q=0"));

	let err = negotiate_encoder(&headers, &encodings).err().unwrap();

	assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
	assert!(err.is_client_error());
}

#[rstest]
fn test_content_negotiator_from_toml(encodings: EncodingRegistry, decodings: DecodingRegistry) {
	// Arrange
	let settings = NegotiationSettings::from_toml_str(
		r#"
languages = ["en", "ja"]
default_language = "en"
sniff_bodies = false
"#,
	)
	.unwrap();
	let negotiator = ContentNegotiator::new(encodings, decodings, settings);
	let mut reader = PeekReader::new(&b"<idea/>"[..]);

	// Act: without sniffing an undeclared body goes to the first decoding
	let mut decoder = negotiator
		.decoder(&Method::POST, &HeaderMap::new(), &mut reader)
		.unwrap()
		.unwrap();
	let result = decoder.decode();

	// Assert
	assert!(result.is_err());
	assert_eq!(negotiator.language(&HeaderMap::new()), "en");
	assert_eq!(negotiator.settings().languages, vec!["en", "ja"]);
}
