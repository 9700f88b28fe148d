//! Content type sniffing for request bodies
//!
//! [`detect_content_type`] implements the signature part of the WHATWG MIME
//! sniffing algorithm: a handful of well-known magic numbers, HTML and XML
//! preambles, byte order marks, and finally a text-or-binary decision.
//!
//! [`sniff`] layers an API-oriented guess on top. Request bodies sent to an
//! API without a `Content-Type` are far more often JSON or XML than free
//! text, so a "plain text" verdict whose first non-whitespace byte opens a
//! JSON value or an XML element is upgraded accordingly.

/// Maximum number of bytes considered when sniffing
pub const SNIFF_LEN: usize = 512;

/// Verdict for text without a more specific signature
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Verdict for bodies that look like JSON
pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Verdict for bodies that look like XML
pub const XML_UTF8: &str = "text/xml; charset=utf-8";

/// Verdict for HTML documents
pub const HTML_UTF8: &str = "text/html; charset=utf-8";

/// Verdict for anything binary without a known signature
pub const OCTET_STREAM: &str = "application/octet-stream";

const HTML_SIGNATURES: &[&[u8]] = &[
	b"<!DOCTYPE HTML",
	b"<HTML",
	b"<HEAD",
	b"<SCRIPT",
	b"<IFRAME",
	b"<H1",
	b"<DIV",
	b"<FONT",
	b"<TABLE",
	b"<A",
	b"<STYLE",
	b"<TITLE",
	b"<B",
	b"<BODY",
	b"<BR",
	b"<P",
	b"<!--",
];

const PREFIX_SIGNATURES: &[(&[u8], &str)] = &[
	(b"%PDF-", "application/pdf"),
	(b"%!PS-Adobe-", "application/postscript"),
	(b"\xFE\xFF", "text/plain; charset=utf-16be"),
	(b"\xFF\xFE", "text/plain; charset=utf-16le"),
	(b"\xEF\xBB\xBF", TEXT_PLAIN_UTF8),
	(b"\x00\x00\x01\x00", "image/x-icon"),
	(b"\x00\x00\x02\x00", "image/x-icon"),
	(b"BM", "image/bmp"),
	(b"GIF87a", "image/gif"),
	(b"GIF89a", "image/gif"),
	(b"\x89PNG\r\n\x1A\n", "image/png"),
	(b"\xFF\xD8\xFF", "image/jpeg"),
	(b"OggS\x00", "application/ogg"),
	(b"MThd\x00\x00\x00\x06", "audio/midi"),
	(b"ID3", "audio/mpeg"),
	(b"\x1A\x45\xDF\xA3", "video/webm"),
	(b"wOFF", "font/woff"),
	(b"wOF2", "font/woff2"),
	(b"\x1F\x8B\x08", "application/x-gzip"),
	(b"PK\x03\x04", "application/zip"),
	(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
	(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
	(b"\x00asm", "application/wasm"),
];

/// RIFF-style containers: four byte tag, four byte length, four byte form type
const CONTAINER_SIGNATURES: &[(&[u8; 4], &[u8], &str)] = &[
	(b"RIFF", b"WEBPVP", "image/webp"),
	(b"RIFF", b"WAVE", "audio/wave"),
	(b"RIFF", b"AVI ", "video/avi"),
	(b"FORM", b"AIFF", "audio/aiff"),
];

fn is_whitespace(b: u8) -> bool {
	matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

/// Bytes that never appear in text
fn is_binary(b: u8) -> bool {
	matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
	let start = data
		.iter()
		.position(|b| !is_whitespace(*b))
		.unwrap_or(data.len());
	&data[start..]
}

/// Case-insensitive tag match followed by a tag-terminating byte
fn matches_html(data: &[u8], signature: &[u8]) -> bool {
	if data.len() < signature.len() + 1 {
		return false;
	}

	let prefix_matches = signature.iter().zip(data).all(|(s, d)| {
		if s.is_ascii_uppercase() {
			d.to_ascii_uppercase() == *s
		} else {
			d == s
		}
	});

	prefix_matches && matches!(data[signature.len()], b' ' | b'>')
}

fn matches_container(data: &[u8], tag: &[u8; 4], form: &[u8]) -> bool {
	data.len() >= 8 + form.len() && data.starts_with(tag) && data[8..].starts_with(form)
}

fn matches_mp4(data: &[u8]) -> bool {
	if data.len() < 12 || &data[4..8] != b"ftyp" {
		return false;
	}

	let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
	if box_size < 12 || box_size % 4 != 0 || data.len() < box_size {
		return false;
	}

	// Major brand, then compatible brands after the minor version
	std::iter::once(8)
		.chain((16..box_size).step_by(4))
		.any(|offset| data.get(offset..offset + 3) == Some(b"mp4".as_slice()))
}

/// Classifies the first bytes of a body by signature
///
/// Only the first [`SNIFF_LEN`] bytes are considered. Always returns a valid
/// content type; bytes with no recognised signature are reported as
/// [`TEXT_PLAIN_UTF8`] or [`OCTET_STREAM`].
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::sniff::detect_content_type;
///
/// assert_eq!(detect_content_type(b"\x89PNG\r\n\x1A\n...."), "image/png");
/// assert_eq!(detect_content_type(b"  <!doctype html>"), "text/html; charset=utf-8");
/// assert_eq!(detect_content_type(b"hello"), "text/plain; charset=utf-8");
/// assert_eq!(detect_content_type(b"\x00\x01\x02"), "application/octet-stream");
/// ```
pub fn detect_content_type(data: &[u8]) -> &'static str {
	let data = &data[..data.len().min(SNIFF_LEN)];

	let trimmed = skip_whitespace(data);
	if HTML_SIGNATURES.iter().any(|sig| matches_html(trimmed, sig)) {
		return HTML_UTF8;
	}
	if trimmed.starts_with(b"<?xml") {
		return XML_UTF8;
	}

	if let Some(&(_, content_type)) = PREFIX_SIGNATURES
		.iter()
		.find(|(prefix, _)| data.starts_with(prefix))
	{
		return content_type;
	}

	if let Some(&(_, _, content_type)) = CONTAINER_SIGNATURES
		.iter()
		.find(|(tag, form, _)| matches_container(data, tag, form))
	{
		return content_type;
	}

	if matches_mp4(data) {
		return "video/mp4";
	}

	if data.iter().copied().any(is_binary) {
		OCTET_STREAM
	} else {
		TEXT_PLAIN_UTF8
	}
}

/// Guesses the content type of an API request body
///
/// Falls back to [`detect_content_type`], but reports [`JSON_UTF8`] for
/// plain text that starts with `{`, `"` or `[` and [`XML_UTF8`] for plain
/// text starting with `<` (leading whitespace ignored).
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::sniff::sniff;
///
/// assert_eq!(sniff(b" {\"id\": 1}"), "application/json; charset=utf-8");
/// assert_eq!(sniff(b"<idea><title>x</title></idea>"), "text/xml; charset=utf-8");
/// assert_eq!(sniff(b"just words"), "text/plain; charset=utf-8");
/// ```
pub fn sniff(first_bytes: &[u8]) -> &'static str {
	let generic = detect_content_type(first_bytes);
	if generic != TEXT_PLAIN_UTF8 {
		return generic;
	}

	let window = &first_bytes[..first_bytes.len().min(SNIFF_LEN)];
	match skip_whitespace(window).first() {
		Some(b'{' | b'"' | b'[') => JSON_UTF8,
		Some(b'<') => XML_UTF8,
		_ => generic,
	}
}
