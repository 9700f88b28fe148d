//! Peekable request body reader
//!
//! [`PeekReader`] buffers whatever is peeked so that a later full read still
//! returns every byte of the original stream, in order. Peeking never
//! advances the read position.

use crate::sniff::{SNIFF_LEN, sniff};
use std::io::{self, Read};

/// A reader that supports looking ahead without consuming
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use reinhardt_negotiation::buffer::PeekReader;
///
/// let mut reader = PeekReader::new(&b"{\"name\": \"idea\"}"[..]);
/// assert_eq!(reader.peek(1).unwrap(), b"{");
///
/// let mut body = String::new();
/// reader.read_to_string(&mut body).unwrap();
/// assert_eq!(body, "{\"name\": \"idea\"}");
/// ```
#[derive(Debug)]
pub struct PeekReader<R> {
	inner: R,
	buf: Vec<u8>,
	pos: usize,
	eof: bool,
}

impl<R: Read> PeekReader<R> {
	/// Wraps `inner` without reading from it
	pub fn new(inner: R) -> Self {
		Self {
			inner,
			buf: Vec::new(),
			pos: 0,
			eof: false,
		}
	}

	/// Returns up to `n` bytes ahead of the read position
	///
	/// Fewer than `n` bytes are returned only when the underlying stream
	/// ends first. Bytes read from the inner reader are retained and handed
	/// out again by subsequent reads.
	pub fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
		while self.buffered() < n && !self.eof {
			let want = n - self.buffered();
			let start = self.buf.len();
			self.buf.resize(start + want, 0);

			match self.inner.read(&mut self.buf[start..]) {
				Ok(0) => {
					self.buf.truncate(start);
					self.eof = true;
				}
				Ok(read) => self.buf.truncate(start + read),
				Err(e) if e.kind() == io::ErrorKind::Interrupted => self.buf.truncate(start),
				Err(e) => {
					self.buf.truncate(start);
					return Err(e);
				}
			}
		}

		let end = self.pos + n.min(self.buffered());
		Ok(&self.buf[self.pos..end])
	}

	/// Peeks at most [`SNIFF_LEN`] bytes and guesses their content type
	///
	/// Read errors are tolerated: whatever was buffered before the error is
	/// sniffed.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_negotiation::buffer::PeekReader;
	///
	/// let mut reader = PeekReader::new(&b"  [1, 2, 3]"[..]);
	/// assert_eq!(reader.sniff(), "application/json; charset=utf-8");
	/// assert_eq!(reader.buffered(), 11);
	/// ```
	pub fn sniff(&mut self) -> &'static str {
		if let Err(e) = self.peek(SNIFF_LEN) {
			tracing::debug!(error = %e, "sniffing with partially buffered body");
		}
		sniff(self.peeked())
	}

	/// Number of peeked bytes not yet handed out by `read`
	pub fn buffered(&self) -> usize {
		self.buf.len() - self.pos
	}

	/// Bytes already peeked and not yet read, without touching the inner reader
	pub fn peeked(&self) -> &[u8] {
		&self.buf[self.pos..]
	}

	/// Reference to the wrapped reader
	pub fn get_ref(&self) -> &R {
		&self.inner
	}
}

impl<R: Read> Read for PeekReader<R> {
	fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
		if self.pos < self.buf.len() {
			let available = &self.buf[self.pos..];
			let n = available.len().min(out.len());
			out[..n].copy_from_slice(&available[..n]);
			self.pos += n;

			if self.pos == self.buf.len() {
				self.buf.clear();
				self.pos = 0;
			}
			return Ok(n);
		}

		if self.eof {
			return Ok(0);
		}
		self.inner.read(out)
	}
}
