//! Language negotiation based on the Accept-Language header
//!
//! Language tags are matched as flat tokens: a range matches an offered tag
//! only when it names the same tag (case-insensitively) or is `*`. Prefix
//! matching (`en` accepting `en-US`) is not performed.

use crate::negotiate::{negotiate, negotiate_header};
use crate::settings::NegotiationSettings;
use http::HeaderMap;
use http::header::ACCEPT_LANGUAGE;

/// Language negotiator for the Accept-Language header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageNegotiator {
	available: Vec<String>,
	fallback: String,
}

impl LanguageNegotiator {
	/// Creates a negotiator offering `available` tags in server preference order
	///
	/// The fallback is empty until set with [`with_fallback`](Self::with_fallback).
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_negotiation::language::LanguageNegotiator;
	///
	/// let negotiator = LanguageNegotiator::new(["en-GB", "nl"]);
	/// assert_eq!(negotiator.available(), ["en-GB", "nl"]);
	/// assert_eq!(negotiator.fallback(), "");
	/// ```
	pub fn new<I, S>(available: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			available: available.into_iter().map(Into::into).collect(),
			fallback: String::new(),
		}
	}

	/// Sets the tag returned when nothing acceptable is offered
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_negotiation::language::LanguageNegotiator;
	///
	/// let negotiator = LanguageNegotiator::new(["ja"]).with_fallback("en");
	/// assert_eq!(negotiator.negotiate("de"), "en");
	/// ```
	pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
		self.fallback = fallback.into();
		self
	}

	/// Builds a negotiator from the `languages` and `default_language` settings
	pub fn from_settings(settings: &NegotiationSettings) -> Self {
		Self::new(settings.languages.iter().cloned())
			.with_fallback(settings.default_language.clone().unwrap_or_default())
	}

	/// Offered language tags in server preference order
	pub fn available(&self) -> &[String] {
		&self.available
	}

	/// Tag returned when no offer is acceptable
	pub fn fallback(&self) -> &str {
		&self.fallback
	}

	/// Negotiates the best language for an Accept-Language value
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_negotiation::language::LanguageNegotiator;
	///
	/// let negotiator = LanguageNegotiator::new(["it", "nl", "en-US"]);
	/// let header = "en-GB,en;q=0.9,en-US;q=0.8,nl;q=0.7,it;q=0.6";
	/// assert_eq!(negotiator.negotiate(header), "en-US");
	/// ```
	pub fn negotiate(&self, accept_language: &str) -> String {
		negotiate(accept_language, &self.available, &self.fallback)
	}

	/// Negotiates using every Accept-Language line of a request
	pub fn negotiate_headers(&self, headers: &HeaderMap) -> String {
		negotiate_header(headers, ACCEPT_LANGUAGE, &self.available, &self.fallback)
	}
}
