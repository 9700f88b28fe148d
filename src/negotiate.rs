//! Selecting the best server offer for a client preference header
//!
//! The engine is a pure function over immutable inputs and is safe to call
//! concurrently from any number of request handlers.
//!
//! # Selection rules
//!
//! 1. Each offer is paired with the most specific range that matches it
//!    (`Exact > SubtypeWildcard > FullWildcard`).
//! 2. If that range has `q=0` the offer is vetoed, even when a less specific
//!    range would have accepted it.
//! 3. Among the remaining offers the highest quality wins, then the highest
//!    specificity, then the offer the server listed first.
//! 4. An empty header accepts everything, so the first offer wins.
//!
//! # Examples
//!
//! ```
//! use reinhardt_negotiation::negotiate::negotiate;
//!
//! // Exact beats the wildcard even though it is offered second
//! let best = negotiate("image/png, image/*", &["image/gif", "image/png"], "");
//! assert_eq!(best, "image/png");
//!
//! // An explicit q=0 on the only matching range excludes the offer
//! let best = negotiate("text/html, */*;q=0", &["x/y"], "");
//! assert_eq!(best, "");
//! ```

use crate::accept::{AcceptHeader, DEFAULT_QUALITY, RangeEntry};
use crate::specificity::{Specificity, match_entry};
use http::HeaderMap;
use http::header::AsHeaderName;

/// The best range for one offer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
	/// Position of the offer in the server's list
	pub offer_index: usize,
	/// Position of the matching range in the header, `None` when the header
	/// was empty and the offer was accepted implicitly
	pub entry_index: Option<usize>,
	/// How precisely the range names the offer
	pub specificity: Specificity,
	/// Quality of the matching range
	pub quality: f32,
}

impl Match {
	fn implicit(offer_index: usize) -> Self {
		Self {
			offer_index,
			entry_index: None,
			specificity: Specificity::FullWildcard,
			quality: DEFAULT_QUALITY,
		}
	}

	/// Whether this match outranks `other` on quality, then specificity.
	/// Equal matches do not outrank each other, which leaves the earlier
	/// offer in place.
	fn outranks(&self, other: &Match) -> bool {
		if self.quality != other.quality {
			return self.quality > other.quality;
		}
		self.specificity > other.specificity
	}
}

/// Finds the most specific range that matches `offer`
///
/// When several ranges match at the same specificity the one appearing first
/// in the header is kept. The returned match may carry `quality == 0`.
pub fn best_match_for_offer(
	offer_index: usize,
	offer: &str,
	entries: &[RangeEntry],
) -> Option<Match> {
	let mut best: Option<Match> = None;

	for (entry_index, entry) in entries.iter().enumerate() {
		let Some(specificity) = match_entry(offer, entry) else {
			continue;
		};

		if best.is_none_or(|b| specificity > b.specificity) {
			best = Some(Match {
				offer_index,
				entry_index: Some(entry_index),
				specificity,
				quality: entry.quality,
			});
		}
	}

	best
}

/// Selects the winning offer for an already parsed header
///
/// Returns `None` when there are no offers or when no offer is acceptable.
pub fn select<S: AsRef<str>>(header: &AcceptHeader, offers: &[S]) -> Option<Match> {
	if header.is_empty() {
		return offers
			.iter()
			.position(|offer| !offer.as_ref().trim().is_empty())
			.map(Match::implicit);
	}

	let mut winner: Option<Match> = None;
	for (offer_index, offer) in offers.iter().enumerate() {
		let offer = offer.as_ref();
		let Some(candidate) = best_match_for_offer(offer_index, offer, &header.entries) else {
			continue;
		};

		if candidate.quality == 0.0 {
			tracing::trace!(offer, "offer excluded by q=0");
			continue;
		}

		if winner.is_none_or(|w| candidate.outranks(&w)) {
			winner = Some(candidate);
		}
	}

	winner
}

/// Parses `header` and selects the winning offer
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::negotiate::select_str;
/// use reinhardt_negotiation::specificity::Specificity;
///
/// let m = select_str("image/png, image/*", &["image/jpg", "image/gif"]).unwrap();
/// assert_eq!(m.offer_index, 0);
/// assert_eq!(m.specificity, Specificity::SubtypeWildcard);
/// ```
pub fn select_str<S: AsRef<str>>(header: &str, offers: &[S]) -> Option<Match> {
	select(&AcceptHeader::parse(header), offers)
}

/// Returns the best offer for `header`, or `default_offer` when none matches
///
/// An empty `offers` list always yields an empty string.
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::negotiate::negotiate;
///
/// assert_eq!(negotiate("br;q=1.0, gzip;q=0.8, *;q=0.1", &["bogus", "gzip"], ""), "gzip");
/// assert_eq!(negotiate("en-GB,en;q=0.9", &["xy"], "default"), "default");
/// assert_eq!(negotiate("", &["application/json", "text/html"], ""), "application/json");
/// ```
pub fn negotiate<S: AsRef<str>>(header: &str, offers: &[S], default_offer: &str) -> String {
	if offers.is_empty() {
		return String::new();
	}

	match select_str(header, offers) {
		Some(m) => {
			let offer = offers[m.offer_index].as_ref();
			tracing::debug!(
				header,
				offer,
				quality = m.quality,
				specificity = ?m.specificity,
				"negotiated offer"
			);
			offer.to_string()
		}
		None => {
			tracing::debug!(header, default_offer, "no acceptable offer, using default");
			default_offer.to_string()
		}
	}
}

/// Joins every value of a header into one comma-separated list
///
/// List headers may be split over several lines; this restores the single
/// value. Values that are not visible ASCII are skipped.
pub fn header_value<K: AsHeaderName>(headers: &HeaderMap, name: K) -> String {
	headers
		.get_all(name)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.collect::<Vec<_>>()
		.join(", ")
}

/// Negotiates over the named header of a request
///
/// # Examples
///
/// ```
/// use http::{HeaderMap, HeaderValue, header::ACCEPT_LANGUAGE};
/// use reinhardt_negotiation::negotiate::negotiate_header;
///
/// let mut headers = HeaderMap::new();
/// headers.append(ACCEPT_LANGUAGE, HeaderValue::from_static("nl;q=0.7"));
/// headers.append(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB"));
///
/// assert_eq!(negotiate_header(&headers, ACCEPT_LANGUAGE, &["nl", "en-GB"], ""), "en-GB");
/// ```
pub fn negotiate_header<K: AsHeaderName, S: AsRef<str>>(
	headers: &HeaderMap,
	name: K,
	offers: &[S],
	default_offer: &str,
) -> String {
	negotiate(&header_value(headers, name), offers, default_offer)
}
