//! Matching a single offer against a single client range.
//!
//! Two token shapes are supported and selected by the offer: media-type-like
//! offers (`type/subtype`) are compared structurally, everything else
//! (language tags, content-codings) is compared as a flat token. A range of
//! one shape never matches an offer of the other shape, except the bare `*`
//! which is a full wildcard in both.

use crate::accept::RangeEntry;

/// How precisely a range identifies an offer.
///
/// The derived ordering is the tie-break order: `Exact > SubtypeWildcard >
/// FullWildcard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
	/// `*/*` or `*`
	FullWildcard,
	/// `type/*`
	SubtypeWildcard,
	/// Token names the offer itself
	Exact,
}

/// Returns the specificity at which `token` matches `offer`, if at all
///
/// Comparison is ASCII case-insensitive.
///
/// # Examples
///
/// ```
/// use reinhardt_negotiation::specificity::{match_token, Specificity};
///
/// assert_eq!(match_token("image/png", "image/png"), Some(Specificity::Exact));
/// assert_eq!(match_token("image/png", "IMAGE/*"), Some(Specificity::SubtypeWildcard));
/// assert_eq!(match_token("image/png", "*/*"), Some(Specificity::FullWildcard));
/// assert_eq!(match_token("image/png", "text/*"), None);
///
/// assert_eq!(match_token("en-GB", "en-gb"), Some(Specificity::Exact));
/// assert_eq!(match_token("gzip", "*"), Some(Specificity::FullWildcard));
/// assert_eq!(match_token("en-US", "en"), None);
/// ```
pub fn match_token(offer: &str, token: &str) -> Option<Specificity> {
	let offer = offer.trim();
	let token = token.trim();
	if offer.is_empty() || token.is_empty() {
		return None;
	}

	if offer.contains('/') {
		match_structured(offer, token)
	} else {
		match_flat(offer, token)
	}
}

/// Matches an offer against a parsed range entry
pub fn match_entry(offer: &str, entry: &RangeEntry) -> Option<Specificity> {
	match_token(offer, &entry.token)
}

fn match_structured(offer: &str, token: &str) -> Option<Specificity> {
	if token == "*" || token == "*/*" {
		return Some(Specificity::FullWildcard);
	}

	let (offer_type, offer_subtype) = offer.split_once('/')?;
	let (token_type, token_subtype) = token.split_once('/')?;

	if !token_type.trim().eq_ignore_ascii_case(offer_type.trim()) {
		return None;
	}

	let token_subtype = token_subtype.trim();
	if token_subtype == "*" {
		Some(Specificity::SubtypeWildcard)
	} else if token_subtype.eq_ignore_ascii_case(offer_subtype.trim()) {
		Some(Specificity::Exact)
	} else {
		None
	}
}

fn match_flat(offer: &str, token: &str) -> Option<Specificity> {
	if token == "*" {
		Some(Specificity::FullWildcard)
	} else if token.eq_ignore_ascii_case(offer) {
		Some(Specificity::Exact)
	} else {
		None
	}
}
