//! Negotiation settings
//!
//! Settings are plain serde structs so they can be embedded in a larger
//! project configuration, or loaded on their own from TOML:
//!
//! ```
//! use reinhardt_negotiation::settings::NegotiationSettings;
//!
//! let settings = NegotiationSettings::from_toml_str(r#"
//! languages = ["en-GB", "nl"]
//! default_language = "en-GB"
//! peek_size = 256
//! "#).unwrap();
//!
//! assert_eq!(settings.languages, vec!["en-GB", "nl"]);
//! assert!(settings.sniff_bodies);
//! assert_eq!(settings.peek_size, 256);
//! ```

use crate::error::SettingsError;
use crate::sniff::SNIFF_LEN;
use serde::{Deserialize, Serialize};

/// Content negotiation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationSettings {
	/// Offered language tags in server preference order
	pub languages: Vec<String>,
	/// Language used when no offered tag is acceptable
	pub default_language: Option<String>,
	/// Guess the body type from its first bytes when `Content-Type` is absent
	pub sniff_bodies: bool,
	/// Number of body bytes inspected while sniffing (`1..=512`)
	pub peek_size: usize,
}

impl Default for NegotiationSettings {
	fn default() -> Self {
		Self {
			languages: Vec::new(),
			default_language: None,
			sniff_bodies: true,
			peek_size: SNIFF_LEN,
		}
	}
}

impl NegotiationSettings {
	/// Parses and validates settings from a TOML document
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Checks value ranges that serde cannot express
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_negotiation::settings::NegotiationSettings;
	///
	/// assert!(NegotiationSettings::default().validate().is_ok());
	/// assert!(NegotiationSettings::default().with_peek_size(4096).validate().is_err());
	/// ```
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.peek_size == 0 || self.peek_size > SNIFF_LEN {
			return Err(SettingsError::Invalid {
				field: "peek_size",
				message: format!("must be between 1 and {SNIFF_LEN}, got {}", self.peek_size),
			});
		}

		if let Some(position) = self.languages.iter().position(|tag| tag.trim().is_empty()) {
			return Err(SettingsError::Invalid {
				field: "languages",
				message: format!("entry {position} is empty"),
			});
		}

		if self
			.default_language
			.as_deref()
			.is_some_and(|tag| tag.trim().is_empty())
		{
			return Err(SettingsError::Invalid {
				field: "default_language",
				message: "must not be empty when set".to_string(),
			});
		}

		Ok(())
	}

	/// Replaces the offered languages
	pub fn with_languages<I, S>(mut self, languages: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.languages = languages.into_iter().map(Into::into).collect();
		self
	}

	/// Sets the fallback language
	pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
		self.default_language = Some(language.into());
		self
	}

	/// Enables or disables body sniffing
	pub fn with_sniff_bodies(mut self, sniff: bool) -> Self {
		self.sniff_bodies = sniff;
		self
	}

	/// Sets how many body bytes are peeked
	///
	/// Request negotiation clamps the value to `1..=`[`SNIFF_LEN`].
	pub fn with_peek_size(mut self, peek_size: usize) -> Self {
		self.peek_size = peek_size;
		self
	}
}
