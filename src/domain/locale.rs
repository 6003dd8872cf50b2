//! Supported site locales and the routing rules that thread them through URLs.
//!
//! Locale selection is carried by the `lang` query parameter. Static post
//! slugs are the exception: a trailing `-ja` or `-ar` fixes the locale no
//! matter what the query says.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
    Ar,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Ja, Locale::Ar];

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ja => "ja",
            Locale::Ar => "ar",
        }
    }

    /// Parse a language tag, ignoring case and any region subtag (`ja-JP`, `ar_SA`).
    pub fn parse(value: &str) -> Option<Self> {
        let primary = value
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "en" => Some(Locale::En),
            "ja" => Some(Locale::Ja),
            "ar" => Some(Locale::Ar),
            _ => None,
        }
    }

    pub fn is_rtl(self) -> bool {
        matches!(self, Locale::Ar)
    }

    pub fn direction(self) -> &'static str {
        if self.is_rtl() { "rtl" } else { "ltr" }
    }

    pub fn og_locale(self) -> &'static str {
        match self {
            Locale::En => "en_US",
            Locale::Ja => "ja_JP",
            Locale::Ar => "ar_AR",
        }
    }

    pub fn native_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Ja => "日本語",
            Locale::Ar => "العربية",
        }
    }

    /// Filename suffix that marks a static post as belonging to this locale.
    pub fn slug_suffix(self) -> Option<&'static str> {
        match self {
            Locale::En => None,
            Locale::Ja => Some("-ja"),
            Locale::Ar => Some("-ar"),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Locale::parse(value).ok_or_else(|| DomainError::UnsupportedLocale {
            code: value.to_string(),
        })
    }
}

/// Pick the locale requested through `?lang=`, falling back for missing or unknown values.
pub fn resolve(lang: Option<&str>, fallback: Locale) -> Locale {
    lang.and_then(Locale::parse).unwrap_or(fallback)
}

/// Split a trailing locale suffix off a slug.
///
/// `guide-ja` yields `("guide", Some(Ja))`; a slug consisting only of the
/// suffix text is left untouched.
pub fn split_locale_suffix(slug: &str) -> (&str, Option<Locale>) {
    for locale in Locale::ALL {
        if let Some(suffix) = locale.slug_suffix()
            && let Some(base) = slug.strip_suffix(suffix)
            && !base.is_empty()
        {
            return (base, Some(locale));
        }
    }
    (slug, None)
}

pub fn localized_slug(base: &str, locale: Locale) -> String {
    match locale.slug_suffix() {
        Some(suffix) => format!("{base}{suffix}"),
        None => base.to_string(),
    }
}

/// Static filenames tried, in order, when rendering `base` for `locale`.
///
/// The localized file comes first, then the unsuffixed base, then an explicit
/// `-en` variant.
pub fn static_candidates(base: &str, locale: Locale) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::with_capacity(3);
    for candidate in [
        localized_slug(base, locale),
        base.to_string(),
        format!("{base}-en"),
    ] {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Append `lang=<code>` to an internal path unless `locale` is the default.
pub fn with_lang(path: &str, locale: Locale, default: Locale) -> String {
    if locale == default {
        return path.to_string();
    }
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}lang={}", locale.code())
}
