//! Site-wide presentation facts derived from configuration.

use crate::config::Settings;
use crate::domain::locale::{Locale, with_lang};

/// Marketing routes rendered for every locale.
pub const MARKETING_PATHS: [&str; 6] = [
    "/",
    "/services",
    "/about",
    "/contact",
    "/blog",
    "/privacy",
];

#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Absolute origin without a trailing slash.
    pub public_url: String,
    pub brand: String,
    pub default_locale: Locale,
    pub analytics_id: Option<String>,
    pub captcha_site_key: Option<String>,
}

impl SiteProfile {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            public_url: settings.site.public_url.clone(),
            brand: settings.site.brand.clone(),
            default_locale: settings.site.default_locale,
            analytics_id: settings.analytics.measurement_id.clone(),
            captcha_site_key: settings.captcha.site_key.clone(),
        }
    }

    /// Absolute URL for a site-relative path; absolute inputs pass through.
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path == "/" || path.is_empty() {
            return format!("{}/", self.public_url);
        }
        if path.starts_with('/') {
            format!("{}{path}", self.public_url)
        } else {
            format!("{}/{path}", self.public_url)
        }
    }

    /// Site-relative link carrying the locale when it is not the default.
    pub fn link(&self, path: &str, locale: Locale) -> String {
        with_lang(path, locale, self.default_locale)
    }

    pub fn localized_url(&self, path: &str, locale: Locale) -> String {
        self.absolute(&self.link(path, locale))
    }
}

#[cfg(test)]
pub(crate) fn test_profile() -> SiteProfile {
    SiteProfile {
        public_url: "https://example.com".to_string(),
        brand: "Meridian Systems".to_string(),
        default_locale: Locale::En,
        analytics_id: None,
        captcha_site_key: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_joins_paths() {
        let site = test_profile();
        assert_eq!(site.absolute("/"), "https://example.com/");
        assert_eq!(site.absolute("/blog"), "https://example.com/blog");
        assert_eq!(site.absolute("img/a.png"), "https://example.com/img/a.png");
        assert_eq!(site.absolute("https://cdn.test/a.png"), "https://cdn.test/a.png");
    }

    #[test]
    fn localized_url_adds_lang_for_other_locales() {
        let site = test_profile();
        assert_eq!(
            site.localized_url("/about", Locale::En),
            "https://example.com/about"
        );
        assert_eq!(
            site.localized_url("/", Locale::Ja),
            "https://example.com/?lang=ja"
        );
    }
}
