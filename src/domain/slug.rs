//! Utilities for generating deterministic, human-friendly slugs.
//!
//! `slug::slugify` transliterates through `deunicode`, so Japanese kana and
//! Arabic titles still produce ASCII slugs. Slugs that would end in a locale
//! marker (`-ja`, `-ar`) are reserved for static post routing.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

use super::locale::split_locale_suffix;

const MAX_SUFFIX_ATTEMPTS: usize = 32;
const RESERVED_SUFFIX_ESCAPE: &str = "post";

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Errors that can occur while generating a slug via an async uniqueness check.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    if has_reserved_suffix(&candidate) {
        return Ok(format!("{candidate}-{RESERVED_SUFFIX_ESCAPE}"));
    }

    Ok(candidate)
}

/// True when the slug ends with a locale marker used by static post routing.
pub fn has_reserved_suffix(slug: &str) -> bool {
    split_locale_suffix(slug).1.is_some()
}

/// True when `slug` is already in canonical form (`slugify` would not change it).
pub fn is_canonical(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

/// Async slug generation that awaits the uniqueness predicate.
///
/// The `is_unique` closure must return `true` when the provided slug does not
/// already exist. Collisions are retried with a monotonic counter (`-2`, `-3`, …).
pub async fn generate_unique_slug_async<F, Fut, E>(
    input: &str,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_unique(&base).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate)
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        assert_eq!(
            derive_slug("Hello, World!").expect("slug"),
            "hello-world".to_string()
        );
    }

    #[test]
    fn derive_slug_transliterates_non_latin_titles() {
        for title in ["こんにちは世界", "مرحبا بالعالم"] {
            let slug = derive_slug(title).expect("slug");
            assert!(!slug.is_empty());
            assert!(slug.is_ascii(), "{slug} is not ascii");
        }
    }

    #[test]
    fn derive_slug_escapes_locale_suffix() {
        assert_eq!(derive_slug("Intro to AR").expect("slug"), "intro-to-ar-post");
        assert_eq!(derive_slug("Learn JA").expect("slug"), "learn-ja-post");
        assert_eq!(derive_slug("Ninja").expect("slug"), "ninja");
    }

    #[test]
    fn derive_slug_rejects_blank_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn canonical_detection() {
        assert!(is_canonical("rust-on-the-edge"));
        assert!(!is_canonical("Rust On The Edge"));
        assert!(!is_canonical(""));
    }

    #[tokio::test]
    async fn generate_unique_slug_async_appends_counter() {
        use std::sync::Arc;
        use tokio::sync::Mutex;

        let existing = Arc::new(Mutex::new(vec!["launch-notes".to_string()]));

        let slug = generate_unique_slug_async("Launch Notes", |candidate| {
            let existing = existing.clone();
            let candidate = candidate.to_string();
            async move {
                let mut guard = existing.lock().await;
                if guard.contains(&candidate) {
                    Ok::<bool, std::convert::Infallible>(false)
                } else {
                    guard.push(candidate);
                    Ok::<bool, std::convert::Infallible>(true)
                }
            }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "launch-notes-2");
    }

    #[tokio::test]
    async fn generate_unique_slug_async_exhausts() {
        let result = generate_unique_slug_async("Example", |_| async {
            Ok::<bool, std::convert::Infallible>(false)
        })
        .await;

        assert!(matches!(
            result,
            Err(SlugAsyncError::Slug(SlugError::Exhausted { .. }))
        ));
    }
}
