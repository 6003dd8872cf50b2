//! Markdown/MDX posts stored as files under the content directory.
//!
//! Front matter is YAML between `---` fences or TOML between `+++` fences.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;

use crate::application::repos::{ContentError, StaticPostSource};
use crate::domain::{
    locale::{Locale, split_locale_suffix},
    posts::{ISO_DATE_FORMAT, StaticPost},
};

const STATIC_ERRORS_METRIC: &str = "meridian_static_post_errors_total";
const EXTENSIONS: [&str; 2] = ["mdx", "md"];
const ENGLISH_SUFFIX: &str = "-en";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    title: Option<String>,
    #[serde(alias = "excerpt")]
    description: Option<String>,
    date: Option<String>,
    tags: Vec<String>,
    author: Option<String>,
    #[serde(alias = "cover_image")]
    image: Option<String>,
    draft: bool,
    lang: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrontMatterFormat {
    Yaml,
    Toml,
}

#[derive(Debug, Clone)]
pub struct FsStaticPosts {
    root: PathBuf,
}

impl FsStaticPosts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse every post file, returning per-file results for reporting.
    pub async fn load_all(&self) -> Result<Vec<Result<StaticPost, ContentError>>, ContentError> {
        let mut results = Vec::new();
        for path in self.post_files().await?.into_values() {
            results.push(load_file(&path).await);
        }
        Ok(results)
    }

    /// Post files keyed by slug. An `.mdx` file shadows a `.md` file with the same stem.
    async fn post_files(&self) -> Result<BTreeMap<String, PathBuf>, ContentError> {
        let mut files: BTreeMap<String, PathBuf> = BTreeMap::new();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    target = "meridian::content",
                    path = %self.root.display(),
                    "Posts directory does not exist"
                );
                return Ok(files);
            }
            Err(source) => return Err(io_error(&self.root, source)),
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => return Err(io_error(&self.root, source)),
            };
            let path = entry.path();
            let Some((stem, extension)) = post_file_name(&path) else {
                continue;
            };

            let is_mdx = extension == "mdx";
            let keep_existing = files
                .get(&stem)
                .is_some_and(|existing| !is_mdx || existing_is_mdx(existing));
            if !keep_existing {
                files.insert(stem, path);
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl StaticPostSource for FsStaticPosts {
    async fn list(&self) -> Result<Vec<StaticPost>, ContentError> {
        let mut posts = Vec::new();
        for result in self.load_all().await? {
            match result {
                Ok(post) => posts.push(post),
                Err(err) => {
                    counter!(STATIC_ERRORS_METRIC).increment(1);
                    warn!(
                        target = "meridian::content",
                        error = %err,
                        "Skipping unreadable static post"
                    );
                }
            }
        }
        Ok(posts)
    }

    async fn find(&self, slug: &str) -> Result<Option<StaticPost>, ContentError> {
        if !is_safe_slug(slug) {
            return Err(ContentError::InvalidSlug {
                slug: slug.to_string(),
            });
        }

        for extension in EXTENSIONS {
            let path = self.root.join(format!("{slug}.{extension}"));
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => return load_file(&path).await.map(Some),
                Ok(_) => continue,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(source) => return Err(io_error(&path, source)),
            }
        }

        Ok(None)
    }
}

fn existing_is_mdx(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("mdx")
}

/// `(stem, extension)` for files that hold posts. Extensions match exactly,
/// the same way `find` builds its paths.
fn post_file_name(path: &Path) -> Option<(String, &'static str)> {
    let extension = path.extension()?.to_str()?;
    let extension = EXTENSIONS
        .into_iter()
        .find(|candidate| *candidate == extension)?;
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.starts_with('_') || stem.starts_with('.') {
        return None;
    }
    Some((stem.to_string(), extension))
}

fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.contains("..")
        && !slug.contains(['/', '\\', '\0'])
        && !slug.starts_with(['.', '_'])
}

fn io_error(path: &Path, source: std::io::Error) -> ContentError {
    ContentError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn load_file(path: &Path) -> Result<StaticPost, ContentError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| io_error(path, source))?;

    let modified = tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .map(OffsetDateTime::from)
        .unwrap_or_else(|_| OffsetDateTime::now_utc());

    let (stem, extension) = post_file_name(path).ok_or_else(|| ContentError::InvalidSlug {
        slug: path.display().to_string(),
    })?;

    parse_post(path, &stem, extension == "mdx", &contents, modified)
}

/// Build a post from file contents. `modified` stands in for a missing date.
pub(crate) fn parse_post(
    path: &Path,
    stem: &str,
    is_mdx: bool,
    contents: &str,
    modified: OffsetDateTime,
) -> Result<StaticPost, ContentError> {
    let front_matter_error = |message: String| ContentError::FrontMatter {
        path: path.to_path_buf(),
        message,
    };

    let (format, header, body) = split_front_matter(contents)
        .ok_or_else(|| front_matter_error("missing front matter block".to_string()))?;
    let front = parse_front_matter(format, header).map_err(front_matter_error)?;

    let title = front
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or_else(|| front_matter_error("`title` is required".to_string()))?
        .to_string();

    let (base, suffix_locale) = split_locale_suffix(stem);
    let locale = match suffix_locale {
        Some(locale) => locale,
        None => match front.lang.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Locale::parse(code)
                .ok_or_else(|| front_matter_error(format!("unsupported lang `{code}`")))?,
            _ => Locale::En,
        },
    };

    let base_slug = match (locale, base.strip_suffix(ENGLISH_SUFFIX)) {
        (Locale::En, Some(stripped)) if !stripped.is_empty() => stripped,
        _ => base,
    };

    let published_at = match front.date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_date(raw)
            .ok_or_else(|| front_matter_error(format!("unrecognised date `{raw}`")))?,
        _ => modified,
    };

    Ok(StaticPost {
        slug: stem.to_string(),
        base_slug: base_slug.to_string(),
        locale,
        title,
        description: front.description.unwrap_or_default().trim().to_string(),
        published_at,
        tags: front
            .tags
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect(),
        author: front.author.filter(|author| !author.trim().is_empty()),
        cover_image: front.image.filter(|image| !image.trim().is_empty()),
        draft: front.draft,
        body_markdown: body.to_string(),
        is_mdx,
    })
}

fn split_front_matter(source: &str) -> Option<(FrontMatterFormat, &str, &str)> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let (fence, format) = if source.starts_with("---") {
        ("---", FrontMatterFormat::Yaml)
    } else if source.starts_with("+++") {
        ("+++", FrontMatterFormat::Toml)
    } else {
        return None;
    };

    let first_newline = source.find('\n')?;
    if source[..first_newline].trim_end() != fence {
        return None;
    }

    let rest = &source[first_newline + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == fence {
            return Some((format, &rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn parse_front_matter(format: FrontMatterFormat, header: &str) -> Result<FrontMatter, String> {
    match format {
        FrontMatterFormat::Yaml => {
            if header.trim().is_empty() {
                return Ok(FrontMatter::default());
            }
            serde_yaml::from_str(header).map_err(|err| err.to_string())
        }
        FrontMatterFormat::Toml => {
            let mut table: toml::Table = toml::from_str(header).map_err(|err| err.to_string())?;
            // TOML has native date literals; normalise them to the string form.
            if let Some(toml::Value::Datetime(date)) = table.get("date") {
                let text = date.to_string();
                table.insert("date".to_string(), toml::Value::String(text));
            }
            toml::Value::Table(table)
                .try_into()
                .map_err(|err: toml::de::Error| err.to_string())
        }
    }
}

fn parse_date(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at);
    }
    Date::parse(raw, ISO_DATE_FORMAT)
        .ok()
        .map(|date| date.midnight().assume_utc())
}
