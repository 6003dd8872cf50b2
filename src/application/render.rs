//! Markdown/MDX to sanitized HTML.

use std::{collections::HashSet, sync::Arc};

use ammonia::Builder as AmmoniaBuilder;
use comrak::{markdown_to_html, options::Options};
use once_cell::sync::Lazy;

const WORDS_PER_MINUTE: usize = 200;
const CJK_CHARS_PER_MINUTE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBody {
    pub html: String,
    pub reading_minutes: u32,
}

/// Comrak-based rendering pipeline with Ammonia sanitisation.
pub struct MarkdownRenderer {
    options: Options<'static>,
    sanitizer: AmmoniaBuilder<'static>,
}

impl MarkdownRenderer {
    fn new() -> Self {
        let mut options = Options::default();
        configure_extensions(&mut options);
        Self {
            options,
            sanitizer: build_sanitizer(),
        }
    }

    pub fn render(&self, markdown: &str, is_mdx: bool) -> RenderedBody {
        let source = if is_mdx {
            strip_mdx_syntax(markdown)
        } else {
            markdown.to_string()
        };

        let raw_html = markdown_to_html(&source, &self.options);
        let html = self.sanitizer.clean(&raw_html).to_string();

        RenderedBody {
            html,
            reading_minutes: reading_minutes(&source),
        }
    }
}

static RENDERER: Lazy<Arc<MarkdownRenderer>> = Lazy::new(|| Arc::new(MarkdownRenderer::new()));

/// Shared renderer instance, initialised on first use.
pub fn markdown_renderer() -> Arc<MarkdownRenderer> {
    Arc::clone(&RENDERER)
}

fn configure_extensions(options: &mut Options<'static>) {
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.description_lists = true;
    ext.cjk_friendly_emphasis = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.tasklist_classes = true;
    render.r#unsafe = true;
}

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "abbr",
        "blockquote",
        "br",
        "code",
        "dd",
        "del",
        "div",
        "dl",
        "dt",
        "em",
        "figcaption",
        "figure",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "img",
        "input",
        "kbd",
        "li",
        "mark",
        "ol",
        "p",
        "pre",
        "s",
        "section",
        "span",
        "strong",
        "sub",
        "sup",
        "table",
        "tbody",
        "td",
        "th",
        "thead",
        "tr",
        "ul",
    ]);
    builder.tags(tags);

    let generic: HashSet<&'static str> = HashSet::from([
        "class",
        "id",
        "title",
        "lang",
        "dir",
        "aria-hidden",
        "aria-label",
        "role",
        "data-footnote-ref",
        "data-footnotes",
        "data-footnote-backref",
    ]);
    builder.generic_attributes(generic);

    builder.add_tag_attributes("img", &["alt", "width", "height", "loading", "decoding"]);
    builder.add_tag_attributes("code", &["data-lang"]);
    builder.add_tag_attributes("pre", &["lang"]);
    builder.add_tag_attributes("th", &["align", "colspan", "rowspan", "scope"]);
    builder.add_tag_attributes("td", &["align", "colspan", "rowspan"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);

    builder
}

/// Drop MDX-only lines (`import`/`export` statements and capitalised JSX
/// components) outside fenced code blocks.
fn strip_mdx_syntax(source: &str) -> String {
    let mut output = String::with_capacity(source.len());
    let mut in_fence = false;

    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }

        if !in_fence && is_mdx_only_line(line) {
            continue;
        }

        output.push_str(line);
        output.push('\n');
    }

    output
}

fn is_mdx_only_line(line: &str) -> bool {
    if line.starts_with("import ") || line.starts_with("export ") {
        return true;
    }

    let trimmed = line.trim();
    let mut chars = trimmed.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('<'), Some(first)) if first.is_ascii_uppercase()
    ) || (trimmed.starts_with("</")
        && trimmed[2..].starts_with(|ch: char| ch.is_ascii_uppercase()))
}

/// Estimated minutes to read `source`: words plus CJK characters, at least one.
pub fn reading_minutes(source: &str) -> u32 {
    let mut words = 0usize;
    let mut cjk = 0usize;

    for token in source.split_whitespace() {
        let cjk_in_token = token.chars().filter(|ch| is_cjk(*ch)).count();
        cjk += cjk_in_token;
        if cjk_in_token < token.chars().count() {
            words += 1;
        }
    }

    let minutes = words.div_ceil(WORDS_PER_MINUTE) + cjk.div_ceil(CJK_CHARS_PER_MINUTE);
    u32::try_from(minutes.max(1)).unwrap_or(u32::MAX)
}

fn is_cjk(ch: char) -> bool {
    matches!(ch as u32,
        0x3040..=0x30FF   // hiragana, katakana
        | 0x3400..=0x4DBF // CJK extension A
        | 0x4E00..=0x9FFF // CJK unified ideographs
        | 0xFF66..=0xFF9F // half-width katakana
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_gfm_tables_and_strikethrough() {
        let rendered = markdown_renderer().render("| a |\n|---|\n| b |\n\n~~gone~~", false);
        assert!(rendered.html.contains("<table>"));
        assert!(rendered.html.contains("<del>gone</del>"));
    }

    #[test]
    fn strips_scripts_from_raw_html() {
        let rendered = markdown_renderer().render(
            "Hello <script>alert(1)</script><img src=x onerror=alert(1)>",
            false,
        );
        assert!(!rendered.html.contains("<script"));
        assert!(!rendered.html.contains("onerror"));
        assert!(rendered.html.contains("Hello"));
    }

    #[test]
    fn mdx_imports_and_components_are_removed() {
        let source = "import Chart from '../components/Chart'\n\n# Title\n\n<Chart data={x} />\n\n```js\nimport fs from 'fs'\n```\n";
        let stripped = strip_mdx_syntax(source);
        assert!(!stripped.contains("import Chart"));
        assert!(!stripped.contains("<Chart"));
        assert!(stripped.contains("import fs from 'fs'"));
        assert!(stripped.contains("# Title"));
    }

    #[test]
    fn lowercase_html_is_not_treated_as_jsx() {
        assert!(!is_mdx_only_line("<div>kept</div>"));
        assert!(is_mdx_only_line("<Callout>"));
        assert!(is_mdx_only_line("</Callout>"));
    }

    #[test]
    fn reading_time_counts_words_and_cjk() {
        assert_eq!(reading_minutes(""), 1);
        assert_eq!(reading_minutes(&"word ".repeat(401)), 3);
        assert_eq!(reading_minutes(&"日本語".repeat(200)), 2);
    }
}
