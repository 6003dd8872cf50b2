mod read;
mod types;
mod write;

/// Column list shared by every post query, aliased to table `p`.
pub(crate) const POST_COLUMNS: &str = "p.id, p.translation_group_id, p.locale, p.slug, p.title, \
     p.excerpt, p.body_markdown, p.tags, p.author, p.cover_image, p.status, p.scheduled_at, \
     p.published_at, p.created_at, p.updated_at";

/// Same columns for `RETURNING` clauses, which cannot use the alias.
pub(crate) const RETURNING_COLUMNS: &str = "id, translation_group_id, locale, slug, title, \
     excerpt, body_markdown, tags, author, cover_image, status, scheduled_at, published_at, \
     created_at, updated_at";
