use axum::http::StatusCode;

use crate::application::{admin::posts::AdminPostError, error::HttpError};
use crate::infra::http::repo_error_to_http;

pub(super) fn admin_post_error(source: &'static str, err: AdminPostError) -> HttpError {
    match err {
        AdminPostError::Repo(repo) => repo_error_to_http(source, repo),
        AdminPostError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Post not found",
            "post not found",
        ),
        other => HttpError::new(
            source,
            editor_status(&other),
            "Post request could not be processed",
            describe(&other),
        ),
    }
}

/// Status for an error shown inline in the post editor.
pub(super) fn editor_status(err: &AdminPostError) -> StatusCode {
    match err {
        AdminPostError::SlugTaken { .. } | AdminPostError::TranslationExists(_) => {
            StatusCode::CONFLICT
        }
        AdminPostError::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub(super) fn describe(err: &AdminPostError) -> String {
    match err {
        AdminPostError::ConstraintViolation(field) => {
            format!("The `{field}` field is missing or invalid.")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::locale::Locale;

    #[test]
    fn conflicts_map_to_409() {
        let err = AdminPostError::SlugTaken {
            slug: "edge".to_string(),
            locale: Locale::Ja,
        };
        assert_eq!(editor_status(&err), StatusCode::CONFLICT);
        assert_eq!(
            admin_post_error("test", err).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn constraint_violations_name_the_field() {
        let err = AdminPostError::ConstraintViolation("scheduled_at");
        assert_eq!(editor_status(&err), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(describe(&err).contains("`scheduled_at`"));
    }
}
