use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    AdminState,
    auth::AdminActor,
    errors::{admin_post_error, describe, editor_status},
    forms::{AdminNewPostQuery, AdminPostForm, AdminPostListQuery, AdminScheduleForm, parse_schedule},
};
use crate::{
    application::admin::posts::{AdminPostError, UpdatePostStatusCommand},
    domain::{entities::PostRecord, types::PostStatus},
    presentation::{
        admin::views::{
            AdminChrome, AdminLayout, AdminPostEditorTemplate, AdminPostEditorView,
            AdminPostFilterView, AdminPostFormValues, AdminPostListView, AdminPostRowView,
            AdminPostsTemplate,
        },
        views::render_template_response,
    },
};

const SOURCE: &str = "infra::http::admin::posts";

pub(super) async fn admin_posts(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
    Query(query): Query<AdminPostListQuery>,
) -> Response {
    let filter = query.filter();
    let posts = match state.posts.list(&filter).await {
        Ok(posts) => posts,
        Err(err) => return admin_post_error(SOURCE, err).into_response(),
    };

    let content = AdminPostListView {
        rows: posts
            .iter()
            .map(|post| AdminPostRowView::from_record(post, state.default_locale))
            .collect(),
        filter: AdminPostFilterView::new(filter.status, filter.locale, filter.search.as_deref()),
    };
    let chrome = AdminChrome::new(&state.brand, "Posts", "posts", &actor);
    render_template_response(
        AdminPostsTemplate {
            view: AdminLayout::new(chrome, content),
        },
        StatusCode::OK,
    )
}

pub(super) async fn admin_post_new(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
    Query(query): Query<AdminNewPostQuery>,
) -> Response {
    let mut values = AdminPostFormValues {
        locale: query
            .locale
            .clone()
            .unwrap_or_else(|| state.default_locale.code().to_string()),
        status: PostStatus::Draft.as_str().to_string(),
        ..AdminPostFormValues::default()
    };

    if let Some(source_id) = query.translation_of {
        match state.posts.load_post(source_id).await {
            Ok(Some(source)) => {
                values.translation_of = source.id.to_string();
                values.tags = source.tags.join(", ");
                values.author = source.author.unwrap_or_default();
                values.cover_image = source.cover_image.unwrap_or_default();
            }
            Ok(None) => return admin_post_error(SOURCE, AdminPostError::NotFound).into_response(),
            Err(err) => return admin_post_error(SOURCE, err).into_response(),
        }
    }

    render_editor(
        &state,
        &actor,
        "new_post",
        AdminPostEditorView::new_post(values, None),
        StatusCode::OK,
    )
}

pub(super) async fn admin_post_create(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
    Form(form): Form<AdminPostForm>,
) -> Response {
    let result = match form.create_command() {
        Ok(command) => state.posts.create_post(&actor, command).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(post) => Redirect::to(&edit_href(post.id)).into_response(),
        Err(AdminPostError::Repo(repo)) => {
            admin_post_error(SOURCE, AdminPostError::Repo(repo)).into_response()
        }
        Err(err) => render_editor(
            &state,
            &actor,
            "new_post",
            AdminPostEditorView::new_post(form.values(), Some(describe(&err))),
            editor_status(&err),
        ),
    }
}

pub(super) async fn admin_post_edit(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
    Path(id): Path<Uuid>,
) -> Response {
    let post = match find_post(&state, id).await {
        Ok(post) => post,
        Err(response) => return response,
    };
    let values = AdminPostFormValues::from_record(&post);
    edit_response(&state, &actor, &post, values, None, StatusCode::OK).await
}

pub(super) async fn admin_post_update(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
    Path(id): Path<Uuid>,
    Form(form): Form<AdminPostForm>,
) -> Response {
    match state.posts.update_post(&actor, form.update_command(id)).await {
        Ok(post) => Redirect::to(&edit_href(post.id)).into_response(),
        Err(err @ (AdminPostError::Repo(_) | AdminPostError::NotFound)) => {
            admin_post_error(SOURCE, err).into_response()
        }
        Err(err) => {
            let post = match find_post(&state, id).await {
                Ok(post) => post,
                Err(response) => return response,
            };
            let mut values = form.values();
            values.locale = post.locale.code().to_string();
            values.status = post.status.as_str().to_string();
            edit_response(
                &state,
                &actor,
                &post,
                values,
                Some(describe(&err)),
                editor_status(&err),
            )
            .await
        }
    }
}

pub(super) async fn admin_post_publish(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
    Path(id): Path<Uuid>,
) -> Response {
    change_status(&state, &actor, id, PostStatus::Published, None).await
}

pub(super) async fn admin_post_move_to_draft(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
    Path(id): Path<Uuid>,
) -> Response {
    change_status(&state, &actor, id, PostStatus::Draft, None).await
}

pub(super) async fn admin_post_schedule(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
    Path(id): Path<Uuid>,
    Form(form): Form<AdminScheduleForm>,
) -> Response {
    let scheduled_at = match parse_schedule(&form.scheduled_at) {
        Ok(Some(at)) => at,
        Ok(None) => {
            return admin_post_error(SOURCE, AdminPostError::ConstraintViolation("scheduled_at"))
                .into_response();
        }
        Err(err) => return admin_post_error(SOURCE, err).into_response(),
    };
    change_status(&state, &actor, id, PostStatus::Scheduled, Some(scheduled_at)).await
}

pub(super) async fn admin_post_delete(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.posts.delete_post(&actor, id).await {
        Ok(()) => Redirect::to("/posts").into_response(),
        Err(err) => admin_post_error(SOURCE, err).into_response(),
    }
}

async fn change_status(
    state: &AdminState,
    actor: &str,
    id: Uuid,
    status: PostStatus,
    scheduled_at: Option<OffsetDateTime>,
) -> Response {
    let existing = match find_post(state, id).await {
        Ok(post) => post,
        Err(response) => return response,
    };

    let command = UpdatePostStatusCommand {
        id,
        status,
        scheduled_at,
        published_at: existing.published_at,
    };

    match state.posts.update_status(actor, command).await {
        Ok(post) => Redirect::to(&edit_href(post.id)).into_response(),
        Err(err) => admin_post_error(SOURCE, err).into_response(),
    }
}

async fn find_post(state: &AdminState, id: Uuid) -> Result<PostRecord, Response> {
    match state.posts.load_post(id).await {
        Ok(Some(post)) => Ok(post),
        Ok(None) => Err(admin_post_error(SOURCE, AdminPostError::NotFound).into_response()),
        Err(err) => Err(admin_post_error(SOURCE, err).into_response()),
    }
}

async fn edit_response(
    state: &AdminState,
    actor: &str,
    post: &PostRecord,
    values: AdminPostFormValues,
    error: Option<String>,
    status: StatusCode,
) -> Response {
    let siblings = match state.posts.translations(post).await {
        Ok(siblings) => siblings,
        Err(err) => return admin_post_error(SOURCE, err).into_response(),
    };
    let view =
        AdminPostEditorView::edit_post(post, &siblings, values, error, state.default_locale);
    render_editor(state, actor, "posts", view, status)
}

fn render_editor(
    state: &AdminState,
    actor: &str,
    active: &str,
    content: AdminPostEditorView,
    status: StatusCode,
) -> Response {
    let chrome = AdminChrome::new(&state.brand, &content.heading, active, actor);
    render_template_response(
        AdminPostEditorTemplate {
            view: AdminLayout::new(chrome, content),
        },
        status,
    )
}

fn edit_href(id: Uuid) -> String {
    format!("/posts/{id}/edit")
}
