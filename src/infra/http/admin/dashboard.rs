use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{AdminState, auth::AdminActor, errors::admin_post_error};
use crate::{
    infra::http::repo_error_to_http,
    presentation::{
        admin::views::{
            AdminChrome, AdminDashboardTemplate, AdminDashboardView, AdminLayout,
            AdminMessageRowView, AdminMessagesTemplate, AdminMessagesView,
        },
        views::render_template_response,
    },
};

const MESSAGE_PAGE_SIZE: u32 = 100;

pub(super) async fn admin_dashboard(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
) -> Response {
    let snapshot = match state.dashboard.overview().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            return admin_post_error("infra::http::admin::dashboard", err).into_response();
        }
    };

    let chrome = AdminChrome::new(&state.brand, "Dashboard", "dashboard", &actor);
    let view = AdminLayout::new(chrome, AdminDashboardView::from(&snapshot));
    render_template_response(AdminDashboardTemplate { view }, StatusCode::OK)
}

pub(super) async fn admin_messages(
    State(state): State<AdminState>,
    Extension(AdminActor(actor)): Extension<AdminActor>,
) -> Response {
    let messages = match state.dashboard.messages(MESSAGE_PAGE_SIZE).await {
        Ok(messages) => messages,
        Err(err) => {
            return repo_error_to_http("infra::http::admin::messages", err).into_response();
        }
    };

    let chrome = AdminChrome::new(&state.brand, "Messages", "messages", &actor);
    let content = AdminMessagesView {
        messages: messages.iter().map(AdminMessageRowView::from).collect(),
    };
    let view = AdminLayout::new(chrome, content);
    render_template_response(AdminMessagesTemplate { view }, StatusCode::OK)
}
