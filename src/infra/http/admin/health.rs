use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::super::db_health_response;
use super::AdminState;
use crate::application::error::ErrorReport;

pub(super) async fn admin_health(State(state): State<AdminState>) -> Response {
    match state.db.as_ref() {
        Some(db) => db_health_response(db.health_check().await),
        None => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_message(
                "infra::http::admin::health",
                StatusCode::SERVICE_UNAVAILABLE,
                "database not configured",
            )
            .attach(&mut response);
            response
        }
    }
}
