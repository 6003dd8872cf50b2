use std::sync::Arc;

use crate::application::admin::{AdminDashboardService, AdminPostService};
use crate::domain::locale::Locale;
use crate::infra::db::PostgresRepositories;

use super::auth::AdminCredentials;
use super::super::middleware::SecurityPolicy;

#[derive(Clone)]
pub struct AdminState {
    pub db: Option<Arc<PostgresRepositories>>,
    pub dashboard: Arc<AdminDashboardService>,
    pub posts: Arc<AdminPostService>,
    pub credentials: Arc<AdminCredentials>,
    pub security: Arc<SecurityPolicy>,
    pub brand: String,
    pub default_locale: Locale,
}
