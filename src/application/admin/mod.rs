//! Application services for the administrative surface.

pub mod audit;
pub mod dashboard;
pub mod posts;

pub use audit::AdminAuditService;
pub use dashboard::{AdminDashboardService, DashboardSnapshot};
pub use posts::AdminPostService;
