mod commands;
mod queries;
mod service;
pub mod types;


pub use service::*;
pub use types::{
    AdminPostError, CreatePostCommand, PostSummarySnapshot, StatusTimestamps,
    UpdatePostContentCommand, UpdatePostStatusCommand, ensure_non_empty, normalize_status,
    normalize_tags,
};
