use uuid::Uuid;

use crate::application::repos::{AdminPostFilter, PostStatusCounts};
use crate::domain::entities::PostRecord;

use super::service::AdminPostService;
use super::types::AdminPostError;

impl AdminPostService {
    pub async fn list(&self, filter: &AdminPostFilter) -> Result<Vec<PostRecord>, AdminPostError> {
        self.reader
            .list_admin(filter)
            .await
            .map_err(AdminPostError::from)
    }

    pub async fn load_post(&self, id: Uuid) -> Result<Option<PostRecord>, AdminPostError> {
        self.reader
            .find_by_id(id)
            .await
            .map_err(AdminPostError::from)
    }

    /// Other language versions sharing the post's translation group.
    pub async fn translations(&self, post: &PostRecord) -> Result<Vec<PostRecord>, AdminPostError> {
        let mut members = self
            .reader
            .list_translations(post.translation_group_id)
            .await?;
        members.retain(|member| member.id != post.id);
        members.sort_by_key(|member| member.locale);
        Ok(members)
    }

    pub async fn status_counts(&self) -> Result<PostStatusCounts, AdminPostError> {
        self.reader
            .count_by_status()
            .await
            .map_err(AdminPostError::from)
    }
}
