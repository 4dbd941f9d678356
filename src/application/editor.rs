//! Authoring operations: create, edit, publish, and delete posts.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("post not found")]
    NotFound,
    #[error("post form is invalid")]
    Invalid(PostFormErrors),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Raw form fields for creating or editing a post.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFormErrors {
    pub title: Option<&'static str>,
    pub body: Option<&'static str>,
}

impl PostFormErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

impl PostInput {
    /// Trimmed fields, or the set of per-field messages when a required
    /// field is blank.
    pub fn validate(&self) -> Result<PostInput, PostFormErrors> {
        let title = self.title.trim();
        let body = self.body.trim();

        let errors = PostFormErrors {
            title: title.is_empty().then_some("Title is required."),
            body: body.is_empty().then_some("Body is required."),
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(PostInput {
            title: title.to_string(),
            body: body.to_string(),
        })
    }
}

pub struct EditorService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
}

impl EditorService {
    pub fn new(reader: Arc<dyn PostsRepo>, writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn load(&self, id: Uuid) -> Result<PostRecord, EditorError> {
        self.reader
            .find_by_id(id)
            .await?
            .ok_or(EditorError::NotFound)
    }

    /// Create a draft owned by `author_id`. The published timestamp stays
    /// null until an explicit publish.
    pub async fn create(&self, author_id: Uuid, input: PostInput) -> Result<PostRecord, EditorError> {
        let input = input.validate().map_err(EditorError::Invalid)?;
        let record = self
            .writer
            .create_post(CreatePostParams {
                author_id,
                title: input.title,
                body: input.body,
            })
            .await?;

        tracing::info!(
            target = "foglio::editor",
            post_id = %record.id,
            "post created"
        );
        Ok(record)
    }

    /// Update title and body; the published state is left untouched.
    pub async fn update(&self, id: Uuid, input: PostInput) -> Result<PostRecord, EditorError> {
        let input = input.validate().map_err(EditorError::Invalid)?;
        let record = self
            .writer
            .update_post(UpdatePostParams {
                id,
                title: input.title,
                body: input.body,
            })
            .await
            .map_err(not_found_or_repo)?;

        tracing::info!(
            target = "foglio::editor",
            post_id = %record.id,
            "post updated"
        );
        Ok(record)
    }

    /// Stamp the post with the current time. Re-publishing an already
    /// published post overwrites the timestamp, so it only moves forward.
    pub async fn publish(&self, id: Uuid) -> Result<PostRecord, EditorError> {
        let now = OffsetDateTime::now_utc();
        let record = self
            .writer
            .set_published_at(id, now)
            .await
            .map_err(not_found_or_repo)?;

        tracing::info!(
            target = "foglio::editor",
            post_id = %record.id,
            published_at = %now,
            "post published"
        );
        Ok(record)
    }

    /// Delete the post; its comments are removed by the schema cascade.
    pub async fn delete(&self, id: Uuid) -> Result<(), EditorError> {
        self.writer.delete_post(id).await.map_err(not_found_or_repo)?;

        tracing::info!(
            target = "foglio::editor",
            post_id = %id,
            "post deleted"
        );
        Ok(())
    }
}

fn not_found_or_repo(err: RepoError) -> EditorError {
    match err {
        RepoError::NotFound => EditorError::NotFound,
        other => EditorError::Repo(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_report_per_field_messages() {
        let errors = PostInput {
            title: "  ".to_string(),
            body: String::new(),
        }
        .validate()
        .expect_err("blank input rejected");

        assert!(errors.title.is_some());
        assert!(errors.body.is_some());
    }

    #[test]
    fn valid_input_is_trimmed() {
        let input = PostInput {
            title: "  Hello ".to_string(),
            body: " First post. ".to_string(),
        }
        .validate()
        .expect("valid input");

        assert_eq!(input.title, "Hello");
        assert_eq!(input.body, "First post.");
    }
}
