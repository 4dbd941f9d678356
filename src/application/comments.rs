//! Comment submission and moderation.
//!
//! Visitors may leave a comment on any existing post; it stays invisible to
//! other visitors until an authenticated user approves it. Removal deletes
//! the comment outright from either state.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CommentsWriteRepo, CreateCommentParams, PostsRepo, RepoError,
};
use crate::domain::entities::CommentRecord;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("post not found")]
    PostNotFound,
    #[error("comment not found")]
    CommentNotFound,
    #[error("comment form is invalid")]
    Invalid(CommentFormErrors),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct CommentInput {
    pub author_name: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentFormErrors {
    pub author_name: Option<&'static str>,
    pub body: Option<&'static str>,
}

impl CommentFormErrors {
    pub fn is_empty(&self) -> bool {
        self.author_name.is_none() && self.body.is_none()
    }
}

impl CommentInput {
    pub fn validate(&self) -> Result<CommentInput, CommentFormErrors> {
        let author_name = self.author_name.trim();
        let body = self.body.trim();

        let errors = CommentFormErrors {
            author_name: author_name.is_empty().then_some("Name is required."),
            body: body.is_empty().then_some("Comment text is required."),
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CommentInput {
            author_name: author_name.to_string(),
            body: body.to_string(),
        })
    }
}

pub struct CommentService {
    posts: Arc<dyn PostsRepo>,
    reader: Arc<dyn CommentsRepo>,
    writer: Arc<dyn CommentsWriteRepo>,
}

impl CommentService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        reader: Arc<dyn CommentsRepo>,
        writer: Arc<dyn CommentsWriteRepo>,
    ) -> Self {
        Self {
            posts,
            reader,
            writer,
        }
    }

    /// Check that the target post exists before showing the form.
    pub async fn ensure_post(&self, post_id: Uuid) -> Result<(), CommentError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or(CommentError::PostNotFound)?;
        Ok(())
    }

    /// Validate and store a new, unapproved comment against the post.
    pub async fn submit(
        &self,
        post_id: Uuid,
        input: CommentInput,
    ) -> Result<CommentRecord, CommentError> {
        self.ensure_post(post_id).await?;
        let input = input.validate().map_err(CommentError::Invalid)?;

        let record = self
            .writer
            .create_comment(CreateCommentParams {
                post_id,
                author_name: input.author_name,
                body: input.body,
            })
            .await?;

        tracing::info!(
            target = "foglio::comments",
            comment_id = %record.id,
            post_id = %post_id,
            "comment submitted"
        );
        Ok(record)
    }

    /// Flag the comment approved. Approving twice is a no-op.
    pub async fn approve(&self, comment_id: Uuid) -> Result<CommentRecord, CommentError> {
        let record = self
            .writer
            .set_approved(comment_id, true)
            .await
            .map_err(comment_not_found_or_repo)?;

        tracing::info!(
            target = "foglio::comments",
            comment_id = %record.id,
            post_id = %record.post_id,
            "comment approved"
        );
        Ok(record)
    }

    /// Delete the comment and report which post it belonged to, so the
    /// caller can land back on that post's detail page.
    pub async fn remove(&self, comment_id: Uuid) -> Result<Uuid, CommentError> {
        let record = self
            .reader
            .find_by_id(comment_id)
            .await?
            .ok_or(CommentError::CommentNotFound)?;
        self.writer
            .delete_comment(comment_id)
            .await
            .map_err(comment_not_found_or_repo)?;

        tracing::info!(
            target = "foglio::comments",
            comment_id = %comment_id,
            post_id = %record.post_id,
            "comment removed"
        );
        Ok(record.post_id)
    }
}

fn comment_not_found_or_repo(err: RepoError) -> CommentError {
    match err {
        RepoError::NotFound => CommentError::CommentNotFound,
        other => CommentError::Repo(other),
    }
}
