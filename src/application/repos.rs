//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_name: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub password_hash: String,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Published posts (timestamp ≤ `now`), newest first.
    async fn list_published(
        &self,
        now: OffsetDateTime,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_published(&self, now: OffsetDateTime) -> Result<u64, RepoError>;

    /// Posts with no published timestamp, most recently created first.
    async fn list_drafts(&self) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Fails with [`RepoError::NotFound`] when the post is absent. Leaves
    /// the published timestamp untouched.
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn set_published_at(
        &self,
        id: Uuid,
        published_at: OffsetDateTime,
    ) -> Result<PostRecord, RepoError>;

    /// Removes the post; comments go with it via the schema cascade.
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments for one post in creation order (oldest first).
    async fn list_for_post(
        &self,
        post_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<CommentRecord>, RepoError>;

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, RepoError>;
}

#[async_trait]
pub trait CommentsWriteRepo: Send + Sync {
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<CommentRecord, RepoError>;

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;
}
