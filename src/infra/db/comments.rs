use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CommentsWriteRepo, CreateCommentParams, RepoError,
};
use crate::domain::entities::CommentRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(Debug, FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    author_name: String,
    body: String,
    created_at: OffsetDateTime,
    approved: bool,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        CommentRecord {
            id: row.id,
            post_id: row.post_id,
            author_name: row.author_name,
            body: row.body,
            created_at: row.created_at,
            approved: row.approved,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let offset: i64 = offset
            .try_into()
            .map_err(|_| RepoError::from_persistence("offset exceeds supported range"))?;
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, author_name, body, created_at, approved \
             FROM comments WHERE post_id = $1 \
             ORDER BY created_at ASC, id ASC \
             LIMIT $2 OFFSET $3",
        )
        .bind(post_id)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        count
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, author_name, body, created_at, approved \
             FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CommentRecord::from))
    }
}

#[async_trait]
impl CommentsWriteRepo for PostgresRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let CreateCommentParams {
            post_id,
            author_name,
            body,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, CommentRow>(
            "INSERT INTO comments (id, post_id, author_name, body, created_at, approved) \
             VALUES ($1, $2, $3, $4, $5, FALSE) \
             RETURNING id, post_id, author_name, body, created_at, approved",
        )
        .bind(id)
        .bind(post_id)
        .bind(author_name)
        .bind(body)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CommentRecord::from(row))
    }

    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<CommentRecord, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(
            "UPDATE comments SET approved = $2 WHERE id = $1 \
             RETURNING id, post_id, author_name, body, created_at, approved",
        )
        .bind(id)
        .bind(approved)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(CommentRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
