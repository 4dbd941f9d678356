use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    author_username: String,
    title: String,
    body: String,
    created_at: OffsetDateTime,
    published_at: Option<OffsetDateTime>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        PostRecord {
            id: row.id,
            author_id: row.author_id,
            author_username: row.author_username,
            title: row.title,
            body: row.body,
            created_at: row.created_at,
            published_at: row.published_at,
        }
    }
}

const POST_COLUMNS: &str = "p.id, p.author_id, u.username AS author_username, \
     p.title, p.body, p.created_at, p.published_at";

fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}

fn convert_offset(value: u64) -> Result<i64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("offset exceeds supported range"))
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_published(
        &self,
        now: OffsetDateTime,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} \
             FROM posts p INNER JOIN users u ON u.id = p.author_id \
             WHERE p.published_at IS NOT NULL AND p.published_at <= $1 \
             ORDER BY p.published_at DESC, p.id DESC \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(now)
            .bind(i64::from(limit))
            .bind(convert_offset(offset)?)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_published(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts p \
             WHERE p.published_at IS NOT NULL AND p.published_at <= $1",
        )
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn list_drafts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} \
             FROM posts p INNER JOIN users u ON u.id = p.author_id \
             WHERE p.published_at IS NULL \
             ORDER BY p.created_at DESC, p.id DESC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} \
             FROM posts p INNER JOIN users u ON u.id = p.author_id \
             WHERE p.id = $1"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            author_id,
            title,
            body,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, PostRow>(
            "WITH inserted AS ( \
                 INSERT INTO posts (id, author_id, title, body, created_at, published_at) \
                 VALUES ($1, $2, $3, $4, $5, NULL) \
                 RETURNING id, author_id, title, body, created_at, published_at \
             ) \
             SELECT i.id, i.author_id, u.username AS author_username, \
                    i.title, i.body, i.created_at, i.published_at \
             FROM inserted i INNER JOIN users u ON u.id = i.author_id",
        )
        .bind(id)
        .bind(author_id)
        .bind(title)
        .bind(body)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams { id, title, body } = params;

        let row = sqlx::query_as::<_, PostRow>(
            "UPDATE posts p SET title = $2, body = $3 \
             FROM users u \
             WHERE p.id = $1 AND u.id = p.author_id \
             RETURNING p.id, p.author_id, u.username AS author_username, \
                       p.title, p.body, p.created_at, p.published_at",
        )
        .bind(id)
        .bind(title)
        .bind(body)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn set_published_at(
        &self,
        id: Uuid,
        published_at: OffsetDateTime,
    ) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "UPDATE posts p SET published_at = $2 \
             FROM users u \
             WHERE p.id = $1 AND u.id = p.author_id \
             RETURNING p.id, p.author_id, u.username AS author_username, \
                       p.title, p.body, p.created_at, p.published_at",
        )
        .bind(id)
        .bind(published_at)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
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
