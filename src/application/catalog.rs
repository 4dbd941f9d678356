//! Read side of the blog: the public catalog, the draft list, and the
//! per-post detail view with its comment thread.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::{PAGE_SIZE, Page, Paginator, parse_page_param};
use crate::application::repos::{CommentsRepo, PostsRepo, RepoError};
use crate::domain::entities::{CommentRecord, PostRecord};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A post plus one page of its comments. Comment pagination is independent
/// of the catalog's pagination state.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub comments: Page<CommentRecord>,
}

pub struct CatalogService {
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    paginator: Paginator,
}

impl CatalogService {
    pub fn new(posts: Arc<dyn PostsRepo>, comments: Arc<dyn CommentsRepo>) -> Self {
        Self {
            posts,
            comments,
            paginator: Paginator::new(PAGE_SIZE),
        }
    }

    /// One page of published posts, newest first. `page_param` is the raw
    /// `?page=` value; anything unparseable lands on page one and anything
    /// past the end lands on the last page.
    pub async fn front_page(
        &self,
        page_param: Option<&str>,
    ) -> Result<Page<PostRecord>, CatalogError> {
        let now = OffsetDateTime::now_utc();
        let total = self.posts.count_published(now).await?;
        let number = self
            .paginator
            .clamp_page(parse_page_param(page_param), total);
        let items = self
            .posts
            .list_published(now, self.paginator.page_size(), self.paginator.offset(number))
            .await?;

        Ok(Page {
            items,
            number,
            total_pages: self.paginator.total_pages(total),
            total_items: total,
        })
    }

    /// Every unpublished post, most recently created first.
    pub async fn drafts(&self) -> Result<Vec<PostRecord>, CatalogError> {
        Ok(self.posts.list_drafts().await?)
    }

    /// The post plus one page of its comments in creation order.
    pub async fn post_detail(
        &self,
        id: Uuid,
        page_param: Option<&str>,
    ) -> Result<PostDetail, CatalogError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound)?;

        let total = self.comments.count_for_post(id).await?;
        let number = self
            .paginator
            .clamp_page(parse_page_param(page_param), total);
        let items = self
            .comments
            .list_for_post(id, self.paginator.page_size(), self.paginator.offset(number))
            .await?;

        Ok(PostDetail {
            post,
            comments: Page {
                items,
                number,
                total_pages: self.paginator.total_pages(total),
                total_items: total,
            },
        })
    }
}
