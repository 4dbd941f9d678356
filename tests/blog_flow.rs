//! Service-level scenarios over an in-memory repository implementation.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use foglio::application::catalog::CatalogService;
use foglio::application::comments::{CommentError, CommentInput, CommentService};
use foglio::application::editor::{EditorService, PostInput};
use foglio::application::repos::{
    CommentsRepo, CommentsWriteRepo, CreateCommentParams, CreatePostParams, CreateUserParams,
    PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams, UsersRepo,
};
use foglio::domain::entities::{CommentRecord, PostRecord, UserRecord};

/// Stand-in for the Postgres adapter: the same traits over vectors, with
/// the delete cascade from posts to comments applied by hand.
#[derive(Default)]
struct MemoryRepos {
    users: Mutex<Vec<UserRecord>>,
    posts: Mutex<Vec<PostRecord>>,
    comments: Mutex<Vec<CommentRecord>>,
    // Distinct creation timestamps so ordering assertions are stable.
    seq: AtomicI64,
}

impl MemoryRepos {
    fn next_timestamp(&self) -> OffsetDateTime {
        let tick = self.seq.fetch_add(1, Ordering::SeqCst);
        OffsetDateTime::now_utc() - Duration::hours(1) + Duration::seconds(tick)
    }
}

#[async_trait]
impl UsersRepo for MemoryRepos {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let users = self.users.lock().expect("users lock");
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let users = self.users.lock().expect("users lock");
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut users = self.users.lock().expect("users lock");
        if users.iter().any(|u| u.username == params.username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: params.username,
            password_hash: params.password_hash,
            created_at: self.next_timestamp(),
        };
        users.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl PostsRepo for MemoryRepos {
    async fn list_published(
        &self,
        now: OffsetDateTime,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let posts = self.posts.lock().expect("posts lock");
        let mut published: Vec<PostRecord> = posts
            .iter()
            .filter(|p| p.published_at.is_some_and(|at| at <= now))
            .cloned()
            .collect();
        published.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(published
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_published(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let posts = self.posts.lock().expect("posts lock");
        Ok(posts
            .iter()
            .filter(|p| p.published_at.is_some_and(|at| at <= now))
            .count() as u64)
    }

    async fn list_drafts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let posts = self.posts.lock().expect("posts lock");
        let mut drafts: Vec<PostRecord> = posts
            .iter()
            .filter(|p| p.published_at.is_none())
            .cloned()
            .collect();
        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(drafts)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let posts = self.posts.lock().expect("posts lock");
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepos {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let author_username = {
            let users = self.users.lock().expect("users lock");
            users
                .iter()
                .find(|u| u.id == params.author_id)
                .map(|u| u.username.clone())
                .ok_or(RepoError::Integrity {
                    message: "author does not exist".to_string(),
                })?
        };
        let record = PostRecord {
            id: Uuid::new_v4(),
            author_id: params.author_id,
            author_username,
            title: params.title,
            body: params.body,
            created_at: self.next_timestamp(),
            published_at: None,
        };
        self.posts.lock().expect("posts lock").push(record.clone());
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().expect("posts lock");
        let post = posts
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.title = params.title;
        post.body = params.body;
        Ok(post.clone())
    }

    async fn set_published_at(
        &self,
        id: Uuid,
        published_at: OffsetDateTime,
    ) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().expect("posts lock");
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        post.published_at = Some(published_at);
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.lock().expect("posts lock");
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        // ON DELETE CASCADE
        self.comments
            .lock()
            .expect("comments lock")
            .retain(|c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryRepos {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let comments = self.comments.lock().expect("comments lock");
        let mut thread: Vec<CommentRecord> = comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        thread.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(thread
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let comments = self.comments.lock().expect("comments lock");
        Ok(comments.iter().filter(|c| c.post_id == post_id).count() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, RepoError> {
        let comments = self.comments.lock().expect("comments lock");
        Ok(comments.iter().find(|c| c.id == id).cloned())
    }
}

#[async_trait]
impl CommentsWriteRepo for MemoryRepos {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let record = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_name: params.author_name,
            body: params.body,
            created_at: self.next_timestamp(),
            approved: false,
        };
        self.comments
            .lock()
            .expect("comments lock")
            .push(record.clone());
        Ok(record)
    }

    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<CommentRecord, RepoError> {
        let mut comments = self.comments.lock().expect("comments lock");
        let comment = comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepoError::NotFound)?;
        comment.approved = approved;
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let mut comments = self.comments.lock().expect("comments lock");
        let before = comments.len();
        comments.retain(|c| c.id != id);
        if comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

struct Harness {
    repos: Arc<MemoryRepos>,
    catalog: CatalogService,
    editor: EditorService,
    comments: CommentService,
    author: UserRecord,
}

async fn harness() -> Harness {
    let repos = Arc::new(MemoryRepos::default());
    let author = repos
        .create_user(CreateUserParams {
            username: "ada".to_string(),
            password_hash: "unused".to_string(),
        })
        .await
        .expect("seed author");

    Harness {
        catalog: CatalogService::new(repos.clone(), repos.clone()),
        editor: EditorService::new(repos.clone(), repos.clone()),
        comments: CommentService::new(repos.clone(), repos.clone(), repos.clone()),
        repos,
        author,
    }
}

fn input(title: &str, body: &str) -> PostInput {
    PostInput {
        title: title.to_string(),
        body: body.to_string(),
    }
}

#[tokio::test]
async fn catalog_and_draft_list_partition_all_posts() {
    let h = harness().await;

    let a = h.editor.create(h.author.id, input("A", "one")).await.expect("create a");
    let b = h.editor.create(h.author.id, input("B", "two")).await.expect("create b");
    let c = h.editor.create(h.author.id, input("C", "three")).await.expect("create c");

    h.editor.publish(a.id).await.expect("publish a");
    h.editor.publish(b.id).await.expect("publish b");

    let mut catalog_ids = Vec::new();
    let mut page_param: Option<String> = None;
    loop {
        let page = h
            .catalog
            .front_page(page_param.as_deref())
            .await
            .expect("front page");
        catalog_ids.extend(page.items.iter().map(|p| p.id));
        if !page.has_next() {
            break;
        }
        page_param = Some(page.next_number().to_string());
    }

    let draft_ids: Vec<Uuid> = h
        .catalog
        .drafts()
        .await
        .expect("drafts")
        .iter()
        .map(|p| p.id)
        .collect();

    assert!(catalog_ids.contains(&a.id));
    assert!(catalog_ids.contains(&b.id));
    assert_eq!(draft_ids, vec![c.id]);
    assert!(!catalog_ids.contains(&c.id));
    assert_eq!(catalog_ids.len() + draft_ids.len(), 3);
}

#[tokio::test]
async fn republish_never_moves_the_timestamp_backwards() {
    let h = harness().await;
    let post = h.editor.create(h.author.id, input("A", "body")).await.expect("create");

    let first = h.editor.publish(post.id).await.expect("publish");
    let second = h.editor.publish(post.id).await.expect("republish");

    assert!(second.published_at.expect("second") >= first.published_at.expect("first"));
}

#[tokio::test]
async fn deleting_a_post_removes_its_comments() {
    let h = harness().await;
    let post = h.editor.create(h.author.id, input("A", "body")).await.expect("create");
    h.editor.publish(post.id).await.expect("publish");

    h.comments
        .submit(
            post.id,
            CommentInput {
                author_name: "Grace".to_string(),
                body: "Nice!".to_string(),
            },
        )
        .await
        .expect("submit comment");

    h.editor.delete(post.id).await.expect("delete post");

    assert_eq!(
        h.repos.count_for_post(post.id).await.expect("count"),
        0,
        "no orphan comments after post deletion"
    );
    assert!(PostsRepo::find_by_id(&*h.repos, post.id).await.expect("find").is_none());
}

#[tokio::test]
async fn blank_comment_leaves_the_thread_unchanged() {
    let h = harness().await;
    let post = h.editor.create(h.author.id, input("A", "body")).await.expect("create");

    let err = h
        .comments
        .submit(
            post.id,
            CommentInput {
                author_name: "Grace".to_string(),
                body: "   ".to_string(),
            },
        )
        .await
        .expect_err("blank body rejected");

    assert!(matches!(err, CommentError::Invalid(_)));
    assert_eq!(h.repos.count_for_post(post.id).await.expect("count"), 0);
}

#[tokio::test]
async fn approving_twice_is_idempotent() {
    let h = harness().await;
    let post = h.editor.create(h.author.id, input("A", "body")).await.expect("create");
    let comment = h
        .comments
        .submit(
            post.id,
            CommentInput {
                author_name: "Grace".to_string(),
                body: "Nice!".to_string(),
            },
        )
        .await
        .expect("submit");

    let once = h.comments.approve(comment.id).await.expect("approve");
    let twice = h.comments.approve(comment.id).await.expect("approve again");

    assert!(once.approved);
    assert!(twice.approved);
    assert_eq!(once.id, twice.id);
}

#[tokio::test]
async fn page_numbers_clamp_to_the_available_range() {
    let h = harness().await;
    for n in 0..5 {
        let post = h
            .editor
            .create(h.author.id, input(&format!("Post {n}"), "body"))
            .await
            .expect("create");
        h.editor.publish(post.id).await.expect("publish");
    }

    let garbled = h.catalog.front_page(Some("banana")).await.expect("page");
    assert_eq!(garbled.number, 1);

    let beyond = h.catalog.front_page(Some("99")).await.expect("page");
    assert_eq!(beyond.number, beyond.total_pages);
    assert_eq!(beyond.total_pages, 3);
    assert_eq!(beyond.items.len(), 1);

    // Parseable numbers below one are out of range, not a default to page 1.
    let below = h.catalog.front_page(Some("0")).await.expect("page");
    assert_eq!(below.number, below.total_pages);
    let negative = h.catalog.front_page(Some("-3")).await.expect("page");
    assert_eq!(negative.number, negative.total_pages);
}

#[tokio::test]
async fn hello_post_publishing_scenario() {
    let h = harness().await;

    let hello = h
        .editor
        .create(h.author.id, input("Hello", "First post."))
        .await
        .expect("create draft");

    let drafts = h.catalog.drafts().await.expect("drafts");
    assert!(drafts.iter().any(|p| p.id == hello.id));
    let front = h.catalog.front_page(None).await.expect("front page");
    assert!(front.items.iter().all(|p| p.id != hello.id));

    h.editor.publish(hello.id).await.expect("publish");
    let front = h.catalog.front_page(None).await.expect("front page");
    assert_eq!(front.items.first().map(|p| p.id), Some(hello.id));

    let comment = h
        .comments
        .submit(
            hello.id,
            CommentInput {
                author_name: "Grace".to_string(),
                body: "Nice!".to_string(),
            },
        )
        .await
        .expect("submit comment");

    let detail = h
        .catalog
        .post_detail(hello.id, None)
        .await
        .expect("detail");
    let visible = detail
        .comments
        .items
        .iter()
        .find(|c| c.id == comment.id)
        .expect("comment in thread");
    assert!(!visible.approved);

    h.comments.approve(comment.id).await.expect("approve");
    let detail = h
        .catalog
        .post_detail(hello.id, None)
        .await
        .expect("detail");
    assert!(
        detail
            .comments
            .items
            .iter()
            .find(|c| c.id == comment.id)
            .expect("comment in thread")
            .approved
    );
}
