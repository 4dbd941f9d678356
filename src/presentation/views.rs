use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, macros::format_description};

use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::Page;
use crate::domain::entities::{CommentRecord, PostRecord};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(current_user: Option<String>) -> Response {
    let mut response = render_template_response(
        ErrorTemplate {
            current_user,
            heading: "Not found",
            message: "The page you were looking for does not exist.",
        },
        StatusCode::NOT_FOUND,
    );
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

fn timestamp_label(at: OffsetDateTime) -> String {
    let format = format_description!("[month repr:long] [day], [year] [hour]:[minute]");
    at.format(&format).unwrap_or_else(|_| at.to_string())
}

const EXCERPT_CHARS: usize = 280;

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    format!("{}…", cut.trim_end())
}

/// One post in a listing.
#[derive(Clone)]
pub struct PostCard {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub timestamp: String,
}

impl PostCard {
    /// Card for the public catalog, labelled with the publish time.
    pub fn published(record: &PostRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title.clone(),
            excerpt: excerpt(&record.body),
            author: record.author_username.clone(),
            timestamp: record
                .published_at
                .map(timestamp_label)
                .unwrap_or_default(),
        }
    }

    /// Card for the draft list, labelled with the creation time.
    pub fn draft(record: &PostRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title.clone(),
            excerpt: excerpt(&record.body),
            author: record.author_username.clone(),
            timestamp: timestamp_label(record.created_at),
        }
    }
}

#[derive(Clone)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author: String,
    pub created: String,
    pub published: Option<String>,
}

impl PostView {
    pub fn from_record(record: &PostRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title.clone(),
            body: record.body.clone(),
            author: record.author_username.clone(),
            created: timestamp_label(record.created_at),
            published: record.published_at.map(timestamp_label),
        }
    }
}

#[derive(Clone)]
pub struct CommentView {
    pub id: String,
    pub author_name: String,
    pub body: String,
    pub created: String,
    pub approved: bool,
}

impl CommentView {
    pub fn from_record(record: &CommentRecord) -> Self {
        Self {
            id: record.id.to_string(),
            author_name: record.author_name.clone(),
            body: record.body.clone(),
            created: timestamp_label(record.created_at),
            approved: record.approved,
        }
    }
}

/// Previous/next links for an offset-paginated listing.
#[derive(Clone)]
pub struct PaginationView {
    pub number: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous: u32,
    pub next: u32,
    pub base_path: String,
}

impl PaginationView {
    pub fn from_page<T>(page: &Page<T>, base_path: impl Into<String>) -> Self {
        Self {
            number: page.number,
            total_pages: page.total_pages,
            has_previous: page.has_previous(),
            has_next: page.has_next(),
            previous: page.previous_number(),
            next: page.next_number(),
            base_path: base_path.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub current_user: Option<String>,
    pub posts: Vec<PostCard>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub current_user: Option<String>,
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub pagination: PaginationView,
    pub can_moderate: bool,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub current_user: Option<String>,
    pub heading: &'static str,
    pub action: String,
    pub title_value: String,
    pub body_value: String,
    pub title_error: Option<&'static str>,
    pub body_error: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "post_delete.html")]
pub struct PostDeleteTemplate {
    pub current_user: Option<String>,
    pub post: PostView,
}

#[derive(Template)]
#[template(path = "draft_list.html")]
pub struct DraftListTemplate {
    pub current_user: Option<String>,
    pub posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "comment_form.html")]
pub struct CommentFormTemplate {
    pub current_user: Option<String>,
    pub post: PostView,
    pub author_value: String,
    pub body_value: String,
    pub author_error: Option<&'static str>,
    pub body_error: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub current_user: Option<String>,
    pub next_value: String,
    pub username_value: String,
    pub error: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub current_user: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub current_user: Option<String>,
    pub heading: &'static str,
    pub message: &'static str,
}
