mod auth;
mod editor;
mod middleware;
mod public;
mod session;

pub use session::{CurrentUser, MaybeUser};

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use sqlx::Error as SqlxError;

use crate::application::{
    auth::AuthService, catalog::CatalogService, comments::CommentService, editor::EditorService,
    error::{ErrorReport, HttpError}, repos::RepoError,
};
use crate::infra::db::PostgresRepositories;

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub catalog: Arc<CatalogService>,
    pub editor: Arc<EditorService>,
    pub comments: Arc<CommentService>,
    pub auth: Arc<AuthService>,
    pub db: Arc<PostgresRepositories>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(public::index))
        .route("/about", get(public::about))
        .route("/post/{id}", get(public::post_detail))
        .route(
            "/post/{id}/comment",
            get(public::comment_form).post(public::submit_comment),
        )
        .route(
            "/post/new",
            get(editor::new_post_form).post(editor::create_post),
        )
        .route(
            "/post/{id}/edit",
            get(editor::edit_post_form).post(editor::update_post),
        )
        .route(
            "/post/{id}/delete",
            get(editor::delete_post_confirm).post(editor::delete_post),
        )
        .route("/drafts", get(editor::draft_list))
        .route("/post/{id}/publish", get(editor::publish_post))
        .route("/comment/{id}/approve", get(editor::approve_comment))
        .route("/comment/{id}/remove", get(editor::remove_comment))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .route("/_health/db", get(public::db_health))
        .fallback(public::fallback)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
        .with_state(state)
}

pub(crate) fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Map a repository error to a consistent HTTP error response.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Integrity { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            message,
        ),
        RepoError::Timeout => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            "Database timeout",
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}
