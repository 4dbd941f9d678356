use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::catalog::CatalogError;
use crate::application::comments::{CommentError, CommentFormErrors, CommentInput};
use crate::presentation::views::{
    AboutTemplate, CommentFormTemplate, CommentView, IndexTemplate, PaginationView, PostCard,
    PostDetailTemplate, PostView, render_not_found_response, render_template_response,
};

use super::{HttpState, repo_error_to_http, session::MaybeUser};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

pub async fn index(
    State(state): State<HttpState>,
    user: MaybeUser,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = match state.catalog.front_page(query.page.as_deref()).await {
        Ok(page) => page,
        Err(CatalogError::NotFound) => return render_not_found_response(user.username()),
        Err(CatalogError::Repo(err)) => {
            return repo_error_to_http("infra::http::public::index", err).into_response();
        }
    };

    let pagination = PaginationView::from_page(&page, "/");
    let posts = page.items.iter().map(PostCard::published).collect();
    render_template_response(
        IndexTemplate {
            current_user: user.username(),
            posts,
            pagination,
        },
        StatusCode::OK,
    )
}

pub async fn about(user: MaybeUser) -> Response {
    render_template_response(
        AboutTemplate {
            current_user: user.username(),
        },
        StatusCode::OK,
    )
}

pub async fn post_detail(
    State(state): State<HttpState>,
    user: MaybeUser,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return render_not_found_response(user.username());
    };

    let detail = match state.catalog.post_detail(id, query.page.as_deref()).await {
        Ok(detail) => detail,
        Err(CatalogError::NotFound) => return render_not_found_response(user.username()),
        Err(CatalogError::Repo(err)) => {
            return repo_error_to_http("infra::http::public::post_detail", err).into_response();
        }
    };

    let pagination = PaginationView::from_page(&detail.comments, format!("/post/{id}"));
    let comments = detail.comments.items.iter().map(CommentView::from_record).collect();
    render_template_response(
        PostDetailTemplate {
            current_user: user.username(),
            can_moderate: user.0.is_some(),
            post: PostView::from_record(&detail.post),
            comments,
            pagination,
        },
        StatusCode::OK,
    )
}

pub async fn comment_form(
    State(state): State<HttpState>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return render_not_found_response(user.username());
    };

    let post = match state.editor.load(id).await {
        Ok(post) => post,
        Err(_) => return render_not_found_response(user.username()),
    };

    render_template_response(
        CommentFormTemplate {
            current_user: user.username(),
            post: PostView::from_record(&post),
            author_value: String::new(),
            body_value: String::new(),
            author_error: None,
            body_error: None,
        },
        StatusCode::OK,
    )
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    author_name: String,
    body: String,
}

pub async fn submit_comment(
    State(state): State<HttpState>,
    user: MaybeUser,
    Path(id): Path<String>,
    axum::extract::Form(form): axum::extract::Form<CommentForm>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return render_not_found_response(user.username());
    };

    let input = CommentInput {
        author_name: form.author_name,
        body: form.body,
    };
    match state.comments.submit(id, input.clone()).await {
        Ok(_) => Redirect::to(&format!("/post/{id}")).into_response(),
        Err(CommentError::Invalid(errors)) => {
            rerender_comment_form(&state, user, id, input, errors).await
        }
        Err(CommentError::PostNotFound | CommentError::CommentNotFound) => {
            render_not_found_response(user.username())
        }
        Err(CommentError::Repo(err)) => {
            repo_error_to_http("infra::http::public::submit_comment", err).into_response()
        }
    }
}

async fn rerender_comment_form(
    state: &HttpState,
    user: MaybeUser,
    post_id: Uuid,
    input: CommentInput,
    errors: CommentFormErrors,
) -> Response {
    let post = match state.editor.load(post_id).await {
        Ok(post) => post,
        Err(_) => return render_not_found_response(user.username()),
    };

    render_template_response(
        CommentFormTemplate {
            current_user: user.username(),
            post: PostView::from_record(&post),
            author_value: input.author_name,
            body_value: input.body,
            author_error: errors.author_name,
            body_error: errors.body,
        },
        StatusCode::UNPROCESSABLE_ENTITY,
    )
}

pub async fn db_health(State(state): State<HttpState>) -> Response {
    super::db_health_response(state.db.health_check().await)
}

pub async fn fallback(user: MaybeUser) -> Response {
    render_not_found_response(user.username())
}
