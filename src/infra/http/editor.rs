use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::catalog::CatalogError;
use crate::application::comments::CommentError;
use crate::application::editor::{EditorError, PostFormErrors, PostInput};
use crate::presentation::views::{
    DraftListTemplate, PostCard, PostDeleteTemplate, PostFormTemplate, PostView,
    render_not_found_response, render_template_response,
};

use super::{HttpState, repo_error_to_http, session::CurrentUser};

#[derive(Debug, Deserialize)]
pub struct PostForm {
    title: String,
    body: String,
}

fn post_form_template(
    username: String,
    heading: &'static str,
    action: String,
    input: &PostInput,
    errors: &PostFormErrors,
) -> PostFormTemplate {
    PostFormTemplate {
        current_user: Some(username),
        heading,
        action,
        title_value: input.title.clone(),
        body_value: input.body.clone(),
        title_error: errors.title,
        body_error: errors.body,
    }
}

pub async fn new_post_form(CurrentUser(user): CurrentUser) -> Response {
    render_template_response(
        post_form_template(
            user.username,
            "New post",
            "/post/new".to_string(),
            &PostInput::default(),
            &PostFormErrors::default(),
        ),
        StatusCode::OK,
    )
}

pub async fn create_post(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<PostForm>,
) -> Response {
    let input = PostInput {
        title: form.title,
        body: form.body,
    };
    match state.editor.create(user.id, input.clone()).await {
        Ok(record) => Redirect::to(&format!("/post/{}", record.id)).into_response(),
        Err(EditorError::Invalid(errors)) => render_template_response(
            post_form_template(
                user.username,
                "New post",
                "/post/new".to_string(),
                &input,
                &errors,
            ),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        Err(EditorError::NotFound) => render_not_found_response(Some(user.username)),
        Err(EditorError::Repo(err)) => {
            repo_error_to_http("infra::http::editor::create_post", err).into_response()
        }
    }
}

pub async fn edit_post_form(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return render_not_found_response(Some(user.username));
    };

    match state.editor.load(id).await {
        Ok(record) => render_template_response(
            post_form_template(
                user.username,
                "Edit post",
                format!("/post/{id}/edit"),
                &PostInput {
                    title: record.title,
                    body: record.body,
                },
                &PostFormErrors::default(),
            ),
            StatusCode::OK,
        ),
        Err(EditorError::NotFound | EditorError::Invalid(_)) => {
            render_not_found_response(Some(user.username))
        }
        Err(EditorError::Repo(err)) => {
            repo_error_to_http("infra::http::editor::edit_post_form", err).into_response()
        }
    }
}

pub async fn update_post(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<PostForm>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return render_not_found_response(Some(user.username));
    };

    let input = PostInput {
        title: form.title,
        body: form.body,
    };
    match state.editor.update(id, input.clone()).await {
        Ok(record) => Redirect::to(&format!("/post/{}", record.id)).into_response(),
        Err(EditorError::Invalid(errors)) => render_template_response(
            post_form_template(
                user.username,
                "Edit post",
                format!("/post/{id}/edit"),
                &input,
                &errors,
            ),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        Err(EditorError::NotFound) => render_not_found_response(Some(user.username)),
        Err(EditorError::Repo(err)) => {
            repo_error_to_http("infra::http::editor::update_post", err).into_response()
        }
    }
}

pub async fn delete_post_confirm(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return render_not_found_response(Some(user.username));
    };

    match state.editor.load(id).await {
        Ok(record) => render_template_response(
            PostDeleteTemplate {
                current_user: Some(user.username),
                post: PostView::from_record(&record),
            },
            StatusCode::OK,
        ),
        Err(EditorError::NotFound | EditorError::Invalid(_)) => {
            render_not_found_response(Some(user.username))
        }
        Err(EditorError::Repo(err)) => {
            repo_error_to_http("infra::http::editor::delete_post_confirm", err).into_response()
        }
    }
}

pub async fn delete_post(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return render_not_found_response(Some(user.username));
    };

    match state.editor.delete(id).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(EditorError::NotFound | EditorError::Invalid(_)) => {
            render_not_found_response(Some(user.username))
        }
        Err(EditorError::Repo(err)) => {
            repo_error_to_http("infra::http::editor::delete_post", err).into_response()
        }
    }
}

pub async fn draft_list(State(state): State<HttpState>, CurrentUser(user): CurrentUser) -> Response {
    match state.catalog.drafts().await {
        Ok(records) => render_template_response(
            DraftListTemplate {
                current_user: Some(user.username),
                posts: records.iter().map(PostCard::draft).collect(),
            },
            StatusCode::OK,
        ),
        Err(CatalogError::NotFound) => render_not_found_response(Some(user.username)),
        Err(CatalogError::Repo(err)) => {
            repo_error_to_http("infra::http::editor::draft_list", err).into_response()
        }
    }
}

pub async fn publish_post(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return render_not_found_response(Some(user.username));
    };

    match state.editor.publish(id).await {
        Ok(record) => Redirect::to(&format!("/post/{}", record.id)).into_response(),
        Err(EditorError::NotFound | EditorError::Invalid(_)) => {
            render_not_found_response(Some(user.username))
        }
        Err(EditorError::Repo(err)) => {
            repo_error_to_http("infra::http::editor::publish_post", err).into_response()
        }
    }
}

pub async fn approve_comment(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return render_not_found_response(Some(user.username));
    };

    match state.comments.approve(id).await {
        Ok(record) => Redirect::to(&format!("/post/{}", record.post_id)).into_response(),
        Err(CommentError::PostNotFound | CommentError::CommentNotFound) => {
            render_not_found_response(Some(user.username))
        }
        Err(CommentError::Invalid(_)) => render_not_found_response(Some(user.username)),
        Err(CommentError::Repo(err)) => {
            repo_error_to_http("infra::http::editor::approve_comment", err).into_response()
        }
    }
}

pub async fn remove_comment(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return render_not_found_response(Some(user.username));
    };

    match state.comments.remove(id).await {
        Ok(post_id) => Redirect::to(&format!("/post/{post_id}")).into_response(),
        Err(CommentError::PostNotFound | CommentError::CommentNotFound) => {
            render_not_found_response(Some(user.username))
        }
        Err(CommentError::Invalid(_)) => render_not_found_response(Some(user.username)),
        Err(CommentError::Repo(err)) => {
            repo_error_to_http("infra::http::editor::remove_comment", err).into_response()
        }
    }
}
