use axum::{
    extract::{Form, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::application::auth::AuthError;
use crate::presentation::views::{LoginTemplate, render_template_response};

use super::{HttpState, session::MaybeUser};

/// Only same-site paths are honoured as post-login targets.
fn safe_next(next: &str) -> Option<&str> {
    (next.starts_with('/') && !next.starts_with("//")).then_some(next)
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

pub async fn login_form(user: MaybeUser, Query(query): Query<LoginQuery>) -> Response {
    if user.0.is_some() {
        return Redirect::to("/").into_response();
    }

    render_template_response(
        LoginTemplate {
            current_user: None,
            next_value: query
                .next
                .as_deref()
                .and_then(safe_next)
                .unwrap_or_default()
                .to_string(),
            username_value: String::new(),
            error: None,
        },
        StatusCode::OK,
    )
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    next: String,
}

pub async fn login_submit(State(state): State<HttpState>, Form(form): Form<LoginForm>) -> Response {
    match state.auth.login(&form.username, &form.password).await {
        Ok(token) => {
            let target = safe_next(&form.next).unwrap_or("/");
            let max_age = state.auth.session_ttl().whole_seconds();
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
                state.auth.cookie_name(),
                token,
                max_age,
            );
            ([(header::SET_COOKIE, cookie)], Redirect::to(target)).into_response()
        }
        Err(AuthError::InvalidCredentials | AuthError::Token(_) | AuthError::Hashing(_)) => {
            render_template_response(
                LoginTemplate {
                    current_user: None,
                    next_value: safe_next(&form.next).unwrap_or_default().to_string(),
                    username_value: form.username,
                    error: Some("Invalid username or password."),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
        Err(AuthError::Repo(err)) => {
            super::repo_error_to_http("infra::http::auth::login_submit", err).into_response()
        }
    }
}

pub async fn logout(State(state): State<HttpState>) -> Response {
    let cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        state.auth.cookie_name(),
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next("/drafts"), Some("/drafts"));
        assert_eq!(safe_next("https://evil.example"), None);
        assert_eq!(safe_next("//evil.example"), None);
        assert_eq!(safe_next(""), None);
    }
}
