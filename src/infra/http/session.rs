use axum::{
    extract::FromRequestParts,
    http::{Uri, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded::Serializer;

use crate::application::auth::SessionUser;

use super::HttpState;

fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    let header = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

fn session_from_parts(parts: &Parts, state: &HttpState) -> Option<SessionUser> {
    let token = cookie_value(parts, state.auth.cookie_name())?;
    state.auth.verify_token(token).ok()
}

/// Login URL carrying the full original path and query as the return target.
fn login_redirect_target(uri: &Uri) -> String {
    let next = match uri.query() {
        Some(query) => format!("{}?{query}", uri.path()),
        None => uri.path().to_string(),
    };
    let query = Serializer::new(String::new())
        .append_pair("next", &next)
        .finish();
    format!("/login?{query}")
}

/// Extractor for gated routes. Requests without a valid session cookie are
/// redirected to the login form with the original path as the `next` target.
pub struct CurrentUser(pub SessionUser);

impl FromRequestParts<HttpState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        match session_from_parts(parts, state) {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(Redirect::to(&login_redirect_target(&parts.uri)).into_response()),
        }
    }
}

/// Extractor for public routes that render differently for signed-in authors.
pub struct MaybeUser(pub Option<SessionUser>);

impl FromRequestParts<HttpState> for MaybeUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(session_from_parts(parts, state)))
    }
}

impl MaybeUser {
    pub fn username(&self) -> Option<String> {
        self.0.as_ref().map(|user| user.username.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::{num::NonZeroU32, sync::Arc};

    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;

    use crate::application::{
        auth::AuthService,
        catalog::CatalogService,
        comments::CommentService,
        editor::EditorService,
        repos::{CommentsRepo, CommentsWriteRepo, PostsRepo, PostsWriteRepo, UsersRepo},
    };
    use crate::config::AuthSettings;
    use crate::infra::db::PostgresRepositories;

    use super::*;

    // The pool is lazy and never touched; the extractor only reads the
    // cookie header and the signing key.
    fn state() -> HttpState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://foglio@localhost/foglio")
            .expect("lazy pool");
        let repos = Arc::new(PostgresRepositories::new(pool));

        let posts: Arc<dyn PostsRepo> = repos.clone();
        let posts_write: Arc<dyn PostsWriteRepo> = repos.clone();
        let comments: Arc<dyn CommentsRepo> = repos.clone();
        let comments_write: Arc<dyn CommentsWriteRepo> = repos.clone();
        let users: Arc<dyn UsersRepo> = repos.clone();

        let settings = AuthSettings {
            session_secret: "unit-test-secret".to_string(),
            session_ttl_hours: NonZeroU32::new(24).expect("non-zero ttl"),
            cookie_name: "foglio_session".to_string(),
        };

        HttpState {
            catalog: Arc::new(CatalogService::new(posts.clone(), comments.clone())),
            editor: Arc::new(EditorService::new(posts.clone(), posts_write)),
            comments: Arc::new(CommentService::new(posts, comments, comments_write)),
            auth: Arc::new(AuthService::new(users, &settings)),
            db: repos,
        }
    }

    fn parts_for(uri: &str, cookie: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = cookie {
            builder = builder.header(header::COOKIE, value);
        }
        let request = builder.body(()).expect("request");
        request.into_parts().0
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .expect("location header")
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let parts = parts_for("/drafts", Some("theme=dark; foglio_session=abc123; other=1"));
        assert_eq!(cookie_value(&parts, "foglio_session"), Some("abc123"));
    }

    #[test]
    fn cookie_value_misses_absent_cookie() {
        let parts = parts_for("/drafts", Some("theme=dark"));
        assert_eq!(cookie_value(&parts, "foglio_session"), None);
    }

    #[tokio::test]
    async fn gated_request_without_session_redirects_to_login() {
        let state = state();
        let mut parts = parts_for("/drafts", None);

        let response = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .expect_err("anonymous request rejected");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login?next=%2Fdrafts");
    }

    #[tokio::test]
    async fn gated_request_with_garbage_cookie_redirects_to_login() {
        let state = state();
        let mut parts = parts_for("/post/new", Some("foglio_session=not-a-token"));

        let response = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .expect_err("forged session rejected");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login?next=%2Fpost%2Fnew");
    }

    #[test]
    fn login_target_keeps_the_query_string() {
        let uri: Uri = "/post/42/edit?page=2".parse().expect("uri");
        assert_eq!(
            login_redirect_target(&uri),
            "/login?next=%2Fpost%2F42%2Fedit%3Fpage%3D2"
        );
    }
}
