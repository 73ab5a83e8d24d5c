//! HTTP Basic authentication against the single configured credential.

use crate::router::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{
        header,
        HeaderValue,
        Request,
        StatusCode,
    },
    middleware::Next,
    response::{
        IntoResponse,
        Response,
    },
};
use base64::prelude::{
    Engine as _,
    BASE64_STANDARD,
};
use subtle::ConstantTimeEq;
use sync_status_config::Credentials;

pub const REALM: &str = "Basic realm=\"Anki Dashboard\"";

/// `user:pass` from an `Authorization: Basic ...` header value.
fn decode_basic(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?.trim();
    let decoded = BASE64_STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Both halves are always compared so the timing does not reveal which one
/// was wrong.
pub fn matches(expected: &Credentials, username: &str, password: &str) -> bool {
    let user_ok = username.as_bytes().ct_eq(expected.username().as_bytes());
    let pass_ok = password.as_bytes().ct_eq(expected.password().as_bytes());
    (user_ok & pass_ok).into()
}

fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM))],
        "Authentication required",
    )
        .into_response()
}

pub async fn basic_auth(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let Some(expected) = state.config.auth.as_ref() else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(decode_basic);

    match provided {
        Some((username, password)) if matches(expected, &username, &password) => next.run(req).await,
        Some((username, _)) => {
            info!(user = %username, path = %req.uri().path(), "rejected credentials");
            challenge()
        }
        None => challenge(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        assert_status,
        get,
        request,
        setup_app,
    };

    #[test]
    fn decodes_basic_header() {
        // "admin:se:cret"
        assert_eq!(
            decode_basic("Basic YWRtaW46c2U6Y3JldA=="),
            Some(("admin".to_string(), "se:cret".to_string()))
        );
        assert_eq!(decode_basic("Bearer abc"), None);
        assert_eq!(decode_basic("Basic !!!"), None);
        // "nocolon"
        assert_eq!(decode_basic("Basic bm9jb2xvbg=="), None);
    }

    #[test]
    fn credentials_must_match_exactly() {
        let expected = Credentials::new("admin", "hunter2");
        assert!(matches(&expected, "admin", "hunter2"));
        assert!(!matches(&expected, "admin", "hunter"));
        assert!(!matches(&expected, "Admin", "hunter2"));
        assert!(!matches(&expected, "", ""));
    }

    fn with_basic(uri: &str, encoded: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::AUTHORIZATION, format!("Basic {encoded}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn gated_routes_challenge_without_credentials() {
        let app = setup_app(Some(Credentials::new("admin", "hunter2")));

        for uri in ["/api/stats", "/api/syncs"] {
            let response = get(app.router.clone(), uri).await;

            assert_status(&response, StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers()[header::WWW_AUTHENTICATE], REALM);
        }
    }

    #[tokio::test]
    async fn correct_credentials_pass_the_gate() {
        let app = setup_app(Some(Credentials::new("admin", "hunter2")));

        // "admin:hunter2"
        let response = request(app.router, with_basic("/api/features", "YWRtaW46aHVudGVyMg==")).await;

        assert_status(&response, StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_password_is_challenged() {
        let app = setup_app(Some(Credentials::new("admin", "hunter2")));

        // "admin:wrong"
        let response = request(app.router, with_basic("/api/features", "YWRtaW46d3Jvbmc=")).await;

        assert_status(&response, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_is_never_gated() {
        let app = setup_app(Some(Credentials::new("admin", "hunter2")));

        assert_status(&get(app.router, "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn gate_is_open_without_configured_credentials() {
        let app = setup_app(None);

        assert_status(&get(app.router, "/api/features").await, StatusCode::OK);
    }
}
