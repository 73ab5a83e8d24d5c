use crate::router::{
    router,
    AppState,
};
use axum::{
    body::Body,
    http::{
        Request,
        StatusCode,
    },
    response::Response,
    Router,
};
use sync_status_config::{
    Config,
    Credentials,
};
use temp_dir::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub config: Config,
    pub dir: TempDir,
}

/// A router over an empty server tree inside a temp directory. The helper
/// scripts are configured but not created.
pub fn setup_app(auth: Option<Credentials>) -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut config = Config::rooted_at(dir.path());
    config.auth = auth;
    config.backup.script = dir.child("bin").join("backup.sh");
    config.notify.script = dir.child("bin").join("notify.sh");

    for path in [
        &config.data_dir,
        &config.backup_dir,
        &config.log_dir,
        &config.state_dir,
        &dir.child("bin"),
    ] {
        std::fs::create_dir_all(path).unwrap();
    }

    TestApp {
        router: router(AppState::new(config.clone())),
        config,
        dir,
    }
}

pub async fn request(router: Router, request: Request<Body>) -> Response {
    router.oneshot(request).await.unwrap()
}

pub async fn get(router: Router, uri: &str) -> Response {
    request(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post(router: Router, uri: &str, body: &str) -> Response {
    let req = Request::post(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request(router, req).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "expected {expected}, got {}",
        response.status()
    );
}

/// Writes an executable `#!/bin/sh` script at `path`.
#[cfg(unix)]
pub fn stub_script(path: &std::path::Path, body: &str) {
    use std::os::unix::fs::PermissionsExt as _;

    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}
