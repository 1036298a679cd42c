//! Live-serve mode: render markdown on request, straight from a directory.
//!
//! Nothing is built or relocated. Every request reads the file system afresh,
//! so edits show up on the next reload.
//!
//! | Request | Response |
//! |---------|----------|
//! | `GET /` | catalog of the markdown files directly in the directory |
//! | `GET /<path>.md` | that document rendered to HTML |
//! | `GET /images/<name>` | raw bytes from `<dir>/images/` |
//! | anything else | `404 not found` |
//!
//! Documents need not be UTF-8; invalid bytes render as U+FFFD. A document
//! or catalog that cannot be read is a 500 with the error text as body. The
//! server logs it and keeps going.

use crate::classify::Classifier;
use crate::config::{ConfigError, ServeConfig, validate_directory};
use crate::render::render_markdown;
use axum::{
    Router,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use std::io;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Catalog body when the directory holds no markdown.
pub const CATALOG_EMPTY: &str = "No markdown file (.md) has been found in working directory.";

pub const NOT_FOUND_BODY: &str = "404 not found";

/// URL prefix under which `<dir>/images/` is served.
pub const IMAGES_PREFIX: &str = "/images";

#[derive(Error, Debug)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to bind to {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("server error: {0}")]
    Serve(io::Error),
}

#[derive(Clone)]
struct AppState {
    config: Arc<ServeConfig>,
}

/// All live-serve routes over `config.dir`.
pub fn router(config: ServeConfig) -> Router {
    let images = ServeDir::new(config.dir.join("images"));
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(serve_catalog))
        .nest_service(IMAGES_PREFIX, images)
        .route("/{*path}", get(serve_document))
        .fallback(not_found)
        .with_state(state)
}

/// Bind to `127.0.0.1:<port>` and serve until the process is stopped.
pub async fn serve(config: ServeConfig) -> Result<(), ServeError> {
    validate_directory(&config.dir)?;

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;

    tracing::info!(dir = %config.dir.display(), "Visit http://localhost:{}", config.port);

    let app = router(config).layer(TraceLayer::new_for_http());
    axum::serve(listener, app).await.map_err(ServeError::Serve)
}

async fn serve_catalog(State(state): State<AppState>) -> Response {
    let dir = &state.config.dir;
    match list_markdown(dir, &state.config.classifier).await {
        Ok(names) => Html(render_markdown(&catalog_markdown(&names))).into_response(),
        Err(e) => {
            let message = format!(
                "failed to list files in working directory {dir:?}, make sure it has not been deleted: {e}"
            );
            tracing::error!("{message}");
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}

async fn serve_document(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
) -> Response {
    if !state.config.classifier.is_markdown(Path::new(&path)) {
        return not_found().await;
    }
    let Some(file) = resolve_document(&state.config.dir, &path) else {
        return not_found().await;
    };

    match fs::read(&file).await {
        Ok(bytes) => Html(render_markdown(&String::from_utf8_lossy(&bytes))).into_response(),
        Err(e) => {
            tracing::error!(path = %file.display(), "failed to read document: {e}");
            let message = format!("failed to read local file, make sure {path:?} exists");
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

/// Join a request path onto `dir`, refusing anything but plain names.
fn resolve_document(dir: &Path, request: &str) -> Option<PathBuf> {
    let relative = Path::new(request);
    let mut components = relative.components().peekable();
    components.peek()?;
    if components.any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(dir.join(relative))
}

/// Names of markdown files directly in `dir`, sorted.
pub async fn list_markdown(dir: &Path, classifier: &Classifier) -> io::Result<Vec<String>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            continue;
        }
        let path = entry.path();
        if classifier.is_markdown(&path) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Catalog page source: one relative link per document.
pub fn catalog_markdown(names: &[String]) -> String {
    if names.is_empty() {
        return CATALOG_EMPTY.to_string();
    }
    let mut out = String::from("## Catalog:\n");
    for name in names {
        out.push_str(&format!("* [{name}](./{name})\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::test_helpers::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tower::ServiceExt;

    async fn get_path(dir: &Path, uri: &str) -> (StatusCode, String, Option<String>) {
        let app = router(ServeConfig::new(dir, &SiteConfig::default()));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned(), content_type)
    }

    #[test]
    fn catalog_markdown_lists_each_document() {
        let md = catalog_markdown(&["a.md".into(), "b.md".into()]);
        assert_eq!(md, "## Catalog:\n* [a.md](./a.md)\n* [b.md](./b.md)\n");
    }

    #[test]
    fn catalog_markdown_empty_message() {
        assert_eq!(catalog_markdown(&[]), CATALOG_EMPTY);
    }

    #[test]
    fn resolve_document_rejects_traversal() {
        let dir = Path::new("/srv");
        assert_eq!(resolve_document(dir, "../etc/x.md"), None);
        assert_eq!(resolve_document(dir, "a/../../x.md"), None);
        assert_eq!(resolve_document(dir, "/etc/x.md"), None);
        assert_eq!(resolve_document(dir, ""), None);
        assert_eq!(
            resolve_document(dir, "notes/a.md"),
            Some(PathBuf::from("/srv/notes/a.md"))
        );
    }

    #[tokio::test]
    async fn empty_directory_serves_empty_catalog() {
        let tmp = source_tree(&[("notes.txt", "t")]);
        let (status, body, content_type) = get_path(tmp.path(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("<p>{CATALOG_EMPTY}</p>\n"));
        assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn catalog_lists_top_level_markdown_sorted() {
        let tmp = source_tree(&[
            ("b.md", "# B"),
            ("a.md", "# A"),
            ("sub/c.md", "# C"),
            ("x.jpg", "x"),
        ]);
        let (status, body, _) = get_path(tmp.path(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h2>Catalog:</h2>"), "{body}");
        assert!(body.contains(r#"<a href="./a.md">a.md</a>"#));
        assert!(body.contains(r#"<a href="./b.md">b.md</a>"#));
        assert!(body.find("./a.md").unwrap() < body.find("./b.md").unwrap());
        assert!(!body.contains("c.md"));
        assert!(!body.contains("x.jpg"));
    }

    #[tokio::test]
    async fn markdown_document_is_rendered() {
        let tmp = source_tree(&[("a.md", "# Hello\n\n![](images/cat.jpg)")]);
        let (status, body, content_type) = get_path(tmp.path(), "/a.md").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("<h1>Hello</h1>"));
        // Live mode never rewrites image references.
        assert!(body.contains(r#"src="images/cat.jpg""#));
        assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn nested_markdown_document_is_rendered() {
        let tmp = source_tree(&[("notes/deep.md", "*deep*")]);
        let (status, body, _) = get_path(tmp.path(), "/notes/deep.md").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<p><em>deep</em></p>\n");
    }

    #[tokio::test]
    async fn missing_markdown_is_server_error() {
        let tmp = source_tree(&[]);
        let (status, body, _) = get_path(tmp.path(), "/gone.md").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("failed to read local file"), "{body}");
        assert!(body.contains("gone.md"));
    }

    #[tokio::test]
    async fn non_utf8_markdown_is_rendered_lossily() {
        let tmp = source_tree(&[]);
        std::fs::write(tmp.path().join("a.md"), b"caf\xe9 ![](img/x.jpg)").unwrap();
        let (status, body, _) = get_path(tmp.path(), "/a.md").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("caf\u{FFFD}"), "{body}");
        assert!(body.contains(r#"src="img/x.jpg""#), "{body}");
    }

    #[tokio::test]
    async fn unreadable_directory_catalog_is_server_error() {
        let tmp = source_tree(&[]);
        let (status, body, _) = get_path(&tmp.path().join("gone"), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            body.starts_with("failed to list files in working directory"),
            "{body}"
        );
        assert!(body.contains("make sure it has not been deleted"));
    }

    #[tokio::test]
    async fn non_markdown_path_is_not_found() {
        let tmp = source_tree(&[("notes.txt", "secret")]);
        let (status, body, _) = get_path(tmp.path(), "/notes.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_FOUND_BODY);
    }

    #[tokio::test]
    async fn traversal_is_not_found() {
        let tmp = source_tree(&[("inner/a.md", "# A")]);
        let dir = tmp.path().join("inner");
        let (status, _, _) = get_path(&dir, "/%2E%2E/inner/a.md").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn images_are_served_raw() {
        let tmp = source_tree(&[("images/cat.jpg", "JPEGBYTES")]);
        let (status, body, _) = get_path(tmp.path(), "/images/cat.jpg").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "JPEGBYTES");
    }

    #[tokio::test]
    async fn missing_image_is_not_found() {
        let tmp = source_tree(&[("images/cat.jpg", "x")]);
        let (status, _, _) = get_path(tmp.path(), "/images/dog.jpg").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_markdown_skips_directories_and_other_files() {
        let tmp = source_tree(&[("b.MD", "b"), ("a.md", "a"), ("dir.md/x.md", "x"), ("c.txt", "c")]);
        let names = list_markdown(tmp.path(), &Classifier::default())
            .await
            .unwrap();
        assert_eq!(names, vec!["a.md", "b.MD"]);
    }

    #[tokio::test]
    async fn serve_rejects_missing_directory() {
        let tmp = source_tree(&[]);
        let config = ServeConfig::new(tmp.path().join("nope"), &SiteConfig::default());
        let result = serve(config).await;
        assert!(matches!(result, Err(ServeError::Config(ConfigError::NotFound { .. }))));
    }
}
