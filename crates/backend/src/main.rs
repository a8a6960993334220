mod document;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use document::MarkerDocument;

/// Server settings, read from the environment.
#[derive(Debug, Clone)]
struct Config {
    port: String,
    assets_dir: PathBuf,
    dist_dir: PathBuf,
    markers_path: PathBuf,
}

impl Config {
    fn from_env() -> Self {
        let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
        let assets_dir = PathBuf::from(var("ASSETS_DIR", "assets"));
        let markers_path = std::env::var("MARKERS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| assets_dir.join("markers.json"));
        Config {
            port: var("PORT", "3000"),
            dist_dir: PathBuf::from(var("DIST_DIR", "dist")),
            assets_dir,
            markers_path,
        }
    }
}

#[derive(Clone)]
struct AppState {
    document: Arc<MarkerDocument>,
    dist_dir: PathBuf,
}

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";
const CACHE_NONE: &str = "no-cache";

/// Build the full application router.
fn build_app(config: &Config, document: MarkerDocument) -> Router {
    // Static file routers are stateless, merge them before adding app state
    let static_files = Router::new()
        .nest("/static", cached_static_router(&config.assets_dir, CACHE_1DAY))
        .nest("/dist", cached_static_router(&config.dist_dir, CACHE_IMMUTABLE))
        .nest(
            "/assets",
            cached_static_router(&config.dist_dir.join("assets"), CACHE_IMMUTABLE),
        );

    let state = AppState {
        document: Arc::new(document),
        dist_dir: config.dist_dir.clone(),
    };

    let index = Router::new()
        .route("/", get(serve_index))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_NONE),
        ));

    index
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let document = MarkerDocument::load_or_empty(&config.markers_path);
    let app = build_app(&config, document);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(port = %config.port, dist = %config.dist_dir.display(), "Server running at http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

const FALLBACK_INDEX: &str = r#"<!DOCTYPE html>
<html>
<head><title>Marker Map</title></head>
<body>
<h1>Marker Map</h1>
<p>Frontend not built yet.</p>
</body>
</html>"#;

async fn serve_index(State(state): State<AppState>) -> Html<String> {
    // Serve the built frontend, fall back to a simple message
    let index_path = state.dist_dir.join("index.html");
    let page = match tokio::fs::read_to_string(&index_path).await {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!(error = %e, path = %index_path.display(), "Serving fallback index");
            FALLBACK_INDEX.to_string()
        }
    };
    Html(document::inject_templates(&page, &state.document.render_templates()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    /// Create a temp dir with a test file and return the dir path.
    fn temp_dir_with_file(file_name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(file_name), content).unwrap();
        dir
    }

    fn test_config(assets_dir: &Path, dist_dir: &Path) -> Config {
        Config {
            port: "0".to_string(),
            assets_dir: assets_dir.to_path_buf(),
            dist_dir: dist_dir.to_path_buf(),
            markers_path: assets_dir.join("markers.json"),
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(resp: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_static_assets_have_1day_cache() {
        let assets_dir = temp_dir_with_file("markers.json", "[]");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");
        let app = build_app(&test_config(assets_dir.path(), dist_dir.path()), MarkerDocument::default());

        let resp = app.oneshot(get("/static/markers.json")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=86400, must-revalidate"
        );
    }

    #[tokio::test]
    async fn test_dist_bundles_have_immutable_cache() {
        let assets_dir = temp_dir_with_file("markers.json", "[]");
        let dist_dir = temp_dir_with_file("app-abc123.js", "bundle()");
        let app = build_app(&test_config(assets_dir.path(), dist_dir.path()), MarkerDocument::default());

        let resp = app.oneshot(get("/dist/app-abc123.js")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_dist_assets_have_immutable_cache() {
        let assets_dir = temp_dir_with_file("markers.json", "[]");
        let dist_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dist_dir.path().join("assets")).unwrap();
        std::fs::write(dist_dir.path().join("assets/style-xyz.css"), "body{}").unwrap();
        let app = build_app(&test_config(assets_dir.path(), dist_dir.path()), MarkerDocument::default());

        let resp = app.oneshot(get("/assets/style-xyz.css")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_missing_static_file_returns_404() {
        let assets_dir = temp_dir_with_file("markers.json", "[]");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");
        let app = build_app(&test_config(assets_dir.path(), dist_dir.path()), MarkerDocument::default());

        let resp = app.oneshot(get("/static/nonexistent.txt")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_embeds_marker_templates() {
        let assets_dir = temp_dir_with_file(
            "markers.json",
            r#"[{"name":"Berlin","location":[13.4,52.5],"info":"<p>capital</p>"}]"#,
        );
        let dist_dir = temp_dir_with_file("index.html", "<html><body><div id=\"main\"></div></body></html>");
        let config = test_config(assets_dir.path(), dist_dir.path());
        let document = MarkerDocument::load(&config.markers_path).unwrap();
        let app = build_app(&config, document);

        let resp = app.oneshot(get("/")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("cache-control").unwrap(), "no-cache");
        let body = body_string(resp).await;
        assert!(body.contains(r#"<template class="marker" data-lon="13.4" data-lat="52.5">"#));
        assert!(body.contains(r#"<span class="name">Berlin</span>"#));
        assert!(body.ends_with("</body></html>"));
    }

    #[tokio::test]
    async fn test_index_falls_back_without_build() {
        let assets_dir = temp_dir_with_file("markers.json", "[]");
        let dist_dir = tempfile::tempdir().unwrap();
        let app = build_app(&test_config(assets_dir.path(), dist_dir.path()), MarkerDocument::default());

        let resp = app.oneshot(get("/")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_string(resp).await;
        assert!(body.contains("Frontend not built yet."));
        assert!(!body.contains("<template"));
    }
}
