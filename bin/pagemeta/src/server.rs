//! HTTP host for the generated documents.
//!
//! Serves `/robots.txt` and `/sitemap.xml` when enabled, a head-tag preview
//! for every page, and redirect rules for everything else.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use pagemeta_core::{Page, Site};
use pagemeta_generator::{
    Context, PageMeta, Resolution, SitemapBuilder, html::escape_html, robots_txt,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Server state shared by all handlers.
#[derive(Clone)]
pub struct ServerState {
    pub ctx: Arc<Context>,
    pub site: Arc<Site>,
    /// Vite entries included in every page preview.
    pub entries: Arc<Vec<String>>,
}

impl ServerState {
    pub fn new(ctx: Context, site: Site, entries: Vec<String>) -> Self {
        Self {
            ctx: Arc::new(ctx),
            site: Arc::new(site),
            entries: Arc::new(entries),
        }
    }
}

/// Create the router.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/robots.txt", get(robots_handler))
        .route("/sitemap.xml", get(sitemap_handler))
        .fallback(page_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_handler(State(state): State<ServerState>, method: Method, uri: Uri) -> Response {
    if !state.ctx.config().robots.enable {
        return respond_page(&state, uri.path(), &method);
    }

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_txt(&state.site),
    )
        .into_response()
}

async fn sitemap_handler(State(state): State<ServerState>, method: Method, uri: Uri) -> Response {
    if !state.ctx.config().sitemap.enable {
        return respond_page(&state, uri.path(), &method);
    }

    match SitemapBuilder::new(&state.ctx).sitemap(&state.site) {
        Ok(xml) => ([(header::CONTENT_TYPE, "application/xml")], xml).into_response(),
        Err(e) => {
            error!(error = %e, "failed to build sitemap");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn page_handler(State(state): State<ServerState>, method: Method, uri: Uri) -> Response {
    respond_page(&state, uri.path(), &method)
}

/// Split an optional language prefix off a request path.
fn split_language<'a>(site: &Site, path: &'a str) -> (Option<&'a str>, &'a str) {
    let path = path.trim_matches('/');
    let (first, rest) = path.split_once('/').unwrap_or((path, ""));
    let is_secondary = site.language(first).is_some()
        && site.default_language().is_some_and(|d| d.code != first);
    if is_secondary {
        (Some(first), rest)
    } else {
        (None, path)
    }
}

fn find_page<'a>(site: &'a Site, path: &str) -> Option<&'a Page> {
    if path.is_empty() {
        return site.home();
    }
    site.find(path)
}

fn respond_page(state: &ServerState, path: &str, method: &Method) -> Response {
    let site = &state.site;
    let (lang, page_path) = split_language(site, path);

    if let Some(page) = find_page(site, page_path) {
        return render_page(state, page, lang, StatusCode::OK);
    }

    match state.ctx.redirects().resolve(path, method.as_str()) {
        Resolution::Redirect(location) => {
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        Resolution::Pass | Resolution::ErrorPage => {
            debug!(path, "serving error page");
            match site.error_page() {
                Some(page) => render_page(state, page, lang, StatusCode::NOT_FOUND),
                None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            }
        }
    }
}

fn render_page(state: &ServerState, page: &Page, lang: Option<&str>, status: StatusCode) -> Response {
    let meta = match PageMeta::new(&state.ctx, &state.site, page) {
        Ok(meta) => meta,
        Err(e) => {
            error!(page = %page.id, error = %e, "failed to resolve metadata");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let meta = match lang {
        Some(code) => meta.with_language(code),
        None => meta,
    };

    let head = match meta.head() {
        Ok(head) => head,
        Err(e) => {
            error!(page = %page.id, error = %e, "failed to render head");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut assets = String::new();
    let mut session = state.ctx.vite().session();
    for entry in state.entries.iter() {
        if let Some(css) = session.css(entry) {
            assets.push_str(&css);
            assets.push('\n');
        }
        if let Some(js) = session.js(entry) {
            assets.push_str(&js);
            assets.push('\n');
        }
    }

    let title = escape_html(&meta.title());
    let lang = meta
        .language()
        .map_or("en", |language| language.code.as_str());
    let body = format!(
        "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n{head}{assets}</head>\n<body>\n<h1>{title}</h1>\n</body>\n</html>\n"
    );

    (status, Html(body)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use pagemeta_core::{Config, Language};
    use pagemeta_generator::ManifestResolver;
    use tower::ServiceExt;

    use super::*;

    fn config(extra: &str) -> Config {
        Config::from_toml_str(&format!(
            "[site]\nurl = \"https://example.com\"\n{extra}"
        ))
        .unwrap()
    }

    fn site() -> Site {
        Site::new("https://example.com")
            .with_field("title", "Example")
            .with_children(vec![
                Page::new("home", "home").with_field("title", "Home"),
                Page::new("about", "default").with_field("title", "About"),
                Page::new("error", "error").with_field("title", "Not found"),
            ])
    }

    fn app(config: Config, site: Site, entries: Vec<String>) -> Router {
        let vite = ManifestResolver::from_manifest(None, &config);
        let ctx = Context::builder(config, ".").vite(vite).build().unwrap();
        create_router(ServerState::new(ctx, site, entries))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, location, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_robots_enabled() {
        let app = app(config("[robots]\nenable = true\n"), site(), vec![]);
        let (status, _, body) = get(app, "/robots.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            "User-agent: *\nAllow: /\nSitemap: https://example.com/sitemap.xml"
        );
    }

    #[tokio::test]
    async fn test_disabled_routes_fall_through() {
        let app = app(config(""), site(), vec![]);
        let (status, _, body) = get(app.clone(), "/robots.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<title>Not found</title>"));

        let (status, _, _) = get(app, "/sitemap.xml").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sitemap_enabled() {
        let app = app(config("[sitemap]\nenable = true\n"), site(), vec![]);
        let (status, _, body) = get(app, "/sitemap.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<loc>https://example.com/about</loc>"));
    }

    #[tokio::test]
    async fn test_page_preview() {
        let app = app(config(""), site(), vec!["src/main.ts".to_string()]);
        let (status, _, body) = get(app, "/about").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>About</title>"));
        assert!(body.contains(r#"<link rel="canonical" href="https://example.com/about">"#));
        assert_eq!(body.matches("@vite/client").count(), 1);
        assert!(body.contains(r#"<script src="http://localhost:5173/src/main.ts" type="module"></script>"#));
    }

    #[tokio::test]
    async fn test_home_at_root() {
        let app = app(config(""), site(), vec![]);
        let (status, _, body) = get(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Home</title>"));
    }

    #[tokio::test]
    async fn test_language_prefix() {
        let mut en = Language::new("en", Some("en_US"));
        en.default = true;
        let site = site().with_languages(vec![en, Language::new("de", Some("de_DE"))]);
        let app = app(config(""), site, vec![]);

        let (status, _, body) = get(app, "/de/about").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<html lang="de">"#));
        assert!(body.contains(r#"<meta property="og:locale" content="de_DE">"#));
        assert!(body.contains(r#"<link rel="canonical" href="https://example.com/de/about">"#));
        assert!(body.contains(r#"<meta property="og:url" content="https://example.com/de/about">"#));
    }

    #[tokio::test]
    async fn test_redirects() {
        let config = config(
            r#"
[[redirects]]
from = "old/(:any)"
to = "new/$1"
"#,
        );
        let app = app(config, site(), vec![]);

        let (status, location, _) = get(app.clone(), "/old/page").await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(location.as_deref(), Some("https://example.com/new/page"));

        let (status, location, body) = get(app, "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(location.is_none());
        assert!(body.contains("<title>Not found</title>"));
    }

    #[tokio::test]
    async fn test_not_found_without_error_page() {
        let site = Site::new("https://example.com").with_children(vec![Page::new("home", "home")]);
        let app = app(config(""), site, vec![]);
        let (status, _, body) = get(app, "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }

    #[test]
    fn test_split_language() {
        let mut en = Language::new("en", None);
        en.default = true;
        let site = site().with_languages(vec![en, Language::new("de", None)]);

        assert_eq!(split_language(&site, "/de/about"), (Some("de"), "about"));
        assert_eq!(split_language(&site, "/de"), (Some("de"), ""));
        assert_eq!(split_language(&site, "/en/about"), (None, "en/about"));
        assert_eq!(split_language(&site, "/about/"), (None, "about"));
    }
}
