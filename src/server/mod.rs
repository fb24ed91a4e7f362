//! HTTP 接口层
//!
//! 路由、CORS 与请求追踪；业务逻辑全部委托给检索引擎与直链解析器。

use std::sync::Arc;

use axum::Router;
use axum::http::{Method, header};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::core::config::ServerConfig;
use crate::core::error::Result;
use crate::download::DirectDownloadResolver;
use crate::engine::SearchService;

pub mod handlers;

/// 请求间共享的只读依赖
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub downloads: Arc<DirectDownloadResolver>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/search", get(handlers::search))
        .route("/api/download", get(handlers::download))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// 监听并服务，直至收到取消信号
pub async fn serve(
    config: &ServerConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(config.addr).await?;
    info!("HTTP 服务已启动: http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("HTTP 服务已停止");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::core::config::{HttpConfig, SiteConfig};
    use crate::sites::ebook_hunter::EbookHunter;
    use crate::testing::{FakeWeb, detail_html, listing_html};

    fn app(web: FakeWeb) -> (Router, Arc<FakeWeb>) {
        let (launcher, web) = web.into_launcher();
        let search = SearchService::new(
            launcher,
            Arc::new(EbookHunter::new(SiteConfig::default()).unwrap()),
            10,
            Duration::from_secs(30),
        );
        let state = AppState {
            search: Arc::new(search),
            downloads: Arc::new(DirectDownloadResolver::new(HttpConfig::default())),
        };
        (router(state), web)
    }

    async fn send(
        router: Router,
        req: Request<Body>,
    ) -> (StatusCode, axum::http::HeaderMap, String) {
        let resp = router.oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn blank_query_is_rejected_without_launching() {
        let (router, web) = app(FakeWeb::new());

        for uri in ["/api/search", "/api/search?query=", "/api/search?query=%20%20"] {
            let (status, _, body) = send(router.clone(), get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            let json: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(json["books"], serde_json::json!([]));
            assert!(json["error"].is_string());
        }
        assert_eq!(web.counters.launches(), 0);
    }

    #[tokio::test]
    async fn search_returns_books_in_client_shape() {
        let (router, web) = app(
            FakeWeb::new()
                .page(
                    "https://ebook-hunter.org/search/?keyword=dune%20messiah",
                    listing_html(&["dune-messiah"]),
                )
                .page(
                    "https://ebook-hunter.org/dune-messiah/",
                    detail_html("/download/dune-messiah"),
                ),
        );

        let (status, _, body) = send(router, get("/api/search?query=dune%20messiah")).await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_str(&body).unwrap();
        assert!(json.get("error").is_none());
        let book = &json["books"][0];
        assert_eq!(book["title"], "Title dune-messiah");
        assert_eq!(book["bookUrl"], "https://ebook-hunter.org/dune-messiah/");
        assert_eq!(book["downloadUrl"], "https://ebook-hunter.org/download/dune-messiah");
        assert_eq!(book["date"], "2021-05-01");
        assert_eq!(web.counters.browser_closes(), 1);
    }

    #[tokio::test]
    async fn search_failure_hides_details() {
        let (router, web) = app(FakeWeb::new().failing_launch());

        let (status, _, body) = send(router, get("/api/search?query=dune")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Failed to search books");
        assert!(!body.contains("chrome"));
        assert_eq!(web.counters.launches(), 1);
    }

    #[tokio::test]
    async fn download_requires_url() {
        let (router, _) = app(FakeWeb::new());

        let (status, _, body) = send(router, get("/api/download?save=true")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"URL is required"}"#);
    }

    #[tokio::test]
    async fn download_without_save_embeds_escaped_iframe() {
        let (router, _) = app(FakeWeb::new());

        let uri = concat!(
            "/api/download?url=",
            "https%3A%2F%2Fhost.example%2Ff%3Fa%3D1%26b%3D%22%3E%3Cscript%3E",
        );
        let (status, headers, body) = send(router, get(uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert!(body.contains(
            r#"src="https://host.example/f?a=1&amp;b=&quot;&gt;&lt;script&gt;""#
        ));
        assert!(body.contains(r#"referrerpolicy="no-referrer""#));
        assert!(body.contains(r#"<meta name="referrer" content="no-referrer" />"#));
        assert!(!body.contains("<script>"));
    }

    #[tokio::test]
    async fn script_and_local_schemes_are_not_embedded() {
        let (router, _) = app(FakeWeb::new());

        for target in [
            "javascript%3Aalert(document.domain)",
            "%20JavaScript%3Aalert(1)",
            "data%3Atext%2Fhtml%2C%3Cscript%3Ealert(1)%3C%2Fscript%3E",
            "file%3A%2F%2F%2Fetc%2Fpasswd",
        ] {
            let uri = format!("/api/download?url={target}");
            let (status, _, body) = send(router.clone(), get(&uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{target}");
            assert!(!body.contains("<iframe"), "{target}");
            let json: Value = serde_json::from_str(&body).unwrap();
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn failed_direct_download_is_generic_500() {
        let (router, _) = app(FakeWeb::new());

        let uri = "/api/download?url=file%3A%2F%2F%2Fetc%2Fpasswd&save=true&filename=x.pdf";
        let (status, _, body) = send(router, get(uri)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"Failed to process direct download"}"#);
    }

    #[tokio::test]
    async fn preflight_allows_any_origin() {
        let (router, _) = app(FakeWeb::new());

        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/search")
            .header(header::ORIGIN, "https://portal.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = send(router, req).await;

        assert!(status.is_success());
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        for m in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
            assert!(methods.contains(m), "{methods}");
        }
        let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed.contains("content-type") && allowed.contains("authorization"));
    }

    #[tokio::test]
    async fn healthz_answers_ok() {
        let (router, _) = app(FakeWeb::new());
        let (status, _, body) = send(router, get("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.trim(), "ok");
    }
}
