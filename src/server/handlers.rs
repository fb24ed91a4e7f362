use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::core::model::SearchResponse;
use crate::download::{DownloadedFile, attachment_disposition, parse_page_url};
use crate::download::resolver::DEFAULT_CONTENT_TYPE;
use crate::utils::escape_html_attr;

use super::AppState;

const SEARCH_FAILED: &str = "Failed to search books";
const URL_REQUIRED: &str = "URL is required";
const URL_NOT_HTTP: &str = "URL must be an http(s) address";
const DOWNLOAD_FAILED: &str = "Failed to process direct download";

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    query: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<SearchResponse>) {
    let query = params.query.unwrap_or_default();

    match state.search.search(&query).await {
        Ok(books) => (StatusCode::OK, Json(SearchResponse::ok(books))),
        Err(e) if e.is_client_error() => {
            (StatusCode::BAD_REQUEST, Json(SearchResponse::failed(e.to_string())))
        }
        Err(e) => {
            error!(query = %query, "检索请求失败: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SearchResponse::failed(SEARCH_FAILED)),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    url: Option<String>,
    save: Option<String>,
    filename: Option<String>,
}

impl DownloadParams {
    /// `save=true` 且提供文件名时走直链下载
    fn direct_filename(&self) -> Option<&str> {
        if self.save.as_deref() != Some("true") {
            return None;
        }
        self.filename.as_deref().filter(|f| !f.is_empty())
    }
}

pub async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Response {
    let Some(url) = params.url.as_deref().filter(|u| !u.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": URL_REQUIRED }))).into_response();
    };

    if let Some(filename) = params.direct_filename() {
        return match state.downloads.fetch(url).await {
            Ok(file) => stream_attachment(file, filename),
            Err(e) => {
                warn!(%url, "直链下载失败: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": DOWNLOAD_FAILED })),
                )
                    .into_response()
            }
        };
    }

    // 只嵌入 http(s) 页面，脚本协议会在本站源下执行
    match parse_page_url(url) {
        Ok(_) => Html(iframe_page(url.trim())).into_response(),
        Err(e) => {
            warn!(%url, "拒绝嵌入: {}", e);
            (StatusCode::BAD_REQUEST, Json(json!({ "error": URL_NOT_HTTP }))).into_response()
        }
    }
}

fn stream_attachment(file: DownloadedFile, filename: &str) -> Response {
    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    // 文件名已做百分号编码，只剩 ASCII
    let disposition = HeaderValue::from_str(&attachment_disposition(filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let length = file.content_length();

    let mut resp = Response::new(Body::from_stream(file.into_stream()));
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    if let Some(len) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    resp
}

/// 以无 Referer 的 iframe 嵌入托管页
pub fn iframe_page(url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta name="referrer" content="no-referrer" />
    <style>
      body, html {{ margin: 0; padding: 0; height: 100%; overflow: hidden; }}
      iframe {{ width: 100%; height: 100%; border: none; }}
    </style>
  </head>
  <body>
    <iframe src="{}" referrerpolicy="no-referrer" allowfullscreen></iframe>
  </body>
</html>
"#,
        escape_html_attr(url)
    )
}

pub async fn healthz() -> &'static str {
    "ok\n"
}
