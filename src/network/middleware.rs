use std::time::Instant;

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue, PRAGMA, REFERER,
    USER_AGENT,
};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::{debug, warn};

const ACCEPT_DOCUMENT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// 请求形态标记
///
/// 通过 request extension 传递，决定注入哪一组浏览器请求头。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchProfile {
    /// 跨站打开页面
    Document,
    /// 同源提交表单
    FormSubmit { referer: String },
    /// 拉取文件本体
    Asset { referer: String },
}

impl FetchProfile {
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));

        let (accept, site) = match self {
            FetchProfile::Document => (ACCEPT_DOCUMENT, Some("cross-site")),
            FetchProfile::FormSubmit { .. } => (ACCEPT_DOCUMENT, Some("same-origin")),
            FetchProfile::Asset { .. } => ("*/*", None),
        };
        headers.insert(ACCEPT, HeaderValue::from_static(accept));

        if let Some(site) = site {
            headers.insert(
                HeaderName::from_static("sec-fetch-dest"),
                HeaderValue::from_static("document"),
            );
            headers.insert(
                HeaderName::from_static("sec-fetch-mode"),
                HeaderValue::from_static("navigate"),
            );
            headers.insert(
                HeaderName::from_static("sec-fetch-site"),
                HeaderValue::from_static(site),
            );
        }

        match self {
            FetchProfile::Document => {
                headers.insert(
                    HeaderName::from_static("upgrade-insecure-requests"),
                    HeaderValue::from_static("1"),
                );
                headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
                headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            }
            FetchProfile::FormSubmit { referer } | FetchProfile::Asset { referer } => {
                if let Ok(val) = HeaderValue::from_str(referer) {
                    headers.insert(REFERER, val);
                }
            }
        }

        headers
    }
}

/// 浏览器请求头注入中间件
/// 负责在每次请求前，按 [`FetchProfile`] 注入 UA 及伪装请求头
pub struct BrowserHeadersMiddleware {
    user_agent: Option<HeaderValue>,
}

impl BrowserHeadersMiddleware {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: HeaderValue::from_str(user_agent).ok(),
        }
    }
}

#[async_trait::async_trait]
impl Middleware for BrowserHeadersMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let headers = req.headers_mut();

        if let Some(ua) = &self.user_agent {
            headers.insert(USER_AGENT, ua.clone());
        }

        let profile = extensions
            .get::<FetchProfile>()
            .cloned()
            .unwrap_or(FetchProfile::Document);
        for (k, v) in profile.headers().iter() {
            // 调用方显式设置的头优先
            if !headers.contains_key(k) {
                headers.insert(k.clone(), v.clone());
            }
        }

        next.run(req, extensions).await
    }
}

/// 请求观测中间件
/// 记录耗时与状态码，封禁类状态码提升为 WARN
pub struct TraceMiddleware;

#[async_trait::async_trait]
impl Middleware for TraceMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        let url = req.url().to_string();
        let started = Instant::now();

        let resp = next.run(req, extensions).await?;

        let status = resp.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            warn!(%method, %url, %status, "上游拒绝请求，可能触发了反爬");
        } else {
            debug!(%method, %url, %status, elapsed = ?started.elapsed(), "request finished");
        }

        Ok(resp)
    }
}
