use std::time::Duration;

use indexmap::IndexMap;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

use crate::core::config::HttpConfig;
use crate::core::error::{Result, ScoutError};
use crate::network::middleware::{BrowserHeadersMiddleware, FetchProfile, TraceMiddleware};

/// 直链解析所用 HTTP 服务
///
/// 每个实例持有独立的 Cookie 容器，由单次下载解析独占，不跨请求共享。
/// 整体超时只加在页面与表单请求上，文件本体只受读取空闲超时约束。
#[derive(Clone)]
pub struct HttpService {
    client: ClientWithMiddleware,
    request_timeout: Duration,
}

impl HttpService {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .tcp_nodelay(true)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .map_err(ScoutError::Network)?;

        let client = ClientBuilder::new(client)
            .with(BrowserHeadersMiddleware::new(&config.user_agent))
            .with(TraceMiddleware)
            .build();

        Ok(Self {
            client,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// 以指定请求形态执行 GET，不设整体超时 (用于流式拉取文件)
    pub async fn get(&self, url: &str, profile: FetchProfile) -> Result<reqwest::Response> {
        self.client
            .get(url)
            .with_extension(profile)
            .send()
            .await
            .map_err(ScoutError::Middleware)
    }

    /// 以 `application/x-www-form-urlencoded` 提交表单字段
    pub async fn post_form(
        &self,
        url: &str,
        fields: &IndexMap<String, String>,
        referer: &str,
    ) -> Result<reqwest::Response> {
        let body = serde_urlencoded::to_string(fields)?;

        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .timeout(self.request_timeout)
            .with_extension(FetchProfile::FormSubmit {
                referer: referer.to_string(),
            })
            .send()
            .await
            .map_err(ScoutError::Middleware)
    }

    /// 获取页面文本，非 2xx 视为导航失败
    pub async fn get_text(&self, url: &str, profile: FetchProfile) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .with_extension(profile)
            .send()
            .await
            .map_err(ScoutError::Middleware)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScoutError::UpstreamStatus {
                url: url.to_string(),
                status,
            });
        }
        resp.text().await.map_err(ScoutError::Network)
    }
}
