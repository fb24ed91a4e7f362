//! 直链解析器 (Direct-Download Resolver)
//!
//! 获取托管页 -> 按优先级尝试下载入口 -> 拉取文件本体。
//! 每次调用持有独立的 HTTP 会话，Cookie 仅在同一次下载的多个请求间传递。

use bytes::Bytes;
use futures::Stream;
use reqwest::header::CONTENT_TYPE;
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;

use crate::core::config::HttpConfig;
use crate::core::error::{Result, ScoutError};
use crate::network::{FetchProfile, HttpService};
use crate::utils::encode_component;

use super::affordance::{DownloadAffordance, find_file_link, scan};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 构造附件下载的 `Content-Disposition` 头
pub fn attachment_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", encode_component(filename))
}

/// 已建立连接、尚未读取的文件响应
pub struct DownloadedFile {
    pub source_url: String,
    pub content_type: String,
    response: reqwest::Response,
}

impl DownloadedFile {
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// 按块流式读取文件内容
    pub fn into_stream(self) -> impl Stream<Item = reqwest::Result<Bytes>> {
        self.response.bytes_stream()
    }
}

pub struct DirectDownloadResolver {
    http: HttpConfig,
}

impl DirectDownloadResolver {
    pub fn new(http: HttpConfig) -> Self {
        Self { http }
    }

    /// 仅解析文件直链，不拉取内容
    pub async fn resolve(&self, page_url: &str) -> Result<String> {
        let page = parse_page_url(page_url)?;
        let client = HttpService::new(&self.http)?;
        self.resolve_with(&client, &page)
            .instrument(info_span!("resolve", url = %page))
            .await
    }

    /// 解析直链并打开文件响应
    pub async fn fetch(&self, page_url: &str) -> Result<DownloadedFile> {
        let page = parse_page_url(page_url)?;
        let client = HttpService::new(&self.http)?;

        async {
            let file_url = self.resolve_with(&client, &page).await?;
            info!(file = %file_url, "正在拉取文件");

            let response = client
                .get(
                    &file_url,
                    FetchProfile::Asset {
                        referer: page.to_string(),
                    },
                )
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ScoutError::UpstreamStatus {
                    url: file_url,
                    status,
                });
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string();

            Ok(DownloadedFile {
                source_url: file_url,
                content_type,
                response,
            })
        }
        .instrument(info_span!("download", url = %page))
        .await
    }

    async fn resolve_with(&self, client: &HttpService, page: &Url) -> Result<String> {
        let html = client.get_text(page.as_str(), FetchProfile::Document).await?;

        for affordance in scan(&html, page) {
            match affordance {
                DownloadAffordance::DirectLink(url) => {
                    debug!(%url, "命中直链");
                    return Ok(url);
                }
                DownloadAffordance::FormSubmission { action, fields } => {
                    match submit_form(client, page, &action, &fields).await {
                        Ok(Some(url)) => {
                            debug!(%url, "表单提交后命中直链");
                            return Ok(url);
                        }
                        Ok(None) => debug!(%action, "表单结果页无文件链接"),
                        Err(e) => warn!(%action, "表单提交失败: {}", e),
                    }
                }
            }
        }

        Err(ScoutError::NoDownloadLink(page.to_string()))
    }
}

async fn submit_form(
    client: &HttpService,
    page: &Url,
    action: &str,
    fields: &indexmap::IndexMap<String, String>,
) -> Result<Option<String>> {
    let action_url =
        Url::parse(action).map_err(|e| ScoutError::Parse(format!("form action {action}: {e}")))?;

    let resp = client.post_form(action, fields, page.as_str()).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ScoutError::UpstreamStatus {
            url: action.to_string(),
            status,
        });
    }

    let html = resp.text().await?;
    Ok(find_file_link(&html, &action_url))
}

/// 只接受 http/https 的托管页地址
pub fn parse_page_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ScoutError::Validation(format!("invalid url '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ScoutError::Validation(format!(
            "unsupported scheme '{other}' in {raw}"
        ))),
    }
}
