//! 详情页解析器 (Detail Resolver)
//!
//! 每次调用独占一个页面：打开 -> 导航 -> 提取 -> 关闭。
//! 任何失败都在单条目边界内消化为空结果，不影响同批其他条目。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::error::Result;
use crate::core::model::DetailPageResolution;
use crate::interfaces::{BrowserHandle, CatalogSite, PageHandle};

pub struct DetailResolver {
    site: Arc<dyn CatalogSite>,
    timeout: Duration,
}

impl DetailResolver {
    pub fn new(site: Arc<dyn CatalogSite>, timeout: Duration) -> Self {
        Self { site, timeout }
    }

    /// 解析单个详情页，页面在所有路径上均被关闭
    pub async fn resolve(
        &self,
        browser: &dyn BrowserHandle,
        detail_url: &str,
    ) -> DetailPageResolution {
        let page = match browser.new_page().await {
            Ok(p) => p,
            Err(e) => {
                warn!(url = %detail_url, "打开详情页标签失败: {}", e);
                return DetailPageResolution::empty();
            }
        };

        let result = self.resolve_on_page(page.as_ref(), detail_url).await;

        if let Err(e) = page.close().await {
            debug!("关闭详情页标签时发生非致命错误: {}", e);
        }

        match result {
            Ok(resolution) => {
                if !resolution.has_download() {
                    info!(url = %detail_url, "详情页未找到下载链接");
                }
                resolution
            }
            Err(e) => {
                warn!(url = %detail_url, "详情页解析失败: {}", e);
                DetailPageResolution::empty()
            }
        }
    }

    async fn resolve_on_page(
        &self,
        page: &dyn PageHandle,
        detail_url: &str,
    ) -> Result<DetailPageResolution> {
        debug!(url = %detail_url, "正在打开详情页");
        page.goto(detail_url, self.timeout).await?;

        if let Err(e) = page.remove_elements(self.site.overlay_selector()).await {
            debug!("移除广告遮罩失败 (忽略): {}", e);
        }

        let html = page.content().await?;
        let page_url = page
            .url()
            .await
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| detail_url.to_string());

        Ok(self.site.parse_detail(&html, &page_url))
    }
}
