//! 检索编排器 (Search Orchestrator)
//!
//! 负责单次检索的完整生命周期：
//! 启动浏览器 -> 打开检索页 -> 提取列表 -> 逐条解析详情页 -> 汇总 -> 关闭浏览器

use std::sync::Arc;
use std::time::Duration;

use strum::Display;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::core::error::{Result, ScoutError};
use crate::core::model::{BookRecord, BookSource, SearchResultRecord};
use crate::interfaces::{BrowserHandle, BrowserLauncher, CatalogSite, PageHandle};

use super::cover::normalize_cover;
use super::detail::DetailResolver;

/// 单次检索最多解析的详情页数量
pub const MAX_DETAIL_RESOLUTIONS: usize = 10;

/// 检索状态机各阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SearchPhase {
    BrowserLaunching,
    Navigating,
    Extracting,
    ResolvingDetail,
    Aggregating,
    Closing,
    Done,
    Failed,
}

/// 校验并规范化查询词
pub fn validate_query(query: &str) -> Result<String> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ScoutError::Validation("query must not be empty".into()));
    }
    Ok(query.to_string())
}

/// 检索服务
pub struct SearchService {
    launcher: Arc<dyn BrowserLauncher>,
    site: Arc<dyn CatalogSite>,
    resolver: DetailResolver,
    max_results: usize,
    timeout: Duration,
}

impl SearchService {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        site: Arc<dyn CatalogSite>,
        max_results: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            resolver: DetailResolver::new(site.clone(), timeout),
            launcher,
            site,
            max_results: max_results.min(MAX_DETAIL_RESOLUTIONS),
            timeout,
        }
    }

    /// 执行一次检索
    ///
    /// 校验失败时不启动浏览器；浏览器一旦启动，无论成败都恰好关闭一次。
    pub async fn search(&self, query: &str) -> Result<Vec<BookRecord>> {
        let query = validate_query(query)?;
        let span = info_span!("search", site = self.site.id(), query = %query);

        async {
            enter(SearchPhase::BrowserLaunching);
            let mut browser = self.launcher.launch().await.inspect_err(|e| {
                enter(SearchPhase::Failed);
                error!("浏览器启动失败: {}", e);
            })?;

            let result = self.run(browser.as_ref(), &query).await;

            enter(SearchPhase::Closing);
            if let Err(e) = browser.close().await {
                warn!("关闭浏览器时发生错误: {}", e);
            }

            match &result {
                Ok(_) => enter(SearchPhase::Done),
                Err(e) => {
                    enter(SearchPhase::Failed);
                    error!("检索失败: {}", e);
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, browser: &dyn BrowserHandle, query: &str) -> Result<Vec<BookRecord>> {
        enter(SearchPhase::Navigating);
        let page = browser.new_page().await?;
        let listing = self.load_listing(page.as_ref(), query).await;
        if let Err(e) = page.close().await {
            debug!("关闭检索页时发生非致命错误: {}", e);
        }
        let records = listing?;

        let raw = records.len();
        let candidates: Vec<SearchResultRecord> =
            records.into_iter().take(self.max_results).collect();
        let attempted = candidates.len();

        let mut books = Vec::with_capacity(attempted);
        // 串行解析：同一浏览上下文内并发导航会互相干扰
        for (i, record) in candidates.into_iter().enumerate() {
            enter(SearchPhase::ResolvingDetail);
            debug!(index = i + 1, total = attempted, title = %record.title, "解析详情页");

            let resolution = self.resolver.resolve(browser, &record.detail_page_url).await;
            if !resolution.has_download() {
                debug!(title = %record.title, "无下载链接，丢弃条目");
                continue;
            }

            let cover_image_url = normalize_cover(
                self.site.as_ref(),
                &record.cover_image_url,
                &resolution.cover_image_url,
                &record.detail_page_url,
            );
            let source = BookSource::Listing {
                record,
                download_url: resolution.download_url,
                cover_image_url,
            };
            if let Some(book) = source.into_book() {
                info!(title = %book.title, "已获取下载链接");
                books.push(book);
            }
        }

        enter(SearchPhase::Aggregating);
        info!(raw, attempted, resolved = books.len(), "检索完成");
        Ok(books)
    }

    async fn load_listing(
        &self,
        page: &dyn PageHandle,
        query: &str,
    ) -> Result<Vec<SearchResultRecord>> {
        let search_url = self.site.search_url(query)?;
        info!(url = %search_url, "正在打开检索页");
        page.goto(&search_url, self.timeout).await?;

        match page.remove_elements(self.site.overlay_selector()).await {
            Ok(0) => {}
            Ok(n) => debug!("已移除 {} 个广告遮罩", n),
            Err(e) => debug!("移除广告遮罩失败 (忽略): {}", e),
        }

        enter(SearchPhase::Extracting);
        let html = page.content().await?;
        let page_url = page
            .url()
            .await
            .ok()
            .filter(|u| !u.is_empty() && u != "about:blank")
            .unwrap_or(search_url);

        let records = self.site.parse_listing(&html, &page_url);
        debug!("列表页解析出 {} 条候选", records.len());
        Ok(records)
    }
}

fn enter(phase: SearchPhase) {
    debug!(%phase, "phase");
}
