//! 浏览器服务
//!
//! 基于 chromiumoxide 的 [`BrowserLauncher`] 实现，每次检索独占一个浏览器进程。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{
    Page,
    browser::{Browser, BrowserConfig as CdpConfig},
};
use futures::StreamExt;
use tokio::{task::JoinHandle, time::timeout};
use tracing::debug;

use crate::core::config::{AppConfig, BrowserConfig};
use crate::core::error::{Result, ScoutError};
use crate::interfaces::{BrowserHandle, BrowserLauncher, PageHandle};

/// Chromium 启动器
pub struct ChromeLauncher {
    config: Arc<AppConfig>,
}

impl ChromeLauncher {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>> {
        let session = BrowserSession::launch(&self.config.browser).await?;
        Ok(Box::new(session))
    }
}

/// 浏览器会话
/// 采用显式的所有权管理，确保关闭逻辑的确定性
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
}

impl BrowserSession {
    /// 启动浏览器会话
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let browser_config = build_browser_config(config)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScoutError::Browser(e.to_string()))?;

        // 启动事件循环
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        debug!("浏览器已启动");
        Ok(Self {
            browser: Some(browser),
            handler: Some(handle),
        })
    }
}

#[async_trait]
impl BrowserHandle for BrowserSession {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScoutError::Browser("Browser already closed".into()))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScoutError::Browser(e.to_string()))?;

        Ok(Box::new(BrowserPage { page }))
    }

    /// 关闭浏览器，并等待事件循环结束
    async fn close(&mut self) -> Result<()> {
        let browser = self.browser.take();
        let handler = self.handler.take();

        if let Some(mut b) = browser {
            let closed = b.close().await;
            if let Some(h) = handler {
                let _ = h.await;
            }
            closed.map_err(|e| ScoutError::Browser(e.to_string()))?;
        }
        Ok(())
    }
}

/// 构建浏览器配置
fn build_browser_config(config: &BrowserConfig) -> Result<CdpConfig> {
    let mut builder = CdpConfig::builder()
        .arg("--disable-blink-features=AutomationControlled")
        .arg(format!("--user-agent={}", config.user_agent))
        .arg("--disable-infobars")
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--window-size=1920,1080")
        .arg("--disable-extensions");

    if config.ignore_https_errors {
        builder = builder.arg("--ignore-certificate-errors");
    }

    if config.headless {
        builder = builder.arg("--headless=new");
    } else {
        builder = builder.with_head();
    }

    if let Some(path) = &config.chrome_path {
        builder = builder.chrome_executable(path);
    }

    builder.build().map_err(ScoutError::Browser)
}

// 在 Drop 时尝试最后一次保护
impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            let handler = self.handler.take();
            // 在后台清理
            tokio::spawn(async move {
                let _ = browser.close().await;
                if let Some(h) = handler {
                    let _ = h.await;
                }
            });
        }
    }
}

/// 浏览器页面
pub struct BrowserPage {
    page: Page,
}

#[async_trait]
impl PageHandle for BrowserPage {
    async fn goto(&self, url: &str, limit: Duration) -> Result<()> {
        timeout(limit, self.page.goto(url))
            .await
            .map_err(|_| ScoutError::navigation(url, format!("timed out after {:?}", limit)))?
            .map_err(|e| ScoutError::navigation(url, e))?;
        Ok(())
    }

    async fn remove_elements(&self, selector: &str) -> Result<usize> {
        let selector = serde_json::to_string(selector)?;
        let script = format!(
            "(() => {{ const nodes = document.querySelectorAll({selector}); nodes.forEach(n => n.remove()); return nodes.length; }})()"
        );

        let removed = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScoutError::Browser(e.to_string()))?
            .into_value::<usize>()
            .map_err(|e| ScoutError::Browser(e.to_string()))?;
        Ok(removed)
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| ScoutError::Browser(e.to_string()))
    }

    async fn url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| ScoutError::Browser(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let BrowserPage { page } = *self;
        page.close()
            .await
            .map_err(|e| ScoutError::Browser(e.to_string()))
    }
}
