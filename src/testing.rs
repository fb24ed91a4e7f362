//! 测试替身：可编排页面内容并统计资源开闭次数的假浏览器

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::error::{Result, ScoutError};
use crate::interfaces::{BrowserHandle, BrowserLauncher, PageHandle};

#[derive(Default)]
pub struct Counters {
    pub launches: AtomicUsize,
    pub browser_closes: AtomicUsize,
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub navigations: Mutex<Vec<String>>,
}

impl Counters {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn browser_closes(&self) -> usize {
        self.browser_closes.load(Ordering::SeqCst)
    }

    pub fn pages_opened(&self) -> usize {
        self.pages_opened.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.pages_closed.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

/// 假网络：URL -> HTML，未登记的 URL 导航失败
#[derive(Default)]
pub struct FakeWeb {
    pages: HashMap<String, String>,
    broken_content: HashSet<String>,
    fail_launch: bool,
    pub counters: Counters,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// 导航成功但读取 DOM 失败
    pub fn broken_content(mut self, url: &str) -> Self {
        self.pages.entry(url.to_string()).or_default();
        self.broken_content.insert(url.to_string());
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn into_launcher(self) -> (Arc<FakeLauncher>, Arc<FakeWeb>) {
        let web = Arc::new(self);
        (Arc::new(FakeLauncher { web: web.clone() }), web)
    }
}

pub struct FakeLauncher {
    web: Arc<FakeWeb>,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>> {
        self.web.counters.launches.fetch_add(1, Ordering::SeqCst);
        if self.web.fail_launch {
            return Err(ScoutError::Browser("chrome not found".into()));
        }
        Ok(Box::new(FakeBrowser {
            web: self.web.clone(),
        }))
    }
}

struct FakeBrowser {
    web: Arc<FakeWeb>,
}

#[async_trait]
impl BrowserHandle for FakeBrowser {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>> {
        self.web.counters.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            web: self.web.clone(),
            current: Mutex::new(String::new()),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.web.counters.browser_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakePage {
    web: Arc<FakeWeb>,
    current: Mutex<String>,
}

#[async_trait]
impl PageHandle for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.web
            .counters
            .navigations
            .lock()
            .unwrap()
            .push(url.to_string());
        if !self.web.pages.contains_key(url) {
            return Err(ScoutError::navigation(url, "net::ERR_NAME_NOT_RESOLVED"));
        }
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn remove_elements(&self, _selector: &str) -> Result<usize> {
        Ok(0)
    }

    async fn content(&self) -> Result<String> {
        let current = self.current.lock().unwrap().clone();
        if self.web.broken_content.contains(&current) {
            return Err(ScoutError::Browser("Target closed".into()));
        }
        Ok(self.web.pages.get(&current).cloned().unwrap_or_default())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.web.counters.pages_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 生成 ebook-hunter 风格的检索列表页
pub fn listing_html(slugs: &[&str]) -> String {
    let entries: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<div class="index_box">
  <div class="index_box_title list_title"><a href="/{slug}/">Title {slug}</a></div>
  <div class="index_box_info list_title">pdf | Author: A {slug} | 2021-05-01 | Category: Fiction)</div>
</div>"#
            )
        })
        .collect();
    format!("<html><body>{entries}</body></html>")
}

/// 生成带下载锚点的详情页
pub fn detail_html(download: &str) -> String {
    format!(r#"<html><body><div class="to-lock"><a href="{download}">Download</a></div></body></html>"#)
}

/// 生成缺少下载锚点的详情页
pub fn locked_detail_html() -> String {
    r#"<html><body><div class="to-lock">Please log in</div></body></html>"#.to_string()
}
