//! 浏览器抽象 (Browser Abstraction)
//!
//! 检索编排只依赖这三层接口：启动器 -> 浏览器实例 -> 页面。
//! 真实实现见 `network::browser`，测试中以计数替身替换。

use std::time::Duration;

use async_trait::async_trait;

use crate::core::error::Result;

/// 浏览器启动器，每次检索启动一个独立实例
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>>;
}

/// 单次检索独占的浏览器实例
///
/// `close` 由调用方在所有退出路径上显式调用且仅调用一次。
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    /// 在同一浏览上下文中打开新页面
    async fn new_page(&self) -> Result<Box<dyn PageHandle>>;

    async fn close(&mut self) -> Result<()>;
}

/// 单个页面 (Tab)
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// 导航并等待 DOM 就绪，超时视为导航失败
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// 从实时 DOM 中移除所有匹配元素，返回移除数量
    async fn remove_elements(&self, selector: &str) -> Result<usize>;

    /// 当前文档序列化后的 HTML
    async fn content(&self) -> Result<String>;

    /// 当前文档地址 (用于解析相对链接)
    async fn url(&self) -> Result<String>;

    async fn close(self: Box<Self>) -> Result<()>;
}
