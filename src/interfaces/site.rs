//! 站点定义
//!
//! 目标站点的抓取规则 (选择器、正则、URL 模式) 全部收敛在此接口之后，
//! 更换站点无需改动检索编排逻辑。

use crate::core::config::SiteConfig;
use crate::core::error::Result;
use crate::core::model::{DetailPageResolution, SearchResultRecord};

/// 书目站点 Trait
pub trait CatalogSite: Send + Sync {
    /// 站点唯一标识
    fn id(&self) -> &str;

    /// 站点配置
    fn config(&self) -> &SiteConfig;

    /// 构建检索页 URL (查询词已编码)
    fn search_url(&self, query: &str) -> Result<String>;

    /// 广告遮罩层选择器
    fn overlay_selector(&self) -> &str;

    /// 解析检索结果列表页，按文档顺序返回候选条目
    fn parse_listing(&self, html: &str, page_url: &str) -> Vec<SearchResultRecord>;

    /// 解析详情页中的下载链接与封面
    fn parse_detail(&self, html: &str, page_url: &str) -> DetailPageResolution;

    /// 由详情页地址推导缩略图地址 (无法推导时返回 `None`)
    fn fallback_cover(&self, detail_page_url: &str) -> Option<String>;
}
