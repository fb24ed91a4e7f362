//! Ebook-Hunter 选择器
//!
//! 预编译的 CSS 选择器与元数据正则

use std::sync::OnceLock;

use regex::Regex;
use scraper::Selector;

/// 广告遮罩层
pub const OVERLAY: &str = ".pmjlvmd";

/// 站点选择器集合
pub struct SiteSelectors {
    pub overlay: Selector,
    pub list_item: Selector,
    pub list_title_link: Selector,
    pub list_info: Selector,
    pub list_cover: Selector,
    pub locked_link: Selector,
    pub detail_cover: Selector,
}

/// 列表页元数据文本的提取规则
pub struct MetaPatterns {
    pub format: Regex,
    pub date: Regex,
    pub author: Regex,
    pub category: Regex,
    pub trailing_segment: Regex,
}

static SELECTORS: OnceLock<SiteSelectors> = OnceLock::new();
static PATTERNS: OnceLock<MetaPatterns> = OnceLock::new();

impl SiteSelectors {
    /// 获取全局选择器实例
    pub fn get() -> &'static SiteSelectors {
        SELECTORS.get_or_init(|| SiteSelectors {
            overlay: Selector::parse(OVERLAY).unwrap(),
            list_item: Selector::parse("div.index_box").unwrap(),
            list_title_link: Selector::parse(".index_box_title.list_title a").unwrap(),
            list_info: Selector::parse(".index_box_info.list_title").unwrap(),
            list_cover: Selector::parse(".index_box_img img, .index_box_lit img").unwrap(),
            locked_link: Selector::parse(".to-lock a").unwrap(),
            detail_cover: Selector::parse(".single_box_img img, .index_box_lit img").unwrap(),
        })
    }
}

impl MetaPatterns {
    pub fn get() -> &'static MetaPatterns {
        PATTERNS.get_or_init(|| MetaPatterns {
            format: Regex::new(r"^([A-Za-z0-9_]+)\s*\|").unwrap(),
            date: Regex::new(r"\|\s*([0-9]{4}-[0-9]{2}-[0-9]{2})").unwrap(),
            author: Regex::new(r"Author:\s*([^|)]+)").unwrap(),
            category: Regex::new(r"Category:\s*([^)]+)\)").unwrap(),
            trailing_segment: Regex::new(r"/([^/]+)/$").unwrap(),
        })
    }
}
