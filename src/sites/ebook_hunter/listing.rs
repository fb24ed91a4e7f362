//! Ebook-Hunter 检索结果解析
//!
//! 负责从检索列表页提取候选条目。

use scraper::{ElementRef, Html};
use url::Url;

use crate::core::model::{SearchResultRecord, UNKNOWN_AUTHOR, UNKNOWN_FORMAT};
use crate::utils::{qualify_image_src, strip_elements, to_absolute_url};

use super::{MetaPatterns, SiteSelectors};

/// 元数据文本中解析出的字段，各字段独立回退默认值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingMeta {
    pub format: String,
    pub date: String,
    pub author: String,
    pub category: String,
}

/// 解析形如 `pdf | Author: X | 2021-05-01 | Category: Y)` 的元数据文本
pub fn parse_meta(text: &str) -> ListingMeta {
    let p = MetaPatterns::get();
    let text = text.trim();

    let capture = |re: &regex::Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };

    ListingMeta {
        format: capture(&p.format)
            .map(|f| f.to_lowercase())
            .unwrap_or_else(|| UNKNOWN_FORMAT.to_string()),
        date: capture(&p.date).unwrap_or_default(),
        author: capture(&p.author)
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        category: capture(&p.category).unwrap_or_default(),
    }
}

/// 解析检索结果页
///
/// 先摘除广告遮罩层，缺少标题或链接的条目静默跳过。
pub fn parse_listing(html: &str, page_url: &Url, image_host: &Url) -> Vec<SearchResultRecord> {
    let mut doc = Html::parse_document(html);
    let s = SiteSelectors::get();

    strip_elements(&mut doc, &s.overlay);

    doc.select(&s.list_item)
        .filter_map(|item| parse_item(&item, page_url, image_host))
        .collect()
}

fn parse_item(item: &ElementRef, page_url: &Url, image_host: &Url) -> Option<SearchResultRecord> {
    let s = SiteSelectors::get();

    let link = item.select(&s.list_title_link).next()?;
    let title = link.text().collect::<String>().trim().to_string();
    if title.is_empty() {
        return None;
    }

    let detail_page_url = link
        .value()
        .attr("href")
        .map(|href| to_absolute_url(page_url, href))
        .filter(|u| !u.is_empty())?;

    let info = item
        .select(&s.list_info)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();
    let meta = parse_meta(&info);

    let cover_image_url = item
        .select(&s.list_cover)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| qualify_image_src(image_host, src))
        .unwrap_or_default();

    Some(SearchResultRecord {
        title,
        author: meta.author,
        format: meta.format,
        publication_date: meta.date,
        category: meta.category,
        detail_page_url,
        cover_image_url,
    })
}
