//! Ebook-Hunter 详情页解析

use scraper::Html;
use url::Url;

use crate::core::model::DetailPageResolution;
use crate::utils::{qualify_image_src, strip_elements, to_absolute_url};

use super::{MetaPatterns, SiteSelectors};

/// 提取 `.to-lock` 区域内的下载链接及详情页封面
pub fn parse_detail(html: &str, page_url: &Url, image_host: &Url) -> DetailPageResolution {
    let mut doc = Html::parse_document(html);
    let s = SiteSelectors::get();

    strip_elements(&mut doc, &s.overlay);

    let download_url = doc
        .select(&s.locked_link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| to_absolute_url(page_url, href))
        .unwrap_or_default();

    let cover_image_url = doc
        .select(&s.detail_cover)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| qualify_image_src(image_host, src))
        .unwrap_or_default();

    DetailPageResolution {
        download_url,
        cover_image_url,
    }
}

/// 按站点缩略图命名规则 `/img/{slug}_small.jpg` 推导封面
///
/// 未经校验的猜测规则，生成的地址可能 404。
pub fn thumbnail_for(detail_page_url: &str, image_host: &Url) -> Option<String> {
    let slug = MetaPatterns::get()
        .trailing_segment
        .captures(detail_page_url)?
        .get(1)?
        .as_str();

    Some(format!(
        "{}/img/{}_small.jpg",
        image_host.as_str().trim_end_matches('/'),
        slug
    ))
}
