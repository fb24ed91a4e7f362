//! 封面地址归一化 (Cover Normalizer)

use crate::interfaces::CatalogSite;
use crate::utils::is_absolute_http;

/// 从列表页/详情页候选中选出封面地址
///
/// 依次取第一个绝对地址候选；均不可用时按站点缩略图规则推导；仍失败返回空串。
/// 封面只是装饰信息，推导出的地址不保证可访问。
pub fn normalize_cover(
    site: &dyn CatalogSite,
    listing_cover: &str,
    detail_cover: &str,
    detail_page_url: &str,
) -> String {
    [listing_cover, detail_cover]
        .into_iter()
        .map(str::trim)
        .find(|c| is_absolute_http(c))
        .map(str::to_string)
        .or_else(|| site.fallback_cover(detail_page_url))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SiteConfig;
    use crate::sites::ebook_hunter::EbookHunter;

    fn site() -> EbookHunter {
        EbookHunter::new(SiteConfig::default()).unwrap()
    }

    #[test]
    fn first_absolute_candidate_wins() {
        let s = site();
        assert_eq!(
            normalize_cover(&s, "https://a.example/1.jpg", "https://b.example/2.jpg", ""),
            "https://a.example/1.jpg"
        );
        assert_eq!(
            normalize_cover(&s, "/relative.jpg", "https://b.example/2.jpg", ""),
            "https://b.example/2.jpg"
        );
    }

    #[test]
    fn falls_back_to_thumbnail_pattern() {
        let s = site();
        assert_eq!(
            normalize_cover(&s, "", "", "https://ebook-hunter.org/the-book/"),
            "https://img.ebook-hunter.org/img/the-book_small.jpg"
        );
    }

    #[test]
    fn empty_when_nothing_derivable() {
        let s = site();
        assert_eq!(normalize_cover(&s, "", "img.jpg", "https://ebook-hunter.org/no-slash"), "");
    }
}
