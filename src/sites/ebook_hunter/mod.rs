//! Ebook-Hunter 站点模块

mod detail;
mod listing;
mod selectors;

use url::Url;

use crate::core::config::SiteConfig;
use crate::core::error::{Result, ScoutError};
use crate::core::model::{DetailPageResolution, SearchResultRecord};
use crate::interfaces::CatalogSite;
use crate::utils::encode_component;

use self::selectors::{MetaPatterns, OVERLAY, SiteSelectors};

const DEFAULT_BASE_URL: &str = "https://ebook-hunter.org";
const DEFAULT_IMAGE_HOST: &str = "https://img.ebook-hunter.org";

/// Ebook-Hunter 站点实现
pub struct EbookHunter {
    config: SiteConfig,
    base: Url,
    image_host: Url,
}

impl EbookHunter {
    pub fn new(config: SiteConfig) -> Result<Self> {
        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| ScoutError::Parse(format!("invalid site url {raw}: {e}")))
        };

        let base = parse(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let image_host = parse(config.image_host.as_deref().unwrap_or(DEFAULT_IMAGE_HOST))?;

        Ok(Self {
            config,
            base,
            image_host,
        })
    }

    /// 页面地址无法解析时退回站点根地址
    fn page_base(&self, page_url: &str) -> Url {
        Url::parse(page_url).unwrap_or_else(|_| self.base.clone())
    }
}

impl CatalogSite for EbookHunter {
    fn id(&self) -> &str {
        "ebook-hunter"
    }

    fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn search_url(&self, query: &str) -> Result<String> {
        // 保留镜像地址的路径前缀，查询词按 encodeURIComponent 编码
        Ok(format!(
            "{}/search/?keyword={}",
            self.base.as_str().trim_end_matches('/'),
            encode_component(query)
        ))
    }

    fn overlay_selector(&self) -> &str {
        OVERLAY
    }

    fn parse_listing(&self, html: &str, page_url: &str) -> Vec<SearchResultRecord> {
        listing::parse_listing(html, &self.page_base(page_url), &self.image_host)
    }

    fn parse_detail(&self, html: &str, page_url: &str) -> DetailPageResolution {
        detail::parse_detail(html, &self.page_base(page_url), &self.image_host)
    }

    fn fallback_cover(&self, detail_page_url: &str) -> Option<String> {
        detail::thumbnail_for(detail_page_url, &self.image_host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_query() {
        let site = EbookHunter::new(SiteConfig::default()).unwrap();
        assert_eq!(
            site.search_url("dune & messiah").unwrap(),
            "https://ebook-hunter.org/search/?keyword=dune%20%26%20messiah"
        );
        assert_eq!(
            site.search_url("don't (panic)!*").unwrap(),
            "https://ebook-hunter.org/search/?keyword=don't%20(panic)!*"
        );
    }

    #[test]
    fn mirror_base_url_is_honoured() {
        let site = EbookHunter::new(SiteConfig {
            base_url: Some("https://mirror.example/".into()),
            image_host: Some("https://img.mirror.example".into()),
        })
        .unwrap();
        assert!(site.search_url("x").unwrap().starts_with("https://mirror.example/search/"));
        assert_eq!(
            site.fallback_cover("https://mirror.example/x/").as_deref(),
            Some("https://img.mirror.example/img/x_small.jpg")
        );
    }

    #[test]
    fn mirror_path_prefix_is_kept() {
        for base in ["https://mirror.example/hunter", "https://mirror.example/hunter/"] {
            let site = EbookHunter::new(SiteConfig {
                base_url: Some(base.into()),
                image_host: None,
            })
            .unwrap();
            assert_eq!(
                site.search_url("dune").unwrap(),
                "https://mirror.example/hunter/search/?keyword=dune"
            );
        }
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = EbookHunter::new(SiteConfig {
            base_url: Some("not a url".into()),
            image_host: None,
        });
        assert!(result.is_err());
    }
}
