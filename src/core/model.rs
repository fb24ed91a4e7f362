use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::is_absolute_http;

pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const UNKNOWN_FORMAT: &str = "unknown";

/// 列表页解析出的候选条目，仅存活于单次检索
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultRecord {
    pub title: String,
    pub author: String,
    pub format: String,
    pub publication_date: String,
    pub category: String,
    pub detail_page_url: String,
    pub cover_image_url: String,
}

/// 详情页解析结果，`download_url` 为空表示丢弃该候选
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPageResolution {
    pub download_url: String,
    pub cover_image_url: String,
}

impl DetailPageResolution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_download(&self) -> bool {
        !self.download_url.is_empty()
    }
}

/// 返回给调用方的书籍记录
///
/// JSON 字段名与前端约定保持一致 (`date`, `bookUrl`)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub format: String,
    #[serde(rename = "date")]
    pub publication_date: String,
    pub category: String,
    #[serde(rename = "bookUrl")]
    pub detail_page_url: String,
    pub download_url: String,
    pub cover_image_url: String,
}

/// 检索接口响应体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub books: Vec<BookRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn ok(books: Vec<BookRecord>) -> Self {
        Self { books, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            books: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// 书籍记录来源
///
/// 不同来源的字段形态不一致，统一在编排边界转换为 [`BookRecord`]。
#[derive(Debug, Clone)]
pub enum BookSource {
    /// 抓取列表页 + 详情页得到的条目，封面已归一化
    Listing {
        record: SearchResultRecord,
        download_url: String,
        cover_image_url: String,
    },
    /// 目录 API (Volume 结构) 返回的条目
    Catalog(CatalogVolume),
}

impl BookSource {
    /// 转换为最终记录；缺少下载地址的条目返回 `None`
    pub fn into_book(self) -> Option<BookRecord> {
        match self {
            BookSource::Listing {
                record,
                download_url,
                cover_image_url,
            } => {
                if download_url.is_empty() {
                    return None;
                }
                Some(BookRecord {
                    id: Uuid::new_v4().to_string(),
                    title: record.title,
                    author: record.author,
                    format: record.format,
                    publication_date: record.publication_date,
                    category: record.category,
                    detail_page_url: record.detail_page_url,
                    download_url,
                    cover_image_url,
                })
            }
            BookSource::Catalog(volume) => volume.into_book(),
        }
    }
}

/// 目录 API 的 Volume 结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVolume {
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
    #[serde(default)]
    pub access_info: Option<AccessInfo>,
    pub download_url: Option<String>,
    pub book_url: Option<String>,
    pub format: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub published_date: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub image_links: Option<ImageLinks>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    pub small_thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessInfo {
    pub web_reader_link: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl CatalogVolume {
    fn into_book(self) -> Option<BookRecord> {
        let download_url = non_empty(self.download_url)?;
        let info = self.volume_info;

        let title = non_empty(self.title).or_else(|| non_empty(Some(info.title)))?;
        let author = non_empty(self.author)
            .or_else(|| non_empty(Some(info.authors.join(", "))))
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let category = non_empty(self.category)
            .or_else(|| info.categories.into_iter().next())
            .unwrap_or_default();

        let cover_image_url = [
            info.cover_image_url,
            info.image_links.as_ref().and_then(|l| l.thumbnail.clone()),
            info.image_links.and_then(|l| l.small_thumbnail),
        ]
        .into_iter()
        .flatten()
        .find(|u| is_absolute_http(u))
        .unwrap_or_default();

        Some(BookRecord {
            id: self.id,
            title,
            author,
            format: non_empty(self.format)
                .map(|f| f.to_lowercase())
                .unwrap_or_else(|| UNKNOWN_FORMAT.to_string()),
            publication_date: non_empty(self.date)
                .or_else(|| non_empty(info.published_date))
                .unwrap_or_default(),
            category,
            detail_page_url: non_empty(self.book_url)
                .or_else(|| self.access_info.and_then(|a| a.web_reader_link))
                .unwrap_or_default(),
            download_url,
            cover_image_url,
        })
    }
}
