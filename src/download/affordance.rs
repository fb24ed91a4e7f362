//! 下载入口识别 (Download Affordance)
//!
//! 按固定优先级扫描页面中的下载按钮、链接与表单。

use std::sync::OnceLock;

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::utils::to_absolute_url;

/// 候选选择器，顺序即优先级
pub const CANDIDATE_SELECTORS: [&str; 7] = [
    r#"input[type="submit"][id="btn_download"]:not([disabled])"#,
    r#"a[href*="download"]"#,
    "a.btn_download",
    r#"a[href*=".pdf"]"#,
    r#"a[href*=".epub"]"#,
    r#"a[href*=".mobi"]"#,
    r#"form[name="F1"]"#,
];

const FILE_LINKS: &str = r#"a[href*=".pdf"], a[href*=".epub"], a[href*=".mobi"]"#;

/// 页面上识别出的下载入口
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadAffordance {
    /// 可直接拉取的文件地址
    DirectLink(String),
    /// 需重建隐藏字段并 POST 的表单
    FormSubmission {
        action: String,
        fields: IndexMap<String, String>,
    },
}

struct AffordanceSelectors {
    candidates: Vec<Selector>,
    hidden_inputs: Selector,
    file_links: Selector,
}

static SELECTORS: OnceLock<AffordanceSelectors> = OnceLock::new();

impl AffordanceSelectors {
    fn get() -> &'static AffordanceSelectors {
        SELECTORS.get_or_init(|| AffordanceSelectors {
            candidates: CANDIDATE_SELECTORS
                .iter()
                .map(|css| Selector::parse(css).unwrap())
                .collect(),
            hidden_inputs: Selector::parse(r#"input[type="hidden"]"#).unwrap(),
            file_links: Selector::parse(FILE_LINKS).unwrap(),
        })
    }
}

/// 按优先级列出页面上所有可用的下载入口
///
/// 每个选择器只取首个命中元素。脚本伪链接、锚点链接及无 `href` 的按钮被跳过，
/// 由调用方依次尝试，首个成功解析出文件地址的入口胜出。
pub fn scan(html: &str, page_url: &Url) -> Vec<DownloadAffordance> {
    let doc = Html::parse_document(html);
    let s = AffordanceSelectors::get();

    s.candidates
        .iter()
        .filter_map(|selector| {
            let element = doc.select(selector).next()?;
            match element.value().name() {
                "form" => Some(form_affordance(&element, page_url)),
                _ => link_affordance(&element, page_url),
            }
        })
        .collect()
}

fn link_affordance(element: &ElementRef, page_url: &Url) -> Option<DownloadAffordance> {
    let href = element.value().attr("href")?.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with('#') {
        return None;
    }
    Some(DownloadAffordance::DirectLink(to_absolute_url(page_url, href)))
}

fn form_affordance(form: &ElementRef, page_url: &Url) -> DownloadAffordance {
    let s = AffordanceSelectors::get();

    let fields = form
        .select(&s.hidden_inputs)
        .filter_map(|input| {
            let name = input.value().attr("name").filter(|n| !n.is_empty())?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| to_absolute_url(page_url, a))
        .unwrap_or_else(|| page_url.to_string());

    DownloadAffordance::FormSubmission { action, fields }
}

/// 在表单提交结果页中查找文件直链
pub fn find_file_link(html: &str, base: &Url) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&AffordanceSelectors::get().file_links)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| to_absolute_url(base, href))
        .find(|u| !u.is_empty())
}
