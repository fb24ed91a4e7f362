use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use scraper::{Html, Selector};
use url::Url;

/// 与浏览器 `encodeURIComponent` 一致的保留字符集
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// 站点约定：以 `http` 开头即视为绝对地址
#[inline]
pub fn is_absolute_http(href: &str) -> bool {
    href.starts_with("http")
}

pub fn to_absolute_url(base: &Url, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    if let Some(path_without_slashes) = href.strip_prefix("//") {
        return format!("{}://{}", base.scheme(), path_without_slashes);
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// 将图片 `src` 限定到图片域名下，已是绝对地址则原样返回
pub fn qualify_image_src(image_host: &Url, src: &str) -> String {
    let src = src.trim();
    if is_absolute_http(src) {
        return src.to_string();
    }
    to_absolute_url(image_host, src)
}

/// 按 `encodeURIComponent` 语义编码 (下载文件名等)
pub fn encode_component(name: &str) -> String {
    utf8_percent_encode(name, COMPONENT).to_string()
}

/// 从已解析文档中摘除所有匹配节点 (幂等)，返回摘除数量
pub fn strip_elements(doc: &mut Html, selector: &Selector) -> usize {
    let ids: Vec<_> = doc.select(selector).map(|el| el.id()).collect();
    for id in &ids {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }
    ids.len()
}

/// 转义 HTML 属性值
pub fn escape_html_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
