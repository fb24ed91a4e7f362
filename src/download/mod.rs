//! 直链下载
//!
//! 从文件托管页中识别下载入口并还原出可直接拉取的文件地址。

pub mod affordance;
pub mod resolver;

pub use resolver::{
    DirectDownloadResolver, DownloadedFile, attachment_disposition, parse_page_url,
};
