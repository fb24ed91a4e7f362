//! 检索引擎
//!
//! 编排层只依赖 `interfaces` 中的浏览器与站点抽象。

pub mod cover;
pub mod detail;
pub mod search;

pub use search::SearchService;
