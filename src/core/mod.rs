//! 核心层：配置、错误与领域模型

pub mod config;
pub mod error;
pub mod model;
