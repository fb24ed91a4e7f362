//! 配置管理系统 (Configuration Management)
//!
//! 负责 `config.toml` 的反序列化及其层级结构映射，支持 `BOOKSCOUT__*` 环境变量覆盖与默认值回退。

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use bon::Builder;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::core::error::{Result, ScoutError};

/// 桌面端 Chrome UA，站点对 Headless 标识较敏感
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 全局应用配置
#[derive(Debug, Deserialize, Builder, Clone, Default)]
pub struct AppConfig {
    /// HTTP 服务监听配置
    #[serde(default)]
    #[builder(default)]
    pub server: ServerConfig,

    /// 自动化浏览器 (Chromium) 相关配置
    #[serde(default)]
    #[builder(default)]
    pub browser: BrowserConfig,

    /// 检索调度参数
    #[serde(default)]
    #[builder(default)]
    pub search: SearchConfig,

    /// 直链下载所用 HTTP 客户端参数
    #[serde(default)]
    #[builder(default)]
    pub http: HttpConfig,

    /// 站点特定配置覆盖映射
    #[serde(default)]
    #[builder(default)]
    pub sites: HashMap<String, SiteConfig>,
}

#[derive(Debug, Deserialize, Builder, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: SocketAddr,
}

/// 浏览器引擎配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct BrowserConfig {
    /// 是否以无头模式 (Headless) 运行
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// 自定义可执行文件路径
    pub chrome_path: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 忽略目标站点证书错误
    #[serde(default = "default_true")]
    pub ignore_https_errors: bool,
    /// 单次导航超时 (秒)
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,
}

/// 检索调度参数
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct SearchConfig {
    /// 目标站点标识符
    #[serde(default = "default_site")]
    pub site: String,
    /// 每次检索最多解析详情页的条目数
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Deserialize, Builder, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 托管页与表单请求的整体超时 (秒)，不作用于文件本体
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// 单次读取的空闲超时 (秒)，文件传输仅在停滞时失败
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

/// 站点特定配置覆盖
#[derive(Debug, Deserialize, Builder, Clone, Default)]
pub struct SiteConfig {
    /// 自定义域名 (用于镜像站点)
    pub base_url: Option<String>,
    /// 封面图片所在域名
    pub image_host: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            user_agent: default_user_agent(),
            ignore_https_errors: true,
            navigation_timeout_secs: default_navigation_timeout(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            site: default_site(),
            max_results: default_max_results(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}
fn default_headless() -> bool {
    true
}
fn default_true() -> bool {
    true
}
fn default_user_agent() -> String {
    DESKTOP_USER_AGENT.to_string()
}
fn default_navigation_timeout() -> u64 {
    30
}
fn default_site() -> String {
    "ebook-hunter".to_string()
}
fn default_max_results() -> usize {
    10
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_request_timeout() -> u64 {
    60
}
fn default_read_timeout() -> u64 {
    30
}

impl AppConfig {
    /// 从文件系统与环境变量中加载并解析配置
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let builder = Config::builder();

        let builder = if config_path.exists() {
            builder.add_source(File::from(config_path))
        } else {
            builder
        };

        let settings = builder
            .add_source(Environment::with_prefix("BOOKSCOUT").separator("__"))
            .build()
            .map_err(ScoutError::Config)?;
        settings.try_deserialize().map_err(ScoutError::Config)
    }
}
