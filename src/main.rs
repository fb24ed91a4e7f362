//! 应用程序入口 (Application Entrypoint)
//!
//! 负责 CLI 指令解析、遥测层初始化、依赖注入及系统生命周期管理。

mod core;
mod download;
mod engine;
mod interfaces;
mod network;
mod server;
mod sites;
mod utils;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::core::config::AppConfig;
use crate::core::model::{BookSource, CatalogVolume, SearchResponse};
use crate::download::DirectDownloadResolver;
use crate::engine::SearchService;
use crate::interfaces::CatalogSite;
use crate::network::ChromeLauncher;
use crate::server::AppState;
use crate::sites::SiteRegistry;

/// 命令行界面脚手架 (CLI Scaffolding)
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动 HTTP 接口服务
    Serve {
        /// 覆盖配置中的监听地址
        #[arg(short, long)]
        addr: Option<SocketAddr>,
    },
    /// 执行一次检索并输出 JSON
    Search {
        query: String,
        /// 目标站点标识符
        #[arg(short, long)]
        site: Option<String>,
    },
    /// 解析托管页直链并保存文件
    Fetch {
        #[arg(short, long)]
        url: String,
        #[arg(short, long)]
        filename: String,
        /// 输出目录
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// 只解析直链，不下载
        #[arg(long)]
        dry_run: bool,
    },
    /// 将目录 API 的 Volume JSON 转换为书籍记录
    Import {
        /// Volume 数组文件
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 遥测层初始化 (Telemetry Layer Initialization)
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true)
        .init();

    // 依赖项初始化与注入 (Dependency Injection)
    let config = Arc::new(AppConfig::load()?);
    let cli = Cli::parse();
    let registry = SiteRegistry::new();

    match cli.command {
        Commands::Serve { addr } => {
            let search = build_search(&config, &registry, &config.search.site)?;
            let state = AppState {
                search: Arc::new(search),
                downloads: Arc::new(DirectDownloadResolver::new(config.http.clone())),
            };

            let mut server_cfg = config.server.clone();
            if let Some(addr) = addr {
                server_cfg.addr = addr;
            }

            // 信号处理与优雅退出 (Signal Handling)
            let shutdown = CancellationToken::new();
            let trigger = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("收到中断信号，正在停止服务...");
                    trigger.cancel();
                }
            });

            server::serve(&server_cfg, state, shutdown).await?;
        }
        Commands::Search { query, site } => {
            let site_id = site.unwrap_or_else(|| config.search.site.clone());
            let search = build_search(&config, &registry, &site_id)?;

            let response = match search.search(&query).await {
                Ok(books) => SearchResponse::ok(books),
                Err(e) => SearchResponse::failed(e.to_string()),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Fetch {
            url,
            filename,
            out,
            dry_run,
        } => {
            let resolver = DirectDownloadResolver::new(config.http.clone());
            if dry_run {
                println!("{}", resolver.resolve(&url).await?);
                return Ok(());
            }

            let file = resolver.fetch(&url).await?;
            tracing::info!(
                source = %file.source_url,
                content_type = %file.content_type,
                "开始写入 {}",
                filename
            );

            tokio::fs::create_dir_all(&out).await?;
            let path = out.join(&filename);
            let mut sink = tokio::fs::File::create(&path)
                .await
                .with_context(|| format!("无法创建文件 {}", path.display()))?;

            let mut written = 0u64;
            let mut stream = Box::pin(file.into_stream());
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                sink.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            sink.flush().await?;

            tracing::info!("已保存 {} ({} bytes)", path.display(), written);
        }
        Commands::Import { path } => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("无法读取 {}", path.display()))?;
            let volumes: Vec<CatalogVolume> = serde_json::from_str(&raw)?;
            let total = volumes.len();

            let books: Vec<_> = volumes
                .into_iter()
                .filter_map(|v| BookSource::Catalog(v).into_book())
                .collect();
            tracing::info!("已转换 {}/{} 条记录", books.len(), total);
            println!("{}", serde_json::to_string_pretty(&SearchResponse::ok(books))?);
        }
    }

    Ok(())
}

fn build_search(
    config: &Arc<AppConfig>,
    registry: &SiteRegistry,
    site_id: &str,
) -> anyhow::Result<SearchService> {
    let site_cfg = config.sites.get(site_id).cloned().unwrap_or_default();
    let site: Arc<dyn CatalogSite> = Arc::from(registry.create(site_id, site_cfg)?);
    tracing::debug!(
        site = site.id(),
        mirror = ?site.config().base_url,
        "站点已加载 (可选: {})",
        registry.list().join(", ")
    );

    Ok(SearchService::new(
        Arc::new(ChromeLauncher::new(config.clone())),
        site,
        config.search.max_results,
        config.browser.navigation_timeout(),
    ))
}
