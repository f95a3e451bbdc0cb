mod types;
mod error;
mod file_manager;
mod fetcher;
mod parser;
mod resolver;
mod locator;
mod crawler;
mod dedup;

use crawler::CrawlerEngine;
use file_manager::FileManager;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 依清單下載畫廊圖片
#[derive(Debug, Parser)]
#[command(name = "gallery-downloader", version)]
struct Cli {
    /// 設定檔路徑
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 畫廊清單（一行一個網址）
    #[arg(short, long, default_value = "list.txt")]
    list: PathBuf,

    /// 完成後不等待 Enter 直接結束
    #[arg(long)]
    no_wait: bool,

    /// 顯示除錯訊息
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // 設定檔或清單有問題就直接結束
    let config = match FileManager::load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    };
    let gallery_urls = match FileManager::load_gallery_list(&cli.list) {
        Ok(urls) => urls,
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    };

    let engine = match CrawlerEngine::from_config(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    };

    let report = engine.run(gallery_urls).await?;
    report.print_report();
    info!("全部作業結束");

    if !cli.no_wait {
        println!("\n按 Enter 結束...");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
