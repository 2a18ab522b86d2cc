//! Nasdaq 后端服务
//!
//! 抓取 Nasdaq 历史价格和内部人交易并入库，提供查询与价格分析的 RESTful API

mod cli;        // 命令行参数
mod config;     // 配置加载
mod error;      // API 错误映射
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use env_logger::Env;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::middleware::ApiKeyMiddleware;
use crate::services::parser::{read_ticker_list, NasdaqParser};
use crate::services::store::Store;

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, source) = AppConfig::load(cli.config.as_deref())?;

    // 初始化日志系统，RUST_LOG 优先于配置中的级别
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    log::info!("加载配置: {}", source);

    let store = Store::connect(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("连接数据库 {} 失败", config.database.url))?;

    match cli.command {
        Command::Serve => serve(config, store).await,
        Command::Parse { threads, tickers } => {
            let mut parser_config = config.parser.clone();
            if let Some(threads) = threads {
                parser_config.threads = threads;
            }
            let tickers_path = tickers.unwrap_or_else(|| parser_config.tickers_path.clone().into());

            let tickers = read_ticker_list(&tickers_path)?;
            let parser = NasdaqParser::new(store, &parser_config)?;
            parser.run(&tickers).await;
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, store: Store) -> anyhow::Result<()> {
    let api_key = config.api.api_key.clone();
    if api_key.is_empty() {
        log::warn!("未设置 API Key，接口不启用认证");
    }

    log::info!("启动 Nasdaq 后端服务，监听 {}", config.bind_addr());

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(store.clone()))
            .wrap(Logger::default())  // 添加请求日志中间件
            .wrap(ApiKeyMiddleware::new(api_key.clone()))  // API Key 认证
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(config.bind_addr())?.run().await?;
    Ok(())
}
