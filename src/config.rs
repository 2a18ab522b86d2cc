//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，`API_KEY` 和 `DATABASE_URL` 环境变量优先于文件

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::services::common::NASDAQ_BASE_URL;
use crate::services::parser::html::MAX_TRADE_PAGES;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API Key（为空则不启用认证）
    #[serde(default)]
    pub api_key: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite 连接串
    #[serde(default = "default_database_url")]
    pub url: String,
    /// 连接池大小
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// 抓取配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// 站点根地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 同时处理的股票数（以及单只股票同时抓取的分页数）
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// 内部人交易最多抓取的页数
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 股票代码列表文件
    #[serde(default = "default_tickers_path")]
    pub tickers_path: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// API 配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 抓取配置
    #[serde(default)]
    pub parser: ParserConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_database_url() -> String { "sqlite://nasdaq.db".to_string() }
fn default_max_connections() -> u32 { 8 }
fn default_base_url() -> String { NASDAQ_BASE_URL.to_string() }
fn default_threads() -> usize { 4 }
fn default_max_pages() -> u32 { MAX_TRADE_PAGES }
fn default_tickers_path() -> String { "tickers.txt".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            threads: default_threads(),
            max_pages: default_max_pages(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            tickers_path: default_tickers_path(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件 {} 失败", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 {} 失败", path.display()))?;
        Ok(config)
    }

    /// 加载配置
    ///
    /// 指定了路径时该文件必须可用；否则依次尝试默认位置，都不存在则使用默认值。
    /// 日志系统此时尚未初始化，加载来源由调用方在初始化后输出
    pub fn load(path: Option<&Path>) -> anyhow::Result<(Self, String)> {
        let (mut config, source) = match path {
            Some(path) => (Self::from_file(path)?, path.display().to_string()),
            None => Self::load_default()?,
        };
        config.apply_env(env::var("API_KEY").ok(), env::var("DATABASE_URL").ok());
        Ok((config, source))
    }

    fn load_default() -> anyhow::Result<(Self, String)> {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                return Ok((Self::from_file(path)?, path.to_string()));
            }
        }

        Ok((Self::default(), "默认配置".to_string()))
    }

    /// 用环境变量覆盖文件中的值，空字符串视为未设置
    fn apply_env(&mut self, api_key: Option<String>, database_url: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api.api_key = key;
        }
        if let Some(url) = database_url.filter(|u| !u.is_empty()) {
            self.database.url = url;
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
