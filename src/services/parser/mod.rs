//! Nasdaq 数据采集
//!
//! 读取股票代码列表，抓取历史价格和内部人交易页面并写入存储

pub mod html;
mod nasdaq;
pub mod normalize;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub use nasdaq::NasdaqParser;

/// 读取股票代码列表文件，每行一个代码，忽略空行
pub fn read_ticker_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取股票列表 {}", path.display()))?;

    Ok(parse_ticker_list(&content))
}

fn parse_ticker_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
