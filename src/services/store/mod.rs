//! 关系型存储
//!
//! 基于 SQLite（sqlx）保存股票、价格、内部人及其交易记录。
//! 所有 get_or_create 操作都依赖唯一约束 + `ON CONFLICT`，
//! 并发写入同一自然键时由数据库保证原子性

mod prices;
mod schema;
mod stocks;
mod trades;

use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// 存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    /// 数据库操作失败
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    /// 数据库中的行无法还原为模型
    #[error("数据损坏: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 存储句柄，内部为连接池，可廉价克隆并在各 worker 间共享
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// 连接数据库并初始化表结构
    ///
    /// `sqlite::memory:` 时每个连接都是独立的库，应将 `max_connections` 设为 1
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        schema::migrate(&pool).await?;
        log::debug!("数据库已就绪: {}", database_url);

        Ok(Self { pool })
    }

    /// 测试用的内存数据库
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::connect("sqlite::memory:", 1)
            .await
            .expect("内存数据库初始化失败")
    }
}

// ==================== 行映射辅助函数 ====================

/// 按固定小数位数格式化 Decimal，保证同一数值只有一种文本形式
fn decimal_text(value: Decimal, scale: u32) -> String {
    let mut value = value;
    value.rescale(scale);
    value.to_string()
}

fn parse_decimal(column: &str, text: &str) -> StoreResult<Decimal> {
    Decimal::from_str(text)
        .map_err(|e| StoreError::Corrupt(format!("列 {} 的值 {:?} 不是合法数值: {}", column, text, e)))
}

fn decimal_column(row: &SqliteRow, column: &str) -> StoreResult<Decimal> {
    let text: String = row.try_get(column)?;
    parse_decimal(column, &text)
}
