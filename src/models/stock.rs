//! 股票与价格数据模型
//!
//! 定义股票、日线价格以及入库前的价格结构

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 价格字段（开盘/最高/最低/收盘）保留的小数位数
pub const PRICE_SCALE: u32 = 3;

/// 股票
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    /// 股票代码，如 AAPL
    pub name: String,
    /// 公司名称（可能为空）
    pub company_name: String,
}

/// 单日价格记录
///
/// 从存储中读取，按日期升序排列；分析引擎只借用不修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: i64,
    pub stock_id: i64,
    /// 交易所本地时间
    pub date: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

#[cfg(test)]
impl PriceRecord {
    /// 记录所在的自然日
    pub fn day(&self) -> chrono::NaiveDate {
        self.date.date()
    }
}

/// 待入库的价格（由采集管道规范化后产生）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrice {
    pub date: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}
