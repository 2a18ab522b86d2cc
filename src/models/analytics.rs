//! 价格分析数据模型
//!
//! - `PriceField`: 参与分析的五个数值字段
//! - `DeltaRecord`: 带有环比差值的价格记录
//! - `IntervalCandidate`: 最短周期搜索的结果区间

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::stock::PriceRecord;

/// 价格字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        }
    }
}

impl FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            "volume" => Ok(PriceField::Volume),
            _ => Err(format!(
                "未知的价格类型 {:?}，可选值: open, high, low, close, volume",
                s
            )),
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 带环比差值的价格记录
///
/// 每个 `delta_*` 等于当前记录与前一条记录（按日期升序）同一字段之差，
/// 序列中第一条记录没有前驱，所有差值为 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaRecord {
    pub price: PriceRecord,
    pub delta_open: Decimal,
    pub delta_high: Decimal,
    pub delta_low: Decimal,
    pub delta_close: Decimal,
    pub delta_volume: i64,
}

impl DeltaRecord {
    /// 没有前驱的记录
    pub fn first(price: PriceRecord) -> Self {
        Self {
            price,
            delta_open: Decimal::ZERO,
            delta_high: Decimal::ZERO,
            delta_low: Decimal::ZERO,
            delta_close: Decimal::ZERO,
            delta_volume: 0,
        }
    }

    /// 相对前一条记录计算差值
    pub fn after(price: PriceRecord, previous: &PriceRecord) -> Self {
        Self {
            delta_open: price.open - previous.open,
            delta_high: price.high - previous.high,
            delta_low: price.low - previous.low,
            delta_close: price.close - previous.close,
            delta_volume: price.volume - previous.volume,
            price,
        }
    }

    pub fn delta(&self, field: PriceField) -> Decimal {
        match field {
            PriceField::Open => self.delta_open,
            PriceField::High => self.delta_high,
            PriceField::Low => self.delta_low,
            PriceField::Close => self.delta_close,
            PriceField::Volume => Decimal::from(self.delta_volume),
        }
    }
}

/// 最短周期搜索的候选区间
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalCandidate {
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub start_id: i64,
    pub end_id: i64,
    /// 两端之间累计绝对变动（churn）之差
    pub absolute_delta: Decimal,
    /// 两端日期相差的整天数
    pub span_in_days: i64,
}

impl IntervalCandidate {
    /// 区间覆盖的自然日范围（闭区间，较早的日期在前）
    pub fn day_range(&self) -> (NaiveDate, NaiveDate) {
        let start = self.start_date.date();
        let end = self.end_date.date();
        (start.min(end), start.max(end))
    }
}
