//! 内部人交易数据模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 交易最新价保留的小数位数
pub const LAST_PRICE_SCALE: u32 = 4;

/// 内部人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insider {
    pub id: i64,
    pub full_name: String,
    /// 由姓名生成，全局唯一
    pub slug: String,
}

/// 内部人在公司中的职位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Officer,
    Director,
}

impl Position {
    pub fn code(self) -> i64 {
        match self {
            Position::Officer => 0,
            Position::Director => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Position::Officer),
            1 => Some(Position::Director),
            _ => None,
        }
    }

    /// 展示名称
    pub fn display(self) -> &'static str {
        match self {
            Position::Officer => "Officer",
            Position::Director => "Director",
        }
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFFICER" => Ok(Position::Officer),
            "DIRECTOR" => Ok(Position::Director),
            _ => Err(s.to_string()),
        }
    }
}

/// 持有方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerType {
    Direct,
    Indirect,
}

impl OwnerType {
    pub fn code(self) -> i64 {
        match self {
            OwnerType::Direct => 0,
            OwnerType::Indirect => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(OwnerType::Direct),
            1 => Some(OwnerType::Indirect),
            _ => None,
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            OwnerType::Direct => "direct",
            OwnerType::Indirect => "indirect",
        }
    }
}

impl FromStr for OwnerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DIRECT" => Ok(OwnerType::Direct),
            "INDIRECT" => Ok(OwnerType::Indirect),
            _ => Err(s.to_string()),
        }
    }
}

/// 内部人与股票的任职关系
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: i64,
    pub position: Position,
    pub stock_id: i64,
    pub insider_id: i64,
}

/// 一笔内部人交易
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub relation_id: i64,
    pub last_date: NaiveDate,
    pub transaction_type: String,
    pub owner_type: OwnerType,
    pub shares_traded: i64,
    pub last_price: Option<Decimal>,
    pub shares_held: i64,
}

/// 待入库的交易，所有字段共同构成去重键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrade {
    pub relation_id: i64,
    pub last_date: NaiveDate,
    pub transaction_type: String,
    pub owner_type: OwnerType,
    pub shares_traded: i64,
    pub last_price: Option<Decimal>,
    pub shares_held: i64,
}

/// 列表查询使用的交易行（已关联内部人、职位和股票）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRow {
    pub trade: Trade,
    pub insider_name: String,
    pub insider_slug: String,
    pub position: Position,
    pub stock_name: String,
}
