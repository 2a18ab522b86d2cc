//! 抓取字段规范化
//!
//! 页面上的数值带有千位分隔符，日期可能是完整日期 `MM/DD/YYYY`，
//! 也可能（仅最新一行）是当天的时间 `HH:MM`。这里把原始字符串统一
//! 转换为入库所需的类型

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use super::html::{RawPriceRow, RawTradeRow};
use crate::models::{NewPrice, OwnerType, Position, LAST_PRICE_SCALE, PRICE_SCALE};

/// 数据质量错误，出现时跳过该行
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("字段 {field} 不是合法数值: {value:?}")]
    Number { field: &'static str, value: String },
    #[error("无法识别的日期: {0:?}")]
    Date(String),
    #[error("未知的职位: {0:?}")]
    Position(String),
    #[error("未知的持有类型: {0:?}")]
    OwnerType(String),
}

/// 解析后的一笔交易（尚未关联数据库主键）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTrade {
    pub insider_name: String,
    pub position: Position,
    pub last_date: NaiveDate,
    pub transaction_type: String,
    pub owner_type: OwnerType,
    pub shares_traded: i64,
    pub last_price: Option<Decimal>,
    pub shares_held: i64,
}

/// 去掉千位分隔符、不间断空格和首尾空白
pub fn clean_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ',' && *c != '\u{a0}' && !c.is_whitespace())
        .collect()
}

pub fn parse_decimal(field: &'static str, raw: &str, scale: u32) -> Result<Decimal, ParseError> {
    let cleaned = clean_number(raw);
    let mut value = Decimal::from_str(&cleaned).map_err(|_| ParseError::Number {
        field,
        value: raw.to_string(),
    })?;
    value.rescale(scale);
    Ok(value)
}

pub fn parse_integer(field: &'static str, raw: &str) -> Result<i64, ParseError> {
    clean_number(raw).parse::<i64>().map_err(|_| ParseError::Number {
        field,
        value: raw.to_string(),
    })
}

/// 解析价格表的日期列
///
/// `MM/DD/YYYY` 取当天零点；`HH:MM` 表示交易所所在时区今天的该时刻
pub fn parse_price_date(raw: &str, now: DateTime<Tz>) -> Result<NaiveDateTime, ParseError> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|time| now.date_naive().and_time(time))
        .map_err(|_| ParseError::Date(raw.to_string()))
}

pub fn parse_trade_date(raw: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y").map_err(|_| ParseError::Date(raw.to_string()))
}

pub fn normalize_price_row(row: &RawPriceRow, now: DateTime<Tz>) -> Result<NewPrice, ParseError> {
    Ok(NewPrice {
        date: parse_price_date(&row.date, now)?,
        open: parse_decimal("open", &row.open, PRICE_SCALE)?,
        high: parse_decimal("high", &row.high, PRICE_SCALE)?,
        low: parse_decimal("low", &row.low, PRICE_SCALE)?,
        close: parse_decimal("close", &row.close, PRICE_SCALE)?,
        volume: parse_integer("volume", &row.volume)?,
    })
}

pub fn normalize_trade_row(row: &RawTradeRow) -> Result<ParsedTrade, ParseError> {
    let position = Position::from_str(&row.relation).map_err(ParseError::Position)?;
    let owner_type = OwnerType::from_str(&row.owner_type).map_err(ParseError::OwnerType)?;

    let last_price = if clean_number(&row.last_price).is_empty() {
        None
    } else {
        Some(parse_decimal("last_price", &row.last_price, LAST_PRICE_SCALE)?)
    };

    Ok(ParsedTrade {
        insider_name: row.insider.trim().to_string(),
        position,
        last_date: parse_trade_date(&row.last_date)?,
        transaction_type: row.transaction_type.trim().to_string(),
        owner_type,
        shares_traded: parse_integer("shares_traded", &row.shares_traded)?,
        last_price,
        shares_held: parse_integer("shares_held", &row.shares_held)?,
    })
}
