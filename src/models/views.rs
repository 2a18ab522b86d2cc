//! 接口输出结构
//!
//! 每个结构都是从内部模型到 JSON 输出的一次投影

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use super::analytics::DeltaRecord;
use super::stock::{PriceRecord, Stock};
use super::trade::TradeRow;

/// 股票列表项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockView {
    pub name: String,
    pub company_name: String,
}

impl From<&Stock> for StockView {
    fn from(stock: &Stock) -> Self {
        Self {
            name: stock.name.clone(),
            company_name: stock.company_name.clone(),
        }
    }
}

/// 价格列表项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceView {
    pub stock: String,
    pub date: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

impl PriceView {
    pub fn new(stock: &Stock, price: &PriceRecord) -> Self {
        Self {
            stock: stock.name.clone(),
            date: price.date,
            open: price.open,
            high: price.high,
            low: price.low,
            close: price.close,
            volume: price.volume,
        }
    }
}

/// 分析接口的价格项，附带环比差值
///
/// `absolute_delta` 只在阈值模式下输出，区间内每条记录取同一个值
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsView {
    pub stock: String,
    pub date: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    pub delta_open: Decimal,
    pub delta_high: Decimal,
    pub delta_low: Decimal,
    pub delta_close: Decimal,
    pub delta_volume: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_delta: Option<Decimal>,
}

impl AnalyticsView {
    pub fn new(stock: &Stock, record: &DeltaRecord, absolute_delta: Option<Decimal>) -> Self {
        let price = &record.price;
        Self {
            stock: stock.name.clone(),
            date: price.date,
            open: price.open,
            high: price.high,
            low: price.low,
            close: price.close,
            volume: price.volume,
            delta_open: record.delta_open,
            delta_high: record.delta_high,
            delta_low: record.delta_low,
            delta_close: record.delta_close,
            delta_volume: record.delta_volume,
            absolute_delta,
        }
    }
}

/// 股票维度的内部人交易
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeView {
    pub insider: String,
    pub relation: String,
    pub last_date: NaiveDate,
    pub transaction_type: String,
    pub owner_type: String,
    pub shares_traded: i64,
    pub last_price: Option<Decimal>,
    pub shares_held: i64,
}

impl From<&TradeRow> for TradeView {
    fn from(row: &TradeRow) -> Self {
        Self {
            insider: row.insider_name.clone(),
            relation: row.position.display().to_string(),
            last_date: row.trade.last_date,
            transaction_type: row.trade.transaction_type.clone(),
            owner_type: row.trade.owner_type.display().to_string(),
            shares_traded: row.trade.shares_traded,
            last_price: row.trade.last_price,
            shares_held: row.trade.shares_held,
        }
    }
}

/// 内部人维度的交易，用公司代替内部人姓名
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsiderTradeView {
    pub company: String,
    pub relation: String,
    pub last_date: NaiveDate,
    pub transaction_type: String,
    pub owner_type: String,
    pub shares_traded: i64,
    pub last_price: Option<Decimal>,
    pub shares_held: i64,
}

impl From<&TradeRow> for InsiderTradeView {
    fn from(row: &TradeRow) -> Self {
        let trade = TradeView::from(row);
        Self {
            company: row.stock_name.clone(),
            relation: trade.relation,
            last_date: trade.last_date,
            transaction_type: trade.transaction_type,
            owner_type: trade.owner_type,
            shares_traded: trade.shares_traded,
            last_price: trade.last_price,
            shares_held: trade.shares_held,
        }
    }
}
