//! 任职关系与内部人交易的读写

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decimal_text, parse_decimal, Store, StoreError, StoreResult};
use crate::models::{
    NewTrade, OwnerType, Position, Relation, Trade, TradeRow, LAST_PRICE_SCALE,
};

const TRADE_COLUMNS: &str = "t.id, t.relation_id, t.last_date, t.transaction_type, \
     t.owner_type, t.shares_traded, t.last_price, t.shares_held";

impl Store {
    pub async fn get_or_create_relation(
        &self,
        position: Position,
        stock_id: i64,
        insider_id: i64,
    ) -> StoreResult<Relation> {
        sqlx::query(
            r#"
INSERT INTO relations (position, stock_id, insider_id) VALUES (?, ?, ?)
ON CONFLICT (position, stock_id, insider_id) DO NOTHING
"#,
        )
        .bind(position.code())
        .bind(stock_id)
        .bind(insider_id)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT id, position, stock_id, insider_id FROM relations \
             WHERE position = ? AND stock_id = ? AND insider_id = ?",
        )
        .bind(position.code())
        .bind(stock_id)
        .bind(insider_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Relation {
            id: row.try_get("id")?,
            position: position_column(&row)?,
            stock_id: row.try_get("stock_id")?,
            insider_id: row.try_get("insider_id")?,
        })
    }

    /// 所有字段完全相同的交易视为同一条；最新价为空也参与比较
    pub async fn get_or_create_trade(&self, trade: &NewTrade) -> StoreResult<(Trade, bool)> {
        let last_price = trade
            .last_price
            .map(|price| decimal_text(price, LAST_PRICE_SCALE));

        let result = sqlx::query(
            r#"
INSERT INTO trades (
  relation_id, last_date, transaction_type, owner_type,
  shares_traded, last_price, shares_held
) VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT DO NOTHING
"#,
        )
        .bind(trade.relation_id)
        .bind(trade.last_date)
        .bind(&trade.transaction_type)
        .bind(trade.owner_type.code())
        .bind(trade.shares_traded)
        .bind(&last_price)
        .bind(trade.shares_held)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades t \
             WHERE t.relation_id = ? AND t.last_date = ? AND t.transaction_type = ? \
               AND t.owner_type = ? AND t.shares_traded = ? AND t.shares_held = ? \
               AND t.last_price IS ?"
        ))
        .bind(trade.relation_id)
        .bind(trade.last_date)
        .bind(&trade.transaction_type)
        .bind(trade.owner_type.code())
        .bind(trade.shares_traded)
        .bind(trade.shares_held)
        .bind(&last_price)
        .fetch_one(&self.pool)
        .await?;

        Ok((row_to_trade(&row)?, result.rows_affected() == 1))
    }

    /// 某只股票的全部内部人交易，按日期和内部人姓名倒序
    pub async fn trades_for_stock(&self, stock_id: i64) -> StoreResult<Vec<TradeRow>> {
        self.trade_rows("r.stock_id = ?", stock_id).await
    }

    /// 某位内部人在所有公司的交易，按日期和姓名倒序
    pub async fn trades_for_insider(&self, insider_id: i64) -> StoreResult<Vec<TradeRow>> {
        self.trade_rows("r.insider_id = ?", insider_id).await
    }

    async fn trade_rows(&self, filter: &str, id: i64) -> StoreResult<Vec<TradeRow>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRADE_COLUMNS}, r.position, i.full_name, i.slug, s.name AS stock_name \
             FROM trades t \
             JOIN relations r ON r.id = t.relation_id \
             JOIN insiders i ON i.id = r.insider_id \
             JOIN stocks s ON s.id = r.stock_id \
             WHERE {filter} \
             ORDER BY t.last_date DESC, i.full_name DESC, t.id DESC"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TradeRow {
                    trade: row_to_trade(row)?,
                    insider_name: row.try_get("full_name")?,
                    insider_slug: row.try_get("slug")?,
                    position: position_column(row)?,
                    stock_name: row.try_get("stock_name")?,
                })
            })
            .collect()
    }
}

fn position_column(row: &SqliteRow) -> StoreResult<Position> {
    let code: i64 = row.try_get("position")?;
    Position::from_code(code).ok_or_else(|| StoreError::Corrupt(format!("未知的职位代码: {}", code)))
}

fn row_to_trade(row: &SqliteRow) -> StoreResult<Trade> {
    let owner_code: i64 = row.try_get("owner_type")?;
    let owner_type = OwnerType::from_code(owner_code)
        .ok_or_else(|| StoreError::Corrupt(format!("未知的持有类型代码: {}", owner_code)))?;
    let last_date: NaiveDate = row.try_get("last_date")?;
    let last_price: Option<String> = row.try_get("last_price")?;

    Ok(Trade {
        id: row.try_get("id")?,
        relation_id: row.try_get("relation_id")?,
        last_date,
        transaction_type: row.try_get("transaction_type")?,
        owner_type,
        shares_traded: row.try_get("shares_traded")?,
        last_price: last_price
            .as_deref()
            .map(|text| parse_decimal("last_price", text))
            .transpose()?,
        shares_held: row.try_get("shares_held")?,
    })
}
