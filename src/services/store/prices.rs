//! 价格记录的读写

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decimal_column, decimal_text, Store, StoreResult};
use crate::models::{NewPrice, PriceRecord, PRICE_SCALE};

const PRICE_COLUMNS: &str = "id, stock_id, date, open, high, low, close, volume";

impl Store {
    /// 股票的全部价格，按日期升序
    pub async fn all_prices(&self, stock_id: i64) -> StoreResult<Vec<PriceRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRICE_COLUMNS} FROM prices WHERE stock_id = ? ORDER BY date ASC, id ASC"
        ))
        .bind(stock_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_price).collect()
    }

    /// 日期落在 `[date_from, date_to]` 内的价格（两端都包含），按日期升序
    pub async fn prices_in_range(
        &self,
        stock_id: i64,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> StoreResult<Vec<PriceRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRICE_COLUMNS} FROM prices \
             WHERE stock_id = ? AND date(date) BETWEEN ? AND ? \
             ORDER BY date ASC, id ASC"
        ))
        .bind(stock_id)
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_price).collect()
    }

    /// 恰好落在两个给定自然日之一的价格，按日期升序
    pub async fn prices_on_dates(
        &self,
        stock_id: i64,
        first: NaiveDate,
        second: NaiveDate,
    ) -> StoreResult<Vec<PriceRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRICE_COLUMNS} FROM prices \
             WHERE stock_id = ? AND date(date) IN (?, ?) \
             ORDER BY date ASC, id ASC"
        ))
        .bind(stock_id)
        .bind(first)
        .bind(second)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_price).collect()
    }

    /// 按 `(stock_id, date)` 幂等写入
    ///
    /// 已存在同一时间点的记录时不做修改，返回已有记录；第二个返回值表示是否新建
    pub async fn get_or_create_price(
        &self,
        stock_id: i64,
        price: &NewPrice,
    ) -> StoreResult<(PriceRecord, bool)> {
        let result = sqlx::query(
            r#"
INSERT INTO prices (stock_id, date, open, high, low, close, volume)
VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (stock_id, date) DO NOTHING
"#,
        )
        .bind(stock_id)
        .bind(price.date)
        .bind(decimal_text(price.open, PRICE_SCALE))
        .bind(decimal_text(price.high, PRICE_SCALE))
        .bind(decimal_text(price.low, PRICE_SCALE))
        .bind(decimal_text(price.close, PRICE_SCALE))
        .bind(price.volume)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(&format!(
            "SELECT {PRICE_COLUMNS} FROM prices WHERE stock_id = ? AND date = ?"
        ))
        .bind(stock_id)
        .bind(price.date)
        .fetch_one(&self.pool)
        .await?;

        Ok((row_to_price(&row)?, result.rows_affected() == 1))
    }
}

fn row_to_price(row: &SqliteRow) -> StoreResult<PriceRecord> {
    let date: NaiveDateTime = row.try_get("date")?;

    Ok(PriceRecord {
        id: row.try_get("id")?,
        stock_id: row.try_get("stock_id")?,
        date,
        open: decimal_column(row, "open")?,
        high: decimal_column(row, "high")?,
        low: decimal_column(row, "low")?,
        close: decimal_column(row, "close")?,
        volume: row.try_get("volume")?,
    })
}

#[cfg(test)]
mod tests {
    use crate::models::NewPrice;
    use crate::services::store::Store;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn at(d: u32, hour: u32, minute: u32) -> NaiveDateTime {
        day(d).and_hms_opt(hour, minute, 0).unwrap()
    }

    fn new_price(date: NaiveDateTime, close: Decimal) -> NewPrice {
        NewPrice {
            date,
            open: close,
            high: close + dec!(1),
            low: close - dec!(1),
            close,
            volume: 1_000,
        }
    }

    async fn seeded() -> (Store, i64) {
        let store = Store::in_memory().await;
        let stock = store.get_or_create_stock("AAPL", "Apple Inc.").await.unwrap();
        for d in 1..=5 {
            store
                .get_or_create_price(stock.id, &new_price(at(d, 0, 0), Decimal::from(d)))
                .await
                .unwrap();
        }
        (store, stock.id)
    }

    /// 同一 (stock, date) 重复写入只保留一条
    #[tokio::test]
    async fn test_get_or_create_price_is_idempotent() {
        let store = Store::in_memory().await;
        let stock = store.get_or_create_stock("MSFT", "").await.unwrap();
        let price = new_price(at(2, 0, 0), dec!(10.5));

        let (first, created_first) = store.get_or_create_price(stock.id, &price).await.unwrap();
        let (second, created_second) = store.get_or_create_price(stock.id, &price).await.unwrap();

        assert!(created_first);
        assert!(!created_second);
        assert_eq!(first, second);
        assert_eq!(first.close, dec!(10.500));
        assert_eq!(store.all_prices(stock.id).await.unwrap().len(), 1);
    }

    /// 同一时间点的新数据不会覆盖已有记录
    #[tokio::test]
    async fn test_existing_price_is_not_updated() {
        let store = Store::in_memory().await;
        let stock = store.get_or_create_stock("MSFT", "").await.unwrap();

        store
            .get_or_create_price(stock.id, &new_price(at(2, 0, 0), dec!(10)))
            .await
            .unwrap();
        let (kept, created) = store
            .get_or_create_price(stock.id, &new_price(at(2, 0, 0), dec!(99)))
            .await
            .unwrap();

        assert!(!created);
        assert_eq!(kept.close, dec!(10));
    }

    #[tokio::test]
    async fn test_all_prices_sorted_ascending() {
        let store = Store::in_memory().await;
        let stock = store.get_or_create_stock("TSLA", "").await.unwrap();
        for d in [3, 1, 2] {
            store
                .get_or_create_price(stock.id, &new_price(at(d, 0, 0), Decimal::from(d)))
                .await
                .unwrap();
        }
        store
            .get_or_create_price(stock.id, &new_price(at(2, 15, 45), dec!(2.5)))
            .await
            .unwrap();

        let prices = store.all_prices(stock.id).await.unwrap();
        let dates: Vec<NaiveDateTime> = prices.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![at(1, 0, 0), at(2, 0, 0), at(2, 15, 45), at(3, 0, 0)]);
    }

    /// 区间查询两端都包含
    #[tokio::test]
    async fn test_prices_in_range_is_inclusive() {
        let (store, stock_id) = seeded().await;
        store
            .get_or_create_price(stock_id, &new_price(at(4, 16, 0), dec!(4.2)))
            .await
            .unwrap();

        let prices = store.prices_in_range(stock_id, day(2), day(4)).await.unwrap();
        let closes: Vec<Decimal> = prices.iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![dec!(2), dec!(3), dec!(4), dec!(4.2)]);

        let single = store.prices_in_range(stock_id, day(5), day(5)).await.unwrap();
        assert_eq!(single.len(), 1);

        let empty = store.prices_in_range(stock_id, day(10), day(12)).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_prices_on_dates() {
        let (store, stock_id) = seeded().await;

        let prices = store.prices_on_dates(stock_id, day(4), day(1)).await.unwrap();
        let days: Vec<NaiveDate> = prices.iter().map(|p| p.day()).collect();
        assert_eq!(days, vec![day(1), day(4)]);

        let missing = store.prices_on_dates(stock_id, day(20), day(21)).await.unwrap();
        assert!(missing.is_empty());
    }

    /// 不同股票的数据互不干扰
    #[tokio::test]
    async fn test_prices_are_scoped_to_stock() {
        let (store, stock_id) = seeded().await;
        let other = store.get_or_create_stock("GOOG", "").await.unwrap();
        store
            .get_or_create_price(other.id, &new_price(at(1, 0, 0), dec!(100)))
            .await
            .unwrap();

        assert_eq!(store.all_prices(stock_id).await.unwrap().len(), 5);
        assert_eq!(store.all_prices(other.id).await.unwrap().len(), 1);
    }
}
