//! Nasdaq 抓取器
//!
//! 对每只股票：抓取历史价格页并入库，再抓取内部人交易的各个分页并入库。
//! 股票之间、分页之间都以 `threads` 为上限并发执行

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use url::Url;

use super::html::{self, RawPriceRow, RawTradeRow};
use super::normalize::{normalize_price_row, normalize_trade_row, ParsedTrade};
use crate::config::ParserConfig;
use crate::models::{NewTrade, Stock};
use crate::services::common::{exchange_now, USER_AGENT};
use crate::services::store::Store;

/// 一次抓取任务的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// 成功处理的股票数
    pub stocks: usize,
    /// 新增的价格记录数
    pub prices_created: usize,
    /// 新增的交易记录数
    pub trades_created: usize,
    /// 因数据问题被跳过的行数
    pub rows_skipped: usize,
    /// 失败的股票或分页数
    pub failures: usize,
}

impl IngestSummary {
    fn merge(&mut self, other: IngestSummary) {
        self.stocks += other.stocks;
        self.prices_created += other.prices_created;
        self.trades_created += other.trades_created;
        self.rows_skipped += other.rows_skipped;
        self.failures += other.failures;
    }
}

/// Nasdaq 页面抓取器
pub struct NasdaqParser {
    client: Client,
    store: Store,
    base_url: Url,
    threads: usize,
    max_pages: u32,
}

impl NasdaqParser {
    pub fn new(store: Store, config: &ParserConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("无效的站点地址: {}", config.base_url))?;

        Ok(Self {
            client,
            store,
            base_url,
            threads: config.threads.max(1),
            max_pages: config.max_pages,
        })
    }

    /// 历史价格页地址
    pub fn prices_url(&self, stock: &str) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("symbol/{}/historical", stock.to_lowercase()))?)
    }

    /// 内部人交易分页地址
    pub fn trades_url(&self, stock: &str, page: u32) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("symbol/{}/insider-trades", stock.to_lowercase()))?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url)
    }

    async fn fetch_html(&self, url: Url) -> Result<String> {
        log::debug!("请求页面: {}", url);

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("获取页面失败 {}: {}", url, response.status()));
        }

        Ok(response.text().await?)
    }

    /// 抓取全部股票，单只股票失败不影响其余股票
    pub async fn run(&self, tickers: &[String]) -> IngestSummary {
        log::info!("开始抓取 {} 只股票，并发数 {}", tickers.len(), self.threads);

        let results: Vec<(String, Result<IngestSummary>)> = stream::iter(tickers)
            .map(|ticker| async move { (ticker.clone(), self.ingest_ticker(ticker).await) })
            .buffer_unordered(self.threads)
            .collect()
            .await;

        let mut summary = IngestSummary::default();
        for (ticker, result) in results {
            match result {
                Ok(partial) => summary.merge(partial),
                Err(e) => {
                    log::error!("抓取 {} 失败: {:#}", ticker, e);
                    summary.failures += 1;
                }
            }
        }

        log::info!(
            "抓取完成: 股票 {}，新增价格 {}，新增交易 {}，跳过行 {}，失败 {}",
            summary.stocks,
            summary.prices_created,
            summary.trades_created,
            summary.rows_skipped,
            summary.failures
        );
        summary
    }

    async fn ingest_ticker(&self, ticker: &str) -> Result<IngestSummary> {
        let (stock, mut summary) = self.save_stock_prices(ticker).await?;
        summary.merge(self.save_insider_trades(&stock).await?);
        summary.stocks = 1;
        Ok(summary)
    }

    /// 抓取历史价格页，写入股票信息和价格
    pub async fn save_stock_prices(&self, ticker: &str) -> Result<(Stock, IngestSummary)> {
        let body = self.fetch_html(self.prices_url(ticker)?).await?;
        let (company_name, rows) = {
            let document = Html::parse_document(&body);
            (
                html::parse_company_name(&document)?,
                html::parse_price_rows(&document)?,
            )
        };

        let stock = self.store.get_or_create_stock(ticker, &company_name).await?;
        let summary = self.store_price_rows(&stock, &rows).await?;

        log::info!(
            "{} 价格页解析 {} 行，新增 {} 条",
            stock.name,
            rows.len(),
            summary.prices_created
        );
        Ok((stock, summary))
    }

    async fn store_price_rows(&self, stock: &Stock, rows: &[RawPriceRow]) -> Result<IngestSummary> {
        let now = exchange_now();
        let mut summary = IngestSummary::default();

        for row in rows {
            let price = match normalize_price_row(row, now) {
                Ok(price) => price,
                Err(e) => {
                    log::warn!("{} 跳过价格行 {:?}: {}", stock.name, row.date, e);
                    summary.rows_skipped += 1;
                    continue;
                }
            };

            let (_, created) = self.store.get_or_create_price(stock.id, &price).await?;
            if created {
                summary.prices_created += 1;
            }
        }

        Ok(summary)
    }

    /// 抓取第一页以确定页数，再并发抓取所有分页
    pub async fn save_insider_trades(&self, stock: &Stock) -> Result<IngestSummary> {
        let first_page = self.fetch_html(self.trades_url(&stock.name, 1)?).await?;
        let (last_page, first_rows) = {
            let document = Html::parse_document(&first_page);
            (
                html::parse_last_page(&document)?,
                html::parse_trade_rows(&document)?,
            )
        };

        let pages = html::page_numbers(last_page, self.max_pages);
        log::debug!("{} 内部人交易共 {} 页", stock.name, pages.len());

        let mut summary = self.store_trade_rows(stock, &first_rows).await?;

        let results: Vec<(u32, Result<IngestSummary>)> = stream::iter(pages.into_iter().skip(1))
            .map(|page| async move { (page, self.save_trades_page(stock, page).await) })
            .buffer_unordered(self.threads)
            .collect()
            .await;

        for (page, result) in results {
            match result {
                Ok(partial) => summary.merge(partial),
                Err(e) => {
                    log::warn!("{} 第 {} 页交易抓取失败: {:#}", stock.name, page, e);
                    summary.failures += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn save_trades_page(&self, stock: &Stock, page: u32) -> Result<IngestSummary> {
        let body = self.fetch_html(self.trades_url(&stock.name, page)?).await?;
        let rows = {
            let document = Html::parse_document(&body);
            html::parse_trade_rows(&document)?
        };
        self.store_trade_rows(stock, &rows).await
    }

    async fn store_trade_rows(&self, stock: &Stock, rows: &[RawTradeRow]) -> Result<IngestSummary> {
        let mut summary = IngestSummary::default();

        for row in rows {
            let trade = match normalize_trade_row(row) {
                Ok(trade) => trade,
                Err(e) => {
                    log::warn!("{} 跳过交易行 {:?}: {}", stock.name, row.insider, e);
                    summary.rows_skipped += 1;
                    continue;
                }
            };

            if self.store_trade(stock, trade).await? {
                summary.trades_created += 1;
            }
        }

        Ok(summary)
    }

    /// 依次写入内部人、任职关系和交易，返回交易是否为新建
    async fn store_trade(&self, stock: &Stock, trade: ParsedTrade) -> Result<bool> {
        let insider = self.store.get_or_create_insider(&trade.insider_name).await?;
        let relation = self
            .store
            .get_or_create_relation(trade.position, stock.id, insider.id)
            .await?;

        let (_, created) = self
            .store
            .get_or_create_trade(&NewTrade {
                relation_id: relation.id,
                last_date: trade.last_date,
                transaction_type: trade.transaction_type,
                owner_type: trade.owner_type,
                shares_traded: trade.shares_traded,
                last_price: trade.last_price,
                shares_held: trade.shares_held,
            })
            .await?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    async fn parser() -> NasdaqParser {
        let store = Store::in_memory().await;
        NasdaqParser::new(store, &ParserConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_urls() {
        let parser = parser().await;

        assert_eq!(
            parser.prices_url("AAPL").unwrap().as_str(),
            "https://www.nasdaq.com/symbol/aapl/historical"
        );
        assert_eq!(
            parser.trades_url("AAPL", 3).unwrap().as_str(),
            "https://www.nasdaq.com/symbol/aapl/insider-trades?page=3"
        );
    }

    /// 坏行被跳过，重复行不会重复入库
    #[tokio::test]
    async fn test_store_price_rows() {
        let parser = parser().await;
        let stock = parser.store.get_or_create_stock("AAPL", "").await.unwrap();

        let good = RawPriceRow {
            date: "03/14/2024".to_string(),
            open: "172.91".to_string(),
            high: "174.31".to_string(),
            low: "172.05".to_string(),
            close: "173.00".to_string(),
            volume: "72,913,500".to_string(),
        };
        let mut bad = good.clone();
        bad.close = "--".to_string();

        let rows = vec![good.clone(), bad, good];
        let summary = parser.store_price_rows(&stock, &rows).await.unwrap();

        assert_eq!(summary.prices_created, 1);
        assert_eq!(summary.rows_skipped, 1);

        let prices = parser.store.all_prices(stock.id).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].close, dec!(173));
        assert_eq!(prices[0].volume, 72_913_500);
    }

    #[tokio::test]
    async fn test_store_trade_rows() {
        let parser = parser().await;
        let stock = parser.store.get_or_create_stock("AAPL", "").await.unwrap();

        let row = RawTradeRow {
            insider: "COOK TIMOTHY D".to_string(),
            relation: "Officer".to_string(),
            last_date: "03/01/2024".to_string(),
            transaction_type: "Sell".to_string(),
            owner_type: "direct".to_string(),
            shares_traded: "196,410".to_string(),
            last_price: "".to_string(),
            shares_held: "3,280,180".to_string(),
        };
        let mut unknown = row.clone();
        unknown.owner_type = "joint".to_string();

        let rows = vec![row.clone(), unknown, row];
        let summary = parser.store_trade_rows(&stock, &rows).await.unwrap();

        assert_eq!(summary.trades_created, 1);
        assert_eq!(summary.rows_skipped, 1);

        let trades = parser.store.trades_for_stock(stock.id).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].insider_slug, "cook-timothy-d");
        assert_eq!(trades[0].trade.last_price, None);
    }

    #[test]
    fn test_summary_merge() {
        let mut total = IngestSummary {
            stocks: 1,
            prices_created: 3,
            ..Default::default()
        };
        total.merge(IngestSummary {
            trades_created: 2,
            failures: 1,
            ..Default::default()
        });

        assert_eq!(total.prices_created, 3);
        assert_eq!(total.trades_created, 2);
        assert_eq!(total.failures, 1);
    }
}
