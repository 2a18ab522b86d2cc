//! Nasdaq 页面解析
//!
//! 只负责从 HTML 中取出原始字符串，数值和日期的转换见 `normalize`

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

/// 标题中需要去掉的后缀
const TITLE_SUFFIXES: [&str; 2] = [
    "Common Stock Historical Stock Prices",
    "Capital Stock Historical Stock Prices",
];

/// 内部人交易最多抓取的页数
pub const MAX_TRADE_PAGES: u32 = 10;

/// 价格表中的一行原始数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPriceRow {
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

/// 内部人交易表中的一行原始数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTradeRow {
    pub insider: String,
    pub relation: String,
    pub last_date: String,
    pub transaction_type: String,
    pub owner_type: String,
    pub shares_traded: String,
    pub last_price: String,
    pub shares_held: String,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("无效的选择器 {}: {:?}", css, e))
}

fn cell_texts(row: ElementRef<'_>, td: &Selector) -> Vec<String> {
    row.select(td)
        .map(|cell| cell.text().collect::<Vec<_>>().join("").trim().to_string())
        .collect()
}

/// 从页面第一个 `<h1>` 中取公司名称
pub fn parse_company_name(document: &Html) -> Result<String> {
    let h1 = selector("h1")?;
    let title = document
        .select(&h1)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(""))
        .unwrap_or_default();

    let name = TITLE_SUFFIXES
        .iter()
        .fold(title, |acc, suffix| acc.replace(suffix, ""));
    Ok(name.trim().to_string())
}

/// 解析历史价格表，日期为空的行会被跳过
pub fn parse_price_rows(document: &Html) -> Result<Vec<RawPriceRow>> {
    let tr = selector(".genTable > div > table > tbody > tr")?;
    let td = selector("td")?;

    let rows = document
        .select(&tr)
        .map(|row| cell_texts(row, &td))
        .filter(|cells| cells.len() >= 6 && !cells[0].is_empty())
        .map(|cells| RawPriceRow {
            date: cells[0].clone(),
            open: cells[1].clone(),
            high: cells[2].clone(),
            low: cells[3].clone(),
            close: cells[4].clone(),
            volume: cells[5].clone(),
        })
        .collect();

    Ok(rows)
}

/// 分页控件中“最后一页”链接的页码
pub fn parse_last_page(document: &Html) -> Result<Option<u32>> {
    let last_page = selector("#quotes_content_left_lb_LastPage")?;

    let number = document
        .select(&last_page)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| href.rsplit('=').next())
        .and_then(|n| n.trim_end_matches('/').trim().parse::<u32>().ok());

    Ok(number)
}

/// 需要抓取的页码：从 1 到最后一页，最多 `MAX_TRADE_PAGES` 页
pub fn page_numbers(last_page: Option<u32>, max_pages: u32) -> Vec<u32> {
    let last = last_page.unwrap_or(1).clamp(1, max_pages.max(1));
    (1..=last).collect()
}

/// 解析内部人交易表，单元格不足 8 个的行（如表头）会被跳过
pub fn parse_trade_rows(document: &Html) -> Result<Vec<RawTradeRow>> {
    let tr = selector(".genTable table tr")?;
    let td = selector("td")?;

    let rows = document
        .select(&tr)
        .map(|row| cell_texts(row, &td))
        .filter(|cells| cells.len() >= 8 && !cells[0].is_empty())
        .map(|cells| RawTradeRow {
            insider: cells[0].clone(),
            relation: cells[1].clone(),
            last_date: cells[2].clone(),
            transaction_type: cells[3].clone(),
            owner_type: cells[4].clone(),
            shares_traded: cells[5].clone(),
            last_price: cells[6].clone(),
            shares_held: cells[7].clone(),
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICES_PAGE: &str = r#"
<html><body>
  <h1>Apple Inc. Common Stock Historical Stock Prices</h1>
  <div class="genTable">
    <div>
      <table>
        <thead><tr><th>Date</th><th>Open</th><th>High</th><th>Low</th><th>Close</th><th>Volume</th></tr></thead>
        <tbody>
          <tr><td>
                16:00
              </td><td>172.10</td><td>173.50</td><td>171.00</td><td>172.62</td><td>51,234,100</td></tr>
          <tr><td></td><td></td><td></td><td></td><td></td><td></td></tr>
          <tr><td>03/14/2024</td><td>1,172.91</td><td>174.31</td><td>172.05</td><td>173.00</td><td>72,913,500</td></tr>
        </tbody>
      </table>
    </div>
  </div>
</body></html>
"#;

    const TRADES_PAGE: &str = r#"
<html><body>
  <div class="genTable">
    <table>
      <tr><th>Insider</th><th>Relation</th><th>Last Date</th><th>Transaction</th>
          <th>Owner Type</th><th>Shares Traded</th><th>Last Price</th><th>Shares Held</th></tr>
      <tr><td><a href="/insider/cook-timothy-d">COOK TIMOTHY D</a></td><td>Officer</td><td>03/01/2024</td>
          <td>Sell</td><td>direct</td><td>196,410</td><td>187.6785</td><td>3,280,180</td></tr>
      <tr><td>LEVINSON ARTHUR D</td><td>Director</td><td>02/15/2024</td>
          <td>Option Execute</td><td>indirect</td><td>1,852</td><td></td><td>4,520,404</td></tr>
    </table>
  </div>
  <a id="quotes_content_left_lb_LastPage" href="https://www.nasdaq.com/symbol/aapl/insider-trades?page=14">last</a>
</body></html>
"#;

    #[test]
    fn test_parse_company_name() {
        let doc = Html::parse_document(PRICES_PAGE);
        assert_eq!(parse_company_name(&doc).unwrap(), "Apple Inc.");

        let capital = Html::parse_document(
            "<h1>Alphabet Inc. Class C Capital Stock Historical Stock Prices</h1>",
        );
        assert_eq!(parse_company_name(&capital).unwrap(), "Alphabet Inc. Class C");

        let missing = Html::parse_document("<p>nothing</p>");
        assert_eq!(parse_company_name(&missing).unwrap(), "");
    }

    #[test]
    fn test_parse_price_rows() {
        let doc = Html::parse_document(PRICES_PAGE);
        let rows = parse_price_rows(&doc).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "16:00");
        assert_eq!(rows[0].volume, "51,234,100");
        assert_eq!(rows[1].date, "03/14/2024");
        assert_eq!(rows[1].open, "1,172.91");
    }

    /// 解析器会自动补齐 tbody，选择器仍能匹配
    #[test]
    fn test_parse_trade_rows() {
        let doc = Html::parse_document(TRADES_PAGE);
        let rows = parse_trade_rows(&doc).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].insider, "COOK TIMOTHY D");
        assert_eq!(rows[0].shares_traded, "196,410");
        assert_eq!(rows[1].relation, "Director");
        assert_eq!(rows[1].last_price, "");
    }

    #[test]
    fn test_parse_last_page() {
        let doc = Html::parse_document(TRADES_PAGE);
        assert_eq!(parse_last_page(&doc).unwrap(), Some(14));

        let no_pager = Html::parse_document(PRICES_PAGE);
        assert_eq!(parse_last_page(&no_pager).unwrap(), None);
    }

    #[test]
    fn test_page_numbers() {
        assert_eq!(page_numbers(Some(3), MAX_TRADE_PAGES), vec![1, 2, 3]);
        assert_eq!(page_numbers(Some(14), MAX_TRADE_PAGES).len(), 10);
        assert_eq!(page_numbers(None, MAX_TRADE_PAGES), vec![1]);
        assert_eq!(page_numbers(Some(0), MAX_TRADE_PAGES), vec![1]);
    }
}
