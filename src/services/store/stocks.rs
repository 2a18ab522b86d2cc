//! 股票与内部人的读写

use regex::Regex;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::sync::LazyLock;

use super::{Store, StoreResult};
use crate::models::{Insider, Stock};

static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("分隔符正则无效"));

/// 生成 URL 友好的标识：转小写、去掉非单词字符、空白和连字符合并为 `-`
///
/// 例如 "COOK TIMOTHY D." -> "cook-timothy-d"。非 ASCII 字母原样保留，不做音标折叠
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    SLUG_SEPARATORS
        .replace_all(stripped.trim(), "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}

impl Store {
    /// 按股票代码写入，公司名称非空时更新为最新值
    pub async fn get_or_create_stock(&self, name: &str, company_name: &str) -> StoreResult<Stock> {
        sqlx::query(
            r#"
INSERT INTO stocks (name, company_name) VALUES (?, ?)
ON CONFLICT (name) DO UPDATE SET company_name = CASE
  WHEN excluded.company_name <> '' THEN excluded.company_name
  ELSE stocks.company_name
END
"#,
        )
        .bind(name)
        .bind(company_name)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id, name, company_name FROM stocks WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        row_to_stock(&row)
    }

    pub async fn list_stocks(&self) -> StoreResult<Vec<Stock>> {
        let rows = sqlx::query("SELECT id, name, company_name FROM stocks ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_stock).collect()
    }

    pub async fn find_stock(&self, name: &str) -> StoreResult<Option<Stock>> {
        let row = sqlx::query("SELECT id, name, company_name FROM stocks WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_stock).transpose()
    }

    /// 按 slug 写入内部人，同名（slug 相同）视为同一人
    pub async fn get_or_create_insider(&self, full_name: &str) -> StoreResult<Insider> {
        let slug = slugify(full_name);

        sqlx::query(
            "INSERT INTO insiders (full_name, slug) VALUES (?, ?) ON CONFLICT (slug) DO NOTHING",
        )
        .bind(full_name.trim())
        .bind(&slug)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id, full_name, slug FROM insiders WHERE slug = ?")
            .bind(&slug)
            .fetch_one(&self.pool)
            .await?;

        row_to_insider(&row)
    }

    pub async fn find_insider(&self, slug: &str) -> StoreResult<Option<Insider>> {
        let row = sqlx::query("SELECT id, full_name, slug FROM insiders WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_insider).transpose()
    }
}

fn row_to_stock(row: &SqliteRow) -> StoreResult<Stock> {
    Ok(Stock {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        company_name: row.try_get("company_name")?,
    })
}

fn row_to_insider(row: &SqliteRow) -> StoreResult<Insider> {
    Ok(Insider {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        slug: row.try_get("slug")?,
    })
}
