use sqlx::SqlitePool;

const STATEMENTS: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS stocks (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE,
  company_name TEXT NOT NULL DEFAULT ''
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS prices (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  stock_id INTEGER NOT NULL REFERENCES stocks(id) ON DELETE CASCADE,
  date TEXT NOT NULL,
  open TEXT NOT NULL,
  high TEXT NOT NULL,
  low TEXT NOT NULL,
  close TEXT NOT NULL,
  volume INTEGER NOT NULL,
  UNIQUE (stock_id, date)
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS insiders (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  full_name TEXT NOT NULL,
  slug TEXT NOT NULL UNIQUE
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS relations (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  position INTEGER NOT NULL CHECK (position IN (0, 1)),
  stock_id INTEGER NOT NULL REFERENCES stocks(id) ON DELETE CASCADE,
  insider_id INTEGER NOT NULL REFERENCES insiders(id) ON DELETE CASCADE,
  UNIQUE (position, stock_id, insider_id)
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS trades (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  relation_id INTEGER NOT NULL REFERENCES relations(id) ON DELETE CASCADE,
  last_date TEXT NOT NULL,
  transaction_type TEXT NOT NULL,
  owner_type INTEGER NOT NULL CHECK (owner_type IN (0, 1)),
  shares_traded INTEGER NOT NULL,
  last_price TEXT,
  shares_held INTEGER NOT NULL
);
"#,
    // last_price 为空的交易也要参与去重
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_trades_identity ON trades (
  relation_id, last_date, transaction_type, owner_type,
  shares_traded, shares_held, IFNULL(last_price, '')
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_relations_insider ON relations(insider_id);"#,
];

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
