//! 公共常量和辅助函数

use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

/// Nasdaq 站点根地址
pub const NASDAQ_BASE_URL: &str = "https://www.nasdaq.com/";

/// 抓取时使用的 User-Agent
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 交易所所在时区，价格时间均以此时区的本地时间保存
pub const EXCHANGE_TZ: Tz = New_York;

/// 交易所当前时间
pub fn exchange_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&EXCHANGE_TZ)
}

/// 交易所当前时间字符串（RFC 3339）
pub fn exchange_time_string() -> String {
    exchange_now().to_rfc3339()
}
