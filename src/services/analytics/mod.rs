//! 价格分析服务
//!
//! - `compute_deltas`: 环比差值
//! - `find_min_period`: 累计变动超过阈值的最短区间
//! - `run_analytics`: 按请求模式从存储取数并组合上述两步

mod delta;
mod period;

pub use delta::compute_deltas;
pub use period::find_min_period;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{DeltaRecord, PriceField, Stock};
use crate::services::store::{Store, StoreResult};

/// 分析请求模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsMode {
    /// 两个指定日期之间的差值
    BetweenDates {
        date_from: NaiveDate,
        date_to: NaiveDate,
    },
    /// 在（可选的）日期窗口内寻找累计变动超过阈值的最短区间
    Threshold {
        field: PriceField,
        threshold: Decimal,
        window: Option<(NaiveDate, NaiveDate)>,
    },
}

/// 分析结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalyticsOutcome {
    pub records: Vec<DeltaRecord>,
    /// 阈值模式下找到的区间累计变动，附加在每条记录上
    pub absolute_delta: Option<Decimal>,
}

/// 执行一次分析请求
///
/// 差值总是在返回的序列内部计算，序列第一条的差值为 0
pub async fn run_analytics(
    store: &Store,
    stock: &Stock,
    mode: &AnalyticsMode,
) -> StoreResult<AnalyticsOutcome> {
    match mode {
        AnalyticsMode::BetweenDates { date_from, date_to } => {
            let prices = store.prices_on_dates(stock.id, *date_from, *date_to).await?;
            Ok(AnalyticsOutcome {
                records: compute_deltas(&prices),
                absolute_delta: None,
            })
        }
        AnalyticsMode::Threshold {
            field,
            threshold,
            window,
        } => {
            let prices = match window {
                Some((from, to)) => {
                    store
                        .prices_in_range(stock.id, (*from).min(*to), (*from).max(*to))
                        .await?
                }
                None => store.all_prices(stock.id).await?,
            };

            let deltas = compute_deltas(&prices);
            let Some(period) = find_min_period(&deltas, *field, *threshold) else {
                log::debug!(
                    "{} 没有 {} 累计变动超过 {} 的区间",
                    stock.name,
                    field,
                    threshold
                );
                return Ok(AnalyticsOutcome::default());
            };

            let (from, to) = period.day_range();
            let narrowed = store.prices_in_range(stock.id, from, to).await?;
            log::debug!(
                "{} 最短区间 {} ~ {}，{} 累计变动 {}",
                stock.name,
                from,
                to,
                field,
                period.absolute_delta
            );

            Ok(AnalyticsOutcome {
                records: compute_deltas(&narrowed),
                absolute_delta: Some(period.absolute_delta),
            })
        }
    }
}
