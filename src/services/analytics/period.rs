//! 最短周期搜索
//!
//! 在带差值的价格序列中寻找累计绝对变动超过阈值、且日期跨度最短的区间

use rust_decimal::Decimal;

use crate::models::{DeltaRecord, IntervalCandidate, PriceField};

/// 累计绝对变动：到每条记录为止 `|delta|` 的累加和
pub fn cumulative_churn(records: &[DeltaRecord], field: PriceField) -> Vec<Decimal> {
    let mut sum = Decimal::ZERO;
    records
        .iter()
        .map(|record| {
            sum += record.delta(field).abs();
            sum
        })
        .collect()
}

/// 寻找累计绝对变动严格大于 `threshold` 的最短区间
///
/// 枚举所有 `i < j` 的记录对，跨度最小者胜出，跨度相同时取最先枚举到的一对。
/// 没有满足条件的区间时返回 `None`
pub fn find_min_period(
    records: &[DeltaRecord],
    field: PriceField,
    threshold: Decimal,
) -> Option<IntervalCandidate> {
    let churn = cumulative_churn(records, field);
    let mut best: Option<IntervalCandidate> = None;

    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            let absolute_delta = churn[j] - churn[i];
            if absolute_delta <= threshold {
                continue;
            }

            let start = &records[i].price;
            let end = &records[j].price;
            let span_in_days = (end.date - start.date).abs().num_days();

            if best.as_ref().map_or(true, |b| span_in_days < b.span_in_days) {
                best = Some(IntervalCandidate {
                    start_date: start.date,
                    end_date: end.date,
                    start_id: start.id,
                    end_id: end.id,
                    absolute_delta,
                    span_in_days,
                });
            }

            // 日期升序时，同一起点之后的 j 跨度只会更大
            break;
        }
    }

    best
}
