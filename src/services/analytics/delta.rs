//! 环比差值计算

use crate::models::{DeltaRecord, PriceRecord};

/// 为按日期升序排列的价格序列计算环比差值
///
/// 输出与输入等长、同序；第一条记录的差值全部为 0。
/// 纯函数，不会对输入重新排序
pub fn compute_deltas(records: &[PriceRecord]) -> Vec<DeltaRecord> {
    let mut previous: Option<&PriceRecord> = None;

    records
        .iter()
        .map(|record| {
            let delta = match previous {
                Some(prev) => DeltaRecord::after(record.clone(), prev),
                None => DeltaRecord::first(record.clone()),
            };
            previous = Some(record);
            delta
        })
        .collect()
}
