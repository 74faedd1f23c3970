use crate::domain::model::{Currency, MarketSummary, PriceSample};

/// 四捨五入到小數點後兩位
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 將價格樣本化約為統計摘要；空樣本回傳 None，由 fallback 套用預設值。
///
/// USD 的 min/max/avg 取到小數兩位，JPY 的 avg 取最接近的整數。
pub fn reduce(sample: &PriceSample, currency: Currency) -> Option<MarketSummary> {
    if sample.is_empty() {
        return None;
    }

    let count = sample.len();
    let (min, max, sum) = sample.amounts().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), amount| (min.min(amount), max.max(amount), sum + amount),
    );
    let mean = sum / count as f64;

    let (min, max, avg) = match currency {
        Currency::Usd => (round_cents(min), round_cents(max), round_cents(mean)),
        Currency::Jpy => (min, max, mean.round()),
    };

    Some(MarketSummary {
        min,
        max,
        avg,
        count,
        currency,
        note: None,
    })
}
