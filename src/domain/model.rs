use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// 範本中的商品名稱替換點
pub const PRODUCT_NAME_PLACEHOLDER: &str = "{productName}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "JPY")]
    Jpy,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Jpy => "JPY",
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 行情來源。宣告順序即輸出順序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Mercari,
    Zenplus,
    Ebay,
}

impl Marketplace {
    pub const ALL: [Marketplace; 3] = [Marketplace::Mercari, Marketplace::Zenplus, Marketplace::Ebay];

    pub fn key(&self) -> &'static str {
        match self {
            Marketplace::Mercari => "mercari",
            Marketplace::Zenplus => "zenplus",
            Marketplace::Ebay => "ebay",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Marketplace::Mercari => "メルカリ",
            Marketplace::Zenplus => "ZenPlus",
            Marketplace::Ebay => "eBay",
        }
    }

    pub fn currency(&self) -> Currency {
        match self {
            Marketplace::Mercari | Marketplace::Zenplus => Currency::Jpy,
            Marketplace::Ebay => Currency::Usd,
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub amount: f64,
    pub currency: Currency,
}

/// 單一來源對單一查詢觀察到的價格，順序無意義、允許重複
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSample {
    observations: Vec<PriceObservation>,
}

impl PriceSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只保留有限且大於零的金額
    pub fn from_amounts<I>(currency: Currency, amounts: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let observations = amounts
            .into_iter()
            .filter(|amount| amount.is_finite() && *amount > 0.0)
            .map(|amount| PriceObservation { amount, currency })
            .collect();
        Self { observations }
    }

    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn amounts(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.amount)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// 整數值輸出為 JSON 整數（例如 1000 而非 1000.0）
fn serialize_amount<S>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    #[serde(serialize_with = "serialize_amount")]
    pub min: f64,
    #[serde(serialize_with = "serialize_amount")]
    pub max: f64,
    #[serde(serialize_with = "serialize_amount")]
    pub avg: f64,
    pub count: usize,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl MarketSummary {
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// 沒有 note 代表數值來自實際觀察
    pub fn is_observed(&self) -> bool {
        self.note.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    #[serde(rename = "productName")]
    pub product_name: String,
    #[serde(flatten)]
    pub summaries: BTreeMap<Marketplace, MarketSummary>,
}

impl AggregateResult {
    pub fn summary(&self, marketplace: Marketplace) -> Option<&MarketSummary> {
        self.summaries.get(&marketplace)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingExample {
    pub title: String,
    pub description: String,
}

impl ListingExample {
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() || !self.description.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedListing {
    pub url: String,
    #[serde(flatten)]
    pub example: ListingExample,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingTemplate {
    #[serde(rename = "title")]
    pub title_pattern: String,
    #[serde(rename = "description")]
    pub description_pattern: String,
}

impl ListingTemplate {
    /// 以實際商品名稱填入範本
    pub fn render(&self, product_name: &str) -> ListingExample {
        ListingExample {
            title: self.title_pattern.replace(PRODUCT_NAME_PLACEHOLDER, product_name),
            description: self
                .description_pattern
                .replace(PRODUCT_NAME_PLACEHOLDER, product_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeResponse {
    pub results: Vec<ScrapedListing>,
    pub template: ListingTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdentification {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ProductIdentification {
    /// 商品名稱優先，其次第一個關鍵字
    pub fn search_query(&self) -> String {
        let name = self.product_name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        self.keywords
            .iter()
            .map(|k| k.trim())
            .find(|k| !k.is_empty())
            .unwrap_or("商品")
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appraisal {
    pub identification: ProductIdentification,
    pub market: AggregateResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub id: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_keeps_only_positive_amounts() {
        let sample = PriceSample::from_amounts(Currency::Jpy, [1200.0, 0.0, -5.0, f64::NAN, 800.0]);
        assert_eq!(sample.len(), 2);
        assert!(sample.observations().iter().all(|o| o.currency == Currency::Jpy));
    }

    #[test]
    fn test_summary_serializes_whole_numbers_as_integers() {
        let summary = MarketSummary {
            min: 500.0,
            max: 2000.0,
            avg: 12.35,
            count: 3,
            currency: Currency::Usd,
            note: None,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"{"min":500,"max":2000,"avg":12.35,"count":3,"currency":"USD"}"#);
    }

    #[test]
    fn test_aggregate_result_wire_shape() {
        let mut summaries = BTreeMap::new();
        for marketplace in Marketplace::ALL {
            summaries.insert(
                marketplace,
                MarketSummary {
                    min: 1.0,
                    max: 1.0,
                    avg: 1.0,
                    count: 1,
                    currency: marketplace.currency(),
                    note: None,
                },
            );
        }
        let result = AggregateResult {
            product_name: "ポケモン ぬいぐるみ".to_string(),
            summaries,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["productName"], "ポケモン ぬいぐるみ");
        assert_eq!(value["mercari"]["currency"], "JPY");
        assert_eq!(value["zenplus"]["count"], 1);
        assert_eq!(value["ebay"]["currency"], "USD");
        assert!(value["ebay"].get("note").is_none());
    }

    #[test]
    fn test_search_query_falls_back_to_keyword() {
        let identification = ProductIdentification {
            product_name: "  ".to_string(),
            category: "グッズ".to_string(),
            brand: "不明".to_string(),
            keywords: vec!["".to_string(), "pikachu".to_string()],
        };
        assert_eq!(identification.search_query(), "pikachu");

        let empty = ProductIdentification {
            product_name: String::new(),
            category: String::new(),
            brand: String::new(),
            keywords: vec![],
        };
        assert_eq!(empty.search_query(), "商品");
    }

    #[test]
    fn test_template_render() {
        let template = ListingTemplate {
            title_pattern: "【美品】{productName}".to_string(),
            description_pattern: "{productName}です。\n即購入OKです！".to_string(),
        };
        let rendered = template.render("ピカチュウ");
        assert_eq!(rendered.title, "【美品】ピカチュウ");
        assert!(rendered.description.starts_with("ピカチュウです。"));
    }
}
