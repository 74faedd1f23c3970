use crate::domain::model::{ListingExample, ListingTemplate, PRODUCT_NAME_PLACEHOLDER};
use regex::Regex;

const DEFAULT_TITLE_PREFIX: &str = "【美品】";

const BOILERPLATE_BODY: &str = "\n\n【商品の状態】
目立った傷や汚れはありません。
写真でご確認ください。

【発送について】
24時間以内に発送いたします。
丁寧な梱包を心がけます。

【注意事項】
自宅保管品のため、神経質な方はご遠慮ください。
即購入OKです！

よろしくお願いいたします。";

fn opening_line() -> String {
    format!("{}です。", PRODUCT_NAME_PLACEHOLDER)
}

pub fn default_title_pattern() -> String {
    format!("{}{}", DEFAULT_TITLE_PREFIX, PRODUCT_NAME_PLACEHOLDER)
}

pub fn default_description_pattern() -> String {
    format!("{}{}", opening_line(), BOILERPLATE_BODY)
}

/// 從參考刊登學出標題與說明樣式。只有第一個可用的例子會影響結果。
pub fn synthesize(examples: &[ListingExample]) -> ListingTemplate {
    let title_pattern = examples
        .iter()
        .map(|e| e.title.trim())
        .find(|t| !t.is_empty())
        .map(title_pattern_from)
        .unwrap_or_else(default_title_pattern);

    let description_pattern = examples
        .iter()
        .map(|e| e.description.as_str())
        .find(|d| !d.trim().is_empty())
        .and_then(description_pattern_from)
        .unwrap_or_else(default_description_pattern);

    ListingTemplate {
        title_pattern,
        description_pattern,
    }
}

fn title_pattern_from(title: &str) -> String {
    let prefix = Regex::new(r"【[^】]+】")
        .ok()
        .and_then(|re| re.find(title).map(|m| m.as_str().to_string()))
        .unwrap_or_else(|| DEFAULT_TITLE_PREFIX.to_string());
    format!("{}{}", prefix, PRODUCT_NAME_PLACEHOLDER)
}

/// 第一行換成開場白，其餘行與原本的換行字元（含 \r\n）原樣保留
fn description_pattern_from(description: &str) -> Option<String> {
    let mut segments = description.split_inclusive('\n');
    let first = segments.next()?;
    let line_break = &first[first.trim_end_matches(['\r', '\n']).len()..];

    let mut pattern = opening_line();
    pattern.push_str(line_break);
    pattern.extend(segments);
    Some(pattern)
}
