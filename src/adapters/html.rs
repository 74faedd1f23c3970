use scraper::{ElementRef, Selector};

/// 解析 CSS 選擇器；固定字串解析失敗時記錄並回傳 None
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// 去除所有非數字字元後解析為整數價格（例如 "¥1,200" → 1200）
pub fn digits_to_price(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok().filter(|price| *price > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_to_price() {
        assert_eq!(digits_to_price("¥1,200"), Some(1200));
        assert_eq!(digits_to_price(" 3,980円（税込）"), Some(3980));
        assert_eq!(digits_to_price("SOLD"), None);
        assert_eq!(digits_to_price("¥0"), None);
        // 超過 u64 範圍的位數視為無法解析
        assert_eq!(digits_to_price("99999999999999999999999"), None);
    }
}
