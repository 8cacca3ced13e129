use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// 日付・時刻表現の検出パターン（大文字小文字を区別しない）。
/// 1〜2 桁の数字単体にもマッチするため、住所の番地などでも検出される。
const TIME_PATTERN_STR: &str = concat!(
    r"(?i)\b(",
    r"today|tomorrow|next week|this year|yesterday|",
    r"\d{1,2}/\d{1,2}/\d{2,4}|",
    r"\d{4}-\d{1,2}-\d{1,2}|",
    r"january|february|march|april|may|june|july|august|september|october|november|december|",
    r"jan|feb|mar|apr|jun|jul|aug|sep|sept|oct|nov|dec|",
    r"\b\d{4}\b|",
    r"\b\d{1,2}(st|nd|rd|th)?\b",
    r")\b",
);

static TIME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn time_pattern() -> &'static Regex {
    TIME_PATTERN.get_or_init(|| Regex::new(TIME_PATTERN_STR).expect("time pattern is valid"))
}

/// 時間参照の検出と指示文への現在日付の付加
pub struct TimeReferenceDetector;

impl TimeReferenceDetector {
    /// 本文・理由・指示を区切りなしで連結したテキストに時間参照が含まれるか
    pub fn detect(email_text: &str, reason: &str, instruction: &str) -> bool {
        let haystack = [email_text, reason, instruction].concat();
        time_pattern().is_match(&haystack)
    }

    /// 時間参照があれば指示文のコピーに日付照合の一文を追記して返す
    pub fn augment(email_text: &str, reason: &str, instruction: &str, today: NaiveDate) -> String {
        let mut augmented = instruction.to_string();
        if Self::detect(email_text, reason, instruction) {
            augmented.push_str(&Self::date_clause(today));
        }
        augmented
    }

    pub fn date_clause(today: NaiveDate) -> String {
        format!(
            "\n- Ensure all temporal references align with the current date: {}, \
             and carefully identify if the event in content happened before or after current time.",
            today.format("%Y-%m-%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()
    }

    #[test]
    fn test_detect_keywords() {
        assert!(TimeReferenceDetector::detect("Can we meet tomorrow?", "", ""));
        assert!(TimeReferenceDetector::detect("", "due NEXT WEEK", ""));
        assert!(TimeReferenceDetector::detect("", "", "mention it was yesterday"));
        assert!(TimeReferenceDetector::detect("Plans for this year", "", ""));
    }

    #[test]
    fn test_detect_dates() {
        assert!(TimeReferenceDetector::detect("deadline 2024-03-15", "", ""));
        assert!(TimeReferenceDetector::detect("on 3/15/24 at noon", "", ""));
        assert!(TimeReferenceDetector::detect("see you in Sept", "", ""));
        assert!(TimeReferenceDetector::detect("back in 2019", "", ""));
        assert!(TimeReferenceDetector::detect("on the 21st", "", ""));
    }

    #[test]
    fn test_detect_bare_small_number() {
        // 番地の "2" でも検出される
        assert!(TimeReferenceDetector::detect("I live at 2 Elm Road", "", ""));
    }

    #[test]
    fn test_no_time_refs() {
        assert!(!TimeReferenceDetector::detect(
            "Let's catch up soon",
            "friendly note",
            "make it warmer"
        ));
        // 単語の一部にはマッチしない
        assert!(!TimeReferenceDetector::detect("Jane is decent", "", "Marcus"));
    }

    #[test]
    fn test_fields_are_scanned_as_one_text() {
        // 区切りなしで連結するため、項目の境界をまたいだ語も検出される
        assert!(TimeReferenceDetector::detect("see you to", "day trip", "be brief"));
        assert!(!TimeReferenceDetector::detect("see you", "later", "be brief"));
    }

    #[test]
    fn test_augment_appends_date() {
        let out = TimeReferenceDetector::augment("deadline 2024-03-15", "reminder", "be polite", day());
        assert!(out.starts_with("be polite\n- Ensure all temporal references"));
        assert!(out.contains("2025-01-09"));
    }

    #[test]
    fn test_augment_passthrough() {
        let out = TimeReferenceDetector::augment("Let's catch up soon", "friendly note", "be polite", day());
        assert_eq!(out, "be polite");
    }
}
