use serde_json::Value;

use super::ProviderError;

/// モデル応答の前後にあるコードフェンスと空白を取り除く
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // ```json のタグは大文字小文字を問わない
        text = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// 応答テキストを JSON として解析する。スキーマ検証は行わない。
pub fn parse_reply(raw: &str) -> Result<Value, ProviderError> {
    serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| ProviderError::MalformedJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::RewrittenEmail;

    #[test]
    fn test_strip_plain() {
        assert_eq!(strip_code_fences("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_json_fence() {
        let raw = "```json\n{\"subject\": \"Hi\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"subject\": \"Hi\"}");
    }

    #[test]
    fn test_strip_untagged_and_uppercase_fence() {
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("```JSON\n[1]\n```"), "[1]");
    }

    #[test]
    fn test_strip_keeps_inner_backticks() {
        let raw = "```json\n{\"body\": \"run `make`\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"body\": \"run `make`\"}");
    }

    #[test]
    fn test_parse_fenced_reply() {
        let raw = "```json\n{\"subject\": \"Meeting\", \"caution\": \"\"}\n```";
        let value = parse_reply(raw).unwrap();
        assert_eq!(value["subject"], "Meeting");
    }

    #[test]
    fn test_parse_partial_object_is_accepted() {
        let value = parse_reply("{\"subject\": \"only\"}").unwrap();
        assert_eq!(value, serde_json::json!({"subject": "only"}));
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_reply("Sure! Here is your email:").unwrap_err();
        assert_eq!(err.kind(), "MalformedJson");
    }

    #[test]
    fn test_roundtrip_rewritten_email() {
        let email = RewrittenEmail {
            subject: "Request: project meeting tomorrow afternoon".into(),
            recipient: "Professor".into(),
            sender: "Marco Ho".into(),
            body: "Dear Professor,\n\nCould we meet tomorrow afternoon?\n\nBest regards,\nMarco".into(),
            caution: "Meeting time was inferred.".into(),
        };
        let raw = serde_json::to_string_pretty(&email).unwrap();
        let value = parse_reply(&raw).unwrap();
        let back: RewrittenEmail = serde_json::from_value(value).unwrap();
        assert_eq!(back, email);
    }
}
