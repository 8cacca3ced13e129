//! メールリライト用プロンプトテンプレート

use crate::domain::types::RewrittenEmail;

const ROLE: &str = "You are a professional email rewriter, expert in crafting clear, effective emails for various audiences.";

const OBJECTIVE: &str = "\
**Objective**: Rewrite the email to fulfill the user's instructions, preserving all key facts, dates, and requests from the original. \
Improve clarity, grammar, and structure. \
If subject, recipient, or sender are not explicit in the inputs, infer or generate suitable ones based on the content and reason. \
If information seems outdated or unavailable, avoid speculating and note in the caution field \
(e.g., 'Based on available information as of current date, the [placeholder] have not been filled'). \
If anything in the email is unsure or made up by you, which you have to remind user, you must note in the caution field.";

const STYLE: &str = "\
**Style**: Keep it concise, professional, and error-free. Use standard email formatting (e.g., greeting, body paragraphs, closing).

**Tone**: Default to polite and formal; adjust based on audience (e.g., warmer for colleagues, neutral for clients, \
respectful for academic professionals) or user instructions.

**Audience**: Infer from the reason or instructions (e.g., business, personal). Assume professional if unclear. \
Use inclusive, culturally neutral language.";

/// 出力スキーマ各キーの説明（RewrittenEmail::FIELDS と同順）
const FIELD_HINTS: [&str; 5] = [
    "Email subject",
    "Recipient name or email",
    "Sender name or email",
    "Full email body including greeting and sign-off",
    "Any caution or reminder about the email that user should know",
];

/// 出力契約: RewrittenEmail の 5 キーだけを持つ JSON
pub fn response_contract() -> String {
    let fields = RewrittenEmail::FIELDS
        .iter()
        .zip(FIELD_HINTS)
        .map(|(key, hint)| format!("    \"{key}\": \"{hint}\""))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "**Response**: Respond with ONLY valid JSON matching this schema, no extra text:\n{{\n{fields}\n}}\n"
    )
}

/// 本文・理由・（日付付加済みの）指示から単一のプロンプトを構築する
pub fn build_prompt(email_text: &str, reason: &str, instruction: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(ROLE);
    prompt.push_str("\n\n**Context**: You are given:\n");
    prompt.push_str("- Original email text: \n");
    prompt.push_str(email_text);
    prompt.push_str("\n- Brief reason for the email: \n");
    prompt.push_str(reason);
    prompt.push_str("\n- User instructions: \n");
    prompt.push_str(instruction);
    prompt.push_str("\n\n");

    prompt.push_str(OBJECTIVE);
    prompt.push_str("\n\n");
    prompt.push_str(STYLE);
    prompt.push_str("\n\n");
    prompt.push_str(&response_contract());

    prompt
}
