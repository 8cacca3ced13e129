use serde::{Deserialize, Serialize};

/// リライト要求（HTTP ボディから組み立てる）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRequest {
    pub email_text: String,
    pub reason: String,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// モデルに要求する出力スキーマ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewrittenEmail {
    pub subject: String,
    pub recipient: String,
    pub sender: String,
    pub body: String,
    pub caution: String,
}

impl RewrittenEmail {
    /// スキーマのキー一覧（プロンプトの出力契約と同順）
    pub const FIELDS: [&'static str; 5] = ["subject", "recipient", "sender", "body", "caution"];
}

/// パイプラインの最終結果。成功時はモデルの JSON をそのまま返す。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RewriteOutcome {
    Success(serde_json::Value),
    Failure {
        error: String,
        raw_response: Option<String>,
    },
}

impl RewriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RewriteOutcome::Success(_))
    }

    /// 成功ペイロードを型付きで取り出す（キー欠落時は None）
    pub fn email(&self) -> Option<RewrittenEmail> {
        match self {
            RewriteOutcome::Success(value) => serde_json::from_value(value.clone()).ok(),
            RewriteOutcome::Failure { .. } => None,
        }
    }
}

/// 1 リクエスト分のプロバイダ設定（リクエストごとに生成）
#[derive(Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
}

// api_key はログに出さない
impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
