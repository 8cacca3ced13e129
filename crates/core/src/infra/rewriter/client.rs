use std::sync::Arc;

use serde_json::Value;

use super::{parser, CompletionBackend, ProviderError};
use crate::domain::types::{CompletionConfig, RewriteOutcome};

/// 1 リクエストあたりの最大試行回数（初回 + 4 回のリトライ）
pub const MAX_ATTEMPTS: u32 = 5;

/// 1 試行の結果
enum Attempt {
    Success(Value),
    Failure {
        error: ProviderError,
        raw_text: Option<String>,
    },
}

/// 補完呼び出し + JSON 解析をリトライ付きで実行するクライアント。
/// すべての失敗を同じ扱いで即時リトライする（待機なし）。
pub struct CompletionClient {
    backend: Arc<dyn CompletionBackend>,
    max_attempts: u32,
}

impl CompletionClient {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// 試行回数を絞る（上限は MAX_ATTEMPTS）
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.clamp(1, MAX_ATTEMPTS);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    async fn attempt(&self, prompt: &str, config: &CompletionConfig) -> Attempt {
        let raw = match self.backend.complete(prompt, config).await {
            Ok(raw) => raw,
            Err(error) => {
                return Attempt::Failure {
                    error,
                    raw_text: None,
                }
            }
        };

        match parser::parse_reply(&raw) {
            Ok(value) => Attempt::Success(value),
            Err(error) => Attempt::Failure {
                error,
                raw_text: Some(raw),
            },
        }
    }

    /// 成功した解析結果か、最後の診断と応答を持つ失敗結果のどちらかを必ず返す
    pub async fn complete_json(&self, prompt: &str, config: &CompletionConfig) -> RewriteOutcome {
        let mut last_raw: Option<String> = None;
        let mut last_diagnostic = String::new();

        for attempt in 1..=self.max_attempts {
            match self.attempt(prompt, config).await {
                Attempt::Success(value) => {
                    log::debug!(
                        "{} succeeded on attempt {attempt}/{}",
                        self.backend.name(),
                        self.max_attempts
                    );
                    return RewriteOutcome::Success(value);
                }
                Attempt::Failure { error, raw_text } => {
                    last_diagnostic = error.diagnostic();
                    if raw_text.is_some() {
                        last_raw = raw_text;
                    }
                    log::warn!(
                        "Attempt {attempt}/{} failed: API call or JSON parse failed: {last_diagnostic}",
                        self.max_attempts
                    );
                }
            }
        }

        RewriteOutcome::Failure {
            error: format!("API call or JSON parse failed: {last_diagnostic}"),
            raw_response: last_raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::rewriter::{ScriptedBackend, ScriptedReply};

    fn config() -> CompletionConfig {
        CompletionConfig {
            model: "m".into(),
            api_key: "k".into(),
            base_url: "http://localhost".into(),
        }
    }

    fn text(s: &str) -> ScriptedReply {
        ScriptedReply::Text(s.to_string())
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let backend = Arc::new(ScriptedBackend::always("```json\n{\"subject\":\"Hi\"}\n```"));
        let client = CompletionClient::new(backend.clone());

        let outcome = client.complete_json("p", &config()).await;
        assert_eq!(outcome, RewriteOutcome::Success(serde_json::json!({"subject": "Hi"})));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_success_on_attempt_k() {
        for k in 1..=MAX_ATTEMPTS as usize {
            let mut script = vec![text("not json"); k - 1];
            script.push(text("{\"body\":\"ok\"}"));
            let backend = Arc::new(ScriptedBackend::new(script));
            let client = CompletionClient::new(backend.clone());

            let outcome = client.complete_json("p", &config()).await;
            assert!(outcome.is_success(), "k = {k}");
            assert_eq!(backend.calls(), k);
        }
    }

    #[tokio::test]
    async fn test_exhausted_malformed_keeps_last_raw() {
        let backend = Arc::new(ScriptedBackend::new([
            text("garbage 1"),
            text("garbage 2"),
            text("garbage 3"),
            text("garbage 4"),
            text("garbage 5"),
            text("{\"never\":\"reached\"}"),
        ]));
        let client = CompletionClient::new(backend.clone());

        let outcome = client.complete_json("p", &config()).await;
        assert_eq!(backend.calls(), 5);
        match outcome {
            RewriteOutcome::Failure {
                error,
                raw_response,
            } => {
                assert!(error.starts_with("API call or JSON parse failed: MalformedJson: "));
                assert_eq!(raw_response.as_deref(), Some("garbage 5"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_transport_has_no_raw() {
        let backend = Arc::new(ScriptedBackend::new([ScriptedReply::Fail(
            "dns error".into(),
        )]));
        let client = CompletionClient::new(backend.clone());

        let outcome = client.complete_json("p", &config()).await;
        assert_eq!(backend.calls(), 5);
        assert_eq!(
            outcome,
            RewriteOutcome::Failure {
                error: "API call or JSON parse failed: Transport: HTTP request failed: dns error"
                    .into(),
                raw_response: None,
            }
        );
    }

    #[tokio::test]
    async fn test_raw_survives_later_transport_failure() {
        let backend = Arc::new(ScriptedBackend::new([
            text("half {"),
            ScriptedReply::Fail("reset".into()),
        ]));
        let client = CompletionClient::new(backend.clone()).with_max_attempts(3);

        let outcome = client.complete_json("p", &config()).await;
        assert_eq!(backend.calls(), 3);
        match outcome {
            RewriteOutcome::Failure {
                error,
                raw_response,
            } => {
                assert!(error.contains("Transport"));
                assert_eq!(raw_response.as_deref(), Some("half {"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_max_attempts_is_capped() {
        let backend = Arc::new(ScriptedBackend::always("{}"));
        assert_eq!(CompletionClient::new(backend.clone()).max_attempts(), 5);
        assert_eq!(
            CompletionClient::new(backend.clone())
                .with_max_attempts(50)
                .max_attempts(),
            5
        );
        assert_eq!(
            CompletionClient::new(backend).with_max_attempts(0).max_attempts(),
            1
        );
    }
}
