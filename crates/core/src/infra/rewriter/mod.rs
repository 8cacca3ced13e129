pub mod client;
pub mod openrouter;
pub mod parser;
pub mod prompts;
mod scripted;

pub use client::{CompletionClient, MAX_ATTEMPTS};
pub use openrouter::OpenRouterBackend;
pub use scripted::{ScriptedBackend, ScriptedReply};

use async_trait::async_trait;

use crate::domain::types::CompletionConfig;

/// プロバイダ呼び出し・応答解析のエラー
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Empty response from provider")]
    EmptyReply,
    #[error("{0}")]
    MalformedJson(String),
}

impl ProviderError {
    /// 診断文字列に載せるエラー種別名
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Transport(_) => "Transport",
            ProviderError::Timeout => "Timeout",
            ProviderError::Status { .. } => "Status",
            ProviderError::EmptyReply => "EmptyReply",
            ProviderError::MalformedJson(_) => "MalformedJson",
        }
    }

    pub fn diagnostic(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

/// 補完プロバイダ trait（1 回の往復だけを担当し、リトライは CompletionClient が行う）
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        config: &CompletionConfig,
    ) -> Result<String, ProviderError>;

    fn name(&self) -> &str;
}
