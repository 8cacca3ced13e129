use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionBackend, ProviderError};
use crate::domain::types::CompletionConfig;

/// 台本の 1 手
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// プロバイダがこのテキストを返す
    Text(String),
    /// 呼び出し自体が失敗する
    Fail(String),
}

/// ScriptedBackend: 事前に積んだ応答を順に返すモック実装。
/// 台本が尽きたら最後の手を繰り返す。呼び出し回数と最後のプロンプトを記録する。
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<ScriptedReply>>,
    last: Mutex<Option<ScriptedReply>>,
    last_prompt: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(None),
            last_prompt: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// 常に同じテキストを返す
    pub fn always(text: impl Into<String>) -> Self {
        Self::new([ScriptedReply::Text(text.into())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        let mut replies = self.replies.lock().unwrap_or_else(|poison| poison.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|poison| poison.into_inner());
        if let Some(reply) = replies.pop_front() {
            *last = Some(reply);
        }
        last.clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        prompt: &str,
        _config: &CompletionConfig,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_prompt
            .lock()
            .unwrap_or_else(|poison| poison.into_inner()) = Some(prompt.to_string());

        match self.next_reply() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(msg)) => Err(ProviderError::Transport(msg)),
            None => Err(ProviderError::EmptyReply),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
