use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::error::AppError;
use crate::domain::settings::ServiceSettings;
use crate::domain::types::{RewriteOutcome, RewriteRequest};
use crate::infra::rewriter::{prompts, CompletionBackend, CompletionClient};
use crate::infra::time_refs::TimeReferenceDetector;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: reason, email_text, instruction";

/// リライトサービス（HTTP 層から呼ばれる唯一の入口）
pub struct RewriteService {
    settings: ServiceSettings,
    client: CompletionClient,
}

impl RewriteService {
    pub fn new(settings: ServiceSettings, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            settings,
            client: CompletionClient::new(backend),
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// 必須 3 項目（本文・理由・指示）が空でないことを確認する
    pub fn validate(req: &RewriteRequest) -> Result<(), AppError> {
        let missing = [&req.reason, &req.email_text, &req.instruction]
            .iter()
            .any(|field| field.is_empty());
        if missing {
            return Err(AppError::validation(MISSING_FIELDS_MESSAGE));
        }
        Ok(())
    }

    /// 時間参照の検出 → 指示の補強 → プロンプト構築
    pub fn prepare_prompt(req: &RewriteRequest, today: NaiveDate) -> String {
        let instruction =
            TimeReferenceDetector::augment(&req.email_text, &req.reason, &req.instruction, today);
        prompts::build_prompt(&req.email_text, &req.reason, &instruction)
    }

    /// 検証・設定解決のエラーだけが Err になる。プロバイダ側の失敗は Failure として返す。
    pub async fn rewrite(&self, req: &RewriteRequest) -> Result<RewriteOutcome, AppError> {
        Self::validate(req)?;
        let config = self.settings.completion_config(req)?;

        let today = chrono::Local::now().date_naive();
        let prompt = Self::prepare_prompt(req, today);

        let outcome = self.client.complete_json(&prompt, &config).await;
        match &outcome {
            RewriteOutcome::Success(value) => {
                log::debug!("INPUT PROMPT:\n{prompt}\n\nOUTPUT PARSED RESULT:\n{value:#}");
            }
            RewriteOutcome::Failure { error, .. } => {
                log::error!("rewrite failed with model {}: {error}", config.model);
            }
        }

        Ok(outcome)
    }
}
