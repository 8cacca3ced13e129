use std::time::Duration;

use super::error::AppError;
use super::types::{CompletionConfig, RewriteRequest};

pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// サービス設定（起動時に環境変数から読み込む）
#[derive(Clone)]
pub struct ServiceSettings {
    /// プロバイダ API キーの既定値（OPENROUTER_API_KEY）
    pub api_key: Option<String>,
    /// 既定モデル
    pub default_model: String,
    /// 既定のプロバイダ base URL
    pub default_base_url: String,
    pub host: String,
    pub port: u16,
    /// 1 試行あたりの HTTP タイムアウト（秒）。None なら期限なし
    pub attempt_timeout_secs: Option<u64>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: DEFAULT_MODEL.to_string(),
            default_base_url: DEFAULT_BASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            attempt_timeout_secs: None,
        }
    }
}

impl std::fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("default_model", &self.default_model)
            .field("default_base_url", &self.default_base_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("attempt_timeout_secs", &self.attempt_timeout_secs)
            .finish()
    }
}

impl ServiceSettings {
    /// `.env` を読み込んだうえでプロセス環境から設定を組み立てる
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!(".env not loaded: {e}");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を組み立てる
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                log::warn!("invalid PORT {raw:?}, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let attempt_timeout_secs = get("ATTEMPT_TIMEOUT_SECS").and_then(|raw| {
            match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(secs),
                Err(_) => {
                    log::warn!("invalid ATTEMPT_TIMEOUT_SECS {raw:?}, ignoring");
                    None
                }
            }
        });

        Self {
            api_key: get("OPENROUTER_API_KEY"),
            default_model: get("DEFAULT_MODEL").unwrap_or(defaults.default_model),
            default_base_url: get("DEFAULT_BASE_URL").unwrap_or(defaults.default_base_url),
            host: get("HOST").unwrap_or(defaults.host),
            port,
            attempt_timeout_secs,
        }
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_secs.map(Duration::from_secs)
    }

    /// リクエストの上書き値と既定値から CompletionConfig を解決する
    pub fn completion_config(&self, req: &RewriteRequest) -> Result<CompletionConfig, AppError> {
        let api_key = non_empty(req.api_key.clone())
            .or_else(|| self.api_key.clone())
            .ok_or_else(|| {
                AppError::config("No API key provided and OPENROUTER_API_KEY is not set")
            })?;

        Ok(CompletionConfig {
            model: non_empty(req.model.clone()).unwrap_or_else(|| self.default_model.clone()),
            api_key,
            base_url: non_empty(req.base_url.clone())
                .unwrap_or_else(|| self.default_base_url.clone()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
