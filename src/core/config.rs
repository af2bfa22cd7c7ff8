use std::env;

pub const DEFAULT_DEDUP_TTL_SECS: u64 = 3600;
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub processing_queue_url: String,
    pub slack_signing_secret: String,
    pub dedup_table_name: String,
    pub dedup_ttl_secs: u64,
    pub personal_bot_token: String,
    pub personal_channel_ids: Vec<String>,
    pub business_bot_token: Option<String>,
    pub business_channel_ids: Vec<String>,
    pub business_enabled: bool,
    pub openai_api_key: String,
    pub openai_model: Option<String>,
    pub document_parse_url: Option<String>,
    pub document_parse_api_key: Option<String>,
    pub run_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            processing_queue_url: env::var("PROCESSING_QUEUE_URL")
                .map_err(|e| format!("PROCESSING_QUEUE_URL: {}", e))?,
            slack_signing_secret: env::var("SLACK_SIGNING_SECRET")
                .map_err(|e| format!("SLACK_SIGNING_SECRET: {}", e))?,
            dedup_table_name: env::var("DEDUP_TABLE_NAME")
                .map_err(|e| format!("DEDUP_TABLE_NAME: {}", e))?,
            dedup_ttl_secs: parse_secs("EVENT_DEDUPLICATION_TTL_SEC", DEFAULT_DEDUP_TTL_SECS),
            personal_bot_token: env::var("SLACK_PERSONAL_TOKEN")
                .map_err(|e| format!("SLACK_PERSONAL_TOKEN: {}", e))?,
            personal_channel_ids: parse_channel_list(
                &env::var("SLACK_PERSONAL_CHANNEL_IDS").unwrap_or_default(),
            ),
            business_bot_token: env::var("SLACK_BUSINESS_TOKEN").ok(),
            business_channel_ids: parse_channel_list(
                &env::var("SLACK_BUSINESS_CHANNEL_IDS").unwrap_or_default(),
            ),
            business_enabled: env::var("ENABLE_BUSINESS_CHANNELS")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(false),
            openai_api_key: env::var("OPENAI_API_KEY")
                .map_err(|e| format!("OPENAI_API_KEY: {}", e))?,
            openai_model: env::var("OPENAI_MODEL").ok(),
            document_parse_url: env::var("DOCUMENT_PARSE_URL").ok(),
            document_parse_api_key: env::var("DOCUMENT_PARSE_API_KEY").ok(),
            run_timeout_secs: parse_secs("RUN_TIMEOUT_SEC", DEFAULT_RUN_TIMEOUT_SECS),
        })
    }
}

fn parse_secs(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// Channel lists are configured as comma-separated IDs, e.g. `"C111,C222"`.
#[must_use]
pub fn parse_channel_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
