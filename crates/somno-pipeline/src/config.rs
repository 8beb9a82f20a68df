//! Pipeline configuration.
//!
//! All behavior-affecting parameters come from the environment, read once
//! at startup into an immutable [`Settings`] value that is passed by
//! reference to every component — nothing else reads ambient state. A
//! missing required setting is a fatal startup error naming the key.

use std::path::PathBuf;
use std::str::FromStr;

use somno_models::PrivacyStatus;

use crate::error::{PipelineError, PipelineResult};

/// Immutable pipeline settings.
#[derive(Debug, Clone)]
pub struct Settings {
    // Generation provider
    pub kieai_api_key: String,
    pub kieai_api_base: String,
    pub kieai_suno_endpoint: String,
    pub kieai_nanobanana_endpoint: String,
    pub kieai_nanobanana_model: String,
    pub suno_model: String,

    // Prompt variations
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    // YouTube / Drive
    pub youtube_client_id: String,
    pub youtube_client_secret: String,
    pub youtube_refresh_token: String,
    pub youtube_privacy: PrivacyStatus,
    pub google_refresh_token: Option<String>,
    pub drive_folder_id: Option<String>,

    // Reporting
    pub sheets_id: Option<String>,
    pub sheets_range: String,
    pub discord_webhook_url: Option<String>,
    pub gcp_service_account: Option<serde_json::Value>,

    // Pipeline behavior
    pub max_retries: u32,
    pub target_minutes: u32,
    pub target_variance_minutes: u32,
    pub lowpass_hz: u32,
    pub crossfade_seconds: u32,
    pub fadeout_seconds: u32,
    pub publish_hour: u32,
    pub templates_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Settings {
    /// Build settings from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        Ok(Self {
            kieai_api_key: require("KIEAI_API_KEY")?,
            kieai_api_base: optional("KIEAI_API_BASE")
                .unwrap_or_else(|| "https://api.kie.ai".to_string()),
            kieai_suno_endpoint: optional("KIEAI_SUNO_ENDPOINT")
                .unwrap_or_else(|| "/api/v1/generate".to_string()),
            kieai_nanobanana_endpoint: optional("KIEAI_NANOBANANA_ENDPOINT")
                .unwrap_or_else(|| "/api/v1/jobs/createTask".to_string()),
            kieai_nanobanana_model: optional("KIEAI_NANOBANANA_MODEL")
                .unwrap_or_else(|| "google/nano-banana".to_string()),
            suno_model: optional("SUNO_MODEL").unwrap_or_else(|| "V4".to_string()),

            gemini_api_key: optional("GEMINI_API_KEY"),
            gemini_model: optional("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),

            youtube_client_id: require("YOUTUBE_CLIENT_ID")?,
            youtube_client_secret: require("YOUTUBE_CLIENT_SECRET")?,
            youtube_refresh_token: require("YOUTUBE_REFRESH_TOKEN")?,
            youtube_privacy: parse_privacy(
                &optional("YOUTUBE_PRIVACY").unwrap_or_else(|| "public".to_string()),
            )?,
            google_refresh_token: optional("GOOGLE_REFRESH_TOKEN"),
            drive_folder_id: optional("DRIVE_FOLDER_ID"),

            sheets_id: optional("SHEETS_ID"),
            sheets_range: optional("SHEETS_RANGE").unwrap_or_else(|| "Sheet1!A2".to_string()),
            discord_webhook_url: optional("DISCORD_WEBHOOK_URL"),
            gcp_service_account: optional("GCP_SERVICE_ACCOUNT_JSON")
                .map(|raw| parse_json_setting("GCP_SERVICE_ACCOUNT_JSON", &raw))
                .transpose()?,

            max_retries: parse_or("MAX_RETRIES", 2)?,
            target_minutes: parse_or("TARGET_MINUTES", 90)?,
            target_variance_minutes: parse_or("TARGET_VARIANCE_MINUTES", 5)?,
            lowpass_hz: parse_or("LOWPASS_HZ", 4000)?,
            crossfade_seconds: parse_or("CROSSFADE_SECONDS", 12)?,
            fadeout_seconds: parse_or("FADEOUT_SECONDS", 5)?,
            publish_hour: parse_or("PUBLISH_HOUR", somno_models::PUBLISH_HOUR_JST)?,
            templates_path: PathBuf::from(
                optional("TEMPLATES_PATH").unwrap_or_else(|| "config/templates.json".to_string()),
            ),
            output_dir: PathBuf::from(optional("OUTPUT_DIR").unwrap_or_else(|| "output".to_string())),
        })
    }
}

/// Read a required setting; empty counts as missing.
fn require(name: &str) -> PipelineResult<String> {
    optional(name)
        .ok_or_else(|| PipelineError::config_error(format!("Missing required setting: {name}")))
}

/// Read an optional setting; empty counts as unset.
fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a setting with a default, failing loudly on garbage values.
fn parse_or<T: FromStr>(name: &str, default: T) -> PipelineResult<T> {
    match optional(name) {
        None => Ok(default),
        Some(raw) => parse_setting(name, &raw),
    }
}

fn parse_setting<T: FromStr>(name: &str, raw: &str) -> PipelineResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| PipelineError::config_error(format!("Invalid value for {name}: {raw:?}")))
}

fn parse_privacy(raw: &str) -> PipelineResult<PrivacyStatus> {
    PrivacyStatus::parse(raw).ok_or_else(|| {
        PipelineError::config_error(format!("Invalid value for YOUTUBE_PRIVACY: {raw:?}"))
    })
}

/// Parse a JSON-valued setting, previewing the head of the raw value in
/// the error so a truncated paste is recognizable.
fn parse_json_setting(name: &str, raw: &str) -> PipelineResult<serde_json::Value> {
    serde_json::from_str(raw).map_err(|e| {
        let preview: String = raw.chars().take(100).collect();
        let preview = if raw.chars().count() > 100 {
            format!("{preview}...")
        } else {
            preview
        };
        PipelineError::config_error(format!("Invalid JSON in {name} (preview: {preview}): {e}"))
    })
}
