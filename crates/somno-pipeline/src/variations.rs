//! AI-generated image prompt variations.
//!
//! Each run asks Gemini for two short phrases (background, thumbnail) so
//! consecutive uploads do not reuse identical imagery. The step is soft:
//! any failure falls back to fixed default phrases.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use somno_models::{Mood, Season};

use crate::error::{PipelineError, PipelineResult};

/// Default Gemini API host.
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key; `None` disables the call entirely.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

impl GeminiConfig {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Override the API base URL (tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

/// The two variation phrases for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variations {
    pub background: String,
    pub thumbnail: String,
}

impl Default for Variations {
    fn default() -> Self {
        Self {
            background: "星空の夜、starry night".to_string(),
            thumbnail: "美しい夜空、beautiful night sky".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Client for the variation prompt.
pub struct VariationClient {
    http: Client,
    config: GeminiConfig,
}

impl VariationClient {
    /// Create a new variation client.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Generate the run's variation phrases, falling back to defaults on
    /// any failure.
    pub async fn generate(&self, season: &Season, mood: &Mood) -> Variations {
        let Some(api_key) = self.config.api_key.clone() else {
            debug!("No Gemini API key configured, using default variations");
            return Variations::default();
        };

        match self.request(&api_key, season, mood).await {
            Ok(variations) => variations,
            Err(e) => {
                warn!("Gemini variation request failed, using defaults: {}", e);
                Variations::default()
            }
        }
    }

    async fn request(
        &self,
        api_key: &str,
        season: &Season,
        mood: &Mood,
    ) -> PipelineResult<Variations> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.api_base, self.config.model, api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(season, mood),
                }],
            }],
        };

        let response = self.http.post(&url).json(&request).send().await.map_err(|e| {
            PipelineError::variation_failed(format!("Gemini request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::variation_failed(format!(
                "Gemini returned {status}: {body}"
            )));
        }

        let gemini: GeminiResponse = response.json().await.map_err(|e| {
            PipelineError::variation_failed(format!("Unparseable Gemini response: {e}"))
        })?;

        let text = gemini
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| PipelineError::variation_failed("No content in Gemini response"))?;

        parse_variation_lines(text)
            .ok_or_else(|| PipelineError::variation_failed("Unexpected Gemini response format"))
    }
}

/// Prompt asking for two variation phrases, one per line.
fn build_prompt(season: &Season, mood: &Mood) -> String {
    format!(
        "あなたは睡眠用BGM動画の画像プロンプト生成AIです。\n\n\
         季節: {season_jp} / {season_en}\n\
         ムード: {mood_jp} / {mood_en}\n\n\
         上記の季節とムードに合った、星空をベースにした睡眠導入用の画像バリエーション要素を2つ生成してください。\n\n\
         要件:\n\
         - 各バリエーションは日本語と英語を含む短いフレーズ（10-15単語程度）\n\
         - 星空の風景に追加する具体的な視覚要素を記述（例: 流れ星、霧、山、湖など）\n\
         - 2つのバリエーションは互いに異なる要素を含むこと\n\
         - 睡眠導入に適した静かで落ち着いた雰囲気\n\
         - 季節感を反映した要素を含める\n\n\
         出力形式（この2行のみ、説明なし）:\n\
         バリエーション1の日本語、バリエーション1の英語\n\
         バリエーション2の日本語、バリエーション2の英語",
        season_jp = season.jp,
        season_en = season.en,
        mood_jp = mood.jp,
        mood_en = mood.en,
    )
}

/// Pull the two variation phrases out of the model's response text.
fn parse_variation_lines(text: &str) -> Option<Variations> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let background = lines.next()?.to_string();
    let thumbnail = lines.next()?.to_string();
    Some(Variations {
        background,
        thumbnail,
    })
}
