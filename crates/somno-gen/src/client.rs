//! Generation provider HTTP client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use somno_models::{GenerationTask, ProviderKind, TaskStatus};

use crate::error::{GenError, GenResult};

/// Callback URL required by the submission API; results are obtained by
/// polling, so it is never actually called back.
const UNUSED_CALLBACK_URL: &str = "http://localhost:8000/callback";

/// Configuration for the generation client.
#[derive(Debug, Clone)]
pub struct GenClientConfig {
    /// Bearer API key.
    pub api_key: String,
    /// API base URL.
    pub api_base: String,
    /// Music submission endpoint.
    pub audio_endpoint: String,
    /// Image submission endpoint.
    pub image_endpoint: String,
    /// Music status endpoint.
    pub audio_status_endpoint: String,
    /// Image status endpoint.
    pub image_status_endpoint: String,
    /// Fixed delay between status polls.
    pub poll_interval: Duration,
    /// Wall-clock budget for a single task.
    pub poll_budget: Duration,
}

impl GenClientConfig {
    /// Create a config with the provider's default endpoints.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: "https://api.kie.ai".to_string(),
            audio_endpoint: "/api/v1/generate".to_string(),
            image_endpoint: "/api/v1/jobs/createTask".to_string(),
            audio_status_endpoint: "/api/v1/generate/record-info".to_string(),
            image_status_endpoint: "/api/v1/jobs/recordInfo".to_string(),
            poll_interval: Duration::from_secs(10),
            poll_budget: Duration::from_secs(600),
        }
    }

    /// Override the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the polling wall-clock budget.
    pub fn with_poll_budget(mut self, budget: Duration) -> Self {
        self.poll_budget = budget;
        self
    }
}

/// A music generation request.
#[derive(Debug, Clone)]
pub struct AudioRequest {
    pub prompt: String,
    pub model: String,
    pub instrumental: bool,
}

/// An image generation request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
    pub seed: Option<i64>,
}

/// Client for the generation provider API.
pub struct GenClient {
    http: Client,
    config: GenClientConfig,
}

/// Submission envelope: `{code, data: {taskId}}`.
#[derive(Debug, Deserialize)]
struct SubmitEnvelope {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<SubmitData>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    #[serde(rename = "taskId")]
    task_id: Option<String>,
}

/// Status envelope; field names vary per provider.
#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<StatusData>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusData {
    /// Music provider status field.
    #[serde(default)]
    status: Option<String>,
    /// Image provider status field.
    #[serde(default)]
    state: Option<String>,
    /// Music provider result payload.
    #[serde(default)]
    response: Option<AudioResponse>,
    /// Image provider result payload: a JSON-encoded string.
    #[serde(rename = "resultJson", default)]
    result_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AudioResponse {
    #[serde(rename = "sunoData", default)]
    suno_data: Vec<SunoTrack>,
}

#[derive(Debug, Deserialize)]
struct SunoTrack {
    #[serde(rename = "audioUrl")]
    audio_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResult {
    #[serde(rename = "resultUrls", default)]
    result_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AudioPayload<'a> {
    prompt: &'a str,
    #[serde(rename = "customMode")]
    custom_mode: bool,
    instrumental: bool,
    model: &'a str,
    #[serde(rename = "callBackUrl")]
    callback_url: &'a str,
}

#[derive(Debug, Serialize)]
struct ImagePayload<'a> {
    model: &'a str,
    input: ImageInput<'a>,
}

#[derive(Debug, Serialize)]
struct ImageInput<'a> {
    prompt: &'a str,
    output_format: &'a str,
    image_size: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

impl GenClient {
    /// Create a new generation client.
    pub fn new(config: GenClientConfig) -> GenResult<Self> {
        let http = Client::builder().build().map_err(GenError::Network)?;
        Ok(Self { http, config })
    }

    /// Generate music and return the artifact URL.
    ///
    /// Submits the request, then polls until the task is terminal. Errors
    /// are not retried here — the caller's retry layer resubmits the whole
    /// operation.
    pub async fn generate_audio(&self, request: &AudioRequest) -> GenResult<String> {
        let payload = AudioPayload {
            prompt: &request.prompt,
            custom_mode: false,
            instrumental: request.instrumental,
            model: &request.model,
            callback_url: UNUSED_CALLBACK_URL,
        };
        let task_id = self
            .submit(&self.config.audio_endpoint, &serde_json::to_value(&payload)?)
            .await?;
        self.poll_until_terminal(ProviderKind::Audio, &task_id).await
    }

    /// Generate an image and return the artifact URL.
    pub async fn generate_image(&self, request: &ImageRequest) -> GenResult<String> {
        let payload = ImagePayload {
            model: &request.model,
            input: ImageInput {
                prompt: &request.prompt,
                output_format: "png",
                image_size: "16:9",
                seed: request.seed,
            },
        };
        let task_id = self
            .submit(&self.config.image_endpoint, &serde_json::to_value(&payload)?)
            .await?;
        self.poll_until_terminal(ProviderKind::Image, &task_id).await
    }

    /// Submit a generation request and return the provider's task id.
    async fn submit(&self, endpoint: &str, payload: &serde_json::Value) -> GenResult<String> {
        let url = self.endpoint_url(endpoint)?;
        debug!("Submitting generation request to {}", url);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(60))
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        let envelope: SubmitEnvelope = response
            .json()
            .await
            .map_err(|e| GenError::submission(format!("Unparseable submission response: {e}")))?;

        if envelope.code != 200 {
            return Err(GenError::submission(format!(
                "Provider returned code {}: {}",
                envelope.code,
                envelope.msg.unwrap_or_default()
            )));
        }

        envelope
            .data
            .and_then(|d| d.task_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GenError::submission("No taskId in submission response"))
    }

    /// Poll the status endpoint until the task reaches a terminal state,
    /// returning the artifact URL on success.
    ///
    /// A single failed status GET aborts the task; only the caller's retry
    /// layer resubmits.
    async fn poll_until_terminal(&self, kind: ProviderKind, task_id: &str) -> GenResult<String> {
        let status_endpoint = match kind {
            ProviderKind::Audio => &self.config.audio_status_endpoint,
            ProviderKind::Image => &self.config.image_status_endpoint,
        };
        let url = self.endpoint_url(status_endpoint)?;
        let mut task = GenerationTask::submitted(kind, task_id);
        let started = tokio::time::Instant::now();

        while started.elapsed() < self.config.poll_budget {
            let response = self
                .http
                .get(url.clone())
                .bearer_auth(&self.config.api_key)
                .timeout(Duration::from_secs(30))
                .query(&[("taskId", task_id)])
                .send()
                .await?
                .error_for_status()?;

            let envelope: StatusEnvelope = response
                .json()
                .await
                .map_err(|e| GenError::invalid_response(format!("Unparseable status response: {e}")))?;

            if envelope.code != 200 {
                return Err(GenError::invalid_response(format!(
                    "Status query returned code {}: {}",
                    envelope.code,
                    envelope.msg.unwrap_or_default()
                )));
            }

            let data = envelope.data.unwrap_or_default();
            let raw = match kind {
                ProviderKind::Audio => data.status.as_deref(),
                ProviderKind::Image => data.state.as_deref(),
            }
            .unwrap_or("");

            let status = kind.normalize_status(raw);
            info!(task_id = %task_id, provider = %kind, raw = %raw, "Task status: {}", status);

            match status {
                TaskStatus::Succeeded => {
                    let artifact = match kind {
                        ProviderKind::Audio => extract_audio_url(&data),
                        ProviderKind::Image => extract_image_url(&data),
                    };
                    return match artifact {
                        Some(artifact_url) if !artifact_url.is_empty() => {
                            task.succeed(artifact_url.clone());
                            Ok(artifact_url)
                        }
                        _ => Err(GenError::malformed_success(
                            task_id,
                            format!("no artifact URL in completed {kind} task"),
                        )),
                    };
                }
                TaskStatus::Failed => {
                    task.observe(TaskStatus::Failed);
                    return Err(GenError::task_failed(
                        task_id,
                        format!("provider reported {raw}"),
                    ));
                }
                TaskStatus::Pending | TaskStatus::Running => {
                    task.observe(status);
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                TaskStatus::TimedOut => unreachable!("normalization never yields a timeout"),
            }
        }

        task.observe(TaskStatus::TimedOut);
        Err(GenError::PollTimeout {
            task_id: task_id.to_string(),
            waited_secs: started.elapsed().as_secs(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> GenResult<Url> {
        Ok(Url::parse(&self.config.api_base)?.join(endpoint)?)
    }
}

/// Music artifact lives at `data.response.sunoData[0].audioUrl`.
fn extract_audio_url(data: &StatusData) -> Option<String> {
    data.response
        .as_ref()?
        .suno_data
        .first()?
        .audio_url
        .clone()
}

/// Image artifact lives inside `data.resultJson`, a JSON-encoded string
/// holding `{"resultUrls": [...]}` — a secondary parse is required.
fn extract_image_url(data: &StatusData) -> Option<String> {
    let raw = data.result_json.as_deref()?;
    let result: ImageResult = serde_json::from_str(raw).ok()?;
    result.result_urls.into_iter().next()
}
