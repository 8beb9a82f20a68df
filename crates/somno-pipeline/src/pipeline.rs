//! Pipeline orchestration.
//!
//! Stages run in a fixed order on a single logical thread; suspension
//! happens only at backoff sleeps, poll intervals and network I/O. Hard
//! stages (generation, post-processing, render, YouTube upload) abort the
//! run; soft stages (Drive mirror, thumbnail, Sheets log, notifications)
//! warn and continue.

use std::path::PathBuf;

use chrono::{DateTime, Datelike, FixedOffset};
use rand::Rng;
use tracing::info;

use somno_gen::{download_artifact, AudioRequest, GenClient, GenClientConfig, ImageRequest};
use somno_media::{process_audio, render_video, AudioProcessOptions};
use somno_models::{jst, next_publish_at, BuiltTexts, Templates, VideoMetadata};
use somno_report::{DiscordNotifier, RunRow, ServiceAccountKey, SheetsClient};
use somno_upload::{DriveClient, OauthRefresher, ResumableConfig, YouTubeClient};

use crate::config::Settings;
use crate::error::PipelineResult;
use crate::retry::{retry, RetryPolicy};
use crate::soft::soft_stage;
use crate::variations::{GeminiConfig, VariationClient};

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub video_id: String,
    pub youtube_url: String,
    pub drive_url: Option<String>,
    pub seed: i64,
    pub title: String,
}

/// One pipeline run, configured once at startup.
pub struct Pipeline {
    settings: Settings,
    templates: Templates,
    gen: GenClient,
    http: reqwest::Client,
    notifier: DiscordNotifier,
    policy: RetryPolicy,
}

/// Per-run file layout, keyed by the run date so overlapping scheduled
/// invocations never collide on artifacts.
struct RunPaths {
    raw_audio: PathBuf,
    processed_audio: PathBuf,
    background: PathBuf,
    thumbnail: PathBuf,
    video: PathBuf,
}

impl RunPaths {
    fn new(output_dir: &std::path::Path, now: &DateTime<FixedOffset>) -> Self {
        let run_dir = output_dir.join(now.format("%Y%m%d").to_string());
        Self {
            raw_audio: run_dir.join("audio_raw.mp3"),
            processed_audio: run_dir.join("audio_90m.wav"),
            background: run_dir.join("bg.png"),
            thumbnail: run_dir.join("thumb.png"),
            video: run_dir.join("video.mp4"),
        }
    }

    fn run_dir(&self) -> &std::path::Path {
        self.video.parent().expect("run paths have a parent dir")
    }
}

/// Drive archive filename for a run.
fn drive_filename(now: &DateTime<FixedOffset>) -> String {
    format!("SleepMusic_{}.mp4", now.format("%Y%m%d_%H%M%S"))
}

impl Pipeline {
    /// Build a pipeline from settings, loading templates eagerly so a
    /// broken template file fails at startup.
    pub fn new(settings: Settings) -> PipelineResult<Self> {
        let templates = Templates::load(&settings.templates_path)?;

        let gen_config = GenClientConfig {
            api_base: settings.kieai_api_base.clone(),
            audio_endpoint: settings.kieai_suno_endpoint.clone(),
            image_endpoint: settings.kieai_nanobanana_endpoint.clone(),
            ..GenClientConfig::new(settings.kieai_api_key.clone())
        };
        let gen = GenClient::new(gen_config)?;

        let notifier = DiscordNotifier::new(settings.discord_webhook_url.clone());
        let policy = RetryPolicy::new(settings.max_retries);

        Ok(Self {
            settings,
            templates,
            gen,
            http: reqwest::Client::new(),
            notifier,
            policy,
        })
    }

    /// The run's notifier, for best-effort failure messages at top level.
    pub fn notifier(&self) -> &DiscordNotifier {
        &self.notifier
    }

    /// Execute one full run.
    pub async fn run(&self) -> PipelineResult<RunOutcome> {
        let now = chrono::Utc::now().with_timezone(&jst());
        // Scope the thread-local RNG so it is never held across an await.
        let (seed, mood) = {
            let mut rng = rand::rng();
            let seed: i64 = rng.random_range(1..=2_147_483_647);
            (seed, self.templates.choose_mood(&mut rng).clone())
        };
        let season = self.templates.season_for_month(now.month()).clone();
        info!(
            "Starting run: seed={} season={} mood={}",
            seed, season.en, mood.en
        );

        let variations = VariationClient::new(GeminiConfig::new(
            self.settings.gemini_api_key.clone(),
            self.settings.gemini_model.clone(),
        ))
        .generate(&season, &mood)
        .await;
        info!(
            "Variations: bg=\"{}\" thumb=\"{}\"",
            variations.background, variations.thumbnail
        );

        let texts = {
            let mut rng = rand::rng();
            self.templates.build_texts(
                &mut rng,
                &mood,
                &season,
                &variations.background,
                &variations.thumbnail,
            )
        };

        let paths = RunPaths::new(&self.settings.output_dir, &now);
        tokio::fs::create_dir_all(paths.run_dir()).await?;

        // Audio: generate, download, loop to length.
        self.generate_audio(&texts, &paths).await?;

        // Images: background then thumbnail, one retry unit. A failure in
        // the second image regenerates both (no partial-success recovery).
        self.generate_images(&texts, seed, &paths).await?;

        // Render the final video.
        render_video(&paths.background, &paths.processed_audio, &paths.video).await?;

        // Mirror to Drive (soft).
        let drive_url = self.mirror_to_drive(&paths, &now).await;

        // Scheduled YouTube upload (hard).
        let publish_at = next_publish_at(now, self.settings.publish_hour);
        info!("Scheduled publish time: {}", publish_at.format("%Y-%m-%d %H:%M:%S %z"));

        let metadata = VideoMetadata::new(texts.title.clone(), texts.description.clone())
            .with_tags(self.templates.tags.clone())
            .with_privacy(self.settings.youtube_privacy)
            .with_publish_at(publish_at);

        let video_id = retry(&self.policy, "video upload", || async {
            let token = self.youtube_oauth().access_token().await?;
            YouTubeClient::new(token, ResumableConfig::default())
                .upload_video(&paths.video, &metadata)
                .await
        })
        .await?;
        let youtube_url = format!("https://youtu.be/{video_id}");
        info!("Video uploaded successfully: {}", youtube_url);

        // Thumbnail (soft).
        soft_stage("Thumbnail set", async {
            let token = self.youtube_oauth().access_token().await?;
            YouTubeClient::new(token, ResumableConfig::default())
                .set_thumbnail(&video_id, &paths.thumbnail)
                .await
        })
        .await;

        // Sheets log (soft).
        self.log_to_sheets(&now, seed, &texts, &drive_url, &youtube_url)
            .await;

        // Success notification (best-effort).
        soft_stage(
            "Discord notification",
            self.notifier.notify(&format!("Upload complete: {youtube_url}")),
        )
        .await;

        Ok(RunOutcome {
            video_id,
            youtube_url,
            drive_url,
            seed,
            title: texts.title,
        })
    }

    /// Generate the track, download it and loop it to target length.
    async fn generate_audio(&self, texts: &BuiltTexts, paths: &RunPaths) -> PipelineResult<()> {
        let request = AudioRequest {
            prompt: texts.suno_prompt.clone(),
            model: self.settings.suno_model.clone(),
            instrumental: true,
        };

        let audio_url = retry(&self.policy, "audio generation", || {
            self.gen.generate_audio(&request)
        })
        .await?;

        download_artifact(&self.http, &audio_url, &paths.raw_audio).await?;

        let opts = AudioProcessOptions {
            target_minutes: self.settings.target_minutes,
            variance_minutes: self.settings.target_variance_minutes,
            lowpass_hz: self.settings.lowpass_hz,
            crossfade_seconds: self.settings.crossfade_seconds,
            fadeout_seconds: self.settings.fadeout_seconds,
        };
        let target_ms = process_audio(&paths.raw_audio, &paths.processed_audio, &opts).await?;
        info!("Audio processed to {:.1} minutes", target_ms as f64 / 60_000.0);
        Ok(())
    }

    /// Generate the background and thumbnail images sequentially.
    ///
    /// The thumbnail uses `seed + 1` so the two images differ.
    async fn generate_images(
        &self,
        texts: &BuiltTexts,
        seed: i64,
        paths: &RunPaths,
    ) -> PipelineResult<()> {
        retry(&self.policy, "image generation", || async {
            let bg_url = self
                .gen
                .generate_image(&ImageRequest {
                    prompt: texts.bg_prompt.clone(),
                    model: self.settings.kieai_nanobanana_model.clone(),
                    seed: Some(seed),
                })
                .await?;
            download_artifact(&self.http, &bg_url, &paths.background).await?;

            let thumb_url = self
                .gen
                .generate_image(&ImageRequest {
                    prompt: texts.thumb_prompt.clone(),
                    model: self.settings.kieai_nanobanana_model.clone(),
                    seed: Some(seed + 1),
                })
                .await?;
            download_artifact(&self.http, &thumb_url, &paths.thumbnail).await?;
            Ok::<(), somno_gen::GenError>(())
        })
        .await
        .map_err(Into::into)
    }

    /// Mirror the rendered video to Drive when configured. Soft: a failed
    /// mirror logs a warning and the run continues.
    async fn mirror_to_drive(
        &self,
        paths: &RunPaths,
        now: &DateTime<FixedOffset>,
    ) -> Option<String> {
        let (Some(refresh_token), Some(folder_id)) = (
            self.settings.google_refresh_token.as_deref(),
            self.settings.drive_folder_id.as_deref(),
        ) else {
            info!("Drive upload skipped (GOOGLE_REFRESH_TOKEN or DRIVE_FOLDER_ID not set)");
            return None;
        };

        let file_name = drive_filename(now);
        info!("Uploading to Drive folder {}: {}", folder_id, file_name);

        soft_stage(
            "Drive upload",
            retry(&self.policy, "drive upload", || async {
                let token = OauthRefresher::new(
                    self.settings.youtube_client_id.as_str(),
                    self.settings.youtube_client_secret.as_str(),
                    refresh_token,
                )
                .access_token()
                .await?;
                DriveClient::new(token, ResumableConfig::default())
                    .upload_file(&paths.video, &file_name, Some(folder_id))
                    .await
            }),
        )
        .await
    }

    /// Append the run row to the configured spreadsheet. Soft.
    async fn log_to_sheets(
        &self,
        now: &DateTime<FixedOffset>,
        seed: i64,
        texts: &BuiltTexts,
        drive_url: &Option<String>,
        youtube_url: &str,
    ) {
        let (Some(account), Some(sheets_id)) = (
            self.settings.gcp_service_account.as_ref(),
            self.settings.sheets_id.as_deref(),
        ) else {
            info!("Sheets logging skipped (GCP_SERVICE_ACCOUNT_JSON or SHEETS_ID not set)");
            return;
        };

        let row = RunRow {
            date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            seed,
            suno_prompt: texts.suno_prompt.clone(),
            bg_prompt: texts.bg_prompt.clone(),
            thumb_prompt: texts.thumb_prompt.clone(),
            drive_url: drive_url.clone().unwrap_or_else(|| "N/A".to_string()),
            youtube_url: youtube_url.to_string(),
            status: "success".to_string(),
        };

        soft_stage(
            "Sheets log",
            retry(&self.policy, "sheets append", || {
                let row = row.clone();
                async move {
                    let key = ServiceAccountKey::from_json(account)?;
                    SheetsClient::new(key, sheets_id)
                        .append_run(&self.settings.sheets_range, row)
                        .await
                }
            }),
        )
        .await;
    }

    fn youtube_oauth(&self) -> OauthRefresher {
        OauthRefresher::new(
            self.settings.youtube_client_id.as_str(),
            self.settings.youtube_client_secret.as_str(),
            self.settings.youtube_refresh_token.as_str(),
        )
    }
}
