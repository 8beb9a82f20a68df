//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(#[from] somno_models::TemplateError),

    #[error("Generation failed: {0}")]
    Gen(#[from] somno_gen::GenError),

    #[error("AI variation generation failed: {0}")]
    Variation(String),

    #[error("Media processing failed: {0}")]
    Media(#[from] somno_media::MediaError),

    #[error("Upload failed: {0}")]
    Upload(#[from] somno_upload::UploadError),

    #[error("Reporting failed: {0}")]
    Report(#[from] somno_report::ReportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn variation_failed(msg: impl Into<String>) -> Self {
        Self::Variation(msg.into())
    }
}
