//! Shared data models for the SomnoStream pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Generation tasks and canonical task status
//! - Provider status vocabularies and their normalization
//! - Video upload metadata and privacy rules
//! - Publish-time scheduling
//! - Template text assembly for titles, descriptions and prompts

pub mod schedule;
pub mod task;
pub mod templates;
pub mod video;

// Re-export common types
pub use schedule::{jst, next_publish_at, PUBLISH_HOUR_JST};
pub use task::{GenerationTask, ProviderKind, TaskStatus};
pub use templates::{BuiltTexts, Mood, Season, TemplateError, Templates};
pub use video::{PrivacyStatus, VideoMetadata};
