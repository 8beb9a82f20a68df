//! Video upload metadata.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// YouTube privacy status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    Public,
    Unlisted,
    #[default]
    Private,
}

impl PrivacyStatus {
    /// Get the API string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Public => "public",
            PrivacyStatus::Unlisted => "unlisted",
            PrivacyStatus::Private => "private",
        }
    }

    /// Parse a privacy status from a configuration value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Some(PrivacyStatus::Public),
            "unlisted" => Some(PrivacyStatus::Unlisted),
            "private" => Some(PrivacyStatus::Private),
            _ => None,
        }
    }
}

impl std::fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata for a scheduled video upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// YouTube category ("10" = Music).
    pub category_id: String,
    /// Privacy requested by configuration.
    pub privacy: PrivacyStatus,
    /// Scheduled publish time. When set, the upload must not be public.
    pub publish_at: Option<DateTime<FixedOffset>>,
}

impl VideoMetadata {
    /// Create metadata with the music category preset.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tags: Vec::new(),
            category_id: "10".to_string(),
            privacy: PrivacyStatus::default(),
            publish_at: None,
        }
    }

    /// Set the upload tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the requested privacy status.
    pub fn with_privacy(mut self, privacy: PrivacyStatus) -> Self {
        self.privacy = privacy;
        self
    }

    /// Schedule the publish time.
    pub fn with_publish_at(mut self, publish_at: DateTime<FixedOffset>) -> Self {
        self.publish_at = Some(publish_at);
        self
    }

    /// The privacy status actually sent to the hosting API.
    ///
    /// Scheduled publishing requires a non-public upload, so a set
    /// `publish_at` forces `private` regardless of the configured value.
    pub fn effective_privacy(&self) -> PrivacyStatus {
        if self.publish_at.is_some() {
            PrivacyStatus::Private
        } else {
            self.privacy
        }
    }
}
