//! Generation tasks and canonical task status.
//!
//! Remote generation providers expose heterogeneous raw status
//! vocabularies (`SUCCESS` vs lowercase `success`, `status` vs `state`).
//! [`ProviderKind::normalize_status`] maps every raw value into the
//! canonical [`TaskStatus`] set so callers never branch on provider
//! spellings.

use serde::{Deserialize, Serialize};

/// Which remote generation service a task was submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Music generation (Suno-style API).
    Audio,
    /// Image generation (Nano Banana-style API).
    Image,
}

impl ProviderKind {
    /// Get string representation of the provider kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Audio => "audio",
            ProviderKind::Image => "image",
        }
    }

    /// Normalize a provider's raw status value into a canonical [`TaskStatus`].
    ///
    /// Comparison is case-insensitive: the image provider reports lowercase
    /// `success` while the audio provider reports `SUCCESS`. Raw values
    /// outside the documented vocabulary are treated as still in flight —
    /// never as success.
    pub fn normalize_status(&self, raw: &str) -> TaskStatus {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("success") {
            return TaskStatus::Succeeded;
        }
        if raw.eq_ignore_ascii_case("failed") || raw.eq_ignore_ascii_case("error") {
            return TaskStatus::Failed;
        }
        if raw.eq_ignore_ascii_case("pending")
            || raw.eq_ignore_ascii_case("queued")
            || raw.eq_ignore_ascii_case("queuing")
            || raw.eq_ignore_ascii_case("waiting")
        {
            return TaskStatus::Pending;
        }
        // Intermediate provider states (e.g. TEXT_SUCCESS, FIRST_SUCCESS,
        // generating) keep the poll loop going.
        TaskStatus::Running
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical generation task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted by the provider, not started yet.
    #[default]
    Pending,
    /// Generation in progress.
    Running,
    /// Terminal: generation finished and an artifact should exist.
    Succeeded,
    /// Terminal: provider reported a failure.
    Failed,
    /// Terminal: the polling budget ran out before a terminal status.
    TimedOut,
}

impl TaskStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::TimedOut => "timed_out",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::TimedOut
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A generation task submitted to a remote provider.
///
/// Created on submission, mutated only by polling, and discarded once the
/// artifact has been downloaded — there is no persistence beyond the
/// process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationTask {
    /// Which provider the task was submitted to.
    pub kind: ProviderKind,
    /// Opaque task identifier issued by the provider.
    pub task_id: String,
    /// Current canonical status.
    pub status: TaskStatus,
    /// Result artifact URL, set only once the task succeeds.
    pub artifact_url: Option<String>,
}

impl GenerationTask {
    /// Create a freshly submitted task.
    pub fn submitted(kind: ProviderKind, task_id: impl Into<String>) -> Self {
        Self {
            kind,
            task_id: task_id.into(),
            status: TaskStatus::Pending,
            artifact_url: None,
        }
    }

    /// Check if the task reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record a status observed while polling.
    ///
    /// Terminal states are sticky: once a task has succeeded, failed or
    /// timed out, later observations are ignored and `false` is returned.
    pub fn observe(&mut self, status: TaskStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }

    /// Mark the task succeeded with its artifact URL.
    pub fn succeed(&mut self, artifact_url: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Succeeded;
        self.artifact_url = Some(artifact_url.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_vocabulary_normalization() {
        let kind = ProviderKind::Audio;
        assert_eq!(kind.normalize_status("SUCCESS"), TaskStatus::Succeeded);
        assert_eq!(kind.normalize_status("FAILED"), TaskStatus::Failed);
        assert_eq!(kind.normalize_status("ERROR"), TaskStatus::Failed);
        assert_eq!(kind.normalize_status("PENDING"), TaskStatus::Pending);
        assert_eq!(kind.normalize_status("TEXT_SUCCESS"), TaskStatus::Running);
    }

    #[test]
    fn test_image_vocabulary_normalization() {
        let kind = ProviderKind::Image;
        // Lowercase success is the image provider's documented spelling.
        assert_eq!(kind.normalize_status("success"), TaskStatus::Succeeded);
        assert_eq!(kind.normalize_status("FAILED"), TaskStatus::Failed);
        assert_eq!(kind.normalize_status("ERROR"), TaskStatus::Failed);
        assert_eq!(kind.normalize_status("queuing"), TaskStatus::Pending);
        assert_eq!(kind.normalize_status("generating"), TaskStatus::Running);
    }

    #[test]
    fn test_unrecognized_status_is_never_success() {
        for raw in ["", "DONE", "ok", "COMPLETE", "success!"] {
            let status = ProviderKind::Audio.normalize_status(raw);
            assert_ne!(status, TaskStatus::Succeeded, "raw value {:?}", raw);
            assert!(!status.is_terminal(), "raw value {:?}", raw);
        }
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let mut task = GenerationTask::submitted(ProviderKind::Audio, "task-1");
        assert!(task.observe(TaskStatus::Running));
        assert!(task.succeed("https://x/a.mp3"));
        assert!(task.is_terminal());

        // No transitions out of a terminal state.
        assert!(!task.observe(TaskStatus::Failed));
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.artifact_url.as_deref(), Some("https://x/a.mp3"));
    }
}
