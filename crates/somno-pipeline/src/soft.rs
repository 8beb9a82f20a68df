//! Soft stage execution.
//!
//! Optional integrations (Drive mirror, Sheets log, thumbnail,
//! notifications) must never abort a run. A soft stage captures the
//! failure, logs it, and the pipeline moves on.

use std::future::Future;

use tracing::warn;

/// Run a stage whose failure is downgraded to a warning.
pub async fn soft_stage<T, E, Fut>(stage: &str, fut: Fut) -> Option<T>
where
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} failed (continuing anyway): {}", stage, e);
            None
        }
    }
}
