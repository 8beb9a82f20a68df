//! Client for asynchronous generation providers.
//!
//! Music and image generation both follow the same protocol: submit a
//! request, receive an opaque task id, then poll a status endpoint until
//! the task reaches a terminal state and yields an artifact URL. The two
//! providers differ in endpoints, status field names and vocabulary —
//! normalization lives in [`somno_models::ProviderKind`].

pub mod client;
pub mod download;
pub mod error;

pub use client::{AudioRequest, GenClient, GenClientConfig, ImageRequest};
pub use download::download_artifact;
pub use error::{GenError, GenResult};
