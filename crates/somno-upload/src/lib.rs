//! Resumable chunked uploads to Google hosting APIs.
//!
//! One transfer engine ([`resumable`]) drives both the YouTube video
//! upload and the Drive mirror upload: open a session with the resource
//! metadata, then send the file in chunks, retrying transient server
//! errors at the chunk level so already-sent bytes are never lost.

pub mod auth;
pub mod drive;
pub mod error;
pub mod resumable;
pub mod youtube;

pub use auth::OauthRefresher;
pub use drive::DriveClient;
pub use error::{UploadError, UploadResult};
pub use resumable::{ResumableConfig, ResumableTransfer, UploadSession};
pub use youtube::YouTubeClient;
