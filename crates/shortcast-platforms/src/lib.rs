//! Platform delivery for shortcast.
//!
//! Each platform is served by a [`PlatformUploader`]; the
//! [`UploaderRegistry`] maps the closed [`Platform`](shortcast_models::Platform)
//! enum to implementations and resolves per-channel credentials through a
//! [`CredentialProvider`].

pub mod credentials;
pub mod error;
pub mod registry;
pub mod uploader;

pub use credentials::{Credential, CredentialProvider, StaticCredentials};
pub use error::{UploadError, UploadErrorCode, UploadResult};
pub use registry::UploaderRegistry;
pub use uploader::{DryRunUploader, PlatformUploader, UploadReceipt, UploadRequest};
