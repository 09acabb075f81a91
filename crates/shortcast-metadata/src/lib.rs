//! AI metadata generation for queued uploads.
//!
//! A job's prompt is turned into a title, description and tags once,
//! before fan-out. Generation may fail at any point; callers go through
//! [`generate_or_fallback`], which never fails and degrades to metadata
//! derived from the prompt.

pub mod client;
pub mod error;
pub mod generator;
mod types;

pub use client::{ChatMetadataClient, MetadataClientConfig};
pub use error::{MetadataError, MetadataResult};
pub use generator::{generate_or_fallback, GeneratedMetadata, MetadataGenerator, MetadataSource};
