//! Cloudflare R2 storage client.
//!
//! This crate provides:
//! - File upload to R2
//! - Public or presigned URL generation for uploaded reels
//! - The `VideoUploader` seam used by the story pipeline

pub mod client;
pub mod error;
pub mod uploader;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use uploader::{object_key, R2VideoUploader, UploadedObject, VideoUploader};
