//! Upstream REST lookups.
//!
//! This module provides the two leaf fetchers the aggregator fans out to,
//! plus the shared HTTP client and JSON field extraction they both use.

pub mod client;
mod decode;
pub mod posts;
pub mod profile;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{PostRecord, ProfileRecord, UserId};

pub use client::UpstreamClient;
pub use posts::HttpPostsFetcher;
pub use profile::HttpProfileFetcher;

/// Resolves a user identifier to profile attributes.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch(&self, id: UserId) -> Result<ProfileRecord, FetchError>;
}

/// Resolves a user identifier to the posts authored by that user.
#[async_trait]
pub trait PostsFetcher: Send + Sync {
    async fn fetch(&self, id: UserId) -> Result<Vec<PostRecord>, FetchError>;
}
