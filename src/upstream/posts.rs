//! Posts lookup against `/posts?userId={id}`.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::decode::{number_field, string_field, type_name};
use super::{PostsFetcher, UpstreamClient};
use crate::error::FetchError;
use crate::models::{PostRecord, UserId};

/// Posts fetcher backed by the upstream REST API.
#[derive(Debug, Clone)]
pub struct HttpPostsFetcher {
    client: UpstreamClient,
}

impl HttpPostsFetcher {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PostsFetcher for HttpPostsFetcher {
    async fn fetch(&self, id: UserId) -> Result<Vec<PostRecord>, FetchError> {
        let value = self
            .client
            .get_json("posts", &[("userId", id.to_string())])
            .await?;
        let posts = decode_posts(&value)?;
        debug!("Fetched {} posts for user {}", posts.len(), id);
        Ok(posts)
    }
}

/// Decode a posts payload, preserving upstream order.
///
/// An empty list is reported as `NotFound`: upstream cannot tell an author
/// with no posts from an unknown author. One malformed element fails the
/// whole list.
pub(crate) fn decode_posts(value: &Value) -> Result<Vec<PostRecord>, FetchError> {
    let items = match value {
        Value::Null => return Err(FetchError::NotFound),
        Value::Array(items) if items.is_empty() => return Err(FetchError::NotFound),
        Value::Array(items) => items,
        other => {
            return Err(FetchError::decode(format!(
                "posts should be an array, got {}",
                type_name(other)
            )))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| decode_post(item).map_err(|e| at_index(index, e)))
        .collect()
}

fn decode_post(item: &Value) -> Result<PostRecord, FetchError> {
    let Value::Object(object) = item else {
        return Err(FetchError::decode(format!(
            "post should be an object, got {}",
            type_name(item)
        )));
    };

    Ok(PostRecord {
        id: number_field(object, "id")?,
        title: string_field(object, "title")?,
        body: string_field(object, "body")?,
    })
}

fn at_index(index: usize, error: FetchError) -> FetchError {
    match error {
        FetchError::Decode(msg) => FetchError::Decode(format!("posts[{}]: {}", index, msg)),
        other => other,
    }
}
