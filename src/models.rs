//! Data models for the user/posts aggregation.
//!
//! These are the records decoded from the upstream API and the composite
//! result handed back to callers.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;
use std::str::FromStr;

/// Identifier of a user, as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(UserId)
    }
}

/// Profile attributes of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,
    pub username: String,
    pub email: String,
}

/// A single post authored by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Numeric post id, kept exactly as upstream sent it (`1` stays `1`).
    pub id: Number,
    pub title: String,
    pub body: String,
}

/// Composite result of a successful aggregation.
///
/// Only ever built once both sub-fetches have succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub id: UserId,
    #[serde(rename = "userInfo")]
    pub profile: ProfileRecord,
    /// Posts in upstream response order.
    pub posts: Vec<PostRecord>,
}
