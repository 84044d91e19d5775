//! Profile lookup against `/users/{id}`.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::decode::{string_field, type_name};
use super::{ProfileFetcher, UpstreamClient};
use crate::error::FetchError;
use crate::models::{ProfileRecord, UserId};

/// Profile fetcher backed by the upstream REST API.
#[derive(Debug, Clone)]
pub struct HttpProfileFetcher {
    client: UpstreamClient,
}

impl HttpProfileFetcher {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileFetcher for HttpProfileFetcher {
    async fn fetch(&self, id: UserId) -> Result<ProfileRecord, FetchError> {
        let value = self.client.get_json(&format!("users/{}", id), &[]).await?;
        let profile = decode_profile(&value)?;
        debug!("Fetched profile for user {}", id);
        Ok(profile)
    }
}

/// Decode a profile payload. An empty object or `null` means the user is
/// unknown.
pub(crate) fn decode_profile(value: &Value) -> Result<ProfileRecord, FetchError> {
    let object = match value {
        Value::Null => return Err(FetchError::NotFound),
        Value::Object(map) if map.is_empty() => return Err(FetchError::NotFound),
        Value::Object(map) => map,
        other => {
            return Err(FetchError::decode(format!(
                "profile should be an object, got {}",
                type_name(other)
            )))
        }
    };

    Ok(ProfileRecord {
        name: string_field(object, "name")?,
        username: string_field(object, "username")?,
        email: string_field(object, "email")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_decode_profile_ignores_extra_fields() {
        let value = json!({
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "address": {"city": "Gwenborough"}
        });

        let profile = decode_profile(&value).unwrap();
        assert_eq!(profile.name, "Leanne Graham");
        assert_eq!(profile.username, "Bret");
        assert_eq!(profile.email, "Sincere@april.biz");
    }

    #[test]
    fn test_decode_profile_empty_is_not_found() {
        assert!(matches!(decode_profile(&json!({})), Err(FetchError::NotFound)));
        assert!(matches!(decode_profile(&Value::Null), Err(FetchError::NotFound)));
    }

    #[test]
    fn test_decode_profile_bad_fields_are_decode_errors() {
        let missing = json!({"name": "A", "username": "a"});
        assert!(matches!(decode_profile(&missing), Err(FetchError::Decode(_))));

        let wrong_type = json!({"name": "A", "username": "a", "email": 5});
        assert!(matches!(decode_profile(&wrong_type), Err(FetchError::Decode(_))));

        let not_object = json!(["A"]);
        assert!(matches!(decode_profile(&not_object), Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_fetch_profile_over_http() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/users/1");
                then.status(200)
                    .json_body(json!({"name": "A", "username": "a", "email": "a@x.com"}));
            })
            .await;

        let client =
            UpstreamClient::new(&server.base_url(), Duration::from_secs(5), "userposts-test")
                .unwrap();
        let fetcher = HttpProfileFetcher::new(client);

        let profile = fetcher.fetch(UserId(1)).await.unwrap();
        assert_eq!(
            profile,
            ProfileRecord {
                name: "A".to_string(),
                username: "a".to_string(),
                email: "a@x.com".to_string(),
            }
        );
        mock.assert_async().await;
    }
}
