//! JSON-over-HTTPS remote store.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{RecordRef, RemoteRecord, RemoteStore};
use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::models::{Vocabulary, VocabularyId, Word};
use crate::util::{compact_text, is_http_url};

const REMOTE_HTTP_TIMEOUT_SECS: u64 = 15;

/// HTTP client for the per-user record store.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    base_url: String,
    auth_token: String,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    /// Builds a client for an explicit base URL and bearer token.
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> RemoteResult<Self> {
        let base_url = normalize_base_url(base_url.into().as_str())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REMOTE_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|error| {
                RemoteError::Unreachable(format!("Failed to construct HTTP client: {error}"))
            })?;
        Ok(Self {
            base_url,
            auth_token: auth_token.into(),
            client,
        })
    }

    /// Builds a client from resolved remote settings.
    pub fn from_config(config: &RemoteConfig) -> RemoteResult<Self> {
        let (Some(base_url), Some(auth_token)) = (&config.base_url, &config.auth_token) else {
            return Err(RemoteError::Unreachable(
                "remote base URL and token are required".to_string(),
            ));
        };
        Self::new(base_url.as_str(), auth_token.as_str())
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, route: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{route}", self.base_url))
            .bearer_auth(&self.auth_token)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn get_records<T: DeserializeOwned>(
        &self,
        route: &str,
    ) -> RemoteResult<Vec<RemoteRecord<T>>> {
        let response = send(self.request(Method::GET, route)).await?;
        let response = check_status(response, RemoteError::FetchFailed).await?;
        let payload = response
            .json::<RecordList<T>>()
            .await
            .map_err(|error| RemoteError::FetchFailed(format!("Invalid response body: {error}")))?;
        Ok(payload.records)
    }

    async fn put_record<T: Serialize + DeserializeOwned>(
        &self,
        route: &str,
        record: &T,
    ) -> RemoteResult<RemoteRecord<T>> {
        let response = send(self.request(Method::PUT, route).json(record)).await?;
        let response = check_status(response, RemoteError::SaveFailed).await?;
        response
            .json::<RemoteRecord<T>>()
            .await
            .map_err(|error| RemoteError::SaveFailed(format!("Invalid response body: {error}")))
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn fetch_all(&self) -> RemoteResult<Vec<RemoteRecord<Vocabulary>>> {
        self.get_records("/v1/vocabularies").await
    }

    async fn fetch_words(
        &self,
        vocabulary: &VocabularyId,
    ) -> RemoteResult<Vec<RemoteRecord<Word>>> {
        self.get_records(&format!("/v1/vocabularies/{vocabulary}/words"))
            .await
    }

    async fn save_vocabulary(
        &self,
        vocabulary: &Vocabulary,
    ) -> RemoteResult<RemoteRecord<Vocabulary>> {
        self.put_record(&format!("/v1/vocabularies/{}", vocabulary.id), vocabulary)
            .await
    }

    async fn save_word(&self, word: &Word) -> RemoteResult<RemoteRecord<Word>> {
        self.put_record(&format!("/v1/words/{}", word.id), word)
            .await
    }

    async fn delete(&self, record: &RecordRef) -> RemoteResult<()> {
        let route = match record {
            RecordRef::Vocabulary(id) => format!("/v1/vocabularies/{id}"),
            RecordRef::Word(id) => format!("/v1/words/{id}"),
        };
        let response = send(self.request(Method::DELETE, &route)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(record.to_string()));
        }
        check_status(response, RemoteError::DeleteFailed).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RecordList<T> {
    records: Vec<RemoteRecord<T>>,
}

async fn send(request: RequestBuilder) -> RemoteResult<Response> {
    request.send().await.map_err(|error| {
        if error.is_connect() || error.is_timeout() {
            RemoteError::Unreachable(error.to_string())
        } else {
            RemoteError::FetchFailed(format!("Request failed: {error}"))
        }
    })
}

async fn check_status(
    response: Response,
    failure: fn(String) -> RemoteError,
) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(failure(status_message(status, &body)))
}

fn status_message(status: StatusCode, body: &str) -> String {
    format!(
        "Remote store returned HTTP {}: {}",
        status.as_u16(),
        compact_text(body)
    )
}

fn normalize_base_url(raw: &str) -> RemoteResult<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(RemoteError::Unreachable(
            "Remote base URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(&base) {
        return Err(RemoteError::Unreachable(
            "Remote base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url("").is_err());
        assert!(normalize_base_url("voca.example.com").is_err());
    }

    #[test]
    fn normalize_base_url_trims_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://sync.example.com/").unwrap(),
            "https://sync.example.com"
        );
    }

    #[test]
    fn from_config_requires_token() {
        let config = RemoteConfig {
            base_url: Some("https://sync.example.com".to_string()),
            auth_token: None,
        };
        assert!(HttpRemoteStore::from_config(&config).is_err());
    }

    #[test]
    fn status_message_is_compacted() {
        let body = "x".repeat(500);
        let message = status_message(StatusCode::BAD_GATEWAY, &body);
        assert!(message.starts_with("Remote store returned HTTP 502"));
        assert!(message.len() < 250);
    }

    #[test]
    fn record_list_parses_remote_payload() {
        let payload = r#"{
          "records": [{
            "record": {
              "id": "01890a5d-ac96-774b-bcce-b302099a8057",
              "name": "Travel",
              "nationality": "JA",
              "is_pinned": false,
              "created_at": 1,
              "updated_at": 2,
              "deleted_at": null
            },
            "modified_at": 42
          }]
        }"#;

        let parsed: RecordList<Vocabulary> = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].modified_at, 42);
        assert_eq!(parsed.records[0].record.name, "Travel");
    }
}
