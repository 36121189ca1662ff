//! Stanford CoreNLP server backend.
//!
//! Sends text to a running CoreNLP server and keeps the entity mentions whose
//! class is one of the seven classic categories.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{EntityCategory, NerBackend, NerError, NerResult};

/// Default CoreNLP server address.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:9000";

const PROPERTIES: &str =
    r#"{"annotators":"tokenize,ssplit,pos,lemma,ner","outputFormat":"json"}"#;

/// CoreNLP server response (only the parts used here).
#[derive(Debug, Deserialize)]
struct CoreNlpResponse {
    #[serde(default)]
    sentences: Vec<CoreNlpSentence>,
}

#[derive(Debug, Deserialize)]
struct CoreNlpSentence {
    #[serde(default)]
    entitymentions: Vec<EntityMention>,
}

#[derive(Debug, Deserialize)]
struct EntityMention {
    text: String,
    ner: String,
}

pub struct CoreNlpBackend {
    client: Client,
    endpoint: Url,
}

impl CoreNlpBackend {
    /// Build a backend for the server at `server_url`. Performs no I/O.
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, NerError> {
        let mut endpoint = Url::parse(server_url).map_err(|e| {
            NerError::Init(format!("invalid CoreNLP server URL '{}': {}", server_url, e))
        })?;
        endpoint
            .query_pairs_mut()
            .append_pair("properties", PROPERTIES);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NerError::Init(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl NerBackend for CoreNlpBackend {
    fn backend_id(&self) -> &str {
        "corenlp"
    }

    async fn recognise(&self, text: &str) -> Result<NerResult, NerError> {
        if text.trim().is_empty() {
            return Ok(NerResult::new());
        }

        debug!("Sending {} bytes to CoreNLP at {}", text.len(), self.endpoint);
        let resp = self
            .client
            .post(self.endpoint.clone())
            .body(text.to_string())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(NerError::Recognition(format!(
                "CoreNLP returned HTTP {}",
                resp.status()
            )));
        }

        let parsed: CoreNlpResponse = resp.json().await?;
        Ok(collect_mentions(parsed))
    }
}

fn collect_mentions(response: CoreNlpResponse) -> NerResult {
    let mut result = NerResult::new();
    for mention in response
        .sentences
        .into_iter()
        .flat_map(|s| s.entitymentions)
    {
        if let Some(category) = EntityCategory::from_label(&mention.ner) {
            result
                .entry(category.as_str().to_string())
                .or_default()
                .insert(mention.text);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_mentions_keeps_tracked_categories() {
        let json = r#"{
            "sentences": [
                {"index": 0, "entitymentions": [
                    {"text": "Alice", "ner": "PERSON", "characterOffsetBegin": 0},
                    {"text": "Acme", "ner": "ORGANIZATION"},
                    {"text": "three", "ner": "NUMBER"}
                ]},
                {"index": 1, "entitymentions": [
                    {"text": "Bob", "ner": "PERSON"},
                    {"text": "Alice", "ner": "PERSON"}
                ]},
                {"index": 2}
            ]
        }"#;
        let response: CoreNlpResponse = serde_json::from_str(json).unwrap();
        let result = collect_mentions(response);

        assert_eq!(result.len(), 2);
        assert_eq!(
            result["PERSON"].iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Alice", "Bob"]
        );
        assert!(result["ORGANIZATION"].contains("Acme"));
        assert!(!result.contains_key("NUMBER"));
    }

    #[test]
    fn test_endpoint_carries_properties() {
        let backend = CoreNlpBackend::new("http://nlp.internal:9000", Duration::from_secs(5)).unwrap();
        let query: Vec<(String, String)> = backend.endpoint().query_pairs().into_owned().collect();

        assert_eq!(query.len(), 1);
        assert_eq!(query[0].0, "properties");
        assert_eq!(query[0].1, PROPERTIES);
    }

    #[test]
    fn test_invalid_url_is_init_error() {
        let err = CoreNlpBackend::new("not a url", Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, NerError::Init(_)));
    }

    #[tokio::test]
    async fn test_blank_text_skips_request() {
        // Port 9 is discard; an actual request would fail.
        let backend = CoreNlpBackend::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        assert!(backend.recognise("   \n").await.unwrap().is_empty());
    }
}
