use crate::core::config::ApiConfig;
use crate::core::error::ServiceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

// Logical object names registered with the analysis service.
pub const BOOK_CHUNKS: &str = "book_chunks";
pub const CHARACTER_EXTRACTIONS: &str = "character_extractions";
pub const FINAL_CHARACTERS: &str = "final_characters";
pub const EMOTION_CHUNKS: &str = "emotion_chunks";
pub const TAGGED_TEXT: &str = "tagged_text";

pub const ALL_OBJECTS: [&str; 5] = [
    BOOK_CHUNKS,
    CHARACTER_EXTRACTIONS,
    FINAL_CHARACTERS,
    EMOTION_CHUNKS,
    TAGGED_TEXT,
];

/// How a prompt template is applied to an ingested collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// One model call per item; results stay index-aligned with the input.
    UseIndividually,
    /// One call over the whole collection, producing a single merged output.
    CombineEvents,
}

impl PromptMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptMode::UseIndividually => "use_individually",
            PromptMode::CombineEvents => "combine_events",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnFormat {
    Json,
    PrettyText,
}

impl ReturnFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnFormat::Json => "json",
            ReturnFormat::PrettyText => "pretty_text",
        }
    }
}

/// Raw reply of `/return_data`. Which of the two fields is populated, and
/// what shape `value` takes, is not guaranteed; see `services::normalize`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub text_value: Option<String>,
}

/// Append-only audit trail entry. Failing calls are recorded too, with the
/// transport error in place of the response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiCallEntry {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub method: String,
    pub request: Option<Value>,
    pub response: Value,
}

pub type CallLog = Arc<Mutex<Vec<ApiCallEntry>>>;

#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Register an ordered string collection under a logical name. Re-ingesting
    /// under the same name replaces the previous collection.
    async fn ingest(&self, name: &str, items: &[String]) -> Result<(), ServiceError>;

    async fn apply_prompt(
        &self,
        output_name: &str,
        prompt: &str,
        input_name: &str,
        mode: PromptMode,
    ) -> Result<(), ServiceError>;

    async fn fetch_result(&self, name: &str, format: ReturnFormat)
        -> Result<RawResult, ServiceError>;

    /// Best-effort cleanup. A missing object is not an error; failures are
    /// logged and swallowed so a partial deletion never blocks a reset.
    async fn delete_objects(&self, names: &[&str]);
}

pub struct HttpGateway {
    api: ApiConfig,
    client: reqwest::Client,
    log: CallLog,
}

impl HttpGateway {
    pub fn new(api: ApiConfig, log: CallLog) -> Self {
        Self {
            api,
            client: reqwest::Client::new(),
            log,
        }
    }

    fn record(&self, endpoint: &str, method: &str, request: Option<&Value>, response: Value) {
        let entry = ApiCallEntry {
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            request: request.cloned(),
            response,
        };
        if let Ok(mut log) = self.log.lock() {
            log.push(entry);
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.api.api_key)
            .header("X-Generated-App-ID", &self.api.app_id)
            .header("X-Usage-Key", &self.api.usage_key)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api.base_url.trim_end_matches('/'), endpoint)
    }

    async fn post(&self, endpoint: &str, payload: Value) -> Result<Value, ServiceError> {
        debug!("POST {}", endpoint);
        let sent = self
            .request(reqwest::Method::POST, &self.url(endpoint))
            .json(&payload)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                self.record(endpoint, "POST", Some(&payload), json!({ "transport_error": e.to_string() }));
                return Err(ServiceError::Transport {
                    endpoint: endpoint.to_string(),
                    source: e,
                });
            }
        };

        let status = response.status();
        let body_text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                self.record(endpoint, "POST", Some(&payload), json!({ "transport_error": e.to_string() }));
                return Err(ServiceError::Transport {
                    endpoint: endpoint.to_string(),
                    source: e,
                });
            }
        };

        let body: Value =
            serde_json::from_str(&body_text).unwrap_or_else(|_| Value::String(body_text.clone()));
        self.record(endpoint, "POST", Some(&payload), body.clone());

        if !status.is_success() {
            return Err(ServiceError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: body_text,
            });
        }
        Ok(body)
    }
}

fn ingest_payload(name: &str, items: &[String]) -> Value {
    json!({
        "created_object_name": name,
        "data_type": "strings",
        "input_data": items,
    })
}

fn apply_prompt_payload(output_name: &str, prompt: &str, input_name: &str, mode: PromptMode) -> Value {
    json!({
        "created_object_names": [output_name],
        "prompt_string": prompt,
        "inputs": [{
            "input_object_name": input_name,
            "mode": mode.as_str(),
        }],
    })
}

fn return_data_payload(name: &str, format: ReturnFormat) -> Value {
    json!({
        "object_name": name,
        "return_type": format.as_str(),
    })
}

#[async_trait]
impl AnalysisService for HttpGateway {
    async fn ingest(&self, name: &str, items: &[String]) -> Result<(), ServiceError> {
        self.post("/input_data", ingest_payload(name, items)).await?;
        Ok(())
    }

    async fn apply_prompt(
        &self,
        output_name: &str,
        prompt: &str,
        input_name: &str,
        mode: PromptMode,
    ) -> Result<(), ServiceError> {
        self.post(
            "/apply_prompt",
            apply_prompt_payload(output_name, prompt, input_name, mode),
        )
        .await?;
        Ok(())
    }

    async fn fetch_result(
        &self,
        name: &str,
        format: ReturnFormat,
    ) -> Result<RawResult, ServiceError> {
        let body = self
            .post("/return_data", return_data_payload(name, format))
            .await?;
        // Tolerant here: an unusable body surfaces later as MalformedResponse
        // once normalization finds nothing to work with.
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    async fn delete_objects(&self, names: &[&str]) {
        for name in names {
            let endpoint = format!("/objects/{}", name);
            let sent = self
                .request(reqwest::Method::DELETE, &self.url(&endpoint))
                .send()
                .await;
            match sent {
                Ok(response) => {
                    let status = response.status();
                    let body: Value = response
                        .json()
                        .await
                        .unwrap_or_else(|_| Value::Null);
                    self.record(&endpoint, "DELETE", None, body);
                    if !status.is_success() {
                        // missing objects come back as errors; never propagated
                        warn!("cleanup of {} returned HTTP {}", name, status);
                    }
                }
                Err(e) => {
                    self.record(&endpoint, "DELETE", None, json!({ "transport_error": e.to_string() }));
                    warn!("cleanup of {} failed: {}", name, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_payload_shape() {
        let payload = ingest_payload(BOOK_CHUNKS, &["one".to_string(), "two".to_string()]);
        assert_eq!(payload["created_object_name"], "book_chunks");
        assert_eq!(payload["data_type"], "strings");
        assert_eq!(payload["input_data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn apply_prompt_payload_shape() {
        let payload = apply_prompt_payload(
            FINAL_CHARACTERS,
            "merge {character_extractions}",
            CHARACTER_EXTRACTIONS,
            PromptMode::CombineEvents,
        );
        assert_eq!(payload["created_object_names"][0], "final_characters");
        assert_eq!(payload["inputs"][0]["input_object_name"], "character_extractions");
        assert_eq!(payload["inputs"][0]["mode"], "combine_events");
    }

    #[test]
    fn return_data_payload_shape() {
        let payload = return_data_payload(TAGGED_TEXT, ReturnFormat::PrettyText);
        assert_eq!(payload["object_name"], "tagged_text");
        assert_eq!(payload["return_type"], "pretty_text");
    }

    #[test]
    fn raw_result_parses_partial_bodies() {
        let raw: RawResult = serde_json::from_value(json!({ "value": ["a"] })).unwrap();
        assert!(raw.value.is_some());
        assert!(raw.text_value.is_none());

        let raw: RawResult = serde_json::from_value(json!({ "text_value": "t" })).unwrap();
        assert_eq!(raw.text_value.as_deref(), Some("t"));
    }

    #[test]
    fn record_appends_to_the_shared_log() {
        let log: CallLog = Arc::default();
        let gateway = HttpGateway::new(
            ApiConfig {
                base_url: "https://example.test/api".to_string(),
                api_key: "k".to_string(),
                app_id: "a".to_string(),
                usage_key: "u".to_string(),
            },
            Arc::clone(&log),
        );
        gateway.record("/input_data", "POST", Some(&json!({"x": 1})), json!({"ok": true}));
        gateway.record("/apply_prompt", "POST", None, json!({}));

        let entries = log.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].endpoint, "/input_data");
        assert_eq!(entries[0].response["ok"], true);
    }
}
