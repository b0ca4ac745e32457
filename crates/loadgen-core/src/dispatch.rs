use crate::config::RunConfig;
use crate::payload::{utc_timestamp, EventRecord};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// How much of a non-JSON response body is kept in the outcome.
const RESPONSE_CAPTURE_CHARS: usize = 200;

/// Wire envelope for one request: `{"body": [event, ...]}`.
#[derive(Debug, Serialize)]
struct BatchEnvelope<'a> {
    body: &'a [EventRecord],
}

/// The structured result of one dispatch attempt.
///
/// A completed HTTP exchange carries `status_code` and `response`; a
/// transport failure (timeout, refused connection, DNS) carries `error`
/// and no status code. `success` is true iff the status code was 200.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub timestamp: String,
    pub batch_size: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchOutcome {
    fn completed(batch_size: usize, duration_ms: u64, status: u16, response: serde_json::Value) -> Self {
        Self {
            timestamp: utc_timestamp(),
            batch_size,
            duration_ms,
            status_code: Some(status),
            success: status == 200,
            response: Some(response),
            error: None,
        }
    }

    fn failed(batch_size: usize, duration_ms: u64, error: String) -> Self {
        Self {
            timestamp: utc_timestamp(),
            batch_size,
            duration_ms,
            status_code: None,
            success: false,
            response: None,
            error: Some(error),
        }
    }
}

/// Sends event batches to the configured endpoint. One instance is shared
/// by all workers; `reqwest::Client` pools connections internally.
pub struct Dispatcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl Dispatcher {
    pub fn new(config: &RunConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// POSTs one batch and classifies the result. Never fails: every
    /// transport error is folded into a failure outcome so the caller's
    /// loop keeps running. No retry, no timeout unless configured.
    pub async fn dispatch(&self, batch: &[EventRecord]) -> DispatchOutcome {
        let batch_size = batch.len();
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&BatchEnvelope { body: batch });
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let start = Instant::now();
        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                // Reading the body counts toward the measured duration.
                match response.text().await {
                    Ok(text) => {
                        let duration_ms = start.elapsed().as_millis() as u64;
                        let body = serde_json::from_str::<serde_json::Value>(&text)
                            .unwrap_or_else(|_| {
                                serde_json::Value::String(
                                    text.chars().take(RESPONSE_CAPTURE_CHARS).collect(),
                                )
                            });
                        DispatchOutcome::completed(batch_size, duration_ms, status, body)
                    }
                    Err(e) => {
                        let duration_ms = start.elapsed().as_millis() as u64;
                        DispatchOutcome::failed(batch_size, duration_ms, e.to_string())
                    }
                }
            }
            Err(e) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                DispatchOutcome::failed(batch_size, duration_ms, e.to_string())
            }
        }
    }
}
