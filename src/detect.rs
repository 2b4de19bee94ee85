use anyhow::Result;
use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Outcome of a single detection call, carried as a value: callers treat
/// `Failed` as "zero detections for this unit" and continue.
#[derive(Debug, Clone)]
pub enum DetectionOutcome {
    Detected(Value),
    Failed(String),
}

impl DetectionOutcome {
    /// Plaque identifiers from the response body. An absent `plaques` key is
    /// an empty sequence; a failed call is `None` ("no data").
    pub fn plaques(&self) -> Option<Vec<String>> {
        match self {
            DetectionOutcome::Detected(body) => Some(
                body.get("plaques")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            DetectionOutcome::Failed(_) => None,
        }
    }
}

/// Blocking client for the remote plaque-detection endpoint.
pub struct DetectionClient {
    endpoint: String,
    http: Client,
}

impl DetectionClient {
    /// Create a new client targeting the provided endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit one encoded image as multipart field `image`. A single
    /// best-effort attempt: no retry, no backoff.
    pub fn detect(&self, bytes: Vec<u8>, filename: &str, mime: &str) -> DetectionOutcome {
        match self.try_detect(bytes, filename, mime) {
            Ok(outcome) => outcome,
            Err(e) => DetectionOutcome::Failed(e.to_string()),
        }
    }

    fn try_detect(&self, bytes: Vec<u8>, filename: &str, mime: &str) -> Result<DetectionOutcome> {
        let part = multipart::Part::bytes(bytes)
            .mime_str(mime)?
            .file_name(filename.to_string());
        let form = multipart::Form::new().part("image", part);

        let response = self.http.post(&self.endpoint).multipart(form).send()?;

        if response.status() == StatusCode::OK {
            let body: Value = response.json()?;
            Ok(DetectionOutcome::Detected(body))
        } else {
            Ok(DetectionOutcome::Failed(format!(
                "API request failed. Status code: {}",
                response.status().as_u16()
            )))
        }
    }
}
