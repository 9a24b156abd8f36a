// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Polling provider client (BFL / Flux).
//!
//! Interaction model: `POST {base}/{model}` returns a task id, then
//! `GET {base}/get_result?id={task_id}` is polled until a terminal
//! status. A [`tokio::sync::Semaphore`] caps in-flight tasks; the permit
//! rides on the [`TaskHandle`] so every terminal branch (success, any
//! error, or caller cancellation) releases exactly once when the handle
//! drops.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{ModerationKind, ProviderError};

/// Default in-flight task cap.
pub const DEFAULT_MAX_CONCURRENT: usize = 24;

const API_KEY_HEADER: &str = "x-key";

/// Regional API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BflRegion {
    #[default]
    Global,
    Eu,
    Us,
}

impl BflRegion {
    pub fn base_url(self) -> &'static str {
        match self {
            BflRegion::Global => "https://api.bfl.ai",
            BflRegion::Eu => "https://api.eu.bfl.ai",
            BflRegion::Us => "https://api.us.bfl.ai",
        }
    }

    /// Parse the `FLUX_API_REGION` value. Unknown strings fall back to
    /// the global endpoint.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "eu" => BflRegion::Eu,
            "us" => BflRegion::Us,
            _ => BflRegion::Global,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BflConfig {
    pub api_key: String,
    pub region: BflRegion,
    /// Overrides the regional endpoint when set.
    pub base_url: Option<String>,
    pub max_concurrent: usize,
}

impl BflConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            region: BflRegion::Global,
            base_url: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

/// Generation parameters for the create call. Serialized snake_case to
/// match the provider wire format.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageParams {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_tolerance: Option<u8>,
}

/// Observed task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TaskStatus {
    Ready,
    Pending,
    Error,
    #[serde(rename = "Request Moderated")]
    RequestModerated,
    #[serde(rename = "Content Moderated")]
    ContentModerated,
    #[serde(other)]
    Unknown,
}

/// Terminal payload of a ready task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResult {
    /// Signed URL of the generated image.
    pub sample: Option<String>,
    /// Seed the provider actually used.
    pub seed: Option<i64>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// A reserved concurrency slot plus the provider task id. Dropping the
/// handle releases the slot.
#[derive(Debug)]
pub struct TaskHandle {
    pub id: String,
    pub polling_url: Option<String>,
    _permit: OwnedSemaphorePermit,
}

/// Polling cadence. Defaults: 60 attempts, 2 s apart.
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(2),
        }
    }
}

/// The result of `generate_and_download`.
#[derive(Debug)]
pub struct GeneratedImage {
    pub task_id: String,
    pub result: TaskResult,
    pub bytes: bytes::Bytes,
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    id: String,
    #[serde(default)]
    polling_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    status: TaskStatus,
    #[serde(default)]
    result: Option<TaskResult>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Concurrency-limited client for the polling provider.
///
/// Safe for shared use across tasks; clone freely.
#[derive(Clone, Debug)]
pub struct BflClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    slots: Arc<Semaphore>,
    max_concurrent: usize,
}

impl BflClient {
    /// Missing API key is a construction-time failure.
    pub fn new(config: BflConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Config("BFL API key is required".into()));
        }
        let base_url = config
            .base_url
            .unwrap_or_else(|| config.region.base_url().to_string());
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            slots: Arc::new(Semaphore::new(config.max_concurrent)),
            max_concurrent: config.max_concurrent,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of reserved concurrency slots.
    pub fn active_tasks(&self) -> usize {
        self.max_concurrent - self.slots.available_permits()
    }

    /// Submit a generation task.
    ///
    /// Fails with [`ProviderError::NoCapacity`] before any network call
    /// when all slots are taken. On transport or HTTP failure the slot
    /// is released before the error is returned.
    pub async fn create(
        &self,
        model: &str,
        params: &ImageParams,
    ) -> Result<TaskHandle, ProviderError> {
        let permit = Arc::clone(&self.slots)
            .try_acquire_owned()
            .map_err(|_| ProviderError::NoCapacity)?;

        let response = self
            .http
            .post(format!("{}/{}", self.base_url, model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let task: CreateTaskResponse = response.json().await?;
        tracing::debug!(task_id = %task.id, model, "submitted generation task");

        Ok(TaskHandle {
            id: task.id,
            polling_url: task.polling_url,
            _permit: permit,
        })
    }

    /// Poll until a terminal status, consuming the handle. The slot is
    /// released on every exit path, including cancellation mid-poll.
    ///
    /// Transport errors are not retried; a single failure terminates the
    /// poll.
    pub async fn poll(
        &self,
        task: TaskHandle,
        opts: &PollOptions,
    ) -> Result<TaskResult, ProviderError> {
        let TaskHandle {
            id: task_id,
            polling_url,
            _permit,
        } = task;
        let url = polling_url.unwrap_or_else(|| format!("{}/get_result", self.base_url));

        for attempt in 1..=opts.max_attempts {
            let response = self
                .http
                .get(&url)
                .query(&[("id", task_id.as_str())])
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or("").to_string(),
                    body: response.text().await.unwrap_or_default(),
                });
            }

            let poll: PollResponse = response.json().await?;
            tracing::debug!(task_id = %task_id, attempt, status = ?poll.status, "poll");

            match poll.status {
                TaskStatus::Ready => {
                    return poll.result.ok_or_else(|| {
                        ProviderError::InvalidResponse(format!(
                            "task {task_id} is ready but the result payload is missing"
                        ))
                    });
                }
                TaskStatus::Error => {
                    let detail = poll
                        .details
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "no details".to_string());
                    return Err(ProviderError::Failed { task_id, detail });
                }
                TaskStatus::RequestModerated => {
                    return Err(ProviderError::Moderation {
                        task_id,
                        kind: ModerationKind::Request,
                    });
                }
                TaskStatus::ContentModerated => {
                    return Err(ProviderError::Moderation {
                        task_id,
                        kind: ModerationKind::Content,
                    });
                }
                TaskStatus::Pending | TaskStatus::Unknown => {
                    if attempt < opts.max_attempts {
                        tokio::time::sleep(opts.interval).await;
                    }
                }
            }
        }

        Err(ProviderError::Timeout {
            task_id,
            attempts: opts.max_attempts,
        })
    }

    /// Single non-blocking probe. Does not touch the concurrency slot.
    pub async fn status(&self, task_id: &str) -> Result<TaskStatus, ProviderError> {
        let response = self
            .http
            .get(format!("{}/get_result", self.base_url))
            .query(&[("id", task_id)])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let poll: PollResponse = response.json().await?;
        Ok(poll.status)
    }

    /// Fetch generated image bytes from the sample URL.
    pub async fn download(&self, url: &str) -> Result<bytes::Bytes, ProviderError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Download {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?)
    }

    /// Create and poll to completion.
    pub async fn generate(
        &self,
        model: &str,
        params: &ImageParams,
        opts: &PollOptions,
    ) -> Result<(TaskResult, String), ProviderError> {
        let task = self.create(model, params).await?;
        let task_id = task.id.clone();
        let result = self.poll(task, opts).await?;
        Ok((result, task_id))
    }

    /// Create, poll, and download the sample.
    pub async fn generate_and_download(
        &self,
        model: &str,
        params: &ImageParams,
        opts: &PollOptions,
    ) -> Result<GeneratedImage, ProviderError> {
        let (result, task_id) = self.generate(model, params, opts).await?;
        let sample = result
            .sample
            .clone()
            .ok_or_else(|| ProviderError::MissingSample {
                task_id: task_id.clone(),
            })?;
        let bytes = self.download(&sample).await?;
        Ok(GeneratedImage {
            task_id,
            result,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard, max_concurrent: usize) -> BflClient {
        BflClient::new(BflConfig {
            api_key: "test-key".into(),
            region: BflRegion::Global,
            base_url: Some(server.url()),
            max_concurrent,
        })
        .unwrap()
    }

    fn fast_poll(max_attempts: u32) -> PollOptions {
        PollOptions {
            max_attempts,
            interval: Duration::from_millis(1),
        }
    }

    #[test]
    fn missing_api_key_fails_at_construction() {
        let err = BflClient::new(BflConfig::new("")).unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn regional_endpoints() {
        assert_eq!(BflRegion::parse("eu").base_url(), "https://api.eu.bfl.ai");
        assert_eq!(BflRegion::parse("us").base_url(), "https://api.us.bfl.ai");
        assert_eq!(BflRegion::parse("anything").base_url(), "https://api.bfl.ai");

        let client = BflClient::new(BflConfig {
            api_key: "k".into(),
            region: BflRegion::Eu,
            base_url: Some("https://override.example".into()),
            max_concurrent: 1,
        })
        .unwrap();
        assert_eq!(client.base_url(), "https://override.example");
    }

    #[tokio::test]
    async fn capacity_exhaustion_is_synchronous() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/flux-2-pro")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"task-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, 1);
        let params = ImageParams {
            prompt: "p".into(),
            width: 64,
            height: 64,
            ..Default::default()
        };

        let handle = client.create("flux-2-pro", &params).await.unwrap();
        assert_eq!(client.active_tasks(), 1);

        // Second call observes NoCapacity without any HTTP traffic.
        let err = client.create("flux-2-pro", &params).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoCapacity));

        drop(handle);
        assert_eq!(client.active_tasks(), 0);
        create.assert_async().await;
    }

    #[tokio::test]
    async fn generate_and_download_happy_path() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/flux-2-pro")
            .match_header("x-key", "test-key")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"task-7"}"#)
            .create_async()
            .await;
        let sample_url = format!("{}/sample.png", server.url());
        server
            .mock("GET", "/get_result")
            .match_query(Matcher::UrlEncoded("id".into(), "task-7".into()))
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"status":"Ready","result":{{"sample":"{sample_url}","seed":42}}}}"#
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/sample.png")
            .with_body(b"png-bytes".as_slice())
            .create_async()
            .await;

        let client = client_for(&server, 2);
        let params = ImageParams {
            prompt: "abstract pattern".into(),
            width: 1280,
            height: 720,
            ..Default::default()
        };

        let generated = client
            .generate_and_download("flux-2-pro", &params, &fast_poll(3))
            .await
            .unwrap();

        assert_eq!(generated.task_id, "task-7");
        assert_eq!(generated.result.seed, Some(42));
        assert_eq!(generated.bytes.as_ref(), b"png-bytes");
        assert_eq!(client.active_tasks(), 0);
    }

    #[tokio::test]
    async fn moderation_stops_polling_and_releases_slot() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/flux-2-pro")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"task-3"}"#)
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/get_result")
            .match_query(Matcher::UrlEncoded("id".into(), "task-3".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"Content Moderated"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, 1);
        let params = ImageParams {
            prompt: "p".into(),
            width: 64,
            height: 64,
            ..Default::default()
        };

        let err = client
            .generate("flux-2-pro", &params, &fast_poll(10))
            .await
            .unwrap_err();

        match err {
            ProviderError::Moderation { task_id, kind } => {
                assert_eq!(task_id, "task-3");
                assert_eq!(kind, ModerationKind::Content);
            }
            other => panic!("expected moderation error, got {other:?}"),
        }
        assert_eq!(client.active_tasks(), 0);
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn exhausted_attempt_budget_is_a_timeout() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/flux-dev")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"task-9"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/get_result")
            .match_query(Matcher::UrlEncoded("id".into(), "task-9".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"Pending"}"#)
            .expect(3)
            .create_async()
            .await;

        let client = client_for(&server, 1);
        let params = ImageParams {
            prompt: "p".into(),
            width: 64,
            height: 64,
            ..Default::default()
        };

        let err = client
            .generate("flux-dev", &params, &fast_poll(3))
            .await
            .unwrap_err();

        match err {
            ProviderError::Timeout { task_id, attempts } => {
                assert_eq!(task_id, "task-9");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(client.active_tasks(), 0);
    }

    #[tokio::test]
    async fn create_failure_releases_slot() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/flux-2-pro")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = client_for(&server, 1);
        let params = ImageParams {
            prompt: "p".into(),
            width: 64,
            height: 64,
            ..Default::default()
        };

        let err = client.create("flux-2-pro", &params).await.unwrap_err();
        match err {
            ProviderError::Api { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected api error, got {other:?}"),
        }
        assert_eq!(client.active_tasks(), 0);
    }

    #[tokio::test]
    async fn ready_without_sample_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/flux-2-pro")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"task-5"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/get_result")
            .match_query(Matcher::UrlEncoded("id".into(), "task-5".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"Ready","result":{"seed":7}}"#)
            .create_async()
            .await;

        let client = client_for(&server, 1);
        let params = ImageParams {
            prompt: "p".into(),
            width: 64,
            height: 64,
            ..Default::default()
        };

        let err = client
            .generate_and_download("flux-2-pro", &params, &fast_poll(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingSample { .. }));
        assert_eq!(client.active_tasks(), 0);
    }

    #[tokio::test]
    async fn status_probe_does_not_reserve_a_slot() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get_result")
            .match_query(Matcher::UrlEncoded("id".into(), "task-2".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"Pending"}"#)
            .create_async()
            .await;

        let client = client_for(&server, 1);
        let status = client.status("task-2").await.unwrap();
        assert_eq!(status, TaskStatus::Pending);
        assert_eq!(client.active_tasks(), 0);
    }

    #[tokio::test]
    async fn provider_reported_failure_carries_details() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/flux-2-pro")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"task-4"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/get_result")
            .match_query(Matcher::UrlEncoded("id".into(), "task-4".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"Error","details":{"reason":"nsfw classifier crashed"}}"#)
            .create_async()
            .await;

        let client = client_for(&server, 1);
        let params = ImageParams {
            prompt: "p".into(),
            width: 64,
            height: 64,
            ..Default::default()
        };

        let err = client
            .generate("flux-2-pro", &params, &fast_poll(2))
            .await
            .unwrap_err();
        match err {
            ProviderError::Failed { task_id, detail } => {
                assert_eq!(task_id, "task-4");
                assert!(detail.contains("nsfw classifier crashed"));
            }
            other => panic!("expected failed task, got {other:?}"),
        }
        assert_eq!(client.active_tasks(), 0);
    }
}
