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

//! Synchronous provider client (Reve).
//!
//! The image comes back base64 encoded in the initial response of
//! `POST {base}/v1/image/{create|edit|remix}`. Auth is a bearer token.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Aspect ratio strings the provider accepts.
pub const ACCEPTED_ASPECT_RATIOS: &[&str] = &["16:9", "9:16", "3:2", "2:3", "4:3", "3:4", "1:1"];

const DEFAULT_BASE_URL: &str = "https://api.reve.com";

/// Reduce requested dimensions by gcd and return the provider ratio
/// string, falling back to `16:9` when the reduced ratio is not in the
/// accepted vocabulary.
pub fn reduce_aspect_ratio(width: u32, height: u32) -> String {
    fn gcd(a: u32, b: u32) -> u32 {
        if b == 0 {
            a
        } else {
            gcd(b, a % b)
        }
    }

    if width == 0 || height == 0 {
        return "16:9".to_string();
    }
    let d = gcd(width, height);
    let reduced = format!("{}:{}", width / d, height / d);
    if ACCEPTED_ASPECT_RATIOS.contains(&reduced.as_str()) {
        reduced
    } else {
        "16:9".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ReveConfig {
    pub api_key: String,
    pub base_url: Option<String>,
}

impl ReveConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }
}

/// Optional knobs shared by create/edit/remix.
#[derive(Debug, Clone, Default)]
pub struct ReveOptions {
    pub aspect_ratio: Option<String>,
    pub version: Option<String>,
    pub test_time_scaling: Option<u32>,
    pub postprocessing: Option<bool>,
}

/// Provider response. `image` is base64-encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct ReveResponse {
    pub image: String,
    pub version: String,
    #[serde(default)]
    pub content_violation: bool,
    pub request_id: String,
    #[serde(default)]
    pub credits_used: u32,
    #[serde(default)]
    pub credits_remaining: u32,
}

impl ReveResponse {
    /// Decode the base64 payload into raw image bytes.
    pub fn image_bytes(&self) -> Result<Vec<u8>, ProviderError> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.image)
            .map_err(|e| ProviderError::InvalidResponse(format!("bad base64 image: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instruction: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_time_scaling: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    postprocessing: Option<bool>,
}

impl<'a> ImageRequest<'a> {
    fn from_options(opts: &'a ReveOptions) -> Self {
        Self {
            prompt: None,
            instruction: None,
            reference_image: None,
            aspect_ratio: opts.aspect_ratio.as_deref(),
            version: opts.version.as_deref(),
            test_time_scaling: opts.test_time_scaling,
            postprocessing: opts.postprocessing,
        }
    }
}

/// Client for the synchronous provider. Safe for shared use.
#[derive(Clone, Debug)]
pub struct ReveClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ReveClient {
    pub fn new(config: ReveConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Config("Reve API key is required".into()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key,
        })
    }

    /// Generate a fresh image from a prompt.
    pub async fn create(
        &self,
        prompt: &str,
        opts: &ReveOptions,
    ) -> Result<ReveResponse, ProviderError> {
        let mut request = ImageRequest::from_options(opts);
        request.prompt = Some(prompt);
        self.call("create", &request).await
    }

    /// Apply an instruction to a reference image.
    pub async fn edit(
        &self,
        instruction: &str,
        reference_image: &str,
        opts: &ReveOptions,
    ) -> Result<ReveResponse, ProviderError> {
        let mut request = ImageRequest::from_options(opts);
        request.instruction = Some(instruction);
        request.reference_image = Some(reference_image);
        self.call("edit", &request).await
    }

    /// Re-generate in the style of a reference image.
    pub async fn remix(
        &self,
        prompt: &str,
        reference_image: &str,
        opts: &ReveOptions,
    ) -> Result<ReveResponse, ProviderError> {
        let mut request = ImageRequest::from_options(opts);
        request.prompt = Some(prompt);
        request.reference_image = Some(reference_image);
        self.call("remix", &request).await
    }

    async fn call(
        &self,
        operation: &str,
        request: &ImageRequest<'_>,
    ) -> Result<ReveResponse, ProviderError> {
        let response = self
            .http
            .post(format!("{}/v1/image/{}", self.base_url, operation))
            .bearer_auth(&self.api_key)
            .json(request)
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

        let payload: ReveResponse = response.json().await?;
        tracing::debug!(
            request_id = %payload.request_id,
            operation,
            credits_used = payload.credits_used,
            "synchronous generation complete"
        );

        if payload.content_violation {
            return Err(ProviderError::ContentViolation {
                request_id: payload.request_id,
            });
        }
        Ok(payload)
    }
}
