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

//! The generation service.
//!
//! One entry point: [`ThumbnailPipeline::generate`]. The two provider
//! clients stay concrete types and the service branches on the selected
//! backend; there is no provider trait. Persistence of the returned
//! record is the caller's responsibility.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use thumbforge_core::{enhance, BrandGuidelines, NewThumbnail, PresetRegistry};
use thumbforge_overlay::{render, Compositor, OutputFormat, OverlaySpec, ResvgCompositor};
use thumbforge_providers::bfl::{BflClient, ImageParams, PollOptions};
use thumbforge_providers::reve::{reduce_aspect_ratio, ReveClient, ReveOptions};
use thumbforge_storage::{object_key, ObjectStore};

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Provider-enforced ceiling on either dimension.
pub const MAX_DIMENSION: u32 = 4096;

/// Which provider fulfills the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Polling,
    #[default]
    Synchronous,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Polling => write!(f, "polling"),
            Backend::Synchronous => write!(f, "synchronous"),
        }
    }
}

/// User-facing generation request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    pub prompt: String,
    pub preset_id: Option<String>,
    /// Explicit dimensions override the preset.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub model: Option<String>,
    pub backend: Option<Backend>,
    /// Defaults to true.
    pub enhance_prompt: Option<bool>,
    /// Defaults to true.
    pub store_result: Option<bool>,
    pub seed: Option<i64>,
    pub safety_tolerance: Option<u8>,
    pub metadata: Option<serde_json::Value>,
    /// When present, the overlay is rendered and composited before
    /// upload.
    pub overlay: Option<OverlaySpec>,
    pub generated_by: Option<String>,
    pub parent_id: Option<Uuid>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// A finished generation: persistence-ready record plus the bytes.
#[derive(Debug)]
pub struct Generated {
    pub record: NewThumbnail,
    pub bytes: Vec<u8>,
}

/// Orchestrates presets, enhancement, providers, overlay, and storage.
/// Safe for shared use across tasks.
pub struct ThumbnailPipeline {
    presets: PresetRegistry,
    brand: BrandGuidelines,
    bfl: Option<BflClient>,
    reve: Option<ReveClient>,
    store: Option<ObjectStore>,
    compositor: Arc<dyn Compositor>,
    poll_options: PollOptions,
    default_model: String,
}

impl ThumbnailPipeline {
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let bfl = config.bfl.map(BflClient::new).transpose()?;
        let reve = config.reve.map(ReveClient::new).transpose()?;
        let store = config
            .s3
            .as_ref()
            .map(ObjectStore::new)
            .transpose()?;
        Ok(Self {
            presets: PresetRegistry::new(),
            brand: BrandGuidelines::default(),
            bfl,
            reve,
            store,
            compositor: Arc::new(ResvgCompositor::new()),
            poll_options: PollOptions::default(),
            default_model: if config.default_model.is_empty() {
                crate::config::DEFAULT_MODEL.to_string()
            } else {
                config.default_model
            },
        })
    }

    pub fn with_brand(mut self, brand: BrandGuidelines) -> Self {
        self.brand = brand;
        self
    }

    /// Swap the rasterizer, e.g. for a stub in tests.
    pub fn with_compositor(mut self, compositor: Arc<dyn Compositor>) -> Self {
        self.compositor = compositor;
        self
    }

    pub fn with_poll_options(mut self, poll_options: PollOptions) -> Self {
        self.poll_options = poll_options;
        self
    }

    /// Generate a thumbnail and return the persistence-ready record
    /// plus the final bytes.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<Generated, PipelineError> {
        if request.prompt.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("prompt is required".into()));
        }

        let preset = match &request.preset_id {
            Some(id) => Some(self.presets.get(id).ok_or_else(|| {
                PipelineError::InvalidRequest(format!("unknown preset: {id}"))
            })?),
            None => None,
        };

        let (width, height) = match preset {
            Some(p) => self
                .presets
                .resolve_dimensions(p, request.width, request.height),
            None => match (request.width, request.height) {
                (Some(w), Some(h)) => (w, h),
                _ => {
                    return Err(PipelineError::InvalidRequest(
                        "width and height are required without a preset".into(),
                    ))
                }
            },
        };
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidRequest(
                "dimensions must be positive".into(),
            ));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(PipelineError::InvalidRequest(format!(
                "dimensions exceed the {MAX_DIMENSION}px provider maximum"
            )));
        }

        let model = request
            .model
            .clone()
            .or_else(|| preset.map(|p| p.default_model.to_string()))
            .unwrap_or_else(|| self.default_model.clone());

        let enhanced = if request.enhance_prompt != Some(false) {
            let candidate = enhance(&request.prompt, preset, &self.brand);
            (candidate != request.prompt).then_some(candidate)
        } else {
            None
        };
        let final_prompt = enhanced.as_deref().unwrap_or(&request.prompt);

        let backend = request.backend.unwrap_or_default();
        tracing::info!(
            backend = %backend,
            model = %model,
            width,
            height,
            preset = request.preset_id.as_deref().unwrap_or("custom"),
            "generating thumbnail"
        );

        let started = Instant::now();
        let (mut bytes, seed) = match backend {
            Backend::Polling => {
                let client = self.bfl.as_ref().ok_or_else(|| {
                    PipelineError::InvalidRequest(
                        "polling backend is not configured (BFL_API_KEY)".into(),
                    )
                })?;
                let params = ImageParams {
                    prompt: final_prompt.to_string(),
                    width,
                    height,
                    seed: request.seed,
                    safety_tolerance: request.safety_tolerance,
                };
                let generated = client
                    .generate_and_download(&model, &params, &self.poll_options)
                    .await?;
                (generated.bytes.to_vec(), generated.result.seed)
            }
            Backend::Synchronous => {
                let client = self.reve.as_ref().ok_or_else(|| {
                    PipelineError::InvalidRequest(
                        "synchronous backend is not configured (REVE_API_KEY)".into(),
                    )
                })?;
                let options = ReveOptions {
                    aspect_ratio: Some(reduce_aspect_ratio(width, height)),
                    ..Default::default()
                };
                let response = client.create(final_prompt, &options).await?;
                (response.image_bytes()?, Some(0))
            }
        };
        let generation_time_ms = started.elapsed().as_millis() as i64;

        if let Some(overlay) = &request.overlay {
            let mut spec = overlay.clone();
            spec.width = width;
            spec.height = height;
            let svg = render(&spec);
            bytes = self
                .compositor
                .compose(&bytes, &svg, width, height, OutputFormat::Png)?;
        }

        let (s3_bucket, s3_key) = if request.store_result != Some(false) {
            let store = self.store.as_ref().ok_or_else(|| {
                PipelineError::InvalidRequest(
                    "object storage is not configured (S3_ENDPOINT / S3_ACCESS_KEY_ID / S3_SECRET_ACCESS_KEY)"
                        .into(),
                )
            })?;
            // Temporary id names version 1 of the object; the row id is
            // assigned by the metadata store at insert.
            let temp_id = Uuid::new_v4();
            let key = object_key(
                request.preset_id.as_deref(),
                &temp_id.to_string(),
                1,
                Utc::now(),
            );
            let put = store.put(&key, &bytes, None).await?;
            tracing::info!(key = %put.key, size = bytes.len(), "uploaded thumbnail");
            (Some(put.bucket), Some(put.key))
        } else {
            (None, None)
        };

        let cost_cents = match backend {
            Backend::Polling => thumbforge_core::pricing::cost_cents(&model),
            Backend::Synchronous => 0,
        };

        let record = NewThumbnail {
            prompt: request.prompt.clone(),
            enhanced_prompt: enhanced,
            preset: request.preset_id.clone(),
            width: width as i32,
            height: height as i32,
            model: model.clone(),
            seed,
            s3_bucket,
            s3_key,
            file_size_bytes: bytes.len() as i64,
            generation_time_ms,
            cost_cents,
            parent_id: request.parent_id,
            feedback: None,
            metadata: request.metadata.clone().unwrap_or_else(|| json!({})),
            generation_params: json!({
                "backend": backend.to_string(),
                "original_prompt": request.prompt,
                "preset": request.preset_id,
                "model": model,
                "overlay": request.overlay.is_some(),
            }),
            generated_by: request
                .generated_by
                .clone()
                .unwrap_or_else(|| "user".to_string()),
        };

        Ok(Generated { record, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use std::time::Duration;
    use thumbforge_overlay::OverlayError;
    use thumbforge_providers::bfl::{BflConfig, BflRegion};
    use thumbforge_providers::reve::ReveConfig;

    /// Passes the base image through untouched and marks that it ran.
    struct StubCompositor;

    impl Compositor for StubCompositor {
        fn compose(
            &self,
            base_image: &[u8],
            _overlay_svg: &str,
            _width: u32,
            _height: u32,
            _format: OutputFormat,
        ) -> Result<Vec<u8>, OverlayError> {
            let mut out = b"composited:".to_vec();
            out.extend_from_slice(base_image);
            Ok(out)
        }
    }

    fn pipeline(bfl: Option<BflClient>, reve: Option<ReveClient>) -> ThumbnailPipeline {
        ThumbnailPipeline {
            presets: PresetRegistry::new(),
            brand: BrandGuidelines::default(),
            bfl,
            reve,
            store: None,
            compositor: Arc::new(StubCompositor),
            poll_options: PollOptions {
                max_attempts: 5,
                interval: Duration::from_millis(1),
            },
            default_model: "reve-create".to_string(),
        }
    }

    fn reve_client(server: &mockito::ServerGuard) -> ReveClient {
        ReveClient::new(ReveConfig {
            api_key: "reve-key".into(),
            base_url: Some(server.url()),
        })
        .unwrap()
    }

    fn bfl_client(server: &mockito::ServerGuard) -> BflClient {
        BflClient::new(BflConfig {
            api_key: "bfl-key".into(),
            region: BflRegion::Global,
            base_url: Some(server.url()),
            max_concurrent: 4,
        })
        .unwrap()
    }

    fn reve_body(image: &[u8]) -> String {
        format!(
            r#"{{"image":"{}","version":"reve-create@1","content_violation":false,"request_id":"req-1","credits_used":1,"credits_remaining":10}}"#,
            base64::engine::general_purpose::STANDARD.encode(image)
        )
    }

    #[tokio::test]
    async fn synchronous_happy_path_with_preset() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/image/create")
            .with_header("content-type", "application/json")
            .with_body(reve_body(b"sync-image"))
            .create_async()
            .await;

        let pipeline = pipeline(None, Some(reve_client(&server)));
        let request = GenerateRequest {
            preset_id: Some("og-image".into()),
            store_result: Some(false),
            ..GenerateRequest::new("modern laptop on desk")
        };

        let generated = pipeline.generate(&request).await.unwrap();
        let record = generated.record;

        assert_eq!((record.width, record.height), (1200, 630));
        assert_eq!(record.model, "reve-create");
        assert_eq!(record.cost_cents, 0);
        assert_eq!(record.seed, Some(0));
        assert_eq!(generated.bytes, b"sync-image");
        assert_eq!(record.file_size_bytes, b"sync-image".len() as i64);

        let enhanced = record.enhanced_prompt.expect("enhancement on by default");
        assert!(enhanced.starts_with("modern laptop on desk"));
        assert_eq!(record.prompt, "modern laptop on desk");

        assert_eq!(record.generation_params["backend"], "synchronous");
        assert_eq!(record.generation_params["original_prompt"], "modern laptop on desk");
        assert_eq!(record.generation_params["preset"], "og-image");
        assert!(record.s3_key.is_none());
    }

    #[tokio::test]
    async fn polling_happy_path_records_cost_and_seed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/flux-2-pro")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"task-1"}"#)
            .create_async()
            .await;
        let sample_url = format!("{}/sample.png", server.url());
        server
            .mock("GET", "/get_result")
            .match_query(mockito::Matcher::UrlEncoded("id".into(), "task-1".into()))
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"status":"Ready","result":{{"sample":"{sample_url}","seed":981723}}}}"#
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/sample.png")
            .with_body(b"flux-image".as_slice())
            .create_async()
            .await;

        let pipeline = pipeline(Some(bfl_client(&server)), None);
        let request = GenerateRequest {
            preset_id: Some("youtube".into()),
            backend: Some(Backend::Polling),
            model: Some("flux-2-pro".into()),
            store_result: Some(false),
            ..GenerateRequest::new("abstract geometric pattern")
        };

        let generated = pipeline.generate(&request).await.unwrap();
        let record = generated.record;

        assert_eq!((record.width, record.height), (1280, 720));
        assert_eq!(record.cost_cents, 5);
        assert_eq!(record.seed, Some(981723));
        assert_eq!(record.generation_params["backend"], "polling");
        assert_eq!(generated.bytes, b"flux-image");
    }

    #[tokio::test]
    async fn moderation_propagates_and_releases_capacity() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/flux-2-pro")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"task-m"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/get_result")
            .match_query(mockito::Matcher::UrlEncoded("id".into(), "task-m".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"Content Moderated"}"#)
            .create_async()
            .await;

        let client = bfl_client(&server);
        let pipeline = pipeline(Some(client.clone()), None);
        let request = GenerateRequest {
            width: Some(1024),
            height: Some(1024),
            backend: Some(Backend::Polling),
            model: Some("flux-2-pro".into()),
            store_result: Some(false),
            ..GenerateRequest::new("something borderline")
        };

        let err = pipeline.generate(&request).await.unwrap_err();
        match err {
            PipelineError::Moderation { task_id, .. } => assert_eq!(task_id, "task-m"),
            other => panic!("expected moderation, got {other:?}"),
        }
        assert_eq!(client.active_tasks(), 0);
    }

    #[tokio::test]
    async fn validation_happens_before_any_network_call() {
        let pipeline = pipeline(None, None);

        let err = pipeline
            .generate(&GenerateRequest {
                width: Some(0),
                height: Some(100),
                ..GenerateRequest::new("p")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));

        let err = pipeline
            .generate(&GenerateRequest {
                preset_id: Some("not-a-preset".into()),
                ..GenerateRequest::new("p")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));

        let err = pipeline
            .generate(&GenerateRequest::new("p"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));

        let err = pipeline
            .generate(&GenerateRequest {
                width: Some(8192),
                height: Some(100),
                ..GenerateRequest::new("p")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn unconfigured_backend_is_an_invalid_request() {
        let pipeline = pipeline(None, None);
        let err = pipeline
            .generate(&GenerateRequest {
                width: Some(512),
                height: Some(512),
                backend: Some(Backend::Polling),
                store_result: Some(false),
                ..GenerateRequest::new("p")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn storing_without_object_store_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/image/create")
            .with_header("content-type", "application/json")
            .with_body(reve_body(b"x"))
            .create_async()
            .await;

        let pipeline = pipeline(None, Some(reve_client(&server)));
        let err = pipeline
            .generate(&GenerateRequest {
                width: Some(512),
                height: Some(512),
                ..GenerateRequest::new("p")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn overlay_is_composited_when_requested() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/image/create")
            .with_header("content-type", "application/json")
            .with_body(reve_body(b"base"))
            .create_async()
            .await;

        let pipeline = pipeline(None, Some(reve_client(&server)));
        let request = GenerateRequest {
            width: Some(1000),
            height: Some(1000),
            store_result: Some(false),
            overlay: Some(OverlaySpec::default()),
            ..GenerateRequest::new("p")
        };

        let generated = pipeline.generate(&request).await.unwrap();
        assert_eq!(generated.bytes, b"composited:base");
        assert_eq!(generated.record.generation_params["overlay"], true);
    }

    #[tokio::test]
    async fn aspect_ratio_is_reduced_for_the_synchronous_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/image/create")
            .match_body(mockito::Matcher::PartialJson(json!({
                "aspect_ratio": "1:1"
            })))
            .with_header("content-type", "application/json")
            .with_body(reve_body(b"square"))
            .create_async()
            .await;

        let pipeline = pipeline(None, Some(reve_client(&server)));
        let request = GenerateRequest {
            width: Some(1000),
            height: Some(1000),
            store_result: Some(false),
            enhance_prompt: Some(false),
            ..GenerateRequest::new("square image")
        };

        let generated = pipeline.generate(&request).await.unwrap();
        // Enhancement disabled: no enhanced prompt is recorded.
        assert!(generated.record.enhanced_prompt.is_none());
        mock.assert_async().await;
    }
}
