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

//! Unified error taxonomy at the pipeline boundary.
//!
//! [`PipelineError::Moderation`] and
//! [`PipelineError::ContentViolation`] are the only failures worth a
//! dedicated end-user message; everything else is operational and
//! carries the provider task or request id for log correlation. The
//! pipeline swallows nothing; callers decide whether to retry.

use thiserror::Error;

use thumbforge_overlay::OverlayError;
use thumbforge_providers::{ModerationKind, ProviderError};
use thumbforge_storage::StorageError;
use thumbforge_db::StoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad input (dimensions, unknown preset, unconfigured subsystem).
    /// Raised before any network call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Polling provider at capacity.
    #[error("provider at capacity")]
    NoCapacity,

    /// Non-2xx or otherwise failed provider exchange.
    #[error("provider error {status} {status_text}")]
    Provider {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("task {task_id} moderated ({kind})")]
    Moderation {
        task_id: String,
        kind: ModerationKind,
    },

    #[error("content violation on request {request_id}")]
    ContentViolation { request_id: String },

    #[error("task {task_id} not ready after {attempts} attempts")]
    Timeout { task_id: String, attempts: u32 },

    #[error("download failed: {0}")]
    Download(String),

    #[error("overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("database error: {0}")]
    Db(StoreError),

    #[error("not found")]
    NotFound,
}

impl From<ProviderError> for PipelineError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NoCapacity => PipelineError::NoCapacity,
            ProviderError::Moderation { task_id, kind } => {
                PipelineError::Moderation { task_id, kind }
            }
            ProviderError::ContentViolation { request_id } => {
                PipelineError::ContentViolation { request_id }
            }
            ProviderError::Timeout { task_id, attempts } => {
                PipelineError::Timeout { task_id, attempts }
            }
            ProviderError::Download { url, status } => {
                PipelineError::Download(format!("{url} returned status {status}"))
            }
            ProviderError::Api {
                status,
                status_text,
                body,
            } => PipelineError::Provider {
                status,
                status_text,
                body,
            },
            ProviderError::Failed { task_id, detail } => PipelineError::Provider {
                status: 200,
                status_text: format!("task {task_id} failed"),
                body: detail,
            },
            ProviderError::MissingSample { task_id } => PipelineError::Provider {
                status: 200,
                status_text: format!("task {task_id} returned no sample url"),
                body: String::new(),
            },
            ProviderError::InvalidResponse(detail) => PipelineError::Provider {
                status: 200,
                status_text: "invalid provider response".to_string(),
                body: detail,
            },
            ProviderError::Config(detail) => PipelineError::InvalidRequest(detail),
            ProviderError::Http(e) => PipelineError::Provider {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                status_text: "transport error".to_string(),
                body: e.to_string(),
            },
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => PipelineError::NotFound,
            other => PipelineError::Db(other),
        }
    }
}
