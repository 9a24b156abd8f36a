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

//! Typed error taxonomy for provider interactions.

use thiserror::Error;

/// Which moderation gate rejected the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationKind {
    /// Rejected before generation ("Request Moderated").
    Request,
    /// Rejected after generation ("Content Moderated").
    Content,
}

impl std::fmt::Display for ModerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationKind::Request => write!(f, "request"),
            ModerationKind::Content => write!(f, "content"),
        }
    }
}

/// Errors from provider clients.
///
/// Moderation and content violations are the only failures worth a
/// dedicated end-user message; everything else is operational and
/// carries the provider's task or request id for log correlation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The polling client is at its in-flight cap. Raised synchronously,
    /// before any network traffic.
    #[error("provider at capacity")]
    NoCapacity,

    #[error("provider configuration: {0}")]
    Config(String),

    /// Non-2xx response from the provider; raw body kept for logs.
    #[error("provider returned {status} {status_text}")]
    Api {
        status: u16,
        status_text: String,
        body: String,
    },

    /// The provider reported the task itself failed.
    #[error("task {task_id} failed: {detail}")]
    Failed { task_id: String, detail: String },

    #[error("task {task_id} moderated ({kind})")]
    Moderation {
        task_id: String,
        kind: ModerationKind,
    },

    #[error("content violation on request {request_id}")]
    ContentViolation { request_id: String },

    #[error("task {task_id} not ready after {attempts} attempts")]
    Timeout { task_id: String, attempts: u32 },

    #[error("download of {url} failed with status {status}")]
    Download { url: String, status: u16 },

    #[error("task {task_id} is ready but has no sample url")]
    MissingSample { task_id: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
