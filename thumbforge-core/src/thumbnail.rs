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

//! Persisted thumbnail entities.
//!
//! A [`Thumbnail`] owns its version history: every version bump archives
//! the superseded artifact into a [`ThumbnailVersion`] row, so a
//! thumbnail at version N has N-1 version rows. `parent_id` is a weak
//! back-reference used only for lookup, never ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The persisted entity, one row in `generated_thumbnails`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub id: Uuid,
    /// Human-friendly handle, e.g. `TH-K7M2QX`. Unique among live rows.
    pub readable_id: String,

    pub prompt: String,
    /// Stored only when enhancement actually changed the prompt.
    pub enhanced_prompt: Option<String>,
    pub preset: Option<String>,
    pub width: i32,
    pub height: i32,
    pub model: String,
    pub seed: Option<i64>,

    pub s3_bucket: Option<String>,
    pub s3_key: Option<String>,
    pub file_size_bytes: i64,

    pub generation_time_ms: i64,
    pub cost_cents: i32,

    /// Starts at 1; equals 1 + the number of archived version rows.
    pub version: i32,
    pub parent_id: Option<Uuid>,

    pub feedback: Option<String>,
    pub metadata: serde_json::Value,
    /// Backend choice, original prompt, and other generation context.
    pub generation_params: serde_json::Value,
    pub generated_by: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete tombstone; once set the row is invisible to the
    /// public read surface.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An archived artifact, one row in `thumbnail_versions`. Immutable
/// after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailVersion {
    pub id: i64,
    pub thumbnail_id: Uuid,
    /// The version this row archived, i.e. the thumbnail's version
    /// before the bump that created it.
    pub version: i32,
    pub s3_key: Option<String>,
    pub s3_bucket: Option<String>,
    pub file_size_bytes: i64,
    pub prompt: String,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable record assembled by the pipeline; the metadata store adds
/// identity and lifecycle fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewThumbnail {
    pub prompt: String,
    pub enhanced_prompt: Option<String>,
    pub preset: Option<String>,
    pub width: i32,
    pub height: i32,
    pub model: String,
    pub seed: Option<i64>,
    pub s3_bucket: Option<String>,
    pub s3_key: Option<String>,
    pub file_size_bytes: i64,
    pub generation_time_ms: i64,
    pub cost_cents: i32,
    pub parent_id: Option<Uuid>,
    pub feedback: Option<String>,
    #[serde(default = "empty_object")]
    pub metadata: serde_json::Value,
    #[serde(default = "empty_object")]
    pub generation_params: serde_json::Value,
    #[serde(default = "default_generated_by")]
    pub generated_by: String,
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

fn default_generated_by() -> String {
    "user".to_string()
}

impl Default for NewThumbnail {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            enhanced_prompt: None,
            preset: None,
            width: 0,
            height: 0,
            model: String::new(),
            seed: None,
            s3_bucket: None,
            s3_key: None,
            file_size_bytes: 0,
            generation_time_ms: 0,
            cost_cents: 0,
            parent_id: None,
            feedback: None,
            metadata: empty_object(),
            generation_params: empty_object(),
            generated_by: default_generated_by(),
        }
    }
}
