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

//! Typed row mappings and store API types.
//!
//! Rows map one-to-one onto columns via `sqlx::FromRow`; a query that
//! stops returning an expected column fails at decode time instead of
//! silently dropping data.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use thumbforge_core::{Thumbnail, ThumbnailVersion};

/// One row of `generated_thumbnails`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ThumbnailRow {
    pub id: Uuid,
    pub readable_id: String,
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
    pub version: i32,
    pub parent_id: Option<Uuid>,
    pub feedback: Option<String>,
    pub metadata: serde_json::Value,
    pub generation_params: serde_json::Value,
    pub generated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<ThumbnailRow> for Thumbnail {
    fn from(row: ThumbnailRow) -> Self {
        Thumbnail {
            id: row.id,
            readable_id: row.readable_id,
            prompt: row.prompt,
            enhanced_prompt: row.enhanced_prompt,
            preset: row.preset,
            width: row.width,
            height: row.height,
            model: row.model,
            seed: row.seed,
            s3_bucket: row.s3_bucket,
            s3_key: row.s3_key,
            file_size_bytes: row.file_size_bytes,
            generation_time_ms: row.generation_time_ms,
            cost_cents: row.cost_cents,
            version: row.version,
            parent_id: row.parent_id,
            feedback: row.feedback,
            metadata: row.metadata,
            generation_params: row.generation_params,
            generated_by: row.generated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// One row of `thumbnail_versions`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VersionRow {
    pub id: i64,
    pub thumbnail_id: Uuid,
    pub version: i32,
    pub s3_key: Option<String>,
    pub s3_bucket: Option<String>,
    pub file_size_bytes: i64,
    pub prompt: String,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<VersionRow> for ThumbnailVersion {
    fn from(row: VersionRow) -> Self {
        ThumbnailVersion {
            id: row.id,
            thumbnail_id: row.thumbnail_id,
            version: row.version,
            s3_key: row.s3_key,
            s3_bucket: row.s3_bucket,
            file_size_bytes: row.file_size_bytes,
            prompt: row.prompt,
            feedback: row.feedback,
            created_at: row.created_at,
        }
    }
}

/// AND-composed listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbnailFilter {
    pub preset: Option<String>,
    pub model: Option<String>,
    pub generated_by: Option<String>,
    /// Case-insensitive substring match against prompt or enhanced
    /// prompt.
    pub search: Option<String>,
    /// Inclusive bounds on `created_at`.
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbnailUpdate {
    pub feedback: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Inputs for a version bump. `new_*` fields replace the artifact;
/// the optional fields overwrite their columns only when supplied.
#[derive(Debug, Clone, Deserialize)]
pub struct NewVersion {
    pub new_s3_key: String,
    pub new_s3_bucket: String,
    pub new_file_size_bytes: i64,
    pub new_prompt: Option<String>,
    pub feedback: Option<String>,
    pub generation_time_ms: Option<i64>,
    pub cost_cents: Option<i32>,
    pub seed: Option<i64>,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Pre-pagination row count.
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

/// Aggregates over non-deleted rows. Preset `NULL` reports under
/// `"custom"`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThumbnailStats {
    pub total: i64,
    pub by_preset: HashMap<String, i64>,
    pub by_model: HashMap<String, i64>,
    pub total_size_bytes: i64,
    pub total_cost_cents: i64,
}
