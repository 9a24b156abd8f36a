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

//! PostgreSQL metadata store.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use thumbforge_core::readable_id::generate_readable_id;
use thumbforge_core::{NewThumbnail, Thumbnail, ThumbnailVersion};

use crate::models::{
    NewVersion, Page, ThumbnailFilter, ThumbnailRow, ThumbnailStats, ThumbnailUpdate, VersionRow,
};
use crate::StoreError;

/// Retry budget for readable-id collisions.
pub const READABLE_ID_ATTEMPTS: u32 = 5;

const DEFAULT_PAGE_LIMIT: u32 = 20;

const SCHEMA: &str = include_str!("../schema.sql");

const INSERT_THUMBNAIL: &str = r#"
INSERT INTO generated_thumbnails (
    id, readable_id, prompt, enhanced_prompt, preset, width, height, model,
    seed, s3_bucket, s3_key, file_size_bytes, generation_time_ms, cost_cents,
    parent_id, feedback, metadata, generation_params, generated_by
) VALUES (
    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
    $17, $18, $19
)
RETURNING *
"#;

/// Shared-use store handle over a connection pool.
#[derive(Clone)]
pub struct MetadataStore {
    pool: PgPool,
}

impl MetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// First-run DDL. Idempotent; not a migration system.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a new thumbnail at version 1 with a freshly drawn readable
    /// id, redrawing on collision up to [`READABLE_ID_ATTEMPTS`] times.
    pub async fn create(&self, data: &NewThumbnail) -> Result<Thumbnail, StoreError> {
        for attempt in 1..=READABLE_ID_ATTEMPTS {
            let id = Uuid::new_v4();
            let readable_id = generate_readable_id();

            let inserted = sqlx::query_as::<_, ThumbnailRow>(INSERT_THUMBNAIL)
                .bind(id)
                .bind(&readable_id)
                .bind(&data.prompt)
                .bind(&data.enhanced_prompt)
                .bind(&data.preset)
                .bind(data.width)
                .bind(data.height)
                .bind(&data.model)
                .bind(data.seed)
                .bind(&data.s3_bucket)
                .bind(&data.s3_key)
                .bind(data.file_size_bytes)
                .bind(data.generation_time_ms)
                .bind(data.cost_cents)
                .bind(data.parent_id)
                .bind(&data.feedback)
                .bind(&data.metadata)
                .bind(&data.generation_params)
                .bind(&data.generated_by)
                .fetch_one(&self.pool)
                .await;

            match inserted {
                Ok(row) => return Ok(row.into()),
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    tracing::warn!(attempt, readable_id = %readable_id, "readable id collision, redrawing");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::ReadableIdExhausted {
            attempts: READABLE_ID_ATTEMPTS,
        })
    }

    /// Fetch a live thumbnail. Soft-deleted rows are invisible.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Thumbnail>, StoreError> {
        let row = sqlx::query_as::<_, ThumbnailRow>(
            "SELECT * FROM generated_thumbnails WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Fetch a live thumbnail with its version history, newest version
    /// first. A tombstoned parent hides its versions too.
    pub async fn get_with_versions(
        &self,
        id: Uuid,
    ) -> Result<Option<(Thumbnail, Vec<ThumbnailVersion>)>, StoreError> {
        let Some(thumbnail) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let versions = sqlx::query_as::<_, VersionRow>(
            "SELECT * FROM thumbnail_versions WHERE thumbnail_id = $1 ORDER BY version DESC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some((
            thumbnail,
            versions.into_iter().map(Into::into).collect(),
        )))
    }

    /// Partial update of feedback/metadata. Returns `None` for missing
    /// or tombstoned rows. `created_at` is immutable.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &ThumbnailUpdate,
    ) -> Result<Option<Thumbnail>, StoreError> {
        let row = sqlx::query_as::<_, ThumbnailRow>(
            r#"
            UPDATE generated_thumbnails
            SET feedback = COALESCE($2, feedback),
                metadata = COALESCE($3, metadata),
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.feedback)
        .bind(&changes.metadata)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Soft-delete. Returns whether a live row was tombstoned; a second
    /// delete of the same row returns false.
    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE generated_thumbnails SET deleted_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List live thumbnails, newest first. Filters AND together;
    /// pagination is 1-indexed.
    pub async fn list(
        &self,
        filter: &ThumbnailFilter,
        page: u32,
        limit: u32,
    ) -> Result<Page<Thumbnail>, StoreError> {
        let page = page.max(1);
        let limit = if limit == 0 { DEFAULT_PAGE_LIMIT } else { limit };

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM generated_thumbnails WHERE deleted_at IS NULL");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM generated_thumbnails WHERE deleted_at IS NULL");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::from(page - 1) * i64::from(limit));

        let rows = query
            .build_query_as::<ThumbnailRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total,
            page,
            limit,
        })
    }

    /// Archive the current artifact and swap in a new one, atomically.
    ///
    /// The thumbnail row is locked for the duration of the transaction,
    /// so two concurrent bumps on the same id serialize and the version
    /// counter stays monotonic.
    pub async fn create_version(
        &self,
        id: Uuid,
        req: &NewVersion,
    ) -> Result<(Thumbnail, ThumbnailVersion), StoreError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, ThumbnailRow>(
            "SELECT * FROM generated_thumbnails \
             WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        // Archive the pre-update artifact under the pre-update version.
        let archived = sqlx::query_as::<_, VersionRow>(
            r#"
            INSERT INTO thumbnail_versions (
                thumbnail_id, version, s3_key, s3_bucket, file_size_bytes,
                prompt, feedback
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(current.version)
        .bind(&current.s3_key)
        .bind(&current.s3_bucket)
        .bind(current.file_size_bytes)
        .bind(&current.prompt)
        .bind(&req.feedback)
        .fetch_one(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, ThumbnailRow>(
            r#"
            UPDATE generated_thumbnails
            SET s3_key = $2,
                s3_bucket = $3,
                file_size_bytes = $4,
                version = version + 1,
                prompt = COALESCE($5, prompt),
                generation_time_ms = COALESCE($6, generation_time_ms),
                cost_cents = COALESCE($7, cost_cents),
                seed = COALESCE($8, seed),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.new_s3_key)
        .bind(&req.new_s3_bucket)
        .bind(req.new_file_size_bytes)
        .bind(&req.new_prompt)
        .bind(req.generation_time_ms)
        .bind(req.cost_cents)
        .bind(req.seed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(thumbnail_id = %id, version = updated.version, "created new version");
        Ok((updated.into(), archived.into()))
    }

    /// Aggregates over live rows.
    pub async fn stats(&self) -> Result<ThumbnailStats, StoreError> {
        let (total, total_size_bytes, total_cost_cents): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), \
                    COALESCE(SUM(file_size_bytes), 0)::BIGINT, \
                    COALESCE(SUM(cost_cents), 0)::BIGINT \
             FROM generated_thumbnails WHERE deleted_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        let by_preset: Vec<(String, i64)> = sqlx::query_as(
            "SELECT COALESCE(preset, 'custom'), COUNT(*) \
             FROM generated_thumbnails WHERE deleted_at IS NULL GROUP BY 1",
        )
        .fetch_all(&self.pool)
        .await?;

        let by_model: Vec<(String, i64)> = sqlx::query_as(
            "SELECT model, COUNT(*) \
             FROM generated_thumbnails WHERE deleted_at IS NULL GROUP BY model",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ThumbnailStats {
            total,
            by_preset: by_preset.into_iter().collect(),
            by_model: by_model.into_iter().collect(),
            total_size_bytes,
            total_cost_cents,
        })
    }
}

fn push_filters(query: &mut QueryBuilder<Postgres>, filter: &ThumbnailFilter) {
    if let Some(preset) = &filter.preset {
        query.push(" AND preset = ").push_bind(preset.clone());
    }
    if let Some(model) = &filter.model {
        query.push(" AND model = ").push_bind(model.clone());
    }
    if let Some(generated_by) = &filter.generated_by {
        query
            .push(" AND generated_by = ")
            .push_bind(generated_by.clone());
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        query
            .push(" AND (prompt ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR enhanced_prompt ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(from) = filter.date_from {
        query.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        query.push(" AND created_at <= ").push_bind(to);
    }
}
