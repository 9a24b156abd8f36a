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

//! Versioned metadata store for generated thumbnails.
//!
//! PostgreSQL-backed. Soft deletes only: a tombstoned row and its
//! version history disappear from the public read surface but stay on
//! disk. Version bumps are transactional with a row lock, so concurrent
//! bumps on the same thumbnail serialize.

pub mod models;
pub mod store;

pub use models::{NewVersion, Page, ThumbnailFilter, ThumbnailStats, ThumbnailUpdate};
pub use store::{MetadataStore, READABLE_ID_ATTEMPTS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure, propagated verbatim.
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("could not allocate a unique readable id after {attempts} attempts")]
    ReadableIdExhausted { attempts: u32 },

    /// Lookup miss, including soft-deleted rows.
    #[error("thumbnail not found")]
    NotFound,
}
