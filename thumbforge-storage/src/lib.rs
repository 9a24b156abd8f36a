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

//! Object storage for generated thumbnails.
//!
//! Path-style S3-compatible storage with deterministic keys:
//!
//! ```text
//! thumbnails/{preset|custom}/{YYYY}/{MM}/{id}-v{version}.png
//! ```

pub mod keys;
pub mod object_store;

pub use keys::object_key;
pub use object_store::{ObjectStore, PutResult, S3Config};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("s3 error: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("credentials error: {0}")]
    Credentials(#[from] s3::creds::error::CredentialsError),

    #[error("object store returned status {status}")]
    UnexpectedStatus { status: u16 },
}
