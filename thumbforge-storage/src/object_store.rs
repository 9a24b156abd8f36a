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

//! S3-compatible object store adapter.
//!
//! Path-style addressing against a configurable endpoint, so MinIO and
//! other S3-compatible stores work unchanged.

use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::Deserialize;

use crate::StorageError;

pub const DEFAULT_CONTENT_TYPE: &str = "image/png";
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u32 = 3600;

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// Endpoint URL; a schemeless value gets `https://` prepended.
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
}

impl S3Config {
    pub fn normalized_endpoint(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            self.endpoint.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.endpoint.trim_end_matches('/'))
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResult {
    pub bucket: String,
    pub key: String,
    /// The path-style object URL, `{endpoint}/{bucket}/{key}`.
    pub url: String,
}

/// Shared-use object store handle.
#[derive(Clone)]
pub struct ObjectStore {
    bucket: Box<Bucket>,
    endpoint: String,
    bucket_name: String,
}

impl ObjectStore {
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let endpoint = config.normalized_endpoint();
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            None,
            None,
            None,
        )?;
        let bucket = Bucket::new(&config.bucket, region, credentials)?.with_path_style();
        Ok(Self {
            bucket,
            endpoint,
            bucket_name: config.bucket.clone(),
        })
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Upload bytes under `key`. Content type defaults to `image/png`
    /// when `None`.
    pub async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<PutResult, StorageError> {
        let content_type = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);
        let response = self
            .bucket
            .put_object_with_content_type(key, bytes, content_type)
            .await?;
        let status = response.status_code();
        if status != 200 {
            return Err(StorageError::UnexpectedStatus { status });
        }
        tracing::debug!(key, size = bytes.len(), "uploaded object");
        Ok(PutResult {
            bucket: self.bucket_name.clone(),
            key: key.to_string(),
            url: format!("{}/{}/{}", self.endpoint, self.bucket_name, key),
        })
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self.bucket.get_object(key).await?;
        let status = response.status_code();
        if status != 200 {
            return Err(StorageError::UnexpectedStatus { status });
        }
        Ok(response.bytes().to_vec())
    }

    /// Presigned GET URL. Expiry defaults to one hour when `None`.
    pub async fn presign_get(
        &self,
        key: &str,
        expires_in_secs: Option<u32>,
    ) -> Result<String, StorageError> {
        let expiry = expires_in_secs.unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS);
        Ok(self.bucket.presign_get(key, expiry, None).await?)
    }
}
