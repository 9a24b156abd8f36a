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

//! Pipeline configuration from environment variables.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `BFL_API_KEY` | polling provider key | unset (backend disabled) |
//! | `FLUX_API_REGION` | `global` / `eu` / `us` | `global` |
//! | `REVE_API_KEY` | synchronous provider key | unset (backend disabled) |
//! | `S3_ENDPOINT` | object store endpoint | unset (uploads disabled) |
//! | `S3_REGION` | object store region | `us-east-1` |
//! | `S3_ACCESS_KEY_ID` / `S3_SECRET_ACCESS_KEY` | credentials | unset |
//! | `S3_BUCKET` | bucket name | `thumbnails` |
//! | `DATABASE_URL` | PostgreSQL connection string | unset |

use thumbforge_providers::bfl::{BflConfig, BflRegion, DEFAULT_MAX_CONCURRENT};
use thumbforge_providers::reve::ReveConfig;
use thumbforge_storage::S3Config;

pub const DEFAULT_S3_REGION: &str = "us-east-1";
pub const DEFAULT_S3_BUCKET: &str = "thumbnails";

/// Model used when neither the request nor the preset names one.
pub const DEFAULT_MODEL: &str = "reve-create";

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub bfl: Option<BflConfig>,
    pub reve: Option<ReveConfig>,
    pub s3: Option<S3Config>,
    pub database_url: Option<String>,
    pub default_model: String,
}

impl PipelineConfig {
    /// Read configuration from the process environment. Sections whose
    /// required variables are missing come back `None`; the pipeline
    /// rejects requests that need them at request time.
    pub fn from_env() -> Self {
        let bfl = env("BFL_API_KEY").map(|api_key| BflConfig {
            api_key,
            region: env("FLUX_API_REGION")
                .map(|r| BflRegion::parse(&r))
                .unwrap_or_default(),
            base_url: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        });

        let reve = env("REVE_API_KEY").map(ReveConfig::new);

        let s3 = match (
            env("S3_ENDPOINT"),
            env("S3_ACCESS_KEY_ID"),
            env("S3_SECRET_ACCESS_KEY"),
        ) {
            (Some(endpoint), Some(access_key_id), Some(secret_access_key)) => Some(S3Config {
                endpoint,
                region: env("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
                access_key_id,
                secret_access_key,
                bucket: env("S3_BUCKET").unwrap_or_else(|| DEFAULT_S3_BUCKET.to_string()),
            }),
            _ => None,
        };

        Self {
            bfl,
            reve,
            s3,
            database_url: env("DATABASE_URL"),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_environment_disables_every_section() {
        // from_env reads real process env; assert only on stable
        // invariants that hold regardless of ambient variables.
        let config = PipelineConfig {
            default_model: DEFAULT_MODEL.to_string(),
            ..Default::default()
        };
        assert!(config.bfl.is_none());
        assert!(config.reve.is_none());
        assert!(config.s3.is_none());
        assert_eq!(config.default_model, "reve-create");
    }

    #[test]
    fn region_parsing_defaults_to_global() {
        assert_eq!(BflRegion::parse("eu"), BflRegion::Eu);
        assert_eq!(BflRegion::parse("US"), BflRegion::Us);
        assert_eq!(BflRegion::parse(""), BflRegion::Global);
    }
}
