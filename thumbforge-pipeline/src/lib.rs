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

//! Thumbforge Pipeline
//!
//! The unified generation service: resolve preset and dimensions,
//! enhance the prompt, call the configured provider backend, optionally
//! composite an overlay, upload to object storage, and hand back a
//! persistence-ready record plus the final bytes. Persisting the record
//! through [`thumbforge_db::MetadataStore`] is the caller's call.

pub mod config;
pub mod error;
pub mod service;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use service::{Backend, GenerateRequest, Generated, ThumbnailPipeline, MAX_DIMENSION};

pub use thumbforge_core::{BrandGuidelines, NewThumbnail, Thumbnail, ThumbnailVersion};
pub use thumbforge_db::MetadataStore;
pub use thumbforge_storage::ObjectStore;
