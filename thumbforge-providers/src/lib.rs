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

//! Provider clients for image generation.
//!
//! Two interaction models, kept as distinct concrete types:
//!
//! - [`bfl::BflClient`]: asynchronous: create a task, poll the result
//!   endpoint until a terminal status, then download the sample. The
//!   client enforces a process-wide in-flight cap.
//! - [`reve::ReveClient`]: synchronous: the image comes back base64
//!   encoded in the initial HTTP response.

pub mod bfl;
pub mod error;
pub mod reve;

pub use bfl::{BflClient, BflConfig, BflRegion, ImageParams, PollOptions, TaskHandle, TaskStatus};
pub use error::{ModerationKind, ProviderError};
pub use reve::{reduce_aspect_ratio, ReveClient, ReveConfig, ReveOptions, ReveResponse};
