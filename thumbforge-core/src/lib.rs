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

//! Thumbforge Core
//!
//! Fundamental data structures for the thumbnail generation pipeline:
//! the preset catalog, brand guidelines, the prompt enhancer, readable
//! id generation, the model price table, and the persisted entities.

pub mod brand;
pub mod enhancer;
pub mod preset;
pub mod pricing;
pub mod readable_id;
pub mod thumbnail;

pub use brand::BrandGuidelines;
pub use enhancer::enhance;
pub use preset::{Preset, PresetRegistry};
pub use pricing::{cost_cents, unit_cost};
pub use readable_id::{generate_readable_id, READABLE_ID_ALPHABET, READABLE_ID_LEN};
pub use thumbnail::{NewThumbnail, Thumbnail, ThumbnailVersion};
