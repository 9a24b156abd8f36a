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

//! Procedural SVG overlays and raster compositing.
//!
//! [`generator`] emits a deterministic corner-tessellation SVG (plus
//! optional title band and badges); [`compositor`] rasterizes it and
//! composites it onto a generated base image. The compositor is a trait
//! so tests and alternative rasterizers can stand in.

pub mod compositor;
pub mod generator;
pub mod prng;

pub use compositor::{Compositor, OutputFormat, ResvgCompositor};
pub use generator::{render, BadgeCorner, BadgeSpec, OverlaySpec, TitleSpec};
pub use prng::Mulberry32;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("svg parse error: {0}")]
    Svg(String),

    #[error("raster error: {0}")]
    Raster(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
