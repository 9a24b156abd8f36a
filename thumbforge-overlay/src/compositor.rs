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

//! Raster compositing of overlay SVG onto generated bitmaps.
//!
//! The pipeline depends on the [`Compositor`] trait, not the resvg
//! implementation, so the rasterizer can be swapped or stubbed in tests.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use usvg::{TreeParsing, TreeTextToPath};

use crate::OverlayError;

/// Output encodings. WebP is lossless (the encoder in the `image` crate
/// does not expose a quality knob).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Webp,
}

/// Rasterizes an overlay and composites it onto a base image at target
/// dimensions.
pub trait Compositor: Send + Sync {
    /// Rasterize `overlay_svg` at `(width, height)`, cover-fit the base
    /// image to the same dimensions, alpha-composite the overlay on top,
    /// and encode.
    fn compose(
        &self,
        base_image: &[u8],
        overlay_svg: &str,
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> Result<Vec<u8>, OverlayError>;
}

/// resvg-backed compositor.
pub struct ResvgCompositor {
    fonts: fontdb::Database,
}

impl ResvgCompositor {
    pub fn new() -> Self {
        let mut fonts = fontdb::Database::new();
        fonts.load_system_fonts();
        Self { fonts }
    }
}

impl Default for ResvgCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor for ResvgCompositor {
    fn compose(
        &self,
        base_image: &[u8],
        overlay_svg: &str,
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> Result<Vec<u8>, OverlayError> {
        if width == 0 || height == 0 {
            return Err(OverlayError::Raster("target dimensions are zero".into()));
        }

        // 1. Rasterize the SVG at target dimensions.
        let mut tree = usvg::Tree::from_str(overlay_svg, &usvg::Options::default())
            .map_err(|e| OverlayError::Svg(e.to_string()))?;
        tree.convert_text(&self.fonts);
        let rtree = resvg::Tree::from_usvg(&tree);

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| OverlayError::Raster("could not allocate pixmap".into()))?;
        let sx = width as f32 / rtree.size.width();
        let sy = height as f32 / rtree.size.height();
        rtree.render(
            tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );

        // 2. Cover-fit the base image.
        let mut base = image::load_from_memory(base_image)?
            .resize_to_fill(width, height, image::imageops::FilterType::Lanczos3)
            .to_rgba8();

        // 3. Alpha-composite the overlay on top.
        for (i, px) in pixmap.pixels().iter().enumerate() {
            let c = px.demultiply();
            let alpha = f32::from(c.alpha()) / 255.0;
            if alpha <= 0.0 {
                continue;
            }
            let x = i as u32 % width;
            let y = i as u32 / width;
            let base_px = base.get_pixel_mut(x, y);
            let blend = |over: u8, under: u8| -> u8 {
                (f32::from(over) * alpha + f32::from(under) * (1.0 - alpha)).round() as u8
            };
            base_px[0] = blend(c.red(), base_px[0]);
            base_px[1] = blend(c.green(), base_px[1]);
            base_px[2] = blend(c.blue(), base_px[2]);
            let base_alpha = f32::from(base_px[3]) / 255.0;
            base_px[3] = ((alpha + base_alpha * (1.0 - alpha)) * 255.0).round() as u8;
        }

        // 4. Encode.
        let mut out = Vec::new();
        match format {
            OutputFormat::Png => {
                DynamicImage::ImageRgba8(base)
                    .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
            }
            OutputFormat::Webp => {
                image::codecs::webp::WebPEncoder::new_lossless(&mut Cursor::new(&mut out))
                    .encode(
                        base.as_raw(),
                        width,
                        height,
                        image::ExtendedColorType::Rgba8,
                    )?;
            }
        }
        Ok(out)
    }
}
