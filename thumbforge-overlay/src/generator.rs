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

//! Corner-tessellation overlay generator.
//!
//! Emits an equilateral triangle grid rotated about the canvas center
//! and clipped so only segments near the four corners survive, with
//! opacity falling off toward the configured margin. Optional layers:
//! a translucent title band and corner badges.
//!
//! # Determinism
//!
//! Identical specs produce byte-identical SVG. Coordinates are written
//! with fixed two-decimal precision, opacities with four, and the
//! per-segment blur draw comes from [`Mulberry32`](crate::prng::Mulberry32)
//! seeded by `seed`, drawn once per *retained* segment in emission
//! order. Varying the seed therefore changes which segments are blurred
//! but never which are drawn.

use serde::{Deserialize, Serialize};

use crate::prng::Mulberry32;

/// Inputs for the tessellation pattern and its text layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySpec {
    pub width: u32,
    pub height: u32,
    /// Triangle edge length in pixels.
    pub side_length: f64,
    /// Rotation of the whole pattern about the canvas center, degrees.
    pub rotation_deg: f64,
    /// Fraction of the canvas diagonal; segments farther than this from
    /// every corner are dropped.
    pub corner_margin: f64,
    /// Cycled by triangle family.
    pub colors: Vec<String>,
    pub line_width: f64,
    /// Global opacity multiplier.
    pub opacity: f64,
    /// Gaussian blur stdDeviation for blurred segments.
    pub blur_amount: f64,
    /// Per-segment Bernoulli probability of the blur filter.
    pub blur_probability: f64,
    pub seed: u32,
    pub title: Option<TitleSpec>,
    pub badges: Vec<BadgeSpec>,
}

impl Default for OverlaySpec {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            side_length: 56.0,
            rotation_deg: 12.0,
            corner_margin: 0.28,
            colors: vec!["#38bdf8".to_string(), "#818cf8".to_string()],
            line_width: 1.4,
            opacity: 0.85,
            blur_amount: 2.2,
            blur_probability: 0.18,
            seed: 7,
            title: None,
            badges: Vec::new(),
        }
    }
}

/// Full-width translucent band with centered, width-fitted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleSpec {
    pub text: String,
    /// Band center sits at `(1 - bottom_offset) * height`.
    pub bottom_offset: f64,
    /// Text is fitted to this fraction of the canvas width.
    pub max_width_fraction: f64,
    pub font_size: f64,
    pub band_height: f64,
}

impl Default for TitleSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            bottom_offset: 0.18,
            max_width_fraction: 0.82,
            font_size: 48.0,
            band_height: 96.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Small rounded label pinned to one corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeSpec {
    pub text: String,
    pub corner: BadgeCorner,
    pub background: String,
    pub color: String,
    pub padding: f64,
    pub corner_radius: f64,
}

impl Default for BadgeSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            corner: BadgeCorner::TopRight,
            background: "#ef4444".to_string(),
            color: "#ffffff".to_string(),
            padding: 8.0,
            corner_radius: 6.0,
        }
    }
}

const BADGE_FONT_SIZE: f64 = 13.0;
const BADGE_MARGIN: f64 = 16.0;

#[derive(Debug, Clone, Copy)]
struct Segment {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    family: usize,
}

/// Render the overlay as SVG text.
pub fn render(spec: &OverlaySpec) -> String {
    let w = f64::from(spec.width);
    let h = f64::from(spec.height);
    let diagonal = (w * w + h * h).sqrt();
    let threshold = spec.corner_margin * diagonal;

    let fallback = ["#ffffff".to_string()];
    let colors: &[String] = if spec.colors.is_empty() {
        &fallback
    } else {
        &spec.colors
    };

    let mut svg = String::with_capacity(32 * 1024);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" \
         viewBox=\"0 0 {} {}\">\n",
        spec.width, spec.height, spec.width, spec.height
    ));
    svg.push_str(&format!(
        "<defs><filter id=\"soften\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">\
         <feGaussianBlur stdDeviation=\"{:.2}\"/></filter></defs>\n",
        spec.blur_amount
    ));

    let mut rng = Mulberry32::new(spec.seed);
    for segment in tessellate(spec) {
        let segment = rotate(segment, w / 2.0, h / 2.0, spec.rotation_deg);
        let d = corner_distance(&segment, w, h);
        if threshold <= 0.0 || d > threshold {
            continue;
        }
        let corner_opacity = 1.0 - d / threshold;
        let stroke_opacity = spec.opacity * corner_opacity;
        let color = &colors[segment.family % colors.len()];
        let blurred = rng.next_f64() < spec.blur_probability;

        svg.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" \
             stroke-width=\"{:.2}\" stroke-opacity=\"{:.4}\"{}/>\n",
            segment.x1,
            segment.y1,
            segment.x2,
            segment.y2,
            color,
            spec.line_width,
            stroke_opacity,
            if blurred { " filter=\"url(#soften)\"" } else { "" },
        ));
    }

    if let Some(title) = &spec.title {
        push_title(&mut svg, title, w, h);
    }
    for badge in &spec.badges {
        push_badge(&mut svg, badge, w, h);
    }

    svg.push_str("</svg>\n");
    svg
}

/// Three families of parallel segments covering a rectangle extended 50%
/// beyond the canvas in every direction. Family 0 is horizontal with
/// vertical spacing `side * sqrt(3)/2`; families 1 and 2 are the two
/// oblique directions, with alternate rows offset by half an edge.
fn tessellate(spec: &OverlaySpec) -> Vec<Segment> {
    let w = f64::from(spec.width);
    let h = f64::from(spec.height);
    let side = spec.side_length.max(1.0);
    let row_h = side * 3f64.sqrt() / 2.0;

    let x_min = -w * 0.5;
    let x_max = w * 1.5;
    let y_min = -h * 0.5;
    let y_max = h * 1.5;

    let rows = ((y_max - y_min) / row_h).ceil() as i64;
    let cols = ((x_max - x_min) / side).ceil() as i64;

    let mut segments = Vec::with_capacity(((rows + 1) * (cols + 1) * 3) as usize);
    for row in 0..=rows {
        let y = y_min + row as f64 * row_h;
        let offset = if row % 2 == 1 { side / 2.0 } else { 0.0 };
        for col in 0..=cols {
            let x = x_min + col as f64 * side + offset;
            segments.push(Segment {
                x1: x,
                y1: y,
                x2: x + side,
                y2: y,
                family: 0,
            });
            segments.push(Segment {
                x1: x,
                y1: y,
                x2: x + side / 2.0,
                y2: y + row_h,
                family: 1,
            });
            segments.push(Segment {
                x1: x,
                y1: y,
                x2: x - side / 2.0,
                y2: y + row_h,
                family: 2,
            });
        }
    }
    segments
}

fn rotate(segment: Segment, cx: f64, cy: f64, degrees: f64) -> Segment {
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    let spin = |x: f64, y: f64| {
        let dx = x - cx;
        let dy = y - cy;
        (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
    };
    let (x1, y1) = spin(segment.x1, segment.y1);
    let (x2, y2) = spin(segment.x2, segment.y2);
    Segment {
        x1,
        y1,
        x2,
        y2,
        family: segment.family,
    }
}

/// Minimum distance from either endpoint to any canvas corner.
fn corner_distance(segment: &Segment, w: f64, h: f64) -> f64 {
    let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
    let mut best = f64::MAX;
    for (cx, cy) in corners {
        for (px, py) in [(segment.x1, segment.y1), (segment.x2, segment.y2)] {
            let d = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
            if d < best {
                best = d;
            }
        }
    }
    best
}

fn push_title(svg: &mut String, title: &TitleSpec, w: f64, h: f64) {
    let band_center = (1.0 - title.bottom_offset) * h;
    let band_y = band_center - title.band_height / 2.0;
    let max_width = title.max_width_fraction * w;
    let estimated = title.text.chars().count() as f64 * title.font_size * 0.6;
    let text_length = estimated.min(max_width);
    // Baseline sits slightly below the band center for visual balance.
    let text_y = band_center + title.font_size * 0.35;

    svg.push_str(&format!(
        "<rect x=\"0\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"#000000\" \
         fill-opacity=\"0.55\"/>\n",
        band_y, w, title.band_height
    ));
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-weight=\"bold\" font-size=\"{:.2}\" fill=\"#ffffff\" textLength=\"{:.2}\" \
         lengthAdjust=\"spacing\">{}</text>\n",
        w / 2.0,
        text_y,
        title.font_size,
        text_length,
        xml_escape(&title.text)
    ));
}

fn push_badge(svg: &mut String, badge: &BadgeSpec, w: f64, h: f64) {
    let bg_width = badge.text.chars().count() as f64 * 10.0 + 24.0;
    let bg_height = BADGE_FONT_SIZE + 2.0 * badge.padding;

    let (x, y) = match badge.corner {
        BadgeCorner::TopLeft => (BADGE_MARGIN, BADGE_MARGIN),
        BadgeCorner::TopRight => (w - BADGE_MARGIN - bg_width, BADGE_MARGIN),
        BadgeCorner::BottomLeft => (BADGE_MARGIN, h - BADGE_MARGIN - bg_height),
        BadgeCorner::BottomRight => (w - BADGE_MARGIN - bg_width, h - BADGE_MARGIN - bg_height),
    };

    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" \
         fill=\"{}\"/>\n",
        x, y, bg_width, bg_height, badge.corner_radius, badge.background
    ));
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-weight=\"bold\" font-size=\"{:.2}\" fill=\"{}\">{}</text>\n",
        x + bg_width / 2.0,
        y + bg_height / 2.0 + BADGE_FONT_SIZE * 0.35,
        BADGE_FONT_SIZE,
        badge.color,
        xml_escape(&badge.text)
    ));
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
