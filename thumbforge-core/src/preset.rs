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

//! Preset catalog for common target surfaces
//!
//! A preset bundles canvas dimensions, a default model, and a prompt
//! suffix for a well-known destination (social card, video thumbnail,
//! blog hero, etc.). The catalog is loaded once at startup and never
//! mutated.

use serde::Serialize;

/// A named bundle of dimensions and generation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    /// Stable identifier, e.g. `og-image`.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    /// Display string, not used for computation.
    pub aspect_ratio: &'static str,
    /// Model used when the request does not override it.
    pub default_model: &'static str,
    /// Appended to the user prompt by the enhancer.
    pub prompt_suffix: &'static str,
    pub use_case: &'static str,
}

const CATALOG: &[Preset] = &[
    Preset {
        id: "og-image",
        name: "Open Graph Image",
        width: 1200,
        height: 630,
        aspect_ratio: "1.91:1",
        default_model: "reve-create",
        prompt_suffix: "clean composition with clear focal point, web banner style",
        use_case: "Link previews on social platforms",
    },
    Preset {
        id: "youtube",
        name: "YouTube Thumbnail",
        width: 1280,
        height: 720,
        aspect_ratio: "16:9",
        default_model: "flux-2-pro",
        prompt_suffix: "bold, high contrast, eye-catching video thumbnail",
        use_case: "Video thumbnails",
    },
    Preset {
        id: "twitter-card",
        name: "Twitter Card",
        width: 1200,
        height: 675,
        aspect_ratio: "16:9",
        default_model: "reve-create",
        prompt_suffix: "minimal, strong focal subject, social card layout",
        use_case: "Tweet link previews",
    },
    Preset {
        id: "instagram-square",
        name: "Instagram Square",
        width: 1080,
        height: 1080,
        aspect_ratio: "1:1",
        default_model: "reve-create",
        prompt_suffix: "centered composition, vibrant, square format",
        use_case: "Instagram feed posts",
    },
    Preset {
        id: "instagram-story",
        name: "Instagram Story",
        width: 1080,
        height: 1920,
        aspect_ratio: "9:16",
        default_model: "reve-create",
        prompt_suffix: "vertical composition with headroom for UI overlays",
        use_case: "Stories and reels covers",
    },
    Preset {
        id: "blog-hero",
        name: "Blog Hero",
        width: 1600,
        height: 900,
        aspect_ratio: "16:9",
        default_model: "flux-2-pro",
        prompt_suffix: "wide editorial illustration, generous negative space",
        use_case: "Article header images",
    },
    Preset {
        id: "linkedin-banner",
        name: "LinkedIn Banner",
        width: 1584,
        height: 396,
        aspect_ratio: "4:1",
        default_model: "reve-create",
        prompt_suffix: "panoramic, professional, subtle texture",
        use_case: "Profile and company banners",
    },
    Preset {
        id: "github-social",
        name: "GitHub Social Preview",
        width: 1280,
        height: 640,
        aspect_ratio: "2:1",
        default_model: "reve-create",
        prompt_suffix: "technical aesthetic, dark friendly, repository preview",
        use_case: "Repository social previews",
    },
];

/// Read-only catalog of presets.
///
/// Construct once at startup; lookups are by id.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry;

impl PresetRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Look a preset up by id. Unknown ids return `None`.
    pub fn get(&self, id: &str) -> Option<&'static Preset> {
        CATALOG.iter().find(|p| p.id == id)
    }

    pub fn all(&self) -> &'static [Preset] {
        CATALOG
    }

    /// Resolve final dimensions: explicit overrides win, otherwise the
    /// preset defaults.
    pub fn resolve_dimensions(
        &self,
        preset: &Preset,
        width: Option<u32>,
        height: Option<u32>,
    ) -> (u32, u32) {
        (width.unwrap_or(preset.width), height.unwrap_or(preset.height))
    }
}
