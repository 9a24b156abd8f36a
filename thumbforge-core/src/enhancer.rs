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

//! Prompt enhancement
//!
//! Pure function combining the user prompt, the preset suffix, and the
//! brand guidelines into the final provider prompt. Not idempotent:
//! enhancing an already-enhanced prompt appends another copy, so callers
//! enhance at most once per request.

use crate::brand::BrandGuidelines;
use crate::preset::Preset;

const STYLE_KEYWORD_COUNT: usize = 3;
const PALETTE_COUNT: usize = 2;
const AVOID_COUNT: usize = 2;

/// Build the enhanced prompt. Sections are joined with ". " in a fixed
/// order: base prompt, preset suffix, style keywords, color palette,
/// avoid list. Empty sections are skipped entirely.
pub fn enhance(base_prompt: &str, preset: Option<&Preset>, brand: &BrandGuidelines) -> String {
    let mut parts: Vec<String> = vec![base_prompt.to_string()];

    if let Some(preset) = preset {
        if !preset.prompt_suffix.is_empty() {
            parts.push(preset.prompt_suffix.to_string());
        }
    }

    if !brand.style_keywords.is_empty() {
        let keywords: Vec<&str> = brand
            .style_keywords
            .iter()
            .take(STYLE_KEYWORD_COUNT)
            .map(String::as_str)
            .collect();
        parts.push(format!("Style: {}", keywords.join(", ")));
    }

    if !brand.color_palette.is_empty() {
        let palette: Vec<&str> = brand
            .color_palette
            .iter()
            .take(PALETTE_COUNT)
            .map(String::as_str)
            .collect();
        parts.push(format!("Color palette: {}", palette.join(" and ")));
    }

    if !brand.avoid_keywords.is_empty() {
        let avoid: Vec<&str> = brand
            .avoid_keywords
            .iter()
            .take(AVOID_COUNT)
            .map(String::as_str)
            .collect();
        parts.push(format!("Avoid: {}", avoid.join(", ")));
    }

    parts.join(". ")
}
