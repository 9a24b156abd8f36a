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

//! Brand guidelines folded into every enhanced prompt.

use serde::{Deserialize, Serialize};

/// Ordered brand vocabulary. Configured at startup and treated as
/// read-only afterwards; mutating it mid-flight is racy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandGuidelines {
    /// Human-readable palette entries, e.g. "deep blue (#0066cc)".
    #[serde(default)]
    pub color_palette: Vec<String>,
    #[serde(default)]
    pub style_keywords: Vec<String>,
    #[serde(default)]
    pub avoid_keywords: Vec<String>,
}

impl BrandGuidelines {
    /// Guidelines with every list empty; the enhancer then passes the
    /// prompt through with only the preset suffix applied.
    pub fn empty() -> Self {
        Self {
            color_palette: Vec::new(),
            style_keywords: Vec::new(),
            avoid_keywords: Vec::new(),
        }
    }
}

impl Default for BrandGuidelines {
    fn default() -> Self {
        Self {
            color_palette: vec![
                "deep blue (#0066cc)".to_string(),
                "warm white (#faf8f5)".to_string(),
                "slate gray (#475569)".to_string(),
            ],
            style_keywords: vec![
                "modern".to_string(),
                "clean".to_string(),
                "professional".to_string(),
                "minimal".to_string(),
            ],
            avoid_keywords: vec![
                "clutter".to_string(),
                "text artifacts".to_string(),
                "watermarks".to_string(),
            ],
        }
    }
}
