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

//! Deterministic object key template.

use chrono::{DateTime, Datelike, Utc};

/// `thumbnails/{preset|custom}/{YYYY}/{MM}/{id}-v{version}.png`
pub fn object_key(preset: Option<&str>, id: &str, version: i32, at: DateTime<Utc>) -> String {
    format!(
        "thumbnails/{}/{:04}/{:02}/{}-v{}.png",
        preset.unwrap_or("custom"),
        at.year(),
        at.month(),
        id,
        version
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn key_template() {
        let at = Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).unwrap();
        assert_eq!(
            object_key(Some("og-image"), "abc", 3, at),
            "thumbnails/og-image/2026/02/abc-v3.png"
        );
    }

    #[test]
    fn missing_preset_falls_back_to_custom() {
        let at = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        assert_eq!(
            object_key(None, "xyz", 1, at),
            "thumbnails/custom/2025/11/xyz-v1.png"
        );
    }
}
