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

//! Static price table for the polling provider's models.
//!
//! Unit costs are USD per generated image. Synchronous-provider requests
//! are billed in provider credits and recorded as 0 cents here.

/// USD per image, keyed by model. Unknown models fall back to
/// [`DEFAULT_UNIT_COST`] so a mistyped model never generates for free.
const MODEL_UNIT_COSTS: &[(&str, f64)] = &[
    ("flux-2-pro", 0.05),
    ("flux-pro", 0.05),
    ("flux-pro-1.1", 0.04),
    ("flux-pro-1.1-ultra", 0.06),
    ("flux-dev", 0.025),
    ("flux-kontext-pro", 0.04),
    ("flux-kontext-max", 0.08),
];

/// The `flux-pro` rate.
pub const DEFAULT_UNIT_COST: f64 = 0.05;

/// Unit cost in USD for a polling-provider model.
pub fn unit_cost(model: &str) -> f64 {
    MODEL_UNIT_COSTS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, cost)| *cost)
        .unwrap_or(DEFAULT_UNIT_COST)
}

/// Unit cost rounded to whole cents.
pub fn cost_cents(model: &str) -> i32 {
    (unit_cost(model) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_costs() {
        assert_eq!(cost_cents("flux-2-pro"), 5);
        assert_eq!(cost_cents("flux-dev"), 3);
        assert_eq!(cost_cents("flux-kontext-max"), 8);
    }

    #[test]
    fn unit_cost_lookup() {
        assert_eq!(unit_cost("flux-pro-1.1"), 0.04);
        assert_eq!(unit_cost("not-a-model"), DEFAULT_UNIT_COST);
    }

    #[test]
    fn five_cent_round_trip() {
        // Model with unit cost 0.05 comes out at exactly 5 cents.
        assert_eq!((0.05f64 * 100.0).round() as i32, 5);
        assert_eq!(cost_cents("flux-pro"), 5);
    }
}
