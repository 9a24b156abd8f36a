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

//! Human-friendly thumbnail handles.
//!
//! Six random characters from an alphabet with the visually ambiguous
//! glyphs `0 1 I O` removed, prefixed with `TH-`. Uniqueness is enforced
//! by the metadata store, which redraws on collision.

use rand::Rng;

/// Alphabet with `0 1 I O` removed.
pub const READABLE_ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Random characters after the `TH-` prefix.
pub const READABLE_ID_LEN: usize = 6;

const PREFIX: &str = "TH-";

/// Draw a fresh readable id, e.g. `TH-K7M2QX`.
pub fn generate_readable_id() -> String {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(PREFIX.len() + READABLE_ID_LEN);
    id.push_str(PREFIX);
    for _ in 0..READABLE_ID_LEN {
        let idx = rng.gen_range(0..READABLE_ID_ALPHABET.len());
        id.push(READABLE_ID_ALPHABET[idx] as char);
    }
    id
}
