// Copyright 2025 eraflo
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

//! Material name normalisation and hashing.

/// Buckets of the live material index.
pub const FILE_HASH_SIZE: usize = 1024;

/// Buckets of the definition text index.
pub const MAX_SHADERTEXT_HASH: usize = 2048;

/// Hashes a material name into `size` buckets.
///
/// Case-insensitive, stops at the first `.` and treats `\` as `/`, so
/// `Foo\Bar.tga` and `foo/bar` land in the same bucket. `size` must be a
/// power of two.
pub fn name_hash(name: &str, size: usize) -> usize {
    let mut hash: u64 = 0;
    for (i, byte) in name.bytes().enumerate() {
        let letter = match byte.to_ascii_lowercase() {
            b'.' => break,
            b'\\' => b'/',
            letter => letter,
        };
        hash = hash.wrapping_add(u64::from(letter) * (i as u64 + 119));
    }
    hash ^= (hash >> 10) ^ (hash >> 20);
    (hash as usize) & (size - 1)
}

/// Removes the extension of the last path component, if any.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if !name[dot..].contains(['/', '\\']) => &name[..dot],
        _ => name,
    }
}

/// The canonical form a material is interned under.
pub fn canonical_name(name: &str) -> String {
    strip_extension(name).to_ascii_lowercase()
}
