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

//! The packed per-surface sort key.
//!
//! Layout, most significant first:
//!
//! | bits  | field          |
//! |-------|----------------|
//! | 17-31 | sorted index   |
//! | 7-16  | entity number  |
//! | 2-6   | fog volume     |
//! | 0-1   | dynamic lights |

use crate::material::MAX_SHADERS;

/// Shift of the sorted material index.
pub const QSORT_SHADERNUM_SHIFT: u32 = 17;
/// Shift of the entity number.
pub const QSORT_ENTITYNUM_SHIFT: u32 = 7;
/// Shift of the fog volume index.
pub const QSORT_FOGNUM_SHIFT: u32 = 2;

/// Number of entity slots addressable by a key.
pub const MAX_ENTITIES: u32 = 1 << (QSORT_SHADERNUM_SHIFT - QSORT_ENTITYNUM_SHIFT);
/// Entity number reserved for the world.
pub const ENTITYNUM_WORLD: u32 = MAX_ENTITIES - 1;
/// Number of fog volumes addressable by a key.
pub const MAX_FOG_VOLUMES: u32 = 1 << (QSORT_ENTITYNUM_SHIFT - QSORT_FOGNUM_SHIFT);

const SHADER_MASK: u32 = MAX_SHADERS as u32 - 1;
const ENTITY_MASK: u32 = MAX_ENTITIES - 1;
const FOG_MASK: u32 = MAX_FOG_VOLUMES - 1;
const DLIGHT_MASK: u32 = (1 << QSORT_FOGNUM_SHIFT) - 1;

/// A draw surface's sort key.
///
/// Surfaces with equal keys share every piece of graphics state and may be
/// appended to the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DrawSurfaceKey(pub u32);

impl DrawSurfaceKey {
    /// Packs the four fields into a key. Out-of-range values are masked.
    pub const fn pack(sorted_index: usize, entity: u32, fog: u32, dlight: u32) -> Self {
        Self(
            ((sorted_index as u32 & SHADER_MASK) << QSORT_SHADERNUM_SHIFT)
                | ((entity & ENTITY_MASK) << QSORT_ENTITYNUM_SHIFT)
                | ((fog & FOG_MASK) << QSORT_FOGNUM_SHIFT)
                | (dlight & DLIGHT_MASK),
        )
    }

    /// Position of the material in the sort-ordered table.
    pub const fn sorted_index(self) -> usize {
        ((self.0 >> QSORT_SHADERNUM_SHIFT) & SHADER_MASK) as usize
    }

    /// Entity number.
    pub const fn entity(self) -> u32 {
        (self.0 >> QSORT_ENTITYNUM_SHIFT) & ENTITY_MASK
    }

    /// Fog volume index.
    pub const fn fog(self) -> u32 {
        (self.0 >> QSORT_FOGNUM_SHIFT) & FOG_MASK
    }

    /// Dynamic light bits.
    pub const fn dlight(self) -> u32 {
        self.0 & DLIGHT_MASK
    }

    /// Returns the key with its sorted index replaced and every other field kept.
    pub const fn with_sorted_index(self, sorted_index: usize) -> Self {
        Self::pack(sorted_index, self.entity(), self.fog(), self.dlight())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_survive_packing() {
        let key = DrawSurfaceKey::pack(1234, ENTITYNUM_WORLD, 17, 1);
        assert_eq!(key.sorted_index(), 1234);
        assert_eq!(key.entity(), ENTITYNUM_WORLD);
        assert_eq!(key.fog(), 17);
        assert_eq!(key.dlight(), 1);
    }

    #[test]
    fn test_with_sorted_index_keeps_other_fields() {
        let key = DrawSurfaceKey::pack(4, 12, 3, 1);
        let moved = key.with_sorted_index(5);
        assert_eq!(moved.sorted_index(), 5);
        assert_eq!(moved.entity(), 12);
        assert_eq!(moved.fog(), 3);
        assert_eq!(moved.dlight(), 1);
    }

    #[test]
    fn test_material_dominates_ordering() {
        let low = DrawSurfaceKey::pack(1, ENTITYNUM_WORLD, 31, 1);
        let high = DrawSurfaceKey::pack(2, 0, 0, 0);
        assert!(low < high);
        assert_eq!(ENTITYNUM_WORLD, 1023);
    }
}
