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

//! Shadow copy of the graphics state, so redundant changes never reach the
//! backend.

use tessera_core::{
    material::{CullType, StateBits},
    renderer::{GraphicsBackend, ImageHandle},
};

/// Number of texture units tracked by the cache.
pub const MAX_TEXTURE_UNITS: usize = 2;

/// Remembers the last state pushed to a [`GraphicsBackend`].
///
/// Every field starts unknown, so the first request of each kind always
/// reaches the backend.
#[derive(Debug, Default)]
pub struct StateCache {
    state: Option<StateBits>,
    bound: [Option<ImageHandle>; MAX_TEXTURE_UNITS],
    cull: Option<CullType>,
    depth_range: Option<(f32, f32)>,
    state_changes: usize,
}

impl StateCache {
    /// Creates a cache that knows nothing about the backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything, e.g. after the backend was used directly.
    pub fn invalidate(&mut self) {
        *self = Self {
            state_changes: self.state_changes,
            ..Self::default()
        };
    }

    /// Applies blend, depth and alpha-test state when any bit differs.
    pub fn set_state(&mut self, backend: &mut dyn GraphicsBackend, state: StateBits) {
        let changed = match self.state {
            Some(current) => !current.symmetric_difference(state).is_empty(),
            None => true,
        };
        if changed {
            backend.set_state(state);
            self.state = Some(state);
            self.state_changes += 1;
        }
    }

    /// Binds `image` to `unit` unless it is already bound there.
    pub fn bind(&mut self, backend: &mut dyn GraphicsBackend, unit: usize, image: ImageHandle) {
        let Some(slot) = self.bound.get_mut(unit) else {
            log::warn!("texture unit {} is out of range", unit);
            return;
        };
        if *slot != Some(image) {
            backend.bind_image(unit, image);
            *slot = Some(image);
        }
    }

    /// Applies face culling when it changed.
    pub fn set_cull(&mut self, backend: &mut dyn GraphicsBackend, cull: CullType) {
        if self.cull != Some(cull) {
            backend.set_cull(cull);
            self.cull = Some(cull);
        }
    }

    /// Applies the depth range when it changed.
    pub fn set_depth_range(&mut self, backend: &mut dyn GraphicsBackend, near: f32, far: f32) {
        if self.depth_range != Some((near, far)) {
            backend.set_depth_range(near, far);
            self.depth_range = Some((near, far));
        }
    }

    /// Number of state-bit changes pushed so far.
    pub fn state_changes(&self) -> usize {
        self.state_changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::testing::{Call, RecordingBackend};

    #[test]
    fn test_redundant_state_is_filtered() {
        let mut backend = RecordingBackend::default();
        let mut cache = StateCache::new();

        cache.set_state(&mut backend, StateBits::DEFAULT);
        cache.set_state(&mut backend, StateBits::DEFAULT);
        cache.set_state(&mut backend, StateBits::DEFAULT | StateBits::DEPTHFUNC_EQUAL);

        assert_eq!(cache.state_changes(), 2);
        assert_eq!(
            backend.calls,
            vec![
                Call::State(StateBits::DEFAULT),
                Call::State(StateBits::DEFAULT | StateBits::DEPTHFUNC_EQUAL)
            ]
        );
    }

    #[test]
    fn test_binds_are_cached_per_unit() {
        let mut backend = RecordingBackend::default();
        let mut cache = StateCache::new();

        cache.bind(&mut backend, 0, ImageHandle(3));
        cache.bind(&mut backend, 1, ImageHandle(3));
        cache.bind(&mut backend, 0, ImageHandle(3));
        cache.bind(&mut backend, 2, ImageHandle(3));

        assert_eq!(
            backend.calls,
            vec![Call::Bind(0, ImageHandle(3)), Call::Bind(1, ImageHandle(3))]
        );
    }

    #[test]
    fn test_invalidate_forces_next_change() {
        let mut backend = RecordingBackend::default();
        let mut cache = StateCache::new();
        cache.set_cull(&mut backend, CullType::TwoSided);
        cache.set_depth_range(&mut backend, 0.0, 1.0);
        cache.invalidate();
        cache.set_cull(&mut backend, CullType::TwoSided);
        cache.set_depth_range(&mut backend, 0.0, 1.0);
        assert_eq!(backend.calls.len(), 4);
    }
}
