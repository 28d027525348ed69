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

use crate::renderer::AtlasRegion;

/// A shared texture atlas that collapsed materials are packed into.
pub trait AtlasRegistry {
    /// Stores an RGBA8 image under `name`.
    /// ## Arguments
    /// * `name` - The material name the region belongs to.
    /// * `width` - Width of the image in pixels.
    /// * `height` - Height of the image in pixels.
    /// * `pixels` - `width * height * 4` bytes.
    fn register_atlas_region(&mut self, name: &str, width: u32, height: u32, pixels: &[u8]);

    /// Finds the placement of a previously registered region.
    /// ## Returns
    /// The region, or `None` if nothing was registered under `name`.
    fn find_atlas_region(&self, name: &str) -> Option<AtlasRegion>;
}
