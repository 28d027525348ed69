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

use crate::renderer::{CpuImage, ImageHandle};

/// The image loader the material pipeline resolves image names through.
pub trait ImageProvider {
    /// Finds an already loaded image or loads it.
    /// ## Arguments
    /// * `name` - The image path as written in material text.
    /// * `mipmaps` - Whether mipmaps are generated.
    /// * `allow_picmip` - Whether the global downscale setting applies.
    /// ## Returns
    /// The image, or `None` if it cannot be resolved.
    fn find_or_load_image(
        &mut self,
        name: &str,
        mipmaps: bool,
        allow_picmip: bool,
    ) -> Option<ImageHandle>;

    /// Returns a CPU copy of an image's pixels, if one is kept.
    fn image_pixels(&self, image: ImageHandle) -> Option<CpuImage>;

    /// The checkerboard image substituted for missing content.
    fn default_image(&self) -> ImageHandle;

    /// A flat white image.
    fn white_image(&self) -> ImageHandle;

    /// The lightmap page at `index`, if loaded.
    fn lightmap(&self, index: u32) -> Option<ImageHandle>;

    /// Number of lightmap pages currently loaded.
    fn num_lightmaps(&self) -> u32;

    /// Starts a looping cinematic and returns the image it streams into.
    fn play_cinematic(&mut self, _name: &str) -> Option<ImageHandle> {
        None
    }
}
