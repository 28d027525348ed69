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

//! In-memory collaborators for the shader lane tests.

use ahash::AHashMap;
use tessera_core::renderer::{AtlasRegion, AtlasRegistry, CpuImage, ImageHandle, ImageProvider};

const DEFAULT_IMAGE: ImageHandle = ImageHandle(1);
const WHITE_IMAGE: ImageHandle = ImageHandle(2);
const FIRST_LOADED: u32 = 100;

#[derive(Debug, Default)]
pub struct FakeImages {
    known: AHashMap<String, ImageHandle>,
    pixels: AHashMap<ImageHandle, CpuImage>,
    pub lightmaps: u32,
    pub cinematics: bool,
    pub loads: Vec<(String, bool, bool)>,
}

impl FakeImages {
    pub fn with_images(names: &[&str]) -> Self {
        let mut images = Self::default();
        for name in names {
            images.add(name);
        }
        images
    }

    pub fn add(&mut self, name: &str) -> ImageHandle {
        let handle = ImageHandle(FIRST_LOADED + self.known.len() as u32);
        self.known.insert(name.to_ascii_lowercase(), handle);
        handle
    }

    pub fn add_pixels(&mut self, name: &str, width: u32, height: u32, rgba: [u8; 4]) -> ImageHandle {
        let handle = self.add(name);
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        self.pixels.insert(
            handle,
            CpuImage {
                width,
                height,
                pixels,
            },
        );
        handle
    }

    pub fn handle(&self, name: &str) -> Option<ImageHandle> {
        self.known.get(&name.to_ascii_lowercase()).copied()
    }
}

impl ImageProvider for FakeImages {
    fn find_or_load_image(
        &mut self,
        name: &str,
        mipmaps: bool,
        allow_picmip: bool,
    ) -> Option<ImageHandle> {
        self.loads.push((name.to_string(), mipmaps, allow_picmip));
        self.handle(name)
    }

    fn image_pixels(&self, image: ImageHandle) -> Option<CpuImage> {
        self.pixels.get(&image).cloned()
    }

    fn default_image(&self) -> ImageHandle {
        DEFAULT_IMAGE
    }

    fn white_image(&self) -> ImageHandle {
        WHITE_IMAGE
    }

    fn lightmap(&self, index: u32) -> Option<ImageHandle> {
        (index < self.lightmaps).then_some(ImageHandle(50 + index))
    }

    fn num_lightmaps(&self) -> u32 {
        self.lightmaps
    }

    fn play_cinematic(&mut self, _name: &str) -> Option<ImageHandle> {
        self.cinematics.then_some(ImageHandle(90))
    }
}

#[derive(Debug, Default)]
pub struct FakeAtlas {
    pub regions: AHashMap<String, CpuImage>,
}

impl AtlasRegistry for FakeAtlas {
    fn register_atlas_region(&mut self, name: &str, width: u32, height: u32, pixels: &[u8]) {
        self.regions.insert(
            name.to_string(),
            CpuImage {
                width,
                height,
                pixels: pixels.to_vec(),
            },
        );
    }

    fn find_atlas_region(&self, name: &str) -> Option<AtlasRegion> {
        self.regions.get(name).map(|image| AtlasRegion {
            x: 0,
            y: 0,
            width: image.width as i32,
            height: image.height as i32,
        })
    }
}
