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

//! Collaborator fakes shared by the agent tests.

use ahash::AHashMap;
use std::sync::{Arc, Mutex};
use tessera_core::{
    material::{CullType, StateBits},
    renderer::{
        AtlasRegion, AtlasRegistry, CpuImage, GraphicsBackend, ImageHandle, ImageProvider,
        IndexedDraw,
    },
};

/// Images known by name, one lightmap page.
#[derive(Debug, Default)]
pub struct FakeImages {
    known: AHashMap<String, ImageHandle>,
}

impl FakeImages {
    pub fn with_images(names: &[&str]) -> Self {
        let known = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), ImageHandle(100 + i as u32)))
            .collect();
        Self { known }
    }
}

impl ImageProvider for FakeImages {
    fn find_or_load_image(&mut self, name: &str, _mipmaps: bool, _allow_picmip: bool) -> Option<ImageHandle> {
        self.known.get(name).copied()
    }

    fn image_pixels(&self, _image: ImageHandle) -> Option<CpuImage> {
        None
    }

    fn default_image(&self) -> ImageHandle {
        ImageHandle(1)
    }

    fn white_image(&self) -> ImageHandle {
        ImageHandle(2)
    }

    fn lightmap(&self, index: u32) -> Option<ImageHandle> {
        (index == 0).then_some(ImageHandle(50))
    }

    fn num_lightmaps(&self) -> u32 {
        1
    }
}

#[derive(Debug, Default)]
pub struct NullAtlas;

impl AtlasRegistry for NullAtlas {
    fn register_atlas_region(&mut self, _name: &str, _width: u32, _height: u32, _pixels: &[u8]) {}

    fn find_atlas_region(&self, _name: &str) -> Option<AtlasRegion> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Draw { material: usize, stage: usize },
    Present,
}

/// Records draws and presents; clones share the log across threads.
#[derive(Debug, Clone, Default)]
pub struct CountingBackend(pub Arc<Mutex<Vec<Call>>>);

impl CountingBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn push(&self, call: Call) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }
}

impl GraphicsBackend for CountingBackend {
    fn bind_image(&mut self, _unit: usize, _image: ImageHandle) {}

    fn set_state(&mut self, _state: StateBits) {}

    fn set_cull(&mut self, _cull: CullType) {}

    fn set_depth_range(&mut self, _near: f32, _far: f32) {}

    fn draw_indexed(&mut self, draw: &IndexedDraw<'_>) {
        self.push(Call::Draw {
            material: draw.material,
            stage: draw.stage,
        });
    }

    fn present(&mut self) {
        self.push(Call::Present);
    }
}
