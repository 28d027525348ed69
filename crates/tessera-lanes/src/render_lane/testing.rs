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

//! A graphics backend that records every call, for the render lane tests.

use std::sync::{Arc, Mutex};
use tessera_core::{
    material::{CullType, StateBits},
    math::Vec3,
    renderer::{DrawBufferTarget, GraphicsBackend, ImageHandle, IndexedDraw},
    scene::RefDef,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Bind(usize, ImageHandle),
    State(StateBits),
    Cull(CullType),
    DepthRange(f32, f32),
    Draw {
        material: usize,
        stage: usize,
        indexes: Vec<u32>,
        color: [u8; 4],
    },
    Present,
    BeginView,
    ModelTransform(Vec3, [Vec3; 3]),
    DrawBuffer(DrawBufferTarget),
    Screenshot(String),
    ResolveShadows,
    RenderFlares,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
}

impl RecordingBackend {
    pub fn draws(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Draw { .. }))
            .collect()
    }
}

impl GraphicsBackend for RecordingBackend {
    fn bind_image(&mut self, unit: usize, image: ImageHandle) {
        self.calls.push(Call::Bind(unit, image));
    }

    fn set_state(&mut self, state: StateBits) {
        self.calls.push(Call::State(state));
    }

    fn set_cull(&mut self, cull: CullType) {
        self.calls.push(Call::Cull(cull));
    }

    fn set_depth_range(&mut self, near: f32, far: f32) {
        self.calls.push(Call::DepthRange(near, far));
    }

    fn draw_indexed(&mut self, draw: &IndexedDraw<'_>) {
        self.calls.push(Call::Draw {
            material: draw.material,
            stage: draw.stage,
            indexes: draw.indexes.to_vec(),
            color: draw.color,
        });
    }

    fn present(&mut self) {
        self.calls.push(Call::Present);
    }

    fn begin_view(&mut self, _refdef: &RefDef) {
        self.calls.push(Call::BeginView);
    }

    fn set_model_transform(&mut self, origin: Vec3, axis: &[Vec3; 3]) {
        self.calls.push(Call::ModelTransform(origin, *axis));
    }

    fn set_draw_buffer(&mut self, target: DrawBufferTarget) {
        self.calls.push(Call::DrawBuffer(target));
    }

    fn take_screenshot(&mut self, _x: i32, _y: i32, _width: i32, _height: i32, file_name: &str) {
        self.calls.push(Call::Screenshot(file_name.to_string()));
    }

    fn resolve_shadows(&mut self) {
        self.calls.push(Call::ResolveShadows);
    }

    fn render_flares(&mut self) {
        self.calls.push(Call::RenderFlares);
    }
}

/// A recording backend whose log stays readable after the backend was boxed.
#[derive(Debug, Clone, Default)]
pub struct SharedRecorder(pub Arc<Mutex<RecordingBackend>>);

impl SharedRecorder {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().map(|backend| backend.calls.clone()).unwrap_or_default()
    }
}

impl GraphicsBackend for SharedRecorder {
    fn bind_image(&mut self, unit: usize, image: ImageHandle) {
        if let Ok(mut backend) = self.0.lock() {
            backend.bind_image(unit, image);
        }
    }

    fn set_state(&mut self, state: StateBits) {
        if let Ok(mut backend) = self.0.lock() {
            backend.set_state(state);
        }
    }

    fn set_cull(&mut self, cull: CullType) {
        if let Ok(mut backend) = self.0.lock() {
            backend.set_cull(cull);
        }
    }

    fn set_depth_range(&mut self, near: f32, far: f32) {
        if let Ok(mut backend) = self.0.lock() {
            backend.set_depth_range(near, far);
        }
    }

    fn draw_indexed(&mut self, draw: &IndexedDraw<'_>) {
        if let Ok(mut backend) = self.0.lock() {
            backend.draw_indexed(draw);
        }
    }

    fn present(&mut self) {
        if let Ok(mut backend) = self.0.lock() {
            backend.present();
        }
    }

    fn begin_view(&mut self, refdef: &RefDef) {
        if let Ok(mut backend) = self.0.lock() {
            backend.begin_view(refdef);
        }
    }

    fn set_model_transform(&mut self, origin: Vec3, axis: &[Vec3; 3]) {
        if let Ok(mut backend) = self.0.lock() {
            backend.set_model_transform(origin, axis);
        }
    }

    fn set_draw_buffer(&mut self, target: DrawBufferTarget) {
        if let Ok(mut backend) = self.0.lock() {
            backend.set_draw_buffer(target);
        }
    }

    fn take_screenshot(&mut self, x: i32, y: i32, width: i32, height: i32, file_name: &str) {
        if let Ok(mut backend) = self.0.lock() {
            backend.take_screenshot(x, y, width, height, file_name);
        }
    }

    fn resolve_shadows(&mut self) {
        if let Ok(mut backend) = self.0.lock() {
            backend.resolve_shadows();
        }
    }

    fn render_flares(&mut self) {
        if let Ok(mut backend) = self.0.lock() {
            backend.render_flares();
        }
    }
}
