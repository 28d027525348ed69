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

use crate::material::{CullType, StateBits};
use crate::math::Vec3;
use crate::renderer::command::DrawBufferTarget;
use crate::renderer::{DrawVertex, ImageHandle};
use crate::scene::RefDef;

/// One indexed draw issued by the back end.
#[derive(Debug, Clone, Copy)]
pub struct IndexedDraw<'a> {
    /// Vertexes of the batch.
    pub vertices: &'a [DrawVertex],
    /// Triangle list indexes into `vertices`.
    pub indexes: &'a [u32],
    /// Interned index of the material being drawn.
    pub material: usize,
    /// Stage of the material this draw executes.
    pub stage: usize,
    /// Constant colour modulating the draw.
    pub color: [u8; 4],
}

impl IndexedDraw<'_> {
    /// The vertex data as raw bytes, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.vertices)
    }

    /// Number of triangles in the draw.
    pub fn triangle_count(&self) -> usize {
        self.indexes.len() / 3
    }
}

/// The graphics API the back end drives.
///
/// Implementations are moved onto the render thread when the dual-thread
/// back end is enabled.
pub trait GraphicsBackend: Send {
    /// Binds an image to a texture unit.
    fn bind_image(&mut self, unit: usize, image: ImageHandle);

    /// Applies blend, depth and alpha-test state.
    fn set_state(&mut self, state: StateBits);

    /// Applies face culling.
    fn set_cull(&mut self, cull: CullType);

    /// Sets the depth range.
    fn set_depth_range(&mut self, near: f32, far: f32);

    /// Submits indexed geometry with the currently bound state.
    fn draw_indexed(&mut self, draw: &IndexedDraw<'_>);

    /// Presents the finished frame.
    fn present(&mut self);

    /// Prepares the viewport and matrices for a view.
    fn begin_view(&mut self, _refdef: &RefDef) {}

    /// Loads the model transform for the geometry drawn next.
    ///
    /// World geometry gets the zero origin and the identity axis.
    fn set_model_transform(&mut self, _origin: Vec3, _axis: &[Vec3; 3]) {}

    /// Selects the colour buffer subsequent drawing targets.
    fn set_draw_buffer(&mut self, _target: DrawBufferTarget) {}

    /// Captures a region of the frame buffer to a file.
    fn take_screenshot(&mut self, _x: i32, _y: i32, _width: i32, _height: i32, _file_name: &str) {}

    /// Darkens the stencil shadow volumes drawn this view.
    fn resolve_shadows(&mut self) {}

    /// Composites visible light flares.
    fn render_flares(&mut self) {}
}
