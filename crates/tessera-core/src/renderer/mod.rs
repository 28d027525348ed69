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

//! Rendering contracts shared by the front end and the back end.
//!
//! - [`sort_key`]: the packed per-surface sort key.
//! - [`command`]: the typed render command list and its sort-index fixup.
//! - [`traits`]: the collaborator interfaces the renderer consumes.

pub mod command;
pub mod sort_key;
pub mod traits;

pub use self::command::{
    DrawBufferTarget, DrawSurface, DrawSurfacesCommand, RenderCommand, RenderCommandKind,
    RenderCommandList, StretchPicCommand, SurfaceRef, TriangleSurface,
};
pub use self::sort_key::DrawSurfaceKey;
pub use self::traits::{AtlasRegistry, GraphicsBackend, ImageProvider, IndexedDraw};

/// Opaque reference to a GPU image owned by the image provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ImageHandle(pub u32);

/// A CPU-side copy of an image's pixels, tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl CpuImage {
    /// Whether the pixel buffer matches the stated dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.pixels.len() == self.width as usize * self.height as usize * 4
    }
}

/// Placement of a named region inside the shared texture atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRegion {
    /// Left edge in pixels.
    pub x: i32,
    /// Top edge in pixels.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

/// One vertex as submitted to the graphics backend.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct DrawVertex {
    /// Position.
    pub xyz: [f32; 3],
    /// Base texture coordinates.
    pub st: [f32; 2],
    /// Lightmap texture coordinates.
    pub lightmap: [f32; 2],
    /// Vertex normal.
    pub normal: [f32; 3],
    /// Vertex colour.
    pub color: [u8; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_image_validity() {
        let image = CpuImage {
            width: 2,
            height: 2,
            pixels: vec![0; 16],
        };
        assert!(image.is_valid());
        let truncated = CpuImage {
            pixels: vec![0; 15],
            ..image
        };
        assert!(!truncated.is_valid());
    }

    #[test]
    fn test_draw_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<DrawVertex>(), 44);
        let vertex = DrawVertex::default();
        assert_eq!(bytemuck::bytes_of(&vertex).len(), 44);
    }
}
