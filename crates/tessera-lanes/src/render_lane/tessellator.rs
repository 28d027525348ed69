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

//! Geometry accumulation for the current batch.

use tessera_core::{
    renderer::{DrawVertex, StretchPicCommand, TriangleSurface},
    scene::PolyVert,
};

/// Index order of the two triangles of a screen quad.
const QUAD_INDEXES: [u32; 6] = [3, 0, 2, 2, 0, 1];

/// Vertexes and triangle-list indexes gathered for one batch.
#[derive(Debug, Default)]
pub struct Tessellator {
    /// Batch vertexes.
    pub vertices: Vec<DrawVertex>,
    /// Triangle list indexes into `vertices`.
    pub indexes: Vec<u32>,
}

impl Tessellator {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Drops the accumulated geometry, keeping the allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indexes.clear();
    }

    fn base(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Appends a convex polygon as a triangle fan around its first vertex.
    pub fn add_poly(&mut self, verts: &[PolyVert]) {
        if verts.len() < 3 {
            return;
        }
        let base = self.base();
        for i in 2..verts.len() as u32 {
            self.indexes.extend_from_slice(&[base, base + i - 1, base + i]);
        }
        self.vertices.extend(verts.iter().map(|v| DrawVertex {
            xyz: v.xyz,
            st: v.st,
            color: v.modulate,
            ..Default::default()
        }));
    }

    /// Appends pre-built indexed geometry.
    pub fn add_triangles(&mut self, surface: &TriangleSurface) {
        let base = self.base();
        self.indexes
            .extend(surface.indexes.iter().map(|&index| base + index));
        self.vertices.extend_from_slice(&surface.vertices);
    }

    /// Appends a screen-space quad tinted with `color`.
    pub fn add_stretch_pic(&mut self, pic: &StretchPicCommand, color: [u8; 4]) {
        let base = self.base();
        self.indexes
            .extend(QUAD_INDEXES.iter().map(|&index| base + index));

        let corners = [
            ([pic.x, pic.y], [pic.s1, pic.t1]),
            ([pic.x + pic.w, pic.y], [pic.s2, pic.t1]),
            ([pic.x + pic.w, pic.y + pic.h], [pic.s2, pic.t2]),
            ([pic.x, pic.y + pic.h], [pic.s1, pic.t2]),
        ];
        self.vertices
            .extend(corners.iter().map(|&([x, y], st)| DrawVertex {
                xyz: [x, y, 0.0],
                st,
                color,
                ..Default::default()
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::material::ShaderHandle;

    #[test]
    fn test_poly_is_a_fan() {
        let mut tess = Tessellator::new();
        tess.add_poly(&[PolyVert::default(); 2]);
        assert!(tess.is_empty());

        tess.add_poly(&[PolyVert::default(); 5]);

        assert_eq!(tess.vertices.len(), 5);
        assert_eq!(tess.indexes, vec![0, 1, 2, 0, 2, 3, 0, 3, 4]);
    }

    #[test]
    fn test_stretch_pic_layout() {
        let mut tess = Tessellator::new();
        tess.add_poly(&[PolyVert::default(); 3]);
        let pic = StretchPicCommand {
            shader: ShaderHandle(1),
            x: 10.0,
            y: 20.0,
            w: 30.0,
            h: 40.0,
            s1: 0.0,
            t1: 0.0,
            s2: 1.0,
            t2: 1.0,
        };

        tess.add_stretch_pic(&pic, [255, 0, 0, 255]);

        assert_eq!(&tess.indexes[3..], &[6, 3, 5, 5, 3, 4]);
        assert_eq!(tess.vertices[5].xyz, [40.0, 60.0, 0.0]);
        assert_eq!(tess.vertices[6].st, [0.0, 1.0]);
        assert_eq!(tess.vertices[4].color, [255, 0, 0, 255]);
    }

    #[test]
    fn test_triangles_are_rebased() {
        let mut tess = Tessellator::new();
        tess.add_poly(&[PolyVert::default(); 3]);
        let surface = TriangleSurface {
            vertices: vec![DrawVertex::default(); 3],
            indexes: vec![0, 2, 1],
        };
        tess.add_triangles(&surface);
        assert_eq!(&tess.indexes[3..], &[3, 5, 4]);
        tess.clear();
        assert!(tess.is_empty());
        assert!(tess.vertices.is_empty());
    }
}
