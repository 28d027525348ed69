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

//! Records describing one frame's scene contents.
//!
//! Game code fills these through the scene aggregator; a [`RefDef`] is the
//! immutable snapshot of one view handed to the back end.

use crate::material::ShaderHandle;
use crate::math::{Aabb, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum number of dynamic lights per frame.
pub const MAX_DLIGHTS: usize = 32;
/// Size of the area visibility mask in bytes.
pub const MAX_MAP_AREA_BYTES: usize = 32;

/// Kind of a scene entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RefEntityType {
    /// A model instance.
    #[default]
    Model,
    /// A polygon entity.
    Poly,
    /// A camera-facing sprite.
    Sprite,
    /// A beam between two points.
    Beam,
    /// The core of a rail trail.
    RailCore,
    /// The rings of a rail trail.
    RailRings,
    /// A lightning bolt.
    Lightning,
    /// Marks a portal view position.
    PortalSurface,
}

impl RefEntityType {
    /// Converts a raw entity type tag.
    pub fn from_raw(raw: i32) -> Option<Self> {
        let kind = match raw {
            0 => RefEntityType::Model,
            1 => RefEntityType::Poly,
            2 => RefEntityType::Sprite,
            3 => RefEntityType::Beam,
            4 => RefEntityType::RailCore,
            5 => RefEntityType::RailRings,
            6 => RefEntityType::Lightning,
            7 => RefEntityType::PortalSurface,
            _ => return None,
        };
        Some(kind)
    }
}

/// Per-entity render effect flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderFx(pub u32);

impl RenderFx {
    /// Always use the minimum light level.
    pub const MINLIGHT: Self = Self(0x1);
    /// Only drawn in mirrors.
    pub const THIRD_PERSON: Self = Self(0x2);
    /// Only drawn in the main view.
    pub const FIRST_PERSON: Self = Self(0x4);
    /// Compressed depth range so view weapons do not poke into walls.
    pub const DEPTHHACK: Self = Self(0x8);
    /// Casts no shadow.
    pub const NOSHADOW: Self = Self(0x40);
    /// Lighting is sampled at a separate origin.
    pub const LIGHTING_ORIGIN: Self = Self(0x80);

    /// Whether every bit of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// An entity submitted to the scene.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefEntity {
    /// Entity kind.
    pub entity_type: RefEntityType,
    /// Render effect flags.
    pub renderfx: RenderFx,
    /// World position.
    pub origin: Vec3,
    /// Orientation.
    pub axis: [Vec3; 3],
    /// Material overriding the model's own, or the default handle.
    pub custom_shader: ShaderHandle,
    /// Colour fed to `rgbGen entity` / `alphaGen entity`.
    pub shader_rgba: [u8; 4],
    /// Offset fed to `tcMod entityTranslate`.
    pub shader_tex_coord: [f32; 2],
    /// Subtracted from the frame time to give the entity its own shader clock.
    pub shader_time: f32,
    /// Sprite radius.
    pub radius: f32,
    /// Sprite rotation in degrees.
    pub rotation: f32,
}

/// How a dynamic light falls off with distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightAttenuation {
    /// Linear falloff.
    #[default]
    Linear,
    /// Quadratic falloff.
    Quadratic,
    /// No distance scaling.
    NoScale,
}

/// A dynamic light submitted to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DynamicLight {
    /// World position.
    pub origin: Vec3,
    /// Radius of influence.
    pub radius: f32,
    /// Colour.
    pub color: Vec3,
    /// Adds light instead of modulating.
    pub additive: bool,
    /// Spot direction, zero for omnidirectional lights.
    pub normal: Vec3,
    /// Distance falloff.
    pub attenuation: LightAttenuation,
}

/// One vertex of a scene polygon.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct PolyVert {
    /// Position.
    pub xyz: [f32; 3],
    /// Texture coordinates.
    pub st: [f32; 2],
    /// Vertex colour.
    pub modulate: [u8; 4],
}

/// A polygon submitted to the scene.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenePoly {
    /// Material to draw with.
    pub shader: ShaderHandle,
    /// Fan-ordered vertexes.
    pub verts: Vec<PolyVert>,
    /// Fog volume the polygon lies in, 0 for none.
    pub fog_index: u32,
}

impl ScenePoly {
    /// Bounds of the polygon's vertexes.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.verts.iter().map(|v| Vec3::from_array(v.xyz)))
    }
}

/// View flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RdFlags(pub u32);

impl RdFlags {
    /// The view does not draw the world model.
    pub const NOWORLDMODEL: Self = Self(0x1);
    /// Teleport effect: the world is not drawn.
    pub const HYPERSPACE: Self = Self(0x4);

    /// Whether every bit of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Parameters of a view, as supplied by the caller of `render_scene`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewParams {
    /// Viewport left edge.
    pub x: i32,
    /// Viewport top edge.
    pub y: i32,
    /// Viewport width.
    pub width: i32,
    /// Viewport height.
    pub height: i32,
    /// Horizontal field of view in degrees.
    pub fov_x: f32,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    /// Eye position.
    pub view_origin: Vec3,
    /// Eye orientation.
    pub view_axis: [Vec3; 3],
    /// Game time in milliseconds.
    pub time: i32,
    /// View flags.
    pub rdflags: RdFlags,
    /// Visible areas of the world, one bit per area.
    pub area_mask: [u8; MAX_MAP_AREA_BYTES],
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 640,
            height: 480,
            fov_x: 90.0,
            fov_y: 73.74,
            view_origin: Vec3::ZERO,
            view_axis: [
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            time: 0,
            rdflags: RdFlags::default(),
            area_mask: [0; MAX_MAP_AREA_BYTES],
        }
    }
}

/// The immutable snapshot of one view's scene contents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefDef {
    /// View parameters.
    pub view: ViewParams,
    /// `time` in seconds.
    pub float_time: f32,
    /// The area mask differs from the previous view's.
    pub area_mask_modified: bool,
    /// Entities of this sub-scene.
    pub entities: Arc<[RefEntity]>,
    /// Dynamic lights of this sub-scene, empty when dynamic lighting is off.
    pub dlights: Arc<[DynamicLight]>,
    /// Polygons of this sub-scene.
    pub polys: Arc<[ScenePoly]>,
    /// Offset of `entities[0]` in the frame's entity store.
    pub first_entity: usize,
    /// Offset of `dlights[0]` in the frame's light store.
    pub first_dlight: usize,
    /// Offset of `polys[0]` in the frame's polygon store.
    pub first_poly: usize,
    /// Sub-scene counter within the current frame.
    pub frame_scene_num: u32,
}
