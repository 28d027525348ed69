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

//! The compiled material intermediate representation.
//!
//! A [`Material`] is produced by the shader compiler, rewritten by the
//! optimizer passes and then interned by the registry. Once interned it is
//! shared read-only with the back end through a [`MaterialTable`] snapshot.

pub mod deform;
pub mod stage;
pub mod state;
pub mod surface;

pub use deform::{Deform, MAX_SHADER_DEFORMS};
pub use stage::{
    AlphaGen, ColorGen, FogAdjust, Stage, TcGen, TexMod, TextureBundle, WaveFunc, Waveform,
    MAX_IMAGE_ANIMATIONS, NUM_TEXTURE_BUNDLES, TR_MAX_TEXMODS,
};
pub use state::StateBits;
pub use surface::{ContentFlags, SurfaceFlags};

use crate::math::Vec3;
use crate::renderer::ImageHandle;
use std::sync::Arc;

/// Maximum number of stages per material.
pub const MAX_SHADER_STAGES: usize = 8;
/// Maximum number of interned materials.
pub const MAX_SHADERS: usize = 16384;
/// Maximum length of a material or image name, terminator included.
pub const MAX_QPATH: usize = 64;

/// Named sort buckets. Materials draw in ascending sort order.
pub mod sort_order {
    /// Unset.
    pub const BAD: f32 = 0.0;
    /// Mirrors, portals and viewscreens.
    pub const PORTAL: f32 = 1.0;
    /// Sky box.
    pub const ENVIRONMENT: f32 = 2.0;
    /// Opaque geometry.
    pub const OPAQUE: f32 = 3.0;
    /// Scorch marks and similar decals.
    pub const DECAL: f32 = 4.0;
    /// Alpha-tested ladders, grates and grills.
    pub const SEE_THROUGH: f32 = 5.0;
    /// Banners.
    pub const BANNER: f32 = 6.0;
    /// Fog volumes.
    pub const FOG: f32 = 7.0;
    /// Surfaces seen through water.
    pub const UNDERWATER: f32 = 8.0;
    /// Regular transparency.
    pub const BLEND0: f32 = 9.0;
    /// Additive transparency.
    pub const BLEND1: f32 = 10.0;
    /// Second transparency layer.
    pub const BLEND2: f32 = 11.0;
    /// Third transparency layer.
    pub const BLEND3: f32 = 12.0;
    /// Sixth transparency layer.
    pub const BLEND6: f32 = 13.0;
    /// Stencil shadow volumes.
    pub const STENCIL_SHADOW: f32 = 14.0;
    /// Gun smoke puffs.
    pub const ALMOST_NEAREST: f32 = 15.0;
    /// Blood blobs and first person weapons.
    pub const NEAREST: f32 = 16.0;

    /// Resolves a named `sort` bucket, ignoring case.
    pub fn from_name(name: &str) -> Option<f32> {
        let value = match name.to_ascii_lowercase().as_str() {
            "portal" => PORTAL,
            "sky" => ENVIRONMENT,
            "opaque" => OPAQUE,
            "decal" => DECAL,
            "seethrough" => SEE_THROUGH,
            "banner" => BANNER,
            "additive" => BLEND1,
            "nearest" => NEAREST,
            "underwater" => UNDERWATER,
            _ => return None,
        };
        Some(value)
    }
}

/// Opaque handle returned to callers of the registry.
///
/// Handle 0 always names the default material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShaderHandle(pub u32);

impl ShaderHandle {
    /// The default material.
    pub const DEFAULT: Self = Self(0);

    /// The handle as a table index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which lightmap, if any, a material was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightmapMode {
    /// No lightmap: dynamic diffuse lighting.
    #[default]
    None,
    /// Pre-lit vertex colours.
    ByVertex,
    /// 2D user interface drawing.
    TwoD,
    /// Fullbright over a white image.
    WhiteImage,
    /// A numeric lightmap page.
    Index(u32),
}

impl LightmapMode {
    /// Converts the signed on-disk encoding (`-4..=-1` named modes, `>= 0` pages).
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            -4 => LightmapMode::TwoD,
            -3 => LightmapMode::ByVertex,
            -2 => LightmapMode::WhiteImage,
            n if n >= 0 => LightmapMode::Index(n as u32),
            _ => LightmapMode::None,
        }
    }

    /// Whether this names a lightmap page.
    pub fn is_numeric(&self) -> bool {
        matches!(self, LightmapMode::Index(_))
    }
}

/// Face culling requested by a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullType {
    /// Cull back faces.
    #[default]
    FrontSided,
    /// Cull front faces.
    BackSided,
    /// No culling.
    TwoSided,
}

/// The batching routine selected for a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageIterator {
    /// Correct for every material.
    #[default]
    Generic,
    /// Sky box followed by the cloud stages.
    Sky,
    /// A single diffuse-lit texture stage.
    VertexLitTexture,
    /// A texture stage multiplied by a lightmap in one draw.
    LightmappedMultitexture,
}

impl StageIterator {
    /// Short tag used by the material listing.
    pub fn tag(&self) -> &'static str {
        match self {
            StageIterator::Generic => "gen",
            StageIterator::Sky => "sky",
            StageIterator::VertexLitTexture => "vlt",
            StageIterator::LightmappedMultitexture => "lmmt",
        }
    }
}

/// How the fog pass of a material is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogPass {
    /// No fog pass.
    #[default]
    None,
    /// Depth compare `EQUAL` over opaque geometry.
    Equal,
    /// Depth compare `LEQUAL` for fog volumes drawn after translucency.
    LessEqual,
}

/// The six faces of a sky box, in `rt bk lf ft up dn` order.
pub const SKY_BOX_SUFFIXES: [&str; 6] = ["rt", "bk", "lf", "ft", "up", "dn"];

/// Sky parameters of a material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkyParms {
    /// Cloud layer height.
    pub cloud_height: f32,
    /// Faces drawn behind the cloud layers.
    pub outer_box: [Option<ImageHandle>; 6],
    /// Faces drawn in front of the cloud layers.
    pub inner_box: [Option<ImageHandle>; 6],
}

/// Fog volume parameters of a material.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FogParms {
    /// Fog colour.
    pub color: Vec3,
    /// Distance at which the fog becomes opaque.
    pub depth_for_opaque: f32,
}

/// Texture atlas placement of a collapsed material.
///
/// All fields are `-1` until an atlas region is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRect {
    /// Left edge in pixels.
    pub x: i32,
    /// Top edge in pixels.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl AtlasRect {
    /// The placement of a material that has not been collapsed into the atlas.
    pub const UNSET: Self = Self {
        x: -1,
        y: -1,
        width: -1,
        height: -1,
    };

    /// Whether a region has been assigned.
    pub fn is_set(&self) -> bool {
        self.width >= 0 && self.height >= 0
    }
}

impl Default for AtlasRect {
    fn default() -> Self {
        Self::UNSET
    }
}

/// A named, compiled description of how a surface is rendered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    /// Lowercase, extension-stripped name.
    pub name: String,
    /// The lightmap mode the material was requested for.
    pub lightmap: LightmapMode,
    /// Interned index, stable for the process lifetime.
    pub index: usize,
    /// Position in the sort-ordered table.
    pub sorted_index: usize,
    /// Sort bucket; lower values draw first.
    pub sort: f32,
    /// The name could not be resolved and placeholder content was substituted.
    pub default_shader: bool,
    /// The material came from a text definition.
    pub explicitly_defined: bool,
    /// Gameplay surface flags.
    pub surface_flags: SurfaceFlags,
    /// Gameplay content flags.
    pub content_flags: ContentFlags,
    /// Surfaces from different entities may share a batch.
    pub entity_mergable: bool,
    /// The material draws a sky box.
    pub is_sky: bool,
    /// Sky box and cloud parameters.
    pub sky: SkyParms,
    /// Fog volume parameters.
    pub fog_parms: FogParms,
    /// Distance range used by `alphaGen portal`.
    pub portal_range: f32,
    /// The material is a portal or mirror, or was collapsed from an environment map.
    pub has_reflection: bool,
    /// Hardware multitexture is used by the collapsed form of the material.
    pub multitexture_env: bool,
    /// Face culling.
    pub cull: CullType,
    /// Depth bias for decals.
    pub polygon_offset: bool,
    /// Images load without mipmaps.
    pub no_mip_maps: bool,
    /// Images ignore the global picmip downscale.
    pub no_pic_mip: bool,
    /// A stage samples the surface lightmap.
    pub is_lit_surface: bool,
    /// Fog pass classification.
    pub fog_pass: FogPass,
    /// Vertex deforms, bounded by [`MAX_SHADER_DEFORMS`].
    pub deforms: Vec<Deform>,
    /// Number of active stages.
    pub num_unfogged_passes: usize,
    /// Stage slots; inactive slots are skipped but keep their position.
    pub stages: [Stage; MAX_SHADER_STAGES],
    /// Batching routine selected by the optimizer.
    pub iterator: StageIterator,
    /// Animation clock wraps after this many seconds when non-zero.
    pub clamp_time: f32,
    /// Offset subtracted from the shader clock, set by remapping.
    pub time_offset: f32,
    /// Index of the material whose rendering replaces this one.
    pub remapped: Option<usize>,
    /// Texture atlas placement.
    pub atlas: AtlasRect,
}

impl Material {
    /// Creates an empty material with the given name and lightmap mode.
    pub fn new(name: impl Into<String>, lightmap: LightmapMode) -> Self {
        Self {
            name: name.into(),
            lightmap,
            ..Default::default()
        }
    }

    /// Iterates the active stages in order.
    pub fn active_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|stage| stage.active)
    }

    /// Number of active stages.
    pub fn active_stage_count(&self) -> usize {
        self.active_stages().count()
    }

    /// Whether any active stage samples a lightmap.
    pub fn has_lightmap_stage(&self) -> bool {
        self.active_stages()
            .any(|stage| stage.bundles.iter().any(|bundle| bundle.is_lightmap))
    }
}

/// A read-only snapshot of every interned material, handed to the back end
/// together with a command list.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    /// Materials by interned index.
    pub by_index: Vec<Arc<Material>>,
    /// Interned indexes in ascending sort order.
    pub sorted: Vec<usize>,
}

impl MaterialTable {
    /// Looks up a material by interned index.
    pub fn get(&self, index: usize) -> Option<&Arc<Material>> {
        self.by_index.get(index)
    }

    /// Looks up a material by its position in the sort-ordered table.
    pub fn by_sorted_index(&self, sorted_index: usize) -> Option<&Arc<Material>> {
        self.sorted
            .get(sorted_index)
            .and_then(|&index| self.by_index.get(index))
    }

    /// Number of interned materials.
    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    /// Whether the table holds no material.
    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }
}
