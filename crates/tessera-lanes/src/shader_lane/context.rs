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

//! The explicit working state of one material compilation.

use tessera_core::{
    material::{LightmapMode, Material},
    math::Vec3,
    renderer::{AtlasRegistry, ImageProvider},
    RenderSettings,
};

/// Logs a compiler warning and counts it in the context.
macro_rules! shader_warn {
    ($ctx:expr, $($arg:tt)+) => {{
        log::warn!($($arg)+);
        $ctx.warnings += 1;
    }};
}
pub(crate) use shader_warn;

/// The global sun described by a `q3map_sun` directive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SunLight {
    /// Normalized colour scaled by the intensity.
    pub color: Vec3,
    /// Unit direction towards the sun.
    pub direction: Vec3,
}

/// Everything one compile-and-optimize run reads and writes.
///
/// A context is created by the caller for a single material, threaded
/// through the parser and the optimizer passes, and consumed with
/// [`CompilationContext::into_material`]. It is not reentrant: one material
/// is compiled at a time per context.
pub struct CompilationContext<'a> {
    /// The material being built.
    pub material: Material,
    /// Engine-wide switches.
    pub settings: &'a RenderSettings,
    /// Image lookups for `map` and friends.
    pub images: &'a mut dyn ImageProvider,
    /// Destination of the combined collapse image.
    pub atlas: &'a mut dyn AtlasRegistry,
    /// Number of warnings emitted so far.
    pub warnings: usize,
    /// Set when the text carried a `q3map_sun` directive.
    pub sun: Option<SunLight>,
}

impl<'a> CompilationContext<'a> {
    /// Starts compiling a fresh material named `name` for `lightmap`.
    pub fn new(
        name: &str,
        lightmap: LightmapMode,
        settings: &'a RenderSettings,
        images: &'a mut dyn ImageProvider,
        atlas: &'a mut dyn AtlasRegistry,
    ) -> Self {
        let mut material = Material::new(name, lightmap);
        material.multitexture_env = settings.multitexture_env;
        Self {
            material,
            settings,
            images,
            atlas,
            warnings: 0,
            sun: None,
        }
    }

    /// Discards whatever was parsed so far and keeps only the identity
    /// (name and lightmap mode) of the material.
    pub fn reset_material(&mut self) {
        let name = std::mem::take(&mut self.material.name);
        let lightmap = self.material.lightmap;
        self.material = Material::new(name, lightmap);
        self.material.multitexture_env = self.settings.multitexture_env;
    }

    /// Finishes the run and hands the material to the caller.
    pub fn into_material(self) -> Material {
        self.material
    }
}
