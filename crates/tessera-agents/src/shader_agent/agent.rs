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

//! The ShaderAgent interns materials by name and keeps them sorted.

use super::corpus::ShaderCorpus;
use super::names::{canonical_name, name_hash, strip_extension, FILE_HASH_SIZE};
use std::sync::Arc;
use tessera_core::{
    material::{
        sort_order, FogAdjust, LightmapMode, Material, MaterialTable, ShaderHandle, MAX_QPATH,
        MAX_SHADERS,
    },
    renderer::{AtlasRegistry, ImageHandle, ImageProvider},
    vfs::TextResources,
    RenderSettings,
};
use tessera_lanes::shader_lane::{
    compile_material, finish_material, install_default_content, install_image_stages,
    CompilationContext, SunLight, Tokenizer,
};

/// Handles of the materials the renderer itself relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuiltinShaders {
    /// `<default>`, substituted for anything that cannot be resolved.
    pub default: ShaderHandle,
    /// `<stencil shadow>`, a sort marker for shadow volumes.
    pub stencil_shadow: ShaderHandle,
    /// `projectionShadow`.
    pub projection_shadow: ShaderHandle,
    /// `flareShader`.
    pub flare: ShaderHandle,
    /// `sun`.
    pub sun: ShaderHandle,
}

/// A finished material and what its compilation produced on the side.
struct Compiled {
    material: Material,
    sun: Option<SunLight>,
    warnings: usize,
}

fn compile_with(
    settings: &RenderSettings,
    images: &mut dyn ImageProvider,
    atlas: &mut dyn AtlasRegistry,
    name: &str,
    lightmap: LightmapMode,
    build: impl FnOnce(&mut CompilationContext<'_>),
) -> Compiled {
    let mut ctx = CompilationContext::new(name, lightmap, settings, images, atlas);
    build(&mut ctx);
    let sun = ctx.sun;
    let warnings = ctx.warnings;
    Compiled {
        material: ctx.into_material(),
        sun,
        warnings,
    }
}

/// The material registry.
///
/// Registration is single-threaded: the agent owns the image and atlas
/// collaborators and the scratch compilation context lives only for the
/// duration of one call. Interned materials are never removed; their index
/// is their handle for the lifetime of the agent.
pub struct ShaderAgent {
    settings: RenderSettings,
    images: Box<dyn ImageProvider>,
    atlas: Box<dyn AtlasRegistry>,
    corpus: ShaderCorpus,
    by_index: Vec<Arc<Material>>,
    sorted: Vec<usize>,
    hash_table: Vec<Vec<usize>>,
    sort_fixups: Vec<usize>,
    builtins: BuiltinShaders,
    sun: Option<SunLight>,
    warnings: usize,
}

impl std::fmt::Debug for ShaderAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderAgent")
            .field("materials", &self.by_index.len())
            .field("corpus_files", &self.corpus.file_count())
            .field("builtins", &self.builtins)
            .finish_non_exhaustive()
    }
}

impl ShaderAgent {
    /// Creates the registry: internal materials first, then the definition
    /// corpus scan, then the materials looked up by name.
    pub fn new(
        settings: RenderSettings,
        resources: &dyn TextResources,
        images: Box<dyn ImageProvider>,
        atlas: Box<dyn AtlasRegistry>,
    ) -> Self {
        log::info!("Initializing Shaders");
        let mut agent = Self {
            settings,
            images,
            atlas,
            corpus: ShaderCorpus::default(),
            by_index: Vec::new(),
            sorted: Vec::new(),
            hash_table: vec![Vec::new(); FILE_HASH_SIZE],
            sort_fixups: Vec::new(),
            builtins: BuiltinShaders::default(),
            sun: None,
            warnings: 0,
        };

        agent.create_internal_shaders();
        agent.corpus = ShaderCorpus::scan(resources);
        agent.create_external_shaders();
        agent
    }

    fn create_internal_shaders(&mut self) {
        let default = compile_with(
            &self.settings,
            self.images.as_mut(),
            self.atlas.as_mut(),
            "<default>",
            LightmapMode::None,
            |ctx| {
                install_default_content(ctx);
                finish_material(ctx);
            },
        );
        self.builtins.default = self.intern(default);

        let mut shadow = compile_with(
            &self.settings,
            self.images.as_mut(),
            self.atlas.as_mut(),
            "<stencil shadow>",
            LightmapMode::None,
            finish_material,
        );
        shadow.material.sort = sort_order::STENCIL_SHADOW;
        self.builtins.stencil_shadow = self.intern(shadow);
    }

    fn create_external_shaders(&mut self) {
        self.builtins.projection_shadow =
            self.find_or_register("projectionShadow", LightmapMode::None, true);
        self.builtins.flare = self.find_or_register("flareShader", LightmapMode::None, true);

        // Flares are fogged when their colour is computed.
        let flare = &mut self.by_index[self.builtins.flare.index()];
        if !flare.default_shader {
            let flare = Arc::make_mut(flare);
            for stage in flare.stages.iter_mut().filter(|stage| stage.active) {
                stage.fog_adjust = FogAdjust::None;
            }
        }

        self.builtins.sun = self.find_or_register("sun", LightmapMode::None, true);
    }

    /// Replaces a numeric lightmap mode that refers past the loaded pages.
    fn validate_lightmap(&self, lightmap: LightmapMode, fallback: LightmapMode) -> LightmapMode {
        match lightmap {
            LightmapMode::Index(page) if page >= self.images.num_lightmaps() => fallback,
            other => other,
        }
    }

    /// Finds an interned material by canonical name, newest first.
    ///
    /// With a lightmap mode, only materials of that mode or defaulted ones
    /// match.
    fn lookup(&self, canonical: &str, lightmap: Option<LightmapMode>) -> Option<usize> {
        self.hash_table[name_hash(canonical, FILE_HASH_SIZE)]
            .iter()
            .rev()
            .copied()
            .find(|&index| {
                let material = &self.by_index[index];
                let mode_matches =
                    lightmap.map_or(true, |mode| material.lightmap == mode || material.default_shader);
                mode_matches && material.name.eq_ignore_ascii_case(canonical)
            })
    }

    fn at_capacity(&self) -> bool {
        if self.by_index.len() >= MAX_SHADERS {
            log::warn!("Shader limit of {} reached", MAX_SHADERS);
            return true;
        }
        false
    }

    /// Adds a finished material to every index.
    fn intern(&mut self, compiled: Compiled) -> ShaderHandle {
        let Compiled {
            mut material,
            sun,
            warnings,
        } = compiled;
        self.warnings += warnings;
        if sun.is_some() {
            self.sun = sun;
        }

        let index = self.by_index.len();
        material.index = index;

        // Stable insertion: equal sorts keep registration order.
        let mut insert_at = self.sorted.len();
        while insert_at > 0 && self.by_index[self.sorted[insert_at - 1]].sort > material.sort {
            insert_at -= 1;
        }
        for &shifted in &self.sorted[insert_at..] {
            Arc::make_mut(&mut self.by_index[shifted]).sorted_index += 1;
        }
        if insert_at < self.sorted.len() {
            self.sort_fixups.push(insert_at);
        }
        material.sorted_index = insert_at;
        self.sorted.insert(insert_at, index);

        self.hash_table[name_hash(&material.name, FILE_HASH_SIZE)].push(index);
        self.by_index.push(Arc::new(material));
        ShaderHandle(index as u32)
    }

    /// Finds or creates the material `name` for `lightmap`.
    ///
    /// Resolution order: an interned material of the same name and mode (or
    /// a defaulted one), a text definition in the corpus, an image of that
    /// name, and finally a defaulted material. Always returns a usable
    /// handle; failures never reach the caller.
    pub fn find_or_register(&mut self, name: &str, lightmap: LightmapMode, mipmaps: bool) -> ShaderHandle {
        if name.is_empty() {
            return self.builtins.default;
        }

        // Without lightmaps in the loaded world, fall back to vertex light.
        let lightmap = self.validate_lightmap(lightmap, LightmapMode::ByVertex);
        let canonical = canonical_name(name);

        if let Some(index) = self.lookup(&canonical, Some(lightmap)) {
            return ShaderHandle(index as u32);
        }
        if self.at_capacity() {
            return self.builtins.default;
        }

        let compiled = match self.corpus.find(&canonical) {
            Some(position) => {
                let text = self.corpus.text();
                compile_with(
                    &self.settings,
                    self.images.as_mut(),
                    self.atlas.as_mut(),
                    &canonical,
                    lightmap,
                    |ctx| {
                        let mut tokens = Tokenizer::at(text, position);
                        // Failures are logged and leave a defaulted material.
                        let _ = compile_material(ctx, &mut tokens);
                    },
                )
            }
            None => {
                let image_name = if strip_extension(name).len() == name.len() {
                    format!("{name}.tga")
                } else {
                    name.to_string()
                };
                let image = self.images.find_or_load_image(&image_name, mipmaps, mipmaps);
                compile_with(
                    &self.settings,
                    self.images.as_mut(),
                    self.atlas.as_mut(),
                    &canonical,
                    lightmap,
                    |ctx| {
                        match image {
                            Some(image) => {
                                install_image_stages(&mut ctx.material, image, &image_name, &*ctx.images)
                            }
                            None => {
                                log::debug!("Couldn't find image file for shader {}", ctx.material.name);
                                install_default_content(ctx);
                                ctx.material.default_shader = true;
                            }
                        }
                        finish_material(ctx);
                    },
                )
            }
        };

        self.intern(compiled)
    }

    fn register(&mut self, name: &str, lightmap: LightmapMode, mipmaps: bool) -> ShaderHandle {
        if name.len() >= MAX_QPATH {
            log::warn!("Shader name exceeds MAX_QPATH");
            return ShaderHandle::DEFAULT;
        }
        let handle = self.find_or_register(name, lightmap, mipmaps);
        match self.by_index.get(handle.index()) {
            Some(material) if !material.default_shader => handle,
            _ => ShaderHandle::DEFAULT,
        }
    }

    /// Registers a material for 2D drawing with mipmapped images.
    ///
    /// Defaulted materials come back as handle 0, though they keep their slot.
    pub fn register_shader(&mut self, name: &str) -> ShaderHandle {
        self.register(name, LightmapMode::TwoD, true)
    }

    /// Registers a material for 2D drawing without mipmaps.
    pub fn register_shader_nomip(&mut self, name: &str) -> ShaderHandle {
        self.register(name, LightmapMode::TwoD, false)
    }

    /// Registers a material for the given lightmap mode.
    pub fn register_shader_lightmap(&mut self, name: &str, lightmap: LightmapMode) -> ShaderHandle {
        self.register(name, lightmap, true)
    }

    /// Registers a material drawing an already loaded image.
    ///
    /// Lightmap pages that are not loaded fall back to a white image.
    pub fn register_shader_from_image(
        &mut self,
        name: &str,
        lightmap: LightmapMode,
        image: ImageHandle,
    ) -> ShaderHandle {
        let lightmap = self.validate_lightmap(lightmap, LightmapMode::WhiteImage);
        let canonical = name.to_ascii_lowercase();

        if let Some(index) = self.lookup(&canonical, Some(lightmap)) {
            return ShaderHandle(index as u32);
        }
        if self.at_capacity() {
            return self.builtins.default;
        }

        let compiled = compile_with(
            &self.settings,
            self.images.as_mut(),
            self.atlas.as_mut(),
            &canonical,
            lightmap,
            |ctx| {
                install_image_stages(&mut ctx.material, image, name, &*ctx.images);
                finish_material(ctx);
            },
        );
        self.intern(compiled)
    }

    /// Finds an interned material of any lightmap mode, or the default.
    pub fn find_shader_by_name(&self, name: &str) -> ShaderHandle {
        if name.is_empty() {
            return self.builtins.default;
        }
        self.lookup(&canonical_name(name), None)
            .map_or(self.builtins.default, |index| ShaderHandle(index as u32))
    }

    /// The material behind `handle`, or the default one when it is out of
    /// range.
    pub fn shader_by_handle(&self, handle: ShaderHandle) -> Arc<Material> {
        match self.by_index.get(handle.index()) {
            Some(material) => material.clone(),
            None => {
                log::warn!("shader_by_handle: out of range handle {}", handle.0);
                self.by_index[self.builtins.default.index()].clone()
            }
        }
    }

    fn find_or_register_for_remap(&mut self, name: &str) -> Option<usize> {
        let mut handle = self.find_shader_by_name(name);
        if handle == self.builtins.default {
            handle = self.register_shader_lightmap(name, LightmapMode::Index(0));
        }
        (handle != self.builtins.default).then_some(handle.index())
    }

    /// Makes every material named `name` draw as `new_name`.
    ///
    /// Both ends are registered on demand. Remapping a name onto itself
    /// clears the remap. `time_offset` is applied to the target.
    pub fn remap_shader(&mut self, name: &str, new_name: &str, time_offset: Option<f32>) {
        if self.find_or_register_for_remap(name).is_none() {
            log::warn!("remap_shader: shader {} not found", name);
            return;
        }
        let Some(target) = self.find_or_register_for_remap(new_name) else {
            log::warn!("remap_shader: new shader {} not found", new_name);
            return;
        };

        let canonical = canonical_name(name);
        let bucket = self.hash_table[name_hash(&canonical, FILE_HASH_SIZE)].clone();
        for index in bucket {
            if !self.by_index[index].name.eq_ignore_ascii_case(&canonical) {
                continue;
            }
            let material = Arc::make_mut(&mut self.by_index[index]);
            material.remapped = (index != target).then_some(target);
        }

        if let Some(offset) = time_offset {
            Arc::make_mut(&mut self.by_index[target]).time_offset = offset;
        }
    }

    /// One listing line per material, then the total.
    ///
    /// `filter` keeps only names containing it; `sorted` walks the sort
    /// order instead of registration order.
    pub fn shader_list(&self, filter: Option<&str>, sorted: bool) -> Vec<String> {
        let order: Vec<usize> = if sorted {
            self.sorted.clone()
        } else {
            (0..self.by_index.len()).collect()
        };
        let filter = filter.map(str::to_ascii_lowercase);

        let mut lines = vec!["-----------------------".to_string()];
        let mut count = 0;
        for index in order {
            let material = &self.by_index[index];
            if let Some(filter) = &filter {
                if !material.name.contains(filter.as_str()) {
                    continue;
                }
            }
            let mut line = format!(
                "{} {}{}{:<4} {}",
                material.num_unfogged_passes,
                if material.lightmap.is_numeric() { "L " } else { "  " },
                if material.explicitly_defined { "E " } else { "  " },
                material.iterator.tag(),
                material.name
            );
            if material.default_shader {
                line.push_str(" (DEFAULTED)");
            }
            lines.push(line);
            count += 1;
        }
        lines.push(format!("{count} total shaders"));
        lines.push("------------------".to_string());
        lines
    }

    /// Snapshot of every material for the back end.
    pub fn material_table(&self) -> MaterialTable {
        MaterialTable {
            by_index: self.by_index.clone(),
            sorted: self.sorted.clone(),
        }
    }

    /// Drains the sort positions at which materials were inserted since the
    /// last call, oldest first.
    pub fn take_sort_fixups(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.sort_fixups)
    }

    /// The renderer's own materials.
    pub fn builtins(&self) -> BuiltinShaders {
        self.builtins
    }

    /// The sun of the last definition that described one.
    pub fn sun(&self) -> Option<SunLight> {
        self.sun
    }

    /// Number of interned materials.
    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    /// Whether nothing is interned; never true once constructed.
    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    /// Compiler warnings emitted so far.
    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    /// The loaded definition text.
    pub fn corpus(&self) -> &ShaderCorpus {
        &self.corpus
    }

    /// The image collaborator.
    pub fn images_mut(&mut self) -> &mut dyn ImageProvider {
        self.images.as_mut()
    }
}
